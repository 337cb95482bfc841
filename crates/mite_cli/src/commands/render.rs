//! Render command - Render a template with a JSON context.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};

use mite_core::compile_with;

use super::{CompileArgs, InvalidArgument, TemplateInput};

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub input: TemplateInput,

    /// Render context as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub context: String,

    #[command(flatten)]
    pub compile: CompileArgs,
}

pub fn execute(args: RenderArgs) -> Result<()> {
    let template = args.input.read()?;
    let context = parse_context(&args.context)?;
    let options = args.compile.options();

    let compiled = compile_with(&template, &options).context("failed to compile template")?;
    debug!(
        body_len = compiled.body().len(),
        locals = %compiled.options().locals_name,
        "compiled template"
    );

    let output = compiled
        .render(&context)
        .context("failed to render template")?;
    info!(bytes = output.len(), "rendered template");

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn parse_context(raw: &str) -> Result<serde_json::Value> {
    let context: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| InvalidArgument(format!("--context is not valid JSON: {}", e)))?;
    if !(context.is_object() || context.is_null()) {
        return Err(InvalidArgument("--context must be a JSON object".to_string()).into());
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_context() {
        assert_eq!(parse_context(r#"{"a": 1}"#).unwrap()["a"], 1);
        assert!(parse_context("null").unwrap().is_null());
    }

    #[test]
    fn test_parse_context_rejects_bad_input() {
        for raw in ["{", "[1, 2]", "\"text\""] {
            let err = parse_context(raw).unwrap_err();
            assert!(err.downcast_ref::<InvalidArgument>().is_some());
        }
    }
}
