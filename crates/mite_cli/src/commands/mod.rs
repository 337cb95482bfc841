//! CLI command definitions.

use std::io::Read;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mite_core::CompileOptions;

pub mod codegen;
pub mod render;
pub mod tokens;

/// mite - micro template compiler
#[derive(Parser, Debug)]
#[command(name = "mite")]
#[command(version, about = "mite - micro template compiler")]
#[command(long_about = r#"
mite compiles templates with embedded <% code %> and <%= output %>
directives and renders them against a JSON context.

COMMANDS:
  tokens   → Show how a template is split into tokens
  codegen  → Show the generated render function body
  render   → Render a template with a JSON context

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  4 - Template error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the tokens of a template as JSON
    Tokens(tokens::TokensArgs),

    /// Print the generated function body of a template
    Codegen(codegen::CodegenArgs),

    /// Render a template to stdout
    Render(render::RenderArgs),
}

/// Template source shared by every command.
#[derive(Args, Debug)]
pub struct TemplateInput {
    /// Template text; read from stdin when omitted
    #[arg(short, long)]
    pub template: Option<String>,
}

impl TemplateInput {
    pub fn read(&self) -> Result<String> {
        match &self.template {
            Some(template) => Ok(template.clone()),
            None => {
                let mut template = String::new();
                std::io::stdin()
                    .read_to_string(&mut template)
                    .context("failed to read template from stdin")?;
                Ok(template)
            }
        }
    }
}

/// Options that affect code generation and binding.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Name the whole context is bound to
    #[arg(long, default_value = mite_core::options::DEFAULT_LOCALS_NAME)]
    pub locals_name: String,

    /// Bind only these context keys as variables (repeatable)
    #[arg(long = "bind", value_name = "NAME")]
    pub bindings: Vec<String>,

    /// Emit literal text unescaped
    #[arg(long)]
    pub raw_literals: bool,
}

impl CompileArgs {
    pub fn options(&self) -> CompileOptions {
        let mut options = CompileOptions::new()
            .with_locals_name(&self.locals_name)
            .escape_literals(!self.raw_literals);
        if !self.bindings.is_empty() {
            options = options.with_bindings(self.bindings.iter().cloned());
        }
        options
    }
}

/// A command-line value that could not be used.
#[derive(Debug, thiserror::Error)]
#[error("invalid argument: {0}")]
pub struct InvalidArgument(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "mite",
            "-v",
            "render",
            "--template",
            "<%= a %>",
            "--context",
            r#"{"a": 1}"#,
            "--bind",
            "a",
            "--bind",
            "b",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Render(args) = cli.command else {
            panic!("expected render command");
        };
        assert_eq!(args.input.template.as_deref(), Some("<%= a %>"));
        assert_eq!(args.context, r#"{"a": 1}"#);
        let options = args.compile.options();
        assert_eq!(options.locals_name, "locals");
        assert_eq!(options.bindings, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_parse_tokens_without_template() {
        let cli = Cli::try_parse_from(["mite", "tokens"]).unwrap();
        let Commands::Tokens(args) = cli.command else {
            panic!("expected tokens command");
        };
        assert!(args.input.template.is_none());
    }

    #[test]
    fn test_parse_codegen_options() {
        let cli = Cli::try_parse_from([
            "mite",
            "codegen",
            "-t",
            "x",
            "--raw-literals",
        ])
        .unwrap();
        let Commands::Codegen(args) = cli.command else {
            panic!("expected codegen command");
        };
        assert!(!args.compile.options().escape_literals);
    }

    #[test]
    fn test_invalid_argument_message() {
        let err = InvalidArgument("--context must be a JSON object".to_string());
        assert_eq!(
            err.to_string(),
            "invalid argument: --context must be a JSON object"
        );
    }

    #[test]
    fn test_unknown_command_fails() {
        assert!(Cli::try_parse_from(["mite", "frobnicate"]).is_err());
    }
}
