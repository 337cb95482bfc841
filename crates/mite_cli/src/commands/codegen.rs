//! Codegen command - Show the generated function body.

use anyhow::{Context, Result};
use clap::Args;

use mite_core::{normalize, tokenize, Generator};

use super::{CompileArgs, TemplateInput};

#[derive(Args, Debug)]
pub struct CodegenArgs {
    #[command(flatten)]
    pub input: TemplateInput,

    #[command(flatten)]
    pub compile: CompileArgs,
}

/// Prints the body without parsing it, so broken directive code can be
/// inspected too.
pub fn execute(args: CodegenArgs) -> Result<()> {
    let template = args.input.read()?;
    let tokens = tokenize(&normalize(&template)).context("failed to tokenize template")?;
    let body = Generator::new(&args.compile.options()).generate(&tokens);

    println!("{}", body);
    Ok(())
}
