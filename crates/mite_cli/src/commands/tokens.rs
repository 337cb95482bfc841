//! Tokens command - Show how a template is tokenized.

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use mite_core::{normalize, tokenize};

use super::TemplateInput;

#[derive(Args, Debug)]
pub struct TokensArgs {
    #[command(flatten)]
    pub input: TemplateInput,
}

pub fn execute(args: TokensArgs) -> Result<()> {
    let template = args.input.read()?;
    let tokens = tokenize(&normalize(&template)).context("failed to tokenize template")?;
    debug!(count = tokens.len(), "tokenized template");

    println!("{}", serde_json::to_string_pretty(&tokens)?);
    Ok(())
}
