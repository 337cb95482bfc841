//! mite CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 4: Template error

use std::process::ExitCode;

use clap::Parser;
use mite_core::{CompileError, RenderError, SyntaxError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const TEMPLATE_ERROR: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries rendered output.
    let level = if cli.verbose {
        "mite=debug"
    } else if cli.quiet {
        "mite=warn"
    } else {
        "mite=info"
    };
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{},warn", level))),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Tokens(args) => commands::tokens::execute(args),
        Commands::Codegen(args) => commands::codegen::execute(args),
        Commands::Render(args) => commands::render::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<SyntaxError>().is_some()
        || e.downcast_ref::<CompileError>().is_some()
        || e.downcast_ref::<RenderError>().is_some()
    {
        ExitCodes::TEMPLATE_ERROR
    } else if e.downcast_ref::<commands::InvalidArgument>().is_some() {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_template_errors_map_to_template_exit_code() {
        let err = mite_core::compile("<% x")
            .context("failed to compile template")
            .unwrap_err();
        assert_eq!(categorize_error(&err), ExitCodes::TEMPLATE_ERROR);

        let err = mite_core::compile("<%= missing %>")
            .unwrap()
            .render(&serde_json::json!({}))
            .context("failed to render template")
            .unwrap_err();
        assert_eq!(categorize_error(&err), ExitCodes::TEMPLATE_ERROR);
    }

    #[test]
    fn test_invalid_argument_exit_code() {
        let err = anyhow::Error::new(commands::InvalidArgument("bad".to_string()));
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_ARGS);
    }

    #[test]
    fn test_other_errors_are_general() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }
}
