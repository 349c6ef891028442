//! # formwork CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use formwork_schema::registry::{global, install};
use formwork_schema::AdapterRegistry;

/// formwork — schema-driven form state.
///
/// Derives default values, partial schemas and meta trees from JSON Schema
/// or native schema files, and validates values against them.
#[derive(Parser, Debug)]
#[command(name = "formwork", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the derived default value.
    Defaults(formwork_cli::defaults::DefaultsArgs),
    /// Print the derived partial schema.
    Partial(formwork_cli::partial::PartialArgs),
    /// Print the meta tree.
    Meta(formwork_cli::meta::MetaArgs),
    /// Validate a value; exits with status 1 when it is invalid.
    Validate(formwork_cli::validate::ValidateArgs),
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    install(AdapterRegistry::with_builtin())?;
    let registry = global()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let code = match &cli.command {
        Commands::Defaults(args) => {
            formwork_cli::defaults::run(args, registry, &mut out)?;
            ExitCode::SUCCESS
        }
        Commands::Partial(args) => {
            formwork_cli::partial::run(args, registry, &mut out)?;
            ExitCode::SUCCESS
        }
        Commands::Meta(args) => {
            formwork_cli::meta::run(args, registry, &mut out)?;
            ExitCode::SUCCESS
        }
        Commands::Validate(args) => {
            if formwork_cli::validate::run(args, registry, &mut out)? {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
    };
    out.flush()?;
    Ok(code)
}
