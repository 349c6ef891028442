//! # Defaults Subcommand
//!
//! Prints the default value derived from a schema. An absent root value is
//! printed as `null`.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde_json::Value;

use formwork_schema::AdapterRegistry;

use crate::common::{load_config, load_schema, write_json};

/// Arguments for the defaults subcommand.
#[derive(Args, Debug)]
pub struct DefaultsArgs {
    /// Schema file (JSON or YAML).
    #[arg(long)]
    pub schema: PathBuf,

    /// Engine config file with default-derivation options.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &DefaultsArgs, registry: &AdapterRegistry, out: &mut impl Write) -> anyhow::Result<()> {
    let schema = load_schema(&args.schema)?;
    let config = load_config(args.config.as_deref())?;
    let adapter = registry.resolve(&schema)?;
    let value = adapter.create_default_values(&schema, &config.defaults)?;
    write_json(out, &value.unwrap_or(Value::Null))
}
