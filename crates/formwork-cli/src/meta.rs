//! # Meta Subcommand
//!
//! Prints the meta tree for a schema. With `--value`, the tree is synced
//! against the value; `--initial` additionally recomputes dirty flags
//! against an initial snapshot (the derived defaults when omitted), and
//! `--validate` applies the validation result.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use formwork_schema::{load_document, AdapterRegistry};
use formwork_state::{update_dirty_state, update_validation_state};

use crate::common::{load_config, load_schema, write_json};

/// Arguments for the meta subcommand.
#[derive(Args, Debug)]
pub struct MetaArgs {
    /// Schema file (JSON or YAML).
    #[arg(long)]
    pub schema: PathBuf,

    /// Live value to sync the tree against.
    #[arg(long)]
    pub value: Option<PathBuf>,

    /// Initial snapshot for dirty tracking.
    #[arg(long, requires = "value")]
    pub initial: Option<PathBuf>,

    /// Validate the value and record validity in the tree.
    #[arg(long, requires = "value")]
    pub validate: bool,

    /// Engine config file with default-derivation options.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &MetaArgs, registry: &AdapterRegistry, out: &mut impl Write) -> anyhow::Result<()> {
    let schema = load_schema(&args.schema)?;
    let config = load_config(args.config.as_deref())?;
    let adapter = registry.resolve(&schema)?;
    let mut meta = adapter.create_meta_state(&schema, &config.defaults)?;

    if let Some(path) = &args.value {
        let value = load_document(path)?;
        adapter.sync_meta_state(&mut meta, &value, &schema, &config.defaults)?;

        let initial = match &args.initial {
            Some(path) => Some(load_document(path)?),
            None => adapter.create_default_values(&schema, &config.defaults)?,
        };
        update_dirty_state(&mut meta, Some(&value), initial.as_ref());

        if args.validate {
            let outcome = adapter.validate(&schema, &value)?;
            update_validation_state(&mut meta, outcome.errors());
        }
    }
    write_json(out, &meta)
}
