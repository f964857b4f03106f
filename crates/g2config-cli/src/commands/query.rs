//! Query command
//!
//! Usage: g2config query --config <FILE> <QUERY_JSON|@FILE>

use clap::Args;
use g2config_core::{run_query, ConfigError, Query};
use std::path::PathBuf;

use super::{load_document, read_request};

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Configuration document to read
    #[arg(short, long)]
    pub config: PathBuf,

    /// Query JSON, or @path to a file holding it
    pub query: String,

    /// Indent the printed payload
    #[arg(long)]
    pub pretty: bool,
}

/// Execute query command
pub fn execute(args: QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(&args.config)?;
    let query: Query = serde_json::from_str(&read_request(&args.query)?).map_err(|e| {
        ConfigError::MalformedRequest {
            reason: e.to_string(),
        }
    })?;

    let payload = run_query(&doc, &query)?;
    if args.pretty {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{}", payload);
    }
    Ok(())
}
