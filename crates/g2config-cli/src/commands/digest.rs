//! Digest command
//!
//! Usage: g2config digest --config <FILE>

use clap::Args;
use g2config_core::document_digest;
use std::path::PathBuf;

use super::load_document;

#[derive(Debug, Args)]
pub struct DigestArgs {
    /// Configuration document to read
    #[arg(short, long)]
    pub config: PathBuf,
}

/// Execute digest command
pub fn execute(args: DigestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(&args.config)?;
    println!("{}", document_digest(&doc)?);
    Ok(())
}
