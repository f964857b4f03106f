//! Apply command
//!
//! Usage: g2config apply --config <FILE> <COMMAND_JSON|@FILE> [--output <FILE>]

use clap::{Args, ValueEnum};
use g2config_core::{
    apply, CascadePolicy, Command, ConfigError, DeleteAction, DeletePolicy, KindDeletePolicy,
    RejectReferencedPolicy,
};
use std::path::PathBuf;

use super::{load_document, read_request};

/// How deletes treat records that still reference the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeletePolicyArg {
    /// Fail while anything references the target
    Reject,
    /// Delete referencing records too
    Cascade,
    /// Clear nullable reference fields, reject otherwise
    NullOut,
}

impl DeletePolicyArg {
    fn policy(self) -> Box<dyn DeletePolicy> {
        match self {
            DeletePolicyArg::Reject => Box::new(RejectReferencedPolicy),
            DeletePolicyArg::Cascade => Box::new(CascadePolicy),
            DeletePolicyArg::NullOut => Box::new(KindDeletePolicy::new(DeleteAction::NullOut)),
        }
    }
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Configuration document to read
    #[arg(short, long)]
    pub config: PathBuf,

    /// Command JSON, or @path to a file holding it
    pub command: String,

    /// Where to write the new document (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = DeletePolicyArg::Reject)]
    pub delete_policy: DeletePolicyArg,

    /// Indent the written document
    #[arg(long)]
    pub pretty: bool,
}

/// Execute apply command
pub fn execute(args: ApplyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(&args.config)?;
    let cmd: Command = serde_json::from_str(&read_request(&args.command)?).map_err(|e| {
        ConfigError::MalformedRequest {
            reason: e.to_string(),
        }
    })?;

    let next = apply(doc, cmd, args.delete_policy.policy().as_ref())?;
    let text = if args.pretty {
        next.to_pretty()?
    } else {
        next.serialize()?
    };

    if let Some(output_path) = args.output {
        std::fs::write(&output_path, text)?;
        eprintln!("✓ Wrote {}", output_path.display());
    } else {
        println!("{}", text);
    }

    Ok(())
}
