//! G2 Config CLI
//!
//! Command-line interface over the configuration mutation engine

use clap::{Parser, Subcommand};
use g2config_core::logging_facility::{init, Profile};
use g2config_core::ConfigError;
use g2config_core::ExError;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "g2config")]
#[command(about = "G2 Config - edit and inspect G2_CONFIG documents", long_about = None)]
struct Cli {
    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply one command and write the resulting document
    Apply(commands::apply::ApplyArgs),
    /// Run a read-only query and print its JSON payload
    Query(commands::query::QueryArgs),
    /// Print the canonical SHA-256 digest of a document
    Digest(commands::digest::DigestArgs),
}

fn main() {
    let cli = Cli::parse();

    init(if cli.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = match cli.command {
        Commands::Apply(args) => commands::apply::execute(args),
        Commands::Query(args) => commands::query::execute(args),
        Commands::Digest(args) => commands::digest::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        // Engine failures exit with their numeric error code
        let code = match e.downcast::<ConfigError>() {
            Ok(err) => ExError::from(*err).numeric_code(),
            Err(_) => 1,
        };
        std::process::exit(i32::try_from(code).unwrap_or(1));
    }
}
