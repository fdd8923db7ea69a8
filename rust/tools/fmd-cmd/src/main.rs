use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

use commands::FieldSource;

#[derive(Parser)]
#[command(name = "fmd-cmd")]
#[command(about = "Command-line utility for decoding fragment metadata files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode fragment metadata and display a summary
    Inspect {
        /// Increase verbosity (-v lists per-tile tables, -vv also enables debug logging)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        #[command(flatten)]
        fields: FieldSource,

        /// Fragment metadata file, fragment or array directory, or object URL
        path: String,
    },

    /// Decode fragment metadata and check its table sizes against a schema
    Verify {
        /// Path to the JSON array schema
        #[arg(long)]
        schema: String,

        /// Fragment metadata file, fragment or array directory, or object URL
        path: String,
    },

    /// Decode fragment metadata and report the byte ranges that were never read
    Coverage {
        #[command(flatten)]
        fields: FieldSource,

        /// Fragment metadata file, fragment or array directory, or object URL
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Inspect { verbose, .. } => *verbose,
        _ => 0,
    };
    utils::init_logging(verbose);

    match cli.command {
        Commands::Inspect {
            verbose,
            fields,
            path,
        } => commands::inspect::run(verbose, fields, path),
        Commands::Verify { schema, path } => commands::verify::run(schema, path),
        Commands::Coverage { fields, path } => commands::coverage::run(fields, path),
    }
}
