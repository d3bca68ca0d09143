use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "tamper-cmd")]
#[command(about = "Command-line utility for Tamper document operations")]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace); RUST_LOG applies otherwise
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a JSON array of rows into a Tamper document
    Pack {
        /// JSON file holding an array of row objects, each with an integer "guid"
        #[arg(short, long)]
        input: String,

        /// JSON file with pack options, e.g. {"precision": {"price": 2}}
        #[arg(long)]
        options: Option<String>,

        /// Decimal digits to keep for a float attribute (can be specified multiple times)
        #[arg(short, long, value_name = "NAME=DIGITS", value_parser = utils::parse_precision)]
        precision: Vec<(String, u32)>,

        /// Encode attributes in parallel
        #[arg(long)]
        parallel: bool,

        /// Output file for the document (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Pretty-print the document
        #[arg(long)]
        pretty: bool,
    },

    /// Decode a Tamper document and display summary information
    Inspect {
        /// Path to the document
        #[arg(short, long)]
        document: String,

        /// Print the decoded rows instead of the summary
        #[arg(long)]
        rows: bool,
    },

    /// Show the existence blocks of a guid sequence
    Existence {
        /// Strictly ascending guids, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        guids: Vec<u64>,
    },
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Pack {
            input,
            options,
            precision,
            parallel,
            output,
            pretty,
        } => commands::pack::run(input, options, precision, parallel, output, pretty),
        Commands::Inspect { document, rows } => commands::inspect::run(document, rows),
        Commands::Existence { guids } => commands::existence::run(guids),
    }
}
