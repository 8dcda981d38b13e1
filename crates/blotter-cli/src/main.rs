mod commands;
mod output;

use blotter_core::PageRange;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "blotter",
    version,
    about = "Extract booking records and mugshots from jail booking report PDFs"
)]
struct Cli {
    /// Log pipeline progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract booking records from report PDFs
    Extract {
        /// Booking report PDFs, or directories whose PDFs are read in name order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Store records and mugshots in this directory
        #[arg(long = "out", value_name = "DIR")]
        out: Option<PathBuf>,

        /// Print a notification for each record (to stderr)
        #[arg(long)]
        notify: bool,

        /// First page to process (1-based)
        #[arg(long, value_name = "N")]
        first_page: Option<usize>,

        /// Last page to process
        #[arg(long, value_name = "M")]
        last_page: Option<usize>,

        /// JSON engine config (defaults apply when omitted)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Show the assembled text lines of a PDF and how each is classified
    Lines {
        /// Path to the booking report PDF
        input_file: PathBuf,

        /// Only show this page
        #[arg(long, value_name = "N")]
        page: Option<usize>,

        /// JSON engine config (defaults apply when omitted)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print the engine config as JSON (defaults, or a file merged over them)
    Config {
        /// JSON engine config to check and print
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Extract {
            inputs,
            output,
            out,
            notify,
            first_page,
            last_page,
            config,
        } => commands::extract::run(
            inputs,
            commands::extract::ExtractOptions {
                output_format: output,
                out_dir: out,
                notify,
                range: PageRange::new(first_page, last_page),
            },
            config,
        ),
        Commands::Lines {
            input_file,
            page,
            config,
        } => commands::lines::run(input_file, page, config),
        Commands::Config { config } => commands::config::print(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
