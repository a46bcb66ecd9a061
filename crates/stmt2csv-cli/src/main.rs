mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stmt2csv",
    version,
    about = "Convert bank statements (PDF, EML) into CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a statement (PDF, page dump JSON or EML) into CSV
    Convert {
        /// Path to PDF, page dump JSON or EML file
        input_file: PathBuf,

        /// Built-in adapter key (see `stmt2csv formats list`)
        #[arg(
            short,
            long,
            value_name = "KEY",
            required_unless_present = "format",
            conflicts_with = "format"
        )]
        adapter: Option<String>,

        /// Custom JSON format file
        #[arg(short, long, value_name = "FILE")]
        format: Option<PathBuf>,

        /// Write the CSV to a file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Omit the statement title line
        #[arg(long)]
        no_title: bool,

        /// List fragments that matched no cell (on stderr)
        #[arg(long)]
        show_ignored: bool,

        /// Path to the pdftotext binary
        #[arg(long, value_name = "PATH")]
        pdftotext: Option<PathBuf>,
    },
    /// Dump the positioned text fragments of a PDF or page dump as JSON
    Fragments {
        /// Path to PDF or page dump JSON file
        input_file: PathBuf,

        /// Only this page (1-based)
        #[arg(short, long, value_name = "N")]
        page: Option<usize>,

        /// Write the JSON to a file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Path to the pdftotext binary
        #[arg(long, value_name = "PATH")]
        pdftotext: Option<PathBuf>,
    },
    /// Print the HTML body of an EML file
    EmailHtml {
        /// Path to EML file
        input_file: PathBuf,

        /// Write the HTML to a file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Manage and inspect bank formats
    Formats {
        #[command(subcommand)]
        action: FormatsAction,
    },
}

#[derive(Subcommand)]
enum FormatsAction {
    /// List built-in formats
    List,
    /// Explain a built-in format in plain language
    Explain {
        /// Adapter key (e.g., "cmb_credit")
        key: String,
    },
    /// Print the JSON format schema with field descriptions and example
    Schema,
    /// Validate a custom format file
    Validate {
        /// Path to JSON format file
        file: PathBuf,
    },
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input_file,
            adapter,
            format,
            out,
            no_title,
            show_ignored,
            pdftotext,
        } => commands::convert::run(commands::convert::ConvertArgs {
            input_file,
            adapter,
            format,
            out,
            include_title: !no_title,
            show_ignored,
            pdftotext,
        }),
        Commands::Fragments {
            input_file,
            page,
            out,
            pdftotext,
        } => commands::fragments::run(input_file, page, out, pdftotext),
        Commands::EmailHtml { input_file, out } => commands::email::run(input_file, out),
        Commands::Formats { action } => match action {
            FormatsAction::List => commands::formats::list(),
            FormatsAction::Explain { key } => commands::formats::explain(&key),
            FormatsAction::Schema => commands::formats::schema(),
            FormatsAction::Validate { file } => commands::formats::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
