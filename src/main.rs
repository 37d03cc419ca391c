//! mifkit - FrameMaker MIF text extraction

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mifkit::{writer, Event, MifFilter, Parameters, RawDocument};

#[derive(Parser)]
#[command(name = "mifkit")]
#[command(version, about = "Extract translatable text from FrameMaker MIF files", long_about = None)]
#[command(after_help = "EXAMPLES:
    mifkit doc.mif                    List extracted text units
    mifkit doc.mif --json             Dump all events as JSON
    mifkit doc.mif -m copy.mif        Rebuild the document from its events
    RUST_LOG=mifkit=debug mifkit doc.mif   Show analysis details")]
struct Cli {
    /// Input MIF file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Filter parameters (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Encoding used when the file has no byte-order mark
    #[arg(short, long, value_name = "LABEL")]
    encoding: Option<String>,

    /// Print the event stream as JSON
    #[arg(short, long)]
    json: bool,

    /// Write the document rebuilt from the extracted events
    #[arg(short, long, value_name = "OUTPUT")]
    merge: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log filter from a `RUST_LOG` value; warnings only when unset or invalid.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn run(cli: &Cli) -> mifkit::Result<()> {
    let params = match &cli.config {
        Some(path) => Parameters::load(path)?,
        None => Parameters::default(),
    };
    let mut document = RawDocument::from_path(&cli.input)?;
    if let Some(label) = &cli.encoding {
        document = document.with_encoding(label);
    }

    let mut filter = MifFilter::new(params);
    let events = filter.extract(document)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else {
        show_units(&events);
    }

    if let Some(output) = &cli.merge {
        std::fs::write(output, writer::write_events(&events))?;
    }
    Ok(())
}

fn show_units(events: &[Event]) {
    for unit in events.iter().filter_map(Event::as_text_unit) {
        let kind = if unit.unit_type.is_empty() {
            "paragraph"
        } else {
            unit.unit_type.as_str()
        };
        let referent = if unit.referent { " (referent)" } else { "" };
        println!("{}\t{kind}{referent}\t{}", unit.id, unit.source.to_generic());
    }
}
