//! ds_inject - Add a new datastream version to a FOXML object.
//!
//! This tool reads a FOXML file and a binary content file, appends the
//! content as a new base64 `datastreamVersion` of the named datastream, and
//! writes the re-indented document to the output path.
//!
//! # Usage
//!
//! ```bash
//! ds_inject --xml <FOXML> --dsid <DSID> --content <FILE> --output <OUT> [--label <LABEL>]
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Add page.png as the next version of OBJ, reusing the latest label
//! ds_inject --xml object.xml --dsid OBJ --content page.png --output object.new.xml
//!
//! # Force the label and mimetype
//! ds_inject --xml object.xml --dsid OBJ --content scan.bin \
//!     --label "Replacement scan" --mimetype image/tiff --output object.new.xml
//!
//! # List the datastreams and versions of an object
//! ds_inject --xml object.xml --list
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use foxml_inject::objects::VersionSummary;
use foxml_inject::pipeline::{inject_file, list_datastreams};
use foxml_inject::Error;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Add a new datastream version to a FOXML object.
#[derive(Parser, Debug)]
#[command(name = "ds_inject")]
#[command(version = VERSION)]
#[command(about = "Add a new datastream version to a FOXML object")]
#[command(long_about = "Reads a FOXML object and a binary file, appends the file as a new \
    base64-encoded version of the given datastream, and writes the re-indented document.")]
struct Args {
    /// Path to the XML file to modify
    #[arg(long)]
    xml: PathBuf,

    /// ID of the datastream to modify
    #[arg(long, required_unless_present = "list")]
    dsid: Option<String>,

    /// Path to the binary content to add as a new datastreamVersion
    #[arg(long, required_unless_present = "list")]
    content: Option<PathBuf>,

    /// Label of the new datastream version (defaults to the latest version's label)
    #[arg(long)]
    label: Option<String>,

    /// Mimetype of the content (guessed from the content file extension if omitted)
    #[arg(long)]
    mimetype: Option<String>,

    /// Path to the output XML file
    #[arg(long, required_unless_present = "list")]
    output: Option<PathBuf>,

    /// List datastreams and their versions instead of injecting
    #[arg(long)]
    list: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Formats one version as a tab-separated listing row.
fn format_version(version: &VersionSummary) -> String {
    let size = version
        .size
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "  {}\t{}\t{}\t{}",
        version.id.as_deref().unwrap_or("-"),
        version.mimetype.as_deref().unwrap_or("-"),
        size,
        version.label.as_deref().unwrap_or("-"),
    )
}

fn list(args: &Args) -> Result<(), Error> {
    let xml = fs::read(&args.xml)?;
    for ds in list_datastreams(&xml)? {
        println!("{}", ds.id);
        for version in &ds.versions {
            println!("{}", format_version(version));
        }
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), Error> {
    if args.list {
        return list(args);
    }

    let (Some(dsid), Some(content), Some(output)) = (&args.dsid, &args.content, &args.output)
    else {
        // clap enforces these unless --list is given
        return Ok(());
    };

    let result = inject_file(
        &args.xml,
        content,
        dsid,
        args.label.clone(),
        args.mimetype.clone(),
    )?;
    fs::write(output, &result.xml)?;
    info!(
        output = %output.display(),
        id = %result.injected.version.id,
        "wrote updated object"
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::DatastreamNotFound { dsid }) => {
            warn!("Datastream with ID of {} does not exist.", dsid);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error in script execution: {}", e);
            ExitCode::FAILURE
        }
    }
}
