use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use domshape::html::{page, parser};
use domshape::matcher;

#[derive(Parser)]
#[command(name = "domshape")]
#[command(about = "Check the structure of an HTML document against a pattern")]
struct Args {
    /// HTML file to check, or "-" to read stdin
    file: PathBuf,

    /// Expected trailing children, e.g. 'div(p("hello"), span)'
    pattern: String,

    /// Match against the single element with this id
    #[arg(long, default_value = page::CONTENT_ID, conflicts_with = "root")]
    select: String,

    /// Match against the document root element instead of a selected element
    #[arg(long)]
    root: bool,

    /// Raise log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn read_input(file: &Path) -> anyhow::Result<String> {
    if file.as_os_str() == "-" {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        return Ok(content);
    }

    fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level(args.verbose))),
        )
        .with_writer(io::stderr)
        .init();

    let patterns = matcher::parse_patterns(&args.pattern)?;
    let content = read_input(&args.file)?;
    let document = parser::parse(&content)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let target = if args.root {
        &document
    } else {
        page::select_single_by_id(&document, &args.select)?
    };

    tracing::info!(
        "Matching {} pattern(s) against <{}>",
        patterns.len(),
        target.tag_name
    );

    matcher::match_children(target, &patterns)?;

    tracing::info!("Document matches");

    Ok(())
}
