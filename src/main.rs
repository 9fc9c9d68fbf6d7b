use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use xmlharvest::{ErrorKind, ExtractConfig, Harvester, Request, Selector, XmlReader};

#[derive(Debug, Parser)]
#[command(
    name = "xmlharvest",
    version,
    about = "Stream matching sub-trees out of large XML documents"
)]
struct Args {
    /// Path expression selecting the items, e.g. //entry[@lang='en']
    #[arg(value_name = "SELECTOR")]
    selector: String,
    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Include each item's text content
    #[arg(long)]
    text: bool,
    /// Attribute to copy from each item (repeatable)
    #[arg(long = "attr", value_name = "NAME")]
    attributes: Vec<String>,
    /// Relative XPath whose matches' text is copied (repeatable)
    #[arg(long = "child", value_name = "XPATH")]
    children: Vec<String>,
    /// Maximum nesting of descended elements (0 means unlimited)
    #[arg(long, value_name = "N")]
    max_depth: Option<u16>,
    /// Maximum size of one item in bytes (0 means unlimited)
    #[arg(long, value_name = "BYTES")]
    max_fragment_size: Option<usize>,
}

impl Args {
    fn config(&self) -> ExtractConfig {
        let defaults = ExtractConfig::default();
        ExtractConfig::new(
            self.max_depth.unwrap_or(defaults.max_depth),
            self.max_fragment_size
                .unwrap_or(defaults.max_fragment_size),
        )
    }

    /// `None` when no request flag was given and raw fragments are wanted
    fn request(&self) -> Option<Request> {
        if !self.text && self.attributes.is_empty() && self.children.is_empty() {
            return None;
        }

        let mut request = Request::new().attributes(self.attributes.iter().cloned());
        if self.text {
            request = request.with_text();
        }
        for child in &self.children {
            request = request.child(child.clone(), Request::new().with_text());
        }
        Some(request)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();
    let source = XmlReader::from_reader(open_input(&args.input)?);
    let mut out = open_output(&args.output)?;

    let count = match args.request() {
        Some(request) => {
            let harvester = Harvester::new(&args.selector, request)
                .context("invalid selector")?
                .with_config(args.config());
            write_nodes(&harvester, source, &mut out)?
        }
        None => {
            let selector = Selector::compile(&args.selector).context("invalid selector")?;
            let mut count = 0usize;
            for fragment in selector.extract_with_config(source, args.config()) {
                let fragment = fragment.context("extraction failed")?;
                writeln!(out, "{fragment}").context("failed to write output")?;
                count += 1;
            }
            count
        }
    };

    out.flush().context("failed to write output")?;
    info!(items = count, "done");
    Ok(())
}

fn write_nodes<R: BufRead>(
    harvester: &Harvester,
    source: XmlReader<R>,
    out: &mut dyn Write,
) -> Result<usize> {
    let mut count = 0usize;
    for node in harvester.harvest(source) {
        let node = match node {
            Ok(node) => node,
            Err(err) if err.kind() == &ErrorKind::FragmentParse => {
                warn!(error = %err, "item skipped");
                continue;
            }
            Err(err) => return Err(err).context("extraction failed"),
        };
        serde_json::to_writer(&mut *out, &node).context("failed to serialize item")?;
        writeln!(out).context("failed to write output")?;
        count += 1;
    }
    Ok(count)
}

fn open_input(path: &Option<PathBuf>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to read input file {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: &Option<PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to write output file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
