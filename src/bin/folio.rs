//! Command-line front end for the folio page-break engine.
//!
//! Usage:
//!   folio paginate <tree.json> [--page-height N] [--max-pages N] [--keep-empty-pages]
//!   folio summary <tree.json>
//!
//! `paginate` writes the paginated tree as JSON to stdout and a per-section
//! page count summary to stderr. Set `RUST_LOG=debug` for split traces.

use std::fs;
use std::process::ExitCode;

use folio::{FlowGeometry, Node, PaginationConfig, Paginator};

const USAGE: &str = "usage: folio <paginate|summary> <tree.json> [--page-height N] [--max-pages N] [--keep-empty-pages]";

#[derive(Debug)]
struct Args {
    command: Command,
    input: String,
    page_height: f32,
    config: PaginationConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Paginate,
    Summary,
}

impl Command {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "paginate" => Some(Self::Paginate),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let command = raw
        .next()
        .and_then(|s| Command::from_str(&s))
        .ok_or_else(|| USAGE.to_string())?;
    let input = raw.next().ok_or_else(|| USAGE.to_string())?;
    let mut page_height = FlowGeometry::A4_HEIGHT_PT;
    let mut config = PaginationConfig::default();

    while let Some(flag) = raw.next() {
        match flag.as_str() {
            "--page-height" => {
                let value = raw.next().ok_or("--page-height needs a value")?;
                page_height = value
                    .parse()
                    .map_err(|_| format!("invalid page height: {}", value))?;
            }
            "--max-pages" => {
                let value = raw.next().ok_or("--max-pages needs a value")?;
                let limit = value
                    .parse()
                    .map_err(|_| format!("invalid page limit: {}", value))?;
                config = config.with_max_pages_per_page(limit);
            }
            "--keep-empty-pages" => {
                config = config.with_suppress_empty_pages(false);
            }
            other => return Err(format!("unknown flag: {}\n{}", other, USAGE)),
        }
    }

    Ok(Args {
        command,
        input,
        page_height,
        config,
    })
}

fn read_tree(path: &str) -> Result<Node, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("read {}: {}", path, e))?;
    serde_json::from_str(&raw).map_err(|e| format!("parse {}: {}", path, e))
}

fn summary_lines(tree: &Node) -> Vec<String> {
    tree.children
        .iter()
        .enumerate()
        .map(|(index, section)| {
            let leaves: usize = section.children.iter().map(Node::leaf_count).sum();
            format!(
                "section={} pages={} leaves={}",
                index,
                section.children.len(),
                leaves
            )
        })
        .collect()
}

fn print_summary(tree: &Node) {
    for line in summary_lines(tree) {
        eprintln!("{}", line);
    }
}

fn run(args: Args) -> Result<(), String> {
    let tree = read_tree(&args.input)?;
    match args.command {
        Command::Summary => {
            print_summary(&tree);
            Ok(())
        }
        Command::Paginate => {
            let paginator = Paginator::for_page_height(args.page_height).with_config(args.config);
            log::info!("paginating {} with {:?}", args.input, paginator);
            let paginated = paginator
                .resolve_page_breaks(tree)
                .map_err(|e| format!("paginate {}: {}", args.input, e))?;
            let json = serde_json::to_string_pretty(&paginated)
                .map_err(|e| format!("serialize output: {}", e))?;
            println!("{}", json);
            print_summary(&paginated);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            ExitCode::FAILURE
        }
    }
}
