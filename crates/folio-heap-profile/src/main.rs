//! DHAT heap profiler for folio.
//!
//! Runs one flow phase over every given tree under a single profiler and
//! writes `dhat-<phase>.json` to the output directory (default: target/memory).
//!
//!   cargo run -p folio-heap-profile --release -- [--phase P] [--out-dir D] [TREES...]

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use folio::{LayoutPipeline, Node, Paginator, StageError, StageKind};

const PAGE_HEIGHT: f32 = 842.0;
const DEFAULT_TREE: &str = "tests/fixtures/report.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// JSON decode only.
    Parse,
    /// Decode plus a dimensions pass over every node.
    Layout,
    /// Decode plus page breaking of pre-sized trees.
    Paginate,
    /// Layout, pagination and re-encoding.
    Full,
}

impl Phase {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "parse" => Some(Self::Parse),
            "layout" => Some(Self::Layout),
            "paginate" => Some(Self::Paginate),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Layout => "layout",
            Self::Paginate => "paginate",
            Self::Full => "full",
        }
    }
}

struct Options {
    phase: Phase,
    out_dir: PathBuf,
    trees: Vec<PathBuf>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options {
        phase: Phase::Paginate,
        out_dir: PathBuf::from("target/memory"),
        trees: Vec::new(),
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--phase" => {
                let value = args.next().unwrap_or_default();
                options.phase =
                    Phase::parse(&value).ok_or_else(|| format!("unknown phase '{}'", value))?;
            }
            "--out-dir" => {
                let dir = args.next().ok_or("--out-dir needs a directory")?;
                options.out_dir = PathBuf::from(dir);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{}'", flag)),
            path => options.trees.push(PathBuf::from(path)),
        }
    }
    if options.trees.is_empty() {
        options.trees.push(PathBuf::from(DEFAULT_TREE));
    }
    Ok(options)
}

fn read_tree(path: &Path) -> Result<Node, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("parse {}: {}", path.display(), e))
}

/// Pipeline with a dimensions pass so the layout phase touches every node.
fn profiling_pipeline() -> LayoutPipeline {
    let dimensions = |tree: Node| -> Result<Node, StageError> {
        Ok(tree.map_tree(&mut |node| {
            if node.layout.height.is_none() {
                let height = node.content_extent();
                node.with_height(height)
            } else {
                node
            }
        }))
    };
    LayoutPipeline::new().with_stage(StageKind::Dimensions, dimensions)
}

fn run_phase(path: &Path, phase: Phase, paginator: &Paginator) -> Result<(), String> {
    let tree = read_tree(path)?;
    let fail = |e: &dyn std::fmt::Display| format!("{} {}: {}", phase.name(), path.display(), e);
    match phase {
        Phase::Parse => {}
        Phase::Layout => {
            profiling_pipeline().layout(tree).map_err(|e| fail(&e))?;
        }
        Phase::Paginate => {
            paginator.resolve_page_breaks(tree).map_err(|e| fail(&e))?;
        }
        Phase::Full => {
            let paginated = profiling_pipeline()
                .paginate(tree, paginator)
                .map_err(|e| fail(&e))?;
            serde_json::to_string(&paginated).map_err(|e| fail(&e))?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let options = match parse_options(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("heap-profile: {}", message);
            eprintln!("usage: heap-profile [--phase parse|layout|paginate|full] [--out-dir DIR] [TREES...]");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&options.out_dir) {
        eprintln!("heap-profile: create {}: {}", options.out_dir.display(), e);
        return ExitCode::FAILURE;
    }

    let json_path = options
        .out_dir
        .join(format!("dhat-{}.json", options.phase.name()));
    let paginator = Paginator::for_page_height(PAGE_HEIGHT);
    let _profiler = dhat::Profiler::builder()
        .file_name(json_path.clone())
        .build();
    for tree in &options.trees {
        eprintln!("  profiling: {}", tree.display());
        if let Err(message) = run_phase(tree, options.phase, &paginator) {
            eprintln!("heap-profile: {}", message);
            return ExitCode::FAILURE;
        }
    }
    eprintln!(
        "Done. Open {} in https://nnethercote.github.io/dh_view/dh_view.html",
        json_path.display()
    );
    ExitCode::SUCCESS
}
