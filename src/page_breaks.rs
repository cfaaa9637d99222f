//! Page-break engine: fragments logical pages into fixed-height physical pages.
//!
//! The document shape is `root -> sections -> logical pages -> content`.
//! Each logical page is broken independently by [`Paginator::break_page`],
//! and the resulting physical pages replace it in its section, in order.
//!
//! Splitting is a depth-first scan over a node's children. At every level the
//! scan either accepts a child whole, defers it (and every later sibling) to
//! the next page when the [`BreakPredicate`] asks for a break, or recurses into
//! it and splits it in place. There is at most one cut per level per pass;
//! whatever is deferred is broken again on the following page.

use core::fmt;
use smallvec::SmallVec;
use std::sync::{Arc, Mutex};

use crate::break_policy::{BreakFrame, BreakPredicate, BreakPredicateError, DefaultBreakPolicy};
use crate::geometry::{FlowGeometry, GeometryError, PageGeometry};
use crate::node::Node;
use crate::padding::{remove_padding, restore_padding};

/// Pagination limits and policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Maximum physical pages produced from one logical page.
    ///
    /// Suppressed empty pages count against the limit.
    pub max_pages_per_page: usize,
    /// Drop physical pages that would carry no content.
    pub suppress_empty_pages: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_pages_per_page: 1024,
            suppress_empty_pages: true,
        }
    }
}

impl PaginationConfig {
    pub fn with_max_pages_per_page(mut self, limit: usize) -> Self {
        self.max_pages_per_page = limit;
        self
    }

    pub fn with_suppress_empty_pages(mut self, enabled: bool) -> Self {
        self.suppress_empty_pages = enabled;
        self
    }
}

/// Runtime diagnostics from pagination.
#[derive(Clone, Debug, PartialEq)]
pub enum PaginationDiagnostic {
    /// A page was cut at `offset` and its kept part rounded up to `kept_height`.
    PageSplit { offset: f32, kept_height: f32 },
    /// A physical page with no kept content was dropped.
    EmptyPageSuppressed { offset: f32 },
    /// A logical page finished breaking.
    LogicalPageComplete {
        section_index: usize,
        page_index: usize,
        physical_pages: usize,
    },
}

type DiagnosticCallback = Arc<Mutex<Box<dyn FnMut(PaginationDiagnostic) + Send + 'static>>>;
type DiagnosticSink = Option<DiagnosticCallback>;

/// Result of breaking one node.
#[derive(Clone, Debug, PartialEq)]
pub enum BreakOutcome {
    /// Nothing was cut; the node is returned unchanged.
    Whole(Node),
    /// The node was cut at `offset` (in its own coordinate frame).
    Split {
        current: Node,
        next: Node,
        offset: f32,
        /// Whether `current` holds any content beyond split shells.
        kept_content: bool,
    },
}

enum ChildrenOutcome {
    Fits(Vec<Node>),
    Split {
        current: Vec<Node>,
        next: Vec<Node>,
        offset: f32,
        kept_content: bool,
    },
}

/// Round a cut offset up to a whole number of content areas.
fn fill_to_page(offset: f32, content_height: f32) -> f32 {
    (offset / content_height).ceil() * content_height
}

/// Break `node` against a content area of `content_height`.
///
/// On a cut at offset `o` the current part is `ceil(o / h) * h` high and the
/// next part carries the original height minus `o`.
pub fn break_node(
    content_height: f32,
    mut node: Node,
    predicate: &dyn BreakPredicate,
) -> Result<BreakOutcome, PaginationError> {
    let original_height = node.height();
    let children = std::mem::take(&mut node.children);
    let frame = BreakFrame {
        inset: node.layout.padding_top,
        ..BreakFrame::PAGE
    };
    match break_children(content_height, children, frame, predicate)? {
        ChildrenOutcome::Fits(children) => {
            node.children = children;
            Ok(BreakOutcome::Whole(node))
        }
        ChildrenOutcome::Split {
            current,
            next,
            offset,
            kept_content,
        } => {
            let mut current_node = node.clone();
            current_node.children = current;
            current_node.layout.height = Some(fill_to_page(offset, content_height));

            let mut next_node = node;
            next_node.children = next;
            next_node.layout.height = Some(original_height - offset);

            Ok(BreakOutcome::Split {
                current: current_node,
                next: next_node,
                offset,
                kept_content,
            })
        }
    }
}

/// Scan `children`, whose parent origin sits at `frame.base` on the page.
///
/// Returned offsets are in the parent's frame.
fn break_children(
    content_height: f32,
    mut children: Vec<Node>,
    frame: BreakFrame,
    predicate: &dyn BreakPredicate,
) -> Result<ChildrenOutcome, PaginationError> {
    let mut fits = Vec::with_capacity(children.len());

    for i in 0..children.len() {
        let child_frame = BreakFrame {
            leading: frame.leading && fits.is_empty(),
            ..frame
        };
        let should_break = predicate.should_break_in(
            &children[i],
            &children[i + 1..],
            content_height,
            child_frame,
        )?;
        if should_break {
            let offset = children[i].top();
            log::trace!("break before child {} at offset {}", i, offset);
            let mut next = children.split_off(i);
            if let Some(first) = next.first_mut() {
                first.props.break_before = false;
            }
            let kept_content = !fits.is_empty();
            return Ok(ChildrenOutcome::Split {
                current: fits,
                next,
                offset,
                kept_content,
            });
        }

        let mut child = std::mem::take(&mut children[i]);
        let child_top = child.top();
        let child_height = child.height();
        let inner_frame = child_frame.enter(&child);
        let grandchildren = std::mem::take(&mut child.children);

        match break_children(content_height, grandchildren, inner_frame, predicate)? {
            ChildrenOutcome::Fits(grandchildren) => {
                child.children = grandchildren;
                fits.push(child);
            }
            ChildrenOutcome::Split {
                current,
                next: overflow,
                offset: child_offset,
                kept_content,
            } => {
                let offset = child_top + child_offset;

                let mut kept = child.clone();
                kept.children = current;
                kept.layout.height = Some(
                    fill_to_page(frame.base + offset, content_height) - frame.base - child_top,
                );

                let mut remainder = child;
                remainder.children = overflow;
                remainder.layout.height = Some(child_height - child_offset);

                let kept_content = kept_content || !fits.is_empty();
                fits.push(kept);

                let mut next = Vec::with_capacity(children.len() - i);
                next.push(remainder);
                next.extend(children.drain(i + 1..));
                return Ok(ChildrenOutcome::Split {
                    current: fits,
                    next,
                    offset,
                    kept_content,
                });
            }
        }
    }

    Ok(ChildrenOutcome::Fits(fits))
}

/// Page-break engine.
#[derive(Clone)]
pub struct Paginator {
    geometry: Arc<dyn PageGeometry>,
    predicate: Arc<dyn BreakPredicate>,
    config: PaginationConfig,
    diagnostic_sink: DiagnosticSink,
}

impl fmt::Debug for Paginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("config", &self.config)
            .field("has_diagnostic_sink", &self.diagnostic_sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Paginator {
    /// Create a paginator from a geometry provider and a break predicate.
    pub fn new<G, P>(geometry: G, predicate: P) -> Self
    where
        G: PageGeometry + 'static,
        P: BreakPredicate + 'static,
    {
        Self {
            geometry: Arc::new(geometry),
            predicate: Arc::new(predicate),
            config: PaginationConfig::default(),
            diagnostic_sink: None,
        }
    }

    /// Flowing pages of `page_height` with the default break rules.
    pub fn for_page_height(page_height: f32) -> Self {
        Self::new(FlowGeometry::new(page_height), DefaultBreakPolicy)
    }

    pub fn with_config(mut self, config: PaginationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> PaginationConfig {
        self.config
    }

    /// Register or replace the diagnostics sink.
    pub fn set_diagnostic_sink<F>(&mut self, sink: F)
    where
        F: FnMut(PaginationDiagnostic) + Send + 'static,
    {
        self.diagnostic_sink = Some(Arc::new(Mutex::new(Box::new(sink))));
    }

    fn emit_diagnostic(&self, diagnostic: PaginationDiagnostic) {
        let Some(sink) = &self.diagnostic_sink else {
            return;
        };
        if let Ok(mut sink) = sink.lock() {
            sink(diagnostic);
        }
    }

    /// Replace every logical page of every section with its physical pages.
    pub fn resolve_page_breaks(&self, mut root: Node) -> Result<Node, PaginationError> {
        for (section_index, section) in root.children.iter_mut().enumerate() {
            let logical_pages = std::mem::take(&mut section.children);
            let mut physical = Vec::with_capacity(logical_pages.len());
            for (page_index, page) in logical_pages.into_iter().enumerate() {
                let pages = self.break_page(page)?;
                log::debug!(
                    "section {} page {} -> {} physical page(s)",
                    section_index,
                    page_index,
                    pages.len()
                );
                self.emit_diagnostic(PaginationDiagnostic::LogicalPageComplete {
                    section_index,
                    page_index,
                    physical_pages: pages.len(),
                });
                physical.extend(pages);
            }
            section.children = physical;
        }
        Ok(root)
    }

    /// Break one logical page into physical pages.
    pub fn break_page(&self, page: Node) -> Result<Vec<Node>, PaginationError> {
        let content_height = self.geometry.content_area(&page)?;
        if !content_height.is_finite() || content_height <= 0.0 {
            return Err(PaginationError::InvalidContentArea {
                height: content_height,
            });
        }

        let (page, removed) = remove_padding(page);
        let mut pages: SmallVec<[Node; 2]> = SmallVec::new();
        let mut pending = Some(page);
        let mut iterations = 0usize;

        while let Some(page) = pending.take() {
            if iterations >= self.config.max_pages_per_page {
                log::warn!(
                    "page break limit reached after {} page(s) (content height {})",
                    iterations,
                    content_height
                );
                return Err(PaginationError::PageLimitExceeded {
                    limit: self.config.max_pages_per_page,
                });
            }
            let page = if iterations == 0 {
                page
            } else {
                self.geometry
                    .resolve_continuation(page.with_unresolved_height())?
            };
            iterations += 1;

            match break_node(content_height, page, self.predicate.as_ref())? {
                BreakOutcome::Whole(page) => pages.push(page),
                BreakOutcome::Split {
                    current,
                    next,
                    offset,
                    kept_content,
                } => {
                    if !kept_content && self.config.suppress_empty_pages {
                        log::debug!("suppressing empty page cut at {}", offset);
                        self.emit_diagnostic(PaginationDiagnostic::EmptyPageSuppressed { offset });
                    } else {
                        log::debug!("page cut at {} kept {}", offset, current.height());
                        self.emit_diagnostic(PaginationDiagnostic::PageSplit {
                            offset,
                            kept_height: current.height(),
                        });
                        pages.push(current);
                    }
                    pending = Some(next);
                }
            }
        }

        Ok(pages
            .into_iter()
            .map(|page| restore_padding(page, removed))
            .collect())
    }
}

/// Pagination failure.
#[derive(Debug, Clone, PartialEq)]
pub enum PaginationError {
    /// The break predicate failed.
    Predicate(BreakPredicateError),
    /// A geometry provider failed.
    Geometry(GeometryError),
    /// The content area is not a positive finite height.
    InvalidContentArea { height: f32 },
    /// One logical page kept producing pages past the configured limit.
    PageLimitExceeded { limit: usize },
}

impl fmt::Display for PaginationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(err) => write!(f, "page break failed: {}", err),
            Self::Geometry(err) => write!(f, "page break failed: {}", err),
            Self::InvalidContentArea { height } => {
                write!(f, "content area must be positive and finite (got {})", height)
            }
            Self::PageLimitExceeded { limit } => write!(
                f,
                "content does not converge: more than {} physical pages for one page",
                limit
            ),
        }
    }
}

impl std::error::Error for PaginationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Predicate(err) => Some(err),
            Self::Geometry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BreakPredicateError> for PaginationError {
    fn from(value: BreakPredicateError) -> Self {
        Self::Predicate(value)
    }
}

impl From<GeometryError> for PaginationError {
    fn from(value: GeometryError) -> Self {
        Self::Geometry(value)
    }
}
