//! Break-eligibility predicates.

use core::fmt;

use crate::node::Node;

/// Where the children being scanned sit on the page being broken.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreakFrame {
    /// Page-frame offset of the parent's origin.
    pub base: f32,
    /// Parent's content inset. A leading child at or above it starts the page.
    pub inset: f32,
    /// No content precedes the child on the current page.
    pub leading: bool,
}

impl BreakFrame {
    /// Frame of a page's direct children.
    pub const PAGE: BreakFrame = BreakFrame {
        base: 0.0,
        inset: 0.0,
        leading: true,
    };

    /// Page-frame top of `child`.
    pub fn top_of(&self, child: &Node) -> f32 {
        self.base + child.top()
    }

    /// Page-frame bottom of `child`.
    pub fn bottom_of(&self, child: &Node) -> f32 {
        self.base + child.bottom()
    }

    /// Whether `child` opens the current page.
    pub fn starts_page(&self, child: &Node) -> bool {
        self.leading && child.top() <= self.inset
    }

    /// Frame for the children of `child`.
    pub fn enter(&self, child: &Node) -> BreakFrame {
        BreakFrame {
            base: self.top_of(child),
            inset: child.layout.padding_top,
            leading: self.leading,
        }
    }
}

impl Default for BreakFrame {
    fn default() -> Self {
        Self::PAGE
    }
}

/// Decides whether a page break must occur immediately before `child`.
///
/// `following` holds the siblings after `child` in document order and
/// `content_height` is the content-area height of the page being broken.
pub trait BreakPredicate: Send + Sync {
    fn should_break(
        &self,
        child: &Node,
        following: &[Node],
        content_height: f32,
    ) -> Result<bool, BreakPredicateError>;

    /// Same decision with the page position of `child`'s parent known.
    ///
    /// The page-break engine calls this one. The default ignores `frame`.
    fn should_break_in(
        &self,
        child: &Node,
        following: &[Node],
        content_height: f32,
        frame: BreakFrame,
    ) -> Result<bool, BreakPredicateError> {
        let _ = frame;
        self.should_break(child, following, content_height)
    }
}

impl<F> BreakPredicate for F
where
    F: Fn(&Node, &[Node], f32) -> Result<bool, BreakPredicateError> + Send + Sync,
{
    fn should_break(
        &self,
        child: &Node,
        following: &[Node],
        content_height: f32,
    ) -> Result<bool, BreakPredicateError> {
        self(child, following, content_height)
    }
}

/// Predicate that only honours forced break directives.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverBreak;

impl BreakPredicate for NeverBreak {
    fn should_break(
        &self,
        child: &Node,
        _following: &[Node],
        _content_height: f32,
    ) -> Result<bool, BreakPredicateError> {
        Ok(child.props.break_before)
    }
}

/// Break rules for flowing documents.
///
/// A break is placed before a child when:
/// - the child carries a forced break directive;
/// - the child is atomic (a leaf, or marked `wrap: false`), it crosses the
///   bottom of the content area, and it does not already open the page;
/// - the child asks for `min_presence_ahead` and less than that much of its
///   following siblings would land on the current page.
///
/// Offsets are measured in the page frame supplied by the engine. Called
/// through [`BreakPredicate::should_break`], the child is taken to be a
/// direct page child.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultBreakPolicy;

impl BreakPredicate for DefaultBreakPolicy {
    fn should_break(
        &self,
        child: &Node,
        following: &[Node],
        content_height: f32,
    ) -> Result<bool, BreakPredicateError> {
        self.should_break_in(child, following, content_height, BreakFrame::PAGE)
    }

    fn should_break_in(
        &self,
        child: &Node,
        following: &[Node],
        content_height: f32,
        frame: BreakFrame,
    ) -> Result<bool, BreakPredicateError> {
        if !content_height.is_finite() || content_height <= 0.0 {
            return Err(BreakPredicateError::InvalidContentHeight(content_height));
        }
        if child.props.break_before {
            return Ok(true);
        }

        let at_top = frame.starts_page(child);
        let atomic = child.is_leaf() || !child.props.is_wrappable();
        if atomic && !at_top && frame.bottom_of(child) > content_height {
            log::trace!(
                "atomic node at {} (height {}) crosses content bottom {}",
                frame.top_of(child),
                child.height(),
                content_height
            );
            return Ok(true);
        }

        if let Some(min_presence) = child.props.min_presence_ahead {
            if !at_top && !following.is_empty() {
                let presence = presence_ahead(following, content_height, frame);
                if presence < min_presence {
                    log::trace!(
                        "presence ahead {} below requested {} at {}",
                        presence,
                        min_presence,
                        frame.top_of(child)
                    );
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

/// Height of `following` that lands above the bottom of the content area.
fn presence_ahead(following: &[Node], content_height: f32, frame: BreakFrame) -> f32 {
    following
        .iter()
        .map(|node| {
            let visible = content_height - frame.top_of(node);
            node.height().min(visible).max(0.0)
        })
        .sum()
}

/// Break predicate failure.
#[derive(Clone, Debug, PartialEq)]
pub enum BreakPredicateError {
    /// The content-area height handed to the predicate is unusable.
    InvalidContentHeight(f32),
    /// Failure reported by an external predicate.
    Rejected(String),
}

impl fmt::Display for BreakPredicateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidContentHeight(height) => {
                write!(f, "invalid content height for break decision: {}", height)
            }
            Self::Rejected(msg) => write!(f, "break predicate failed: {}", msg),
        }
    }
}

impl std::error::Error for BreakPredicateError {}
