//! Layout orchestration: eleven resolution stages run strictly in order.
//!
//! Each stage is a whole-tree transform. Stages never overlap; a stage only
//! starts once the previous one has produced its tree, and the first failure
//! aborts the run without yielding a partial tree. Stages that are not
//! installed pass the tree through untouched.

use core::fmt;
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "async")]
use std::future::Future;
#[cfg(feature = "async")]
use std::pin::Pin;

use crate::node::Node;
use crate::page_breaks::{PaginationError, Paginator};

/// Resolution stages in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKind {
    /// Page dimensions from configured media.
    PageSizes,
    /// Page margin adjustments.
    PageMargins,
    /// Internal link target rewriting.
    LinkSubstitution,
    /// Effective style per node.
    Styles,
    /// Downward propagation of inheritable properties.
    Inheritance,
    /// Page padding adjustments.
    PagePaddings,
    /// External resource loading and measurement.
    Assets,
    /// Measured widths and heights.
    Dimensions,
    /// Line breaking with final widths.
    TextLayout,
    /// Offsets from sibling flow rules.
    Origins,
    /// Relative offsets flattened to absolute coordinates.
    AbsoluteCoordinates,
}

impl StageKind {
    /// Every stage, in execution order.
    pub const ALL: [StageKind; 11] = [
        StageKind::PageSizes,
        StageKind::PageMargins,
        StageKind::LinkSubstitution,
        StageKind::Styles,
        StageKind::Inheritance,
        StageKind::PagePaddings,
        StageKind::Assets,
        StageKind::Dimensions,
        StageKind::TextLayout,
        StageKind::Origins,
        StageKind::AbsoluteCoordinates,
    ];

    /// Position in execution order.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PageSizes => "resolve_page_sizes",
            Self::PageMargins => "resolve_page_margins",
            Self::LinkSubstitution => "resolve_link_substitution",
            Self::Styles => "resolve_styles",
            Self::Inheritance => "resolve_inheritance",
            Self::PagePaddings => "resolve_page_paddings",
            Self::Assets => "resolve_assets",
            Self::Dimensions => "resolve_dimensions",
            Self::TextLayout => "resolve_text_layout",
            Self::Origins => "resolve_origins",
            Self::AbsoluteCoordinates => "resolve_absolute_coordinates",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Synchronous whole-tree transform.
pub trait LayoutStage: Send + Sync {
    fn resolve(&self, tree: Node) -> Result<Node, StageError>;
}

impl<F> LayoutStage for F
where
    F: Fn(Node) -> Result<Node, StageError> + Send + Sync,
{
    fn resolve(&self, tree: Node) -> Result<Node, StageError> {
        self(tree)
    }
}

/// Boxed future returned by [`AsyncLayoutStage::resolve`].
#[cfg(feature = "async")]
pub type StageFuture<'a> = Pin<Box<dyn Future<Output = Result<Node, StageError>> + Send + 'a>>;

/// Whole-tree transform that may suspend, typically while performing I/O.
#[cfg(feature = "async")]
pub trait AsyncLayoutStage: Send + Sync {
    fn resolve(&self, tree: Node) -> StageFuture<'_>;
}

#[cfg(feature = "async")]
impl<F, Fut> AsyncLayoutStage for F
where
    F: Fn(Node) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Node, StageError>> + Send + 'static,
{
    fn resolve(&self, tree: Node) -> StageFuture<'_> {
        Box::pin(self(tree))
    }
}

#[derive(Clone)]
enum StageSlot {
    PassThrough,
    Sync(Arc<dyn LayoutStage>),
    #[cfg(feature = "async")]
    Async(Arc<dyn AsyncLayoutStage>),
}

impl StageSlot {
    fn is_async(&self) -> bool {
        match self {
            #[cfg(feature = "async")]
            Self::Async(_) => true,
            _ => false,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass-through",
            Self::Sync(_) => "sync",
            #[cfg(feature = "async")]
            Self::Async(_) => "async",
        }
    }
}

/// Ordered resolution pipeline. Holds no per-run state.
#[derive(Clone)]
pub struct LayoutPipeline {
    stages: [StageSlot; 11],
}

impl Default for LayoutPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LayoutPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in StageKind::ALL {
            map.entry(&kind.name(), &self.stages[kind.index()].label());
        }
        map.finish()
    }
}

impl LayoutPipeline {
    /// Pipeline where every stage passes the tree through.
    pub fn new() -> Self {
        Self {
            stages: std::array::from_fn(|_| StageSlot::PassThrough),
        }
    }

    /// Install a synchronous stage, replacing whatever held `kind`.
    pub fn with_stage<S>(mut self, kind: StageKind, stage: S) -> Self
    where
        S: LayoutStage + 'static,
    {
        self.stages[kind.index()] = StageSlot::Sync(Arc::new(stage));
        self
    }

    /// Install a suspending stage, replacing whatever held `kind`.
    #[cfg(feature = "async")]
    pub fn with_async_stage<S>(mut self, kind: StageKind, stage: S) -> Self
    where
        S: AsyncLayoutStage + 'static,
    {
        self.stages[kind.index()] = StageSlot::Async(Arc::new(stage));
        self
    }

    /// Whether any installed stage needs [`layout_async`](Self::layout_async).
    pub fn is_async(&self) -> bool {
        self.first_async_stage().is_some()
    }

    fn first_async_stage(&self) -> Option<StageKind> {
        StageKind::ALL
            .into_iter()
            .find(|kind| self.stages[kind.index()].is_async())
    }

    /// Run every stage synchronously.
    ///
    /// Fails up front with [`LayoutError::AsyncStage`] if a suspending stage
    /// is installed.
    pub fn layout(&self, tree: Node) -> Result<Node, LayoutError> {
        if let Some(kind) = self.first_async_stage() {
            return Err(LayoutError::AsyncStage { stage: kind });
        }

        let started = Instant::now();
        let mut tree = tree;
        for kind in StageKind::ALL {
            tree = match &self.stages[kind.index()] {
                StageSlot::PassThrough => tree,
                StageSlot::Sync(stage) => run_sync(kind, stage.as_ref(), tree)?,
                #[cfg(feature = "async")]
                StageSlot::Async(_) => return Err(LayoutError::AsyncStage { stage: kind }),
            };
        }
        log::debug!("layout finished in {:?}", started.elapsed());
        Ok(tree)
    }

    /// Run every stage in order, awaiting suspending stages one at a time.
    #[cfg(feature = "async")]
    pub async fn layout_async(&self, tree: Node) -> Result<Node, LayoutError> {
        let started = Instant::now();
        let mut tree = tree;
        for kind in StageKind::ALL {
            tree = match &self.stages[kind.index()] {
                StageSlot::PassThrough => tree,
                StageSlot::Sync(stage) => run_sync(kind, stage.as_ref(), tree)?,
                StageSlot::Async(stage) => {
                    let stage_started = Instant::now();
                    let tree = stage
                        .resolve(tree)
                        .await
                        .map_err(|source| LayoutError::Stage {
                            stage: kind,
                            source,
                        })?;
                    log::debug!("{} (async) took {:?}", kind, stage_started.elapsed());
                    tree
                }
            };
        }
        log::debug!("async layout finished in {:?}", started.elapsed());
        Ok(tree)
    }

    /// Lay out `tree`, then break its pages.
    pub fn paginate(&self, tree: Node, paginator: &Paginator) -> Result<Node, LayoutError> {
        let tree = self.layout(tree)?;
        Ok(paginator.resolve_page_breaks(tree)?)
    }

    /// Asynchronous counterpart of [`paginate`](Self::paginate).
    #[cfg(feature = "async")]
    pub async fn paginate_async(
        &self,
        tree: Node,
        paginator: &Paginator,
    ) -> Result<Node, LayoutError> {
        let tree = self.layout_async(tree).await?;
        Ok(paginator.resolve_page_breaks(tree)?)
    }
}

fn run_sync(kind: StageKind, stage: &dyn LayoutStage, tree: Node) -> Result<Node, LayoutError> {
    let started = Instant::now();
    let tree = stage.resolve(tree).map_err(|source| {
        log::debug!("{} failed: {}", kind, source);
        LayoutError::Stage {
            stage: kind,
            source,
        }
    })?;
    log::debug!("{} took {:?}", kind, started.elapsed());
    Ok(tree)
}

/// Failure raised by a resolution stage.
#[derive(Debug)]
pub struct StageError {
    inner: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl StageError {
    /// Wrap any error or message.
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self { inner: err.into() }
    }

    /// Borrow the wrapped error.
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.inner.as_ref()
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

/// Layout run failure.
#[derive(Debug)]
pub enum LayoutError {
    /// A stage failed; later stages did not run.
    Stage { stage: StageKind, source: StageError },
    /// A suspending stage was installed but the run was synchronous.
    AsyncStage { stage: StageKind },
    /// Page breaking failed.
    Pagination(PaginationError),
}

impl LayoutError {
    /// Stage that failed, if the failure came from a stage.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            Self::Stage { stage, .. } | Self::AsyncStage { stage } => Some(*stage),
            Self::Pagination(_) => None,
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage { stage, source } => write!(f, "{} failed: {}", stage, source),
            Self::AsyncStage { stage } => {
                write!(f, "{} suspends and needs an async layout run", stage)
            }
            Self::Pagination(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Stage { source, .. } => Some(source),
            Self::AsyncStage { .. } => None,
            Self::Pagination(err) => Some(err),
        }
    }
}

impl From<PaginationError> for LayoutError {
    fn from(value: PaginationError) -> Self {
        Self::Pagination(value)
    }
}
