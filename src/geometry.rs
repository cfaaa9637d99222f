//! Page geometry providers consumed by the page-break engine.

use core::fmt;

use crate::node::Node;

/// Supplies content-area heights and continuation-page geometry.
pub trait PageGeometry: Send + Sync {
    /// Printable height of `page`, excluding its own padding.
    ///
    /// Called once per logical page, before padding is removed.
    fn content_area(&self, page: &Node) -> Result<f32, GeometryError>;

    /// Recompute geometry for a continuation page.
    ///
    /// `page` arrives with its own padding removed and its height unresolved.
    /// The returned page must carry a resolved height.
    fn resolve_continuation(&self, page: Node) -> Result<Node, GeometryError>;
}

impl<G: PageGeometry + ?Sized> PageGeometry for &G {
    fn content_area(&self, page: &Node) -> Result<f32, GeometryError> {
        (**self).content_area(page)
    }

    fn resolve_continuation(&self, page: Node) -> Result<Node, GeometryError> {
        (**self).resolve_continuation(page)
    }
}

/// Geometry for fixed-height media with vertically flowing content.
///
/// Continuation pages restart the leading child chain at the top of the
/// content area (the chain that carries the remainder of a split subtree)
/// and resolve the page height to its content extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowGeometry {
    page_height: f32,
}

impl FlowGeometry {
    /// A4 portrait height in points.
    pub const A4_HEIGHT_PT: f32 = 841.89;

    pub fn new(page_height: f32) -> Self {
        Self { page_height }
    }

    pub fn page_height(&self) -> f32 {
        self.page_height
    }
}

impl Default for FlowGeometry {
    fn default() -> Self {
        Self::new(Self::A4_HEIGHT_PT)
    }
}

impl PageGeometry for FlowGeometry {
    fn content_area(&self, page: &Node) -> Result<f32, GeometryError> {
        if !self.page_height.is_finite() {
            return Err(GeometryError::InvalidPageHeight(self.page_height));
        }
        Ok(self.page_height - page.layout.vertical_padding())
    }

    fn resolve_continuation(&self, mut page: Node) -> Result<Node, GeometryError> {
        restart_leading_chain(&mut page.children, page.layout.padding_top);
        let height = page.content_extent() + page.layout.padding_bottom;
        if !height.is_finite() {
            return Err(GeometryError::Unresolved("continuation page height"));
        }
        page.layout.height = Some(height);
        Ok(page)
    }
}

fn restart_leading_chain(children: &mut [Node], inset: f32) {
    let Some(first) = children.first() else {
        return;
    };
    let shift = first.top() - inset;
    if shift > 0.0 {
        for child in children.iter_mut() {
            child.layout.top -= shift;
        }
    }
    if let Some(first) = children.first_mut() {
        let inset = first.layout.padding_top;
        restart_leading_chain(&mut first.children, inset);
    }
}

/// Geometry provider failure.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryError {
    /// Configured page height is not a finite number.
    InvalidPageHeight(f32),
    /// A dimension could not be resolved.
    Unresolved(&'static str),
    /// Failure reported by an external provider.
    Provider(String),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPageHeight(height) => write!(f, "invalid page height: {}", height),
            Self::Unresolved(what) => write!(f, "unresolved geometry: {}", what),
            Self::Provider(msg) => write!(f, "geometry provider failed: {}", msg),
        }
    }
}

impl std::error::Error for GeometryError {}
