//! Layout orchestration and page fragmentation for box-model documents.
//!
//! A document tree runs through [`LayoutPipeline`], which applies eleven
//! resolution stages in a fixed order, and then through [`Paginator`], which
//! splits every logical page into as many fixed-height physical pages as its
//! content needs.
//!
//! ```
//! use folio::{LayoutPipeline, Node, Paginator};
//!
//! let page = Node::new(800.0).with_children(vec![
//!     Node::new(400.0).with_top(0.0),
//!     Node::new(400.0).with_top(400.0),
//! ]);
//! let root = Node::container(vec![Node::container(vec![page])]);
//!
//! let paginated = LayoutPipeline::new()
//!     .paginate(root, &Paginator::for_page_height(700.0))
//!     .unwrap();
//! assert_eq!(paginated.children[0].children.len(), 2);
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod break_policy;
mod geometry;
mod node;
mod padding;
mod page_breaks;
mod pipeline;

pub use break_policy::{
    BreakFrame, BreakPredicate, BreakPredicateError, DefaultBreakPolicy, NeverBreak,
};
pub use geometry::{FlowGeometry, GeometryError, PageGeometry};
pub use node::{BoxModel, Node, Props};
pub use padding::{remove_padding, restore_padding, RemovedPadding};
pub use page_breaks::{
    break_node, BreakOutcome, PaginationConfig, PaginationDiagnostic, PaginationError, Paginator,
};
#[cfg(feature = "async")]
pub use pipeline::{AsyncLayoutStage, StageFuture};
pub use pipeline::{LayoutError, LayoutPipeline, LayoutStage, StageError, StageKind};
