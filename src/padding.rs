//! Removal and restoration of a page's own vertical padding around break
//! computation.

use crate::node::Node;

/// Padding taken off a page by [`remove_padding`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RemovedPadding {
    pub top: f32,
    pub bottom: f32,
    /// Page height before and after removal, when it was resolved.
    heights: Option<(f32, f32)>,
}

impl RemovedPadding {
    pub fn total(self) -> f32 {
        self.top + self.bottom
    }

    pub fn is_empty(self) -> bool {
        self.top == 0.0 && self.bottom == 0.0
    }
}

/// Zero the page's own vertical padding so its content starts at offset 0.
///
/// Immediate children move up by the removed top padding and the page height
/// shrinks by the removed total. The returned record must be handed back to
/// [`restore_padding`] for every physical page derived from `page`.
pub fn remove_padding(mut page: Node) -> (Node, RemovedPadding) {
    let mut removed = RemovedPadding {
        top: page.layout.padding_top,
        bottom: page.layout.padding_bottom,
        heights: None,
    };
    page.layout.padding_top = 0.0;
    page.layout.padding_bottom = 0.0;
    if let Some(height) = page.layout.height {
        let stripped = height - removed.total();
        removed.heights = Some((height, stripped));
        page.layout.height = Some(stripped);
    }
    for child in &mut page.children {
        child.layout.top -= removed.top;
    }
    (page, removed)
}

/// Inverse of [`remove_padding`].
///
/// A page still at its stripped height gets its original height back
/// bit for bit. Any other height, and every child offset, is restored by
/// adding the padding, which can differ from the original in the last f32
/// bit for fractional values.
pub fn restore_padding(mut page: Node, removed: RemovedPadding) -> Node {
    page.layout.padding_top = removed.top;
    page.layout.padding_bottom = removed.bottom;
    page.layout.height = page.layout.height.map(|height| match removed.heights {
        Some((original, stripped)) if height == stripped => original,
        _ => height + removed.total(),
    });
    for child in &mut page.children {
        child.layout.top += removed.top;
    }
    page
}
