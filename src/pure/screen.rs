use crate::pure::{geometry::Rect, Workspace};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pixels reserved at each edge of a screen, typically for a status bar or
/// dock. The area handed to layouts is the screen rect shrunk by its gap.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusGap {
    /// Pixels reserved at the top edge
    pub top: u32,
    /// Pixels reserved at the bottom edge
    pub bottom: u32,
    /// Pixels reserved at the left edge
    pub left: u32,
    /// Pixels reserved at the right edge
    pub right: u32,
}

impl StatusGap {
    /// Create a new StatusGap from per-edge pixel values.
    pub fn new(top: u32, bottom: u32, left: u32, right: u32) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    // Shrink a rect by this gap, keeping a minimum extent of 1x1.
    pub(crate) fn applied_to(&self, r: &Rect) -> Rect {
        let w = r.w.saturating_sub(self.left + self.right).max(1);
        let h = r.h.saturating_sub(self.top + self.bottom).max(1);

        Rect {
            x: r.x + self.left,
            y: r.y + self.top,
            w,
            h,
        }
    }
}

impl From<(u32, u32, u32, u32)> for StatusGap {
    fn from(raw: (u32, u32, u32, u32)) -> Self {
        let (top, bottom, left, right) = raw;

        Self::new(top, bottom, left, right)
    }
}

/// A wrapper around a single [Workspace] that includes the dimensions of the
/// physical screen it is displayed on.
#[derive(Default, Debug, Clone)]
pub struct Screen<C> {
    pub(crate) index: usize,
    /// The [Workspace] currently visible on this screen
    pub workspace: Workspace<C>,
    pub(crate) r: Rect,
    pub(crate) gap: StatusGap,
}

impl<C: fmt::Display> fmt::Display for Screen<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Screen({}: {:?}, workspace: {})",
            self.index, self.r, self.workspace.tag
        )
    }
}

impl<C> Screen<C> {
    /// The index of this screen.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The full dimensions of this [Screen] as a [Rect].
    pub fn geometry(&self) -> Rect {
        self.r
    }

    /// The gap reserved on this screen for status bars and docks.
    pub fn gap(&self) -> StatusGap {
        self.gap
    }

    /// The dimensions of this [Screen] available for laying out windows:
    /// the screen rect shrunk by the status gap.
    pub fn visible_rect(&self) -> Rect {
        self.gap.applied_to(&self.r)
    }
}
