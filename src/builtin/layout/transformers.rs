//! Built-in layout transformers.
use crate::{
    core::layout::{Layout, LayoutTransformer},
    pure::geometry::Rect,
    Xid,
};

/// Run the wrapped layout with its x and y axes swapped.
///
/// The screen dimensions are transposed before being handed to the inner
/// layout and every position it generates is transposed back, turning a
/// layout that tiles left-to-right into one that tiles top-to-bottom (and
/// vice versa). Wrapping a layout in [Mirror] twice gives back the original
/// placements.
#[derive(Debug, Clone)]
pub struct Mirror {
    /// The wrapped inner layout.
    pub layout: Box<dyn Layout>,
}

impl Mirror {
    /// Wrap an existing layout, mirroring its placements.
    pub fn wrap(layout: Box<dyn Layout>) -> Box<dyn Layout> {
        Box::new(Self { layout })
    }
}

impl LayoutTransformer for Mirror {
    fn transformed_name(&self) -> String {
        format!("Mirror<{}>", self.layout.name())
    }

    fn inner_mut(&mut self) -> &mut Box<dyn Layout> {
        &mut self.layout
    }

    fn transform_initial(&self, r: Rect) -> Rect {
        r.transposed()
    }

    fn transform_positions(&mut self, _r: Rect, positions: Vec<(Xid, Rect)>) -> Vec<(Xid, Rect)> {
        positions
            .into_iter()
            .map(|(id, r)| (id, r.transposed()))
            .collect()
    }
}

/// Reserve `px` pixels at the top of the screen.
///
/// Typically used for providing space for a status bar on workspaces whose
/// screen has no [StatusGap][crate::pure::StatusGap] configured.
#[derive(Debug, Clone)]
pub struct ReserveTop {
    /// The wrapped inner layout.
    pub layout: Box<dyn Layout>,
    /// The number of pixels to reserve.
    pub px: u32,
}

impl ReserveTop {
    /// Wrap an existing layout, reserving space above it.
    pub fn wrap(layout: Box<dyn Layout>, px: u32) -> Box<dyn Layout> {
        Box::new(Self { layout, px })
    }
}

impl LayoutTransformer for ReserveTop {
    fn transformed_name(&self) -> String {
        self.layout.name()
    }

    fn inner_mut(&mut self) -> &mut Box<dyn Layout> {
        &mut self.layout
    }

    fn transform_initial(&self, mut r: Rect) -> Rect {
        if r.w == 0 || r.h == 0 {
            return r;
        }

        r.y += self.px;
        r.h = r.h.saturating_sub(self.px).max(1);

        r
    }
}
