use eframe::egui;

use crate::model::VolumeExtent;

use super::transform::Placement;
use super::{Result, SelectionError};

/// Pending depth range. The two ends are kept in the order they were produced;
/// use [`SelectionRange::bounds`] for a normalized `(low, high)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionRange {
    ends: Option<(usize, usize)>,
}

impl SelectionRange {
    pub const fn empty() -> Self {
        Self { ends: None }
    }

    pub const fn new(start: usize, end: usize) -> Self {
        Self {
            ends: Some((start, end)),
        }
    }

    pub fn start(&self) -> Option<usize> {
        self.ends.map(|(start, _)| start)
    }

    pub fn end(&self) -> Option<usize> {
        self.ends.map(|(_, end)| end)
    }

    pub fn has_selection(&self) -> bool {
        self.ends.is_some()
    }

    pub fn bounds(&self) -> Option<(usize, usize)> {
        self.ends.map(|(start, end)| (start.min(end), start.max(end)))
    }

    pub fn contains(&self, z: usize) -> bool {
        self.bounds().is_some_and(|(low, high)| low <= z && z <= high)
    }

    pub fn clear(&mut self) {
        self.ends = None;
    }
}

/// Rubber band drawn with the primary button, in on-screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragBox {
    pub active: bool,
    pub start: egui::Pos2,
    pub end: egui::Pos2,
}

impl DragBox {
    pub fn begin(at: egui::Pos2) -> Self {
        Self {
            active: true,
            start: at,
            end: at,
        }
    }

    pub fn rect(&self) -> egui::Rect {
        egui::Rect::from_two_pos(self.start, self.end)
    }
}

/// Converts the vertical span of a drag box on a cross-sectional view into depth
/// indices, each clamped on its own to the volume.
pub fn range_from_box(
    drag: &DragBox,
    placement: &Placement,
    extent: &VolumeExtent,
) -> SelectionRange {
    if placement.is_empty() {
        return SelectionRange::empty();
    }
    let depth = extent.depth_count();
    let rect = drag.rect();
    let start = placement.screen_y_to_depth(rect.top(), depth);
    let end = placement.screen_y_to_depth(rect.bottom(), depth);
    SelectionRange::new(extent.clamp_depth(start), extent.clamp_depth(end))
}

/// Validates numeric entry. Unlike gestures, typed values outside the volume are rejected.
pub fn range_from_inputs(start: i64, end: i64, extent: &VolumeExtent) -> Result<SelectionRange> {
    let max = extent.depth_count().saturating_sub(1);
    for value in [start, end] {
        if value < 0 || value > max as i64 {
            return Err(SelectionError::OutOfRange { value, max });
        }
    }
    Ok(SelectionRange::new(start as usize, end as usize))
}
