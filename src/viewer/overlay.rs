use eframe::egui::{self, Color32, Stroke};
use serde::{Deserialize, Serialize};

use crate::model::{
    Annotation, AnnotationId, Axis, Confidence, PlaqueType, Presence, VolumeExtent,
};

use super::selection::{DragBox, SelectionRange};
use super::transform::Placement;

pub const HIGHLIGHT: Color32 = Color32::from_rgb(0xff, 0xeb, 0x3b);
pub const DEPTH_LINE: Color32 = Color32::from_rgba_premultiplied(160, 0, 0, 160);
pub const SELECTION_LINE: Color32 = Color32::from_rgba_premultiplied(0, 160, 0, 160);
pub const DRAG_FILL: Color32 = Color32::from_rgba_premultiplied(26, 24, 6, 26);

/// Draw order of overlay primitives, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Bands,
    Borders,
    Highlight,
    DepthLine,
    SelectionBounds,
    DragBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAnchor {
    RightBottom,
    RightTop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    FillRect {
        rect: egui::Rect,
        color: Color32,
    },
    StrokeRect {
        rect: egui::Rect,
        stroke: Stroke,
    },
    DashedRect {
        rect: egui::Rect,
        stroke: Stroke,
        dash: f32,
        gap: f32,
    },
    DashedLine {
        from: egui::Pos2,
        to: egui::Pos2,
        stroke: Stroke,
        dash: f32,
        gap: f32,
    },
    Label {
        at: egui::Pos2,
        anchor: LabelAnchor,
        text: String,
        color: Color32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub layer: Layer,
    pub shape: Shape,
}

impl Primitive {
    fn new(layer: Layer, shape: Shape) -> Self {
        Self { layer, shape }
    }
}

/// Stroke widths and spacing for overlays, in on-screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub band_alpha: u8,
    pub border_width: f32,
    pub highlight_width: f32,
    pub highlight_margin: f32,
    pub depth_line_width: f32,
    pub depth_frame_width: f32,
    pub depth_selection_width: f32,
    pub depth_selection_inset: f32,
    pub label_offset: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            band_alpha: 0x60,
            border_width: 2.0,
            highlight_width: 4.0,
            highlight_margin: 2.0,
            depth_line_width: 2.0,
            depth_frame_width: 3.0,
            depth_selection_width: 4.0,
            depth_selection_inset: 2.0,
            label_offset: 5.0,
        }
    }
}

/// Band color on the cross-sectional views, keyed by presence first and then
/// by plaque type.
pub fn band_color(annotation: &Annotation) -> Color32 {
    match annotation.presence {
        Some(Presence::Absent) => Color32::from_rgb(0x80, 0x80, 0x80),
        Some(Presence::Present) => match annotation.type_main {
            Some(PlaqueType::Calcified) => Color32::from_rgb(0x87, 0xce, 0xeb),
            Some(PlaqueType::NonCalcified) => Color32::from_rgb(0xff, 0xa5, 0x00),
            Some(PlaqueType::Mixed) => Color32::from_rgb(0x93, 0x70, 0xdb),
            Some(PlaqueType::Uncertain) | None => Color32::from_rgb(0xff, 0xd7, 0x00),
        },
        Some(Presence::Suspected) => Color32::from_rgb(0xff, 0xff, 0x00),
        None => Color32::from_rgb(0xa9, 0xa9, 0xa9),
    }
}

/// Frame color on the depth view, keyed by confidence.
pub fn frame_color(annotation: &Annotation) -> Color32 {
    match annotation.confidence {
        Confidence::High => Color32::from_rgb(0x4c, 0xaf, 0x50),
        Confidence::Medium => Color32::from_rgb(0x21, 0x96, 0xf3),
        Confidence::Low => Color32::from_rgb(0xff, 0x98, 0x00),
    }
}

fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub struct OverlayInput<'a> {
    pub axis: Axis,
    pub placement: &'a Placement,
    pub extent: &'a VolumeExtent,
    pub annotations: &'a [Annotation],
    pub selection: SelectionRange,
    pub current_z: usize,
    pub selected_id: Option<&'a AnnotationId>,
    pub drag_box: Option<&'a DragBox>,
    pub style: &'a OverlayStyle,
}

/// Produces the overlay primitives for one view, ordered by [`Layer`] and, within
/// a layer, by annotation list order.
pub fn compose(input: &OverlayInput<'_>) -> Vec<Primitive> {
    if input.placement.is_empty() {
        return Vec::new();
    }
    let mut primitives = if input.axis.is_cross_section() {
        compose_cross_section(input)
    } else {
        compose_depth_view(input)
    };
    primitives.sort_by_key(|primitive| primitive.layer);
    primitives
}

fn compose_cross_section(input: &OverlayInput<'_>) -> Vec<Primitive> {
    let style = input.style;
    let rect = input.placement.rect;
    let depth = input.extent.depth_count();
    let max_z = input.extent.max_index(Axis::Z);
    let row = |z: usize| input.placement.depth_to_screen_y(z as f32, depth);
    let mut primitives = Vec::new();

    for annotation in input.annotations {
        if annotation.z_start > max_z {
            continue;
        }
        let band = egui::Rect::from_min_max(
            egui::pos2(rect.left(), row(annotation.z_start)),
            egui::pos2(rect.right(), row(annotation.z_end.min(max_z))),
        );
        let color = band_color(annotation);
        primitives.push(Primitive::new(
            Layer::Bands,
            Shape::FillRect {
                rect: band,
                color: with_alpha(color, style.band_alpha),
            },
        ));
        primitives.push(Primitive::new(
            Layer::Borders,
            Shape::StrokeRect {
                rect: band,
                stroke: Stroke::new(style.border_width, color),
            },
        ));
        if input.selected_id == Some(&annotation.annotation_id) {
            primitives.push(Primitive::new(
                Layer::Highlight,
                Shape::StrokeRect {
                    rect: band.expand(style.highlight_margin),
                    stroke: Stroke::new(style.highlight_width, HIGHLIGHT),
                },
            ));
        }
    }

    let current = row(input.current_z);
    primitives.push(Primitive::new(
        Layer::DepthLine,
        Shape::DashedLine {
            from: egui::pos2(rect.left(), current),
            to: egui::pos2(rect.right(), current),
            stroke: Stroke::new(style.depth_line_width, DEPTH_LINE),
            dash: 8.0,
            gap: 4.0,
        },
    ));

    if let Some((low, high)) = input.selection.bounds() {
        let label_x = rect.right() - style.label_offset;
        for (z, anchor, offset, text) in [
            (
                low,
                LabelAnchor::RightBottom,
                -style.label_offset,
                format!("Z-start: {low}"),
            ),
            (
                high,
                LabelAnchor::RightTop,
                style.label_offset,
                format!("Z-end: {high}"),
            ),
        ] {
            let y = row(z);
            primitives.push(Primitive::new(
                Layer::SelectionBounds,
                Shape::DashedLine {
                    from: egui::pos2(rect.left(), y),
                    to: egui::pos2(rect.right(), y),
                    stroke: Stroke::new(style.depth_line_width, SELECTION_LINE),
                    dash: 6.0,
                    gap: 3.0,
                },
            ));
            primitives.push(Primitive::new(
                Layer::SelectionBounds,
                Shape::Label {
                    at: egui::pos2(label_x, y + offset),
                    anchor,
                    text,
                    color: SELECTION_LINE,
                },
            ));
        }
    }

    if let Some(drag) = input.drag_box.filter(|drag| drag.active) {
        let area = drag.rect();
        primitives.push(Primitive::new(
            Layer::DragBox,
            Shape::FillRect {
                rect: area,
                color: DRAG_FILL,
            },
        ));
        primitives.push(Primitive::new(
            Layer::DragBox,
            Shape::DashedRect {
                rect: area,
                stroke: Stroke::new(2.0, HIGHLIGHT),
                dash: 5.0,
                gap: 5.0,
            },
        ));
    }

    primitives
}

fn compose_depth_view(input: &OverlayInput<'_>) -> Vec<Primitive> {
    let style = input.style;
    let rect = input.placement.rect;
    let mut primitives = input
        .annotations
        .iter()
        .filter(|annotation| annotation.contains(input.current_z))
        .map(|annotation| {
            Primitive::new(
                Layer::Borders,
                Shape::StrokeRect {
                    rect,
                    stroke: Stroke::new(style.depth_frame_width, frame_color(annotation)),
                },
            )
        })
        .collect::<Vec<_>>();

    if input.selection.contains(input.current_z) {
        primitives.push(Primitive::new(
            Layer::SelectionBounds,
            Shape::StrokeRect {
                rect: rect.shrink(style.depth_selection_inset),
                stroke: Stroke::new(style.depth_selection_width, HIGHLIGHT),
            },
        ));
    }
    primitives
}
