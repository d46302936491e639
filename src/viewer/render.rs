use std::ops::Range;

use eframe::egui::{self, Color32, Stroke};
use image::{GrayImage, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::Axis;

use super::overlay::{Primitive, Shape};
use super::transform::Placement;
use super::window::ContrastWindow;

/// Which views pass their bitmap through the contrast window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemapPolicy {
    #[default]
    AllAxes,
    DepthOnly,
}

impl RemapPolicy {
    pub fn applies_to(self, axis: Axis) -> bool {
        match self {
            Self::AllAxes => true,
            Self::DepthOnly => axis == Axis::Z,
        }
    }
}

/// One fully composed view: where the bitmap went, what was drawn over it and
/// the resulting pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub axis: Axis,
    pub placement: Placement,
    pub primitives: Vec<Primitive>,
    pub canvas: RgbaImage,
}

/// Rasterizes a bitmap at its placement and paints the primitives on top.
/// Labels are left to the host toolkit.
pub fn render_view(
    bitmap: &GrayImage,
    placement: &Placement,
    container: egui::Vec2,
    window: Option<&ContrastWindow>,
    primitives: &[Primitive],
) -> RgbaImage {
    let width = container.x.max(0.0).ceil() as u32;
    let height = container.y.max(0.0).ceil() as u32;
    let mut canvas = RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]));
    if width == 0 || height == 0 {
        return canvas;
    }

    if !placement.is_empty() && bitmap.width() > 0 && bitmap.height() > 0 {
        blit(bitmap, placement, window, &mut canvas);
    }
    for primitive in primitives {
        paint(&mut canvas, &primitive.shape);
    }
    canvas
}

fn blit(
    bitmap: &GrayImage,
    placement: &Placement,
    window: Option<&ContrastWindow>,
    canvas: &mut RgbaImage,
) {
    let table = window.map(ContrastWindow::lookup_table);
    let rect = placement.rect;
    let canvas_width = canvas.width() as usize;
    let source_width = bitmap.width() as usize;
    let source_height = bitmap.height() as usize;
    let source = bitmap.as_raw();

    let columns = (0..canvas_width)
        .map(|x| {
            let center = x as f32 + 0.5;
            if center < rect.left() || center >= rect.right() {
                return None;
            }
            let relative = (center - rect.left()) / rect.width();
            Some(((relative * source_width as f32) as usize).min(source_width - 1))
        })
        .collect::<Vec<_>>();

    canvas
        .par_chunks_mut(canvas_width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let center = y as f32 + 0.5;
            if center < rect.top() || center >= rect.bottom() {
                return;
            }
            let relative = (center - rect.top()) / rect.height();
            let source_y = ((relative * source_height as f32) as usize).min(source_height - 1);
            let source_row = &source[source_y * source_width..(source_y + 1) * source_width];
            for (pixel, column) in row.chunks_exact_mut(4).zip(&columns) {
                let Some(source_x) = column else {
                    continue;
                };
                let sample = source_row[*source_x];
                let value = table.as_ref().map_or(sample, |table| table[sample as usize]);
                pixel.copy_from_slice(&[value, value, value, 255]);
            }
        });
}

/// Canvas pixel block, clipped and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PixelRect {
    columns: Range<u32>,
    rows: Range<u32>,
}

/// Pixel blocks whose centers fall inside a shape. Blocks of one shape may
/// overlap; every covered pixel is blended once.
struct Coverage {
    width: u32,
    height: u32,
    pieces: Vec<PixelRect>,
}

impl Coverage {
    fn new(canvas: &RgbaImage) -> Self {
        Self {
            width: canvas.width(),
            height: canvas.height(),
            pieces: Vec::new(),
        }
    }

    fn span(min: f32, max: f32, limit: u32) -> Range<u32> {
        let start = (min - 0.5).ceil().clamp(0.0, limit as f32) as u32;
        let end = (max - 0.5).ceil().clamp(0.0, limit as f32) as u32;
        start..end.max(start)
    }

    fn fill(&mut self, rect: egui::Rect) {
        let piece = PixelRect {
            columns: Self::span(rect.left(), rect.right(), self.width),
            rows: Self::span(rect.top(), rect.bottom(), self.height),
        };
        if !piece.columns.is_empty() && !piece.rows.is_empty() {
            self.pieces.push(piece);
        }
    }

    fn outline(&mut self, rect: egui::Rect, width: f32) {
        let half = width / 2.0;
        let outer = rect.expand(half);
        self.fill(egui::Rect::from_min_max(
            outer.min,
            egui::pos2(outer.right(), outer.top() + width),
        ));
        self.fill(egui::Rect::from_min_max(
            egui::pos2(outer.left(), outer.bottom() - width),
            outer.max,
        ));
        self.fill(egui::Rect::from_min_max(
            outer.min,
            egui::pos2(outer.left() + width, outer.bottom()),
        ));
        self.fill(egui::Rect::from_min_max(
            egui::pos2(outer.right() - width, outer.top()),
            outer.max,
        ));
    }

    fn dashed(&mut self, from: egui::Pos2, to: egui::Pos2, width: f32, dash: f32, gap: f32) {
        let length = from.distance(to);
        if length <= 0.0 {
            return;
        }
        let direction = (to - from) / length;
        let period = (dash + gap).max(f32::EPSILON);
        let half = width / 2.0;
        // Dashes have butt caps: thickness grows across the line only.
        let thickness = egui::vec2(half * direction.y.abs(), half * direction.x.abs());
        let mut travelled = 0.0;
        while travelled < length {
            let stop = (travelled + dash).min(length);
            let a = from + direction * travelled;
            let b = from + direction * stop;
            self.fill(egui::Rect::from_two_pos(a, b).expand2(thickness));
            travelled += period;
        }
    }

    /// Smallest pixel block holding every piece.
    fn bounds(&self) -> Option<PixelRect> {
        self.pieces.iter().cloned().reduce(|acc, piece| PixelRect {
            columns: acc.columns.start.min(piece.columns.start)
                ..acc.columns.end.max(piece.columns.end),
            rows: acc.rows.start.min(piece.rows.start)..acc.rows.end.max(piece.rows.end),
        })
    }

    /// Sweeps the covered rows, merging the column spans of the pieces that
    /// cross each row so overlaps are blended once.
    fn blend_into(mut self, canvas: &mut RgbaImage, color: Color32) {
        let Some(bounds) = self.bounds() else {
            return;
        };
        self.pieces.sort_by_key(|piece| piece.rows.start);
        let stride = canvas.width() as usize * 4;
        let raw: &mut [u8] = canvas;
        let mut pending = self.pieces.iter().peekable();
        let mut active = Vec::<&PixelRect>::new();
        let mut spans = Vec::<Range<u32>>::new();
        for y in bounds.rows {
            while let Some(piece) = pending.next_if(|piece| piece.rows.start <= y) {
                active.push(piece);
            }
            active.retain(|piece| piece.rows.end > y);
            spans.clear();
            spans.extend(active.iter().map(|piece| piece.columns.clone()));
            spans.sort_by_key(|span| span.start);

            let row = &mut raw[y as usize * stride..(y as usize + 1) * stride];
            let mut blended_to = 0;
            for span in &spans {
                let start = span.start.max(blended_to);
                if start < span.end {
                    blend_span(&mut row[start as usize * 4..span.end as usize * 4], color);
                    blended_to = span.end;
                }
            }
        }
    }
}

/// Premultiplied source-over on a run of RGBA pixels.
fn blend_span(pixels: &mut [u8], color: Color32) {
    let keep = 255 - u16::from(color.a());
    let source = [color.r(), color.g(), color.b()];
    for pixel in pixels.chunks_exact_mut(4) {
        for (channel, incoming) in pixel.iter_mut().zip(source) {
            let kept = (u16::from(*channel) * keep + 127) / 255;
            *channel = (u16::from(incoming) + kept).min(255) as u8;
        }
    }
}

fn paint(canvas: &mut RgbaImage, shape: &Shape) {
    let mut coverage = Coverage::new(canvas);
    let color = match shape {
        Shape::FillRect { rect, color } => {
            coverage.fill(*rect);
            *color
        }
        Shape::StrokeRect {
            rect,
            stroke: Stroke { width, color },
        } => {
            coverage.outline(*rect, *width);
            *color
        }
        Shape::DashedRect {
            rect,
            stroke: Stroke { width, color },
            dash,
            gap,
        } => {
            let corners = [
                rect.left_top(),
                rect.right_top(),
                rect.right_bottom(),
                rect.left_bottom(),
                rect.left_top(),
            ];
            for edge in corners.windows(2) {
                coverage.dashed(edge[0], edge[1], *width, *dash, *gap);
            }
            *color
        }
        Shape::DashedLine {
            from,
            to,
            stroke: Stroke { width, color },
            dash,
            gap,
        } => {
            coverage.dashed(*from, *to, *width, *dash, *gap);
            *color
        }
        Shape::Label { .. } => return,
    };
    coverage.blend_into(canvas, color);
}

#[cfg(test)]
mod tests {
    use eframe::egui::{self, Color32, Stroke};
    use image::GrayImage;

    use super::{Coverage, PixelRect, RemapPolicy, render_view};
    use crate::model::Axis;
    use crate::viewer::overlay::{Layer, Primitive, Shape};
    use crate::viewer::transform::{Placement, Zoom, place};
    use crate::viewer::window::ContrastWindow;

    fn checker() -> GrayImage {
        GrayImage::from_raw(2, 2, vec![0, 100, 200, 255]).expect("2x2 bitmap")
    }

    #[test]
    fn nearest_neighbour_scaling_fills_placement() {
        let bitmap = checker();
        let container = egui::vec2(4.0, 4.0);
        let placement = place(container, [2, 2], Zoom::default(), egui::Vec2::ZERO);
        let canvas = render_view(&bitmap, &placement, container, None, &[]);
        assert_eq!(canvas.dimensions(), (4, 4));
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(1, 1).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(3, 0).0, [100, 100, 100, 255]);
        assert_eq!(canvas.get_pixel(0, 3).0, [200, 200, 200, 255]);
        assert_eq!(canvas.get_pixel(2, 2).0, [255, 255, 255, 255]);
    }

    #[test]
    fn area_outside_placement_stays_black() {
        let bitmap = checker();
        let container = egui::vec2(8.0, 4.0);
        let placement = place(container, [2, 2], Zoom::default(), egui::Vec2::ZERO);
        let canvas = render_view(&bitmap, &placement, container, None, &[]);
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(7, 3).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(5, 3).0, [255, 255, 255, 255]);
    }

    #[test]
    fn window_lookup_is_applied_when_given() {
        let bitmap = checker();
        let container = egui::vec2(2.0, 2.0);
        let placement = place(container, [2, 2], Zoom::default(), egui::Vec2::ZERO);
        let window = ContrastWindow::new(10.0, 100.0);
        let canvas = render_view(&bitmap, &placement, container, Some(&window), &[]);
        assert_eq!(canvas.get_pixel(0, 0).0[0], 0);
        assert_eq!(canvas.get_pixel(1, 0).0[0], 128);
        assert_eq!(canvas.get_pixel(0, 1).0[0], 255);
    }

    #[test]
    fn remap_policy_selects_axes() {
        assert!(RemapPolicy::AllAxes.applies_to(Axis::X));
        assert!(RemapPolicy::DepthOnly.applies_to(Axis::Z));
        assert!(!RemapPolicy::DepthOnly.applies_to(Axis::Y));
    }

    #[test]
    fn translucent_fill_blends_over_image() {
        let bitmap = GrayImage::from_pixel(1, 1, image::Luma([0]));
        let container = egui::vec2(4.0, 4.0);
        let placement = Placement {
            rect: egui::Rect::from_min_size(egui::Pos2::ZERO, container),
            bitmap_size: [1, 1],
        };
        let fill = Primitive {
            layer: Layer::Bands,
            shape: Shape::FillRect {
                rect: egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(2.0, 4.0)),
                color: Color32::from_rgba_premultiplied(100, 0, 0, 128),
            },
        };
        let canvas = render_view(&bitmap, &placement, container, None, &[fill]);
        assert_eq!(canvas.get_pixel(1, 3).0, [100, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(2, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn dashed_line_leaves_gaps() {
        let bitmap = GrayImage::from_pixel(1, 1, image::Luma([0]));
        let container = egui::vec2(12.0, 3.0);
        let placement = Placement {
            rect: egui::Rect::from_min_size(egui::Pos2::ZERO, container),
            bitmap_size: [1, 1],
        };
        let line = Primitive {
            layer: Layer::DepthLine,
            shape: Shape::DashedLine {
                from: egui::pos2(0.0, 1.5),
                to: egui::pos2(12.0, 1.5),
                stroke: Stroke::new(1.0, Color32::WHITE),
                dash: 4.0,
                gap: 2.0,
            },
        };
        let canvas = render_view(&bitmap, &placement, container, None, &[line]);
        let row = (0..12)
            .map(|x| canvas.get_pixel(x, 1).0[0] == 255)
            .collect::<Vec<_>>();
        assert_eq!(
            row,
            vec![
                true, true, true, true, false, false, true, true, true, true, false, false
            ]
        );
        assert_eq!(canvas.get_pixel(0, 0).0[0], 0);
    }

    fn black_placement(container: egui::Vec2) -> Placement {
        Placement {
            rect: egui::Rect::from_min_size(egui::Pos2::ZERO, container),
            bitmap_size: [1, 1],
        }
    }

    #[test]
    fn overlapping_stroke_strips_blend_once() {
        let bitmap = GrayImage::from_pixel(1, 1, image::Luma([0]));
        let container = egui::vec2(10.0, 6.0);
        let stroke = Primitive {
            layer: Layer::DragBox,
            shape: Shape::StrokeRect {
                rect: egui::Rect::from_min_max(egui::pos2(2.0, 2.0), egui::pos2(6.0, 2.0)),
                stroke: Stroke::new(2.0, Color32::from_rgba_premultiplied(100, 0, 0, 128)),
            },
        };
        let canvas = render_view(&bitmap, &black_placement(container), container, None, &[stroke]);
        assert_eq!(canvas.get_pixel(3, 1).0, [100, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(1, 2).0, [100, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(8, 4).0, [0, 0, 0, 255]);
    }

    #[test]
    fn shapes_are_clipped_to_the_canvas() {
        let bitmap = GrayImage::from_pixel(1, 1, image::Luma([0]));
        let container = egui::vec2(4.0, 4.0);
        let fill = |min: egui::Pos2, max: egui::Pos2| Primitive {
            layer: Layer::Bands,
            shape: Shape::FillRect {
                rect: egui::Rect::from_min_max(min, max),
                color: Color32::WHITE,
            },
        };
        let primitives = [
            fill(egui::pos2(-3.0, -3.0), egui::pos2(2.0, 1.0)),
            fill(egui::pos2(-20.0, 10.0), egui::pos2(-8.0, 30.0)),
        ];
        let canvas = render_view(&bitmap, &black_placement(container), container, None, &primitives);
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(1, 0).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(2, 0).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(0, 1).0, [0, 0, 0, 255]);
    }

    #[test]
    fn coverage_stays_within_the_outline() {
        let canvas = image::RgbaImage::new(512, 512);
        let mut coverage = Coverage::new(&canvas);
        coverage.outline(
            egui::Rect::from_min_max(egui::pos2(10.0, 20.0), egui::pos2(30.0, 40.0)),
            2.0,
        );
        assert_eq!(coverage.pieces.len(), 4);
        assert_eq!(
            coverage.bounds(),
            Some(PixelRect {
                columns: 9..31,
                rows: 19..41,
            })
        );

        let mut offscreen = Coverage::new(&canvas);
        offscreen.fill(egui::Rect::from_min_max(egui::pos2(600.0, 0.0), egui::pos2(700.0, 10.0)));
        assert!(offscreen.pieces.is_empty());
        assert_eq!(offscreen.bounds(), None);
    }
}
