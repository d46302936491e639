use eframe::egui;
use image::GrayImage;

use crate::config::ViewerConfig;
use crate::model::{Annotation, AnnotationId, Axis, AxisMap, VolumeExtent};

use super::interaction::{Intent, KeyCommand, PointerButton, PointerMachine, PointerPhase};
use super::overlay::{OverlayInput, compose};
use super::render::{Frame, render_view};
use super::selection::{DragBox, SelectionRange, range_from_box, range_from_inputs};
use super::transform::{Placement, Zoom, ZoomStep, place};
use super::window::{ContrastWindow, WindowDrag};
use super::{Result, SelectionError};

/// Per-axis display state. The bitmap is replaced whenever a new slice arrives;
/// the pan offset survives redraws of this axis until an explicit reset.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisView {
    pub bitmap: Option<GrayImage>,
    pub pan: egui::Vec2,
    pub container: egui::Vec2,
}

impl AxisView {
    fn new(container: egui::Vec2) -> Self {
        Self {
            bitmap: None,
            pan: egui::Vec2::ZERO,
            container,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Adding,
    Editing(AnnotationId),
}

/// Tag carried by a slice request so late responses can be recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliceTicket {
    pub axis: Axis,
    pub index: usize,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceResponse {
    pub ticket: SliceTicket,
    pub bitmap: GrayImage,
}

/// Everything the data source hands over when a volume is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedVolume {
    pub extent: VolumeExtent,
    pub slices: AxisMap<GrayImage>,
    pub annotations: Vec<Annotation>,
    /// Sample range of the normalized volume, used when the window is seeded from data.
    pub intensity_range: Option<(f32, f32)>,
}

/// Follow-up work requested by a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Redraw(Axis),
    RedrawAll,
    RequestSlice(SliceTicket),
}

/// Owned aggregate behind the three views. All mutation goes through the
/// named operations below; each returns the effects the host should run.
#[derive(Debug, Clone)]
pub struct ViewerState {
    config: ViewerConfig,
    extent: Option<VolumeExtent>,
    generation: u64,
    views: AxisMap<AxisView>,
    zoom: Zoom,
    window: ContrastWindow,
    window_drag: Option<WindowDrag>,
    current_z: usize,
    selection: SelectionRange,
    drag_boxes: AxisMap<DragBox>,
    pointer: PointerMachine,
    annotations: Vec<Annotation>,
    selected: Option<AnnotationId>,
    mode: EditMode,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl ViewerState {
    pub fn new(config: ViewerConfig) -> Self {
        let container = config.container_size();
        Self {
            extent: None,
            generation: 0,
            views: AxisMap::from_fn(|_| AxisView::new(container)),
            zoom: Zoom::default(),
            window: ContrastWindow::new(config.window.default_width, config.window.default_level),
            window_drag: None,
            current_z: 0,
            selection: SelectionRange::empty(),
            drag_boxes: AxisMap::default(),
            pointer: PointerMachine::new(config.scrub_sensitivity),
            annotations: Vec::new(),
            selected: None,
            mode: EditMode::Adding,
            config,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn extent(&self) -> Option<&VolumeExtent> {
        self.extent.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn view(&self, axis: Axis) -> &AxisView {
        &self.views[axis]
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn window(&self) -> &ContrastWindow {
        &self.window
    }

    pub fn current_z(&self) -> usize {
        self.current_z
    }

    pub fn selection(&self) -> SelectionRange {
        self.selection
    }

    pub fn has_selection(&self) -> bool {
        self.selection.has_selection()
    }

    pub fn drag_box(&self, axis: Axis) -> &DragBox {
        &self.drag_boxes[axis]
    }

    pub fn pointer_phase(&self) -> PointerPhase {
        self.pointer.phase()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|annotation| &annotation.annotation_id == id)
    }

    pub fn selected_id(&self) -> Option<&AnnotationId> {
        self.selected.as_ref()
    }

    pub fn mode(&self) -> &EditMode {
        &self.mode
    }

    /// Installs a freshly opened volume and resets every view to its initial state.
    pub fn load(&mut self, volume: LoadedVolume) -> Vec<Effect> {
        let LoadedVolume {
            extent,
            slices,
            annotations,
            intensity_range,
        } = volume;

        self.generation += 1;
        let container = self.config.container_size();
        let AxisMap { x, y, z } = slices;
        for (axis, bitmap) in [(Axis::X, x), (Axis::Y, y), (Axis::Z, z)] {
            let view = &mut self.views[axis];
            if view.container == egui::Vec2::ZERO {
                view.container = container;
            }
            view.bitmap = Some(bitmap);
            view.pan = egui::Vec2::ZERO;
        }
        self.zoom = Zoom::default();
        self.window = match intensity_range {
            Some((low, high)) if self.config.window.seed_from_data => {
                ContrastWindow::seed_from_range(low, high)
            }
            _ => ContrastWindow::new(
                self.config.window.default_width,
                self.config.window.default_level,
            ),
        };
        self.window_drag = None;
        self.current_z = extent.center.z;
        self.selection.clear();
        self.drag_boxes = AxisMap::default();
        self.pointer = PointerMachine::new(self.config.scrub_sensitivity);
        self.annotations = annotations.into_iter().map(Annotation::normalized).collect();
        self.selected = None;
        self.mode = EditMode::Adding;
        log::info!(
            "loaded volume {}x{}x{} with {} annotations",
            extent.shape.x,
            extent.shape.y,
            extent.shape.z,
            self.annotations.len()
        );
        self.extent = Some(extent);
        vec![Effect::RedrawAll]
    }

    pub fn set_container(&mut self, axis: Axis, size: egui::Vec2) -> Vec<Effect> {
        if self.views[axis].container == size {
            return Vec::new();
        }
        self.views[axis].container = size;
        vec![Effect::Redraw(axis)]
    }

    pub fn pointer_down(&mut self, axis: Axis, button: PointerButton, at: egui::Pos2) -> Vec<Effect> {
        if self.extent.is_none() {
            return Vec::new();
        }
        let intents = self.pointer.press(axis, button, at);
        self.apply_intents(intents)
    }

    pub fn pointer_move(&mut self, axis: Axis, at: egui::Pos2) -> Vec<Effect> {
        let intents = self.pointer.motion(axis, at);
        self.apply_intents(intents)
    }

    pub fn pointer_up(&mut self) -> Vec<Effect> {
        let intents = self.pointer.release();
        self.apply_intents(intents)
    }

    pub fn pointer_leave(&mut self) -> Vec<Effect> {
        let intents = self.pointer.leave();
        self.apply_intents(intents)
    }

    fn apply_intents(&mut self, intents: Vec<Intent>) -> Vec<Effect> {
        intents
            .into_iter()
            .flat_map(|intent| self.apply_intent(intent))
            .collect()
    }

    fn apply_intent(&mut self, intent: Intent) -> Vec<Effect> {
        match intent {
            // Only an edit in progress is dropped; a pending range survives
            // until a committed box replaces it.
            Intent::CancelEdit => match self.mode {
                EditMode::Editing(_) => self.cancel_edit(),
                EditMode::Adding => Vec::new(),
            },
            Intent::StartBox { axis, at } => {
                self.drag_boxes[axis] = DragBox::begin(at);
                vec![Effect::Redraw(axis)]
            }
            Intent::ExtendBox { axis, to } => {
                self.drag_boxes[axis].end = to;
                vec![Effect::Redraw(axis)]
            }
            Intent::FinishBox { axis } => {
                let drag = self.drag_boxes[axis];
                self.drag_boxes[axis].active = false;
                if let Some(extent) = &self.extent {
                    let range = range_from_box(&drag, &self.placement(axis), extent);
                    if range.has_selection() {
                        log::debug!("box on axis {axis} selected {:?}", range.bounds());
                        self.selection = range;
                    }
                }
                vec![Effect::RedrawAll]
            }
            Intent::AbortBox { axis } => {
                self.drag_boxes[axis].active = false;
                vec![Effect::Redraw(axis)]
            }
            Intent::Pan { axis, delta } => {
                self.views[axis].pan += delta;
                vec![Effect::Redraw(axis)]
            }
            Intent::Scrub { steps, pointer } => {
                let Some(extent) = &self.extent else {
                    return Vec::new();
                };
                let target = extent.clamp_depth(self.current_z as i64 + steps);
                if target == self.current_z {
                    return Vec::new();
                }
                self.pointer.rebase_scrub(pointer);
                self.move_depth(target)
            }
        }
    }

    fn move_depth(&mut self, z: usize) -> Vec<Effect> {
        self.current_z = z;
        log::debug!("depth cursor moved to {z}");
        vec![
            Effect::Redraw(Axis::X),
            Effect::Redraw(Axis::Y),
            Effect::RequestSlice(SliceTicket {
                axis: Axis::Z,
                index: z,
                generation: self.generation,
            }),
        ]
    }

    /// Keyboard nudge of the depth cursor. Works whatever the pointer is doing.
    pub fn key(&mut self, command: KeyCommand) -> Vec<Effect> {
        self.set_depth(self.current_z as i64 + command.delta())
    }

    /// Slider entry; out-of-range values are clamped.
    pub fn set_depth(&mut self, z: i64) -> Vec<Effect> {
        let Some(extent) = &self.extent else {
            return Vec::new();
        };
        let target = extent.clamp_depth(z);
        if target == self.current_z {
            return Vec::new();
        }
        self.move_depth(target)
    }

    /// Wheel zoom over `axis`. Zoom is shared, but only the axis under the cursor
    /// is redrawn right away.
    pub fn wheel(&mut self, axis: Axis, delta_y: f32) -> Vec<Effect> {
        if self.extent.is_none() || delta_y == 0.0 || !delta_y.is_finite() {
            return Vec::new();
        }
        let factor = if delta_y < 0.0 {
            self.config.zoom.wheel_in
        } else {
            self.config.zoom.wheel_out
        };
        self.zoom = self.zoom.scaled(factor);
        vec![Effect::Redraw(axis)]
    }

    pub fn zoom_step(&mut self, step: ZoomStep) -> Vec<Effect> {
        let factor = match step {
            ZoomStep::In => self.config.zoom.step_in,
            ZoomStep::Out => self.config.zoom.step_out,
        };
        self.zoom = self.zoom.scaled(factor);
        vec![Effect::RedrawAll]
    }

    pub fn zoom_in(&mut self) -> Vec<Effect> {
        self.zoom_step(ZoomStep::In)
    }

    pub fn zoom_out(&mut self) -> Vec<Effect> {
        self.zoom_step(ZoomStep::Out)
    }

    pub fn reset_view(&mut self) -> Vec<Effect> {
        self.zoom = Zoom::default();
        for axis in Axis::ALL {
            self.views[axis].pan = egui::Vec2::ZERO;
        }
        vec![Effect::RedrawAll]
    }

    pub fn begin_window_drag(&mut self, at: egui::Pos2) {
        self.window_drag = Some(WindowDrag::begin(at, &self.window));
    }

    pub fn update_window_drag(&mut self, at: egui::Pos2) -> Vec<Effect> {
        let Some(drag) = self.window_drag else {
            return Vec::new();
        };
        drag.update(
            &mut self.window,
            at,
            self.config.window.width_sensitivity,
            self.config.window.level_sensitivity,
        );
        self.window_effects()
    }

    pub fn end_window_drag(&mut self) {
        self.window_drag = None;
    }

    pub fn reset_window(&mut self) -> Vec<Effect> {
        self.window.reset();
        self.window_effects()
    }

    fn window_effects(&self) -> Vec<Effect> {
        let axes = Axis::ALL
            .into_iter()
            .filter(|axis| self.config.remap.applies_to(*axis))
            .collect::<Vec<_>>();
        if axes.len() == Axis::ALL.len() {
            vec![Effect::RedrawAll]
        } else {
            axes.into_iter().map(Effect::Redraw).collect()
        }
    }

    /// Numeric range entry. Unlike gestures, values outside the volume are rejected.
    pub fn set_selection_from_inputs(&mut self, start: i64, end: i64) -> Result<Vec<Effect>> {
        let extent = self.extent.as_ref().ok_or(SelectionError::NoVolume)?;
        self.selection = range_from_inputs(start, end, extent)?;
        Ok(vec![Effect::RedrawAll])
    }

    pub fn clear_selection(&mut self) -> Vec<Effect> {
        self.selection.clear();
        vec![Effect::RedrawAll]
    }

    /// Highlights an annotation, jumps to its middle and starts editing it.
    pub fn select_annotation(&mut self, id: &AnnotationId) -> Vec<Effect> {
        let Some(annotation) = self.annotation(id) else {
            log::debug!("ignoring selection of unknown annotation {id}");
            return Vec::new();
        };
        let (start, end, middle) = (
            annotation.z_start,
            annotation.z_end,
            annotation.mid_depth(),
        );
        self.selected = Some(id.clone());
        self.mode = EditMode::Editing(id.clone());
        self.selection = SelectionRange::new(start, end);

        let target = self.extent.as_ref().map(|extent| extent.clamp_depth(middle as i64));
        let mut effects = vec![Effect::RedrawAll];
        if let Some(target) = target.filter(|target| *target != self.current_z) {
            effects.extend(self.move_depth(target));
        }
        effects
    }

    pub fn cancel_edit(&mut self) -> Vec<Effect> {
        if self.mode != EditMode::Adding {
            log::debug!("edit cancelled");
        }
        self.mode = EditMode::Adding;
        self.selected = None;
        self.selection.clear();
        vec![Effect::RedrawAll]
    }

    /// Swaps in the authoritative list. A highlight or edit pointing at a
    /// record that no longer exists is dropped.
    pub fn replace_annotations(&mut self, annotations: Vec<Annotation>) -> Vec<Effect> {
        self.annotations = annotations.into_iter().map(Annotation::normalized).collect();
        if self
            .selected
            .as_ref()
            .is_some_and(|id| self.annotation(id).is_none())
        {
            self.selected = None;
        }
        let editing_missing = match &self.mode {
            EditMode::Editing(id) => self.annotation(id).is_none(),
            EditMode::Adding => false,
        };
        if editing_missing {
            self.mode = EditMode::Adding;
        }
        vec![Effect::RedrawAll]
    }

    pub fn append_annotation(&mut self, annotation: Annotation) -> Vec<Effect> {
        self.annotations.push(annotation.normalized());
        vec![Effect::RedrawAll]
    }

    /// Replaces a locally appended record with the one the source returned.
    pub fn reconcile_annotation(
        &mut self,
        provisional: &AnnotationId,
        record: Annotation,
    ) -> Vec<Effect> {
        match self
            .annotations
            .iter_mut()
            .find(|annotation| &annotation.annotation_id == provisional)
        {
            Some(slot) => *slot = record.normalized(),
            None => self.annotations.push(record.normalized()),
        }
        vec![Effect::RedrawAll]
    }

    pub fn remove_annotation(&mut self, id: &AnnotationId) -> Vec<Effect> {
        let before = self.annotations.len();
        self.annotations
            .retain(|annotation| &annotation.annotation_id != id);
        if self.annotations.len() == before {
            return Vec::new();
        }
        vec![Effect::RedrawAll]
    }

    /// Installs a slice response unless it is stale: wrong volume, or an index
    /// that is no longer the one on display.
    pub fn apply_slice(&mut self, response: SliceResponse) -> Vec<Effect> {
        let SliceResponse { ticket, bitmap } = response;
        let Some(extent) = &self.extent else {
            return Vec::new();
        };
        let live_index = match ticket.axis {
            Axis::Z => self.current_z,
            axis => extent.center[axis],
        };
        if ticket.generation != self.generation || ticket.index != live_index {
            log::debug!(
                "discarding stale slice {:?} (live index {live_index}, generation {})",
                ticket,
                self.generation
            );
            return Vec::new();
        }
        self.views[ticket.axis].bitmap = Some(bitmap);
        vec![Effect::Redraw(ticket.axis)]
    }

    pub fn placement(&self, axis: Axis) -> Placement {
        let view = &self.views[axis];
        let bitmap_size = view
            .bitmap
            .as_ref()
            .map_or([0, 0], |bitmap| {
                [bitmap.width() as usize, bitmap.height() as usize]
            });
        place(view.container, bitmap_size, self.zoom, view.pan)
    }

    /// Composes and rasterizes one view. `None` until a volume is loaded.
    pub fn redraw(&self, axis: Axis) -> Option<Frame> {
        let extent = self.extent.as_ref()?;
        let view = &self.views[axis];
        let bitmap = view.bitmap.as_ref()?;
        let placement = self.placement(axis);
        let primitives = compose(&OverlayInput {
            axis,
            placement: &placement,
            extent,
            annotations: &self.annotations,
            selection: self.selection,
            current_z: self.current_z,
            selected_id: self.selected.as_ref(),
            drag_box: axis
                .is_cross_section()
                .then_some(&self.drag_boxes[axis]),
            style: &self.config.overlay,
        });
        let window = self
            .config
            .remap
            .applies_to(axis)
            .then_some(&self.window);
        let canvas = render_view(bitmap, &placement, view.container, window, &primitives);
        Some(Frame {
            axis,
            placement,
            primitives,
            canvas,
        })
    }

    pub fn redraw_all(&self) -> Vec<Frame> {
        Axis::ALL
            .into_iter()
            .filter_map(|axis| self.redraw(axis))
            .collect()
    }

    /// Readout for the pointer over `axis`, or `None` outside the placed image.
    pub fn hover_readout(&self, axis: Axis, pointer: egui::Pos2) -> Option<String> {
        let extent = self.extent.as_ref()?;
        let placement = self.placement(axis);
        let relative = placement.to_image_coord(pointer).inside()?;
        let [pixel_x, pixel_y] = placement.pixel_at(relative);
        let z = if axis.is_cross_section() {
            let raw = (relative.y * extent.depth_count() as f32).floor() as i64;
            extent.clamp_depth(raw)
        } else {
            self.current_z
        };
        Some(format!("Z={z} | X={pixel_x} | Y={pixel_y}"))
    }

    pub fn coverage_fraction(&self) -> f32 {
        self.extent.as_ref().map_or(0.0, |extent| {
            coverage_fraction(&self.annotations, extent.depth_count())
        })
    }

    /// Coverage rounded to a whole percentage.
    pub fn coverage_percent(&self) -> u32 {
        (self.coverage_fraction() * 100.0).round() as u32
    }

    pub fn annotations_at(&self, z: usize) -> Vec<&Annotation> {
        self.annotations
            .iter()
            .filter(|annotation| annotation.contains(z))
            .collect()
    }
}

/// Fraction of depth indices covered by at least one interval, counting the
/// union of integer points clipped to `[0, depth - 1]`.
pub fn coverage_fraction(annotations: &[Annotation], depth: usize) -> f32 {
    if depth == 0 {
        return 0.0;
    }
    let mut covered = vec![false; depth];
    for annotation in annotations {
        let start = annotation.z_start.min(annotation.z_end);
        if start >= depth {
            continue;
        }
        let end = annotation.z_start.max(annotation.z_end).min(depth - 1);
        covered[start..=end].fill(true);
    }
    covered.iter().filter(|covered| **covered).count() as f32 / depth as f32
}
