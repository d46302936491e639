use eframe::egui;
use image::GrayImage;

use super::{
    Effect, EditMode, KeyCommand, LoadedVolume, PointerButton, PointerPhase, RemapPolicy,
    SelectionError, SelectionRange, SliceResponse, SliceTicket, ViewerState, coverage_fraction,
};
use crate::config::ViewerConfig;
use crate::model::{Annotation, AnnotationForm, AnnotationId, Axis, AxisMap, VolumeExtent};

fn annotation(id: &str, start: usize, end: usize) -> Annotation {
    AnnotationForm::default()
        .into_draft(start, end)
        .into_annotation(AnnotationId::new(id), "2024-03-01T10:00:00".to_string())
}

fn volume(annotations: Vec<Annotation>) -> LoadedVolume {
    let extent = VolumeExtent::new(AxisMap::new(20, 16, 40), AxisMap::new(0.5, 0.5, 1.0))
        .expect("non-empty extent");
    LoadedVolume {
        extent,
        slices: AxisMap::new(
            GrayImage::from_pixel(16, 40, image::Luma([60])),
            GrayImage::from_pixel(20, 40, image::Luma([90])),
            GrayImage::from_pixel(20, 16, image::Luma([120])),
        ),
        annotations,
        intensity_range: Some((0.0, 255.0)),
    }
}

fn loaded(annotations: Vec<Annotation>) -> ViewerState {
    let mut state = ViewerState::default();
    state.load(volume(annotations));
    state
}

fn slice(ticket: SliceTicket, value: u8) -> SliceResponse {
    SliceResponse {
        ticket,
        bitmap: GrayImage::from_pixel(20, 16, image::Luma([value])),
    }
}

fn requested_ticket(effects: &[Effect]) -> SliceTicket {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::RequestSlice(ticket) => Some(*ticket),
            _ => None,
        })
        .expect("slice request")
}

#[test]
fn load_resets_cursor_and_views() {
    let mut state = loaded(vec![annotation("ann_1", 2, 5)]);
    assert_eq!(state.current_z(), 20);
    assert_eq!(state.window().width(), 400.0);
    assert_eq!(state.window().level(), 40.0);
    assert_eq!(state.annotations().len(), 1);

    state.pointer_down(Axis::X, PointerButton::Middle, egui::pos2(0.0, 0.0));
    state.pointer_move(Axis::X, egui::pos2(7.0, 7.0));
    state.pointer_up();
    state.set_depth(3);
    state.zoom_in();

    state.load(volume(Vec::new()));
    assert_eq!(state.current_z(), 20);
    assert_eq!(state.view(Axis::X).pan, egui::Vec2::ZERO);
    assert_eq!(state.zoom().value(), 1.0);
    assert!(state.annotations().is_empty());
    assert_eq!(state.generation(), 2);
}

#[test]
fn stale_slice_response_is_discarded() {
    let mut state = loaded(Vec::new());
    let first = requested_ticket(&state.set_depth(10));
    let second = requested_ticket(&state.set_depth(20));
    assert_eq!(first.index, 10);
    assert_eq!(second.index, 20);

    assert!(state.apply_slice(slice(first, 10)).is_empty());
    let shown = state.view(Axis::Z).bitmap.as_ref().expect("initial slice");
    assert_eq!(shown.get_pixel(0, 0).0, [120]);

    assert_eq!(
        state.apply_slice(slice(second, 77)),
        vec![Effect::Redraw(Axis::Z)]
    );
    let shown = state.view(Axis::Z).bitmap.as_ref().expect("fresh slice");
    assert_eq!(shown.get_pixel(0, 0).0, [77]);
}

#[test]
fn response_from_previous_volume_is_discarded() {
    let mut state = loaded(Vec::new());
    let ticket = requested_ticket(&state.set_depth(12));
    state.load(volume(Vec::new()));
    state.set_depth(12);
    assert!(state.apply_slice(slice(ticket, 1)).is_empty());
}

#[test]
fn redraw_is_idempotent() {
    let mut state = loaded(vec![annotation("ann_1", 4, 12), annotation("ann_2", 10, 30)]);
    state.set_selection_from_inputs(15, 8).expect("valid range");
    state.select_annotation(&AnnotationId::new("ann_2"));
    for axis in Axis::ALL {
        let first = state.redraw(axis).expect("frame");
        let second = state.redraw(axis).expect("frame");
        assert_eq!(first, second);
        assert!(!first.primitives.is_empty() || axis == Axis::Z);
    }
    assert_eq!(state.redraw_all().len(), 3);
}

#[test]
fn redraw_requires_loaded_volume() {
    let state = ViewerState::default();
    assert!(state.redraw(Axis::X).is_none());
    assert!(state.redraw_all().is_empty());
    assert_eq!(state.coverage_fraction(), 0.0);
}

#[test]
fn panning_one_axis_leaves_others_alone() {
    let mut state = loaded(Vec::new());
    state.pointer_down(Axis::X, PointerButton::Middle, egui::pos2(100.0, 100.0));
    let effects = state.pointer_move(Axis::X, egui::pos2(110.0, 95.0));
    assert_eq!(effects, vec![Effect::Redraw(Axis::X)]);
    state.pointer_up();

    assert_eq!(state.view(Axis::X).pan, egui::vec2(10.0, -5.0));
    assert_eq!(state.view(Axis::Y).pan, egui::Vec2::ZERO);
    assert_eq!(state.view(Axis::Z).pan, egui::Vec2::ZERO);

    state.reset_view();
    assert_eq!(state.view(Axis::X).pan, egui::Vec2::ZERO);
}

#[test]
fn coverage_counts_union_of_integer_points() {
    let annotations = vec![annotation("a", 0, 9), annotation("b", 5, 14)];
    assert_eq!(coverage_fraction(&annotations, 20), 0.75);
    assert_eq!(coverage_fraction(&[], 20), 0.0);
    assert_eq!(coverage_fraction(&[annotation("c", 18, 45)], 20), 0.1);
    assert_eq!(coverage_fraction(&annotations, 0), 0.0);

    let state = loaded(vec![annotation("a", 0, 9), annotation("b", 5, 14)]);
    assert_eq!(state.coverage_percent(), 38);
}

#[test]
fn reversed_records_are_stored_in_order() {
    let mut reversed = annotation("ann_1", 3, 10);
    (reversed.z_start, reversed.z_end) = (10, 3);
    assert_eq!(coverage_fraction(std::slice::from_ref(&reversed), 20), 0.4);

    let mut state = loaded(Vec::new());
    state.replace_annotations(vec![reversed]);
    let stored = &state.annotations()[0];
    assert_eq!((stored.z_start, stored.z_end), (3, 10));
    assert_eq!(state.coverage_percent(), 20);
}

#[test]
fn box_selection_cancels_edit_and_commits_range() {
    let mut state = loaded(vec![annotation("ann_1", 4, 12)]);
    state.select_annotation(&AnnotationId::new("ann_1"));
    assert_eq!(state.mode(), &EditMode::Editing(AnnotationId::new("ann_1")));

    // Y view: 20x40 bitmap fitted into 512x512 spans rows 0..512.
    state.pointer_down(Axis::Y, PointerButton::Primary, egui::pos2(200.0, 64.0));
    assert_eq!(state.mode(), &EditMode::Adding);
    assert!(state.selected_id().is_none());
    assert!(!state.has_selection());
    assert_eq!(state.pointer_phase(), PointerPhase::BoxSelecting(Axis::Y));

    state.pointer_move(Axis::Y, egui::pos2(260.0, 192.0));
    assert!(state.drag_box(Axis::Y).active);
    let effects = state.pointer_up();
    assert_eq!(effects, vec![Effect::RedrawAll]);
    assert!(!state.drag_box(Axis::Y).active);
    assert_eq!(state.selection(), SelectionRange::new(5, 15));
}

#[test]
fn leaving_window_aborts_box_without_selection() {
    let mut state = loaded(Vec::new());
    state.pointer_down(Axis::X, PointerButton::Primary, egui::pos2(200.0, 64.0));
    state.pointer_move(Axis::X, egui::pos2(220.0, 300.0));
    assert_eq!(state.pointer_leave(), vec![Effect::Redraw(Axis::X)]);
    assert!(!state.has_selection());
    assert_eq!(state.pointer_phase(), PointerPhase::Idle);
}

#[test]
fn starting_a_box_while_adding_keeps_the_typed_range() {
    let mut state = loaded(Vec::new());
    state.set_selection_from_inputs(3, 8).expect("valid range");
    state.pointer_down(Axis::X, PointerButton::Primary, egui::pos2(200.0, 64.0));
    assert_eq!(state.mode(), &EditMode::Adding);
    assert_eq!(state.selection().bounds(), Some((3, 8)));

    state.pointer_leave();
    assert_eq!(state.selection().bounds(), Some((3, 8)));
    assert_eq!(state.pointer_phase(), PointerPhase::Idle);
}

#[test]
fn keyboard_moves_depth_with_clamp_during_any_gesture() {
    let mut state = loaded(Vec::new());
    state.set_depth(39);
    assert!(state.key(KeyCommand::DepthUp).is_empty());
    assert_eq!(state.current_z(), 39);

    state.pointer_down(Axis::Z, PointerButton::Middle, egui::pos2(5.0, 5.0));
    let effects = state.key(KeyCommand::DepthDown);
    assert_eq!(state.current_z(), 38);
    assert_eq!(
        effects,
        vec![
            Effect::Redraw(Axis::X),
            Effect::Redraw(Axis::Y),
            Effect::RequestSlice(SliceTicket {
                axis: Axis::Z,
                index: 38,
                generation: 1,
            }),
        ]
    );

    state.set_depth(-7);
    assert_eq!(state.current_z(), 0);
}

#[test]
fn scrub_moves_depth_and_rebases() {
    let mut state = loaded(Vec::new());
    state.pointer_down(Axis::Z, PointerButton::Secondary, egui::pos2(0.0, 100.0));
    let effects = state.pointer_move(Axis::Z, egui::pos2(0.0, 96.0));
    assert_eq!(state.current_z(), 22);
    assert_eq!(requested_ticket(&effects).index, 22);
    assert!(state.pointer_move(Axis::Z, egui::pos2(0.0, 96.0)).is_empty());

    state.pointer_move(Axis::Z, egui::pos2(0.0, 300.0));
    assert_eq!(state.current_z(), 0);
}

#[test]
fn wheel_zooms_and_redraws_only_hovered_axis() {
    let mut state = loaded(Vec::new());
    assert_eq!(state.wheel(Axis::Y, -3.0), vec![Effect::Redraw(Axis::Y)]);
    assert!((state.zoom().value() - 1.1).abs() < 1e-6);
    state.wheel(Axis::Y, 3.0);
    assert!((state.zoom().value() - 0.99).abs() < 1e-6);
    assert_eq!(state.zoom_in(), vec![Effect::RedrawAll]);
    assert!(state.wheel(Axis::X, 0.0).is_empty());
}

#[test]
fn selecting_annotation_enters_edit_at_mid_depth() {
    let mut state = loaded(vec![annotation("ann_1", 4, 12)]);
    let effects = state.select_annotation(&AnnotationId::new("ann_1"));
    assert_eq!(effects[0], Effect::RedrawAll);
    assert_eq!(requested_ticket(&effects).index, 8);
    assert_eq!(state.current_z(), 8);
    assert_eq!(state.selection().bounds(), Some((4, 12)));
    assert_eq!(state.annotations_at(8).len(), 1);

    state.cancel_edit();
    assert_eq!(state.mode(), &EditMode::Adding);
    assert!(!state.has_selection());
    assert!(state.select_annotation(&AnnotationId::new("missing")).is_empty());
}

#[test]
fn replacing_list_drops_vanished_edit_target() {
    let mut state = loaded(vec![annotation("ann_1", 4, 12)]);
    state.select_annotation(&AnnotationId::new("ann_1"));
    state.replace_annotations(vec![annotation("ann_2", 1, 2)]);
    assert!(state.selected_id().is_none());
    assert_eq!(state.mode(), &EditMode::Adding);
}

#[test]
fn hover_readout_reports_volume_coordinates() {
    let state = loaded(Vec::new());
    assert_eq!(
        state.hover_readout(Axis::Z, egui::pos2(260.0, 260.0)).as_deref(),
        Some("Z=20 | X=10 | Y=8")
    );
    assert_eq!(
        state.hover_readout(Axis::X, egui::pos2(260.0, 100.0)).as_deref(),
        Some("Z=7 | X=8 | Y=7")
    );
    assert_eq!(state.hover_readout(Axis::X, egui::pos2(10.0, 10.0)), None);
}

#[test]
fn numeric_entry_is_validated() {
    let mut empty = ViewerState::default();
    assert_eq!(
        empty.set_selection_from_inputs(0, 1),
        Err(SelectionError::NoVolume)
    );

    let mut state = loaded(Vec::new());
    assert_eq!(
        state.set_selection_from_inputs(0, 40),
        Err(SelectionError::OutOfRange { value: 40, max: 39 })
    );
    assert!(!state.has_selection());
    state.set_selection_from_inputs(30, 10).expect("in range");
    assert_eq!(state.selection().bounds(), Some((10, 30)));
    state.clear_selection();
    assert!(!state.has_selection());
}

#[test]
fn window_drag_redraws_according_to_policy() {
    let config = ViewerConfig {
        remap: RemapPolicy::DepthOnly,
        ..ViewerConfig::default()
    };
    let mut state = ViewerState::new(config);
    state.load(volume(Vec::new()));

    state.begin_window_drag(egui::pos2(0.0, 0.0));
    assert_eq!(
        state.update_window_drag(egui::pos2(10.0, 20.0)),
        vec![Effect::Redraw(Axis::Z)]
    );
    assert_eq!(state.window().width(), 420.0);
    assert_eq!(state.window().level(), 20.0);
    state.end_window_drag();
    assert!(state.update_window_drag(egui::pos2(50.0, 50.0)).is_empty());

    state.reset_window();
    assert_eq!(state.window().width(), 400.0);

    let x_frame = state.redraw(Axis::X).expect("frame");
    let centre = x_frame.canvas.get_pixel(256, 300).0;
    assert_eq!(centre, [60, 60, 60, 255]);
}

#[test]
fn window_can_be_seeded_from_data() {
    let mut config = ViewerConfig::default();
    config.window.seed_from_data = true;
    let mut state = ViewerState::new(config);
    state.load(volume(Vec::new()));
    assert_eq!(state.window().width(), 255.0);
    assert_eq!(state.window().level(), 127.5);
}
