//! End-to-end behaviour of an assembled room, without a GPU or audio device.

use std::path::Path;
use std::time::Duration;

use approx::assert_relative_eq;
use cgmath::{Deg, Rad, Vector3};
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use super::*;
use crate::assets::{AssetLoader, MaterialData, MeshData, ModelData, ModelPart};
use crate::audio::{PlaybackState, SilentOutput};
use crate::config::RoomConfig;
use crate::gfx::camera::camera_utils::Camera;
use crate::gfx::gizmos::{Gizmo, GizmoId, GizmoMode, TransformGizmo};
use crate::gfx::scene::{Background, NodeId};

fn assemble_in(root: &Path) -> (SceneContext, PendingLoads) {
    let config = RoomConfig::default().with_asset_root(root);
    let loader = AssetLoader::new(&config.asset_root);
    SceneContext::assemble(&config, &loader, Box::new(SilentOutput))
}

fn drain_into(context: &mut SceneContext, loads: &mut PendingLoads) {
    for result in pollster::block_on(loads.drain()) {
        context.apply_load(result);
    }
}

fn assert_near(actual: Vector3<f32>, expected: Vector3<f32>) {
    for (a, e) in [(actual.x, expected.x), (actual.y, expected.y), (actual.z, expected.z)] {
        assert_relative_eq!(a, e, epsilon = 1e-3);
    }
}

fn triangle_model(name: &str) -> ModelData {
    ModelData {
        name: name.to_string(),
        parts: vec![ModelPart {
            mesh: MeshData {
                positions: vec![[0.0, 0.0, 0.0], [0.2, 0.0, 0.0], [0.0, 0.3, 0.0]],
                normals: vec![[0.0, 0.0, 1.0]; 3],
                tex_coords: vec![[0.0, 0.0]; 3],
                indices: vec![0, 1, 2],
            },
            material: MaterialData::default(),
        }],
    }
}

fn model_loaded(locator: &str, position: Vector3<f32>) -> LoadResult {
    Ok(LoadOutcome::Model {
        placement: ModelPlacement {
            locator: locator.to_string(),
            position,
        },
        model: triangle_model(locator),
    })
}

/// Screen position of a world point in the current viewport.
fn project(context: &SceneContext, point: Vector3<f32>) -> (f32, f32) {
    let (width, height) = context.viewport();
    let clip = context.camera.camera.build_view_projection_matrix() * point.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    (
        (ndc.x + 1.0) * 0.5 * width as f32,
        (1.0 - ndc.y) * 0.5 * height as f32,
    )
}

#[derive(Default)]
struct RecordingTarget {
    renders: usize,
    scheduled: usize,
    frames_seen: Vec<u64>,
}

impl FrameTarget for RecordingTarget {
    fn render(&mut self, context: &mut SceneContext) {
        assert_eq!(self.scheduled, self.renders, "render before previous schedule");
        self.renders += 1;
        self.frames_seen.push(context.frame_count());
    }

    fn schedule_next(&mut self) {
        self.scheduled += 1;
    }
}

#[test]
fn assembly_builds_static_room_and_issues_loads() {
    let dir = tempfile::tempdir().unwrap();
    let (context, loads) = assemble_in(dir.path());

    let names: Vec<&str> = context.scene.nodes().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["floor", "wall", "ceiling"]);
    assert_eq!(loads.len(), 7);

    let floor = context.scene.node(NodeId(0)).unwrap();
    let tilted = floor.transform.rotation * Vector3::unit_z();
    assert_near(tilted, Vector3::unit_y());

    let wall = context.scene.node(NodeId(1)).unwrap();
    assert_eq!(wall.transform.position, Vector3::new(0.0, 1.5, -5.0));

    let ceiling = context.scene.node(NodeId(2)).unwrap();
    assert_eq!(ceiling.transform.position, Vector3::new(0.0, 3.0, 0.0));
    let facing = ceiling.transform.rotation * Vector3::unit_z();
    assert_near(facing, -Vector3::unit_y());

    assert!(matches!(context.scene.background(), Background::Color(c) if *c == SKY_PLACEHOLDER));
    assert_eq!(context.scene.ambient.intensity, 1.5);

    let camera = &context.camera.camera;
    assert_near(camera.eye, Vector3::new(0.0, 1.5, 5.0));
    assert_relative_eq!(camera.fovy.0, Rad::from(Deg(75.0f32)).0, epsilon = 1e-6);
    assert_eq!((camera.znear, camera.zfar), (0.1, 1000.0));
    assert!(context.camera.navigation_enabled());
    assert_eq!(context.music_label(), "Play Music");
}

#[test]
fn missing_assets_degrade_without_stopping_the_room() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, mut loads) = assemble_in(dir.path());
    drain_into(&mut context, &mut loads);

    assert_eq!(context.failures().len(), 7);
    let locators: Vec<&str> = context.failures().iter().map(|f| f.locator.as_str()).collect();
    assert!(locators.contains(&"models/candle.glb"));
    assert!(locators.contains(&"music/relax.mp3"));

    // Static room intact, models absent, music silent
    assert_eq!(context.scene.node_count(), 3);
    assert_eq!(context.scene.gizmos.gizmo_count(), 0);
    assert_eq!(context.toggle_music(), PlaybackState::Playing);
    assert_eq!(context.audio().clip(), None);
}

#[test]
fn loaded_textures_reach_their_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("textures")).unwrap();
    for (name, shade) in [("sky", 10u8), ("floor", 20), ("wall", 30), ("ceiling", 40)] {
        image::RgbaImage::from_pixel(2, 2, image::Rgba([shade, shade, shade, 255]))
            .save_with_format(
                dir.path().join(format!("textures/{}.jpg", name)),
                image::ImageFormat::Png,
            )
            .unwrap();
    }

    let (mut context, mut loads) = assemble_in(dir.path());
    drain_into(&mut context, &mut loads);

    assert_eq!(context.failures().len(), 3);
    match context.scene.background() {
        Background::Texture(image) => assert_eq!(image.rgba[0], 10),
        other => panic!("sky not applied: {:?}", other),
    }
    for (id, shade) in [(0, 20), (1, 30), (2, 40)] {
        let material = &context.scene.node(NodeId(id)).unwrap().parts[0].material;
        assert_eq!(material.texture().map(|t| t.rgba[0]), Some(shade));
    }
}

#[test]
fn candle_and_person_coexist_with_their_own_rigs() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());

    context.apply_load(model_loaded("models/candle.glb", Vector3::new(-1.0, 0.0, 0.0)));
    context.apply_load(model_loaded(
        "models/meditating_person.glb",
        Vector3::new(1.0, 0.0, 0.0),
    ));

    let candle = context.scene.find_node("models/candle.glb").unwrap();
    let person = context.scene.find_node("models/meditating_person.glb").unwrap();
    assert_eq!(
        context.scene.node(candle).unwrap().transform.position,
        Vector3::new(-1.0, 0.0, 0.0)
    );
    assert_eq!(
        context.scene.node(person).unwrap().transform.position,
        Vector3::new(1.0, 0.0, 0.0)
    );
    assert_eq!(
        context.scene.nodes().iter().filter(|n| n.name == "models/candle.glb").count(),
        1
    );

    let gizmos = &context.scene.gizmos;
    assert_eq!(gizmos.gizmo_count(), 2);
    let targets: Vec<NodeId> = (0..2)
        .filter_map(|i| gizmos.get(GizmoId(i)))
        .map(|g| g.target())
        .collect();
    assert_eq!(targets, [candle, person]);
}

#[test]
fn attach_places_node_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());
    let before = context.scene.node_count();

    let node = crate::gfx::scene::Node::from_model("box", &triangle_model("box"));
    let (node_id, gizmo_id) = context.attach(node, Vector3::new(0.25, -2.0, 3.5));

    assert_eq!(context.scene.node_count(), before + 1);
    assert_eq!(
        context.scene.node(node_id).unwrap().transform.position,
        Vector3::new(0.25, -2.0, 3.5)
    );
    assert_eq!(context.scene.gizmos.get(gizmo_id).unwrap().target(), node_id);
}

#[test]
fn dragging_a_handle_suspends_navigation_until_release() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());
    context.resize(800, 600);
    context.apply_load(model_loaded("models/candle.glb", Vector3::new(-1.0, 0.0, 0.0)));
    let candle = context.scene.find_node("models/candle.glb").unwrap();

    // Midpoint of the candle's X handle
    let eye = context.camera.camera.eye;
    let size = TransformGizmo::size(Vector3::new(-1.0, 0.0, 0.0), eye);
    let grab = project(&context, Vector3::new(-1.0 + size * 0.5, 0.0, 0.0));
    let release = project(&context, Vector3::new(-1.0 + size * 0.5 + 0.4, 0.0, 0.0));

    context.pointer_moved(grab);
    context.pointer_pressed(MouseButton::Left);
    assert!(!context.camera.navigation_enabled());
    assert!(context.scene.gizmos.is_dragging());

    context.pointer_moved(release);
    let position = context.scene.node(candle).unwrap().transform.position;
    assert_near(position, Vector3::new(-0.6, 0.0, 0.0));

    context.pointer_released(MouseButton::Left);
    assert!(context.camera.navigation_enabled());
    assert!(!context.scene.gizmos.is_dragging());
}

#[test]
fn other_buttons_do_not_end_a_handle_drag() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());
    context.resize(800, 600);
    context.apply_load(model_loaded("models/candle.glb", Vector3::new(-1.0, 0.0, 0.0)));

    let eye = context.camera.camera.eye;
    let size = TransformGizmo::size(Vector3::new(-1.0, 0.0, 0.0), eye);
    context.pointer_moved(project(&context, Vector3::new(-1.0 + size * 0.5, 0.0, 0.0)));
    context.pointer_pressed(MouseButton::Left);
    assert!(context.scene.gizmos.is_dragging());

    for button in [MouseButton::Right, MouseButton::Middle] {
        context.pointer_pressed(button);
        context.pointer_released(button);
        assert!(context.scene.gizmos.is_dragging());
        assert!(!context.camera.navigation_enabled());
    }

    context.pointer_released(MouseButton::Left);
    assert!(!context.scene.gizmos.is_dragging());
    assert!(context.camera.navigation_enabled());
}

#[test]
fn navigation_ends_only_with_its_own_button() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());
    context.resize(800, 600);

    context.pointer_moved((5.0, 5.0));
    context.pointer_pressed(MouseButton::Left);
    context.pointer_released(MouseButton::Right);
    assert!(context.camera.controller.is_rotating());

    context.pointer_released(MouseButton::Left);
    assert!(!context.camera.controller.is_rotating());

    context.pointer_pressed(MouseButton::Right);
    assert!(context.camera.controller.is_panning());
    context.pointer_released(MouseButton::Left);
    assert!(context.camera.controller.is_panning());
    context.pointer_released(MouseButton::Right);
    assert!(!context.camera.controller.is_panning());
}

#[test]
fn middle_drag_dollies_toward_the_target() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());
    context.resize(800, 600);
    let start = context.camera.camera.distance;

    context.pointer_moved((5.0, 5.0));
    context.pointer_pressed(MouseButton::Middle);
    context.pointer_moved((5.0, 45.0));
    context.camera.update();
    let closer = context.camera.camera.distance;
    assert!(closer < start);

    context.pointer_released(MouseButton::Middle);
    context.pointer_moved((5.0, 85.0));
    context.camera.update();
    assert_relative_eq!(context.camera.camera.distance, closer);
}

#[test]
fn motion_after_losing_the_pointer_does_not_jump() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());
    context.resize(800, 600);
    let start_yaw = context.camera.camera.yaw;

    context.pointer_moved((5.0, 5.0));
    context.pointer_pressed(MouseButton::Left);
    context.pointer_left();
    context.pointer_moved((405.0, 5.0));
    context.camera.update();
    assert_relative_eq!(context.camera.camera.yaw, start_yaw);

    // Rotation resumes from the new position
    context.pointer_moved((415.0, 5.0));
    context.camera.update();
    assert!(context.camera.camera.yaw != start_yaw);
}

#[test]
fn pressing_empty_space_orbits_instead() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());
    context.resize(800, 600);

    context.pointer_moved((5.0, 5.0));
    context.pointer_pressed(MouseButton::Left);
    assert!(context.camera.controller.is_rotating());
    assert!(context.camera.navigation_enabled());

    context.pointer_released(MouseButton::Left);
    assert!(!context.camera.controller.is_rotating());
}

#[test]
fn resize_updates_aspect_and_viewport() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());

    for (width, height) in [(800, 600), (1920, 1080), (1, 1000), (640, 480)] {
        context.resize(width, height);
        assert_eq!(context.viewport(), (width, height));
        assert_relative_eq!(context.camera.camera.aspect, width as f32 / height as f32);
    }

    // Idempotent
    context.resize(640, 480);
    assert_eq!(context.viewport(), (640, 480));

    // Zero-sized requests leave everything as it was
    context.resize(0, 300);
    context.resize(300, 0);
    assert_eq!(context.viewport(), (640, 480));
    assert_relative_eq!(context.camera.camera.aspect, 640.0 / 480.0);
}

#[test]
fn each_tick_renders_once_and_schedules_once() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());
    let mut target = RecordingTarget::default();

    for _ in 0..5 {
        context.tick(Duration::from_millis(16), &mut target);
    }

    assert_eq!(target.renders, 5);
    assert_eq!(target.scheduled, 5);
    assert_eq!(target.frames_seen, [1, 2, 3, 4, 5]);
    assert_eq!(context.elapsed(), Duration::from_millis(80));
}

#[test]
fn music_toggle_round_trips_its_label() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());

    assert_eq!(context.music_label(), "Play Music");
    assert_eq!(context.toggle_music(), PlaybackState::Playing);
    assert_eq!(context.music_label(), "Pause Music");
    assert_eq!(context.toggle_music(), PlaybackState::Paused);
    assert_eq!(context.music_label(), "Play Music");
}

#[test]
fn mode_keys_switch_every_rig_and_escape_quits() {
    let dir = tempfile::tempdir().unwrap();
    let (mut context, _loads) = assemble_in(dir.path());
    context.apply_load(model_loaded("models/candle.glb", Vector3::new(-1.0, 0.0, 0.0)));
    context.apply_load(model_loaded("models/person.glb", Vector3::new(1.0, 0.0, 0.0)));

    assert!(!context.key_pressed(KeyCode::KeyE));
    assert_eq!(context.scene.gizmos.mode(), GizmoMode::Rotate);
    for i in 0..2 {
        let gizmo = context.scene.gizmos.get(GizmoId(i)).unwrap();
        assert_eq!(gizmo.mode(), GizmoMode::Rotate);
    }

    context.key_pressed(KeyCode::KeyR);
    assert_eq!(context.scene.gizmos.mode(), GizmoMode::Scale);
    context.key_pressed(KeyCode::KeyW);
    assert_eq!(context.scene.gizmos.mode(), GizmoMode::Translate);

    assert!(context.key_pressed(KeyCode::Escape));
}
