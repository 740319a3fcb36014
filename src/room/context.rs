use std::sync::Arc;
use std::time::Duration;

use cgmath::{Deg, Quaternion, Rotation3, Vector3};
use winit::{
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::loads::{LoadFailure, LoadOutcome, LoadResult, ModelPlacement, PendingLoads, TextureSlot};
use crate::assets::AssetLoader;
use crate::audio::{AudioOutput, AudioToggle, PlaybackSettings, PlaybackState};
use crate::config::RoomConfig;
use crate::gfx::{
    camera::{CameraController, CameraManager, NavigationDrag, OrbitCamera},
    geometry::generate_plane,
    gizmos::{GizmoId, GizmoMode},
    picking::{screen_to_ray, Ray},
    scene::{AmbientLight, Background, Material, Node, NodeId, Scene, Transform},
};

/// Shown until the sky image arrives, or for good if it never does
pub const SKY_PLACEHOLDER: [f32; 4] = [0.05, 0.06, 0.1, 1.0];

const ROTATE_SPEED: f32 = 0.005;
const ZOOM_SPEED: f32 = 0.1;
const MIN_CAMERA_DISTANCE: f32 = 0.5;

/// Where each frame goes: something that can draw the room and ask for the next tick.
pub trait FrameTarget {
    fn render(&mut self, context: &mut SceneContext);

    fn schedule_next(&mut self);
}

/// Node ids of the three static room surfaces.
#[derive(Debug, Clone, Copy)]
struct Surfaces {
    floor: NodeId,
    wall: NodeId,
    ceiling: NodeId,
}

/// Everything the running room owns: scene, camera rig, music and load bookkeeping.
pub struct SceneContext {
    pub scene: Scene,
    pub camera: CameraManager,
    audio: AudioToggle,
    surfaces: Surfaces,
    viewport: (u32, u32),
    failures: Vec<LoadFailure>,
    cursor: Option<(f32, f32)>,
    /// Button that started the current navigation drag
    navigation_button: Option<MouseButton>,
    elapsed: Duration,
    frames: u64,
}

impl SceneContext {
    /// Builds the static room and issues every asset load
    ///
    /// The returned [`PendingLoads`] must be polled by the caller and its
    /// results passed to [`apply_load`](Self::apply_load).
    pub fn assemble(
        config: &RoomConfig,
        loader: &AssetLoader,
        audio_output: Box<dyn AudioOutput>,
    ) -> (SceneContext, PendingLoads) {
        let mut scene = Scene::new();
        scene.set_background(Background::Color(SKY_PLACEHOLDER));
        scene.ambient = AmbientLight {
            color: config.ambient.color,
            intensity: config.ambient.intensity,
        };

        let surfaces = build_surfaces(&mut scene);

        let (width, height) = config.window_size;
        let mut camera = OrbitCamera::looking_at(
            config.camera.eye,
            config.camera.target,
            Deg(config.camera.fov_y_degrees),
            config.camera.znear,
            config.camera.zfar,
            aspect_ratio(width, height),
        );
        camera.bounds.min_distance = Some(MIN_CAMERA_DISTANCE);
        camera.update_view_proj();
        let controller = CameraController::new(ROTATE_SPEED, ZOOM_SPEED)
            .with_damping(config.camera.damping_factor);

        let audio = AudioToggle::new(
            audio_output,
            PlaybackSettings {
                volume: config.music.volume,
                looping: config.music.looping,
            },
        );

        let mut loads = PendingLoads::new();
        let assets = &config.assets;
        for (slot, locator) in [
            (TextureSlot::Sky, &assets.sky_texture),
            (TextureSlot::Floor, &assets.floor_texture),
            (TextureSlot::Wall, &assets.wall_texture),
            (TextureSlot::Ceiling, &assets.ceiling_texture),
        ] {
            loads.push_texture(slot, loader.load_texture(locator));
        }
        for (locator, position) in [
            (&assets.candle_model, config.candle_position),
            (&assets.person_model, config.person_position),
        ] {
            loads.push_model(
                ModelPlacement {
                    locator: locator.clone(),
                    position,
                },
                loader.load_model(locator),
            );
        }
        loads.push_audio(loader.load_audio(&assets.music));

        log::info!(
            "Room assembled with {} nodes; {} asset load(s) pending from {}",
            scene.node_count(),
            loads.len(),
            loader.root().display()
        );

        let context = SceneContext {
            scene,
            camera: CameraManager::new(camera, controller),
            audio,
            surfaces,
            viewport: (width, height),
            failures: Vec::new(),
            cursor: None,
            navigation_button: None,
            elapsed: Duration::ZERO,
            frames: 0,
        };
        (context, loads)
    }

    /// Places `node` at `position`, adds it to the scene and gives it a gizmo.
    pub fn attach(&mut self, mut node: Node, position: Vector3<f32>) -> (NodeId, GizmoId) {
        node.transform.position = position;
        let name = node.name.clone();
        let node_id = self.scene.add_node(node);
        let gizmo_id = self.scene.gizmos.attach(node_id);
        log::info!(
            "Attached '{}' at ({}, {}, {}) with gizmo {:?}",
            name,
            position.x,
            position.y,
            position.z,
            gizmo_id
        );
        (node_id, gizmo_id)
    }

    /// Applies one finished load to the room.
    pub fn apply_load(&mut self, result: LoadResult) {
        match result {
            Ok(LoadOutcome::Texture { slot, image }) => {
                log::info!("Loaded {:?} texture ({}x{})", slot, image.width, image.height);
                self.apply_texture(slot, Arc::new(image));
            }
            Ok(LoadOutcome::Model { placement, model }) => {
                log::info!(
                    "Loaded model '{}' ({} parts, {} triangles)",
                    placement.locator,
                    model.parts.len(),
                    model.triangle_count()
                );
                let node = Node::from_model(&placement.locator, &model);
                self.attach(node, placement.position);
            }
            Ok(LoadOutcome::Audio(clip)) => {
                log::info!("Loaded music '{}'", clip.locator);
                if let Err(err) = self.audio.attach_clip(&clip) {
                    self.record_failure(LoadFailure {
                        locator: clip.locator.clone(),
                        message: err.to_string(),
                    });
                }
            }
            Err(failure) => self.record_failure(failure),
        }
    }

    /// Applies every load that has completed so far.
    pub fn apply_ready(&mut self, loads: &mut PendingLoads) -> usize {
        let ready = loads.poll_ready();
        let count = ready.len();
        for result in ready {
            self.apply_load(result);
        }
        count
    }

    fn apply_texture(&mut self, slot: TextureSlot, image: Arc<crate::assets::ImageData>) {
        let node_id = match slot {
            TextureSlot::Sky => {
                self.scene.set_background(Background::Texture(image));
                return;
            }
            TextureSlot::Floor => self.surfaces.floor,
            TextureSlot::Wall => self.surfaces.wall,
            TextureSlot::Ceiling => self.surfaces.ceiling,
        };
        if let Some(node) = self.scene.node_mut(node_id) {
            for part in &mut node.parts {
                part.material.set_texture(image.clone());
            }
        }
    }

    fn record_failure(&mut self, failure: LoadFailure) {
        log::error!("{}", failure.message);
        self.failures.push(failure);
    }

    /// Follows a new render-target size. Zero-sized requests are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return;
        }
        self.viewport = (width, height);
        self.camera.camera.resize_projection(width, height);
        self.camera.camera.update_view_proj();
        log::debug!("Viewport resized to {}x{}", width, height);
    }

    /// One frame: step the camera rig, render once, schedule the next tick.
    pub fn tick(&mut self, dt: Duration, target: &mut impl FrameTarget) {
        self.elapsed += dt;
        self.frames += 1;
        self.camera.update();
        target.render(self);
        target.schedule_next();
    }

    // Input

    /// Pointer motion in physical pixels. Drags a gizmo if one is held,
    /// otherwise feeds camera navigation and gizmo hover.
    pub fn pointer_moved(&mut self, position: (f32, f32)) {
        let previous = self.cursor.replace(position);

        if let Some(ray) = self.pointer_ray(position) {
            let eye = self.camera.camera.eye;
            if self.scene.pointer_moved(&ray, eye) {
                return;
            }
        }

        if let Some((x, y)) = previous {
            self.camera
                .controller
                .pointer_moved((position.0 - x, position.1 - y));
        }
    }

    /// Press of a pointer button. A left press on a gizmo handle starts a
    /// manipulation; any other press starts the navigation drag bound to
    /// that button.
    pub fn pointer_pressed(&mut self, button: MouseButton) {
        match button {
            MouseButton::Left => {
                let ray = self.cursor.and_then(|cursor| self.pointer_ray(cursor));
                let grabbed = match ray {
                    Some(ray) => {
                        let eye = self.camera.camera.eye;
                        self.scene
                            .pointer_down(&ray, eye, &mut self.camera.controller)
                    }
                    None => false,
                };
                if !grabbed {
                    self.begin_navigation(button, NavigationDrag::Rotate);
                }
            }
            MouseButton::Middle => self.begin_navigation(button, NavigationDrag::Dolly),
            MouseButton::Right => self.begin_navigation(button, NavigationDrag::Pan),
            _ => {}
        }
    }

    fn begin_navigation(&mut self, button: MouseButton, drag: NavigationDrag) {
        if self.camera.controller.begin_drag(drag) {
            self.navigation_button = Some(button);
        }
    }

    /// Release of a pointer button. Only the left button ends manipulations,
    /// and only the button that started navigation ends it.
    pub fn pointer_released(&mut self, button: MouseButton) {
        if button == MouseButton::Left {
            self.scene.pointer_up(&mut self.camera.controller);
        }
        if self.navigation_button == Some(button) {
            self.navigation_button = None;
            self.camera.controller.end_drag();
        }
    }

    /// The pointer left the window or is over the overlay. The next motion
    /// starts from scratch instead of producing one large jump.
    pub fn pointer_left(&mut self) {
        self.cursor = None;
    }

    pub fn scrolled(&mut self, delta: &MouseScrollDelta) {
        self.camera
            .controller
            .process_scroll(delta, &mut self.camera.camera);
    }

    /// Routes a keyboard event. Returns `true` when the key asks to quit.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        self.camera
            .controller
            .process_keyed_events(event, &mut self.camera.camera);

        match (event.physical_key, event.state) {
            (PhysicalKey::Code(code), ElementState::Pressed) if !event.repeat => {
                self.key_pressed(code)
            }
            _ => false,
        }
    }

    /// W/E/R pick the gizmo mode, Escape quits.
    pub fn key_pressed(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::KeyW => self.scene.gizmos.set_mode(GizmoMode::Translate),
            KeyCode::KeyE => self.scene.gizmos.set_mode(GizmoMode::Rotate),
            KeyCode::KeyR => self.scene.gizmos.set_mode(GizmoMode::Scale),
            KeyCode::Escape => return true,
            _ => {}
        }
        false
    }

    fn pointer_ray(&self, position: (f32, f32)) -> Option<Ray> {
        let (width, height) = self.viewport;
        screen_to_ray(
            position,
            (width as f32, height as f32),
            &self.camera.camera,
        )
    }

    // Music

    pub fn toggle_music(&mut self) -> PlaybackState {
        self.audio.toggle()
    }

    pub fn music_label(&self) -> &'static str {
        self.audio.label()
    }

    pub fn audio(&self) -> &AudioToggle {
        &self.audio
    }

    // State

    /// Render-target size the next frame is drawn at.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// Floor, back wall and ceiling, white until their textures load.
fn build_surfaces(scene: &mut Scene) -> Surfaces {
    let white = [1.0, 1.0, 1.0, 1.0];

    let floor = Node::primitive("floor", &generate_plane(10.0, 10.0, 1, 1), Material::new("floor", white))
        .with_transform(Transform {
            rotation: Quaternion::from_angle_x(Deg(-90.0)),
            ..Transform::default()
        });

    let wall = Node::primitive("wall", &generate_plane(10.0, 3.0, 1, 1), Material::new("wall", white))
        .with_transform(Transform::at(Vector3::new(0.0, 1.5, -5.0)));

    let ceiling = Node::primitive(
        "ceiling",
        &generate_plane(10.0, 10.0, 1, 1),
        Material::new("ceiling", white),
    )
    .with_transform(Transform {
        position: Vector3::new(0.0, 3.0, 0.0),
        rotation: Quaternion::from_angle_x(Deg(90.0)),
        ..Transform::default()
    });

    Surfaces {
        floor: scene.add_node(floor),
        wall: scene.add_node(wall),
        ceiling: scene.add_node(ceiling),
    }
}
