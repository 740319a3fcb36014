use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, Event, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::assets::AssetLoader;
use crate::audio::open_default_output;
use crate::config::RoomConfig;
use crate::gfx::rendering::RenderEngine;
use crate::room::{FrameTarget, PendingLoads, SceneContext};
use crate::ui::{music_overlay, UiManager};

/// Runs the room until its window is closed.
///
/// Startup failures (event loop, window, GPU) are returned to the caller.
pub fn run(config: RoomConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    // Frames are driven by redraw requests issued from each tick
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ZenroomApp::new(config);
    event_loop
        .run_app(&mut app)
        .context("Event loop terminated abnormally")?;

    match app.startup_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub struct ZenroomApp {
    config: RoomConfig,
    room: Option<RunningRoom>,
    startup_error: Option<anyhow::Error>,
}

/// Everything that exists once the window is up.
struct RunningRoom {
    window: Arc<Window>,
    render_engine: RenderEngine,
    ui_manager: UiManager,
    context: SceneContext,
    loads: PendingLoads,
    last_frame: Instant,
}

impl ZenroomApp {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            room: None,
            startup_error: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<RunningRoom> {
        let (width, height) = self.config.window_size;
        let window = event_loop
            .create_window(
                Window::default_attributes()
                    .with_title(self.config.title.clone())
                    .with_inner_size(LogicalSize::new(width, height)),
            )
            .context("Failed to create window")?;
        let window = Arc::new(window);

        let PhysicalSize { width, height } = window.inner_size();
        let render_engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            self.config.msaa_samples,
        ))?;

        let ui_manager = UiManager::new(
            render_engine.device(),
            render_engine.queue(),
            render_engine.surface_format(),
            &window,
        );

        let loader = AssetLoader::new(&self.config.asset_root);
        let (mut context, loads) =
            SceneContext::assemble(&self.config, &loader, open_default_output());
        context.resize(width, height);

        window.request_redraw();
        Ok(RunningRoom {
            window,
            render_engine,
            ui_manager,
            context,
            loads,
            last_frame: Instant::now(),
        })
    }
}

impl ApplicationHandler for ZenroomApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.room.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(room) => {
                log::info!("'{}' is running", self.config.title);
                self.room = Some(room);
            }
            Err(err) => {
                log::error!("Startup failed: {:#}", err);
                self.startup_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(room) = self.room.as_mut() else {
            return;
        };

        // Handle UI input first; releases always reach the scene so drags end
        let ui_event: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        let captured = room.ui_manager.handle_input(&room.window, &ui_event);
        let is_release = matches!(
            event,
            WindowEvent::MouseInput {
                state: ElementState::Released,
                ..
            }
        );
        let context = &mut room.context;
        if captured && !is_release {
            if matches!(event, WindowEvent::CursorMoved { .. }) {
                context.pointer_left();
            }
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                context.resize(width, height);
                room.window.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                context.pointer_moved((position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => {
                context.pointer_left();
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => context.pointer_pressed(button),
                ElementState::Released => context.pointer_released(button),
            },
            WindowEvent::MouseWheel { delta, .. } => {
                context.scrolled(&delta);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if context.handle_key(&event) {
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                context.apply_ready(&mut room.loads);

                let now = Instant::now();
                let dt = now - room.last_frame;
                room.last_frame = now;

                let mut target = WindowTarget {
                    window: &room.window,
                    render_engine: &mut room.render_engine,
                    ui_manager: &mut room.ui_manager,
                    music_clicked: false,
                };
                context.tick(dt, &mut target);

                if target.music_clicked {
                    context.toggle_music();
                }
            }
            _ => (),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(room) = &self.room {
            log::info!(
                "Closing after {} frames ({:.1}s)",
                room.context.frame_count(),
                room.context.elapsed().as_secs_f32()
            );
        }
    }
}

/// The window as a frame target: draws through the render engine and
/// schedules the next tick with a redraw request.
struct WindowTarget<'a> {
    window: &'a Window,
    render_engine: &'a mut RenderEngine,
    ui_manager: &'a mut UiManager,
    music_clicked: bool,
}

impl FrameTarget for WindowTarget<'_> {
    fn render(&mut self, context: &mut SceneContext) {
        let (width, height) = context.viewport();
        self.render_engine.resize(width, height);
        self.render_engine
            .prepare(&mut context.scene, &context.camera.camera);

        let label = context.music_label();
        let failed = context.failures().len();
        let window = self.window;
        let ui_manager = &mut *self.ui_manager;
        let mut clicked = false;

        let result = self.render_engine.render_frame(
            &context.scene,
            Some(
                |device: &wgpu::Device,
                 queue: &wgpu::Queue,
                 encoder: &mut wgpu::CommandEncoder,
                 view: &wgpu::TextureView| {
                    ui_manager.draw(device, queue, encoder, window, view, |ui| {
                        clicked = music_overlay(ui, label, failed);
                    });
                },
            ),
        );
        if let Err(err) = result {
            log::error!("Frame failed: {:#}", err);
        }

        self.music_clicked = clicked;
    }

    fn schedule_next(&mut self) {
        self.window.request_redraw();
    }
}
