//! WGPU-based rendering engine
//!
//! Draws the background (solid clear colour or a screen-filling image), the
//! textured scene nodes, the gizmo overlay and finally the UI, into a
//! multisampled target that resolves into the window surface.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use wgpu::{util::DeviceExt, Device, TextureFormat};

use crate::gfx::{
    camera::orbit_camera::OrbitCamera,
    resources::{
        global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
        material::MaterialLayout,
        texture_resource::TextureResource,
    },
    scene::{
        object::{transform_bind_group_layout, DrawNode},
        vertex::LineVertex,
        Background, Scene,
    },
};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
};

use super::pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager, VertexLayoutKind};

const SKY_PIPELINE: &str = "Sky";
const TEXTURED_PIPELINE: &str = "Textured";
const GIZMO_PIPELINE: &str = "Gizmo";

const SKY_SHADER: &str = include_str!("sky.wgsl");

/// Uploaded background image.
struct SkyBinding {
    _texture: TextureResource,
    bind_group: wgpu::BindGroup,
}

/// Dynamic vertex buffer for the gizmo line overlay.
struct OverlayBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
    vertex_count: u32,
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    sample_count: u32,
    depth_texture: TextureResource,
    msaa_target: Option<TextureResource>,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    transform_layout: BindGroupLayoutWithDesc,
    material_layout: MaterialLayout,
    sky_layout: BindGroupLayoutWithDesc,
    sky: Option<SkyBinding>,
    background_revision: Option<u64>,
    clear_color: wgpu::Color,
    overlay: Option<OverlayBuffer>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// `sample_count` is the MSAA sample count; 1 disables multisampling.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 8192,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request a device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;

        let sample_count = supported_sample_count(&adapter, format, sample_count);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            // Present paced by the display refresh
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, sample_count, "depth_texture");
        let msaa_target = (sample_count > 1)
            .then(|| TextureResource::create_msaa_target(&device, &config, sample_count));

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);
        let transform_layout = transform_bind_group_layout(&device);
        let material_layout = MaterialLayout::new(&device, &queue);
        let sky_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(
                wgpu::SamplerBindingType::Filtering,
            ))
            .create(&device, "Sky Bind Group Layout");

        // Wrap device and queue in Arc for pipeline manager
        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("sky", SKY_SHADER);
        pipeline_manager.load_shader("textured", include_str!("textured.wgsl"));
        pipeline_manager.load_shader("gizmo", include_str!("gizmo.wgsl"));

        let blended_target = vec![Some(wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        pipeline_manager.register_pipeline(
            SKY_PIPELINE,
            PipelineConfig::default_with_shader("sky")
                .with_label("SKY")
                .with_vertex_layout(VertexLayoutKind::None)
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![sky_layout.layout.clone()])
                .with_depth_config(DepthConfig {
                    format: TextureResource::DEPTH_FORMAT,
                    write: false,
                    compare: wgpu::CompareFunction::Always,
                })
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_sample_count(sample_count),
        );

        // Imported models do not agree on winding, so both faces are drawn
        pipeline_manager.register_pipeline(
            TEXTURED_PIPELINE,
            PipelineConfig::default_with_shader("textured")
                .with_label("TEXTURED")
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    material_layout.bind_group_layout().clone(),
                    transform_layout.layout.clone(),
                ])
                .with_depth(TextureResource::DEPTH_FORMAT)
                .with_color_targets(blended_target.clone())
                .with_sample_count(sample_count),
        );

        pipeline_manager.register_pipeline(
            GIZMO_PIPELINE,
            PipelineConfig::default_with_shader("gizmo")
                .with_label("GIZMO")
                .with_vertex_layout(VertexLayoutKind::Line)
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![global_bindings.bind_group_layout().clone()])
                .with_depth_config(DepthConfig {
                    format: TextureResource::DEPTH_FORMAT,
                    write: false,
                    compare: wgpu::CompareFunction::Always,
                })
                .with_color_targets(blended_target)
                .with_sample_count(sample_count),
        );

        pipeline_manager.create_all_pipelines()?;

        log::info!(
            "Render engine ready: {:?}, {}x{}, {}x MSAA",
            format,
            config.width,
            config.height,
            sample_count
        );

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            format,
            sample_count,
            depth_texture,
            msaa_target,
            pipeline_manager,
            global_ubo,
            global_bindings,
            transform_layout,
            material_layout,
            sky_layout,
            sky: None,
            background_revision: None,
            clear_color: wgpu::Color::BLACK,
            overlay: None,
        })
    }

    /// Brings GPU state in line with the scene and camera for the next frame
    ///
    /// Uploads the global uniforms, newly arrived background images, node
    /// buffers and materials, and the gizmo overlay.
    pub fn prepare(&mut self, scene: &mut Scene, camera: &OrbitCamera) {
        update_global_ubo(&mut self.global_ubo, &self.queue, camera.uniform, &scene.ambient);

        self.sync_background(scene);

        for node in scene.nodes_mut() {
            node.sync_gpu(
                &self.device,
                &self.queue,
                &self.transform_layout,
                &self.material_layout,
            );
        }

        let lines = scene.gizmos.overlay(scene.nodes(), camera.eye);
        self.upload_overlay(&lines);
    }

    fn sync_background(&mut self, scene: &Scene) {
        if self.background_revision == Some(scene.background_revision()) {
            return;
        }
        self.background_revision = Some(scene.background_revision());

        match scene.background() {
            Background::Color(color) => {
                self.clear_color = wgpu::Color {
                    r: color[0] as f64,
                    g: color[1] as f64,
                    b: color[2] as f64,
                    a: color[3] as f64,
                };
                self.sky = None;
            }
            Background::Texture(image) => {
                let texture =
                    TextureResource::from_image(&self.device, &self.queue, image, "Sky Texture");
                let bind_group = BindGroupBuilder::new(&self.sky_layout)
                    .texture(&texture.view)
                    .sampler(&texture.sampler)
                    .create(&self.device, "Sky Bind Group");
                log::debug!("Uploaded background image {}x{}", image.width, image.height);
                self.sky = Some(SkyBinding {
                    _texture: texture,
                    bind_group,
                });
            }
        }
    }

    fn upload_overlay(&mut self, lines: &[LineVertex]) {
        if lines.is_empty() {
            if let Some(overlay) = &mut self.overlay {
                overlay.vertex_count = 0;
            }
            return;
        }

        match &mut self.overlay {
            Some(overlay) if overlay.capacity >= lines.len() => {
                self.queue
                    .write_buffer(&overlay.buffer, 0, bytemuck::cast_slice(lines));
                overlay.vertex_count = lines.len() as u32;
            }
            _ => {
                let buffer = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Gizmo Overlay Buffer"),
                        contents: bytemuck::cast_slice(lines),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    });
                self.overlay = Some(OverlayBuffer {
                    buffer,
                    capacity: lines.len(),
                    vertex_count: lines.len() as u32,
                });
            }
        }
    }

    /// Renders a frame with optional UI overlay
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame<F>(&mut self, scene: &Scene, ui_callback: Option<F>) -> Result<()>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface texture acquisition timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(anyhow!("Failed to acquire surface texture: {}", e)),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let (view, resolve_target, store) = match &self.msaa_target {
                Some(msaa) => (
                    &msaa.view,
                    Some(&surface_texture_view),
                    wgpu::StoreOp::Discard,
                ),
                None => (&surface_texture_view, None, wgpu::StoreOp::Store),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            // PASS 1: Sky, independent of the camera
            if let (Some(sky), Some(pipeline)) =
                (&self.sky, self.pipeline_manager.pipeline(SKY_PIPELINE))
            {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &sky.bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            // PASS 2: Scene nodes
            if let Some(pipeline) = self.pipeline_manager.pipeline(TEXTURED_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                for node in scene.nodes().iter().filter(|node| node.visible) {
                    render_pass.draw_node(node);
                }
            }

            // PASS 3: Gizmo handles on top of everything
            if let (Some(overlay), Some(pipeline)) =
                (&self.overlay, self.pipeline_manager.pipeline(GIZMO_PIPELINE))
            {
                if overlay.vertex_count > 0 {
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_vertex_buffer(0, overlay.buffer.slice(..));
                    render_pass.draw(0..overlay.vertex_count, 0..1);
                }
            }
        }

        // PASS 4: UI overlay (if provided)
        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Resizes the surface and recreates the size-dependent targets
    ///
    /// Zero-sized requests (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) == (self.config.width, self.config.height) {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture = TextureResource::create_depth_texture(
            &self.device,
            &self.config,
            self.sample_count,
            "depth_texture",
        );
        if self.sample_count > 1 {
            self.msaa_target = Some(TextureResource::create_msaa_target(
                &self.device,
                &self.config,
                self.sample_count,
            ));
        }
        log::debug!("Render targets resized to {}x{}", width, height);
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the surface texture format
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// Largest supported sample count not above `requested`.
fn supported_sample_count(adapter: &wgpu::Adapter, format: TextureFormat, requested: u32) -> u32 {
    let color = adapter.get_texture_format_features(format).flags;
    let depth = adapter
        .get_texture_format_features(TextureResource::DEPTH_FORMAT)
        .flags;

    let count = [8, 4, 2]
        .into_iter()
        .filter(|&count| count <= requested)
        .find(|&count| {
            color.sample_count_supported(count) && depth.sample_count_supported(count)
        })
        .unwrap_or(1);

    if count != requested.max(1) {
        log::warn!(
            "{}x MSAA not supported for {:?}, using {}x",
            requested,
            format,
            count
        );
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sky_pass_reads_no_camera_state() {
        // Only the background texture and its sampler are bound
        assert!(!SKY_SHADER.contains("var<uniform>"));
        assert!(SKY_SHADER.contains("@group(0) @binding(0) var sky_map"));
        assert!(!SKY_SHADER.contains("@group(1)"));
    }

    #[test]
    fn sky_samples_at_screen_position() {
        assert!(SKY_SHADER.contains("out.uv = ndc * vec2<f32>(0.5, -0.5) + 0.5;"));
        assert!(SKY_SHADER.contains("textureSampleLevel(sky_map, sky_sampler, in.uv, 0.0)"));
    }
}
