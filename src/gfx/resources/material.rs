//! GPU side of materials
//!
//! Every material binds a small uniform (base colour and a texture flag), a
//! texture view and a sampler to group 1. Untextured materials bind a shared
//! 1x1 white texture so all materials fit the same layout.

use crate::{
    assets::ImageData,
    gfx::resources::texture_resource::TextureResource,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// GPU uniform data for materials
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    /// 1.0 when the texture should modulate the base colour
    pub use_texture: f32,
    _padding: [f32; 3],
}

impl MaterialUniform {
    pub fn new(base_color: [f32; 4], use_texture: bool) -> Self {
        Self {
            base_color,
            use_texture: if use_texture { 1.0 } else { 0.0 },
            _padding: [0.0; 3],
        }
    }
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// The layout shared by all material bind groups, plus the fallback texture.
pub struct MaterialLayout {
    bind_group_layout: BindGroupLayoutWithDesc,
    white: TextureResource,
}

impl MaterialLayout {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(
                wgpu::SamplerBindingType::Filtering,
            ))
            .create(device, "Material Bind Group Layout");

        let white = TextureResource::from_image(
            device,
            queue,
            &ImageData::solid([255, 255, 255, 255]),
            "White Texture",
        );

        Self {
            bind_group_layout,
            white,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }
}

/// Uniform buffer, optional texture and bind group of one material.
pub struct MaterialGpu {
    ubo: MaterialUBO,
    // Held so the bind group's view stays valid
    _texture: Option<TextureResource>,
    bind_group: wgpu::BindGroup,
}

impl MaterialGpu {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &MaterialLayout,
        name: &str,
        base_color: [f32; 4],
        image: Option<&ImageData>,
    ) -> Self {
        let texture =
            image.map(|image| TextureResource::from_image(device, queue, image, name));
        let uniform = MaterialUniform::new(base_color, texture.is_some());
        let ubo = MaterialUBO::new_with_data(device, &uniform);

        let bound = texture.as_ref().unwrap_or(&layout.white);
        let bind_group = BindGroupBuilder::new(&layout.bind_group_layout)
            .resource(ubo.binding_resource())
            .texture(&bound.view)
            .sampler(&bound.sampler)
            .create(device, &format!("Material Bind Group: {}", name));

        Self {
            ubo,
            _texture: texture,
            bind_group,
        }
    }

    /// Rewrites the uniform; the texture binding is fixed at creation.
    pub fn update(&mut self, queue: &wgpu::Queue, base_color: [f32; 4], textured: bool) {
        self.ubo
            .update_content(queue, MaterialUniform::new(base_color, textured));
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
