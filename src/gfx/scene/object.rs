use std::ops::Range;
use std::sync::Arc;

use cgmath::{Matrix4, One, Quaternion, Vector3};
use wgpu::util::DeviceExt;

use super::vertex::Vertex3D;
use crate::assets::{ImageData, MaterialData, MeshData, ModelData};
use crate::gfx::geometry::GeometryData;
use crate::gfx::resources::material::{MaterialGpu, MaterialLayout};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
};

/// Position, orientation and scale of a node; composed as `T * R * S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Where a node's geometry came from.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSource {
    /// Procedural geometry built in code
    Primitive,
    /// A model file, by locator
    Model(String),
}

/// Triangle mesh with lazily created GPU buffers.
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let index_count = indices.len() as u32;
        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    pub fn from_geometry(geometry: &GeometryData) -> Self {
        let (vertices, indices) = geometry.to_scene_format();
        Self::new(vertices, indices)
    }

    pub fn from_mesh_data(data: &MeshData) -> Self {
        let vertices = data
            .positions
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex3D {
                position: *position,
                normal: data.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: data.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect();
        Self::new(vertices, data.indices.clone())
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    pub fn is_uploaded(&self) -> bool {
        self.vertex_buffer.is_some() && self.index_buffer.is_some()
    }

    pub fn init_gpu_resources(&mut self, device: &wgpu::Device) {
        if self.is_uploaded() {
            return;
        }

        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

/// Surface appearance: base colour, optionally modulated by a texture.
pub struct Material {
    pub name: String,
    base_color: [f32; 4],
    texture: Option<Arc<ImageData>>,
    dirty: bool,
    gpu: Option<MaterialGpu>,
}

impl Material {
    pub fn new(name: &str, base_color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            texture: None,
            dirty: true,
            gpu: None,
        }
    }

    pub fn from_data(data: &MaterialData) -> Self {
        Self {
            name: data.name.clone(),
            base_color: data.base_color,
            texture: data.texture.clone(),
            dirty: true,
            gpu: None,
        }
    }

    pub fn base_color(&self) -> [f32; 4] {
        self.base_color
    }

    pub fn texture(&self) -> Option<&Arc<ImageData>> {
        self.texture.as_ref()
    }

    /// Replaces the colour map; the GPU bind group is rebuilt on the next sync.
    pub fn set_texture(&mut self, texture: Arc<ImageData>) {
        self.texture = Some(texture);
        self.gpu = None;
        self.dirty = true;
    }

    pub fn needs_sync(&self) -> bool {
        self.dirty || self.gpu.is_none()
    }

    pub fn sync_gpu(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, layout: &MaterialLayout) {
        match &mut self.gpu {
            Some(gpu) => {
                if self.dirty {
                    gpu.update(queue, self.base_color, self.texture.is_some());
                }
            }
            None => {
                self.gpu = Some(MaterialGpu::new(
                    device,
                    queue,
                    layout,
                    &self.name,
                    self.base_color,
                    self.texture.as_deref(),
                ));
            }
        }
        self.dirty = false;
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(MaterialGpu::bind_group)
    }
}

/// One drawable piece of a node.
pub struct NodePart {
    pub mesh: Mesh,
    pub material: Material,
}

// GPU resources struct to hold the model-matrix uniform
pub struct NodeGpuResources {
    pub transform_buffer: wgpu::Buffer,
    pub transform_bind_group: wgpu::BindGroup,
}

/// Layout of the per-node transform uniform (group 2).
pub fn transform_bind_group_layout(device: &wgpu::Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_vertex(binding_types::uniform())
        .create(device, "Transform Bind Group Layout")
}

/// Renderable scene element: a transform plus textured parts.
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub source: NodeSource,
    pub parts: Vec<NodePart>,
    pub visible: bool,
    pub gpu_resources: Option<NodeGpuResources>, // None until init_gpu_resources called
}

impl Node {
    pub fn new(name: &str, source: NodeSource, parts: Vec<NodePart>) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::default(),
            source,
            parts,
            visible: true,
            gpu_resources: None,
        }
    }

    /// A single-part node from procedural geometry.
    pub fn primitive(name: &str, geometry: &GeometryData, material: Material) -> Self {
        Self::new(
            name,
            NodeSource::Primitive,
            vec![NodePart {
                mesh: Mesh::from_geometry(geometry),
                material,
            }],
        )
    }

    /// A node built from a decoded model file.
    pub fn from_model(locator: &str, model: &ModelData) -> Self {
        let parts = model
            .parts
            .iter()
            .map(|part| NodePart {
                mesh: Mesh::from_mesh_data(&part.mesh),
                material: Material::from_data(&part.material),
            })
            .collect();
        Self::new(&model.name, NodeSource::Model(locator.to_string()), parts)
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn triangle_count(&self) -> u32 {
        self.parts.iter().map(|p| p.mesh.triangle_count()).sum()
    }

    /// Creates or refreshes every GPU resource this node needs for drawing.
    pub fn sync_gpu(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        transform_layout: &BindGroupLayoutWithDesc,
        material_layout: &MaterialLayout,
    ) {
        for part in &mut self.parts {
            part.mesh.init_gpu_resources(device);
            if part.material.needs_sync() {
                part.material.sync_gpu(device, queue, material_layout);
            }
        }

        // cgmath matrices are already column-major for GPU
        let matrix = self.transform.matrix();
        let transform_data: &[f32; 16] = matrix.as_ref();

        match &self.gpu_resources {
            Some(resources) => {
                queue.write_buffer(
                    &resources.transform_buffer,
                    0,
                    bytemuck::cast_slice(transform_data),
                );
            }
            None => {
                let transform_buffer =
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("Transform Uniform Buffer: {}", self.name)),
                        contents: bytemuck::cast_slice(transform_data),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    });
                let transform_bind_group = BindGroupBuilder::new(transform_layout)
                    .resource(transform_buffer.as_entire_binding())
                    .create(device, "Transform Bind Group");

                self.gpu_resources = Some(NodeGpuResources {
                    transform_buffer,
                    transform_bind_group,
                });
            }
        }
    }

    /// Get the transform bind group for rendering
    pub fn get_transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|res| &res.transform_bind_group)
    }
}

pub trait DrawNode<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_node(&mut self, node: &'a Node);
}

impl<'a, 'b> DrawNode<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // Skip drawing if not uploaded
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }

    /// Draws every part with its material at group 1 and the node transform at group 2.
    fn draw_node(&mut self, node: &'b Node) {
        let Some(transform_bind_group) = node.get_transform_bind_group() else {
            return;
        };
        self.set_bind_group(2, transform_bind_group, &[]);

        for part in &node.parts {
            if let Some(material_bind_group) = part.material.bind_group() {
                self.set_bind_group(1, material_bind_group, &[]);
                self.draw_mesh(&part.mesh);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ModelPart;
    use cgmath::{Rad, Rotation3, Vector4};

    #[test]
    fn transform_applies_scale_then_rotation_then_translation() {
        let transform = Transform {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: Quaternion::from_angle_y(Rad(std::f32::consts::FRAC_PI_2)),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let p = transform.matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);

        // (1,0,0) scaled to (2,0,0), rotated to (0,0,-2), then translated
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
        assert!((p.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn model_node_keeps_every_part() {
        let model = ModelData {
            name: "candle".to_string(),
            parts: vec![
                ModelPart {
                    mesh: MeshData {
                        positions: vec![[0.0; 3]; 3],
                        normals: vec![],
                        tex_coords: vec![],
                        indices: vec![0, 1, 2],
                    },
                    material: MaterialData::default(),
                },
                ModelPart {
                    mesh: MeshData::default(),
                    material: MaterialData {
                        base_color: [1.0, 0.5, 0.0, 1.0],
                        ..Default::default()
                    },
                },
            ],
        };

        let node = Node::from_model("models/candle.glb", &model);
        assert_eq!(node.name, "candle");
        assert_eq!(node.parts.len(), 2);
        assert_eq!(node.source, NodeSource::Model("models/candle.glb".to_string()));
        assert_eq!(node.parts[0].mesh.vertex_count(), 3);
        assert_eq!(node.parts[0].mesh.vertices()[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(node.parts[1].material.base_color(), [1.0, 0.5, 0.0, 1.0]);
        assert!(node.visible);
    }

    #[test]
    fn texture_swap_forces_resync() {
        let mut material = Material::new("floor", [1.0; 4]);
        assert!(material.needs_sync());
        material.set_texture(Arc::new(ImageData::solid([0, 0, 0, 255])));
        assert!(material.texture().is_some());
        assert!(material.needs_sync());
    }
}
