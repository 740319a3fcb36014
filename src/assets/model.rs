//! 3D model decoding
//!
//! Binary and JSON glTF files go through the `gltf` crate with every node's
//! world transform baked into its vertices; Wavefront OBJ files go through
//! `tobj`. Either way the result is a flat list of mesh + material parts.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};

use super::texture::ImageData;
use crate::error::AssetError;

/// Triangle mesh in model space.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// Surface appearance of one model part.
#[derive(Debug, Clone)]
pub struct MaterialData {
    pub name: String,
    pub base_color: [f32; 4],
    pub texture: Option<Arc<ImageData>>,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            texture: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelPart {
    pub mesh: MeshData,
    pub material: MaterialData,
}

/// A decoded model, ready to become a scene node.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub name: String,
    pub parts: Vec<ModelPart>,
}

impl ModelData {
    pub fn vertex_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.positions.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.indices.len() / 3).sum()
    }
}

/// Decodes the model at `path`, choosing the format from the file extension.
pub fn decode_model(locator: &str, path: &Path) -> Result<ModelData, AssetError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let model = match extension.as_deref() {
        Some("glb") | Some("gltf") => load_gltf(locator, path)?,
        Some("obj") => load_obj(locator, path)?,
        _ => return Err(AssetError::UnsupportedFormat(locator.to_string())),
    };

    if model.parts.is_empty() {
        return Err(AssetError::EmptyModel(locator.to_string()));
    }
    Ok(model)
}

fn model_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("model")
        .to_string()
}

fn load_gltf(locator: &str, path: &Path) -> Result<ModelData, AssetError> {
    let (document, buffers, images) = gltf::import(path).map_err(|source| AssetError::Gltf {
        locator: locator.to_string(),
        source,
    })?;

    let mut textures = HashMap::new();
    let mut parts = Vec::new();

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    if let Some(scene) = scene {
        for node in scene.nodes() {
            collect_gltf_node(
                &node,
                Matrix4::identity(),
                &buffers,
                &images,
                &mut textures,
                &mut parts,
            );
        }
    }

    log::debug!(
        "glTF '{}': {} part(s), {} image(s)",
        locator,
        parts.len(),
        images.len()
    );

    Ok(ModelData {
        name: model_name(path),
        parts,
    })
}

fn collect_gltf_node(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
    textures: &mut HashMap<usize, Arc<ImageData>>,
    parts: &mut Vec<ModelPart>,
) {
    let world = parent * Matrix4::from(node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping non-triangle primitive in mesh '{}'",
                    mesh.name().unwrap_or("unnamed")
                );
                continue;
            }
            if let Some(mesh_data) = read_gltf_primitive(&primitive, buffers, world) {
                let material = read_gltf_material(&primitive.material(), images, textures);
                parts.push(ModelPart {
                    mesh: mesh_data,
                    material,
                });
            }
        }
    }

    for child in node.children() {
        collect_gltf_node(&child, world, buffers, images, textures, parts);
    }
}

fn read_gltf_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    world: Matrix4<f32>,
) -> Option<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()?
        .map(|p| {
            let v = world * Vector4::new(p[0], p[1], p[2], 1.0);
            [v.x, v.y, v.z]
        })
        .collect();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let normal_matrix = normal_matrix(world);
    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(normals) => normals
            .map(|n| {
                let v = (normal_matrix * Vector3::from(n)).normalize();
                [v.x, v.y, v.z]
            })
            .collect(),
        None => compute_vertex_normals(&positions, &indices),
    };

    let tex_coords: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(coords) => coords.into_f32().collect(),
        None => vec![[0.0, 0.0]; positions.len()],
    };

    Some(MeshData {
        positions,
        normals,
        tex_coords,
        indices,
    })
}

fn read_gltf_material(
    material: &gltf::Material,
    images: &[gltf::image::Data],
    textures: &mut HashMap<usize, Arc<ImageData>>,
) -> MaterialData {
    let pbr = material.pbr_metallic_roughness();

    let texture = pbr.base_color_texture().and_then(|info| {
        let index = info.texture().source().index();
        if let Some(cached) = textures.get(&index) {
            return Some(cached.clone());
        }
        let image = images.get(index)?;
        let converted = convert_gltf_image(image)?;
        let converted = Arc::new(converted);
        textures.insert(index, converted.clone());
        Some(converted)
    });

    MaterialData {
        name: material.name().unwrap_or("gltf_material").to_string(),
        base_color: pbr.base_color_factor(),
        texture,
    }
}

fn convert_gltf_image(image: &gltf::image::Data) -> Option<ImageData> {
    use gltf::image::Format;

    let channels = match image.format {
        Format::R8 => 1,
        Format::R8G8 => 2,
        Format::R8G8B8 => 3,
        Format::R8G8B8A8 => 4,
        other => {
            log::warn!("Unsupported glTF texture format {:?}, using base colour only", other);
            return None;
        }
    };
    ImageData::from_channels(image.width, image.height, channels, &image.pixels)
}

fn normal_matrix(world: Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    linear
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or(linear)
}

fn load_obj(locator: &str, path: &Path) -> Result<ModelData, AssetError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Obj {
        locator: locator.to_string(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|err| {
        log::debug!("No usable MTL for '{}' ({}), using default materials", locator, err);
        Vec::new()
    });

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut parts = Vec::with_capacity(models.len());

    for model in &models {
        let mesh = &model.mesh;
        if mesh.indices.is_empty() {
            continue;
        }

        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();

        // Use normals from OBJ if available, otherwise calculate them
        let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            mesh.normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect()
        } else {
            compute_vertex_normals(&positions, &mesh.indices)
        };

        // OBJ texture space has v pointing up
        let tex_coords = if mesh.texcoords.len() / 2 == positions.len() {
            mesh.texcoords
                .chunks_exact(2)
                .map(|t| [t[0], 1.0 - t[1]])
                .collect()
        } else {
            vec![[0.0, 0.0]; positions.len()]
        };

        let material = mesh
            .material_id
            .and_then(|id| materials.get(id))
            .map(|mtl| obj_material(mtl, base_dir))
            .unwrap_or_default();

        parts.push(ModelPart {
            mesh: MeshData {
                positions,
                normals,
                tex_coords,
                indices: mesh.indices.clone(),
            },
            material,
        });
    }

    Ok(ModelData {
        name: models
            .first()
            .map(|m| m.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| model_name(path)),
        parts,
    })
}

fn obj_material(mtl: &tobj::Material, base_dir: &Path) -> MaterialData {
    let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);

    let texture = mtl.diffuse_texture.as_ref().and_then(|file| {
        let texture_path = base_dir.join(file);
        let bytes = std::fs::read(&texture_path)
            .map_err(|err| log::warn!("Cannot read '{}': {}", texture_path.display(), err))
            .ok()?;
        ImageData::decode(file, &bytes)
            .map_err(|err| log::warn!("{}", err))
            .ok()
            .map(Arc::new)
    });

    MaterialData {
        name: mtl.name.clone(),
        base_color: [diffuse[0], diffuse[1], diffuse[2], mtl.dissolve.unwrap_or(1.0)],
        texture,
    }
}

/// Smooth per-vertex normals: the normalised sum of adjacent face normals.
pub fn compute_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }

        let v0 = Vector3::from(positions[i0]);
        let v1 = Vector3::from(positions[i1]);
        let v2 = Vector3::from(positions[i2]);
        let face_normal = (v1 - v0).cross(v2 - v0);

        for index in [i0, i1, i2] {
            accumulated[index] += face_normal;
        }
    }

    accumulated
        .into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 {
                let n = n.normalize();
                [n.x, n.y, n.z]
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TRIANGLE_OBJ: &str = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn obj_model_loads_one_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(TRIANGLE_OBJ.as_bytes())
            .unwrap();

        let model = decode_model("models/tri.obj", &path).unwrap();
        assert_eq!(model.name, "tri");
        assert_eq!(model.parts.len(), 1);
        assert_eq!(model.vertex_count(), 3);
        assert_eq!(model.triangle_count(), 1);

        // Normals were computed from the winding
        for n in &model.parts[0].mesh.normals {
            assert_eq!(*n, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = decode_model("models/thing.fbx", Path::new("models/thing.fbx")).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_gltf_reports_gltf_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.glb");
        let err = decode_model("models/missing.glb", &path).unwrap_err();
        assert!(matches!(err, AssetError::Gltf { .. }));
        assert_eq!(err.locator(), "models/missing.glb");
    }

    #[test]
    fn vertex_normals_average_shared_faces() {
        // Two triangles folded along the X axis
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let indices = [0, 1, 2, 0, 3, 1];
        let normals = compute_vertex_normals(&positions, &indices);

        let shared = Vector3::from(normals[0]);
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert!((shared.magnitude() - 1.0).abs() < 1e-5);
        assert!((shared.y - half).abs() < 1e-5);
        assert!((shared.z - half).abs() < 1e-5);
        assert_eq!(normals[2], [0.0, 0.0, 1.0]);
    }
}
