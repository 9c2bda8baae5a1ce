//! Reads a binary or embedded glTF car into a [`LoadedModel`].

use anyhow::{Context as _, bail};
use base64::Engine as _;
use cgmath::{Quaternion, Vector3};

use crate::{
    data_structures::{
        instance::Instance,
        model::{MeshGeometry, ModelVertex},
        scene_graph::LoadedModel,
    },
    garage::CarChoice,
    material::{Color, Material},
    resources::load_binary,
};

const DRACO: &str = "KHR_draco_mesh_compression";

pub async fn load_glb(car: CarChoice, file_name: &str) -> anyhow::Result<LoadedModel> {
    let bytes = load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_slice(&bytes).with_context(|| format!("Cannot parse {}", file_name))?;
    if gltf.extensions_required().any(|ext| ext == DRACO) {
        bail!("{} needs Draco decompression, which is not supported", file_name);
    }

    let blob = gltf.blob.as_deref();
    let buffers = futures::future::join_all(gltf.buffers().map(|buffer| async move {
        match buffer.source() {
            gltf::buffer::Source::Bin => blob
                .map(<[u8]>::to_vec)
                .context("GLB references a binary chunk it does not have"),
            gltf::buffer::Source::Uri(uri) => load_uri(file_name, uri).await,
        }
    }))
    .await
    .into_iter()
    .collect::<anyhow::Result<Vec<_>>>()?;

    let mut model = LoadedModel::new(car);
    for source in gltf.images() {
        let decoded = match source.source() {
            gltf::image::Source::View { view, .. } => {
                let start = view.offset();
                let end = start + view.length();
                buffers
                    .get(view.buffer().index())
                    .and_then(|buffer| buffer.get(start..end))
                    .context("Image view lies outside its buffer")
                    .and_then(|slice| Ok(image::load_from_memory(slice)?))
            }
            gltf::image::Source::Uri { uri, .. } => match load_uri(file_name, uri).await {
                Ok(data) => image::load_from_memory(&data).map_err(anyhow::Error::from),
                Err(e) => Err(e),
            },
        };
        let rgba = match decoded {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                log::warn!("Image {} of {}: {}", source.index(), file_name, e);
                image::RgbaImage::from_pixel(1, 1, image::Rgba([255; 4]))
            }
        };
        model.textures.push(rgba);
    }

    let materials: Vec<Material> = gltf.materials().map(|m| to_material(&m)).collect();

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .context("The asset has no scene")?;
    for node in scene.nodes() {
        visit(&mut model, node, &Instance::new(), &buffers, &materials);
    }

    if model.meshes.is_empty() {
        bail!("{} contains no triangle meshes", file_name);
    }
    log::info!(
        "Loaded {} meshes and {} images from {}",
        model.meshes.len(),
        model.textures.len(),
        file_name
    );
    Ok(model)
}

/// Resolves `uri` next to the asset, decoding base64 data URIs in place.
async fn load_uri(file_name: &str, uri: &str) -> anyhow::Result<Vec<u8>> {
    if let Some(rest) = uri.strip_prefix("data:") {
        let (_, payload) = rest.split_once(";base64,").context("Unsupported data URI")?;
        return Ok(base64::engine::general_purpose::STANDARD.decode(payload)?);
    }
    let path = match file_name.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, uri),
        None => uri.to_string(),
    };
    load_binary(&path).await
}

fn to_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    let mut result = Material::named(material.name().unwrap_or("material"))
        .with_color(Color::from_linear([r, g, b]))
        .with_pbr(pbr.metallic_factor(), pbr.roughness_factor());
    if material.alpha_mode() == gltf::material::AlphaMode::Blend {
        result = result.with_opacity(a);
        result.transparent = true;
    }
    result.emissive = Color::from_linear(material.emissive_factor());
    result.base_color_texture = pbr
        .base_color_texture()
        .map(|info| info.texture().source().index());
    result
}

fn visit(
    model: &mut LoadedModel,
    node: gltf::Node,
    parent: &Instance,
    buffers: &[Vec<u8>],
    materials: &[Material],
) {
    let (translation, [x, y, z, w], scale) = node.transform().decomposed();
    let local = Instance {
        position: Vector3::from(translation),
        rotation: Quaternion::new(w, x, y, z),
        scale: Vector3::from(scale),
    };
    let world = parent * &local;

    if let Some(mesh) = node.mesh() {
        let base_name = node
            .name()
            .or(mesh.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let primitive_count = mesh.primitives().len();
        for (idx, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("Skipping {:?} primitive of {}", primitive.mode(), base_name);
                continue;
            }
            let geometry = read_geometry(&primitive, buffers);
            if geometry.is_empty() {
                continue;
            }
            let name = if primitive_count > 1 {
                format!("{}_{}", base_name, idx)
            } else {
                base_name.clone()
            };
            let material = primitive
                .material()
                .index()
                .and_then(|idx| materials.get(idx))
                .cloned()
                .unwrap_or_default();
            model.push(&name, geometry, material, world.clone());
        }
    }

    for child in node.children() {
        visit(model, child, &world, buffers, materials);
    }
}

fn read_geometry(primitive: &gltf::Primitive, buffers: &[Vec<u8>]) -> MeshGeometry {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let mut geometry = MeshGeometry::default();
    if let Some(positions) = reader.read_positions() {
        geometry.vertices = positions
            .map(|position| ModelVertex {
                position,
                ..Default::default()
            })
            .collect();
    }
    let has_normals = match reader.read_normals() {
        Some(normals) => {
            for (vertex, normal) in geometry.vertices.iter_mut().zip(normals) {
                vertex.normal = normal;
            }
            true
        }
        None => false,
    };
    if let Some(tex_coords) = reader.read_tex_coords(0) {
        for (vertex, uv) in geometry.vertices.iter_mut().zip(tex_coords.into_f32()) {
            vertex.tex_coords = uv;
        }
    }
    geometry.indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..geometry.vertices.len() as u32).collect(),
    };
    let count = geometry.vertices.len() as u32;
    if geometry.indices.iter().any(|&i| i >= count) {
        log::warn!("Primitive has indices past its {} vertices, dropping it", count);
        return MeshGeometry::default();
    }
    geometry.indices.truncate(geometry.indices.len() - geometry.indices.len() % 3);
    if !has_normals {
        geometry.compute_normals();
    }
    geometry
}
