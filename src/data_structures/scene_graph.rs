//! CPU-side mirror of the car in the scene.
//!
//! Loaders produce a [`LoadedModel`]: a flat list of named meshes with their
//! geometry, material and transform relative to the car root. Once accepted
//! by the session it becomes a [`CarModel`], which drops the geometry (the
//! renderer keeps the uploaded buffers, index for index) and keeps what the
//! configurator mutates: names, material bindings, shadow flags and the car
//! transform.

use crate::{
    catalog::MaterialBinding,
    data_structures::{instance::Instance, model::MeshGeometry},
    garage::CarChoice,
    material::Material,
};

#[derive(Clone, Debug)]
pub struct LoadedMesh {
    pub name: String,
    pub geometry: MeshGeometry,
    pub material: Material,
    pub local: Instance,
}

#[derive(Clone, Debug)]
pub struct LoadedModel {
    pub car: CarChoice,
    pub meshes: Vec<LoadedMesh>,
    /// Base colour images referenced by `Material::base_color_texture`.
    pub textures: Vec<image::RgbaImage>,
}

impl LoadedModel {
    pub fn new(car: CarChoice) -> Self {
        Self {
            car,
            meshes: Vec::new(),
            textures: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &str, geometry: MeshGeometry, material: Material, local: Instance) {
        self.meshes.push(LoadedMesh {
            name: name.to_string(),
            geometry,
            material,
            local,
        });
    }
}

#[derive(Clone, Debug)]
pub struct CarMesh {
    pub name: String,
    pub binding: MaterialBinding,
    pub local: Instance,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl CarMesh {
    pub fn material(&self) -> &Material {
        self.binding.material()
    }
}

#[derive(Clone, Debug)]
pub struct CarModel {
    pub car: CarChoice,
    pub transform: Instance,
    pub meshes: Vec<CarMesh>,
    /// Radius of the car's footprint, used for the contact shadow.
    pub footprint: f32,
}

impl CarModel {
    pub fn from_loaded(loaded: LoadedModel) -> Self {
        let footprint = loaded
            .meshes
            .iter()
            .map(|mesh| mesh_footprint(mesh))
            .fold(0.0, f32::max);
        let meshes = loaded
            .meshes
            .into_iter()
            .map(|mesh| CarMesh {
                name: mesh.name,
                binding: MaterialBinding::Owned(mesh.material),
                local: mesh.local,
                cast_shadow: true,
                receive_shadow: true,
            })
            .collect();
        Self {
            car: loaded.car,
            transform: Instance::new(),
            meshes,
            footprint,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.meshes.iter().map(|mesh| mesh.name.as_str())
    }

    pub fn world_transform(&self, idx: usize) -> Option<Instance> {
        self.meshes.get(idx).map(|mesh| &self.transform * &mesh.local)
    }

    pub fn mesh_mut(&mut self, idx: usize) -> Option<&mut CarMesh> {
        self.meshes.get_mut(idx)
    }
}

fn mesh_footprint(mesh: &LoadedMesh) -> f32 {
    let scale = mesh.local.scale.x.abs().max(mesh.local.scale.z.abs());
    let offset = (mesh.local.position.x.powi(2) + mesh.local.position.z.powi(2)).sqrt();
    offset + mesh.geometry.footprint_radius() * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::model::ModelVertex;

    #[test]
    fn loaded_meshes_become_owned_bindings() {
        let mut loaded = LoadedModel::new(CarChoice::Kia);
        let geometry = MeshGeometry {
            vertices: vec![ModelVertex {
                position: [1.0, 0.0, 0.0],
                ..Default::default()
            }],
            indices: vec![],
        };
        loaded.push(
            "body",
            geometry,
            Material::named("paint"),
            Instance::from(cgmath::Vector3::new(0.0, 0.0, 2.0)),
        );
        let model = CarModel::from_loaded(loaded);
        assert_eq!(model.names().collect::<Vec<_>>(), ["body"]);
        assert!(!model.meshes[0].binding.is_shared());
        assert_eq!(model.footprint, 3.0);
        assert_eq!(
            model.world_transform(0).map(|t| t.position.z),
            Some(2.0)
        );
    }
}
