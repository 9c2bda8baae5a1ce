//! Preset materials and how meshes hold on to them.

use std::sync::Arc;

use crate::material::{Color, Material};

/// An immutable, named preset. Shared between every mesh it is applied to.
pub type MaterialPreset = Arc<Material>;

/// The two fixed preset lists offered by the material dropdowns.
#[derive(Clone, Debug)]
pub struct MaterialCatalog {
    main: Vec<MaterialPreset>,
    glass: Vec<MaterialPreset>,
}

impl MaterialCatalog {
    pub const DEFAULT_BODY: usize = 3;
    pub const DEFAULT_RIM: usize = 5;
    pub const DEFAULT_GLASS: usize = 0;

    pub fn new() -> Self {
        let paint = |name: &str, hex: u32, roughness: f32| {
            Arc::new(
                Material::named(name)
                    .with_color(Color::from_hex(hex))
                    .with_pbr(0.9, roughness)
                    .with_env_map(1.0),
            )
        };
        let glass = |name: &str, hex: u32| {
            let mut material = Material::named(name)
                .with_color(Color::from_hex(hex))
                .with_pbr(1.0, 0.0)
                .with_opacity(0.2)
                .with_env_map(1.0);
            material.premultiplied_alpha = true;
            Arc::new(material)
        };
        let main = vec![
            paint("orange", 0xff4400, 0.2),
            paint("blue", 0x001166, 0.2),
            paint("red", 0x990000, 0.2),
            paint("black", 0x000000, 0.5),
            paint("white", 0xffffff, 0.5),
            Arc::new(
                Material::named("metallic")
                    .with_color(Color::from_hex(0x555555))
                    .with_pbr(1.0, 0.2)
                    .with_env_map(2.0),
            ),
        ];
        let glass = vec![
            glass("clear", 0xffffff),
            glass("smoked", 0x000000),
            glass("blue", 0x001133),
        ];
        Self { main, glass }
    }

    /// Body and rim compatible presets.
    pub fn main(&self) -> &[MaterialPreset] {
        &self.main
    }

    pub fn glass(&self) -> &[MaterialPreset] {
        &self.glass
    }

    pub fn main_preset(&self, idx: usize) -> Option<&MaterialPreset> {
        self.main.get(idx)
    }

    pub fn glass_preset(&self, idx: usize) -> Option<&MaterialPreset> {
        self.glass.get(idx)
    }
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// How a mesh refers to its material.
///
/// Applying a preset binds the very same `Arc` to every mesh of a bucket, so
/// they all share one instance. Any per-mesh edit goes through
/// [`MaterialBinding::make_owned`], which detaches the mesh onto its own copy
/// and leaves the preset untouched.
#[derive(Clone, Debug)]
pub enum MaterialBinding {
    Shared(MaterialPreset),
    Owned(Material),
}

impl MaterialBinding {
    pub fn material(&self) -> &Material {
        match self {
            MaterialBinding::Shared(preset) => preset.as_ref(),
            MaterialBinding::Owned(material) => material,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, MaterialBinding::Shared(_))
    }

    /// Returns `true` if this binding points at exactly `preset`.
    pub fn shares(&self, preset: &MaterialPreset) -> bool {
        match self {
            MaterialBinding::Shared(bound) => Arc::ptr_eq(bound, preset),
            MaterialBinding::Owned(_) => false,
        }
    }

    /// Mutable access to a material exclusively owned by this binding,
    /// cloning the shared preset first if necessary.
    pub fn make_owned(&mut self) -> &mut Material {
        if let MaterialBinding::Shared(preset) = self {
            let copy = preset.as_ref().clone();
            *self = MaterialBinding::Owned(copy);
        }
        match self {
            MaterialBinding::Owned(material) => material,
            MaterialBinding::Shared(_) => unreachable!("binding was just made owned"),
        }
    }
}

impl From<Material> for MaterialBinding {
    fn from(material: Material) -> Self {
        MaterialBinding::Owned(material)
    }
}

impl From<MaterialPreset> for MaterialBinding {
    fn from(preset: MaterialPreset) -> Self {
        MaterialBinding::Shared(preset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_matches_dropdown_order() {
        let catalog = MaterialCatalog::new();
        let names: Vec<_> = catalog.main().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            ["orange", "blue", "red", "black", "white", "metallic"]
        );
        let names: Vec<_> = catalog.glass().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["clear", "smoked", "blue"]);
        assert!(catalog.glass().iter().all(|m| m.transparent && m.opacity == 0.2));
        assert_eq!(catalog.main_preset(5).map(|m| m.env_map_intensity), Some(2.0));
        assert!(catalog.main_preset(6).is_none());
    }

    #[test]
    fn make_owned_detaches_from_preset() {
        let catalog = MaterialCatalog::new();
        let preset = catalog.main_preset(0).unwrap().clone();
        let mut binding = MaterialBinding::from(preset.clone());
        assert!(binding.shares(&preset));

        binding.make_owned().color = Color::from_hex(0x00ff00);

        assert!(!binding.is_shared());
        assert_eq!(binding.material().color, Color::from_hex(0x00ff00));
        assert_eq!(preset.color, Color::from_hex(0xff4400));
    }

    #[test]
    fn make_owned_keeps_existing_copy() {
        let mut binding = MaterialBinding::from(Material::named("paint"));
        binding.make_owned().metalness = 0.7;
        binding.make_owned().roughness = 0.3;
        assert_eq!(binding.material().metalness, 0.7);
        assert_eq!(binding.material().roughness, 0.3);
    }
}
