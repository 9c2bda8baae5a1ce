//! Shading parameters and colours.
//!
//! [`Material`] is the CPU-side description of how a mesh is shaded. The GPU
//! side only ever sees its packed [`MaterialUniform`] form, written each frame
//! by the renderer.

use std::fmt;

/// sRGB-encoded colour with components in `0.0..=1.0`, the way colour
/// pickers and hex strings express it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::from_hex(0xffffff);
    pub const BLACK: Color = Color::from_hex(0x000000);

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_hex(self) -> u32 {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (q(self.r) << 16) | (q(self.g) << 8) | q(self.b)
    }

    /// Six lower-case hex digits without a leading `#`, the format used by
    /// share links.
    pub fn to_hex_string(self) -> String {
        format!("{:06x}", self.to_hex())
    }

    /// Parses `#rrggbb`, `rrggbb`, `#rgb` or `rgb`.
    pub fn parse(style: &str) -> Option<Self> {
        let digits = style.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => u32::from_str_radix(digits, 16).ok().map(Self::from_hex),
            3 => {
                let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
                u32::from_str_radix(&expanded, 16).ok().map(Self::from_hex)
            }
            _ => None,
        }
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: srgb_to_linear(self.r) as f64,
            g: srgb_to_linear(self.g) as f64,
            b: srgb_to_linear(self.b) as f64,
            a: 1.0,
        }
    }

    /// From linear components, as glTF stores colour factors.
    pub fn from_linear(rgb: [f32; 3]) -> Self {
        Self {
            r: linear_to_srgb(rgb[0]),
            g: linear_to_srgb(rgb[1]),
            b: linear_to_srgb(rgb[2]),
        }
    }

    pub fn to_linear(self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex_string())
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Surface patterns the shader knows besides plain shading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pattern {
    #[default]
    Plain,
    /// Shadow catcher: only the contact shadow is drawn, tinted by `color`.
    ShadowCatcher,
    /// Shadow catcher with a 10 unit grid.
    Grid,
}

/// Metal/roughness material.
///
/// `base_color_texture` indexes the textures of the model the material was
/// loaded with; presets never carry one.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub color: Color,
    pub emissive: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub premultiplied_alpha: bool,
    pub env_map: bool,
    pub env_map_intensity: f32,
    pub base_color_texture: Option<usize>,
    pub pattern: Pattern,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Color::WHITE,
            emissive: Color::BLACK,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            transparent: false,
            premultiplied_alpha: false,
            env_map: false,
            env_map_intensity: 1.0,
            base_color_texture: None,
            pattern: Pattern::Plain,
        }
    }
}

impl Material {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_pbr(mut self, metalness: f32, roughness: f32) -> Self {
        self.metalness = metalness;
        self.roughness = roughness;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = opacity < 1.0;
        self
    }

    pub fn with_env_map(mut self, intensity: f32) -> Self {
        self.env_map = true;
        self.env_map_intensity = intensity;
        self
    }

    pub fn is_blended(&self) -> bool {
        self.transparent || self.opacity < 1.0
    }

    pub fn to_uniform(&self, receive_shadow: bool) -> MaterialUniform {
        let mut flags = 0;
        if self.env_map {
            flags |= MaterialUniform::ENV_MAP;
        }
        if self.premultiplied_alpha {
            flags |= MaterialUniform::PREMULTIPLIED;
        }
        if receive_shadow {
            flags |= MaterialUniform::RECEIVE_SHADOW;
        }
        if self.base_color_texture.is_some() {
            flags |= MaterialUniform::TEXTURED;
        }
        match self.pattern {
            Pattern::Plain => (),
            Pattern::ShadowCatcher => flags |= MaterialUniform::SHADOW_CATCHER,
            Pattern::Grid => flags |= MaterialUniform::SHADOW_CATCHER | MaterialUniform::GRID,
        }
        let color = self.color.to_linear();
        let emissive = self.emissive.to_linear();
        MaterialUniform {
            color: [color[0], color[1], color[2], self.opacity],
            emissive: [emissive[0], emissive[1], emissive[2], self.env_map_intensity],
            metalness: self.metalness.clamp(0.0, 1.0),
            // fully smooth surfaces break the GGX term
            roughness: self.roughness.clamp(0.04, 1.0),
            flags,
            _padding: 0,
        }
    }
}

/// Packed material parameters as laid out in `pbr.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    // rgb = emissive, a = environment intensity
    pub emissive: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub flags: u32,
    _padding: u32,
}

impl MaterialUniform {
    pub const ENV_MAP: u32 = 1;
    pub const PREMULTIPLIED: u32 = 1 << 1;
    pub const RECEIVE_SHADOW: u32 = 1 << 2;
    pub const TEXTURED: u32 = 1 << 3;
    pub const SHADOW_CATCHER: u32 = 1 << 4;
    pub const GRID: u32 = 1 << 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Color::parse("#ff4400"), Some(Color::from_hex(0xff4400)));
        assert_eq!(Color::parse("001166"), Some(Color::from_hex(0x001166)));
        assert_eq!(Color::parse("#f40"), Some(Color::from_hex(0xff4400)));
        assert_eq!(Color::parse("#ff44"), None);
        assert_eq!(Color::parse("#gg4400"), None);
    }

    #[test]
    fn hex_string_has_no_hash() {
        assert_eq!(Color::from_hex(0x0a0b0c).to_hex_string(), "0a0b0c");
        assert_eq!(Color::from_hex(0x0a0b0c).to_string(), "#0a0b0c");
    }

    #[test]
    fn linear_conversion_keeps_hex() {
        for hex in [0x000000, 0x87ceeb, 0xff4400, 0xffffff] {
            let color = Color::from_hex(hex);
            assert_eq!(Color::from_linear(color.to_linear()).to_hex(), hex);
        }
    }

    #[test]
    fn uniform_flags_follow_material() {
        let mut material = Material::named("glass")
            .with_pbr(1.0, 0.0)
            .with_opacity(0.2)
            .with_env_map(1.0);
        material.premultiplied_alpha = true;
        let uniform = material.to_uniform(false);
        assert_eq!(
            uniform.flags,
            MaterialUniform::ENV_MAP | MaterialUniform::PREMULTIPLIED
        );
        assert!(material.is_blended());
        assert_eq!(uniform.roughness, 0.04);
    }
}
