//! Lighting, environment and renderer switches.

use crate::material::Color;

/// Background / reflection presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    /// Daylight sky with warm haze, used by the configurator.
    Sky,
    Showroom,
    Garage,
    City,
    Sunset,
    Studio,
}

impl Environment {
    pub const SELECTABLE: [Environment; 5] = [
        Environment::Showroom,
        Environment::Garage,
        Environment::City,
        Environment::Sunset,
        Environment::Studio,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Environment::Sky => "sky",
            Environment::Showroom => "showroom",
            Environment::Garage => "garage",
            Environment::City => "city",
            Environment::Sunset => "sunset",
            Environment::Studio => "studio",
        }
    }

    /// Unknown keys fall back to the showroom.
    pub fn from_key(key: &str) -> Self {
        match key {
            "sky" => Environment::Sky,
            "garage" => Environment::Garage,
            "city" => Environment::City,
            "sunset" => Environment::Sunset,
            "studio" => Environment::Studio,
            _ => Environment::Showroom,
        }
    }

    pub fn background(self) -> Color {
        match self {
            Environment::Sky => Color::from_hex(0xd7cbb1),
            Environment::Showroom => Color::from_hex(0x1a1a1a),
            Environment::Garage => Color::from_hex(0x2a2a2a),
            Environment::City => Color::from_hex(0x4a4a6a),
            Environment::Sunset => Color::from_hex(0x6a4a2a),
            Environment::Studio => Color::from_hex(0xffffff),
        }
    }

    /// Zenith colour of the reflected sky.
    pub fn sky(self) -> Color {
        match self {
            Environment::Sky => Color::from_hex(0x6f9fd8),
            Environment::Studio => Color::from_hex(0xffffff),
            other => other.background(),
        }
    }

    /// Colour reflected from below the horizon.
    pub fn ground(self) -> Color {
        match self {
            Environment::Sky => Color::from_hex(0x8a7f6a),
            Environment::Studio => Color::from_hex(0xbbbbbb),
            _ => Color::from_hex(0x333333),
        }
    }
}

/// One directional light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub direction: [f32; 3],
    pub color: Color,
    pub intensity: f32,
}

/// Everything about the scene that is not the car.
#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub environment: Environment,
    pub ambient: (Color, f32),
    pub key: DirectionalLight,
    pub fill: [DirectionalLight; 2],
    pub rim: DirectionalLight,
    pub exposure: f32,
    pub shadows: bool,
    pub fog: Option<(f32, f32)>,
}

impl Stage {
    pub fn new(environment: Environment, fog: Option<(f32, f32)>) -> Self {
        let light = |direction: [f32; 3], hex: u32, intensity: f32| DirectionalLight {
            direction,
            color: Color::from_hex(hex),
            intensity,
        };
        Self {
            environment,
            ambient: (Color::from_hex(0x404040), 0.4),
            key: light([10.0, 10.0, 5.0], 0xffffff, 1.0),
            fill: [
                light([-5.0, 5.0, -5.0], 0x4080ff, 0.3),
                light([5.0, 2.0, -5.0], 0xff8040, 0.2),
            ],
            rim: light([0.0, 5.0, -10.0], 0xffffff, 0.5),
            exposure: 1.5,
            shadows: true,
            fog,
        }
    }

    /// The lighting slider drives key light, rim light and exposure together.
    pub fn set_lighting(&mut self, intensity: f32) {
        self.key.intensity = intensity;
        self.rim.intensity = intensity * 0.5;
        self.exposure = intensity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_environment_is_showroom() {
        assert_eq!(Environment::from_key("moon"), Environment::Showroom);
        for env in Environment::SELECTABLE {
            assert_eq!(Environment::from_key(env.key()), env);
        }
    }

    #[test]
    fn lighting_scales_rim_and_exposure() {
        let mut stage = Stage::new(Environment::Showroom, None);
        stage.set_lighting(2.0);
        assert_eq!(stage.key.intensity, 2.0);
        assert_eq!(stage.rim.intensity, 1.0);
        assert_eq!(stage.exposure, 2.0);
        assert_eq!(stage.fill[0].intensity, 0.3);
    }
}
