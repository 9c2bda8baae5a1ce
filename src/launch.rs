//! Start-up options from the page URL or the command line.
//!
//! Both hosts hand over `key=value` pairs: the web build reads them from
//! `window.location.search`, the native build from its [`Cli`] flags.
//! Recognised keys are `app`, `model` and `config`; everything else is ignored.

use cgmath::Point3;

use crate::{garage::CarChoice, material::Pattern, share::ShareConfig};

/// Which of the two demos to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppVariant {
    /// Single glTF car, part dropdowns, follow camera.
    #[default]
    Configurator,
    /// Four procedural cars, orbit camera, environment presets.
    Showroom,
}

/// Per-demo constants.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub variant: AppVariant,
    pub lineup: &'static [CarChoice],
    pub default_car: CarChoice,
    pub fovy_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    /// Car spin in radians per second while auto-rotate is on.
    pub spin_speed: f32,
    pub follow_camera: bool,
    pub orbit_controls: bool,
    pub ground_size: f32,
    pub ground_pattern: Pattern,
    pub ground_hex: u32,
    pub ground_opacity: f32,
    pub fog: Option<(f32, f32)>,
}

impl Profile {
    pub fn for_variant(variant: AppVariant) -> Self {
        match variant {
            AppVariant::Configurator => Self {
                variant,
                lineup: &CarChoice::ASSETS,
                default_car: CarChoice::Kia,
                fovy_deg: 50.0,
                znear: 0.1,
                zfar: 200.0,
                eye: Point3::new(3.25, 2.0, -5.0),
                target: Point3::new(0.0, 0.5, 0.0),
                spin_speed: 0.5,
                follow_camera: false,
                orbit_controls: false,
                ground_size: 2400.0,
                ground_pattern: Pattern::Grid,
                ground_hex: 0x000000,
                ground_opacity: 0.15,
                fog: Some((1.0, 80.0)),
            },
            AppVariant::Showroom => Self {
                variant,
                lineup: &CarChoice::SHOWROOM,
                default_car: CarChoice::Ferrari,
                fovy_deg: 75.0,
                znear: 0.1,
                zfar: 1000.0,
                eye: Point3::new(5.0, 2.0, 5.0),
                target: Point3::new(0.0, 0.0, 0.0),
                // 0.005 rad per frame at 60 fps
                spin_speed: 0.3,
                follow_camera: false,
                orbit_controls: true,
                ground_size: 50.0,
                ground_pattern: Pattern::Plain,
                ground_hex: 0x333333,
                ground_opacity: 0.8,
                fog: None,
            },
        }
    }

    pub fn offers(&self, car: CarChoice) -> bool {
        self.lineup.contains(&car)
    }
}

/// Everything the app needs to know before the first frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchOptions {
    pub variant: AppVariant,
    pub car: CarChoice,
    pub config: Option<ShareConfig>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::from_pairs(std::iter::empty::<(String, String)>())
    }
}

impl LaunchOptions {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut app = None;
        let mut model = None;
        let mut config = None;
        for (key, value) in pairs {
            match key.as_ref() {
                "app" => app = Some(value.as_ref().to_string()),
                "model" => model = Some(value.as_ref().to_string()),
                "config" => config = Some(value.as_ref().to_string()),
                _ => (),
            }
        }

        let variant = match app.as_deref() {
            Some("showroom") => AppVariant::Showroom,
            _ => AppVariant::Configurator,
        };
        let profile = Profile::for_variant(variant);

        let config = config.and_then(|encoded| match ShareConfig::decode(&encoded) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Invalid configuration in URL: {}", e);
                None
            }
        });

        let car = match variant {
            AppVariant::Configurator => model_car(model.as_deref()),
            AppVariant::Showroom => profile.default_car,
        };
        let car = match config {
            Some(config) if profile.offers(config.car) => config.car,
            Some(config) => {
                log::warn!(
                    "Shared car '{}' is not part of this demo, keeping '{}'",
                    config.car,
                    car
                );
                car
            }
            None => car,
        };

        Self {
            variant,
            car,
            config,
        }
    }

    /// Parses a query string with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(parse_query(query))
    }

    pub fn profile(&self) -> Profile {
        Profile::for_variant(self.variant)
    }
}

/// The `model` query value picks the configurator asset; anything unknown
/// falls back to the default car.
pub fn model_car(model: Option<&str>) -> CarChoice {
    match model {
        Some("hyundai") => CarChoice::Hyundai,
        Some("audi") => CarChoice::Audi,
        _ => CarChoice::Kia,
    }
}

/// Splits an `application/x-www-form-urlencoded` query, with or without the
/// leading `?`, into decoded pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

/// Command line of the native build.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "3D car configurator and showroom")]
pub struct Cli {
    /// Demo to run: `configurator` or `showroom`
    #[arg(long)]
    pub app: Option<String>,
    /// Configurator car: `kia`, `hyundai` or `audi`
    #[arg(long)]
    pub model: Option<String>,
    /// Shared configuration as printed by the share key
    #[arg(long)]
    pub config: Option<String>,
}

impl From<Cli> for LaunchOptions {
    fn from(cli: Cli) -> Self {
        let pairs = [("app", cli.app), ("model", cli.model), ("config", cli.config)];
        Self::from_pairs(
            pairs
                .into_iter()
                .filter_map(|(key, value)| value.map(|value| (key, value))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Color;

    #[test]
    fn model_values_pick_assets() {
        assert_eq!(model_car(Some("hyundai")), CarChoice::Hyundai);
        assert_eq!(model_car(Some("audi")), CarChoice::Audi);
        assert_eq!(model_car(None), CarChoice::Kia);
        assert_eq!(model_car(Some("AUDI")), CarChoice::Kia);
        assert_eq!(model_car(Some("bmw")), CarChoice::Kia);
    }

    #[test]
    fn query_selects_variant_and_model() {
        let options = LaunchOptions::from_query("?model=audi&debug");
        assert_eq!(options.variant, AppVariant::Configurator);
        assert_eq!(options.car, CarChoice::Audi);

        let options = LaunchOptions::from_query("app=showroom&model=audi");
        assert_eq!(options.variant, AppVariant::Showroom);
        assert_eq!(options.car, CarChoice::Ferrari);
    }

    #[test]
    fn shared_car_overrides_default_within_lineup() {
        let config = ShareConfig {
            car: CarChoice::Porsche,
            color: Color::from_hex(0x123456),
            metalness: 0.5,
            roughness: 0.5,
        };
        let url = config.to_url("", "/").unwrap();
        let query = url.split_once('?').unwrap().1;

        let showroom = LaunchOptions::from_query(&format!("app=showroom&{}", query));
        assert_eq!(showroom.car, CarChoice::Porsche);
        assert_eq!(showroom.config, Some(config));

        let configurator = LaunchOptions::from_query(query);
        assert_eq!(configurator.car, CarChoice::Kia);
    }

    #[test]
    fn malformed_config_is_dropped() {
        let options = LaunchOptions::from_query("app=showroom&config=%%%");
        assert_eq!(options.config, None);
        assert_eq!(options.car, CarChoice::Ferrari);
    }

    #[test]
    fn cli_flags_feed_the_same_options() {
        use clap::Parser;

        let cli = Cli::try_parse_from(["car-configurator", "--app=showroom", "--model", "audi"])
            .unwrap();
        let options = LaunchOptions::from(cli);
        assert_eq!(options.variant, AppVariant::Showroom);
        assert_eq!(options.car, CarChoice::Ferrari);

        let options = LaunchOptions::from(Cli::try_parse_from(["car-configurator"]).unwrap());
        assert_eq!(options, LaunchOptions::default());

        assert!(Cli::try_parse_from(["car-configurator", "--colour", "red"]).is_err());
    }

    #[test]
    fn query_values_are_form_decoded() {
        assert_eq!(
            parse_query("?config=a%2Bb%3D&note=two+words&flag"),
            vec![
                ("config".to_string(), "a+b=".to_string()),
                ("note".to_string(), "two words".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
        assert_eq!(parse_query("x=100%"), vec![("x".to_string(), "100%".to_string())]);
    }
}
