//! The cars both demos can show.

use std::fmt;

use crate::material::Color;

/// Where the geometry of a car comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CarSource {
    /// A GLB asset path relative to the asset root.
    Asset(&'static str),
    /// Built in code from boxes, cylinders and spheres.
    Procedural,
}

/// Data sheet shown next to a showroom car.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CarInfo {
    pub name: &'static str,
    pub power: &'static str,
    pub acceleration: &'static str,
    pub top_speed: &'static str,
    pub price: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CarChoice {
    Kia,
    Hyundai,
    Audi,
    Ferrari,
    Lamborghini,
    Porsche,
    McLaren,
}

impl CarChoice {
    pub const ASSETS: [CarChoice; 3] = [CarChoice::Kia, CarChoice::Hyundai, CarChoice::Audi];
    pub const SHOWROOM: [CarChoice; 4] = [
        CarChoice::Ferrari,
        CarChoice::Lamborghini,
        CarChoice::Porsche,
        CarChoice::McLaren,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CarChoice::Kia => "kia",
            CarChoice::Hyundai => "hyundai",
            CarChoice::Audi => "audi",
            CarChoice::Ferrari => "ferrari",
            CarChoice::Lamborghini => "lamborghini",
            CarChoice::Porsche => "porsche",
            CarChoice::McLaren => "mclaren",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ASSETS
            .into_iter()
            .chain(Self::SHOWROOM)
            .find(|car| car.key() == key)
    }

    pub fn source(self) -> CarSource {
        match self {
            CarChoice::Kia => CarSource::Asset("models/kia_optima_k5.glb"),
            CarChoice::Hyundai => CarSource::Asset("models/2023_hyundai_creta.glb"),
            CarChoice::Audi => CarSource::Asset("models/2018_audi_rs3_sportback.glb"),
            _ => CarSource::Procedural,
        }
    }

    /// Factory paint of the procedural cars.
    pub fn paint(self) -> Color {
        match self {
            CarChoice::Ferrari => Color::from_hex(0xff0000),
            CarChoice::Lamborghini => Color::from_hex(0xffd700),
            CarChoice::Porsche => Color::from_hex(0x000000),
            CarChoice::McLaren => Color::from_hex(0xff6600),
            _ => Color::WHITE,
        }
    }

    pub fn info(self) -> CarInfo {
        match self {
            CarChoice::Ferrari => CarInfo {
                name: "Ferrari 488 GTB",
                power: "661 HP",
                acceleration: "3.0s",
                top_speed: "330 km/h",
                price: "$280,000",
            },
            CarChoice::Lamborghini => CarInfo {
                name: "Lamborghini Huracán",
                power: "630 HP",
                acceleration: "2.9s",
                top_speed: "325 km/h",
                price: "$248,000",
            },
            CarChoice::Porsche => CarInfo {
                name: "Porsche 911 Turbo S",
                power: "640 HP",
                acceleration: "2.7s",
                top_speed: "330 km/h",
                price: "$207,000",
            },
            CarChoice::McLaren => CarInfo {
                name: "McLaren 720S",
                power: "710 HP",
                acceleration: "2.8s",
                top_speed: "341 km/h",
                price: "$299,000",
            },
            CarChoice::Kia => CarInfo {
                name: "Kia Optima K5",
                power: "-",
                acceleration: "-",
                top_speed: "-",
                price: "-",
            },
            CarChoice::Hyundai => CarInfo {
                name: "Hyundai Creta 2023",
                power: "-",
                acceleration: "-",
                top_speed: "-",
                price: "-",
            },
            CarChoice::Audi => CarInfo {
                name: "Audi RS3 Sportback 2018",
                power: "-",
                acceleration: "-",
                top_speed: "-",
                price: "-",
            },
        }
    }
}

impl fmt::Display for CarChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for car in CarChoice::ASSETS.into_iter().chain(CarChoice::SHOWROOM) {
            assert_eq!(CarChoice::from_key(car.key()), Some(car));
        }
        assert_eq!(CarChoice::from_key("tesla"), None);
    }

    #[test]
    fn showroom_cars_are_procedural() {
        assert!(CarChoice::SHOWROOM
            .iter()
            .all(|car| car.source() == CarSource::Procedural));
        assert_eq!(
            CarChoice::Audi.source(),
            CarSource::Asset("models/2018_audi_rs3_sportback.glb")
        );
    }
}
