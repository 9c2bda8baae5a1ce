//! The showroom cars, built from boxes, cylinders, planes and spheres.
//!
//! All four cars share one silhouette and differ only in paint. Mesh names
//! are chosen so that the part classifier buckets them like a real asset.

use std::f32::consts::FRAC_PI_2;

use cgmath::{Quaternion, Rad, Rotation3, Vector3};

use crate::{
    data_structures::{instance::Instance, scene_graph::LoadedModel},
    garage::CarChoice,
    material::{Color, Material},
    resources::primitives::{cuboid, cylinder, plane, sphere},
};

const WHEELS: [(&str, [f32; 3]); 4] = [
    ("fl", [-1.3, 0.0, -1.2]),
    ("fr", [-1.3, 0.0, 1.2]),
    ("rl", [1.3, 0.0, -1.2]),
    ("rr", [1.3, 0.0, 1.2]),
];

fn at(x: f32, y: f32, z: f32) -> Instance {
    Instance::from(Vector3::new(x, y, z))
}

pub fn build_car(car: CarChoice) -> LoadedModel {
    let mut model = LoadedModel::new(car);

    let paint = Material::named("paint")
        .with_color(car.paint())
        .with_pbr(0.8, 0.2);
    model.push("body", cuboid(4.0, 1.0, 2.0), paint.clone(), at(0.0, 0.5, 0.0));
    model.push("body_roof", cuboid(3.0, 0.8, 1.8), paint.clone(), at(0.0, 1.4, 0.0));
    model.push("body_hood", cuboid(1.5, 0.2, 1.8), paint, at(1.5, 1.0, 0.0));

    let tyre = Material::named("tyre")
        .with_color(Color::from_hex(0x222222))
        .with_pbr(0.9, 0.1);
    let rim = Material::named("rim")
        .with_color(Color::from_hex(0x888888))
        .with_pbr(1.0, 0.1);
    let sideways = Quaternion::from_angle_z(Rad(FRAC_PI_2));
    for (corner, [x, y, z]) in WHEELS {
        model.push(
            &format!("wheel_{}", corner),
            cylinder(0.4, 0.3, 16),
            tyre.clone(),
            at(x, y, z).with_rotation(sideways),
        );
        model.push(
            &format!("rim_{}", corner),
            cylinder(0.35, 0.1, 8),
            rim.clone(),
            at(x, y, z).with_rotation(sideways),
        );
    }

    let glass = Material::named("window")
        .with_color(Color::from_hex(0x87ceeb))
        .with_pbr(0.0, 0.0)
        .with_opacity(0.3);
    model.push(
        "window_front",
        plane(1.8, 0.8),
        glass.clone(),
        at(0.5, 1.4, 0.0).with_rotation(Quaternion::from_angle_x(Rad(-0.3))),
    );
    model.push(
        "window_left",
        plane(1.5, 0.6),
        glass.clone(),
        at(0.0, 1.4, -0.9).with_rotation(Quaternion::from_angle_y(Rad(FRAC_PI_2))),
    );
    model.push(
        "window_right",
        plane(1.5, 0.6),
        glass,
        at(0.0, 1.4, 0.9).with_rotation(Quaternion::from_angle_y(Rad(-FRAC_PI_2))),
    );

    let mut headlight = Material::named("headlight").with_pbr(0.0, 0.0);
    headlight.emissive = Color::from_hex(0x444444);
    model.push("headlight_left", sphere(0.2, 8, 8), headlight.clone(), at(2.0, 0.7, -0.6));
    model.push("headlight_right", sphere(0.2, 8, 8), headlight, at(2.0, 0.7, 0.6));

    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{Classification, PartCategory};

    #[test]
    fn procedural_parts_classify_like_assets() {
        let model = build_car(CarChoice::McLaren);
        let classification = Classification::build(model.meshes.iter().map(|m| m.name.as_str()));
        assert_eq!(classification.bucket(PartCategory::CarBody).len(), 3);
        assert_eq!(classification.bucket(PartCategory::Wheels).len(), 4);
        assert_eq!(classification.bucket(PartCategory::Rims).len(), 4);
        assert_eq!(classification.bucket(PartCategory::Glass).len(), 3);
        assert_eq!(classification.bucket(PartCategory::Headlights).len(), 2);
        assert!(classification.bucket(PartCategory::Other).is_empty());
    }

    #[test]
    fn body_carries_factory_paint() {
        let model = build_car(CarChoice::Lamborghini);
        assert_eq!(model.meshes[0].material.color, Color::from_hex(0xffd700));
        assert!(model.meshes.iter().all(|m| !m.geometry.is_empty()));
    }
}
