//! Basic shapes for the procedural cars and the ground.
//!
//! All shapes are centred on the origin with counter-clockwise front faces.

use std::f32::consts::PI;

use cgmath::{ElementWise, Vector3};

use crate::data_structures::model::{MeshGeometry, ModelVertex};

/// An axis-aligned box with the given width (x), height (y) and depth (z).
pub fn cuboid(width: f32, height: f32, depth: f32) -> MeshGeometry {
    let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
    // (normal, u, v) with u x v = normal
    let faces = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let mut geometry = MeshGeometry::default();
    for (normal, u, v) in faces {
        let n = Vector3::from(normal).mul_element_wise(half);
        let u = Vector3::from(u).mul_element_wise(half);
        let v = Vector3::from(v).mul_element_wise(half);
        let base = geometry.vertices.len() as u32;
        for (a, b, tex_coords) in [
            (-1.0, -1.0, [0.0, 1.0]),
            (1.0, -1.0, [1.0, 1.0]),
            (1.0, 1.0, [1.0, 0.0]),
            (-1.0, 1.0, [0.0, 0.0]),
        ] {
            geometry.vertices.push(ModelVertex {
                position: (n + u * a + v * b).into(),
                normal,
                tex_coords,
            });
        }
        geometry
            .indices
            .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    geometry
}

/// A closed cylinder along the y axis.
pub fn cylinder(radius: f32, height: f32, segments: u32) -> MeshGeometry {
    let segments = segments.max(3);
    let half = height / 2.0;
    let mut geometry = MeshGeometry::default();

    for i in 0..=segments {
        let u = i as f32 / segments as f32;
        let (sin, cos) = (u * 2.0 * PI).sin_cos();
        for (y, v) in [(-half, 1.0), (half, 0.0)] {
            geometry.vertices.push(ModelVertex {
                position: [radius * sin, y, radius * cos],
                normal: [sin, 0.0, cos],
                tex_coords: [u, v],
            });
        }
    }
    for i in 0..segments {
        let (a, b, c, d) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
        geometry.indices.extend([a, c, d, a, d, b]);
    }

    for (y, normal_y) in [(half, 1.0f32), (-half, -1.0)] {
        let center = geometry.vertices.len() as u32;
        geometry.vertices.push(ModelVertex {
            position: [0.0, y, 0.0],
            normal: [0.0, normal_y, 0.0],
            tex_coords: [0.5, 0.5],
        });
        for i in 0..=segments {
            let (sin, cos) = (i as f32 / segments as f32 * 2.0 * PI).sin_cos();
            geometry.vertices.push(ModelVertex {
                position: [radius * sin, y, radius * cos],
                normal: [0.0, normal_y, 0.0],
                tex_coords: [0.5 + sin / 2.0, 0.5 + cos / 2.0],
            });
        }
        for i in 0..segments {
            let (ring, next) = (center + 1 + i, center + 2 + i);
            if normal_y > 0.0 {
                geometry.indices.extend([center, ring, next]);
            } else {
                geometry.indices.extend([center, next, ring]);
            }
        }
    }
    geometry
}

/// A UV sphere.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshGeometry {
    let (w, h) = (width_segments.max(3), height_segments.max(2));
    let mut geometry = MeshGeometry::default();
    for iy in 0..=h {
        let v = iy as f32 / h as f32;
        let (sin_phi, cos_phi) = (v * PI).sin_cos();
        for ix in 0..=w {
            let u = ix as f32 / w as f32;
            let (sin_theta, cos_theta) = (u * 2.0 * PI).sin_cos();
            let normal = [-cos_theta * sin_phi, cos_phi, sin_theta * sin_phi];
            geometry.vertices.push(ModelVertex {
                position: normal.map(|c| c * radius),
                normal,
                tex_coords: [u, v],
            });
        }
    }
    let row = w + 1;
    for iy in 0..h {
        for ix in 0..w {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                geometry.indices.extend([a, b, d]);
            }
            if iy != h - 1 {
                geometry.indices.extend([b, c, d]);
            }
        }
    }
    geometry
}

/// A rectangle in the xy plane facing +z.
pub fn plane(width: f32, height: f32) -> MeshGeometry {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let vertex = |x: f32, y: f32, tex_coords: [f32; 2]| ModelVertex {
        position: [x, y, 0.0],
        normal: [0.0, 0.0, 1.0],
        tex_coords,
    };
    MeshGeometry {
        vertices: vec![
            vertex(-hw, -hh, [0.0, 1.0]),
            vertex(hw, -hh, [1.0, 1.0]),
            vertex(hw, hh, [1.0, 0.0]),
            vertex(-hw, hh, [0.0, 0.0]),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    /// Every triangle's winding agrees with its vertex normals.
    fn assert_outward(geometry: &MeshGeometry) {
        for tri in geometry.indices.chunks(3) {
            let p = |i: u32| Vector3::from(geometry.vertices[i as usize].position);
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            if face.magnitude2() < 1e-12 {
                continue;
            }
            let normal = Vector3::from(geometry.vertices[tri[0] as usize].normal)
                + Vector3::from(geometry.vertices[tri[1] as usize].normal)
                + Vector3::from(geometry.vertices[tri[2] as usize].normal);
            assert!(face.dot(normal) > 0.0, "triangle {:?} faces inwards", tri);
        }
    }

    #[test]
    fn shapes_face_outwards() {
        assert_outward(&cuboid(4.0, 1.0, 2.0));
        assert_outward(&cylinder(0.4, 0.3, 16));
        assert_outward(&sphere(0.2, 8, 8));
        assert_outward(&plane(1.8, 0.8));
    }

    #[test]
    fn cuboid_extents() {
        let geometry = cuboid(4.0, 1.0, 2.0);
        assert_eq!(geometry.vertices.len(), 24);
        assert_eq!(geometry.indices.len(), 36);
        let max_x = geometry
            .vertices
            .iter()
            .map(|v| v.position[0])
            .fold(f32::MIN, f32::max);
        assert_eq!(max_x, 2.0);
    }
}
