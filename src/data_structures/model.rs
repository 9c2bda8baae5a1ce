//! Mesh geometry on the CPU and on the GPU.

use std::ops::Range;

use wgpu::util::DeviceExt;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Triangle list kept on the CPU until the mesh is uploaded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshGeometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Fills in flat normals for geometry that came without any.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];
        for tri in self.indices.chunks(3) {
            if tri.len() < 3 {
                continue;
            }
            let p = |i: u32| cgmath::Vector3::from(self.vertices[i as usize].position);
            let normal = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            for &i in tri {
                normals[i as usize] += normal;
            }
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            use cgmath::InnerSpace;
            if normal.magnitude2() > 0.0 {
                vertex.normal = normal.normalize().into();
            }
        }
    }

    /// Largest distance of any vertex from the local origin on the XZ plane.
    pub fn footprint_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| (v.position[0] * v.position[0] + v.position[2] * v.position[2]).sqrt())
            .fold(0.0, f32::max)
    }
}

/// An uploaded mesh.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, name: &str, geometry: &MeshGeometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: geometry.indices.len() as u32,
        }
    }
}

pub trait DrawMesh<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a GpuMesh,
        material_bind_group: &'a wgpu::BindGroup,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b GpuMesh,
        material_bind_group: &'b wgpu::BindGroup,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, camera_bind_group, &[]);
        self.set_bind_group(1, light_bind_group, &[]);
        self.set_bind_group(2, material_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_triangle_gets_up_normal() {
        let vertex = |x: f32, z: f32| ModelVertex {
            position: [x, 0.0, z],
            ..Default::default()
        };
        let mut geometry = MeshGeometry {
            vertices: vec![vertex(0.0, 0.0), vertex(0.0, 1.0), vertex(1.0, 0.0)],
            indices: vec![0, 1, 2],
        };
        geometry.compute_normals();
        assert_eq!(geometry.vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(geometry.footprint_radius(), 1.0);
    }
}
