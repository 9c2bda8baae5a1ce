use wgpu::util::DeviceExt;

use crate::stage::{DirectionalLight, Stage};

/// Strength of the contact shadow under the car.
const SHADOW_STRENGTH: f32 = 0.6;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightRaw {
    // xyz direction towards the light, w unused
    direction: [f32; 4],
    // rgb colour premultiplied by intensity
    color: [f32; 4],
}

impl From<&DirectionalLight> for LightRaw {
    fn from(light: &DirectionalLight) -> Self {
        let [r, g, b] = light.color.to_linear();
        let [x, y, z] = light.direction;
        Self {
            direction: [x, y, z, 0.0],
            color: [
                r * light.intensity,
                g * light.intensity,
                b * light.intensity,
                1.0,
            ],
        }
    }
}

/// Everything `pbr.wgsl` reads from group 1. Every member is a vec4 so the
/// Rust and WGSL layouts line up without explicit padding.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    lights: [LightRaw; 4],
    ambient: [f32; 4],
    sky: [f32; 4],
    ground: [f32; 4],
    fog_color: [f32; 4],
    // near, far, enabled, exposure
    fog: [f32; 4],
    // centre x, centre z, radius, strength
    shadow: [f32; 4],
}

impl SceneUniform {
    /// `shadow` is the ground position and footprint radius of the car, if
    /// one is shown.
    pub fn new(stage: &Stage, shadow: Option<([f32; 2], f32)>) -> Self {
        let rgba = |rgb: [f32; 3]| [rgb[0], rgb[1], rgb[2], 1.0];
        let (ambient_color, ambient_intensity) = stage.ambient;
        let ambient = ambient_color.to_linear().map(|c| c * ambient_intensity);
        let (near, far, fog_enabled) = match stage.fog {
            Some((near, far)) => (near, far, 1.0),
            None => (0.0, 1.0, 0.0),
        };
        let shadow = match shadow {
            Some(([x, z], radius)) if stage.shadows => [x, z, radius, SHADOW_STRENGTH],
            _ => [0.0; 4],
        };
        let environment = stage.environment;
        Self {
            lights: [
                (&stage.key).into(),
                (&stage.fill[0]).into(),
                (&stage.fill[1]).into(),
                (&stage.rim).into(),
            ],
            ambient: rgba(ambient),
            sky: rgba(environment.sky().to_linear()),
            ground: rgba(environment.ground().to_linear()),
            fog_color: rgba(environment.background().to_linear()),
            fog: [near, far, fog_enabled, stage.exposure],
            shadow,
        }
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: SceneUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: SceneUniform) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, uniform: SceneUniform) {
        self.uniform = uniform;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, uniform: SceneUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Scene Light Buffer"),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Environment;

    #[test]
    fn shadow_toggle_clears_contact_shadow() {
        let mut stage = Stage::new(Environment::Showroom, None);
        let uniform = SceneUniform::new(&stage, Some(([1.0, 2.0], 2.5)));
        assert_eq!(uniform.shadow, [1.0, 2.0, 2.5, SHADOW_STRENGTH]);

        stage.shadows = false;
        let uniform = SceneUniform::new(&stage, Some(([1.0, 2.0], 2.5)));
        assert_eq!(uniform.shadow, [0.0; 4]);
        assert_eq!(uniform.fog[2], 0.0);
    }

    #[test]
    fn lighting_reaches_key_and_rim() {
        let mut stage = Stage::new(Environment::Studio, Some((1.0, 80.0)));
        stage.set_lighting(2.0);
        let uniform = SceneUniform::new(&stage, None);
        assert_eq!(uniform.lights[0].color[0], 2.0);
        assert_eq!(uniform.lights[3].color[0], 1.0);
        assert_eq!(uniform.fog, [1.0, 80.0, 1.0, 2.0]);
    }
}
