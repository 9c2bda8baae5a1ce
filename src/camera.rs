//! Camera state, projection and orbit controls.
//!
//! The [`Camera`] itself is plain data owned by the session; the GPU copy of
//! its view-projection matrix lives in [`CameraResources`] and is refreshed
//! once per frame.

use std::f32::consts::{FRAC_PI_2, PI};

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use wgpu::util::DeviceExt;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A look-at camera.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new(eye: Point3<f32>, target: Point3<f32>) -> Self {
        Self {
            eye,
            target,
            up: Vector3::unit_y(),
        }
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Distance of the eye from the world origin.
    pub fn distance(&self) -> f32 {
        self.eye.to_vec().magnitude()
    }

    /// Moves the eye along its ray from the origin so that it ends up `len`
    /// units away.
    pub fn set_distance(&mut self, len: f32) {
        let direction = self.eye.to_vec();
        if direction.magnitude2() > f32::EPSILON {
            self.eye = Point3::from_vec(direction.normalize() * len);
        }
    }

    /// Jumps to one of the fixed viewpoints at the current distance and looks
    /// at the origin.
    pub fn set_view(&mut self, view: ViewPreset) {
        let distance = self.distance();
        self.eye = match view {
            ViewPreset::Front => Point3::new(distance, 2.0, 0.0),
            ViewPreset::Side => Point3::new(0.0, 2.0, distance),
            ViewPreset::Rear => Point3::new(-distance, 2.0, 0.0),
            ViewPreset::Top => Point3::new(0.0, distance, 0.0),
        };
        self.target = Point3::origin();
    }
}

/// Camera-view buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewPreset {
    Front,
    Side,
    Rear,
    Top,
}

impl ViewPreset {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "front" => Some(ViewPreset::Front),
            "side" => Some(ViewPreset::Side),
            "rear" => Some(ViewPreset::Rear),
            "top" => Some(ViewPreset::Top),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.eye.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU side of the camera.
#[derive(Debug)]
pub struct CameraResources {
    pub projection: Projection,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: &Camera, projection: Projection) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera, &projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            projection,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        self.uniform.update_view_proj(camera, &self.projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

/// Mouse orbit around a target with damping, distance limits and optional
/// auto-rotation.
///
/// Rotation input accumulates as a pending delta that is released gradually
/// over the following frames, so motion eases out after the mouse stops.
#[derive(Clone, Debug)]
pub struct OrbitController {
    pub enabled: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_polar_angle: f32,
    pub auto_rotate: bool,
    /// Full turns per minute, like a turntable.
    pub auto_rotate_speed: f32,
    pub rotate_speed: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_zoom: f32,
    dragging: bool,
}

impl OrbitController {
    pub fn new() -> Self {
        Self {
            enabled: false,
            damping_factor: 0.05,
            min_distance: 3.0,
            max_distance: 15.0,
            max_polar_angle: FRAC_PI_2,
            auto_rotate: true,
            auto_rotate_speed: 1.0,
            rotate_speed: 0.005,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_zoom: 1.0,
            dragging: false,
        }
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if !self.enabled || !self.dragging {
            return;
        }
        self.pending_theta -= dx as f32 * self.rotate_speed;
        self.pending_phi -= dy as f32 * self.rotate_speed;
    }

    /// Positive `lines` zoom in.
    pub fn handle_scroll(&mut self, lines: f32) {
        if !self.enabled {
            return;
        }
        self.pending_zoom *= 0.95f32.powf(lines);
    }

    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        if !self.enabled {
            return;
        }
        let dt = dt.as_secs_f32();
        // damping is tuned per 60 Hz frame
        let frames = (dt * 60.0).max(0.0);
        let step = 1.0 - (1.0 - self.damping_factor).powf(frames);

        let offset = camera.eye - camera.target;
        let radius = offset.magnitude().max(f32::EPSILON);
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        if self.auto_rotate && !self.dragging {
            theta += 2.0 * PI / 60.0 * self.auto_rotate_speed * dt;
        }
        theta += self.pending_theta * step;
        phi += self.pending_phi * step;
        self.pending_theta *= 1.0 - step;
        self.pending_phi *= 1.0 - step;

        let phi = phi.clamp(f32::EPSILON, self.max_polar_angle);
        let zoom = self.pending_zoom.powf(step);
        self.pending_zoom /= zoom;
        let radius = (radius * zoom).clamp(self.min_distance, self.max_distance);

        camera.eye = camera.target
            + Vector3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn views_keep_distance_and_face_origin() {
        let mut camera = Camera::new(Point3::new(3.0, 0.0, 4.0), Point3::new(1.0, 1.0, 1.0));
        camera.set_view(ViewPreset::Rear);
        assert_eq!(camera.eye, Point3::new(-5.0, 2.0, 0.0));
        assert_eq!(camera.target, Point3::origin());
        camera.set_view(ViewPreset::Top);
        assert_relative_eq!(camera.eye.y, camera.distance());
    }

    #[test]
    fn zoom_sets_eye_length() {
        let mut camera = Camera::new(Point3::new(5.0, 2.0, 5.0), Point3::origin());
        camera.set_distance(10.0);
        assert_relative_eq!(camera.distance(), 10.0, epsilon = 1e-5);
        assert_relative_eq!(camera.eye.x, camera.eye.z);
    }

    #[test]
    fn orbit_respects_limits() {
        let mut orbit = OrbitController::new();
        orbit.enabled = true;
        orbit.auto_rotate = false;
        let mut camera = Camera::new(Point3::new(0.0, 1.0, 30.0), Point3::origin());
        orbit.update(&mut camera, Duration::from_millis(16));
        assert_relative_eq!((camera.eye - camera.target).magnitude(), 15.0, epsilon = 1e-4);

        orbit.set_dragging(true);
        for _ in 0..200 {
            orbit.handle_mouse(0.0, -500.0);
            orbit.update(&mut camera, Duration::from_millis(16));
        }
        assert!(camera.eye.y >= -1e-4, "camera went below the ground: {:?}", camera.eye);
    }

    #[test]
    fn disabled_orbit_leaves_camera_alone() {
        let mut orbit = OrbitController::new();
        let mut camera = Camera::new(Point3::new(0.0, 1.0, 30.0), Point3::origin());
        orbit.update(&mut camera, Duration::from_secs(1));
        assert_eq!(camera.eye, Point3::new(0.0, 1.0, 30.0));
    }
}
