//! GPU mirror of the session and pipeline batching.
//!
//! [`GpuScene`] owns the uploaded car meshes (index for index with the
//! session's `CarModel`), their per-mesh material and instance buffers and
//! the ground plane. Every frame [`GpuScene::sync`] copies the session state
//! into those buffers and [`GpuScene::render`] describes what to draw as a
//! [`Render`] tree, which is split into an opaque and a transparent batch.

use cgmath::{EuclideanSpace, InnerSpace, Point3, Rotation3};
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::Instance,
        model::{DrawMesh, GpuMesh, MeshGeometry},
        scene_graph::LoadedModel,
        texture::Texture,
    },
    launch::Profile,
    material::{Color, Material},
    pipelines::light::SceneUniform,
    resources::primitives,
    session::Session,
};

/// One mesh ready to be drawn.
pub struct Instanced<'a> {
    pub mesh: &'a GpuMesh,
    pub instance: &'a wgpu::Buffer,
    pub material: &'a wgpu::BindGroup,
    /// Squared distance from the eye, used to order transparent draws.
    pub depth: f32,
}

/// What to draw and with which pipeline.
pub enum Render<'a> {
    None,
    Opaque(Instanced<'a>),
    Transparent(Instanced<'a>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(
        self,
        opaque: &mut Vec<Instanced<'a>>,
        transparent: &mut Vec<Instanced<'a>>,
    ) {
        match self {
            Render::Opaque(instanced) => opaque.push(instanced),
            Render::Transparent(instanced) => transparent.push(instanced),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(opaque, transparent)),
            Render::None => (),
        }
    }
}

/// A mesh with its own instance and material buffers.
pub struct Drawable {
    pub mesh: GpuMesh,
    instance_buffer: wgpu::Buffer,
    material_buffer: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
    texture: Option<usize>,
    blended: bool,
    center: Point3<f32>,
}

impl Drawable {
    fn new(
        ctx: &Context,
        name: &str,
        geometry: &MeshGeometry,
        material: &Material,
        textures: &[Texture],
    ) -> Self {
        let mesh = GpuMesh::upload(&ctx.device, name, geometry);
        let instance_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Instance Buffer", name)),
                contents: bytemuck::cast_slice(&[Instance::new().to_raw()]),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        let material_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Material Buffer", name)),
                contents: bytemuck::cast_slice(&[material.to_uniform(true)]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let material_bind_group = mk_material_bind_group(
            ctx,
            &material_buffer,
            texture_for(ctx, textures, material.base_color_texture),
        );
        Self {
            mesh,
            instance_buffer,
            material_buffer,
            material_bind_group,
            texture: material.base_color_texture,
            blended: material.is_blended(),
            center: Point3::origin(),
        }
    }

    fn update(
        &mut self,
        ctx: &Context,
        material: &Material,
        receive_shadow: bool,
        transform: &Instance,
        textures: &[Texture],
    ) {
        if material.base_color_texture != self.texture {
            self.material_bind_group = mk_material_bind_group(
                ctx,
                &self.material_buffer,
                texture_for(ctx, textures, material.base_color_texture),
            );
            self.texture = material.base_color_texture;
        }
        self.blended = material.is_blended();
        self.center = Point3::from_vec(transform.position);
        ctx.queue.write_buffer(
            &self.material_buffer,
            0,
            bytemuck::cast_slice(&[material.to_uniform(receive_shadow)]),
        );
        ctx.queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[transform.to_raw()]),
        );
    }

    fn instanced(&self, eye: Point3<f32>) -> Instanced<'_> {
        Instanced {
            mesh: &self.mesh,
            instance: &self.instance_buffer,
            material: &self.material_bind_group,
            depth: (self.center - eye).magnitude2(),
        }
    }
}

fn texture_for<'t>(ctx: &'t Context, textures: &'t [Texture], idx: Option<usize>) -> &'t Texture {
    idx.and_then(|idx| textures.get(idx))
        .unwrap_or(&ctx.default_texture)
}

fn mk_material_bind_group(
    ctx: &Context,
    buffer: &wgpu::Buffer,
    texture: &Texture,
) -> wgpu::BindGroup {
    let fallback;
    let sampler = match &texture.sampler {
        Some(sampler) => sampler,
        None => {
            fallback = crate::data_structures::texture::create_default_sampler(&ctx.device);
            &fallback
        }
    };
    ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &ctx.material_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("material_bind_group"),
    })
}

pub struct GpuScene {
    ground: Drawable,
    ground_material: Material,
    ground_transform: Instance,
    car: Vec<Drawable>,
    textures: Vec<Texture>,
    eye: Point3<f32>,
}

impl GpuScene {
    pub fn new(ctx: &Context, profile: &Profile) -> Self {
        let geometry = primitives::plane(profile.ground_size, profile.ground_size);
        let mut ground_material = Material::named("ground")
            .with_color(Color::from_hex(profile.ground_hex))
            .with_pbr(0.0, 0.8)
            .with_opacity(profile.ground_opacity);
        ground_material.pattern = profile.ground_pattern;
        let ground_transform = Instance::new().with_rotation(cgmath::Quaternion::from_angle_x(
            cgmath::Rad(-std::f32::consts::FRAC_PI_2),
        ));
        let mut ground = Drawable::new(ctx, "ground", &geometry, &ground_material, &[]);
        ground.update(ctx, &ground_material, true, &ground_transform, &[]);
        Self {
            ground,
            ground_material,
            ground_transform,
            car: Vec::new(),
            textures: Vec::new(),
            eye: Point3::origin(),
        }
    }

    /// Uploads the geometry and textures of a freshly loaded car, replacing
    /// the current one.
    pub fn upload_car(&mut self, ctx: &Context, loaded: &LoadedModel) {
        self.textures = loaded
            .textures
            .iter()
            .enumerate()
            .map(|(idx, image)| {
                let label = format!("{} texture {}", loaded.car, idx);
                Texture::from_image(&ctx.device, &ctx.queue, image, Some(&label)).unwrap_or_else(
                    |e| {
                        log::warn!("{}, using plain white", e);
                        Texture::create_solid(&ctx.device, &ctx.queue, [255; 4], &label)
                    },
                )
            })
            .collect();
        self.car = loaded
            .meshes
            .iter()
            .map(|mesh| Drawable::new(ctx, &mesh.name, &mesh.geometry, &mesh.material, &self.textures))
            .collect();
        log::info!(
            "Uploaded {} meshes and {} textures",
            self.car.len(),
            self.textures.len()
        );
    }

    pub fn clear_car(&mut self) {
        self.car.clear();
        self.textures.clear();
    }

    /// Copies camera, lights and every car material and transform into their
    /// GPU buffers.
    pub fn sync(&mut self, ctx: &mut Context, session: &Session) {
        self.eye = session.camera.eye;
        ctx.camera.write(&ctx.queue, &session.camera);
        ctx.clear_colour = session.stage.environment.background().to_wgpu();
        self.ground.update(
            ctx,
            &self.ground_material,
            session.stage.shadows,
            &self.ground_transform,
            &[],
        );

        let Some(model) = session.model() else {
            if !self.car.is_empty() {
                self.clear_car();
            }
            ctx.light
                .write(&ctx.queue, SceneUniform::new(&session.stage, None));
            return;
        };
        let position = model.transform.position;
        ctx.light.write(
            &ctx.queue,
            SceneUniform::new(&session.stage, Some(([position.x, position.z], model.footprint))),
        );

        if model.meshes.len() != self.car.len() {
            log::warn!(
                "Car has {} meshes but {} are uploaded",
                model.meshes.len(),
                self.car.len()
            );
            return;
        }
        for (idx, (mesh, drawable)) in model.meshes.iter().zip(&mut self.car).enumerate() {
            if let Some(transform) = model.world_transform(idx) {
                drawable.update(ctx, mesh.material(), mesh.receive_shadow, &transform, &self.textures);
            }
        }
    }

    pub fn render(&self) -> Render<'_> {
        let mut renders = vec![Render::Transparent(self.ground.instanced(self.eye))];
        renders.extend(self.car.iter().map(|drawable| {
            if drawable.mesh.num_elements == 0 {
                return Render::None;
            }
            let instanced = drawable.instanced(self.eye);
            if drawable.blended {
                Render::Transparent(instanced)
            } else {
                Render::Opaque(instanced)
            }
        }));
        Render::Composed(renders)
    }

    /// Records one full frame into `encoder`.
    pub fn encode(
        &self,
        ctx: &Context,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ctx.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let mut opaque: Vec<Instanced> = Vec::new();
        let mut transparent: Vec<Instanced> = Vec::new();
        self.render().set_pipelines(&mut opaque, &mut transparent);

        render_pass.set_pipeline(&ctx.pipelines.basic);
        for instanced in opaque {
            render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            render_pass.draw_mesh_instanced(
                instanced.mesh,
                instanced.material,
                0..1,
                &ctx.camera.bind_group,
                &ctx.light.bind_group,
            );
        }

        // the ground stays first, everything else back to front
        if let Some((_ground, rest)) = transparent.split_first_mut() {
            rest.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        }
        render_pass.set_pipeline(&ctx.pipelines.transparent);
        for instanced in transparent {
            render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            render_pass.draw_mesh_instanced(
                instanced.mesh,
                instanced.material,
                0..1,
                &ctx.camera.bind_group,
                &ctx.light.bind_group,
            );
        }
    }
}
