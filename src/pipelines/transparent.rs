use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{mk_render_pipeline, pbr_shader},
};

/**
 * Glass, the ground and anything else with opacity below one.
 *
 * The shader always emits premultiplied colour, so a single blend state
 * covers both straight and premultiplied materials. Depth is tested but not
 * written and both faces are drawn, since window panes are single planes.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    layout: &wgpu::PipelineLayout,
) -> wgpu::RenderPipeline {
    mk_render_pipeline(
        device,
        layout,
        format,
        Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
        Some(Texture::DEPTH_FORMAT),
        false,
        None,
        &[ModelVertex::desc(), InstanceRaw::desc()],
        pbr_shader(),
    )
}
