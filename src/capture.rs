//! Screenshots: renders one frame into an offscreen texture, reads it back
//! and encodes it as PNG.

use std::{io::Cursor, iter};

use anyhow::Context as _;
use base64::Engine as _;

use crate::{context::Context, data_structures::texture::Texture, render::GpuScene};

/// A frame copied into a mappable buffer, waiting to be read.
pub struct Capture {
    device: wgpu::Device,
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    padded_row: u32,
    bgra: bool,
}

/// Rows in a texture-to-buffer copy must be a multiple of 256 bytes.
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Draws the current scene offscreen and queues the copy to the CPU.
pub fn capture(ctx: &Context, scene: &GpuScene) -> Capture {
    let (width, height) = (ctx.config.width, ctx.config.height);
    let extent = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let target = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("screenshot"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ctx.config.format,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = Texture::create_depth_texture(&ctx.device, [width, height], "screenshot depth");

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Screenshot Encoder"),
        });
    scene.encode(ctx, &mut encoder, &view, &depth.view);

    let padded_row = padded_bytes_per_row(width);
    let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("screenshot readback"),
        size: (padded_row * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        extent,
    );
    ctx.queue.submit(iter::once(encoder.finish()));

    Capture {
        device: ctx.device.clone(),
        buffer,
        width,
        height,
        padded_row,
        bgra: matches!(
            ctx.config.format,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        ),
    }
}

impl Capture {
    /// Waits for the copy and returns the frame as PNG bytes.
    pub async fn into_png(self) -> anyhow::Result<Vec<u8>> {
        // map first, then poll, otherwise the receiver never resolves
        let slice = self.buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        #[cfg(target_arch = "wasm32")]
        self.device.poll(wgpu::PollType::Poll)?;
        #[cfg(not(target_arch = "wasm32"))]
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(std::time::Duration::from_secs(3)),
        })?;
        rx.receive()
            .await
            .context("Screenshot buffer was dropped before mapping")??;

        let pixels = {
            let data = slice.get_mapped_range();
            let mut pixels = unpad_rows(&data, self.width, self.height, self.padded_row);
            if self.bgra {
                swap_red_blue(&mut pixels);
            }
            pixels
        };
        self.buffer.unmap();

        let image = image::RgbaImage::from_raw(self.width, self.height, pixels)
            .context("Screenshot size does not match its pixels")?;
        encode_png(&image)
    }
}

fn unpad_rows(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row = (width * 4) as usize;
    data.chunks(padded_row as usize)
        .take(height as usize)
        .flat_map(|chunk| &chunk[..row.min(chunk.len())])
        .copied()
        .collect()
}

fn swap_red_blue(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }
}

pub fn encode_png(image: &image::RgbaImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1), 256);
    }

    #[test]
    fn padding_is_stripped_and_channels_swapped() {
        let padded_row = 256;
        let mut data = vec![0u8; padded_row * 2];
        data[..4].copy_from_slice(&[1, 2, 3, 4]);
        data[padded_row..padded_row + 4].copy_from_slice(&[5, 6, 7, 8]);

        let mut pixels = unpad_rows(&data, 1, 2, padded_row as u32);
        assert_eq!(pixels, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        swap_red_blue(&mut pixels);
        assert_eq!(pixels, vec![3, 2, 1, 4, 7, 6, 5, 8]);
    }

    #[test]
    fn png_data_url_has_png_header() {
        let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let url = png_data_url(&png);
        assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
