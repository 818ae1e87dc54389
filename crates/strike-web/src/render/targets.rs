use super::helpers;
use wgpu;

/// Offscreen color targets for the post-process chain.
///
/// - `scene_*` holds the shaded frame in Rgba16Float.
/// - `ping_*` / `pong_*` are full-resolution intermediates the single-pass
///   chain bounces between.
/// - `bloom_*` are half-resolution buffers for bright-pass and blur.
pub(crate) struct RenderTargets {
    pub(crate) scene_tex: wgpu::Texture,
    pub(crate) scene_view: wgpu::TextureView,
    pub(crate) ping_tex: wgpu::Texture,
    pub(crate) ping_view: wgpu::TextureView,
    pub(crate) pong_tex: wgpu::Texture,
    pub(crate) pong_view: wgpu::TextureView,
    pub(crate) bloom_a: wgpu::Texture,
    pub(crate) bloom_a_view: wgpu::TextureView,
    pub(crate) bloom_b: wgpu::Texture,
    pub(crate) bloom_b_view: wgpu::TextureView,
}

pub(crate) const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

impl RenderTargets {
    pub(crate) fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let (scene_tex, scene_view) =
            helpers::create_color_texture(device, "scene_tex", width, height, HDR_FORMAT, usage);
        let (ping_tex, ping_view) =
            helpers::create_color_texture(device, "ping_tex", width, height, HDR_FORMAT, usage);
        let (pong_tex, pong_view) =
            helpers::create_color_texture(device, "pong_tex", width, height, HDR_FORMAT, usage);
        let bw = (width.max(1) / 2).max(1);
        let bh = (height.max(1) / 2).max(1);
        let (bloom_a, bloom_a_view) =
            helpers::create_color_texture(device, "bloom_a", bw, bh, HDR_FORMAT, usage);
        let (bloom_b, bloom_b_view) =
            helpers::create_color_texture(device, "bloom_b", bw, bh, HDR_FORMAT, usage);
        Self {
            scene_tex,
            scene_view,
            ping_tex,
            ping_view,
            pong_tex,
            pong_view,
            bloom_a,
            bloom_a_view,
            bloom_b,
            bloom_b_view,
        }
    }

    pub(crate) fn recreate(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        *self = Self::new(device, width, height);
    }
}
