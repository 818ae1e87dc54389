//! WebGPU effect primitives: the concrete rendering-engine side of the core's
//! `RenderBackend` contract, plus the per-frame pass execution.
//!
//! Every effect the composer enables becomes one or more fullscreen passes
//! bouncing between two HDR intermediates; bloom additionally owns a pair of
//! half-resolution buffers for bright-pass and blur. Depth-driven effects
//! (depth of field, motion blur) have no depth/velocity source in this
//! front-end and report unsupported, which the composer degrades around.

pub(crate) mod helpers;
pub(crate) mod post;
pub(crate) mod targets;

use fnv::FnvHashMap;
use smallvec::SmallVec;
use strike_core::effects::{
    CameraId, EffectBuildError, EffectDesc, EffectId, EffectKind, EffectParams, RenderBackend,
};

use targets::{RenderTargets, HDR_FORMAT};

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct PostUniforms {
    resolution: [f32; 2],
    time: f32,
    bloom_weight: f32,

    bloom_threshold: f32,
    contrast: f32,
    exposure: f32,
    saturation: f32,

    tint: [f32; 4],
    vignette: [f32; 4],       // weight, stretch
    vignette_color: [f32; 4], // rgb
    chroma: [f32; 4],         // amount_px, radial_intensity
    grain: [f32; 4],          // intensity, animated
    sharpen: [f32; 4],        // edge_amount, color_amount
}

impl Default for PostUniforms {
    fn default() -> Self {
        Self {
            resolution: [1.0, 1.0],
            time: 0.0,
            bloom_weight: 0.35,
            bloom_threshold: 0.82,
            contrast: 1.0,
            exposure: 1.0,
            saturation: 1.0,
            tint: [1.0, 1.0, 1.0, 0.0],
            vignette: [1.2, 0.5, 0.0, 0.0],
            vignette_color: [0.0; 4],
            chroma: [8.0, 2.0, 0.0, 0.0],
            grain: [0.175, 1.0, 0.0, 0.0],
            sharpen: [0.3, 1.0, 0.0, 0.0],
        }
    }
}

enum PassPipelines {
    Simple(wgpu::RenderPipeline),
    Bloom {
        bright: wgpu::RenderPipeline,
        blur: wgpu::RenderPipeline,
        composite: wgpu::RenderPipeline,
    },
}

struct PassEntry {
    kind: EffectKind,
    pipelines: PassPipelines,
}

pub struct WgpuEffects {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    shader: wgpu::ShaderModule,
    pl_single: wgpu::PipelineLayout,
    pl_dual: wgpu::PipelineLayout,
    scene_pipeline: wgpu::RenderPipeline,
    present_pipeline: wgpu::RenderPipeline,
    resources: post::PostResources,
    targets: RenderTargets,
    passes: FnvHashMap<u32, PassEntry>,
    uniforms: PostUniforms,
    next_id: u32,
    cameras: SmallVec<[u32; 2]>,
    time: f32,
}

impl WgpuEffects {
    pub async fn new(canvas: web_sys::HtmlCanvasElement) -> anyhow::Result<Self> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
            .map_err(|e| anyhow::anyhow!("create_surface: {e:?}"))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("no suitable GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("strike_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!("request_device: {e:?}"))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("surface has no formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/post.wgsl").into()),
        });

        let resources =
            post::create_post_resources(&device, std::mem::size_of::<PostUniforms>() as u64);
        let pl_single = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl_post_single"),
            bind_group_layouts: &[&resources.bgl0],
            push_constant_ranges: &[],
        });
        let pl_dual = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl_post_dual"),
            bind_group_layouts: &[&resources.bgl0, &resources.bgl1],
            push_constant_ranges: &[],
        });

        let scene_pipeline =
            helpers::make_post_pipeline(&device, &pl_single, &shader, "fs_scene", HDR_FORMAT, None);
        let present_pipeline = helpers::make_post_pipeline(
            &device,
            &pl_single,
            &shader,
            "fs_present",
            config.format,
            None,
        );
        let targets = RenderTargets::new(&device, width, height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            shader,
            pl_single,
            pl_dual,
            scene_pipeline,
            present_pipeline,
            resources,
            targets,
            passes: FnvHashMap::default(),
            uniforms: PostUniforms::default(),
            next_id: 0,
            cameras: SmallVec::new(),
            time: 0.0,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.config.width && height == self.config.height {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.targets.recreate(&self.device, width, height);
    }

    fn bind0(&self, view: &wgpu::TextureView) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("post_bg0"),
            layout: &self.resources.bgl0,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.resources.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.resources.uniform_buffer.as_entire_binding(),
                },
            ],
        })
    }

    fn bind1(&self, view: &wgpu::TextureView) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("post_bg1"),
            layout: &self.resources.bgl1,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.resources.sampler),
                },
            ],
        })
    }

    /// Render the shaded frame and run the active chain in fixed order.
    pub fn render_frame(&mut self, dt: f32) {
        self.time += dt;
        self.uniforms.resolution = [self.config.width as f32, self.config.height as f32];
        self.uniforms.time = self.time;
        self.queue.write_buffer(
            &self.resources.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("surface acquire failed: {e:?}");
                return;
            }
        };
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        let scene_bg = self.bind0(&self.targets.pong_view);
        post::blit(
            &mut encoder,
            "scene",
            &self.targets.scene_view,
            &self.scene_pipeline,
            &scene_bg,
            None,
        );

        let mut cur = &self.targets.scene_view;
        let mut ping_next = true;
        for kind in EffectKind::CHAIN_ORDER {
            let Some(entry) = self.passes.values().find(|e| e.kind == kind) else {
                continue;
            };
            let dst = if ping_next {
                &self.targets.ping_view
            } else {
                &self.targets.pong_view
            };
            match &entry.pipelines {
                PassPipelines::Simple(pipeline) => {
                    let bg = self.bind0(cur);
                    post::blit(&mut encoder, kind.name(), dst, pipeline, &bg, None);
                }
                PassPipelines::Bloom {
                    bright,
                    blur,
                    composite,
                } => {
                    let bg = self.bind0(cur);
                    post::blit(
                        &mut encoder,
                        "bloom_bright",
                        &self.targets.bloom_a_view,
                        bright,
                        &bg,
                        None,
                    );
                    let bg = self.bind0(&self.targets.bloom_a_view);
                    post::blit(
                        &mut encoder,
                        "bloom_blur_h",
                        &self.targets.bloom_b_view,
                        blur,
                        &bg,
                        None,
                    );
                    let bg = self.bind0(&self.targets.bloom_b_view);
                    post::blit(
                        &mut encoder,
                        "bloom_blur_v",
                        &self.targets.bloom_a_view,
                        blur,
                        &bg,
                        None,
                    );
                    let bg = self.bind0(cur);
                    let bg_bloom = self.bind1(&self.targets.bloom_a_view);
                    post::blit(
                        &mut encoder,
                        "bloom_composite",
                        dst,
                        composite,
                        &bg,
                        Some(&bg_bloom),
                    );
                }
            }
            cur = dst;
            ping_next = !ping_next;
        }

        let bg = self.bind0(cur);
        post::blit(
            &mut encoder,
            "present",
            &swap_view,
            &self.present_pipeline,
            &bg,
            None,
        );

        self.queue.submit(Some(encoder.finish()));
        frame.present();
    }
}

impl RenderBackend for WgpuEffects {
    fn max_sample_count(&self) -> u32 {
        // The chain runs on non-multisampled intermediates in this front-end.
        1
    }

    fn create_effect(
        &mut self,
        kind: EffectKind,
        _desc: &EffectDesc,
    ) -> Result<EffectId, EffectBuildError> {
        let pipelines = match kind {
            EffectKind::DepthOfField | EffectKind::MotionBlur => {
                // No depth or velocity source to drive these here.
                return Err(EffectBuildError::Unsupported(kind.name()));
            }
            EffectKind::Bloom => PassPipelines::Bloom {
                bright: helpers::make_post_pipeline(
                    &self.device,
                    &self.pl_single,
                    &self.shader,
                    "fs_bright",
                    HDR_FORMAT,
                    None,
                ),
                blur: helpers::make_post_pipeline(
                    &self.device,
                    &self.pl_single,
                    &self.shader,
                    "fs_blur",
                    HDR_FORMAT,
                    None,
                ),
                composite: helpers::make_post_pipeline(
                    &self.device,
                    &self.pl_dual,
                    &self.shader,
                    "fs_composite",
                    HDR_FORMAT,
                    None,
                ),
            },
            EffectKind::ImageProcess => PassPipelines::Simple(helpers::make_post_pipeline(
                &self.device,
                &self.pl_single,
                &self.shader,
                "fs_process",
                HDR_FORMAT,
                None,
            )),
            EffectKind::Sharpen => PassPipelines::Simple(helpers::make_post_pipeline(
                &self.device,
                &self.pl_single,
                &self.shader,
                "fs_sharpen",
                HDR_FORMAT,
                None,
            )),
            EffectKind::FilmGrain => PassPipelines::Simple(helpers::make_post_pipeline(
                &self.device,
                &self.pl_single,
                &self.shader,
                "fs_grain",
                HDR_FORMAT,
                None,
            )),
            EffectKind::ChromaticAberration => PassPipelines::Simple(helpers::make_post_pipeline(
                &self.device,
                &self.pl_single,
                &self.shader,
                "fs_chroma",
                HDR_FORMAT,
                None,
            )),
            EffectKind::Fxaa => PassPipelines::Simple(helpers::make_post_pipeline(
                &self.device,
                &self.pl_single,
                &self.shader,
                "fs_fxaa",
                HDR_FORMAT,
                None,
            )),
        };
        let id = self.next_id;
        self.next_id += 1;
        self.passes.insert(id, PassEntry { kind, pipelines });
        Ok(EffectId(id))
    }

    fn effect_ready(&self, effect: EffectId) -> bool {
        // Pipeline creation is synchronous on this backend.
        self.passes.contains_key(&effect.0)
    }

    fn apply_params(&mut self, _effect: EffectId, params: &EffectParams) {
        match params {
            EffectParams::Bloom(p) => {
                self.uniforms.bloom_weight = p.weight;
                self.uniforms.bloom_threshold = p.threshold;
            }
            EffectParams::ImageProcess(p) => {
                self.uniforms.contrast = p.contrast;
                self.uniforms.exposure = p.exposure;
                self.uniforms.saturation = p.saturation;
                self.uniforms.tint = [p.tint.x, p.tint.y, p.tint.z, 0.0];
                self.uniforms.vignette = [p.vignette_weight, p.vignette_stretch, 0.0, 0.0];
                self.uniforms.vignette_color = [
                    p.vignette_color.x,
                    p.vignette_color.y,
                    p.vignette_color.z,
                    0.0,
                ];
            }
            EffectParams::Sharpen(p) => {
                self.uniforms.sharpen = [p.edge_amount, p.color_amount, 0.0, 0.0];
            }
            EffectParams::FilmGrain(p) => {
                self.uniforms.grain = [p.intensity, if p.animated { 1.0 } else { 0.0 }, 0.0, 0.0];
            }
            EffectParams::ChromaticAberration(p) => {
                self.uniforms.chroma = [p.amount, p.radial_intensity, 0.0, 0.0];
            }
            EffectParams::DepthOfField(_) | EffectParams::MotionBlur(_) | EffectParams::Fxaa => {}
        }
    }

    fn attach_camera(&mut self, _effect: EffectId, camera: CameraId) {
        if !self.cameras.contains(&camera.0) {
            self.cameras.push(camera.0);
        }
    }

    fn dispose_effect(&mut self, effect: EffectId) {
        self.passes.remove(&effect.0);
    }
}
