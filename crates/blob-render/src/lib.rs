//! wgpu backend for the blob: an instanced point cloud drawn into an HDR
//! target, then resolved to the surface with or without bloom.

mod helpers;
mod post;
mod targets;
pub mod uniforms;

use anyhow::Context as _;
use blob_core::{
    BloomSettings, Camera, CameraSettings, EngineContext, FrameSnapshot, RenderError, ShapeElements,
    ShapeRenderer, Viewport,
};
use helpers::HDR_FORMAT;
use post::{PostBindGroups, PostResources};
use targets::RenderTargets;
use uniforms::{InstanceData, ShapeUniforms, QUAD_CORNERS};
use wgpu::util::DeviceExt;

pub static SHAPE_WGSL: &str = include_str!("../shaders/shape.wgsl");
pub static POST_WGSL: &str = include_str!("../shaders/post.wgsl");

pub struct ShapeGpu<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    shape_pipeline: wgpu::RenderPipeline,
    shape_uniforms: wgpu::Buffer,
    shape_bind_group: wgpu::BindGroup,
    quad_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    capacity: u32,

    targets: RenderTargets,
    post: PostResources,
    post_groups: PostBindGroups,

    camera_settings: CameraSettings,
    bloom: BloomSettings,
    clear_color: wgpu::Color,
    released: bool,
}

impl<'w> ShapeGpu<'w> {
    /// Create the device, surface and every pipeline. Failures come back as
    /// `RenderError::Init` so the governor never enters its loop.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'w>>,
        viewport: Viewport,
        ctx: &EngineContext,
    ) -> Result<Self, RenderError> {
        Self::init(target.into(), viewport, ctx)
            .await
            .map_err(|e| RenderError::Init(format!("{e:#}")))
    }

    async fn init(
        target: wgpu::SurfaceTarget<'w>,
        viewport: Viewport,
        ctx: &EngineContext,
    ) -> anyhow::Result<Self> {
        let (width, height) = viewport.physical_size();
        let settings = &ctx.settings;

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(target).context("create surface")?;
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
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .context("request device")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("[render] surface {width}x{height} {format:?}");

        let shape_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shape_shader"),
            source: wgpu::ShaderSource::Wgsl(SHAPE_WGSL.into()),
        });
        let shape_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shape_bgl"),
            entries: &[helpers::uniform_layout_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let shape_pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shape_pl"),
            bind_group_layouts: &[&shape_bgl],
            push_constant_ranges: &[],
        });
        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };
        let shape_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shape_pipeline"),
            layout: Some(&shape_pl),
            vertex: wgpu::VertexState {
                module: &shape_shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![1 => Float32x3, 2 => Float32x3],
                    },
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shape_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(additive),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });
        let shape_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shape_uniforms"),
            size: std::mem::size_of::<ShapeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let shape_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shape_bg"),
            layout: &shape_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shape_uniforms.as_entire_binding(),
            }],
        });
        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_corners"),
            contents: bytemuck::cast_slice(&QUAD_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Generated once at the full budget; lower tiers draw a prefix.
        let capacity = settings.governor.full_elements;
        let elements = ShapeElements::generate(capacity as usize, settings.shape.radius, settings.shape.seed);
        let instances = uniforms::pack_instances(&elements);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shape_instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let post_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(POST_WGSL.into()),
        });
        let post = post::create_post_resources(&device, &post_shader, format);
        let targets = RenderTargets::new(&device, width, height);
        let post_groups = post.bind_groups(&device, &targets);
        post.write_uniforms(&queue, &settings.bloom, targets.bloom_size());

        Ok(Self {
            surface,
            device,
            queue,
            config,
            shape_pipeline,
            shape_uniforms,
            shape_bind_group,
            quad_buffer,
            instance_buffer,
            capacity,
            targets,
            post,
            post_groups,
            camera_settings: settings.camera,
            bloom: settings.bloom,
            clear_color: uniforms::clear_color(settings.shape.background),
            released: false,
        })
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn resize_if_needed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width == self.config.width && height == self.config.height {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.targets.destroy();
        self.targets = RenderTargets::new(&self.device, width, height);
        self.post_groups = self.post.bind_groups(&self.device, &self.targets);
        self.post
            .write_uniforms(&self.queue, &self.bloom, self.targets.bloom_size());
        log::debug!("[render] resized to {width}x{height}");
    }

    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, RenderError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("[render] surface lost; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => Ok(None),
            Err(e) => Err(RenderError::Frame(e.to_string())),
        }
    }
}

impl ShapeRenderer for ShapeGpu<'_> {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::Frame("renderer already released".into()));
        }
        let Some(surface_frame) = self.acquire()? else {
            return Ok(());
        };
        let view = surface_frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let camera = Camera::new(&self.camera_settings, &frame.viewport);
        let u = ShapeUniforms::new(frame, &camera, self.surface_size());
        self.queue
            .write_buffer(&self.shape_uniforms, 0, bytemuck::bytes_of(&u));
        let count = frame.element_count.min(self.capacity);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shape_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.hdr_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&self.shape_pipeline);
            rpass.set_bind_group(0, &self.shape_bind_group, &[]);
            rpass.set_vertex_buffer(0, self.quad_buffer.slice(..));
            rpass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            rpass.draw(0..QUAD_CORNERS.len() as u32, 0..count);
        }
        self.post.resolve(
            &mut encoder,
            &self.post_groups,
            &self.targets,
            &view,
            self.clear_color,
            frame.glow_enabled,
        );

        self.queue.submit(Some(encoder.finish()));
        surface_frame.present();
        Ok(())
    }

    fn resize(&mut self, viewport: &Viewport) {
        let (w, h) = viewport.physical_size();
        self.resize_if_needed(w, h);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.instance_buffer.destroy();
        self.quad_buffer.destroy();
        self.shape_uniforms.destroy();
        self.targets.destroy();
        self.post.destroy();
        log::info!("[render] GPU resources released");
    }
}
