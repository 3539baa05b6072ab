use std::collections::HashMap;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use log::{debug, warn};
use wgpu::util::DeviceExt;

use super::shader::{PLANE_FRAGMENT_SHADER, PLANE_VERTEX_SHADER};
use crate::backend::{physical_size, RenderBackend, RenderError};
use crate::camera::PerspectiveCamera;
use crate::geometry::{PlaneGeometry, Vertex};
use crate::material::{ShaderMaterial, DISPLACEMENT, LOGO_PRIMARY, LOGO_SECONDARY};
use crate::scene::{GeometryId, Mesh, Scene};
use crate::texture::{Texture, TextureId, TextureImage, TextureState};

/// Material texture uniforms, in binding order after the uniform block.
const TEXTURE_SLOTS: [&str; 3] = [LOGO_PRIMARY, LOGO_SECONDARY, DISPLACEMENT];

/// Samples per pixel when the adapter can multisample and resolve the
/// surface format.
const MSAA_SAMPLES: u32 = 4;

/// Fragment output is premultiplied, matching the preferred composite mode.
const PLANE_BLEND: wgpu::BlendState = wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING;

type SlotKey = Option<(TextureId, u64)>;

/// GPU renderer backed by wgpu that draws the meshes of a [`Scene`].
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    logical_size: (u32, u32),
    pixel_ratio: f64,
    sample_count: u32,
    msaa: Option<MsaaBuffer>,
    depth: DepthBuffer,
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    placeholder: GpuTexture,
    meshes: HashMap<GeometryId, MeshBuffers>,
    textures: HashMap<TextureId, GpuTexture>,
}

impl WgpuBackend {
    /// Creates a device and surface for `target`, sized in logical pixels.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(target)
            .context("failed to create render surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        #[cfg(target_arch = "wasm32")]
        let required_limits = wgpu::Limits::downlevel_webgl2_defaults();
        #[cfg(not(target_arch = "wasm32"))]
        let required_limits = wgpu::Limits::default();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("hover-plane-device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create GPU device")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no texture formats")?;
        let alpha_mode = caps
            .alpha_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::CompositeAlphaMode::PreMultiplied)
            .or_else(|| caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let logical_size = (width.max(1), height.max(1));
        let (physical_width, physical_height) = physical_size(logical_size, 1.0);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: physical_width,
            height: physical_height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let sample_count = pick_sample_count(
            adapter.get_texture_format_features(format).flags,
            adapter.get_texture_format_features(DepthBuffer::FORMAT).flags,
        );
        if sample_count == 1 {
            warn!("{format:?} cannot be multisampled here, rendering without antialiasing");
        }
        let msaa = MsaaBuffer::create(&device, &config, sample_count);
        let depth = DepthBuffer::create(&device, config.width, config.height, sample_count);

        let layout = plane_bind_group_layout(&device);
        let pipeline = plane_pipeline(&device, &layout, format, sample_count);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("plane-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let placeholder = GpuTexture::upload(
            &device,
            &queue,
            &TextureImage {
                width: 1,
                height: 1,
                pixels: vec![0, 0, 0, 0].into(),
            },
            0,
            "placeholder-texture",
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            logical_size,
            pixel_ratio: 1.0,
            sample_count,
            msaa,
            depth,
            pipeline,
            layout,
            sampler,
            placeholder,
            meshes: HashMap::new(),
            textures: HashMap::new(),
        })
    }

    /// Applies the current logical size and pixel ratio to the swap chain.
    pub fn reconfigure(&mut self) {
        let max = self.device.limits().max_texture_dimension_2d;
        let (width, height) = physical_size(self.logical_size, self.pixel_ratio);
        self.config.width = width.min(max);
        self.config.height = height.min(max);
        self.surface.configure(&self.device, &self.config);
        self.msaa = MsaaBuffer::create(&self.device, &self.config, self.sample_count);
        self.depth = DepthBuffer::create(
            &self.device,
            self.config.width,
            self.config.height,
            self.sample_count,
        );
        debug!(
            "surface configured at {}x{} ({}x MSAA)",
            self.config.width, self.config.height, self.sample_count
        );
    }

    /// Surface size in physical pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Samples per pixel of the color and depth attachments.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn prepare_mesh(&mut self, mesh: &Mesh, model: Mat4, view_proj: Mat4) {
        let keys = TEXTURE_SLOTS.map(|slot| {
            mesh.material
                .texture(slot)
                .and_then(|texture| self.sync_texture(texture))
        });

        let device = &self.device;
        let buffers = self
            .meshes
            .entry(mesh.geometry_id())
            .or_insert_with(|| MeshBuffers::from_geometry(device, &mesh.geometry, mesh.geometry_id()));

        if buffers.bind_group.is_none() || buffers.bound != keys {
            let views = keys.map(|key| {
                &key.and_then(|(id, _)| self.textures.get(&id))
                    .unwrap_or(&self.placeholder)
                    .view
            });
            buffers.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("plane-bind-group"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffers.uniform.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&views[0]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&views[1]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&views[2]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            }));
            buffers.bound = keys;
        }

        let uniform = PlaneUniform::new(view_proj, model, &mesh.material);
        self.queue
            .write_buffer(&buffers.uniform, 0, bytemuck::bytes_of(&uniform));
    }

    /// Uploads a texture whose image changed since the last frame. Returns
    /// the key of the GPU copy, or `None` while the image is unavailable.
    fn sync_texture(&mut self, texture: &Texture) -> SlotKey {
        let id = texture.id();
        let version = texture.version();
        if let Some(gpu) = self.textures.get(&id) {
            if gpu.version == version {
                return Some((id, version));
            }
        }
        match texture.state() {
            TextureState::Ready(image) => {
                let label = format!("{id}");
                let gpu = GpuTexture::upload(&self.device, &self.queue, &image, version, &label);
                if let Some(old) = self.textures.insert(id, gpu) {
                    old.texture.destroy();
                }
                debug!("uploaded {id} ({}x{})", image.width, image.height);
                Some((id, version))
            }
            TextureState::Disposed => {
                self.release_texture(id);
                None
            }
            TextureState::Loading | TextureState::Failed(_) => None,
        }
    }

    fn release_texture(&mut self, id: TextureId) {
        if let Some(gpu) = self.textures.remove(&id) {
            gpu.texture.destroy();
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn mount(&mut self) -> Result<(), RenderError> {
        // The surface is bound to its target at creation.
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.logical_size = (width.max(1), height.max(1));
        self.reconfigure();
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            1.0
        };
        self.reconfigure();
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        let view_proj = camera.view_projection();
        let mut draw_list = Vec::new();
        for (_, mesh, model) in scene.meshes() {
            self.prepare_mesh(mesh, model, view_proj);
            draw_list.push(mesh.geometry_id());
        }

        let output = self.surface.get_current_texture().map_err(map_surface_error)?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (target, resolve_target) = match &self.msaa {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("plane-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("plane-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            for geometry in &draw_list {
                let Some(buffers) = self.meshes.get(geometry) else {
                    continue;
                };
                let Some(bind_group) = buffers.bind_group.as_ref() else {
                    continue;
                };
                pass.set_bind_group(0, bind_group, &[]);
                pass.set_vertex_buffer(0, buffers.vertex.slice(..));
                pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..buffers.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn dispose_geometry(&mut self, geometry: GeometryId) {
        match self.meshes.remove(&geometry) {
            Some(buffers) => {
                buffers.vertex.destroy();
                buffers.index.destroy();
                buffers.uniform.destroy();
                debug!("released {geometry}");
            }
            None => warn!("{geometry} was never uploaded"),
        }
    }

    fn dispose_texture(&mut self, texture: &Texture) {
        self.release_texture(texture.id());
    }
}

fn map_surface_error(err: wgpu::SurfaceError) -> RenderError {
    match err {
        wgpu::SurfaceError::Lost => RenderError::SurfaceLost,
        wgpu::SurfaceError::Outdated => RenderError::SurfaceOutdated,
        wgpu::SurfaceError::Timeout => RenderError::Timeout,
        wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
        #[allow(unreachable_patterns)]
        _ => RenderError::SurfaceLost,
    }
}

fn plane_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("plane-bind-layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<PlaneUniform>() as u64
                    ),
                },
                count: None,
            },
            texture_entry(1),
            texture_entry(2),
            texture_entry(3),
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// [`MSAA_SAMPLES`] when both attachments support it and the color format
/// can be resolved, otherwise single-sampled.
fn pick_sample_count(
    color: wgpu::TextureFormatFeatureFlags,
    depth: wgpu::TextureFormatFeatureFlags,
) -> u32 {
    let resolvable = color.contains(wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE);
    if resolvable
        && color.sample_count_supported(MSAA_SAMPLES)
        && depth.sample_count_supported(MSAA_SAMPLES)
    {
        MSAA_SAMPLES
    } else {
        1
    }
}

fn multisample_state(count: u32) -> wgpu::MultisampleState {
    wgpu::MultisampleState {
        count,
        mask: !0,
        alpha_to_coverage_enabled: false,
    }
}

fn plane_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("plane-vertex-shader"),
        source: wgpu::ShaderSource::Wgsl(PLANE_VERTEX_SHADER.into()),
    });
    let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("plane-fragment-shader"),
        source: wgpu::ShaderSource::Wgsl(PLANE_FRAGMENT_SHADER.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("plane-pipeline-layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("plane-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vertex_module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3,
                    1 => Float32x3,
                    2 => Float32x2,
                ],
            }],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: multisample_state(sample_count),
        fragment: Some(wgpu::FragmentState {
            module: &fragment_module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(PLANE_BLEND),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct PlaneUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    params: [f32; 4],
}

impl PlaneUniform {
    fn new(view_proj: Mat4, model: Mat4, material: &ShaderMaterial) -> Self {
        let hover = material
            .float(crate::material::HOVER_STATE)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            params: [hover, 0.0, 0.0, 0.0],
        }
    }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
    uniform: wgpu::Buffer,
    bind_group: Option<wgpu::BindGroup>,
    bound: [SlotKey; 3],
}

impl MeshBuffers {
    fn from_geometry(device: &wgpu::Device, geometry: &PlaneGeometry, id: GeometryId) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{id}-vertices")),
            contents: bytemuck::cast_slice(geometry.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{id}-indices")),
            contents: bytemuck::cast_slice(geometry.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{id}-uniform")),
            size: std::mem::size_of::<PlaneUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            vertex,
            index,
            index_count: geometry.indices().len() as u32,
            uniform,
            bind_group: None,
            bound: [None; 3],
        }
    }
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    version: u64,
}

impl GpuTexture {
    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &TextureImage,
        version: u64,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            version,
        }
    }
}

/// Multisampled color target resolved into the surface texture each frame.
struct MsaaBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MsaaBuffer {
    fn create(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> Option<Self> {
        if sample_count <= 1 {
            return None;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa-color-texture"),
            size: wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Some(Self {
            _texture: texture,
            view,
        })
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32, sample_count: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::HOVER_STATE;

    #[test]
    fn uniform_matches_wgsl_block_size() {
        assert_eq!(std::mem::size_of::<PlaneUniform>(), 144);
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn uniform_clamps_hover_state() {
        let material = ShaderMaterial::new("vs", "fs")
            .with_uniform(HOVER_STATE, crate::material::MaterialProperty::Float(1.4));
        let uniform = PlaneUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, &material);
        assert_eq!(uniform.params[0], 1.0);
        let bare = PlaneUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, &ShaderMaterial::new("vs", "fs"));
        assert_eq!(bare.params[0], 0.0);
    }

    #[test]
    fn antialiasing_uses_four_samples_when_supported() {
        use wgpu::TextureFormatFeatureFlags as Flags;
        let color = Flags::FILTERABLE | Flags::MULTISAMPLE_X4 | Flags::MULTISAMPLE_RESOLVE;
        let depth = Flags::MULTISAMPLE_X4;
        assert_eq!(pick_sample_count(color, depth), 4);
        assert_eq!(multisample_state(4).count, 4);

        assert_eq!(pick_sample_count(Flags::MULTISAMPLE_X4, depth), 1);
        assert_eq!(pick_sample_count(color, Flags::empty()), 1);
        assert_eq!(pick_sample_count(Flags::MULTISAMPLE_X2 | Flags::MULTISAMPLE_RESOLVE, depth), 1);
    }

    #[test]
    fn blending_expects_premultiplied_color() {
        assert_eq!(PLANE_BLEND.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(PLANE_BLEND.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert!(PLANE_FRAGMENT_SHADER.contains("color.rgb * color.a"));
    }

    #[test]
    fn surface_errors_map_to_render_errors() {
        assert!(matches!(
            map_surface_error(wgpu::SurfaceError::Lost),
            RenderError::SurfaceLost
        ));
        assert!(matches!(
            map_surface_error(wgpu::SurfaceError::Outdated),
            RenderError::SurfaceOutdated
        ));
    }
}
