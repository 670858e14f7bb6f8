// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! wgpu backend for the backdrop scene.
//!
//! Node handles carry per-node state (meshes, light parameters); the render
//! targets that bind groups reference (shadow map, reflection target, skybox
//! texture) live on the backend and are created or released alongside the node
//! that owns them. Model and skybox files decode on loader threads; a result
//! arriving after its node was disposed finds the receiver gone and is dropped.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use egui_wgpu::wgpu;
use folio_core::render_config::{RenderConfig, ShadowType, SHADOW_MAP_SIZES};
use folio_core::scene::{
    sun_position, NodeKind, NodeLoad, SceneBackend, SceneError, SceneFrame, SceneHost, SUN_RADIUS,
};
use glam::{Mat4, Vec3};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

use crate::camera::{self, OrbitCamera, FAR, NEAR};
use crate::gpu::Gpu;
use crate::mesh::{self, MeshData, Vertex};

pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const WATER_LEVEL: f32 = 0.0;
const FOG_START: f32 = 80.0;
const FOG_END: f32 = 420.0;

const VERTEX_ATTRS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];
const POSITION_ATTR: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneGlobals {
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    sun_dir: [f32; 4],
    sun_color: [f32; 4],
    water_color: [f32; 4],
    fog: [f32; 4],
    clip_plane: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct LightGlobals {
    light_view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct PostParams {
    vignette: [f32; 4],
    aberration: [f32; 4],
    dof: [f32; 4],
    depth: [f32; 4],
}

pub struct GpuMesh {
    pub vbuf: wgpu::Buffer,
    pub ibuf: wgpu::Buffer,
    pub count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vb")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_ib")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vbuf,
            ibuf,
            count: mesh.indices.len() as u32,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vbuf.slice(..));
        pass.set_index_buffer(self.ibuf.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.count, 0, 0..1);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunState {
    pub direction: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    pub soft: bool,
}

impl SunState {
    fn new(position: Vec3, cfg: &RenderConfig) -> Self {
        Self {
            direction: position,
            color: srgb_to_linear(cfg.sun_color.to_f32()),
            intensity: cfg.directional_light_intensity,
            soft: cfg.shadow_type == ShadowType::Soft,
        }
    }
}

pub struct WaterState {
    pub mesh: GpuMesh,
    pub color: [f32; 3],
    pub fog: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkySource {
    Texture,
    Gradient,
}

pub enum GpuNode {
    Camera(OrbitCamera),
    Ambient { intensity: f32 },
    Sun(SunState),
    Model(GpuMesh),
    Water(WaterState),
    Skybox(SkySource),
}

struct Layouts {
    scene: wgpu::BindGroupLayout,
    shadow: wgpu::BindGroupLayout,
    post: wgpu::BindGroupLayout,
}

struct Pipelines {
    shadow: wgpu::RenderPipeline,
    model: wgpu::RenderPipeline,
    sky: wgpu::RenderPipeline,
    water: wgpu::RenderPipeline,
    post: wgpu::RenderPipeline,
}

struct Bindings {
    main: wgpu::BindGroup,
    reflect: wgpu::BindGroup,
    shadow: wgpu::BindGroup,
    post: wgpu::BindGroup,
}

struct ShadowTarget {
    view: wgpu::TextureView,
    size: u32,
}

struct ReflectionTarget {
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
    size: u32,
}

struct ScreenTargets {
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
}

enum Polled<T> {
    Waiting,
    Done(Result<T, String>),
}

type Load<T> = Receiver<Result<T, String>>;

pub struct GpuScene {
    device: wgpu::Device,
    queue: wgpu::Queue,
    max_tex: u32,
    layouts: Layouts,
    pipelines: Pipelines,
    globals_main: wgpu::Buffer,
    globals_reflect: wgpu::Buffer,
    light_buf: wgpu::Buffer,
    post_buf: wgpu::Buffer,
    linear_sampler: wgpu::Sampler,
    shadow_sampler: wgpu::Sampler,
    blank: wgpu::TextureView,
    screen: ScreenTargets,
    shadow: Option<ShadowTarget>,
    reflection: Option<ReflectionTarget>,
    sky: Option<wgpu::TextureView>,
    bindings: Option<Bindings>,
    asset_dir: PathBuf,
    model_file: Option<String>,
    model_load: Option<Load<MeshData>>,
    sky_file: String,
    sky_load: Option<Load<image::RgbaImage>>,
}

impl GpuScene {
    /// Probe the adapter and build every pipeline. Any failure means the
    /// backdrop cannot run on this machine.
    pub fn new(
        gpu: &Gpu,
        asset_dir: PathBuf,
        model_file: Option<String>,
    ) -> Result<Self, SceneError> {
        let features = gpu.adapter.get_texture_format_features(OFFSCREEN_FORMAT);
        let needed = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        if !features.allowed_usages.contains(needed)
            || !features
                .flags
                .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
        {
            return Err(SceneError::Unsupported(format!(
                "{OFFSCREEN_FORMAT:?} targets unavailable on {}",
                gpu.adapter.get_info().name
            )));
        }

        let device = gpu.device.clone();
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let layouts = create_layouts(&device);
        let pipelines = create_pipelines(&device, &layouts, gpu.config.format);
        let uniform = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let globals_main = uniform("globals_main", std::mem::size_of::<SceneGlobals>());
        let globals_reflect = uniform("globals_reflect", std::mem::size_of::<SceneGlobals>());
        let light_buf = uniform("light_globals", std::mem::size_of::<LightGlobals>());
        let post_buf = uniform("post_params", std::mem::size_of::<PostParams>());

        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..wgpu::SamplerDescriptor::default()
        });
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..wgpu::SamplerDescriptor::default()
        });
        let blank = device
            .create_texture_with_data(
                &gpu.queue,
                &wgpu::TextureDescriptor {
                    label: Some("blank"),
                    size: wgpu::Extent3d {
                        width: 1,
                        height: 1,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                },
                wgpu::util::TextureDataOrder::LayerMajor,
                &[0, 0, 0, 255],
            )
            .create_view(&wgpu::TextureViewDescriptor::default());
        let screen = create_screen_targets(&device, gpu.config.width, gpu.config.height);

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(SceneError::Compile(err.to_string()));
        }
        info!(adapter = %gpu.adapter.get_info().name, "scene pipelines built");

        Ok(Self {
            device,
            queue: gpu.queue.clone(),
            max_tex: gpu.max_tex,
            layouts,
            pipelines,
            globals_main,
            globals_reflect,
            light_buf,
            post_buf,
            linear_sampler,
            shadow_sampler,
            blank,
            screen,
            shadow: None,
            reflection: None,
            sky: None,
            bindings: None,
            asset_dir,
            model_file,
            model_load: None,
            sky_file: String::new(),
            sky_load: None,
        })
    }

    /// Follow the surface size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen = create_screen_targets(&self.device, width, height);
        if self.bindings.is_some() {
            self.rebuild_bindings();
        }
    }

    fn shadow_target(&self, size: u32) -> ShadowTarget {
        let size = clamp_size(size, SHADOW_MAP_SIZES[0], self.max_tex);
        ShadowTarget {
            view: depth_view(&self.device, "shadow_map", size, size, true),
            size,
        }
    }

    fn reflection_target(&self, size: u32) -> ReflectionTarget {
        let size = clamp_size(size, 1, self.max_tex);
        ReflectionTarget {
            color: color_view(&self.device, "reflection_color", size, size),
            depth: depth_view(&self.device, "reflection_depth", size, size, false),
            size,
        }
    }

    fn rebuild_bindings(&mut self) {
        let (Some(shadow), Some(reflection)) = (&self.shadow, &self.reflection) else {
            self.bindings = None;
            return;
        };
        let main = self.scene_group(
            "scene_main_bg",
            &self.globals_main,
            &shadow.view,
            &reflection.color,
        );
        let reflect = self.scene_group(
            "scene_reflect_bg",
            &self.globals_reflect,
            &shadow.view,
            &self.blank,
        );
        let shadow_bg = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bg"),
            layout: &self.layouts.shadow,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: self.light_buf.as_entire_binding(),
            }],
        });
        let post = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("post_bg"),
            layout: &self.layouts.post,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.post_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&self.screen.color),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&self.screen.depth),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.linear_sampler),
                },
            ],
        });
        self.bindings = Some(Bindings {
            main,
            reflect,
            shadow: shadow_bg,
            post,
        });
    }

    fn scene_group(
        &self,
        label: &str,
        globals: &wgpu::Buffer,
        shadow: &wgpu::TextureView,
        reflection: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        let sky = self.sky.as_ref().unwrap_or(&self.blank);
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layouts.scene,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(shadow),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.shadow_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(sky),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.linear_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(reflection),
                },
            ],
        })
    }

    fn create_model(&mut self) -> NodeLoad<GpuNode> {
        let Some(file) = self.model_file.clone() else {
            return NodeLoad::Ready(GpuNode::Model(GpuMesh::upload(
                &self.device,
                "street",
                &mesh::procedural_street(),
            )));
        };
        let polled = match &self.model_load {
            Some(rx) => poll(rx),
            None => {
                let path = self.asset_dir.join(&file);
                debug!(path = %path.display(), "loading model");
                self.model_load = Some(spawn_loader("folio-model", move || {
                    mesh::load_mesh(&path).map_err(|e| format!("{}: {e}", path.display()))
                }));
                return NodeLoad::Pending;
            }
        };
        match polled {
            Polled::Waiting => NodeLoad::Pending,
            Polled::Done(Ok(model)) => {
                self.model_load = None;
                info!(%file, triangles = model.triangle_count(), "model loaded");
                NodeLoad::Ready(GpuNode::Model(GpuMesh::upload(&self.device, "model", &model)))
            }
            Polled::Done(Err(reason)) => {
                self.model_load = None;
                NodeLoad::Fallback {
                    node: GpuNode::Model(GpuMesh::upload(
                        &self.device,
                        "street",
                        &mesh::procedural_street(),
                    )),
                    reason,
                }
            }
        }
    }

    fn create_skybox(&mut self, cfg: &RenderConfig) -> NodeLoad<GpuNode> {
        let polled = match &self.sky_load {
            Some(rx) => poll(rx),
            None => {
                self.start_sky_load(&cfg.skybox);
                return NodeLoad::Pending;
            }
        };
        match polled {
            Polled::Waiting => NodeLoad::Pending,
            Polled::Done(Ok(img)) => {
                self.sky_load = None;
                self.upload_sky(&img);
                NodeLoad::Ready(GpuNode::Skybox(SkySource::Texture))
            }
            Polled::Done(Err(reason)) => {
                self.sky_load = None;
                NodeLoad::Fallback {
                    node: GpuNode::Skybox(SkySource::Gradient),
                    reason,
                }
            }
        }
    }

    /// Start decoding `file`; any load still in flight is abandoned.
    fn start_sky_load(&mut self, file: &str) {
        let path = self.asset_dir.join("skyboxes").join(file);
        debug!(path = %path.display(), "loading skybox");
        self.sky_file = file.to_string();
        self.sky_load = Some(spawn_loader("folio-skybox", move || {
            image::open(&path)
                .map(|img| img.to_rgba8())
                .map_err(|e| format!("{}: {e}", path.display()))
        }));
    }

    fn upload_sky(&mut self, img: &image::RgbaImage) {
        let (w, h) = img.dimensions();
        let resized;
        let img = if w > self.max_tex || h > self.max_tex {
            let scale = self.max_tex as f32 / w.max(h) as f32;
            resized = image::imageops::resize(
                img,
                ((w as f32 * scale) as u32).max(1),
                ((h as f32 * scale) as u32).max(1),
                image::imageops::FilterType::Triangle,
            );
            &resized
        } else {
            img
        };
        let (width, height) = img.dimensions();
        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some("skybox"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            img.as_raw(),
        );
        self.sky = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        info!(file = %self.sky_file, width, height, "skybox uploaded");
    }

    /// Record shadow, reflection, main and composite passes into `encoder`,
    /// finishing on `target`. Returns `false` when the scene cannot draw yet.
    pub fn encode(
        &self,
        host: &SceneHost<Self>,
        cfg: &RenderConfig,
        aspect: f32,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> bool {
        let (Some(bindings), Some(shadow), Some(reflection)) =
            (&self.bindings, &self.shadow, &self.reflection)
        else {
            return false;
        };

        let mut camera = OrbitCamera::default();
        let mut ambient = cfg.ambient_light_intensity;
        let mut sun = SunState::new(
            sun_position(cfg.sun_azimuth, cfg.sun_elevation, SUN_RADIUS),
            cfg,
        );
        let mut model = None;
        let mut water = None;
        let mut textured_sky = false;
        for (_, node) in host.nodes() {
            match node {
                GpuNode::Camera(c) => camera = *c,
                GpuNode::Ambient { intensity } => ambient = *intensity,
                GpuNode::Sun(s) => sun = *s,
                GpuNode::Model(m) => model = Some(m),
                GpuNode::Water(w) => water = Some(w),
                GpuNode::Skybox(source) => {
                    textured_sky = *source == SkySource::Texture && self.sky.is_some();
                }
            }
        }

        let light_view_proj = camera::light_view_proj(sun.direction);
        let water_color = water.map_or([0.0; 3], |w| w.color);
        let water_fog = water.is_some_and(|w| w.fog);
        let globals = |view_proj: Mat4, eye: Vec3, clip_plane: [f32; 4]| SceneGlobals {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            light_view_proj: light_view_proj.to_cols_array_2d(),
            camera_pos: [eye.x, eye.y, eye.z, host.water_time()],
            sun_dir: [sun.direction.x, sun.direction.y, sun.direction.z, sun.intensity],
            sun_color: [sun.color[0], sun.color[1], sun.color[2], ambient],
            water_color: [water_color[0], water_color[1], water_color[2], flag(water_fog)],
            fog: [flag(cfg.fog_enabled), FOG_START, FOG_END, flag(sun.soft)],
            clip_plane,
            params: [1.0 / shadow.size as f32, flag(textured_sky), 0.0, 0.0],
        };
        let eye = camera.eye();
        let mirrored_eye = Vec3::new(eye.x, 2.0 * WATER_LEVEL - eye.y, eye.z);
        self.queue.write_buffer(
            &self.globals_main,
            0,
            bytemuck::bytes_of(&globals(camera.view_proj(aspect), eye, [0.0; 4])),
        );
        self.queue.write_buffer(
            &self.globals_reflect,
            0,
            bytemuck::bytes_of(&globals(
                camera.reflected_view_proj(aspect, WATER_LEVEL),
                mirrored_eye,
                [0.0, 1.0, 0.0, -WATER_LEVEL],
            )),
        );
        self.queue.write_buffer(
            &self.light_buf,
            0,
            bytemuck::bytes_of(&LightGlobals {
                light_view_proj: light_view_proj.to_cols_array_2d(),
            }),
        );
        self.queue
            .write_buffer(&self.post_buf, 0, bytemuck::bytes_of(&post_params(cfg)));

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &shadow.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            if let Some(model) = model {
                pass.set_pipeline(&self.pipelines.shadow);
                pass.set_bind_group(0, &bindings.shadow, &[]);
                model.draw(&mut pass);
            }
        }

        self.scene_pass(
            encoder,
            "reflection_pass",
            (&reflection.color, &reflection.depth),
            &bindings.reflect,
            model,
            None,
        );
        self.scene_pass(
            encoder,
            "main_pass",
            (&self.screen.color, &self.screen.depth),
            &bindings.main,
            model,
            water.map(|w| &w.mesh),
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("post_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.post);
            pass.set_bind_group(0, &bindings.post, &[]);
            pass.draw(0..3, 0..1);
        }
        true
    }

    fn scene_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        (color, depth): (&wgpu::TextureView, &wgpu::TextureView),
        bind_group: &wgpu::BindGroup,
        model: Option<&GpuMesh>,
        water: Option<&GpuMesh>,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_pipeline(&self.pipelines.sky);
        pass.draw(0..3, 0..1);
        if let Some(model) = model {
            pass.set_pipeline(&self.pipelines.model);
            model.draw(&mut pass);
        }
        if let Some(water) = water {
            pass.set_pipeline(&self.pipelines.water);
            water.draw(&mut pass);
        }
    }
}

impl SceneBackend for GpuScene {
    type Node = GpuNode;

    fn create(
        &mut self,
        kind: NodeKind,
        cfg: &RenderConfig,
    ) -> Result<NodeLoad<GpuNode>, SceneError> {
        Ok(match kind {
            NodeKind::Camera => NodeLoad::Ready(GpuNode::Camera(OrbitCamera::default())),
            NodeKind::AmbientLight => NodeLoad::Ready(GpuNode::Ambient {
                intensity: cfg.ambient_light_intensity,
            }),
            NodeKind::SunLight => {
                self.shadow = Some(self.shadow_target(cfg.shadow_map_size));
                NodeLoad::Ready(GpuNode::Sun(SunState::new(
                    sun_position(cfg.sun_azimuth, cfg.sun_elevation, SUN_RADIUS),
                    cfg,
                )))
            }
            NodeKind::Model => self.create_model(),
            NodeKind::Water => {
                self.reflection = Some(self.reflection_target(cfg.water_reflection_size));
                NodeLoad::Ready(GpuNode::Water(WaterState {
                    mesh: GpuMesh::upload(&self.device, "water", &mesh::water_plane()),
                    color: srgb_to_linear(cfg.water_color.to_f32()),
                    fog: cfg.water_fog_enabled,
                }))
            }
            NodeKind::Skybox => self.create_skybox(cfg),
        })
    }

    fn sync(
        &mut self,
        _kind: NodeKind,
        node: &mut GpuNode,
        cfg: &RenderConfig,
        frame: &SceneFrame,
    ) {
        match node {
            GpuNode::Camera(_) | GpuNode::Model(_) => {}
            GpuNode::Ambient { intensity } => *intensity = cfg.ambient_light_intensity,
            GpuNode::Sun(sun) => {
                *sun = SunState::new(frame.sun_position, cfg);
                let wanted = clamp_size(cfg.shadow_map_size, SHADOW_MAP_SIZES[0], self.max_tex);
                if self.shadow.as_ref().map(|s| s.size) != Some(wanted) {
                    debug!(size = wanted, "shadow map resized");
                    self.shadow = Some(self.shadow_target(wanted));
                    self.rebuild_bindings();
                }
            }
            GpuNode::Water(water) => {
                water.color = srgb_to_linear(cfg.water_color.to_f32());
                water.fog = cfg.water_fog_enabled;
                let wanted = clamp_size(cfg.water_reflection_size, 1, self.max_tex);
                if self.reflection.as_ref().map(|r| r.size) != Some(wanted) {
                    debug!(size = wanted, "reflection target resized");
                    self.reflection = Some(self.reflection_target(wanted));
                    self.rebuild_bindings();
                }
            }
            GpuNode::Skybox(_) => {
                if cfg.skybox != self.sky_file {
                    self.start_sky_load(&cfg.skybox);
                }
            }
        }
    }

    fn animate(&mut self, _kind: NodeKind, node: &mut GpuNode, frame: &SceneFrame) {
        match node {
            GpuNode::Camera(camera) => camera.angle = frame.orbit_angle,
            GpuNode::Skybox(source) => {
                let polled = match &self.sky_load {
                    Some(rx) => poll(rx),
                    None => return,
                };
                match polled {
                    Polled::Waiting => {}
                    Polled::Done(Ok(img)) => {
                        self.sky_load = None;
                        self.upload_sky(&img);
                        *source = SkySource::Texture;
                        self.rebuild_bindings();
                    }
                    Polled::Done(Err(reason)) => {
                        self.sky_load = None;
                        warn!(%reason, "skybox swap failed; keeping the current sky");
                    }
                }
            }
            _ => {}
        }
    }

    fn compile(&mut self) -> Result<(), SceneError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.rebuild_bindings();
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(SceneError::Compile(err.to_string()));
        }
        if self.bindings.is_none() {
            return Err(SceneError::Compile(
                "shadow map or reflection target missing".into(),
            ));
        }
        Ok(())
    }

    fn dispose(&mut self, kind: NodeKind, node: GpuNode) {
        match kind {
            NodeKind::SunLight => self.shadow = None,
            NodeKind::Water => self.reflection = None,
            NodeKind::Skybox => {
                self.sky = None;
                self.sky_load = None;
            }
            NodeKind::Model => self.model_load = None,
            NodeKind::Camera | NodeKind::AmbientLight => {}
        }
        self.bindings = None;
        drop(node);
        debug!(?kind, "node disposed");
    }
}

fn poll<T>(rx: &Load<T>) -> Polled<T> {
    match rx.try_recv() {
        Ok(result) => Polled::Done(result),
        Err(TryRecvError::Empty) => Polled::Waiting,
        Err(TryRecvError::Disconnected) => {
            Polled::Done(Err("loader exited without a result".to_string()))
        }
    }
}

fn spawn_loader<T, F>(name: &str, job: F) -> Load<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, String> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawned = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            if tx.send(job()).is_err() {
                debug!("asset finished after its node went away; discarded");
            }
        });
    if let Err(err) = spawned {
        warn!(%err, name, "could not start asset loader");
    }
    rx
}

fn flag(on: bool) -> f32 {
    f32::from(u8::from(on))
}

fn srgb_to_linear(c: [f32; 3]) -> [f32; 3] {
    c.map(|v| v.powf(2.2))
}

fn clamp_size(size: u32, min: u32, max: u32) -> u32 {
    size.clamp(min.min(max), max)
}

fn post_params(cfg: &RenderConfig) -> PostParams {
    PostParams {
        vignette: [
            flag(cfg.vignette_enabled),
            cfg.vignette_offset,
            cfg.vignette_darkness,
            0.0,
        ],
        aberration: [
            flag(cfg.chromatic_aberration_enabled),
            cfg.chromatic_aberration_offset[0],
            cfg.chromatic_aberration_offset[1],
            0.0,
        ],
        dof: [
            flag(cfg.depth_of_field_enabled),
            cfg.dof_focal_length,
            cfg.dof_bokeh_scale,
            0.0,
        ],
        depth: [NEAR, FAR, 0.0, 0.0],
    }
}

fn create_layouts(device: &wgpu::Device) -> Layouts {
    let uniform = |binding, visibility| wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    let texture = |binding, sample_type| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };
    let sampler = |binding, kind| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(kind),
        count: None,
    };
    let color = wgpu::TextureSampleType::Float { filterable: true };

    let scene = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scene_layout"),
        entries: &[
            uniform(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
            texture(1, wgpu::TextureSampleType::Depth),
            sampler(2, wgpu::SamplerBindingType::Comparison),
            texture(3, color),
            sampler(4, wgpu::SamplerBindingType::Filtering),
            texture(5, color),
        ],
    });
    let shadow = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("shadow_layout"),
        entries: &[uniform(0, wgpu::ShaderStages::VERTEX)],
    });
    let post = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("post_layout"),
        entries: &[
            uniform(0, wgpu::ShaderStages::FRAGMENT),
            texture(1, color),
            texture(2, wgpu::TextureSampleType::Depth),
            sampler(3, wgpu::SamplerBindingType::Filtering),
        ],
    });
    Layouts { scene, shadow, post }
}

struct PipelineSpec<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    module: &'a wgpu::ShaderModule,
    vs: &'a str,
    fs: Option<&'a str>,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    color: Option<wgpu::TextureFormat>,
    depth: Option<wgpu::DepthStencilState>,
}

fn build_pipeline(device: &wgpu::Device, spec: PipelineSpec<'_>) -> wgpu::RenderPipeline {
    let targets = [spec.color.map(|format| wgpu::ColorTargetState {
        format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })];
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(spec.layout),
        vertex: wgpu::VertexState {
            module: spec.module,
            entry_point: Some(spec.vs),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: spec.buffers,
        },
        fragment: spec.fs.map(|entry| wgpu::FragmentState {
            module: spec.module,
            entry_point: Some(entry),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &targets,
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..wgpu::PrimitiveState::default()
        },
        depth_stencil: spec.depth,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn create_pipelines(
    device: &wgpu::Device,
    layouts: &Layouts,
    surface_format: wgpu::TextureFormat,
) -> Pipelines {
    let scene_shader = device.create_shader_module(wgpu::include_wgsl!("scene.wgsl"));
    let shadow_shader = device.create_shader_module(wgpu::include_wgsl!("shadow.wgsl"));
    let post_shader = device.create_shader_module(wgpu::include_wgsl!("post.wgsl"));
    let layout = |label: &str, group: &wgpu::BindGroupLayout| {
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[group],
            push_constant_ranges: &[],
        })
    };
    let scene_layout = layout("scene_pipeline_layout", &layouts.scene);
    let shadow_layout = layout("shadow_pipeline_layout", &layouts.shadow);
    let post_layout = layout("post_pipeline_layout", &layouts.post);

    let stride = std::mem::size_of::<Vertex>() as u64;
    let vertices = [wgpu::VertexBufferLayout {
        array_stride: stride,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRS,
    }];
    let positions = [wgpu::VertexBufferLayout {
        array_stride: stride,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &POSITION_ATTR,
    }];

    let shadow = build_pipeline(
        device,
        PipelineSpec {
            label: "shadow_pipeline",
            layout: &shadow_layout,
            module: &shadow_shader,
            vs: "vs_shadow",
            fs: None,
            buffers: &positions,
            color: None,
            depth: Some(wgpu::DepthStencilState {
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
                ..depth_state(true, wgpu::CompareFunction::Less)
            }),
        },
    );
    let model = build_pipeline(
        device,
        PipelineSpec {
            label: "model_pipeline",
            layout: &scene_layout,
            module: &scene_shader,
            vs: "vs_model",
            fs: Some("fs_model"),
            buffers: &vertices,
            color: Some(OFFSCREEN_FORMAT),
            depth: Some(depth_state(true, wgpu::CompareFunction::Less)),
        },
    );
    let sky = build_pipeline(
        device,
        PipelineSpec {
            label: "sky_pipeline",
            layout: &scene_layout,
            module: &scene_shader,
            vs: "vs_sky",
            fs: Some("fs_sky"),
            buffers: &[],
            color: Some(OFFSCREEN_FORMAT),
            depth: Some(depth_state(false, wgpu::CompareFunction::Always)),
        },
    );
    let water = build_pipeline(
        device,
        PipelineSpec {
            label: "water_pipeline",
            layout: &scene_layout,
            module: &scene_shader,
            vs: "vs_water",
            fs: Some("fs_water"),
            buffers: &vertices,
            color: Some(OFFSCREEN_FORMAT),
            depth: Some(depth_state(true, wgpu::CompareFunction::Less)),
        },
    );
    let post = build_pipeline(
        device,
        PipelineSpec {
            label: "post_pipeline",
            layout: &post_layout,
            module: &post_shader,
            vs: "vs_post",
            fs: Some("fs_post"),
            buffers: &[],
            color: Some(surface_format),
            depth: None,
        },
    );
    Pipelines {
        shadow,
        model,
        sky,
        water,
        post,
    }
}

fn create_screen_targets(device: &wgpu::Device, width: u32, height: u32) -> ScreenTargets {
    ScreenTargets {
        color: color_view(device, "scene_color", width, height),
        depth: depth_view(device, "scene_depth", width, height, true),
    }
}

fn color_view(device: &wgpu::Device, label: &str, w: u32, h: u32) -> wgpu::TextureView {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: w.max(1),
            height: h.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OFFSCREEN_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    tex.create_view(&wgpu::TextureViewDescriptor::default())
}

fn depth_view(
    device: &wgpu::Device,
    label: &str,
    w: u32,
    h: u32,
    sampled: bool,
) -> wgpu::TextureView {
    let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
    if sampled {
        usage |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: w.max(1),
            height: h.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage,
        view_formats: &[],
    });
    tex.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn uniform_blocks_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<SceneGlobals>(), 3 * 64 + 7 * 16);
        assert_eq!(std::mem::size_of::<PostParams>(), 4 * 16);
        assert_eq!(std::mem::size_of::<Vertex>(), 36);
    }

    #[test]
    fn post_params_follow_config() {
        let cfg = RenderConfig {
            vignette_enabled: false,
            dof_focal_length: 12.0,
            ..RenderConfig::default()
        };
        let p = post_params(&cfg);
        assert_relative_eq!(p.vignette[0], 0.0);
        assert_relative_eq!(p.aberration[0], 1.0);
        assert_relative_eq!(p.dof[1], 12.0);
        assert_relative_eq!(p.depth[1], FAR);
    }

    #[test]
    fn target_sizes_respect_device_limits() {
        assert_eq!(clamp_size(4096, 512, 2048), 2048);
        assert_eq!(clamp_size(64, 512, 8192), 512);
        assert_eq!(clamp_size(256, 1, 8192), 256);
    }

    #[test]
    fn late_loads_are_discarded_quietly() {
        let rx = spawn_loader("test-loader", || Ok::<_, String>(7_u32));
        drop(rx);
        let rx = spawn_loader("test-loader", || Err::<u32, _>("boom".to_string()));
        let result = loop {
            if let Polled::Done(r) = poll(&rx) {
                break r;
            }
            std::thread::yield_now();
        };
        assert_eq!(result, Err("boom".to_string()));
    }
}
