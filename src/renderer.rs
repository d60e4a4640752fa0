use crate::camera::{FollowCamera, Projection};
use crate::game::GameState;
use crate::model::{DrawMesh, InstanceBatch, InstanceRaw, Mesh, MeshData, Vertex};
use crate::world::{ObjectKind, WorldObject};
use glam::{Mat4, Quat, Vec3};
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// Emissive tint for a highlighted object.
fn glow(object: &WorldObject) -> Vec3 {
    if !object.highlighted {
        return Vec3::ZERO;
    }
    match object.kind {
        ObjectKind::GrassBunch => Vec3::new(0.0, 0.6, 0.0),
        ObjectKind::Cube => Vec3::new(0.5, 0.35, 0.0),
    }
}
const GRASS_SWAY: f32 = 0.12;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    sun_dir: [f32; 4],
    sky_light: [f32; 4],
    ground_light: [f32; 4],
    ambient: [f32; 4],
}

impl Globals {
    fn new(sun: Vec3, exposure: f32) -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            sun_dir: sun.extend(0.0).to_array(),
            // warm hemisphere light, 0xffe5b4 over 0xffad60
            sky_light: [1.0, 0.898, 0.706, 1.0],
            ground_light: [1.0, 0.678, 0.376, 1.0],
            ambient: [0.25, 0.25, 0.25, exposure],
        }
    }

    fn update_view_proj(&mut self, camera: &FollowCamera, projection: &Projection) {
        self.view_proj = (projection.build_projection_matrix() * camera.build_view_matrix()).to_cols_array_2d();
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    time: f32,
    sway: f32,
    _pad: [f32; 2],
}

/// A material whose `time` uniform advances every frame. Registered by the
/// code that creates it instead of being discovered by walking the scene.
struct AnimatedMaterial {
    uniform: MaterialUniform,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl AnimatedMaterial {
    fn advance(&mut self, queue: &wgpu::Queue, dt: f32) {
        self.uniform.time += dt;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    solid_pipeline: wgpu::RenderPipeline,
    grass_pipeline: wgpu::RenderPipeline,
    projection: Projection,
    globals: Globals,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    animated_materials: Vec<AnimatedMaterial>,
    grass_material: usize,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    clear_color: wgpu::Color,
    terrain_mesh: Mesh,
    terrain_instances: InstanceBatch,
    grass_mesh: Mesh,
    grass_instances: InstanceBatch,
    cube_mesh: Mesh,
    cube_instances: InstanceBatch,
    avatar_mesh: Mesh,
    avatar_instances: InstanceBatch,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, game: &GameState) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor { ..Default::default() });
        let surface = instance.create_surface(window)?;
        let adapter = instance.request_adapter(&wgpu::RequestAdapterOptions::default()).await?;
        let (device, queue) = adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Device"),
            ..Default::default()
        },).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps.formats.iter().copied().find(|f| f.is_srgb()).unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_config = &game.config().camera;
        let projection = Projection::new(
            config.width,
            config.height,
            camera_config.fovy_degrees,
            camera_config.znear,
            camera_config.zfar,
        );
        let sky = game.sky();
        let mut globals = Globals::new(sky.sun, sky.exposure);
        globals.update_view_proj(game.camera(), &projection);

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Buffer"),
            contents: bytemuck::cast_slice(&[globals]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX_FRAGMENT)],
            label: Some("globals_bind_group_layout"),
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
            label: Some("globals_bind_group"),
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX)],
            label: Some("material_bind_group_layout"),
        });

        let (depth_texture, depth_view) = create_depth(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let solid_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Solid Pipeline Layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });
        let grass_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Grass Pipeline Layout"),
            bind_group_layouts: &[&globals_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let solid_pipeline = create_pipeline(&device, &solid_layout, &shader, "vs_main", config.format, "Solid Pipeline");
        let grass_pipeline = create_pipeline(&device, &grass_layout, &shader, "vs_grass", config.format, "Grass Pipeline");

        let terrain_mesh = Mesh::upload(&device, "Terrain", &MeshData::terrain(game.terrain()));
        let mut terrain_instances = InstanceBatch::new(&device, "Terrain Instances", 1);
        terrain_instances.write(&device, &queue, &[InstanceRaw::new(Mat4::IDENTITY, Vec3::ZERO)]);

        let grass_mesh = Mesh::upload(&device, "Grass", &MeshData::grass_bunch());
        let grass_instances = InstanceBatch::new(&device, "Grass Instances", game.terrain().grass_bunches().len());
        let cube_mesh = Mesh::upload(&device, "Cube", &MeshData::cuboid(Vec3::ZERO, Vec3::ONE, [0.85, 0.3, 0.25]));
        let cube_instances = InstanceBatch::new(&device, "Cube Instances", game.cubes().map_or(1, |c| c.len()));
        let avatar_mesh = Mesh::upload(&device, "Avatar", &MeshData::avatar_placeholder(game.avatar().half_extents));
        let avatar_instances = InstanceBatch::new(&device, "Avatar Instances", 1);

        let clear = sky.clear_color();
        let mut renderer = Self {
            surface,
            device,
            queue,
            config,
            size,
            solid_pipeline,
            grass_pipeline,
            projection,
            globals,
            globals_buffer,
            globals_bind_group,
            material_layout,
            animated_materials: Vec::new(),
            grass_material: 0,
            depth_texture,
            depth_view,
            clear_color: wgpu::Color { r: clear[0], g: clear[1], b: clear[2], a: 1.0 },
            terrain_mesh,
            terrain_instances,
            grass_mesh,
            grass_instances,
            cube_mesh,
            cube_instances,
            avatar_mesh,
            avatar_instances,
        };
        renderer.grass_material = renderer.register_animated_material("grass_material", GRASS_SWAY);
        log::info!("renderer ready: {}x{} {:?}", renderer.config.width, renderer.config.height, surface_format);
        Ok(renderer)
    }

    fn register_animated_material(&mut self, label: &str, sway: f32) -> usize {
        let uniform = MaterialUniform { time: 0.0, sway, _pad: [0.0; 2] };
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });
        self.animated_materials.push(AnimatedMaterial { uniform, buffer, bind_group });
        self.animated_materials.len() - 1
    }

    pub fn set_avatar_mesh(&mut self, data: &MeshData) {
        self.avatar_mesh = Mesh::upload(&self.device, "Avatar", data);
        log::debug!("avatar mesh uploaded: {} indices", self.avatar_mesh.num_indices);
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.projection.resize(new_size.width, new_size.height);

            let (depth_texture, depth_view) = create_depth(&self.device, &self.config);
            self.depth_texture = depth_texture;
            self.depth_view = depth_view;
        }
    }

    pub fn update(&mut self, game: &GameState, dt: f32) {
        self.globals.update_view_proj(game.camera(), &self.projection);
        self.queue.write_buffer(&self.globals_buffer, 0, bytemuck::cast_slice(&[self.globals]));

        for material in &mut self.animated_materials {
            material.advance(&self.queue, dt);
        }

        let grass: Vec<InstanceRaw> = game
            .terrain()
            .grass_bunches()
            .iter()
            .map(|b| InstanceRaw::new(Mat4::from_translation(b.position), glow(b)))
            .collect();
        self.grass_instances.write(&self.device, &self.queue, &grass);

        let cubes: Vec<InstanceRaw> = game
            .cubes()
            .map(|cubes| {
                cubes
                    .iter()
                    .map(|c| {
                        let model = Mat4::from_scale_rotation_translation(c.half_extents, c.rotation, c.position);
                        InstanceRaw::new(model, glow(c))
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.cube_instances.write(&self.device, &self.queue, &cubes);

        let avatar = game.avatar();
        let bob = game.animator().map_or(0.0, |a| a.bob());
        let model = Mat4::from_rotation_translation(
            Quat::from_rotation_y(avatar.yaw),
            avatar.position + Vec3::new(0.0, bob, 0.0),
        );
        self.avatar_instances
            .write(&self.device, &self.queue, &[InstanceRaw::new(model, Vec3::ZERO)]);
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(&self.solid_pipeline);
            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
            render_pass.draw_mesh(&self.terrain_mesh, &self.terrain_instances);
            render_pass.draw_mesh(&self.cube_mesh, &self.cube_instances);
            render_pass.draw_mesh(&self.avatar_mesh, &self.avatar_instances);

            render_pass.set_pipeline(&self.grass_pipeline);
            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
            render_pass.set_bind_group(1, &self.animated_materials[self.grass_material].bind_group, &[]);
            render_pass.draw_mesh(&self.grass_mesh, &self.grass_instances);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn uniform_entry(visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_depth(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d { width: config.width, height: config.height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    vertex_entry: &str,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vertex_entry),
            buffers: &[Vertex::desc(), InstanceRaw::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
