// Flocking driver with INSTANCED rendering
// Draws the whole flock in a single draw call; the quadtree/steering
// diagnostics are layered on top through egui (F3/F4/F5).
// The simulation core lives in the library and never touches this file's
// wgpu/winit/egui plumbing.

mod app;

use std::sync::Arc;

use glam::{Mat4, Vec2};
use murmuration::sim::{SimConfig, Simulation};
use rand::Rng;
use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, MouseButton, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use app::input::InputState;
use app::overlay::{BoidDebugDraw, DebugOverlay, DebugStats};

// ============================================================================
// VERTEX DEFINITION
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 2],
}

impl Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

// ============================================================================
// INSTANCE DATA (per-boid)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    position: [f32; 2],
    rotation: f32,
    _padding: f32, // Align color to 16 bytes
    color: [f32; 4],
}

impl InstanceData {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance, // One per boid, not per vertex
            attributes: &[
                // Position (location 1)
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // Rotation (location 2)
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
                // Color (location 3)
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

// Arrow sprite: nose on +x, tail notch at the origin. 12 world units long,
// 8 wide.
const BOID_HEIGHT: f32 = 12.0;
const BOID_WIDTH: f32 = 8.0;

const BOID_VERTICES: &[Vertex] = &[
    Vertex {
        position: [2.0 * BOID_HEIGHT / 3.0, 0.0],
    },
    Vertex {
        position: [-BOID_HEIGHT / 3.0, -BOID_WIDTH / 2.0],
    },
    Vertex {
        position: [0.0, 0.0],
    },
    Vertex {
        position: [-BOID_HEIGHT / 3.0, BOID_WIDTH / 2.0],
    },
];

// Fan triangulation of the convex sprite.
const BOID_INDICES: &[u16] = &[0, 1, 2, 0, 2, 3];

// Initial and click-spawn speeds, in world units per second.
const INITIAL_SPEED: f32 = 20.0;
const SPAWN_SPEED: f32 = 50.0;

// ============================================================================
// UNIFORM DATA (world projection)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

impl Uniforms {
    fn for_world(world_extent: Vec2) -> Self {
        // y-down orthographic projection over the whole world rectangle.
        let view_proj = Mat4::orthographic_rh(0.0, world_extent.x, world_extent.y, 0.0, -1.0, 1.0);
        Self {
            view_proj: view_proj.to_cols_array_2d(),
        }
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    num_indices: u32,
    max_instances: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    // Simulation
    simulation: Simulation,
    colors: Vec<[f32; 3]>,
    last_update: std::time::Instant,

    // Diagnostics
    overlay: DebugOverlay,
    input: InputState,
    show_stats: bool,
    show_boid_debug: bool,
    show_quadtree: bool,
    fps: u32,
    frame_count: u32,
    frame_ms_sum: f32,
    frame_ms_min: f32,
    frame_ms_max: f32,
    frame_ms_avg: f32,
    last_fps_update: std::time::Instant,
}

impl State {
    async fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Boid Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_boids.wgsl").into()),
        });

        let sim_config = SimConfig::default();
        let uniforms = Uniforms::for_world(sim_config.world_extent());

        use wgpu::util::DeviceExt;

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc(), InstanceData::desc()], // Vertex + Instance buffers
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // flat sprites, keep both windings
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(BOID_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(BOID_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        // Create instance buffer (headroom for click-spawned boids)
        let max_instances = 10000;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (max_instances * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let num_indices = BOID_INDICES.len() as u32;

        // Seed the flock
        let mut simulation = Simulation::new(sim_config, sim_config.default_rules());
        let mut colors = Vec::new();
        spawn_initial_flock(&mut simulation, &mut colors, sim_config.boid_count);

        let overlay = DebugOverlay::new(&window, &device, surface_format);
        let input = InputState::new((size.width, size.height));

        Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            num_indices,
            max_instances,
            uniform_buffer,
            uniform_bind_group,
            simulation,
            colors,
            last_update: std::time::Instant::now(),
            overlay,
            input,
            show_stats: false,
            show_boid_debug: false,
            show_quadtree: false,
            fps: 0,
            frame_count: 0,
            frame_ms_sum: 0.0,
            frame_ms_min: f32::MAX,
            frame_ms_max: 0.0,
            frame_ms_avg: 0.0,
            last_fps_update: std::time::Instant::now(),
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn update(&mut self) {
        let now = std::time::Instant::now();
        let dt = (now - self.last_update).as_secs_f32();
        self.last_update = now;

        self.simulation.tick(dt);

        // Frame statistics for the overlay and the once-per-second log line.
        let frame_ms = dt * 1000.0;
        self.frame_count += 1;
        self.frame_ms_sum += frame_ms;
        self.frame_ms_min = self.frame_ms_min.min(frame_ms);
        self.frame_ms_max = self.frame_ms_max.max(frame_ms);

        if (now - self.last_fps_update).as_secs_f32() >= 1.0 {
            self.fps = self.frame_count;
            self.frame_ms_avg = self.frame_ms_sum / self.frame_count.max(1) as f32;
            log::info!(
                "fps {} | frame {:.2} ms (min {:.1} | max {:.1}) | boids {}",
                self.fps,
                self.frame_ms_avg,
                self.frame_ms_min,
                self.frame_ms_max,
                self.simulation.boids().len()
            );
            self.frame_count = 0;
            self.frame_ms_sum = 0.0;
            self.frame_ms_min = f32::MAX;
            self.frame_ms_max = 0.0;
            self.last_fps_update = now;
        }
    }

    /// Spawn one boid at the cursor with a random heading. Called from the
    /// event loop, between ticks.
    fn spawn_at_cursor(&mut self) {
        let world_extent = self.simulation.config().world_extent();
        let position = self.input.mouse_world(world_extent);
        let mut rng = rand::thread_rng();
        let velocity = random_direction(&mut rng) * SPAWN_SPEED;
        let id = self.simulation.spawn(position, velocity);
        self.colors.push(random_color(&mut rng));
        log::debug!(
            "spawned boid #{id} at ({:.0}, {:.0})",
            position.x,
            position.y
        );
    }

    /// Project a world position into egui screen points.
    fn world_to_points(&self, position: Vec2) -> egui::Pos2 {
        let scale = self.points_per_world_unit();
        egui::pos2(position.x * scale.x, position.y * scale.y)
    }

    fn points_per_world_unit(&self) -> Vec2 {
        let world_extent = self.simulation.config().world_extent();
        let ppp = self.window.scale_factor() as f32;
        Vec2::new(
            self.size.width as f32 / ppp / world_extent.x,
            self.size.height as f32 / ppp / world_extent.y,
        )
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Collect instance data from the flock BEFORE creating the render pass
        let mut instance_data = Vec::with_capacity(self.simulation.boids().len());
        for (boid, color) in self.simulation.boids().iter().zip(&self.colors) {
            instance_data.push(InstanceData {
                position: boid.position().to_array(),
                rotation: boid.heading_degrees().to_radians(),
                _padding: 0.0,
                color: [color[0], color[1], color[2], 1.0],
            });
        }

        let instance_count = instance_data.len().min(self.max_instances);

        if !instance_data.is_empty() {
            self.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&instance_data[..instance_count]),
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.92,
                            g: 0.90,
                            b: 0.88,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            // ONE DRAW CALL for the whole flock
            render_pass.draw_indexed(0..self.num_indices, 0, 0..instance_count as u32);
        }

        // Diagnostic overlay on top of the flock
        let stats = DebugStats {
            fps: self.fps,
            frame_time_avg_ms: self.frame_ms_avg,
            frame_time_min_ms: if self.frame_ms_min == f32::MAX {
                0.0
            } else {
                self.frame_ms_min
            },
            frame_time_max_ms: self.frame_ms_max,
            boid_count: self.simulation.boids().len(),
            draw_calls: 1,
            resolution: (self.size.width, self.size.height),
        };

        let boid_draws: Vec<BoidDebugDraw> = if self.show_boid_debug {
            let scale = self.points_per_world_unit();
            let separation = self.simulation.config().separation_threshold;
            self.simulation
                .boids()
                .iter()
                .zip(self.simulation.resultant_forces())
                .map(|(boid, force)| BoidDebugDraw {
                    pos: self.world_to_points(boid.position()),
                    vel_tip: self.world_to_points(boid.position() + boid.velocity()),
                    force_tip: self
                        .world_to_points(boid.position() + *force * 0.5 * boid.perception()),
                    perception_px: boid.perception() * scale.x,
                    separation_px: separation * scale.x,
                })
                .collect()
        } else {
            Vec::new()
        };

        let leaf_rects: Vec<egui::Rect> = if self.show_quadtree {
            self.simulation
                .leaf_bounds()
                .iter()
                .map(|bounds| {
                    egui::Rect::from_min_max(
                        self.world_to_points(bounds.min),
                        self.world_to_points(bounds.max),
                    )
                })
                .collect()
        } else {
            Vec::new()
        };

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.size.width, self.size.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        self.overlay.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            self.show_stats.then_some(&stats),
            self.show_boid_debug.then_some(boid_draws.as_slice()),
            self.show_quadtree.then_some(leaf_rects.as_slice()),
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

// ============================================================================
// FLOCK SPAWNING
// ============================================================================

fn random_direction(rng: &mut impl Rng) -> Vec2 {
    murmuration::sim::vec_ops::normalise(Vec2::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    ))
}

fn random_color(rng: &mut impl Rng) -> [f32; 3] {
    [
        rng.gen_range(0.2..0.9),
        rng.gen_range(0.2..0.9),
        rng.gen_range(0.2..0.9),
    ]
}

fn spawn_initial_flock(simulation: &mut Simulation, colors: &mut Vec<[f32; 3]>, count: usize) {
    let mut rng = rand::thread_rng();
    let world_extent = simulation.config().world_extent();

    for _ in 0..count {
        let position = Vec2::new(
            rng.gen_range(0.0..world_extent.x),
            rng.gen_range(0.0..world_extent.y),
        );
        let velocity = random_direction(&mut rng) * INITIAL_SPEED;
        simulation.spawn(position, velocity);
        colors.push(random_color(&mut rng));
    }

    log::info!("spawned {count} boids");
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();

    let window_attributes = Window::default_attributes()
        .with_title("murmuration (F3 stats | F4 boid debug | F5 quadtree)")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

    let mut state = pollster::block_on(State::new(window.clone()));

    event_loop
        .run(move |event, control_flow| {
            match event {
                WinitEvent::WindowEvent {
                    ref event,
                    window_id,
                } if window_id == window.id() => {
                    let response = state.overlay.handle_window_event(&window, event);
                    state.input.process_event(event);

                    match event {
                        WindowEvent::CloseRequested
                        | WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    state: ElementState::Pressed,
                                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                                    ..
                                },
                            ..
                        } => control_flow.exit(),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    state: ElementState::Pressed,
                                    physical_key: PhysicalKey::Code(key),
                                    repeat: false,
                                    ..
                                },
                            ..
                        } => match key {
                            KeyCode::F3 => state.show_stats = !state.show_stats,
                            KeyCode::F4 => state.show_boid_debug = !state.show_boid_debug,
                            KeyCode::F5 => state.show_quadtree = !state.show_quadtree,
                            _ => {}
                        },
                        WindowEvent::MouseInput {
                            state: ElementState::Pressed,
                            button: MouseButton::Left,
                            ..
                        } => {
                            if !response.consumed {
                                state.spawn_at_cursor();
                            }
                        }
                        WindowEvent::Resized(physical_size) => {
                            state.resize(*physical_size);
                        }
                        WindowEvent::RedrawRequested => {
                            state.update();
                            match state.render() {
                                Ok(_) => {}
                                Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                                Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                                Err(e) => log::error!("render error: {e:?}"),
                            }
                        }
                        _ => {}
                    }
                }
                WinitEvent::AboutToWait => {
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .unwrap();
}
