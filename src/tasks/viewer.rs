//! UI-owning thread: winit event loop, wgpu presentation, user input.
//!
//! All drawing happens here. Background loops hand work over through the
//! surface port (bridged into the event-loop proxy); this thread swaps the
//! displayed tile set atomically, so the collage always changes as a
//! whole.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use fontdb::{Database, Family, Query};
use image::{Rgba, RgbaImage, imageops};
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wgpu::SurfaceError;
use wgpu::util::DeviceExt;
use wgpu_glyph::ab_glyph::{FontArc, FontVec};
use wgpu_glyph::{GlyphBrush, GlyphBrushBuilder, HorizontalAlign, Layout, Section, Text, VerticalAlign};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::config::Configuration;
use crate::events::{CollageFrame, CollageUpdate, ComposerCommand, FrameEvent};
use crate::surface::DisplayState;

const WINDOW_TITLE: &str = "Dynamic Image Collage";
const PLACEHOLDER_TEXT: &str = "No images found";

#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct Vertex {
    position: [f32; 2],
    uv: [f32; 2],
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

// Fullscreen quad as a triangle strip.
const QUAD: [Vertex; 4] = [
    Vertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
    Vertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    Vertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    Vertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
];

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    bind_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    vertex_buffer: wgpu::Buffer,
    canvas_bind: Option<wgpu::BindGroup>,
    glyph_brush: Option<GlyphBrush<()>>,
    staging_belt: wgpu::util::StagingBelt,
}

struct ViewerApp {
    cfg: Configuration,
    cancel: CancellationToken,
    shared: Arc<DisplayState>,
    to_composer: Sender<ComposerCommand>,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    // The displayed frame stays owned here until its replacement is fully
    // composited and uploaded; releasing it earlier would blank the screen
    // mid-swap.
    displayed: Option<CollageFrame>,
    show_placeholder: bool,
    status: String,
    catalog_count: usize,
    compose_after: Option<Instant>,
    pending_redraw: bool,
}

impl ViewerApp {
    fn new(
        cfg: Configuration,
        cancel: CancellationToken,
        shared: Arc<DisplayState>,
        to_composer: Sender<ComposerCommand>,
    ) -> Self {
        Self {
            cfg,
            cancel,
            shared,
            to_composer,
            window: None,
            gpu: None,
            displayed: None,
            show_placeholder: false,
            status: "No directory selected".to_string(),
            catalog_count: 0,
            compose_after: None,
            pending_redraw: false,
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Option<Arc<Window>> {
        if let Some(window) = self.window.as_ref() {
            return Some(window.clone());
        }
        let attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1200.0, 800.0));
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                self.window = Some(window.clone());
                Some(window)
            }
            Err(err) => {
                error!(error = %err, "failed to create viewer window");
                None
            }
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<()> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to acquire GPU adapter")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|fmt| fmt.is_srgb())
            .unwrap_or(caps.formats[0]);

        let limits = adapter.limits();
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("collage-device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        }))
        .context("failed to acquire GPU device")?;

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        info!(
            width = config.width,
            height = config.height,
            format = ?config.format,
            "collage surface configured",
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("collage-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/collage.wgsl").into()),
        });

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("collage-bind-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("collage-pipeline-layout"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("collage-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("collage-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("collage-quad"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let glyph_brush = match load_ui_font() {
            Some(font) => Some(GlyphBrushBuilder::using_font(font).build(&device, format)),
            None => {
                warn!("no usable system font found; text overlays disabled");
                None
            }
        };

        self.shared.set_viewport(config.width, config.height);
        self.gpu = Some(Gpu {
            surface,
            device,
            queue,
            config,
            pipeline,
            bind_layout,
            sampler,
            vertex_buffer,
            canvas_bind: None,
            glyph_brush,
            staging_belt: wgpu::util::StagingBelt::new(1024),
        });
        Ok(())
    }

    fn handle_resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        gpu.config.width = new_size.width.max(1);
        gpu.config.height = new_size.height.max(1);
        gpu.surface.configure(&gpu.device, &gpu.config);
        self.shared.set_viewport(gpu.config.width, gpu.config.height);
        debug!(
            width = gpu.config.width,
            height = gpu.config.height,
            "collage surface resized",
        );

        // Re-compose after the resize settles, but only while rotating.
        if self.shared.rotation_active() {
            self.compose_after = Some(Instant::now() + self.cfg.resize_debounce);
        }
        self.request_redraw();
    }

    /// Apply a finished pass: composite the tiles onto a canvas, upload
    /// one texture, then swap. The previous frame is released only after
    /// the new bind group is in place.
    fn apply_update(&mut self, update: CollageUpdate) {
        match update {
            CollageUpdate::Grid(frame) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    let canvas = composite(&frame);
                    gpu.canvas_bind = Some(upload_canvas(gpu, &canvas));
                }
                self.show_placeholder = false;
                self.displayed = Some(frame);
            }
            CollageUpdate::Empty => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.canvas_bind = None;
                }
                self.show_placeholder = true;
                self.displayed = None;
            }
        }
        self.request_redraw();
    }

    fn apply_status(&mut self, text: String, count: usize) {
        self.catalog_count = count;
        if let Some(window) = self.window.as_ref() {
            window.set_title(&format!("{WINDOW_TITLE} — {text}"));
        }
        self.status = text;
        self.request_redraw();
    }

    fn toggle_rotation(&mut self) {
        if self.shared.rotation_active() {
            self.shared.set_rotation_active(false);
            info!("rotation stopped");
            return;
        }
        if self.catalog_count == 0 {
            // Empty-catalog warning: no state change.
            warn!("rotation start refused: catalog is empty");
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Warning)
                .set_title(WINDOW_TITLE)
                .set_description("Please select a directory with images first!")
                .show();
            return;
        }
        self.shared.set_rotation_active(true);
        info!("rotation started");
        self.request_compose();
    }

    fn pick_directory(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Select Image Directory")
            .pick_folder();
        match picked {
            Some(dir) => self.select_directory(dir),
            None => debug!("directory selection cancelled"),
        }
    }

    fn select_directory(&mut self, dir: PathBuf) {
        info!(directory = %dir.display(), "directory selected");
        self.send_command(ComposerCommand::SetDirectory(dir));
    }

    fn request_compose(&mut self) {
        self.send_command(ComposerCommand::Compose);
    }

    fn send_command(&mut self, cmd: ComposerCommand) {
        if let Err(err) = self.to_composer.try_send(cmd) {
            warn!(error = %err, "composer command dropped");
        }
    }

    fn request_redraw(&mut self) {
        self.pending_redraw = true;
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn draw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Outdated) | Err(SurfaceError::Lost) => {
                info!("collage surface lost; reconfiguring");
                let size = window.inner_size();
                gpu.config.width = size.width.max(1);
                gpu.config.height = size.height.max(1);
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("collage surface out of memory; exiting event loop");
                event_loop.exit();
                return;
            }
            Err(SurfaceError::Timeout) => {
                warn!("collage surface acquisition timed out");
                return;
            }
            Err(SurfaceError::Other) => {
                warn!("collage surface reported an unknown error; retrying");
                return;
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("collage-encoder"),
            });

        self.pending_redraw = false;

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("collage-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some(bind) = gpu.canvas_bind.as_ref() {
                rpass.set_pipeline(&gpu.pipeline);
                rpass.set_bind_group(0, bind, &[]);
                rpass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                rpass.draw(0..QUAD.len() as u32, 0..1);
            }
        }

        let (w, h) = (gpu.config.width, gpu.config.height);
        if let Some(brush) = gpu.glyph_brush.as_mut() {
            if self.show_placeholder {
                brush.queue(Section {
                    screen_position: (w as f32 / 2.0, h as f32 / 2.0),
                    bounds: (w as f32, h as f32),
                    text: vec![Text::new(PLACEHOLDER_TEXT)
                        .with_scale(48.0)
                        .with_color([1.0, 1.0, 1.0, 1.0])],
                    layout: Layout::default()
                        .h_align(HorizontalAlign::Center)
                        .v_align(VerticalAlign::Center),
                });
            }
            brush.queue(Section {
                screen_position: (12.0, h as f32 - 32.0),
                bounds: (w as f32 - 24.0, 28.0),
                text: vec![Text::new(&self.status)
                    .with_scale(20.0)
                    .with_color([1.0, 1.0, 1.0, 0.85])],
                ..Section::default()
            });
            if let Err(err) = brush.draw_queued(
                &gpu.device,
                &mut gpu.staging_belt,
                &mut encoder,
                &view,
                w,
                h,
            ) {
                warn!(error = %err, "text overlay draw failed");
            }
        }

        gpu.staging_belt.finish();
        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        gpu.staging_belt.recall();
    }
}

impl ApplicationHandler<FrameEvent> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            event_loop.exit();
            return;
        }
        let Some(window) = self.ensure_window(event_loop) else {
            event_loop.exit();
            return;
        };
        if self.gpu.is_none() {
            if let Err(err) = self.init_gpu(window) {
                error!(error = ?err, "failed to initialize GPU state");
                event_loop.exit();
                return;
            }
        }
        self.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("viewer window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
            }
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let size = window.inner_size();
                let _ = inner_size_writer.request_inner_size(size);
                self.handle_resize(size);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Space) => self.toggle_rotation(),
                    PhysicalKey::Code(KeyCode::KeyO) => self.pick_directory(),
                    PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                self.draw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(when) = self.compose_after {
            if Instant::now() >= when {
                self.compose_after = None;
                self.request_compose();
                event_loop.set_control_flow(ControlFlow::Wait);
            } else {
                event_loop.set_control_flow(ControlFlow::WaitUntil(when));
            }
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
        if self.pending_redraw {
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FrameEvent) {
        match event {
            FrameEvent::Collage(update) => self.apply_update(update),
            FrameEvent::Status { text, count } => self.apply_status(text, count),
            FrameEvent::Cancelled => {
                info!("viewer received cancellation event");
                event_loop.exit();
            }
        }
    }
}

/// Run the windowed viewer on the calling (main) thread; returns when the
/// window closes or cancellation is delivered.
pub fn run_windowed(
    event_loop: EventLoop<FrameEvent>,
    cfg: Configuration,
    cancel: CancellationToken,
    shared: Arc<DisplayState>,
    to_composer: Sender<ComposerCommand>,
) -> Result<()> {
    let mut app = ViewerApp::new(cfg, cancel, shared, to_composer);
    event_loop
        .run_app(&mut app)
        .context("viewer event loop failed")
}

/// Blit every tile of the frame onto a viewport-sized black canvas. Cells
/// with no tile (render failures, unused grid slots) stay black.
fn composite(frame: &CollageFrame) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(
        frame.viewport.width.max(1),
        frame.viewport.height.max(1),
        Rgba([0, 0, 0, 255]),
    );
    for placed in &frame.tiles {
        imageops::replace(
            &mut canvas,
            &placed.tile.pixels,
            i64::from(placed.x),
            i64::from(placed.y),
        );
    }
    canvas
}

fn upload_canvas(gpu: &Gpu, canvas: &RgbaImage) -> wgpu::BindGroup {
    let (w, h) = canvas.dimensions();
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("collage-canvas"),
        size: wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    gpu.queue.write_texture(
        texture.as_image_copy(),
        canvas.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("collage-canvas-bind"),
        layout: &gpu.bind_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&gpu.sampler),
            },
        ],
    })
}

fn load_ui_font() -> Option<FontArc> {
    let mut db = Database::new();
    db.load_system_fonts();
    let id = db.query(&Query {
        families: &[Family::SansSerif],
        ..Query::default()
    })?;
    db.with_face_data(id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index)
            .ok()
            .map(FontArc::new)
    })?
}
