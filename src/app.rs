use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::{
    gfx::{
        camera::{CameraUniform, FlyCamera},
        render_engine::RenderEngine,
        scene::Model,
    },
    physics::{PhysicsConfig, PhysicsWorld, RigidBodyHandle, StepReport},
    simulation::{DeformableBody, FrameClock, GpuUpload, SoftBodySync, SyncError, VertexUpload},
};

/// Window, renderer and physics settings for [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: wgpu::Color,
    pub vsync: bool,
    pub physics: PhysicsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Tessera".to_string(),
            width: 1600,
            height: 920,
            clear_color: wgpu::Color::WHITE,
            vsync: false,
            physics: PhysicsConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_clear_color(mut self, clear_color: wgpu::Color) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }
}

struct SoftBinding {
    model: usize,
    sync: SoftBodySync,
    body: Box<dyn DeformableBody>,
}

/// Everything the frame loop advances: the physics world, the loaded
/// models and the bindings between them.
pub struct SceneState {
    physics: PhysicsWorld,
    models: Vec<Model>,
    rigid_bindings: Vec<(usize, RigidBodyHandle)>,
    soft_bindings: Vec<SoftBinding>,
}

impl SceneState {
    pub fn new(physics: PhysicsWorld) -> Self {
        Self {
            physics,
            models: Vec::new(),
            rigid_bindings: Vec::new(),
            soft_bindings: Vec::new(),
        }
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    /// Adds a model and returns its index.
    pub fn add_model(&mut self, model: Model) -> usize {
        self.models.push(model);
        self.models.len() - 1
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model_mut(&mut self, index: usize) -> Option<&mut Model> {
        self.models.get_mut(index)
    }

    /// Drives model `model`'s transform from a rigid body's pose.
    pub fn bind_rigid_body(&mut self, model: usize, body: RigidBodyHandle) {
        self.rigid_bindings.push((model, body));
    }

    /// Wires a deformable body to a model loaded with a flattened buffer.
    ///
    /// The body's positions are taken as world space, so the model's
    /// transforms are reset to identity.
    pub fn bind_deformable_body(
        &mut self,
        model: usize,
        body: Box<dyn DeformableBody>,
    ) -> Result<(), SyncError> {
        let target = self
            .models
            .get_mut(model)
            .ok_or(SyncError::UnknownModel(model))?;
        let sync = SoftBodySync::new(target)?;
        target.reset_transforms();
        self.soft_bindings.push(SoftBinding { model, sync, body });
        Ok(())
    }

    /// Steps physics by a measured frame delta, then pulls rigid poses into
    /// model transforms and deformed positions into vertex buffers.
    pub fn advance(&mut self, frame_dt: f32, upload: &mut impl VertexUpload) -> StepReport {
        let report = self.physics.step(frame_dt);

        for &(model, body) in &self.rigid_bindings {
            match (self.models.get_mut(model), self.physics.body_transform(body)) {
                (Some(model), Some(transform)) => model.set_transform(transform),
                _ => log::trace!("Stale rigid binding for model {}", model),
            }
        }

        for binding in &mut self.soft_bindings {
            binding.body.update(&self.physics);
            let Some(model) = self.models.get_mut(binding.model) else {
                continue;
            };
            if let Err(err) = binding.sync.apply(model, binding.body.as_ref(), upload) {
                log::error!("Soft body sync failed for model {}: {}", binding.model, err);
            }
        }

        report
    }

    /// Releases the physics world.
    pub fn free(self) {
        self.physics.free();
    }
}

/// Windowed engine: owns one physics world and runs the frame loop.
pub struct Engine {
    event_loop: Option<EventLoop<()>>,
    state: EngineState,
}

struct EngineState {
    config: EngineConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    camera: FlyCamera,
    camera_uniform: CameraUniform,
    clock: FrameClock,
    scene: SceneState,
    error: Option<anyhow::Error>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        let physics =
            PhysicsWorld::init(config.physics.clone()).context("Failed to initialize physics")?;

        let mut camera = FlyCamera::default();
        camera.set_aspect(config.width, config.height);

        Ok(Self {
            event_loop: Some(event_loop),
            state: EngineState {
                config,
                window: None,
                render_engine: None,
                camera,
                camera_uniform: CameraUniform::default(),
                clock: FrameClock::new(),
                scene: SceneState::new(physics),
                error: None,
            },
        })
    }

    pub fn scene(&self) -> &SceneState {
        &self.state.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneState {
        &mut self.state.scene
    }

    pub fn camera_mut(&mut self) -> &mut FlyCamera {
        &mut self.state.camera
    }

    /// Runs the frame loop until the window closes, then frees the physics world.
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.state)
            .context("Failed to run event loop")?;

        let EngineState {
            scene,
            render_engine,
            window,
            error,
            ..
        } = self.state;
        drop(render_engine);
        drop(window);
        scene.free();

        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl EngineState {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("Failed to create window")?,
        );

        let (width, height) = window.inner_size().into();
        let renderer = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            self.config.vsync,
            self.config.clear_color,
        ))?;

        for model in &mut self.scene.models {
            model.init_gpu_resources(renderer.device(), renderer.mesh_layout());
        }
        self.camera.set_aspect(width, height);

        self.window = Some(window);
        self.render_engine = Some(renderer);
        self.clock.reset();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{:#}", err);
        self.error = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        let dt = self.clock.tick();
        self.scene
            .advance(dt, &mut GpuUpload::new(render_engine.queue()));

        for model in &self.scene.models {
            model.update_uniforms(render_engine.queue());
        }
        self.camera_uniform.update(&self.camera);
        render_engine.update_camera(self.camera_uniform);

        match render_engine.render_frame(&self.scene.models) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_engine.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow::anyhow!("Surface out of memory"));
            }
            Err(err) => log::warn!("Dropped frame: {}", err),
        }
    }
}

impl ApplicationHandler for EngineState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_graphics(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                self.camera.set_aspect(width, height);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
