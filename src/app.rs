use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{CursorGrabMode, Window, WindowAttributes, WindowId},
};

use crate::config::AppConfig;
use crate::error::StagelightError;
use crate::frame::{FrameOrchestrator, FrameTiming};
use crate::gfx::{scene::Scene, RenderEngine};
use crate::input::InputState;

/// Window, event loop and frame pacing for one run of the stage
pub struct StagelightApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

struct AppState {
    config: AppConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    orchestrator: FrameOrchestrator,
    input: InputState,
    started: Instant,
    last_frame: Instant,
    init_error: Option<StagelightError>,
}

impl StagelightApp {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new()?;
        let orchestrator = FrameOrchestrator::new(Scene::new(&config));
        let now = Instant::now();

        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                orchestrator,
                input: InputState::new(),
                started: now,
                last_frame: now,
                init_error: None,
            },
        })
    }

    /// Runs until the window closes, Escape is pressed or start-up fails
    pub fn run(mut self) -> anyhow::Result<()> {
        self.event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop.run_app(&mut self.app_state)?;

        match self.app_state.init_error.take() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

/// Builds the app from `config` and runs it to completion
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    StagelightApp::new(config)?.run()
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
    if let Err(err) = grabbed {
        log::warn!("Could not grab the cursor: {err}");
    }
    window.set_cursor_visible(false);
}

impl AppState {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> crate::error::Result<()> {
        let window = event_loop.create_window(
            WindowAttributes::default()
                .with_title("Stagelight")
                .with_inner_size(PhysicalSize::new(self.config.width, self.config.height)),
        )?;
        let window = Arc::new(window);
        grab_cursor(&window);

        let object_count = self.orchestrator.scene().object_transforms().len();
        let renderer = pollster::block_on(RenderEngine::new(window.clone(), &self.config, object_count))?;

        self.orchestrator
            .set_supported_render_modes(renderer.supported_render_modes());
        let (width, height) = renderer.surface_size();
        self.orchestrator.resize(width, height);

        self.window = Some(window);
        self.render_engine = Some(renderer);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        let now = Instant::now();
        let timing = FrameTiming {
            delta: now.duration_since(self.last_frame).as_secs_f32(),
            elapsed: now.duration_since(self.started).as_secs_f32(),
        };
        self.last_frame = now;

        let frame = self.orchestrator.advance(&self.input, timing);
        self.input.end_frame();

        if frame.quit_requested {
            log::info!("Quit requested after {} frames", frame.frame_index + 1);
            event_loop.exit();
            return;
        }

        render_engine.render_frame(&frame);
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.init_error.is_some() {
            return;
        }

        if let Err(error) = self.init(event_loop) {
            log::error!("Initialization failed: {error}");
            self.init_error = Some(error);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key, state, ..
                },
                ..
            } => {
                self.input.process_key(physical_key, state);
            }
            WindowEvent::Focused(focused) => {
                if !focused {
                    self.input.reset();
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if width > 0 && height > 0 {
                    self.orchestrator.resize(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input.add_mouse_delta(dx, dy);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
