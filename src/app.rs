//! Window and event loop driving the [`ShadowRenderer`].

use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::error::RunError;
use crate::gpu::GpuContext;
use crate::renderer::{FrameStatus, RendererConfig, ShadowRenderer};
use crate::scene::SceneConfig;
use crate::shadow_map::ShadowSettings;

/// Configuration for the app window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Redraw rate. The animation advances by `1 / target_fps` per frame.
    pub target_fps: f32,
    pub renderer: RendererConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Umbra".to_string(),
            width: 1280,
            height: 720,
            target_fps: 60.0,
            renderer: RendererConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Non-positive rates fall back to 60.
    pub fn target_fps(mut self, fps: f32) -> Self {
        self.target_fps = if fps > 0.0 { fps } else { 60.0 };
        self
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.renderer.clear_color = color;
        self
    }

    pub fn scene(mut self, scene: SceneConfig) -> Self {
        self.renderer.scene = scene;
        self
    }

    pub fn shadow(mut self, shadow: ShadowSettings) -> Self {
        self.renderer.shadow = shadow;
        self
    }

    /// Paint the raw shadow test instead of shaded colors.
    pub fn visualize_shadow_test(mut self, enabled: bool) -> Self {
        self.renderer.visualize_shadow_test = enabled;
        self
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.target_fps)
    }
}

/// Opens a window and renders the shadow scene until it is closed.
///
/// Returns an error if the window, the GPU context or the renderer cannot be
/// created, or if the surface becomes unrecoverable.
///
/// # Example
/// ```no_run
/// umbra::run(umbra::AppConfig::new().title("Shadows").size(1280, 720))?;
/// # Ok::<(), umbra::RunError>(())
/// ```
pub fn run(config: AppConfig) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = UmbraApp {
        state: AppState::Pending,
        config,
        failure: None,
    };
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

enum AppState {
    Pending,
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        renderer: ShadowRenderer,
        next_frame: Instant,
    },
}

struct UmbraApp {
    state: AppState,
    config: AppConfig,
    failure: Option<RunError>,
}

impl UmbraApp {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), RunError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.width,
                self.config.height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let renderer = ShadowRenderer::new(&gpu, self.config.renderer)?;

        window.request_redraw();
        self.state = AppState::Running {
            window,
            gpu,
            renderer,
            next_frame: Instant::now(),
        };
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RunError) {
        log::error!("{error}");
        self.failure = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for UmbraApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let AppState::Pending = self.state {
            if let Err(error) = self.start(event_loop) {
                self.fail(event_loop, error);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let dt = 1.0 / self.config.target_fps;
        let AppState::Running {
            gpu,
            renderer,
            next_frame,
            ..
        } = &mut self.state
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Err(e) = gpu.resize(size.width, size.height) {
                    self.fail(event_loop, RunError::Resize(e));
                    return;
                }
                renderer.resize(gpu, size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                *next_frame = Instant::now() + self.config.frame_interval();
                if renderer.render(gpu, dt) == FrameStatus::Fatal {
                    self.fail(event_loop, RunError::SurfaceUnrecoverable);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Running {
            window, next_frame, ..
        } = &self.state
        else {
            return;
        };

        if Instant::now() >= *next_frame {
            window.request_redraw();
        } else {
            event_loop.set_control_flow(ControlFlow::WaitUntil(*next_frame));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_window_and_renderer_options() {
        let config = AppConfig::new()
            .title("Test")
            .size(640, 480)
            .target_fps(30.0)
            .visualize_shadow_test(true)
            .shadow(ShadowSettings::default().resolution(2048));

        assert_eq!(config.title, "Test");
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(
            config.frame_interval(),
            Duration::from_secs_f32(1.0 / 30.0)
        );
        assert!(config.renderer.visualize_shadow_test);
        assert_eq!(config.renderer.shadow.resolution, 2048);
    }

    #[test]
    fn invalid_frame_rate_falls_back() {
        assert_eq!(AppConfig::new().target_fps(0.0).target_fps, 60.0);
        assert_eq!(AppConfig::new().target_fps(f32::NAN).target_fps, 60.0);
    }
}
