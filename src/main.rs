use anyhow::Result;
use ash::vk;
use log::{error, info};
use vkcube::{
    config::CONFIG_FILE, AppConfig, GraphicsContext, Mesh, MeshKind, Renderer, SelectionPolicy,
};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalSize, Size},
    event::{KeyEvent, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{Key, NamedKey},
    raw_window_handle::HasDisplayHandle,
    window::{Window, WindowAttributes},
};

struct AppInit {
    mesh: Option<Mesh>,
    renderer: Renderer,
    // Must drop after the renderer and the mesh.
    _context: GraphicsContext,
    window: Window,
}

impl Drop for AppInit {
    fn drop(&mut self) {
        if let Err(err) = self.renderer.wait_idle() {
            error!("Failed to wait for the device: {err}");
        }
        if let Some(mesh) = self.mesh.as_mut() {
            mesh.destroy();
        }
    }
}

impl AppInit {
    fn new(event_loop: &winit::event_loop::ActiveEventLoop, config: &AppConfig) -> Result<Self> {
        let window_attributes = WindowAttributes::default()
            .with_title(&config.window.title)
            .with_inner_size(Size::Physical(PhysicalSize::new(
                config.window.width,
                config.window.height,
            )))
            .with_resizable(false);
        let window = event_loop.create_window(window_attributes)?;

        let policy = SelectionPolicy::default();
        let context = GraphicsContext::new(
            &config.renderer.app_name,
            Some(window.display_handle()?.as_raw()),
            config.renderer.validation,
            &policy,
            &config.limits,
        )?;

        let PhysicalSize { width, height } = window.inner_size();
        let mut renderer = Renderer::new(
            &context,
            &window,
            vk::Extent2D { width, height },
            &config.renderer,
            &policy,
            &config.limits,
        )?;

        let mut mesh = match config.renderer.mesh {
            MeshKind::None => None,
            MeshKind::Triangle => Some(Mesh::create_triangle(context.device())?),
            MeshKind::Cube => Some(Mesh::create_cube(context.device())?),
        };
        if let Err(err) = renderer.setup_command_buffers(mesh.as_ref()) {
            if let Some(mesh) = mesh.as_mut() {
                mesh.destroy();
            }
            return Err(err.into());
        }

        Ok(Self {
            mesh,
            renderer,
            _context: context,
            window,
        })
    }

    fn draw_frame(&mut self) -> vkcube::Result<()> {
        self.renderer.render()?;
        self.renderer.present()
    }
}

impl ApplicationHandler for AppInit {
    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.draw_frame() {
                    error!("Frame {} failed", self.renderer.frame_clock().current());
                    panic!("error: {e}\n");
                }
                self.window.request_redraw();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        info!(
            "Exiting after {} frames",
            self.renderer.frame_clock().current()
        );
    }

    fn resumed(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        panic!("On native platforms `resumed` can be called only once.")
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load_or_default(CONFIG_FILE)?;

    let event_loop = winit::event_loop::EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

struct App {
    config: AppConfig,
    inner: AppEnum,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            inner: AppEnum::Uninitialized,
        }
    }
}

#[derive(Default)]
enum AppEnum {
    #[default]
    Uninitialized,
    Init(AppInit),
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        match self.inner {
            AppEnum::Uninitialized => {
                let app =
                    AppInit::new(event_loop, &self.config).expect("Failed to create application");
                app.window.request_redraw();
                self.inner = AppEnum::Init(app);
            }
            AppEnum::Init(_) => {}
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if let AppEnum::Init(app) = &mut self.inner {
            app.window_event(event_loop, window_id, event);
        }
    }

    fn exiting(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if let AppEnum::Init(app) = &mut self.inner {
            app.exiting(event_loop)
        }
        self.inner = AppEnum::Uninitialized;
    }
}
