use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use eyeball::app::{
    build_binder, parameter_summary, write_cpu_render, DEFAULT_ENVIRONMENT, DEFAULT_SOUNDS,
};
use eyeball::{
    load_environment_or_fallback, EnvironmentMap, Eyeball, InputState, KeyCode, LogBackend,
    NamedKey, PanelCommand, ParameterBinder, Renderer, SoundManager, TuningPanel,
    WindowViewport,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let binder = build_binder(options.preset.as_deref())?;

    if options.dump_preset {
        print!("{}", binder.parameters().to_preset_xml());
        return Ok(());
    }

    if let Some(path) = &options.cpu_render {
        let environment = load_environment_or_fallback(&options.env);
        write_cpu_render(path, binder.parameters(), &environment, options.size)?;
        println!(
            "Wrote {size}x{size} render to {}",
            path.display(),
            size = options.size
        );
        return Ok(());
    }

    if options.summary_only {
        return run_headless(&binder);
    }

    let fallback = binder.clone();
    match run_interactive(&options, binder) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                run_headless(&fallback)
            } else {
                Err(err)
            }
        }
    }
}

fn run_headless(binder: &ParameterBinder) -> Result<()> {
    print!("{}", parameter_summary(binder.parameters()));
    Ok(())
}

fn run_interactive(options: &CliOptions, binder: ParameterBinder) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let environment = load_environment_or_fallback(&options.env);
    let sounds = SoundManager::load(&options.sounds, Box::new(LogBackend));
    let mut app = AppState::new(binder, environment, sounds);

    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    app.shutdown();

    if let Some(err) = app.last_error {
        return Err(err);
    }

    Ok(())
}

struct AppState {
    eyeball: Eyeball,
    viewport: Arc<WindowViewport>,
    environment: EnvironmentMap,
    renderer: Option<Renderer>,
    input: InputState,
    panel: TuningPanel,
    last_frame: Option<Instant>,
    last_error: Option<anyhow::Error>,
}

impl AppState {
    fn new(binder: ParameterBinder, environment: EnvironmentMap, sounds: SoundManager) -> Self {
        let viewport = Arc::new(WindowViewport::new(WINDOW_WIDTH as u32, WINDOW_HEIGHT as u32));
        let eyeball = Eyeball::new(binder, sounds, viewport.clone());
        Self {
            eyeball,
            viewport,
            environment,
            renderer: None,
            input: InputState::new(),
            panel: TuningPanel::new(),
            last_frame: None,
            last_error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.last_error = Some(err);
        event_loop.exit();
    }

    fn handle_keyboard(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let Some(key) = map_key(event) else {
            return;
        };
        match event.state {
            ElementState::Pressed => self.input.set_key_down(key),
            ElementState::Released => {
                self.input.set_key_up(key);
                return;
            }
        }

        if key == KeyCode::Named(NamedKey::Escape) {
            event_loop.exit();
            return;
        }
        let Some(command) = PanelCommand::from_key(key, self.input.shift_held()) else {
            return;
        };
        if let Err(err) = self.panel.handle(command, self.eyeball.binder_mut()) {
            warn!("tuning panel edit rejected: {err}");
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: MouseButton) {
        if state != ElementState::Pressed || button != MouseButton::Left {
            return;
        }
        if let Some(position) = self.input.pointer() {
            self.eyeball.on_click(position);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_frame = Some(now);

        self.eyeball.frame(dt);

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        renderer.update_globals(&self.eyeball.camera().params(), &self.eyeball.transform());
        renderer.update_parameters(self.eyeball.binder_mut());
        let Err(err) = renderer.render() else {
            return;
        };
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                let size = renderer.window().inner_size();
                renderer.resize(size);
            }
            wgpu::SurfaceError::OutOfMemory => {
                self.fail(event_loop, anyhow!("GPU is out of memory"));
            }
            wgpu::SurfaceError::Timeout => {
                info!("Surface timeout; retrying next frame");
            }
            other => {
                warn!("skipping frame: {other}");
            }
        }
    }

    fn shutdown(&mut self) {
        self.renderer = None;
        info!("eyeball viewer closed");
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title("Eyeball")
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.fail(event_loop, WindowInitError::from_error("window", err).into());
                return;
            }
        };

        let size = window.inner_size();
        self.viewport.update(size.width, size.height);

        match block_on(Renderer::new(
            Arc::clone(&window),
            &self.environment,
            self.eyeball.binder_mut(),
        )) {
            Ok(renderer) => {
                window.request_redraw();
                self.renderer = Some(renderer);
            }
            Err(err) => self.fail(event_loop, err.context("failed to initialise renderer")),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self
            .renderer
            .as_ref()
            .is_some_and(|renderer| renderer.window_id() != window_id)
        {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
                self.viewport.update(size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_keyboard(event_loop, &event);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(state, button);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.input.set_pointer(position);
                self.eyeball.on_pointer_move(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.input.clear_pointer();
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.as_ref() {
            renderer.window().request_redraw();
        }
    }
}

const WINDOW_WIDTH: f64 = 1280.0;
const WINDOW_HEIGHT: f64 = 720.0;

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

fn map_key(event: &KeyEvent) -> Option<KeyCode> {
    use winit::keyboard::{Key, KeyLocation, NamedKey as Named};
    Some(match &event.logical_key {
        Key::Named(Named::Tab) => KeyCode::Named(NamedKey::Tab),
        Key::Named(Named::ArrowUp) => KeyCode::Named(NamedKey::Up),
        Key::Named(Named::ArrowDown) => KeyCode::Named(NamedKey::Down),
        Key::Named(Named::Escape) => KeyCode::Named(NamedKey::Escape),
        Key::Named(Named::Shift) if event.location == KeyLocation::Right => {
            KeyCode::Named(NamedKey::RightShift)
        }
        Key::Named(Named::Shift) => KeyCode::Named(NamedKey::LeftShift),
        Key::Character(text) => return KeyCode::from_name(text.as_str()),
        _ => return None,
    })
}

struct CliOptions {
    env: PathBuf,
    sounds: PathBuf,
    preset: Option<PathBuf>,
    summary_only: bool,
    cpu_render: Option<PathBuf>,
    size: u32,
    dump_preset: bool,
}

const USAGE: &str = "Usage: eyeball [--env <image>] [--sounds <dir>] [--preset <file.xml>] \
[--summary-only] [--cpu-render <out.png>] [--size <px>] [--dump-preset]";

impl CliOptions {
    fn parse() -> Result<Self> {
        Self::parse_from(env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            env: PathBuf::from(DEFAULT_ENVIRONMENT),
            sounds: PathBuf::from(DEFAULT_SOUNDS),
            preset: None,
            summary_only: false,
            cpu_render: None,
            size: 512,
            dump_preset: false,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
            };
            match arg.as_str() {
                "--env" => options.env = value("--env")?.into(),
                "--sounds" => options.sounds = value("--sounds")?.into(),
                "--preset" => options.preset = Some(value("--preset")?.into()),
                "--cpu-render" => options.cpu_render = Some(value("--cpu-render")?.into()),
                "--size" => {
                    let text = value("--size")?;
                    options.size = text
                        .parse::<u32>()
                        .ok()
                        .filter(|size| (1..=4096).contains(size))
                        .ok_or_else(|| anyhow!("--size expects 1-4096 pixels, got {text}"))?;
                }
                "--summary-only" => options.summary_only = true,
                "--dump-preset" => options.dump_preset = true,
                "--help" | "-h" => return Err(anyhow!(USAGE)),
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(options)
    }
}
