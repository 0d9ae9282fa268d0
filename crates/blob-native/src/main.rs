use std::io::BufRead;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use anyhow::Context as _;
use blob_core::{EngineContext, EngineSettings, KeyCommand, RenderGovernor, Viewport};
use blob_render::ShapeGpu;
use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

fn viewport_for(size: PhysicalSize<u32>, scale: f64) -> Viewport {
    let scale = scale as f32;
    Viewport::new(size.width as f32 / scale, size.height as f32 / scale, scale)
}

/// Forward stdin lines as control messages. One JSON object per line.
fn spawn_control_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn load_context() -> anyhow::Result<EngineContext> {
    let settings = match std::env::args().nth(1) {
        Some(path) => EngineSettings::load(&path).with_context(|| format!("loading {path}"))?,
        None => EngineSettings::default(),
    };
    Ok(EngineContext::new(settings))
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let ctx = load_context()?;
    let event_loop = EventLoop::new().context("event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Mood Blob (native)")
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .build(&event_loop)
            .context("window")?,
    );

    let mut governor = RenderGovernor::from_context(&ctx);
    governor.on_degrade(|n| log::warn!("[governor] {}", n.message));
    governor.on_error(|e| log::error!("[governor] {}", e));
    let viewport = viewport_for(window.inner_size(), window.scale_factor());
    governor.resize(viewport);
    let renderer = pollster::block_on(ShapeGpu::new(Arc::clone(&window), viewport, &ctx));
    if !governor.start(renderer) {
        anyhow::bail!("renderer failed to initialise");
    }

    let controls = spawn_control_reader();
    let mut last = Instant::now();
    log::info!("[native] keys: 1-6 presets, space pause, b glow, m mode");

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Resized(size) => {
                governor.resize(viewport_for(size, window.scale_factor()));
            }
            WindowEvent::CursorMoved { position, .. } => {
                let scale = window.scale_factor();
                governor.set_pointer_screen((position.x / scale) as f32, (position.y / scale) as f32);
            }
            WindowEvent::CursorLeft { .. } => governor.clear_pointer(),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => governor.set_pointer_pressed(state == ElementState::Pressed),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let name = match &logical_key {
                    Key::Named(NamedKey::Escape) => {
                        elwt.exit();
                        return;
                    }
                    Key::Named(NamedKey::Space) => " ",
                    Key::Character(c) => c.as_str(),
                    _ => return,
                };
                if let Some(cmd) = KeyCommand::from_key(name) {
                    cmd.apply(governor.model_mut());
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            for raw in controls.try_iter() {
                let _ = governor.apply_control_json(&raw);
            }
            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f32();
            last = now;
            governor.tick(dt);
            if governor.is_running() {
                window.request_redraw();
            } else {
                elwt.exit();
            }
        }
        Event::LoopExiting => governor.stop(),
        _ => {}
    })?;
    Ok(())
}
