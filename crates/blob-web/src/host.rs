//! wasm-bindgen surface: module start, `startBlob` and the JS handle.

use crate::pending::Pending;
use crate::{dom, events, frame};
use blob_core::{ControlMessage, EngineContext, EngineSettings, LoopStatus, RenderGovernor};
use blob_render::ShapeGpu;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

pub(crate) type SharedGovernor = Rc<RefCell<RenderGovernor<ShapeGpu<'static>>>>;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("blob-web loaded");
    Ok(())
}

/// Handle returned to JavaScript once the blob is running.
#[wasm_bindgen]
pub struct BlobHandle {
    governor: SharedGovernor,
    pending: Rc<Pending>,
}

#[wasm_bindgen]
impl BlobHandle {
    /// Apply one JSON control message. Returns false when it was rejected.
    /// A message sent from inside a frame callback is applied as soon as
    /// that frame returns.
    #[wasm_bindgen(js_name = applyControl)]
    pub fn apply_control(&self, json: &str) -> bool {
        let msg = match ControlMessage::parse(json) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("[control] {}", e);
                return false;
            }
        };
        match self.governor.try_borrow_mut() {
            Ok(mut g) => g.apply_control(&msg).map_err(|e| log::warn!("[control] {}", e)).is_ok(),
            Err(_) => {
                self.pending.push_control(msg);
                true
            }
        }
    }

    /// Register a callback receiving each degrade message.
    #[wasm_bindgen(js_name = onDegrade)]
    pub fn on_degrade(&self, callback: js_sys::Function) {
        if let Ok(mut g) = self.governor.try_borrow_mut() {
            g.on_degrade(move |notice| {
                let _ = callback.call1(&JsValue::NULL, &JsValue::from_str(&notice.message));
            });
        }
    }

    /// Register a callback receiving the rolling fps average.
    #[wasm_bindgen(js_name = onFps)]
    pub fn on_fps(&self, callback: js_sys::Function) {
        if let Ok(mut g) = self.governor.try_borrow_mut() {
            g.on_fps(move |avg| {
                let _ = callback.call1(&JsValue::NULL, &JsValue::from_f64(avg as f64));
            });
        }
    }

    pub fn status(&self) -> String {
        let status = match self.governor.try_borrow() {
            Ok(g) => g.status(),
            Err(_) => self.pending.status(),
        };
        match status {
            LoopStatus::Idle => "idle",
            LoopStatus::Running => "running",
            LoopStatus::Halted => "halted",
            LoopStatus::Stopped => "stopped",
        }
        .to_string()
    }

    /// Stop the loop and release GPU resources. Called from inside a frame
    /// callback, the stop lands when that frame returns.
    pub fn stop(&self) {
        match self.governor.try_borrow_mut() {
            Ok(mut g) => {
                g.stop();
                self.pending.record(&*g);
            }
            Err(_) => self.pending.request_stop(),
        }
    }
}

/// Mount the blob on `canvas_id`. `settings_toml` optionally overrides the
/// engine settings.
#[wasm_bindgen(js_name = startBlob)]
pub async fn start_blob(canvas_id: String, settings_toml: Option<String>) -> Result<BlobHandle, JsValue> {
    init(&canvas_id, settings_toml.as_deref())
        .await
        .map_err(|e| JsValue::from_str(&format!("{e:#}")))
}

async fn init(canvas_id: &str, settings_toml: Option<&str>) -> anyhow::Result<BlobHandle> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let canvas = dom::canvas_by_id(canvas_id)?;
    let settings = match settings_toml {
        Some(src) => EngineSettings::from_toml_str(src)?,
        None => EngineSettings::default(),
    };
    let ctx = EngineContext::new(settings);

    let viewport = dom::sync_canvas_backing_size(&canvas);
    let mut governor = RenderGovernor::from_context(&ctx);
    governor.on_degrade(|n| log::warn!("[governor] {}", n.message));
    governor.on_error(|e| log::error!("[governor] {}", e));
    governor.resize(viewport);

    let renderer = ShapeGpu::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), viewport, &ctx).await;
    if !governor.start(renderer) {
        anyhow::bail!("renderer failed to initialise");
    }
    log::info!("[web] blob running on #{canvas_id}");

    let pending = Rc::new(Pending::default());
    pending.record(&governor);
    let governor: SharedGovernor = Rc::new(RefCell::new(governor));
    events::wire_pointer(&canvas, &governor);
    events::wire_keyboard(&window, &governor);
    events::wire_resize(&window, &canvas, &governor);
    frame::start_loop(governor.clone(), pending.clone());
    Ok(BlobHandle { governor, pending })
}
