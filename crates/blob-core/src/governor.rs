//! Frame loop driver.
//!
//! The host owns the clock and calls [`RenderGovernor::tick`] once per
//! display frame. Each tick advances the state transition, maps it to
//! visuals, steps the deformer, hands a snapshot to the renderer and feeds
//! the frame rate into a sliding window that drives the degrade ladder.

use crate::config::{EngineContext, GovernorSettings};
use crate::constants::*;
use crate::control::ControlMessage;
use crate::deformer::PointerDeformer;
use crate::error::{ControlError, RenderError};
use crate::mapping::map_state_to_visual;
use crate::pointer::{Camera, Viewport};
use crate::renderer::{FrameSnapshot, ShapeRenderer};
use crate::state::StateModel;
use glam::{Vec2, Vec3};
use std::collections::VecDeque;

/// Fixed-capacity window of recent frame rates.
#[derive(Clone, Debug)]
pub struct FpsWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl FpsWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, fps: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(fps);
    }

    pub fn average(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f32>() / self.samples.len() as f32)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Element budget tier. Ordered from richest to cheapest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FidelityTier {
    Full,
    Mid,
    Fallback,
}

impl FidelityTier {
    pub fn budget(self, g: &GovernorSettings) -> u32 {
        match self {
            FidelityTier::Full => g.full_elements,
            FidelityTier::Mid => g.mid_elements,
            FidelityTier::Fallback => g.fallback_elements,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DegradeStep {
    DisableGlow,
    ReduceToMid,
    ReduceToFallback,
}

/// Emitted once per degrade step.
#[derive(Clone, Debug, PartialEq)]
pub struct DegradeNotice {
    pub step: DegradeStep,
    pub tier: FidelityTier,
    pub message: String,
}

/// Monotonic record of applied degrade steps. Nothing here is ever undone
/// within a session.
#[derive(Clone, Debug, PartialEq)]
pub struct DegradeLadder {
    glow_disabled: bool,
    tier: FidelityTier,
}

impl Default for DegradeLadder {
    fn default() -> Self {
        Self {
            glow_disabled: false,
            tier: FidelityTier::Full,
        }
    }
}

impl DegradeLadder {
    pub fn glow_disabled(&self) -> bool {
        self.glow_disabled
    }

    pub fn tier(&self) -> FidelityTier {
        self.tier
    }

    /// Next step to take, given whether glow is currently on.
    pub fn next_step(&self, glow_on: bool) -> Option<DegradeStep> {
        if glow_on && !self.glow_disabled {
            return Some(DegradeStep::DisableGlow);
        }
        match self.tier {
            FidelityTier::Full => Some(DegradeStep::ReduceToMid),
            FidelityTier::Mid => Some(DegradeStep::ReduceToFallback),
            FidelityTier::Fallback => None,
        }
    }

    pub fn apply(&mut self, step: DegradeStep) {
        match step {
            DegradeStep::DisableGlow => self.glow_disabled = true,
            DegradeStep::ReduceToMid => self.tier = self.tier.max(FidelityTier::Mid),
            DegradeStep::ReduceToFallback => self.tier = FidelityTier::Fallback,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopStatus {
    /// Never started.
    Idle,
    Running,
    /// Renderer failed to initialize or to draw a frame.
    Halted,
    Stopped,
}

/// Host-registered observers. All optional.
#[derive(Default)]
pub struct GovernorCallbacks {
    pub on_fps: Option<Box<dyn FnMut(f32)>>,
    pub on_degrade: Option<Box<dyn FnMut(&DegradeNotice)>>,
    pub on_error: Option<Box<dyn FnMut(&RenderError)>>,
}

/// Owns the session state, the deformer and the renderer, and runs one frame
/// per [`tick`](Self::tick).
pub struct RenderGovernor<R: ShapeRenderer> {
    settings: GovernorSettings,
    model: StateModel,
    deformer: PointerDeformer,
    renderer: Option<R>,
    status: LoopStatus,
    ladder: DegradeLadder,
    fps: FpsWindow,
    callbacks: GovernorCallbacks,
    camera: Camera,
    viewport: Viewport,
    pointer: Option<Vec3>,
    pressed: bool,
    elapsed_sec: f64,
}

impl<R: ShapeRenderer> RenderGovernor<R> {
    pub fn new(ctx: &EngineContext, model: StateModel, deformer: PointerDeformer) -> Self {
        let viewport = Viewport::default();
        Self {
            settings: ctx.settings.governor,
            model,
            deformer,
            renderer: None,
            status: LoopStatus::Idle,
            ladder: DegradeLadder::default(),
            fps: FpsWindow::new(ctx.settings.governor.fps_window),
            callbacks: GovernorCallbacks::default(),
            camera: Camera::new(&ctx.settings.camera, &viewport),
            viewport,
            pointer: None,
            pressed: false,
            elapsed_sec: 0.0,
        }
    }

    /// Build a governor with a fresh model and deformer from `ctx`.
    pub fn from_context(ctx: &EngineContext) -> Self {
        Self::new(ctx, StateModel::new(ctx), PointerDeformer::new(ctx))
    }

    pub fn on_fps(&mut self, f: impl FnMut(f32) + 'static) {
        self.callbacks.on_fps = Some(Box::new(f));
    }

    pub fn on_degrade(&mut self, f: impl FnMut(&DegradeNotice) + 'static) {
        self.callbacks.on_degrade = Some(Box::new(f));
    }

    pub fn on_error(&mut self, f: impl FnMut(&RenderError) + 'static) {
        self.callbacks.on_error = Some(Box::new(f));
    }

    /// Attach a renderer and enter the loop. An initialization error is
    /// reported through `on_error` and the loop is not entered.
    pub fn start(&mut self, renderer: Result<R, RenderError>) -> bool {
        if let Some(mut old) = self.renderer.take() {
            old.release();
        }
        match renderer {
            Ok(mut r) => {
                r.resize(&self.viewport);
                self.renderer = Some(r);
                self.status = LoopStatus::Running;
                log::info!("[governor] running");
                true
            }
            Err(e) => {
                self.status = LoopStatus::Halted;
                self.report_error(&e);
                false
            }
        }
    }

    /// Cancel the loop, drop any in-flight transition and release the renderer.
    pub fn stop(&mut self) {
        self.model.cancel_transition();
        if let Some(mut r) = self.renderer.take() {
            r.release();
        }
        self.status = LoopStatus::Stopped;
        log::info!("[governor] stopped");
    }

    pub fn status(&self) -> LoopStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == LoopStatus::Running
    }

    pub fn model(&self) -> &StateModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut StateModel {
        &mut self.model
    }

    pub fn deformer(&self) -> &PointerDeformer {
        &self.deformer
    }

    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    pub fn ladder(&self) -> &DegradeLadder {
        &self.ladder
    }

    pub fn fps_window(&self) -> &FpsWindow {
        &self.fps
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Glow is on only when the user wants it and the ladder has not
    /// turned it off.
    pub fn glow_enabled(&self) -> bool {
        self.model.overrides().bloom_enabled && !self.ladder.glow_disabled()
    }

    /// Elements to draw at `density` under the current tier.
    pub fn element_count(&self, density: f32) -> u32 {
        let budget = self.ladder.tier().budget(&self.settings) as f32;
        let share = ELEMENT_DENSITY_FLOOR + ELEMENT_DENSITY_SPAN * density.clamp(0.0, 1.0);
        (budget * share).floor() as u32
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = Viewport::new(viewport.width, viewport.height, viewport.pixel_ratio);
        self.camera.aspect = self.viewport.aspect();
        if let Some(r) = self.renderer.as_mut() {
            r.resize(&self.viewport);
        }
    }

    pub fn set_pointer_world(&mut self, p: Vec3) {
        if p.is_finite() {
            self.pointer = Some(p);
        }
    }

    /// Project a viewport-pixel position onto the z = 0 plane. A miss keeps
    /// the previous sample.
    pub fn set_pointer_screen(&mut self, px: f32, py: f32) {
        if let Some(p) = self.camera.pointer_on_plane(&self.viewport, Vec2::new(px, py)) {
            self.pointer = Some(p);
        }
    }

    pub fn clear_pointer(&mut self) {
        self.pointer = None;
        self.pressed = false;
    }

    pub fn set_pointer_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    pub fn pointer(&self) -> Option<Vec3> {
        self.pointer
    }

    pub fn apply_control(&mut self, msg: &ControlMessage) -> Result<(), ControlError> {
        msg.apply(&mut self.model)
    }

    /// Parse and apply one JSON control message. Rejections are logged and
    /// leave the model untouched.
    pub fn apply_control_json(&mut self, raw: &str) -> Result<(), ControlError> {
        let result = ControlMessage::parse(raw).and_then(|msg| self.apply_control(&msg));
        if let Err(e) = &result {
            log::warn!("[control] {}", e);
        }
        result
    }

    /// Run one frame. Returns the snapshot that was produced, or `None` when
    /// the loop is not running or the frame failed.
    pub fn tick(&mut self, dt_sec: f32) -> Option<FrameSnapshot> {
        if self.status != LoopStatus::Running {
            return None;
        }
        let dt = if dt_sec.is_finite() {
            dt_sec.clamp(0.0, self.settings.max_dt_sec)
        } else {
            0.0
        };
        self.elapsed_sec += f64::from(dt);

        let state = self.model.advance(dt);
        let mut visual = map_state_to_visual(&state);
        if let Some(size) = self.model.overrides().point_size {
            visual.point_size = size;
        }
        let interaction = *self.model.interaction();
        let paused = self.model.paused();
        let deformation = if paused {
            self.deformer.hold(&interaction)
        } else {
            self.deformer
                .update(dt, self.pointer, self.pressed, self.model.mode(), &interaction)
        };

        let snapshot = FrameSnapshot {
            elapsed_sec: self.elapsed_sec as f32,
            state,
            visual,
            interaction,
            mode: self.model.mode(),
            deformation,
            pointer: self.pointer,
            pressed: self.pressed,
            paused,
            glow_enabled: self.glow_enabled(),
            tier: self.ladder.tier(),
            element_count: self.element_count(visual.density),
            viewport: self.viewport,
        };
        if paused {
            return Some(snapshot);
        }

        let drawn = match self.renderer.as_mut() {
            Some(r) => r.draw(&snapshot),
            None => Err(RenderError::Frame("no renderer attached".into())),
        };
        if let Err(e) = drawn {
            self.status = LoopStatus::Halted;
            self.report_error(&e);
            return None;
        }

        self.sample_fps(dt);
        self.check_degrade();
        Some(snapshot)
    }

    fn sample_fps(&mut self, dt: f32) {
        self.fps.push(1.0 / dt.max(1e-4));
        if let (Some(avg), Some(cb)) = (self.fps.average(), self.callbacks.on_fps.as_mut()) {
            cb(avg);
        }
    }

    fn check_degrade(&mut self) {
        if !self.fps.is_full() {
            return;
        }
        let Some(avg) = self.fps.average() else {
            return;
        };
        if avg >= self.settings.fps_threshold {
            return;
        }
        let Some(step) = self.ladder.next_step(self.glow_enabled()) else {
            return;
        };
        self.ladder.apply(step);
        self.fps.clear();

        let tier = self.ladder.tier();
        let message = match step {
            DegradeStep::DisableGlow => "Performance degrade: glow disabled.".to_string(),
            DegradeStep::ReduceToMid | DegradeStep::ReduceToFallback => format!(
                "Performance degrade: element budget reduced to {}.",
                tier.budget(&self.settings)
            ),
        };
        log::warn!("[governor] {} (avg {:.1} fps)", message, avg);
        let notice = DegradeNotice { step, tier, message };
        if let Some(cb) = self.callbacks.on_degrade.as_mut() {
            cb(&notice);
        }
    }

    fn report_error(&mut self, e: &RenderError) {
        log::error!("[governor] {}", e);
        if let Some(cb) = self.callbacks.on_error.as_mut() {
            cb(e);
        }
    }
}
