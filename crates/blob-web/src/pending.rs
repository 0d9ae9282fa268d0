use blob_core::{ControlMessage, LoopStatus, RenderGovernor, ShapeRenderer};
use std::cell::{Cell, RefCell};

/// Requests made from JavaScript while the governor is borrowed by a frame
/// (for example from inside an `onDegrade` callback). The frame loop drains
/// them right after `tick` returns.
pub struct Pending {
    stop: Cell<bool>,
    controls: RefCell<Vec<ControlMessage>>,
    status: Cell<LoopStatus>,
}

impl Default for Pending {
    fn default() -> Self {
        Self {
            stop: Cell::new(false),
            controls: RefCell::new(Vec::new()),
            status: Cell::new(LoopStatus::Idle),
        }
    }
}

impl Pending {
    pub fn request_stop(&self) {
        self.stop.set(true);
    }

    pub fn push_control(&self, msg: ControlMessage) {
        self.controls.borrow_mut().push(msg);
    }

    /// Last status seen outside a frame, with a queued stop taking effect.
    pub fn status(&self) -> LoopStatus {
        if self.stop.get() {
            LoopStatus::Stopped
        } else {
            self.status.get()
        }
    }

    pub fn record<R: ShapeRenderer>(&self, g: &RenderGovernor<R>) {
        self.status.set(g.status());
    }

    /// Apply queued controls in arrival order, then a queued stop.
    pub fn drain<R: ShapeRenderer>(&self, g: &mut RenderGovernor<R>) {
        let queued = std::mem::take(&mut *self.controls.borrow_mut());
        for msg in &queued {
            if let Err(e) = g.apply_control(msg) {
                log::warn!("[control] {}", e);
            }
        }
        if self.stop.replace(false) {
            g.stop();
        }
        self.record(g);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blob_core::{EngineContext, FrameSnapshot, RenderError, Viewport};
    use std::rc::Rc;

    struct Null;

    impl ShapeRenderer for Null {
        fn draw(&mut self, _frame: &FrameSnapshot) -> Result<(), RenderError> {
            Ok(())
        }

        fn resize(&mut self, _viewport: &Viewport) {}
    }

    fn running() -> RenderGovernor<Null> {
        let mut g = RenderGovernor::from_context(&EngineContext::default());
        assert!(g.start(Ok(Null)));
        g
    }

    #[test]
    fn stop_from_fps_callback_lands_after_the_frame() {
        let pending = Rc::new(Pending::default());
        let mut g = running();
        let inner = pending.clone();
        g.on_fps(move |_| inner.request_stop());
        pending.record(&g);

        // Every drawn frame reports fps, so the first one queues the stop.
        for _ in 0..60 {
            if !g.is_running() {
                break;
            }
            g.tick(1.0 / 60.0);
            pending.drain(&mut g);
        }
        assert_eq!(g.status(), LoopStatus::Stopped);
        assert_eq!(pending.status(), LoopStatus::Stopped);
        assert!(g.tick(1.0 / 60.0).is_none());
    }

    #[test]
    fn queued_stop_reports_stopped_before_drain() {
        let pending = Pending::default();
        let g = running();
        pending.record(&g);
        assert_eq!(pending.status(), LoopStatus::Running);
        pending.request_stop();
        assert_eq!(pending.status(), LoopStatus::Stopped);
    }

    #[test]
    fn queued_controls_apply_in_order() {
        let pending = Pending::default();
        let mut g = running();
        for raw in [
            r#"{"type":"setPreset","payload":{"name":"sad","transitionMs":0}}"#,
            r#"{"type":"setPreset","payload":{"name":"angry","transitionMs":0}}"#,
            r#"{"type":"setInteractionMode","payload":{"mode":"repel"}}"#,
        ] {
            pending.push_control(ControlMessage::parse(raw).expect("parse"));
        }
        pending.drain(&mut g);
        assert_eq!(g.model().state(), blob_core::Preset::Angry.state());
        assert_eq!(g.model().mode(), blob_core::InteractionMode::Repel);
        assert!(g.is_running());

        // Drained once only.
        g.model_mut().set_preset(blob_core::Preset::Happy, None, 0.0);
        pending.drain(&mut g);
        assert_eq!(g.model().state(), blob_core::Preset::Happy.state());
    }
}
