// Recording renderer shared by the governor tests.

#![allow(dead_code)]

use blob_core::{FrameSnapshot, RenderError, ShapeRenderer, Viewport};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
pub struct RenderLog {
    pub frames: Vec<FrameSnapshot>,
    pub resizes: Vec<Viewport>,
    pub released: bool,
}

pub struct RecordingRenderer {
    pub log: Rc<RefCell<RenderLog>>,
    /// Fail the draw call with this 1-based index.
    pub fail_on_draw: Option<usize>,
}

impl RecordingRenderer {
    pub fn new() -> (Self, Rc<RefCell<RenderLog>>) {
        let log = Rc::new(RefCell::new(RenderLog::default()));
        (
            Self {
                log: log.clone(),
                fail_on_draw: None,
            },
            log,
        )
    }

    pub fn failing_on(n: usize) -> (Self, Rc<RefCell<RenderLog>>) {
        let (mut r, log) = Self::new();
        r.fail_on_draw = Some(n);
        (r, log)
    }
}

impl ShapeRenderer for RecordingRenderer {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if self.fail_on_draw == Some(log.frames.len() + 1) {
            return Err(RenderError::Frame("device lost".into()));
        }
        log.frames.push(*frame);
        Ok(())
    }

    fn resize(&mut self, viewport: &Viewport) {
        self.log.borrow_mut().resizes.push(*viewport);
    }

    fn release(&mut self) {
        self.log.borrow_mut().released = true;
    }
}
