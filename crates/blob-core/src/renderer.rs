//! Boundary between the frame governor and a concrete renderer.

use crate::config::InteractionConfig;
use crate::deformer::{Deformation, InteractionMode};
use crate::error::RenderError;
use crate::governor::FidelityTier;
use crate::mapping::VisualParams;
use crate::pointer::Viewport;
use crate::state::StateVector;
use glam::Vec3;

/// Everything a renderer needs for one frame. Built fresh per tick and only
/// ever handed out by shared reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSnapshot {
    pub elapsed_sec: f32,
    pub state: StateVector,
    pub visual: VisualParams,
    pub interaction: InteractionConfig,
    pub mode: InteractionMode,
    pub deformation: Deformation,
    pub pointer: Option<Vec3>,
    pub pressed: bool,
    pub paused: bool,
    pub glow_enabled: bool,
    pub tier: FidelityTier,
    /// Elements to draw this frame, already scaled by density.
    pub element_count: u32,
    pub viewport: Viewport,
}

/// A backend that turns snapshots into pixels.
pub trait ShapeRenderer {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError>;

    fn resize(&mut self, viewport: &Viewport);

    /// Free GPU resources. Called once when the governor stops.
    fn release(&mut self) {}
}

impl<R: ShapeRenderer + ?Sized> ShapeRenderer for Box<R> {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError> {
        (**self).draw(frame)
    }

    fn resize(&mut self, viewport: &Viewport) {
        (**self).resize(viewport)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
