//! Camera, viewport and screen-to-world pointer projection.

use crate::config::CameraSettings;
use crate::constants::*;
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Drawable area in CSS/logical pixels plus the device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    /// Sizes are floored at 1 and the pixel ratio is capped.
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        let sane = |v: f32| if v.is_finite() { v.max(1.0) } else { 1.0 };
        let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        };
        Self {
            width: sane(width),
            height: sane(height),
            pixel_ratio: ratio,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Backing-store size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round().max(1.0) as u32,
            (self.height * self.pixel_ratio).round().max(1.0) as u32,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

/// Perspective camera looking down -Z at the shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(settings: &CameraSettings, viewport: &Viewport) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, settings.z),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: viewport.aspect(),
            fovy_radians: settings.fovy_deg.to_radians(),
            znear: CAMERA_ZNEAR,
            zfar: CAMERA_ZFAR,
        }
    }

    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space ray through a screen point given in viewport pixels
    /// (origin top-left). Returns `(origin, direction)`.
    pub fn screen_ray(&self, viewport: &Viewport, screen: Vec2) -> (Vec3, Vec3) {
        let ndc_x = (2.0 * screen.x / viewport.width) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.height);
        let inv = self.view_projection().inverse();
        let p_far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let p1 = p_far.truncate() / p_far.w;
        (self.eye, (p1 - self.eye).normalize_or_zero())
    }

    /// Project a screen point onto the z = 0 plane through the shape center.
    ///
    /// `None` when the ray is parallel to the plane, points away from it, or
    /// the input is not finite.
    pub fn pointer_on_plane(&self, viewport: &Viewport, screen: Vec2) -> Option<Vec3> {
        if !screen.is_finite() {
            return None;
        }
        let (ro, rd) = self.screen_ray(viewport, screen);
        ray_plane_z0(ro, rd)
    }
}

#[inline]
pub fn ray_plane_z0(origin: Vec3, dir: Vec3) -> Option<Vec3> {
    if dir.z.abs() < 1e-6 {
        return None;
    }
    let t = -origin.z / dir.z;
    (t >= 0.0 && t.is_finite()).then(|| origin + dir * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(vp: &Viewport) -> Camera {
        Camera::new(&CameraSettings::default(), vp)
    }

    #[test]
    fn viewport_caps_pixel_ratio_and_floors_size() {
        let vp = Viewport::new(0.0, -5.0, 3.0);
        assert_eq!(vp.width, 1.0);
        assert_eq!(vp.height, 1.0);
        assert_eq!(vp.pixel_ratio, 2.0);
        assert_eq!(Viewport::new(800.0, 600.0, 1.5).physical_size(), (1200, 900));
    }

    #[test]
    fn screen_center_hits_origin() {
        let vp = Viewport::new(800.0, 600.0, 1.0);
        let p = camera(&vp).pointer_on_plane(&vp, Vec2::new(400.0, 300.0)).expect("hit");
        assert!(p.length() < 1e-4);
    }

    #[test]
    fn screen_axes_map_to_world_axes() {
        let vp = Viewport::new(800.0, 600.0, 1.0);
        let cam = camera(&vp);
        let right = cam.pointer_on_plane(&vp, Vec2::new(700.0, 300.0)).expect("hit");
        let top = cam.pointer_on_plane(&vp, Vec2::new(400.0, 50.0)).expect("hit");
        assert!(right.x > 0.0 && right.y.abs() < 1e-4);
        assert!(top.y > 0.0 && top.x.abs() < 1e-4);
        assert!(right.z.abs() < 1e-4 && top.z.abs() < 1e-4);
    }

    #[test]
    fn ray_away_from_plane_misses() {
        assert_eq!(ray_plane_z0(Vec3::new(0.0, 0.0, 5.0), Vec3::Z), None);
        assert_eq!(ray_plane_z0(Vec3::new(0.0, 0.0, 5.0), Vec3::X), None);
    }
}
