//! First-person camera controls.
//!
//! A [`PoseSource`] turns the input of one frame into a camera pose and field of view. The
//! frame loop feeds the result to the transform provider of a dynamic scene.

use nalgebra_glm::{vec3, Vec3};

use crate::config::ControlsConfig;
use crate::transform::CameraPose;
use crate::window::InputSnapshot;

const ZOOM_STEP_DEGREES: f32 = 5.0;
const MIN_FOV_DEGREES: f32 = 10.0;
const MAX_FOV_DEGREES: f32 = 90.0;

/// Camera state produced for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PoseUpdate {
    pub pose: CameraPose,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

/// Something that moves the camera from user input.
pub trait PoseSource {
    fn compute_pose(&mut self, input: &InputSnapshot) -> PoseUpdate;
}

/// Mouse look plus arrow-key movement, with the scroll wheel zooming.
///
/// Moving the mouse right turns right and moving it down looks down. The arrow keys move along
/// the view direction and strafe along the horizontal right vector, scaled by `speed` and the
/// frame's `dt`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    pub position: Vec3,
    /// Yaw in radians. At pi the camera looks down negative Z.
    pub horizontal_angle: f32,
    /// Pitch in radians.
    pub vertical_angle: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub speed: f32,
    pub mouse_speed: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(&ControlsConfig::default(), 45.0_f32.to_radians())
    }
}

impl FlyCamera {
    pub fn new(controls: &ControlsConfig, fov_y: f32) -> Self {
        Self {
            position: controls.position,
            horizontal_angle: controls.horizontal_angle,
            vertical_angle: controls.vertical_angle,
            fov_y,
            speed: controls.speed,
            mouse_speed: controls.mouse_speed,
        }
    }

    /// Unit vector the camera looks along.
    pub fn direction(&self) -> Vec3 {
        let (h, v) = (self.horizontal_angle, self.vertical_angle);
        vec3(v.cos() * h.sin(), v.sin(), v.cos() * h.cos())
    }

    /// Horizontal unit vector pointing to the right of the view direction.
    pub fn right(&self) -> Vec3 {
        let h = self.horizontal_angle - std::f32::consts::FRAC_PI_2;
        vec3(h.sin(), 0.0, h.cos())
    }

    pub fn pose(&self) -> CameraPose {
        let direction = self.direction();
        let up = self.right().cross(&direction);
        CameraPose::new(self.position, self.position + direction, up)
    }
}

impl PoseSource for FlyCamera {
    fn compute_pose(&mut self, input: &InputSnapshot) -> PoseUpdate {
        let (dx, dy) = input.cursor_delta;
        self.horizontal_angle -= self.mouse_speed * dx as f32;
        self.vertical_angle -= self.mouse_speed * dy as f32;

        let step = self.speed * input.dt;
        let direction = self.direction();
        let right = self.right();
        if input.forward {
            self.position += direction * step;
        }
        if input.backward {
            self.position -= direction * step;
        }
        if input.right {
            self.position += right * step;
        }
        if input.left {
            self.position -= right * step;
        }

        if input.scroll != 0.0 {
            let degrees = self.fov_y.to_degrees() - ZOOM_STEP_DEGREES * input.scroll;
            self.fov_y = degrees.clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES).to_radians();
        }

        PoseUpdate {
            pose: self.pose(),
            fov_y: self.fov_y,
        }
    }
}
