//! # Transform Provider
//!
//! Builds the Model-View-Projection (MVP) matrix every tutorial uploads to its vertex shader.
//!
//! ## Overview
//!
//! - **Projection**: a symmetric perspective frustum ([`perspective`]) or an orthographic box
//!   ([`orthographic`]), targeting one of the two [`ClipDepth`] conventions.
//! - **View**: a right-handed look-at matrix ([`look_at`]) built from a [`CameraPose`].
//! - **Model**: the object placement, identity unless a draw needs one.
//! - **MVP**: [`combine`] multiplies them as `projection * view * model`, so a vertex is
//!   transformed by the model first and the projection last.
//!
//! The [`TransformProvider`] keeps the three inputs and caches the combined matrix until one of
//! them changes. Static scenes compute it once; the model-loading tutorial feeds the provider a
//! new pose every frame. The provider never reads input devices itself.
//!
//! ## Validation
//!
//! All constructors reject inputs that would produce NaNs or a singular projection: a field of
//! view outside `(0, pi)`, a non-positive aspect ratio, a depth range without `0 < near < far`,
//! an eye sitting on its target, an up vector parallel to the viewing direction, or any
//! infinite or NaN component.

use crate::error::TransformError;

/// Below this length a direction is treated as zero.
const DEGENERATE_EPSILON: f32 = 1.0e-6;

/// The normalized-device depth range a projection maps `near..far` onto.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipDepth {
    /// OpenGL convention: near maps to `-1`, far maps to `+1`.
    NegativeOneToOne,
    /// wgpu, Vulkan and Direct3D convention: near maps to `0`, far maps to `1`.
    #[default]
    ZeroToOne,
}

impl ClipDepth {
    /// Normalized-device depth of a point on the near plane.
    pub fn near_depth(self) -> f32 {
        match self {
            ClipDepth::NegativeOneToOne => -1.0,
            ClipDepth::ZeroToOne => 0.0,
        }
    }

    /// Normalized-device depth of a point on the far plane.
    pub fn far_depth(self) -> f32 {
        1.0
    }
}

/// Projection parameters. Angles are in radians.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    /// Builds the projection matrix for the given clip convention.
    pub fn matrix(&self, clip: ClipDepth) -> Result<nalgebra_glm::Mat4, TransformError> {
        match *self {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => perspective(fov_y, aspect, near, far, clip),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => orthographic(left, right, bottom, top, near, far, clip),
        }
    }
}

/// Camera placement: where it is, what it looks at and which way is up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraPose {
    pub eye: nalgebra_glm::Vec3,
    pub target: nalgebra_glm::Vec3,
    pub up: nalgebra_glm::Vec3,
}

impl CameraPose {
    pub fn new(
        eye: nalgebra_glm::Vec3,
        target: nalgebra_glm::Vec3,
        up: nalgebra_glm::Vec3,
    ) -> Self {
        Self { eye, target, up }
    }

    /// The view matrix for this pose. See [`look_at`].
    pub fn view_matrix(&self) -> Result<nalgebra_glm::Mat4, TransformError> {
        look_at(&self.eye, &self.target, &self.up)
    }
}

/// Builds a symmetric perspective projection.
///
/// `fov_y` is the full vertical angle of the frustum in radians. Points on the near plane land
/// on [`ClipDepth::near_depth`] after the perspective divide and points on the far plane land
/// on [`ClipDepth::far_depth`].
///
/// # Errors
///
/// Returns a [`TransformError`] unless `fov_y` lies in `(0, pi)`, `aspect` is positive and
/// `0 < near < far`.
pub fn perspective(
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    clip: ClipDepth,
) -> Result<nalgebra_glm::Mat4, TransformError> {
    if !(fov_y > 0.0 && fov_y < std::f32::consts::PI) {
        return Err(TransformError::InvalidFieldOfView(fov_y));
    }
    if !(aspect.is_finite() && aspect > 0.0) {
        return Err(TransformError::InvalidAspectRatio(aspect));
    }
    if !(near > 0.0 && far.is_finite() && near < far) {
        return Err(TransformError::InvalidDepthRange { near, far });
    }

    Ok(match clip {
        ClipDepth::NegativeOneToOne => nalgebra_glm::perspective_rh_no(aspect, fov_y, near, far),
        ClipDepth::ZeroToOne => nalgebra_glm::perspective_rh_zo(aspect, fov_y, near, far),
    })
}

/// Builds an orthographic projection from view-space bounds.
///
/// Unlike [`perspective`], `near` may be zero or negative; only the extents must be non-empty.
#[allow(clippy::too_many_arguments)]
pub fn orthographic(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
    clip: ClipDepth,
) -> Result<nalgebra_glm::Mat4, TransformError> {
    if !(right - left).is_normal() {
        return Err(TransformError::DegenerateBounds("x"));
    }
    if !(top - bottom).is_normal() {
        return Err(TransformError::DegenerateBounds("y"));
    }
    if !(far - near).is_normal() {
        return Err(TransformError::DegenerateBounds("z"));
    }

    Ok(match clip {
        ClipDepth::NegativeOneToOne => {
            nalgebra_glm::ortho_rh_no(left, right, bottom, top, near, far)
        }
        ClipDepth::ZeroToOne => nalgebra_glm::ortho_rh_zo(left, right, bottom, top, near, far),
    })
}

/// Builds a right-handed view matrix looking from `eye` towards `target`.
///
/// The camera looks down its local `-Z` axis with `up` projected onto its local `+Y` axis.
///
/// # Errors
///
/// - [`TransformError::NonFinite`] when a component of `eye`, `target` or `up` is infinite or
///   NaN.
/// - [`TransformError::DegenerateView`] when `eye == target`.
/// - [`TransformError::DegenerateUp`] when `up` is zero or parallel to `target - eye`.
pub fn look_at(
    eye: &nalgebra_glm::Vec3,
    target: &nalgebra_glm::Vec3,
    up: &nalgebra_glm::Vec3,
) -> Result<nalgebra_glm::Mat4, TransformError> {
    if !is_finite(eye.iter()) || !is_finite(target.iter()) || !is_finite(up.iter()) {
        return Err(TransformError::NonFinite("camera pose"));
    }

    let forward = target - eye;
    if !(nalgebra_glm::length(&forward) > DEGENERATE_EPSILON) {
        return Err(TransformError::DegenerateView);
    }
    let up_length = nalgebra_glm::length(up);
    if !(up_length > 0.0) {
        return Err(TransformError::DegenerateUp);
    }
    // Direction only: the magnitude of `up` plays no part in the test.
    let up = *up / up_length;
    let side = nalgebra_glm::cross(&nalgebra_glm::normalize(&forward), &up);
    if !(nalgebra_glm::length(&side) > DEGENERATE_EPSILON) {
        return Err(TransformError::DegenerateUp);
    }

    let view = nalgebra_glm::look_at_rh(eye, target, &up);
    if !is_finite(view.iter()) {
        return Err(TransformError::NonFinite("view matrix"));
    }
    Ok(view)
}

fn is_finite<'a>(mut values: impl Iterator<Item = &'a f32>) -> bool {
    values.all(|value| value.is_finite())
}

/// Width over height of a framebuffer. Zero dimensions count as one pixel so a minimized window
/// still yields a finite, positive ratio.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

/// Combines the three transforms into one MVP matrix.
///
/// The order is fixed: `projection * view * model`. Matrix products do not commute, so any
/// other order renders a different image without raising an error.
pub fn combine(
    projection: &nalgebra_glm::Mat4,
    view: &nalgebra_glm::Mat4,
    model: &nalgebra_glm::Mat4,
) -> nalgebra_glm::Mat4 {
    projection * view * model
}

/// Holds projection, camera pose and model matrix and hands out the combined MVP matrix.
///
/// The combined matrix is cached. Every setter drops the cache, so the next call to
/// [`TransformProvider::mvp`] recomputes it from the current inputs.
#[derive(Debug, Clone)]
pub struct TransformProvider {
    projection: Projection,
    clip: ClipDepth,
    pose: CameraPose,
    model: nalgebra_glm::Mat4,
    cached: Option<nalgebra_glm::Mat4>,
}

impl TransformProvider {
    /// Creates a provider with an identity model matrix.
    pub fn new(projection: Projection, pose: CameraPose, clip: ClipDepth) -> Self {
        Self {
            projection,
            clip,
            pose,
            model: nalgebra_glm::Mat4::identity(),
            cached: None,
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn model(&self) -> &nalgebra_glm::Mat4 {
        &self.model
    }

    /// Whether the combined matrix is currently cached.
    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    pub fn set_pose(&mut self, pose: CameraPose) {
        self.pose = pose;
        self.cached = None;
    }

    pub fn set_model(&mut self, model: nalgebra_glm::Mat4) {
        self.model = model;
        self.cached = None;
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.cached = None;
    }

    /// Replaces the vertical field of view. Orthographic projections ignore it.
    pub fn set_fov(&mut self, fov: f32) {
        if let Projection::Perspective { fov_y, .. } = &mut self.projection {
            if *fov_y != fov {
                *fov_y = fov;
                self.cached = None;
            }
        }
    }

    /// Replaces the aspect ratio. Orthographic projections keep their world-space bounds.
    pub fn set_aspect(&mut self, ratio: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            if *aspect != ratio {
                *aspect = ratio;
                self.cached = None;
            }
        }
    }

    pub fn projection_matrix(&self) -> Result<nalgebra_glm::Mat4, TransformError> {
        self.projection.matrix(self.clip)
    }

    pub fn view_matrix(&self) -> Result<nalgebra_glm::Mat4, TransformError> {
        self.pose.view_matrix()
    }

    /// Returns the combined MVP matrix, recomputing it if any input changed since the last call.
    pub fn mvp(&mut self) -> Result<nalgebra_glm::Mat4, TransformError> {
        if let Some(mvp) = self.cached {
            return Ok(mvp);
        }
        let mvp = combine(
            &self.projection_matrix()?,
            &self.view_matrix()?,
            &self.model,
        );
        if !is_finite(mvp.iter()) {
            return Err(TransformError::NonFinite("MVP matrix"));
        }
        log::trace!("recomputed MVP matrix");
        self.cached = Some(mvp);
        Ok(mvp)
    }
}
