//! # Scene
//!
//! Everything one tutorial draws each frame: the clear state, the uploaded attribute buffers,
//! the validated draw calls and where the MVP matrix comes from.
//!
//! ## Transform Modes
//!
//! - [`TransformSource::None`]: vertices are already in clip space. Draws carry no MVP uniform.
//! - [`TransformSource::Static`]: a fixed camera. The MVP is computed on the first frame and
//!   reused until something changes the provider, such as a window resize.
//! - [`TransformSource::Dynamic`]: a [`PoseSource`] moves the camera from the input of every
//!   frame, so the MVP is recomputed each iteration.
//!
//! A scene is assembled by [`crate::Tutorial::build_scene`] before the frame loop starts and is
//! only read by the loop afterwards, except for the transform state.

use crate::backend::ClearState;
use crate::controls::PoseSource;
use crate::error::TransformError;
use crate::resources::{DrawCall, GpuResourceSet};
use crate::transform::{aspect_ratio, TransformProvider};
use crate::window::InputSnapshot;

/// Where a scene's MVP matrix comes from.
pub enum TransformSource {
    None,
    Static(TransformProvider),
    Dynamic {
        provider: TransformProvider,
        controls: Box<dyn PoseSource>,
    },
}

pub struct Scene {
    pub clear: ClearState,
    pub resources: GpuResourceSet,
    /// Issued in order every frame.
    pub draws: Vec<DrawCall>,
    pub transform: TransformSource,
}

impl Scene {
    pub fn new(
        clear: ClearState,
        resources: GpuResourceSet,
        draws: Vec<DrawCall>,
        transform: TransformSource,
    ) -> Self {
        Self {
            clear,
            resources,
            draws,
            transform,
        }
    }

    /// The provider behind a static or dynamic scene.
    pub fn provider(&self) -> Option<&TransformProvider> {
        match &self.transform {
            TransformSource::None => None,
            TransformSource::Static(provider) | TransformSource::Dynamic { provider, .. } => {
                Some(provider)
            }
        }
    }

    /// The MVP matrix for this frame, or `None` when the scene has no transform.
    ///
    /// In dynamic mode `input` is fed to the pose source first.
    pub fn current_mvp(
        &mut self,
        input: &InputSnapshot,
    ) -> Result<Option<nalgebra_glm::Mat4>, TransformError> {
        match &mut self.transform {
            TransformSource::None => Ok(None),
            TransformSource::Static(provider) => provider.mvp().map(Some),
            TransformSource::Dynamic { provider, controls } => {
                let update = controls.compute_pose(input);
                provider.set_pose(update.pose);
                provider.set_fov(update.fov_y);
                provider.mvp().map(Some)
            }
        }
    }

    /// Follows a framebuffer resize. Zero-sized framebuffers (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let aspect = aspect_ratio(width, height);
        match &mut self.transform {
            TransformSource::None => (),
            TransformSource::Static(provider) | TransformSource::Dynamic { provider, .. } => {
                provider.set_aspect(aspect)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::PoseUpdate;
    use crate::transform::{CameraPose, ClipDepth, Projection};
    use nalgebra_glm::vec3;

    fn provider() -> TransformProvider {
        TransformProvider::new(
            Projection::Perspective {
                fov_y: 45.0_f32.to_radians(),
                aspect: 4.0 / 3.0,
                near: 0.1,
                far: 100.0,
            },
            CameraPose::new(vec3(4.0, 3.0, 3.0), vec3(0.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0)),
            ClipDepth::ZeroToOne,
        )
    }

    fn scene(transform: TransformSource) -> Scene {
        Scene::new(
            ClearState::color_only(ClearState::DARK_BLUE),
            GpuResourceSet::new(),
            Vec::new(),
            transform,
        )
    }

    /// Walks the eye along +X by one unit per call.
    struct Walker {
        calls: u32,
    }

    impl PoseSource for Walker {
        fn compute_pose(&mut self, _input: &InputSnapshot) -> PoseUpdate {
            self.calls += 1;
            PoseUpdate {
                pose: CameraPose::new(
                    vec3(self.calls as f32, 0.0, 5.0),
                    vec3(0.0, 0.0, 0.0),
                    vec3(0.0, 1.0, 0.0),
                ),
                fov_y: 45.0_f32.to_radians(),
            }
        }
    }

    #[test]
    fn no_transform_yields_no_matrix() {
        let mut scene = scene(TransformSource::None);
        assert_eq!(scene.current_mvp(&InputSnapshot::default()), Ok(None));
        assert!(scene.provider().is_none());
    }

    #[test]
    fn static_transform_is_cached_until_resize() {
        let mut scene = scene(TransformSource::Static(provider()));
        let first = scene.current_mvp(&InputSnapshot::default()).unwrap();
        assert!(scene.provider().unwrap().is_cached());
        assert_eq!(scene.current_mvp(&InputSnapshot::default()).unwrap(), first);

        scene.resize(800, 800);
        assert!(!scene.provider().unwrap().is_cached());
        assert_ne!(scene.current_mvp(&InputSnapshot::default()).unwrap(), first);
    }

    #[test]
    fn zero_sized_resize_keeps_the_cache() {
        let mut scene = scene(TransformSource::Static(provider()));
        scene.current_mvp(&InputSnapshot::default()).unwrap();
        scene.resize(0, 600);
        assert!(scene.provider().unwrap().is_cached());
    }

    #[test]
    fn dynamic_transform_follows_the_pose_source() {
        let mut scene = scene(TransformSource::Dynamic {
            provider: provider(),
            controls: Box::new(Walker { calls: 0 }),
        });
        let first = scene.current_mvp(&InputSnapshot::default()).unwrap();
        let second = scene.current_mvp(&InputSnapshot::default()).unwrap();
        assert_ne!(first, second);
        assert_eq!(scene.provider().unwrap().pose().eye, vec3(2.0, 0.0, 5.0));
    }
}
