//! # Tutorials
//!
//! The three programs this crate ships, each a [`Scene`] assembled against any
//! [`RenderBackend`]:
//!
//! | Tutorial | Draws | Transform |
//! |----------|-------|-----------|
//! | [`Tutorial::Triangle`] | one red triangle in clip space | none |
//! | [`Tutorial::MvpTriangle`] | the same triangle seen from a fixed camera | static |
//! | [`Tutorial::LoadingModels`] | an OBJ model with random per-vertex colors | first-person controls |
//!
//! All three clear to dark blue. The model tutorial also clears depth and draws with depth
//! testing and back-face culling.

use crate::backend::{ClearState, ProgramId, RenderBackend, UniformLocation};
use crate::config::Config;
use crate::controls::FlyCamera;
use crate::error::{InitError, SceneError};
use crate::mesh::load_mesh;
use crate::program::{BuiltinProgram, ProgramSource, MVP_UNIFORM};
use crate::resources::{DrawCall, GpuResourceSet};
use crate::scene::{Scene, TransformSource};
use crate::transform::{aspect_ratio, CameraPose, Projection, TransformProvider};
use crate::vertex::{random_colors, TRIANGLE_POSITIONS};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tutorial {
    Triangle,
    MvpTriangle,
    LoadingModels,
}

impl Tutorial {
    /// Default window title.
    pub fn title(self) -> &'static str {
        match self {
            Tutorial::Triangle => "Tutorial 2 - Triangle",
            Tutorial::MvpTriangle => "Tutorial 3 - Matrices",
            Tutorial::LoadingModels => "Tutorial 7 - Model Loading",
        }
    }

    /// Whether the mouse drives the camera, so the cursor should be captured.
    pub fn captures_cursor(self) -> bool {
        matches!(self, Tutorial::LoadingModels)
    }

    /// Uploads the tutorial's data, creates its program and wires up its draw.
    ///
    /// # Errors
    ///
    /// [`SceneError`] when a shader or model cannot be read, the backend rejects a buffer or
    /// program, or the configured camera is degenerate.
    pub fn build_scene<B: RenderBackend + ?Sized>(
        self,
        backend: &mut B,
        config: &Config,
    ) -> Result<Scene, SceneError> {
        let mut resources = GpuResourceSet::new();

        let scene = match self {
            Tutorial::Triangle => {
                let positions =
                    resources.upload(backend, "triangle positions", &TRIANGLE_POSITIONS)?;
                let program = create_program(backend, BuiltinProgram::Simple, config)?;
                let draw = DrawCall::builder(program)
                    .attribute(0, positions)
                    .build(&resources)?;
                Scene::new(
                    ClearState::color_only(ClearState::DARK_BLUE),
                    resources,
                    vec![draw],
                    TransformSource::None,
                )
            }
            Tutorial::MvpTriangle => {
                let positions =
                    resources.upload(backend, "triangle positions", &TRIANGLE_POSITIONS)?;
                let program = create_program(backend, BuiltinProgram::Mvp, config)?;
                let draw = DrawCall::builder(program)
                    .mvp(mvp_location(backend, program, BuiltinProgram::Mvp)?)
                    .attribute(0, positions)
                    .build(&resources)?;
                Scene::new(
                    ClearState::color_only(ClearState::DARK_BLUE),
                    resources,
                    vec![draw],
                    TransformSource::Static(camera(backend, config, config_pose(config))?),
                )
            }
            Tutorial::LoadingModels => {
                let mesh = load_mesh(&config.model_path).map_err(|source| SceneError::Mesh {
                    path: config.model_path.clone(),
                    source,
                })?;
                let colors = random_colors(mesh.vertex_count(), config.color_seed);

                let positions = resources.upload(backend, "model positions", &mesh.positions)?;
                let colors = resources.upload(backend, "model colors", &colors)?;
                let program = create_program(backend, BuiltinProgram::Colored, config)?;
                let draw = DrawCall::builder(program)
                    .mvp(mvp_location(backend, program, BuiltinProgram::Colored)?)
                    .attribute(0, positions)
                    .attribute(1, colors)
                    .build(&resources)?;

                let controls = FlyCamera::new(&config.controls, config.fov_y());
                let provider = camera(backend, config, controls.pose())?;

                Scene::new(
                    ClearState::color_and_depth(ClearState::DARK_BLUE),
                    resources,
                    vec![draw],
                    TransformSource::Dynamic {
                        provider,
                        controls: Box::new(controls),
                    },
                )
            }
        };

        log::info!(
            "{} ready: {} buffers, {} vertices",
            self.title(),
            scene.resources.len(),
            scene.draws.iter().map(|draw| draw.vertex_count).sum::<u32>()
        );
        Ok(scene)
    }
}

fn program_source(program: BuiltinProgram, config: &Config) -> Result<ProgramSource, InitError> {
    match &config.shader_dir {
        Some(dir) => ProgramSource::builtin_from_dir(program, dir),
        None => Ok(ProgramSource::builtin(program)),
    }
}

fn create_program<B: RenderBackend + ?Sized>(
    backend: &mut B,
    program: BuiltinProgram,
    config: &Config,
) -> Result<ProgramId, SceneError> {
    let source = program_source(program, config)?;
    Ok(backend.create_program(&source)?)
}

fn mvp_location<B: RenderBackend + ?Sized>(
    backend: &B,
    id: ProgramId,
    program: BuiltinProgram,
) -> Result<UniformLocation, SceneError> {
    backend
        .uniform_location(id, MVP_UNIFORM)
        .ok_or_else(|| SceneError::MissingUniform {
            label: program.name().to_owned(),
            name: MVP_UNIFORM.to_owned(),
        })
}

/// The fixed camera of the config.
fn config_pose(config: &Config) -> CameraPose {
    let camera = &config.camera;
    CameraPose::new(camera.eye, camera.target, camera.up)
}

/// The configured projection seen from `pose`, fit to the backend's current aspect ratio.
fn camera<B: RenderBackend + ?Sized>(
    backend: &B,
    config: &Config,
    pose: CameraPose,
) -> Result<TransformProvider, SceneError> {
    let (width, height) = backend.size();
    let camera = &config.camera;
    let mut provider = TransformProvider::new(
        Projection::Perspective {
            fov_y: config.fov_y(),
            aspect: aspect_ratio(width, height),
            near: camera.near,
            far: camera.far,
        },
        pose,
        camera.clip_depth,
    );
    // Reject a degenerate camera before the window shows anything.
    provider.mvp()?;
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MeshError, RenderError};
    use crate::testing::RecordingBackend;
    use nalgebra_glm::vec3;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tutorial-core-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn triangle_draws_three_vertices_without_transform() {
        let mut backend = RecordingBackend::default();
        let scene = Tutorial::Triangle
            .build_scene(&mut backend, &Config::default())
            .unwrap();

        assert_eq!(scene.draws.len(), 1);
        assert_eq!(scene.draws[0].vertex_count, 3);
        assert!(scene.draws[0].mvp.is_none());
        assert!(scene.provider().is_none());
        assert!(!scene.clear.depth);
        assert_eq!(backend.buffer_sizes, vec![36]);
        assert_eq!(backend.programs[0].0, "simple");
    }

    #[test]
    fn mvp_triangle_uses_a_static_camera() {
        let mut backend = RecordingBackend::default();
        let scene = Tutorial::MvpTriangle
            .build_scene(&mut backend, &Config::default())
            .unwrap();

        assert!(scene.draws[0].mvp.is_some());
        assert!(matches!(scene.transform, TransformSource::Static(_)));
        let provider = scene.provider().unwrap();
        assert_eq!(provider.pose().eye, vec3(4.0, 3.0, 3.0));
        match provider.projection() {
            Projection::Perspective { aspect, .. } => assert_eq!(*aspect, 1024.0 / 768.0),
            other => panic!("unexpected projection: {other:?}"),
        }
    }

    #[test]
    fn degenerate_camera_is_rejected() {
        let mut config = Config::default();
        config.camera.eye = config.camera.target;
        let mut backend = RecordingBackend::default();
        assert!(matches!(
            Tutorial::MvpTriangle.build_scene(&mut backend, &config),
            Err(SceneError::Transform(_))
        ));
    }

    #[test]
    fn loading_models_colors_every_vertex() {
        let dir = scratch_dir("model");
        let model = dir.join("tri.obj");
        std::fs::write(&model, "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3\nf 2 4 3\n").unwrap();
        let config = Config {
            model_path: model,
            ..Config::default()
        };

        let mut backend = RecordingBackend::default();
        let scene = Tutorial::LoadingModels
            .build_scene(&mut backend, &config)
            .unwrap();

        assert_eq!(scene.draws[0].vertex_count, 6);
        assert_eq!(scene.draws[0].attributes.len(), 2);
        assert_eq!(backend.buffer_sizes, vec![72, 72]);
        assert!(scene.clear.depth);
        assert!(matches!(scene.transform, TransformSource::Dynamic { .. }));
        assert_eq!(scene.provider().unwrap().pose().eye, vec3(0.0, 0.0, 5.0));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn loading_models_ignores_the_fixed_camera() {
        let dir = scratch_dir("fixed-camera");
        let model = dir.join("tri.obj");
        std::fs::write(&model, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let mut config = Config {
            model_path: model,
            ..Config::default()
        };
        config.camera.eye = config.camera.target;

        let mut backend = RecordingBackend::default();
        let scene = Tutorial::LoadingModels
            .build_scene(&mut backend, &config)
            .unwrap();
        assert_eq!(scene.provider().unwrap().pose().eye, vec3(0.0, 0.0, 5.0));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn loading_models_rejects_a_degenerate_fly_camera() {
        let dir = scratch_dir("fly-camera");
        let model = dir.join("tri.obj");
        std::fs::write(&model, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let mut config = Config {
            model_path: model,
            ..Config::default()
        };
        config.controls.position.x = f32::NAN;

        let mut backend = RecordingBackend::default();
        assert!(matches!(
            Tutorial::LoadingModels.build_scene(&mut backend, &config),
            Err(SceneError::Transform(_))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_model_names_the_path() {
        let config = Config {
            model_path: PathBuf::from("no/such/model.obj"),
            ..Config::default()
        };
        let mut backend = RecordingBackend::default();
        match Tutorial::LoadingModels.build_scene(&mut backend, &config) {
            Err(SceneError::Mesh { path, source }) => {
                assert_eq!(path, PathBuf::from("no/such/model.obj"));
                assert!(matches!(source, MeshError::Parse(_)));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("scene built without a model"),
        }
    }

    #[test]
    fn program_failures_are_reported() {
        let mut backend = RecordingBackend::default();
        backend.reject_programs = true;
        assert!(matches!(
            Tutorial::Triangle.build_scene(&mut backend, &Config::default()),
            Err(SceneError::Render(RenderError::ProgramCreation { .. }))
        ));
    }

    #[test]
    fn shader_dir_overrides_embedded_sources() {
        let dir = scratch_dir("shader-dir");
        let config = Config {
            shader_dir: Some(dir.clone()),
            ..Config::default()
        };
        let mut backend = RecordingBackend::default();
        assert!(matches!(
            Tutorial::Triangle.build_scene(&mut backend, &config),
            Err(SceneError::Shader(InitError::ShaderRead { .. }))
        ));

        std::fs::write(dir.join("simple.vert.wgsl"), "// vertex").unwrap();
        std::fs::write(dir.join("simple.frag.wgsl"), "// fragment").unwrap();
        let mut backend = RecordingBackend::default();
        assert!(Tutorial::Triangle.build_scene(&mut backend, &config).is_ok());

        std::fs::remove_dir_all(&dir).ok();
    }
}
