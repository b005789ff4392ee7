//! # Tutorial Renderer Library
//!
//! This library holds everything the three tutorial binaries share: a red triangle in clip space,
//! the same triangle seen through a model-view-projection matrix, and an OBJ model with random
//! per-vertex colors that the user flies around with the keyboard and mouse. Rendering goes through
//! `wgpu`, windowing and input through `winit`.
//!
//! ## Modules
//!
//! - [`app`]: Startup sequence shared by the binaries: config, logging, window, GPU, scene, loop.
//! - [`config`]: JSON configuration with defaults for every field.
//! - [`window`]: The window/input contract and its `winit` implementation.
//! - [`frame_loop`]: Clear, draw, present and poll, once per iteration, until the user leaves.
//! - [`backend`]: The immediate-mode rendering contract the frame loop speaks.
//! - [`renderer`]: The `wgpu` implementation of that contract.
//! - [`gpu`]: Device, queue and surface setup.
//! - [`program`]: Shader programs, their attribute layouts and uniforms.
//! - [`resources`]: Attribute buffers uploaded once and the draws that read them.
//! - [`scene`]: What a tutorial draws and where its camera comes from.
//! - [`transform`]: Projection, view and model matrices.
//! - [`controls`]: First-person camera controls.
//! - [`mesh`]: OBJ loading.
//! - [`tutorial`]: The three scenes.
//! - [`vertex`]: Attribute layouts and built-in vertex data.
//! - [`uniform_buffer`] and [`uniform_binding`]: The `MVP` matrix on the GPU.
//! - [`clock`]: Per-frame delta time.
//! - [`error`] and [`logging`]: Error types and `env_logger` setup.
//!
//! ## Usage
//!
//! Each binary is a one-liner around [`run_from_args`]:
//!
//! ```ignore
//! fn main() -> std::process::ExitCode {
//!     tutorial_core::run_from_args(tutorial_core::Tutorial::Triangle)
//! }
//! ```
//!
//! The first command line argument, if present, names a JSON config file. Without it
//! `resources/config/default_config.json` is used when it exists, and built-in defaults otherwise.
//!
//! ## Driving a Scene by Hand
//!
//! The frame loop only knows the [`WindowProvider`] and [`RenderBackend`] traits, so the pieces
//! can be assembled without [`run`]:
//!
//! ```ignore
//! let config = Config::load(None)?;
//! let mut window = WinitWindow::create(&config.window)?;
//! let (width, height) = window.framebuffer_size();
//! let mut renderer = pollster::block_on(Renderer::new(window.handle(), width, height))?;
//! let mut scene = Tutorial::MvpTriangle.build_scene(&mut renderer, &config)?;
//! let frames = FrameLoop::new(&mut window, &mut renderer).run(&mut scene)?;
//! ```
//!
//! ## Dependencies
//!
//! - `wgpu`: Render pipelines, buffers and surface presentation.
//! - `winit`: Window creation and event handling.
//! - `nalgebra-glm`: Matrix and vector math.
//! - `tobj`: Wavefront OBJ parsing.
//! - `serde` and `serde_json`: Configuration.
//! - `log` and `env_logger`: Logging.
//! - `thiserror` and `anyhow`: Typed errors in the library, context chains in the binaries.

mod app;
mod backend;
mod clock;
mod config;
mod controls;
mod error;
mod frame_loop;
mod gpu;
mod logging;
mod mesh;
mod program;
mod renderer;
mod resources;
mod scene;
mod transform;
mod tutorial;
mod uniform_binding;
mod uniform_buffer;
mod vertex;
mod window;

#[cfg(test)]
mod testing;

pub use crate::app::{run, run_from_args};
pub use crate::backend::{BufferId, ClearState, ProgramId, RenderBackend, UniformLocation};
pub use crate::clock::{FrameClock, FrameTime};
pub use crate::config::{
    CameraConfig, Config, ControlsConfig, LoggingConfig, WindowConfig, DEFAULT_CONFIG_PATH,
};
pub use crate::controls::{FlyCamera, PoseSource, PoseUpdate};
pub use crate::error::{
    ConfigError, InitError, MeshError, RenderError, ResourceError, SceneError, TransformError,
};
pub use crate::frame_loop::{FrameLoop, LoopState};
pub use crate::gpu::Gpu;
pub use crate::logging::init_logging;
pub use crate::mesh::{load_mesh, parse_mesh, Mesh};
pub use crate::program::{BuiltinProgram, ProgramLayout, ProgramSource, MVP_UNIFORM};
pub use crate::renderer::Renderer;
pub use crate::resources::{AttributeHandle, DrawCall, DrawCallBuilder, GpuResourceSet};
pub use crate::scene::{Scene, TransformSource};
pub use crate::transform::{
    aspect_ratio, combine, look_at, orthographic, perspective, CameraPose, ClipDepth, Projection,
    TransformProvider,
};
pub use crate::tutorial::Tutorial;
pub use crate::vertex::{random_colors, AttributeLayout, TRIANGLE_POSITIONS};
pub use crate::window::{InputSnapshot, InputState, WindowProvider, WinitWindow};
