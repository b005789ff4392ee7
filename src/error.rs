//! # Errors
//!
//! Typed failures for every layer of the tutorial renderer. Each enum derives
//! [`thiserror::Error`] so the binaries can wrap them in `anyhow` context chains.
//!
//! ## Taxonomy
//!
//! - **Fatal at startup**: [`InitError`], [`ConfigError`], [`MeshError`] and the creation
//!   variants of [`RenderError`]. The binaries report these on stderr and exit with a
//!   nonzero status before the frame loop starts.
//! - **Validation**: [`ResourceError`] and [`TransformError`] reject malformed buffers, draws
//!   or camera parameters before anything reaches the GPU.
//! - **Runtime**: the remaining [`RenderError`] variants stop the frame loop and are returned
//!   to the caller instead of being silently ignored.

use std::path::PathBuf;

/// Invalid camera or projection parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("field of view must lie in (0, pi) radians, got {0}")]
    InvalidFieldOfView(f32),

    #[error("aspect ratio must be positive and finite, got {0}")]
    InvalidAspectRatio(f32),

    #[error("depth range requires 0 < near < far, got near={near} far={far}")]
    InvalidDepthRange { near: f32, far: f32 },

    #[error("orthographic bounds collapse on the {0} axis")]
    DegenerateBounds(&'static str),

    /// The eye sits on the target, leaving the viewing direction undefined.
    #[error("look-at eye and target coincide")]
    DegenerateView,

    /// The up vector is zero or parallel to the viewing direction.
    #[error("look-at up vector is parallel to the viewing direction")]
    DegenerateUp,

    /// An input holds an infinity or NaN, or the result overflowed.
    #[error("{0} is not finite")]
    NonFinite(&'static str),
}

/// Misuse of the GPU resource set or a malformed draw.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("attribute handle {0} does not belong to this resource set")]
    UnknownHandle(usize),

    #[error("draw has no attribute buffers")]
    NoAttributes,

    #[error("attribute slot {0} is bound twice in one draw")]
    DuplicateSlot(u32),

    /// Parallel attribute buffers must hold the same number of elements.
    #[error("attribute slot {slot} holds {actual} elements but slot {reference_slot} holds {expected}")]
    LengthMismatch {
        slot: u32,
        actual: u32,
        reference_slot: u32,
        expected: u32,
    },

    #[error("draw requests {requested} vertices but the bound buffers hold {available}")]
    VertexCountOutOfRange { requested: u32, available: u32 },
}

/// Failures raised by a rendering backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter was found")]
    AdapterUnavailable,

    #[error("failed to create the rendering surface: {0}")]
    SurfaceCreation(String),

    #[error("failed to request a GPU device: {0}")]
    DeviceRequest(String),

    #[error("failed to create program `{label}`: {reason}")]
    ProgramCreation { label: String, reason: String },

    #[error("unknown program handle {0}")]
    UnknownProgram(usize),

    #[error("program `{label}` has no uniform at index {index}")]
    UnknownUniform { label: String, index: usize },

    #[error("unknown buffer handle {0}")]
    UnknownBuffer(usize),

    #[error("buffer `{0}` holds more than u32::MAX elements")]
    BufferTooLarge(String),

    #[error("no program is active")]
    NoActiveProgram,

    #[error("program `{label}` has no attribute at slot {slot}")]
    UnexpectedAttribute { label: String, slot: u32 },

    #[error("attribute slot {slot} layout does not match program `{label}`")]
    LayoutMismatch { label: String, slot: u32 },

    /// A draw was issued while a slot read by the active program had no buffer bound.
    #[error("attribute slot {slot} used by program `{label}` has no buffer bound")]
    UnboundAttribute { label: String, slot: u32 },

    #[error("draw reads past the end of the buffer bound at slot {slot}")]
    BufferOverrun { slot: u32 },

    #[error("surface error: {0}")]
    Surface(String),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Failures while reading a mesh file.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("failed to parse mesh: {0}")]
    Parse(#[from] tobj::LoadError),

    #[error("mesh has no triangles")]
    Empty,

    #[error("mesh face index {index} is out of range for {len} elements")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Failures while loading the JSON configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Startup failures outside of the GPU backend.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to create the event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to open window: {0}")]
    WindowCreation(String),

    #[error("failed to read shader {path}: {source}")]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while assembling a tutorial's scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Shader(#[from] InitError),

    #[error("failed to load model {path}: {source}")]
    Mesh {
        path: PathBuf,
        #[source]
        source: MeshError,
    },

    #[error("program `{label}` does not declare the `{name}` uniform")]
    MissingUniform { label: String, name: String },
}
