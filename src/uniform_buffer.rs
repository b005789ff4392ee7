//! # Matrix Uniform
//!
//! CPU-side mirror of the `mat4x4<f32>` uniform blocks declared by the tutorial shaders.
//!
//! ## Memory Layout
//!
//! WGSL stores a `mat4x4<f32>` as four column vectors of four floats, which is exactly how
//! `nalgebra_glm::Mat4` is laid out. The struct is `#[repr(C)]` and implements
//! [`bytemuck::Pod`], so a value can be written to a GPU buffer with
//! `bytemuck::bytes_of` and no manual transposition.
//!
//! ## Usage
//!
//! ```ignore
//! let uniform = MatrixUniform::from(mvp);
//! queue.write_buffer(&buffer, 0, bytemuck::bytes_of(&uniform));
//! ```

/// A single 4x4 matrix uniform, such as the tutorial's `MVP`.
///
/// The default value is the zero matrix, which collapses every vertex onto the origin. Buffers
/// start out that way until the frame loop writes the first real matrix.
#[repr(C)]
#[derive(Default, Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MatrixUniform {
    /// Column-major matrix as consumed by the vertex shader.
    pub matrix: nalgebra_glm::Mat4,
}

impl MatrixUniform {
    /// Size of the uniform block in bytes.
    pub const SIZE: wgpu::BufferAddress = std::mem::size_of::<Self>() as wgpu::BufferAddress;
}

impl From<nalgebra_glm::Mat4> for MatrixUniform {
    fn from(matrix: nalgebra_glm::Mat4) -> Self {
        Self { matrix }
    }
}
