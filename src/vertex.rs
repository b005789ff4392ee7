//! # Vertex Data
//!
//! Describes how per-vertex attribute streams are laid out in GPU memory and provides the
//! static vertex data the tutorials upload.
//!
//! ## Overview
//!
//! Every attribute (position, color, UV) lives in its own tightly packed buffer of `f32`
//! tuples, mirroring one shader input slot each. The [`AttributeLayout`] of such a buffer is
//! what the frame loop hands to the backend when it binds the buffer:
//!
//! - **components**: floats per element (3 for positions and colors, 2 for UVs),
//! - **normalized**: whether integer data is rescaled to `[0, 1]` (always `false` for floats),
//! - **stride**: bytes between consecutive elements,
//! - **offset**: bytes before the first element.
//!
//! ## Data
//!
//! - [`TRIANGLE_POSITIONS`]: the single triangle drawn by the first two tutorials.
//! - [`random_colors`]: seeded per-vertex colors for the loaded model, one RGB triple per vertex.

/// Size of one `f32` component in bytes.
const COMPONENT_SIZE: u64 = std::mem::size_of::<f32>() as u64;

/// Memory layout of one attribute buffer.
///
/// Elements are always `f32`. The layout is validated against the active program when the
/// buffer is bound, so a buffer described here must match the shader input at its slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributeLayout {
    /// Number of `f32` components per element (1 to 4).
    pub components: u32,
    /// Whether integer data should be rescaled. Must be `false` for `f32` elements.
    pub normalized: bool,
    /// Distance between consecutive elements in bytes.
    pub stride: u64,
    /// Byte offset of the first element.
    pub offset: u64,
}

impl AttributeLayout {
    /// A tightly packed, non-normalized stream of `components` floats per element.
    pub const fn packed(components: u32) -> Self {
        Self {
            components,
            normalized: false,
            stride: components as u64 * COMPONENT_SIZE,
            offset: 0,
        }
    }

    /// Size of a single element in bytes.
    pub fn element_size(&self) -> u64 {
        self.components as u64 * COMPONENT_SIZE
    }

    /// Maps the layout onto a `wgpu` vertex format.
    ///
    /// # Returns
    ///
    /// `None` when the component count is outside `1..=4` or when normalization is requested,
    /// since `wgpu` has no normalized float formats.
    pub fn vertex_format(&self) -> Option<wgpu::VertexFormat> {
        if self.normalized {
            return None;
        }
        match self.components {
            1 => Some(wgpu::VertexFormat::Float32),
            2 => Some(wgpu::VertexFormat::Float32x2),
            3 => Some(wgpu::VertexFormat::Float32x3),
            4 => Some(wgpu::VertexFormat::Float32x4),
            _ => None,
        }
    }

    /// Returns the `wgpu` attribute that feeds this layout into shader location `slot`.
    ///
    /// The attribute itself sits at offset 0; the backend binds the buffer starting at
    /// [`offset`](Self::offset) instead.
    pub fn vertex_attribute(&self, slot: u32) -> Option<wgpu::VertexAttribute> {
        Some(wgpu::VertexAttribute {
            format: self.vertex_format()?,
            offset: 0,
            shader_location: slot,
        })
    }

    /// Builds the vertex buffer layout for a buffer carrying exactly `attributes`.
    ///
    /// The attribute slice must outlive the returned layout, which only borrows it. Pipeline
    /// creation collects the attributes first and then calls this once per buffer.
    pub fn buffer_layout<'a>(
        &self,
        attributes: &'a [wgpu::VertexAttribute],
    ) -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// The three corners of the tutorial triangle in normalized device coordinates.
///
/// Counter-clockwise when seen from `+Z`, which is the front face for the default pipeline state.
pub const TRIANGLE_POSITIONS: [[f32; 3]; 3] = [
    [-1.0, -1.0, 0.0],
    [1.0, -1.0, 0.0],
    [0.0, 1.0, 0.0],
];

/// Generates `count` pseudo-random RGB colors with every channel in `[0, 1)`.
///
/// The sequence depends only on `seed`, so a model gets the same colors on every run.
pub fn random_colors(count: usize, seed: u64) -> Vec<[f32; 3]> {
    let mut state = seed;
    let mut next_channel = move || {
        // SplitMix64
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 40) as f32 / (1u64 << 24) as f32
    };

    (0..count)
        .map(|_| [next_channel(), next_channel(), next_channel()])
        .collect()
}
