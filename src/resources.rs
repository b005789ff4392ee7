//! # GPU Resource Set
//!
//! Owns the attribute buffers a tutorial uploads before its frame loop starts and assembles
//! validated draw calls from them.
//!
//! ## Overview
//!
//! - [`GpuResourceSet::upload`] copies a sequence of fixed-size `f32` tuples (positions,
//!   colors, UVs) into a new immutable GPU buffer and returns an [`AttributeHandle`].
//! - [`GpuResourceSet::count`] reports how many tuples a handle holds.
//! - [`DrawCall::builder`] combines a program, its MVP uniform and attribute handles into a
//!   [`DrawCall`], checking the handles against each other before anything is drawn.
//!
//! Buffers are never resized, updated or deleted; they live as long as the set.
//!
//! ## Validation
//!
//! Zero-length uploads are accepted. A draw built from them covers zero vertices and is skipped
//! by the frame loop. Asking a draw for more vertices than its buffers hold, or pairing
//! buffers of different lengths, is rejected with a [`ResourceError`].

use crate::backend::{BufferId, ProgramId, RenderBackend, UniformLocation};
use crate::error::{RenderError, ResourceError};
use crate::vertex::AttributeLayout;

/// Handle of an attribute buffer inside a [`GpuResourceSet`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttributeHandle(usize);

#[derive(Debug, Clone)]
struct AttributeBuffer {
    label: String,
    buffer: BufferId,
    layout: AttributeLayout,
    count: u32,
}

/// The attribute buffers of one tutorial.
#[derive(Debug, Default)]
pub struct GpuResourceSet {
    buffers: Vec<AttributeBuffer>,
}

impl GpuResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads `data` as one tightly packed buffer of `N`-component elements.
    ///
    /// # Parameters
    ///
    /// - `backend`: creates the GPU buffer.
    /// - `label`: debug name of the buffer.
    /// - `data`: the elements; may be empty.
    ///
    /// # Returns
    ///
    /// A handle whose [`count`](Self::count) is `data.len()` and whose layout is
    /// [`AttributeLayout::packed(N)`](AttributeLayout::packed).
    pub fn upload<B: RenderBackend + ?Sized, const N: usize>(
        &mut self,
        backend: &mut B,
        label: &str,
        data: &[[f32; N]],
    ) -> Result<AttributeHandle, RenderError> {
        let layout = AttributeLayout::packed(N as u32);
        let bytes: &[u8] = bytemuck::cast_slice(data);
        debug_assert_eq!(bytes.len() as u64, data.len() as u64 * layout.element_size());

        let count = u32::try_from(data.len())
            .map_err(|_| RenderError::BufferTooLarge(label.to_owned()))?;
        let buffer = backend.create_buffer(label, bytes)?;
        log::debug!("uploaded `{label}`: {count} x {N} floats ({} bytes)", bytes.len());

        self.buffers.push(AttributeBuffer {
            label: label.to_owned(),
            buffer,
            layout,
            count,
        });
        Ok(AttributeHandle(self.buffers.len() - 1))
    }

    fn entry(&self, handle: AttributeHandle) -> Result<&AttributeBuffer, ResourceError> {
        self.buffers
            .get(handle.0)
            .ok_or(ResourceError::UnknownHandle(handle.0))
    }

    /// Number of elements uploaded for `handle`.
    pub fn count(&self, handle: AttributeHandle) -> Result<u32, ResourceError> {
        Ok(self.entry(handle)?.count)
    }

    pub fn layout(&self, handle: AttributeHandle) -> Result<AttributeLayout, ResourceError> {
        Ok(self.entry(handle)?.layout)
    }

    pub fn buffer(&self, handle: AttributeHandle) -> Result<BufferId, ResourceError> {
        Ok(self.entry(handle)?.buffer)
    }

    pub fn label(&self, handle: AttributeHandle) -> Result<&str, ResourceError> {
        Ok(&self.entry(handle)?.label)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

/// An attribute buffer bound to a shader slot for one draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoundAttribute {
    pub slot: u32,
    pub buffer: BufferId,
    pub layout: AttributeLayout,
}

/// A validated draw: program, optional MVP uniform, attribute buffers and vertex count.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub mvp: Option<UniformLocation>,
    /// Bound and unbound in this order every frame.
    pub attributes: Vec<BoundAttribute>,
    pub vertex_count: u32,
}

impl DrawCall {
    pub fn builder(program: ProgramId) -> DrawCallBuilder {
        DrawCallBuilder {
            program,
            mvp: None,
            attributes: Vec::new(),
            vertex_count: None,
        }
    }
}

/// Collects the pieces of a [`DrawCall`]; see [`DrawCallBuilder::build`].
#[derive(Debug, Clone)]
pub struct DrawCallBuilder {
    program: ProgramId,
    mvp: Option<UniformLocation>,
    attributes: Vec<(u32, AttributeHandle)>,
    vertex_count: Option<u32>,
}

impl DrawCallBuilder {
    /// Uploads the frame's MVP matrix to `location` before drawing.
    pub fn mvp(mut self, location: UniformLocation) -> Self {
        self.mvp = Some(location);
        self
    }

    /// Binds `handle` to shader `slot`. Slots are bound in the order they are added.
    pub fn attribute(mut self, slot: u32, handle: AttributeHandle) -> Self {
        self.attributes.push((slot, handle));
        self
    }

    /// Draws fewer vertices than the buffers hold. Defaults to the full length.
    pub fn vertex_count(mut self, count: u32) -> Self {
        self.vertex_count = Some(count);
        self
    }

    /// Validates the draw against `resources`.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::NoAttributes`] when no attribute was added.
    /// - [`ResourceError::DuplicateSlot`] when a slot is bound twice.
    /// - [`ResourceError::UnknownHandle`] for handles from another set.
    /// - [`ResourceError::LengthMismatch`] when the buffers hold different element counts.
    /// - [`ResourceError::VertexCountOutOfRange`] when the requested count exceeds them.
    pub fn build(self, resources: &GpuResourceSet) -> Result<DrawCall, ResourceError> {
        let (&(first_slot, first_handle), _) = self
            .attributes
            .split_first()
            .ok_or(ResourceError::NoAttributes)?;
        let available = resources.count(first_handle)?;

        let mut attributes = Vec::with_capacity(self.attributes.len());
        for &(slot, handle) in &self.attributes {
            if attributes
                .iter()
                .any(|bound: &BoundAttribute| bound.slot == slot)
            {
                return Err(ResourceError::DuplicateSlot(slot));
            }
            let entry = resources.entry(handle)?;
            if entry.count != available {
                return Err(ResourceError::LengthMismatch {
                    slot,
                    actual: entry.count,
                    reference_slot: first_slot,
                    expected: available,
                });
            }
            attributes.push(BoundAttribute {
                slot,
                buffer: entry.buffer,
                layout: entry.layout,
            });
        }

        let vertex_count = self.vertex_count.unwrap_or(available);
        if vertex_count > available {
            return Err(ResourceError::VertexCountOutOfRange {
                requested: vertex_count,
                available,
            });
        }

        Ok(DrawCall {
            program: self.program,
            mvp: self.mvp,
            attributes,
            vertex_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBackend;
    use crate::vertex::TRIANGLE_POSITIONS;

    #[test]
    fn upload_reports_element_count() {
        let mut backend = RecordingBackend::default();
        let mut resources = GpuResourceSet::new();
        let handle = resources
            .upload(&mut backend, "positions", &TRIANGLE_POSITIONS)
            .unwrap();

        assert_eq!(resources.count(handle), Ok(3));
        assert_eq!(resources.layout(handle), Ok(AttributeLayout::packed(3)));
        assert_eq!(resources.label(handle), Ok("positions"));
        assert_eq!(backend.buffer_sizes, vec![36]);
    }

    #[test]
    fn upload_accepts_empty_sequences() {
        let mut backend = RecordingBackend::default();
        let mut resources = GpuResourceSet::new();
        let empty: [[f32; 2]; 0] = [];
        let handle = resources.upload(&mut backend, "uvs", &empty).unwrap();

        assert_eq!(resources.count(handle), Ok(0));
        assert_eq!(resources.layout(handle).unwrap().components, 2);
        assert_eq!(backend.buffer_sizes, vec![0]);
    }

    #[test]
    fn handles_from_other_sets_are_rejected() {
        let mut backend = RecordingBackend::default();
        let mut resources = GpuResourceSet::new();
        let handle = resources
            .upload(&mut backend, "positions", &TRIANGLE_POSITIONS)
            .unwrap();
        let other = GpuResourceSet::new();
        assert_eq!(other.count(handle), Err(ResourceError::UnknownHandle(0)));
    }

    #[test]
    fn draw_covers_whole_buffer_by_default() {
        let mut backend = RecordingBackend::default();
        let mut resources = GpuResourceSet::new();
        let positions = resources
            .upload(&mut backend, "positions", &TRIANGLE_POSITIONS)
            .unwrap();
        let colors = resources
            .upload(&mut backend, "colors", &[[1.0, 0.0, 0.0]; 3])
            .unwrap();

        let draw = DrawCall::builder(ProgramId(0))
            .attribute(0, positions)
            .attribute(1, colors)
            .build(&resources)
            .unwrap();

        assert_eq!(draw.vertex_count, 3);
        let slots: Vec<u32> = draw.attributes.iter().map(|a| a.slot).collect();
        assert_eq!(slots, vec![0, 1]);
        assert_eq!(draw.attributes[1].buffer, resources.buffer(colors).unwrap());
    }

    #[test]
    fn draw_rejects_mismatched_lengths() {
        let mut backend = RecordingBackend::default();
        let mut resources = GpuResourceSet::new();
        let positions = resources
            .upload(&mut backend, "positions", &TRIANGLE_POSITIONS)
            .unwrap();
        let colors = resources
            .upload(&mut backend, "colors", &[[1.0, 0.0, 0.0]; 2])
            .unwrap();

        let error = DrawCall::builder(ProgramId(0))
            .attribute(0, positions)
            .attribute(1, colors)
            .build(&resources)
            .unwrap_err();
        assert_eq!(
            error,
            ResourceError::LengthMismatch {
                slot: 1,
                actual: 2,
                reference_slot: 0,
                expected: 3,
            }
        );
    }

    #[test]
    fn draw_rejects_nonzero_count_on_empty_buffer() {
        let mut backend = RecordingBackend::default();
        let mut resources = GpuResourceSet::new();
        let empty: [[f32; 3]; 0] = [];
        let positions = resources.upload(&mut backend, "positions", &empty).unwrap();

        let zero = DrawCall::builder(ProgramId(0))
            .attribute(0, positions)
            .build(&resources)
            .unwrap();
        assert_eq!(zero.vertex_count, 0);

        let error = DrawCall::builder(ProgramId(0))
            .attribute(0, positions)
            .vertex_count(3)
            .build(&resources)
            .unwrap_err();
        assert_eq!(
            error,
            ResourceError::VertexCountOutOfRange {
                requested: 3,
                available: 0,
            }
        );
    }

    #[test]
    fn draw_rejects_missing_and_duplicate_slots() {
        let mut backend = RecordingBackend::default();
        let mut resources = GpuResourceSet::new();
        let positions = resources
            .upload(&mut backend, "positions", &TRIANGLE_POSITIONS)
            .unwrap();

        assert_eq!(
            DrawCall::builder(ProgramId(0)).build(&resources),
            Err(ResourceError::NoAttributes)
        );
        assert_eq!(
            DrawCall::builder(ProgramId(0))
                .attribute(0, positions)
                .attribute(0, positions)
                .build(&resources),
            Err(ResourceError::DuplicateSlot(0))
        );
    }
}
