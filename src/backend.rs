//! # Rendering Backend
//!
//! The narrow GPU contract the frame loop drives. It mirrors the immediate-mode protocol of the
//! tutorials: clear, activate a program, upload its uniforms, enable and bind attribute buffers,
//! draw, disable the attributes again and present.
//!
//! ## Implementations
//!
//! - [`crate::Renderer`]: records the protocol into `wgpu` render passes.
//! - A recording backend used by the unit tests.
//!
//! ## Shared Validation
//!
//! [`BindingState`] tracks the active program and the enabled attribute slots. Backends route
//! every `use_program`, `enable_attribute`, `disable_attribute` and `draw_arrays` through it, so
//! binding a buffer whose layout disagrees with the program, or drawing while one of the
//! program's slots has nothing bound, is reported as a [`RenderError`] instead of reading
//! undefined data.

use std::collections::BTreeMap;

use crate::error::RenderError;
use crate::program::{ProgramLayout, ProgramSource};
use crate::vertex::AttributeLayout;

/// Opaque handle of a GPU buffer created by a backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// Opaque handle of a program created by a backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub usize);

/// Location of a named uniform inside a program.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub program: ProgramId,
    pub index: usize,
}

/// What to clear at the start of a frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearState {
    /// RGBA clear color.
    pub color: [f64; 4],
    /// Also reset the depth buffer to the far plane.
    pub depth: bool,
}

impl ClearState {
    /// The dark blue background of the tutorials.
    pub const DARK_BLUE: [f64; 4] = [0.0, 0.0, 0.4, 0.0];

    pub fn color_only(color: [f64; 4]) -> Self {
        Self {
            color,
            depth: false,
        }
    }

    pub fn color_and_depth(color: [f64; 4]) -> Self {
        Self { color, depth: true }
    }
}

/// A GPU backend speaking the tutorial render protocol.
///
/// Creation methods are called before the frame loop starts; their failures are fatal.
/// Per-frame methods are called in protocol order once per iteration.
pub trait RenderBackend {
    /// Uploads `contents` into a new immutable vertex buffer.
    fn create_buffer(&mut self, label: &str, contents: &[u8]) -> Result<BufferId, RenderError>;

    /// Compiles a program. Invalid shader sources are reported as
    /// [`RenderError::ProgramCreation`].
    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId, RenderError>;

    /// Looks up a uniform declared by `program`.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Current size of the render target in pixels.
    fn size(&self) -> (u32, u32);

    /// Resizes the render target. Zero-sized requests are ignored.
    fn resize(&mut self, width: u32, height: u32);

    /// Begins a frame by clearing the render target.
    fn clear(&mut self, clear: &ClearState) -> Result<(), RenderError>;

    fn use_program(&mut self, program: ProgramId) -> Result<(), RenderError>;

    fn set_uniform_mat4(
        &mut self,
        location: UniformLocation,
        matrix: &nalgebra_glm::Mat4,
    ) -> Result<(), RenderError>;

    /// Enables attribute `slot` and binds `buffer` to it with the given layout.
    fn enable_attribute(
        &mut self,
        slot: u32,
        buffer: BufferId,
        layout: &AttributeLayout,
    ) -> Result<(), RenderError>;

    /// Draws `count` vertices starting at `first` as a triangle list.
    fn draw_arrays(&mut self, first: u32, count: u32) -> Result<(), RenderError>;

    fn disable_attribute(&mut self, slot: u32);

    /// Finishes the frame and hands it to the display. May block for vertical sync.
    fn present(&mut self) -> Result<(), RenderError>;
}

/// One enabled attribute slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributeBinding {
    pub slot: u32,
    pub buffer: BufferId,
    pub layout: AttributeLayout,
}

/// Active program and enabled attribute slots of a backend.
///
/// Like the GL vertex array state it models, enabled slots survive a program switch and stay
/// enabled until explicitly disabled.
#[derive(Debug, Default, Clone)]
pub struct BindingState {
    program: Option<ProgramId>,
    enabled: BTreeMap<u32, AttributeBinding>,
}

impl BindingState {
    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn use_program(&mut self, program: ProgramId) {
        self.program = Some(program);
    }

    pub fn is_enabled(&self, slot: u32) -> bool {
        self.enabled.contains_key(&slot)
    }

    /// Enables `slot` after checking it against the active program.
    ///
    /// # Errors
    ///
    /// - [`RenderError::NoActiveProgram`] when no program is active.
    /// - [`RenderError::UnexpectedAttribute`] when the program has no input at `slot`.
    /// - [`RenderError::LayoutMismatch`] when `layout` differs from the declared one.
    pub fn enable(
        &mut self,
        program: &ProgramLayout,
        label: &str,
        slot: u32,
        buffer: BufferId,
        layout: &AttributeLayout,
    ) -> Result<(), RenderError> {
        if self.program.is_none() {
            return Err(RenderError::NoActiveProgram);
        }
        let declared = program
            .attribute(slot)
            .ok_or_else(|| RenderError::UnexpectedAttribute {
                label: label.to_owned(),
                slot,
            })?;
        if declared.layout != *layout {
            return Err(RenderError::LayoutMismatch {
                label: label.to_owned(),
                slot,
            });
        }

        self.enabled.insert(
            slot,
            AttributeBinding {
                slot,
                buffer,
                layout: *layout,
            },
        );
        Ok(())
    }

    pub fn disable(&mut self, slot: u32) {
        self.enabled.remove(&slot);
    }

    /// Resolves the bindings a draw with `program` reads, in the program's attribute order.
    ///
    /// # Errors
    ///
    /// [`RenderError::UnboundAttribute`] for the first declared slot with nothing enabled.
    pub fn draw_bindings(
        &self,
        program: &ProgramLayout,
        label: &str,
    ) -> Result<Vec<AttributeBinding>, RenderError> {
        program
            .attributes
            .iter()
            .map(|attribute| {
                self.enabled
                    .get(&attribute.slot)
                    .copied()
                    .ok_or_else(|| RenderError::UnboundAttribute {
                        label: label.to_owned(),
                        slot: attribute.slot,
                    })
            })
            .collect()
    }
}

/// Bytes a draw of `count` vertices from `first` reads from a buffer with `layout`.
pub fn required_bytes(layout: &AttributeLayout, first: u32, count: u32) -> u64 {
    if count == 0 {
        return 0;
    }
    let last = first as u64 + count as u64 - 1;
    layout.offset + last * layout.stride + layout.element_size()
}
