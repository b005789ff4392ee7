//! Test doubles for the backend and window contracts.

use std::collections::VecDeque;

use winit::keyboard::KeyCode;

use crate::backend::{BindingState, BufferId, ClearState, ProgramId, RenderBackend, UniformLocation};
use crate::error::RenderError;
use crate::program::{ProgramLayout, ProgramSource};
use crate::vertex::AttributeLayout;
use crate::window::{InputSnapshot, InputState, WindowProvider};

/// One backend call, as recorded by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Clear(ClearState),
    UseProgram(ProgramId),
    SetUniform(UniformLocation, nalgebra_glm::Mat4),
    Enable(u32, BufferId),
    Draw(u32, u32),
    Disable(u32),
    Present,
    Resize(u32, u32),
}

/// Backend that validates like a real one and records every per-frame call.
#[derive(Debug)]
pub struct RecordingBackend {
    /// Byte length of every created buffer, by id.
    pub buffer_sizes: Vec<usize>,
    pub programs: Vec<(String, ProgramLayout)>,
    pub calls: Vec<Call>,
    pub size: (u32, u32),
    /// Makes `create_program` fail.
    pub reject_programs: bool,
    bindings: BindingState,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            buffer_sizes: Vec::new(),
            programs: Vec::new(),
            calls: Vec::new(),
            size: (1024, 768),
            reject_programs: false,
            bindings: BindingState::default(),
        }
    }
}

impl RecordingBackend {
    fn active(&self) -> Result<&(String, ProgramLayout), RenderError> {
        let program = self.bindings.program().ok_or(RenderError::NoActiveProgram)?;
        self.programs
            .get(program.0)
            .ok_or(RenderError::UnknownProgram(program.0))
    }

    pub fn draws(&self) -> Vec<(u32, u32)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Draw(first, count) => Some((*first, *count)),
                _ => None,
            })
            .collect()
    }

    pub fn uniforms(&self) -> Vec<nalgebra_glm::Mat4> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::SetUniform(_, matrix) => Some(*matrix),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls.iter().filter(|call| *call == wanted).count()
    }
}

impl RenderBackend for RecordingBackend {
    fn create_buffer(&mut self, _label: &str, contents: &[u8]) -> Result<BufferId, RenderError> {
        self.buffer_sizes.push(contents.len());
        Ok(BufferId(self.buffer_sizes.len() - 1))
    }

    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId, RenderError> {
        if self.reject_programs {
            return Err(RenderError::ProgramCreation {
                label: source.label.clone(),
                reason: "rejected by test".to_owned(),
            });
        }
        self.programs.push((source.label.clone(), source.layout.clone()));
        Ok(ProgramId(self.programs.len() - 1))
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let (_, layout) = self.programs.get(program.0)?;
        layout
            .uniform_index(name)
            .map(|index| UniformLocation { program, index })
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.calls.push(Call::Resize(width, height));
    }

    fn clear(&mut self, clear: &ClearState) -> Result<(), RenderError> {
        self.calls.push(Call::Clear(*clear));
        Ok(())
    }

    fn use_program(&mut self, program: ProgramId) -> Result<(), RenderError> {
        if program.0 >= self.programs.len() {
            return Err(RenderError::UnknownProgram(program.0));
        }
        self.bindings.use_program(program);
        self.calls.push(Call::UseProgram(program));
        Ok(())
    }

    fn set_uniform_mat4(
        &mut self,
        location: UniformLocation,
        matrix: &nalgebra_glm::Mat4,
    ) -> Result<(), RenderError> {
        if Some(location.program) != self.bindings.program() {
            return Err(RenderError::NoActiveProgram);
        }
        self.calls.push(Call::SetUniform(location, *matrix));
        Ok(())
    }

    fn enable_attribute(
        &mut self,
        slot: u32,
        buffer: BufferId,
        layout: &AttributeLayout,
    ) -> Result<(), RenderError> {
        if buffer.0 >= self.buffer_sizes.len() {
            return Err(RenderError::UnknownBuffer(buffer.0));
        }
        let (label, program) = self.active()?.clone();
        self.bindings.enable(&program, &label, slot, buffer, layout)?;
        self.calls.push(Call::Enable(slot, buffer));
        Ok(())
    }

    fn draw_arrays(&mut self, first: u32, count: u32) -> Result<(), RenderError> {
        let (label, program) = self.active()?;
        for binding in self.bindings.draw_bindings(program, label)? {
            let available = self.buffer_sizes[binding.buffer.0] as u64;
            if crate::backend::required_bytes(&binding.layout, first, count) > available {
                return Err(RenderError::BufferOverrun { slot: binding.slot });
            }
        }
        self.calls.push(Call::Draw(first, count));
        Ok(())
    }

    fn disable_attribute(&mut self, slot: u32) {
        self.bindings.disable(slot);
        self.calls.push(Call::Disable(slot));
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.calls.push(Call::Present);
        Ok(())
    }
}

/// Window whose events are scripted per `poll_events` call.
#[derive(Debug, Default)]
pub struct ScriptedWindow {
    /// Number of `poll_events` calls so far.
    pub polls: u64,
    /// Sets the close flag on this poll (1-based).
    pub close_on_poll: Option<u64>,
    /// Taps these keys on the given poll (1-based).
    pub key_taps: Vec<(u64, KeyCode)>,
    /// Framebuffer sizes reported from the given poll on (1-based).
    pub resizes: VecDeque<(u64, (u32, u32))>,
    /// Cursor motion delivered on every poll.
    pub cursor_motion: (f64, f64),
    pub size: (u32, u32),
    pub closed: bool,
    pub input: InputState,
}

impl ScriptedWindow {
    pub fn closing_after(polls: u64) -> Self {
        Self {
            close_on_poll: Some(polls),
            size: (1024, 768),
            ..Self::default()
        }
    }
}

impl WindowProvider for ScriptedWindow {
    fn poll_events(&mut self) {
        self.polls += 1;
        let poll = self.polls;

        if self.close_on_poll == Some(poll) {
            self.closed = true;
        }
        for &(at, key) in &self.key_taps {
            if at == poll {
                self.input.key(key, true);
                self.input.key(key, false);
            }
        }
        while let Some(&(at, size)) = self.resizes.front() {
            if at > poll {
                break;
            }
            self.size = size;
            self.resizes.pop_front();
        }
        let (dx, dy) = self.cursor_motion;
        self.input.cursor_moved(dx, dy);
    }

    fn key_pressed(&mut self, key: KeyCode) -> bool {
        self.input.key_pressed(key)
    }

    fn should_close(&self) -> bool {
        self.closed
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn take_input(&mut self) -> InputSnapshot {
        self.input.take_snapshot()
    }
}
