//! # Frame Loop
//!
//! Drives a [`Scene`] through a [`RenderBackend`] once per iteration until the user leaves.
//!
//! ## Iteration
//!
//! 1. Clear the render target (color, and depth when the scene asks for it).
//! 2. Obtain the MVP matrix. Dynamic scenes first feed the latest input to their pose source.
//! 3. For every draw: activate its program and upload the MVP uniform if it has one.
//! 4. Enable and bind each attribute buffer in the order the draw lists them.
//! 5. Draw the draw's vertex count. Draws of zero vertices are skipped.
//! 6. Disable every slot enabled in step 4.
//! 7. Present. This blocks for vertical sync.
//! 8. Poll window events and follow framebuffer resizes.
//!
//! After polling, the loop terminates when the exit key (Escape) was pressed or the window was
//! asked to close. Errors from the backend or the transform stop the loop and are returned.
//!
//! ## States
//!
//! [`LoopState::Running`] until the exit condition holds, then [`LoopState::Terminated`].
//! Stepping a terminated loop does nothing.

use winit::keyboard::KeyCode;

use crate::backend::RenderBackend;
use crate::clock::FrameClock;
use crate::error::RenderError;
use crate::scene::Scene;
use crate::window::WindowProvider;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated,
}

/// Render loop over a window and a backend.
pub struct FrameLoop<'a, W: WindowProvider + ?Sized, B: RenderBackend + ?Sized> {
    window: &'a mut W,
    backend: &'a mut B,
    clock: FrameClock,
    exit_key: KeyCode,
    state: LoopState,
    iterations: u64,
    framebuffer_size: (u32, u32),
}

impl<'a, W: WindowProvider + ?Sized, B: RenderBackend + ?Sized> FrameLoop<'a, W, B> {
    pub fn new(window: &'a mut W, backend: &'a mut B) -> Self {
        let framebuffer_size = backend.size();
        Self {
            window,
            backend,
            clock: FrameClock::new(),
            exit_key: KeyCode::Escape,
            state: LoopState::Running,
            iterations: 0,
            framebuffer_size,
        }
    }

    /// Replaces the Escape key as the exit key.
    pub fn with_exit_key(mut self, key: KeyCode) -> Self {
        self.exit_key = key;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Iterations completed so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Runs one iteration and reports whether the loop should continue.
    pub fn step(&mut self, scene: &mut Scene) -> Result<LoopState, RenderError> {
        if self.state == LoopState::Terminated {
            return Ok(LoopState::Terminated);
        }

        let time = self.clock.tick();
        self.backend.clear(&scene.clear)?;

        let mut input = self.window.take_input();
        input.dt = time.dt;
        let mvp = scene.current_mvp(&input)?;

        for draw in &scene.draws {
            self.backend.use_program(draw.program)?;
            if let (Some(location), Some(mvp)) = (draw.mvp, mvp.as_ref()) {
                self.backend.set_uniform_mat4(location, mvp)?;
            }

            for attribute in &draw.attributes {
                self.backend
                    .enable_attribute(attribute.slot, attribute.buffer, &attribute.layout)?;
            }
            if draw.vertex_count > 0 {
                self.backend.draw_arrays(0, draw.vertex_count)?;
            } else {
                log::trace!("skipping empty draw with program {:?}", draw.program);
            }
            for attribute in &draw.attributes {
                self.backend.disable_attribute(attribute.slot);
            }
        }

        self.backend.present()?;

        self.window.poll_events();
        let size = self.window.framebuffer_size();
        if size != self.framebuffer_size {
            let (width, height) = size;
            log::info!("framebuffer resized to ({width}, {height})");
            self.backend.resize(width, height);
            scene.resize(width, height);
            self.framebuffer_size = size;
        }

        self.iterations += 1;
        log::trace!("frame {} done in {:.4}s", time.frame_index, time.dt);

        if self.window.key_pressed(self.exit_key) {
            log::info!("{:?} pressed, leaving the frame loop", self.exit_key);
            self.state = LoopState::Terminated;
        } else if self.window.should_close() {
            log::info!("window closed, leaving the frame loop");
            self.state = LoopState::Terminated;
        }
        Ok(self.state)
    }

    /// Steps until the loop terminates.
    ///
    /// # Returns
    ///
    /// The number of iterations executed, counting the one that observed the exit condition.
    ///
    /// # Errors
    ///
    /// The first [`RenderError`] raised by the backend or the transform provider.
    pub fn run(&mut self, scene: &mut Scene) -> Result<u64, RenderError> {
        self.clock.reset();
        while self.step(scene)? == LoopState::Running {}
        Ok(self.iterations)
    }
}
