//! # Renderer
//!
//! The `wgpu` implementation of [`RenderBackend`]. It turns the immediate-mode protocol the frame
//! loop speaks into command encoders and render passes.
//!
//! ## Frame Structure
//!
//! - [`clear`](RenderBackend::clear) acquires the next surface texture and opens a command
//!   encoder. Nothing is recorded yet; the clear is applied by the first render pass.
//! - Every non-empty [`draw_arrays`](RenderBackend::draw_arrays) records its own render pass.
//!   The first pass of a frame clears color (and depth when requested), later passes load what
//!   is already there.
//! - [`present`](RenderBackend::present) records a clear-only pass if nothing was drawn, then
//!   submits the encoder and presents the texture.
//!
//! ## Surface Errors
//!
//! An outdated or lost surface is reconfigured and the frame is skipped. A timeout skips the
//! frame. Running out of memory is fatal. While a frame is skipped, bindings are still
//! validated so errors surface on the first frame either way.
//!
//! ## Uniforms
//!
//! Matrix uploads go through the queue and become visible at submission. Every draw of a frame
//! therefore sees the last matrix written to a uniform during that frame.

use wgpu::util::DeviceExt;

use crate::backend::{
    required_bytes, BindingState, BufferId, ClearState, ProgramId, RenderBackend, UniformLocation,
};
use crate::error::RenderError;
use crate::gpu::{Gpu, DEPTH_FORMAT};
use crate::program::{GpuProgram, ProgramSource};
use crate::vertex::AttributeLayout;

/// The frame currently being recorded.
struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    clear: ClearState,
    /// A render pass has already applied the clear.
    cleared: bool,
}

pub struct Renderer {
    gpu: Gpu,
    depth_texture_view: wgpu::TextureView,
    buffers: Vec<wgpu::Buffer>,
    programs: Vec<GpuProgram>,
    bindings: BindingState,
    frame: Option<Frame>,
}

impl Renderer {
    /// Initializes the GPU for `window` and creates the depth attachment.
    ///
    /// # Errors
    /// Whatever [`Gpu::new_async`] reports.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let gpu = Gpu::new_async(window, width, height).await?;
        let depth_texture_view = gpu.create_depth_texture(width, height);
        Ok(Self {
            gpu,
            depth_texture_view,
            buffers: Vec::new(),
            programs: Vec::new(),
            bindings: BindingState::default(),
            frame: None,
        })
    }

    fn program(&self, program: ProgramId) -> Result<&GpuProgram, RenderError> {
        self.programs
            .get(program.0)
            .ok_or(RenderError::UnknownProgram(program.0))
    }

    fn begin_pass<'encoder>(
        frame: &'encoder mut Frame,
        depth_view: &wgpu::TextureView,
        label: &str,
    ) -> wgpu::RenderPass<'encoder> {
        let first = !frame.cleared;
        frame.cleared = true;

        let [r, g, b, a] = frame.clear.color;
        let color_load = if first {
            wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a })
        } else {
            wgpu::LoadOp::Load
        };
        let depth_load = if first && frame.clear.depth {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };

        frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }
}

/// The program selected by the last `use_program`.
fn active_program<'a>(
    programs: &'a [GpuProgram],
    bindings: &BindingState,
) -> Result<&'a GpuProgram, RenderError> {
    let program = bindings.program().ok_or(RenderError::NoActiveProgram)?;
    programs
        .get(program.0)
        .ok_or(RenderError::UnknownProgram(program.0))
}

impl RenderBackend for Renderer {
    fn create_buffer(&mut self, label: &str, contents: &[u8]) -> Result<BufferId, RenderError> {
        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.buffers.push(buffer);
        Ok(BufferId(self.buffers.len() - 1))
    }

    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId, RenderError> {
        let program = GpuProgram::new(
            &self.gpu.device,
            self.gpu.surface_format,
            DEPTH_FORMAT,
            source,
        )?;
        self.programs.push(program);
        Ok(ProgramId(self.programs.len() - 1))
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.programs
            .get(program.0)?
            .layout
            .uniform_index(name)
            .map(|index| UniformLocation { program, index })
    }

    fn size(&self) -> (u32, u32) {
        self.gpu.size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.gpu.resize(width, height) {
            log::info!("resizing renderer surface to ({width}, {height})");
            self.depth_texture_view = self.gpu.create_depth_texture(width, height);
        }
    }

    fn clear(&mut self, clear: &ClearState) -> Result<(), RenderError> {
        if self.frame.take().is_some() {
            log::warn!("discarding a frame that was never presented");
        }

        let surface_texture = match self.gpu.surface.get_current_texture() {
            Ok(surface_texture) => surface_texture,
            Err(error @ (wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost)) => {
                log::warn!("{error}, reconfiguring the surface and skipping the frame");
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(error @ wgpu::SurfaceError::OutOfMemory) => {
                return Err(RenderError::Surface(error.to_string()));
            }
            Err(error) => {
                log::warn!("{error}, skipping the frame");
                return Ok(());
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor {
                label: Some("Surface Texture View"),
                format: Some(self.gpu.surface_format),
                ..Default::default()
            });
        let encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.frame = Some(Frame {
            surface_texture,
            view,
            encoder,
            clear: *clear,
            cleared: false,
        });
        Ok(())
    }

    fn use_program(&mut self, program: ProgramId) -> Result<(), RenderError> {
        self.program(program)?;
        self.bindings.use_program(program);
        Ok(())
    }

    fn set_uniform_mat4(
        &mut self,
        location: UniformLocation,
        matrix: &nalgebra_glm::Mat4,
    ) -> Result<(), RenderError> {
        let program = self.program(location.program)?;
        let uniform =
            program
                .uniforms
                .get(location.index)
                .ok_or_else(|| RenderError::UnknownUniform {
                    label: program.label.clone(),
                    index: location.index,
                })?;
        uniform.write(&self.gpu.queue, matrix);
        Ok(())
    }

    fn enable_attribute(
        &mut self,
        slot: u32,
        buffer: BufferId,
        layout: &AttributeLayout,
    ) -> Result<(), RenderError> {
        if buffer.0 >= self.buffers.len() {
            return Err(RenderError::UnknownBuffer(buffer.0));
        }
        let program = active_program(&self.programs, &self.bindings)?;
        self.bindings
            .enable(&program.layout, &program.label, slot, buffer, layout)
    }

    fn draw_arrays(&mut self, first: u32, count: u32) -> Result<(), RenderError> {
        let Self {
            depth_texture_view,
            buffers,
            programs,
            bindings,
            frame,
            ..
        } = self;
        let program = active_program(programs, bindings)?;
        let bindings = bindings.draw_bindings(&program.layout, &program.label)?;
        for binding in &bindings {
            if required_bytes(&binding.layout, first, count) > buffers[binding.buffer.0].size() {
                return Err(RenderError::BufferOverrun { slot: binding.slot });
            }
        }

        if count == 0 {
            return Ok(());
        }
        let Some(frame) = frame.as_mut() else {
            return Ok(());
        };

        let mut pass = Self::begin_pass(frame, depth_texture_view, &program.label);
        pass.set_pipeline(&program.pipeline);
        for (group, uniform) in program.uniforms.iter().enumerate() {
            pass.set_bind_group(group as u32, &uniform.bind_group, &[]);
        }
        for (index, binding) in bindings.iter().enumerate() {
            let buffer = &buffers[binding.buffer.0];
            pass.set_vertex_buffer(index as u32, buffer.slice(binding.layout.offset..));
        }
        pass.draw(first..first + count, 0..1);
        log::trace!("drew {count} vertices with `{}`", program.label);
        Ok(())
    }

    fn disable_attribute(&mut self, slot: u32) {
        self.bindings.disable(slot);
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let Some(mut frame) = self.frame.take() else {
            return Ok(());
        };

        if !frame.cleared {
            drop(Self::begin_pass(&mut frame, &self.depth_texture_view, "Clear Pass"));
        }

        let Frame {
            surface_texture,
            encoder,
            ..
        } = frame;
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}
