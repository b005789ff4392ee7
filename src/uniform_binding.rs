//! # Uniform Binding
//!
//! GPU side of one named matrix uniform: the buffer that holds it, and the bind group and
//! layout that expose it to the vertex stage.
//!
//! ## Binding Model
//!
//! Each uniform a program declares gets its own bind group. The uniform at position `i` in the
//! program's uniform list is visible to the shader as `@group(i) @binding(0)`, so the tutorial
//! `MVP` matrix is always `@group(0) @binding(0)`.
//!
//! ## Lifecycle
//!
//! Bindings are created together with their program and live as long as it does. Writes go
//! through [`wgpu::Queue::write_buffer`], which stages the data until the next submission, so
//! every draw recorded in a frame observes the last value written before `present`.

use crate::uniform_buffer::MatrixUniform;

/// A named `mat4x4<f32>` uniform bound at `@binding(0)` of its own bind group.
pub struct UniformBinding {
    /// Backing buffer, `UNIFORM | COPY_DST`, sized for one [`MatrixUniform`].
    pub buffer: wgpu::Buffer,

    /// Bind group pointing at `buffer`.
    pub bind_group: wgpu::BindGroup,

    /// Layout shared with the pipeline layout of the owning program.
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl UniformBinding {
    /// Creates the buffer, layout and bind group for uniform `name`, which only labels them.
    ///
    /// The buffer is initialized with [`MatrixUniform::default`].
    pub fn new(device: &wgpu::Device, name: &str) -> Self {
        let buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{name} uniform buffer")),
                contents: bytemuck::bytes_of(&MatrixUniform::default()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(MatrixUniform::SIZE),
                },
                count: None,
            }],
            label: Some(&format!("{name} bind group layout")),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(&format!("{name} bind group")),
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Stages a new matrix for the next submission.
    pub fn write(&self, queue: &wgpu::Queue, matrix: &nalgebra_glm::Mat4) {
        queue.write_buffer(
            &self.buffer,
            0,
            bytemuck::bytes_of(&MatrixUniform::from(*matrix)),
        );
    }
}
