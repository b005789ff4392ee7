//! # Shader Programs
//!
//! A program is a vertex/fragment shader pair plus the interface the rest of the renderer needs
//! to know about it: which attribute slots it reads, which matrix uniforms it declares and
//! which fixed-function state it draws with.
//!
//! ## Overview
//!
//! - [`ProgramSource`]: WGSL sources and a [`ProgramLayout`], either embedded in the binary
//!   ([`ProgramSource::builtin`]) or read from two files ([`ProgramSource::from_files`]).
//! - [`BuiltinProgram`]: the three programs the tutorials use.
//! - [`GpuProgram`]: the compiled `wgpu` render pipeline and its uniform bindings.
//!
//! ## Shader Interface
//!
//! Vertex shaders expose `vertex_main` and fragment shaders expose `fragment_main`. Attribute
//! slot `n` is `@location(n)` in the vertex stage. The `i`-th declared uniform is a
//! `mat4x4<f32>` at `@group(i) @binding(0)`.

use std::borrow::Cow;
use std::path::Path;

use crate::error::{InitError, RenderError};
use crate::uniform_binding::UniformBinding;
use crate::vertex::AttributeLayout;

/// Name of the combined model-view-projection uniform.
pub const MVP_UNIFORM: &str = "MVP";

const VERTEX_ENTRY_POINT: &str = "vertex_main";
const FRAGMENT_ENTRY_POINT: &str = "fragment_main";

/// One vertex input of a program.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributeSlot {
    /// Shader location the attribute is read from.
    pub slot: u32,
    /// Layout the bound buffer must have.
    pub layout: AttributeLayout,
}

/// Fixed-function state a program draws with.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RenderState {
    /// Keep fragments closer than the stored depth (`LESS`) and write their depth.
    pub depth_test: bool,
    /// Discard triangles whose front face (counter-clockwise) points away from the camera.
    pub cull_back_faces: bool,
}

/// Everything the renderer needs to know about a program besides its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLayout {
    pub attributes: Vec<AttributeSlot>,
    pub uniforms: Vec<String>,
    pub state: RenderState,
}

impl ProgramLayout {
    /// The declared attribute at `slot`, if any.
    pub fn attribute(&self, slot: u32) -> Option<&AttributeSlot> {
        self.attributes.iter().find(|attribute| attribute.slot == slot)
    }

    /// Position of `name` in the uniform list, which is also its bind group index.
    pub fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|uniform| uniform == name)
    }
}

/// The programs shipped with the tutorials.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BuiltinProgram {
    /// Positions passed straight through, filled with solid red.
    Simple,
    /// Positions transformed by `MVP`, filled with solid red.
    Mvp,
    /// Positions transformed by `MVP` with an interpolated per-vertex color, depth tested and
    /// back-face culled.
    Colored,
}

impl BuiltinProgram {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinProgram::Simple => "simple",
            BuiltinProgram::Mvp => "mvp",
            BuiltinProgram::Colored => "colored",
        }
    }

    /// File name of the vertex stage, relative to a shader directory.
    pub fn vertex_file(self) -> &'static str {
        match self {
            BuiltinProgram::Simple => "simple.vert.wgsl",
            BuiltinProgram::Mvp => "mvp.vert.wgsl",
            BuiltinProgram::Colored => "colored.vert.wgsl",
        }
    }

    /// File name of the fragment stage, relative to a shader directory.
    pub fn fragment_file(self) -> &'static str {
        match self {
            BuiltinProgram::Simple | BuiltinProgram::Mvp => "simple.frag.wgsl",
            BuiltinProgram::Colored => "colored.frag.wgsl",
        }
    }

    pub fn layout(self) -> ProgramLayout {
        let position = AttributeSlot {
            slot: 0,
            layout: AttributeLayout::packed(3),
        };
        match self {
            BuiltinProgram::Simple => ProgramLayout {
                attributes: vec![position],
                uniforms: Vec::new(),
                state: RenderState::default(),
            },
            BuiltinProgram::Mvp => ProgramLayout {
                attributes: vec![position],
                uniforms: vec![MVP_UNIFORM.to_owned()],
                state: RenderState::default(),
            },
            BuiltinProgram::Colored => ProgramLayout {
                attributes: vec![
                    position,
                    AttributeSlot {
                        slot: 1,
                        layout: AttributeLayout::packed(3),
                    },
                ],
                uniforms: vec![MVP_UNIFORM.to_owned()],
                state: RenderState {
                    depth_test: true,
                    cull_back_faces: true,
                },
            },
        }
    }

    fn embedded_sources(self) -> (&'static str, &'static str) {
        let vertex = match self {
            BuiltinProgram::Simple => include_str!("shaders/simple.vert.wgsl"),
            BuiltinProgram::Mvp => include_str!("shaders/mvp.vert.wgsl"),
            BuiltinProgram::Colored => include_str!("shaders/colored.vert.wgsl"),
        };
        let fragment = match self {
            BuiltinProgram::Simple | BuiltinProgram::Mvp => include_str!("shaders/simple.frag.wgsl"),
            BuiltinProgram::Colored => include_str!("shaders/colored.frag.wgsl"),
        };
        (vertex, fragment)
    }
}

/// Shader sources of one program together with its declared layout.
#[derive(Debug, Clone)]
pub struct ProgramSource {
    pub label: String,
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
    pub layout: ProgramLayout,
}

impl ProgramSource {
    /// The embedded sources of a built-in program.
    pub fn builtin(program: BuiltinProgram) -> Self {
        let (vertex, fragment) = program.embedded_sources();
        Self {
            label: program.name().to_owned(),
            vertex: Cow::Borrowed(vertex),
            fragment: Cow::Borrowed(fragment),
            layout: program.layout(),
        }
    }

    /// A built-in program whose stages are read from `dir` instead of the binary.
    pub fn builtin_from_dir(program: BuiltinProgram, dir: &Path) -> Result<Self, InitError> {
        let mut source = Self::from_files(
            &dir.join(program.vertex_file()),
            &dir.join(program.fragment_file()),
            program.layout(),
        )?;
        source.label = program.name().to_owned();
        Ok(source)
    }

    /// Reads a vertex and a fragment stage from disk.
    ///
    /// # Errors
    ///
    /// [`InitError::ShaderRead`] naming the file that could not be read. The sources are not
    /// validated here; invalid WGSL is reported when the backend creates the program.
    pub fn from_files(
        vertex_path: &Path,
        fragment_path: &Path,
        layout: ProgramLayout,
    ) -> Result<Self, InitError> {
        let read = |path: &Path| {
            std::fs::read_to_string(path).map_err(|source| InitError::ShaderRead {
                path: path.to_path_buf(),
                source,
            })
        };
        let vertex = read(vertex_path)?;
        let fragment = read(fragment_path)?;
        log::debug!(
            "loaded shaders {} and {}",
            vertex_path.display(),
            fragment_path.display()
        );

        Ok(Self {
            label: vertex_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "program".to_owned()),
            vertex: Cow::Owned(vertex),
            fragment: Cow::Owned(fragment),
            layout,
        })
    }
}

/// A program compiled into a `wgpu` render pipeline.
pub struct GpuProgram {
    pub label: String,
    pub layout: ProgramLayout,
    pub pipeline: wgpu::RenderPipeline,
    /// One binding per declared uniform, in declaration order.
    pub uniforms: Vec<UniformBinding>,
}

impl GpuProgram {
    /// Compiles both stages and builds the render pipeline.
    ///
    /// Validation errors raised by `wgpu` while compiling the shaders or linking the pipeline
    /// are captured through an error scope and returned instead of aborting the process.
    ///
    /// # Parameters
    ///
    /// - `surface_format`: format of the color target the program renders into.
    /// - `depth_format`: format of the depth attachment every render pass carries.
    /// - `source`: shader sources and declared interface.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        source: &ProgramSource,
    ) -> Result<Self, RenderError> {
        let layout = &source.layout;
        let creation_error = |reason: String| RenderError::ProgramCreation {
            label: source.label.clone(),
            reason,
        };

        // Resolve vertex formats before touching the device so bad layouts fail early.
        let attributes = layout
            .attributes
            .iter()
            .map(|attribute| {
                attribute
                    .layout
                    .vertex_attribute(attribute.slot)
                    .map(|vertex_attribute| [vertex_attribute])
                    .ok_or_else(|| {
                        creation_error(format!(
                            "attribute slot {} has no float vertex format",
                            attribute.slot
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let buffers: Vec<wgpu::VertexBufferLayout> = layout
            .attributes
            .iter()
            .zip(&attributes)
            .map(|(attribute, vertex_attribute)| attribute.layout.buffer_layout(vertex_attribute))
            .collect();

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} vertex shader", source.label)),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&*source.vertex)),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} fragment shader", source.label)),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&*source.fragment)),
        });

        let uniforms: Vec<UniformBinding> = layout
            .uniforms
            .iter()
            .map(|name| UniformBinding::new(device, name))
            .collect();
        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = uniforms
            .iter()
            .map(|uniform| &uniform.bind_group_layout)
            .collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} pipeline layout", source.label)),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let state = layout.state;
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} pipeline", source.label)),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(VERTEX_ENTRY_POINT),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: state.cull_back_faces.then_some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
                unclipped_depth: false,
            },
            // Every pass carries the depth attachment, so pipelines without depth testing
            // still declare it and simply never reject or write.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: state.depth_test,
                depth_compare: if state.depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(FRAGMENT_ENTRY_POINT),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(creation_error(error.to_string()));
        }

        log::info!(
            "created program `{}` ({} attributes, {} uniforms)",
            source.label,
            layout.attributes.len(),
            uniforms.len()
        );

        Ok(Self {
            label: source.label.clone(),
            layout: layout.clone(),
            pipeline,
            uniforms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("tutorial-core-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn builtin_layouts_match_their_shaders() {
        let simple = BuiltinProgram::Simple.layout();
        assert_eq!(simple.attributes.len(), 1);
        assert!(simple.uniforms.is_empty());

        let mvp = BuiltinProgram::Mvp.layout();
        assert_eq!(mvp.uniform_index(MVP_UNIFORM), Some(0));

        let colored = BuiltinProgram::Colored.layout();
        assert_eq!(colored.attribute(1).map(|a| a.layout.components), Some(3));
        assert!(colored.state.depth_test);
        assert!(colored.state.cull_back_faces);
    }

    #[test]
    fn embedded_sources_declare_entry_points() {
        for program in [BuiltinProgram::Simple, BuiltinProgram::Mvp, BuiltinProgram::Colored] {
            let source = ProgramSource::builtin(program);
            assert!(source.vertex.contains(VERTEX_ENTRY_POINT), "{}", program.name());
            assert!(source.fragment.contains(FRAGMENT_ENTRY_POINT), "{}", program.name());
            assert_eq!(
                source.vertex.contains("var<uniform>"),
                !source.layout.uniforms.is_empty()
            );
        }
    }

    #[test]
    fn from_files_reads_both_stages() {
        let dir = scratch_dir("shaders");
        std::fs::write(dir.join("mvp.vert.wgsl"), "// vertex").unwrap();
        std::fs::write(dir.join("simple.frag.wgsl"), "// fragment").unwrap();

        let source = ProgramSource::builtin_from_dir(BuiltinProgram::Mvp, &dir).unwrap();
        assert_eq!(source.label, "mvp");
        assert_eq!(source.vertex, "// vertex");
        assert_eq!(source.fragment, "// fragment");
        assert_eq!(source.layout, BuiltinProgram::Mvp.layout());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn from_files_reports_missing_stage() {
        let dir = scratch_dir("missing");
        let error = ProgramSource::builtin_from_dir(BuiltinProgram::Colored, &dir).unwrap_err();
        match error {
            InitError::ShaderRead { path, .. } => assert!(path.ends_with("colored.vert.wgsl")),
            other => panic!("unexpected error: {other}"),
        }
        std::fs::remove_dir_all(&dir).ok();
    }
}
