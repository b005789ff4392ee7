//! # GPU Management Module
//!
//! The `gpu` module sets up and owns the `wgpu` objects every tutorial renders with: the
//! surface tied to the window, the device, its queue and the surface configuration.
//!
//! ## Overview
//!
//! [`Gpu::new_async`] picks an adapter that can present to the window, requests a device and
//! configures the surface. Failures at any of these steps are returned as [`RenderError`]s so
//! the binaries can report them and exit instead of panicking.
//!
//! ## Features
//!
//! - **Surface Resizing**: [`Gpu::resize`] reconfigures the surface, ignoring zero-sized
//!   requests that minimized windows produce.
//! - **Depth Texture Creation**: [`Gpu::create_depth_texture`] for the depth-tested tutorials.
//! - **Vertical Sync**: the surface presents in FIFO mode, so presenting blocks until the
//!   display is ready for the next frame.
//!
//! ## Example Usage
//!
//! ```ignore
//! let window = std::sync::Arc::new(window);
//! let gpu = pollster::block_on(Gpu::new_async(window, 1024, 768))?;
//! ```

use wgpu::InstanceDescriptor;

use crate::error::RenderError;

/// Format of the depth attachment shared by every program.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// The GPU objects needed to render into one window.
///
/// # Fields
/// - `surface`: the presentable surface of the window.
/// - `device`: creates buffers, textures and pipelines.
/// - `queue`: receives buffer writes and command buffers.
/// - `surface_config`: current size, format and present mode of the surface.
/// - `surface_format`: the color format programs must render into.
pub struct Gpu {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub surface_format: wgpu::TextureFormat,
}

impl Gpu {
    /// Current surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Resizes and reconfigures the surface.
    ///
    /// # Parameters
    /// - `width`, `height`: the new size in pixels. Requests with a zero dimension are ignored,
    ///   since a surface cannot be configured with them.
    ///
    /// # Returns
    /// Whether the surface was reconfigured.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::debug!("ignoring resize to ({width}, {height})");
            return false;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.reconfigure();
        true
    }

    /// Applies the current configuration again, e.g. after the surface was lost.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Creates a depth attachment of the given size in [`DEPTH_FORMAT`].
    pub fn create_depth_texture(&self, width: u32, height: u32) -> wgpu::TextureView {
        let texture = self.device.create_texture(
            &(wgpu::TextureDescriptor {
                label: Some("Depth Texture"),
                size: wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            }),
        );
        texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Depth Texture View"),
            format: Some(DEPTH_FORMAT),
            dimension: Some(wgpu::TextureViewDimension::D2),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            base_array_layer: 0,
            array_layer_count: None,
            mip_level_count: None,
            usage: None,
        })
    }

    /// Initializes the GPU for rendering into `window`.
    ///
    /// # Parameters
    /// - `window`: anything `wgpu` can create a surface for, usually an `Arc<Window>`.
    /// - `width`, `height`: initial surface size in pixels.
    ///
    /// # Errors
    /// - [`RenderError::SurfaceCreation`] when the window cannot back a surface.
    /// - [`RenderError::AdapterUnavailable`] when no adapter can present to it.
    /// - [`RenderError::DeviceRequest`] when the adapter refuses the device.
    pub async fn new_async(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());

        let surface = instance
            .create_surface(window)
            .map_err(|error| RenderError::SurfaceCreation(error.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterUnavailable)?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);
        log::debug!("adapter features: {:#?}", adapter.features());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("WGPU Device"),
                    memory_hints: wgpu::MemoryHints::default(),
                    required_features: wgpu::Features::default(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|error| RenderError::DeviceRequest(error.to_string()))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        // Shader outputs are written as-is, like into a default OpenGL framebuffer.
        let surface_format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| RenderError::SurfaceCreation("surface reports no formats".to_owned()))?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::info!("configured {surface_format:?} surface ({width} x {height})");

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            surface_format,
        })
    }
}
