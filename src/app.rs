//! # Application Entry (`app.rs`)
//!
//! Glue between the tutorial binaries and the library: load the configuration, open the window,
//! bring up the GPU, assemble the tutorial's scene and run the frame loop until the user leaves.
//!
//! ## Startup Order
//!
//! 1. [`Config::load`] with the path from the command line, if any.
//! 2. [`init_logging`] with the configured filter.
//! 3. [`WinitWindow::create`], titled after the tutorial unless the config overrides it.
//! 4. [`Renderer::new`], blocked on with `pollster` since the desktop build has no executor.
//! 5. [`Tutorial::build_scene`].
//! 6. [`FrameLoop::run`].
//!
//! Any failure before step 6 is fatal: it is returned with context describing the step, and the
//! binaries print it and exit with a failure status.
//!
//! ## Platform Notes
//!
//! Desktop only. The event loop is pumped from the frame loop rather than driven through
//! `EventLoop::run_app`, which web targets would require.

use std::path::Path;

use anyhow::Context;

use crate::config::Config;
use crate::frame_loop::FrameLoop;
use crate::logging::init_logging;
use crate::renderer::Renderer;
use crate::tutorial::Tutorial;
use crate::window::{WindowProvider, WinitWindow};

/// Runs `tutorial` to completion.
///
/// # Parameters
///
/// - `tutorial`: which scene to show.
/// - `config_path`: JSON configuration to load instead of the default lookup.
///
/// # Returns
///
/// The number of frames rendered.
pub fn run(tutorial: Tutorial, config_path: Option<&Path>) -> anyhow::Result<u64> {
    let config = Config::load(config_path).context("failed to load the configuration")?;
    init_logging(config.logging.filter.as_deref());
    log::info!("starting {}", tutorial.title());

    let mut window_config = config.window.clone();
    window_config
        .title
        .get_or_insert_with(|| tutorial.title().to_owned());
    let mut window = WinitWindow::create(&window_config).context("failed to open the window")?;

    let (width, height) = window.framebuffer_size();
    let mut renderer = pollster::block_on(Renderer::new(window.handle(), width, height))
        .context("failed to initialize the GPU")?;

    let mut scene = tutorial
        .build_scene(&mut renderer, &config)
        .with_context(|| format!("failed to set up {}", tutorial.title()))?;

    if tutorial.captures_cursor() {
        window.capture_cursor();
    }

    let frames = FrameLoop::new(&mut window, &mut renderer)
        .run(&mut scene)
        .context("rendering failed")?;
    log::info!("{} finished after {frames} frames", tutorial.title());
    Ok(frames)
}

/// Body of the tutorial binaries' `main`: runs `tutorial` with the configuration named by the first
/// command line argument and maps the outcome to an exit status.
pub fn run_from_args(tutorial: Tutorial) -> std::process::ExitCode {
    let config_path = std::env::args_os().nth(1).map(std::path::PathBuf::from);
    match run(tutorial, config_path.as_deref()) {
        Ok(_) => std::process::ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error:#}");
            eprintln!("error: {error:#}");
            std::process::ExitCode::FAILURE
        }
    }
}
