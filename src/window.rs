//! # Window and Input
//!
//! The frame loop never talks to `winit` directly. It drives a [`WindowProvider`], which exposes
//! the polling style of a classic windowing toolkit: poll events once per frame, ask whether a key
//! was pressed, ask whether the window should close.
//!
//! ## Overview
//!
//! - [`WindowProvider`]: the contract the frame loop consumes.
//! - [`WinitWindow`]: the desktop implementation. It owns the `winit` event loop and pumps it
//!   without blocking on every [`poll_events`](WindowProvider::poll_events) call instead of
//!   handing control to `EventLoop::run_app`.
//! - [`InputState`]: platform independent key, cursor and scroll bookkeeping shared by every
//!   implementation.
//! - [`InputSnapshot`]: what the camera controls see each frame.
//!
//! ## Sticky Keys
//!
//! A key press is latched until it is queried through
//! [`key_pressed`](WindowProvider::key_pressed), so a tap shorter than one frame is never lost.
//! A held key reports pressed on every query.
//!
//! ## Platform Notes
//!
//! Pumping the event loop is supported on Windows, macOS, X11 and Wayland. Web targets are not
//! supported.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

use crate::config::WindowConfig;
use crate::error::InitError;

/// Pixel scroll deltas are converted to lines with this factor.
const PIXELS_PER_LINE: f64 = 40.0;

const DEFAULT_TITLE: &str = "Tutorial";

/// How many times the event loop is pumped while waiting for the window to appear.
const CREATION_ATTEMPTS: usize = 64;

/// Input gathered since the previous frame.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct InputSnapshot {
    /// Relative mouse motion in pixels.
    pub cursor_delta: (f64, f64),
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Vertical scroll in lines; positive scrolls away from the user.
    pub scroll: f32,
    /// Seconds since the previous frame. Filled in by the frame loop.
    pub dt: f32,
}

/// The window surface the frame loop polls.
pub trait WindowProvider {
    /// Processes pending window and input events without blocking.
    fn poll_events(&mut self);

    /// Whether `key` is held or was pressed since the last query for it.
    fn key_pressed(&mut self, key: KeyCode) -> bool;

    /// Whether the user asked to close the window.
    fn should_close(&self) -> bool;

    /// Size of the drawable area in pixels.
    fn framebuffer_size(&self) -> (u32, u32);

    /// Drains the accumulated input into a snapshot.
    fn take_input(&mut self) -> InputSnapshot;
}

/// Key, cursor and scroll state accumulated between frames.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    held: HashSet<KeyCode>,
    latched: HashSet<KeyCode>,
    cursor_delta: (f64, f64),
    scroll: f32,
}

impl InputState {
    /// Records a key transition.
    pub fn key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.held.insert(key);
            self.latched.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    /// Sticky query; clears the latch for `key`.
    pub fn key_pressed(&mut self, key: KeyCode) -> bool {
        let latched = self.latched.remove(&key);
        latched || self.held.contains(&key)
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn cursor_moved(&mut self, dx: f64, dy: f64) {
        self.cursor_delta.0 += dx;
        self.cursor_delta.1 += dy;
    }

    pub fn scrolled(&mut self, lines: f32) {
        self.scroll += lines;
    }

    /// Releases every held key. Latched presses are kept.
    pub fn focus_lost(&mut self) {
        self.held.clear();
    }

    /// Returns the movement keys and drains the cursor and scroll accumulators.
    pub fn take_snapshot(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            cursor_delta: self.cursor_delta,
            forward: self.is_held(KeyCode::ArrowUp),
            backward: self.is_held(KeyCode::ArrowDown),
            left: self.is_held(KeyCode::ArrowLeft),
            right: self.is_held(KeyCode::ArrowRight),
            scroll: self.scroll,
            dt: 0.0,
        };
        self.cursor_delta = (0.0, 0.0);
        self.scroll = 0.0;
        snapshot
    }
}

/// `winit` callbacks land here while the loop is pumped.
struct EventState {
    attributes: WindowAttributes,
    window: Option<Arc<Window>>,
    creation_error: Option<String>,
    size: (u32, u32),
    close_requested: bool,
    input: InputState,
}

impl ApplicationHandler for EventState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => {
                let PhysicalSize { width, height } = window.inner_size();
                self.size = (width, height);
                log::info!("created window {:?} ({width} x {height})", window.id());
                self.window = Some(Arc::new(window));
            }
            Err(error) => self.creation_error = Some(error.to_string()),
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                self.close_requested = true;
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                log::debug!("window resized to ({width}, {height})");
                self.size = (width, height);
            }
            WindowEvent::Focused(false) => self.input.focus_lost(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => self.input.key(key_code, state == ElementState::Pressed),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => {
                        (position.y / PIXELS_PER_LINE) as f32
                    }
                };
                self.input.scrolled(lines);
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input.cursor_moved(dx, dy);
        }
    }
}

/// A desktop window backed by a pumped `winit` event loop.
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    state: EventState,
    window: Arc<Window>,
}

impl WinitWindow {
    /// Opens a window and waits until the platform reports it created.
    ///
    /// # Errors
    ///
    /// - [`InitError::EventLoop`] when no event loop can be created (for example without a
    ///   display server).
    /// - [`InitError::WindowCreation`] when the platform refuses the window or never resumes.
    pub fn create(config: &WindowConfig) -> Result<Self, InitError> {
        let mut event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let attributes = Window::default_attributes()
            .with_title(config.title.as_deref().unwrap_or(DEFAULT_TITLE))
            .with_inner_size(PhysicalSize::new(config.width, config.height));
        let mut state = EventState {
            attributes,
            window: None,
            creation_error: None,
            size: (config.width, config.height),
            close_requested: false,
            input: InputState::default(),
        };

        for _ in 0..CREATION_ATTEMPTS {
            let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut state);
            if let PumpStatus::Exit(code) = status {
                return Err(InitError::WindowCreation(format!(
                    "event loop exited with code {code} before the window opened"
                )));
            }
            if let Some(error) = state.creation_error.take() {
                return Err(InitError::WindowCreation(error));
            }
            if state.window.is_some() {
                break;
            }
        }

        let window = state.window.clone().ok_or_else(|| {
            InitError::WindowCreation("the platform never created the window".to_owned())
        })?;

        Ok(Self {
            event_loop,
            state,
            window,
        })
    }

    /// The underlying window, for creating a rendering surface.
    pub fn handle(&self) -> Arc<Window> {
        self.window.clone()
    }

    /// Hides the cursor and keeps it inside the window for mouse look.
    pub fn capture_cursor(&self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(error) = grabbed {
            log::warn!("could not capture the cursor: {error}");
        }
        self.window.set_cursor_visible(false);
    }
}

impl WindowProvider for WinitWindow {
    fn poll_events(&mut self) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state);
        if let PumpStatus::Exit(code) = status {
            log::info!("event loop exited with code {code}");
            self.state.close_requested = true;
        }
    }

    fn key_pressed(&mut self, key: KeyCode) -> bool {
        self.state.input.key_pressed(key)
    }

    fn should_close(&self) -> bool {
        self.state.close_requested
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.state.size
    }

    fn take_input(&mut self) -> InputSnapshot {
        self.state.input.take_snapshot()
    }
}
