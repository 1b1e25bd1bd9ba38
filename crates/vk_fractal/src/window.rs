//! Window management using GLFW
//!
//! Owns the GLFW window and translates its callbacks into typed
//! [`ViewerEvent`]s for the viewer loop.

use glfw::{Action, Key, WindowEvent};
use thiserror::Error;

use crate::camera::MovementInput;
use crate::config::WindowConfig;
use crate::events::{EventQueue, ViewerEvent};
use crate::fractal::{ParamAdjust, Tunable};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Other GLFW failure
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window wrapper with proper resource management
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, WindowEvent)>,
    cursor_captured: bool,
}

impl Window {
    /// Create a resizable window without a client API, with the cursor captured
    pub fn new(config: &WindowConfig) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitializationFailed)?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_framebuffer_size_polling(true);

        let mut window = Self {
            glfw,
            window,
            events,
            cursor_captured: false,
        };
        window.set_cursor_captured(true);
        Ok(window)
    }

    /// Whether the user asked to close the window
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Poll GLFW and queue the translated events
    pub fn poll_events(&mut self, queue: &mut EventQueue) {
        self.glfw.poll_events();
        for (_, event) in glfw::flush_messages(&self.events) {
            if let Some(event) = translate_event(&event) {
                queue.push(event);
            }
        }
    }

    /// Block for up to `timeout` seconds waiting for input, then queue it
    pub fn wait_events(&mut self, queue: &mut EventQueue, timeout: f64) {
        self.glfw.wait_events_timeout(timeout);
        for (_, event) in glfw::flush_messages(&self.events) {
            if let Some(event) = translate_event(&event) {
                queue.push(event);
            }
        }
    }

    /// Framebuffer size in pixels (zero while minimized)
    pub fn framebuffer_size(&self) -> (i32, i32) {
        self.window.get_framebuffer_size()
    }

    /// Whether the cursor is captured for mouse look
    pub fn cursor_captured(&self) -> bool {
        self.cursor_captured
    }

    /// Capture (hide and lock) or release the cursor
    pub fn set_cursor_captured(&mut self, captured: bool) {
        let mode = if captured {
            glfw::CursorMode::Disabled
        } else {
            glfw::CursorMode::Normal
        };
        self.window.set_cursor_mode(mode);
        self.cursor_captured = captured;
    }

    /// Movement keys currently held
    pub fn movement_input(&self) -> MovementInput {
        let held = |key| self.window.get_key(key) == Action::Press;
        MovementInput {
            forward: held(Key::W),
            backward: held(Key::S),
            left: held(Key::A),
            right: held(Key::D),
            roll_left: held(Key::Q),
            roll_right: held(Key::E),
        }
    }

    /// Get required Vulkan instance extensions from GLFW
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("Vulkan is not supported by GLFW".to_string()))
    }

    /// Create Vulkan surface using GLFW's built-in functionality
    pub fn create_vulkan_surface(&mut self, instance: ash::vk::Instance) -> WindowResult<ash::vk::SurfaceKHR> {
        let mut surface = ash::vk::SurfaceKHR::null();
        let result = self.window.create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == ash::vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::GlfwError(format!("Failed to create Vulkan surface: {:?}", result)))
        }
    }
}

/// Map a GLFW event onto a viewer event
///
/// Field and capture keys react to presses only; control panel keys also
/// auto-repeat.
pub fn translate_event(event: &WindowEvent) -> Option<ViewerEvent> {
    match *event {
        WindowEvent::FramebufferSize(width, height) => Some(ViewerEvent::Resized { width, height }),
        WindowEvent::CursorPos(x, y) => Some(ViewerEvent::PointerMoved { x, y }),
        WindowEvent::Key(key, _, Action::Press, _) => match key {
            Key::Z => Some(ViewerEvent::FieldDelta { delta: -1 }),
            Key::X => Some(ViewerEvent::FieldDelta { delta: 1 }),
            Key::C => Some(ViewerEvent::ToggleCursorCapture),
            _ => panel_binding(key).map(ViewerEvent::Adjust),
        },
        WindowEvent::Key(key, _, Action::Repeat, _) => panel_binding(key).map(ViewerEvent::Adjust),
        _ => None,
    }
}

fn panel_binding(key: Key) -> Option<ParamAdjust> {
    let adjust = match key {
        Key::R => ParamAdjust::up(Tunable::MaxSteps),
        Key::F => ParamAdjust::down(Tunable::MaxSteps),
        Key::T => ParamAdjust::up(Tunable::Iterations),
        Key::G => ParamAdjust::down(Tunable::Iterations),
        Key::Y => ParamAdjust::up(Tunable::Power),
        Key::H => ParamAdjust::down(Tunable::Power),
        Key::U => ParamAdjust::up(Tunable::Bailout),
        Key::J => ParamAdjust::down(Tunable::Bailout),
        Key::I => ParamAdjust::up(Tunable::MaxDistance),
        Key::K => ParamAdjust::down(Tunable::MaxDistance),
        Key::O => ParamAdjust::up(Tunable::HitEpsilon),
        Key::L => ParamAdjust::down(Tunable::HitEpsilon),
        Key::P => ParamAdjust::up(Tunable::NormalEpsilon),
        Key::Semicolon => ParamAdjust::down(Tunable::NormalEpsilon),
        _ => return None,
    };
    Some(adjust)
}
