//! Viewer application: event handling, camera updates and the present loop

use thiserror::Error;

use crate::camera::{FlyCamera, MovementInput, PointerLook};
use crate::config::{ConfigError, ViewerConfig};
use crate::events::{EventQueue, ViewerEvent};
use crate::foundation::time::{FrameClock, FrameTime};
use crate::fractal::{ControlPanel, ParameterBlock};
use crate::render::vulkan::{FieldSwatchOverlay, VulkanBackend, VulkanError};
use crate::render::{FrameOrchestrator, FrameOutcome, FrameStats, SurfaceExtent};
use crate::window::{Window, WindowError};

/// Seconds to block on input while the window is minimized
const MINIMIZED_WAIT_SECONDS: f64 = 0.1;
/// Frames between periodic status lines
const STATUS_INTERVAL: u64 = 600;

/// Top-level viewer errors
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Window creation or surface hookup failed
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Graphics initialisation or a per-frame API call failed
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] VulkanError),

    /// Configuration was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// What the loop must do after an event was applied to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventEffect {
    /// Nothing beyond the state change
    None,
    /// Forward to the orchestrator as a pending resize
    Resized {
        /// New framebuffer width
        width: i32,
        /// New framebuffer height
        height: i32,
    },
    /// Capture or release the cursor
    CursorCapture(bool),
}

/// Camera, pointer tracking and the live parameter block
pub struct ViewerState {
    camera: FlyCamera,
    pointer: PointerLook,
    panel: ControlPanel,
    params: ParameterBlock,
    cursor_captured: bool,
}

impl ViewerState {
    /// Initial state from configuration, with the cursor captured
    pub fn new(config: &ViewerConfig) -> Self {
        let camera = FlyCamera::from_config(&config.camera);
        let mut params = ParameterBlock::from_config(&config.fractal);
        params.set_camera(&camera.position, &camera.basis());

        Self {
            camera,
            pointer: PointerLook::default(),
            panel: ControlPanel::default(),
            params,
            cursor_captured: true,
        }
    }

    /// Apply one input event
    pub fn apply(&mut self, event: ViewerEvent) -> EventEffect {
        match event {
            ViewerEvent::Resized { width, height } => EventEffect::Resized { width, height },
            ViewerEvent::PointerMoved { x, y } => {
                if self.cursor_captured {
                    if let Some((dx, dy)) = self.pointer.delta(x, y) {
                        self.camera.process_pointer(dx, dy);
                    }
                }
                EventEffect::None
            }
            ViewerEvent::FieldDelta { delta } => {
                self.panel.shift_field(&mut self.params, delta);
                EventEffect::None
            }
            ViewerEvent::ToggleCursorCapture => {
                self.cursor_captured = !self.cursor_captured;
                self.pointer.reset();
                EventEffect::CursorCapture(self.cursor_captured)
            }
            ViewerEvent::Adjust(adjust) => {
                self.panel.apply(&mut self.params, adjust);
                EventEffect::None
            }
        }
    }

    /// Move the camera for held keys and refresh the camera and time fields
    pub fn update(&mut self, movement: &MovementInput, time: FrameTime) {
        if !movement.is_idle() {
            self.camera.process_keyboard(movement, time.delta);
        }
        self.params.set_camera(&self.camera.position, &self.camera.basis());
        self.params.set_time(time.elapsed);
    }

    /// Live parameter block
    pub fn params(&self) -> &ParameterBlock {
        &self.params
    }

    /// Camera
    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    /// Whether pointer movement steers the camera
    pub fn cursor_captured(&self) -> bool {
        self.cursor_captured
    }
}

/// The running viewer
///
/// The orchestrator is declared first so the swapchain and device are gone
/// before the window they were created for.
pub struct ViewerApp {
    orchestrator: FrameOrchestrator<VulkanBackend>,
    window: Window,
    events: EventQueue,
    state: ViewerState,
    clock: FrameClock,
}

impl ViewerApp {
    /// Open the window and bring up the renderer
    pub fn new(config: &ViewerConfig) -> Result<Self, ViewerError> {
        config.validate()?;
        log::info!("Starting {} ({} frames in flight)", config.window.title, config.renderer.frames_in_flight);

        let mut window = Window::new(&config.window)?;
        let (width, height) = window.framebuffer_size();
        let requested = SurfaceExtent::from_framebuffer(width, height)
            .unwrap_or_else(|| SurfaceExtent::new(config.window.width, config.window.height));

        let (mut backend, ring) = VulkanBackend::new(&mut window, &config.renderer, requested)?;
        backend.set_overlay(Box::new(FieldSwatchOverlay::default()));

        let state = ViewerState::new(config);
        window.set_cursor_captured(state.cursor_captured());

        Ok(Self {
            orchestrator: FrameOrchestrator::new(backend, ring),
            window,
            events: EventQueue::new(),
            state,
            clock: FrameClock::new(),
        })
    }

    /// Run until the window closes, returning the frame counters
    pub fn run(&mut self) -> Result<FrameStats, ViewerError> {
        log::info!("Controls: WASD move, Q/E roll, Z/X field, C release cursor");
        log::info!("{}", ControlPanel::summary(self.state.params()));

        while !self.window.should_close() {
            self.window.poll_events(&mut self.events);
            self.handle_events();

            let time = self.clock.tick();
            let movement = self.window.movement_input();
            self.state.update(&movement, time);

            let outcome = self
                .orchestrator
                .draw_frame(self.state.params(), self.window.framebuffer_size())?;
            if outcome == FrameOutcome::Skipped {
                self.window.wait_events(&mut self.events, MINIMIZED_WAIT_SECONDS);
            }

            if self.clock.ticks() % STATUS_INTERVAL == 0 {
                log::debug!(
                    "{:.1} fps, {}",
                    self.clock.average_rate(),
                    ControlPanel::summary(self.state.params())
                );
            }
        }

        let stats = self.orchestrator.shutdown()?;
        Ok(stats)
    }

    fn handle_events(&mut self) {
        for event in self.events.drain() {
            match self.state.apply(event) {
                EventEffect::Resized { width, height } => self.orchestrator.notify_resized(width, height),
                EventEffect::CursorCapture(captured) => self.window.set_cursor_captured(captured),
                EventEffect::None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractal::{FractalField, ParamAdjust, Tunable};
    use approx::assert_relative_eq;

    fn state() -> ViewerState {
        ViewerState::new(&ViewerConfig::default())
    }

    #[test]
    fn test_initial_params_follow_config() {
        let state = state();
        assert_eq!(state.params().field(), FractalField::Mandelbulb);
        assert_eq!(state.params().camera_position(), state.camera().position);
        assert!(state.cursor_captured());
    }

    #[test]
    fn test_resize_is_forwarded() {
        let mut state = state();
        let effect = state.apply(ViewerEvent::Resized { width: 640, height: 0 });
        assert_eq!(effect, EventEffect::Resized { width: 640, height: 0 });
    }

    #[test]
    fn test_first_pointer_sample_only_primes() {
        let mut state = state();
        let before = state.camera().orientation;

        state.apply(ViewerEvent::PointerMoved { x: 100.0, y: 100.0 });
        assert_eq!(state.camera().orientation, before);

        state.apply(ViewerEvent::PointerMoved { x: 140.0, y: 100.0 });
        assert_ne!(state.camera().orientation, before);
    }

    #[test]
    fn test_pointer_ignored_while_released() {
        let mut state = state();
        assert_eq!(state.apply(ViewerEvent::ToggleCursorCapture), EventEffect::CursorCapture(false));
        let before = state.camera().orientation;

        state.apply(ViewerEvent::PointerMoved { x: 0.0, y: 0.0 });
        state.apply(ViewerEvent::PointerMoved { x: 50.0, y: 25.0 });
        assert_eq!(state.camera().orientation, before);

        // Recapture starts from a fresh reference point
        assert_eq!(state.apply(ViewerEvent::ToggleCursorCapture), EventEffect::CursorCapture(true));
        state.apply(ViewerEvent::PointerMoved { x: 500.0, y: 500.0 });
        assert_eq!(state.camera().orientation, before);
    }

    #[test]
    fn test_field_delta_clamps() {
        let mut state = state();
        state.apply(ViewerEvent::FieldDelta { delta: 1 });
        assert_eq!(state.params().field(), FractalField::Mandelbox);
        state.apply(ViewerEvent::FieldDelta { delta: 1 });
        assert_eq!(state.params().field(), FractalField::Mandelbox);
        state.apply(ViewerEvent::FieldDelta { delta: -10 });
        assert_eq!(state.params().field(), FractalField::Sphere);
    }

    #[test]
    fn test_adjust_changes_live_params() {
        let mut state = state();
        let steps = state.params().max_steps();
        state.apply(ViewerEvent::Adjust(ParamAdjust::up(Tunable::MaxSteps)));
        assert!(state.params().max_steps() > steps);
    }

    #[test]
    fn test_update_moves_camera_and_sets_time() {
        let mut state = state();
        let start = state.camera().position;
        let movement = MovementInput {
            forward: true,
            ..MovementInput::default()
        };

        state.update(&movement, FrameTime { elapsed: 2.5, delta: 1.0 });

        let moved = state.camera().position - start;
        assert_relative_eq!(moved.norm(), state.camera().move_speed, epsilon = 1e-5);
        assert_eq!(state.params().camera_position(), state.camera().position);
        assert_relative_eq!(state.params().time(), 2.5);
    }
}
