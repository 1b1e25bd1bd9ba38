//! Per-frame draw loop
//!
//! Each call to [`FrameOrchestrator::draw_frame`] runs one pass of
//! WaitRetire, Acquire, Record, Submit, Present and Advance against the
//! current ring slot. Waiting on the slot's retirement guard is the only
//! blocking point and bounds the work in flight to the ring length.

use super::backend::{AcquireStatus, FrameSlot, PresentStatus, PresentationBackend, RecordTarget};
use super::frame_ring::FrameRing;
use super::surface::SurfaceExtent;
use super::vulkan::{VulkanError, VulkanResult};
use crate::fractal::ParameterBlock;

/// What happened during one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and presented
    Presented {
        /// Ring slot used
        slot: usize,
        /// Surface image presented
        image_index: u32,
        /// The surface was rebuilt after presenting
        recreated: bool,
    },
    /// Nothing was drawn: the window is minimized
    Skipped,
    /// Acquire reported a stale or suboptimal surface; it was rebuilt instead
    /// of drawing
    Deferred,
}

/// Running counters for the draw loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames presented
    pub presented: u64,
    /// Frames skipped while minimized
    pub skipped: u64,
    /// Frames abandoned at acquire
    pub deferred: u64,
    /// Successful surface recreations
    pub recreations: u64,
}

impl FrameStats {
    fn record(&mut self, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::Presented { .. } => self.presented += 1,
            FrameOutcome::Skipped => self.skipped += 1,
            FrameOutcome::Deferred => self.deferred += 1,
        }
    }
}

/// Ties the frame ring to a presentation backend
///
/// Field order matters: the ring's slots are released before the backend that
/// created them.
pub struct FrameOrchestrator<B: PresentationBackend> {
    ring: FrameRing<B::Slot>,
    backend: B,
    resize_pending: bool,
    stats: FrameStats,
}

impl<B: PresentationBackend> FrameOrchestrator<B> {
    /// Take ownership of a backend and the ring of slots it created
    pub fn new(backend: B, ring: FrameRing<B::Slot>) -> Self {
        log::debug!("Frame orchestrator ready with {} frame(s) in flight", ring.len());
        Self {
            ring,
            backend,
            resize_pending: false,
            stats: FrameStats::default(),
        }
    }

    /// Record that the window framebuffer changed size
    ///
    /// The surface is rebuilt after the next successful present.
    pub fn notify_resized(&mut self, width: i32, height: i32) {
        log::trace!("Framebuffer resized to {}x{}", width, height);
        self.resize_pending = true;
    }

    /// Whether a resize is waiting to be applied
    pub fn resize_pending(&self) -> bool {
        self.resize_pending
    }

    /// Run one frame
    ///
    /// `framebuffer_size` is the window's current framebuffer size; a
    /// non-positive side skips the frame without touching any synchronization
    /// state. `params` is snapshotted before recording, with the aspect ratio
    /// replaced by the live surface's.
    ///
    /// The ring advances after every successful call, drawn or not.
    pub fn draw_frame(&mut self, params: &ParameterBlock, framebuffer_size: (i32, i32)) -> VulkanResult<FrameOutcome> {
        let outcome = self.run_frame(params, framebuffer_size)?;
        self.ring.advance();
        self.stats.record(outcome);
        Ok(outcome)
    }

    fn run_frame(&mut self, params: &ParameterBlock, (width, height): (i32, i32)) -> VulkanResult<FrameOutcome> {
        let Some(framebuffer) = SurfaceExtent::from_framebuffer(width, height) else {
            log::trace!("Framebuffer is {}x{}, skipping frame", width, height);
            return Ok(FrameOutcome::Skipped);
        };

        // A previous recreation raced a minimize and left no surface behind
        if self.backend.surface_extent().is_empty() && !self.recreate_surface(framebuffer)? {
            return Ok(FrameOutcome::Skipped);
        }

        let slot_index = self.ring.index();

        self.backend.wait_retired(self.ring.current())?;

        let image_index = match self.backend.acquire_image(self.ring.current_mut())? {
            AcquireStatus::Ready { image_index } => image_index,
            status => {
                log::debug!("Acquire reported {:?} surface, recreating", status);
                self.recreate_surface(framebuffer)?;
                return Ok(FrameOutcome::Deferred);
            }
        };

        let extent = self.backend.surface_extent();
        let mut snapshot = *params;
        snapshot.set_aspect(extent.aspect());
        self.ring.current_mut().write_parameters(&snapshot)?;

        let target = RecordTarget {
            image_index,
            descriptor_index: slot_index,
            extent,
        };
        self.backend.record_frame(self.ring.current(), &target, &snapshot)?;
        self.backend.submit_frame(self.ring.current())?;

        let status = self.backend.present_frame(self.ring.current(), image_index)?;
        let recreated = if status != PresentStatus::Presented || self.resize_pending {
            log::debug!(
                "Present reported {:?} (resize pending: {}), recreating",
                status,
                self.resize_pending
            );
            self.recreate_surface(framebuffer)?
        } else {
            false
        };

        log::trace!("Presented image {} from slot {}", image_index, slot_index);
        Ok(FrameOutcome::Presented {
            slot: slot_index,
            image_index,
            recreated,
        })
    }

    /// Drain the device, then rebuild the surface at `framebuffer`
    ///
    /// Returns `false` if the surface came back with a zero extent; the resize
    /// stays pending and is retried on a later frame.
    fn recreate_surface(&mut self, framebuffer: SurfaceExtent) -> VulkanResult<bool> {
        self.backend.wait_idle()?;
        match self.backend.recreate_surface(framebuffer) {
            Ok(()) => {
                self.resize_pending = false;
                self.stats.recreations += 1;
                log::debug!(
                    "Surface recreated at {}x{}",
                    self.backend.surface_extent().width,
                    self.backend.surface_extent().height
                );
                Ok(true)
            }
            Err(VulkanError::SurfaceMinimized) => {
                log::debug!("Surface minimized during recreation, retrying later");
                self.resize_pending = true;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Wait for all outstanding GPU work
    ///
    /// After this returns the ring and backend can be dropped safely.
    pub fn shutdown(&mut self) -> VulkanResult<FrameStats> {
        self.backend.wait_idle()?;
        log::info!(
            "Renderer stopped: {} presented, {} skipped, {} deferred, {} surface recreations",
            self.stats.presented,
            self.stats.skipped,
            self.stats.deferred,
            self.stats.recreations
        );
        Ok(self.stats)
    }

    /// Counters so far
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// The frame ring
    pub fn ring(&self) -> &FrameRing<B::Slot> {
        &self.ring
    }

    /// The backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: PresentationBackend> Drop for FrameOrchestrator<B> {
    fn drop(&mut self) {
        if let Err(e) = self.backend.wait_idle() {
            log::error!("Failed to drain device before releasing frame slots: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{Call, MockBackend, MockSlot};
    use std::num::NonZeroUsize;

    const EXTENT: (i32, i32) = (800, 600);

    fn orchestrator(slots: usize) -> FrameOrchestrator<MockBackend> {
        let mut backend = MockBackend::new(SurfaceExtent::new(800, 600));
        let count = NonZeroUsize::new(slots).unwrap();
        let ring = FrameRing::init(count, |i| Ok::<MockSlot, ()>(backend.create_slot(i))).unwrap();
        FrameOrchestrator::new(backend, ring)
    }

    fn submit_indices(calls: &[Call]) -> Vec<usize> {
        calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Call::Submit { .. }))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_outstanding_submissions_bounded_by_ring_len() {
        for n in 1..=4 {
            let mut orch = orchestrator(n);
            let params = ParameterBlock::default();
            for _ in 0..(5 * n) {
                orch.draw_frame(&params, EXTENT).unwrap();
            }
            assert_eq!(orch.backend().max_outstanding, n);

            // The (n+1)-th submission reuses slot 0 and must come after its guard was observed
            let calls = &orch.backend().calls;
            let submit = submit_indices(calls)[n];
            let wait = calls
                .iter()
                .enumerate()
                .filter(|(_, c)| **c == Call::WaitRetired { slot: 0 })
                .map(|(i, _)| i)
                .nth(1)
                .unwrap();
            assert!(wait < submit);
        }
    }

    #[test]
    fn test_ring_advances_on_every_outcome() {
        let mut orch = orchestrator(3);
        let params = ParameterBlock::default();
        orch.backend_mut().acquire_script.extend([
            AcquireStatus::Ready { image_index: 0 },
            AcquireStatus::Stale,
        ]);

        let mut indices = Vec::new();
        let sizes = [EXTENT, EXTENT, (0, 0), EXTENT, (800, -1), EXTENT, EXTENT];
        for size in sizes {
            indices.push(orch.ring().index());
            orch.draw_frame(&params, size).unwrap();
        }
        assert_eq!(indices, vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(orch.ring().index(), 1);

        let stats = orch.stats();
        assert_eq!(stats.presented, 4);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.deferred, 1);
    }

    #[test]
    fn test_descriptor_index_matches_ring_slot() {
        let mut orch = orchestrator(2);
        let params = ParameterBlock::default();
        orch.backend_mut().present_script.extend([PresentStatus::Presented, PresentStatus::Suboptimal]);
        for _ in 0..9 {
            orch.draw_frame(&params, EXTENT).unwrap();
        }

        let records: Vec<_> = orch
            .backend()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Record { slot, target } => Some((*slot, target.descriptor_index)),
                _ => None,
            })
            .collect();
        assert_eq!(records.len(), 9);
        for (i, (slot, descriptor)) in records.into_iter().enumerate() {
            assert_eq!(slot, descriptor);
            assert_eq!(slot, i % 2);
        }
    }

    #[test]
    fn test_stale_acquire_short_circuits_frame() {
        let mut orch = orchestrator(2);
        let params = ParameterBlock::default();
        orch.draw_frame(&params, EXTENT).unwrap();

        orch.backend_mut().acquire_script.push_back(AcquireStatus::Stale);
        orch.backend_mut().calls.clear();
        let index_before = orch.ring().index();

        assert_eq!(orch.draw_frame(&params, (1024, 768)).unwrap(), FrameOutcome::Deferred);
        let calls = &orch.backend().calls;
        assert!(calls.contains(&Call::Recreate {
            extent: SurfaceExtent::new(1024, 768)
        }));
        assert!(!calls
            .iter()
            .any(|c| matches!(c, Call::Record { .. } | Call::Submit { .. } | Call::Present { .. })));
        assert_eq!(orch.ring().index(), (index_before + 1) % 2);

        orch.backend_mut().calls.clear();
        let outcome = orch.draw_frame(&params, (1024, 768)).unwrap();
        assert!(matches!(outcome, FrameOutcome::Presented { recreated: false, .. }));
        let kinds: Vec<_> = orch.backend().calls.iter().map(Call::kind).collect();
        assert_eq!(kinds, vec!["wait_retired", "acquire", "record", "submit", "present"]);
    }

    #[test]
    fn test_suboptimal_acquire_replaces_image_ready_signal() {
        let mut orch = orchestrator(2);
        let params = ParameterBlock::default();
        let before = orch.ring().current().image_ready;

        orch.backend_mut().acquire_script.push_back(AcquireStatus::Suboptimal);
        assert_eq!(orch.draw_frame(&params, EXTENT).unwrap(), FrameOutcome::Deferred);

        let slot = orch.ring().slot(0).unwrap();
        assert_ne!(slot.image_ready, before);
        assert_eq!(orch.stats().recreations, 1);
    }

    #[test]
    fn test_present_failures_trigger_recreation() {
        for status in [PresentStatus::Stale, PresentStatus::Suboptimal] {
            let mut orch = orchestrator(2);
            let params = ParameterBlock::default();
            orch.backend_mut().present_script.push_back(status);

            let outcome = orch.draw_frame(&params, (640, 480)).unwrap();
            assert!(matches!(outcome, FrameOutcome::Presented { recreated: true, .. }));

            let backend = orch.backend();
            assert_eq!(backend.extent, SurfaceExtent::new(640, 480));
            assert_eq!(backend.framebuffers.len(), backend.image_count as usize);
            assert!(backend.framebuffers.iter().all(|fb| *fb == backend.extent));
        }
    }

    #[test]
    fn test_resize_notification_recreates_after_present() {
        let mut orch = orchestrator(2);
        let params = ParameterBlock::default();
        orch.notify_resized(1920, 1080);
        assert!(orch.resize_pending());

        let outcome = orch.draw_frame(&params, (1920, 1080)).unwrap();
        assert!(matches!(outcome, FrameOutcome::Presented { recreated: true, .. }));
        assert!(!orch.resize_pending());

        let kinds: Vec<_> = orch.backend().calls.iter().map(Call::kind).collect();
        let present = kinds.iter().position(|k| *k == "present").unwrap();
        let recreate = kinds.iter().position(|k| *k == "recreate").unwrap();
        assert!(present < recreate);
        assert_eq!(kinds[recreate - 1], "wait_idle");

        orch.draw_frame(&params, (1920, 1080)).unwrap();
        assert_eq!(orch.stats().recreations, 1);
    }

    #[test]
    fn test_minimized_frame_touches_nothing() {
        let mut orch = orchestrator(2);
        let params = ParameterBlock::default();
        orch.notify_resized(0, 0);

        for size in [(0, 0), (0, 600), (800, 0)] {
            assert_eq!(orch.draw_frame(&params, size).unwrap(), FrameOutcome::Skipped);
        }
        assert!(orch.backend().calls.is_empty());
        assert!(orch.resize_pending());
    }

    #[test]
    fn test_minimize_during_recreation_is_retried() {
        let mut orch = orchestrator(2);
        let params = ParameterBlock::default();
        orch.notify_resized(800, 600);
        orch.backend_mut().minimized_recreations = 1;

        let outcome = orch.draw_frame(&params, EXTENT).unwrap();
        assert!(matches!(outcome, FrameOutcome::Presented { recreated: false, .. }));
        assert!(orch.resize_pending());
        assert!(orch.backend().extent.is_empty());

        orch.backend_mut().calls.clear();
        let outcome = orch.draw_frame(&params, EXTENT).unwrap();
        assert!(matches!(outcome, FrameOutcome::Presented { recreated: false, .. }));
        assert!(!orch.resize_pending());
        let kinds: Vec<_> = orch.backend().calls.iter().map(Call::kind).collect();
        assert_eq!(kinds[..3], ["wait_idle", "recreate", "wait_retired"]);
    }

    #[test]
    fn test_consecutive_frames_use_distinct_slot_resources() {
        let mut orch = orchestrator(2);
        let params = ParameterBlock::default();
        orch.draw_frame(&params, EXTENT).unwrap();
        orch.draw_frame(&params, EXTENT).unwrap();

        let submits: Vec<_> = orch
            .backend()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Submit {
                    command_buffer,
                    image_ready,
                    work_submitted,
                    retired_guard,
                    ..
                } => Some([*command_buffer, *image_ready, *work_submitted, *retired_guard]),
                _ => None,
            })
            .collect();
        assert_eq!(submits.len(), 2);
        for (a, b) in submits[0].iter().zip(submits[1].iter()) {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_slot_receives_snapshot_with_live_aspect() {
        let mut orch = orchestrator(2);
        let mut params = ParameterBlock::default();
        params.set_time(4.0);
        params.set_aspect(1.0);

        orch.draw_frame(&params, EXTENT).unwrap();
        let written = orch.ring().slot(0).unwrap().read_parameters().unwrap();
        assert_eq!(written.time(), 4.0);
        assert_eq!(written.aspect(), 800.0 / 600.0);
        assert_eq!(params.aspect(), 1.0);
    }

    #[test]
    fn test_failed_parameter_write_aborts_before_submit() {
        let mut backend = MockBackend::new(SurfaceExtent::new(800, 600));
        let count = NonZeroUsize::new(2).unwrap();
        let ring = FrameRing::init(count, |i| {
            let mut slot = backend.create_slot(i);
            if i == 1 {
                slot.truncate_memory(ParameterBlock::SIZE / 2);
            }
            Ok::<MockSlot, ()>(slot)
        })
        .unwrap();
        let mut orch = FrameOrchestrator::new(backend, ring);
        let params = ParameterBlock::default();

        assert!(matches!(orch.draw_frame(&params, EXTENT).unwrap(), FrameOutcome::Presented { slot: 0, .. }));
        let err = orch.draw_frame(&params, EXTENT).unwrap_err();
        assert!(matches!(err, VulkanError::InvalidOperation { .. }));

        let calls = &orch.backend().calls;
        assert_eq!(submit_indices(calls).len(), 1);
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Record { .. })).count(), 1);
        assert_eq!(calls.last(), Some(&Call::Acquire { slot: 1 }));
        assert!(orch.ring().slot(1).unwrap().read_parameters().is_none());
        assert_eq!(orch.stats().presented, 1);
    }

    #[test]
    fn test_shutdown_drains_device() {
        let mut orch = orchestrator(2);
        let params = ParameterBlock::default();
        orch.draw_frame(&params, EXTENT).unwrap();
        let stats = orch.shutdown().unwrap();
        assert_eq!(stats.presented, 1);
        assert_eq!(orch.backend().outstanding(), 0);
        assert_eq!(orch.backend().calls.last(), Some(&Call::WaitIdle));
    }
}
