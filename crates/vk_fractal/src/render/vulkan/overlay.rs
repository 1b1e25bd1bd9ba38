//! Overlay drawing inside the frame's render pass

use ash::vk;

use super::commands::ActiveRenderPass;
use super::VulkanResult;
use crate::fractal::ParameterBlock;

/// Records extra commands after the fullscreen draw
pub trait OverlayRecorder {
    /// Record into the open render pass
    fn record(
        &mut self,
        pass: &mut ActiveRenderPass<'_, '_>,
        extent: vk::Extent2D,
        params: &ParameterBlock,
    ) -> VulkanResult<()>;
}

/// Corner square coloured after the active fractal field
#[derive(Debug, Clone, Copy)]
pub struct FieldSwatchOverlay {
    /// Edge length in pixels
    pub size: u32,
    /// Distance from the top-left corner in pixels
    pub margin: u32,
}

impl Default for FieldSwatchOverlay {
    fn default() -> Self {
        Self { size: 24, margin: 12 }
    }
}

impl FieldSwatchOverlay {
    /// Swatch rectangle, or `None` if it does not fit inside `extent`
    pub fn swatch_rect(&self, extent: vk::Extent2D) -> Option<vk::Rect2D> {
        let reach = self.margin.checked_add(self.size)?;
        if self.size == 0 || reach > extent.width || reach > extent.height {
            return None;
        }
        let offset = i32::try_from(self.margin).ok()?;
        Some(vk::Rect2D {
            offset: vk::Offset2D { x: offset, y: offset },
            extent: vk::Extent2D {
                width: self.size,
                height: self.size,
            },
        })
    }
}

impl OverlayRecorder for FieldSwatchOverlay {
    fn record(
        &mut self,
        pass: &mut ActiveRenderPass<'_, '_>,
        extent: vk::Extent2D,
        params: &ParameterBlock,
    ) -> VulkanResult<()> {
        if let Some(rect) = self.swatch_rect(extent) {
            pass.clear_color_rect(rect, params.field().swatch_color());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swatch_in_corner() {
        let overlay = FieldSwatchOverlay::default();
        let rect = overlay
            .swatch_rect(vk::Extent2D {
                width: 1280,
                height: 720,
            })
            .unwrap();
        assert_eq!((rect.offset.x, rect.offset.y), (12, 12));
        assert_eq!((rect.extent.width, rect.extent.height), (24, 24));
    }

    #[test]
    fn test_swatch_skipped_when_too_small() {
        let overlay = FieldSwatchOverlay::default();
        assert!(overlay.swatch_rect(vk::Extent2D { width: 30, height: 720 }).is_none());
        assert!(overlay.swatch_rect(vk::Extent2D { width: 0, height: 0 }).is_none());
        assert!(overlay
            .swatch_rect(vk::Extent2D { width: 36, height: 36 })
            .is_some());
    }

    #[test]
    fn test_zero_sized_swatch() {
        let overlay = FieldSwatchOverlay { size: 0, margin: 0 };
        assert!(overlay.swatch_rect(vk::Extent2D { width: 64, height: 64 }).is_none());
    }
}
