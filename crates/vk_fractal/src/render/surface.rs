//! Presentable surface negotiation
//!
//! Pure selection logic over the capabilities a platform reports for a
//! surface. The Vulkan swapchain in [`crate::render::vulkan::swapchain`] feeds
//! the queried values through here before creating images.

use ash::vk;

/// Size of a presentable surface in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SurfaceExtent {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl SurfaceExtent {
    /// Create an extent
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Extent for a window framebuffer size
    ///
    /// Returns `None` when either side is non-positive (minimized window); such
    /// a size must never reach surface creation.
    pub fn from_framebuffer(width: i32, height: i32) -> Option<Self> {
        let width = u32::try_from(width).ok().filter(|&w| w > 0)?;
        let height = u32::try_from(height).ok().filter(|&h| h > 0)?;
        Some(Self { width, height })
    }

    /// True for the zero extent of a destroyed surface
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, or 1.0 for an empty extent
    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// As a Vulkan extent
    pub fn to_vk(self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }
}

impl From<vk::Extent2D> for SurfaceExtent {
    fn from(extent: vk::Extent2D) -> Self {
        Self::new(extent.width, extent.height)
    }
}

/// Preferred native 8-bit format
pub const PREFERRED_FORMAT: vk::Format = vk::Format::B8G8R8A8_UNORM;
/// Colour space paired with [`PREFERRED_FORMAT`]
pub const PREFERRED_COLOR_SPACE: vk::ColorSpaceKHR = vk::ColorSpaceKHR::SRGB_NONLINEAR;

/// Pick the preferred format if offered, otherwise the first reported one
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|sf| sf.format == PREFERRED_FORMAT && sf.color_space == PREFERRED_COLOR_SPACE)
        .or_else(|| formats.first())
        .copied()
}

/// Prefer low-latency mailbox presentation, falling back to FIFO
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    modes
        .iter()
        .copied()
        .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Use the extent the platform dictates, or clamp the requested one into its bounds
///
/// An empty request stays empty rather than being clamped up to the minimum.
pub fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, requested: SurfaceExtent) -> SurfaceExtent {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent.into();
    }
    if requested.is_empty() {
        return SurfaceExtent::default();
    }
    SurfaceExtent::new(
        requested
            .width
            .clamp(caps.min_image_extent.width, caps.max_image_extent.width),
        requested
            .height
            .clamp(caps.min_image_extent.height, caps.max_image_extent.height),
    )
}

/// One more than the minimum, capped at the maximum when there is one
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        desired.min(caps.max_image_count)
    } else {
        desired
    }
}

/// Result of surface negotiation
#[derive(Debug, Clone, Copy)]
pub struct SurfaceChoice {
    /// Image format and colour space
    pub format: vk::SurfaceFormatKHR,
    /// Presentation mode
    pub present_mode: vk::PresentModeKHR,
    /// Image extent
    pub extent: SurfaceExtent,
    /// Minimum number of images requested
    pub min_image_count: u32,
}

/// Run the full negotiation policy
///
/// Returns `None` when the platform reports no formats. The extent is empty if
/// the platform dictates a zero size or leaves the size to an empty request.
pub fn negotiate(
    caps: &vk::SurfaceCapabilitiesKHR,
    formats: &[vk::SurfaceFormatKHR],
    present_modes: &[vk::PresentModeKHR],
    requested: SurfaceExtent,
) -> Option<SurfaceChoice> {
    let format = choose_surface_format(formats)?;
    Some(SurfaceChoice {
        format,
        present_mode: choose_present_mode(present_modes),
        extent: choose_extent(caps, requested),
        min_image_count: choose_image_count(caps),
    })
}
