use std::sync::Arc;

use parking_lot::RwLock;

/// The element a controller renders into.
pub trait Container {
    /// Current rendered size in logical (CSS) pixels.
    fn size(&self) -> (u32, u32);

    /// Physical pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f64;
}

/// Container with a settable size, used headless and in tests.
#[derive(Debug)]
pub struct FixedContainer {
    size: RwLock<(u32, u32)>,
    pixel_ratio: RwLock<f64>,
}

impl FixedContainer {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_pixel_ratio(width, height, 1.0)
    }

    pub fn with_pixel_ratio(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            size: RwLock::new((width, height)),
            pixel_ratio: RwLock::new(pixel_ratio),
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        *self.size.write() = (width, height);
    }

    pub fn set_device_pixel_ratio(&self, ratio: f64) {
        *self.pixel_ratio.write() = ratio;
    }
}

impl Container for FixedContainer {
    fn size(&self) -> (u32, u32) {
        *self.size.read()
    }

    fn device_pixel_ratio(&self) -> f64 {
        *self.pixel_ratio.read()
    }
}

impl<T> Container for Arc<T>
where
    T: Container + ?Sized,
{
    fn size(&self) -> (u32, u32) {
        (**self).size()
    }

    fn device_pixel_ratio(&self) -> f64 {
        (**self).device_pixel_ratio()
    }
}

/// Caps the device pixel ratio the way the renderer expects it.
pub fn capped_pixel_ratio(ratio: f64, max: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio.min(max)
    } else {
        1.0
    }
}

/// Converts a DOM layout size (`offsetWidth`/`offsetHeight`) to pixels.
/// Detached or hidden elements can report negative values, read as zero.
pub fn css_size(width: i32, height: i32) -> (u32, u32) {
    (width.max(0) as u32, height.max(0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_sizes_clamp_negative_dimensions() {
        assert_eq!(css_size(1024, 768), (1024, 768));
        assert_eq!(css_size(-1, 40), (0, 40));
        assert_eq!(css_size(0, 0), (0, 0));
    }

    #[test]
    fn resize_is_visible_through_shared_handle() {
        let container = Arc::new(FixedContainer::new(800, 600));
        let shared = Arc::clone(&container);
        container.resize(1024, 768);
        assert_eq!(shared.size(), (1024, 768));
        assert_eq!(shared.device_pixel_ratio(), 1.0);
    }

    #[test]
    fn pixel_ratio_is_capped() {
        assert_eq!(capped_pixel_ratio(3.0, 2.0), 2.0);
        assert_eq!(capped_pixel_ratio(1.5, 2.0), 1.5);
        assert_eq!(capped_pixel_ratio(0.0, 2.0), 1.0);
        assert_eq!(capped_pixel_ratio(f64::NAN, 2.0), 1.0);
    }
}
