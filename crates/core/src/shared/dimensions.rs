/// Pixel size of an image or an on-screen surface.
///
/// A zero component means the size has not been measured yet (a preview
/// surface before its first layout pass reports `{0, 0}`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub const UNKNOWN: ImageDimensions = ImageDimensions {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both components are strictly positive.
    pub fn is_measured(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Height that keeps this aspect ratio at `target_width`, never below 1px.
    pub fn height_for_width(&self, target_width: u32) -> u32 {
        if self.width == 0 {
            return 0;
        }
        let scaled = (self.height as u64 * target_width as u64 + self.width as u64 / 2)
            / self.width as u64;
        scaled.max(1) as u32
    }
}

impl std::fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
