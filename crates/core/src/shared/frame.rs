use crate::shared::dimensions::ImageDimensions;

/// A photo as delivered by the camera: encoded bytes in whatever container
/// the device produced (usually JPEG, possibly carrying EXIF orientation).
///
/// Decoding happens in the frame preparer only; the pipeline treats the
/// payload as opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedPhoto {
    data: Vec<u8>,
    index: usize,
}

impl CapturedPhoto {
    pub fn new(data: Vec<u8>, index: usize) -> Self {
        Self { data, index }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sequence number assigned by the camera, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A transport-ready JPEG and the exact pixel size it decodes to.
///
/// `dimensions` is the coordinate space the detection service answers in.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedFrame {
    jpeg: Vec<u8>,
    dimensions: ImageDimensions,
}

impl PreparedFrame {
    pub fn new(jpeg: Vec<u8>, dimensions: ImageDimensions) -> Self {
        debug_assert!(
            dimensions.is_measured(),
            "prepared frame must have positive dimensions"
        );
        Self { jpeg, dimensions }
    }

    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn dimensions(&self) -> ImageDimensions {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.jpeg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jpeg.is_empty()
    }
}
