use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidDetection {
    #[error("detection label is empty")]
    EmptyLabel,
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
    #[error("box [{x1}, {y1}, {x2}, {y2}] is inverted or not finite")]
    InvalidBox { x1: f64, y1: f64, x2: f64, y2: f64 },
}

/// Axis-aligned box as `[x1, y1, x2, y2]`, with `x1 <= x2` and `y1 <= y2`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "[f64; 4]")]
pub struct BoundingBox {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, InvalidDetection> {
        let finite = [x1, y1, x2, y2].iter().all(|v| v.is_finite());
        if !finite || x1 > x2 || y1 > y2 {
            return Err(InvalidDetection::InvalidBox { x1, y1, x2, y2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    pub fn x1(&self) -> f64 {
        self.x1
    }

    pub fn y1(&self) -> f64 {
        self.y1
    }

    pub fn x2(&self) -> f64 {
        self.x2
    }

    pub fn y2(&self) -> f64 {
        self.y2
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Overlay placement helpers: the box as left/top/width/height.
    pub fn left(&self) -> f64 {
        self.x1
    }

    pub fn top(&self) -> f64 {
        self.y1
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Scales each axis independently. Non-negative factors keep the ordering.
    pub(crate) fn scaled(&self, scale_x: f64, scale_y: f64) -> Self {
        Self {
            x1: self.x1 * scale_x,
            y1: self.y1 * scale_y,
            x2: self.x2 * scale_x,
            y2: self.y2 * scale_y,
        }
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = InvalidDetection;

    fn try_from([x1, y1, x2, y2]: [f64; 4]) -> Result<Self, Self::Error> {
        Self::new(x1, y1, x2, y2)
    }
}

/// One object reported by the detection service.
///
/// Coordinates are in the pixel space of the image that was sent, not the
/// original capture. Instances are validated on construction and immutable.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "DetectionRecord")]
pub struct Detection {
    label: String,
    confidence: f64,
    bbox: Option<BoundingBox>,
}

impl Detection {
    pub fn new(
        label: impl Into<String>,
        confidence: f64,
        bbox: Option<BoundingBox>,
    ) -> Result<Self, InvalidDetection> {
        let label = label.into();
        if label.is_empty() {
            return Err(InvalidDetection::EmptyLabel);
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(InvalidDetection::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            label,
            confidence,
            bbox,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }
}

/// Wire shape of a detection before validation.
#[derive(Deserialize)]
struct DetectionRecord {
    label: String,
    confidence: f64,
    #[serde(rename = "box", default)]
    bbox: Option<BoundingBox>,
}

impl TryFrom<DetectionRecord> for Detection {
    type Error = InvalidDetection;

    fn try_from(record: DetectionRecord) -> Result<Self, Self::Error> {
        Detection::new(record.label, record.confidence, record.bbox)
    }
}
