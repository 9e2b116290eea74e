use crate::shared::detection::{BoundingBox, Detection};
use crate::shared::dimensions::ImageDimensions;

/// A detection whose box has been re-expressed in preview-surface pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedDetection {
    pub label: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// Per-axis scale from `source` to `destination`, or `None` when either
/// size is unknown or has a zero component.
pub fn scale_factors(
    source: Option<ImageDimensions>,
    destination: ImageDimensions,
) -> Option<(f64, f64)> {
    let source = source.filter(ImageDimensions::is_measured)?;
    if !destination.is_measured() {
        return None;
    }
    Some((
        destination.width as f64 / source.width as f64,
        destination.height as f64 / source.height as f64,
    ))
}

/// Maps one box from source-image space into destination space.
///
/// Each axis is stretched independently; the preview is assumed to show
/// exactly the framing that was sent, so no letterbox offset is applied.
pub fn project_box(
    bbox: &BoundingBox,
    source: ImageDimensions,
    destination: ImageDimensions,
) -> Option<BoundingBox> {
    let (scale_x, scale_y) = scale_factors(Some(source), destination)?;
    Some(bbox.scaled(scale_x, scale_y))
}

/// Projects every boxed detection, preserving order.
///
/// Detections without a box are skipped. The result is empty when no
/// source size has been recorded or the destination is unmeasured.
pub fn project_detections(
    detections: &[Detection],
    source: Option<ImageDimensions>,
    destination: ImageDimensions,
) -> Vec<ProjectedDetection> {
    let Some((scale_x, scale_y)) = scale_factors(source, destination) else {
        return Vec::new();
    };
    detections
        .iter()
        .filter_map(|d| {
            d.bbox().map(|b| ProjectedDetection {
                label: d.label().to_string(),
                confidence: d.confidence(),
                bbox: b.scaled(scale_x, scale_y),
            })
        })
        .collect()
}
