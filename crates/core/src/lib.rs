//! Capture a camera frame, submit it to a remote object-detection service,
//! and project the returned boxes onto the live preview.

pub mod capture;
pub mod detection;
pub mod pipeline;
pub mod preparation;
pub mod projection;
pub mod shared;
