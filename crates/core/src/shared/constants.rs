pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

pub const DETECT_PATH: &str = "/detect";
pub const HEALTH_PATH: &str = "/health";

pub const API_KEY_HEADER: &str = "x-api-key";
pub const UPLOAD_FIELD_NAME: &str = "file";
pub const UPLOAD_FILE_NAME: &str = "frame.jpg";
pub const UPLOAD_MIME_TYPE: &str = "image/jpeg";

/// Width the captured photo is reduced to before upload; matches the
/// service's inference size.
pub const DEFAULT_TARGET_WIDTH: u32 = 640;

/// JPEG quality (1-100) for the uploaded frame.
pub const DEFAULT_JPEG_QUALITY: u8 = 60;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
