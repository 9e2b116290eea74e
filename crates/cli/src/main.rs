mod settings;

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use snapdetect_core::capture::infrastructure::image_file_camera::ImageFileCamera;
use snapdetect_core::detection::infrastructure::http_detection_client::{
    HttpDetectionClient, HttpDetectionConfig,
};
use snapdetect_core::pipeline::capture_cycle::CaptureCycle;
use snapdetect_core::pipeline::cycle_logger::TimingCycleLogger;
use snapdetect_core::pipeline::infrastructure::threaded_capture_controller::CaptureController;
use snapdetect_core::preparation::infrastructure::jpeg_frame_preparer::JpegFramePreparer;
use snapdetect_core::projection::overlay_projector::OverlayProjector;
use snapdetect_core::shared::constants::IMAGE_EXTENSIONS;
use snapdetect_core::shared::detection::Detection;
use snapdetect_core::shared::dimensions::ImageDimensions;

use settings::Settings;

const API_KEY_ENV: &str = "SNAPDETECT_API_KEY";

/// Capture a photo, run remote object detection on it, and project the
/// detections onto a preview surface.
#[derive(Parser)]
#[command(name = "snapdetect")]
struct Cli {
    /// Image file that stands in for the camera.
    input: Option<PathBuf>,

    /// Base URL of the detection service.
    #[arg(long)]
    endpoint: Option<String>,

    /// API key sent in the x-api-key header.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Preview surface size as WIDTHxHEIGHT (e.g. 390x844).
    #[arg(long, value_parser = parse_dimensions)]
    preview: Option<ImageDimensions>,

    /// Maximum width of the uploaded frame in pixels.
    #[arg(long)]
    target_width: Option<u32>,

    /// JPEG quality of the uploaded frame (1-100).
    #[arg(long)]
    quality: Option<u8>,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Only check that the detection service is up.
    #[arg(long)]
    health: bool,

    /// Store the effective settings for later runs. A key taken from
    /// SNAPDETECT_API_KEY is not written to the settings file.
    #[arg(long)]
    save_settings: bool,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let stored = Settings::load();
    let settings = effective_settings(stored.clone(), &cli);
    validate(&cli, &settings)?;

    if cli.save_settings {
        let env_key = std::env::var(API_KEY_ENV).ok();
        persisted_settings(&settings, &stored, env_key.as_deref()).save();
    }

    let client = HttpDetectionClient::new(
        HttpDetectionConfig::new(&settings.endpoint, &settings.api_key)
            .with_timeout(Duration::from_secs(settings.timeout_secs)),
    )?;

    if cli.health {
        return run_health(&client);
    }

    let input = cli.input.as_deref().ok_or("Input image is required")?;
    run_detect(input, client, &settings, cli.preview, cli.json)
}

fn run_health(client: &HttpDetectionClient) -> Result<(), Box<dyn std::error::Error>> {
    if client.health()? {
        println!("Detection service is healthy");
        Ok(())
    } else {
        Err("Detection service reported an unhealthy status".into())
    }
}

fn run_detect(
    input: &Path,
    client: HttpDetectionClient,
    settings: &Settings,
    preview: Option<ImageDimensions>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Submitting {} to {}", input.display(), client.detect_url());
    let cycle = CaptureCycle::new(
        Box::new(ImageFileCamera::new(input)),
        Box::new(JpegFramePreparer::new(settings.jpeg_quality)?),
        Box::new(client),
        settings.target_width,
    );
    let mut controller = CaptureController::new(cycle, Box::new(TimingCycleLogger::new()));

    if !controller.trigger() {
        return Err(format!("Camera is not ready: {}", input.display()).into());
    }
    controller.wait();
    controller.logger().summary();

    let session = controller.session();
    if let Some(error) = session.last_error() {
        return Err(error.into());
    }

    let mut projector = OverlayProjector::new();
    projector.set_destination(preview.unwrap_or_default());
    let overlays = projector.project(session);

    if json {
        let report = serde_json::json!({
            "source": session.source_dimensions().map(|d| [d.width, d.height]),
            "preview": preview.map(|d| [d.width, d.height]),
            "detections": session.detections().iter().map(detection_json).collect::<Vec<_>>(),
            "overlays": overlays.iter().map(|o| serde_json::json!({
                "label": o.label,
                "confidence": o.confidence,
                "box": o.bbox.to_array(),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if session.detections().is_empty() {
        println!("No detections.");
        return Ok(());
    }

    if let Some(source) = session.source_dimensions() {
        println!("Detections in {source} frame:");
    }
    for d in session.detections() {
        println!("  {:<16} {:5.1}%", d.label(), d.confidence() * 100.0);
    }

    if let Some(preview) = preview {
        println!("Overlay on {preview} preview:");
        for o in overlays {
            println!(
                "  {} {:.0}%  left {:.1} top {:.1} size {:.1}x{:.1}",
                o.label,
                o.confidence * 100.0,
                o.bbox.left(),
                o.bbox.top(),
                o.bbox.width(),
                o.bbox.height()
            );
        }
    }
    Ok(())
}

fn detection_json(d: &Detection) -> serde_json::Value {
    serde_json::json!({
        "label": d.label(),
        "confidence": d.confidence(),
        "box": d.bbox().map(|b| b.to_array()),
    })
}

fn effective_settings(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(endpoint) = &cli.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(api_key) = &cli.api_key {
        settings.api_key = api_key.clone();
    }
    if let Some(width) = cli.target_width {
        settings.target_width = width;
    }
    if let Some(quality) = cli.quality {
        settings.jpeg_quality = quality;
    }
    if let Some(timeout) = cli.timeout {
        settings.timeout_secs = timeout;
    }
    settings
}

/// Settings to write back. An API key that came from the environment keeps
/// whatever key the file already held.
fn persisted_settings(effective: &Settings, stored: &Settings, env_key: Option<&str>) -> Settings {
    let mut persisted = effective.clone();
    if env_key.is_some_and(|key| key == effective.api_key) {
        persisted.api_key = stored.api_key.clone();
    }
    persisted
}

fn validate(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if settings.api_key.trim().is_empty() {
        return Err("An API key is required (--api-key or SNAPDETECT_API_KEY)".into());
    }
    if !(1..=100).contains(&settings.jpeg_quality) {
        return Err(format!(
            "Quality must be between 1 and 100, got {}",
            settings.jpeg_quality
        )
        .into());
    }
    if settings.target_width == 0 {
        return Err("Target width must be positive".into());
    }
    if settings.timeout_secs == 0 {
        return Err("Timeout must be at least 1 second".into());
    }
    if cli.health {
        return Ok(());
    }
    let Some(input) = &cli.input else {
        return Err("Input image is required unless --health is used".into());
    };
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    if !is_image(input) {
        return Err(format!("Unsupported image type: {}", input.display()).into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn parse_dimensions(value: &str) -> Result<ImageDimensions, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width = w
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{w}'"))?;
    let height = h
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{h}'"))?;
    Ok(ImageDimensions::new(width, height))
}
