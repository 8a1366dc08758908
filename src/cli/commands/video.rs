//! Video command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::video::{VeoClient, VideoRequest};
use anyhow::{Context, Result};

/// Render a video from a script (inline text or `@path`).
pub async fn run_video(
    script: &str,
    style: &str,
    duration: &str,
    aspect_ratio: &str,
    allow_faces: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Video, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let script = match script.strip_prefix('@') {
        Some(path) => {
            let path = Settings::expand_path(path);
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read script from {}", path.display()))?
        }
        None => script.to_string(),
    };

    let mut request = VideoRequest::new(script);
    request.style = style.to_string();
    request.duration = duration.to_string();
    request.aspect_ratio = aspect_ratio.to_string();
    request.no_faces = !allow_faces;

    let veo = VeoClient::from_settings(&settings)?;
    let spinner = Output::spinner("Generating video, this usually takes a few minutes...");
    let result = veo.generate(&request).await;
    spinner.finish_and_clear();

    match result {
        Ok(video) => {
            Output::success("Video generated successfully");
            Output::kv("Path", &video.video_path);
            Output::kv("Size", &format!("{:.1} MB", video.file_size_mb));
            Output::kv("Duration", &format!("{}s", video.duration_seconds));
            Output::kv("Aspect ratio", &video.aspect_ratio);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Video generation failed: {}", e));
            Output::info("Check that your Google AI key has Veo access and sufficient quota.");
            Err(e.into())
        }
    }
}
