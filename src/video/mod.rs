//! Script-to-video generation on Google's Veo model.
//!
//! Generation is a long-running operation: the request is submitted with
//! `predictLongRunning`, the returned operation is polled until it reports
//! `done`, and the first generated sample is downloaded to the video directory.
//! Polling is bounded by a hard ceiling so a stuck operation cannot hold a
//! request forever.

use crate::clients::{check_status, http_client, API_KEY_HEADER};
use crate::config::Settings;
use crate::error::{AgencyError, Result};
use crate::retry::{with_retry, RetryPolicy};
use crate::text::{preview, PREVIEW_CHARS};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Seconds used when the duration text cannot be interpreted.
const DEFAULT_DURATION_SECS: u32 = 5;

/// Longest clip the model renders.
const MAX_CLIP_SECS: u32 = 8;

const ASPECT_RATIOS: [&str; 2] = ["16:9", "9:16"];

fn default_style() -> String {
    "educational".to_string()
}

fn default_duration() -> String {
    "5 seconds".to_string()
}

fn default_no_faces() -> bool {
    true
}

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

/// What to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRequest {
    pub script: String,
    #[serde(default = "default_style")]
    pub style: String,
    /// Free-form duration text such as "5 seconds" or "1 minute".
    #[serde(default = "default_duration")]
    pub duration: String,
    #[serde(default = "default_no_faces")]
    pub no_faces: bool,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
}

impl VideoRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            style: default_style(),
            duration: default_duration(),
            no_faces: default_no_faces(),
            aspect_ratio: default_aspect_ratio(),
        }
    }

    pub fn duration_seconds(&self) -> u32 {
        parse_duration_text(&self.duration)
    }

    /// Prompt sent to the model.
    pub fn prompt(&self) -> String {
        let mut prompt = format!(
            "Create a {} video with the following script:\n{}\n\nImportant instructions:\n- Duration should be approximately {}\n",
            self.style,
            self.script.trim(),
            self.duration
        );
        if self.no_faces {
            prompt.push_str("- DO NOT generate or show any human faces\n");
            prompt.push_str("- Focus on concepts and ideas rather than people\n");
        }
        prompt.push_str("- Use abstract visuals, animations, and text overlays\n");
        prompt.push_str("- Use professional transitions and effects\n");
        prompt.push_str(&format!("- Maintain a {} tone throughout\n", self.style));
        prompt
    }

    fn validate(&self) -> Result<()> {
        if self.script.trim().is_empty() {
            return Err(AgencyError::InvalidInput("No script provided".to_string()));
        }
        if !ASPECT_RATIOS.contains(&self.aspect_ratio.as_str()) {
            return Err(AgencyError::InvalidInput(format!(
                "Unsupported aspect ratio {:?} (expected 16:9 or 9:16)",
                self.aspect_ratio
            )));
        }
        Ok(())
    }
}

/// Convert duration text to clip seconds.
///
/// "N second(s)" gives N, "N minute(s)" is capped at the model's clip limit,
/// anything else falls back to five seconds.
pub fn parse_duration_text(text: &str) -> u32 {
    let text = text.trim().to_lowercase();
    let amount = text
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<u32>().ok());

    match amount {
        Some(n) if text.contains("second") => n,
        Some(n) if text.contains("minute") => n.saturating_mul(60).min(MAX_CLIP_SECS),
        _ => DEFAULT_DURATION_SECS,
    }
}

/// A downloaded video.
#[derive(Debug, Clone, Serialize)]
pub struct VideoResult {
    pub video_path: String,
    pub file_size_mb: f64,
    pub duration_seconds: u32,
    pub aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GeneratedVideos>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GeneratedVideos {
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: SampleVideo,
}

#[derive(Debug, Deserialize)]
struct SampleVideo {
    uri: String,
}

impl Operation {
    fn first_video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .first()
            .map(|s| s.video.uri.as_str())
    }
}

/// Veo client.
pub struct VeoClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    output_dir: PathBuf,
    poll_interval: Duration,
    max_wait: Duration,
    retry: RetryPolicy,
}

impl VeoClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: output_dir.into(),
            poll_interval: Duration::from_secs(20),
            max_wait: Duration::from_secs(600),
            retry,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            settings.google_api_key(),
            settings.video.model.clone(),
            settings.video_dir(),
            settings.retry.policy(),
        )?
        .with_polling(
            Duration::from_secs(settings.video.poll_interval_seconds),
            Duration::from_secs(settings.video.max_wait_seconds),
        ))
    }

    /// Point the client at a different API root (used for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_wait: Duration) -> Self {
        self.poll_interval = interval;
        self.max_wait = max_wait;
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AgencyError::Config("GOOGLE_API_KEY not configured".to_string()))
    }

    /// Render a video and download it. Blocks until done or the polling ceiling.
    #[instrument(skip(self, request), fields(style = %request.style, duration = %request.duration))]
    pub async fn generate(&self, request: &VideoRequest) -> Result<VideoResult> {
        request.validate()?;
        let key = self.api_key()?.to_string();
        let duration_seconds = request.duration_seconds();

        info!(
            "Starting video generation ({} chars of script, {}s, {})",
            request.script.chars().count(),
            duration_seconds,
            request.aspect_ratio
        );
        debug!("Prompt: {}", preview(&request.prompt(), PREVIEW_CHARS));

        let operation = self.submit(request, duration_seconds, &key).await?;
        info!("Operation {} started, polling for completion", operation.name);

        let operation = tokio::time::timeout(self.max_wait, self.wait(operation, &key))
            .await
            .map_err(|_| {
                AgencyError::Timeout(format!(
                    "video generation did not finish within {}s",
                    self.max_wait.as_secs()
                ))
            })??;

        let uri = operation
            .first_video_uri()
            .ok_or_else(|| AgencyError::Video("No video data found in response".to_string()))?;
        let bytes = self.download(uri, &key).await?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self
            .output_dir
            .join(format!("video_{}.mp4", chrono::Utc::now().timestamp()));
        tokio::fs::write(&path, &bytes).await?;

        let file_size_mb = bytes.len() as f64 / (1024.0 * 1024.0);
        info!("Video saved as {} ({:.1} MB)", path.display(), file_size_mb);

        Ok(VideoResult {
            video_path: path.display().to_string(),
            file_size_mb,
            duration_seconds,
            aspect_ratio: request.aspect_ratio.clone(),
        })
    }

    async fn submit(
        &self,
        request: &VideoRequest,
        duration_seconds: u32,
        key: &str,
    ) -> Result<Operation> {
        let url = format!("{}/models/{}:predictLongRunning", self.base_url, self.model);
        let person_generation = if request.no_faces {
            "dont_allow"
        } else {
            "allow_adult"
        };
        let body = json!({
            "instances": [{ "prompt": request.prompt() }],
            "parameters": {
                "aspectRatio": request.aspect_ratio,
                "personGeneration": person_generation,
                "durationSeconds": duration_seconds,
                "sampleCount": 1,
                "enhancePrompt": true,
            }
        });

        with_retry(&self.retry, "veo.submit", || async {
            let response = self
                .http
                .post(&url)
                .header(API_KEY_HEADER, key)
                .json(&body)
                .send()
                .await?;
            let response = check_status(response, AgencyError::Video).await?;
            Ok::<Operation, AgencyError>(response.json().await?)
        })
        .await
    }

    async fn wait(&self, mut operation: Operation, key: &str) -> Result<Operation> {
        loop {
            if let Some(error) = &operation.error {
                return Err(AgencyError::Video(error.message.clone()));
            }
            if operation.done {
                return Ok(operation);
            }
            debug!(
                "Still generating, checking again in {}s",
                self.poll_interval.as_secs_f32()
            );
            tokio::time::sleep(self.poll_interval).await;

            let url = format!("{}/{}", self.base_url, operation.name);
            operation = with_retry(&self.retry, "veo.poll", || async {
                let response = self
                    .http
                    .get(&url)
                    .header(API_KEY_HEADER, key)
                    .send()
                    .await?;
                let response = check_status(response, AgencyError::Video).await?;
                Ok::<Operation, AgencyError>(response.json().await?)
            })
            .await?;
        }
    }

    async fn download(&self, uri: &str, key: &str) -> Result<Vec<u8>> {
        let url = url::Url::parse(uri)
            .map_err(|e| AgencyError::Video(format!("Invalid video URI {}: {}", uri, e)))?;

        let bytes = with_retry(&self.retry, "veo.download", || async {
            let response = self
                .http
                .get(url.clone())
                .header(API_KEY_HEADER, key)
                .send()
                .await?;
            let response = check_status(response, AgencyError::Video).await?;
            Ok::<Vec<u8>, AgencyError>(response.bytes().await?.to_vec())
        })
        .await?;

        if bytes.is_empty() {
            warn!("Downloaded video from {} is empty", uri);
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::HeaderMap;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_parse_duration_text() {
        assert_eq!(parse_duration_text("5 seconds"), 5);
        assert_eq!(parse_duration_text("1 Second"), 1);
        assert_eq!(parse_duration_text("  7 seconds "), 7);
        assert_eq!(parse_duration_text("5 minutes"), 8);
        assert_eq!(parse_duration_text("1 minute"), 8);
        assert_eq!(parse_duration_text("a while"), 5);
        assert_eq!(parse_duration_text("ten seconds"), 5);
        assert_eq!(parse_duration_text(""), 5);
    }

    #[test]
    fn test_prompt_mentions_faces_only_when_excluded() {
        let mut request = VideoRequest::new("Intro to Rust ownership");
        assert!(request.prompt().contains("DO NOT generate or show any human faces"));
        assert!(request.prompt().contains("Create a educational video"));

        request.no_faces = false;
        assert!(!request.prompt().contains("human faces"));
    }

    #[test]
    fn test_request_defaults_from_json() {
        let request: VideoRequest = serde_json::from_str(r#"{"script": "hello"}"#).unwrap();
        assert_eq!(request.style, "educational");
        assert_eq!(request.duration_seconds(), 5);
        assert!(request.no_faces);
        assert_eq!(request.aspect_ratio, "16:9");
    }

    #[derive(Clone)]
    struct Mock {
        base: String,
        polls: Arc<AtomicUsize>,
        finish_after: usize,
    }

    async fn submit(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(headers[API_KEY_HEADER], "test-key");
        assert_eq!(body["parameters"]["personGeneration"], "dont_allow");
        assert_eq!(body["parameters"]["durationSeconds"], 8);
        Json(json!({ "name": "operations/op-1" }))
    }

    async fn poll(State(mock): State<Mock>) -> Json<Value> {
        let count = mock.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if count < mock.finish_after {
            return Json(json!({ "name": "operations/op-1", "done": false }));
        }
        Json(json!({
            "name": "operations/op-1",
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": [
                { "video": { "uri": format!("{}/files/clip", mock.base) } }
            ]}}
        }))
    }

    async fn file(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Vec<u8> {
        assert_eq!(headers[API_KEY_HEADER], "test-key");
        assert!(!query.contains_key("key"));
        vec![0u8; 2048]
    }

    async fn serve(finish_after: usize) -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let polls = Arc::new(AtomicUsize::new(0));
        let mock = Mock {
            base: base.clone(),
            polls: polls.clone(),
            finish_after,
        };
        let app = Router::new()
            .route("/models/veo-test:predictLongRunning", post(submit))
            .route("/operations/op-1", get(poll))
            .route("/files/clip", get(file))
            .with_state(mock);
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (base, polls)
    }

    fn client(base: &str, dir: &Path, max_wait: Duration) -> VeoClient {
        VeoClient::new(
            Some("test-key".to_string()),
            "veo-test",
            dir,
            RetryPolicy::new(1, Duration::ZERO),
        )
        .unwrap()
        .with_base_url(base)
        .with_polling(Duration::from_millis(10), max_wait)
    }

    #[tokio::test]
    async fn test_generate_polls_until_done_and_downloads() {
        let (base, polls) = serve(3).await;
        let dir = tempfile::tempdir().unwrap();
        let veo = client(&base, dir.path(), Duration::from_secs(5));

        let mut request = VideoRequest::new("Rust in five seconds");
        request.duration = "2 minutes".to_string();
        let result = veo.generate(&request).await.unwrap();

        assert_eq!(polls.load(Ordering::SeqCst), 3);
        assert_eq!(result.duration_seconds, 8);
        assert_eq!(result.aspect_ratio, "16:9");
        assert!(result.video_path.ends_with(".mp4"));
        assert_eq!(std::fs::read(&result.video_path).unwrap().len(), 2048);
        assert!((result.file_size_mb - 2048.0 / (1024.0 * 1024.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_polling_ceiling_times_out() {
        let (base, _polls) = serve(usize::MAX).await;
        let dir = tempfile::tempdir().unwrap();
        let veo = client(&base, dir.path(), Duration::from_millis(100));

        let mut request = VideoRequest::new("never finishes");
        request.duration = "1 minute".to_string();
        let err = veo.generate(&request).await.unwrap_err();
        assert!(matches!(err, AgencyError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_key() {
        let dir = tempfile::tempdir().unwrap();
        let veo = VeoClient::new(
            Some("SECRET-VEO-KEY".to_string()),
            "veo-test",
            dir.path(),
            RetryPolicy::new(1, Duration::ZERO),
        )
        .unwrap()
        .with_base_url("http://127.0.0.1:1");

        let err = veo.generate(&VideoRequest::new("hello")).await.unwrap_err();
        assert!(matches!(err, AgencyError::Http(_)));
        assert!(!err.to_string().contains("SECRET-VEO-KEY"));
    }

    #[tokio::test]
    async fn test_missing_key_and_bad_aspect_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let veo = VeoClient::new(None, "veo-test", dir.path(), RetryPolicy::new(1, Duration::ZERO))
            .unwrap();
        let err = veo.generate(&VideoRequest::new("x")).await.unwrap_err();
        assert!(matches!(err, AgencyError::Config(_)));

        let mut request = VideoRequest::new("x");
        request.aspect_ratio = "4:3".to_string();
        let err = veo.generate(&request).await.unwrap_err();
        assert!(matches!(err, AgencyError::InvalidInput(_)));
    }
}
