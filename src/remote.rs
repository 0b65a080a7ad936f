use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::{FirebaseConfig, FunctionsSettings};
use crate::error::{AppError, Result};

/// Name of the deployed transcription function
pub const TRANSCRIPT_FUNCTION: &str = "runTranscript";

/// Basename used when the user leaves the output name empty
pub const DEFAULT_BASENAME: &str = "transcript_output";

/// URL of the transcription function for a region and project.
pub fn function_url(region: &str, project: &str, settings: &FunctionsSettings) -> String {
    match &settings.base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), TRANSCRIPT_FUNCTION),
        None => format!(
            "https://{}-{}.{}/{}",
            region, project, settings.host, TRANSCRIPT_FUNCTION
        ),
    }
}

/// What the user asked for on the transcript form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRequest {
    pub video_url: String,
    pub output_basename: String,
}

impl TranscriptRequest {
    /// An empty basename becomes `transcript_output`. Only the final path component
    /// of the basename is kept.
    pub fn new(video_url: &str, output_basename: &str) -> Self {
        let trimmed = output_basename.trim();
        let output_basename = Path::new(trimmed)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_BASENAME)
            .to_string();

        Self {
            video_url: video_url.to_string(),
            output_basename,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.sbv", self.output_basename)
    }
}

/// Response of a successful call
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TranscriptResult {
    #[serde(default)]
    pub sbv_content: Option<String>,
    #[serde(default)]
    pub video_title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    youtube_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

pub struct TranscriptClient {
    client: Client,
    endpoint: String,
}

impl TranscriptClient {
    pub fn new(config: &FirebaseConfig, settings: &FunctionsSettings) -> Result<Self> {
        let endpoint = function_url(
            &config.cloud_function_region,
            &config.cloud_function_project,
            settings,
        );

        // No timeout: transcription of long videos takes minutes
        let client = Client::builder()
            .user_agent(concat!("subfetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AppError::Http)?;

        debug!("Transcript endpoint: {}", endpoint);
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the function to transcribe `video_url`. One request, no retry.
    pub async fn submit(&self, video_url: &str, token: &str) -> Result<TranscriptResult> {
        info!("Requesting transcript for {}", video_url);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&SubmitBody {
                youtube_url: video_url,
            })
            .send()
            .await
            .map_err(|e| AppError::RemoteCall(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
            warn!("Transcript function failed with {}: {}", status, error);
            return Err(AppError::RemoteCall(error));
        }

        let result: TranscriptResult = response
            .json()
            .await
            .map_err(|e| AppError::RemoteCall(format!("Failed to parse response: {}", e)))?;

        info!(
            "Transcript received for '{}'",
            result.video_title.as_deref().unwrap_or("")
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(region: &str, project: &str) -> FirebaseConfig {
        FirebaseConfig {
            api_key: "k".to_string(),
            auth_domain: String::new(),
            project_id: project.to_string(),
            storage_bucket: String::new(),
            messaging_sender_id: String::new(),
            app_id: String::new(),
            measurement_id: None,
            cloud_function_region: region.to_string(),
            cloud_function_project: project.to_string(),
        }
    }

    async fn client_for(server: &MockServer) -> TranscriptClient {
        let settings = FunctionsSettings {
            base_url: Some(server.uri()),
            ..FunctionsSettings::default()
        };
        TranscriptClient::new(&config("us-central1", "demo"), &settings).unwrap()
    }

    #[test]
    fn test_default_endpoint() {
        let client =
            TranscriptClient::new(&config("us-central1", "demo"), &FunctionsSettings::default())
                .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://us-central1-demo.cloudfunctions.net/runTranscript"
        );
    }

    #[test]
    fn test_base_url_override() {
        let settings = FunctionsSettings {
            base_url: Some("http://127.0.0.1:5001/demo/europe-west1/".to_string()),
            ..FunctionsSettings::default()
        };
        assert_eq!(
            function_url("europe-west1", "demo", &settings),
            "http://127.0.0.1:5001/demo/europe-west1/runTranscript"
        );
    }

    #[test]
    fn test_request_basename() {
        assert_eq!(TranscriptRequest::new("u", "  out ").file_name(), "out.sbv");
        assert_eq!(TranscriptRequest::new("u", "").file_name(), "transcript_output.sbv");
        assert_eq!(TranscriptRequest::new("u", "   ").output_basename, DEFAULT_BASENAME);
        assert_eq!(TranscriptRequest::new("u", "../../etc/out").file_name(), "out.sbv");
        assert_eq!(TranscriptRequest::new("u", "..").output_basename, DEFAULT_BASENAME);
    }

    #[tokio::test]
    async fn test_submit_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/runTranscript"))
            .and(header("authorization", "Bearer token-1"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({ "youtube_url": "https://youtu.be/abc" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Transcription successful",
                "sbv_content": "0:00:00.000,0:00:02.000\nHei",
                "video_title": "Demo"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .await
            .submit("https://youtu.be/abc", "token-1")
            .await
            .unwrap();

        assert_eq!(result.sbv_content.as_deref(), Some("0:00:00.000,0:00:02.000\nHei"));
        assert_eq!(result.video_title.as_deref(), Some("Demo"));
    }

    #[tokio::test]
    async fn test_submit_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({ "error": "quota exceeded" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).await.submit("u", "t").await.unwrap_err();
        match err {
            AppError::RemoteCall(message) => assert_eq!(message, "quota exceeded"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_unparseable_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Processing error: boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.submit("u", "t").await.unwrap_err();
        match err {
            AppError::RemoteCall(message) => {
                assert_eq!(message, "HTTP error! status: 500");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_error_without_message_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = client_for(&server).await.submit("u", "t").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 401");
    }
}
