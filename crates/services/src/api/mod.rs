//! HTTP client for the analysis backend.

pub mod audio;

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use vocab_core::model::RawWordRow;

use crate::error::ApiError;

pub use audio::{AudioFormat, PlayableAudio, normalize_tts_audio};

/// Backend used by debug builds when `VOCAB_API_URL` is unset.
pub const DEV_API_URL: &str = "http://localhost:5000";
/// Backend used by release builds when `VOCAB_API_URL` is unset.
pub const PROD_API_URL: &str = "https://my-project-backend-wqyy.onrender.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// `VOCAB_API_URL` if set and non-empty, else the build's default backend.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("VOCAB_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| default_base_url().into());
        Self::new(base_url)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(default_base_url())
    }
}

fn default_base_url() -> &'static str {
    if cfg!(debug_assertions) {
        DEV_API_URL
    } else {
        PROD_API_URL
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

/// A CSV file picked by the user, sent as multipart field `csvfile`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CsvUpload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    fn part(&self) -> Result<Part, ApiError> {
        Ok(Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str("text/csv")?)
    }
}

/// Text analyses the backend can run over an uploaded CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NlpAction {
    Tokenization,
    #[default]
    Lemmatization,
    Stemming,
    StopwordRemoval,
    MorphologicalAnalysis,
    SentimentAnalysis,
}

impl NlpAction {
    pub const ALL: [NlpAction; 6] = [
        NlpAction::Tokenization,
        NlpAction::Lemmatization,
        NlpAction::Stemming,
        NlpAction::StopwordRemoval,
        NlpAction::MorphologicalAnalysis,
        NlpAction::SentimentAnalysis,
    ];

    /// Name sent in the `action` form field.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            NlpAction::Tokenization => "Tokenization",
            NlpAction::Lemmatization => "Lemmatization",
            NlpAction::Stemming => "Stemming",
            NlpAction::StopwordRemoval => "Stopword Removal",
            NlpAction::MorphologicalAnalysis => "Morphological Analysis",
            NlpAction::SentimentAnalysis => "Sentiment Analysis",
        }
    }
}

impl fmt::Display for NlpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse error for `NlpAction`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown analysis `{0}`")]
pub struct UnknownNlpAction(pub String);

impl FromStr for NlpAction {
    type Err = UnknownNlpAction;

    /// Accepts the display name or a compact form, case-insensitively:
    /// `Stopword Removal`, `stopword-removal` and `stopwordremoval` all match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact = |raw: &str| {
            raw.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        };
        let wanted = compact(s);
        NlpAction::ALL
            .into_iter()
            .find(|action| compact(action.name()) == wanted)
            .ok_or_else(|| UnknownNlpAction(s.trim().to_owned()))
    }
}

/// One analysed row: the original text and the backend's result for it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NlpRecord {
    pub original: String,
    pub processed: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "hi" | "hindi" => Ok(Language::Hi),
            other => Err(format!("unknown language `{other}` (expected en or hi)")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub language: Language,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub is_definition: bool,
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub videos: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TtsResponse {
    audio_content: Option<String>,
}

//
// ─── BACKEND ───────────────────────────────────────────────────────────────────
//

/// Remote analysis backend. `ApiClient` is the HTTP implementation.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Rows parsed from `upload` for the meaning-match game.
    async fn load_game_data(&self, upload: &CsvUpload) -> Result<Vec<RawWordRow>, ApiError>;

    async fn process_nlp(
        &self,
        upload: &CsvUpload,
        action: NlpAction,
    ) -> Result<Vec<NlpRecord>, ApiError>;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError>;

    /// Base-64 speech for `text`.
    async fn synthesize(&self, text: &str) -> Result<String, ApiError>;
}

/// Synthesize `text` and return audio ready to play.
///
/// # Errors
///
/// Returns `ApiError` for transport, status or audio decoding failures.
pub async fn pronounce(backend: &dyn Backend, text: &str) -> Result<PlayableAudio, ApiError> {
    let audio_content = backend.synthesize(text.trim()).await?;
    normalize_tts_audio(&audio_content)
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ApiConfig::from_env())
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .post(self.config.endpoint(path))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .post(self.config.endpoint(path))
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn load_game_data(&self, upload: &CsvUpload) -> Result<Vec<RawWordRow>, ApiError> {
        let form = Form::new().part("csvfile", upload.part()?);
        let rows: Option<Vec<RawWordRow>> = self.post_form("load-game-data", form).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn process_nlp(
        &self,
        upload: &CsvUpload,
        action: NlpAction,
    ) -> Result<Vec<NlpRecord>, ApiError> {
        let form = Form::new()
            .part("csvfile", upload.part()?)
            .text("action", action.name());
        self.post_form("nlp", form).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        self.post_json("chatbot", request).await
    }

    async fn synthesize(&self, text: &str) -> Result<String, ApiError> {
        let body: TtsResponse = self.post_json("tts", &TtsRequest { text }).await?;
        body.audio_content
            .filter(|content| !content.is_empty())
            .ok_or(ApiError::EmptyAudio)
    }
}
