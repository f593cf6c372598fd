//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use vocab_core::model::{DataShapeError, QuizError};

/// Errors emitted by the backend API client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("backend returned no audio content")]
    EmptyAudio,
    #[error("audio content is not valid base64: {0}")]
    InvalidAudio(#[from] base64::DecodeError),
}

/// Errors emitted by `ProgressStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressStoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("could not serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors emitted while driving a quiz session through `QuizLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizFlowError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Progress(#[from] ProgressStoreError),
}

/// Errors emitted by `DailyChallengeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DailyChallengeError {
    #[error("today's challenge is already completed")]
    AlreadyCompleted,
    #[error(transparent)]
    Flow(#[from] QuizFlowError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `MeaningMatchGame`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GameError {
    #[error("choose a difficulty first")]
    NotStarted,
    #[error(transparent)]
    DataShape(#[from] DataShapeError),
    #[error(transparent)]
    Flow(#[from] QuizFlowError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ToolkitService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolkitError {
    #[error("choose a file first")]
    NoFile,
    #[error("could not prepare game data from this file: {0}")]
    DataShape(#[from] DataShapeError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
