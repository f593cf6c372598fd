use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use vocab_core::model::Dataset;

use crate::api::{Backend, CsvUpload, NlpAction, NlpRecord};
use crate::error::ToolkitError;
use crate::guard::ResponseGuard;

/// Result of an analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct NlpAnalysis {
    pub action: NlpAction,
    pub records: Vec<NlpRecord>,
}

/// What a toolkit request ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolkitOutcome<T> {
    Applied(T),
    /// Another file was loaded while waiting; the response was dropped.
    Stale,
}

#[derive(Default)]
struct ToolkitState {
    upload: Option<CsvUpload>,
    dataset: Option<Dataset>,
    analysis: Option<NlpAnalysis>,
}

/// Uploaded-CSV workspace: game data preparation and text analysis.
pub struct ToolkitService {
    backend: Arc<dyn Backend>,
    state: Mutex<ToolkitState>,
    guard: ResponseGuard,
}

impl ToolkitService {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: Mutex::new(ToolkitState::default()),
            guard: ResponseGuard::new(),
        }
    }

    /// Select `upload` and prepare game data from it.
    ///
    /// The previous file, dataset and analysis are replaced immediately;
    /// responses to earlier requests are ignored from then on.
    ///
    /// # Errors
    ///
    /// Returns `ToolkitError::Api` if the backend fails and
    /// `ToolkitError::DataShape` if the file yields fewer than four words.
    /// The file stays selected for analysis either way.
    pub async fn load_file(
        &self,
        upload: CsvUpload,
    ) -> Result<ToolkitOutcome<Dataset>, ToolkitError> {
        let ticket = self.guard.invalidate();
        *self.state() = ToolkitState {
            upload: Some(upload.clone()),
            ..ToolkitState::default()
        };

        let rows = self.backend.load_game_data(&upload).await;
        if !self.guard.is_current(ticket) {
            return Ok(ToolkitOutcome::Stale);
        }

        let dataset = Dataset::from_rows(rows?).require_playable().inspect_err(|err| {
            warn!(file = %upload.file_name, error = %err, "file has no playable word list");
        })?;
        info!(file = %upload.file_name, words = dataset.len(), "game data ready");
        self.state().dataset = Some(dataset.clone());
        Ok(ToolkitOutcome::Applied(dataset))
    }

    /// Run `action` over the selected file.
    ///
    /// # Errors
    ///
    /// Returns `ToolkitError::NoFile` before a file is loaded and
    /// `ToolkitError::Api` if the backend fails; the previous analysis is kept.
    pub async fn analyze(
        &self,
        action: NlpAction,
    ) -> Result<ToolkitOutcome<NlpAnalysis>, ToolkitError> {
        let ticket = self.guard.ticket();
        let upload = self.state().upload.clone().ok_or(ToolkitError::NoFile)?;

        let records = self.backend.process_nlp(&upload, action).await?;
        if !self.guard.is_current(ticket) {
            return Ok(ToolkitOutcome::Stale);
        }

        let analysis = NlpAnalysis { action, records };
        self.state().analysis = Some(analysis.clone());
        Ok(ToolkitOutcome::Applied(analysis))
    }

    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        self.state().upload.as_ref().map(|upload| upload.file_name.clone())
    }

    /// Dataset for the meaning-match game, once a playable file is loaded.
    #[must_use]
    pub fn game_dataset(&self) -> Option<Dataset> {
        self.state().dataset.clone()
    }

    #[must_use]
    pub fn game_ready(&self) -> bool {
        self.state().dataset.is_some()
    }

    #[must_use]
    pub fn last_analysis(&self) -> Option<NlpAnalysis> {
        self.state().analysis.clone()
    }

    fn state(&self) -> MutexGuard<'_, ToolkitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
