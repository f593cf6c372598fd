use std::sync::Arc;

use storage::repository::Storage;
use vocab_core::model::Dataset;

use crate::Clock;
use crate::api::{self, ApiClient, ApiConfig, Backend, Language, PlayableAudio};
use crate::chat::ChatService;
use crate::daily_challenge::DailyChallengeService;
use crate::dashboard::DashboardService;
use crate::error::{ApiError, AppServicesError, GameError};
use crate::game::MeaningMatchGame;
use crate::high_scores::HighScoreService;
use crate::progress_store::ProgressStore;
use crate::quiz::QuizLoopService;
use crate::toolkit::ToolkitService;

/// Assembles app-facing services over one store and one backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    quiz: Arc<QuizLoopService>,
    high_scores: Arc<HighScoreService>,
    daily_challenge: Arc<DailyChallengeService>,
    dashboard: Arc<DashboardService>,
    backend: Arc<dyn Backend>,
    chat: Arc<ChatService>,
    toolkit: Arc<ToolkitService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage or the HTTP client cannot be initialised.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        api: ApiConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let backend: Arc<dyn Backend> = Arc::new(ApiClient::new(api)?);
        Ok(Self::from_parts(storage, clock, backend).await)
    }

    /// Build services over an existing store and backend.
    pub async fn from_parts(storage: Storage, clock: Clock, backend: Arc<dyn Backend>) -> Self {
        let progress = Arc::new(ProgressStore::load(Arc::clone(&storage.local), clock).await);
        let quiz = Arc::new(QuizLoopService::new(clock, progress));
        let high_scores = Arc::new(HighScoreService::new(Arc::clone(&storage.local)));
        let daily_challenge = Arc::new(DailyChallengeService::new(
            Arc::clone(&storage.local),
            Arc::clone(&quiz),
        ));
        let dashboard = Arc::new(DashboardService::new(Arc::clone(&quiz)));
        let chat = Arc::new(ChatService::new(Arc::clone(&backend), Language::default()));
        let toolkit = Arc::new(ToolkitService::new(Arc::clone(&backend)));

        Self {
            clock,
            quiz,
            high_scores,
            daily_challenge,
            dashboard,
            backend,
            chat,
            toolkit,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn high_scores(&self) -> Arc<HighScoreService> {
        Arc::clone(&self.high_scores)
    }

    #[must_use]
    pub fn daily_challenge(&self) -> Arc<DailyChallengeService> {
        Arc::clone(&self.daily_challenge)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn chat(&self) -> Arc<ChatService> {
        Arc::clone(&self.chat)
    }

    #[must_use]
    pub fn toolkit(&self) -> Arc<ToolkitService> {
        Arc::clone(&self.toolkit)
    }

    /// New meaning-match game over `dataset`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::DataShape` if `dataset` has fewer than four words.
    pub fn meaning_match_game(&self, dataset: Dataset) -> Result<MeaningMatchGame, GameError> {
        MeaningMatchGame::new(self.quiz(), self.high_scores(), dataset)
    }

    /// Speech for `word`, ready to play.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if synthesis fails or returns unusable audio.
    pub async fn pronounce(&self, word: &str) -> Result<PlayableAudio, ApiError> {
        api::pronounce(self.backend.as_ref(), word).await
    }
}
