#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod chat;
pub mod daily_challenge;
pub mod dashboard;
pub mod error;
pub mod game;
pub mod guard;
pub mod high_scores;
pub mod progress_store;
pub mod quiz;
pub mod toolkit;

pub use vocab_core::Clock;

pub use api::{ApiClient, ApiConfig, Backend, CsvUpload, Language, NlpAction};
pub use app_services::AppServices;
pub use chat::{ChatMessage, ChatService, SendOutcome, Sender};
pub use daily_challenge::{DailyChallengeService, DailyChallengeStatus};
pub use dashboard::{DashboardService, DashboardSummary, TrackedWordView};
pub use error::{
    ApiError, AppServicesError, DailyChallengeError, GameError, ProgressStoreError,
    QuizFlowError, ToolkitError,
};
pub use game::{GamePhase, GameStep, LevelOutcome, MeaningMatchGame, RoundOutcome};
pub use high_scores::HighScoreService;
pub use progress_store::ProgressStore;
pub use quiz::{
    AnswerOutcome, Feedback, QuestionTimer, QuizLoopService, QuizSession, QuizState,
    TimerExpired,
};
pub use toolkit::{NlpAnalysis, ToolkitOutcome, ToolkitService};
