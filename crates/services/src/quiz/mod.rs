mod progress;
mod session;
mod timer;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::QuizFlowError;
pub use progress::QuizProgress;
pub use session::{AnswerOutcome, AnswerRecord, Feedback, QuizEffect, QuizSession, QuizState};
pub use timer::{QuestionTimer, TimerExpired};
pub use workflow::{QuizLoopService, SharedRng};
