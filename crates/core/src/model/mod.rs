mod challenge;
mod difficulty;
mod progress;
mod question;
mod word;

pub use challenge::{
    DAILY_CHALLENGE_QUESTIONS, curated_words, daily_challenge_available, format_challenge_date,
    parse_challenge_date,
};
pub use difficulty::{Difficulty, UnknownDifficulty};
pub use progress::{
    MissedWord, PROGRESS_FORMAT_VERSION, ProgressFormat, ProgressParseError, ProgressRecord,
    QuizKind, QuizResult,
};
pub use question::{DISTRACTORS_PER_QUESTION, OPTIONS_PER_QUESTION, Question, QuizError};
pub use word::{DataShapeError, Dataset, MIN_PLAYABLE_WORDS, RawWordRow, WordEntry};
