use thiserror::Error;

use crate::model::{DataShapeError, ProgressParseError, QuizError, UnknownDifficulty};

/// Umbrella error for callers that do not need to tell domain failures apart.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    DataShape(#[from] DataShapeError),
    #[error(transparent)]
    Progress(#[from] ProgressParseError),
    #[error(transparent)]
    Difficulty(#[from] UnknownDifficulty),
}
