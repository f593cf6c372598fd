//! Key names used in local storage.

use vocab_core::model::Difficulty;

/// Serialized progress record.
pub const PROGRESS: &str = "progressData";

/// Calendar date of the last completed daily challenge.
pub const DAILY_CHALLENGE_COMPLETION: &str = "dailyChallengeCompletion";

/// Best meaning-match score for `difficulty`.
#[must_use]
pub fn high_score(difficulty: Difficulty) -> String {
    format!("highScore_{}", difficulty.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_score_keys_are_per_difficulty() {
        assert_eq!(high_score(Difficulty::Easy), "highScore_easy");
        assert_eq!(high_score(Difficulty::Hard), "highScore_hard");
    }
}
