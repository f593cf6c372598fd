//! Multiple-choice question generation.
//!
//! Every function takes the random source as a parameter so callers can pass
//! a seeded `StdRng` and get reproducible quizzes.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{DISTRACTORS_PER_QUESTION, Question, QuizError, WordEntry};

/// Builds up to `count` shuffled questions.
///
/// Answers come from `pool` (shuffled, first `count` distinct words); each
/// question's three distractors are sampled without replacement from the
/// distinct words of `distractor_source`, never repeating the answer.
///
/// # Errors
///
/// Returns `QuizError::InsufficientData` when any selected answer would have
/// fewer than three distractors. The check runs before any question is built.
pub fn generate_questions<R: Rng + ?Sized>(
    pool: &[WordEntry],
    distractor_source: &[WordEntry],
    count: usize,
    rng: &mut R,
) -> Result<Vec<Question>, QuizError> {
    let distractors = distinct(distractor_source);

    let mut answers: Vec<WordEntry> = distinct(pool).into_iter().cloned().collect();
    answers.shuffle(rng);
    answers.truncate(count);

    for answer in &answers {
        let available = eligible_distractors(&distractors, answer).count();
        if available < DISTRACTORS_PER_QUESTION {
            return Err(QuizError::InsufficientData {
                available,
                required: DISTRACTORS_PER_QUESTION,
            });
        }
    }

    answers
        .into_iter()
        .map(|answer| build_question(answer, &distractors, &mut *rng))
        .collect()
}

/// Fails fast when `source` cannot supply distractors for any answer.
///
/// # Errors
///
/// Returns `QuizError::InsufficientData` if `source` has fewer than four
/// distinct words.
pub fn ensure_distractor_pool(source: &[WordEntry]) -> Result<(), QuizError> {
    let available = distinct(source).len().saturating_sub(1);
    if available < DISTRACTORS_PER_QUESTION {
        return Err(QuizError::InsufficientData {
            available,
            required: DISTRACTORS_PER_QUESTION,
        });
    }
    Ok(())
}

fn build_question<R: Rng + ?Sized>(
    answer: WordEntry,
    distractors: &[&WordEntry],
    rng: &mut R,
) -> Result<Question, QuizError> {
    let mut candidates: Vec<&str> = eligible_distractors(distractors, &answer)
        .map(|entry| entry.word.as_str())
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(DISTRACTORS_PER_QUESTION);

    let mut options: Vec<String> = candidates.into_iter().map(str::to_owned).collect();
    options.push(answer.word.clone());
    options.shuffle(rng);

    Question::new(answer, options)
}

fn eligible_distractors<'a>(
    distractors: &'a [&'a WordEntry],
    answer: &'a WordEntry,
) -> impl Iterator<Item = &'a WordEntry> {
    distractors
        .iter()
        .copied()
        .filter(move |entry| entry.word != answer.word)
}

fn distinct(entries: &[WordEntry]) -> Vec<&WordEntry> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|entry| seen.insert(entry.word.as_str()))
        .collect()
}
