//! Line-oriented terminal front-end over `AppServices`.

use std::error::Error;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

use services::quiz::QuizState;
use services::{
    AppServices, CsvUpload, DailyChallengeError, DailyChallengeStatus, Feedback, GamePhase,
    GameStep, Language, MeaningMatchGame, NlpAction, QuizSession, RoundOutcome, SendOutcome,
    ToolkitError, ToolkitOutcome,
};
use vocab_core::model::{Difficulty, Question, QuizResult};

type AppResult = Result<(), Box<dyn Error>>;

pub struct Terminal {
    lines: Lines<BufReader<Stdin>>,
    out: Stdout,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            out: tokio::io::stdout(),
        }
    }

    async fn say(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }

    async fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        self.out.write_all(prompt.as_bytes()).await?;
        self.out.flush().await?;
        self.read_line().await
    }

    /// Next trimmed input line; `None` at end of input.
    async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_owned()))
    }
}

/// Resolve input to an option: its 1-based number or the word itself.
fn resolve_choice<'a>(input: &str, options: &'a [String]) -> Option<&'a str> {
    let input = input.trim();
    if let Ok(number) = input.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|index| options.get(index))
            .map(String::as_str);
    }
    options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(input))
        .map(String::as_str)
}

fn render_question(number: usize, total: usize, question: &Question) -> String {
    let mut text = format!("\nQuestion {number}/{total}: {}\n", question.prompt());
    for (index, option) in question.options().iter().enumerate() {
        text.push_str(&format!("  {}) {option}\n", index + 1));
    }
    text
}

fn render_feedback(feedback: Feedback, correct_answer: &str) -> String {
    match feedback {
        Feedback::Correct => "Correct!".to_owned(),
        Feedback::Incorrect => format!("Not quite. The answer was \"{correct_answer}\"."),
    }
}

fn render_result(result: &QuizResult) -> String {
    if result.is_perfect() {
        format!("Perfect! You scored {}/{}.", result.score, result.total)
    } else {
        format!("Quiz complete. You scored {}/{}.", result.score, result.total)
    }
}

//
// ─── DASHBOARD ─────────────────────────────────────────────────────────────────
//

pub async fn show_dashboard(term: &mut Terminal, app: &AppServices) -> AppResult {
    let summary = app.dashboard().summary().await;
    if summary.is_empty() {
        term.say("No progress yet. Try `daily` or `play --csv <file>` to get started.")
            .await?;
        return Ok(());
    }

    term.say(&format!(
        "Words to review: {}   Total mistakes: {}   Quizzes completed: {}",
        summary.tracked.len(),
        summary.total_mistakes,
        summary.quizzes_completed
    ))
    .await?;
    for tracked in &summary.tracked {
        term.say(&format!(
            "  {:<18} missed {}x, last {}  ({})",
            tracked.word, tracked.missed_count, tracked.last_missed_label, tracked.meaning
        ))
        .await?;
    }
    if !summary.recent.is_empty() {
        term.say("Recent quizzes:").await?;
        for result in &summary.recent {
            term.say(&format!(
                "  {:?}: {}/{}",
                result.kind, result.score, result.total
            ))
            .await?;
        }
    }
    if summary.can_practice {
        term.say("Run `practice` for a quiz on your tracked words.").await?;
    } else {
        term.say("Miss at least four different words to unlock practice.")
            .await?;
    }
    Ok(())
}

pub async fn clear(term: &mut Terminal, app: &AppServices) -> AppResult {
    let answer = term
        .ask("Forget all tracked words and quiz history? [y/N] ")
        .await?;
    if matches!(answer.as_deref(), Some("y" | "Y" | "yes")) {
        app.dashboard().clear_progress().await?;
        term.say("Progress cleared.").await?;
    } else {
        term.say("Nothing changed.").await?;
    }
    Ok(())
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

/// Read answers until one names an option. `None` at end of input.
async fn read_choice(term: &mut Terminal, question: &Question) -> std::io::Result<Option<String>> {
    loop {
        let Some(input) = term.ask("Your answer: ").await? else {
            return Ok(None);
        };
        if let Some(choice) = resolve_choice(&input, question.options()) {
            return Ok(Some(choice.to_owned()));
        }
        term.say("Pick 1-4 or type the word.").await?;
    }
}

pub async fn practice(term: &mut Terminal, app: &AppServices) -> AppResult {
    let mut session = match app.dashboard().start_remediation_quiz().await {
        Ok(session) => session,
        Err(err) => {
            term.say(&format!("Practice is not available yet: {err}")).await?;
            return Ok(());
        }
    };
    let quiz = app.quiz();
    while let Some(question) = session.current_question().cloned() {
        let index = session.current_index().unwrap_or_default();
        term.say(&render_question(index + 1, session.questions().len(), &question))
            .await?;
        let Some(choice) = read_choice(term, &question).await? else {
            return Ok(());
        };
        if let Some(outcome) = quiz.answer_current(&mut session, &choice).await? {
            term.say(&render_feedback(outcome.feedback, &outcome.correct_answer))
                .await?;
        }
        if let Some(result) = quiz.advance(&mut session).await? {
            term.say(&render_result(&result)).await?;
        }
    }
    Ok(())
}

pub async fn daily(term: &mut Terminal, app: &AppServices) -> AppResult {
    let daily = app.daily_challenge();
    if let DailyChallengeStatus::AlreadyCompleted { on } = daily.status().await {
        term.say(&format!(
            "Today's challenge is done ({on}). Come back tomorrow!"
        ))
        .await?;
        return Ok(());
    }

    let mut session: QuizSession = daily.start().await?;
    term.say("Daily challenge: five words, one try a day.").await?;
    while let Some(question) = session.current_question().cloned() {
        let index = session.current_index().unwrap_or_default();
        term.say(&render_question(index + 1, session.questions().len(), &question))
            .await?;
        let Some(choice) = read_choice(term, &question).await? else {
            return Ok(());
        };
        if let Some(outcome) = daily.answer(&mut session, &choice).await? {
            term.say(&render_feedback(outcome.feedback, &outcome.correct_answer))
                .await?;
        }
        match daily.advance(&mut session).await {
            Ok(Some(result)) => term.say(&render_result(&result)).await?,
            Ok(None) => {}
            Err(DailyChallengeError::AlreadyCompleted) => {
                term.say("This challenge was already completed today.").await?;
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

//
// ─── TOOLKIT & GAME ────────────────────────────────────────────────────────────
//

async fn read_upload(path: &Path) -> Result<CsvUpload, Box<dyn Error>> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload.csv".to_owned(), |name| name.to_string_lossy().into_owned());
    Ok(CsvUpload::new(file_name, bytes))
}

pub async fn analyze(
    term: &mut Terminal,
    app: &AppServices,
    csv: &Path,
    action: NlpAction,
) -> AppResult {
    let toolkit = app.toolkit();
    match toolkit.load_file(read_upload(csv).await?).await {
        Ok(_) => term.say("Game data ready for this file.").await?,
        Err(err @ ToolkitError::DataShape(_)) => term.say(&err.to_string()).await?,
        Err(err) => term.say(&format!("Could not prepare game data: {err}")).await?,
    }

    match toolkit.analyze(action).await {
        Ok(ToolkitOutcome::Applied(analysis)) => {
            term.say(&format!("\nAnalysis results: {}", analysis.action))
                .await?;
            for record in &analysis.records {
                term.say(&format!("{}\n  Processed: {}", record.original, record.processed))
                    .await?;
            }
        }
        Ok(ToolkitOutcome::Stale) => {}
        Err(err) => term.say(&format!("Failed to process the file: {err}")).await?,
    }
    Ok(())
}

async fn choose_difficulty(term: &mut Terminal) -> std::io::Result<Option<Difficulty>> {
    loop {
        let Some(input) = term
            .ask("Choose a difficulty: easy (20s), medium (15s), hard (10s): ")
            .await?
        else {
            return Ok(None);
        };
        match input.parse::<Difficulty>() {
            Ok(difficulty) => return Ok(Some(difficulty)),
            Err(err) => term.say(&err.to_string()).await?,
        }
    }
}

/// What the player did while a question was on screen.
enum Turn {
    Answered(Option<RoundOutcome>),
    Restart,
    Quit,
}

async fn play_turn(term: &mut Terminal, game: &mut MeaningMatchGame) -> Result<Turn, Box<dyn Error>> {
    loop {
        let Some(question) = game.current_question().cloned() else {
            return Ok(Turn::Quit);
        };
        let prompt = format!("[{}s] answer, r = restart, q = quit: ", game.seconds_left());
        term.out.write_all(prompt.as_bytes()).await?;
        term.out.flush().await?;

        tokio::select! {
            line = term.lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(Turn::Quit);
                };
                match line.trim() {
                    "q" => return Ok(Turn::Quit),
                    "r" => return Ok(Turn::Restart),
                    input => match resolve_choice(input, question.options()) {
                        Some(choice) => {
                            let choice = choice.to_owned();
                            return Ok(Turn::Answered(game.answer(&choice).await?));
                        }
                        None => term.say("Pick 1-4 or type the word.").await?,
                    },
                }
            }
            expired = game.wait_for_timer() => {
                term.say("\nTime's up!").await?;
                return Ok(Turn::Answered(game.on_timer_expired(expired).await?));
            }
        }
    }
}

pub async fn play(
    term: &mut Terminal,
    app: &AppServices,
    csv: &Path,
    difficulty: Option<Difficulty>,
) -> AppResult {
    let toolkit = app.toolkit();
    let dataset = match toolkit.load_file(read_upload(csv).await?).await {
        Ok(ToolkitOutcome::Applied(dataset)) => dataset,
        Ok(ToolkitOutcome::Stale) => return Ok(()),
        Err(err) => {
            term.say(&format!(
                "Game data missing: {err}. Upload a CSV with at least 4 words."
            ))
            .await?;
            return Ok(());
        }
    };

    let mut game = app.meaning_match_game(dataset)?;
    let mut preset = difficulty;
    loop {
        match game.phase() {
            GamePhase::ChoosingDifficulty => {
                let chosen = match preset.take() {
                    Some(difficulty) => Some(difficulty),
                    None => choose_difficulty(term).await?,
                };
                let Some(difficulty) = chosen else {
                    return Ok(());
                };
                game.start(difficulty).await?;
                term.say(&format!(
                    "Level 1 ({difficulty}). High score: {}",
                    game.high_score()
                ))
                .await?;
            }
            GamePhase::Playing => {
                if let Some(session) = game.session() {
                    if matches!(session.state(), QuizState::InProgress { .. }) {
                        if let (Some(index), Some(question)) =
                            (session.current_index(), session.current_question())
                        {
                            let text = render_question(index + 1, session.questions().len(), question);
                            term.say(&format!("Level {}  Score {}{text}", game.level(), game.score()))
                                .await?;
                        }
                    }
                }

                match play_turn(term, &mut game).await? {
                    Turn::Quit => break,
                    Turn::Restart => {
                        game.restart();
                        continue;
                    }
                    Turn::Answered(None) => continue,
                    Turn::Answered(Some(round)) => {
                        let mut line = render_feedback(round.answer.feedback, &round.answer.correct_answer);
                        if round.points > 0 {
                            line.push_str(&format!(" +{} points", round.points));
                        }
                        if round.new_high_score {
                            line.push_str(" New high score!");
                        }
                        term.say(&line).await?;
                    }
                }

                if let GameStep::LevelComplete(outcome) = game.next().await? {
                    if outcome.passed {
                        term.say(&format!(
                            "Level {} complete! You're advancing to Level {}.",
                            outcome.level,
                            outcome.level + 1
                        ))
                        .await?;
                    } else {
                        term.say(&format!(
                            "Level {}: {}/{} correct. You need all {} to advance. Let's try again!",
                            outcome.level, outcome.correct, outcome.total, outcome.total
                        ))
                        .await?;
                    }
                }
            }
            GamePhase::LevelComplete(_) => {
                let Some(input) = term.ask("Press Enter to continue, q to quit: ").await? else {
                    break;
                };
                if input == "q" {
                    break;
                }
                game.continue_after_level()?;
            }
        }
    }

    term.say(&format!(
        "Final score: {}   High score: {}",
        game.score(),
        game.high_score()
    ))
    .await?;
    Ok(())
}

//
// ─── CHAT & PRONUNCIATION ──────────────────────────────────────────────────────
//

pub async fn chat(term: &mut Terminal, app: &AppServices, language: Language) -> AppResult {
    let chat = app.chat();
    chat.set_language(language);
    if let Some(welcome) = chat.messages().first() {
        term.say(&format!("bot> {}", welcome.text)).await?;
    }
    term.say("(/lang en|hi switches language, /quit leaves)").await?;

    while let Some(input) = term.ask("you> ").await? {
        if input == "/quit" {
            break;
        }
        if let Some(code) = input.strip_prefix("/lang") {
            match code.trim().parse::<Language>() {
                Ok(language) => {
                    chat.set_language(language);
                    if let Some(welcome) = chat.messages().first() {
                        term.say(&format!("bot> {}", welcome.text)).await?;
                    }
                }
                Err(err) => term.say(&err).await?,
            }
            continue;
        }

        match chat.send(&input).await {
            SendOutcome::Replied(message) | SendOutcome::Failed(message) => {
                term.say(&format!("bot> {}", message.text)).await?;
                if let (true, Some(word)) = (message.is_definition, &message.word) {
                    term.say(&format!("     (try `pronounce {word}`)")).await?;
                }
            }
            SendOutcome::Ignored | SendOutcome::Stale => {}
        }
    }
    Ok(())
}

pub async fn pronounce(
    term: &mut Terminal,
    app: &AppServices,
    word: &str,
    out: Option<PathBuf>,
) -> AppResult {
    let audio = match app.pronounce(word).await {
        Ok(audio) => audio,
        Err(err) => {
            tracing::warn!(%word, error = %err, "pronunciation failed");
            term.say(&format!("Could not pronounce \"{word}\": {err}")).await?;
            return Ok(());
        }
    };
    let path = out.unwrap_or_else(|| {
        let stem: String = word
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        PathBuf::from(format!("{stem}.{}", audio.format.extension()))
    });
    tokio::fs::write(&path, &audio.bytes).await?;
    term.say(&format!("Saved pronunciation to {}", path.display()))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        ["candid", "terse", "vivid", "ornate"]
            .iter()
            .map(|w| (*w).to_owned())
            .collect()
    }

    #[test]
    fn choices_resolve_by_number_or_word() {
        let options = options();
        assert_eq!(resolve_choice("2", &options), Some("terse"));
        assert_eq!(resolve_choice(" Vivid ", &options), Some("vivid"));
        assert_eq!(resolve_choice("0", &options), None);
        assert_eq!(resolve_choice("5", &options), None);
        assert_eq!(resolve_choice("lucid", &options), None);
    }

    #[test]
    fn feedback_names_the_answer() {
        assert_eq!(render_feedback(Feedback::Correct, "candid"), "Correct!");
        assert!(render_feedback(Feedback::Incorrect, "candid").contains("\"candid\""));
    }
}
