use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use services::api::{AudioFormat, ChatReply, ChatRequest, NlpRecord};
use services::{
    ApiError, AppServices, Backend, CsvUpload, DailyChallengeStatus, GamePhase, NlpAction,
    SendOutcome, ToolkitOutcome,
};
use storage::repository::Storage;
use vocab_core::Clock;
use vocab_core::model::{Difficulty, RawWordRow};
use vocab_core::time::fixed_now;

/// Backend double returning canned data.
struct CannedBackend;

#[async_trait]
impl Backend for CannedBackend {
    async fn load_game_data(&self, _: &CsvUpload) -> Result<Vec<RawWordRow>, ApiError> {
        Ok(["candid", "terse", "vivid", "ornate", "lucid"]
            .into_iter()
            .map(|word| RawWordRow {
                word: Some(word.to_owned()),
                meaning: Some(format!("meaning of {word}")),
            })
            .collect())
    }

    async fn process_nlp(
        &self,
        _: &CsvUpload,
        action: NlpAction,
    ) -> Result<Vec<NlpRecord>, ApiError> {
        Ok(vec![NlpRecord {
            original: "Running fast".to_owned(),
            processed: serde_json::json!([action.name(), "run", "fast"]),
        }])
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        Ok(ChatReply {
            reply: format!("You said {}", request.message),
            ..ChatReply::default()
        })
    }

    async fn synthesize(&self, _: &str) -> Result<String, ApiError> {
        Ok(STANDARD.encode([0u8, 0, 1, 0]))
    }
}

async fn services() -> AppServices {
    AppServices::from_parts(
        Storage::in_memory(),
        Clock::fixed(fixed_now()),
        Arc::new(CannedBackend),
    )
    .await
}

#[tokio::test]
async fn toolkit_file_feeds_the_game() {
    let app = services().await;
    let toolkit = app.toolkit();
    let ToolkitOutcome::Applied(dataset) = toolkit
        .load_file(CsvUpload::new("words.csv", b"word,meaning".to_vec()))
        .await
        .unwrap()
    else {
        panic!("file load was not applied");
    };
    assert_eq!(dataset.len(), 5);

    let ToolkitOutcome::Applied(analysis) = toolkit.analyze(NlpAction::Stemming).await.unwrap()
    else {
        panic!("analysis was not applied");
    };
    assert_eq!(analysis.records[0].original, "Running fast");

    let mut game = app.meaning_match_game(dataset).unwrap();
    assert_eq!(game.phase(), GamePhase::ChoosingDifficulty);
    game.start(Difficulty::Easy).await.unwrap();
    assert_eq!(game.phase(), GamePhase::Playing);
    let answer = game.current_question().unwrap().answer().to_owned();
    let round = game.answer(&answer).await.unwrap().unwrap();
    assert!(round.points > 0);
    assert_eq!(app.high_scores().get(Difficulty::Easy).await, round.score);
}

#[tokio::test]
async fn daily_challenge_runs_once() {
    let app = services().await;
    let daily = app.daily_challenge();
    let mut session = daily.start().await.unwrap();
    while !session.is_complete() {
        let answer = session.current_question().unwrap().answer().to_owned();
        daily.answer(&mut session, &answer).await.unwrap();
        daily.advance(&mut session).await.unwrap();
    }
    assert!(matches!(
        daily.status().await,
        DailyChallengeStatus::AlreadyCompleted { .. }
    ));
    assert_eq!(app.dashboard().summary().await.quizzes_completed, 1);
}

#[tokio::test]
async fn chat_and_pronunciation_use_the_backend() {
    let app = services().await;
    let outcome = app.chat().send("hello").await;
    assert!(matches!(outcome, SendOutcome::Replied(m) if m.text == "You said hello"));

    let audio = app.pronounce("candid").await.unwrap();
    assert_eq!(audio.format, AudioFormat::Wav);
    assert_eq!(audio.bytes.len(), 44 + 4);
}
