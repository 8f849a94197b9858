//! Session flow tests against a scripted generator.
//!
//! These cover the turn cycle end to end without any network access:
//! opening, advancing, invalid selections, failed generations and endings.

use adventure_core::testing::sample_turn;
use adventure_core::{
    Progress, ScriptedGenerator, Session, SessionError, Setting, StateChanges, CHOICES_PER_TURN,
};
use std::collections::BTreeMap;

fn opening() -> adventure_core::Turn {
    sample_turn("gate").with_changes(StateChanges {
        setting: Some(Setting {
            theme: "Ancient cursed temple".into(),
            conflict: "A powerful artifact is causing monsters to appear".into(),
            player_name: "Adventurer".into(),
            player_background: "A brave explorer seeking fortune and glory".into(),
            possible_solutions: vec!["Destroy the artifact".into()],
            failure_cases: vec!["Overwhelmed by monsters".into()],
        }),
        items_gained: vec!["torch".into(), "rope".into(), "dagger".into()],
        new_location: Some("Temple Entrance".into()),
        location_description: Some("A massive stone doorway covered in ancient runes.".into()),
        ..Default::default()
    })
}

async fn started(generator: ScriptedGenerator) -> Session<ScriptedGenerator> {
    let mut session = Session::new(generator);
    session.start().await.expect("opening turn");
    session
}

#[tokio::test]
async fn test_start_returns_four_choices_and_empty_history() {
    let mut session = Session::new(ScriptedGenerator::new().then(opening()));

    let progress = session.start().await.unwrap();

    let Progress::Continue(step) = progress else {
        panic!("expected a continuing turn");
    };
    assert_eq!(step.turn.choices.len(), CHOICES_PER_TURN);
    assert!(session.state().history().is_empty());
    assert_eq!(step.applied.gained.len(), 3);
    assert_eq!(step.applied.moved_to.as_deref(), Some("Temple Entrance"));
    assert_eq!(session.state().setting().unwrap().player_name, "Adventurer");
}

#[tokio::test]
async fn test_advance_grows_history_by_one() {
    let generator = ScriptedGenerator::new()
        .then(opening())
        .then(sample_turn("hall"))
        .then(sample_turn("crypt"));
    let mut session = started(generator).await;

    session.advance(0).await.unwrap();
    assert_eq!(session.state().history().len(), 1);

    let progress = session.advance(2).await.unwrap();
    assert_eq!(session.state().history().len(), 2);
    assert_eq!(progress.turn().unwrap().choices.len(), CHOICES_PER_TURN);
    assert_eq!(session.state().history()[1].action, "hall choice 3");
}

#[tokio::test]
async fn test_out_of_range_selection_reprompts() {
    let generator = ScriptedGenerator::new().then(opening()).then(sample_turn("hall"));
    let mut session = started(generator).await;
    let before = session.state().clone();
    let calls = session.generator().calls();

    for index in [4, 5, usize::MAX] {
        let progress = session.advance(index).await.unwrap();
        assert!(matches!(progress, Progress::Reprompt { index: i } if i == index));
    }

    assert_eq!(session.state(), &before);
    assert_eq!(session.generator().calls(), calls);
    assert_eq!(session.current_turn().unwrap().choice(0), Some("gate choice 1"));
}

#[tokio::test]
async fn test_failed_generation_leaves_state_untouched() {
    let mut characters = BTreeMap::new();
    characters.insert("Old Sage".to_string(), "wary".to_string());
    let generator = ScriptedGenerator::new()
        .then(opening())
        .then_fail("expected 4 choices, got 3")
        .then(sample_turn("library").with_changes(StateChanges {
            items_gained: vec!["map".into()],
            characters,
            ..Default::default()
        }));
    let mut session = started(generator).await;
    let before = session.state().clone();

    let err = session.advance(1).await.unwrap_err();
    assert!(matches!(err, SessionError::Generation(_)));
    assert!(err.is_retryable());
    assert_eq!(session.state(), &before);
    assert_eq!(session.current_turn().unwrap().choice(1), Some("gate choice 2"));

    // Retrying the same choice succeeds and applies the whole turn.
    session.advance(1).await.unwrap();
    assert_eq!(session.state().history().len(), 1);
    assert!(session.state().has_item("map"));
    assert_eq!(session.state().characters()["Old Sage"], "wary");
}

#[tokio::test]
async fn test_failed_opening_can_be_retried() {
    let generator = ScriptedGenerator::new().then_fail("no JSON object in reply").then(opening());
    let mut session = Session::new(generator);

    assert!(session.start().await.is_err());
    assert!(session.current_turn().is_none());
    assert!(session.state().inventory().is_empty());

    session.start().await.unwrap();
    assert_eq!(session.state().inventory().len(), 3);
}

#[tokio::test]
async fn test_terminal_turn_completes_session() {
    let generator = ScriptedGenerator::new()
        .then(opening())
        .then(sample_turn("ending").terminal());
    let mut session = started(generator).await;

    let progress = session.advance(3).await.unwrap();

    assert!(progress.is_complete());
    assert!(session.is_finished());
    assert_eq!(session.state().history().len(), 1);
    assert!(matches!(session.advance(0).await, Err(SessionError::Finished)));
    assert_eq!(session.generator().calls(), 2);
}

#[tokio::test]
async fn test_prompts_carry_state_and_action() {
    let generator = ScriptedGenerator::new()
        .then(opening())
        .then(sample_turn("hall"));
    let mut session = started(generator).await;
    session.advance(0).await.unwrap();

    let prompts = session.generator().prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].user.contains("new adventure"));
    assert!(prompts[1].user.contains("Temple Entrance"));
    assert!(prompts[1].user.contains("- dagger"));
    assert!(prompts[1].user.contains("\"gate choice 1\""));
}

#[tokio::test]
async fn test_history_is_non_decreasing_over_a_run() {
    let mut generator = ScriptedGenerator::new().then(opening());
    for i in 0..6 {
        generator = generator.then(sample_turn(&format!("room {i}")));
        if i % 2 == 0 {
            generator = generator.then_fail("timeout");
        }
    }
    let mut session = started(generator).await;

    let mut last = 0;
    for round in 0..12 {
        let _ = session.advance(round % 6).await;
        let len = session.state().history().len();
        assert!(len == last || len == last + 1);
        last = len;
    }
}
