//! The conflict decision table, exercised through the public API.

mod support;

use std::cell::Cell;

use keeper::errors::{KeeperError, Result};
use keeper::resolver::{
    decide, Action, ConflictView, LineChoiceProvider, NoPrompt, ResolutionStrategy,
};
use keeper::secrets::{BankCard, SecretRecord, SecretType, Text};
use support::record;

fn text(secs: i64) -> SecretRecord<Text> {
    record(
        "note",
        Text {
            content: format!("written at {secs}"),
        },
        secs,
    )
}

/// A provider that must never be consulted.
fn never(_: &ConflictView) -> Result<String> {
    panic!("the user should not have been asked");
}

fn answering(answer: &'static str) -> impl FnMut(&ConflictView) -> Result<String> {
    move |_| Ok(answer.to_string())
}

#[test]
fn server_wins_always_skips() {
    for remote in [None, Some(text(5)), Some(text(10)), Some(text(20))] {
        let action = decide(&text(10), remote.as_ref(), ResolutionStrategy::Server, &mut never);
        assert!(action.is_skip());
    }
}

#[test]
fn client_wins_always_pushes_local() {
    for remote in [None, Some(text(5)), Some(text(10)), Some(text(20))] {
        let local = text(10);
        match decide(&local, remote.as_ref(), ResolutionStrategy::Client, &mut never) {
            Action::Push(pushed) => assert_eq!(pushed, local),
            other => panic!("expected push, got {other:?}"),
        }
    }
}

#[test]
fn interactive_pushes_without_prompt_when_remote_absent() {
    let action = decide(
        &text(10),
        None::<&SecretRecord<Text>>,
        ResolutionStrategy::Interactive,
        &mut never,
    );
    assert!(action.is_push());
}

#[test]
fn interactive_skips_when_remote_is_newer() {
    let action = decide(
        &text(5),
        Some(&text(10)),
        ResolutionStrategy::Interactive,
        &mut never,
    );
    assert!(action.is_skip());
}

#[test]
fn interactive_tie_favours_remote() {
    let action = decide(
        &text(10),
        Some(&text(10)),
        ResolutionStrategy::Interactive,
        &mut never,
    );
    assert!(action.is_skip());
}

#[test]
fn interactive_conflict_follows_the_answer() {
    let local = text(10);
    let remote = text(5);

    let action = decide(
        &local,
        Some(&remote),
        ResolutionStrategy::Interactive,
        &mut answering("client"),
    );
    assert!(matches!(action, Action::Push(ref r) if *r == local));

    let action = decide(
        &local,
        Some(&remote),
        ResolutionStrategy::Interactive,
        &mut answering("server"),
    );
    assert!(action.is_skip());
}

#[test]
fn empty_answer_defaults_to_server() {
    let action = decide(
        &text(10),
        Some(&text(5)),
        ResolutionStrategy::Interactive,
        &mut answering("\n"),
    );
    assert!(action.is_skip());
}

#[test]
fn invalid_answer_is_a_hard_error() {
    let asked = Cell::new(0);
    let mut provider = |_: &ConflictView| -> Result<String> {
        asked.set(asked.get() + 1);
        Ok("maybe".to_string())
    };

    let action = decide(
        &text(10),
        Some(&text(5)),
        ResolutionStrategy::Interactive,
        &mut provider,
    );

    assert!(matches!(
        action,
        Action::AskFailed(KeeperError::InvalidChoice(ref s)) if s == "maybe"
    ));
    assert_eq!(asked.get(), 1, "invalid input must not re-prompt");
}

#[test]
fn provider_failure_becomes_ask_failed() {
    let action = decide(
        &text(10),
        Some(&text(5)),
        ResolutionStrategy::Interactive,
        &mut NoPrompt,
    );
    assert!(matches!(action, Action::AskFailed(KeeperError::InvalidChoice(_))));
}

#[test]
fn line_provider_reads_piped_answers() {
    let mut provider = LineChoiceProvider::new(std::io::Cursor::new("client\nbogus\n"));

    let first = decide(
        &text(10),
        Some(&text(5)),
        ResolutionStrategy::Interactive,
        &mut provider,
    );
    assert!(first.is_push());

    let second = decide(
        &text(10),
        Some(&text(5)),
        ResolutionStrategy::Interactive,
        &mut provider,
    );
    assert!(matches!(second, Action::AskFailed(KeeperError::InvalidChoice(_))));
}

#[test]
fn conflict_view_shows_masked_fields() {
    let card = |cvv: &str, secs| {
        record(
            "card1",
            BankCard {
                number: "4111111111111111".into(),
                card_holder: "ALICE".into(),
                expiry: "12/27".into(),
                cvv: cvv.into(),
            },
            secs,
        )
    };

    let mut seen = None;
    let mut provider = |view: &ConflictView| -> Result<String> {
        seen = Some(view.clone());
        Ok("server".into())
    };
    decide(
        &card("123", 10),
        Some(&card("999", 5)),
        ResolutionStrategy::Interactive,
        &mut provider,
    );

    let view = seen.expect("conflict should have been shown");
    assert_eq!(view.secret_type, SecretType::BankCard);
    assert_eq!(view.secret_name, "card1");
    assert!(view.local.updated_at > view.remote.updated_at);
    let rendered = format!("{:?}{:?}", view.local.fields, view.remote.fields);
    assert!(!rendered.contains("4111111111111111"));
    assert!(!rendered.contains("123"));
    assert!(!rendered.contains("999"));
    assert!(rendered.contains("1111"));
}

#[test]
fn strategy_names_parse() {
    assert_eq!(
        "interactive".parse::<ResolutionStrategy>().unwrap(),
        ResolutionStrategy::Interactive
    );
    assert!(matches!(
        "latest".parse::<ResolutionStrategy>(),
        Err(KeeperError::UnknownStrategy(_))
    ));
}
