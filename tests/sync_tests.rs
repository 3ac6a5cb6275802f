//! Reconciler behaviour against an in-memory remote store.

mod support;

use std::cell::Cell;

use keeper::cache::SecretCache;
use keeper::errors::{KeeperError, Result};
use keeper::resolver::{ConflictView, NoPrompt, ResolutionStrategy};
use keeper::secrets::{BankCard, SecretRecord, SecretType, Text};
use keeper::sync::{CancelToken, Reconciler};
use keeper::transport::wire;
use pretty_assertions::assert_eq;
use support::{credential, owner_key, record, recipient_key, FakeRemote, OWNER};

fn card1() -> BankCard {
    BankCard {
        number: "4111111111111111".into(),
        card_holder: "ALICE EXAMPLE".into(),
        expiry: "12/27".into(),
        cvv: "123".into(),
    }
}

fn note(content: &str) -> Text {
    Text {
        content: content.into(),
    }
}

/// Seed the cache with a record at a fixed timestamp.
fn seed<P: keeper::secrets::SecretPayload>(cache: &SecretCache, rec: &SecretRecord<P>) {
    // merge_remote keeps the given timestamp, unlike upsert.
    assert!(cache.merge_remote(rec).unwrap());
}

#[test]
fn client_wins_pushes_card_exactly_once() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    let local = record("card1", card1(), 100);
    seed(&cache, &local);

    let remote = FakeRemote::new();
    let (cred, recipient, owner) = (credential(), recipient_key(), owner_key());
    let reconciler = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .with_strategy(ResolutionStrategy::Client);

    let report = reconciler.run::<BankCard>(&mut NoPrompt).unwrap();

    assert_eq!(report.pushed, vec!["card1".to_string()]);
    assert!(report.skipped.is_empty());
    let saves = remote.saves();
    assert_eq!(saves.len(), 1);

    // The server only ever sees the envelope; it opens back to the card.
    let sealed = &saves[0];
    assert_eq!(sealed.secret_type, SecretType::BankCard);
    assert_eq!(sealed.secret_owner, OWNER);
    let json = serde_json::to_string(sealed).unwrap();
    assert!(!json.contains("4111111111111111"));
    assert_eq!(wire::open::<BankCard>(sealed, &owner).unwrap(), local);
}

#[test]
fn server_wins_never_saves() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    seed(&cache, &record("a", note("local a"), 100));
    seed(&cache, &record("b", note("local b"), 100));

    let remote = FakeRemote::new();
    let recipient = recipient_key();
    remote.insert(&record("a", note("remote a"), 50), &recipient);

    let (cred, owner) = (credential(), owner_key());
    let reconciler = Reconciler::new(&cache, &remote, &cred, &recipient, &owner);
    assert_eq!(reconciler.strategy(), ResolutionStrategy::Server);

    let report = reconciler.run::<Text>(&mut NoPrompt).unwrap();

    assert!(remote.saves().is_empty());
    assert_eq!(report.skipped, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(remote.gets(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn interactive_pushes_only_what_needs_it() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    seed(&cache, &record("new-only-local", note("n"), 100));
    seed(&cache, &record("remote-newer", note("old local"), 100));
    seed(&cache, &record("tie", note("tie local"), 100));

    let remote = FakeRemote::new();
    let recipient = recipient_key();
    remote.insert(&record("remote-newer", note("fresh remote"), 200), &recipient);
    remote.insert(&record("tie", note("tie remote"), 100), &recipient);

    let (cred, owner) = (credential(), owner_key());
    let reconciler = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .with_strategy(ResolutionStrategy::Interactive);

    let mut never = |_: &ConflictView| -> Result<String> { panic!("no prompt expected") };
    let report = reconciler.run::<Text>(&mut never).unwrap();

    assert_eq!(remote.saved_names(), vec!["new-only-local".to_string()]);
    assert_eq!(
        report.skipped,
        vec!["remote-newer".to_string(), "tie".to_string()]
    );
}

#[test]
fn unresolved_conflict_halts_the_run() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    for name in ["s1", "s2", "s3"] {
        seed(&cache, &record(name, note(name), 100));
    }

    // s1 is absent remotely (pushed without asking); s2 and s3 conflict.
    let remote = FakeRemote::new();
    let recipient = recipient_key();
    remote.insert(&record("s2", note("old"), 10), &recipient);
    remote.insert(&record("s3", note("old"), 10), &recipient);

    let (cred, owner) = (credential(), owner_key());
    let reconciler = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .with_strategy(ResolutionStrategy::Interactive);

    let asked = Cell::new(Vec::<String>::new());
    let mut provider = |view: &ConflictView| -> Result<String> {
        let mut names = asked.take();
        names.push(view.secret_name.clone());
        asked.set(names);
        Ok("maybe".into())
    };

    let err = reconciler.run::<Text>(&mut provider).unwrap_err();

    assert!(matches!(err, KeeperError::InvalidChoice(ref s) if s == "maybe"));
    assert_eq!(asked.take(), vec!["s2".to_string()]);
    assert_eq!(remote.saved_names(), vec!["s1".to_string()]);
    assert_eq!(remote.gets(), vec!["s1".to_string(), "s2".to_string()]);
}

#[test]
fn transport_errors_surface_unchanged() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    seed(&cache, &record("card1", card1(), 100));

    let remote = FakeRemote::rejecting();
    let (cred, recipient, owner) = (credential(), recipient_key(), owner_key());
    let reconciler = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .with_strategy(ResolutionStrategy::Client);

    assert!(matches!(
        reconciler.run::<BankCard>(&mut NoPrompt),
        Err(KeeperError::Unauthorized)
    ));
}

#[test]
fn cancelled_run_keeps_nothing_half_done() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    seed(&cache, &record("a", note("a"), 100));
    seed(&cache, &record("b", note("b"), 100));

    let remote = FakeRemote::new();
    let (cred, recipient, owner) = (credential(), recipient_key(), owner_key());
    let cancel = CancelToken::new();
    cancel.cancel();
    let reconciler = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .with_strategy(ResolutionStrategy::Client)
        .with_cancel(cancel);

    assert!(matches!(
        reconciler.run::<Text>(&mut NoPrompt),
        Err(KeeperError::Cancelled)
    ));
    assert!(remote.gets().is_empty());
    assert!(remote.saves().is_empty());
}

#[test]
fn cancelling_at_the_prompt_keeps_earlier_pushes() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    seed(&cache, &record("a", note("a"), 100));
    seed(&cache, &record("b", note("b"), 100));

    let remote = FakeRemote::new();
    let recipient = recipient_key();
    remote.insert(&record("b", note("old"), 10), &recipient);

    let (cred, owner) = (credential(), owner_key());
    let cancel = CancelToken::new();
    let reconciler = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .with_strategy(ResolutionStrategy::Interactive)
        .with_cancel(cancel.clone());

    // The user walks away: cancel fires while "b" is being shown.
    let mut provider = |_: &ConflictView| -> Result<String> {
        cancel.cancel();
        Ok("client".into())
    };

    assert!(matches!(
        reconciler.run::<Text>(&mut provider),
        Err(KeeperError::Cancelled)
    ));
    assert_eq!(remote.saved_names(), vec!["a".to_string()]);
}

#[test]
fn run_kind_dispatches_by_type() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    seed(&cache, &record("card1", card1(), 100));
    seed(&cache, &record("note", note("n"), 100));

    let remote = FakeRemote::new();
    let (cred, recipient, owner) = (credential(), recipient_key(), owner_key());
    let reconciler = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .with_strategy(ResolutionStrategy::Client);

    let mut pushed = Vec::new();
    for kind in SecretType::ALL {
        let report = reconciler.run_kind(kind, &mut NoPrompt).unwrap();
        assert_eq!(report.kind, kind);
        pushed.extend(report.pushed);
    }

    assert_eq!(pushed, vec!["card1".to_string(), "note".to_string()]);
    assert!(remote.stored(SecretType::BankCard, "card1").is_some());
    assert!(remote.stored(SecretType::Text, "note").is_some());
}

#[test]
fn resync_after_push_is_idempotent() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    seed(&cache, &record("note", note("n"), 100));

    let remote = FakeRemote::new();
    let (cred, recipient, owner) = (credential(), recipient_key(), owner_key());
    let reconciler = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .with_strategy(ResolutionStrategy::Interactive);

    reconciler.run::<Text>(&mut NoPrompt).unwrap();
    let second = reconciler.run::<Text>(&mut NoPrompt).unwrap();

    // The pushed copy carries the same timestamp, so the tie skips.
    assert!(second.pushed.is_empty());
    assert_eq!(remote.saves().len(), 1);
}

#[test]
fn pull_merges_only_newer_remote_versions() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    seed(&cache, &record("fresh-local", note("local wins"), 500));
    seed(&cache, &record("stale-local", note("stale"), 100));

    let remote = FakeRemote::new();
    let recipient = recipient_key();
    remote.insert(&record("fresh-local", note("old remote"), 200), &recipient);
    remote.insert(&record("stale-local", note("new remote"), 300), &recipient);
    remote.insert(&record("remote-only", note("only here"), 50), &recipient);

    let (cred, owner) = (credential(), owner_key());
    let reconciler = Reconciler::new(&cache, &remote, &cred, &recipient, &owner);
    let report = reconciler.pull::<Text>().unwrap();

    assert_eq!(
        report.merged,
        vec!["remote-only".to_string(), "stale-local".to_string()]
    );
    assert_eq!(report.unchanged, vec!["fresh-local".to_string()]);

    let get = |name: &str| cache.get::<Text>(name).unwrap().unwrap().payload;
    assert_eq!(get("fresh-local"), note("local wins"));
    assert_eq!(get("stale-local"), note("new remote"));
    assert_eq!(get("remote-only"), note("only here"));
}

#[test]
fn pull_ignores_other_owners() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    let remote = FakeRemote::new();
    let recipient = recipient_key();
    let mut foreign = record("theirs", note("x"), 10);
    foreign.owner = "mallory".into();
    remote.insert(&foreign, &recipient);

    let (cred, owner) = (credential(), owner_key());
    let report = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .pull_kind(SecretType::Text)
        .unwrap();

    assert!(report.merged.is_empty());
    assert_eq!(cache.count(SecretType::Text).unwrap(), 0);
}

#[test]
fn pull_with_wrong_key_fails_to_unwrap() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    let remote = FakeRemote::new();
    let recipient = recipient_key();
    remote.insert(&record("note", note("x"), 10), &recipient);

    let (cred, wrong) = (credential(), support::other_owner_key());
    let reconciler = Reconciler::new(&cache, &remote, &cred, &recipient, &wrong);

    assert!(matches!(reconciler.pull::<Text>(), Err(KeeperError::Unwrap)));
    assert_eq!(cache.count(SecretType::Text).unwrap(), 0);
}

/// A server copy sealed for someone else's key, as left behind by an
/// earlier key pair.
fn unreadable_remote(name: &str, secs: i64) -> FakeRemote {
    let remote = FakeRemote::new();
    let stale_key = support::other_owner_key().recipient();
    remote.insert(&record(name, note("sealed for an old key"), secs), &stale_key);
    remote
}

#[test]
fn client_wins_overwrites_a_copy_it_cannot_open() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    seed(&cache, &record("note", note("local"), 100));
    let remote = unreadable_remote("note", 10);

    let (cred, recipient, owner) = (credential(), recipient_key(), owner_key());
    let report = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .with_strategy(ResolutionStrategy::Client)
        .run::<Text>(&mut NoPrompt)
        .unwrap();

    assert_eq!(report.pushed, vec!["note".to_string()]);
    let stored = remote.stored(SecretType::Text, "note").unwrap();
    assert_eq!(wire::open::<Text>(&stored, &owner).unwrap().payload, note("local"));
}

#[test]
fn server_wins_skips_a_copy_it_cannot_open() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    seed(&cache, &record("note", note("local"), 100));
    let remote = unreadable_remote("note", 10);

    let (cred, recipient, owner) = (credential(), recipient_key(), owner_key());
    let report = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .run::<Text>(&mut NoPrompt)
        .unwrap();

    assert_eq!(report.skipped, vec!["note".to_string()]);
    assert!(remote.saves().is_empty());
}

#[test]
fn interactive_only_opens_the_copy_for_a_real_conflict() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    seed(&cache, &record("note", note("local"), 100));

    let (cred, recipient, owner) = (credential(), recipient_key(), owner_key());
    let mut never = |_: &ConflictView| -> Result<String> { panic!("no prompt expected") };

    // Remote newer: skipped on timestamps alone.
    let newer = unreadable_remote("note", 200);
    let report = Reconciler::new(&cache, &newer, &cred, &recipient, &owner)
        .with_strategy(ResolutionStrategy::Interactive)
        .run::<Text>(&mut never)
        .unwrap();
    assert_eq!(report.skipped, vec!["note".to_string()]);

    // Local newer: the conflict needs the remote fields, which cannot be opened.
    let older = unreadable_remote("note", 10);
    let result = Reconciler::new(&cache, &older, &cred, &recipient, &owner)
        .with_strategy(ResolutionStrategy::Interactive)
        .run::<Text>(&mut never);
    assert!(matches!(result, Err(KeeperError::Unwrap)));
    assert!(older.saves().is_empty());
}

#[test]
fn pull_skips_names_that_are_not_valid_paths() {
    let cache = SecretCache::open_in_memory(OWNER).unwrap();
    let remote = FakeRemote::new();
    let recipient = recipient_key();
    remote.insert(&record("a/b", note("x"), 10), &recipient);
    remote.insert(&record("..", note("x"), 10), &recipient);
    remote.insert(&record("fine", note("y"), 10), &recipient);

    let (cred, owner) = (credential(), owner_key());
    let report = Reconciler::new(&cache, &remote, &cred, &recipient, &owner)
        .pull::<Text>()
        .unwrap();

    assert_eq!(report.merged, vec!["fine".to_string()]);
    assert_eq!(cache.count(SecretType::Text).unwrap(), 1);
}
