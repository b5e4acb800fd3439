use std::sync::Arc;
use std::time::Duration;

use potmemo::aggregator::{Aggregator, AggregatorSettings, Phase};
use potmemo::error::NotepadError;
use potmemo::mock::{MockCall, MockNotepadApi};
use potmemo::model::NotepadStatus;
use tokio::time::sleep;

const QUIET: Duration = Duration::from_secs(20);

fn setup(content: &str) -> (Arc<MockNotepadApi>, Aggregator) {
    let api = Arc::new(
        MockNotepadApi::new()
            .with_notepad("n0", "TOEFL", "")
            .with_notepad("n1", "GRE", content),
    );
    let agg = Aggregator::new(
        api.clone(),
        AggregatorSettings {
            quiet_period: QUIET,
            ..Default::default()
        },
    );
    (api, agg)
}

#[tokio::test(start_paused = true)]
async fn test_burst_is_flushed_once_in_order() {
    let (api, agg) = setup("zebra");

    for word in ["apple", "banana", "cherry"] {
        agg.add_word("tok", "GRE", word).await.unwrap();
        sleep(Duration::from_secs(1)).await;
    }
    assert!(api.updates().is_empty());

    sleep(QUIET).await;

    let updates = api.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].content, "zebra\napple\nbanana\ncherry");
    assert_eq!(api.content_of("n1").as_deref(), Some("zebra\napple\nbanana\ncherry"));
    assert_eq!(api.list_count(), 1);
    assert_eq!(api.get_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_apple_banana_scenario() {
    let (api, agg) = setup("");

    agg.add_word("tok", "GRE", "apple").await.unwrap();
    assert_eq!(api.list_count(), 1);
    assert_eq!(api.get_count(), 1);
    assert!(agg.snapshot().await.timer_armed);

    sleep(Duration::from_millis(500)).await;
    let err = agg.add_word("tok", "GRE", "Apple").await.unwrap_err();
    assert!(matches!(err, NotepadError::DuplicateWord(ref w) if w == "Apple"));
    assert_eq!(agg.snapshot().await.content.as_deref(), Some("apple"));

    sleep(Duration::from_millis(500)).await;
    agg.add_word("tok", "GRE", "banana").await.unwrap();

    sleep(QUIET + Duration::from_secs(1)).await;

    let updates = api.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].content, "apple\nbanana");
    let snap = agg.snapshot().await;
    assert_eq!(snap.phase, Phase::Empty);
    assert!(!snap.timer_armed);
}

#[tokio::test(start_paused = true)]
async fn test_each_addition_resets_the_quiet_period() {
    let (api, agg) = setup("");

    agg.add_word("tok", "GRE", "one").await.unwrap();
    sleep(Duration::from_secs(15)).await;
    agg.add_word("tok", "GRE", "two").await.unwrap();

    // 25s after the first word, 10s after the last one.
    sleep(Duration::from_secs(10)).await;
    assert!(api.updates().is_empty());

    // Just past lastAddTime + delay.
    sleep(Duration::from_secs(11)).await;
    assert_eq!(api.updates().len(), 1);
    assert_eq!(api.updates()[0].content, "one\ntwo");
}

#[tokio::test(start_paused = true)]
async fn test_failed_flush_keeps_cache_without_refetch() {
    let (api, agg) = setup("zebra");
    api.fail_updates(Some(500));

    agg.add_word("tok", "GRE", "apple").await.unwrap();
    sleep(QUIET + Duration::from_secs(1)).await;

    assert_eq!(api.updates().len(), 1);
    let snap = agg.snapshot().await;
    assert_eq!(snap.phase, Phase::Accumulating);
    assert_eq!(snap.content.as_deref(), Some("zebra\napple"));
    assert_eq!(snap.pending, 1);
    assert!(!snap.timer_armed);

    // No automatic retry.
    sleep(QUIET * 3).await;
    assert_eq!(api.updates().len(), 1);

    api.fail_updates(None);
    api.clear_calls();
    agg.add_word("tok", "GRE", "banana").await.unwrap();
    assert_eq!(api.list_count(), 0);
    assert_eq!(api.get_count(), 0);

    sleep(QUIET + Duration::from_secs(1)).await;
    let updates = api.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].content, "zebra\napple\nbanana");
    assert_eq!(agg.snapshot().await.phase, Phase::Empty);
}

#[tokio::test(start_paused = true)]
async fn test_new_cycle_refetches_after_successful_flush() {
    let (api, agg) = setup("");

    agg.add_word("tok", "GRE", "apple").await.unwrap();
    sleep(QUIET + Duration::from_secs(1)).await;
    agg.add_word("tok", "GRE", "banana").await.unwrap();
    sleep(QUIET + Duration::from_secs(1)).await;

    assert_eq!(api.list_count(), 2);
    assert_eq!(api.get_count(), 2);
    let updates = api.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[1].content, "apple\nbanana");
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_against_remote_content_any_case() {
    let (api, agg) = setup("Ephemeral\nlucid");

    agg.add_word("tok", "GRE", "candid").await.unwrap();
    let err = agg.add_word("tok", "GRE", "EPHEMERAL").await.unwrap_err();
    assert!(matches!(err, NotepadError::DuplicateWord(_)));
    assert_eq!(
        agg.snapshot().await.content.as_deref(),
        Some("Ephemeral\nlucid\ncandid")
    );

    sleep(QUIET + Duration::from_secs(1)).await;
    assert_eq!(api.updates()[0].content, "Ephemeral\nlucid\ncandid");
}

#[tokio::test(start_paused = true)]
async fn test_update_passes_other_fields_through() {
    let (api, agg) = setup("");

    agg.add_word("tok", "GRE", "apple").await.unwrap();
    sleep(QUIET + Duration::from_secs(1)).await;

    let calls = api.calls();
    let update = calls
        .iter()
        .find_map(|c| match c {
            MockCall::Update(id, update) => Some((id.clone(), update.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(update.0, "n1");
    assert_eq!(update.1.title, "GRE");
    assert_eq!(update.1.brief.as_deref(), Some("GRE brief"));
    assert_eq!(update.1.tags, Some(vec!["collected".to_string()]));
    assert_eq!(update.1.status, NotepadStatus::Published);
}

#[tokio::test(start_paused = true)]
async fn test_notepad_not_found_beyond_first_page() {
    let mut mock = MockNotepadApi::new();
    for i in 0..5 {
        mock = mock.with_notepad(&format!("n{}", i), &format!("list {}", i), "");
    }
    let api = Arc::new(mock.with_notepad("n5", "GRE", ""));
    let agg = Aggregator::new(api.clone(), AggregatorSettings::default());

    let err = agg.add_word("tok", "GRE", "apple").await.unwrap_err();
    assert!(matches!(err, NotepadError::NotepadNotFound(ref t) if t == "GRE"));
    assert_eq!(api.calls(), vec![MockCall::List { limit: 5 }]);
    assert_eq!(agg.snapshot().await.phase, Phase::Empty);
}

#[tokio::test(start_paused = true)]
async fn test_title_match_is_case_sensitive() {
    let (_api, agg) = setup("");
    let err = agg.add_word("tok", "gre", "apple").await.unwrap_err();
    assert!(matches!(err, NotepadError::NotepadNotFound(_)));
}
