use std::sync::Mutex;

use async_trait::async_trait;
use shared::{domain::LookupId, error::ApiError};

use super::*;

#[derive(Default)]
struct RecordingSource {
    queries: Mutex<Vec<String>>,
}

impl RecordingSource {
    fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("queries").clone()
    }
}

#[async_trait]
impl LookupSource for RecordingSource {
    async fn search(&self, query: &str) -> Result<Vec<LookupItem>, ClientError> {
        self.queries.lock().expect("queries").push(query.to_string());
        if query.starts_with("slow") {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        if query == "boom" {
            return Err(ApiError::new(500, "Internal Server Error", "").into());
        }
        Ok(vec![LookupItem {
            id: LookupId(1),
            name: format!("{query} match"),
        }])
    }
}

fn autocomplete() -> (Arc<RecordingSource>, Autocomplete) {
    let source = Arc::new(RecordingSource::default());
    let autocomplete = Autocomplete::new(source.clone(), DEFAULT_LOOKUP_DEBOUNCE);
    (source, autocomplete)
}

#[tokio::test(start_paused = true)]
async fn typing_burst_issues_one_lookup() {
    let (source, mut autocomplete) = autocomplete();

    for value in ["E", "En", "Eng"] {
        autocomplete.set_input(value);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(source.queries().is_empty(), "fired inside the debounce window");

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(source.queries(), vec!["Eng".to_string()]);

    let suggestions = autocomplete.suggestions();
    assert_eq!(suggestions.query, "Eng");
    assert_eq!(suggestions.items[0].name, "Eng match");
    assert!(suggestions.open);
    assert!(!suggestions.loading);
}

#[tokio::test(start_paused = true)]
async fn clearing_input_closes_without_request() {
    let (source, mut autocomplete) = autocomplete();
    autocomplete.set_input("Fin");
    autocomplete.settle().await;
    assert!(autocomplete.suggestions().open);

    autocomplete.set_input("");
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(source.queries(), vec!["Fin".to_string()]);
    assert_eq!(autocomplete.suggestions(), Suggestions::default());
}

#[tokio::test(start_paused = true)]
async fn failed_lookup_publishes_empty_list() {
    let (_source, mut autocomplete) = autocomplete();

    autocomplete.set_input("boom");
    autocomplete.settle().await;

    let suggestions = autocomplete.suggestions();
    assert!(suggestions.items.is_empty());
    assert!(!suggestions.open);
    assert!(!suggestions.loading);
}

#[tokio::test(start_paused = true)]
async fn superseded_lookup_never_publishes() {
    let (source, mut autocomplete) = autocomplete();
    let mut updates = autocomplete.subscribe();

    autocomplete.set_input("slow query");
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(autocomplete.suggestions().loading, "slow lookup is in flight");

    autocomplete.set_input("Ops");
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(
        source.queries(),
        vec!["slow query".to_string(), "Ops".to_string()]
    );
    let suggestions = updates.borrow_and_update().clone();
    assert_eq!(suggestions.query, "Ops");
    assert_eq!(suggestions.items.len(), 1);
    assert_eq!(suggestions.items[0].name, "Ops match");
}

#[tokio::test(start_paused = true)]
async fn selecting_closes_the_list() {
    let (_source, mut autocomplete) = autocomplete();
    autocomplete.set_input("Ber");
    autocomplete.settle().await;

    let item = autocomplete.suggestions().items[0].clone();
    autocomplete.select(&item);

    assert_eq!(autocomplete.input(), "Ber match");
    assert!(!autocomplete.suggestions().open);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn clearing_wins_over_a_racing_lookup() {
    let source = Arc::new(RecordingSource::default());
    let mut autocomplete = Autocomplete::new(source, Duration::ZERO);

    for round in 0..200u32 {
        autocomplete.set_input(format!("Eng {round}"));
        for _ in 0..(round * 37 % 500) {
            std::hint::spin_loop();
        }
        autocomplete.set_input("");
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(
            autocomplete.suggestions(),
            Suggestions::default(),
            "round {round}"
        );
    }
}
