use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use hn_search::fetcher::spawn_fetch;
use hn_search::{
    Completion, FetchError, Fetcher, Item, ResultPage, SearchController, Status,
};

/// Serves canned pages and records every call.
struct StubFetcher {
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, u32, u32)>>,
    pages: Mutex<Vec<Result<ResultPage, FetchError>>>,
    gate: Option<Arc<Notify>>,
}

impl StubFetcher {
    fn new(pages: Vec<Result<ResultPage, FetchError>>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            pages: Mutex::new(pages.into_iter().rev().collect()),
            gate: None,
        }
    }

    fn gated(pages: Vec<Result<ResultPage, FetchError>>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(pages)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<(String, u32, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(
        &self,
        key: &str,
        page: u32,
        hits_per_page: u32,
    ) -> Result<ResultPage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((key.to_string(), page, hits_per_page));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.pages
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(FetchError::new("no canned page")))
    }
}

fn ids(controller: &SearchController) -> Vec<String> {
    controller
        .view()
        .hits
        .iter()
        .map(|item| item.id.clone())
        .collect()
}

async fn run_one(
    controller: &mut SearchController,
    fetcher: &Arc<StubFetcher>,
    rx: &mut mpsc::UnboundedReceiver<Completion>,
    tx: &mpsc::UnboundedSender<Completion>,
    request: hn_search::FetchRequest,
) -> bool {
    let fetcher: Arc<dyn Fetcher> = fetcher.clone();
    spawn_fetch(fetcher, request, tx.clone()).await.unwrap();
    let completion = rx.recv().await.unwrap();
    controller.complete(completion)
}

#[tokio::test]
async fn test_submit_then_load_more_end_to_end() {
    let fetcher = Arc::new(StubFetcher::new(vec![
        Ok(ResultPage::new(vec![Item::new("1").with_title("A")], 0)),
        Ok(ResultPage::new(vec![Item::new("2")], 1)),
    ]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller = SearchController::new(100);

    controller.on_text_change("react");
    let request = controller.on_submit().unwrap();
    assert_eq!(controller.view().status, Status::Loading);
    assert!(run_one(&mut controller, &fetcher, &mut rx, &tx, request).await);

    let view = controller.view();
    assert_eq!(view.status, Status::Ready);
    assert_eq!(view.hits, &[Item::new("1").with_title("A")]);
    assert_eq!(view.page, 0);

    let request = controller.on_load_more().unwrap();
    assert!(run_one(&mut controller, &fetcher, &mut rx, &tx, request).await);

    let view = controller.view();
    assert_eq!(ids(&controller), vec!["1", "2"]);
    assert_eq!(view.page, 1);
    assert_eq!(view.hits[0].title.as_deref(), Some("A"));
    assert_eq!(
        fetcher.requests(),
        vec![("react".to_string(), 0, 100), ("react".to_string(), 1, 100)]
    );
}

#[tokio::test]
async fn test_cached_submit_skips_fetcher() {
    let fetcher = Arc::new(StubFetcher::new(vec![
        Ok(ResultPage::new(vec![Item::new("r")], 0)),
        Ok(ResultPage::new(vec![Item::new("v")], 0)),
    ]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller = SearchController::new(100);

    controller.on_text_change("react");
    let request = controller.on_submit().unwrap();
    run_one(&mut controller, &fetcher, &mut rx, &tx, request).await;
    controller.on_text_change("vue");
    let request = controller.on_submit().unwrap();
    run_one(&mut controller, &fetcher, &mut rx, &tx, request).await;
    let calls_before = fetcher.calls();

    controller.on_text_change("react");
    let request = controller.on_submit();

    assert!(request.is_none());
    assert_eq!(fetcher.calls() - calls_before, 0);
    assert_eq!(controller.view().status, Status::Ready);
    assert_eq!(ids(&controller), vec!["r"]);
}

#[tokio::test]
async fn test_failure_is_surfaced_and_cache_kept() {
    let fetcher = Arc::new(StubFetcher::new(vec![
        Ok(ResultPage::new(vec![Item::new("1")], 0)),
        Err(FetchError::new("search service returned 500 Internal Server Error")),
    ]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller = SearchController::new(100);

    controller.on_text_change("react");
    let request = controller.on_submit().unwrap();
    run_one(&mut controller, &fetcher, &mut rx, &tx, request).await;
    let request = controller.on_load_more().unwrap();
    run_one(&mut controller, &fetcher, &mut rx, &tx, request).await;

    let view = controller.view();
    assert_eq!(view.status, Status::Failed);
    assert!(view.error.unwrap().message().contains("500"));
    assert_eq!(ids(&controller), vec!["1"]);
    assert_eq!(view.page, 0);
}

#[tokio::test]
async fn test_dismiss_after_merge() {
    let fetcher = Arc::new(StubFetcher::new(vec![Ok(ResultPage::new(
        vec![Item::new("1"), Item::new("2"), Item::new("1")],
        0,
    ))]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller = SearchController::new(100);

    controller.on_text_change("react");
    let request = controller.on_submit().unwrap();
    run_one(&mut controller, &fetcher, &mut rx, &tx, request).await;
    controller.on_dismiss("1");
    controller.on_dismiss("missing");

    assert_eq!(ids(&controller), vec!["2"]);
    assert_eq!(controller.view().status, Status::Ready);
}

#[tokio::test]
async fn test_fetch_resolving_after_teardown_changes_nothing() {
    let gate = Arc::new(Notify::new());
    let fetcher = Arc::new(StubFetcher::gated(
        vec![Ok(ResultPage::new(vec![Item::new("late")], 0))],
        Arc::clone(&gate),
    ));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller = SearchController::new(100);

    controller.on_text_change("react");
    let request = controller.on_submit().unwrap();
    let dyn_fetcher: Arc<dyn Fetcher> = fetcher.clone();
    let handle = spawn_fetch(dyn_fetcher, request, tx.clone());

    controller.teardown();
    gate.notify_one();
    handle.await.unwrap();
    let completion = rx.recv().await.unwrap();

    assert!(!controller.complete(completion));
    assert!(controller.cache().needs_fetch("react"));
    assert!(controller.view().hits.is_empty());
    assert_eq!(controller.view().status, Status::Loading);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_closed_channel_does_not_panic_fetch_task() {
    let fetcher: Arc<dyn Fetcher> = Arc::new(StubFetcher::new(vec![Ok(ResultPage::default())]));
    let (tx, rx) = mpsc::unbounded_channel();
    let mut controller = SearchController::new(100);
    controller.on_text_change("react");
    let request = controller.on_submit().unwrap();
    drop(rx);

    spawn_fetch(fetcher, request, tx).await.unwrap();
}
