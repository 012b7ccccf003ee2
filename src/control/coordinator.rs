//! Crawl coordinator
//!
//! The coordinator is a single task that owns the frontier, the visited set
//! and the store. Workers reach it only through their [`WorkerConnection`]:
//! a job request is answered from the frontier, a submitted result is
//! persisted and its links are fed back into the frontier. The task exits
//! once every connected worker has finished.

use crate::config::CrawlConfig;
use crate::control::frontier::Frontier;
use crate::control::job::{CompletionToken, Job, Message, WorkerConnection};
use crate::state::CrawlTarget;
use crate::storage::Store;
use crate::url::{host_of, is_whitelisted};
use crate::CrawlError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use url::Url;

/// Capacity of the shared worker inbox
const INBOX_CAPACITY: usize = 64;

/// Counters reported when a crawl finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Results persisted (or handed to the store) without a failure marker
    pub successes: u64,
    /// Results that came back carrying a failure marker
    pub failures: u64,
    /// URLs with a recorded result
    pub visited: usize,
    /// Targets still queued when the crawl ended
    pub pending: usize,
}

/// Cloneable stop switch shared with the coordinator task
///
/// Stopping is idempotent and never blocks; workers observe it on their next
/// job request.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn stop(&self) {
        if !self.0.swap(true, Ordering::SeqCst) {
            tracing::info!("stop requested, workers will exit after their current job");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A crawl that has not started yet
pub struct Coordinator<S: Store> {
    state: CrawlState<S>,
    inbox: mpsc::Receiver<Message>,
    inbox_sender: mpsc::Sender<Message>,
    completion: mpsc::Receiver<()>,
    completion_sender: mpsc::Sender<()>,
}

/// Everything the running coordinator task owns
struct CrawlState<S> {
    config: CrawlConfig,
    store: S,
    frontier: Frontier,
    stop: StopSignal,
    successes: u64,
    failures: u64,
}

impl<S: Store> Coordinator<S> {
    pub fn new(config: CrawlConfig, store: S) -> Self {
        let (inbox_sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (completion_sender, completion) = mpsc::channel(1);
        let frontier = Frontier::new(config.random_index_threshold);

        Self {
            state: CrawlState {
                config,
                store,
                frontier,
                stop: StopSignal::default(),
                successes: 0,
                failures: 0,
            },
            inbox,
            inbox_sender,
            completion,
            completion_sender,
        }
    }

    /// Queues seed URLs at depth 0
    ///
    /// Seeds are not subject to the host whitelist.
    pub fn seed<I, U>(&mut self, urls: I)
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        for url in urls {
            let target = CrawlTarget::seed(url);
            tracing::debug!(url = %target.url, "seeding frontier");
            self.state.frontier.push(target);
        }
    }

    /// Registers a worker and returns its connection
    ///
    /// Every connection must be created before [`Coordinator::run`]; the
    /// crawl ends once all of them have been dropped.
    pub fn connect(&self) -> WorkerConnection {
        WorkerConnection::new(
            self.inbox_sender.clone(),
            CompletionToken::new(self.completion_sender.clone()),
        )
    }

    /// Connects the store and starts the coordinator task
    ///
    /// Fails before any job is handed out if the store cannot be reached.
    pub fn run(self) -> Result<CoordinatorHandle<S>, CrawlError> {
        let Coordinator {
            mut state,
            inbox,
            inbox_sender,
            mut completion,
            completion_sender,
        } = self;

        state.store.connect()?;
        tracing::info!(
            pending = state.frontier.len(),
            max_depth = ?state.config.max_depth,
            "coordinator started"
        );

        // From here on only worker connections keep these channels open
        drop(inbox_sender);
        drop(completion_sender);

        let (terminate, terminated) = oneshot::channel();
        tokio::spawn(async move {
            while completion.recv().await.is_some() {}
            let _ = terminate.send(());
        });

        let stop = state.stop.clone();
        let task = tokio::spawn(state.run(inbox, terminated));

        Ok(CoordinatorHandle { stop, task })
    }
}

impl<S: Store> CrawlState<S> {
    async fn run(
        mut self,
        mut inbox: mpsc::Receiver<Message>,
        mut terminated: oneshot::Receiver<()>,
    ) -> (S, CrawlSummary) {
        loop {
            tokio::select! {
                biased;

                message = inbox.recv() => match message {
                    Some(Message::RequestJob(reply)) => self.answer(reply),
                    Some(Message::SubmitResult(target)) => self.handle_result(*target),
                    None => break,
                },
                _ = &mut terminated => break,
            }
        }

        let summary = self.summary();
        tracing::info!(
            successes = summary.successes,
            failures = summary.failures,
            visited = summary.visited,
            pending = summary.pending,
            "all workers finished"
        );
        (self.store, summary)
    }

    fn answer(&mut self, reply: oneshot::Sender<Job>) {
        let job = self.next_job();
        if let Err(Job::Scrape(target)) = reply.send(job) {
            // The worker went away before taking its job
            self.frontier.push(target);
        }
    }

    fn next_job(&mut self) -> Job {
        if self.stop.is_stopped() {
            return Job::Stop;
        }
        match self.frontier.next() {
            Some(target) => Job::Scrape(target),
            None => {
                tracing::warn!("frontier is empty, asking worker to wait");
                Job::Wait
            }
        }
    }

    fn handle_result(&mut self, target: CrawlTarget) {
        self.frontier.mark_visited(&target.url);

        match &target.error {
            None => {
                tracing::info!(
                    url = %target.url,
                    depth = target.depth,
                    links = target.links.len(),
                    text = target.text.len(),
                    content_type = %target.content_type,
                    "scraped"
                );
                if let Err(e) = self.store.insert(&target) {
                    tracing::warn!(url = %target.url, error = %e, "failed to store result");
                }
                self.successes += 1;
                if self.successes % self.config.status_log_frequency.max(1) == 0 {
                    tracing::info!(
                        successes = self.successes,
                        visited = self.frontier.visited_len(),
                        frontier = self.frontier.len(),
                        "crawl status"
                    );
                }
            }
            Some(e) => {
                tracing::warn!(url = %target.url, error = %e, "scrape failed");
                self.failures += 1;
            }
        }

        self.enqueue_links(&target);
    }

    fn enqueue_links(&mut self, parent: &CrawlTarget) {
        let depth = parent.depth + 1;
        if self.config.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        for link in &parent.links {
            if self.frontier.is_visited(link) {
                continue;
            }

            if let Some(patterns) = &self.config.whitelisted_hosts {
                let host = Url::parse(link).ok().and_then(|url| host_of(&url));
                match host {
                    Some(host) if is_whitelisted(&host, patterns) => {}
                    _ => {
                        tracing::trace!(%link, "host not whitelisted");
                        continue;
                    }
                }
            }

            if self
                .frontier
                .push(CrawlTarget::discovered(link.as_str(), depth, &parent.url))
            {
                tracing::debug!(%link, depth, "queued");
            }
        }
    }

    fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            successes: self.successes,
            failures: self.failures,
            visited: self.frontier.visited_len(),
            pending: self.frontier.len(),
        }
    }
}

/// A running crawl
pub struct CoordinatorHandle<S> {
    stop: StopSignal,
    task: JoinHandle<(S, CrawlSummary)>,
}

impl<S> CoordinatorHandle<S> {
    /// Asks every worker to exit on its next job request
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Waits until every worker has finished, then returns the store
    pub async fn await_completion(self) -> Result<(S, CrawlSummary), CrawlError> {
        self.task
            .await
            .map_err(|e| CrawlError::Join(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{FetchError, FetchedPage, Transport, Worker};
    use crate::state::TargetError;
    use crate::storage::{StoreError, StoreResult};
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::StreamExt;
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use std::time::Duration;

    /// Keeps inserted targets in memory
    #[derive(Default)]
    struct RecordingStore {
        inserted: Vec<CrawlTarget>,
        refuse_connect: bool,
        refuse_insert: bool,
        panic_on_insert: bool,
    }

    impl Store for RecordingStore {
        fn connect(&mut self) -> StoreResult<()> {
            if self.refuse_connect {
                return Err(StoreError::NotConnected);
            }
            Ok(())
        }

        fn insert(&mut self, target: &CrawlTarget) -> StoreResult<()> {
            if self.refuse_insert {
                return Err(StoreError::NotConnected);
            }
            if self.panic_on_insert {
                panic!("store corrupted");
            }
            self.inserted.push(target.clone());
            Ok(())
        }

        fn close(&mut self) -> StoreResult<()> {
            Ok(())
        }
    }

    fn config() -> CrawlConfig {
        CrawlConfig {
            whitelisted_hosts: Some(vec!["a.test".to_string()]),
            ..CrawlConfig::default()
        }
    }

    async fn expect_scrape(connection: &WorkerConnection) -> CrawlTarget {
        match connection.request_job().await {
            Job::Scrape(target) => target,
            other => panic!("expected a scrape job, got {:?}", other),
        }
    }

    fn scraped(mut target: CrawlTarget, links: &[&str]) -> CrawlTarget {
        target.text = vec!["text".to_string()];
        target.links = links.iter().map(|l| l.to_string()).collect();
        target
    }

    #[tokio::test]
    async fn test_links_are_followed_within_whitelist() {
        let mut coordinator = Coordinator::new(config(), RecordingStore::default());
        coordinator.seed(["https://a.test/"]);
        let connection = coordinator.connect();
        let handle = coordinator.run().unwrap();

        let seed = expect_scrape(&connection).await;
        assert_eq!(seed.url, "https://a.test/");
        assert_eq!(seed.depth, 0);

        connection
            .submit(scraped(
                seed,
                &["https://a.test/page2", "https://b.test/elsewhere"],
            ))
            .await;

        let page2 = expect_scrape(&connection).await;
        assert_eq!(page2.url, "https://a.test/page2");
        assert_eq!(page2.depth, 1);
        assert_eq!(page2.found_via.as_deref(), Some("https://a.test/"));

        connection.submit(scraped(page2, &[])).await;
        assert_eq!(connection.request_job().await, Job::Wait);

        handle.stop();
        assert_eq!(connection.request_job().await, Job::Stop);
        drop(connection);

        let (store, summary) = handle.await_completion().await.unwrap();
        let urls: Vec<&str> = store.inserted.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.test/", "https://a.test/page2"]);
        assert_eq!(
            summary,
            CrawlSummary {
                successes: 2,
                failures: 0,
                visited: 2,
                pending: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_links_past_max_depth_are_not_queued() {
        let config = CrawlConfig {
            max_depth: Some(1),
            ..config()
        };
        let mut coordinator = Coordinator::new(config, RecordingStore::default());
        coordinator.seed(["https://a.test/"]);
        let connection = coordinator.connect();
        let handle = coordinator.run().unwrap();

        let seed = expect_scrape(&connection).await;
        connection
            .submit(scraped(seed, &["https://a.test/page2"]))
            .await;
        let page2 = expect_scrape(&connection).await;
        connection
            .submit(scraped(page2, &["https://a.test/page3"]))
            .await;

        assert_eq!(connection.request_job().await, Job::Wait);

        handle.stop();
        drop(connection);
        let (_, summary) = handle.await_completion().await.unwrap();
        assert_eq!(summary.visited, 2);
        assert_eq!(summary.pending, 0);
    }

    #[tokio::test]
    async fn test_visited_links_are_not_requeued() {
        let mut coordinator = Coordinator::new(config(), RecordingStore::default());
        coordinator.seed(["https://a.test/"]);
        let connection = coordinator.connect();
        let handle = coordinator.run().unwrap();

        let seed = expect_scrape(&connection).await;
        connection
            .submit(scraped(seed, &["https://a.test/", "https://a.test/"]))
            .await;
        assert_eq!(connection.request_job().await, Job::Wait);

        handle.stop();
        drop(connection);
        let (store, _) = handle.await_completion().await.unwrap();
        assert_eq!(store.inserted.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_result_is_visited_but_not_stored() {
        let mut coordinator = Coordinator::new(config(), RecordingStore::default());
        coordinator.seed(["https://a.test/logo.svg", "https://a.test/"]);
        let connection = coordinator.connect();
        let handle = coordinator.run().unwrap();

        let mut logo = expect_scrape(&connection).await;
        logo.error = Some(TargetError::UnsupportedContentType("image/svg+xml".into()));
        connection.submit(logo).await;

        let home = expect_scrape(&connection).await;
        connection
            .submit(scraped(home, &["https://a.test/logo.svg"]))
            .await;
        assert_eq!(connection.request_job().await, Job::Wait);

        handle.stop();
        drop(connection);
        let (store, summary) = handle.await_completion().await.unwrap();
        assert_eq!(store.inserted.len(), 1);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.visited, 2);
    }

    #[tokio::test]
    async fn test_store_insert_failure_does_not_stop_crawl() {
        let store = RecordingStore {
            refuse_insert: true,
            ..RecordingStore::default()
        };
        let mut coordinator = Coordinator::new(config(), store);
        coordinator.seed(["https://a.test/"]);
        let connection = coordinator.connect();
        let handle = coordinator.run().unwrap();

        let seed = expect_scrape(&connection).await;
        connection
            .submit(scraped(seed, &["https://a.test/next"]))
            .await;
        assert_eq!(expect_scrape(&connection).await.url, "https://a.test/next");

        handle.stop();
        drop(connection);
        let (_, summary) = handle.await_completion().await.unwrap();
        assert_eq!(summary.successes, 1);
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_run() {
        let store = RecordingStore {
            refuse_connect: true,
            ..RecordingStore::default()
        };
        let mut coordinator = Coordinator::new(config(), store);
        coordinator.seed(["https://a.test/"]);
        let connection = coordinator.connect();

        assert!(matches!(coordinator.run(), Err(CrawlError::Store(_))));
        assert_eq!(connection.request_job().await, Job::Stop);
    }

    #[tokio::test]
    async fn test_waiting_worker_receives_job_found_by_another() {
        let mut coordinator = Coordinator::new(config(), RecordingStore::default());
        coordinator.seed(["https://a.test/"]);
        let first = coordinator.connect();
        let second = coordinator.connect();
        let handle = coordinator.run().unwrap();

        let seed = expect_scrape(&first).await;
        assert_eq!(second.request_job().await, Job::Wait);

        first
            .submit(scraped(seed, &["https://a.test/page2"]))
            .await;

        let page2 = expect_scrape(&second).await;
        assert_eq!(page2.url, "https://a.test/page2");
        assert_eq!(page2.depth, 1);

        handle.stop();
        drop(first);
        drop(second);
        let (_, summary) = handle.await_completion().await.unwrap();
        assert_eq!(
            summary,
            CrawlSummary {
                successes: 1,
                failures: 0,
                visited: 1,
                pending: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_panicking_store_reports_join_error() {
        let store = RecordingStore {
            panic_on_insert: true,
            ..RecordingStore::default()
        };
        let mut coordinator = Coordinator::new(config(), store);
        coordinator.seed(["https://a.test/"]);
        let connection = coordinator.connect();
        let handle = coordinator.run().unwrap();

        let seed = expect_scrape(&connection).await;
        connection.submit(scraped(seed, &[])).await;

        let result = tokio::time::timeout(Duration::from_secs(5), handle.await_completion())
            .await
            .unwrap();
        assert!(matches!(result, Err(CrawlError::Join(_))));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let coordinator = Coordinator::new(config(), RecordingStore::default());
        let connection = coordinator.connect();
        let handle = coordinator.run().unwrap();

        handle.stop();
        handle.stop();
        assert_eq!(connection.request_job().await, Job::Stop);
        assert_eq!(connection.request_job().await, Job::Stop);

        drop(connection);
        let (_, summary) = handle.await_completion().await.unwrap();
        assert_eq!(summary, CrawlSummary::default());
    }

    #[tokio::test]
    async fn test_no_workers_completes_immediately() {
        let mut coordinator = Coordinator::new(config(), RecordingStore::default());
        coordinator.seed(["https://a.test/"]);
        let handle = coordinator.run().unwrap();

        let (_, summary) = tokio::time::timeout(Duration::from_secs(1), handle.await_completion())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.pending, 1);
    }

    /// Answers every URL with a small page after a fixed delay
    struct SlowTransport {
        delay: Duration,
    }

    #[async_trait]
    impl Transport for SlowTransport {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage, FetchError> {
            tokio::time::sleep(self.delay).await;
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
            let body =
                futures::stream::iter(vec![Ok(Bytes::from_static(b"<p>slow page</p>"))]).boxed();
            Ok(FetchedPage { headers, body })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stop_waits_for_in_flight_workers() {
        let mut coordinator = Coordinator::new(config(), RecordingStore::default());
        coordinator.seed(["https://a.test/1", "https://a.test/2", "https://a.test/3"]);
        let connections: Vec<_> = (0..3).map(|_| coordinator.connect()).collect();
        let handle = coordinator.run().unwrap();

        let transport = Arc::new(SlowTransport {
            delay: Duration::from_millis(200),
        });
        for (id, connection) in connections.into_iter().enumerate() {
            let worker = Worker::new(id, connection, transport.clone(), Duration::from_millis(10));
            tokio::spawn(worker.run());
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop();

        let (store, summary) = tokio::time::timeout(Duration::from_secs(5), handle.await_completion())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.inserted.len(), 3);
        assert_eq!(summary.successes, 3);
        assert_eq!(summary.pending, 0);
    }
}
