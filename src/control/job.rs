//! Coordinator/worker message protocol

use crate::state::CrawlTarget;
use tokio::sync::{mpsc, oneshot};

/// Instruction handed to a worker in answer to a job request
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// Fetch and parse this target, then submit it
    Scrape(CrawlTarget),
    /// Nothing to do right now; pause and ask again
    Wait,
    /// The crawl is over; exit
    Stop,
}

/// Messages flowing from workers to the coordinator
///
/// Both kinds share one queue so that a worker's result is always handled
/// before its next job request.
#[derive(Debug)]
pub(crate) enum Message {
    RequestJob(oneshot::Sender<Job>),
    SubmitResult(Box<CrawlTarget>),
}

/// Held by a worker for as long as it runs
///
/// The coordinator's completion watcher resolves once every token has been
/// dropped.
#[derive(Debug, Clone)]
pub(crate) struct CompletionToken(#[allow(dead_code)] mpsc::Sender<()>);

impl CompletionToken {
    pub(crate) fn new(sender: mpsc::Sender<()>) -> Self {
        Self(sender)
    }
}

/// A worker's handle onto the coordinator
#[derive(Debug)]
pub struct WorkerConnection {
    inbox: mpsc::Sender<Message>,
    _completion: CompletionToken,
}

impl WorkerConnection {
    pub(crate) fn new(inbox: mpsc::Sender<Message>, completion: CompletionToken) -> Self {
        Self {
            inbox,
            _completion: completion,
        }
    }

    /// A connection whose coordinator is already gone; every request answers `Stop`
    pub fn detached() -> Self {
        let (inbox, _) = mpsc::channel(1);
        let (completion, _) = mpsc::channel(1);
        Self::new(inbox, CompletionToken::new(completion))
    }

    /// Asks the coordinator for the next job
    ///
    /// A coordinator that has shut down answers `Stop`.
    pub async fn request_job(&self) -> Job {
        let (reply, response) = oneshot::channel();
        if self.inbox.send(Message::RequestJob(reply)).await.is_err() {
            return Job::Stop;
        }
        response.await.unwrap_or(Job::Stop)
    }

    /// Hands a finished target back to the coordinator
    pub async fn submit(&self, target: CrawlTarget) {
        if let Err(e) = self.inbox.send(Message::SubmitResult(Box::new(target))).await {
            tracing::warn!("coordinator gone, dropping result: {}", e.0.describe());
        }
    }
}

impl Message {
    fn describe(&self) -> String {
        match self {
            Self::RequestJob(_) => "job request".to_string(),
            Self::SubmitResult(target) => target.url.clone(),
        }
    }
}
