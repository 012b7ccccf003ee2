//! Fetch/parse worker
//!
//! A worker loops on its connection: ask for a job, act on it, submit the
//! result. It holds no crawl state beyond the target it is working on.

use crate::control::{Job, WorkerConnection};
use crate::crawler::Transport;
use crate::parser::parse_response;
use crate::state::CrawlTarget;
use std::sync::Arc;
use std::time::Duration;

/// A single fetch/parse worker bound to one coordinator connection
pub struct Worker<T: Transport> {
    id: usize,
    connection: WorkerConnection,
    transport: Arc<T>,
    idle_interval: Duration,
}

impl<T: Transport> Worker<T> {
    pub fn new(
        id: usize,
        connection: WorkerConnection,
        transport: Arc<T>,
        idle_interval: Duration,
    ) -> Self {
        Self {
            id,
            connection,
            transport,
            idle_interval,
        }
    }

    /// Runs jobs until the coordinator answers `Stop`
    ///
    /// Dropping the worker's connection on return is what signals completion
    /// to the coordinator.
    pub async fn run(self) {
        tracing::debug!(worker = self.id, "worker started");

        loop {
            match self.connection.request_job().await {
                Job::Wait => tokio::time::sleep(self.idle_interval).await,
                Job::Stop => break,
                Job::Scrape(target) => {
                    if let Some(result) = self.scrape(target).await {
                        self.connection.submit(result).await;
                    }
                }
            }
        }

        tracing::debug!(worker = self.id, "worker stopped");
    }

    /// Fetches and parses one target
    ///
    /// Returns `None` when the URL is malformed or the fetch fails; such
    /// targets are dropped without a result.
    pub async fn scrape(&self, mut target: CrawlTarget) -> Option<CrawlTarget> {
        let url = match target.resolve_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(worker = self.id, url = %target.url, error = %e, "skipping malformed URL");
                return None;
            }
        };

        tracing::debug!(worker = self.id, %target, "fetching");

        let page = match self.transport.fetch(&target.url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(worker = self.id, url = %target.url, error = %e, "fetch failed");
                return None;
            }
        };

        target.mark_fetched();
        let content_type = page.content_type().to_string();
        parse_response(&mut target, &url, &content_type, page.body).await;

        Some(target)
    }
}
