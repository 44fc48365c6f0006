use std::{convert::Infallible, time::Duration};

use crate::{
    fetcher::ReadingSource,
    publisher::{PublishOutcome, ReadingSink},
};

/// Time between the end of one cycle and the start of the next.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The fetch produced nothing, so nothing was published.
    Skipped,
    Delivered(PublishOutcome),
}

/// Fetch, publish, sleep; forever.
#[derive(Debug)]
pub struct Scheduler<S, P> {
    source: S,
    sink: P,
    interval: Duration,
}

impl<S: ReadingSource, P: ReadingSink> Scheduler<S, P> {
    pub fn new(source: S, sink: P) -> Self {
        Self { source, sink, interval: DEFAULT_INTERVAL }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One fetch and, if it produced a reading, one publish.
    pub async fn run_cycle(&self) -> CycleOutcome {
        match self.source.fetch().await {
            Some(reading) => CycleOutcome::Delivered(self.sink.publish(&reading).await),
            None => CycleOutcome::Skipped,
        }
    }

    /// Never returns; both collaborators absorb their own failures.
    pub async fn run(&self) -> Infallible {
        loop {
            let outcome = self.run_cycle().await;
            tracing::debug!(?outcome, "Cycle finished");

            tracing::info!("Waiting {} seconds until the next collection", self.interval.as_secs());
            tokio::time::sleep(self.interval).await;
        }
    }
}
