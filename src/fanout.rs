//! Concurrent fan-out of independent backend queries
//!
//! A [`Wave`] is one batch of tasks gated by a single completion barrier.
//! Every task is started when the wave runs and every task is awaited, even
//! after a sibling has failed; only then are errors inspected. If any task
//! failed the wave fails with one of the errors and the caller must discard
//! every slot the wave wrote to.
//!
//! Each task writes its value into its own `Option<T>` slot owned by the
//! caller, so tasks never share mutable state with one another.

use std::future::Future;

use futures::future::{BoxFuture, join_all};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::{Error, Result};

/// A batch of concurrently executed tasks
pub struct Wave<'a> {
    name: &'static str,
    tasks: Vec<BoxFuture<'a, Result<()>>>,
    cancel: Option<CancellationToken>,
}

impl<'a> Wave<'a> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tasks: Vec::new(),
            cancel: None,
        }
    }

    /// Abort the whole wave as soon as `token` is cancelled.
    ///
    /// Outstanding tasks are dropped and the wave fails with
    /// [`Error::Cancelled`]; no slot written by a finished task may be used.
    pub fn with_cancellation(mut self, token: Option<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }

    /// Queue a task whose failure fails the wave.
    ///
    /// The error is logged here, at the point of failure, before it is
    /// handed to the collector.
    pub fn push<T, F>(&mut self, task: &'static str, slot: &'a mut Option<T>, fut: F)
    where
        T: Send + 'a,
        F: Future<Output = Result<T>> + Send + 'a,
    {
        let wave = self.name;
        self.tasks.push(Box::pin(async move {
            match fut.await {
                Ok(value) => {
                    *slot = Some(value);
                    Ok(())
                }
                Err(err) => {
                    error!(wave, task, error = %err, "wave task failed");
                    Err(err)
                }
            }
        }));
    }

    /// Queue a task that cannot fail the wave.
    ///
    /// Used for soft resolutions that already degrade to a default value.
    pub fn push_soft<T, F>(&mut self, slot: &'a mut Option<T>, fut: F)
    where
        T: Send + 'a,
        F: Future<Output = T> + Send + 'a,
    {
        self.tasks.push(Box::pin(async move {
            *slot = Some(fut.await);
            Ok(())
        }));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every queued task concurrently and wait for all of them.
    pub async fn run(self) -> Result<()> {
        let Wave { name, tasks, cancel } = self;
        let count = tasks.len();
        if count == 0 {
            return Ok(());
        }

        debug!(wave = name, count, "starting wave");
        let results = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(wave = name, "wave cancelled");
                        return Err(Error::Cancelled);
                    }
                    results = join_all(tasks) => results,
                }
            }
            None => join_all(tasks).await,
        };

        let mut errors = Vec::with_capacity(count);
        errors.extend(results.into_iter().filter_map(|r| r.err()));
        if !errors.is_empty() {
            debug!(wave = name, failed = errors.len(), count, "wave failed");
            return Err(errors.swap_remove(0));
        }

        debug!(wave = name, count, "wave completed");
        Ok(())
    }
}

/// Take the value a successful wave left in `slot`.
pub fn filled<T>(slot: Option<T>, task: &'static str) -> Result<T> {
    slot.ok_or(Error::IncompleteWave { task })
}
