//! Fan-in barrier for concurrent probes
//!
//! A [`JoinBarrier`] collects futures tagged with a [`PendingTag`], polls
//! them concurrently, and hands the accumulated state to a release callback
//! exactly once, after the last one settles. Consuming the barrier in
//! [`JoinBarrier::join`] makes a second release impossible.

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;

/// Category of an outstanding probe
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingTag {
    /// Analytics endpoint
    Analytics,
    /// Third-party font resource
    Fonts,
    /// Embedded video
    Videos,
}

/// Multiset of outstanding probe categories
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingSet {
    counts: BTreeMap<PendingTag, usize>,
}

impl PendingSet {
    /// Record one more outstanding request of `tag`
    pub fn push(&mut self, tag: PendingTag) {
        *self.counts.entry(tag).or_default() += 1;
    }

    /// Remove one outstanding request of `tag`. Returns `false` if none was pending.
    pub fn settle(&mut self, tag: PendingTag) -> bool {
        match self.counts.get_mut(&tag) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.counts.remove(&tag);
                true
            }
            None => false,
        }
    }

    /// Outstanding requests of `tag`
    pub fn count(&self, tag: PendingTag) -> usize {
        self.counts.get(&tag).copied().unwrap_or_default()
    }

    /// Outstanding requests over all categories
    pub fn len(&self) -> usize {
        self.counts.values().sum()
    }

    /// Whether nothing is outstanding
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Concurrent fan-out with a single "all settled" release
pub struct JoinBarrier<'a, T> {
    pending: PendingSet,
    in_flight: FuturesUnordered<BoxFuture<'a, (PendingTag, T)>>,
}

impl<T> Default for JoinBarrier<'_, T> {
    fn default() -> Self {
        Self {
            pending: PendingSet::default(),
            in_flight: FuturesUnordered::new(),
        }
    }
}

impl<'a, T: Send + 'a> JoinBarrier<'a, T> {
    /// Create an empty barrier
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `request` under `tag`
    ///
    /// The future is polled together with every other issued future once
    /// [`join`](Self::join) runs.
    pub fn issue<F>(&mut self, tag: PendingTag, request: F)
    where
        F: Future<Output = T> + Send + 'a,
    {
        self.pending.push(tag);
        self.in_flight.push(request.map(move |value| (tag, value)).boxed());
    }

    /// Outstanding requests
    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    /// Drive every issued request to completion.
    ///
    /// `on_settled` sees each result in arrival order. `on_release` runs once
    /// the pending set is empty, immediately if nothing was issued, and its
    /// return value is returned.
    pub async fn join<S, R>(
        mut self,
        mut state: S,
        mut on_settled: impl FnMut(&mut S, PendingTag, T),
        on_release: impl FnOnce(S) -> R,
    ) -> R {
        while !self.pending.is_empty() {
            let Some((tag, value)) = self.in_flight.next().await else {
                break;
            };
            self.pending.settle(tag);
            on_settled(&mut state, tag, value);
        }
        on_release(state)
    }
}
