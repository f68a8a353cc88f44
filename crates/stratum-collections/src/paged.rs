//! Interruptible driver for paged population of an index set.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use stratum_core::{IndexSet, NumericRange};

use crate::error::SourceResult;
use crate::source::PagedResponse;

/// Drives one or more paged walks into a shared target [`IndexSet`].
///
/// Each call to [`populate`](Self::populate) walks a page-continuation chain
/// to completion, mapping every item to a [`NumericRange`] and inserting it
/// into the target as pages arrive, with a change callback fired after each
/// page. Several walks (partitions or batches of one logical query) may run
/// concurrently against the same helper and target; the helper counts them so
/// [`is_loading`](Self::is_loading) stays `true` until the last one settles.
///
/// Interruption is cooperative and one-way: after [`interrupt`](Self::interrupt)
/// every in-flight walk stops before committing its next page. Pages already
/// merged stay merged: interruption truncates, it does not roll back. An
/// interrupted walk reports `Ok(false)`; it is an expected outcome, not an
/// error.
#[derive(Debug, Default)]
pub struct PagedPopulationHelper {
    interrupted: AtomicBool,
    ongoing: AtomicUsize,
}

/// Decrements the ongoing-operations counter on every exit path, including
/// errors and interruption.
struct OngoingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> OngoingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for OngoingGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PagedPopulationHelper {
    /// Create a helper with no walks in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop every in-flight walk before its next page commit.
    ///
    /// The flag is one-way; an interrupted helper is abandoned together with
    /// its target set, never reused.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        tracing::debug!(target: "stratum_collections::paged", "population interrupted");
    }

    /// Whether [`interrupt`](Self::interrupt) has been called.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Whether any walk is still running and the helper is not interrupted.
    pub fn is_loading(&self) -> bool {
        !self.is_interrupted() && self.ongoing.load(Ordering::SeqCst) > 0
    }

    /// Walk a paged response to completion, merging every page into `target`.
    ///
    /// `first_page` is the pending fetch of the first page; awaiting it is
    /// part of the walk, so `is_loading` covers it. `project` maps each item
    /// to the range it contributes; `on_page` fires after each page is
    /// merged, in fetch order.
    ///
    /// Returns `Ok(true)` if the walk ran to completion and `Ok(false)` if it
    /// was interrupted; callers use this to distinguish a complete result
    /// set from a partial, abandoned one. A failed page fetch propagates as
    /// an error; pages merged before the failure remain in `target`.
    pub async fn populate<T, F>(
        &self,
        first_page: F,
        project: impl Fn(&T) -> NumericRange,
        target: &RwLock<IndexSet>,
        mut on_page: impl FnMut(),
    ) -> SourceResult<bool>
    where
        F: Future<Output = SourceResult<PagedResponse<T>>>,
    {
        let _guard = OngoingGuard::enter(&self.ongoing);

        let mut response = first_page.await?;
        let mut pages = 0_u32;
        loop {
            // A fetched page is discarded, not merged, once interrupted.
            if self.is_interrupted() {
                return Ok(false);
            }

            {
                let mut set = target.write();
                for item in &response.items {
                    set.add_range(project(item));
                }
            }
            pages += 1;
            on_page();

            let Some(next) = response.next.take() else {
                tracing::trace!(
                    target: "stratum_collections::paged",
                    pages,
                    "paged walk complete"
                );
                return Ok(true);
            };
            if self.is_interrupted() {
                return Ok(false);
            }
            response = next().await?;
        }
    }
}
