//! Paginated ranking state for one genre.
//!
//! A [`RankingFeed`] owns the items loaded so far and serializes page requests
//! against a [`RankingSource`]. Commands never fail: errors are kept in the
//! state and surfaced through [`RankingFeed::snapshot`].
//!
//! The state lock is never held across the fetch. Each reset bumps an epoch;
//! a response is committed only if the epoch it was dispatched under is still
//! current, so a superseded request can never overwrite a newer context.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    cache::{CachedFeed, RankingCache},
    data::{PageResult, RankingItem},
    dedupe,
    error::{FeedError, RankingError},
    filter::FilterSpec,
    genre::Genre,
    source::RankingSource,
};

/// Read model of a feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub genre: Genre,
    pub items: Vec<RankingItem>,
    pub current_page: u32,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub has_more: bool,
    pub total_count: u64,
    pub last_error: Option<FeedError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    FirstPage,
    NextPage,
}

#[derive(Debug)]
struct FeedState {
    genre: Genre,
    items: Vec<RankingItem>,
    current_page: u32,
    is_loading_initial: bool,
    is_loading_more: bool,
    has_more: bool,
    total_count: u64,
    last_error: Option<FeedError>,
    failed: Option<Stage>,
    epoch: u64,
    /// Set before a next-page request is dispatched, cleared by [`InFlight`]
    pending: bool,
    cancel: CancellationToken,
}

impl FeedState {
    fn new(genre: Genre) -> Self {
        Self {
            genre,
            items: Vec::new(),
            current_page: 0,
            is_loading_initial: false,
            is_loading_more: false,
            has_more: false,
            total_count: 0,
            last_error: None,
            failed: None,
            epoch: 0,
            pending: false,
            cancel: CancellationToken::new(),
        }
    }

    /// Back to defaults under a new epoch, cancelling whatever is in flight
    fn reset(&mut self, genre: Genre) -> u64 {
        self.cancel.cancel();
        let epoch = self.epoch + 1;
        *self = Self {
            epoch,
            ..Self::new(genre)
        };
        epoch
    }

    fn restore(&mut self, cached: CachedFeed) {
        self.items = cached.items;
        self.current_page = cached.current_page;
        self.has_more = cached.has_more;
        self.total_count = cached.total_count;
    }

    fn commit(&mut self, page: u32, result: PageResult) {
        let items = std::mem::take(&mut self.items);
        self.items = dedupe::merge(items, result.items);
        self.has_more = result.has_next;
        self.total_count = result.total_count;
        self.current_page = page;
        self.last_error = None;
        self.failed = None;
    }

    fn fail(&mut self, stage: Stage, e: &RankingError) {
        self.last_error = Some(FeedError::from(e));
        self.failed = Some(stage);
        self.has_more = false;
    }

    fn to_cached(&self) -> CachedFeed {
        CachedFeed {
            items: self.items.clone(),
            current_page: self.current_page,
            has_more: self.has_more,
            total_count: self.total_count,
        }
    }

    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            genre: self.genre,
            items: self.items.clone(),
            current_page: self.current_page,
            is_loading_initial: self.is_loading_initial,
            is_loading_more: self.is_loading_more,
            has_more: self.has_more,
            total_count: self.total_count,
            last_error: self.last_error.clone(),
        }
    }
}

/// Clears the loading flags of a request when it finishes or is dropped
struct InFlight<'a> {
    state: &'a Mutex<FeedState>,
    epoch: u64,
    stage: Stage,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.epoch != self.epoch {
            return;
        }
        match self.stage {
            Stage::FirstPage => state.is_loading_initial = false,
            Stage::NextPage => {
                state.pending = false;
                state.is_loading_more = false;
            }
        }
    }
}

/// Paginated ranking of one genre backed by a [`RankingSource`]
pub struct RankingFeed<S> {
    source: S,
    cache: Option<Arc<RankingCache>>,
    state: Mutex<FeedState>,
}

impl<S: RankingSource> RankingFeed<S> {
    /// Empty feed for `genre`. Nothing is fetched until [`Self::load_first_page`].
    pub fn new(source: S, genre: Genre) -> Self {
        Self {
            source,
            cache: None,
            state: Mutex::new(FeedState::new(genre)),
        }
    }

    pub fn with_cache(self, cache: Arc<RankingCache>) -> Self {
        Self {
            cache: Some(cache),
            ..self
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.lock().snapshot()
    }

    pub fn genre(&self) -> Genre {
        self.state.lock().genre
    }

    /// Loaded items passing `filter`
    pub fn filtered(&self, filter: &FilterSpec) -> Vec<RankingItem> {
        filter.apply(&self.state.lock().items)
    }

    /// Reset to `genre` and load its first page, superseding any request in flight.
    ///
    /// A fresh cache entry for `genre` is restored without fetching.
    pub async fn load_first_page(&self, genre: Genre) {
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(genre)) {
            let mut state = self.state.lock();
            state.reset(genre);
            state.restore(cached);
            tracing::debug!(%genre, page = state.current_page, "restored ranking from cache");
            return;
        }
        self.fetch_first_page(genre).await;
    }

    /// Drop everything loaded for `genre` and fetch its first page again
    pub async fn refresh(&self, genre: Genre) {
        if let Some(cache) = &self.cache {
            cache.invalidate(genre);
        }
        self.fetch_first_page(genre).await;
    }

    /// Load the page after the current one.
    ///
    /// No-op while any load is in flight or when there is nothing more to load,
    /// so repeated triggers collapse into a single request.
    pub async fn load_next_page(&self) {
        let (genre, page, epoch, cancel) = {
            let mut state = self.state.lock();
            if state.pending || state.is_loading_initial || state.is_loading_more || !state.has_more
            {
                tracing::trace!(genre = %state.genre, "ignoring next page trigger");
                return;
            }
            state.pending = true;
            state.is_loading_more = true;
            (
                state.genre,
                state.current_page + 1,
                state.epoch,
                state.cancel.clone(),
            )
        };
        let _flight = InFlight {
            state: &self.state,
            epoch,
            stage: Stage::NextPage,
        };

        tracing::debug!(%genre, page, "loading next page");
        let result = self.source.fetch_page(genre, page, &cancel).await;

        let mut state = self.state.lock();
        if state.epoch != epoch {
            tracing::debug!(%genre, page, "discarding superseded page");
            return;
        }
        match result {
            Ok(result) => {
                state.commit(page, result);
                tracing::debug!(%genre, page, items = state.items.len(), has_more = state.has_more, "merged page");
                self.store(&state);
            }
            Err(e) => {
                tracing::warn!(%genre, page, error = %e, "failed to load next page");
                state.fail(Stage::NextPage, &e);
            }
        }
    }

    /// Recover from the last failed load.
    ///
    /// After a next-page failure the page is requested again; after a first-page
    /// failure the first page is reloaded. Without a failure this does nothing.
    pub async fn retry_next_page(&self) {
        let (failed, genre) = {
            let mut state = self.state.lock();
            let failed = state.failed.take();
            if failed == Some(Stage::NextPage) {
                state.last_error = None;
                state.has_more = true;
            }
            (failed, state.genre)
        };

        match failed {
            Some(Stage::NextPage) => self.load_next_page().await,
            Some(Stage::FirstPage) => self.fetch_first_page(genre).await,
            None => tracing::trace!(%genre, "nothing to retry"),
        }
    }

    async fn fetch_first_page(&self, genre: Genre) {
        let (epoch, cancel) = {
            let mut state = self.state.lock();
            let epoch = state.reset(genre);
            state.is_loading_initial = true;
            (epoch, state.cancel.clone())
        };
        let _flight = InFlight {
            state: &self.state,
            epoch,
            stage: Stage::FirstPage,
        };

        tracing::debug!(%genre, epoch, "loading first page");
        let result = self.source.fetch_page(genre, 1, &cancel).await;

        let mut state = self.state.lock();
        if state.epoch != epoch {
            tracing::debug!(%genre, epoch, "discarding superseded first page");
            return;
        }
        match result {
            Ok(result) => {
                state.commit(1, result);
                tracing::debug!(%genre, items = state.items.len(), has_more = state.has_more, "loaded first page");
                self.store(&state);
            }
            Err(e) => {
                tracing::warn!(%genre, error = %e, "failed to load first page");
                state.fail(Stage::FirstPage, &e);
            }
        }
    }

    fn store(&self, state: &FeedState) {
        if let Some(cache) = &self.cache {
            cache.put(state.genre, state.to_cached());
        }
    }
}
