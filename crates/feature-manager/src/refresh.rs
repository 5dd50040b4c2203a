//! # Refresh Coordinator
//!
//! Keeps the cached [`FeatureDocument`] fresh.
//!
//! * A lookup against an unexpired cache returns the cached document without
//!   any I/O.
//! * An expired cache (or a forced refresh) starts exactly one refresh. Every
//!   caller arriving while it runs, forced or not, joins that refresh and
//!   receives the same outcome.
//! * A refresh builds the new document completely before swapping it in. A
//!   failed fetch or parse leaves the previous document and its expiry as
//!   they were.
//!
//! The cache starts empty and expired at the Unix epoch, so the first lookup
//! always fetches.

use crate::document::{FeatureDocument, parse_document};
use crate::error::FeatureManagerError;
use crate::source::SourceReader;
use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tracing::{debug, instrument, warn};

type RefreshResult = Result<Arc<FeatureDocument>, FeatureManagerError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// Last good document, its expiry and the refresh currently running.
struct CacheState {
    document: Arc<FeatureDocument>,
    expires_at: DateTime<Utc>,
    in_flight: Option<SharedRefresh>,
}

impl CacheState {
    fn new() -> Self {
        Self {
            document: Arc::new(FeatureDocument::default()),
            expires_at: DateTime::<Utc>::UNIX_EPOCH,
            in_flight: None,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

enum Action {
    Return(Arc<FeatureDocument>),
    Join(SharedRefresh),
    Lead(SharedRefresh),
}

pub(crate) fn expiry_after(now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
    i64::try_from(ttl_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Coordinates refreshes of one cached feature document.
pub struct RefreshCoordinator {
    reader: Arc<dyn SourceReader>,
    ttl_seconds: u64,
    state: Arc<Mutex<CacheState>>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("RefreshCoordinator")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("features", &state.document.len())
            .field("expires_at", &state.expires_at)
            .field("refresh_in_flight", &state.in_flight.is_some())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(reader: Arc<dyn SourceReader>, ttl_seconds: u64) -> Self {
        Self {
            reader,
            ttl_seconds,
            state: Arc::new(Mutex::new(CacheState::new())),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the current document, refreshing it first when it has expired
    /// or when `force` is set.
    ///
    /// Inside a Tokio runtime the refresh is driven by a spawned task. Without
    /// one it runs on the calling task, and the next caller resumes it if that
    /// task is dropped.
    #[instrument(skip(self))]
    pub async fn ensure_fresh(&self, force: bool) -> RefreshResult {
        let action = {
            let mut state = self.lock_state();
            if let Some(in_flight) = &state.in_flight {
                debug!("Joining in-flight refresh");
                Action::Join(in_flight.clone())
            } else if force || state.is_expired(Utc::now()) {
                debug!(force, "Starting refresh");
                let refresh = self.refresh();
                state.in_flight = Some(refresh.clone());
                Action::Lead(refresh)
            } else {
                Action::Return(Arc::clone(&state.document))
            }
        };

        match action {
            Action::Return(document) => Ok(document),
            Action::Join(refresh) => refresh.await,
            Action::Lead(refresh) => {
                // The spawned driver finishes the refresh even if every caller goes away.
                match Handle::try_current() {
                    Ok(handle) => drop(handle.spawn(refresh.clone())),
                    Err(_) => debug!("No Tokio runtime, refreshing on the calling task"),
                }
                refresh.await
            }
        }
    }

    /// The cached document, if it has not expired. Never performs I/O.
    pub fn snapshot(&self) -> RefreshResult {
        let state = self.lock_state();
        if state.is_expired(Utc::now()) {
            return Err(FeatureManagerError::NotInitialized);
        }
        Ok(Arc::clone(&state.document))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.lock_state().expires_at
    }

    fn refresh(&self) -> SharedRefresh {
        let reader = Arc::clone(&self.reader);
        let state = Arc::clone(&self.state);
        let ttl_seconds = self.ttl_seconds;

        async move {
            let result = match reader.fetch().await {
                Ok(raw) => parse_document(&raw).map(Arc::new),
                Err(e) => Err(e),
            };

            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.in_flight = None;
            match result {
                Ok(document) => {
                    state.document = Arc::clone(&document);
                    state.expires_at = expiry_after(Utc::now(), ttl_seconds);
                    debug!(
                        features = document.len(),
                        expires_at = %state.expires_at,
                        "Feature document refreshed"
                    );
                    Ok(document)
                }
                Err(e) => {
                    warn!(error = %e, "Refresh failed, keeping previous feature document");
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }
}
