//! services/dashboard/src/refresh.rs
//!
//! Background workers that keep the store warm: the refresh loop that
//! re-fetches widget data once its cache goes stale, and the persister that
//! writes a snapshot whenever a persisted field changes.

use dashboard_core::{
    domain::UserId,
    messages::{DATA_ERROR, FACT_ERROR},
    persist::{Snapshot, PERSIST_SCHEMA},
    ports::{Clock, SnapshotStore},
    staleness::{
        allow_air_quality_update, allow_light_update, allow_news_update, allow_notes_update,
    },
    FetchOutcome, Store,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What one refresh pass did per widget. `None` means the cache was fresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub air_quality: Option<FetchOutcome>,
    pub light: Option<FetchOutcome>,
    pub notes: Option<FetchOutcome>,
    pub fact_pool: Option<FetchOutcome>,
    pub fact: Option<FetchOutcome>,
    pub news_data: Option<FetchOutcome>,
    pub hacker_news: Option<FetchOutcome>,
}

pub struct Refresher {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    user_id: UserId,
}

fn log_outcome(widget: &str, outcome: FetchOutcome) -> FetchOutcome {
    match outcome {
        FetchOutcome::Fetched => debug!("{} refreshed", widget),
        FetchOutcome::Skipped => debug!("{} refresh already in flight", widget),
        FetchOutcome::Failed => warn!("{} refresh failed: {}", widget, DATA_ERROR),
    }
    outcome
}

impl Refresher {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>, user_id: UserId) -> Self {
        Self {
            store,
            clock,
            user_id,
        }
    }

    async fn refresh_air_quality(&self) -> Option<FetchOutcome> {
        let now = self.clock.now();
        let allowed = self.store.read(|s| {
            allow_air_quality_update(s.air_quality.reading.as_ref(), s.air_quality.timestamp, now)
        });
        if !allowed {
            return None;
        }
        Some(log_outcome("Air quality", self.store.air_quality().fetch().await))
    }

    async fn refresh_light(&self) -> Option<FetchOutcome> {
        let now = self.clock.now();
        let allowed = self
            .store
            .read(|s| allow_light_update(s.light.data.as_ref(), s.light.timestamp, now));
        if !allowed {
            return None;
        }
        Some(log_outcome("Light schedule", self.store.light().fetch().await))
    }

    async fn refresh_notes(&self) -> Option<FetchOutcome> {
        let now = self.clock.now();
        let allowed = self
            .store
            .read(|s| allow_notes_update(&s.notes.folders, s.notes.timestamp, now));
        if !allowed {
            return None;
        }
        let notes = self.store.notes();
        notes.reset_initialized();
        Some(log_outcome("Folders", notes.fetch_folders(&self.user_id).await))
    }

    /// Refills an empty pool, then rotates to a new fact.
    async fn refresh_fact(&self) -> (Option<FetchOutcome>, Option<FetchOutcome>) {
        let facts = self.store.facts();
        let pool_outcome = if self.store.read(|s| s.facts.pool.is_empty()) {
            Some(log_outcome("Fact pool", facts.fetch_fact_ids().await))
        } else {
            None
        };

        let fact_outcome = facts.next_fact().await;
        if fact_outcome == FetchOutcome::Failed {
            warn!("Fact rotation failed: {}", FACT_ERROR);
        }
        (pool_outcome, Some(fact_outcome))
    }

    async fn refresh_news(&self) -> (Option<FetchOutcome>, Option<FetchOutcome>) {
        let now = self.clock.now();
        let (news_data_allowed, hacker_news_allowed) = self.store.read(|s| {
            let news = &s.news;
            (
                allow_news_update(
                    news.news_data_articles.as_deref(),
                    news.news_data_timestamp,
                    now,
                ),
                allow_news_update(
                    news.hacker_news_articles.as_deref(),
                    news.hacker_news_timestamp,
                    now,
                ),
            )
        });
        let news = self.store.news();
        let news_data = async {
            if !news_data_allowed {
                return None;
            }
            Some(log_outcome("NewsData", news.fetch_news_data().await))
        };
        let hacker_news = async {
            if !hacker_news_allowed {
                return None;
            }
            Some(log_outcome("Hacker News", news.fetch_hacker_news().await))
        };
        tokio::join!(news_data, hacker_news)
    }

    /// Runs one pass over every widget; the widgets refresh concurrently.
    pub async fn refresh_once(&self) -> RefreshReport {
        let (air_quality, light, notes, (fact_pool, fact), (news_data, hacker_news)) = tokio::join!(
            self.refresh_air_quality(),
            self.refresh_light(),
            self.refresh_notes(),
            self.refresh_fact(),
            self.refresh_news(),
        );
        RefreshReport {
            air_quality,
            light,
            notes,
            fact_pool,
            fact,
            news_data,
            hacker_news,
        }
    }

    /// Refreshes every `tick` until cancelled. The first pass runs immediately.
    pub async fn run(self, tick: Duration, cancellation_token: CancellationToken) {
        info!("Refresh loop started, tick {:?}", tick);
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = interval.tick() => {
                    let report = self.refresh_once().await;
                    debug!("Refresh pass finished: {:?}", report);
                }
            }
        }
        info!("Refresh loop stopped.");
    }
}

/// Writes on the blocking pool; the snapshot store does file I/O.
async fn save_snapshot(snapshots: &Arc<dyn SnapshotStore>, snapshot: Snapshot) {
    let snapshots = snapshots.clone();
    match tokio::task::spawn_blocking(move || snapshots.save(&snapshot)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Failed to save snapshot: {}", e),
        Err(e) => error!("Snapshot writer panicked: {}", e),
    }
}

/// Saves a snapshot every time the persisted projection of the state changes.
/// Saves run one at a time, so a burst of changes is written in order.
pub async fn run_persister(
    store: Arc<Store>,
    snapshots: Arc<dyn SnapshotStore>,
    cancellation_token: CancellationToken,
) {
    let mut persisted = store
        .subscribe()
        .select(|state| PERSIST_SCHEMA.capture(state).ok());

    loop {
        let snapshot = tokio::select! {
            _ = cancellation_token.cancelled() => break,
            changed = persisted.changed() => match changed {
                Some(snapshot) => snapshot.clone(),
                None => break,
            },
        };
        match snapshot {
            Some(snapshot) => save_snapshot(&snapshots, snapshot).await,
            None => error!("Failed to capture snapshot"),
        }
    }
    info!("Persister stopped.");
}
