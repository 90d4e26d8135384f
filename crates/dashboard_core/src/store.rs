//! crates/dashboard_core/src/store.rs
//!
//! The central store: one `DashboardState` made of the slice partitions, the
//! injected collaborators, and a `watch` channel that notifies subscribers.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::persist::{PersistError, Snapshot, PERSIST_SCHEMA};
use crate::playlist::PlaylistCatalog;
use crate::ports::{
    AirQualityService, Clock, FactService, LightService, NewsService, NotesService, PortError,
    SnapshotStore,
};
use crate::slices::{
    AirQualitySlice, AirQualityState, FactsSlice, FactsState, LayoutSlice, LayoutState,
    LightSlice, LightState, NewsSlice, NewsState, NotesSlice, NotesState, PlayerSlice,
    PlayerState,
};

//=========================================================================================
// State
//=========================================================================================

/// The whole client-side state, one field per slice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardState {
    pub air_quality: AirQualityState,
    pub facts: FactsState,
    pub layout: LayoutState,
    pub light: LightState,
    pub news: NewsState,
    pub notes: NotesState,
    pub player: PlayerState,
}

//=========================================================================================
// Collaborators
//=========================================================================================

/// Everything the slices call out to. Cloning is cheap.
#[derive(Clone)]
pub struct Services {
    pub air_quality: Arc<dyn AirQualityService>,
    pub facts: Arc<dyn FactService>,
    pub light: Arc<dyn LightService>,
    pub news: Arc<dyn NewsService>,
    pub notes: Arc<dyn NotesService>,
    pub clock: Arc<dyn Clock>,
    pub playlists: Arc<PlaylistCatalog>,
}

//=========================================================================================
// Store
//=========================================================================================

pub struct Store {
    state: Mutex<DashboardState>,
    watcher_tx: watch::Sender<DashboardState>,
    services: Services,
}

impl Store {
    pub fn new(mut initial: DashboardState, services: Services) -> Self {
        initial.player.ensure_track(&services.playlists);
        let (watcher_tx, _watcher_rx) = watch::channel(initial.clone());
        Self {
            state: Mutex::new(initial),
            watcher_tx,
            services,
        }
    }

    pub fn with_defaults(services: Services) -> Self {
        Self::new(DashboardState::default(), services)
    }

    pub(crate) fn services(&self) -> &Services {
        &self.services
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        // A panicking reader cannot leave the state half-written, so a
        // poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A clone of the current state.
    pub fn state(&self) -> DashboardState {
        self.lock().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        f(&self.lock())
    }

    /// Applies `mutation_fn` while the state lock is held and notifies
    /// subscribers if anything changed. Never call this across an `.await`.
    pub fn update<R>(&self, mutation_fn: impl FnOnce(&mut DashboardState) -> R) -> R {
        let mut state = self.lock();
        let output = mutation_fn(&mut state);

        self.watcher_tx.send_if_modified(|current| {
            let modified = current != &*state;
            if modified {
                *current = state.clone();
            }
            modified
        });

        output
    }

    pub fn subscribe(&self) -> StoreSubscription {
        StoreSubscription {
            rx: self.watcher_tx.subscribe(),
        }
    }

    /// Restores every slice to its default values.
    pub fn reset(&self) {
        self.update(|state| {
            *state = DashboardState::default();
            state.player.ensure_track(&self.services.playlists);
        });
    }

    //=====================================================================================
    // Persistence
    //=====================================================================================

    pub fn snapshot(&self) -> Result<Snapshot, PersistError> {
        PERSIST_SCHEMA.capture(&self.lock())
    }

    /// Replaces the state with defaults overlaid by the snapshot's persisted
    /// fields. Must run before any action is invoked.
    pub fn restore(&self, snapshot: Snapshot) -> Result<(), PersistError> {
        let mut restored = PERSIST_SCHEMA.restore(snapshot)?;
        restored.player.ensure_track(&self.services.playlists);
        self.update(|state| *state = restored);
        Ok(())
    }

    /// Loads and restores from `snapshots`. A missing snapshot leaves the
    /// defaults in place; an unreadable one is logged and ignored.
    pub fn restore_from(&self, snapshots: &dyn SnapshotStore) -> Result<bool, PortError> {
        let Some(snapshot) = snapshots.load()? else {
            info!("No saved snapshot, starting from defaults");
            return Ok(false);
        };
        match self.restore(snapshot) {
            Ok(()) => {
                info!("Store restored from snapshot");
                Ok(true)
            }
            Err(e) => {
                warn!("Ignoring saved snapshot: {}", e);
                Ok(false)
            }
        }
    }

    pub fn persist_to(&self, snapshots: &dyn SnapshotStore) -> Result<(), PortError> {
        let snapshot = self
            .snapshot()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        snapshots.save(&snapshot)
    }

    //=====================================================================================
    // Slice handles
    //=====================================================================================

    pub fn air_quality(&self) -> AirQualitySlice<'_> {
        AirQualitySlice::new(self)
    }

    pub fn facts(&self) -> FactsSlice<'_> {
        FactsSlice::new(self)
    }

    pub fn layout(&self) -> LayoutSlice<'_> {
        LayoutSlice::new(self)
    }

    pub fn light(&self) -> LightSlice<'_> {
        LightSlice::new(self)
    }

    pub fn news(&self) -> NewsSlice<'_> {
        NewsSlice::new(self)
    }

    pub fn notes(&self) -> NotesSlice<'_> {
        NotesSlice::new(self)
    }

    pub fn player(&self) -> PlayerSlice<'_> {
        PlayerSlice::new(self)
    }
}

//=========================================================================================
// Subscriptions
//=========================================================================================

pub struct StoreSubscription {
    rx: watch::Receiver<DashboardState>,
}

impl StoreSubscription {
    pub fn current(&self) -> DashboardState {
        self.rx.borrow().clone()
    }

    /// Waits for the next state change. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Narrows the subscription to a projection of the state; only changes of
    /// that projection are reported.
    pub fn select<T, F>(mut self, selector: F) -> Selection<T, F>
    where
        T: PartialEq,
        F: Fn(&DashboardState) -> T,
    {
        let last = selector(&self.rx.borrow_and_update());
        Selection {
            rx: self.rx,
            selector,
            last,
        }
    }
}

pub struct Selection<T, F> {
    rx: watch::Receiver<DashboardState>,
    selector: F,
    last: T,
}

impl<T, F> Selection<T, F>
where
    T: PartialEq,
    F: Fn(&DashboardState) -> T,
{
    pub fn get(&self) -> &T {
        &self.last
    }

    /// Waits until the selected value differs from the last one seen.
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<&T> {
        loop {
            self.rx.changed().await.ok()?;
            let next = (self.selector)(&self.rx.borrow_and_update());
            if next != self.last {
                self.last = next;
                return Some(&self.last);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fake_store, FakeServices};
    use std::time::Duration;

    #[test]
    fn test_default_state() {
        let (store, _fake) = fake_store();
        let state = store.state();
        assert!(state.layout.is_extra_column);
        assert_eq!(state.player.track_id.as_ref().map(|t| t.as_str()), Some("0_0"));
        assert_eq!(state.player.browsing_playlist_id, "0");
        assert!(state.notes.folders.is_empty());
        assert!(state.air_quality.reading.is_none());
    }

    #[tokio::test]
    async fn test_unchanged_update_does_not_notify() {
        let (store, _fake) = fake_store();
        let mut sub = store.subscribe();

        store.update(|s| s.layout.is_extra_column = true);
        let waited = tokio::time::timeout(Duration::from_millis(20), sub.changed()).await;
        assert!(waited.is_err(), "no-op update must not notify");

        store.update(|s| s.layout.is_extra_column = false);
        assert!(sub.changed().await);
        assert!(!sub.current().layout.is_extra_column);
    }

    #[tokio::test]
    async fn test_select_ignores_unrelated_changes() {
        let (store, _fake) = fake_store();
        let store = Arc::new(store);
        let mut volume = store.subscribe().select(|s| s.player.volume);

        let writer = Arc::clone(&store);
        let task = tokio::spawn(async move {
            writer.layout().toggle_extra_column();
            writer.player().set_volume(0.2);
        });

        assert_eq!(volume.changed().await.copied(), Some(0.2));
        task.await.unwrap();
    }

    #[test]
    fn test_reset_restores_defaults() {
        let (store, _fake) = fake_store();
        store.layout().toggle_extra_column();
        store.player().toggle_loop();
        store.reset();
        assert_eq!(store.state(), DashboardState::default());
    }

    #[test]
    fn test_new_repairs_unknown_track() {
        let fake = FakeServices::new();
        let mut initial = DashboardState::default();
        initial.player.track_id = Some(crate::domain::TrackId::parse("9_9"));
        let store = Store::new(initial, fake.services());
        assert_eq!(
            store.read(|s| s.player.track_id.clone()).map(|t| t.to_string()),
            Some("0_0".to_string())
        );
    }

    #[test]
    fn test_snapshot_restore_through_store() {
        let (store, _fake) = fake_store();
        store.layout().toggle_extra_column();
        store.player().set_volume(0.8);
        store.update(|s| s.air_quality.is_fetching = true);
        let snapshot = store.snapshot().unwrap();

        let (fresh, _fake) = fake_store();
        fresh.restore(snapshot).unwrap();
        let state = fresh.state();
        assert!(!state.layout.is_extra_column);
        assert_eq!(state.player.volume, 0.8);
        assert!(!state.air_quality.is_fetching, "in-flight flags are not persisted");
    }
}
