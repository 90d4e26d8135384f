//! crates/dashboard_core/src/slices/player.rs
//!
//! Audio player navigation. All actions are synchronous; the track id always
//! resolves in the injected playlist catalog.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{LoopMode, TrackId};
use crate::playlist::PlaylistCatalog;
use crate::store::Store;

pub const DEFAULT_VOLUME: f32 = 0.5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlayerError {
    #[error("No current track")]
    NoCurrentTrack,
    #[error("Unknown track '{0}'")]
    UnknownTrack(String),
    #[error("Unknown playlist '{0}'")]
    UnknownPlaylist(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerState {
    pub track_id: Option<TrackId>,
    pub browsing_playlist_id: String,
    pub loop_mode: LoopMode,
    pub volume: f32,
    /// Playback position in seconds.
    pub track_duration: f64,
    /// Total length of the current track in seconds.
    pub track_length: f64,
    pub is_playing: bool,
    pub is_loading: bool,
    pub is_playlist_open: bool,
    pub is_auto_play: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            track_id: Some(TrackId::new("0", 0)),
            browsing_playlist_id: "0".to_string(),
            loop_mode: LoopMode::Disabled,
            volume: DEFAULT_VOLUME,
            track_duration: 0.0,
            track_length: 0.0,
            is_playing: false,
            is_loading: false,
            is_playlist_open: true,
            is_auto_play: false,
        }
    }
}

impl PlayerState {
    /// Points the player at the catalog's first track if the current track or
    /// browsing playlist does not exist in `catalog`.
    pub(crate) fn ensure_track(&mut self, catalog: &PlaylistCatalog) {
        let resolves = self
            .track_id
            .as_ref()
            .is_some_and(|id| catalog.track(id).is_some());
        if !resolves {
            self.track_id = catalog.first_track().map(|t| t.id.clone());
        }
        if !catalog.contains_playlist(&self.browsing_playlist_id) {
            if let Some(first) = catalog.playlists().first() {
                self.browsing_playlist_id = first.id.clone();
            }
        }
    }

    /// Switches to `id`, stopped, with autoplay on.
    fn cue(&mut self, id: TrackId) {
        self.track_id = Some(id);
        self.is_playing = false;
        self.is_auto_play = true;
    }
}

pub struct PlayerSlice<'a> {
    store: &'a Store,
}

impl<'a> PlayerSlice<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn catalog(&self) -> &PlaylistCatalog {
        &self.store.services().playlists
    }

    /// Advances according to the loop mode:
    /// single repeats the track, all wraps within the playlist, disabled moves
    /// on to the next playlist after the last track.
    pub fn next_track(&self) -> Result<(), PlayerError> {
        let catalog = self.catalog();
        self.store.update(|s| -> Result<(), PlayerError> {
            let player = &mut s.player;
            let current = player.track_id.clone().ok_or(PlayerError::NoCurrentTrack)?;
            let (playlist, index) = catalog
                .locate(&current)
                .ok_or_else(|| PlayerError::UnknownTrack(current.to_string()))?;
            let is_last = index + 1 == playlist.tracks.len();

            match player.loop_mode {
                LoopMode::Single => player.cue(current),
                LoopMode::All if is_last => player.cue(playlist.tracks[0].id.clone()),
                LoopMode::Disabled if is_last => {
                    let next = catalog
                        .next_playlist(&playlist.id)
                        .ok_or_else(|| PlayerError::UnknownPlaylist(playlist.id.clone()))?;
                    player.browsing_playlist_id = next.id.clone();
                    player.cue(next.tracks[0].id.clone());
                }
                _ => player.cue(playlist.tracks[index + 1].id.clone()),
            }
            Ok(())
        })
    }

    /// Steps back one track; stays put on the first track of a playlist.
    pub fn previous_track(&self) -> Result<(), PlayerError> {
        let catalog = self.catalog();
        self.store.update(|s| -> Result<(), PlayerError> {
            let player = &mut s.player;
            let current = player.track_id.clone().ok_or(PlayerError::NoCurrentTrack)?;
            let (playlist, index) = catalog
                .locate(&current)
                .ok_or_else(|| PlayerError::UnknownTrack(current.to_string()))?;
            if index == 0 {
                debug!("Already at the first track of playlist {}", playlist.id);
                return Ok(());
            }
            player.cue(playlist.tracks[index - 1].id.clone());
            Ok(())
        })
    }

    /// Back to the first track of the current playlist, autoplay off.
    pub fn reset_playlist(&self) -> Result<(), PlayerError> {
        let catalog = self.catalog();
        self.store.update(|s| -> Result<(), PlayerError> {
            let player = &mut s.player;
            let current = player.track_id.clone().ok_or(PlayerError::NoCurrentTrack)?;
            let (playlist, _) = catalog
                .locate(&current)
                .ok_or_else(|| PlayerError::UnknownTrack(current.to_string()))?;
            player.track_id = Some(playlist.tracks[0].id.clone());
            player.is_playing = false;
            player.is_auto_play = false;
            Ok(())
        })
    }

    pub fn set_track(&self, id: TrackId) -> Result<(), PlayerError> {
        if self.catalog().track(&id).is_none() {
            return Err(PlayerError::UnknownTrack(id.to_string()));
        }
        self.store.update(|s| s.player.cue(id));
        Ok(())
    }

    pub fn set_browsing_playlist(&self, id: &str) -> Result<(), PlayerError> {
        if !self.catalog().contains_playlist(id) {
            return Err(PlayerError::UnknownPlaylist(id.to_string()));
        }
        self.store
            .update(|s| s.player.browsing_playlist_id = id.to_string());
        Ok(())
    }

    pub fn toggle_loop(&self) {
        self.store
            .update(|s| s.player.loop_mode = s.player.loop_mode.next());
    }

    /// Volume is clamped to `0.0..=1.0`; NaN is ignored.
    pub fn set_volume(&self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        self.store
            .update(|s| s.player.volume = volume.clamp(0.0, 1.0));
    }

    pub fn set_track_duration(&self, seconds: f64) {
        self.store.update(|s| s.player.track_duration = seconds);
    }

    pub fn set_track_length(&self, seconds: f64) {
        self.store.update(|s| s.player.track_length = seconds);
    }

    pub fn set_loading(&self, value: bool) {
        self.store.update(|s| s.player.is_loading = value);
    }

    pub fn set_playing(&self, value: bool) {
        self.store.update(|s| s.player.is_playing = value);
    }

    pub fn set_auto_play(&self, value: bool) {
        self.store.update(|s| s.player.is_auto_play = value);
    }

    pub fn set_playlist_open(&self, value: bool) {
        self.store.update(|s| s.player.is_playlist_open = value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fake_store;

    fn track(store: &Store) -> String {
        store.read(|s| s.player.track_id.as_ref().map(|t| t.to_string()).unwrap_or_default())
    }

    #[test]
    fn test_next_within_playlist() {
        let (store, _fake) = fake_store();
        store.player().set_playing(true);
        store.player().next_track().unwrap();

        assert_eq!(track(&store), "0_1");
        let player = store.state().player;
        assert!(!player.is_playing);
        assert!(player.is_auto_play);
    }

    #[test]
    fn test_single_loop_restarts_track() {
        let (store, _fake) = fake_store();
        store.player().set_track(TrackId::parse("0_3")).unwrap();
        store.player().toggle_loop();
        store.player().next_track().unwrap();
        assert_eq!(track(&store), "0_3");
    }

    #[test]
    fn test_loop_all_wraps_to_first_track() {
        let (store, _fake) = fake_store();
        store.player().set_track(TrackId::parse("0_5")).unwrap();
        store.player().toggle_loop();
        store.player().toggle_loop();
        assert_eq!(store.state().player.loop_mode, LoopMode::All);

        store.player().next_track().unwrap();
        assert_eq!(track(&store), "0_0");
        assert_eq!(store.state().player.browsing_playlist_id, "0");
    }

    #[test]
    fn test_disabled_moves_to_next_playlist() {
        let (store, _fake) = fake_store();
        store.player().set_track(TrackId::parse("0_5")).unwrap();
        store.player().next_track().unwrap();
        assert_eq!(track(&store), "1_0");
        assert_eq!(store.state().player.browsing_playlist_id, "1");

        // Wraps from the last playlist back to the first.
        store.player().set_track(TrackId::parse("1_3")).unwrap();
        store.player().next_track().unwrap();
        assert_eq!(track(&store), "0_0");
        assert_eq!(store.state().player.browsing_playlist_id, "0");
    }

    #[test]
    fn test_previous_track_stops_at_first() {
        let (store, _fake) = fake_store();
        let before = store.state();
        store.player().previous_track().unwrap();
        assert_eq!(store.state(), before);

        store.player().set_track(TrackId::parse("1_2")).unwrap();
        store.player().previous_track().unwrap();
        assert_eq!(track(&store), "1_1");
    }

    #[test]
    fn test_reset_playlist_disables_autoplay() {
        let (store, _fake) = fake_store();
        store.player().set_track(TrackId::parse("1_2")).unwrap();
        store.player().reset_playlist().unwrap();
        assert_eq!(track(&store), "1_0");
        assert!(!store.state().player.is_auto_play);
    }

    #[test]
    fn test_unknown_ids_rejected() {
        let (store, _fake) = fake_store();
        assert_eq!(
            store.player().set_track(TrackId::parse("0_9")),
            Err(PlayerError::UnknownTrack("0_9".to_string()))
        );
        assert!(store.player().set_browsing_playlist("5").is_err());
        assert_eq!(track(&store), "0_0");

        store.player().set_browsing_playlist("1").unwrap();
        assert_eq!(store.state().player.browsing_playlist_id, "1");
    }

    #[test]
    fn test_volume_is_clamped() {
        let (store, _fake) = fake_store();
        store.player().set_volume(1.7);
        assert_eq!(store.state().player.volume, 1.0);
        store.player().set_volume(-0.3);
        assert_eq!(store.state().player.volume, 0.0);
        store.player().set_volume(f32::NAN);
        assert_eq!(store.state().player.volume, 0.0);
    }

    #[test]
    fn test_setters() {
        let (store, _fake) = fake_store();
        store.player().set_track_duration(12.5);
        store.player().set_track_length(180.0);
        store.player().set_loading(true);
        store.player().set_auto_play(true);
        store.player().set_playlist_open(false);

        let player = store.state().player;
        assert_eq!(player.track_duration, 12.5);
        assert_eq!(player.track_length, 180.0);
        assert!(player.is_loading);
        assert!(player.is_auto_play);
        assert!(!player.is_playlist_open);
    }
}
