//! crates/dashboard_core/src/playlist.rs
//!
//! The ordered catalog of playlists the audio player can navigate.

use crate::domain::{Track, TrackId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub id: String,
    pub tracks: Vec<Track>,
}

/// Playlists in navigation order. Every track id is `<playlist>_<index>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistCatalog {
    playlists: Vec<Playlist>,
}

impl PlaylistCatalog {
    /// Builds a catalog, dropping playlists without tracks.
    pub fn new(playlists: Vec<Playlist>) -> Self {
        Self {
            playlists: playlists
                .into_iter()
                .filter(|p| !p.tracks.is_empty())
                .collect(),
        }
    }

    /// The tracks shipped with the dashboard.
    pub fn builtin() -> Self {
        let playlist = |id: &str, artist: &str, first_file: usize, titles: &[&str]| Playlist {
            id: id.to_string(),
            tracks: titles
                .iter()
                .enumerate()
                .map(|(index, title)| Track {
                    id: TrackId::new(id, index),
                    index,
                    title: title.to_string(),
                    artist: artist.to_string(),
                    file_name: format!("audio_{}", first_file + index),
                })
                .collect(),
        };

        Self::new(vec![
            playlist(
                "0",
                "OS",
                1,
                &["Soft", "Inspirational", "Ambient", "Advertising", "Corporate", "Calm"],
            ),
            playlist("1", "NastelBom", 7, &["Motivation", "Dream", "Technology", "Epic"]),
        ])
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn playlist(&self, id: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    pub fn contains_playlist(&self, id: &str) -> bool {
        self.playlist(id).is_some()
    }

    pub fn track(&self, id: &TrackId) -> Option<&Track> {
        self.playlist(id.playlist_id())?
            .tracks
            .iter()
            .find(|t| &t.id == id)
    }

    /// The tracks of the playlist `id` belongs to, with its position.
    pub fn locate(&self, id: &TrackId) -> Option<(&Playlist, usize)> {
        let playlist = self.playlist(id.playlist_id())?;
        let position = playlist.tracks.iter().position(|t| &t.id == id)?;
        Some((playlist, position))
    }

    /// The playlist after `id`, wrapping around to the first.
    pub fn next_playlist(&self, id: &str) -> Option<&Playlist> {
        let position = self.playlists.iter().position(|p| p.id == id)?;
        self.playlists.get((position + 1) % self.playlists.len())
    }

    pub fn first_track(&self) -> Option<&Track> {
        self.playlists.first()?.tracks.first()
    }
}

impl Default for PlaylistCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = PlaylistCatalog::builtin();
        assert_eq!(catalog.playlists().len(), 2);
        assert_eq!(catalog.playlist("0").unwrap().tracks.len(), 6);
        assert_eq!(catalog.playlist("1").unwrap().tracks.len(), 4);

        let epic = catalog.track(&TrackId::parse("1_3")).unwrap();
        assert_eq!(epic.title, "Epic");
        assert_eq!(epic.file_name, "audio_10");
        assert_eq!(catalog.first_track().unwrap().id.as_str(), "0_0");
    }

    #[test]
    fn test_next_playlist_wraps() {
        let catalog = PlaylistCatalog::builtin();
        assert_eq!(catalog.next_playlist("0").unwrap().id, "1");
        assert_eq!(catalog.next_playlist("1").unwrap().id, "0");
        assert!(catalog.next_playlist("7").is_none());
    }

    #[test]
    fn test_unknown_tracks_do_not_resolve() {
        let catalog = PlaylistCatalog::builtin();
        assert!(catalog.track(&TrackId::parse("0_6")).is_none());
        assert!(catalog.locate(&TrackId::parse("2_0")).is_none());
        assert_eq!(catalog.locate(&TrackId::parse("0_4")).unwrap().1, 4);
    }
}
