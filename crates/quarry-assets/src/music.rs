//! Playlists of music tracks.

use crate::error::AssetResult;
use crate::handle::{Handle, Music};
use crate::manager::ResourceManager;
use crate::resource::ResourceState;

/// An ordered list of music tracks.
///
/// Playback starts with the first track, so the list counts as loaded as soon
/// as that one is, while the rest may still be on the load queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MusicList {
    tracks: Vec<Handle<Music>>,
}

impl MusicList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up every track by filename.
    pub fn from_names<'a>(
        manager: &ResourceManager,
        names: impl IntoIterator<Item = &'a str>,
    ) -> AssetResult<Self> {
        let tracks = names
            .into_iter()
            .map(|name| manager.get::<Music>(name))
            .collect::<AssetResult<_>>()?;
        Ok(Self { tracks })
    }

    /// Append a track.
    pub fn push(&mut self, track: Handle<Music>) {
        self.tracks.push(track);
    }

    /// The tracks in play order.
    pub fn tracks(&self) -> &[Handle<Music>] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Check if the first track is loaded. An empty list is never loaded.
    pub fn is_loaded(&self, manager: &ResourceManager) -> bool {
        self.tracks
            .first()
            .is_some_and(|&first| manager.state(first) == ResourceState::Loaded)
    }

    /// Load every track, or queue them during load screen preparation.
    ///
    /// Stops at the first track that fails to load immediately.
    pub fn load(&self, manager: &mut ResourceManager) -> AssetResult<()> {
        for &track in &self.tracks {
            manager.load_handle(track)?;
        }
        Ok(())
    }
}
