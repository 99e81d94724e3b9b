//! Track providers.
//!
//! The controller never loads data itself; it asks a provider for already-parsed tracks by
//! key while it is being built.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::data::AnimTrack;
use crate::error::GraphError;

/// Source of immutable tracks keyed by asset identity.
pub trait TrackProvider {
    fn track(&self, key: &str) -> Option<Arc<AnimTrack>>;
}

impl<F> TrackProvider for F
where
    F: Fn(&str) -> Option<Arc<AnimTrack>>,
{
    fn track(&self, key: &str) -> Option<Arc<AnimTrack>> {
        self(key)
    }
}

/// In-memory track store.
#[derive(Clone, Debug, Default)]
pub struct TrackLibrary {
    tracks: HashMap<String, Arc<AnimTrack>>,
}

impl TrackLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store `track` under its own name.
    pub fn insert(&mut self, track: AnimTrack) -> Result<Arc<AnimTrack>, GraphError> {
        let key = track.name.clone();
        self.insert_as(key, track)
    }

    /// Validate and store `track` under `key`, replacing any previous entry.
    pub fn insert_as(
        &mut self,
        key: impl Into<String>,
        track: AnimTrack,
    ) -> Result<Arc<AnimTrack>, GraphError> {
        track.validate()?;
        let track = Arc::new(track);
        self.tracks.insert(key.into(), track.clone());
        Ok(track)
    }

    pub fn get(&self, key: &str) -> Option<&Arc<AnimTrack>> {
        self.tracks.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<AnimTrack>> {
        self.tracks.remove(key)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }
}

impl TrackProvider for TrackLibrary {
    fn track(&self, key: &str) -> Option<Arc<AnimTrack>> {
        self.tracks.get(key).cloned()
    }
}
