//! JSON loading for controller definitions and tracks.

use serde::Deserialize;

use crate::data::AnimTrack;
use crate::def::ControllerDef;
use crate::error::GraphError;
use crate::library::TrackLibrary;

/// Parse a controller definition. Name resolution happens when the controller is built.
pub fn parse_controller_json(s: &str) -> Result<ControllerDef, GraphError> {
    let def: ControllerDef = serde_json::from_str(s)?;
    Ok(def)
}

/// Parse and validate a single track.
pub fn parse_track_json(s: &str) -> Result<AnimTrack, GraphError> {
    let track: AnimTrack = serde_json::from_str(s)?;
    track.validate()?;
    Ok(track)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TrackBundle {
    List(Vec<AnimTrack>),
    Wrapped { tracks: Vec<AnimTrack> },
}

/// Parse an array of tracks (or `{ "tracks": [...] }`) into a library keyed by track name.
pub fn parse_library_json(s: &str) -> Result<TrackLibrary, GraphError> {
    let tracks = match serde_json::from_str::<TrackBundle>(s)? {
        TrackBundle::List(tracks) | TrackBundle::Wrapped { tracks } => tracks,
    };
    let mut lib = TrackLibrary::new();
    for track in tracks {
        lib.insert(track)?;
    }
    Ok(lib)
}
