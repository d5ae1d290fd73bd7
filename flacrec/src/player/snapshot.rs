//! Parsed player status
//!
//! One [`TrackSnapshot`] is produced per poll of the player's `/current`
//! endpoint. A typical response:
//!
//! ```json
//! {"title": "Forgiven", "artists": "Alexis Ffrench", "album": "",
//!  "status": "playing", "url": "https://tidal.com/browse/track/94072682?u",
//!  "currentInSeconds": 5, "durationInSeconds": 0,
//!  "image": "https://resources.tidal.com/images/72cb7592/.../640x640.jpg",
//!  "artist": "Alexis Ffrench"}
//! ```
//!
//! Missing or wrongly typed fields become empty strings or `None`.

use serde_json::{Map, Value};

/// Path segment that precedes the numeric track id in player URLs
const TRACK_SEGMENT: &str = "track/";

/// Characters replaced when building file names
const RESERVED_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// One parsed playback-status poll result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackSnapshot {
    pub title: String,
    /// Display artist string (used for the file name)
    pub artists: String,
    /// Artist tag value
    pub artist: String,
    pub album: String,
    /// Cover art URL
    pub image: String,
    pub status: String,
    pub url: String,
    /// Numeric id parsed from `url`, if present
    pub track_id: Option<String>,
    /// Informational only
    pub current_secs: Option<u64>,
    /// Informational only
    pub duration_secs: Option<u64>,
}

impl TrackSnapshot {
    /// Build a snapshot from the player's JSON body
    ///
    /// Returns `None` for `null`, non-objects and empty objects (player idle).
    pub fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.is_empty() {
            return None;
        }

        let artists = str_field(map, "artists");
        let artist = str_field(map, "artist");
        let url = str_field(map, "url");

        Some(Self {
            title: str_field(map, "title"),
            // Each artist field falls back to the other
            artists: if artists.is_empty() { artist.clone() } else { artists.clone() },
            artist: if artist.is_empty() { artists } else { artist },
            album: str_field(map, "album"),
            image: str_field(map, "image"),
            status: str_field(map, "status"),
            track_id: extract_track_id(&url),
            url,
            current_secs: map.get("currentInSeconds").and_then(Value::as_u64),
            duration_secs: map.get("durationInSeconds").and_then(Value::as_u64),
        })
    }

    /// Human-readable "title - artists" label
    pub fn label(&self) -> String {
        format!("{} - {}", self.title, self.artists)
    }

    /// File name (without extension) for this track's finished recording
    pub fn base_name(&self) -> String {
        sanitize_file_name(&self.label())
    }
}

fn str_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// Extract the numeric id following `track/` in a player URL
///
/// `https://tidal.com/browse/track/94072682?u` → `Some("94072682")`.
/// The first `track/` followed by at least one digit wins.
pub fn extract_track_id(url: &str) -> Option<String> {
    url.match_indices(TRACK_SEGMENT).find_map(|(idx, _)| {
        let rest = &url[idx + TRACK_SEGMENT.len()..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        (!digits.is_empty()).then_some(digits)
    })
}

/// Make a string safe to use as a single path component
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if RESERVED_FILENAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = cleaned.trim().trim_matches('.').trim();
    if trimmed.is_empty() || trimmed == "-" {
        "Unknown".to_string()
    } else {
        trimmed.to_string()
    }
}
