use std::fmt;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::utils;

/// Prefix shared by every canonical track identifier.
pub const TRACK_URI_PREFIX: &str = "spotify:track:";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSecret {
    pub id: String,
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: String,
}

/// Canonical catalog identifier, always of the form `spotify:track:<id>`.
///
/// Deserialization goes through [`TryFrom<String>`], so a payload carrying any
/// other kind of uri fails to decode instead of producing a `TrackUri`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TrackUri(String);

impl TrackUri {
    /// Accepts the string only if it carries the canonical prefix.
    pub fn parse(value: &str) -> Option<Self> {
        if utils::is_canonical(value) {
            Some(Self(value.to_string()))
        } else {
            None
        }
    }

    pub fn from_id(id: &str) -> Self {
        Self(format!("{TRACK_URI_PREFIX}{id}"))
    }

    /// The bare catalog id without the prefix.
    pub fn id(&self) -> &str {
        self.0.strip_prefix(TRACK_URI_PREFIX).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TrackUri {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if utils::is_canonical(&value) {
            Ok(Self(value))
        } else {
            Err(format!("not a track uri: \"{}\"", value))
        }
    }
}

impl From<TrackUri> for String {
    fn from(uri: TrackUri) -> Self {
        uri.0
    }
}

impl fmt::Display for TrackUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackReference {
    Canonical(TrackUri),
    Query(String),
}

impl TrackReference {
    pub fn parse(value: &str) -> Self {
        match TrackUri::parse(value) {
            Some(uri) => TrackReference::Canonical(uri),
            None => TrackReference::Query(value.to_string()),
        }
    }

    pub fn parse_all<S: AsRef<str>>(values: &[S]) -> Vec<Self> {
        values.iter().map(|v| Self::parse(v.as_ref())).collect()
    }
}

impl fmt::Display for TrackReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackReference::Canonical(uri) => write!(f, "{uri}"),
            TrackReference::Query(query) => f.write_str(query),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub id: String,
    pub uri: TrackUri,
    pub name: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub tracks: Paging<SearchTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTrack {
    pub id: String,
    pub name: String,
    pub uri: TrackUri,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeveralTracksResponse {
    pub tracks: Vec<Option<TrackMetadata>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub uri: TrackUri,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub analysis: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_restricted: bool,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayRequest {
    pub uris: Vec<TrackUri>,
}

/// Tracks in playback order with their summed duration. Built once before
/// the countdown starts and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackPlan {
    tracks: Vec<TrackMetadata>,
    total_ms: u64,
}

impl PlaybackPlan {
    pub fn new(tracks: Vec<TrackMetadata>) -> Self {
        let total_ms = tracks.iter().map(|t| t.duration_ms).sum();
        Self { tracks, total_ms }
    }

    pub fn tracks(&self) -> &[TrackMetadata] {
        &self.tracks
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn durations(&self) -> Vec<u64> {
        self.tracks.iter().map(|t| t.duration_ms).collect()
    }

    pub fn table_rows(&self) -> Vec<PlanTableRow> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(i, t)| PlanTableRow {
                position: i + 1,
                name: t.name.clone(),
                uri: t.uri.to_string(),
                duration: utils::format_duration_ms(t.duration_ms),
            })
            .collect()
    }
}

#[derive(Tabled)]
pub struct PlanTableRow {
    pub position: usize,
    pub name: String,
    pub uri: String,
    pub duration: String,
}

/// Query parameters delivered to the authorization callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state: Option<String>,
}
