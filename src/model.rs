/// Shared data structures for the engine
///
/// These structs represent the data model that flows between
/// the repository layer and the view state.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of media asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
}

/// GPS position attached to a photo. Latitude and longitude are always
/// co-present; a photo either has a position or it doesn't.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Camera metadata extracted from EXIF.
///
/// Carried as one optional block on `Photo` so "has EXIF" is a single check
/// instead of a spread of independently nullable scalars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExifInfo {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens: Option<String>,
    pub iso: Option<i32>,
    pub shutter_speed: Option<String>,
    pub aperture: Option<String>,
    pub focal_length: Option<String>,
    pub gps: Option<GpsPoint>,
}

/// Represents a single media asset known to the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Stable identifier, unique for the lifetime of the record
    pub id: i64,
    /// Full path to the file
    pub path: String,
    /// Filename only (e.g. "DSC_0001.jpg")
    pub filename: String,
    /// Folder path relative to the source root
    pub folder_rel: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// EXIF capture time, if known
    pub taken_at: Option<DateTime<Utc>>,
    /// Filesystem modification time, always present
    pub modified_at: DateTime<Utc>,
    pub size_bytes: i64,
    pub media_type: MediaType,
    /// Name of the owning source directory
    pub source: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_deleted: bool,
    /// Set iff `is_deleted`
    pub deleted_at: Option<DateTime<Utc>>,
    pub exif: Option<ExifInfo>,
}

impl Photo {
    /// The date every date-dependent computation uses: capture time when the
    /// scanner knew it, file modification time otherwise.
    pub fn effective_date(&self) -> DateTime<Utc> {
        self.taken_at.unwrap_or(self.modified_at)
    }
}

/// One indexed source directory, as reported by the repository.
/// `photo_count` is a server-side aggregate and may lag the true count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDirectory {
    pub id: i64,
    pub name: String,
    pub root_path: String,
    pub photo_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub photo_count: i64,
    pub cover_path: Option<String>,
}

/// Per-year photo count for the sidebar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearCount {
    pub year: i32,
    pub count: i64,
}

/// Per-month photo count within a year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: i64,
}
