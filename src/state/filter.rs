use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{MediaType, Photo};

/// Top-level view selector. Narrows the cache before any other filter runs.
///
/// `Album` and `Tag` views repopulate the cache via `replace_all` with an
/// already-narrowed set, so the media-type/folder/year/month stages are
/// skipped for them; search and sort still apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    All,
    Recents,
    Favorites,
    Videos,
    Source,
    Trash,
    Album(i64),
    Tag(String),
}

impl Section {
    /// Sections whose cache contents were loaded pre-narrowed
    pub fn is_preloaded(&self) -> bool {
        matches!(self, Section::Album(_) | Section::Tag(_))
    }
}

/// Sort order for the visible sequence.
///
/// All sorts are stable: records comparing equal keep the upstream filtered
/// order (cache order), which is deterministic per snapshot. Name sorts use
/// natural ordering so "IMG_9" sorts before "IMG_10".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    DateDesc,
    DateAsc,
    NameAsc,
    NameDesc,
    SizeDesc,
    SizeAsc,
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::DateDesc
    }
}

/// User-driven narrowing state, independent of the active section
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    /// Exact match on `folder_rel`
    pub selected_folder: Option<String>,
    pub selected_year: Option<i32>,
    /// 1-based month; meaningful only when `selected_year` is set
    pub selected_month: Option<u32>,
    /// Never empty; defaults to both media types
    pub selected_media_types: HashSet<MediaType>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            selected_folder: None,
            selected_year: None,
            selected_month: None,
            selected_media_types: [MediaType::Photo, MediaType::Video].into_iter().collect(),
        }
    }
}

/// How far back the Recents section reaches
const RECENT_WINDOW_DAYS: i64 = 30;

/// The filter pipeline: derives the visible, ordered sequence from the cache
/// and the current view state.
///
/// Pure with respect to its parameters; `now` is passed in so repeated
/// invocation with identical inputs yields an identical sequence. Each stage
/// narrows the previous stage's output in fixed order: source, section,
/// search, media type, folder, year, month, then a stable sort.
pub fn visible_photos(
    cache: &[Photo],
    filter: &FilterState,
    query: &str,
    sort: SortKey,
    section: &Section,
    active_source: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<Photo> {
    let mut photos: Vec<Photo> = cache.to_vec();

    // 1. Source: only meaningful in the per-source section
    if *section == Section::Source {
        if let Some(source) = active_source {
            photos.retain(|p| p.source == source);
        }
    }

    // 2. Section. Trash is the one view that shows deleted records; every
    //    other section drops them before its own predicate.
    match section {
        Section::Trash => photos.retain(|p| p.is_deleted),
        other => {
            photos.retain(|p| !p.is_deleted);
            match other {
                Section::Favorites => photos.retain(|p| p.is_favorite),
                Section::Videos => photos.retain(|p| p.media_type == MediaType::Video),
                Section::Recents => {
                    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
                    photos.retain(|p| {
                        let d = p.effective_date();
                        d >= cutoff && d <= now
                    });
                }
                _ => {}
            }
        }
    }

    // 3. Search: case-insensitive substring over filename, path, folder
    if !query.is_empty() {
        let needle = query.to_lowercase();
        photos.retain(|p| {
            p.filename.to_lowercase().contains(&needle)
                || p.path.to_lowercase().contains(&needle)
                || p.folder_rel.to_lowercase().contains(&needle)
        });
    }

    if !section.is_preloaded() {
        // 4. Media type. Skipped in the Videos section: the section already
        //    constrains the type, and a photos-only selection must not empty
        //    an intentionally video-only view.
        if *section != Section::Videos {
            photos.retain(|p| filter.selected_media_types.contains(&p.media_type));
        }

        // 5. Folder: exact relative-path match
        if let Some(folder) = &filter.selected_folder {
            photos.retain(|p| p.folder_rel == *folder);
        }

        // 6. Year
        if let Some(year) = filter.selected_year {
            photos.retain(|p| p.effective_date().year() == year);

            // 7. Month, only ever combined with a year
            if let Some(month) = filter.selected_month {
                photos.retain(|p| p.effective_date().month() == month);
            }
        }
    }

    // 8. Stable sort
    sort_photos(&mut photos, sort);
    photos
}

fn sort_photos(photos: &mut [Photo], sort: SortKey) {
    match sort {
        SortKey::DateDesc => photos.sort_by(|a, b| b.effective_date().cmp(&a.effective_date())),
        SortKey::DateAsc => photos.sort_by(|a, b| a.effective_date().cmp(&b.effective_date())),
        SortKey::NameAsc => photos.sort_by(|a, b| natord::compare(&a.filename, &b.filename)),
        SortKey::NameDesc => photos.sort_by(|a, b| natord::compare(&b.filename, &a.filename)),
        SortKey::SizeDesc => photos.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes)),
        SortKey::SizeAsc => photos.sort_by(|a, b| a.size_bytes.cmp(&b.size_bytes)),
    }
}
