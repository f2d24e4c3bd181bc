use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::{Album, MediaType, MonthCount, Photo, SourceDirectory, Tag, YearCount};
use crate::repo::PhotoRepository;

/// In-memory photo repository.
///
/// Backs engine tests and fixtures with the same contract the SQLite store
/// honors: pages come back newest effective date first, failed calls mutate
/// nothing, and `delete_from_disk` is accepted but meaningless here.
#[derive(Default)]
pub struct MemoryPhotoRepository {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    photos: Vec<Photo>,
    sources: Vec<SourceDirectory>,
    tags: Vec<Tag>,
    albums: Vec<Album>,
    /// (photo_id, tag_id)
    photo_tags: HashSet<(i64, i64)>,
    /// (album_id, photo_id), insertion order is album position
    album_photos: Vec<(i64, i64)>,
    next_tag_id: i64,
    next_album_id: i64,
    /// When set, every repository call fails with this message
    fail_message: Option<String>,
}

impl MemoryPhotoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_photos(photos: Vec<Photo>) -> Self {
        let repo = Self::new();
        repo.inner.lock().unwrap().photos = photos;
        repo
    }

    pub fn push_photos(&self, photos: Vec<Photo>) {
        self.inner.lock().unwrap().photos.extend(photos);
    }

    pub fn add_source(&self, source: SourceDirectory) {
        self.inner.lock().unwrap().sources.push(source);
    }

    /// Make every following call fail until cleared. Lets tests exercise the
    /// no-partial-mutation and flag-reset paths.
    pub fn fail_with(&self, message: &str) {
        self.inner.lock().unwrap().fail_message = Some(message.to_string());
    }

    pub fn recover(&self) {
        self.inner.lock().unwrap().fail_message = None;
    }

    fn guard(inner: &Inner) -> Result<()> {
        match &inner.fail_message {
            Some(msg) => Err(Error::Fetch(msg.clone())),
            None => Ok(()),
        }
    }

    /// Live records, newest effective date first with path as the stable
    /// tie-break, mirroring the SQLite page order.
    fn ordered_live(inner: &Inner) -> Vec<Photo> {
        let mut live: Vec<Photo> = inner.photos.iter().filter(|p| !p.is_deleted).cloned().collect();
        live.sort_by(|a, b| {
            b.effective_date()
                .cmp(&a.effective_date())
                .then_with(|| a.path.cmp(&b.path))
        });
        live
    }
}

#[async_trait]
impl PhotoRepository for MemoryPhotoRepository {
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<Photo>> {
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let live = Self::ordered_live(&inner);
        Ok(live.into_iter().skip(offset).take(limit).collect())
    }

    async fn fetch_count(&self) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        Ok(inner.photos.iter().filter(|p| !p.is_deleted).count() as i64)
    }

    async fn fetch_libraries(&self) -> Result<Vec<SourceDirectory>> {
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        Ok(inner.sources.clone())
    }

    async fn photo_by_id(&self, id: i64) -> Result<Option<Photo>> {
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        Ok(inner.photos.iter().find(|p| p.id == id).cloned())
    }

    async fn toggle_favorite(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let photo = inner
            .photos
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::Validation(format!("photo {} not found", id)))?;
        photo.is_favorite = !photo.is_favorite;
        Ok(photo.is_favorite)
    }

    async fn soft_delete(&self, ids: &[i64]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let now = Utc::now();
        for p in inner.photos.iter_mut() {
            if ids.contains(&p.id) {
                p.is_deleted = true;
                p.deleted_at = Some(now);
            }
        }
        Ok(())
    }

    async fn restore(&self, ids: &[i64]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        for p in inner.photos.iter_mut() {
            if ids.contains(&p.id) {
                p.is_deleted = false;
                p.deleted_at = None;
            }
        }
        Ok(())
    }

    async fn hard_delete(&self, ids: &[i64], _delete_from_disk: bool) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let before = inner.photos.len();
        inner.photos.retain(|p| !ids.contains(&p.id));
        inner.photo_tags.retain(|(pid, _)| !ids.contains(pid));
        inner.album_photos.retain(|(_, pid)| !ids.contains(pid));
        Ok((before - inner.photos.len()) as u64)
    }

    async fn rename(&self, id: i64, new_filename: &str) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let old_path = inner
            .photos
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.path.clone())
            .ok_or_else(|| Error::Validation(format!("photo {} not found", id)))?;
        let new_path = Path::new(&old_path)
            .with_file_name(new_filename)
            .to_string_lossy()
            .to_string();
        if inner.photos.iter().any(|p| p.id != id && p.path == new_path) {
            return Err(Error::Validation(format!(
                "a file named {} already exists",
                new_filename
            )));
        }
        let photo = inner.photos.iter_mut().find(|p| p.id == id).unwrap();
        photo.filename = new_filename.to_string();
        photo.path = new_path.clone();
        Ok(new_path)
    }

    async fn search(&self, query: &str) -> Result<Vec<Photo>> {
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let live = Self::ordered_live(&inner);

        if let Some(tag) = query.strip_prefix('#') {
            let tag = tag.to_lowercase();
            let tag_ids: HashSet<i64> = inner
                .tags
                .iter()
                .filter(|t| t.name.to_lowercase() == tag)
                .map(|t| t.id)
                .collect();
            return Ok(live
                .into_iter()
                .filter(|p| {
                    tag_ids
                        .iter()
                        .any(|tid| inner.photo_tags.contains(&(p.id, *tid)))
                })
                .collect());
        }

        let needle = query.to_lowercase();
        let matching_tags: HashSet<i64> = inner
            .tags
            .iter()
            .filter(|t| t.name.to_lowercase().contains(&needle))
            .map(|t| t.id)
            .collect();
        let tagged: HashSet<i64> = inner
            .photo_tags
            .iter()
            .filter(|(_, tid)| matching_tags.contains(tid))
            .map(|(pid, _)| *pid)
            .collect();
        Ok(live
            .into_iter()
            .filter(|p| {
                p.path.to_lowercase().contains(&needle)
                    || p.filename.to_lowercase().contains(&needle)
                    || p.folder_rel.to_lowercase().contains(&needle)
                    || tagged.contains(&p.id)
            })
            .collect())
    }

    async fn years(&self) -> Result<Vec<YearCount>> {
        use chrono::Datelike;
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let mut counts: std::collections::HashMap<i32, i64> = std::collections::HashMap::new();
        for p in inner.photos.iter().filter(|p| !p.is_deleted) {
            *counts.entry(p.effective_date().year()).or_insert(0) += 1;
        }
        let mut out: Vec<YearCount> = counts
            .into_iter()
            .map(|(year, count)| YearCount { year, count })
            .collect();
        out.sort_by(|a, b| b.year.cmp(&a.year));
        Ok(out)
    }

    async fn months(&self, year: i32) -> Result<Vec<MonthCount>> {
        use chrono::Datelike;
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let mut counts: std::collections::HashMap<u32, i64> = std::collections::HashMap::new();
        for p in inner.photos.iter().filter(|p| !p.is_deleted) {
            let d = p.effective_date();
            if d.year() == year {
                *counts.entry(d.month()).or_insert(0) += 1;
            }
        }
        let mut out: Vec<MonthCount> = counts
            .into_iter()
            .map(|(month, count)| MonthCount { year, month, count })
            .collect();
        out.sort_by(|a, b| b.month.cmp(&a.month));
        Ok(out)
    }

    async fn media_type_counts(&self) -> Result<Vec<(MediaType, i64)>> {
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let live = || inner.photos.iter().filter(|p| !p.is_deleted);
        let photos = live().filter(|p| p.media_type == MediaType::Photo).count() as i64;
        let videos = live().filter(|p| p.media_type == MediaType::Video).count() as i64;
        let mut out = Vec::new();
        if photos > 0 {
            out.push((MediaType::Photo, photos));
        }
        if videos > 0 {
            out.push((MediaType::Video, videos));
        }
        Ok(out)
    }

    async fn create_tag(&self, name: &str, color: &str) -> Result<Tag> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        if inner.tags.iter().any(|t| t.name == name) {
            return Err(Error::Validation(format!("a tag named {} already exists", name)));
        }
        inner.next_tag_id += 1;
        let tag = Tag {
            id: inner.next_tag_id,
            name: name.to_string(),
            color: color.to_string(),
        };
        inner.tags.push(tag.clone());
        Ok(tag)
    }

    async fn delete_tag(&self, tag_id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        inner.tags.retain(|t| t.id != tag_id);
        inner.photo_tags.retain(|(_, tid)| *tid != tag_id);
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let mut tags = inner.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn tag_photos(&self, ids: &[i64], tag_id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        for id in ids {
            inner.photo_tags.insert((*id, tag_id));
        }
        Ok(())
    }

    async fn untag_photos(&self, ids: &[i64], tag_id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        for id in ids {
            inner.photo_tags.remove(&(*id, tag_id));
        }
        Ok(())
    }

    async fn tags_for_photo(&self, id: i64) -> Result<Vec<Tag>> {
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let mut tags: Vec<Tag> = inner
            .tags
            .iter()
            .filter(|t| inner.photo_tags.contains(&(id, t.id)))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn create_album(&self, name: &str) -> Result<Album> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        inner.next_album_id += 1;
        let album = Album {
            id: inner.next_album_id,
            name: name.to_string(),
            created_at: Utc::now(),
            photo_count: 0,
            cover_path: None,
        };
        inner.albums.push(album.clone());
        Ok(album)
    }

    async fn delete_album(&self, album_id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        inner.albums.retain(|a| a.id != album_id);
        inner.album_photos.retain(|(aid, _)| *aid != album_id);
        Ok(())
    }

    async fn rename_album(&self, album_id: i64, new_name: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let album = inner
            .albums
            .iter_mut()
            .find(|a| a.id == album_id)
            .ok_or_else(|| Error::Validation(format!("album {} not found", album_id)))?;
        album.name = new_name.to_string();
        Ok(())
    }

    async fn list_albums(&self) -> Result<Vec<Album>> {
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        let mut albums = inner.albums.clone();
        for album in albums.iter_mut() {
            let members: Vec<i64> = inner
                .album_photos
                .iter()
                .filter(|(aid, _)| *aid == album.id)
                .map(|(_, pid)| *pid)
                .collect();
            album.photo_count = members.len() as i64;
            album.cover_path = members
                .first()
                .and_then(|pid| inner.photos.iter().find(|p| p.id == *pid))
                .map(|p| p.path.clone());
        }
        albums.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(albums)
    }

    async fn add_to_album(&self, album_id: i64, ids: &[i64]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        for id in ids {
            if !inner.album_photos.contains(&(album_id, *id)) {
                inner.album_photos.push((album_id, *id));
            }
        }
        Ok(())
    }

    async fn remove_from_album(&self, album_id: i64, ids: &[i64]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        inner
            .album_photos
            .retain(|(aid, pid)| *aid != album_id || !ids.contains(pid));
        Ok(())
    }

    async fn album_photos(&self, album_id: i64) -> Result<Vec<Photo>> {
        let inner = self.inner.lock().unwrap();
        Self::guard(&inner)?;
        Ok(inner
            .album_photos
            .iter()
            .filter(|(aid, _)| *aid == album_id)
            .filter_map(|(_, pid)| inner.photos.iter().find(|p| p.id == *pid))
            .filter(|p| !p.is_deleted)
            .cloned()
            .collect())
    }
}
