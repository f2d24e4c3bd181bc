use std::collections::HashSet;

use chrono::{Local, Utc};

use crate::error::Result;
use crate::model::{MediaType, Photo};
use crate::repo::PhotoRepository;
use crate::settings::Settings;
use crate::state::cache::LibraryCache;
use crate::state::filter::{visible_photos, FilterState, Section, SortKey};
use crate::state::folders;
use crate::state::grouping::{group_photos_in, PhotoGroup};
use crate::state::pagination::Pagination;
use crate::state::selection::SelectionManager;

/// Everything the UI renders for one recomputation: the visible ordered
/// sequence, its date groups, and the sidebar folder list.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub photos: Vec<Photo>,
    pub groups: Vec<PhotoGroup>,
    pub folders: Vec<String>,
}

/// The engine's reactive root.
///
/// Owns the cache window, pagination, filter/search/sort/section state,
/// selection, and settings; every mutation funnels through a method here and
/// derived output is recomputed on demand by `snapshot()` from explicit
/// inputs. Nothing is updated speculatively: repository mutations touch local
/// state only after the call resolved successfully.
///
/// Search input should reach `set_search_query` through a
/// [`Debouncer`](crate::debounce::Debouncer) so only the last keystroke in
/// the delay window triggers a recomputation.
pub struct LibraryView<R: PhotoRepository> {
    repo: R,
    pub settings: Settings,
    cache: LibraryCache,
    pager: Pagination,
    filter: FilterState,
    search_query: String,
    sort: SortKey,
    section: Section,
    active_source: Option<String>,
    selection: SelectionManager,
}

impl<R: PhotoRepository> LibraryView<R> {
    pub fn new(repo: R, settings: Settings) -> Self {
        Self {
            repo,
            settings,
            cache: LibraryCache::new(),
            pager: Pagination::new(),
            filter: FilterState::default(),
            search_query: String::new(),
            sort: SortKey::default(),
            section: Section::All,
            active_source: None,
            selection: SelectionManager::new(),
        }
    }

    // ── Pagination ──

    pub async fn load_first_page(&mut self) -> Result<()> {
        self.pager.load_first_page(&self.repo, &mut self.cache).await
    }

    pub async fn load_more(&mut self) -> Result<()> {
        self.pager.load_more(&self.repo, &mut self.cache).await
    }

    pub fn has_more(&self) -> bool {
        self.pager.has_more
    }

    pub fn is_loading_more(&self) -> bool {
        self.pager.is_loading_more
    }

    // ── View state ──

    /// Switch the active section. Album and tag sections replace the cache
    /// with their already-narrowed contents; returning to a paged section
    /// reloads the first page.
    pub async fn set_section(&mut self, section: Section) -> Result<()> {
        match &section {
            Section::Album(id) => {
                let photos = self.repo.album_photos(*id).await?;
                self.cache.replace_all(photos);
                self.pager.has_more = false;
            }
            Section::Tag(name) => {
                let photos = self.repo.search(&format!("#{}", name)).await?;
                self.cache.replace_all(photos);
                self.pager.has_more = false;
            }
            _ => {
                if self.section.is_preloaded() {
                    self.pager = Pagination::new();
                    self.pager.load_first_page(&self.repo, &mut self.cache).await?;
                }
            }
        }
        self.section = section;
        Ok(())
    }

    pub fn section(&self) -> &Section {
        &self.section
    }

    pub fn set_active_source(&mut self, source: Option<String>) {
        self.active_source = source;
    }

    /// Apply a (debounced) search query
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    pub fn set_folder_filter(&mut self, folder: Option<String>) {
        self.filter.selected_folder = folder;
    }

    pub fn set_year_filter(&mut self, year: Option<i32>) {
        self.filter.selected_year = year;
    }

    pub fn set_month_filter(&mut self, month: Option<u32>) {
        self.filter.selected_month = month;
    }

    /// Replace the media-type selection. An empty set would hide everything
    /// for no expressible reason, so it is rejected and the previous
    /// selection stays.
    pub fn set_media_types(&mut self, types: HashSet<MediaType>) {
        if types.is_empty() {
            tracing::warn!("ignoring empty media type selection");
            return;
        }
        self.filter.selected_media_types = types;
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Mutate settings and persist them; the settings blob is written on
    /// every change.
    pub fn update_settings(&mut self, apply: impl FnOnce(&mut Settings)) -> Result<()> {
        apply(&mut self.settings);
        self.settings.save()
    }

    // ── Repository mutations (confirmed before applied) ──

    pub async fn toggle_favorite(&mut self, id: i64) -> Result<bool> {
        let new_state = self.repo.toggle_favorite(id).await?;
        self.cache.mutate(id, |p| p.is_favorite = new_state);
        Ok(new_state)
    }

    pub async fn soft_delete(&mut self, ids: &[i64]) -> Result<()> {
        self.repo.soft_delete(ids).await?;
        let now = Utc::now();
        for id in ids {
            self.cache.mutate(*id, |p| {
                p.is_deleted = true;
                p.deleted_at = Some(now);
            });
        }
        Ok(())
    }

    pub async fn restore(&mut self, ids: &[i64]) -> Result<()> {
        self.repo.restore(ids).await?;
        for id in ids {
            self.cache.mutate(*id, |p| {
                p.is_deleted = false;
                p.deleted_at = None;
            });
        }
        Ok(())
    }

    pub async fn hard_delete(&mut self, ids: &[i64], delete_from_disk: bool) -> Result<u64> {
        let removed = self.repo.hard_delete(ids, delete_from_disk).await?;
        let id_set: HashSet<i64> = ids.iter().copied().collect();
        self.cache.remove_where(&id_set);
        for id in &id_set {
            if self.selection.is_selected(*id) {
                self.selection.toggle(*id);
            }
        }
        Ok(removed)
    }

    pub async fn rename(&mut self, id: i64, new_filename: &str) -> Result<String> {
        let new_path = self.repo.rename(id, new_filename).await?;
        let filename = new_filename.to_string();
        let path = new_path.clone();
        self.cache.mutate(id, |p| {
            p.filename = filename;
            p.path = path;
        });
        Ok(new_path)
    }

    // ── Selection ──

    pub fn toggle_select(&mut self, id: i64) {
        self.selection.toggle(id);
    }

    /// Select exactly what the pipeline currently shows
    pub fn select_all(&mut self) {
        let visible = self.visible();
        self.selection.select_all(&visible);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_multi_select(&mut self, on: bool) {
        self.selection.set_multi_select(on);
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    // ── Derived output ──

    /// The filter pipeline's output for the current state
    pub fn visible(&self) -> Vec<Photo> {
        visible_photos(
            self.cache.photos(),
            &self.filter,
            &self.search_query,
            self.sort,
            &self.section,
            self.active_source.as_deref(),
            Utc::now(),
        )
    }

    /// Recompute the full derived view: pipeline, groups, folders. The
    /// current instant and today's date are taken once so every record is
    /// judged against the same reference.
    pub fn snapshot(&self) -> ViewSnapshot {
        let photos = self.visible();
        let groups = group_photos_in(&photos, &Local, Local::now().date_naive());
        let folders = folders::visible_folders(self.cache.photos(), &self.settings);
        ViewSnapshot {
            photos,
            groups,
            folders,
        }
    }

    /// Window length, for scroll-position math in the UI
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Direct repository access for association queries (tag/album CRUD,
    /// sidebar aggregates). Associations live in the repository, never in the
    /// cache, so there is no local state to keep in step.
    pub fn repo(&self) -> &R {
        &self.repo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::photo;
    use crate::repo::MemoryPhotoRepository;
    use chrono::{Duration, TimeZone};

    fn seeded_view(count: i64) -> LibraryView<MemoryPhotoRepository> {
        let photos: Vec<Photo> = (0..count)
            .map(|i| {
                let mut p = photo(i);
                p.taken_at = Some(
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() - Duration::hours(i),
                );
                p
            })
            .collect();
        LibraryView::new(MemoryPhotoRepository::with_photos(photos), Settings::default())
    }

    #[tokio::test]
    async fn test_snapshot_is_idempotent() {
        let mut view = seeded_view(30);
        view.load_first_page().await.unwrap();
        view.set_search_query("IMG");
        let a = view.snapshot();
        let b = view.snapshot();
        assert_eq!(a, b);
        assert_eq!(a.photos.len(), 30);
    }

    #[tokio::test]
    async fn test_toggle_favorite_applies_after_confirmation() {
        let mut view = seeded_view(5);
        view.load_first_page().await.unwrap();

        assert!(view.toggle_favorite(2).await.unwrap());
        let favs: Vec<i64> = view
            .visible()
            .iter()
            .filter(|p| p.is_favorite)
            .map(|p| p.id)
            .collect();
        assert_eq!(favs, vec![2]);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cache_untouched() {
        let mut view = seeded_view(5);
        view.load_first_page().await.unwrap();

        view.repo.fail_with("backend unreachable");
        assert!(view.toggle_favorite(2).await.is_err());
        assert!(view.soft_delete(&[1]).await.is_err());
        view.repo.recover();

        let snapshot = view.snapshot();
        assert_eq!(snapshot.photos.len(), 5);
        assert!(snapshot.photos.iter().all(|p| !p.is_favorite && !p.is_deleted));
    }

    #[tokio::test]
    async fn test_soft_delete_moves_record_to_trash_view() {
        let mut view = seeded_view(4);
        view.load_first_page().await.unwrap();

        view.soft_delete(&[1, 2]).await.unwrap();
        assert_eq!(view.visible().len(), 2);

        view.set_section(Section::Trash).await.unwrap();
        let trashed: Vec<i64> = view.visible().iter().map(|p| p.id).collect();
        assert_eq!(trashed, vec![1, 2]);

        view.restore(&[1]).await.unwrap();
        assert_eq!(view.visible().len(), 1);
    }

    #[tokio::test]
    async fn test_hard_delete_removes_from_cache_and_selection() {
        let mut view = seeded_view(4);
        view.load_first_page().await.unwrap();
        view.toggle_select(3);

        let removed = view.hard_delete(&[3], false).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(view.cache_len(), 3);
        assert!(!view.selection().is_selected(3));
    }

    #[tokio::test]
    async fn test_rename_updates_cached_record() {
        let mut view = seeded_view(2);
        view.load_first_page().await.unwrap();

        let new_path = view.rename(0, "keeper.jpg").await.unwrap();
        let renamed = view.visible().into_iter().find(|p| p.id == 0).unwrap();
        assert_eq!(renamed.filename, "keeper.jpg");
        assert_eq!(renamed.path, new_path);
    }

    #[tokio::test]
    async fn test_album_section_replaces_cache_and_back_reloads() {
        let mut view = seeded_view(150);
        view.load_first_page().await.unwrap();
        assert_eq!(view.cache_len(), 100);

        let album = view.repo.create_album("picks").await.unwrap();
        view.repo.add_to_album(album.id, &[120, 5]).await.unwrap();

        view.set_section(Section::Album(album.id)).await.unwrap();
        let ids: Vec<i64> = view.visible().iter().map(|p| p.id).collect();
        // album order is manual order; default date sort still applies on top
        assert_eq!(view.cache_len(), 2);
        assert_eq!(ids, vec![5, 120]);
        assert!(!view.has_more());

        view.set_section(Section::All).await.unwrap();
        assert_eq!(view.cache_len(), 100);
        assert!(view.has_more());
    }

    #[tokio::test]
    async fn test_tag_section_uses_search_convention() {
        let mut view = seeded_view(10);
        view.load_first_page().await.unwrap();

        let tag = view.repo.create_tag("trip", "#0071e3").await.unwrap();
        view.repo.tag_photos(&[4, 7], tag.id).await.unwrap();

        view.set_section(Section::Tag("trip".to_string())).await.unwrap();
        let ids: Vec<i64> = view.visible().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 7]);
    }

    #[tokio::test]
    async fn test_select_all_respects_active_filters() {
        let mut view = seeded_view(10);
        view.load_first_page().await.unwrap();
        view.set_search_query("IMG_0003");

        view.select_all();
        assert_eq!(view.selection().len(), 1);
        assert!(view.selection().is_selected(3));
    }

    #[tokio::test]
    async fn test_empty_media_type_selection_rejected() {
        let mut view = seeded_view(3);
        view.load_first_page().await.unwrap();
        view.set_media_types(HashSet::new());
        assert!(!view.filter().selected_media_types.is_empty());
        assert_eq!(view.visible().len(), 3);
    }

    #[tokio::test]
    async fn test_folders_come_from_full_cache_not_filtered_view() {
        let mut view = seeded_view(6);
        view.load_first_page().await.unwrap();
        view.set_search_query("no-such-file");

        let snapshot = view.snapshot();
        assert!(snapshot.photos.is_empty());
        assert_eq!(snapshot.folders, vec!["2024/trip"]);
    }
}
