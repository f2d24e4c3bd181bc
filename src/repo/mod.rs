/// Repository contract between the view engine and the backing store
///
/// The engine never touches storage directly: pagination, search, and every
/// mutation go through this trait. All calls are fallible and asynchronous,
/// and a failed call must not have partially mutated the store.
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Album, MediaType, MonthCount, Photo, SourceDirectory, Tag, YearCount};

pub use memory::MemoryPhotoRepository;
pub use sqlite::SqlitePhotoRepository;

#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// One page of the library, newest effective date first. Returns fewer
    /// than `limit` records only at the end of the dataset.
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<Photo>>;

    /// Total photo count; approximate/eventually consistent is acceptable
    async fn fetch_count(&self) -> Result<i64>;

    async fn fetch_libraries(&self) -> Result<Vec<SourceDirectory>>;

    async fn photo_by_id(&self, id: i64) -> Result<Option<Photo>>;

    /// Flip the favorite flag and return the new state
    async fn toggle_favorite(&self, id: i64) -> Result<bool>;

    async fn soft_delete(&self, ids: &[i64]) -> Result<()>;

    async fn restore(&self, ids: &[i64]) -> Result<()>;

    /// Remove records permanently; returns how many were deleted. With
    /// `delete_from_disk` the underlying files are unlinked as well.
    async fn hard_delete(&self, ids: &[i64], delete_from_disk: bool) -> Result<u64>;

    /// Rename a photo's file; returns the new full path. Fails with a
    /// validation error on collision.
    async fn rename(&self, id: i64, new_filename: &str) -> Result<String>;

    /// Substring search over path, filename, and folder, plus tag names.
    /// A `#tagname` query matches that tag exactly.
    async fn search(&self, query: &str) -> Result<Vec<Photo>>;

    // Sidebar aggregates the engine cannot compute beyond its window

    async fn years(&self) -> Result<Vec<YearCount>>;

    async fn months(&self, year: i32) -> Result<Vec<MonthCount>>;

    async fn media_type_counts(&self) -> Result<Vec<(MediaType, i64)>>;

    // Tags

    async fn create_tag(&self, name: &str, color: &str) -> Result<Tag>;

    async fn delete_tag(&self, tag_id: i64) -> Result<()>;

    async fn list_tags(&self) -> Result<Vec<Tag>>;

    async fn tag_photos(&self, ids: &[i64], tag_id: i64) -> Result<()>;

    async fn untag_photos(&self, ids: &[i64], tag_id: i64) -> Result<()>;

    async fn tags_for_photo(&self, id: i64) -> Result<Vec<Tag>>;

    // Albums

    async fn create_album(&self, name: &str) -> Result<Album>;

    async fn delete_album(&self, album_id: i64) -> Result<()>;

    async fn rename_album(&self, album_id: i64, new_name: &str) -> Result<()>;

    async fn list_albums(&self) -> Result<Vec<Album>>;

    async fn add_to_album(&self, album_id: i64, ids: &[i64]) -> Result<()>;

    async fn remove_from_album(&self, album_id: i64, ids: &[i64]) -> Result<()>;

    /// Album contents in manual (position) order
    async fn album_photos(&self, album_id: i64) -> Result<Vec<Photo>>;
}
