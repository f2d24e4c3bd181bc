use crate::error::Result;
use crate::repo::PhotoRepository;
use crate::state::cache::LibraryCache;

/// Records fetched per page
pub const PAGE_SIZE: usize = 100;

/// Drives incremental fetch against the repository. The only writer of the
/// library cache during normal browsing.
///
/// `is_loading_more` is a cooperative flag, not a lock: the engine runs on a
/// single-threaded cooperative scheduler, so the flag is enough to stop
/// re-entrant scroll triggers from stacking fetches. It does not cancel an
/// in-flight request; a page that lands after the user changed context is
/// still applied.
#[derive(Debug)]
pub struct Pagination {
    pub has_more: bool,
    pub is_loading_more: bool,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            has_more: true,
            is_loading_more: false,
            page_size: PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the first page and replace the cache window with it.
    /// A full page means more may follow; a short one means the dataset is
    /// exhausted already.
    pub async fn load_first_page<R: PhotoRepository>(
        &mut self,
        repo: &R,
        cache: &mut LibraryCache,
    ) -> Result<()> {
        let batch = repo.fetch_page(self.page_size, 0).await?;
        self.has_more = batch.len() >= self.page_size;
        tracing::debug!(fetched = batch.len(), has_more = self.has_more, "loaded first page");
        cache.replace_all(batch);
        Ok(())
    }

    /// Fetch the next page at `offset = cache length` and append it.
    ///
    /// No-op while a fetch is outstanding or after the dataset is exhausted.
    /// The loading flag is reset on every exit path; a repository failure
    /// leaves `has_more` untouched so a later scroll trigger retries.
    pub async fn load_more<R: PhotoRepository>(
        &mut self,
        repo: &R,
        cache: &mut LibraryCache,
    ) -> Result<()> {
        if self.is_loading_more || !self.has_more {
            return Ok(());
        }
        self.is_loading_more = true;
        let offset = cache.len();
        let result = repo.fetch_page(self.page_size, offset).await;
        self.is_loading_more = false;

        let batch = result?;
        if batch.is_empty() {
            self.has_more = false;
            tracing::debug!(offset, "empty page, dataset exhausted");
            return Ok(());
        }
        self.has_more = batch.len() >= self.page_size;
        tracing::debug!(offset, fetched = batch.len(), has_more = self.has_more, "loaded page");
        cache.append(batch);
        Ok(())
    }
}
