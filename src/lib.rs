//! Library view engine for a native photo manager.
//!
//! Holds a bounded, incrementally-loaded window of photo metadata and derives
//! the visible, filtered, sorted, and grouped view from it. The derivation
//! pipeline is pure and cheap enough to re-run on every interaction (search
//! keystroke, filter change, sort change, section switch); the backing store
//! is reached only through the [`PhotoRepository`] contract, with a SQLite
//! implementation included.
//!
//! The engine assumes a single-threaded cooperative scheduler: repository
//! calls suspend at the await point, derived computations never do, and
//! shared state has one writer at a time by construction.

pub mod debounce;
pub mod error;
pub mod model;
pub mod repo;
pub mod settings;
pub mod state;

pub use debounce::{Debouncer, SEARCH_DEBOUNCE};
pub use error::{Error, Result};
pub use model::{
    Album, ExifInfo, GpsPoint, MediaType, MonthCount, Photo, SourceDirectory, Tag, YearCount,
};
pub use repo::{MemoryPhotoRepository, PhotoRepository, SqlitePhotoRepository};
pub use settings::{LayoutMode, Settings, Theme};
pub use state::cache::{LibraryCache, CAP};
pub use state::filter::{visible_photos, FilterState, Section, SortKey};
pub use state::grouping::{group_photos, PhotoGroup};
pub use state::pagination::{Pagination, PAGE_SIZE};
pub use state::selection::SelectionManager;
pub use state::view::{LibraryView, ViewSnapshot};
