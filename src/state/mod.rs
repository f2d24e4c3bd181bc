/// State management module
///
/// This module handles all view state, including:
/// - The bounded cache window over the backing dataset (cache.rs)
/// - Incremental page loading (pagination.rs)
/// - The pure filter/sort pipeline (filter.rs)
/// - Date-bucketed grouping (grouping.rs)
/// - Multi-select state (selection.rs)
/// - Sidebar folder visibility (folders.rs)
/// - The orchestrator tying them together (view.rs)

pub mod cache;
pub mod filter;
pub mod folders;
pub mod grouping;
pub mod pagination;
pub mod selection;
pub mod view;
