use std::collections::HashSet;

use crate::model::Photo;
use crate::settings::Settings;

/// Derive the sidebar folder list from the cache window and settings.
///
/// Distinct non-empty `folder_rel` values, minus hidden folders, pinned ones
/// first, each block ordered lexicographically, truncated to the configured
/// maximum.
pub fn visible_folders(photos: &[Photo], settings: &Settings) -> Vec<String> {
    let hidden: HashSet<&str> = settings.hidden_folders.iter().map(String::as_str).collect();
    let pinned: HashSet<&str> = settings.pinned_folders.iter().map(String::as_str).collect();

    let mut seen = HashSet::new();
    let mut pinned_out = Vec::new();
    let mut rest = Vec::new();
    for p in photos {
        let folder = p.folder_rel.as_str();
        if folder.is_empty() || hidden.contains(folder) || !seen.insert(folder) {
            continue;
        }
        if pinned.contains(folder) {
            pinned_out.push(folder.to_string());
        } else {
            rest.push(folder.to_string());
        }
    }
    pinned_out.sort();
    rest.sort();
    pinned_out.extend(rest);
    pinned_out.truncate(settings.max_visible_folders);
    pinned_out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::photo;

    fn in_folder(id: i64, folder: &str) -> crate::model::Photo {
        let mut p = photo(id);
        p.folder_rel = folder.to_string();
        p
    }

    #[test]
    fn test_distinct_and_sorted() {
        let photos = vec![
            in_folder(1, "b"),
            in_folder(2, "a"),
            in_folder(3, "b"),
            in_folder(4, ""),
        ];
        let folders = visible_folders(&photos, &Settings::default());
        assert_eq!(folders, vec!["a", "b"]);
    }

    #[test]
    fn test_hidden_folders_dropped() {
        let photos = vec![in_folder(1, "keep"), in_folder(2, "secret")];
        let settings = Settings {
            hidden_folders: vec!["secret".to_string()],
            ..Default::default()
        };
        assert_eq!(visible_folders(&photos, &settings), vec!["keep"]);
    }

    #[test]
    fn test_pinned_folders_come_first() {
        let photos = vec![
            in_folder(1, "archive"),
            in_folder(2, "trips"),
            in_folder(3, "family"),
        ];
        let settings = Settings {
            pinned_folders: vec!["trips".to_string()],
            ..Default::default()
        };
        assert_eq!(visible_folders(&photos, &settings), vec!["trips", "archive", "family"]);
    }

    #[test]
    fn test_truncated_to_max_visible() {
        let photos: Vec<_> = (0..6).map(|i| in_folder(i, &format!("f{}", i))).collect();
        let settings = Settings {
            max_visible_folders: 4,
            ..Default::default()
        };
        assert_eq!(visible_folders(&photos, &settings).len(), 4);
    }

    #[test]
    fn test_pinned_but_hidden_stays_hidden() {
        let photos = vec![in_folder(1, "trips")];
        let settings = Settings {
            pinned_folders: vec!["trips".to_string()],
            hidden_folders: vec!["trips".to_string()],
            ..Default::default()
        };
        assert!(visible_folders(&photos, &settings).is_empty());
    }
}
