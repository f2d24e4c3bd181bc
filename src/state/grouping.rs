use chrono::{Datelike, Duration, Local, NaiveDate, TimeZone};

use crate::model::Photo;

/// One date-labeled section of the visible sequence
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoGroup {
    /// Display label ("Today", "March 2023", ...)
    pub label: String,
    /// Stable key ("today", "2023-03", ...)
    pub key: String,
    pub records: Vec<Photo>,
}

/// Bucket the filtered sequence into date-labeled groups against today's
/// local calendar date.
///
/// Groups are emitted in first-encounter order over the input, and record
/// order inside each group mirrors the input. The union of all groups is
/// exactly the input.
pub fn group_photos(photos: &[Photo]) -> Vec<PhotoGroup> {
    group_photos_in(photos, &Local, Local::now().date_naive())
}

/// Timezone-explicit variant; `today` is computed once per recomputation by
/// the caller so every record is bucketed against the same reference day.
pub fn group_photos_in<Tz: TimeZone>(
    photos: &[Photo],
    tz: &Tz,
    today: NaiveDate,
) -> Vec<PhotoGroup> {
    let yesterday = today - Duration::days(1);
    let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);

    let mut groups: Vec<PhotoGroup> = Vec::new();
    let mut index: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for photo in photos {
        let day = photo.effective_date().with_timezone(tz).date_naive();
        let (label, key) = bucket(day, today, yesterday, week_start);
        match index.get(&key) {
            Some(&i) => groups[i].records.push(photo.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(PhotoGroup {
                    label,
                    key,
                    records: vec![photo.clone()],
                });
            }
        }
    }
    groups
}

/// Precedence: today, yesterday, this week (Sunday start), this month, then
/// a month-of-year bucket.
fn bucket(
    day: NaiveDate,
    today: NaiveDate,
    yesterday: NaiveDate,
    week_start: NaiveDate,
) -> (String, String) {
    if day == today {
        ("Today".to_string(), "today".to_string())
    } else if day == yesterday {
        ("Yesterday".to_string(), "yesterday".to_string())
    } else if day >= week_start && day < week_start + Duration::days(7) {
        ("This Week".to_string(), "this-week".to_string())
    } else if day.year() == today.year() && day.month() == today.month() {
        ("This Month".to_string(), "this-month".to_string())
    } else {
        (
            day.format("%B %Y").to_string(),
            format!("{:04}-{:02}", day.year(), day.month()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::photo;
    use chrono::Utc;

    // 2024-06-15 is a Saturday; its week starts Sunday 2024-06-09
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn on(day: NaiveDate, id: i64) -> Photo {
        let mut p = photo(id);
        p.taken_at = Some(day.and_hms_opt(10, 0, 0).unwrap().and_utc());
        p
    }

    fn keys(groups: &[PhotoGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.key.as_str()).collect()
    }

    #[test]
    fn test_bucket_precedence() {
        let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let photos = vec![
            on(d(2024, 6, 15), 1), // today
            on(d(2024, 6, 14), 2), // yesterday
            on(d(2024, 6, 10), 3), // this week (Mon after Sunday start)
            on(d(2024, 6, 3), 4),  // this month
            on(d(2024, 5, 20), 5), // May 2024
            on(d(2023, 12, 1), 6), // December 2023
        ];
        let groups = group_photos_in(&photos, &Utc, today());
        assert_eq!(
            keys(&groups),
            vec!["today", "yesterday", "this-week", "this-month", "2024-05", "2023-12"]
        );
        assert_eq!(groups[4].label, "May 2024");
        assert_eq!(groups[5].label, "December 2023");
    }

    #[test]
    fn test_groups_in_first_encounter_order() {
        let d = |y: i32, m: u32, dd: u32| NaiveDate::from_ymd_opt(y, m, dd).unwrap();
        // old month first, then today, then the old month again
        let photos = vec![
            on(d(2023, 1, 5), 1),
            on(d(2024, 6, 15), 2),
            on(d(2023, 1, 9), 3),
        ];
        let groups = group_photos_in(&photos, &Utc, today());
        assert_eq!(keys(&groups), vec!["2023-01", "today"]);
        let ids: Vec<i64> = groups[0].records.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_grouping_completeness() {
        let d = |y: i32, m: u32, dd: u32| NaiveDate::from_ymd_opt(y, m, dd).unwrap();
        let photos: Vec<Photo> = vec![
            on(d(2024, 6, 15), 1),
            on(d(2024, 6, 14), 2),
            on(d(2024, 6, 15), 3),
            on(d(2022, 2, 2), 4),
            on(d(2024, 6, 1), 5),
        ];
        let groups = group_photos_in(&photos, &Utc, today());
        let regrouped: Vec<i64> = groups
            .iter()
            .flat_map(|g| g.records.iter().map(|p| p.id))
            .collect();
        // every input record lands in exactly one group, order preserved
        // within groups and groups ordered by first encounter
        let mut sorted = regrouped.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
        assert_eq!(regrouped, vec![1, 3, 2, 4, 5]);
    }

    #[test]
    fn test_sunday_itself_is_in_current_week() {
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        let groups = group_photos_in(&[on(sunday, 1)], &Utc, today());
        assert_eq!(keys(&groups), vec!["this-week"]);
    }

    #[test]
    fn test_day_before_week_start_falls_to_month_bucket() {
        // Saturday 2024-06-08 is this month but last week
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        let groups = group_photos_in(&[on(saturday, 1)], &Utc, today());
        assert_eq!(keys(&groups), vec!["this-month"]);
    }

    #[test]
    fn test_effective_date_fallback_drives_bucketing() {
        let mut p = photo(1);
        p.taken_at = None;
        p.modified_at = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            .and_utc();
        let groups = group_photos_in(&[p], &Utc, today());
        assert_eq!(keys(&groups), vec!["today"]);
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        assert!(group_photos_in(&[], &Utc, today()).is_empty());
    }
}
