//! Filtering, sorting and pagination over snapshots of clients and records.

use std::cmp::Ordering;

/// Anything that can be listed: it has an id, a person's name and a derived status.
///
/// For records the name is the owning client's name.
pub trait ListItem {
    type Status: Copy + PartialEq;

    fn id(&self) -> i64;
    fn first_name(&self) -> &str;
    fn last_name(&self) -> &str;
    fn status(&self) -> Self::Status;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    FirstName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than `desc` (case-insensitive) sorts ascending.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

/// One page of a listing, 1-indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub page: u32,
    pub total_pages: u32,
    pub total_items: usize,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageError {
    OutOfRange { page: u32, total_pages: u32 },
}

impl std::fmt::Display for PageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageError::OutOfRange { page, total_pages } => {
                write!(f, "page {} is outside 1..={}", page, total_pages)
            }
        }
    }
}

impl std::error::Error for PageError {}

pub fn filter_by_status<T: ListItem>(items: Vec<T>, status: T::Status) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| item.status() == status)
        .collect()
}

/// Case-insensitive substring match against first or last name.
/// A blank needle keeps every item.
pub fn filter_by_name<T: ListItem>(items: Vec<T>, name: &str) -> Vec<T> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }

    items
        .into_iter()
        .filter(|item| {
            item.first_name().to_lowercase().contains(&needle)
                || item.last_name().to_lowercase().contains(&needle)
        })
        .collect()
}

/// Stable sort; equal keys keep their incoming order in both directions.
pub fn sort_by<T: ListItem>(mut items: Vec<T>, field: SortField, direction: SortDirection) -> Vec<T> {
    let compare = |a: &T, b: &T| -> Ordering {
        match field {
            SortField::Id => a.id().cmp(&b.id()),
            SortField::FirstName => a
                .first_name()
                .to_lowercase()
                .cmp(&b.first_name().to_lowercase()),
        }
    };

    match direction {
        SortDirection::Asc => items.sort_by(|a, b| compare(a, b)),
        SortDirection::Desc => items.sort_by(|a, b| compare(b, a)),
    }
    items
}

/// Slices `items` into page `page` of `per_page` items.
///
/// `total_pages = ceil(total_items / per_page)`. A page outside
/// `1..=total_pages` is an error, never an empty page, so an empty
/// collection has no valid page at all.
pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> Result<Page<T>, PageError> {
    let total_items = items.len();
    let total_pages = if per_page == 0 {
        0
    } else {
        total_items.div_ceil(per_page as usize) as u32
    };

    if page == 0 || page > total_pages {
        return Err(PageError::OutOfRange { page, total_pages });
    }

    let offset = (page as usize - 1) * per_page as usize;
    let items = items
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();

    Ok(Page {
        page,
        total_pages,
        total_items,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        id: i64,
        first: &'static str,
        last: &'static str,
        late: bool,
    }

    impl ListItem for Person {
        type Status = bool;

        fn id(&self) -> i64 {
            self.id
        }

        fn first_name(&self) -> &str {
            self.first
        }

        fn last_name(&self) -> &str {
            self.last
        }

        fn status(&self) -> bool {
            self.late
        }
    }

    fn people() -> Vec<Person> {
        vec![
            Person { id: 3, first: "carla", last: "Souza", late: true },
            Person { id: 1, first: "Ana", last: "Lima", late: false },
            Person { id: 2, first: "Bruno", last: "Anacleto", late: true },
            Person { id: 4, first: "ana", last: "Reis", late: false },
        ]
    }

    fn ids(items: &[Person]) -> Vec<i64> {
        items.iter().map(|p| p.id).collect()
    }

    #[test]
    fn status_filter_is_exact() {
        assert_eq!(ids(&filter_by_status(people(), true)), vec![3, 2]);
        assert!(filter_by_status(Vec::<Person>::new(), true).is_empty());
    }

    #[test]
    fn name_filter_is_case_insensitive_contains_on_either_name() {
        assert_eq!(ids(&filter_by_name(people(), "ANA")), vec![1, 2, 4]);
        assert_eq!(ids(&filter_by_name(people(), "souz")), vec![3]);
        assert!(filter_by_name(people(), "zzz").is_empty());
        assert_eq!(filter_by_name(people(), "  ").len(), 4);
    }

    #[test]
    fn sort_by_id_both_directions() {
        assert_eq!(
            ids(&sort_by(people(), SortField::Id, SortDirection::Asc)),
            vec![1, 2, 3, 4]
        );
        assert_eq!(
            ids(&sort_by(people(), SortField::Id, SortDirection::Desc)),
            vec![4, 3, 2, 1]
        );
    }

    #[test]
    fn sort_by_first_name_is_stable() {
        // "Ana" (1) precedes "ana" (4) in the input and keeps that order
        assert_eq!(
            ids(&sort_by(people(), SortField::FirstName, SortDirection::Asc)),
            vec![1, 4, 2, 3]
        );
        assert_eq!(
            ids(&sort_by(people(), SortField::FirstName, SortDirection::Desc)),
            vec![3, 2, 1, 4]
        );
    }

    #[test]
    fn direction_defaults_to_ascending() {
        assert_eq!(SortDirection::from_query(None), SortDirection::Asc);
        assert_eq!(SortDirection::from_query(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::from_query(Some("DESC")), SortDirection::Desc);
        assert_eq!(SortDirection::from_query(Some("sideways")), SortDirection::Asc);
    }

    #[test]
    fn twenty_three_items_in_pages_of_ten() {
        let items: Vec<u32> = (1..=23).collect();

        let first = paginate(items.clone(), 1, 10).unwrap();
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 23);

        let last = paginate(items.clone(), 3, 10).unwrap();
        assert_eq!(last.items, vec![21, 22, 23]);

        assert_eq!(
            paginate(items, 4, 10),
            Err(PageError::OutOfRange {
                page: 4,
                total_pages: 3
            })
        );
    }

    #[test]
    fn final_page_holds_the_remainder() {
        for len in 1..=40usize {
            for per_page in 1..=12u32 {
                let items: Vec<usize> = (0..len).collect();
                let last = len.div_ceil(per_page as usize) as u32;
                let page = paginate(items, last, per_page).unwrap();
                assert_eq!(
                    page.items.len(),
                    len - (last as usize - 1) * per_page as usize
                );
                assert!(!page.items.is_empty());
            }
        }
    }

    #[test]
    fn empty_collection_and_degenerate_requests_are_out_of_range() {
        assert!(paginate(Vec::<u32>::new(), 1, 25).is_err());
        assert!(paginate(vec![1, 2, 3], 0, 25).is_err());
        assert!(paginate(vec![1, 2, 3], 1, 0).is_err());
    }
}
