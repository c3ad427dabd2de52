use std::cmp::Ordering;

use crate::model::Item;

/// Display order for the results table. Sorting never touches the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    None,
    Title,
    Author,
    Comments,
    Points,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::None => "None",
            SortKey::Title => "Title",
            SortKey::Author => "Author",
            SortKey::Comments => "Comments",
            SortKey::Points => "Points",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub key: SortKey,
    pub reverse: bool,
}

impl SortState {
    /// Picking the current key again flips direction; any other key starts
    /// in its natural direction.
    pub fn select(self, key: SortKey) -> SortState {
        SortState {
            key,
            reverse: self.key == key && !self.reverse,
        }
    }

    /// Title and author ascend, comments and points descend. Missing values
    /// go last when ascending.
    pub fn apply<'a>(&self, hits: &'a [Item]) -> Vec<&'a Item> {
        let mut sorted: Vec<&Item> = hits.iter().collect();
        match self.key {
            SortKey::None => {}
            SortKey::Title => sorted.sort_by(|a, b| missing_last(&a.title, &b.title)),
            SortKey::Author => sorted.sort_by(|a, b| missing_last(&a.author, &b.author)),
            SortKey::Comments => {
                sorted.sort_by(|a, b| missing_last(&a.num_comments, &b.num_comments));
                sorted.reverse();
            }
            SortKey::Points => {
                sorted.sort_by(|a, b| missing_last(&a.points, &b.points));
                sorted.reverse();
            }
        }
        if self.reverse {
            sorted.reverse();
        }
        sorted
    }
}

fn missing_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
