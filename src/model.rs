use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cache partition key. Compared by exact string equality.
pub type SearchKey = String;

/// One search hit. Only `id` matters to the cache; everything else is
/// carried through for the renderer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Item {
    #[serde(rename = "objectID")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub num_comments: Option<u64>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_num_comments(mut self, num_comments: u64) -> Self {
        self.num_comments = Some(num_comments);
        self
    }

    pub fn with_points(mut self, points: i64) -> Self {
        self.points = Some(points);
        self
    }
}

/// A single fetch response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ResultPage {
    pub hits: Vec<Item>,
    pub page: u32,
}

impl ResultPage {
    pub fn new(hits: Vec<Item>, page: u32) -> Self {
        Self { hits, page }
    }
}

/// Everything fetched so far for one key, in fetch order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheEntry {
    pub hits: Vec<Item>,
    pub page: u32,
}
