//! Paginated listing envelope.
//!
//! List endpoints answer in one of three shapes:
//!
//! - API resource collections: `{ data, links: {first,last,prev,next}, meta: {...} }`
//! - framework paginators: `{ data, current_page, last_page, per_page, total, from, to,
//!   next_page_url, prev_page_url, links: [...] }`
//! - plain arrays for non-paginated lists
//!
//! All of them deserialize into the same [`Page`].

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::value_object::ValueObject;

/// Pagination counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
    #[serde(default)]
    pub from: Option<u64>,
    #[serde(default)]
    pub to: Option<u64>,
}

impl ValueObject for PageMeta {}

/// Navigation links (absolute URLs as produced by the server).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

/// One page of a server listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
    pub links: PageLinks,
}

impl<T> Page<T> {
    /// Wrap a non-paginated list as a single page.
    pub fn from_items(data: Vec<T>) -> Self {
        let len = data.len() as u64;
        Self {
            meta: PageMeta {
                current_page: 1,
                last_page: 1,
                per_page: data.len() as u32,
                total: len,
                from: (len > 0).then_some(1),
                to: (len > 0).then_some(len),
            },
            links: PageLinks::default(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total number of records across all pages (server-reported).
    pub fn total(&self) -> u64 {
        self.meta.total
    }

    pub fn has_next_page(&self) -> bool {
        self.meta.current_page < self.meta.last_page
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
            links: self.links,
        }
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

#[derive(Deserialize)]
struct PaginatorBody<T> {
    data: Vec<T>,
    current_page: u32,
    last_page: u32,
    per_page: u32,
    total: u64,
    #[serde(default)]
    from: Option<u64>,
    #[serde(default)]
    to: Option<u64>,
    #[serde(default)]
    first_page_url: Option<String>,
    #[serde(default)]
    last_page_url: Option<String>,
    #[serde(default)]
    prev_page_url: Option<String>,
    #[serde(default)]
    next_page_url: Option<String>,
}

#[derive(Deserialize)]
struct ResourceBody<T> {
    data: Vec<T>,
    #[serde(default)]
    links: PageLinks,
    meta: PageMeta,
}

impl<T> From<PaginatorBody<T>> for Page<T> {
    fn from(p: PaginatorBody<T>) -> Self {
        Page {
            data: p.data,
            meta: PageMeta {
                current_page: p.current_page,
                last_page: p.last_page,
                per_page: p.per_page,
                total: p.total,
                from: p.from,
                to: p.to,
            },
            links: PageLinks {
                first: p.first_page_url,
                last: p.last_page_url,
                prev: p.prev_page_url,
                next: p.next_page_url,
            },
        }
    }
}

impl<'de, T> Deserialize<'de> for Page<T>
where
    T: DeserializeOwned,
{
    /// The shape is chosen from the envelope's keys before any row is read,
    /// so a bad row reports its own error rather than a shape mismatch.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let page = if value.is_array() {
            serde_json::from_value::<Vec<T>>(value).map(Page::from_items)
        } else if value.get("meta").is_some() {
            serde_json::from_value::<ResourceBody<T>>(value).map(|r| Page {
                data: r.data,
                meta: r.meta,
                links: r.links,
            })
        } else if value.get("current_page").is_some() {
            serde_json::from_value::<PaginatorBody<T>>(value).map(Page::from)
        } else {
            return Err(D::Error::custom(
                "expected a listing: an array, a resource collection or a paginator",
            ));
        };
        page.map_err(D::Error::custom)
    }
}
