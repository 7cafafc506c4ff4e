//! In-memory filter, sort and paginate over a fetched collection.
//!
//! Every request recomputes the page from the full list: free-text search is
//! a case-insensitive substring match over a fixed set of fields, each facet
//! filter is an exact match where an empty value means "any", and the sort
//! key is fixed per entity.

use serde::Deserialize;
use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::pagination::{PaginationMeta, PaginationQuery};

#[derive(Debug, Clone, PartialEq)]
pub enum SortValue<'a> {
    Text(&'a str),
    Number(Option<f64>),
    Time(DateTime<Utc>),
}

impl SortValue<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (SortValue::Number(a), SortValue::Number(b)) => match (a, b) {
                (Some(a), Some(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            },
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

pub trait SortKey: Copy {
    fn descending_by_default(&self) -> bool;
}

pub trait Listable {
    type Sort: SortKey;

    fn search_fields(&self) -> Vec<&str>;

    fn facet(&self, field: &str) -> Option<Cow<'_, str>>;

    fn sort_value(&self, key: Self::Sort) -> SortValue<'_>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct Facet {
    pub field: &'static str,
    pub value: String,
}

impl Facet {
    pub fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListQuery<S> {
    pub search: String,
    pub facets: Vec<Facet>,
    pub sort: S,
    pub order: Option<SortOrder>,
    pub pagination: PaginationQuery,
}

#[derive(Debug)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

fn matches_search<T: Listable>(item: &T, needle: &str) -> bool {
    needle.is_empty()
        || item
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

fn matches_facets<T: Listable>(item: &T, facets: &[Facet]) -> bool {
    facets
        .iter()
        .filter(|facet| !facet.value.is_empty())
        .all(|facet| {
            item.facet(facet.field)
                .map(|value| value == facet.value.as_str())
                .unwrap_or(false)
        })
}

pub fn apply<T>(items: &[T], query: &ListQuery<T::Sort>) -> ListPage<T>
where
    T: Listable + Clone,
{
    let needle = query.search.trim().to_lowercase();

    let mut matched: Vec<&T> = items
        .iter()
        .filter(|item| matches_search(*item, &needle) && matches_facets(*item, &query.facets))
        .collect();

    let descending = match query.order {
        Some(order) => order == SortOrder::Desc,
        None => query.sort.descending_by_default(),
    };

    // Stable sort, so ties keep the fetch order (newest first).
    matched.sort_by(|a, b| {
        let ordering = a.sort_value(query.sort).compare(&b.sort_value(query.sort));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });

    let mut pagination = query.pagination;
    pagination.validate();

    let total_items = matched.len();
    let items = matched
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.per_page)
        .cloned()
        .collect();

    ListPage {
        items,
        meta: PaginationMeta::new(pagination.page, pagination.per_page, total_items),
    }
}
