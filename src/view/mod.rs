pub mod pagination;

use std::cmp::Ordering;

use crate::catalog::Product;

pub use pagination::{page_window, PageLink};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortKey {
    Id,
    Title,
    Price,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "id" => Some(Self::Id),
            "title" | "name" => Some(Self::Title),
            "price" => Some(Self::Price),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Title => "title",
            SortKey::Price => "price",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewQuery<'a> {
    pub search: &'a str,
    pub sort: Option<(SortKey, SortDirection)>,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Clone, Debug)]
pub struct ViewSlice<'a> {
    pub rows: Vec<&'a Product>,
    pub filtered_count: usize,
    pub total_pages: usize,
}

pub fn filter<'a>(records: &'a [Product], search: &str) -> Vec<&'a Product> {
    let needle = search.to_lowercase();
    if needle.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|p| p.title.to_lowercase().contains(&needle))
        .collect()
}

fn compare(a: &Product, b: &Product, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Title => a.title.as_str().cmp(b.title.as_str()),
        SortKey::Price => a.price.total_cmp(&b.price),
    }
}

/// Stable: equal keys keep their input order in both directions.
pub fn sort(rows: &mut [&Product], key: SortKey, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

pub fn paginate<'a, T>(rows: &'a [T], page: usize, page_size: usize) -> &'a [T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= rows.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(rows.len());
    &rows[start..end]
}

pub fn run<'a>(records: &'a [Product], query: &ViewQuery<'_>) -> ViewSlice<'a> {
    let mut rows = filter(records, query.search);
    if let Some((key, direction)) = query.sort {
        sort(&mut rows, key, direction);
    }
    let filtered_count = rows.len();
    let total_pages = total_pages(filtered_count, query.page_size);
    let rows = paginate(&rows, query.page, query.page_size).to_vec();
    ViewSlice {
        rows,
        filtered_count,
        total_pages,
    }
}
