use std::cmp::Ordering;

use serde::Serialize;
use thiserror::Error;

/// Entities that can be ordered by a named field.
pub trait Sortable {
    /// Field names accepted by [`Sortable::compare_by`].
    const SORT_FIELDS: &'static [&'static str];

    /// Compare two entities on `field`. Only called with a name from
    /// [`Sortable::SORT_FIELDS`].
    fn compare_by(&self, other: &Self, field: &str) -> Ordering;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("page size must be between 1 and {max}, got {size}")]
    InvalidSize { size: u32, max: u32 },

    #[error("cannot sort by '{field}'; expected one of: {allowed}")]
    UnknownSortField { field: String, allowed: String },

    #[error("unknown sort direction '{0}'; expected asc or desc")]
    UnknownDirection(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Sort clause in the `field` or `field,desc` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Result<Self, PageError> {
        let mut parts = raw.splitn(2, ',');
        let field = parts.next().unwrap_or_default().trim().to_string();
        let direction = match parts.next().map(|d| d.trim().to_ascii_lowercase()) {
            None => Direction::Asc,
            Some(d) if d == "asc" => Direction::Asc,
            Some(d) if d == "desc" => Direction::Desc,
            Some(other) => return Err(PageError::UnknownDirection(other)),
        };
        Ok(Self { field, direction })
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: SortOrder,
}

impl PageRequest {
    pub fn new(page: u32, size: u32, max_size: u32, sort: &str) -> Result<Self, PageError> {
        if size == 0 || size > max_size {
            return Err(PageError::InvalidSize {
                size,
                max: max_size,
            });
        }
        Ok(Self {
            page,
            size,
            sort: SortOrder::parse(sort)?,
        })
    }

    /// Reject sort fields the entity does not know about.
    pub fn ensure_sortable<T: Sortable>(&self) -> Result<(), PageError> {
        if T::SORT_FIELDS.contains(&self.sort.field.as_str()) {
            Ok(())
        } else {
            Err(PageError::UnknownSortField {
                field: self.sort.field.clone(),
                allowed: T::SORT_FIELDS.join(", "),
            })
        }
    }

    /// Sort `items` and cut out the requested page.
    pub fn apply<T: Sortable>(&self, mut items: Vec<T>) -> Result<Page<T>, PageError> {
        self.ensure_sortable::<T>()?;

        items.sort_by(|a, b| {
            let ordering = a.compare_by(b, &self.sort.field);
            match self.sort.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        });

        let total_elements = items.len() as u64;
        let total_pages = total_elements.div_ceil(u64::from(self.size)) as u32;
        let start = (self.page as usize).saturating_mul(self.size as usize);
        let content = items
            .into_iter()
            .skip(start)
            .take(self.size as usize)
            .collect();

        Ok(Page {
            content,
            page: self.page,
            size: self.size,
            total_elements,
            total_pages,
        })
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}
