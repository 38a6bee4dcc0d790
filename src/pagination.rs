//! In-memory pagination over an ordered slice.
//!
//! Everything here is pure: a page is computed from the items, the page
//! number and the page size, nothing else.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::remote::types::Employee;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page size the HTTP layer lets through.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
  #[error("Page size must be at least 1")]
  ZeroSize,
  #[error("Unknown sort key '{0}', expected name, salary or age")]
  UnknownSortKey(String),
  #[error("Unknown sort direction '{0}', expected asc or desc")]
  UnknownDirection(String),
}

/// Field a page can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
  Name,
  Salary,
  Age,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
  #[default]
  Asc,
  Desc,
}

/// Single-key ordering, written as `key` or `key,dir` (e.g. `salary,desc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
  pub key: SortKey,
  pub direction: Direction,
}

impl Sort {
  pub fn compare(&self, a: &Employee, b: &Employee) -> Ordering {
    let ordering = match self.key {
      SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
      SortKey::Salary => a.salary.cmp(&b.salary),
      SortKey::Age => a.age.cmp(&b.age),
    };
    match self.direction {
      Direction::Asc => ordering,
      Direction::Desc => ordering.reverse(),
    }
  }
}

impl FromStr for Sort {
  type Err = PaginationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (key, direction) = match s.split_once(',') {
      Some((key, direction)) => (key, Some(direction)),
      None => (s, None),
    };

    let key = match key.trim().to_lowercase().as_str() {
      "name" => SortKey::Name,
      "salary" => SortKey::Salary,
      "age" => SortKey::Age,
      _ => return Err(PaginationError::UnknownSortKey(key.trim().to_string())),
    };

    let direction = match direction.map(|d| d.trim().to_lowercase()) {
      None => Direction::Asc,
      Some(d) if d == "asc" => Direction::Asc,
      Some(d) if d == "desc" => Direction::Desc,
      Some(d) => return Err(PaginationError::UnknownDirection(d)),
    };

    Ok(Sort { key, direction })
  }
}

impl fmt::Display for Sort {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let key = match self.key {
      SortKey::Name => "name",
      SortKey::Salary => "salary",
      SortKey::Age => "age",
    };
    let direction = match self.direction {
      Direction::Asc => "asc",
      Direction::Desc => "desc",
    };
    write!(f, "{},{}", key, direction)
  }
}

/// Which page to return. `size` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationRequest {
  page: u32,
  size: u32,
  sort: Option<Sort>,
}

impl Default for PaginationRequest {
  fn default() -> Self {
    Self {
      page: 0,
      size: DEFAULT_PAGE_SIZE,
      sort: None,
    }
  }
}

impl PaginationRequest {
  pub fn new(page: u32, size: u32) -> Result<Self, PaginationError> {
    if size == 0 {
      return Err(PaginationError::ZeroSize);
    }
    Ok(Self {
      page,
      size,
      sort: None,
    })
  }

  pub fn with_sort(mut self, sort: Option<Sort>) -> Self {
    self.sort = sort;
    self
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn size(&self) -> u32 {
    self.size
  }

  pub fn sort(&self) -> Option<Sort> {
    self.sort
  }

  /// Index of the first item on this page.
  pub fn offset(&self) -> u64 {
    u64::from(self.page) * u64::from(self.size)
  }

  pub fn next_page(&self) -> Self {
    Self {
      page: self.page.saturating_add(1),
      ..*self
    }
  }

  pub fn previous_page(&self) -> Self {
    Self {
      page: self.page.saturating_sub(1),
      ..*self
    }
  }
}

/// One page of results plus the metadata derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagedResult<T> {
  pub content: Vec<T>,
  pub page: u32,
  pub size: u32,
  pub total_elements: u64,
  pub total_pages: u64,
  pub first: bool,
  pub last: bool,
  pub has_next: bool,
  pub has_previous: bool,
  /// Items on this page
  pub number_of_elements: usize,
  pub empty: bool,
}

impl<T> PagedResult<T> {
  /// Build a page, deriving every flag from `page`, `size` and
  /// `total_elements`. An empty result set is both first and last.
  pub fn new(content: Vec<T>, page: u32, size: u32, total_elements: u64) -> Self {
    let total_pages = total_elements.div_ceil(u64::from(size.max(1)));
    let page_number = u64::from(page);

    Self {
      page,
      size,
      total_elements,
      total_pages,
      first: page == 0 || total_elements == 0,
      last: page_number + 1 >= total_pages,
      has_next: page_number + 1 < total_pages,
      has_previous: page > 0,
      number_of_elements: content.len(),
      empty: content.is_empty(),
      content,
    }
  }

  pub fn number_of_elements(&self) -> usize {
    self.number_of_elements
  }

  pub fn is_empty(&self) -> bool {
    self.empty
  }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
    PagedResult {
      content: self.content.into_iter().map(f).collect(),
      page: self.page,
      size: self.size,
      total_elements: self.total_elements,
      total_pages: self.total_pages,
      first: self.first,
      last: self.last,
      has_next: self.has_next,
      has_previous: self.has_previous,
      number_of_elements: self.number_of_elements,
      empty: self.empty,
    }
  }
}

/// Slice `items` into the requested page. Pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], request: &PaginationRequest) -> PagedResult<T> {
  let total = items.len();
  let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);

  let content = if offset < total {
    let end = offset.saturating_add(request.size() as usize).min(total);
    items[offset..end].to_vec()
  } else {
    Vec::new()
  };

  PagedResult::new(content, request.page(), request.size(), total as u64)
}
