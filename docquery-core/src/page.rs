//! Pagination parameters for read requests.

use serde::{Deserialize, Serialize};

use crate::error::{DocQueryError, DocQueryResult};

/// Which page of results to fetch and how many items per page.
///
/// Pages are 1-indexed (page 1 is the first page). Backends translate a
/// pagination into a skip/limit pair.
///
/// # Example
///
/// ```ignore
/// use docquery::page::Pagination;
///
/// let params = Pagination::new(3, 20);
/// assert_eq!(params.offset(), 40);
/// assert_eq!(params.limit(), 20);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// The page number (1-indexed).
    pub page: u64,
    /// Number of items per page.
    pub per_page: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// Rejects page 0 and empty pages.
    pub fn validate(&self) -> DocQueryResult<()> {
        if self.page == 0 {
            return Err(DocQueryError::InvalidPagination("page numbers start at 1".into()));
        }
        if self.per_page == 0 {
            return Err(DocQueryError::InvalidPagination("per_page must be at least 1".into()));
        }

        Ok(())
    }

    /// Number of items to skip for this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Maximum number of items on this page.
    pub fn limit(&self) -> u64 {
        self.per_page
    }

    /// Slices an already materialized result set down to this page.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit()).unwrap_or(usize::MAX))
            .collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_for_first_page() {
        assert_eq!(Pagination::new(1, 25).offset(), 0);
        assert_eq!(Pagination::new(3, 20).offset(), 40);
    }

    #[test]
    fn apply_slices_middle_and_last_page() {
        let items: Vec<u32> = (1..=25).collect();

        assert_eq!(Pagination::new(2, 10).apply(items.clone()), (11..=20).collect::<Vec<_>>());
        assert_eq!(Pagination::new(3, 10).apply(items.clone()), vec![21, 22, 23, 24, 25]);
        assert!(Pagination::new(4, 10).apply(items).is_empty());
    }

    #[test]
    fn validate_rejects_zero_values() {
        assert!(Pagination::new(0, 10).validate().is_err());
        assert!(Pagination::new(1, 0).validate().is_err());
        assert!(Pagination::default().validate().is_ok());
    }
}
