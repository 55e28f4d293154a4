//! Fixed-size paging over a [`UsageTable`]

use crate::models::UsageTable;
use serde::Serialize;

/// Rows shown per table page
pub const PAGE_SIZE: usize = 10;

/// Navigation metadata for one page of one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub first_page: usize,
    pub last_page: usize,
    pub previous_page: usize,
    pub next_page: usize,
    pub page_count: usize,
}

impl Pagination {
    fn new(page: usize, item_count: usize) -> Self {
        let total_pages = item_count.div_ceil(PAGE_SIZE).max(1);
        Self {
            page,
            first_page: 1,
            last_page: total_pages,
            previous_page: if page > 1 { page - 1 } else { 1 },
            next_page: if page.saturating_add(1) < total_pages { page + 1 } else { total_pages },
            page_count: total_pages,
        }
    }
}

/// Page `page` (1-based) of `table`.
///
/// Empty tables have no navigation. A page past the end yields an empty slice but still
/// carries metadata so the controls can lead back.
pub fn paginate(table: &UsageTable, page: usize) -> (UsageTable, Option<Pagination>) {
    if table.is_empty() {
        return (UsageTable::new(), None);
    }

    let page = page.max(1);
    let start = (page - 1).saturating_mul(PAGE_SIZE);
    (table.slice(start, PAGE_SIZE), Some(Pagination::new(page, table.len())))
}
