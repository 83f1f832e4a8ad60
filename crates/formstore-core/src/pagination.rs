use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub page_number: u32,
    pub is_current: bool,
    pub is_first: bool,
    pub is_last: bool,
}

/// Paging metadata for one listing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total_count: u64,
    pub current_page: u32,
    pub items_per_page: u32,
    pub number_of_pages: u32,
    pub pages: Vec<PageLink>,
}

impl Pagination {
    /// Pages below 1 are treated as page 1, and `items_per_page` as at least 1.
    pub fn new(total_count: u64, current_page: u32, items_per_page: u32) -> Self {
        let current_page = current_page.max(1);
        let items_per_page = items_per_page.max(1);
        let number_of_pages = page_count(total_count, items_per_page);

        let pages = (1..=number_of_pages)
            .map(|page_number| PageLink {
                page_number,
                is_current: page_number == current_page,
                is_first: page_number == 1,
                is_last: page_number == number_of_pages,
            })
            .collect();

        Self {
            total_count,
            current_page,
            items_per_page,
            number_of_pages,
            pages,
        }
    }

    /// Row offset of the first record on `page`.
    pub fn offset(page: u32, items_per_page: u32) -> u64 {
        u64::from(page.max(1) - 1) * u64::from(items_per_page)
    }

    pub fn is_in_range(&self) -> bool {
        self.current_page <= self.number_of_pages
    }
}

/// Pages needed for `total_count` items, saturating at `u32::MAX`.
fn page_count(total_count: u64, items_per_page: u32) -> u32 {
    let pages = total_count.div_ceil(u64::from(items_per_page.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
