use serde::{Deserialize, Serialize};

/// A bounded slice of a filtered, sorted result set plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matching rows across all pages.
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        Self {
            items,
            total,
            page,
            per_page,
        }
    }

    /// Number of the last non-empty page, at least 1.
    pub fn last_page(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 1-based position of the first item on this page.
    pub fn first_item(&self) -> Option<u64> {
        (!self.items.is_empty()).then(|| self.page.saturating_sub(1).saturating_mul(self.per_page) + 1)
    }

    /// 1-based position of the last item on this page.
    pub fn last_item(&self) -> Option<u64> {
        self.first_item()
            .map(|first| first + self.items.len() as u64 - 1)
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page_rounds_up() {
        let page = Page::new(vec![1, 2, 3], 23, 1, 10);
        assert_eq!(page.last_page(), 3);
    }

    #[test]
    fn test_last_page_of_empty_set_is_one() {
        let page: Page<u8> = Page::new(vec![], 0, 1, 10);
        assert_eq!(page.last_page(), 1);
        assert_eq!(page.first_item(), None);
    }

    #[test]
    fn test_item_positions() {
        let page = Page::new(vec!["a", "b"], 12, 2, 5);
        assert_eq!(page.first_item(), Some(6));
        assert_eq!(page.last_item(), Some(7));
    }
}
