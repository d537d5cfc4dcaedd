/// The single position of a run's listing chain
///
/// Only the coordinator's listing loop owns and moves the cursor; product
/// fetches never touch it, so pages of one category are visited strictly in
/// increasing order and categories strictly in configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlCursor {
    /// Index into the configured category sequence
    pub category_index: usize,

    /// 1-based listing page within the category
    pub page: u32,
}

impl CrawlCursor {
    /// Creates a cursor on page 1 of the given category
    pub fn new(category_index: usize) -> Self {
        Self {
            category_index,
            page: 1,
        }
    }

    /// Moves to the next page of the current category
    pub fn advance_page(&mut self) {
        self.page += 1;
    }

    /// Moves to page 1 of another category
    pub fn move_to_category(&mut self, category_index: usize) {
        self.category_index = category_index;
        self.page = 1;
    }
}
