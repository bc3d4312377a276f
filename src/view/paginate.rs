//! Fixed-size paging over an already-filtered, already-sorted collection.
//! Out-of-range requests clamp; nothing here fails or wraps around.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    /// 1-indexed.
    pub current_page: usize,
    pub page_size: usize,
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    /// `max(1, ceil(count / page_size))`.
    pub fn total_pages(&self, count: usize) -> usize {
        count.div_ceil(self.page_size).max(1)
    }

    pub fn clamp(&mut self, count: usize) {
        self.current_page = self.current_page.clamp(1, self.total_pages(count));
    }

    pub fn first(&mut self) {
        self.current_page = 1;
    }

    pub fn next(&mut self, count: usize) {
        if self.current_page < self.total_pages(count) {
            self.current_page += 1;
        }
    }

    pub fn previous(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    pub fn go_to(&mut self, page: usize, count: usize) {
        self.current_page = page;
        self.clamp(count);
    }

    /// Index range of the current page within a collection of `count`.
    pub fn bounds(&self, count: usize) -> std::ops::Range<usize> {
        let start = ((self.current_page - 1) * self.page_size).min(count);
        let end = (start + self.page_size).min(count);
        start..end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.bounds(items.len())]
    }
}
