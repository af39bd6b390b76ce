/// Result range covered by one listing page
///
/// Page `p` (0-based) asks for results `[p * N + 1, (p + 1) * N]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub first: u32,
    pub last: u32,
}

impl PageWindow {
    pub fn new(page: u32, results_per_page: u32) -> Self {
        Self {
            page,
            first: page * results_per_page + 1,
            last: (page + 1) * results_per_page,
        }
    }

    /// Fill the `{m}` and `{n}` placeholders of a listing URL template
    pub fn listing_url(&self, template: &str) -> String {
        template
            .replace("{m}", &self.first.to_string())
            .replace("{n}", &self.last.to_string())
    }

    /// 1-based page number used in log messages
    pub fn display_number(&self) -> u32 {
        self.page + 1
    }
}
