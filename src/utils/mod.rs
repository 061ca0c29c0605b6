//! Request helpers shared by the modules.

use bookshelf_db::{PageError, PageRequest};
use bookshelf_kernel::settings::PaginationSettings;
use serde::Deserialize;

/// `page`, `size`, and `sort` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl PageQuery {
    /// Fill unset parameters from the configured defaults and validate.
    pub fn into_request(self, settings: &PaginationSettings) -> Result<PageRequest, PageError> {
        let sort = self
            .sort
            .filter(|sort| !sort.trim().is_empty())
            .unwrap_or_else(|| settings.default_sort.clone());

        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(settings.default_size),
            settings.max_size,
            &sort,
        )
    }
}
