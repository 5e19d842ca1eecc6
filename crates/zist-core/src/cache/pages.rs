//! Paged gist collection as held in the cache.

use crate::models::GistRecord;
use serde::{Deserialize, Serialize};

/// Pages of a gist listing, in the order they were fetched.
///
/// `next_page` is `None` once an empty page has been seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GistPages {
    pub pages: Vec<Vec<GistRecord>>,
    pub next_page: Option<u32>,
}

impl Default for GistPages {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            next_page: Some(crate::config::NetworkConfig::FIRST_PAGE),
        }
    }
}

impl GistPages {
    /// Append a fetched page. An empty page marks the end of the listing.
    pub fn push_page(&mut self, page_number: u32, page: Vec<GistRecord>) {
        if page.is_empty() {
            self.next_page = None;
            return;
        }
        self.pages.push(page);
        self.next_page = Some(page_number + 1);
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_page.is_none()
    }

    /// All records across pages, in page order.
    pub fn flatten(&self) -> Vec<GistRecord> {
        self.pages.iter().flatten().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, id: &str) -> Option<&GistRecord> {
        self.pages.iter().flatten().find(|gist| gist.id == id)
    }

    /// Replace every record with `id` by `f(record)`. Returns how many matched.
    pub fn update_record(&mut self, id: &str, f: impl Fn(&GistRecord) -> GistRecord) -> usize {
        let mut matched = 0;
        for gist in self.pages.iter_mut().flatten() {
            if gist.id == id {
                *gist = f(gist);
                matched += 1;
            }
        }
        matched
    }

    /// Remove every record with `id`. Returns how many were removed.
    pub fn remove_record(&mut self, id: &str) -> usize {
        let before = self.len();
        for page in &mut self.pages {
            page.retain(|gist| gist.id != id);
        }
        before - self.len()
    }

    /// Insert a record at the front of the first page.
    pub fn prepend(&mut self, record: GistRecord) {
        match self.pages.first_mut() {
            Some(first) => first.insert(0, record),
            None => self.pages.push(vec![record]),
        }
    }
}
