//! wiki::page
//!
//! Pages as explicit values scanned from a tree.
//!
//! A page has no state of its own: it exists exactly when `<name>.md`
//! exists in the tree being looked at. The filesystem (or the store's
//! branch tip) stays the source of truth; these types are query results.

use std::path::{Path, PathBuf};

use crate::core::naming::{page_file_name, page_name_from_file, to_page_url};

/// A page found in a tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WikiPage {
    /// Sanitized page name (the file stem)
    pub name: String,
    /// File name within the tree (`<name>.md`)
    pub file_name: String,
}

impl WikiPage {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let file_name = page_file_name(&name);
        Self { name, file_name }
    }

    /// Recover a page from a file name, if it is a page file at all.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        page_name_from_file(file_name).map(Self::new)
    }

    /// URL token for linking to this page.
    pub fn url_token(&self) -> String {
        to_page_url(&self.name)
    }
}

/// Result of looking up a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    Found(WikiPage),
    Missing(WikiPage),
}

impl PageLookup {
    pub fn exists(&self) -> bool {
        matches!(self, PageLookup::Found(_))
    }

    pub fn page(&self) -> &WikiPage {
        match self {
            PageLookup::Found(page) | PageLookup::Missing(page) => page,
        }
    }
}

/// Path of `page` inside the working directory `root`.
pub fn page_path(root: &Path, page: &WikiPage) -> PathBuf {
    root.join(&page.file_name)
}

/// Look up `name` in the working directory `root`.
///
/// Existence follows symlinks: a link whose target exists counts as an
/// existing page, a dangling link does not.
pub fn probe_dir(root: &Path, name: &str) -> PageLookup {
    let page = WikiPage::new(name);
    if page_path(root, &page).exists() {
        PageLookup::Found(page)
    } else {
        PageLookup::Missing(page)
    }
}

/// Pages among a list of tree entry names, sorted by name.
pub fn pages_from_file_names<I, S>(names: I) -> Vec<WikiPage>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pages: Vec<WikiPage> = names
        .into_iter()
        .filter_map(|name| WikiPage::from_file_name(name.as_ref()))
        .collect();
    pages.sort();
    pages
}
