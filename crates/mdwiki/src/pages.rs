//! Filesystem-backed page existence.

use std::io;
use std::path::{Path, PathBuf};

use mdwiki_config::PagesConfig;
use mdwiki_renderer::{LookupError, PageOracle, is_valid_title};

/// Directory storing one `{title}{extension}` file per page.
///
/// Answers [`PageOracle`] queries by checking for the page file. Nothing is
/// cached; every query hits the filesystem.
#[derive(Clone, Debug)]
pub struct PageDirectory {
    root: PathBuf,
    extension: String,
}

impl PageDirectory {
    /// Create a directory oracle for pages stored under `root`.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Create a directory oracle from resolved page configuration.
    #[must_use]
    pub fn from_config(config: &PagesConfig) -> Self {
        Self::new(config.source_dir.clone(), config.extension.clone())
    }

    /// Directory holding the page files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file storing `title`.
    ///
    /// Returns `None` for titles that are not plain alphanumeric names, so a
    /// title can never point outside the directory.
    #[must_use]
    pub fn page_path(&self, title: &str) -> Option<PathBuf> {
        is_valid_title(title).then(|| self.root.join(format!("{title}{}", self.extension)))
    }
}

impl PageOracle for PageDirectory {
    fn page_exists(&self, title: &str) -> Result<bool, LookupError> {
        let Some(path) = self.page_path(title) else {
            return Ok(false);
        };
        match path.metadata() {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(LookupError::new(title, e)),
        }
    }
}
