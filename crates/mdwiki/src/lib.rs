//! Markdown rendering pipeline for a personal wiki.
//!
//! [`Pipeline`] turns one page's markdown source into HTML that is safe to
//! embed in a page template:
//!
//! ```text
//! bytes -> strip \r -> parse -> render + resolve [Title] links -> sanitize
//! ```
//!
//! Whether a linked page exists is decided by a [`PageOracle`] supplied by
//! the caller. Any `Fn(&str) -> bool` works; [`PageDirectory`] checks for
//! page files on disk.
//!
//! # Example
//!
//! ```no_run
//! use mdwiki::{Config, PageDirectory, Pipeline};
//!
//! let config = Config::load(None, None)?;
//! let pages = PageDirectory::from_config(&config.pages_resolved);
//! let html = Pipeline::from_config(&config.render).render(b"See [FrontPage]", &pages)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod pages;
mod pipeline;

pub use error::RenderError;
pub use mdwiki_config::{CliSettings, Config, ConfigError, PagesConfig, RenderConfig};
pub use mdwiki_renderer::{LookupError, PageOracle, RenderStats};
pub use pages::PageDirectory;
pub use pipeline::Pipeline;
