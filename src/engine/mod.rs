pub mod browser;
pub mod normalization;
pub mod page_source;

pub use browser::BrowserPageSource;
pub use page_source::{PageSnapshot, PageSource, SourceError, SourceFuture, StaticPageSource};
