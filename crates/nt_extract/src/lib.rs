pub mod extractor;
pub mod fetch;
pub mod markup;
pub mod rules;

pub use extractor::{extract, Extractor};
pub use fetch::{fetcher_for, FileFetcher, HttpFetcher};
pub use rules::{ExtractionRule, Field, ValueSource};

pub mod prelude {
    pub use super::extractor::{extract, Extractor};
    pub use super::fetch::fetcher_for;
    pub use nt_core::{ArticleSource, ContentBlock, Error, ExtractedArticle, MarkupFetcher, Result};
}
