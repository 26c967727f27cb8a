//! Named, independent metadata lookups. Each rule is a pure function of the
//! article root and only ever looks at the first matching element.

use nt_core::config::Markers;
use scraper::{ElementRef, Selector};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AuthorName,
    AuthorAvatar,
    PublishedAt,
    Title,
    Lead,
    CoverImage,
    ViewCount,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::AuthorName => "author_name",
            Field::AuthorAvatar => "author_avatar",
            Field::PublishedAt => "published_at",
            Field::Title => "title",
            Field::Lead => "lead",
            Field::CoverImage => "cover_image",
            Field::ViewCount => "view_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Text,
    Attr(&'static str),
}

#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub field: Field,
    pub source: ValueSource,
    raw_selector: String,
    selector: Option<Selector>,
}

impl ExtractionRule {
    /// Invalid selectors are logged and turn the rule into a permanent miss.
    pub fn new(field: Field, selector: impl Into<String>, source: ValueSource) -> Self {
        let raw_selector = selector.into();
        let selector = match Selector::parse(&raw_selector) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!(field = field.name(), selector = %raw_selector, "Invalid selector: {}", e);
                None
            }
        };
        Self {
            field,
            source,
            raw_selector,
            selector,
        }
    }

    pub fn selector(&self) -> &str {
        &self.raw_selector
    }

    /// Trimmed value of the first match; empty values count as absent.
    pub fn apply(&self, root: ElementRef<'_>) -> Option<String> {
        let selector = self.selector.as_ref()?;
        let element = root.select(selector).next()?;
        let value = match self.source {
            ValueSource::Text => element_text(element),
            ValueSource::Attr(name) => element.value().attr(name)?.trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    }
}

pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Metadata rules for the given marker set, in evaluation order.
pub fn metadata_rules(markers: &Markers) -> Vec<ExtractionRule> {
    use ValueSource::{Attr, Text};

    vec![
        ExtractionRule::new(Field::AuthorName, format!(".{}", markers.author_name), Text),
        ExtractionRule::new(
            Field::AuthorAvatar,
            format!("[class*=\"{}\"] > img", markers.author_avatar),
            Attr("src"),
        ),
        ExtractionRule::new(Field::PublishedAt, "time[datetime]", Attr("datetime")),
        ExtractionRule::new(Field::Title, format!("h1.{}", markers.title), Text),
        ExtractionRule::new(Field::Lead, format!(".{} p", markers.lead), Text),
        ExtractionRule::new(
            Field::CoverImage,
            format!(".{} img", markers.cover_image),
            Attr("src"),
        ),
        ExtractionRule::new(
            Field::ViewCount,
            format!("[data-testid=\"{}\"]", markers.views_test_id),
            Text,
        ),
    ]
}
