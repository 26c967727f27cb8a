use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use nt_core::config::Markers;
use nt_core::{ArticleSource, ContentBlock, ExtractedArticle};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::markup::isolate_body;
use crate::rules::{element_text, metadata_rules, ExtractionRule, Field};

lazy_static! {
    static ref IMG: Selector = Selector::parse("img").expect("static selector");
    static ref FIGCAPTION: Selector = Selector::parse("figcaption").expect("static selector");
}

/// Turns article page markup into an [`ExtractedArticle`]. Never fails:
/// whatever cannot be found is left empty.
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: Vec<ExtractionRule>,
    container: Option<Selector>,
    content: Option<Selector>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&Markers::default())
    }
}

impl Extractor {
    pub fn new(markers: &Markers) -> Self {
        Self {
            rules: metadata_rules(markers),
            container: parse_selector(&format!(
                "article[id^=\"{}\"]",
                markers.article_id_prefix
            )),
            content: parse_selector(&format!(".{}", markers.content)),
        }
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    pub fn extract_source(&self, source: &ArticleSource) -> ExtractedArticle {
        debug!(url = %source.url, bytes = source.markup.len(), "Extracting article");
        self.extract(&source.markup)
    }

    pub fn extract(&self, raw_html: &str) -> ExtractedArticle {
        let fragment = Html::parse_fragment(isolate_body(raw_html));

        let root = match self
            .container
            .as_ref()
            .and_then(|selector| fragment.select(selector).next())
        {
            Some(article) => article,
            None => {
                debug!("No article container found, using the whole body");
                fragment.root_element()
            }
        };

        let mut values = self.metadata(root);
        let mut take = |field: Field| values.remove(&field);

        let published_at = take(Field::PublishedAt).and_then(|raw| {
            let parsed = parse_timestamp(&raw);
            if parsed.is_none() {
                debug!(datetime = %raw, "Unparsable publication timestamp");
            }
            parsed
        });

        ExtractedArticle {
            author_name: take(Field::AuthorName).unwrap_or_default(),
            author_avatar_url: take(Field::AuthorAvatar),
            published_at,
            title: finish_title(take(Field::Title).unwrap_or_default()),
            lead: take(Field::Lead).unwrap_or_default(),
            cover_image_url: take(Field::CoverImage).unwrap_or_default(),
            view_count: take(Field::ViewCount).unwrap_or_default(),
            content_blocks: self.content_blocks(root),
        }
    }

    /// Runs every rule; when several rules target one field the first hit wins.
    fn metadata(&self, root: ElementRef<'_>) -> HashMap<Field, String> {
        let mut values = HashMap::new();
        for rule in &self.rules {
            match rule.apply(root) {
                Some(value) => {
                    values.entry(rule.field).or_insert(value);
                }
                None => debug!(field = rule.field.name(), selector = rule.selector(), "No match"),
            }
        }
        values
    }

    fn content_blocks(&self, root: ElementRef<'_>) -> Vec<ContentBlock> {
        let Some(container) = self
            .content
            .as_ref()
            .and_then(|selector| root.select(selector).next())
        else {
            debug!("No content container found");
            return Vec::new();
        };

        container
            .children()
            .filter_map(ElementRef::wrap)
            .filter_map(|child| match child.value().name() {
                "p" => {
                    let text = element_text(child);
                    (!text.is_empty()).then_some(ContentBlock::Text { text })
                }
                "figure" => Some(image_block(child)),
                _ => None,
            })
            .collect()
    }
}

/// Extracts with the default marker set.
pub fn extract(raw_html: &str) -> ExtractedArticle {
    Extractor::default().extract(raw_html)
}

fn parse_selector(raw: &str) -> Option<Selector> {
    match Selector::parse(raw) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!(selector = %raw, "Invalid selector: {}", e);
            None
        }
    }
}

fn image_block(figure: ElementRef<'_>) -> ContentBlock {
    let src = figure
        .select(&IMG)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| src.trim().to_string())
        .unwrap_or_default();
    let caption = figure
        .select(&FIGCAPTION)
        .next()
        .map(element_text)
        .filter(|caption| !caption.is_empty());
    ContentBlock::Image { src, caption }
}

/// Titles always read as a finished sentence.
fn finish_title(title: String) -> String {
    if title.is_empty() || title.ends_with(['.', '?', '!']) {
        title
    } else {
        title + "."
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
