//! Article body extraction from arbitrary HTML.
//!
//! There is no common markup for "the article" across news sites, so the
//! body is guessed by an ordered cascade of [`Strategy`] values. Each one is
//! a pure function of the parsed document; the first that yields text wins.
//! Structural signals come first, noisy paragraph counting after, and the
//! page's own social-preview description last.
//!
//! Text inside `script`, `style`, `nav`, `header`, `footer`, `aside`,
//! `iframe` and `noscript` never counts, and neither do elements nested in
//! them.

use crate::models::CONTENT_MAX_CHARS;
use crate::utils::{clean_text, collapse_whitespace, truncate_chars};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::fmt;

const NOISE_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "iframe", "noscript",
];

/// Class names that suggest an element holds article text.
static BODY_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(article|content|body|text|post)").unwrap());

static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static BLOCK: Lazy<Selector> = Lazy::new(|| Selector::parse("p, div").unwrap());
static REGION: Lazy<Selector> = Lazy::new(|| Selector::parse("div, section").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:description"]"#).unwrap());
static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());

/// Minimum paragraph count for a classed region to count as the body.
const REGION_MIN_PARAGRAPHS: usize = 4;
/// A paragraph must be longer than this to survive the page-wide scan.
const PARAGRAPH_MIN_CHARS: usize = 50;
const PARAGRAPH_SCAN_MAX: usize = 10;

/// One step of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Classed blocks inside the first `<article>`.
    ArticleRegion,
    /// First classed `div`/`section` with enough paragraphs.
    ClassedContainer,
    /// Long paragraphs anywhere on the page.
    ParagraphScan,
    /// `og:description` or `<meta name="description">`.
    MetaDescription,
}

impl Strategy {
    /// The cascade, in priority order.
    pub const CASCADE: [Strategy; 4] = [
        Strategy::ArticleRegion,
        Strategy::ClassedContainer,
        Strategy::ParagraphScan,
        Strategy::MetaDescription,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::ArticleRegion => "article_region",
            Strategy::ClassedContainer => "classed_container",
            Strategy::ParagraphScan => "paragraph_scan",
            Strategy::MetaDescription => "meta_description",
        }
    }

    /// Run this strategy alone.
    pub fn apply(self, document: &Html) -> Option<String> {
        let text = match self {
            Strategy::ArticleRegion => article_region(document),
            Strategy::ClassedContainer => classed_container(document),
            Strategy::ParagraphScan => paragraph_scan(document),
            Strategy::MetaDescription => meta_description(document),
        }?;
        (!text.trim().is_empty()).then_some(text)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of running the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub content: String,
    /// The strategy that produced `content`, `None` when nothing matched.
    pub strategy: Option<Strategy>,
}

/// Extract the article body from `html`.
///
/// Never fails: an empty string means no body was found. The output has
/// whitespace collapsed, is at most 2000 characters long and is trimmed.
/// The pipeline itself calls [`extract_detailed`] to also log the strategy.
#[cfg(test)]
pub fn extract(html: &str) -> String {
    extract_detailed(html).content
}

/// Run the cascade and report which strategy won alongside the content.
pub fn extract_detailed(html: &str) -> Extraction {
    let document = Html::parse_document(html);
    for strategy in Strategy::CASCADE {
        if let Some(raw) = strategy.apply(&document) {
            return Extraction {
                content: finish(&raw),
                strategy: Some(strategy),
            };
        }
    }
    Extraction {
        content: String::new(),
        strategy: None,
    }
}

fn finish(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    truncate_chars(&collapsed, CONTENT_MAX_CHARS).trim().to_string()
}

fn article_region(document: &Html) -> Option<String> {
    let article = document.select(&ARTICLE).find(|el| !in_noise(el))?;
    join_texts(
        article
            .select(&BLOCK)
            .filter(|el| !in_noise(el) && has_body_class(el)),
    )
}

fn classed_container(document: &Html) -> Option<String> {
    document
        .select(&REGION)
        .filter(|el| !in_noise(el) && has_body_class(el))
        .find_map(|region| {
            let paragraphs: Vec<ElementRef<'_>> = region
                .select(&PARAGRAPH)
                .filter(|p| !in_noise(p))
                .collect();
            if paragraphs.len() >= REGION_MIN_PARAGRAPHS {
                join_texts(paragraphs.into_iter())
            } else {
                None
            }
        })
}

fn paragraph_scan(document: &Html) -> Option<String> {
    let paragraphs: Vec<ElementRef<'_>> = document
        .select(&PARAGRAPH)
        .filter(|p| !in_noise(p))
        .collect();
    if paragraphs.len() <= 3 {
        return None;
    }

    let long: Vec<String> = paragraphs
        .iter()
        .map(|p| visible_text(*p))
        .filter(|text| text.chars().count() > PARAGRAPH_MIN_CHARS)
        .collect();
    if long.len() > 2 {
        Some(long.into_iter().take(PARAGRAPH_SCAN_MAX).collect::<Vec<_>>().join("\n"))
    } else {
        None
    }
}

fn meta_description(document: &Html) -> Option<String> {
    [&*OG_DESCRIPTION, &*META_DESCRIPTION]
        .into_iter()
        .filter_map(|selector| document.select(selector).next())
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::to_string)
        .find(|content| !content.trim().is_empty())
}

fn has_body_class(element: &ElementRef<'_>) -> bool {
    element.value().classes().any(|class| BODY_CLASS.is_match(class))
}

fn in_noise(element: &ElementRef<'_>) -> bool {
    NOISE_TAGS.contains(&element.value().name())
        || element.ancestors().any(|node| {
            node.value()
                .as_element()
                .is_some_and(|el| NOISE_TAGS.contains(&el.name()))
        })
}

fn join_texts<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    let joined = elements
        .map(visible_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!joined.is_empty()).then_some(joined)
}

/// Collapsed text of `element`, skipping noise subtrees.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    clean_text(&out)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(el) = ElementRef::wrap(child) {
            if !NOISE_TAGS.contains(&el.value().name()) {
                collect_text(el, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_A: &str = "첫 번째 문단은 인공지능 규제에 관한 정부 발표 내용을 자세하게 다루고 있으며 충분히 긴 문장으로 구성되어 있습니다.";
    const LONG_B: &str = "Second paragraph explains the background of the announcement at considerable length for the reader.";
    const LONG_C: &str = "Third paragraph quotes several industry experts about how the new policy will change the market.";
    const LONG_D: &str = "Fourth paragraph closes the story with the timeline for implementation and next legislative steps.";

    fn page(body: &str) -> String {
        format!(
            r#"<html><head><meta property="og:description" content="Preview description"></head><body>{body}</body></html>"#
        )
    }

    #[test]
    fn test_article_region_wins() {
        let html = page(&format!(
            r#"<nav><p class="text">menu</p></nav>
            <article>
              <h1>Headline</h1>
              <div class="article-body">Body text of the article.</div>
              <p class="caption">not matched</p>
              <p class="post-text">More body.</p>
            </article>
            <p>{LONG_A}</p><p>{LONG_B}</p><p>{LONG_C}</p><p>{LONG_D}</p>"#
        ));

        let extraction = extract_detailed(&html);
        assert_eq!(extraction.strategy, Some(Strategy::ArticleRegion));
        assert_eq!(extraction.content, "Body text of the article. More body.");
    }

    #[test]
    fn test_article_without_classed_blocks_falls_through() {
        let html = page(&format!(
            r#"<article><p>{LONG_A}</p><p>{LONG_B}</p><p>{LONG_C}</p><p>{LONG_D}</p></article>"#
        ));
        let extraction = extract_detailed(&html);
        assert_eq!(extraction.strategy, Some(Strategy::ParagraphScan));
    }

    #[test]
    fn test_classed_container_needs_more_than_three_paragraphs() {
        let html = page(
            r#"<div class="sidebar-content"><p>a</p><p>b</p></div>
               <section class="main-content"><p>one</p><p>two</p><p>three</p><p>four</p></section>"#,
        );
        let extraction = extract_detailed(&html);
        assert_eq!(extraction.strategy, Some(Strategy::ClassedContainer));
        assert_eq!(extraction.content, "one two three four");
    }

    #[test]
    fn test_paragraph_scan_keeps_long_paragraphs_only() {
        let html = page(&format!(
            r#"<p>short</p><p>{LONG_A}</p><p>tiny</p><p>{LONG_B}</p><p>{LONG_C}</p><p>{LONG_D}</p>"#
        ));
        let extraction = extract_detailed(&html);
        assert_eq!(extraction.strategy, Some(Strategy::ParagraphScan));
        assert_eq!(
            extraction.content,
            format!("{LONG_A} {LONG_B} {LONG_C} {LONG_D}")
        );
    }

    #[test]
    fn test_paragraph_scan_caps_at_ten() {
        let body: String = (0..15)
            .map(|i| format!("<p>Paragraph number {i:02} has enough words in it to pass the length filter.</p>"))
            .collect();
        let content = extract(&page(&body));
        assert!(content.contains("number 09"));
        assert!(!content.contains("number 10"));
    }

    #[test]
    fn test_meta_description_fallback() {
        let html = page("<p>too short</p><div>nothing here</div>");
        let extraction = extract_detailed(&html);
        assert_eq!(extraction.strategy, Some(Strategy::MetaDescription));
        assert_eq!(extraction.content, "Preview description");
    }

    #[test]
    fn test_name_description_when_no_og() {
        let html = r#"<html><head><meta name="description" content="  Plain   description "></head><body></body></html>"#;
        assert_eq!(extract(html), "Plain description");
    }

    #[test]
    fn test_nothing_found_is_empty() {
        let extraction = extract_detailed("<html><body><p>hi</p></body></html>");
        assert_eq!(extraction.content, "");
        assert_eq!(extraction.strategy, None);
        assert_eq!(extract(""), "");
    }

    #[test]
    fn test_noise_is_ignored() {
        let html = format!(
            r#"<html><body>
              <footer><p>{LONG_A}</p><p>{LONG_B}</p><p>{LONG_C}</p><p>{LONG_D}</p></footer>
              <article><div class="content">Real <script>var x = 1;</script>story</div></article>
            </body></html>"#
        );
        assert_eq!(extract(&html), "Real story");
    }

    #[test]
    fn test_output_is_bounded_and_collapsed() {
        let long = "가".repeat(3000);
        let html = format!(
            r#"<article><div class="article">  {long}
            </div></article>"#
        );
        let content = extract(&html);
        assert_eq!(content.chars().count(), CONTENT_MAX_CHARS);
        assert!(!content.contains('\n'));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = page(&format!(
            r#"<p>{LONG_A}</p><p>{LONG_B}</p><p>{LONG_C}</p><p>{LONG_D}</p>"#
        ));
        assert_eq!(extract(&html), extract(&html));
    }

    #[test]
    fn test_each_strategy_is_pure_on_its_own() {
        let document = Html::parse_document(&page("<p>x</p>"));
        assert_eq!(Strategy::ArticleRegion.apply(&document), None);
        assert_eq!(Strategy::ClassedContainer.apply(&document), None);
        assert_eq!(Strategy::ParagraphScan.apply(&document), None);
        assert_eq!(
            Strategy::MetaDescription.apply(&document),
            Some("Preview description".to_string())
        );
    }
}
