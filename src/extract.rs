//! Publish date and body text extraction from a CNA article page.
//!
//! Body paragraphs are found with an ordered chain of selectors, most
//! specific first. CNA has shipped a few layouts over the years: paragraphs
//! directly under `.text-long`, paragraphs wrapped in an extra `div`, and
//! occasionally bare text in `.text-long` itself.

use crate::config::Selectors;
use crate::date::{MeridianPolicy, canonical_date};
use crate::error::ExtractError;
use crate::models::Article;
use crate::page::Dom;
use crate::utils::normalize_text;
use itertools::Itertools;
use tracing::{debug, instrument, warn};

/// Fill `article.date_published`, `article.text` and `article.text_length`
/// from `page`.
///
/// The article is only modified when extraction succeeds. Date failures
/// ([`ExtractError::MissingDate`], [`ExtractError::InvalidDate`]) are checked
/// before the body is looked at.
#[instrument(level = "info", skip_all, fields(article_id = %article.id))]
pub fn extract(
    article: &mut Article,
    page: &impl Dom,
    selectors: &Selectors,
    meridian: MeridianPolicy,
) -> Result<(), ExtractError> {
    let raw_date = page
        .first_text(&selectors.publish_date)?
        .ok_or(ExtractError::MissingDate)?;
    let date_published = canonical_date(&raw_date, meridian)?;

    let paragraphs = body_texts(page, &selectors.body)?;
    if paragraphs.is_empty() {
        warn!(location = page.location(), "Failed to crawl any text from article");
        return Err(ExtractError::NoBodyText);
    }

    let combined = normalize_text(&format!("{} {}", article.text, paragraphs.iter().join(" ")));
    if combined.is_empty() {
        warn!(location = page.location(), "Body elements found but text is empty");
        return Err(ExtractError::EmptyText);
    }

    article.date_published = Some(date_published);
    article.set_text(combined);
    debug!(
        text_length = article.text_length,
        date_published = ?article.date_published,
        "Extracted article content"
    );
    Ok(())
}

/// Text of the first selector in `chain` that matches anything.
fn body_texts(page: &impl Dom, chain: &[String]) -> Result<Vec<String>, ExtractError> {
    for selector in chain {
        let texts = page.select_texts(selector)?;
        if !texts.is_empty() {
            debug!(%selector, matches = texts.len(), "Body selector matched");
            return Ok(texts);
        }
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DateError;
    use crate::page::Document;

    const LINK: &str = "https://www.channelnewsasia.com/a/1";

    fn page(body: &str) -> Document {
        Document::parse(LINK, &format!("<html><body>{body}</body></html>"))
    }

    fn article() -> Article {
        Article {
            id: "1".to_string(),
            link: LINK.to_string(),
            source: "cna".to_string(),
            ..Default::default()
        }
    }

    fn run(doc: &Document, article: &mut Article) -> Result<(), ExtractError> {
        extract(article, doc, &Selectors::default(), MeridianPolicy::Discard)
    }

    #[test]
    fn test_extracts_date_and_paragraphs() {
        let doc = page(
            r#"<span class="article-publish">1 Jan 2023 09:00AM</span>
               <div class="text-long"><p>Hello</p><p>World</p></div>"#,
        );
        let mut a = article();
        run(&doc, &mut a).unwrap();

        assert_eq!(a.text, "Hello World");
        assert_eq!(a.text_length, 11);
        assert_eq!(a.date_published.as_deref(), Some("2023-01-01T09:00:00.000Z"));
    }

    #[test]
    fn test_coarsest_selector_matches_like_the_first() {
        let first = page(
            r#"<span class="article-publish">1 Jan 2023 09:00AM</span>
               <div class="text-long"><p>Alpha  beta</p><p>gamma</p></div>"#,
        );
        let third = page(
            r#"<span class="article-publish">1 Jan 2023 09:00AM</span>
               <div class="text-long">Alpha  beta
               gamma</div>"#,
        );

        let mut via_first = article();
        let mut via_third = article();
        run(&first, &mut via_first).unwrap();
        run(&third, &mut via_third).unwrap();

        assert_eq!(via_third.text, "Alpha beta gamma");
        assert_eq!(via_first, via_third);
    }

    #[test]
    fn test_wrapped_paragraphs_use_second_selector() {
        let doc = page(
            r#"<span class="article-publish">1 Jan 2023 09:00AM</span>
               <div class="text-long"><div><p>One</p></div><div><p>Two</p></div></div>"#,
        );
        let mut a = article();
        run(&doc, &mut a).unwrap();
        assert_eq!(a.text, "One Two");
    }

    #[test]
    fn test_missing_date_element() {
        let doc = page(r#"<div class="text-long"><p>Hello</p></div>"#);
        let mut a = article();
        let err = run(&doc, &mut a).unwrap_err();
        assert!(matches!(err, ExtractError::MissingDate));
        assert_eq!(a, article());
    }

    #[test]
    fn test_unparseable_date() {
        let doc = page(
            r#"<span class="article-publish">yesterday</span>
               <div class="text-long"><p>Hello</p></div>"#,
        );
        let mut a = article();
        let err = run(&doc, &mut a).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidDate(DateError::InvalidDate(_))));
    }

    #[test]
    fn test_no_body_leaves_text_untouched() {
        let doc = page(r#"<span class="article-publish">1 Jan 2023 09:00AM</span>"#);
        let mut a = article();
        a.text = "kept".to_string();
        let err = run(&doc, &mut a).unwrap_err();
        assert!(matches!(err, ExtractError::NoBodyText));
        assert_eq!(a.text, "kept");
        assert_eq!(a.date_published, None);
    }

    #[test]
    fn test_whitespace_only_body_is_empty() {
        let doc = page(
            r#"<span class="article-publish">1 Jan 2023 09:00AM</span>
               <div class="text-long"><p>  </p><p>
               </p></div>"#,
        );
        let mut a = article();
        let err = run(&doc, &mut a).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyText));
        assert_eq!(a.text, "");
    }

    #[test]
    fn test_text_length_matches_normalized_text() {
        let doc = page(
            r#"<span class="article-publish">15 Aug 2022 02:43PM</span>
               <div class="text-long"><p>  Singapore’s
               economy </p><p>grew 😀</p></div>"#,
        );
        let mut a = article();
        run(&doc, &mut a).unwrap();
        assert_eq!(a.text, "Singapore’s economy grew 😀");
        assert_eq!(a.text_length, a.text.encode_utf16().count());
    }
}
