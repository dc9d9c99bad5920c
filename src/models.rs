//! Data models for article records exchanged with the remote store.
//!
//! The store is a JavaScript service, so the wire names are a mix of
//! snake_case (`text_length`, `date_published`), Mongo-style (`_id`) and
//! camelCase (`isProcessing`). Every overwrite sends the whole record back,
//! so fields this crate does not know about are kept in [`Article::extra`]
//! and round-tripped untouched.

use crate::utils::text_length;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unit of crawl work, as stored remotely.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Article {
    /// Opaque identifier assigned by the store.
    #[serde(rename = "_id")]
    pub id: String,
    /// Canonical URL of the article page.
    pub link: String,
    /// Pipeline tag that owns this record (e.g. `"cna"`).
    #[serde(default)]
    pub source: String,
    /// Extracted body text; empty until crawled.
    #[serde(default)]
    pub text: String,
    /// Length of `text` in UTF-16 code units.
    #[serde(default)]
    pub text_length: usize,
    /// Canonical ISO-8601 publish timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    /// Advisory lock flag. Absent (never `false`) when unlocked.
    #[serde(
        rename = "isProcessing",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_processing: Option<bool>,
    /// Any other fields the store returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Article {
    /// Replace the body and keep `text_length` in step with it.
    pub fn set_text(&mut self, text: String) {
        self.text_length = text_length(&text);
        self.text = text;
    }

    /// Set or clear the lock flag. Clearing removes the field entirely.
    pub fn set_processing(&mut self, locked: bool) {
        self.is_processing = locked.then_some(true);
    }

    pub fn is_locked(&self) -> bool {
        self.is_processing == Some(true)
    }
}

/// Envelope returned by `GET /article/getArticleByText`:
/// `{ "data": { "data": Article | null } }`.
#[derive(Debug, Deserialize)]
pub struct FetchEnvelope {
    pub data: FetchData,
}

#[derive(Debug, Deserialize)]
pub struct FetchData {
    #[serde(default)]
    pub data: Option<Article>,
}

impl FetchEnvelope {
    pub fn into_article(self) -> Option<Article> {
        self.data.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_article_deserialization_keeps_unknown_fields() {
        let raw = json!({
            "_id": "64f0c0ffee",
            "link": "https://www.channelnewsasia.com/a/1",
            "source": "cna",
            "text": "",
            "title": "Some headline",
            "__v": 0
        });

        let article: Article = serde_json::from_value(raw).unwrap();
        assert_eq!(article.id, "64f0c0ffee");
        assert_eq!(article.text_length, 0);
        assert_eq!(article.date_published, None);
        assert_eq!(article.is_processing, None);
        assert_eq!(article.extra.get("title"), Some(&json!("Some headline")));

        let back = serde_json::to_value(&article).unwrap();
        assert_eq!(back["__v"], json!(0));
        assert_eq!(back["_id"], json!("64f0c0ffee"));
    }

    #[test]
    fn test_unlocked_article_omits_processing_flag() {
        let mut article = Article {
            id: "1".to_string(),
            link: "https://www.channelnewsasia.com/a/1".to_string(),
            ..Default::default()
        };

        article.set_processing(true);
        let locked = serde_json::to_value(&article).unwrap();
        assert_eq!(locked["isProcessing"], json!(true));
        assert!(article.is_locked());

        article.set_processing(false);
        let unlocked = serde_json::to_value(&article).unwrap();
        assert!(unlocked.get("isProcessing").is_none());
        assert!(!article.is_locked());
    }

    #[test]
    fn test_set_text_recomputes_length() {
        let mut article = Article::default();
        article.set_text("Hello World".to_string());
        assert_eq!(article.text_length, 11);
        article.set_text("Zoë".to_string());
        assert_eq!(article.text_length, 3);
    }

    #[test]
    fn test_fetch_envelope_null_article() {
        let envelope: FetchEnvelope =
            serde_json::from_value(json!({ "data": { "data": null } })).unwrap();
        assert!(envelope.into_article().is_none());
    }

    #[test]
    fn test_fetch_envelope_with_article() {
        let envelope: FetchEnvelope = serde_json::from_value(json!({
            "data": { "data": { "_id": "abc", "link": "https://www.channelnewsasia.com/x", "text": "" } }
        }))
        .unwrap();
        let article = envelope.into_article().unwrap();
        assert_eq!(article.id, "abc");
        assert_eq!(article.source, "");
    }
}
