//! Text detectors: the HTTP classifier client and the keyword fallback.

use admod_core::Detection;
use async_trait::async_trait;
use serde::Deserialize;

use crate::{DetectorError, TextDetector};

/// Default probability threshold below which classifier labels are ignored.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

// ---------------------------------------------------------------------------
// HTTP classifier client
// ---------------------------------------------------------------------------

/// One classified label in the sidecar response.
#[derive(Debug, Deserialize)]
struct TextLabel {
    category: String,
    score: f64,
    /// The matched span; the full input is used when absent.
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    detections: Vec<TextLabel>,
}

/// Client for a text-classification sidecar service.
///
/// POSTs `{"text": ...}` to the configured endpoint and maps every returned
/// label with `score > threshold` (and a category other than `acceptable`)
/// to a text detection.
pub struct HttpTextDetector {
    http: reqwest::Client,
    endpoint: String,
    threshold: f64,
}

impl HttpTextDetector {
    pub fn new(http: reqwest::Client, endpoint: String, threshold: f64) -> Self {
        Self {
            http,
            endpoint,
            threshold,
        }
    }
}

#[async_trait]
impl TextDetector for HttpTextDetector {
    async fn detect(&self, text: &str) -> Result<Vec<Detection>, DetectorError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TextResponse = response
            .json()
            .await
            .map_err(|e| DetectorError::InvalidResponse(e.to_string()))?;

        let detections = parsed
            .detections
            .into_iter()
            .filter(|label| label.category != "acceptable" && label.score > self.threshold)
            .map(|label| Detection::Text {
                category: label.category,
                score: Some(label.score),
                value: label.value.unwrap_or_else(|| text.to_string()),
            })
            .collect();

        Ok(detections)
    }
}

// ---------------------------------------------------------------------------
// Keyword fallback
// ---------------------------------------------------------------------------

/// Substring rules applied to the lowercased text. Stems, not whole words,
/// so inflected forms match too.
const KEYWORD_RULES: &[(&str, &[&str])] = &[
    (
        "trash_talk",
        &[
            "идиот", "дурак", "тупой", "сволочь", "ублюд", "сука", "бляд", "лох",
        ],
    ),
    (
        "politics",
        &[
            "путин", "выборы", "митинг", "депутат", "рада", "кремль", "полит",
        ],
    ),
    (
        "crypto",
        &[
            "биткоин", "bitcoin", "крипто", "ethereum", "эфир", "bnb", "usdt",
        ],
    ),
];

/// Rule-based text detector used when no classifier sidecar is configured.
///
/// One detection per matched category (not per keyword), carrying the full
/// normalized text as the value and a fixed score of 1.0.
pub struct KeywordTextDetector {
    rules: Vec<(String, regex::Regex)>,
}

impl Default for KeywordTextDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordTextDetector {
    pub fn new() -> Self {
        let rules = KEYWORD_RULES
            .iter()
            .map(|(category, keywords)| {
                let alternation = keywords
                    .iter()
                    .map(|k| regex::escape(k))
                    .collect::<Vec<_>>()
                    .join("|");
                // The keyword lists are static and escaped; compilation
                // cannot fail at runtime.
                let pattern = regex::Regex::new(&format!("(?i)(?:{alternation})"))
                    .expect("static keyword pattern");
                (category.to_string(), pattern)
            })
            .collect();
        Self { rules }
    }
}

#[async_trait]
impl TextDetector for KeywordTextDetector {
    async fn detect(&self, text: &str) -> Result<Vec<Detection>, DetectorError> {
        let detections = self
            .rules
            .iter()
            .filter(|(_, pattern)| pattern.is_match(text))
            .map(|(category, _)| Detection::Text {
                category: category.clone(),
                score: Some(1.0),
                value: text.to_string(),
            })
            .collect();
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn detect(text: &str) -> Vec<Detection> {
        KeywordTextDetector::new().detect(text).await.unwrap()
    }

    #[tokio::test]
    async fn crypto_keyword_is_flagged() {
        let detections = detect("Биткоин скоро взлетит").await;
        assert_eq!(detections.len(), 1);
        match &detections[0] {
            Detection::Text {
                category,
                score,
                value,
            } => {
                assert_eq!(category, "crypto");
                assert_eq!(*score, Some(1.0));
                assert_eq!(value, "Биткоин скоро взлетит");
            }
            other => panic!("expected text detection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn clean_text_produces_no_detections() {
        assert!(detect("Продаю машину в отличном состоянии").await.is_empty());
    }

    #[tokio::test]
    async fn multiple_categories_yield_one_detection_each() {
        let detections = detect("Путин купил биткоин, вот идиот").await;
        let mut categories: Vec<_> = detections
            .iter()
            .map(|d| d.category_or_unknown().to_string())
            .collect();
        categories.sort();
        assert_eq!(categories, vec!["crypto", "politics", "trash_talk"]);
    }

    #[tokio::test]
    async fn matching_is_case_insensitive() {
        assert_eq!(detect("BITCOIN to the moon").await.len(), 1);
    }
}
