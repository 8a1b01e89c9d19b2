//! The single normalized detection shape shared by both detector kinds.
//!
//! Text and image detectors produce different fields, so `Detection` is a
//! tagged variant rather than one struct of optionals. The serde tag keeps
//! the persisted `verdict_json` shape stable: `{"type": "text", ...}` /
//! `{"type": "image", ...}`.

use serde::{Deserialize, Serialize};

/// One flagged finding from a detector run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Detection {
    /// A flagged span of the item's description.
    Text {
        /// Free-form label, e.g. `trash_talk`, `politics`, `crypto`.
        category: String,
        /// Classifier probability in `[0, 1]`, when the detector reports one.
        score: Option<f64>,
        /// The matched (whitespace-normalized) text.
        value: String,
    },
    /// A flagged region in one of the item's images.
    Image {
        /// Free-form label, e.g. `license_plate`.
        category: String,
        score: Option<f64>,
        /// Local path of the source image the region was found in.
        image: String,
        /// Local path of the redacted copy, when one was written.
        output_path: Option<String>,
        /// Object-store key, stamped after upload.
        object_key: Option<String>,
    },
}

impl Detection {
    /// The detection's category, defaulting to `"unknown"` when empty.
    pub fn category_or_unknown(&self) -> &str {
        let category = match self {
            Detection::Text { category, .. } => category,
            Detection::Image { category, .. } => category,
        };
        if category.is_empty() {
            "unknown"
        } else {
            category
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Detection::Text { .. })
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Detection::Image { .. })
    }

    /// The `type` column value for the audit table.
    pub fn kind(&self) -> &'static str {
        match self {
            Detection::Text { .. } => "text",
            Detection::Image { .. } => "image",
        }
    }
}
