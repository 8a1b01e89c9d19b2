//! Derived per-category aggregates for one moderation run.
//!
//! Computed once per item after all detectors have run, then persisted to
//! the `moderation_results` table. BTreeMaps keep the serialized JSON
//! deterministic across runs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::detection::Detection;

/// Per-category aggregate of text detections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextCategorySummary {
    /// Distinct matched values, sorted.
    pub values: Vec<String>,
    pub count: u32,
}

/// One redacted image reference inside an image category summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub image: String,
    pub object_key: Option<String>,
}

/// Per-category aggregate of image detections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageCategorySummary {
    /// `{image, object_key}` pairs in detection order.
    pub items: Vec<ImageRef>,
    pub count: u32,
}

/// The computed aggregate for one run of one item.
///
/// Invariants: `total_detections == text_detections + image_detections`
/// and `acceptable == text_acceptable && image_acceptable`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub acceptable: bool,
    pub text_acceptable: bool,
    pub image_acceptable: bool,
    pub total_detections: u32,
    pub text_detections: u32,
    pub image_detections: u32,
    pub text_summary: BTreeMap<String, TextCategorySummary>,
    pub image_summary: BTreeMap<String, ImageCategorySummary>,
}

impl ResultSummary {
    /// Aggregate a detection list into per-category summaries and counts.
    pub fn compute(detections: &[Detection]) -> Self {
        let mut text_count = 0u32;
        let mut image_count = 0u32;
        let mut text_values: BTreeMap<String, (BTreeSet<String>, u32)> = BTreeMap::new();
        let mut image_summary: BTreeMap<String, ImageCategorySummary> = BTreeMap::new();

        for det in detections {
            let category = det.category_or_unknown().to_string();
            match det {
                Detection::Text { value, .. } => {
                    text_count += 1;
                    let entry = text_values.entry(category).or_default();
                    if !value.is_empty() {
                        entry.0.insert(value.clone());
                    }
                    entry.1 += 1;
                }
                Detection::Image {
                    image, object_key, ..
                } => {
                    image_count += 1;
                    let entry = image_summary.entry(category).or_default();
                    entry.items.push(ImageRef {
                        image: image.clone(),
                        object_key: object_key.clone(),
                    });
                    entry.count += 1;
                }
            }
        }

        let text_summary = text_values
            .into_iter()
            .map(|(category, (values, count))| {
                (
                    category,
                    TextCategorySummary {
                        values: values.into_iter().collect(),
                        count,
                    },
                )
            })
            .collect();

        Self {
            acceptable: text_count == 0 && image_count == 0,
            text_acceptable: text_count == 0,
            image_acceptable: image_count == 0,
            total_detections: text_count + image_count,
            text_detections: text_count,
            image_detections: image_count,
            text_summary,
            image_summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_det(category: &str, value: &str) -> Detection {
        Detection::Text {
            category: category.into(),
            score: Some(0.9),
            value: value.into(),
        }
    }

    fn image_det(image: &str, object_key: Option<&str>) -> Detection {
        Detection::Image {
            category: "license_plate".into(),
            score: None,
            image: image.into(),
            output_path: None,
            object_key: object_key.map(String::from),
        }
    }

    #[test]
    fn empty_detections_are_fully_acceptable() {
        let summary = ResultSummary::compute(&[]);
        assert!(summary.acceptable);
        assert!(summary.text_acceptable);
        assert!(summary.image_acceptable);
        assert_eq!(summary.total_detections, 0);
        assert!(summary.text_summary.is_empty());
        assert!(summary.image_summary.is_empty());
    }

    #[test]
    fn counts_stay_consistent() {
        let dets = vec![
            text_det("crypto", "биткоин"),
            text_det("crypto", "биткоин"),
            text_det("politics", "митинг"),
            image_det("/tmp/a.jpg", Some("images/covered/A1/covered_a.jpg")),
        ];
        let summary = ResultSummary::compute(&dets);

        assert_eq!(summary.text_detections, 3);
        assert_eq!(summary.image_detections, 1);
        assert_eq!(
            summary.total_detections,
            summary.text_detections + summary.image_detections
        );
        assert_eq!(
            summary.acceptable,
            summary.text_acceptable && summary.image_acceptable
        );
        assert!(!summary.acceptable);
    }

    #[test]
    fn text_values_are_distinct_and_sorted() {
        let dets = vec![
            text_det("crypto", "usdt"),
            text_det("crypto", "биткоин"),
            text_det("crypto", "usdt"),
        ];
        let summary = ResultSummary::compute(&dets);

        let crypto = &summary.text_summary["crypto"];
        assert_eq!(crypto.count, 3);
        assert_eq!(crypto.values, vec!["usdt".to_string(), "биткоин".to_string()]);
    }

    #[test]
    fn image_items_keep_detection_order() {
        let dets = vec![
            image_det("/tmp/b.jpg", Some("k1")),
            image_det("/tmp/a.jpg", None),
        ];
        let summary = ResultSummary::compute(&dets);

        let plates = &summary.image_summary["license_plate"];
        assert_eq!(plates.count, 2);
        assert_eq!(plates.items[0].image, "/tmp/b.jpg");
        assert_eq!(plates.items[0].object_key.as_deref(), Some("k1"));
        assert_eq!(plates.items[1].image, "/tmp/a.jpg");
        assert!(plates.items[1].object_key.is_none());
    }

    #[test]
    fn empty_category_groups_under_unknown() {
        let summary = ResultSummary::compute(&[text_det("", "spam")]);
        assert!(summary.text_summary.contains_key("unknown"));
    }

    #[test]
    fn only_image_detections_leave_text_acceptable() {
        let summary = ResultSummary::compute(&[image_det("/tmp/a.jpg", None)]);
        assert!(summary.text_acceptable);
        assert!(!summary.image_acceptable);
        assert!(!summary.acceptable);
    }
}
