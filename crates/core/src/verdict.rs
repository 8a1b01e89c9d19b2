//! Per-item verdict aggregation and the rejection policy.

use serde::{Deserialize, Serialize};

use crate::detection::Detection;

/// The aggregate acceptability decision for one item, with every
/// detection that contributed to it.
///
/// Invariant: `acceptable` is true exactly when `detections` is empty.
/// Thresholding is the detectors' job; the aggregator only counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub acceptable: bool,
    pub detections: Vec<Detection>,
}

impl Verdict {
    /// Fold a detection list into a verdict.
    pub fn from_detections(detections: Vec<Detection>) -> Self {
        Self {
            acceptable: detections.is_empty(),
            detections,
        }
    }
}

/// Rejection policy: an item is rejected (rather than merely moderated)
/// when any text detection is present. Image findings alone are handled by
/// redaction, so the item can still go live.
pub fn should_reject(detections: &[Detection]) -> bool {
    detections.iter().any(Detection::is_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_det(category: &str) -> Detection {
        Detection::Text {
            category: category.into(),
            score: Some(1.0),
            value: "flagged".into(),
        }
    }

    fn image_det() -> Detection {
        Detection::Image {
            category: "license_plate".into(),
            score: None,
            image: "/tmp/car.jpg".into(),
            output_path: None,
            object_key: None,
        }
    }

    #[test]
    fn empty_detections_are_acceptable() {
        let verdict = Verdict::from_detections(Vec::new());
        assert!(verdict.acceptable);
        assert!(verdict.detections.is_empty());
    }

    #[test]
    fn any_detection_makes_verdict_unacceptable() {
        assert!(!Verdict::from_detections(vec![text_det("crypto")]).acceptable);
        assert!(!Verdict::from_detections(vec![image_det()]).acceptable);
        assert!(!Verdict::from_detections(vec![text_det("politics"), image_det()]).acceptable);
    }

    #[test]
    fn rejection_requires_a_text_detection() {
        assert!(!should_reject(&[]));
        assert!(!should_reject(&[image_det(), image_det()]));
        assert!(should_reject(&[text_det("trash_talk")]));
        assert!(should_reject(&[image_det(), text_det("crypto")]));
    }
}
