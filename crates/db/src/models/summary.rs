//! Result summary insert DTO.

use admod_core::summary::ResultSummary;
use admod_core::types::DbId;

/// DTO for inserting one `moderation_results` row.
#[derive(Debug, Clone)]
pub struct CreateResultSummary {
    pub ad_id: String,
    pub run_id: DbId,
    pub acceptable: bool,
    pub text_acceptable: bool,
    pub image_acceptable: bool,
    pub total_detections: i32,
    pub text_detections: i32,
    pub image_detections: i32,
    pub text_summary: serde_json::Value,
    pub image_summary: serde_json::Value,
}

impl CreateResultSummary {
    /// Build the insert DTO from a computed summary.
    ///
    /// Summary maps are serialized here so the repository stays a thin
    /// SQL wrapper. Serialization of plain maps and counts cannot fail.
    pub fn from_summary(ad_id: &str, run_id: DbId, summary: &ResultSummary) -> Self {
        Self {
            ad_id: ad_id.to_string(),
            run_id,
            acceptable: summary.acceptable,
            text_acceptable: summary.text_acceptable,
            image_acceptable: summary.image_acceptable,
            total_detections: summary.total_detections as i32,
            text_detections: summary.text_detections as i32,
            image_detections: summary.image_detections as i32,
            text_summary: serde_json::to_value(&summary.text_summary)
                .unwrap_or(serde_json::Value::Null),
            image_summary: serde_json::to_value(&summary.image_summary)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admod_core::Detection;

    #[test]
    fn dto_mirrors_computed_summary() {
        let dets = vec![
            Detection::Text {
                category: "crypto".into(),
                score: Some(1.0),
                value: "биткоин".into(),
            },
            Detection::Image {
                category: "license_plate".into(),
                score: None,
                image: "/tmp/a.jpg".into(),
                output_path: None,
                object_key: Some("images/covered/A1/covered_a.jpg".into()),
            },
        ];
        let summary = ResultSummary::compute(&dets);
        let dto = CreateResultSummary::from_summary("A1", 7, &summary);

        assert_eq!(dto.ad_id, "A1");
        assert_eq!(dto.run_id, 7);
        assert_eq!(dto.total_detections, 2);
        assert_eq!(dto.text_detections, 1);
        assert_eq!(dto.image_detections, 1);
        assert!(!dto.acceptable);
        assert!(dto.text_summary["crypto"]["count"].is_number());
        assert_eq!(
            dto.image_summary["license_plate"]["items"][0]["object_key"],
            "images/covered/A1/covered_a.jpg"
        );
    }
}
