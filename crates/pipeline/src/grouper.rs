//! Groups flat candidate rows into one aggregate per ad.

use std::collections::HashMap;

use admod_db::models::CandidateRow;

/// One ad ready for moderation: its description and ordered image list.
#[derive(Debug, Clone, PartialEq)]
pub struct AdCandidate {
    pub id: String,
    /// Empty when no row carried a non-empty description.
    pub description: String,
    /// URLs in row order, duplicates preserved.
    pub image_urls: Vec<String>,
}

/// Collapse one-row-per-image query results into per-ad candidates.
///
/// Ads keep the order of their first-seen row. The first non-empty
/// description wins; image URLs are appended in row order without
/// deduplication. An empty input yields an empty output.
pub fn group_candidates(rows: Vec<CandidateRow>) -> Vec<AdCandidate> {
    let mut ads: Vec<AdCandidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let position = *index.entry(row.id.clone()).or_insert_with(|| {
            ads.push(AdCandidate {
                id: row.id.clone(),
                description: String::new(),
                image_urls: Vec::new(),
            });
            ads.len() - 1
        });

        let ad = &mut ads[position];
        if ad.description.is_empty() {
            if let Some(description) = &row.description {
                if !description.is_empty() {
                    ad.description = description.clone();
                }
            }
        }
        if !row.image_url.is_empty() {
            ad.image_urls.push(row.image_url);
        }
    }

    ads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, description: Option<&str>, image_url: &str) -> CandidateRow {
        CandidateRow {
            id: id.into(),
            description: description.map(String::from),
            image_url: image_url.into(),
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(group_candidates(Vec::new()).is_empty());
    }

    #[test]
    fn rows_collapse_per_ad_in_first_seen_order() {
        let rows = vec![
            row("B", Some("second ad"), "b1.jpg"),
            row("A", Some("first ad"), "a1.jpg"),
            row("B", Some("second ad"), "b2.jpg"),
            row("A", Some("first ad"), "a2.jpg"),
        ];
        let ads = group_candidates(rows);

        assert_eq!(ads.len(), 2);
        assert_eq!(ads[0].id, "B");
        assert_eq!(ads[0].image_urls, vec!["b1.jpg", "b2.jpg"]);
        assert_eq!(ads[1].id, "A");
        assert_eq!(ads[1].image_urls, vec!["a1.jpg", "a2.jpg"]);
    }

    #[test]
    fn first_non_empty_description_wins() {
        let rows = vec![
            row("A", None, "a1.jpg"),
            row("A", Some(""), "a2.jpg"),
            row("A", Some("found it"), "a3.jpg"),
            row("A", Some("too late"), "a4.jpg"),
        ];
        let ads = group_candidates(rows);
        assert_eq!(ads[0].description, "found it");
    }

    #[test]
    fn duplicate_image_urls_are_preserved() {
        let rows = vec![
            row("A", Some("d"), "same.jpg"),
            row("A", Some("d"), "same.jpg"),
        ];
        let ads = group_candidates(rows);
        assert_eq!(ads[0].image_urls, vec!["same.jpg", "same.jpg"]);
    }

    #[test]
    fn grouping_is_idempotent() {
        let rows = vec![
            row("A", Some("d"), "a1.jpg"),
            row("B", None, "b1.jpg"),
            row("A", Some("d"), "a2.jpg"),
        ];
        let first = group_candidates(rows.clone());
        let second = group_candidates(rows);
        assert_eq!(first, second);
    }
}
