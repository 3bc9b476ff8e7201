//! Matched-feature explanations for a scored case pair.
//!
//! Purely descriptive: explanations never feed back into ranking.

use std::collections::{BTreeSet, HashMap};

use crate::models::{ClinicalCase, DimensionScores, FeatureCategory, MatchedFeature};

/// Diagnosis score above which the candidate's diagnosis is surfaced.
const DIAGNOSIS_THRESHOLD: f64 = 0.7;

/// Tag score above which shared tags are surfaced.
const TAG_THRESHOLD: f64 = 0.5;

/// Findings score above which sample findings are surfaced.
const FINDINGS_THRESHOLD: f64 = 0.5;

/// Number of sample findings to show.
const MAX_SAMPLE_FINDINGS: usize = 2;

/// Build the matched-feature groups for `candidate` compared to `target`.
///
/// `tag_names` maps tag IDs to display names; unknown IDs are shown as-is.
pub fn explain_match(
    target: &ClinicalCase,
    candidate: &ClinicalCase,
    scores: &DimensionScores,
    tag_names: &HashMap<String, String>,
) -> Vec<MatchedFeature> {
    let mut features = Vec::new();

    if scores.diagnosis > DIAGNOSIS_THRESHOLD {
        features.push(MatchedFeature {
            category: FeatureCategory::Diagnosis,
            items: vec![candidate.diagnosis.primary.clone()],
        });
    }

    if scores.tags > TAG_THRESHOLD {
        let target_tags: BTreeSet<&str> = target.tags.iter().map(String::as_str).collect();
        let mut seen = BTreeSet::new();
        let common: Vec<String> = candidate
            .tags
            .iter()
            .filter(|id| target_tags.contains(id.as_str()) && seen.insert(id.as_str()))
            .map(|id| tag_names.get(id).cloned().unwrap_or_else(|| id.clone()))
            .collect();

        if !common.is_empty() {
            features.push(MatchedFeature {
                category: FeatureCategory::Tags,
                items: common,
            });
        }
    }

    if scores.findings > FINDINGS_THRESHOLD {
        let samples: Vec<String> = candidate
            .all_findings()
            .take(MAX_SAMPLE_FINDINGS)
            .map(String::from)
            .collect();

        if !samples.is_empty() {
            features.push(MatchedFeature {
                category: FeatureCategory::ImagingFindings,
                items: samples,
            });
        }
    }

    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImagingStudy;

    fn scores(diagnosis: f64, tags: f64, findings: f64) -> DimensionScores {
        DimensionScores {
            diagnosis,
            tags,
            findings,
            ..Default::default()
        }
    }

    fn cases() -> (ClinicalCase, ClinicalCase) {
        let mut target = ClinicalCase::new("target".into(), "肺腺癌".into());
        target.tags = vec!["t-lung".into(), "t-smoker".into(), "t-egfr".into()];

        let mut candidate = ClinicalCase::new("candidate".into(), "肺鳞癌".into());
        candidate.tags = vec!["t-egfr".into(), "t-lung".into(), "t-copd".into()];
        candidate.images = vec![ImagingStudy {
            id: "img-1".into(),
            modality: "CT".into(),
            findings: vec!["右肺上叶肿块".into(), "纵隔淋巴结肿大".into(), "胸腔积液".into()],
            ..Default::default()
        }];
        (target, candidate)
    }

    #[test]
    fn test_all_groups_in_order() {
        let (target, candidate) = cases();
        let mut names = HashMap::new();
        names.insert("t-lung".to_string(), "肺部肿瘤".to_string());

        let features = explain_match(&target, &candidate, &scores(0.8, 0.6, 0.7), &names);

        assert_eq!(features.len(), 3);
        assert_eq!(features[0].category, FeatureCategory::Diagnosis);
        assert_eq!(features[0].items, vec!["肺鳞癌"]);
        assert_eq!(features[1].category, FeatureCategory::Tags);
        // Candidate order; unknown IDs fall back to the raw ID
        assert_eq!(features[1].items, vec!["t-egfr", "肺部肿瘤"]);
        assert_eq!(features[2].category, FeatureCategory::ImagingFindings);
        assert_eq!(features[2].items, vec!["右肺上叶肿块", "纵隔淋巴结肿大"]);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let (target, candidate) = cases();
        let features = explain_match(&target, &candidate, &scores(0.7, 0.5, 0.5), &HashMap::new());
        assert!(features.is_empty());
    }

    #[test]
    fn test_no_tag_group_without_common_tags() {
        let (target, mut candidate) = cases();
        candidate.tags = vec!["t-other".into()];
        let features = explain_match(&target, &candidate, &scores(0.0, 0.9, 0.0), &HashMap::new());
        assert!(features.is_empty());
    }
}
