//! The seven dimension scorers.
//!
//! Every scorer is a pure, symmetric function of a case pair returning a value
//! in [0.0, 1.0]. Missing optional data never fails; each scorer falls back to
//! a fixed score instead.
//!
//! The scorers are token/keyword overlap heuristics, not semantic models.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{ClinicalCase, Diagnosis, Gender, LabTest, PatientInfo, Treatment, TreatmentType};

use super::lexicon::ClinicalLexicon;

/// Score when neither side has data for a set-based dimension.
const BOTH_EMPTY: f64 = 0.5;

/// Score when exactly one side has data.
const ONE_EMPTY: f64 = 0.1;

/// Diagnosis floor when nothing matches.
const DIAGNOSIS_FLOOR: f64 = 0.1;

/// Findings score when free text exists but no controlled keyword matched.
const FINDINGS_NO_KEYWORDS: f64 = 0.3;

/// Lab score when both sides have tests but none in common.
const LAB_NO_COMMON_TESTS: f64 = 0.2;

/// Score a diagnosis pair. Rules are tried in order; the first that applies wins.
pub fn diagnosis_similarity(a: &Diagnosis, b: &Diagnosis) -> f64 {
    // 1. Same primary diagnosis
    if a.primary == b.primary {
        return 1.0;
    }

    // 2. ICD-10 category / body system
    if let (Some(code_a), Some(code_b)) = (icd_code(a), icd_code(b)) {
        if char_prefix(code_a, 3) == char_prefix(code_b, 3) {
            return 0.8;
        }
        if code_a.chars().next() == code_b.chars().next() {
            return 0.4;
        }
    }

    // 3. One primary listed among the other's differentials
    if a.differential.contains(&b.primary) || b.differential.contains(&a.primary) {
        return 0.6;
    }

    // 4. Shared differentials
    if !a.differential.is_empty() && !b.differential.is_empty() {
        let diff_a: BTreeSet<&str> = a.differential.iter().map(String::as_str).collect();
        let diff_b: BTreeSet<&str> = b.differential.iter().map(String::as_str).collect();
        let common = diff_a.intersection(&diff_b).count();
        if common > 0 {
            let longest = a.differential.len().max(b.differential.len());
            return 0.3 + 0.3 * common as f64 / longest as f64;
        }
    }

    // 5. Token overlap of the primary text
    let tokens_a = tokenize(&a.primary);
    let tokens_b = tokenize(&b.primary);
    let common = tokens_a.intersection(&tokens_b).count();
    if common > 0 {
        let longest = tokens_a.len().max(tokens_b.len());
        return 0.2 + 0.3 * common as f64 / longest as f64;
    }

    DIAGNOSIS_FLOOR
}

/// Jaccard similarity of symptom keywords found in complaint + present illness.
pub fn symptom_similarity(a: &ClinicalCase, b: &ClinicalCase, lexicon: &ClinicalLexicon) -> f64 {
    let symptoms_a = lexicon.symptoms_in(&a.symptom_text());
    let symptoms_b = lexicon.symptoms_in(&b.symptom_text());
    set_similarity(&symptoms_a, &symptoms_b)
}

/// Mean of the applicable demographic factors; 0.5 when none apply.
pub fn demographic_similarity(a: &PatientInfo, b: &PatientInfo, lexicon: &ClinicalLexicon) -> f64 {
    let mut factors: Vec<f64> = Vec::with_capacity(5);

    if let (Some(age_a), Some(age_b)) = (a.age, b.age) {
        factors.push(match age_a.abs_diff(age_b) {
            0..=5 => 1.0,
            6..=10 => 0.8,
            11..=20 => 0.4,
            _ => 0.1,
        });
    }

    if a.gender != Gender::Unknown && b.gender != Gender::Unknown {
        factors.push(if a.gender == b.gender { 1.0 } else { 0.1 });
    }

    if let (Some(occ_a), Some(occ_b)) = (a.occupation.as_deref(), b.occupation.as_deref()) {
        factors.push(if occ_a == occ_b { 1.0 } else { 0.3 });
    }

    for habit in [&lexicon.smoking, &lexicon.drinking] {
        if let (Some(status_a), Some(status_b)) = (habit.status(&a.lifestyle), habit.status(&b.lifestyle)) {
            factors.push(if status_a == status_b { 1.0 } else { 0.2 });
        }
    }

    if factors.is_empty() {
        return 0.5;
    }
    factors.iter().sum::<f64>() / factors.len() as f64
}

/// Jaccard similarity of tag ID sets.
pub fn tag_similarity(a: &[String], b: &[String]) -> f64 {
    let tags_a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let tags_b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    set_similarity(&tags_a, &tags_b)
}

/// Jaccard similarity of imaging finding keywords.
pub fn finding_similarity(a: &ClinicalCase, b: &ClinicalCase, lexicon: &ClinicalLexicon) -> f64 {
    let has_a = a.all_findings().next().is_some();
    let has_b = b.all_findings().next().is_some();
    match (has_a, has_b) {
        (false, false) => return BOTH_EMPTY,
        (true, false) | (false, true) => return ONE_EMPTY,
        (true, true) => {}
    }

    let keywords_a = lexicon.findings_in(a.all_findings());
    let keywords_b = lexicon.findings_in(b.all_findings());
    if keywords_a.is_empty() && keywords_b.is_empty() {
        return FINDINGS_NO_KEYWORDS;
    }
    jaccard(&keywords_a, &keywords_b)
}

/// Treatment type overlap (60%) plus name token overlap within shared types (40%).
pub fn treatment_similarity(a: &[Treatment], b: &[Treatment]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return ONE_EMPTY;
    }

    let by_type_a = group_by_type(a);
    let by_type_b = group_by_type(b);

    let types_a: BTreeSet<TreatmentType> = by_type_a.keys().copied().collect();
    let types_b: BTreeSet<TreatmentType> = by_type_b.keys().copied().collect();
    let base = jaccard(&types_a, &types_b);

    let mut pair_total = 0.0;
    let mut pair_count = 0usize;
    for treatment_type in types_a.intersection(&types_b) {
        for name_a in &by_type_a[treatment_type] {
            for name_b in &by_type_b[treatment_type] {
                pair_total += token_overlap(name_a, name_b);
                pair_count += 1;
            }
        }
    }
    let detail = if pair_count > 0 {
        pair_total / pair_count as f64
    } else {
        0.0
    };

    0.6 * base + 0.4 * detail
}

/// Abnormal-flag agreement on shared tests (60%) plus test coverage (40%).
pub fn lab_similarity(a: &[LabTest], b: &[LabTest]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return ONE_EMPTY;
    }

    let flags_a = abnormal_flags(a);
    let flags_b = abnormal_flags(b);

    let (mut matching, mut common) = (0usize, 0usize);
    for (name, flag_a) in &flags_a {
        if let Some(flag_b) = flags_b.get(name) {
            common += 1;
            if flag_a == flag_b {
                matching += 1;
            }
        }
    }

    if common == 0 {
        return LAB_NO_COMMON_TESTS;
    }

    let mismatching = common - matching;
    let agreement = (matching as f64 + 0.2 * mismatching as f64) / common as f64;
    let coverage = common as f64 / a.len().max(b.len()) as f64;

    0.4 * coverage + 0.6 * agreement
}

/// `|A ∩ B| / |A ∪ B|`; 0.0 when both are empty.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Jaccard with the empty-set conventions shared by symptoms and tags.
fn set_similarity<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => BOTH_EMPTY,
        (true, false) | (false, true) => ONE_EMPTY,
        (false, false) => jaccard(a, b),
    }
}

/// Whitespace tokens, case-sensitive like the exact-match rule.
fn tokenize(text: &str) -> BTreeSet<&str> {
    text.split_whitespace().collect()
}

/// Shared tokens over the larger token count of two names.
fn token_overlap(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    let longest = tokens_a.len().max(tokens_b.len());
    if longest == 0 {
        return 0.0;
    }
    tokens_a.intersection(&tokens_b).count() as f64 / longest as f64
}

fn group_by_type(treatments: &[Treatment]) -> BTreeMap<TreatmentType, Vec<&str>> {
    let mut groups: BTreeMap<TreatmentType, Vec<&str>> = BTreeMap::new();
    for t in treatments {
        groups.entry(t.treatment_type).or_default().push(t.name.as_str());
    }
    groups
}

/// Abnormal flag per test name; the first occurrence of a name wins.
fn abnormal_flags(tests: &[LabTest]) -> HashMap<&str, bool> {
    let mut flags = HashMap::with_capacity(tests.len());
    for test in tests {
        flags.entry(test.name.as_str()).or_insert(test.is_abnormal);
    }
    flags
}

/// Trimmed ICD code; a blank code counts as absent.
fn icd_code(diagnosis: &Diagnosis) -> Option<&str> {
    diagnosis
        .icd_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
}

/// Up to the first `n` characters; shorter strings are returned whole.
fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
