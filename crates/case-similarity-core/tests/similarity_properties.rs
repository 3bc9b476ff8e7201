//! Property tests for the dimension scorers and the ranking pipeline.

use case_similarity_core::models::{
    ClinicalCase, Diagnosis, Gender, ImagingStudy, LabTest, PatientInfo, SimilarityConfig,
    SimilarityWeights, Treatment, TreatmentType,
};
use case_similarity_core::repository::InMemoryCaseRepository;
use case_similarity_core::similarity::{score_pair, ClinicalLexicon, SimilarityEngine};
use proptest::prelude::*;

const PRIMARIES: &[&str] = &["肺腺癌", "肺鳞癌", "肺炎", "肺结核", "Lung cancer", "Small cell lung cancer", "偏头痛"];
const ICD_CODES: &[&str] = &["C34.1", "C34.3", "C16.9", "J18.9", "A15.0", "G43.9"];
const COMPLAINTS: &[&str] = &["咳嗽", "咯血", "胸痛", "发热", "头痛", "体检发现", "乏力、消瘦"];
const FINDINGS: &[&str] = &["右肺结节", "毛刺征", "胸腔积液", "未见异常", "纵隔淋巴结肿大", "磨玻璃影"];
const LIFESTYLE: &[&str] = &["吸烟史20年", "否认吸烟", "偶尔饮酒", "不饮酒", "规律运动"];
const TREATMENT_NAMES: &[&str] = &["Gefitinib 250mg", "Cisplatin", "Right lobectomy", "Aspirin", "Gefitinib"];
const LAB_NAMES: &[&str] = &["CEA", "WBC", "CRP", "ALT", "NSE"];
const TAGS: &[&str] = &["t1", "t2", "t3", "t4", "t5"];

fn pick(options: &'static [&'static str]) -> impl Strategy<Value = String> {
    prop::sample::select(options).prop_map(String::from)
}

fn arb_gender() -> impl Strategy<Value = Gender> {
    prop_oneof![
        Just(Gender::Male),
        Just(Gender::Female),
        Just(Gender::Other),
        Just(Gender::Unknown),
    ]
}

fn arb_treatment_type() -> impl Strategy<Value = TreatmentType> {
    prop_oneof![
        Just(TreatmentType::Medication),
        Just(TreatmentType::Surgery),
        Just(TreatmentType::Chemotherapy),
        Just(TreatmentType::TargetedTherapy),
    ]
}

prop_compose! {
    fn arb_diagnosis()(
        primary in pick(PRIMARIES),
        icd_code in prop::option::of(pick(ICD_CODES)),
        differential in prop::collection::vec(pick(PRIMARIES), 0..3),
    ) -> Diagnosis {
        Diagnosis { primary, differential, icd_code }
    }
}

prop_compose! {
    fn arb_patient()(
        age in prop::option::of(0u32..100),
        gender in arb_gender(),
        occupation in prop::option::of(pick(&["教师", "工人", "农民"])),
        lifestyle in prop::collection::vec(pick(LIFESTYLE), 0..3),
    ) -> PatientInfo {
        PatientInfo { age, gender, occupation, lifestyle }
    }
}

prop_compose! {
    fn arb_case()(
        diagnosis in arb_diagnosis(),
        complaint in prop::collection::vec(pick(COMPLAINTS), 0..3),
        patient_info in arb_patient(),
        tags in prop::collection::vec(pick(TAGS), 0..4),
        findings in prop::collection::vec(pick(FINDINGS), 0..3),
        treatments in prop::collection::vec((arb_treatment_type(), pick(TREATMENT_NAMES)), 0..3),
        labs in prop::collection::vec((pick(LAB_NAMES), any::<bool>()), 0..4),
    ) -> ClinicalCase {
        let mut case = ClinicalCase::new("Case".to_string(), diagnosis.primary.clone());
        case.diagnosis = diagnosis;
        case.chief_complaint = complaint.join("，");
        case.patient_info = patient_info;
        case.tags = tags;
        if !findings.is_empty() {
            case.images = vec![ImagingStudy {
                id: "img".to_string(),
                modality: "CT".to_string(),
                findings,
                ..Default::default()
            }];
        }
        case.treatments = treatments
            .into_iter()
            .map(|(t, name)| Treatment::new(t, name))
            .collect();
        case.lab_tests = labs
            .into_iter()
            .map(|(name, abnormal)| LabTest::new(name, abnormal))
            .collect();
        case
    }
}

prop_compose! {
    fn arb_normalized_weights()(raw in prop::collection::vec(0.0f64..1.0, 7)) -> SimilarityWeights {
        let total: f64 = raw.iter().sum::<f64>().max(1e-3);
        SimilarityWeights {
            diagnosis: raw[0] / total,
            symptoms: raw[1] / total,
            demographics: raw[2] / total,
            tags: raw[3] / total,
            findings: raw[4] / total,
            treatments: raw[5] / total,
            lab_results: raw[6] / total,
        }
    }
}

fn dimension_values(case_a: &ClinicalCase, case_b: &ClinicalCase, lexicon: &ClinicalLexicon) -> [f64; 7] {
    let s = score_pair(case_a, case_b, lexicon);
    [s.diagnosis, s.symptoms, s.demographics, s.tags, s.findings, s.treatments, s.lab_results]
}

fn corpus(cases: Vec<ClinicalCase>) -> InMemoryCaseRepository {
    let cases = cases
        .into_iter()
        .enumerate()
        .map(|(i, mut c)| {
            c.id = format!("case-{}", i);
            c
        })
        .collect();
    InMemoryCaseRepository::new(cases, vec![]).unwrap()
}

// ── Dimension bounds and symmetry ───────────────────────────────────────

proptest! {
    #[test]
    fn dimensions_are_bounded(a in arb_case(), b in arb_case()) {
        let lexicon = ClinicalLexicon::default();
        for value in dimension_values(&a, &b, &lexicon) {
            prop_assert!((0.0..=1.0).contains(&value), "out of range: {}", value);
        }
    }

    #[test]
    fn dimensions_are_symmetric(a in arb_case(), b in arb_case()) {
        let lexicon = ClinicalLexicon::default();
        let forward = dimension_values(&a, &b, &lexicon);
        let backward = dimension_values(&b, &a, &lexicon);
        for (f, r) in forward.iter().zip(backward.iter()) {
            prop_assert!((f - r).abs() < 1e-12, "asymmetric: {} vs {}", f, r);
        }
    }

    #[test]
    fn total_is_bounded(a in arb_case(), b in arb_case(), weights in arb_normalized_weights()) {
        let lexicon = ClinicalLexicon::default();
        prop_assert!(weights.validate().is_ok() || weights.sum() == 0.0);
        let total = score_pair(&a, &b, &lexicon).weighted_total(&weights);
        prop_assert!((0.0..=1.0).contains(&total), "total out of range: {}", total);
    }
}

// ── Ranker postconditions ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ranking_postconditions(
        cases in prop::collection::vec(arb_case(), 1..12),
        max_results in 1usize..6,
        min_similarity in 0.0f64..0.8,
    ) {
        let repo = corpus(cases);
        let lexicon = ClinicalLexicon::default();
        let engine = SimilarityEngine::new(&repo, &lexicon);
        let config = SimilarityConfig {
            max_results,
            min_similarity,
            ..Default::default()
        };

        let results = engine.similar_cases_with_config("case-0", &config).unwrap();

        prop_assert!(results.len() <= max_results);
        for r in &results {
            prop_assert!(r.similarity >= min_similarity);
            prop_assert!(r.case.id != "case-0");
        }
        for pair in results.windows(2) {
            prop_assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn ranking_is_idempotent(
        cases in prop::collection::vec(arb_case(), 1..12),
        target in 0usize..12,
    ) {
        let target_id = format!("case-{}", target);
        let repo = corpus(cases);
        let lexicon = ClinicalLexicon::default();
        let engine = SimilarityEngine::new(&repo, &lexicon);
        let config = SimilarityConfig {
            min_similarity: 0.0,
            ..Default::default()
        };

        let first = engine.similar_cases_with_config(&target_id, &config).unwrap();
        let second = engine.similar_cases_with_config(&target_id, &config).unwrap();
        prop_assert_eq!(first, second);
    }
}
