//! Clinical case models.

use serde::{Deserialize, Serialize};

/// A clinical case in the case library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalCase {
    /// Stable case ID - used for lookup and self-exclusion only
    pub id: String,
    /// Display title
    pub title: String,
    /// Owning department (e.g., "呼吸内科")
    #[serde(default)]
    pub department: Option<String>,
    /// Primary/differential diagnosis
    pub diagnosis: Diagnosis,
    /// Chief complaint as recorded at admission
    #[serde(default)]
    pub chief_complaint: String,
    /// History of present illness
    #[serde(default)]
    pub present_illness: String,
    /// Past medical history
    #[serde(default)]
    pub past_history: Option<String>,
    /// Patient demographics
    pub patient_info: PatientInfo,
    /// Case tag IDs (order irrelevant)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Imaging studies with free-text findings
    #[serde(default)]
    pub images: Vec<ImagingStudy>,
    /// Treatments given
    #[serde(default)]
    pub treatments: Vec<Treatment>,
    /// Laboratory results
    #[serde(default)]
    pub lab_tests: Vec<LabTest>,
    /// Times the case was opened
    #[serde(default)]
    pub view_count: u32,
    /// Times the case was bookmarked
    #[serde(default)]
    pub save_count: u32,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: String,
    /// Last update timestamp
    #[serde(default)]
    pub updated_at: String,
}

/// Diagnosis block of a case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    /// Primary diagnosis text
    pub primary: String,
    /// Differential diagnoses considered
    #[serde(default)]
    pub differential: Vec<String>,
    /// ICD-10 code (e.g., "C34.102")
    #[serde(default)]
    pub icd_code: Option<String>,
}

/// Patient gender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    /// Not recorded - skipped by demographic scoring
    #[default]
    Unknown,
}

/// Patient demographics relevant to case comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    /// Age in years
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub occupation: Option<String>,
    /// Free-text lifestyle statements (e.g., "吸烟史30年", "不饮酒")
    #[serde(default)]
    pub lifestyle: Vec<String>,
}

/// A single imaging study.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImagingStudy {
    pub id: String,
    /// Modality (e.g., "CT", "MRI", "X-ray")
    #[serde(default)]
    pub modality: String,
    #[serde(default)]
    pub body_part: Option<String>,
    /// Free-text findings
    #[serde(default)]
    pub findings: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Kind of treatment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum TreatmentType {
    Medication,
    Surgery,
    Chemotherapy,
    Radiotherapy,
    TargetedTherapy,
    Immunotherapy,
    Supportive,
    Other,
}

/// A treatment record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    #[serde(rename = "type")]
    pub treatment_type: TreatmentType,
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
}

impl Treatment {
    /// Create a treatment with only type and name.
    pub fn new(treatment_type: TreatmentType, name: impl Into<String>) -> Self {
        Self {
            treatment_type,
            name: name.into(),
            dosage: None,
            duration: None,
            outcome: None,
        }
    }
}

/// A laboratory test result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reference_range: Option<String>,
    pub is_abnormal: bool,
}

impl LabTest {
    /// Create a lab test with only name and abnormal flag.
    pub fn new(name: impl Into<String>, is_abnormal: bool) -> Self {
        Self {
            name: name.into(),
            value: None,
            unit: None,
            reference_range: None,
            is_abnormal,
        }
    }
}

/// Tag catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaseTag {
    pub id: String,
    pub name: String,
    /// Grouping (e.g., "disease", "symptom", "imaging")
    #[serde(default)]
    pub category: Option<String>,
}

impl CaseTag {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
        }
    }
}

impl ClinicalCase {
    /// Create a new case with a generated ID and the required fields.
    pub fn new(title: String, primary_diagnosis: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            department: None,
            diagnosis: Diagnosis {
                primary: primary_diagnosis,
                differential: Vec::new(),
                icd_code: None,
            },
            chief_complaint: String::new(),
            present_illness: String::new(),
            past_history: None,
            patient_info: PatientInfo::default(),
            tags: Vec::new(),
            images: Vec::new(),
            treatments: Vec::new(),
            lab_tests: Vec::new(),
            view_count: 0,
            save_count: 0,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Chief complaint and present illness joined, lower-cased.
    pub fn symptom_text(&self) -> String {
        format!("{} {}", self.chief_complaint, self.present_illness).to_lowercase()
    }

    /// All imaging findings across all studies, in study order.
    pub fn all_findings(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .flat_map(|img| img.findings.iter().map(String::as_str))
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_case() {
        let case = ClinicalCase::new("右肺上叶结节".into(), "肺癌".into());
        assert_eq!(case.diagnosis.primary, "肺癌");
        assert_eq!(case.id.len(), 36); // UUID format
        assert_eq!(case.view_count, 0);
        assert_eq!(case.created_at, case.updated_at);
    }

    #[test]
    fn test_all_findings_flattens_studies() {
        let mut case = ClinicalCase::new("t".into(), "d".into());
        case.images = vec![
            ImagingStudy {
                id: "img-1".into(),
                findings: vec!["右肺上叶结节".into(), "毛刺征".into()],
                ..Default::default()
            },
            ImagingStudy {
                id: "img-2".into(),
                findings: vec!["纵隔淋巴结肿大".into()],
                ..Default::default()
            },
        ];

        let findings: Vec<&str> = case.all_findings().collect();
        assert_eq!(findings, vec!["右肺上叶结节", "毛刺征", "纵隔淋巴结肿大"]);
    }

    #[test]
    fn test_deserialize_minimal_case_json() {
        let json = r#"{
            "id": "case-001",
            "title": "Cough and hemoptysis",
            "diagnosis": { "primary": "Lung Cancer", "icdCode": "C34.1" },
            "patientInfo": { "age": 58, "gender": "male" },
            "treatments": [{ "type": "targetedTherapy", "name": "Gefitinib" }],
            "labTests": [{ "name": "CEA", "isAbnormal": true }]
        }"#;

        let case: ClinicalCase = serde_json::from_str(json).unwrap();
        assert_eq!(case.diagnosis.icd_code.as_deref(), Some("C34.1"));
        assert_eq!(case.patient_info.gender, Gender::Male);
        assert!(case.tags.is_empty());
        assert_eq!(case.treatments[0].treatment_type, TreatmentType::TargetedTherapy);
        assert!(case.lab_tests[0].is_abnormal);
        assert!(case.patient_info.occupation.is_none());
    }

    #[test]
    fn test_symptom_text_lowercases() {
        let mut case = ClinicalCase::new("t".into(), "d".into());
        case.chief_complaint = "Cough for 2 weeks".into();
        case.present_illness = "Intermittent FEVER".into();
        assert_eq!(case.symptom_text(), "cough for 2 weeks intermittent fever");
    }
}
