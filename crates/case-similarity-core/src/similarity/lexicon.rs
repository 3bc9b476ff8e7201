//! Controlled clinical vocabularies for keyword-based scoring.
//!
//! Holds:
//! - Symptom keywords (matched against chief complaint + present illness)
//! - Imaging finding keywords (matched against imaging findings)
//! - Lifestyle habit markers (smoking/drinking mention and negation phrases)
//!
//! Matching is case-insensitive substring containment. The symptom and finding
//! vocabularies are independent lists.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SimilarityResult;

/// Markers for one lifestyle habit (e.g., smoking).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HabitMarkers {
    /// Substrings indicating the entry talks about this habit
    pub mentions: Vec<String>,
    /// Substrings indicating the habit is denied (e.g., "不吸烟", "non-smoker")
    pub negations: Vec<String>,
}

impl HabitMarkers {
    /// Polarity of the first lifestyle entry mentioning this habit.
    ///
    /// `Some(true)` if the habit is present, `Some(false)` if denied, `None` if
    /// no entry mentions the habit at all.
    pub fn status(&self, lifestyle: &[String]) -> Option<bool> {
        lifestyle.iter().find_map(|entry| {
            let lower = entry.to_lowercase();
            if self.negations.iter().any(|n| lower.contains(n.as_str())) {
                Some(false)
            } else if self.mentions.iter().any(|m| lower.contains(m.as_str())) {
                Some(true)
            } else {
                None
            }
        })
    }
}

/// Keyword lexicon used by the symptom, findings and demographic scorers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClinicalLexicon {
    pub symptom_keywords: Vec<String>,
    pub finding_keywords: Vec<String>,
    pub smoking: HabitMarkers,
    pub drinking: HabitMarkers,
}

impl Default for ClinicalLexicon {
    fn default() -> Self {
        Self {
            symptom_keywords: Self::default_symptoms(),
            finding_keywords: Self::default_findings(),
            smoking: Self::default_smoking(),
            drinking: Self::default_drinking(),
        }
    }
}

impl ClinicalLexicon {
    /// Parse a lexicon document; omitted sections keep the built-in vocabulary.
    pub fn from_json(json: &str) -> SimilarityResult<Self> {
        let mut lexicon: Self = serde_json::from_str(json)?;
        lexicon.normalize();
        Ok(lexicon)
    }

    /// Load a lexicon document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> SimilarityResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Add a symptom keyword.
    pub fn add_symptom_keyword(&mut self, keyword: &str) {
        push_unique(&mut self.symptom_keywords, keyword);
    }

    /// Add an imaging finding keyword.
    pub fn add_finding_keyword(&mut self, keyword: &str) {
        push_unique(&mut self.finding_keywords, keyword);
    }

    /// Symptom keywords present in `text`.
    pub fn symptoms_in(&self, text: &str) -> BTreeSet<&str> {
        keywords_in(&self.symptom_keywords, &text.to_lowercase())
    }

    /// Finding keywords present in any of `findings`.
    pub fn findings_in<'a, I>(&self, findings: I) -> BTreeSet<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let joined = findings
            .into_iter()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("\n");
        keywords_in(&self.finding_keywords, &joined)
    }

    /// Lower-case and dedupe every list so matching stays case-insensitive.
    fn normalize(&mut self) {
        for list in [
            &mut self.symptom_keywords,
            &mut self.finding_keywords,
            &mut self.smoking.mentions,
            &mut self.smoking.negations,
            &mut self.drinking.mentions,
            &mut self.drinking.negations,
        ] {
            let mut seen = BTreeSet::new();
            list.retain_mut(|k| {
                *k = k.trim().to_lowercase();
                !k.is_empty() && seen.insert(k.clone())
            });
        }
    }

    fn default_symptoms() -> Vec<String> {
        [
            // Respiratory
            "咳嗽", "咳痰", "咯血", "胸痛", "胸闷", "气促", "呼吸困难", "喘息",
            // Constitutional
            "发热", "乏力", "消瘦", "盗汗", "水肿",
            // Neurological
            "头痛", "头晕", "意识障碍", "抽搐",
            // GI
            "腹痛", "恶心", "呕吐", "腹泻", "黄疸",
            // Cardiac / other
            "心悸", "关节痛",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn default_findings() -> Vec<String> {
        [
            "结节", "肿块", "磨玻璃", "空洞", "钙化", "积液", "实变", "分叶",
            "毛刺", "胸膜牵拉", "淋巴结肿大", "支气管充气征", "强化", "坏死",
            "转移", "出血", "梗死", "水肿", "狭窄", "占位",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn default_smoking() -> HabitMarkers {
        HabitMarkers {
            mentions: strings(&["吸烟", "抽烟", "smok", "cigarette", "tobacco"]),
            negations: strings(&[
                "不吸烟", "无吸烟", "否认吸烟", "从不吸烟", "不抽烟",
                "non-smoker", "nonsmoker", "never smok", "does not smoke", "no smoking",
            ]),
        }
    }

    fn default_drinking() -> HabitMarkers {
        HabitMarkers {
            mentions: strings(&["饮酒", "喝酒", "酗酒", "drink", "alcohol"]),
            negations: strings(&[
                "不饮酒", "无饮酒", "否认饮酒", "从不饮酒", "不喝酒",
                "non-drinker", "nondrinker", "never drink", "does not drink", "no alcohol",
            ]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn push_unique(list: &mut Vec<String>, keyword: &str) {
    let keyword = keyword.trim().to_lowercase();
    if !keyword.is_empty() && !list.contains(&keyword) {
        list.push(keyword);
    }
}

fn keywords_in<'k>(keywords: &'k [String], lower_text: &str) -> BTreeSet<&'k str> {
    keywords
        .iter()
        .filter(|k| lower_text.contains(k.as_str()))
        .map(String::as_str)
        .collect()
}
