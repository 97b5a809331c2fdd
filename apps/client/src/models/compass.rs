use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::user::null_as_default;

/// A career as recommended by the backend and as posted to
/// `/career/compass/add`. Fields the client does not interpret
/// (`education_pathway`, salary notes, ...) ride along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Career {
    pub career_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pathway: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillState {
    #[default]
    Pending,
    Complete,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillProgress {
    #[serde(default)]
    pub status: SkillState,
    #[serde(default)]
    pub score: Option<f64>,
}

/// One saved career path in the user's Compass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompassEntry {
    #[serde(flatten)]
    pub career: Career,
    #[serde(default)]
    pub progress: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills_status: BTreeMap<String, SkillProgress>,
}

impl CompassEntry {
    /// Fresh entry: progress 0 and every pathway step pending with no score.
    pub fn from_career(career: &Career) -> Self {
        let skills_status = career
            .pathway
            .iter()
            .map(|skill| (skill.clone(), SkillProgress::default()))
            .collect();

        Self {
            career: career.clone(),
            progress: 0.0,
            skills_status,
        }
    }

    pub fn name(&self) -> &str {
        &self.career.career_name
    }

    /// Toggles one skill and recomputes progress. Unknown skills are added,
    /// matching how the backend treats them.
    pub fn set_skill_status(&mut self, skill: &str, complete: bool) {
        let entry = self.skills_status.entry(skill.to_string()).or_default();
        entry.status = if complete {
            SkillState::Complete
        } else {
            SkillState::Pending
        };
        self.recompute_progress();
    }

    /// An assessed skill is always complete, whatever the score.
    pub fn record_score(&mut self, skill: &str, score: f64) {
        let entry = self.skills_status.entry(skill.to_string()).or_default();
        entry.status = SkillState::Complete;
        entry.score = Some(score);
        self.recompute_progress();
    }

    pub fn recompute_progress(&mut self) {
        let total = self.skills_status.len();
        let completed = self
            .skills_status
            .values()
            .filter(|s| s.status == SkillState::Complete)
            .count();
        self.progress = progress_percentage(completed, total);
    }

    /// Progress as shown on the progress bar.
    pub fn display_progress(&self) -> u32 {
        self.progress.round().clamp(0.0, 100.0) as u32
    }
}

/// `round(part / total * 100)`, half away from zero; 0 when there is
/// nothing to count. Used for quiz scores.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((part as f64 / total as f64) * 100.0).round()
}

/// Path progress as the backend stores it: halves round to even, so 1 of 8
/// complete is 12, not 13.
pub fn progress_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((completed as f64 / total as f64) * 100.0).round_ties_even()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data_analyst() -> Career {
        Career {
            career_name: "Data Analyst".to_string(),
            description: Some("Turns data into decisions".to_string()),
            pathway: vec!["SQL".to_string(), "Statistics".to_string()],
            extra: Map::new(),
        }
    }

    #[test]
    fn test_from_career_initialises_every_step_pending() {
        let entry = CompassEntry::from_career(&data_analyst());

        assert_eq!(entry.progress, 0.0);
        let keys: Vec<_> = entry.skills_status.keys().cloned().collect();
        assert_eq!(keys, vec!["SQL".to_string(), "Statistics".to_string()]);
        for status in entry.skills_status.values() {
            assert_eq!(status.status, SkillState::Pending);
            assert_eq!(status.score, None);
        }
    }

    #[test]
    fn test_serialised_entry_matches_backend_shape() {
        let entry = CompassEntry::from_career(&data_analyst());
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["career_name"], "Data Analyst");
        assert_eq!(value["progress"], json!(0.0));
        assert_eq!(
            value["skills_status"]["SQL"],
            json!({ "status": "pending", "score": null })
        );
    }

    #[test]
    fn test_skill_toggle_recomputes_progress() {
        let mut entry = CompassEntry::from_career(&data_analyst());
        entry.set_skill_status("SQL", true);
        assert_eq!(entry.display_progress(), 50);

        entry.set_skill_status("SQL", false);
        assert_eq!(entry.display_progress(), 0);
    }

    #[test]
    fn test_record_score_completes_skill() {
        let mut entry = CompassEntry::from_career(&data_analyst());
        entry.record_score("Statistics", 40.0);

        let stats = &entry.skills_status["Statistics"];
        assert_eq!(stats.status, SkillState::Complete);
        assert_eq!(stats.score, Some(40.0));
        assert_eq!(entry.display_progress(), 50);
    }

    #[test]
    fn test_percentage_rounds_and_handles_empty() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.0);
        assert_eq!(percentage(2, 3), 67.0);
        assert_eq!(percentage(1, 8), 13.0);
    }

    #[test]
    fn test_progress_rounds_half_to_even_like_backend() {
        assert_eq!(progress_percentage(0, 0), 0.0);
        assert_eq!(progress_percentage(1, 8), 12.0);
        assert_eq!(progress_percentage(3, 8), 38.0);
        assert_eq!(progress_percentage(1, 3), 33.0);

        let steps: Vec<String> = (1..=8).map(|i| format!("Step {i}")).collect();
        let mut entry = CompassEntry::from_career(&Career {
            career_name: "Data Engineer".to_string(),
            description: None,
            pathway: steps,
            extra: Map::new(),
        });
        entry.set_skill_status("Step 1", true);
        assert_eq!(entry.progress, 12.0);
        assert_eq!(entry.display_progress(), 12);
    }

    #[test]
    fn test_entry_keeps_unknown_career_fields() {
        let entry: CompassEntry = serde_json::from_value(json!({
            "career_name": "UX Designer",
            "pathway": ["Figma"],
            "education_pathway": ["B.Des"],
            "progress": 100,
            "skills_status": { "Figma": { "status": "complete", "score": 90 } }
        }))
        .unwrap();

        assert_eq!(entry.name(), "UX Designer");
        assert_eq!(entry.display_progress(), 100);
        assert!(entry.career.extra.contains_key("education_pathway"));
    }
}
