use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::models::compass::{Career, CompassEntry};

/// Free-form personal record. Known fields are typed; anything else the
/// backend stores is kept in `extra` and sent back untouched.
///
/// `None` / absent means "key not present", which is what makes
/// [`UserProfile::merged`] a shallow merge rather than an overwrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_goals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Every key present in `delta` replaces the same key in `self`.
    pub fn merged(&self, delta: &UserProfile) -> UserProfile {
        let mut extra = self.extra.clone();
        for (key, value) in &delta.extra {
            extra.insert(key.clone(), value.clone());
        }

        UserProfile {
            uid: delta.uid.clone().or_else(|| self.uid.clone()),
            name: delta.name.clone().or_else(|| self.name.clone()),
            email: delta.email.clone().or_else(|| self.email.clone()),
            education: delta.education.clone().or_else(|| self.education.clone()),
            career_goals: delta
                .career_goals
                .clone()
                .or_else(|| self.career_goals.clone()),
            interests: delta.interests.clone().or_else(|| self.interests.clone()),
            skills: delta.skills.clone().or_else(|| self.skills.clone()),
            extra,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == UserProfile::default()
    }

    /// The backend only generates recommendations once education, goals,
    /// skills and interests are all known.
    pub fn is_ready_for_recommendations(&self) -> bool {
        non_empty_str(&self.education)
            && non_empty_str(&self.career_goals)
            && non_empty_list(&self.skills)
            && non_empty_list(&self.interests)
    }

    pub fn skills(&self) -> &[String] {
        self.skills.as_deref().unwrap_or(&[])
    }

    pub fn interests(&self) -> &[String] {
        self.interests.as_deref().unwrap_or(&[])
    }
}

fn non_empty_str(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

fn non_empty_list(value: &Option<Vec<String>>) -> bool {
    value.as_ref().is_some_and(|v| !v.is_empty())
}

/// The user's Compass: saved career paths plus the backend's latest
/// recommendations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compass {
    #[serde(default, deserialize_with = "null_as_default")]
    pub saved_paths: Vec<CompassEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<Career>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full user document as served by `GET /users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub profile: UserProfile,
    #[serde(default, deserialize_with = "null_as_default")]
    pub compass: Compass,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Firestore documents occasionally carry `null` where a collection is
/// expected; treat it the same as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
