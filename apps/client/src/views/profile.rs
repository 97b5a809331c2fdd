use tracing::error;

use crate::errors::ClientResult;
use crate::models::UserProfile;
use crate::views::{Notice, ViewContext};

/// Editable form state. List fields are edited as comma-separated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub education: String,
    pub career_goals: String,
    pub interests: String,
    pub skills: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone().unwrap_or_default(),
            education: profile.education.clone().unwrap_or_default(),
            career_goals: profile.career_goals.clone().unwrap_or_default(),
            interests: profile.interests().join(", "),
            skills: profile.skills().join(", "),
        }
    }

    /// Profile delta sent on save. Every form field is written, including
    /// empty ones.
    pub fn to_update(&self) -> UserProfile {
        UserProfile {
            name: Some(self.name.clone()),
            education: Some(self.education.clone()),
            career_goals: Some(self.career_goals.clone()),
            interests: Some(split_list(&self.interests)),
            skills: Some(split_list(&self.skills)),
            ..Default::default()
        }
    }
}

/// Splits on commas, trims, drops empty items.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct ProfileEditor {
    ctx: ViewContext,
}

impl ProfileEditor {
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx }
    }

    /// Form prefilled from the cached profile.
    pub fn form(&self) -> ProfileForm {
        self.ctx
            .store
            .snapshot()
            .profile()
            .map(ProfileForm::from_profile)
            .unwrap_or_default()
    }

    pub async fn save(&self, form: &ProfileForm) -> Notice {
        match self.try_save(form).await {
            Ok(()) => Notice::Success("Profile saved successfully!".to_string()),
            Err(e) => {
                error!("Failed to save profile: {e}");
                Notice::Danger("Failed to save profile. Please try again.".to_string())
            }
        }
    }

    async fn try_save(&self, form: &ProfileForm) -> ClientResult<()> {
        self.ctx.store.update_profile(form.to_update()).await
    }
}
