// Admin Controller - shared-secret gate + event settings
//
// Deliberately low-assurance: one static shared secret, compared with exact
// match, no hashing and no rate limiting. That matches the original design's
// intent; strengthening it is a product decision, not a refactor.

use crate::error::{VoteError, VoteResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// SETTINGS
// ============================================================================

/// Event-level toggles an admin can flip while the event runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdminSettings {
    /// New uploads accepted
    #[serde(rename = "uploadsEnabled")]
    pub uploads_enabled: bool,

    /// Votes accepted
    #[serde(rename = "votingEnabled")]
    pub voting_enabled: bool,

    /// Suspends the one-entry-per-owner rule (testing mode); name and
    /// charset validation still apply
    #[serde(rename = "unlimitedUploads")]
    pub unlimited_uploads: bool,
}

impl Default for AdminSettings {
    fn default() -> Self {
        AdminSettings {
            uploads_enabled: true,
            voting_enabled: true,
            unlimited_uploads: false,
        }
    }
}

/// Partial settings update; unset fields keep their current value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SettingsPatch {
    #[serde(rename = "uploadsEnabled")]
    pub uploads_enabled: Option<bool>,

    #[serde(rename = "votingEnabled")]
    pub voting_enabled: Option<bool>,

    #[serde(rename = "unlimitedUploads")]
    pub unlimited_uploads: Option<bool>,
}

impl SettingsPatch {
    pub fn apply_to(&self, settings: &mut AdminSettings) {
        if let Some(v) = self.uploads_enabled {
            settings.uploads_enabled = v;
        }
        if let Some(v) = self.voting_enabled {
            settings.voting_enabled = v;
        }
        if let Some(v) = self.unlimited_uploads {
            settings.unlimited_uploads = v;
        }
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

/// Gates destructive and configuration operations behind the shared secret.
pub struct AdminController {
    secret: String,
}

impl AdminController {
    pub fn new(secret: &str) -> Self {
        AdminController {
            secret: secret.to_string(),
        }
    }

    /// Boolean check used by the verify endpoint; no side effects.
    pub fn verify(&self, presented: &str) -> bool {
        presented == self.secret
    }

    /// Exact-match credential check for gated operations.
    pub fn authorize(&self, presented: Option<&str>) -> VoteResult<()> {
        match presented {
            Some(p) if self.verify(p) => Ok(()),
            _ => Err(VoteError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_exact_match_only() {
        let admin = AdminController::new("party2024");

        assert!(admin.authorize(Some("party2024")).is_ok());
        assert_eq!(
            admin.authorize(Some("party2024 ")),
            Err(VoteError::Unauthorized)
        );
        assert_eq!(
            admin.authorize(Some("PARTY2024")),
            Err(VoteError::Unauthorized)
        );
        assert_eq!(admin.authorize(None), Err(VoteError::Unauthorized));
    }

    #[test]
    fn test_verify_is_boolean_and_side_effect_free() {
        let admin = AdminController::new("party2024");
        assert!(admin.verify("party2024"));
        assert!(!admin.verify("guess"));
    }

    #[test]
    fn test_settings_patch_only_touches_set_fields() {
        let mut settings = AdminSettings::default();
        assert!(settings.uploads_enabled);
        assert!(settings.voting_enabled);
        assert!(!settings.unlimited_uploads);

        let patch = SettingsPatch {
            voting_enabled: Some(false),
            ..SettingsPatch::default()
        };
        patch.apply_to(&mut settings);

        assert!(settings.uploads_enabled);
        assert!(!settings.voting_enabled);
        assert!(!settings.unlimited_uploads);
    }

    #[test]
    fn test_settings_wire_names() {
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"uploadsEnabled": false, "unlimitedUploads": true}"#)
                .unwrap();
        assert_eq!(patch.uploads_enabled, Some(false));
        assert_eq!(patch.voting_enabled, None);
        assert_eq!(patch.unlimited_uploads, Some(true));
    }
}
