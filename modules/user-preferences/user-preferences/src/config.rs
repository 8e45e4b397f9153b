use serde::{Deserialize, Serialize};

/// Settings read from `modules.user_preferences.config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPreferencesConfig {
    /// Header carrying the caller's user id, set by the upstream gateway.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
    /// Largest number of entries accepted by one batch update.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for UserPreferencesConfig {
    fn default() -> Self {
        Self {
            identity_header: default_identity_header(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

fn default_identity_header() -> String {
    "x-user-id".to_owned()
}

fn default_max_batch_size() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: UserPreferencesConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, UserPreferencesConfig::default());
        assert_eq!(config.identity_header, "x-user-id");
        assert_eq!(config.max_batch_size, 32);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<UserPreferencesConfig>(r#"{"identity":"x"}"#).is_err());
    }
}
