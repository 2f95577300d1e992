//! Client settings for dictionary completion (`dictCompletion` section).
//!
//! Settings arrive in `initializationOptions` and in
//! `workspace/didChangeConfiguration` notifications, either wrapped in the
//! section name or as the bare object:
//!
//! ```json
//! { "dictCompletion": { "externalUserDictFile": false, "userDictionary": ["rustacean"],
//!                       "leastNumOfChars": 2, "addSpaceAfterCompletion": true } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::lsp::features::traits::SettingsStore;

/// Configuration section name.
pub const SETTINGS_SECTION: &str = "dictCompletion";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DictCompletionSettings {
    /// Keep user words in an external file instead of `userDictionary`
    pub external_user_dict_file: bool,
    /// Inline user words, used when `external_user_dict_file` is off
    pub user_dictionary: Vec<String>,
    /// Minimum length of the typed word before suggesting
    pub least_num_of_chars: usize,
    /// Append a space to accepted suggestions
    pub add_space_after_completion: bool,
}

const KNOWN_KEYS: &[&str] = &[
    "externalUserDictFile",
    "userDictionary",
    "leastNumOfChars",
    "addSpaceAfterCompletion",
];

/// Individual setting keys, used as change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ExternalUserDictFile,
    UserDictionary,
    LeastNumOfChars,
    AddSpaceAfterCompletion,
}

impl SettingKey {
    /// Fully qualified key, as shown in editor settings.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::ExternalUserDictFile => "dictCompletion.externalUserDictFile",
            SettingKey::UserDictionary => "dictCompletion.userDictionary",
            SettingKey::LeastNumOfChars => "dictCompletion.leastNumOfChars",
            SettingKey::AddSpaceAfterCompletion => "dictCompletion.addSpaceAfterCompletion",
        }
    }
}

impl DictCompletionSettings {
    /// Parses a settings payload, falling back to defaults when it is absent
    /// or malformed.
    pub fn from_value(value: &Value) -> Self {
        let Some(section) = Self::section(value) else {
            return Self::default();
        };
        match serde_json::from_value(section.clone()) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring malformed {} settings: {}", SETTINGS_SECTION, e);
                Self::default()
            }
        }
    }

    /// Locates the `dictCompletion` object in a payload: either under the
    /// section name or, for bare payloads, the object itself when it carries
    /// at least one known key.
    pub fn section(value: &Value) -> Option<&Value> {
        if let Some(section) = value.get(SETTINGS_SECTION) {
            return (!section.is_null()).then_some(section);
        }
        let object = value.as_object()?;
        object
            .keys()
            .any(|key| KNOWN_KEYS.contains(&key.as_str()))
            .then_some(value)
    }

    /// Keys whose value differs between `self` and `updated`.
    pub fn changed_keys(&self, updated: &Self) -> Vec<SettingKey> {
        let mut changed = Vec::new();
        if self.external_user_dict_file != updated.external_user_dict_file {
            changed.push(SettingKey::ExternalUserDictFile);
        }
        if self.user_dictionary != updated.user_dictionary {
            changed.push(SettingKey::UserDictionary);
        }
        if self.least_num_of_chars != updated.least_num_of_chars {
            changed.push(SettingKey::LeastNumOfChars);
        }
        if self.add_space_after_completion != updated.add_space_after_completion {
            changed.push(SettingKey::AddSpaceAfterCompletion);
        }
        changed
    }

    /// Whether these (new) settings, after `changed`, need an index rebuild.
    ///
    /// The inline dictionary only matters outside external-file mode.
    pub fn requires_rebuild(&self, changed: &[SettingKey]) -> bool {
        changed.iter().any(|key| match key {
            SettingKey::ExternalUserDictFile => true,
            SettingKey::UserDictionary => !self.external_user_dict_file,
            SettingKey::LeastNumOfChars | SettingKey::AddSpaceAfterCompletion => false,
        })
    }
}

impl SettingsStore for DictCompletionSettings {
    fn external_user_dict_file(&self) -> bool {
        self.external_user_dict_file
    }

    fn user_dictionary(&self) -> &[String] {
        &self.user_dictionary
    }

    fn least_num_of_chars(&self) -> usize {
        self.least_num_of_chars
    }

    fn add_space_after_completion(&self) -> bool {
        self.add_space_after_completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_wrapped_and_bare() {
        let wrapped = DictCompletionSettings::from_value(&json!({
            "dictCompletion": { "leastNumOfChars": 2, "userDictionary": ["rustacean"] }
        }));
        assert_eq!(wrapped.least_num_of_chars, 2);
        assert_eq!(wrapped.user_dictionary, vec!["rustacean".to_string()]);
        assert!(!wrapped.external_user_dict_file);

        let bare = DictCompletionSettings::from_value(&json!({ "addSpaceAfterCompletion": true }));
        assert!(bare.add_space_after_completion);
    }

    #[test]
    fn test_malformed_falls_back_to_defaults() {
        let settings = DictCompletionSettings::from_value(&json!({ "leastNumOfChars": "two" }));
        assert_eq!(settings, DictCompletionSettings::default());
        assert_eq!(DictCompletionSettings::from_value(&Value::Null), DictCompletionSettings::default());
    }

    #[test]
    fn test_section_lookup() {
        assert!(DictCompletionSettings::section(&json!({ "dictCompletion": {} })).is_some());
        assert!(DictCompletionSettings::section(&json!({ "dictCompletion": null })).is_none());
        assert!(DictCompletionSettings::section(&json!({ "editor": { "tabSize": 4 } })).is_none());
        assert!(DictCompletionSettings::section(&json!({ "leastNumOfChars": 1 })).is_some());
        assert!(DictCompletionSettings::section(&Value::Null).is_none());
    }

    #[test]
    fn test_rebuild_rules() {
        let inline = DictCompletionSettings::default();
        let external = DictCompletionSettings {
            external_user_dict_file: true,
            ..Default::default()
        };

        assert!(inline.requires_rebuild(&[SettingKey::UserDictionary]));
        assert!(!external.requires_rebuild(&[SettingKey::UserDictionary]));
        assert!(external.requires_rebuild(&[SettingKey::ExternalUserDictFile]));
        assert!(!inline.requires_rebuild(&[SettingKey::LeastNumOfChars, SettingKey::AddSpaceAfterCompletion]));
    }

    #[test]
    fn test_changed_keys() {
        let old = DictCompletionSettings::default();
        let new = DictCompletionSettings {
            user_dictionary: vec!["word".to_string()],
            least_num_of_chars: 3,
            ..Default::default()
        };
        assert_eq!(
            old.changed_keys(&new),
            vec![SettingKey::UserDictionary, SettingKey::LeastNumOfChars]
        );
        assert!(new.changed_keys(&new.clone()).is_empty());
    }
}
