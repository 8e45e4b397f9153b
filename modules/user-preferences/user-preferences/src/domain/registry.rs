//! Declarative preference registry.
//!
//! Every key has exactly one [`PreferenceSpec`] holding its default and its
//! value [`Domain`]. Decoding, encoding, validation and default lookup are
//! all derived from that single entry, so they cannot disagree for a key.

use std::collections::HashMap;
use std::sync::LazyLock;

use user_preferences_sdk::{PreferenceKey, PreferenceValue};

const GUIDES: &[&str] = &["pony", "eqg", "pl"];
const AVATAR_PROVIDERS: &[&str] = &["deviantart", "discord", "gravatar"];
const VECTOR_APPS: &[&str] = &["illustrator", "inkscape", "ponyscape"];

const TRUE_RAW: &str = "1";
const FALSE_RAW: &str = "0";

/// Set of legal typed values for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Boolean,
    Integer { min: i64, max: i64, nullable: bool },
    Choice {
        options: &'static [&'static str],
        nullable: bool,
    },
}

impl Domain {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer { .. } => "integer",
            Self::Choice { .. } => "choice",
        }
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match *self {
            Self::Boolean => false,
            Self::Integer { nullable, .. } | Self::Choice { nullable, .. } => nullable,
        }
    }
}

/// Registry entry for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceSpec {
    pub key: PreferenceKey,
    pub default: PreferenceValue,
    pub domain: Domain,
}

const fn flag(key: PreferenceKey, default: bool) -> PreferenceSpec {
    PreferenceSpec {
        key,
        default: PreferenceValue::Bool(default),
        domain: Domain::Boolean,
    }
}

pub static PREFERENCES: [PreferenceSpec; 21] = [
    PreferenceSpec {
        key: PreferenceKey::CgItemsPerPage,
        default: PreferenceValue::Int(7),
        domain: Domain::Integer {
            min: 7,
            max: 20,
            nullable: false,
        },
    },
    flag(PreferenceKey::CgHideSynon, false),
    flag(PreferenceKey::CgHideClrInfo, false),
    flag(PreferenceKey::CgFullLstPrev, true),
    flag(PreferenceKey::CgNutshell, false),
    PreferenceSpec {
        key: PreferenceKey::CgDefaultGuide,
        default: PreferenceValue::Null,
        domain: Domain::Choice {
            options: GUIDES,
            nullable: true,
        },
    },
    PreferenceSpec {
        key: PreferenceKey::PAvatarProv,
        default: PreferenceValue::choice("deviantart"),
        domain: Domain::Choice {
            options: AVATAR_PROVIDERS,
            nullable: false,
        },
    },
    PreferenceSpec {
        key: PreferenceKey::PVectorApp,
        default: PreferenceValue::Null,
        domain: Domain::Choice {
            options: VECTOR_APPS,
            nullable: true,
        },
    },
    flag(PreferenceKey::PHideDiscord, false),
    flag(PreferenceKey::PHidePcg, false),
    flag(PreferenceKey::PHomeLastEp, false),
    flag(PreferenceKey::EpHideSynopses, false),
    flag(PreferenceKey::EpNoAppPrev, false),
    flag(PreferenceKey::EpRevStepBtn, false),
    flag(PreferenceKey::APcgEarn, true),
    flag(PreferenceKey::APcgMake, true),
    flag(PreferenceKey::APcgSprite, true),
    flag(PreferenceKey::APostReq, true),
    flag(PreferenceKey::APostRes, true),
    flag(PreferenceKey::AReserve, true),
    PreferenceSpec {
        key: PreferenceKey::PcgSlots,
        default: PreferenceValue::Null,
        domain: Domain::Integer {
            min: 0,
            max: 1000,
            nullable: true,
        },
    },
];

static GLOBAL: LazyLock<PreferenceRegistry> =
    LazyLock::new(|| PreferenceRegistry::from_specs(&PREFERENCES));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no registry entry for preference '{0}'")]
    UnhandledKey(PreferenceKey),

    #[error("stored value {raw:?} is not an option of '{key}'")]
    InvalidEnumValue { key: PreferenceKey, raw: String },

    #[error("stored value {raw:?} does not decode as '{key}'")]
    Malformed {
        key: PreferenceKey,
        raw: Option<String>,
    },

    #[error("invalid value for '{field}': {message}")]
    Invalid { field: String, message: String },
}

impl RegistryError {
    fn invalid(key: PreferenceKey, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: key.as_str().to_owned(),
            message: message.into(),
        }
    }

    fn malformed(key: PreferenceKey, raw: Option<&str>) -> Self {
        Self::Malformed {
            key,
            raw: raw.map(ToOwned::to_owned),
        }
    }

    /// True for failures caused by persisted data rather than by the caller.
    #[must_use]
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::InvalidEnumValue { .. } | Self::Malformed { .. })
    }
}

/// Lookup table from key to its spec.
#[derive(Debug)]
pub struct PreferenceRegistry {
    specs: &'static [PreferenceSpec],
    index: HashMap<PreferenceKey, usize>,
}

impl PreferenceRegistry {
    /// Registry over the built-in preference table.
    #[must_use]
    pub fn global() -> &'static PreferenceRegistry {
        &GLOBAL
    }

    #[must_use]
    pub fn from_specs(specs: &'static [PreferenceSpec]) -> Self {
        let index = specs
            .iter()
            .enumerate()
            .map(|(pos, spec)| (spec.key, pos))
            .collect();
        Self { specs, index }
    }

    /// Registered specs, in table order.
    #[must_use]
    pub fn specs(&self) -> std::slice::Iter<'static, PreferenceSpec> {
        self.specs.iter()
    }

    /// # Errors
    /// `UnhandledKey` when the table has no entry for `key`.
    pub fn spec(&self, key: PreferenceKey) -> Result<&'static PreferenceSpec, RegistryError> {
        let specs = self.specs;
        self.index
            .get(&key)
            .map(|&pos| &specs[pos])
            .ok_or(RegistryError::UnhandledKey(key))
    }

    /// # Errors
    /// `UnhandledKey` when the table has no entry for `key`.
    pub fn default_of(&self, key: PreferenceKey) -> Result<PreferenceValue, RegistryError> {
        Ok(self.spec(key)?.default.clone())
    }

    /// Interpret a persisted raw value. `None` is a SQL NULL.
    ///
    /// # Errors
    /// `InvalidEnumValue` or `Malformed` when the raw value is outside the
    /// key's domain, `UnhandledKey` for unregistered keys.
    pub fn decode(
        &self,
        key: PreferenceKey,
        raw: Option<&str>,
    ) -> Result<PreferenceValue, RegistryError> {
        let domain = self.spec(key)?.domain;
        let Some(text) = raw else {
            return if domain.is_nullable() {
                Ok(PreferenceValue::Null)
            } else {
                Err(RegistryError::malformed(key, None))
            };
        };

        match domain {
            Domain::Boolean => Ok(PreferenceValue::Bool(text == TRUE_RAW)),
            Domain::Integer { min, max, .. } => text
                .parse::<i64>()
                .ok()
                .filter(|n| (min..=max).contains(n))
                .map(PreferenceValue::Int)
                .ok_or_else(|| RegistryError::malformed(key, raw)),
            Domain::Choice { options, .. } => options
                .iter()
                .find(|&&option| option == text)
                .map(|&option| PreferenceValue::choice(option))
                .ok_or_else(|| RegistryError::InvalidEnumValue {
                    key,
                    raw: text.to_owned(),
                }),
        }
    }

    /// Serialize a typed value to its persisted form. `None` is stored as
    /// SQL NULL.
    ///
    /// # Errors
    /// `Invalid` when the value does not belong to the key's domain.
    pub fn encode(
        &self,
        key: PreferenceKey,
        value: &PreferenceValue,
    ) -> Result<Option<String>, RegistryError> {
        self.validate(key, value)?;
        Ok(match value {
            PreferenceValue::Null => None,
            PreferenceValue::Bool(true) => Some(TRUE_RAW.to_owned()),
            PreferenceValue::Bool(false) => Some(FALSE_RAW.to_owned()),
            PreferenceValue::Int(n) => Some(n.to_string()),
            PreferenceValue::Choice(code) => Some(code.to_string()),
        })
    }

    /// Check a caller-supplied value against the key's domain.
    ///
    /// # Errors
    /// `Invalid` with a field message on domain violations, `UnhandledKey`
    /// for unregistered keys.
    pub fn validate(
        &self,
        key: PreferenceKey,
        value: &PreferenceValue,
    ) -> Result<(), RegistryError> {
        let domain = self.spec(key)?.domain;

        if value.is_null() {
            return if domain.is_nullable() {
                Ok(())
            } else {
                Err(RegistryError::invalid(key, "must not be null"))
            };
        }

        match (domain, value) {
            (Domain::Boolean, PreferenceValue::Bool(_)) => Ok(()),
            (Domain::Integer { min, max, .. }, PreferenceValue::Int(n)) => {
                if (min..=max).contains(n) {
                    Ok(())
                } else {
                    Err(RegistryError::invalid(
                        key,
                        format!("must be between {min} and {max}, got {n}"),
                    ))
                }
            }
            (Domain::Choice { options, .. }, PreferenceValue::Choice(code)) => {
                let code: &str = code;
                if options.contains(&code) {
                    Ok(())
                } else {
                    Err(RegistryError::invalid(
                        key,
                        format!("must be one of: {}", options.join(", ")),
                    ))
                }
            }
            (domain, value) => Err(RegistryError::invalid(
                key,
                format!("expected {}, got {}", expected_shape(domain), value.kind()),
            )),
        }
    }
}

fn expected_shape(domain: Domain) -> &'static str {
    match domain {
        Domain::Boolean => "a boolean",
        Domain::Integer { .. } => "an integer",
        Domain::Choice { .. } => "a string",
    }
}
