//! Public models for the user preferences module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the preferences module and its consumers.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Opaque identity of the user owning a set of preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub Uuid);

impl UserId {
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Closed set of user-configurable preferences.
///
/// Variants are listed in the order snapshots are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreferenceKey {
    CgItemsPerPage,
    CgHideSynon,
    CgHideClrInfo,
    CgFullLstPrev,
    CgNutshell,
    CgDefaultGuide,
    PAvatarProv,
    PVectorApp,
    PHideDiscord,
    PHidePcg,
    PHomeLastEp,
    EpHideSynopses,
    EpNoAppPrev,
    EpRevStepBtn,
    APcgEarn,
    APcgMake,
    APcgSprite,
    APostReq,
    APostRes,
    AReserve,
    PcgSlots,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 21] = [
        Self::CgItemsPerPage,
        Self::CgHideSynon,
        Self::CgHideClrInfo,
        Self::CgFullLstPrev,
        Self::CgNutshell,
        Self::CgDefaultGuide,
        Self::PAvatarProv,
        Self::PVectorApp,
        Self::PHideDiscord,
        Self::PHidePcg,
        Self::PHomeLastEp,
        Self::EpHideSynopses,
        Self::EpNoAppPrev,
        Self::EpRevStepBtn,
        Self::APcgEarn,
        Self::APcgMake,
        Self::APcgSprite,
        Self::APostReq,
        Self::APostRes,
        Self::AReserve,
        Self::PcgSlots,
    ];

    /// Wire and storage name of the key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CgItemsPerPage => "cg_itemsperpage",
            Self::CgHideSynon => "cg_hidesynon",
            Self::CgHideClrInfo => "cg_hideclrinfo",
            Self::CgFullLstPrev => "cg_fulllstprev",
            Self::CgNutshell => "cg_nutshell",
            Self::CgDefaultGuide => "cg_defaultguide",
            Self::PAvatarProv => "p_avatarprov",
            Self::PVectorApp => "p_vectorapp",
            Self::PHideDiscord => "p_hidediscord",
            Self::PHidePcg => "p_hidepcg",
            Self::PHomeLastEp => "p_homelastep",
            Self::EpHideSynopses => "ep_hidesynopses",
            Self::EpNoAppPrev => "ep_noappprev",
            Self::EpRevStepBtn => "ep_revstepbtn",
            Self::APcgEarn => "a_pcgearn",
            Self::APcgMake => "a_pcgmake",
            Self::APcgSprite => "a_pcgsprite",
            Self::APostReq => "a_postreq",
            Self::APostRes => "a_postres",
            Self::AReserve => "a_reserve",
            Self::PcgSlots => "pcg_slots",
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a wire string names no registered preference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preference key '{0}'")]
pub struct UnknownPreferenceKey(pub String);

impl FromStr for PreferenceKey {
    type Err = UnknownPreferenceKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownPreferenceKey(s.to_owned()))
    }
}

/// Decoded, typed preference value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Member of an enumerated domain, by its string code.
    Choice(Cow<'static, str>),
}

impl PreferenceValue {
    #[must_use]
    pub const fn choice(code: &'static str) -> Self {
        Self::Choice(Cow::Borrowed(code))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value's shape, used in validation messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Choice(_) => "string",
        }
    }
}

impl fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Choice(code) => f.write_str(code),
        }
    }
}

/// One key with its effective value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceEntry {
    pub key: PreferenceKey,
    pub value: PreferenceValue,
}

impl PreferenceEntry {
    #[must_use]
    pub fn new(key: PreferenceKey, value: PreferenceValue) -> Self {
        Self { key, value }
    }
}
