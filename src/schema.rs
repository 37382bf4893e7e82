use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use strum::{EnumIter, IntoEnumIterator};

/// Languages the dataset is collected in.
///
/// The declaration order is the order in which languages are stored inside an entity.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    EnumIter,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    Serialize,
    Deserialize,
)]
pub enum Language {
    #[serde(rename = "ja")]
    #[strum(serialize = "ja")]
    Ja,
    #[serde(rename = "en")]
    #[strum(serialize = "en")]
    En,
    #[serde(rename = "fr")]
    #[strum(serialize = "fr")]
    Fr,
    #[serde(rename = "it")]
    #[strum(serialize = "it")]
    It,
    #[serde(rename = "de")]
    #[strum(serialize = "de")]
    De,
    #[serde(rename = "es")]
    #[strum(serialize = "es")]
    Es,
    #[serde(rename = "ru")]
    #[strum(serialize = "ru")]
    Ru,
    #[serde(rename = "pl")]
    #[strum(serialize = "pl")]
    Pl,
    #[serde(rename = "pt-BR")]
    #[strum(serialize = "pt-BR")]
    PtBr,
    #[serde(rename = "ko")]
    #[strum(serialize = "ko")]
    Ko,
    #[serde(rename = "zh-Hant")]
    #[strum(serialize = "zh-Hant")]
    ZhHant,
    #[serde(rename = "zh-Hans")]
    #[strum(serialize = "zh-Hans")]
    ZhHans,
    #[serde(rename = "ar")]
    #[strum(serialize = "ar")]
    Ar,
}
impl Language {
    pub fn code(self) -> &'static str {
        self.into()
    }

    pub fn all() -> impl Iterator<Item = Language> {
        Self::iter()
    }
}

/// Normalized, language-independent key of an entity in a store.
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Default,
    derive_more::From,
    derive_more::AsRef,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
#[as_ref(forward)]
#[serde(transparent)]
pub struct CanonicalId(String);
impl CanonicalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Slug as it appears in an upstream URL path.
#[derive(
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    derive_more::From,
    derive_more::AsRef,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
#[as_ref(forward)]
#[serde(transparent)]
pub struct TargetId(String);
impl TargetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// One entity in one language, as recovered from a single page.
#[derive(Clone, PartialEq, Debug)]
pub struct Record<D> {
    pub id: CanonicalId,
    pub language: Language,
    pub name: String,
    pub description: String,
    pub details: D,
}
impl<D> Record<D> {
    pub fn into_entry(self) -> LocalizedEntry<D> {
        LocalizedEntry {
            name: self.name,
            description: self.description,
            details: self.details,
            machine_translated: false,
        }
    }
}

/// The value stored for one language of one entity.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct LocalizedEntry<D> {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub details: D,
    /// Set when the entry was derived from another language by phrase substitution.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub machine_translated: bool,
}
impl<D: Default + PartialEq> LocalizedEntry<D> {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.description.is_empty() && self.details == D::default()
    }
}

/// All languages collected so far for one entity.
pub type Entity<D> = BTreeMap<Language, LocalizedEntry<D>>;

#[serde_as]
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct SkillDetails {
    /// Effect text per skill level.
    #[serde_as(as = "BTreeMap<DisplayFromStr, _>")]
    #[serde(default)]
    pub levels: BTreeMap<u32, String>,
}

/// A reference from a piece of equipment to a skill it grants.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct SkillRef {
    /// Key of the skill in the skill store (normalized English name).
    pub skill: CanonicalId,
    pub name: String,
    pub level: u32,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct ArmorDetails {
    #[serde(default)]
    pub rarity: u32,
    #[serde(default)]
    pub pieces: Vec<ArmorPiece>,
}

#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ArmorSlot {
    Head,
    Chest,
    Arms,
    Waist,
    Legs,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ArmorPiece {
    pub slot: ArmorSlot,
    pub name: String,
    pub defense: u32,
    pub resistances: Resistances,
    #[serde(default)]
    pub skills: Vec<SkillRef>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Resistances {
    pub fire: i32,
    pub water: i32,
    pub thunder: i32,
    pub ice: i32,
    pub dragon: i32,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct WeaponDetails {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub rarity: u32,
    #[serde(default)]
    pub attack: u32,
    #[serde(default)]
    pub affinity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Element>,
    #[serde(default)]
    pub slots: Vec<u32>,
    #[serde(default)]
    pub skills: Vec<SkillRef>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Element {
    pub kind: String,
    pub value: u32,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct CharmDetails {
    #[serde(default)]
    pub rarity: u32,
    #[serde(default)]
    pub skills: Vec<SkillRef>,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{Language, LocalizedEntry, SkillDetails};

    #[test]
    fn language_codes_round_trip() {
        for language in Language::all() {
            assert_eq!(language.code().parse::<Language>().unwrap(), language);
            let json = serde_json::to_string(&language).unwrap();
            assert_eq!(json, format!("\"{}\"", language.code()));
        }
        assert_eq!("pt-BR".parse::<Language>().unwrap(), Language::PtBr);
        assert!("xx".parse::<Language>().is_err());
    }

    #[test]
    fn skill_entry_shape() {
        let entry = LocalizedEntry {
            name: "Attack Boost".to_owned(),
            description: "Increases attack.".to_owned(),
            details: SkillDetails {
                levels: BTreeMap::from([(1, "+3".to_owned()), (2, "+5".to_owned())]),
            },
            machine_translated: false,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Attack Boost","description":"Increases attack.","levels":{"1":"+3","2":"+5"}}"#
        );
        let back: LocalizedEntry<SkillDetails> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn empty_entry() {
        assert!(LocalizedEntry::<SkillDetails>::default().is_empty());
        let entry = LocalizedEntry::<SkillDetails> {
            description: "x".to_owned(),
            ..Default::default()
        };
        assert!(!entry.is_empty());
    }
}
