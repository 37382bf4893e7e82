use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::{UrlConfig, UrlTemplates},
    parser::{self, ParseContext, ParseError},
    schema::{ArmorDetails, CharmDetails, Record, SkillDetails, TargetId, WeaponDetails},
    translation::TranslatableDetails,
};

/// One kind of entity, collected into its own store file.
pub trait Collection {
    const NAME: &'static str;
    const STORE_FILE: &'static str;

    type Details: Clone
        + Default
        + PartialEq
        + Debug
        + Serialize
        + DeserializeOwned
        + TranslatableDetails;

    fn parse(
        text: &str,
        target: &TargetId,
        context: ParseContext,
    ) -> Result<Vec<Record<Self::Details>>, ParseError>;

    fn urls(config: &UrlConfig) -> Option<&UrlTemplates>;
}

/// Runtime selector of a [`Collection`], as given on the command line.
#[derive(
    Clone, Copy, PartialEq, Eq, Debug, clap::ValueEnum, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum CollectionKind {
    Skills,
    Armors,
    Weapons,
    Charms,
}

pub struct Skills;
pub struct Armors;
pub struct Weapons;
pub struct Charms;

impl Collection for Skills {
    const NAME: &'static str = "skills";
    const STORE_FILE: &'static str = "skills.json";
    type Details = SkillDetails;

    fn parse(
        text: &str,
        target: &TargetId,
        context: ParseContext,
    ) -> Result<Vec<Record<SkillDetails>>, ParseError> {
        parser::skill::parse(text, target, context)
    }

    fn urls(config: &UrlConfig) -> Option<&UrlTemplates> {
        config.skills.as_ref()
    }
}

impl Collection for Armors {
    const NAME: &'static str = "armors";
    const STORE_FILE: &'static str = "armors.json";
    type Details = ArmorDetails;

    fn parse(
        text: &str,
        target: &TargetId,
        context: ParseContext,
    ) -> Result<Vec<Record<ArmorDetails>>, ParseError> {
        parser::armor::parse(text, target, context)
    }

    fn urls(config: &UrlConfig) -> Option<&UrlTemplates> {
        config.armors.as_ref()
    }
}

impl Collection for Weapons {
    const NAME: &'static str = "weapons";
    const STORE_FILE: &'static str = "weapons.json";
    type Details = WeaponDetails;

    fn parse(
        text: &str,
        target: &TargetId,
        context: ParseContext,
    ) -> Result<Vec<Record<WeaponDetails>>, ParseError> {
        parser::weapon::parse(text, target, context)
    }

    fn urls(config: &UrlConfig) -> Option<&UrlTemplates> {
        config.weapons.as_ref()
    }
}

impl Collection for Charms {
    const NAME: &'static str = "charms";
    const STORE_FILE: &'static str = "charms.json";
    type Details = CharmDetails;

    fn parse(
        text: &str,
        target: &TargetId,
        context: ParseContext,
    ) -> Result<Vec<Record<CharmDetails>>, ParseError> {
        parser::charm::parse(text, target, context)
    }

    fn urls(config: &UrlConfig) -> Option<&UrlTemplates> {
        config.charms.as_ref()
    }
}

impl CollectionKind {
    pub fn store_file(self) -> &'static str {
        match self {
            CollectionKind::Skills => Skills::STORE_FILE,
            CollectionKind::Armors => Armors::STORE_FILE,
            CollectionKind::Weapons => Weapons::STORE_FILE,
            CollectionKind::Charms => Charms::STORE_FILE,
        }
    }
}
