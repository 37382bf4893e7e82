//! Field recovery from schema-less page payloads.
//!
//! Upstream payloads have no stable schema, so every field is found through a
//! named heuristic that looks for a structural motif in the compact text:
//!
//! * **translation block**: `"<key>":{"<lang>":"…",…}`, an object whose keys are
//!   all language codes.  Blocks are collected in document order.
//! * **level row**: `"level":<n>,` immediately followed by a `description` block.
//! * **skill row**: a `skill` block wrapped as `{["piece":<p>,]"skill":…,"level":<n>}`.
//! * **scalar**: the first `"<field>":<token>` occurrence.
//!
//! A heuristic whose anchor is absent yields nothing; the field then keeps its
//! default value.  Where several blocks share a key, which occurrence means
//! what is decided by [`OffsetTable`], never by inline indices.

use std::{
    collections::{BTreeMap, HashMap},
    ops::Range,
    str::FromStr,
};

use indexmap::IndexMap;
use itertools::Itertools;
use log::trace;
use mhdata_scraping_utils::regex;
use regex::Regex;
use serde::Deserialize;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::{
    normalizer::Normalizer,
    schema::{ArmorSlot, CanonicalId, Language, SkillRef, TargetId},
};

pub mod armor;
pub mod charm;
pub mod skill;
pub mod weapon;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No record could be recovered for {0}")]
    NoRecords(TargetId),
    #[error("Neither the English name nor the slug of {0} yields a canonical id")]
    NoCanonicalId(TargetId),
}

/// Which occurrence of a repeated block carries which field.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OffsetTable {
    /// Occurrence of the `name` block naming the entity itself.
    pub name: usize,
    pub armor: ArmorOffsets,
}
impl Default for OffsetTable {
    fn default() -> Self {
        Self {
            name: 0,
            armor: ArmorOffsets::default(),
        }
    }
}

/// Where one armor piece's fields sit in their own sequences.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PieceOffsets {
    /// Occurrence of the piece's `name` block, counted from the series name.
    pub name: usize,
    /// Zero-based index among the stat rows.
    pub stats: usize,
    /// Value of `"piece":N` on the piece's skill rows.
    pub piece: usize,
}
impl PieceOffsets {
    const fn nth(n: usize) -> Self {
        Self {
            name: n,
            stats: n - 1,
            piece: n,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArmorOffsets {
    pub head: PieceOffsets,
    pub chest: PieceOffsets,
    pub arms: PieceOffsets,
    pub waist: PieceOffsets,
    pub legs: PieceOffsets,
}
impl Default for ArmorOffsets {
    fn default() -> Self {
        Self {
            head: PieceOffsets::nth(1),
            chest: PieceOffsets::nth(2),
            arms: PieceOffsets::nth(3),
            waist: PieceOffsets::nth(4),
            legs: PieceOffsets::nth(5),
        }
    }
}
impl ArmorOffsets {
    pub fn get(&self, slot: ArmorSlot) -> PieceOffsets {
        match slot {
            ArmorSlot::Head => self.head,
            ArmorSlot::Chest => self.chest,
            ArmorSlot::Arms => self.arms,
            ArmorSlot::Waist => self.waist,
            ArmorSlot::Legs => self.legs,
        }
    }
}

#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub normalizer: &'a Normalizer,
    pub offsets: &'a OffsetTable,
}

#[derive(Clone, PartialEq, Debug)]
pub struct TranslationBlock {
    pub key: String,
    /// Byte range of `"key":{…}` in the page text.
    pub span: Range<usize>,
    pub translations: BTreeMap<Language, String>,
}
impl TranslationBlock {
    pub fn get(&self, language: Language) -> Option<&str> {
        self.translations.get(&language).map(String::as_str)
    }
}

fn translation_block_pattern() -> String {
    let languages = Language::iter().map(|l| regex::escape(l.code())).join("|");
    let entry = format!(r#""(?:{languages})":"(?:[^"\\]|\\.)*""#);
    format!(r#""(?P<key>[A-Za-z_][A-Za-z0-9_]*)":(?P<block>\{{{entry}(?:,{entry})*\}})"#)
}

pub struct LevelRow<'p> {
    pub level: u32,
    pub block: &'p TranslationBlock,
}

pub struct SkillRow<'p> {
    pub piece: Option<usize>,
    pub level: u32,
    pub block: &'p TranslationBlock,
}

/// A page text together with the translation blocks found in it.
pub struct Page<'t> {
    text: &'t str,
    blocks: Vec<TranslationBlock>,
}

impl<'t> Page<'t> {
    pub fn new(text: &'t str) -> Self {
        let blocks = regex!(translation_block_pattern())
            .captures_iter(text)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let translations = serde_json::from_str::<IndexMap<String, String>>(
                    captures.name("block")?.as_str(),
                )
                .ok()?
                .into_iter()
                .filter_map(|(code, text)| Some((code.parse().ok()?, text)))
                .collect();
                Some(TranslationBlock {
                    key: captures["key"].to_owned(),
                    span: whole.range(),
                    translations,
                })
            })
            .collect_vec();
        trace!("Found {} translation blocks", blocks.len());
        Self { text, blocks }
    }

    pub fn blocks(&self) -> &[TranslationBlock] {
        &self.blocks
    }

    /// The `occurrence`-th block (zero-based) whose key is `key`.
    pub fn nth_block(&self, key: &str, occurrence: usize) -> Option<&TranslationBlock> {
        self.blocks.iter().filter(|b| b.key == key).nth(occurrence)
    }

    /// Level rows: `"level":<n>,` directly followed by a `description` block.
    pub fn level_rows(&self) -> Vec<LevelRow<'_>> {
        let by_start: HashMap<_, _> = self
            .blocks
            .iter()
            .filter(|b| b.key == "description")
            .map(|b| (b.span.start, b))
            .collect();
        regex!(r#""level":([^,{}\[\]]*),"#)
            .captures_iter(self.text)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let block = *by_start.get(&whole.end())?;
                Some(LevelRow {
                    level: int_or_zero(&captures[1]),
                    block,
                })
            })
            .collect()
    }

    /// The first `description` block that does not belong to a level row.
    pub fn description(&self, level_rows: &[LevelRow]) -> Option<&TranslationBlock> {
        self.blocks.iter().find(|b| {
            b.key == "description"
                && !level_rows
                    .iter()
                    .any(|row| row.block.span.start == b.span.start)
        })
    }

    /// Skill rows: `{"skill":{…},"level":<n>}`, optionally tagged with `"piece":<p>,`.
    pub fn skill_rows(&self) -> Vec<SkillRow<'_>> {
        self.blocks
            .iter()
            .filter(|b| b.key == "skill")
            .filter_map(|block| {
                let head = &self.text[..block.span.start];
                let head = &head[head.rfind('{')?..];
                let piece = regex!(r#"^\{(?:"piece":([^,{}\[\]]*),)?$"#).captures(head)?;
                let tail = regex!(r#"^,"level":([^,{}\[\]]*)\}"#)
                    .captures(&self.text[block.span.end..])?;
                Some(SkillRow {
                    piece: piece.get(1).map(|m| int_or_zero(m.as_str())),
                    level: int_or_zero(&tail[1]),
                    block,
                })
            })
            .collect()
    }

    /// Languages to emit records for: those of `name`, or of every block when it is missing.
    pub fn languages(&self, name: Option<&TranslationBlock>) -> Vec<Language> {
        match name {
            Some(name) => name.translations.keys().copied().collect(),
            None => self
                .blocks
                .iter()
                .flat_map(|b| b.translations.keys().copied())
                .sorted()
                .dedup()
                .collect(),
        }
    }

    /// Resolves the canonical id and languages shared by every record of the page.
    pub fn identify(
        &self,
        name: Option<&TranslationBlock>,
        target: &TargetId,
        normalizer: &Normalizer,
    ) -> Result<(CanonicalId, Vec<Language>), ParseError> {
        let languages = self.languages(name);
        if languages.is_empty() {
            return Err(ParseError::NoRecords(target.clone()));
        }
        let id = name
            .and_then(|b| b.get(Language::En))
            .map(|english| normalizer.normalize(english))
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| normalizer.normalize(target.as_str()));
        if id.is_empty() {
            return Err(ParseError::NoCanonicalId(target.clone()));
        }
        Ok((id, languages))
    }
}

/// Text of `block` in `language`, or empty when the block or the translation is missing.
pub fn text_in(block: Option<&TranslationBlock>, language: Language) -> String {
    block
        .and_then(|b| b.get(language))
        .unwrap_or_default()
        .to_owned()
}

/// Builds a skill reference in `language`, keyed by the English name when available.
pub fn skill_ref(
    row: &SkillRow,
    language: Language,
    normalizer: &Normalizer,
) -> Option<SkillRef> {
    let name = row.block.get(language)?;
    let key = row.block.get(Language::En).unwrap_or(name);
    Some(SkillRef {
        skill: normalizer.normalize(key),
        name: name.to_owned(),
        level: row.level,
    })
}

/// Base-10 integer parsing where a malformed token yields zero.
pub fn int_or_zero<T: FromStr + Default>(token: &str) -> T {
    token.trim().trim_matches('"').parse().unwrap_or_default()
}

/// The token of the first match of `pattern`'s first capture group.
pub fn first_capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    Some(pattern.captures(text)?.get(1)?.as_str())
}
