//! Machine translation used to fill languages that no upstream page provides.

use std::{collections::BTreeMap, path::Path};

use log::{debug, info};
use mhdata_scraping_utils::fs_json_util::read_json;
use serde::Deserialize;

use crate::{
    schema::{
        ArmorDetails, CharmDetails, Language, LocalizedEntry, SkillDetails, SkillRef,
        WeaponDetails,
    },
    store::Store,
};

pub trait Translator {
    /// `None` when `text` cannot be rendered in `to`.
    fn translate(&self, text: &str, to: Language) -> Option<String>;
}

/// Phrase-by-phrase substitution per target language.
///
/// Loaded from JSON of the form `{"fr": [["Attack", "Attaque"], …], …}`.
/// Longer phrases take precedence, and replaced text is never matched again.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(from = "BTreeMap<Language, Vec<(String, String)>>")]
pub struct PhraseTable(BTreeMap<Language, Vec<(String, String)>>);

impl From<BTreeMap<Language, Vec<(String, String)>>> for PhraseTable {
    fn from(mut phrases: BTreeMap<Language, Vec<(String, String)>>) -> Self {
        for list in phrases.values_mut() {
            list.retain(|(source, _)| !source.is_empty());
            list.sort_by(|(x, _), (y, _)| y.chars().count().cmp(&x.chars().count()));
        }
        Self(phrases)
    }
}

impl PhraseTable {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        read_json(path)
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.0.keys().copied()
    }
}

impl Translator for PhraseTable {
    fn translate(&self, text: &str, to: Language) -> Option<String> {
        let phrases = self.0.get(&to)?;
        let mut translated = String::with_capacity(text.len());
        let mut substituted = false;
        let mut rest = text;
        'outer: while let Some(c) = rest.chars().next() {
            for (source, replacement) in phrases {
                if let Some(after) = rest.strip_prefix(source.as_str()) {
                    translated.push_str(replacement);
                    substituted = true;
                    rest = after;
                    continue 'outer;
                }
            }
            translated.push(c);
            rest = &rest[c.len_utf8()..];
        }
        (substituted || text.is_empty()).then_some(translated)
    }
}

/// Details whose embedded text can be translated along with the entry.
pub trait TranslatableDetails: Sized {
    fn translated(&self, translate: &mut dyn FnMut(&str) -> Option<String>) -> Option<Self>;
}

/// Empty text stays empty.  Anything else must be translatable.
fn translate_text(translate: &mut dyn FnMut(&str) -> Option<String>, text: &str) -> Option<String> {
    if text.is_empty() {
        Some(String::new())
    } else {
        translate(text)
    }
}

fn translate_skills(
    translate: &mut dyn FnMut(&str) -> Option<String>,
    skills: &[SkillRef],
) -> Option<Vec<SkillRef>> {
    skills
        .iter()
        .map(|skill| {
            Some(SkillRef {
                name: translate_text(translate, &skill.name)?,
                ..skill.clone()
            })
        })
        .collect()
}

impl TranslatableDetails for SkillDetails {
    fn translated(&self, translate: &mut dyn FnMut(&str) -> Option<String>) -> Option<Self> {
        let levels = self
            .levels
            .iter()
            .map(|(&level, text)| Some((level, translate_text(translate, text)?)))
            .collect::<Option<_>>()?;
        Some(Self { levels })
    }
}

impl TranslatableDetails for ArmorDetails {
    fn translated(&self, translate: &mut dyn FnMut(&str) -> Option<String>) -> Option<Self> {
        let mut pieces = self.pieces.clone();
        for piece in &mut pieces {
            piece.name = translate_text(translate, &piece.name)?;
            piece.skills = translate_skills(translate, &piece.skills)?;
        }
        Some(Self {
            rarity: self.rarity,
            pieces,
        })
    }
}

impl TranslatableDetails for WeaponDetails {
    fn translated(&self, translate: &mut dyn FnMut(&str) -> Option<String>) -> Option<Self> {
        Some(Self {
            skills: translate_skills(translate, &self.skills)?,
            ..self.clone()
        })
    }
}

impl TranslatableDetails for CharmDetails {
    fn translated(&self, translate: &mut dyn FnMut(&str) -> Option<String>) -> Option<Self> {
        Some(Self {
            rarity: self.rarity,
            skills: translate_skills(translate, &self.skills)?,
        })
    }
}

/// Adds a machine-translated entry, derived from `from`, for every language in
/// `targets` an entity lacks.  Existing entries are never touched.
///
/// Returns the number of entries added.
pub fn fill_missing<D: TranslatableDetails>(
    store: &mut Store<D>,
    translator: &impl Translator,
    from: Language,
    targets: &[Language],
) -> usize {
    let mut added = 0;
    for (id, entity) in store.iter_mut() {
        let Some(source) = entity.get(&from) else {
            continue;
        };
        let mut translations = vec![];
        for &to in targets {
            if to == from || entity.contains_key(&to) {
                continue;
            }
            let mut translate = |text: &str| translator.translate(text, to);
            let entry = (|| {
                Some(LocalizedEntry {
                    name: translate_text(&mut translate, &source.name)?,
                    description: translate_text(&mut translate, &source.description)?,
                    details: source.details.translated(&mut translate)?,
                    machine_translated: true,
                })
            })();
            match entry {
                Some(entry) => translations.push((to, entry)),
                None => debug!("{id} cannot be translated into {to}"),
            }
        }
        added += translations.len();
        entity.extend(translations);
    }
    info!("Added {added} machine-translated entries.");
    added
}
