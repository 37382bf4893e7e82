//! Merges freshly parsed records of one language into an existing store.

use std::{
    fmt::{self, Display},
    ops::AddAssign,
};

use indexmap::map::Entry;
use log::{debug, trace};

use crate::{
    normalizer::Normalizer,
    schema::{CanonicalId, Language, Record},
    store::Store,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum MergeMode {
    /// Existing non-empty entries win, except machine-translated ones.
    #[default]
    Preserve,
    /// Scraped entries always overwrite the language they belong to.
    Force,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ReconcileReport {
    pub added_entities: usize,
    pub added_languages: usize,
    pub replaced: usize,
    pub kept: usize,
    /// Records of a language other than the one being reconciled.
    pub ignored: usize,
}

impl ReconcileReport {
    /// Records that reached the store, whether or not they changed it.
    pub fn reconciled(&self) -> usize {
        self.added_entities + self.added_languages + self.replaced + self.kept
    }
}

impl AddAssign for ReconcileReport {
    fn add_assign(&mut self, other: Self) {
        self.added_entities += other.added_entities;
        self.added_languages += other.added_languages;
        self.replaced += other.replaced;
        self.kept += other.kept;
        self.ignored += other.ignored;
    }
}

impl Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new entities, {} new languages, {} replaced, {} kept, {} ignored",
            self.added_entities, self.added_languages, self.replaced, self.kept, self.ignored
        )
    }
}

/// The store key a record with canonical id `id` belongs to, if any.
///
/// Exact match first.  Otherwise the keys containing `id` or contained in it
/// compete; the closest length wins and ties go to the earlier key.
pub fn resolve<'s, D>(store: &'s Store<D>, id: &CanonicalId) -> Option<&'s CanonicalId> {
    if let Some((key, _)) = store.iter().find(|(key, _)| *key == id) {
        return Some(key);
    }
    let length = id.as_str().chars().count();
    store
        .keys()
        .filter(|key| Normalizer::matches(key, id))
        .min_by_key(|key| key.as_str().chars().count().abs_diff(length))
}

pub fn reconcile<D: Default + PartialEq>(
    store: &mut Store<D>,
    records: impl IntoIterator<Item = Record<D>>,
    language: Language,
    mode: MergeMode,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for record in records {
        if record.language != language {
            trace!("Ignoring {} record of {}", record.language, record.id);
            report.ignored += 1;
            continue;
        }
        let key = match resolve(store, &record.id) {
            Some(key) => {
                if key != &record.id {
                    debug!("{} was matched to the existing entity {key}", record.id);
                }
                key.clone()
            }
            None => record.id.clone(),
        };
        match store.entry(key) {
            Entry::Vacant(entry) => {
                debug!("New entity {}", entry.key());
                entry.insert([(language, record.into_entry())].into());
                report.added_entities += 1;
            }
            Entry::Occupied(mut entry) => {
                let id = entry.key().clone();
                let entity = entry.get_mut();
                match entity.get_mut(&language) {
                    None => {
                        entity.insert(language, record.into_entry());
                        report.added_languages += 1;
                    }
                    Some(existing)
                        if mode == MergeMode::Force
                            || existing.machine_translated
                            || existing.is_empty() =>
                    {
                        *existing = record.into_entry();
                        report.replaced += 1;
                    }
                    Some(_) => {
                        trace!("Keeping the existing {language} entry of {id}");
                        report.kept += 1;
                    }
                }
            }
        }
    }
    report
}
