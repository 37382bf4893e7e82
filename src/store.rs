use std::path::Path;

use indexmap::{map::Entry, IndexMap};
use log::info;
use mhdata_scraping_utils::fs_json_util::{read_json_if_exists, write_json_pretty_atomic};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::ConfigError,
    schema::{CanonicalId, Entity},
};

/// Every entity of one kind, in file order.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "D: Serialize",
    deserialize = "D: Deserialize<'de>"
))]
pub struct Store<D>(IndexMap<CanonicalId, Entity<D>>);

impl<D> Default for Store<D> {
    fn default() -> Self {
        Self(IndexMap::new())
    }
}

impl<D> Store<D> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: &CanonicalId) -> Option<&Entity<D>> {
        self.0.get(id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CanonicalId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalId, &Entity<D>)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&CanonicalId, &mut Entity<D>)> {
        self.0.iter_mut()
    }

    /// New ids are appended after every existing one.
    pub fn entry(&mut self, id: CanonicalId) -> Entry<'_, CanonicalId, Entity<D>> {
        self.0.entry(id)
    }
}

impl<D> FromIterator<(CanonicalId, Entity<D>)> for Store<D> {
    fn from_iter<I: IntoIterator<Item = (CanonicalId, Entity<D>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<D: DeserializeOwned> Store<D> {
    /// Loads the store at `path`.  A missing file is an empty store.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        match read_json_if_exists(path) {
            Ok(Some(store)) => {
                info!("Loaded the existing store from {path:?}.");
                Ok(store)
            }
            Ok(None) => {
                info!("{path:?} was not found.  Starting from an empty store.");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::UnreadableStore {
                path: path.to_owned(),
                source,
            }),
        }
    }
}

impl<D: Serialize> Store<D> {
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }
        write_json_pretty_atomic(path, self)?;
        info!("Saved {} entities to {path:?}.", self.len());
        Ok(())
    }
}
