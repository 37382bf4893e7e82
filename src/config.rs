use std::path::{Path, PathBuf};

use mhdata_scraping_utils::fs_json_util::read_toml;
use serde::Deserialize;
use url::Url;

use crate::{
    error::{ConfigError, ScrapeError},
    fetcher::HttpConfig,
    normalizer::Normalizer,
    parser::OffsetTable,
    schema::{Language, TargetId},
};

const LANGUAGE_PLACEHOLDER: &str = "{lang}";
const SLUG_PLACEHOLDER: &str = "{slug}";

/// Everything a run reads from `mhdata.toml`.  See `config.example.toml`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store_dir: PathBuf,
    /// Maximum number of skipped targets listed in a run summary.
    pub summary_limit: usize,
    pub http: HttpConfig,
    pub urls: UrlConfig,
    pub offsets: OffsetTable,
    pub normalizer: Normalizer,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("data"),
            summary_limit: 20,
            http: HttpConfig::default(),
            urls: UrlConfig::default(),
            offsets: OffsetTable::default(),
            normalizer: Normalizer::default(),
        }
    }
}
impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_toml(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_owned(),
            source,
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UrlConfig {
    pub skills: Option<UrlTemplates>,
    pub armors: Option<UrlTemplates>,
    pub weapons: Option<UrlTemplates>,
    pub charms: Option<UrlTemplates>,
}

/// URL templates of one collection.
///
/// `{lang}` is replaced with a language code and `{slug}` with a target slug.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UrlTemplates {
    /// Detail page of one entity.  Must contain `{slug}`.
    pub page: String,
    /// Listing of every entity, used when all targets are requested.
    pub index: Option<String>,
}

impl UrlTemplates {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.page.contains(SLUG_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder {
                template: self.page.clone(),
                placeholder: SLUG_PLACEHOLDER,
            });
        }
        Ok(())
    }

    pub fn page_url(&self, language: Language, slug: &TargetId) -> Result<Url, ScrapeError> {
        fill(&self.page, language, Some(slug))
    }

    pub fn index_url(&self, language: Language) -> Option<Result<Url, ScrapeError>> {
        Some(fill(self.index.as_ref()?, language, None))
    }
}

fn fill(template: &str, language: Language, slug: Option<&TargetId>) -> Result<Url, ScrapeError> {
    let mut url = template.replace(LANGUAGE_PLACEHOLDER, language.code());
    if let Some(slug) = slug {
        url = url.replace(SLUG_PLACEHOLDER, slug.as_str());
    }
    Url::parse(&url).map_err(|source| ScrapeError::InvalidUrl { url, source })
}
