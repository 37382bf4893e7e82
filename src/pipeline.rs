//! One sequential collection run: fetch, extract, parse and reconcile every
//! target, then write the store once.

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

use itertools::Itertools;
use log::{debug, info, trace, warn};
use mhdata_scraping_utils::regex;

use crate::{
    collection::Collection,
    config::{Config, UrlTemplates},
    error::{ConfigError, ScrapeError},
    extractor::extract,
    fetcher::Fetcher,
    parser::{ParseContext, ParseError},
    reconciler::{reconcile, MergeMode, ReconcileReport},
    schema::{Language, Record, TargetId},
    store::Store,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::Display)]
pub enum Stage {
    Idle,
    Fetching,
    Extracting,
    Parsing,
    Reconciling,
    Writing,
    Done,
}

#[derive(Clone, Debug)]
pub enum Selection {
    Ids(Vec<TargetId>),
    /// Every slug listed on the collection's index page.
    All,
}

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub selection: Selection,
    /// Empty means every language.
    pub languages: Vec<Language>,
    pub mode: MergeMode,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Target {
    pub language: Language,
    pub id: TargetId,
}
impl Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.language, self.id)
    }
}

#[derive(Clone, Debug)]
pub struct Skipped {
    pub target: Target,
    pub stage: Stage,
    pub reason: String,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct LanguageCount {
    pub succeeded: usize,
    pub skipped: usize,
}

#[derive(Clone, Debug, getset::Getters, getset::CopyGetters)]
pub struct Summary {
    #[getset(get_copy = "pub")]
    collection: &'static str,
    #[getset(get = "pub")]
    per_language: BTreeMap<Language, LanguageCount>,
    #[getset(get_copy = "pub")]
    report: ReconcileReport,
    #[getset(get = "pub")]
    skipped: Vec<Skipped>,
    /// Whether the store file was rewritten.
    #[getset(get_copy = "pub")]
    written: bool,
    limit: usize,
}

impl Summary {
    pub fn succeeded(&self) -> usize {
        self.per_language.values().map(|c| c.succeeded).sum()
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} succeeded, {} skipped",
            self.collection,
            self.succeeded(),
            self.skipped.len()
        )?;
        for (language, count) in &self.per_language {
            writeln!(
                f,
                "  {language}: {} succeeded, {} skipped",
                count.succeeded, count.skipped
            )?;
        }
        writeln!(f, "Reconciled: {}", self.report)?;
        if !self.skipped.is_empty() {
            writeln!(f, "Skipped:")?;
            for skipped in self.skipped.iter().take(self.limit) {
                writeln!(
                    f,
                    "  {} ({}): {}",
                    skipped.target, skipped.stage, skipped.reason
                )?;
            }
            if self.skipped.len() > self.limit {
                writeln!(f, "  … and {} more", self.skipped.len() - self.limit)?;
            }
        }
        Ok(())
    }
}

/// Runs collection `T` once.  Only configuration problems abort the run;
/// a failing target is logged, counted and skipped.
pub async fn run<T: Collection>(
    fetcher: &mut Fetcher,
    config: &Config,
    options: &RunOptions,
) -> Result<Summary, ConfigError> {
    let mut stage = Stage::Idle;
    let templates = T::urls(&config.urls).ok_or(ConfigError::MissingUrlTemplate(T::NAME))?;
    templates.validate()?;
    let path = config.store_dir.join(T::STORE_FILE);
    let mut store = Store::<T::Details>::read(&path)?;
    let context = ParseContext {
        normalizer: &config.normalizer,
        offsets: &config.offsets,
    };

    let ids = select_targets::<T, _>(fetcher, templates, &store, &options.selection).await?;
    let languages = if options.languages.is_empty() {
        Language::all().collect_vec()
    } else {
        options.languages.iter().copied().sorted().dedup().collect_vec()
    };
    info!(
        "Collecting {} {} in {} languages.",
        ids.len(),
        T::NAME,
        languages.len()
    );

    let mut per_language = BTreeMap::<Language, LanguageCount>::new();
    let mut report = ReconcileReport::default();
    let mut skipped = vec![];
    for id in &ids {
        for &language in &languages {
            let target = Target {
                language,
                id: id.clone(),
            };
            let count = per_language.entry(language).or_default();
            match scrape_target::<T>(fetcher, templates, context, &target, &mut stage).await {
                Ok(records) => {
                    transition(&mut stage, Stage::Reconciling);
                    let this = reconcile(&mut store, records, language, options.mode);
                    debug!("{target}: {this}");
                    report += this;
                    count.succeeded += 1;
                }
                Err(e) => {
                    warn!("Skipping {target}: {e}");
                    count.skipped += 1;
                    skipped.push(Skipped {
                        target,
                        stage: e.stage(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    let written = report.reconciled() > 0;
    if written {
        transition(&mut stage, Stage::Writing);
        store
            .write(&path)
            .map_err(|source| ConfigError::UnwritableStore {
                path: path.clone(),
                source,
            })?;
    } else {
        info!("Nothing was reconciled; {path:?} is left as is.");
    }
    transition(&mut stage, Stage::Done);

    Ok(Summary {
        collection: T::NAME,
        per_language,
        report,
        skipped,
        written,
        limit: config.summary_limit,
    })
}

fn transition(stage: &mut Stage, next: Stage) {
    trace!("{stage} -> {next}");
    *stage = next;
}

async fn scrape_target<T: Collection>(
    fetcher: &mut Fetcher,
    templates: &UrlTemplates,
    context: ParseContext<'_>,
    target: &Target,
    stage: &mut Stage,
) -> Result<Vec<Record<T::Details>>, ScrapeError> {
    transition(stage, Stage::Fetching);
    let url = templates.page_url(target.language, &target.id)?;
    let html = fetcher.fetch(&url).await?;
    transition(stage, Stage::Extracting);
    let payload = extract(&html)?;
    trace!("{target}: {} payload", payload.kind());
    transition(stage, Stage::Parsing);
    let records = T::parse(&payload.text(), &target.id, context)?
        .into_iter()
        .filter(|record| record.language == target.language)
        .collect_vec();
    if records.is_empty() {
        return Err(ParseError::NoRecords(target.id.clone()).into());
    }
    Ok(records)
}

/// Explicit ids as given, or the slugs of the index page.  When the index is
/// unavailable, the ids already in the store are refreshed instead.
async fn select_targets<T: Collection, D>(
    fetcher: &mut Fetcher,
    templates: &UrlTemplates,
    store: &Store<D>,
    selection: &Selection,
) -> Result<Vec<TargetId>, ConfigError> {
    let ids = match selection {
        Selection::Ids(ids) => ids.iter().unique().cloned().collect_vec(),
        Selection::All => match index_slugs(fetcher, templates).await {
            Ok(slugs) if !slugs.is_empty() => slugs,
            result => {
                match result {
                    Ok(_) => warn!("The index of {} lists no slugs.", T::NAME),
                    Err(e) => warn!("The index of {} is unavailable: {e}", T::NAME),
                }
                info!("Falling back to the {} ids in the store.", store.len());
                store
                    .keys()
                    .map(|id| TargetId::from(id.as_str()))
                    .collect()
            }
        },
    };
    if ids.is_empty() {
        return Err(ConfigError::NoTargets(T::NAME));
    }
    Ok(ids)
}

async fn index_slugs(
    fetcher: &mut Fetcher,
    templates: &UrlTemplates,
) -> Result<Vec<TargetId>, ScrapeError> {
    let Some(url) = templates.index_url(Language::En) else {
        return Ok(vec![]);
    };
    let html = fetcher.fetch(&url?).await?;
    let payload = extract(&html)?;
    let text = payload.text();
    Ok(regex!(r#""slug":"([^"\\]+)""#)
        .captures_iter(&text)
        .map(|c| TargetId::from(&c[1]))
        .unique()
        .collect())
}
