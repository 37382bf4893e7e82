use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::info;
use mhdata_scraping::{
    collection::{Armors, Charms, Collection, CollectionKind, Skills, Weapons},
    config::Config,
    fetcher::Fetcher,
    pipeline::{self, RunOptions, Selection},
    reconciler::MergeMode,
    schema::{Language, TargetId},
    store::Store,
    translation::{fill_missing, PhraseTable},
};

#[derive(Parser)]
struct Opts {
    #[command(subcommand)]
    sub: Sub,
}

#[derive(Subcommand)]
enum Sub {
    /// Collect entities from the upstream sites into the store.
    Scrape(ScrapeArgs),
    /// Fill missing languages of a store from a phrase table.
    Translate(TranslateArgs),
}

#[derive(Args)]
struct ScrapeArgs {
    kind: CollectionKind,
    /// Comma-separated slugs to collect.
    #[arg(long, value_delimiter = ',', required_unless_present = "all", conflicts_with = "all")]
    ids: Vec<String>,
    /// Collect every slug listed on the index page.
    #[arg(long)]
    all: bool,
    /// Comma-separated language codes.  Every language when omitted.
    #[arg(long, value_delimiter = ',')]
    languages: Vec<Language>,
    /// Overwrite existing entries of the scraped languages.
    #[arg(long)]
    force: bool,
    #[arg(long, default_value = "mhdata.toml")]
    config: PathBuf,
    /// Overrides `store_dir` of the configuration.
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

#[derive(Args)]
struct TranslateArgs {
    kind: CollectionKind,
    /// JSON file of the form `{"fr": [["source", "replacement"], ...], ...}`.
    #[arg(long)]
    phrases: PathBuf,
    #[arg(long, default_value = "en")]
    from: Language,
    /// Comma-separated language codes.  Every language of the phrase table when omitted.
    #[arg(long, value_delimiter = ',')]
    to: Vec<Language>,
    #[arg(long, default_value = "mhdata.toml")]
    config: PathBuf,
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let opts = Opts::parse();

    match opts.sub {
        Sub::Scrape(args) => match args.kind {
            CollectionKind::Skills => scrape::<Skills>(args).await,
            CollectionKind::Armors => scrape::<Armors>(args).await,
            CollectionKind::Weapons => scrape::<Weapons>(args).await,
            CollectionKind::Charms => scrape::<Charms>(args).await,
        },
        Sub::Translate(args) => match args.kind {
            CollectionKind::Skills => translate::<Skills>(args),
            CollectionKind::Armors => translate::<Armors>(args),
            CollectionKind::Weapons => translate::<Weapons>(args),
            CollectionKind::Charms => translate::<Charms>(args),
        },
    }
}

fn load_config(path: &Path, store_dir: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = Config::load(path)?;
    if let Some(store_dir) = store_dir {
        config.store_dir = store_dir;
    }
    Ok(config)
}

async fn scrape<T: Collection>(args: ScrapeArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config, args.store_dir)?;
    let mut fetcher = Fetcher::new(config.http.clone())?;
    let options = RunOptions {
        selection: if args.all {
            Selection::All
        } else {
            Selection::Ids(args.ids.iter().map(|id| TargetId::from(id.as_str())).collect())
        },
        languages: args.languages,
        mode: if args.force {
            MergeMode::Force
        } else {
            MergeMode::Preserve
        },
    };
    let summary = pipeline::run::<T>(&mut fetcher, &config, &options)
        .await
        .with_context(|| format!("The {} run was aborted", T::NAME))?;
    print!("{summary}");
    Ok(())
}

fn translate<T: Collection>(args: TranslateArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config, args.store_dir)?;
    let phrases = PhraseTable::load(&args.phrases)?;
    let targets = if args.to.is_empty() {
        phrases.languages().collect()
    } else {
        args.to
    };
    let path = config.store_dir.join(T::STORE_FILE);
    let mut store = Store::<T::Details>::read(&path)?;
    let added = fill_missing(&mut store, &phrases, args.from, &targets);
    if added > 0 {
        store.write(&path)?;
    } else {
        info!("No entry was added; {path:?} is left as is.");
    }
    println!("Added {added} machine-translated entries to {path:?}.");
    Ok(())
}
