//! Prints how many entities of each store have an entry in each language.

use std::{collections::BTreeMap, path::PathBuf};

use clap::Parser;
use indexmap::IndexMap;
use mhdata_scraping::schema::Language;
use mhdata_scraping_utils::fs_json_util::read_json;
use serde::Deserialize;
use strum::IntoEnumIterator;

#[derive(Parser)]
struct Opts {
    #[arg(required = true)]
    stores: Vec<PathBuf>,
}

/// Only what coverage needs from an entry; the details are ignored.
#[derive(Deserialize)]
struct EntryFlags {
    #[serde(default)]
    machine_translated: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    for path in &opts.stores {
        let store: IndexMap<String, BTreeMap<Language, EntryFlags>> = read_json(path)?;
        println!("{path:?}: {} entities", store.len());
        for language in Language::iter() {
            let entries = store.values().filter_map(|entity| entity.get(&language));
            let (scraped, translated) = entries.fold((0, 0), |(s, t), entry| {
                if entry.machine_translated {
                    (s, t + 1)
                } else {
                    (s + 1, t)
                }
            });
            let percentage = if store.is_empty() {
                0.
            } else {
                100. * (scraped + translated) as f64 / store.len() as f64
            };
            println!(
                "  {:<8}{scraped:>6} scraped{translated:>6} translated  {percentage:>5.1}%",
                language.code()
            );
        }
    }
    Ok(())
}
