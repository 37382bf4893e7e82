use mhdata_scraping_utils::regex;

use crate::schema::{CharmDetails, Record, TargetId};

use super::{first_capture, int_or_zero, skill_ref, text_in, Page, ParseContext, ParseError};

pub fn parse(
    text: &str,
    target: &TargetId,
    context: ParseContext,
) -> Result<Vec<Record<CharmDetails>>, ParseError> {
    let page = Page::new(text);
    let name = page.nth_block("name", context.offsets.name);
    let level_rows = page.level_rows();
    let description = page.description(&level_rows);
    let (id, languages) = page.identify(name, target, context.normalizer)?;
    let rarity = first_capture(regex!(r#""rarity":([^,{}\[\]]*)"#), text).map_or(0, int_or_zero);
    let skill_rows = page.skill_rows();

    Ok(languages
        .into_iter()
        .map(|language| Record {
            id: id.clone(),
            language,
            name: text_in(name, language),
            description: text_in(description, language),
            details: CharmDetails {
                rarity,
                skills: skill_rows
                    .iter()
                    .filter_map(|row| skill_ref(row, language, context.normalizer))
                    .collect(),
            },
        })
        .collect())
}
