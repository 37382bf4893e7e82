use mhdata_scraping_utils::regex;

use crate::schema::{Element, Record, TargetId, WeaponDetails};

use super::{first_capture, int_or_zero, skill_ref, text_in, Page, ParseContext, ParseError};

pub fn parse(
    text: &str,
    target: &TargetId,
    context: ParseContext,
) -> Result<Vec<Record<WeaponDetails>>, ParseError> {
    let page = Page::new(text);
    let name = page.nth_block("name", context.offsets.name);
    let level_rows = page.level_rows();
    let description = page.description(&level_rows);
    let (id, languages) = page.identify(name, target, context.normalizer)?;

    let kind = first_capture(regex!(r#""kind":"([^"\\]*)""#), text)
        .unwrap_or_default()
        .to_owned();
    let rarity = first_capture(regex!(r#""rarity":([^,{}\[\]]*)"#), text).map_or(0, int_or_zero);
    let attack = first_capture(regex!(r#""attack":([^,{}\[\]]*)"#), text).map_or(0, int_or_zero);
    let affinity =
        first_capture(regex!(r#""affinity":([^,{}\[\]]*)"#), text).map_or(0, int_or_zero);
    let element = regex!(r#""element":\{"type":"([^"\\]*)","value":([^,{}\[\]]*)\}"#)
        .captures(text)
        .map(|c| Element {
            kind: c[1].to_owned(),
            value: int_or_zero(&c[2]),
        });
    let slots: Vec<u32> = first_capture(regex!(r#""slots":\[([^\]]*)\]"#), text)
        .map(|list| {
            list.split(',')
                .filter(|s| !s.trim().is_empty())
                .map(int_or_zero)
                .collect()
        })
        .unwrap_or_default();
    let skill_rows = page.skill_rows();

    Ok(languages
        .into_iter()
        .map(|language| Record {
            id: id.clone(),
            language,
            name: text_in(name, language),
            description: text_in(description, language),
            details: WeaponDetails {
                kind: kind.clone(),
                rarity,
                attack,
                affinity,
                element: element.clone(),
                slots: slots.clone(),
                skills: skill_rows
                    .iter()
                    .filter_map(|row| skill_ref(row, language, context.normalizer))
                    .collect(),
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::{
        extractor::extract,
        normalizer::Normalizer,
        parser::{OffsetTable, ParseContext},
        schema::{Element, Language},
    };

    #[test]
    fn test_next_data_weapon() {
        let html = r#"<!DOCTYPE html><html><body><div id="__next"></div>
<script id="__NEXT_DATA__" type="application/json">{"props":{"pageProps":{"weapon":{
"name":{"en":"Flammenzahn","de":"Flammenzahn","ja":"フラムネスタ"},
"description":{"en":"A great sword forged from Rathalos materials.","de":"Ein Großschwert."},
"kind":"great-sword","rarity":6,"attack":"180","affinity":-10,
"element":{"type":"fire","value":300},"slots":[3, 1, 0],
"skills":[{"skill":{"en":"Attack Boost","de":"Angriffsbonus"},"level":1}]}},"page":"/weapons/[slug]"}}</script>
</body></html>"#;
        let payload = extract(html).unwrap();
        let (normalizer, offsets): (Normalizer, OffsetTable) = Default::default();
        let records = parse(
            &payload.text(),
            &"flammenzahn".into(),
            ParseContext {
                normalizer: &normalizer,
                offsets: &offsets,
            },
        )
        .unwrap();
        assert_eq!(
            records.iter().map(|r| r.language).collect::<Vec<_>>(),
            [Language::Ja, Language::En, Language::De]
        );
        let de = &records[2];
        assert_eq!(de.id.as_str(), "flammenzahn");
        assert_eq!(de.description, "Ein Großschwert.");
        assert_eq!(de.details.kind, "great-sword");
        assert_eq!(de.details.rarity, 6);
        assert_eq!(de.details.attack, 180);
        assert_eq!(de.details.affinity, -10);
        assert_eq!(
            de.details.element,
            Some(Element {
                kind: "fire".to_owned(),
                value: 300
            })
        );
        assert_eq!(de.details.slots, [3, 1, 0]);
        assert_eq!(de.details.skills[0].name, "Angriffsbonus");
        assert_eq!(de.details.skills[0].skill.as_str(), "attack-boost");
        let ja = &records[0];
        assert_eq!(ja.description, "");
        assert!(ja.details.skills.is_empty());
    }

    #[test]
    fn test_defaults_when_anchors_are_missing() {
        let (normalizer, offsets): (Normalizer, OffsetTable) = Default::default();
        let records = parse(
            r#"{"name":{"en":"Bone Axe"}}"#,
            &"bone-axe".into(),
            ParseContext {
                normalizer: &normalizer,
                offsets: &offsets,
            },
        )
        .unwrap();
        let details = &records[0].details;
        assert_eq!(details.attack, 0);
        assert_eq!(details.element, None);
        assert!(details.slots.is_empty());
        assert_eq!(details.kind, "");
    }
}
