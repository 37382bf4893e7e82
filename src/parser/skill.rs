use crate::schema::{Record, SkillDetails, TargetId};

use super::{text_in, Page, ParseContext, ParseError};

pub fn parse(
    text: &str,
    target: &TargetId,
    context: ParseContext,
) -> Result<Vec<Record<SkillDetails>>, ParseError> {
    let page = Page::new(text);
    let name = page.nth_block("name", context.offsets.name);
    let level_rows = page.level_rows();
    let description = page.description(&level_rows);
    let (id, languages) = page.identify(name, target, context.normalizer)?;

    Ok(languages
        .into_iter()
        .map(|language| Record {
            id: id.clone(),
            language,
            name: text_in(name, language),
            description: text_in(description, language),
            details: SkillDetails {
                levels: level_rows
                    .iter()
                    .filter_map(|row| Some((row.level, row.block.get(language)?.to_owned())))
                    .collect(),
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::parse;
    use crate::{
        extractor::extract,
        normalizer::Normalizer,
        parser::{OffsetTable, ParseContext, ParseError},
        schema::Language,
    };

    fn context<'a>(normalizer: &'a Normalizer, offsets: &'a OffsetTable) -> ParseContext<'a> {
        ParseContext {
            normalizer,
            offsets,
        }
    }

    #[test]
    fn test_two_fragments_one_translation_block() {
        let html = concat!(
            "<html><body>",
            r#"<script>self.__next_f.push([1,"5:[\"$\",\"div\",null,{\"name\":{\"en\":\"Attack Boost\","])</script>"#,
            r#"<script>self.__next_f.push([1,"\"fr\":\"Augmentation d'attaque\"}}]\n"])</script>"#,
            "</body></html>",
        );
        let payload = extract(html).unwrap();
        let (normalizer, offsets) = Default::default();
        let records = parse(
            &payload.text(),
            &"attack-boost".into(),
            context(&normalizer, &offsets),
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.id.as_str(), "attack-boost");
        }
        let name = |language| {
            records
                .iter()
                .find(|r| r.language == language)
                .map(|r| r.name.as_str())
        };
        assert_eq!(name(Language::En), Some("Attack Boost"));
        assert_eq!(name(Language::Fr), Some("Augmentation d'attaque"));
    }

    #[test]
    fn test_missing_description_keeps_levels() {
        let text = concat!(
            r#"{"skill":{"name":{"en":"Guard","ja":"ガード"},"levels":["#,
            r#"{"level":1,"description":{"en":"Reduces knockback.","ja":"ノックバック軽減"}},"#,
            r#"{"level":2,"description":{"en":"Reduces knockback further.","ja":"さらに軽減"}},"#,
            r#"{"level":3,"description":{"en":"Negates knockback."}}]}}"#
        );
        let (normalizer, offsets) = Default::default();
        let records = parse(text, &"guard".into(), context(&normalizer, &offsets)).unwrap();
        let en = records.iter().find(|r| r.language == Language::En).unwrap();
        assert_eq!(en.description, "");
        assert_eq!(
            en.details.levels,
            BTreeMap::from([
                (1, "Reduces knockback.".to_owned()),
                (2, "Reduces knockback further.".to_owned()),
                (3, "Negates knockback.".to_owned()),
            ])
        );
        let ja = records.iter().find(|r| r.language == Language::Ja).unwrap();
        assert_eq!(ja.id.as_str(), "guard");
        assert_eq!(ja.details.levels.len(), 2);
    }

    #[test]
    fn test_slug_fallback_and_no_records() {
        let (normalizer, offsets) = Default::default();
        let context = context(&normalizer, &offsets);

        let records = parse(
            r#"{"name":{"fr":"Garde"},"description":{"fr":"Réduit le recul."}}"#,
            &"Guard".into(),
            context,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_str(), "guard");
        assert_eq!(records[0].description, "Réduit le recul.");

        assert!(matches!(
            parse(r#"{"name":"plain"}"#, &"guard".into(), context),
            Err(ParseError::NoRecords(_))
        ));
        assert!(matches!(
            parse(r#"{"name":{"ja":"ガード"}}"#, &"!!!".into(), context),
            Err(ParseError::NoCanonicalId(_))
        ));
    }
}
