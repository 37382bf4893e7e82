use itertools::Itertools;
use mhdata_scraping_utils::regex;
use strum::IntoEnumIterator;

use crate::schema::{ArmorDetails, ArmorPiece, ArmorSlot, Record, Resistances, TargetId};

use super::{first_capture, int_or_zero, skill_ref, text_in, Page, ParseContext, ParseError};

/// Pages describe a whole series: the series name comes first, then one
/// `name` block, stat row and tagged skill rows per piece, located through
/// [`super::ArmorOffsets`].
pub fn parse(
    text: &str,
    target: &TargetId,
    context: ParseContext,
) -> Result<Vec<Record<ArmorDetails>>, ParseError> {
    let page = Page::new(text);
    let offsets = context.offsets;
    let name = page.nth_block("name", offsets.name);
    let level_rows = page.level_rows();
    let description = page.description(&level_rows);
    let (id, languages) = page.identify(name, target, context.normalizer)?;

    let rarity = first_capture(regex!(r#""rarity":([^,{}\[\]]*)"#), text)
        .map_or(0, int_or_zero);
    let stats = stat_rows(text);
    let skill_rows = page.skill_rows();

    Ok(languages
        .into_iter()
        .map(|language| {
            let pieces = ArmorSlot::iter()
                .map(|slot| {
                    let piece = offsets.armor.get(slot);
                    let (defense, resistances) =
                        stats.get(piece.stats).copied().unwrap_or_default();
                    ArmorPiece {
                        slot,
                        name: text_in(page.nth_block("name", offsets.name + piece.name), language),
                        defense,
                        resistances,
                        skills: skill_rows
                            .iter()
                            .filter(|row| row.piece == Some(piece.piece))
                            .filter_map(|row| skill_ref(row, language, context.normalizer))
                            .collect(),
                    }
                })
                .collect();
            Record {
                id: id.clone(),
                language,
                name: text_in(name, language),
                description: text_in(description, language),
                details: ArmorDetails { rarity, pieces },
            }
        })
        .collect())
}

/// Stat rows in document order: `{"defense":d,"fire":f,"water":w,"thunder":t,"ice":i,"dragon":g}`.
fn stat_rows(text: &str) -> Vec<(u32, Resistances)> {
    regex!(concat!(
        r#"\{"defense":([^,{}\[\]]*),"fire":([^,{}\[\]]*),"water":([^,{}\[\]]*),"#,
        r#""thunder":([^,{}\[\]]*),"ice":([^,{}\[\]]*),"dragon":([^,{}\[\]]*)\}"#
    ))
    .captures_iter(text)
    .map(|c| {
        (
            int_or_zero(&c[1]),
            Resistances {
                fire: int_or_zero(&c[2]),
                water: int_or_zero(&c[3]),
                thunder: int_or_zero(&c[4]),
                ice: int_or_zero(&c[5]),
                dragon: int_or_zero(&c[6]),
            },
        )
    })
    .collect_vec()
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::{
        normalizer::Normalizer,
        parser::{ArmorOffsets, OffsetTable, ParseContext, PieceOffsets},
        schema::{ArmorSlot, Language, Resistances},
    };

    const SERIES: &str = concat!(
        r#"{"series":{"name":{"en":"Rathalos α","fr":"Rathalos α"},"rarity":6,"#,
        r#""description":{"en":"Armor made from Rathalos.","fr":"Armure de Rathalos."},"pieces":["#,
        r#"{"name":{"en":"Rathalos Helm α","fr":"Casque Rathalos α"},"stats":{"defense":56,"fire":3,"water":-2,"thunder":1,"ice":0,"dragon":-3}},"#,
        r#"{"name":{"en":"Rathalos Mail α","fr":"Cotte Rathalos α"},"stats":{"defense":"5x","fire":3,"water":-2,"thunder":1,"ice":0,"dragon":-3}},"#,
        r#"{"name":{"en":"Rathalos Braces α"},"stats":{"defense":56,"fire":3,"water":-2,"thunder":1,"ice":0,"dragon":-3}}"#,
        r#"],"skills":[{"piece":1,"skill":{"en":"Weakness Exploit","fr":"Point faible"},"level":1},"#,
        r#"{"piece":3,"skill":{"en":"Attack Boost","fr":"Augmentation d'attaque"},"level":2}]}}"#
    );

    #[test]
    fn test_series() {
        let normalizer = Normalizer::with_transliterations(vec![("α".to_owned(), "a".to_owned())]);
        let offsets = OffsetTable::default();
        let records = parse(
            SERIES,
            &"rathalos-a".into(),
            ParseContext {
                normalizer: &normalizer,
                offsets: &offsets,
            },
        )
        .unwrap();
        assert_eq!(records.len(), 2);

        let en = records.iter().find(|r| r.language == Language::En).unwrap();
        assert_eq!(en.id.as_str(), "rathalos-a");
        assert_eq!(en.details.rarity, 6);
        assert_eq!(en.description, "Armor made from Rathalos.");
        let pieces = &en.details.pieces;
        assert_eq!(pieces.len(), 5);
        assert_eq!(pieces[0].slot, ArmorSlot::Head);
        assert_eq!(pieces[0].name, "Rathalos Helm α");
        assert_eq!(pieces[0].defense, 56);
        assert_eq!(
            pieces[0].resistances,
            Resistances {
                fire: 3,
                water: -2,
                thunder: 1,
                ice: 0,
                dragon: -3
            }
        );
        assert_eq!(pieces[0].skills[0].skill.as_str(), "weakness-exploit");
        // Malformed defense token.
        assert_eq!(pieces[1].defense, 0);
        assert_eq!(pieces[1].resistances.fire, 3);
        assert_eq!(pieces[2].skills[0].level, 2);
        // Waist and legs blocks are missing.
        assert_eq!(pieces[3].name, "");
        assert_eq!(pieces[4].defense, 0);
        assert!(pieces[4].skills.is_empty());

        let fr = records.iter().find(|r| r.language == Language::Fr).unwrap();
        assert_eq!(fr.details.pieces[0].name, "Casque Rathalos α");
        assert_eq!(fr.details.pieces[2].name, "");
        assert_eq!(fr.details.pieces[2].skills[0].name, "Augmentation d'attaque");
        assert_eq!(fr.details.pieces[2].skills[0].skill.as_str(), "attack-boost");
    }

    #[test]
    fn test_extra_name_block_only_moves_names() {
        let normalizer = Normalizer::default();
        // Upstream inserted an extra `name` block between the series and the pieces.
        // Stat rows and skill tags are untouched by it.
        let shifted = |n: usize| PieceOffsets {
            name: n + 1,
            stats: n - 1,
            piece: n,
        };
        let offsets = OffsetTable {
            name: 0,
            armor: ArmorOffsets {
                head: shifted(1),
                chest: shifted(2),
                arms: shifted(3),
                waist: shifted(4),
                legs: shifted(5),
            },
        };
        let text = concat!(
            r#"{"name":{"en":"Hope"},"bonus":{"name":{"en":"Set bonus"}},"pieces":["#,
            r#"{"name":{"en":"Hope Mask"},"stats":{"defense":10,"fire":1,"water":0,"thunder":0,"ice":0,"dragon":0}},"#,
            r#"{"name":{"en":"Hope Mail"},"stats":{"defense":20,"fire":2,"water":0,"thunder":0,"ice":0,"dragon":0}}],"#,
            r#""skills":[{"piece":2,"skill":{"en":"Guard"},"level":1}]}"#
        );
        let records = parse(
            text,
            &"hope".into(),
            ParseContext {
                normalizer: &normalizer,
                offsets: &offsets,
            },
        )
        .unwrap();
        let pieces = &records[0].details.pieces;
        assert_eq!(records[0].name, "Hope");
        assert_eq!((pieces[0].name.as_str(), pieces[0].defense), ("Hope Mask", 10));
        assert_eq!(pieces[0].resistances.fire, 1);
        assert!(pieces[0].skills.is_empty());
        assert_eq!((pieces[1].name.as_str(), pieces[1].defense), ("Hope Mail", 20));
        assert_eq!(pieces[1].skills[0].skill.as_str(), "guard");
        assert_eq!((pieces[2].name.as_str(), pieces[2].defense), ("", 0));
    }

    #[test]
    fn test_offsets_from_toml() {
        let offsets: OffsetTable = toml::from_str(
            "[armor.head]\nname = 2\nstats = 0\npiece = 1\n",
        )
        .unwrap();
        assert_eq!(
            offsets.armor.head,
            PieceOffsets {
                name: 2,
                stats: 0,
                piece: 1
            }
        );
        assert_eq!(offsets.armor.legs, ArmorOffsets::default().legs);
        assert_eq!(offsets.armor.legs.stats, 4);
    }
}
