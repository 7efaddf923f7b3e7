//! Demo transformation chips derived from a character's race.

use crate::records::{Character, CharacterWithTransformations, Transformation};

/// Chip names per race; unknown races get a single generic chip.
pub fn chip_names(race: &str) -> &'static [&'static str] {
    match race {
        "Saiyan" => &["Super Saiyan", "Super Saiyan 2", "Super Saiyan 3"],
        "Frieza Race" => &["Final Form", "Golden Form"],
        "Namekian" => &["Potential Unleashed"],
        "Android" => &["Overclock"],
        "Majin" => &["Absorbed Form"],
        "God" => &["Hakai Surge"],
        _ => &["Forma Potenciada"],
    }
}

/// Chips for one character. Chip ids are the character id with the 1-based chip
/// index appended as a decimal digit (id 1 → 11, 12, 13).
pub fn demo_transformations(character: &Character) -> Vec<Transformation> {
    chip_names(&character.race)
        .iter()
        .enumerate()
        .map(|(i, name)| Transformation {
            id: character
                .id
                .saturating_mul(10)
                .saturating_add(i as u64 + 1),
            name: (*name).to_string(),
        })
        .collect()
}

pub fn decorate(character: &Character) -> CharacterWithTransformations {
    CharacterWithTransformations {
        id: character.id,
        name: character.name.clone(),
        race: character.race.clone(),
        gender: character.gender.clone(),
        image: character.image.clone(),
        transformations: demo_transformations(character),
    }
}

pub fn decorate_all(characters: &[Character]) -> Vec<CharacterWithTransformations> {
    characters.iter().map(decorate).collect()
}
