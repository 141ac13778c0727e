//! Keyword heuristics that place an article on the map and in a category.
//!
//! All matching is plain substring search over lower-cased text, so
//! "clare" also hits "declared". That is accepted: the lists are ordered
//! and the first province with a hit wins.

use std::collections::BTreeSet;

use crate::types::{Category, Province, Tag};

const MUNSTER: &[&str] = &[
    "munster", "clare", "cork", "kerry", "limerick", "tipperary", "waterford", "ennis", "shannon",
    "tralee", "killarney", "clonmel", "thurles", "nenagh", "cahir", "dungarvan", "lismore",
];

const LEINSTER: &[&str] = &[
    "leinster", "dublin", "wicklow", "wexford", "carlow", "kildare", "meath", "louth", "westmeath",
    "offaly", "laois", "longford", "kilkenny", "arklow", "bray", "drogheda", "dundalk", "naas",
    "newbridge", "navan", "trim", "athlone", "mullingar", "tullamore", "portlaoise",
];

const CONNACHT: &[&str] = &[
    "connacht", "connaught", "galway", "mayo", "roscommon", "sligo", "leitrim", "castlebar",
    "ballina", "westport", "tuam", "ballinasloe", "athenry",
];

const ULSTER: &[&str] = &[
    "ulster", "donegal", "cavan", "monaghan", "letterkenny", "buncrana", "bundoran", "ballyshannon",
];

const PROVINCE_RULES: [(Province, &[&str]); 4] = [
    (Province::Munster, MUNSTER),
    (Province::Leinster, LEINSTER),
    (Province::Connacht, CONNACHT),
    (Province::Ulster, ULSTER),
];

const PLANNING: &[&str] = &["planning", "approval", "permission"];
const CONSTRUCTION: &[&str] = &["construction", "building", "developing"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub fn classify_province(text: &str) -> Province {
    let lower = text.to_lowercase();
    PROVINCE_RULES
        .iter()
        .find(|(_, places)| contains_any(&lower, places))
        .map(|(province, _)| *province)
        .unwrap_or(Province::National)
}

/// Falls back to onshore when neither word appears.
pub fn classify_category(text: &str) -> Category {
    let lower = text.to_lowercase();
    if lower.contains("offshore") {
        Category::Offshore
    } else {
        Category::Onshore
    }
}

/// Never returns an empty set: untagged text gets its category as the only tag.
pub fn classify_tags(text: &str) -> BTreeSet<Tag> {
    let lower = text.to_lowercase();
    let mut tags = BTreeSet::new();

    if lower.contains("offshore") {
        tags.insert(Tag::Offshore);
    }
    if lower.contains("onshore") {
        tags.insert(Tag::Onshore);
    }
    if contains_any(&lower, PLANNING) {
        tags.insert(Tag::Planning);
    }
    if contains_any(&lower, CONSTRUCTION) {
        tags.insert(Tag::Construction);
    }

    if tags.is_empty() {
        tags.insert(classify_category(&lower).as_tag());
    }
    tags
}
