/// Phrases that mark a general-news item as energy coverage.
const ENERGY_KEYWORDS: &[&str] = &[
    "wind farm",
    "wind energy",
    "wind power",
    "wind turbine",
    "offshore wind",
    "onshore wind",
    "renewable energy",
    "solar farm",
    "solar power",
    "solar energy",
    "green energy",
    "clean energy",
    "energy project",
    "grid connection",
    "battery storage",
    "green hydrogen",
];

/// Only applied to general-news local outlets; search feeds are already on topic.
pub fn is_energy_relevant(text: &str) -> bool {
    let lower = text.to_lowercase();
    ENERGY_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
