//! Pattern-based pest and disease extraction from free text.
//!
//! # Responsibility
//! - Pull pest and disease mentions out of scraped guide text using a
//!   fixed, ordered vocabulary of case-insensitive patterns.
//! - Normalize extracted entity names before they become distinct rows.
//!
//! # Invariants
//! - Extraction is pure and stateless; empty input yields an empty set.
//! - Output names are title-cased and deduplicated.
//!
//! This is a best-effort classifier. Generic words caught by a suffix
//! pattern (false positives) and unlisted pests (false negatives) are
//! accepted and not corrected downstream.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static PEST_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:[a-z]+ )?(?:aphids?|beetles?|borers?|bugs?|caterpillars?|cutworms?|flea beetles?|hornworms?|leaf ?miners?|maggots?|mites?|moths?|slugs?|snails?|thrips?|weevils?|whiteflies?|wireworms?)",
        r"(?i)[a-z]+ (?:aphid|beetle|borer|bug|caterpillar|fly|maggot|mite|moth|worm)",
        r"(?i)Colorado potato beetle|Mexican bean beetle|Japanese beetle",
        r"(?i)cabbage (?:looper|maggot|worm)",
        r"(?i)tomato (?:fruitworm|hornworm)",
        r"(?i)corn (?:earworm|borer)",
        r"(?i)squash (?:bug|vine borer)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid pest pattern"))
    .collect()
});

static DISEASE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:[a-z]+ )?(?:blight|wilt|rot|mildew|rust|scab|mosaic)",
        r"(?i)early blight|late blight",
        r"(?i)powdery mildew|downy mildew",
        r"(?i)fusarium wilt|verticillium wilt",
        r"(?i)root rot|crown rot|blossom end rot",
        r"(?i)black spot|leaf spot|brown spot",
        r"(?i)bacterial (?:wilt|spot|canker)",
        r"(?i)mosaic virus|yellow virus",
        r"(?i)clubroot|damping off",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid disease pattern"))
    .collect()
});

// Leading noise words picked up by the broad patterns above; stripped
// before an extracted phrase is treated as a distinct entity.
static LEADING_NOISE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:And|For|More|Remove|Prevention|Watering|Overharvesting|Nearby|Releasing|Vigor|Debris|Vines|Winds|Will|With)\s+",
    )
    .expect("valid noise prefix pattern")
});

static SUFFIX_SPACING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(Insect|Wilt|Spot|Rot|Rust|Mildew)$").expect("valid suffix pattern")
});

/// Extracts pest mentions from free text as a deduplicated ordered set.
pub fn extract_pests(text: &str) -> BTreeSet<String> {
    extract_with_patterns(text, &PEST_PATTERNS)
}

/// Extracts disease mentions from free text as a deduplicated ordered set.
pub fn extract_diseases(text: &str) -> BTreeSet<String> {
    extract_with_patterns(text, &DISEASE_PATTERNS)
}

/// Normalizes an extracted entity name so superficially different
/// phrases collapse to one entity: drops one leading noise word and
/// collapses spacing before a trailing category suffix.
pub fn normalize_entity_name(name: &str) -> String {
    let stripped = LEADING_NOISE_RE.replace(name.trim(), "");
    SUFFIX_SPACING_RE.replace(&stripped, " $1").to_string()
}

fn extract_with_patterns(text: &str, patterns: &[Regex]) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    if text.trim().is_empty() {
        return found;
    }

    for pattern in patterns {
        for matched in pattern.find_iter(text) {
            let name = title_case(matched.as_str().trim());
            if !name.is_empty() {
                found.insert(name);
            }
        }
    }

    found
}

fn title_case(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{extract_diseases, extract_pests, normalize_entity_name};

    #[test]
    fn empty_input_yields_empty_sets() {
        assert!(extract_pests("").is_empty());
        assert!(extract_diseases("   ").is_empty());
    }

    #[test]
    fn named_pests_are_extracted_and_title_cased() {
        let text = "Watch for COLORADO POTATO BEETLE and aphids on young leaves.";
        let pests = extract_pests(text);
        assert!(pests.contains("Colorado Potato Beetle"));
        assert!(pests.iter().any(|name| name.ends_with("Aphids")));
    }

    #[test]
    fn disease_suffix_patterns_match_compound_names() {
        let diseases = extract_diseases("Early blight and powdery mildew spread in wet weather.");
        assert!(diseases.contains("Early Blight"));
        assert!(diseases.contains("Powdery Mildew"));
    }

    #[test]
    fn extraction_deduplicates_repeated_mentions() {
        let pests = extract_pests("slugs, slugs and more slugs");
        let slug_mentions = pests
            .iter()
            .filter(|name| name.as_str() == "Slugs")
            .count();
        assert_eq!(slug_mentions, 1);
    }

    #[test]
    fn normalization_strips_leading_noise_word() {
        assert_eq!(normalize_entity_name("Prevention Aphids"), "Aphids");
        assert_eq!(
            normalize_entity_name("Fusarium   Wilt"),
            "Fusarium Wilt"
        );
        assert_eq!(normalize_entity_name("Cabbage Looper"), "Cabbage Looper");
    }
}
