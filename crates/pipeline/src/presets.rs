//! Built-in rule sets for the studio pages.
//!
//! Every preset ends with a catch-all so no fetched title goes unshown.
//! Order matters: title and rating rules come before broad genre rules,
//! which come before the recency rule.

use crate::classifier::{Predicate, Rule, RuleSet};
use crate::ordering::SortKey;

/// Names accepted by [`preset`].
pub const PRESET_NAMES: &[&str] = &["ghibli", "madhouse", "mappa", "bones"];

/// Look up a studio preset by name (case-insensitive).
pub fn preset(name: &str) -> Option<RuleSet> {
    let rules = match name.trim().to_lowercase().as_str() {
        "ghibli" => ghibli(),
        "madhouse" => madhouse(),
        "mappa" => mappa(),
        "bones" => bones(),
        _ => return None,
    };
    Some(RuleSet { rules })
}

fn genres(names: &[&str]) -> Predicate {
    Predicate::AnyGenre(names.iter().map(|s| s.to_string()).collect())
}

fn titles(names: &[&str]) -> Predicate {
    Predicate::TitleIn(names.iter().map(|s| s.to_string()).collect())
}

fn ghibli() -> Vec<Rule> {
    vec![
        Rule::new(
            "Miyazaki Classics",
            titles(&[
                "Spirited Away",
                "My Neighbor Totoro",
                "Princess Mononoke",
                "Nausicaä of the Valley of the Wind",
                "Castle in the Sky",
            ]),
            8,
        )
        .with_sort_key(SortKey::YearDesc),
        Rule::new("Timeless Masterpieces", Predicate::MinRating(8.5), 8),
        Rule::new("Family Adventures", genres(&["Adventure", "Family", "Fantasy"]), 10),
        Rule::new("Quiet Dramas", genres(&["Drama", "Romance", "Slice of Life"]), 10),
        Rule::new("Recent Releases", Predicate::MinYear(2010), 8)
            .with_sort_key(SortKey::YearDesc),
        Rule::new("More from Ghibli", Predicate::Always, 12),
    ]
}

fn madhouse() -> Vec<Rule> {
    vec![
        Rule::new("Legendary", Predicate::MinRating(8.5), 8),
        Rule::new(
            "Mind Benders",
            genres(&["Psychological", "Thriller", "Mystery"]),
            10,
        ),
        Rule::new("Action & Adventure", genres(&["Action", "Adventure"]), 10),
        Rule::new("Recent Releases", Predicate::MinYear(2018), 8)
            .with_sort_key(SortKey::YearDesc),
        Rule::new("More from Madhouse", Predicate::Always, 12),
    ]
}

fn mappa() -> Vec<Rule> {
    vec![
        Rule::new("Fan Favorites", Predicate::MinRating(8.5), 8),
        Rule::new(
            "Dark Action",
            Predicate::All(vec![
                genres(&["Action"]),
                Predicate::Any(vec![
                    genres(&["Horror", "Dark Fantasy", "Seinen"]),
                    Predicate::HasEmotionalTag("dark".to_string()),
                ]),
            ]),
            10,
        ),
        Rule::new("Action", genres(&["Action"]), 10),
        Rule::new("Sports & Drama", genres(&["Sports", "Drama"]), 10),
        Rule::new("New Seasons", Predicate::MinYear(2022), 8).with_sort_key(SortKey::YearDesc),
        Rule::new("More from MAPPA", Predicate::Always, 12),
    ]
}

fn bones() -> Vec<Rule> {
    vec![
        Rule::new("Top Rated", Predicate::MinRating(8.5), 8),
        Rule::new(
            "Mecha & Sci-Fi",
            Predicate::Any(vec![
                genres(&["Mecha", "Sci-Fi"]),
                Predicate::HasTheme("Mecha".to_string()),
            ]),
            10,
        ),
        Rule::new("Action", genres(&["Action", "Adventure"]), 10),
        Rule::new("Recent Releases", Predicate::MinYear(2019), 8)
            .with_sort_key(SortKey::YearDesc),
        Rule::new("More from Bones", Predicate::Always, 12),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use catalog::RecommendationRecord;

    #[test]
    fn test_all_presets_are_valid_with_catch_all() {
        for name in PRESET_NAMES {
            let rules = preset(name).unwrap();
            let validated = RuleSet::new(rules.rules().to_vec()).unwrap();
            assert!(validated.has_catch_all(), "{} has no catch-all", name);
        }
    }

    #[test]
    fn test_unknown_preset() {
        assert!(preset("trigger").is_none());
        assert!(preset(" GHIBLI ").is_some());
    }

    #[test]
    fn test_ghibli_title_rule_beats_rating_rule() {
        let records = vec![
            RecommendationRecord::new("Spirited Away").with_rating(8.6).with_year(2001),
            RecommendationRecord::new("Grave of the Fireflies").with_rating(8.5),
            RecommendationRecord::new("The Wind Rises").with_genres(["Drama"]).with_rating(7.6),
            RecommendationRecord::new("Earwig and the Witch").with_rating(5.4),
        ];

        let result = classify(&records, &preset("ghibli").unwrap());

        assert_eq!(result.bucket("Miyazaki Classics").unwrap().members.len(), 1);
        assert_eq!(
            result.bucket("Timeless Masterpieces").unwrap().members[0].title,
            "Grave of the Fireflies"
        );
        assert_eq!(
            result.bucket("Quiet Dramas").unwrap().members[0].title,
            "The Wind Rises"
        );
        assert_eq!(result.bucket("More from Ghibli").unwrap().members.len(), 1);
        assert_eq!(result.unmatched, 0);
    }
}
