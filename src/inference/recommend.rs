//! Care tips derived from leaf analysis results.
//!
//! Each rule fires when some result's readable label contains one of the
//! rule's phrases (whole words, case-insensitive) at or above the caller's
//! confidence threshold. A confident healthy result adds a low-priority tip
//! of its own.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::inference::analyzer::LeafResult;
use crate::inference::labels::LeafCategory;

/// Confidence a healthy result needs before the healthy tip is shown.
pub const HEALTHY_CONFIDENCE: f32 = 0.6;

/// Urgency of a recommendation. Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A user-facing care tip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

impl Recommendation {
    fn new(title: &str, message: &str, priority: Priority) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            priority,
        }
    }
}

struct Rule {
    phrases: &'static [&'static str],
    title: &'static str,
    message: &'static str,
    priority: Priority,
}

const HEALTHY_TITLE: &str = "Plant looks healthy";
const HEALTHY_MESSAGE: &str = "The plant looks healthy overall. Keep the current care routine.";

const RULES: &[Rule] = &[
    Rule {
        phrases: &["nitrogen", "n deficiency"],
        title: "Optimize nitrogen",
        message: "Mild nitrogen deficiency detected. Check the feeding schedule and consider \
                  a moderate nitrogen dose.",
        priority: Priority::Medium,
    },
    Rule {
        phrases: &["overwatering", "overwater"],
        title: "Adjust watering",
        message: "Signs of overwatering. Let the substrate dry out more before the next watering.",
        priority: Priority::High,
    },
    Rule {
        phrases: &["pest", "pests"],
        title: "Check for pests",
        message: "Possible pest risk. Inspect leaf undersides and stems.",
        priority: Priority::High,
    },
    Rule {
        phrases: &["ph"],
        title: "Check pH",
        message: "Possible pH imbalance. Measure runoff or substrate and adjust if needed.",
        priority: Priority::Medium,
    },
    Rule {
        phrases: &["spot", "spots"],
        title: "Monitor leaf spots",
        message: "Leaf spots detected. Watch whether they spread and remove badly affected leaves.",
        priority: Priority::Medium,
    },
];

/// Lowercase alphanumeric words of `text`.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether the words of `phrase` appear consecutively in `label_words`.
fn contains_phrase(label_words: &[String], phrase: &str) -> bool {
    let needle = words(phrase);
    if needle.is_empty() || needle.len() > label_words.len() {
        return false;
    }
    label_words.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// Generate tips for `results`, most urgent first.
///
/// Tips sharing a title are merged, keeping the highest priority. Tips of
/// equal priority keep rule order.
pub fn generate(results: &[LeafResult], threshold: f32) -> Vec<Recommendation> {
    if results.is_empty() {
        return Vec::new();
    }

    let mut recommendations = Vec::new();

    let healthy = results.iter().find(|r| r.category == LeafCategory::Health);
    if healthy.is_some_and(|r| r.confidence >= HEALTHY_CONFIDENCE) {
        recommendations.push(Recommendation::new(
            HEALTHY_TITLE,
            HEALTHY_MESSAGE,
            Priority::Low,
        ));
    }

    let labelled: Vec<(Vec<String>, f32)> = results
        .iter()
        .map(|r| (words(&r.label), r.confidence))
        .collect();
    for rule in RULES {
        let fired = labelled.iter().any(|(label_words, confidence)| {
            *confidence >= threshold
                && rule.phrases.iter().any(|p| contains_phrase(label_words, p))
        });
        if fired {
            recommendations.push(Recommendation::new(rule.title, rule.message, rule.priority));
        }
    }

    let mut merged: Vec<Recommendation> = Vec::with_capacity(recommendations.len());
    for rec in recommendations {
        match merged.iter_mut().find(|m| m.title == rec.title) {
            Some(existing) if rec.priority > existing.priority => *existing = rec,
            Some(_) => {}
            None => merged.push(rec),
        }
    }
    merged.sort_by(|a, b| b.priority.cmp(&a.priority));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::labels::{category_of, readable_label};

    fn result(raw: &str, confidence: f32) -> LeafResult {
        LeafResult {
            label: readable_label(raw),
            raw_label: raw.to_string(),
            confidence,
            category: category_of(raw),
        }
    }

    fn titles(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_no_results_no_tips() {
        assert!(generate(&[], 0.3).is_empty());
    }

    #[test]
    fn test_confident_healthy_gets_low_tip() {
        let recs = generate(&[result("HEALTHY", 0.82), result("HEAT_STRESS", 0.1)], 0.3);
        assert_eq!(titles(&recs), vec!["Plant looks healthy"]);
        assert_eq!(recs[0].priority, Priority::Low);

        let unsure = generate(&[result("HEALTHY", 0.55)], 0.3);
        assert!(unsure.is_empty());
    }

    #[test]
    fn test_rules_sorted_by_priority() {
        let results = [
            result("NUTRIENT_DEF_N", 0.5),
            result("pests_risk", 0.4),
            result("ph_imbalance", 0.35),
            result("HEALTHY", 0.1),
        ];
        let recs = generate(&results, 0.3);
        assert_eq!(
            titles(&recs),
            vec!["Check for pests", "Optimize nitrogen", "Check pH"]
        );
        assert_eq!(recs[0].priority, Priority::High);
    }

    #[test]
    fn test_threshold_filters_weak_results() {
        let results = [result("overwatering", 0.25), result("leaf_spot", 0.4)];
        let recs = generate(&results, 0.3);
        assert_eq!(titles(&recs), vec!["Monitor leaf spots"]);
    }

    #[test]
    fn test_phrases_match_whole_words() {
        // "iron deficiency" must not read as an N deficiency, nor
        // "phosphorus" as pH.
        let results = [
            result("iron_deficiency", 0.9),
            result("phosphorus_excess", 0.9),
        ];
        assert!(generate(&results, 0.3).is_empty());

        let spots = generate(&[result("FUNGAL_SPOTS_GENERIC", 0.7)], 0.3);
        assert_eq!(titles(&spots), vec!["Monitor leaf spots"]);
    }

    #[test]
    fn test_duplicate_titles_merged() {
        let results = [result("pests_risk", 0.6), result("LEAF_PEST_INDICATOR", 0.7)];
        let recs = generate(&results, 0.3);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Check for pests");
    }

    #[test]
    fn test_priority_order_and_serde() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        assert_eq!(Priority::Low.to_string(), "low");
    }
}
