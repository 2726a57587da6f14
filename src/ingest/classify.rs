use regex::Regex;

const STRUCTURAL_LABELS: &str = r"^(chapter|section|figure|table|note|reference)";

const DEFAULT_RULES: &[(&str, &str)] = &[
    ("connective", r"\b(but|however|therefore|thus|hence|because)\b"),
    ("cognition", r"\b(discover|reveal|find|realize|understand|know)\b"),
    ("intensity", r"\b(important|significant|crucial|essential|key|vital)\b"),
    ("exclamation_or_question", r"[?!]$"),
    ("embedded_quote", r#""[^"]+""#),
    ("personal_pronoun", r"\b(I|we|you)\b"),
    ("absolute_modal", r"\b(never|always|must|should)\b"),
    ("comparison", r"\b(like|as if|seems)\b"),
];

/// One independent signal that a sentence is worth quoting.
#[derive(Debug, Clone)]
pub struct HeuristicRule {
    pub name: &'static str,
    pattern: Regex,
}

impl HeuristicRule {
    /// Patterns are matched case-insensitively.
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(&format!("(?i){pattern}"))?,
        })
    }

    pub fn matches(&self, sentence: &str) -> bool {
        self.pattern.is_match(sentence)
    }
}

#[derive(Debug, Clone)]
pub struct QuoteClassifier {
    min_len: usize,
    max_len: usize,
    structural: Option<Regex>,
    rules: Vec<HeuristicRule>,
}

impl QuoteClassifier {
    pub fn new(min_len: usize, max_len: usize) -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .filter_map(|&(name, pattern)| match HeuristicRule::new(name, pattern) {
                Ok(rule) => Some(rule),
                Err(err) => {
                    tracing::warn!("skipping quote rule {}: {}", name, err);
                    None
                }
            })
            .collect();

        Self {
            min_len,
            max_len,
            structural: Regex::new(STRUCTURAL_LABELS).ok(),
            rules,
        }
    }

    pub fn with_rule(mut self, rule: HeuristicRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[HeuristicRule] {
        &self.rules
    }

    pub fn is_interesting(&self, sentence: &str) -> bool {
        if !self.within_length(sentence) || self.is_structural_label(sentence) {
            return false;
        }
        self.rules.iter().any(|rule| rule.matches(sentence))
    }

    /// Names of the rules that fire for `sentence`, ignoring length and label filters.
    pub fn matching_rules(&self, sentence: &str) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(sentence))
            .map(|rule| rule.name)
            .collect()
    }

    fn within_length(&self, sentence: &str) -> bool {
        let len = sentence.chars().count();
        len >= self.min_len && len <= self.max_len
    }

    fn is_structural_label(&self, sentence: &str) -> bool {
        let lowered = sentence.to_lowercase();
        self.structural
            .as_ref()
            .map(|re| re.is_match(&lowered))
            .unwrap_or(false)
    }
}

impl Default for QuoteClassifier {
    fn default() -> Self {
        Self::new(50, 280)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(sentence: &str) -> String {
        // Neutral filler that triggers no rule, used to reach the minimum length.
        format!("{sentence} The old barn stood at the edge of the field")
    }

    #[test]
    fn accepts_contrastive_sentence() {
        let classifier = QuoteClassifier::default();
        let sentence =
            "However, she never realized the truth until it was too late, and it changed everything.";
        assert!(classifier.is_interesting(sentence));
        assert_eq!(
            classifier.matching_rules(sentence),
            vec!["connective", "absolute_modal"]
        );
    }

    #[test]
    fn rejects_outside_length_bounds() {
        let classifier = QuoteClassifier::default();
        let short = "But you must know this!";
        assert!(short.chars().count() < 50);
        assert!(!classifier.is_interesting(short));

        let long = format!("However {}", "you must realize this ".repeat(20));
        assert!(long.chars().count() > 280);
        assert!(!classifier.is_interesting(&long));
    }

    #[test]
    fn length_bounds_are_inclusive() {
        let classifier = QuoteClassifier::new(10, 20);
        assert!(classifier.is_interesting("but abcdefg"));
        assert_eq!("but abcdefg".chars().count(), 11);
        assert!(classifier.is_interesting("but abcdef"));
        assert!(!classifier.is_interesting("but abcde"));
        assert!(classifier.is_interesting("but abcdefghijklmnop"));
        assert!(!classifier.is_interesting("but abcdefghijklmnopq"));
    }

    #[test]
    fn rejects_structural_labels() {
        let classifier = QuoteClassifier::default();
        assert!(!classifier.is_interesting(
            "Chapter Seven: in which we finally understand why the river never froze"
        ));
        assert!(!classifier.is_interesting(
            "Figure 3 shows why you should always measure twice before cutting anything"
        ));
        assert!(!classifier.is_interesting(
            "Notebooks were where we kept everything important from the long summer"
        ));
    }

    #[test]
    fn neutral_sentence_is_rejected() {
        let classifier = QuoteClassifier::default();
        let sentence = pad("Rain fell on the roof all night.");
        assert!(classifier.matching_rules(&sentence).is_empty());
        assert!(!classifier.is_interesting(&sentence));
    }

    #[test]
    fn each_rule_qualifies_on_its_own() {
        let classifier = QuoteClassifier::default();
        let cases = [
            ("connective", pad("Hence the long silence.")),
            ("cognition", pad("Nobody could reveal the answer.")),
            ("intensity", pad("It was a crucial winter.")),
            ("exclamation_or_question", format!("{} and then what?", pad("Rain fell."))),
            ("embedded_quote", pad("The sign said \"closed\" in red.")),
            ("personal_pronoun", pad("WE walked on.")),
            ("absolute_modal", pad("The lamp was always lit.")),
            ("comparison", pad("It seems quiet tonight.")),
        ];

        for (rule, sentence) in cases {
            assert_eq!(classifier.matching_rules(&sentence), vec![rule], "{sentence}");
            assert!(classifier.is_interesting(&sentence), "{sentence}");
        }
    }

    #[test]
    fn word_boundaries_are_respected() {
        let classifier = QuoteClassifier::default();
        // "butter" and "known" contain rule words but are not whole-word matches.
        let sentence = pad("The butter was a well-known brand.");
        assert!(classifier.matching_rules(&sentence).is_empty());
    }

    #[test]
    fn custom_rules_extend_the_classifier() {
        let rule = HeuristicRule::new("weather", r"\bstorm\b").unwrap();
        let classifier = QuoteClassifier::default().with_rule(rule);
        let sentence = pad("A STORM came over the hills.");
        assert!(classifier.is_interesting(&sentence));
        assert_eq!(classifier.rules().len(), DEFAULT_RULES.len() + 1);
    }
}
