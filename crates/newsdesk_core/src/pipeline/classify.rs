//! Rule-based category assignment.

use crate::config::{ClassifyRules, ConfigError, ConfigResult};
use crate::normalize::text::strip_tags;
use regex::{Regex, RegexBuilder};

/// Compiled category rules, evaluated in configuration order.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: Vec<(String, Vec<Regex>)>,
}

impl Classifier {
    /// Compiles case-insensitive patterns for every category.
    pub fn new(rules: &ClassifyRules) -> ConfigResult<Self> {
        let mut compiled = Vec::with_capacity(rules.0.len());
        for (category, patterns) in &rules.0 {
            let mut regexes = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| ConfigError::InvalidPattern {
                        category: category.clone(),
                        pattern: pattern.clone(),
                        message: err.to_string(),
                    })?;
                regexes.push(regex);
            }
            compiled.push((category.clone(), regexes));
        }
        Ok(Self { rules: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First category with a pattern matching title + summary text.
    pub fn classify(&self, title: &str, summary: &str) -> Option<&str> {
        let text = strip_tags(&format!("{title} {summary}"));
        self.rules
            .iter()
            .find(|(_, regexes)| regexes.iter().any(|regex| regex.is_match(&text)))
            .map(|(category, _)| category.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Classifier;
    use crate::config::ClassifyRules;

    fn rules() -> ClassifyRules {
        ClassifyRules(vec![
            ("Выставки".to_string(), vec!["выставк".to_string()]),
            ("Новые модели".to_string(), vec!["премьера".to_string()]),
        ])
    }

    #[test]
    fn classifies_case_insensitively_in_rule_order() {
        let classifier = Classifier::new(&rules()).unwrap();
        assert_eq!(
            classifier.classify("Премьера новой модели", ""),
            Some("Новые модели")
        );
        assert_eq!(
            classifier.classify("Отраслевая выставка прошла", "премьера"),
            Some("Выставки")
        );
        assert_eq!(classifier.classify("Ничего", "<p>пусто</p>"), None);
    }
}
