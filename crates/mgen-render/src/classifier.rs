//! Renderer stderr classification.
//!
//! A table of `{pattern, category, retryable}` rules. When several rules
//! match, the match that appears earliest in the output wins, so the first
//! error the renderer reported is the one fed back into regeneration.

use regex::Regex;

use mgen_models::ReasonCategory;

use crate::error::RenderResult;

/// Default rules: undefined names, attribute errors and import errors are
/// all fixable by regenerating the script.
const DEFAULT_RULES: &[(&str, ReasonCategory)] = &[
    (
        r"NameError: name '[^']*' is not defined",
        ReasonCategory::UndefinedName,
    ),
    (r"AttributeError:[^\n]*", ReasonCategory::AttributeError),
    (
        r"(?:ImportError|ModuleNotFoundError):[^\n]*",
        ReasonCategory::ImportError,
    ),
];

/// One classifier table entry.
#[derive(Debug, Clone)]
pub struct ClassifierRule {
    pattern: Regex,
    category: ReasonCategory,
    retryable: bool,
}

impl ClassifierRule {
    pub fn new(pattern: &str, category: ReasonCategory, retryable: bool) -> RenderResult<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            category,
            retryable,
        })
    }
}

/// A classified failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ReasonCategory,
    /// The matched text
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone)]
pub struct FailureClassifier {
    rules: Vec<ClassifierRule>,
}

impl Default for FailureClassifier {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .filter_map(|(pattern, category)| ClassifierRule::new(pattern, *category, true).ok())
            .collect();
        Self { rules }
    }
}

impl FailureClassifier {
    pub fn new(rules: Vec<ClassifierRule>) -> Self {
        Self { rules }
    }

    /// Append a rule to the table.
    pub fn with_rule(mut self, rule: ClassifierRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify renderer output. `None` when no rule matches.
    pub fn classify(&self, output: &str) -> Option<Classification> {
        self.rules
            .iter()
            .filter_map(|rule| rule.pattern.find(output).map(|m| (m, rule)))
            .min_by_key(|(m, _)| m.start())
            .map(|(m, rule)| Classification {
                category: rule.category,
                message: m.as_str().trim().to_string(),
                retryable: rule.retryable,
            })
    }
}
