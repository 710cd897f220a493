//! Static issue detector.
//!
//! A cheap pre-flight filter: scripts using a known-deprecated symbol are
//! rejected before a render attempt is spent on them.

use mgen_models::{BannedSymbol, TargetProfile};

/// Result of a static check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticCheck {
    Passed,
    Failed { symbol: String, reason: String },
}

impl StaticCheck {
    pub fn is_ok(&self) -> bool {
        matches!(self, StaticCheck::Passed)
    }

    /// Human-readable reason, present only on failure.
    pub fn reason(&self) -> Option<&str> {
        match self {
            StaticCheck::Passed => None,
            StaticCheck::Failed { reason, .. } => Some(reason),
        }
    }
}

/// Scans scripts for deprecated symbols. Pure and deterministic.
#[derive(Debug, Clone)]
pub struct StaticIssueDetector {
    table: Vec<BannedSymbol>,
}

impl StaticIssueDetector {
    pub fn new(table: Vec<BannedSymbol>) -> Self {
        Self { table }
    }

    pub fn from_profile(profile: &TargetProfile) -> Self {
        Self::new(profile.banned_symbols.clone())
    }

    /// Check `source`; the first table entry found wins.
    pub fn check(&self, source: &str) -> StaticCheck {
        self.table
            .iter()
            .find(|entry| source.contains(entry.symbol.as_str()))
            .map(|entry| StaticCheck::Failed {
                symbol: entry.symbol.clone(),
                reason: entry.hint.clone(),
            })
            .unwrap_or(StaticCheck::Passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> StaticIssueDetector {
        StaticIssueDetector::from_profile(&TargetProfile::manim_community())
    }

    #[test]
    fn test_clean_source_passes() {
        let check = detector().check("class A(Scene):\n    def construct(self):\n        self.play(Create(Circle()))\n");
        assert!(check.is_ok());
        assert_eq!(check.reason(), None);
    }

    #[test]
    fn test_show_creation_cites_create() {
        let check = detector().check("self.play(ShowCreation(circle))");
        assert!(!check.is_ok());
        assert!(check.reason().unwrap().contains("Create()"));
    }

    #[test]
    fn test_first_table_entry_wins() {
        let source = "TexMobject('x')\nShowCreation(c)\n";
        match detector().check(source) {
            StaticCheck::Failed { symbol, .. } => assert_eq!(symbol, "ShowCreation"),
            StaticCheck::Passed => panic!("expected failure"),
        }
    }

    #[test]
    fn test_check_is_deterministic() {
        let d = detector();
        let source = "TextMobject('hello')";
        let first = d.check(source);
        let _ = d.check("clean");
        assert_eq!(d.check(source), first);
    }
}
