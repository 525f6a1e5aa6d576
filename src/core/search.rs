//! Free-text search rule shared by the history view and report export
//!
//! The rule is fixed and asymmetric: text containing any CJK unified
//! ideograph (U+4E00..=U+9FFF) searches case scenarios, anything else
//! searches case IDs. Both comparisons are case-insensitive substrings.

/// Which field a search term is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Scenario,
    CaseId,
}

/// A prepared search term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchText {
    needle: String,
    target: SearchTarget,
}

impl SearchText {
    /// Prepare a search term. Returns `None` for empty input, which means
    /// "no search filter". Whitespace is part of the term.
    pub fn new(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }

        let target = if contains_cjk(text) {
            SearchTarget::Scenario
        } else {
            SearchTarget::CaseId
        };

        Some(Self {
            needle: text.to_lowercase(),
            target,
        })
    }

    pub fn target(&self) -> SearchTarget {
        self.target
    }

    /// Test a case against this term. `scenario` is `None` when the case
    /// could not be loaded, which never matches a scenario search.
    pub fn matches(&self, case_id: &str, scenario: Option<&str>) -> bool {
        match self.target {
            SearchTarget::Scenario => scenario
                .map(|s| s.to_lowercase().contains(&self.needle))
                .unwrap_or(false),
            SearchTarget::CaseId => case_id.to_lowercase().contains(&self.needle),
        }
    }
}

/// True if any character is a CJK unified ideograph
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cjk_detection() {
        assert!(contains_cjk("登录"));
        assert!(contains_cjk("abc登"));
        assert!(!contains_cjk("Login A1"));
        // Hiragana is outside the ideograph block
        assert!(!contains_cjk("ろぐいん"));
    }

    #[test]
    fn test_cjk_search_matches_scenario_not_id() {
        let search = SearchText::new("登录").unwrap();
        assert_eq!(search.target(), SearchTarget::Scenario);
        assert!(search.matches("A1", Some("用户登录成功")));
        assert!(!search.matches("登录-01", Some("Logout")));
        assert!(!search.matches("A1", None));
    }

    #[test]
    fn test_ascii_search_matches_id_not_scenario() {
        let search = SearchText::new("a1").unwrap();
        assert_eq!(search.target(), SearchTarget::CaseId);
        assert!(search.matches("TC-A1", Some("anything")));
        assert!(!search.matches("TC-B2", Some("contains a1 in text")));
    }

    #[test]
    fn test_empty_search_is_none() {
        assert!(SearchText::new("").is_none());
    }

    #[test]
    fn test_whitespace_is_kept_in_term() {
        let search = SearchText::new(" A1").unwrap();
        assert!(search.matches("TC A1", None));
        assert!(!search.matches("TC-A1", None));
        assert!(!search.matches("A1", None));
    }
}
