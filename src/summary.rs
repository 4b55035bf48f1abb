use crate::cache::CachedSummary;

pub const NOT_AVAILABLE: &str = "Não disponível";

pub fn is_not_available(text: &str) -> bool {
    text == NOT_AVAILABLE
}

/// "What happened" / "possible cause" pair for one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub whats_wrong: String,
    pub possible_cause: String,
}

impl Summary {
    pub fn unavailable() -> Self {
        Self {
            whats_wrong: NOT_AVAILABLE.to_string(),
            possible_cause: NOT_AVAILABLE.to_string(),
        }
    }

    /// Removes markdown emphasis and substitutes the sentinel for blanks.
    pub fn from_raw(whats_wrong: Option<&str>, possible_cause: Option<&str>) -> Self {
        Self {
            whats_wrong: clean_field(whats_wrong),
            possible_cause: clean_field(possible_cause),
        }
    }
}

impl From<CachedSummary> for Summary {
    fn from(cached: CachedSummary) -> Self {
        Self {
            whats_wrong: cached.whats_wrong,
            possible_cause: cached.possible_cause,
        }
    }
}

fn clean_field(raw: Option<&str>) -> String {
    let cleaned = raw.unwrap_or_default().replace('*', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emphasis_is_stripped() {
        let summary = Summary::from_raw(
            Some("**TypeError** in `render_page`"),
            Some("A *missing* key"),
        );

        assert_eq!(summary.whats_wrong, "TypeError in `render_page`");
        assert_eq!(summary.possible_cause, "A missing key");
    }

    #[test]
    fn test_blank_fields_become_sentinel() {
        let summary = Summary::from_raw(Some("  ** **  "), None);

        assert_eq!(summary, Summary::unavailable());
    }

    #[test]
    fn test_sentinel_is_not_empty_string() {
        assert!(is_not_available(NOT_AVAILABLE));
        assert!(!is_not_available(""));
    }

    #[test]
    fn test_identifiers_with_underscores_survive() {
        let summary = Summary::from_raw(Some("__init__ raised KeyError"), Some("x"));

        assert_eq!(summary.whats_wrong, "__init__ raised KeyError");
    }
}
