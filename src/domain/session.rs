// Per-visitor rendering preferences
use super::chart::{ChartMode, ChartSpan};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Longest held token accepted; ids end up inside cache file names.
const MAX_ID_LEN: usize = 64;

/// Opaque alphanumeric token scoping one visitor's batch of chart requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RenderGroupId(String);

impl RenderGroupId {
    /// Validates a held token. Only non-empty ASCII alphanumeric values up to
    /// `MAX_ID_LEN` characters are reusable.
    pub fn parse(value: &str) -> Option<Self> {
        if !value.is_empty()
            && value.len() <= MAX_ID_LEN
            && value.chars().all(|c| c.is_ascii_alphanumeric())
        {
            Some(Self(value.to_string()))
        } else {
            None
        }
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved preferences handed to the orchestrator for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionPreferences {
    pub group_id: RenderGroupId,
    pub mode: ChartMode,
    pub span: ChartSpan,
}

impl SessionPreferences {
    pub fn new(group_id: RenderGroupId, mode: ChartMode, span: ChartSpan) -> Self {
        Self {
            group_id,
            mode,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_non_alphanumeric() {
        assert!(RenderGroupId::parse("abc123").is_some());
        assert!(RenderGroupId::parse("").is_none());
        assert!(RenderGroupId::parse("abc-123").is_none());
        assert!(RenderGroupId::parse("../etc").is_none());
        assert!(RenderGroupId::parse("abc 123").is_none());
    }

    #[test]
    fn test_parse_rejects_oversized_ids() {
        assert!(RenderGroupId::parse(&"a".repeat(MAX_ID_LEN)).is_some());
        assert!(RenderGroupId::parse(&"a".repeat(MAX_ID_LEN + 1)).is_none());
        assert!(RenderGroupId::parse(&"a".repeat(300)).is_none());
    }

    #[test]
    fn test_generated_ids_are_valid_and_distinct() {
        let a = RenderGroupId::generate();
        let b = RenderGroupId::generate();
        assert_ne!(a, b);
        assert_eq!(RenderGroupId::parse(a.as_str()), Some(a.clone()));
    }
}
