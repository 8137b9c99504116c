//! Trigger error types.

/// Errors that can occur while building rule tables.
#[derive(thiserror::Error, Debug)]
pub enum TriggerError {
    /// A rule pattern failed to compile.
    #[error("Invalid pattern for {rule} rule: {source}")]
    InvalidPattern {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },

    /// The configured nick is empty.
    #[error("Nick must not be empty")]
    EmptyNick,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_display() {
        let source = regex::Regex::new("[unclosed").unwrap_err();
        let err = TriggerError::InvalidPattern {
            rule: "mention",
            source,
        };
        assert!(err.to_string().starts_with("Invalid pattern for mention rule"));
    }

    #[test]
    fn test_empty_nick_display() {
        assert_eq!(TriggerError::EmptyNick.to_string(), "Nick must not be empty");
    }
}
