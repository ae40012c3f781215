//! Hierarchical-name pattern parsing and matching (spec.md §4.4).
//!
//! A pattern is either an exact event name, or a prefix of segments ending
//! in a terminal wildcard token (e.g. `foo_bar_%`). Wildcards are only
//! recognized as the terminal segment — a strong implementer may extend
//! this, but this crate does not.

/// A parsed registration pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Pattern {
    /// No wildcard: matches only the exact emitted name.
    Exact(String),
    /// Terminal wildcard: matches any emitted name whose segmented path
    /// starts with `prefix` and has at least one further segment. An empty
    /// `prefix` is the bare wildcard, matching any non-empty name.
    Wildcard { prefix: Vec<String> },
}

impl Pattern {
    pub(crate) fn parse(raw: &str, delimiter: &str, wildcard: &str) -> Pattern {
        if raw == wildcard {
            return Pattern::Wildcard { prefix: Vec::new() };
        }

        let mut segments: Vec<&str> = raw.split(delimiter).collect();
        if segments.last().copied() == Some(wildcard) {
            segments.pop();
            Pattern::Wildcard {
                prefix: segments.into_iter().map(String::from).collect(),
            }
        } else {
            Pattern::Exact(raw.to_string())
        }
    }

    pub(crate) fn is_wildcard(&self) -> bool {
        matches!(self, Pattern::Wildcard { .. })
    }

    pub(crate) fn matches(&self, name: &str, delimiter: &str) -> bool {
        match self {
            Pattern::Exact(exact) => exact == name,
            Pattern::Wildcard { prefix } => {
                if name.is_empty() {
                    return false;
                }
                let segments: Vec<&str> = name.split(delimiter).collect();
                segments.len() > prefix.len()
                    && segments
                        .iter()
                        .zip(prefix.iter())
                        .all(|(segment, expected)| *segment == expected)
            }
        }
    }
}
