//! Core domain types shared across the scheduler

use crate::invoker::QueryError;

/// Opaque identifier for a pollable source
///
/// Drawn from the ordered set configured at startup. Uniqueness is not
/// required; a duplicated id simply produces a duplicate polling session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(String);

impl SourceId {
    /// Create a source id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for SourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for SourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

/// One element of the merged output stream
///
/// Carries the originating source id and either the query payload or the
/// error the invocation completed with. A failure is ordinary data here;
/// it never terminates a session or the merged stream.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// The source the invocation was issued for
    pub source_id: SourceId,

    /// Payload on success, invocation error on failure
    pub outcome: Result<String, QueryError>,
}

impl QueryResult {
    /// Build a success-kind result
    pub fn success(source_id: SourceId, payload: impl Into<String>) -> Self {
        Self {
            source_id,
            outcome: Ok(payload.into()),
        }
    }

    /// Build a failure-kind result
    pub fn failure(source_id: SourceId, error: QueryError) -> Self {
        Self {
            source_id,
            outcome: Err(error),
        }
    }

    /// Whether the invocation succeeded
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The payload, if the invocation succeeded
    pub fn payload(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }
}
