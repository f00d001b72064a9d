//! Tool descriptors, invocation payloads, and observation values.
//!
//! A [`ToolSpec`] is constructed once and reused across many invocations.
//! [`ToolInput`] carries one call's raw payload (text or named arguments)
//! and is immutable for the duration of that call. [`Observation`] is the
//! value a tool hands back to its caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// JSON object map used for named arguments, metadata, and passthrough data.
pub type JsonMap = serde_json::Map<String, Value>;

/// Validated tool name.
///
/// Names route invocations and must be unique within a registry. Validation
/// follows parse-don't-validate: a `ToolName` can only be obtained through
/// [`ToolName::parse`], so every instance is known-good.
///
/// Rules: non-empty, at most 128 characters, no whitespace, only
/// alphanumerics plus `-`, `_`, and `.`, and no `../` / `./` sequences.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolName(String);

impl ToolName {
    /// Maximum allowed name length in bytes.
    pub const MAX_LEN: usize = 128;

    /// Parse and validate a tool name from a string.
    pub fn parse(name: impl AsRef<str>) -> Result<Self, InvalidToolName> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(InvalidToolName::Empty);
        }
        if name.len() > Self::MAX_LEN {
            return Err(InvalidToolName::TooLong { len: name.len() });
        }
        if name.contains("../") || name.contains("./") {
            return Err(InvalidToolName::PathTraversal);
        }
        if let Some(ch) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(InvalidToolName::InvalidChar { ch });
        }
        Ok(Self(name.to_string()))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create a name without validation.
    ///
    /// Only use this in tests or when the input is guaranteed valid. For
    /// user input, use [`ToolName::parse`].
    #[doc(hidden)]
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ToolName {
    type Error = InvalidToolName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ToolName> for String {
    fn from(name: ToolName) -> Self {
        name.0
    }
}

impl std::str::FromStr for ToolName {
    type Err = InvalidToolName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error returned when a tool name fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidToolName {
    #[error("tool name must not be empty")]
    Empty,
    #[error("tool name is {len} bytes, maximum is {}", ToolName::MAX_LEN)]
    TooLong { len: usize },
    #[error("tool name contains invalid character '{ch}'")]
    InvalidChar { ch: char },
    #[error("tool name contains a path traversal sequence")]
    PathTraversal,
}

/// Descriptor for a tool: identity plus the routing information an external
/// agent uses to select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique name that routes invocations to this tool.
    pub name: ToolName,
    /// Tells the agent how/when/why to use the tool. Few-shot examples may
    /// be embedded here.
    pub description: String,
    /// Whether the tool's output should be returned directly to the user
    /// instead of being fed back into the agent loop.
    pub return_direct: bool,
}

impl ToolSpec {
    /// Create a descriptor with `return_direct` off.
    pub fn new(name: ToolName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            return_direct: false,
        }
    }

    /// Mark the tool's output as returned directly to the user.
    pub fn with_return_direct(mut self) -> Self {
        self.return_direct = true;
        self
    }
}

/// Raw invocation payload: either plain text or named arguments.
///
/// Immutable for the duration of one call. Parsing into handler arguments
/// is the runner's job, guided by the tool's schema when one is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolInput {
    /// A raw string payload.
    Text(String),
    /// A mapping of argument names to JSON values.
    Args(JsonMap),
}

impl ToolInput {
    /// Build a text payload.
    pub fn text(input: impl Into<String>) -> Self {
        Self::Text(input.into())
    }

    /// Build a named-argument payload.
    pub fn args(map: JsonMap) -> Self {
        Self::Args(map)
    }

    /// Render the payload as the observer-facing input text.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Args(map) => Value::Object(map.clone()).to_string(),
        }
    }
}

impl From<&str> for ToolInput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ToolInput {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<JsonMap> for ToolInput {
    fn from(map: JsonMap) -> Self {
        Self::Args(map)
    }
}

/// The value a tool invocation produces.
///
/// The caller receives the original value; observers receive the rendering
/// from [`Observation::render`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observation {
    /// Plain text output.
    Text(String),
    /// Structured output.
    Json(Value),
}

impl Observation {
    /// Render the observation as text for lifecycle notifications.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Json(v) => v.to_string(),
        }
    }

    /// Get the text content, if this is a text observation.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(_) => None,
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<&str> for Observation {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Observation {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Value> for Observation {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}
