//! Tool dispatch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::tools::{self, ToolDescriptor};
use crate::types::{PostsQuery, SearchType};
use crate::{ForumApi, RelayError, Result};

/// A single content block of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// Result of `tools/call`.
///
/// Application failures are reported inside the content as
/// `Error: <message>`, never as a protocol error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<Content>,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content {
                content_type: "text".to_string(),
                text: text.into(),
            }],
        }
    }

    pub fn error(err: &RelayError) -> Self {
        Self::text(format!("Error: {err}"))
    }

    /// Text of the first content block.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| c.text.as_str())
    }
}

/// Serves the tool catalog against a [`ForumApi`].
pub struct ToolServer {
    api: Arc<dyn ForumApi>,
    tools: Vec<ToolDescriptor>,
}

impl ToolServer {
    pub fn new(api: Arc<dyn ForumApi>) -> Self {
        Self {
            api,
            tools: tools::catalog(),
        }
    }

    /// The advertised catalog.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Invoke tool `name` with `arguments` (a JSON object, or null).
    ///
    /// Successful results are pretty-printed JSON with 2-space indentation.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> ToolResult {
        let result = self
            .dispatch(name, arguments)
            .await
            .and_then(|value| serde_json::to_string_pretty(&value).map_err(RelayError::from));

        match result {
            Ok(text) => {
                debug!(tool = name, "tool call succeeded");
                ToolResult::text(text)
            }
            Err(e) => {
                warn!(tool = name, error = %e, "tool call failed");
                ToolResult::error(&e)
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: &Value) -> Result<Value> {
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(RelayError::UnknownTool(name.to_string()));
        }
        let args = Arguments::new(arguments)?;

        match name {
            tools::SEARCH_DISCOURSE => self.api.search(args.required_str("q")?).await,
            tools::GET_POSTS => self.api.posts(&args.scalars()?).await,
            tools::GET_TOPIC => self.api.topic(&args.required_id("id")?).await,
            tools::GET_CATEGORY => self.api.category(&args.required_id("id")?).await,
            tools::ADVANCED_SEARCH => {
                let q = args.required_str("q")?;
                let search_type = SearchType::from(args.optional_str("type")?);
                self.api.advanced_search(q, &search_type).await
            }
            tools::SEARCH_CATEGORY => {
                let slug = args.required_str("slug")?;
                let q = args.required_str("q")?;
                self.api.search_category(slug, q).await
            }
            tools::SEARCH_TAGS => {
                let tag = args.required_str("tag")?;
                let q = args.optional_str("q")?;
                self.api.search_tags(tag, q).await
            }
            other => Err(RelayError::UnknownTool(other.to_string())),
        }
    }
}

/// Typed access to a tool's JSON arguments.
struct Arguments<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Arguments<'a> {
    fn new(value: &'a Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self { map: None }),
            Value::Object(map) => Ok(Self { map: Some(map) }),
            _ => Err(RelayError::InvalidInput(
                "arguments must be an object".to_string(),
            )),
        }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map?.get(field).filter(|v| !v.is_null())
    }

    fn optional_str(&self, field: &str) -> Result<Option<&'a str>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(RelayError::InvalidInput(format!(
                "parameter '{field}' must be a string"
            ))),
        }
    }

    fn required_str(&self, field: &str) -> Result<&'a str> {
        self.optional_str(field)?
            .ok_or_else(|| RelayError::missing(field))
    }

    /// Ids are accepted as JSON integers or strings and rendered as the
    /// path segment the forum receives.
    fn required_id(&self, field: &str) -> Result<String> {
        match self.get(field) {
            None => Err(RelayError::missing(field)),
            Some(Value::Number(n)) if n.is_u64() => Ok(n.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(RelayError::InvalidInput(format!(
                "parameter '{field}' must be an integer or string"
            ))),
        }
    }

    /// All scalar arguments rendered as strings; nulls are dropped.
    fn scalars(&self) -> Result<PostsQuery> {
        let mut out = PostsQuery::new();
        let Some(map) = self.map else {
            return Ok(out);
        };
        for (key, value) in map {
            let rendered = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(RelayError::InvalidInput(format!(
                        "parameter '{key}' must be a scalar"
                    )));
                }
            };
            out.insert(key.clone(), rendered);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_id_accepts_numbers_and_strings() {
        let value = json!({ "id": 42 });
        assert_eq!(Arguments::new(&value).unwrap().required_id("id").unwrap(), "42");

        let value = json!({ "id": "support" });
        assert_eq!(
            Arguments::new(&value).unwrap().required_id("id").unwrap(),
            "support"
        );

        let value = json!({ "id": -1 });
        assert!(Arguments::new(&value).unwrap().required_id("id").is_err());

        let value = json!({ "id": [1] });
        assert!(Arguments::new(&value).unwrap().required_id("id").is_err());
    }

    #[test]
    fn missing_required_string() {
        let value = json!({});
        let err = Arguments::new(&value)
            .unwrap()
            .required_str("q")
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput(_)));
        assert!(err.to_string().contains("'q'"));
    }

    #[test]
    fn null_arguments_are_empty() {
        let args = Arguments::new(&Value::Null).unwrap();
        assert!(args.scalars().unwrap().is_empty());
        assert_eq!(args.optional_str("q").unwrap(), None);
    }

    #[test]
    fn non_object_arguments_rejected() {
        let value = json!([1, 2]);
        assert!(Arguments::new(&value).is_err());
    }

    #[test]
    fn scalars_render_without_quotes() {
        let value = json!({ "topic_id": 5, "q": "text", "flag": true, "skip": null });
        let params = Arguments::new(&value).unwrap().scalars().unwrap();
        assert_eq!(params.get("topic_id").map(String::as_str), Some("5"));
        assert_eq!(params.get("q").map(String::as_str), Some("text"));
        assert_eq!(params.get("flag").map(String::as_str), Some("true"));
        assert!(!params.contains_key("skip"));
    }

    #[test]
    fn nested_scalars_rejected() {
        let value = json!({ "filter": { "a": 1 } });
        assert!(Arguments::new(&value).unwrap().scalars().is_err());
    }

    #[test]
    fn error_result_is_prefixed() {
        let result = ToolResult::error(&RelayError::UnknownTool("nope".into()));
        assert_eq!(result.first_text(), Some("Error: Unknown tool: nope"));
    }
}
