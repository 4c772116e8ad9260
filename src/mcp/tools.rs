//! Static tool catalog advertised by `tools/list`.

use serde::Serialize;
use serde_json::{Value, json};

/// A tool as advertised to MCP clients.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema of the tool's arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Names listed under the schema's `required` key.
    pub fn required(&self) -> Vec<&str> {
        self.input_schema["required"]
            .as_array()
            .map(|req| req.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

pub const SEARCH_DISCOURSE: &str = "search_discourse";
pub const GET_POSTS: &str = "get_posts";
pub const GET_TOPIC: &str = "get_topic";
pub const GET_CATEGORY: &str = "get_category";
pub const ADVANCED_SEARCH: &str = "advanced_search";
pub const SEARCH_CATEGORY: &str = "search_category";
pub const SEARCH_TAGS: &str = "search_tags";

/// The full catalog, in advertisement order.
pub fn catalog() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: SEARCH_DISCOURSE,
            description: "Search across all Discourse content",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "q": { "type": "string", "description": "Search query" }
                },
                "required": ["q"]
            }),
        },
        ToolDescriptor {
            name: GET_POSTS,
            description: "Get posts from Discourse",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "topic_id": { "type": "integer", "description": "Topic ID to get posts from" }
                }
            }),
        },
        ToolDescriptor {
            name: GET_TOPIC,
            description: "Get topic by ID",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "description": "Topic ID" }
                },
                "required": ["id"]
            }),
        },
        ToolDescriptor {
            name: GET_CATEGORY,
            description: "Get category by ID",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "description": "Category ID" }
                },
                "required": ["id"]
            }),
        },
        ToolDescriptor {
            name: ADVANCED_SEARCH,
            description: "Advanced search in topics or categories",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "q": { "type": "string", "description": "Search query" },
                    "type": {
                        "type": "string",
                        "enum": ["topic", "category"],
                        "description": "Search type",
                        "default": "topic"
                    }
                },
                "required": ["q"]
            }),
        },
        ToolDescriptor {
            name: SEARCH_CATEGORY,
            description: "Search within a specific category by slug",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "slug": { "type": "string", "description": "Category slug (e.g., \"articles\")" },
                    "q": { "type": "string", "description": "Search query" }
                },
                "required": ["slug", "q"]
            }),
        },
        ToolDescriptor {
            name: SEARCH_TAGS,
            description: "Search by tags",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tag": { "type": "string", "description": "Tag name" },
                    "q": { "type": "string", "description": "Optional search query within tagged posts" }
                },
                "required": ["tag"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_are_unique() {
        let tools = catalog();
        let mut names: Vec<_> = tools.iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn required_arguments() {
        let tools = catalog();
        let find = |name: &str| tools.iter().find(|t| t.name == name).unwrap();
        assert_eq!(find(SEARCH_CATEGORY).required(), vec!["slug", "q"]);
        assert_eq!(find(SEARCH_TAGS).required(), vec!["tag"]);
        assert!(find(GET_POSTS).required().is_empty());
    }

    #[test]
    fn serializes_input_schema_in_camel_case() {
        let value = serde_json::to_value(&catalog()[0]).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }
}
