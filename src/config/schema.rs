use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "llm": {
                "type": "object",
                "properties": {
                    "provider": { "type": "string", "enum": ["anthropic", "openai", "local"] },
                    "model": { "type": "string" },
                    "api_key": { "type": "string" },
                    "base_url": { "type": "string" },
                    "temperature": { "type": "number", "minimum": 0, "maximum": 2 },
                    "max_output_tokens": { "type": "integer", "minimum": 1 }
                }
            },
            "storage": {
                "type": "object",
                "properties": {
                    "backend": { "type": "string", "enum": ["file", "sqlite", "memory"] },
                    "path": { "type": "string" },
                    "key": { "type": "string", "minLength": 1 }
                }
            },
            "data": {
                "type": "object",
                "properties": {
                    "dir": { "type": "string" }
                }
            },
            "pipeline": {
                "type": "object",
                "properties": {
                    "skip_agents": { "type": "array", "items": { "type": "string" } },
                    "excerpt_chars": { "type": "integer", "minimum": 0 }
                }
            }
        }
    })
});
