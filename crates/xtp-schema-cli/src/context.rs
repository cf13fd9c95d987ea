//! Invocation context handed to code generation templates
//!
//! The host supplies one JSON value per run holding the raw schema document,
//! project metadata and feature flags. The schema goes through the same parse
//! entry point as every other document.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use xtp_schema_core::XtpSchema;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XtpProject {
    pub name: String,
    pub description: String,
    pub app_id: String,
    pub extension_point_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XtpContext {
    pub schema: XtpSchema,
    pub project: XtpProject,
    pub feature_flags: Map<String, Value>,
}

impl XtpContext {
    pub fn feature_enabled(&self, flag: &str) -> bool {
        self.feature_flags
            .get(flag)
            .is_some_and(|value| !matches!(value, Value::Null | Value::Bool(false)))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContext {
    #[serde(default)]
    schema: Value,
    #[serde(default)]
    project: XtpProject,
    #[serde(default)]
    feature_flags: Value,
}

/// Build the context from its JSON text
pub fn load_context(text: &str) -> Result<XtpContext> {
    let raw: RawContext =
        serde_json::from_str(text).context("Invocation context is not valid JSON")?;

    let normalized = xtp_schema_parser::parse(&raw.schema)
        .context("Invocation context carries an invalid schema")?;
    let feature_flags = feature_flags(raw.feature_flags)?;
    debug!(flags = feature_flags.len(), project = %raw.project.name, "context loaded");

    Ok(XtpContext {
        schema: normalized.schema,
        project: raw.project,
        feature_flags,
    })
}

/// A list of flag names becomes a map of `name -> true`; a map is kept as is
fn feature_flags(raw: Value) -> Result<Map<String, Value>> {
    match raw {
        Value::Null => Ok(Map::new()),
        Value::Object(flags) => Ok(flags),
        Value::Array(names) => Ok(names
            .into_iter()
            .map(|name| match name {
                Value::String(name) => (name, Value::Bool(true)),
                other => (other.to_string(), Value::Bool(true)),
            })
            .collect()),
        other => bail!("featureFlags must be a list or a map, got {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context_json(flags: Value) -> String {
        json!({
            "schema": { "version": "v1-draft", "exports": { "run": {} } },
            "project": { "name": "demo", "appId": "app_1", "extensionPointId": "ext_1" },
            "featureFlags": flags
        })
        .to_string()
    }

    #[test]
    fn test_flag_list_becomes_map() {
        let ctx = load_context(&context_json(json!(["stub-with-code-samples", "fast"]))).unwrap();
        assert!(ctx.feature_enabled("stub-with-code-samples"));
        assert!(ctx.feature_enabled("fast"));
        assert!(!ctx.feature_enabled("slow"));
        assert_eq!(ctx.feature_flags.len(), 2);
        assert_eq!(ctx.project.app_id, "app_1");
        assert_eq!(ctx.schema.exports[0].name, "run");
    }

    #[test]
    fn test_flag_map_kept() {
        let ctx = load_context(&context_json(json!({ "fast": false, "mode": "strict" }))).unwrap();
        assert!(!ctx.feature_enabled("fast"));
        assert!(ctx.feature_enabled("mode"));
    }

    #[test]
    fn test_missing_flags_are_empty() {
        let ctx = load_context(&context_json(Value::Null)).unwrap();
        assert!(ctx.feature_flags.is_empty());
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let ctx = load_context(&context_json(json!(["a"]))).unwrap();
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["featureFlags"], json!({ "a": true }));
        assert_eq!(value["project"]["extensionPointId"], "ext_1");
        assert_eq!(value["schema"]["version"], "v1");
    }

    #[test]
    fn test_invalid_schema_is_an_error() {
        let err = load_context(r#"{ "schema": { "version": "v7" } }"#).unwrap_err();
        let diagnostics = err
            .downcast_ref::<xtp_schema_core::NormalizeError>()
            .expect("normalize error in chain");
        assert_eq!(diagnostics.errors[0].path, "#/version");
    }

    #[test]
    fn test_empty_context_has_no_schema() {
        assert!(load_context("{}").is_err());
    }
}
