//! Argument translation: caller arguments to a concrete request shape.
//!
//! # Design
//! One generic translator walks an operation's parameter table instead of
//! carrying a hand-written handler per operation. For each declared
//! parameter it either fills a path placeholder, emits a query key
//! (`page_size` becomes `page-size`), or skips it when no value was
//! supplied. `lang` falls back to the configured default; `format=json` is
//! a wire constant appended by `BdlClient` and never comes from here.
//!
//! Undeclared arguments are ignored. Explicit `null` is the same as absent.

use serde_json::{Map, Value};

use crate::catalog::{OperationDescriptor, ParamKind, ParameterSpec, Placement};
use crate::error::ToolError;

/// Value of a single query key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    /// One `key=value` occurrence per element, in caller order.
    Repeated(Vec<String>),
}

/// Path and query parameters for one call. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestShape {
    /// Path segments after substitution, e.g. `["units", "search"]`.
    pub segments: Vec<String>,
    /// Query keys in declaration order, `lang` last.
    pub query: Vec<(String, QueryValue)>,
}

impl RequestShape {
    /// Path relative to the API base, e.g. `/units/search`.
    pub fn path(&self) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.query.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Query flattened to `key=value` pairs, repeated keys expanded.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.query {
            match value {
                QueryValue::Single(v) => pairs.push((key.as_str(), v.as_str())),
                QueryValue::Repeated(values) => {
                    pairs.extend(values.iter().map(|v| (key.as_str(), v.as_str())))
                }
            }
        }
        pairs
    }
}

/// Remote query key for a caller argument name.
pub fn query_key(name: &str) -> String {
    name.replace('_', "-")
}

#[derive(Debug, Clone)]
pub struct Translator {
    default_lang: String,
}

impl Translator {
    pub fn new(default_lang: impl Into<String>) -> Self {
        Self {
            default_lang: default_lang.into(),
        }
    }

    /// Build the request shape for `op` from a JSON argument object.
    ///
    /// `arguments` may be `null`, which reads as an empty object.
    pub fn translate(
        &self,
        op: &OperationDescriptor,
        arguments: &Value,
    ) -> Result<RequestShape, ToolError> {
        let empty = Map::new();
        let arguments = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => return Err(ToolError::invalid("arguments", "expected an object")),
        };

        let mut path_values: Vec<(&str, String)> = Vec::new();
        let mut query = Vec::new();
        let mut lang = None;

        for param in op.parameters {
            let value = match arguments.get(param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(ToolError::missing(param.name));
                    }
                    continue;
                }
                Some(value) => value,
            };

            match param.placement {
                Placement::Path => {
                    let segment = render_scalar(param, value)?;
                    // `.` and `..` would be collapsed away when the URL is built.
                    if matches!(segment.as_str(), "" | "." | "..") {
                        return Err(ToolError::invalid(param.name, "must be a non-empty path segment"));
                    }
                    path_values.push((param.name, segment));
                }
                Placement::Query => {
                    if let Some(rendered) = render_query_value(param, value)? {
                        query.push((query_key(param.name), rendered));
                    }
                }
                Placement::Language => {
                    // Forwarded as-is; the pl/en enum is advisory only.
                    let requested = value
                        .as_str()
                        .ok_or_else(|| ToolError::invalid(param.name, "expected a string"))?;
                    if !requested.is_empty() {
                        lang = Some(requested.to_string());
                    }
                }
            }
        }

        query.push((
            "lang".to_string(),
            QueryValue::Single(lang.unwrap_or_else(|| self.default_lang.clone())),
        ));

        Ok(RequestShape {
            segments: substitute_path(op, &path_values)?,
            query,
        })
    }
}

fn substitute_path(
    op: &OperationDescriptor,
    values: &[(&str, String)],
) -> Result<Vec<String>, ToolError> {
    op.path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(placeholder) => values
                .iter()
                .find(|(name, _)| *name == placeholder)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| ToolError::missing(placeholder)),
            None => Ok(segment.to_string()),
        })
        .collect()
}

fn render_query_value(param: &ParameterSpec, value: &Value) -> Result<Option<QueryValue>, ToolError> {
    if param.kind != ParamKind::IntegerArray {
        return render_scalar(param, value).map(|v| Some(QueryValue::Single(v)));
    }

    let values = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| integer(param, item).map(|i| i.to_string()))
            .collect::<Result<Vec<_>, _>>()?,
        scalar => vec![integer(param, scalar)?.to_string()],
    };

    if values.is_empty() {
        if param.required {
            return Err(ToolError::invalid(param.name, "must contain at least one value"));
        }
        return Ok(None);
    }
    Ok(Some(QueryValue::Repeated(values)))
}

fn render_scalar(param: &ParameterSpec, value: &Value) -> Result<String, ToolError> {
    let rendered = match param.kind {
        ParamKind::String => match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return Err(ToolError::invalid(param.name, "expected a string")),
        },
        ParamKind::Integer => integer(param, value)?.to_string(),
        ParamKind::IntegerArray => {
            return Err(ToolError::invalid(param.name, "expected a single value"))
        }
    };

    if let Some(allowed) = param.allowed_values {
        if !allowed.contains(&rendered.as_str()) {
            return Err(ToolError::invalid(
                param.name,
                format!("`{rendered}` is not one of {}", allowed.join(", ")),
            ));
        }
    }
    Ok(rendered)
}

fn integer(param: &ParameterSpec, value: &Value) -> Result<i64, ToolError> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ToolError::invalid(param.name, "expected an integer"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::catalog::Catalog;

    fn shape(name: &str, arguments: Value) -> Result<RequestShape, ToolError> {
        let catalog = Catalog::builtin().unwrap();
        Translator::new("pl").translate(catalog.get(name).unwrap(), &arguments)
    }

    fn single(v: &str) -> Option<QueryValue> {
        Some(QueryValue::Single(v.to_string()))
    }

    #[test]
    fn query_key_uses_hyphens() {
        assert_eq!(query_key("page_size"), "page-size");
        assert_eq!(query_key("aggregate_id"), "aggregate-id");
        assert_eq!(query_key("name"), "name");
    }

    #[test]
    fn path_value_must_be_a_real_segment() {
        for id in ["", ".", ".."] {
            let err = shape("get_unit_by_id", json!({ "id": id })).unwrap_err();
            assert_eq!(err.parameter(), Some("id"), "id {id:?}");
            assert_eq!(err.kind(), crate::error::ErrorKind::ValidationError);
        }
        let shape = shape("get_unit_by_id", json!({ "id": "..x" })).unwrap();
        assert_eq!(shape.path(), "/units/..x");
    }

    #[test]
    fn list_without_arguments_sends_only_lang() {
        let shape = shape("get_years", json!({})).unwrap();
        assert_eq!(shape.path(), "/years");
        assert_eq!(shape.pairs(), vec![("lang", "pl")]);
    }

    #[test]
    fn null_arguments_read_as_empty() {
        let shape = shape("get_levels", Value::Null).unwrap();
        assert_eq!(shape.keys(), vec!["lang"]);
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = shape("get_levels", json!([1, 2])).unwrap_err();
        assert_eq!(err.parameter(), Some("arguments"));
    }

    #[test]
    fn search_units_builds_name_and_lang() {
        let shape = shape("search_units", json!({ "name": "Warszawa" })).unwrap();
        assert_eq!(shape.path(), "/units/search");
        assert_eq!(shape.pairs(), vec![("name", "Warszawa"), ("lang", "pl")]);
    }

    #[test]
    fn path_parameter_is_substituted() {
        let shape = shape("get_data_by_variable", json!({ "var_id": 60559, "unit_level": 2 })).unwrap();
        assert_eq!(shape.segments, vec!["data", "by-variable", "60559"]);
        assert_eq!(shape.get("unit-level"), single("2").as_ref());
        assert!(shape.get("var-id").is_none());
    }

    #[test]
    fn missing_path_parameter_fails() {
        let err = shape("get_unit_by_id", json!({})).unwrap_err();
        assert_eq!(err, ToolError::missing("id"));
    }

    #[test]
    fn explicit_null_counts_as_missing() {
        let err = shape("get_unit_by_id", json!({ "id": null })).unwrap_err();
        assert_eq!(err.parameter(), Some("id"));
    }

    #[test]
    fn optional_parameters_are_omitted() {
        let shape = shape("get_units", json!({ "level": 2, "parent_id": null })).unwrap();
        assert_eq!(shape.keys(), vec!["level", "lang"]);
    }

    #[test]
    fn arrays_become_repeated_keys_in_order() {
        let shape = shape("get_data_by_unit", json!({
            "unit_id": "023200000000",
            "var_id": [3643, 2137],
            "year": [2020, 2021],
        }))
        .unwrap();
        assert_eq!(
            shape.pairs(),
            vec![
                ("var-id", "3643"),
                ("var-id", "2137"),
                ("year", "2020"),
                ("year", "2021"),
                ("lang", "pl"),
            ]
        );
    }

    #[test]
    fn scalar_for_array_parameter_is_one_occurrence() {
        let shape = shape("get_variables", json!({ "year": 2022 })).unwrap();
        assert_eq!(shape.get("year"), Some(&QueryValue::Repeated(vec!["2022".into()])));
    }

    #[test]
    fn empty_optional_array_is_omitted() {
        let shape = shape("get_variables", json!({ "year": [] })).unwrap();
        assert!(shape.get("year").is_none());
    }

    #[test]
    fn empty_required_array_fails() {
        let err = shape("get_data_by_unit", json!({ "unit_id": "0", "var_id": [] })).unwrap_err();
        assert_eq!(err.parameter(), Some("var_id"));
    }

    #[test]
    fn sort_outside_allowed_set_fails() {
        let err = shape("get_aggregates", json!({ "sort": "Bogus" })).unwrap_err();
        assert_eq!(
            err,
            ToolError::Validation {
                parameter: "sort".into(),
                reason: "`Bogus` is not one of Id, -Id, Name, -Name".into(),
            }
        );
    }

    #[test]
    fn sort_sets_differ_per_operation() {
        assert!(shape("get_variables", json!({ "sort": "-SubjectId" })).is_ok());
        assert!(shape("get_variables", json!({ "sort": "Name" })).is_err());
        assert!(shape("get_years", json!({ "sort": "Name" })).is_err());
        let ok = shape("get_years", json!({ "sort": "-Id" })).unwrap();
        assert_eq!(ok.get("sort"), single("-Id").as_ref());
    }

    #[test]
    fn explicit_lang_overrides_default() {
        let shape = shape("get_measures", json!({ "lang": "en" })).unwrap();
        assert_eq!(shape.pairs(), vec![("lang", "en")]);
    }

    #[test]
    fn unknown_lang_is_forwarded() {
        let shape = shape("get_measures", json!({ "lang": "de" })).unwrap();
        assert_eq!(shape.get("lang"), single("de").as_ref());
    }

    #[test]
    fn empty_lang_falls_back_to_default() {
        let shape = shape("get_measures", json!({ "lang": "" })).unwrap();
        assert_eq!(shape.get("lang"), single("pl").as_ref());
    }

    #[test]
    fn format_is_not_caller_controlled() {
        let shape = shape("get_measures", json!({ "format": "xml" })).unwrap();
        assert!(shape.get("format").is_none());
    }

    #[test]
    fn integers_accept_numeric_strings() {
        let shape = shape("get_level_by_id", json!({ "id": "5" })).unwrap();
        assert_eq!(shape.path(), "/levels/5");
    }

    #[test]
    fn wrong_types_fail_with_parameter_name() {
        let err = shape("get_units", json!({ "level": "two" })).unwrap_err();
        assert_eq!(err.parameter(), Some("level"));
        let err = shape("get_units", json!({ "year": [2020, "x"] })).unwrap_err();
        assert_eq!(err.parameter(), Some("year"));
        let err = shape("get_units", json!({ "name": true })).unwrap_err();
        assert_eq!(err.parameter(), Some("name"));
    }

    #[test]
    fn string_ids_accept_numbers() {
        let shape = shape("get_subject_by_id", json!({ "id": 1 })).unwrap();
        assert_eq!(shape.path(), "/subjects/1");
    }

    #[test]
    fn undeclared_arguments_are_ignored() {
        let shape = shape("get_localities", json!({ "parent_id": "1465011", "colour": "red" })).unwrap();
        assert_eq!(shape.keys(), vec!["parent-id", "lang"]);
    }
}
