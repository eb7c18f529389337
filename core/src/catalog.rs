//! Static catalog of the operations exposed over the statistical API.
//!
//! # Design
//! Each `OperationDescriptor` is a declarative rule: a path template plus
//! an ordered parameter table. The translator consumes exactly this table,
//! so the advertised schema and the request that gets built cannot drift
//! apart. Descriptors are `'static` and immutable; `Catalog` only adds a
//! name index on top of them.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::error::ToolError;

/// JSON type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    /// Sent as a repeated query key, one occurrence per element.
    IntegerArray,
}

/// Where a parameter ends up in the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Substituted into the `{name}` placeholder of the path template.
    Path,
    /// Query key, named after the parameter with `_` rewritten to `-`.
    Query,
    /// The `lang` query key, which falls back to the configured default.
    Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub placement: Placement,
    pub allowed_values: Option<&'static [&'static str]>,
    pub description: &'static str,
}

impl ParameterSpec {
    pub const fn query(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            placement: Placement::Query,
            allowed_values: None,
            description,
        }
    }

    pub const fn path(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            placement: Placement::Path,
            allowed_values: None,
            description,
        }
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn one_of(self, values: &'static [&'static str]) -> Self {
        Self {
            allowed_values: Some(values),
            ..self
        }
    }

    fn schema(&self) -> Value {
        let mut schema = match self.kind {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::Integer => json!({ "type": "integer" }),
            ParamKind::IntegerArray => json!({ "type": "array", "items": { "type": "integer" } }),
        };
        schema["description"] = Value::from(self.description);
        if let Some(values) = self.allowed_values {
            schema["enum"] = Value::from(values.to_vec());
        }
        schema
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// Path relative to the API base, e.g. `/units/{id}`.
    pub path: &'static str,
    pub parameters: &'static [ParameterSpec],
}

impl OperationDescriptor {
    pub fn parameter(&self, name: &str) -> Option<&'static ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &'static str> {
        self.parameters.iter().filter(|p| p.required).map(|p| p.name)
    }

    /// JSON-Schema object describing the accepted arguments.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.to_string(), p.schema()))
            .collect();

        let mut schema = json!({ "type": "object", "properties": properties });
        let required: Vec<&str> = self.required_parameters().collect();
        if !required.is_empty() {
            schema["required"] = Value::from(required);
        }
        schema
    }

    /// Name, description and input schema as advertised to callers.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

/// Name-indexed view over a descriptor table.
#[derive(Debug, Clone)]
pub struct Catalog {
    operations: &'static [OperationDescriptor],
    index: HashMap<&'static str, usize>,
}

impl Catalog {
    /// Index `operations`, rejecting tables that reuse a name.
    pub fn new(operations: &'static [OperationDescriptor]) -> Result<Self, ToolError> {
        let mut index = HashMap::with_capacity(operations.len());
        for (position, op) in operations.iter().enumerate() {
            if index.insert(op.name, position).is_some() {
                return Err(ToolError::Internal(format!(
                    "duplicate operation name in catalog: {}",
                    op.name
                )));
            }
        }
        Ok(Self { operations, index })
    }

    pub fn builtin() -> Result<Self, ToolError> {
        Self::new(OPERATIONS)
    }

    /// Descriptors in declaration order.
    pub fn operations(&self) -> &'static [OperationDescriptor] {
        self.operations
    }

    pub fn get(&self, name: &str) -> Result<&'static OperationDescriptor, ToolError> {
        let operations = self.operations;
        self.index
            .get(name)
            .map(|&position| &operations[position])
            .ok_or_else(|| ToolError::UnknownOperation(name.to_string()))
    }

    /// The whole catalog in the `{"tools": [...]}` listing shape.
    pub fn to_json(&self) -> Value {
        let tools: Vec<Value> = self.operations.iter().map(OperationDescriptor::to_json).collect();
        json!({ "tools": tools })
    }
}

// ---------------------------------------------------------------------------
// Descriptor table
// ---------------------------------------------------------------------------

const SORT_BY_ID_OR_NAME: &[&str] = &["Id", "-Id", "Name", "-Name"];
const SORT_BY_ID_OR_SUBJECT: &[&str] = &["Id", "-Id", "SubjectId", "-SubjectId"];
const SORT_BY_ID: &[&str] = &["Id", "-Id"];
const LANGUAGES: &[&str] = &["pl", "en"];

const LANG: ParameterSpec = ParameterSpec {
    name: "lang",
    kind: ParamKind::String,
    required: false,
    placement: Placement::Language,
    allowed_values: Some(LANGUAGES),
    description: "Response language",
};

const PAGE: ParameterSpec = ParameterSpec::query("page", ParamKind::Integer, "Page number, counted from 0");
const PAGE_SIZE: ParameterSpec = ParameterSpec::query("page_size", ParamKind::Integer, "Number of records per page");
const YEARS: ParameterSpec = ParameterSpec::query("year", ParamKind::IntegerArray, "List of years");
const AGGREGATE_ID: ParameterSpec = ParameterSpec::query("aggregate_id", ParamKind::Integer, "Aggregation level ID");
const VARIABLE_IDS: ParameterSpec =
    ParameterSpec::query("var_id", ParamKind::IntegerArray, "List of variable IDs").required();
const SORT_ID_NAME: ParameterSpec =
    ParameterSpec::query("sort", ParamKind::String, "Sort order").one_of(SORT_BY_ID_OR_NAME);
const SORT_ID_SUBJECT: ParameterSpec =
    ParameterSpec::query("sort", ParamKind::String, "Sort order").one_of(SORT_BY_ID_OR_SUBJECT);

/// Every operation exposed by the adapter, grouped by resource family.
pub static OPERATIONS: &[OperationDescriptor] = &[
    // Aggregation levels
    OperationDescriptor {
        name: "get_aggregates",
        description: "List aggregation levels (e.g. country, voivodeship, district, commune)",
        path: "/aggregates",
        parameters: &[SORT_ID_NAME, LANG],
    },
    OperationDescriptor {
        name: "get_aggregate_by_id",
        description: "Get details of an aggregation level by ID",
        path: "/aggregates/{id}",
        parameters: &[ParameterSpec::path("id", ParamKind::Integer, "Aggregation level ID"), LANG],
    },
    // Attributes
    OperationDescriptor {
        name: "get_attributes",
        description: "List attributes attached to statistical data values",
        path: "/attributes",
        parameters: &[SORT_ID_NAME, LANG],
    },
    OperationDescriptor {
        name: "get_attribute_by_id",
        description: "Get details of an attribute by ID",
        path: "/attributes/{id}",
        parameters: &[ParameterSpec::path("id", ParamKind::Integer, "Attribute ID"), LANG],
    },
    // Statistical data
    OperationDescriptor {
        name: "get_data_by_variable",
        description: "Get statistical data for a single variable",
        path: "/data/by-variable/{var_id}",
        parameters: &[
            ParameterSpec::path("var_id", ParamKind::Integer, "Variable ID"),
            ParameterSpec::query("unit_id", ParamKind::String, "Territorial unit ID (optional)"),
            ParameterSpec::query("unit_level", ParamKind::Integer, "Territorial unit level"),
            AGGREGATE_ID,
            YEARS,
            PAGE,
            PAGE_SIZE,
            LANG,
        ],
    },
    OperationDescriptor {
        name: "get_data_by_unit",
        description: "Get statistical data for a territorial unit",
        path: "/data/by-unit/{unit_id}",
        parameters: &[
            ParameterSpec::path("unit_id", ParamKind::String, "Territorial unit ID"),
            VARIABLE_IDS,
            YEARS,
            AGGREGATE_ID,
            PAGE,
            PAGE_SIZE,
            LANG,
        ],
    },
    OperationDescriptor {
        name: "get_data_localities_by_unit",
        description: "Get statistical data for a statistical locality",
        path: "/data/localities/by-unit/{unit_id}",
        parameters: &[
            ParameterSpec::path("unit_id", ParamKind::String, "Statistical locality ID"),
            VARIABLE_IDS,
            YEARS,
            AGGREGATE_ID,
            PAGE,
            PAGE_SIZE,
            LANG,
        ],
    },
    // Territorial unit levels
    OperationDescriptor {
        name: "get_levels",
        description: "List territorial unit levels",
        path: "/levels",
        parameters: &[SORT_ID_NAME, LANG],
    },
    OperationDescriptor {
        name: "get_level_by_id",
        description: "Get details of a territorial unit level by ID",
        path: "/levels/{id}",
        parameters: &[ParameterSpec::path("id", ParamKind::Integer, "Level ID"), LANG],
    },
    // Measure units
    OperationDescriptor {
        name: "get_measures",
        description: "List measure units",
        path: "/measures",
        parameters: &[SORT_ID_NAME, LANG],
    },
    OperationDescriptor {
        name: "get_measure_by_id",
        description: "Get details of a measure unit by ID",
        path: "/measures/{id}",
        parameters: &[ParameterSpec::path("id", ParamKind::Integer, "Measure unit ID"), LANG],
    },
    // Subjects
    OperationDescriptor {
        name: "get_subjects",
        description: "List subjects (data categories), optionally under a parent subject",
        path: "/subjects",
        parameters: &[
            ParameterSpec::query("parent_id", ParamKind::String, "Parent subject ID"),
            PAGE,
            PAGE_SIZE,
            SORT_ID_NAME,
            LANG,
        ],
    },
    OperationDescriptor {
        name: "get_subject_by_id",
        description: "Get details of a subject by ID",
        path: "/subjects/{id}",
        parameters: &[ParameterSpec::path("id", ParamKind::String, "Subject ID"), LANG],
    },
    // Territorial units
    OperationDescriptor {
        name: "get_units",
        description: "List territorial units (voivodeships, districts, communes)",
        path: "/units",
        parameters: &[
            ParameterSpec::query("parent_id", ParamKind::String, "Parent unit ID"),
            ParameterSpec::query("level", ParamKind::Integer, "Unit level (1-6)"),
            ParameterSpec::query("name", ParamKind::String, "Unit name filter"),
            YEARS,
            ParameterSpec::query("kind", ParamKind::String, "Unit kind"),
            PAGE,
            PAGE_SIZE,
            SORT_ID_NAME,
            LANG,
        ],
    },
    OperationDescriptor {
        name: "get_unit_by_id",
        description: "Get details of a territorial unit by ID",
        path: "/units/{id}",
        parameters: &[ParameterSpec::path("id", ParamKind::String, "Territorial unit ID"), LANG],
    },
    OperationDescriptor {
        name: "search_units",
        description: "Search territorial units by name",
        path: "/units/search",
        parameters: &[
            ParameterSpec::query("name", ParamKind::String, "Name to search for").required(),
            ParameterSpec::query("level", ParamKind::Integer, "Unit level"),
            YEARS,
            PAGE,
            PAGE_SIZE,
            LANG,
        ],
    },
    // Statistical localities
    OperationDescriptor {
        name: "get_localities",
        description: "List statistical localities within a commune",
        path: "/units/localities",
        parameters: &[
            ParameterSpec::query("parent_id", ParamKind::String, "Parent unit ID (commune)").required(),
            PAGE,
            PAGE_SIZE,
            LANG,
        ],
    },
    // Variables
    OperationDescriptor {
        name: "get_variables",
        description: "List variables (statistical features), optionally for a subject",
        path: "/variables",
        parameters: &[
            ParameterSpec::query("subject_id", ParamKind::String, "Subject ID"),
            ParameterSpec::query("level", ParamKind::Integer, "Aggregation level"),
            YEARS,
            PAGE,
            PAGE_SIZE,
            SORT_ID_SUBJECT,
            LANG,
        ],
    },
    OperationDescriptor {
        name: "get_variable_by_id",
        description: "Get details of a variable by ID",
        path: "/variables/{id}",
        parameters: &[ParameterSpec::path("id", ParamKind::Integer, "Variable ID"), LANG],
    },
    OperationDescriptor {
        name: "search_variables",
        description: "Search variables by subject, name fragment, level or years",
        path: "/variables/search",
        parameters: &[
            ParameterSpec::query("subject_id", ParamKind::String, "Subject ID"),
            ParameterSpec::query("name", ParamKind::String, "Text to search for in variable names"),
            ParameterSpec::query("level", ParamKind::Integer, "Aggregation level"),
            YEARS,
            PAGE,
            PAGE_SIZE,
            SORT_ID_SUBJECT,
            LANG,
        ],
    },
    // Years
    OperationDescriptor {
        name: "get_years",
        description: "List years for which data is available",
        path: "/years",
        parameters: &[
            ParameterSpec::query("sort", ParamKind::String, "Sort order").one_of(SORT_BY_ID),
            LANG,
        ],
    },
    OperationDescriptor {
        name: "get_year_by_id",
        description: "Get details of a year",
        path: "/years/{id}",
        parameters: &[ParameterSpec::path("id", ParamKind::Integer, "Year"), LANG],
    },
];
