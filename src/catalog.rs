//! Declarative table configuration driving the console forms.
//!
//! Each table lists its editable fields and their kind; the kind decides the
//! widget a form uses and how raw form input is coerced into a JSON payload.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::TabloError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Number,
    Text,
    Json,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    NumberInput,
    TextInput,
    TextArea,
    YesNoSelect,
}

impl FieldKind {
    pub fn widget(self) -> Widget {
        match self {
            FieldKind::Number => Widget::NumberInput,
            FieldKind::Text => Widget::TextInput,
            FieldKind::Json => Widget::TextArea,
            FieldKind::Bool => Widget::YesNoSelect,
        }
    }

    /// Coerce one raw form value. `Ok(None)` means "leave unset".
    pub fn coerce(self, field: &str, raw: &str) -> Result<Option<Value>, TabloError> {
        // text keeps its surrounding whitespace, everything else is parsed trimmed
        let trimmed = raw.trim();
        match self {
            FieldKind::Text if trimmed.is_empty() => Ok(None),
            FieldKind::Text => Ok(Some(Value::String(raw.to_string()))),
            FieldKind::Number if trimmed.is_empty() => Ok(None),
            FieldKind::Number => trimmed
                .parse::<i64>()
                .map(|n| Some(Value::from(n)))
                .map_err(|_| TabloError::Validation(format!("`{field}` must be an integer"))),
            FieldKind::Json if trimmed.is_empty() => Ok(Some(Value::Object(Map::new()))),
            FieldKind::Json => serde_json::from_str(trimmed)
                .map(Some)
                .map_err(|e| TabloError::Validation(format!("`{field}` is not valid JSON: {e}"))),
            FieldKind::Bool => parse_yes_no(trimmed)
                .map(|b| Some(Value::Bool(b)))
                .ok_or_else(|| TabloError::Validation(format!("`{field}` must be yes or no"))),
        }
    }
}

fn parse_yes_no(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "evet" | "on" | "1" => Some(true),
        "" | "false" | "no" | "hayır" | "hayir" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub title: &'static str,
    pub endpoint: &'static str,
    pub key: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Wire shape of a table spec, widgets resolved.
#[derive(Debug, Serialize)]
pub struct TableView {
    pub title: &'static str,
    pub endpoint: &'static str,
    pub key: &'static str,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub kind: FieldKind,
    pub widget: Widget,
}

impl From<&TableSpec> for TableView {
    fn from(spec: &TableSpec) -> Self {
        Self {
            title: spec.title,
            endpoint: spec.endpoint,
            key: spec.key,
            fields: spec
                .fields
                .iter()
                .map(|f| FieldView {
                    name: f.name,
                    kind: f.kind,
                    widget: f.kind.widget(),
                })
                .collect(),
        }
    }
}

impl TableSpec {
    pub fn find(endpoint: &str) -> Result<&'static TableSpec, TabloError> {
        TABLES
            .iter()
            .find(|t| t.endpoint == endpoint)
            .ok_or_else(|| TabloError::UnknownTable(endpoint.to_string()))
    }

    /// Turn raw form inputs into a JSON payload for this table.
    pub fn coerce_form(&self, form: &HashMap<String, String>) -> Result<Value, TabloError> {
        if let Some(unknown) = form
            .keys()
            .find(|k| !self.fields.iter().any(|f| f.name == k.as_str()))
        {
            return Err(TabloError::Validation(format!(
                "`{unknown}` is not a field of {}",
                self.endpoint
            )));
        }

        let mut payload = Map::new();
        for field in self.fields {
            let Some(raw) = form.get(field.name) else {
                continue;
            };
            if let Some(value) = field.kind.coerce(field.name, raw)? {
                payload.insert(field.name.to_string(), value);
            }
        }
        Ok(Value::Object(payload))
    }
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

use FieldKind::{Bool, Json, Number, Text};

pub static TABLES: &[TableSpec] = &[
    TableSpec {
        title: "Roles",
        endpoint: "roles",
        key: "role_id",
        fields: &[
            field("role_id", Number),
            field("role_name", Text),
            field("permissions", Json),
            field("admin_or_not", Bool),
        ],
    },
    TableSpec {
        title: "Users",
        endpoint: "users",
        key: "id",
        fields: &[
            field("role_id", Number),
            field("name", Text),
            field("surname", Text),
            field("password", Text),
            field("e_mail", Text),
            field("institution_working", Text),
            field("status", Bool),
        ],
    },
    TableSpec {
        title: "Database Info",
        endpoint: "database_info",
        key: "database_id",
        fields: &[
            field("database_ip", Text),
            field("database_port", Text),
            field("database_user", Text),
            field("database_password", Text),
            field("database_type", Text),
            field("database_name", Text),
            field("user_id", Number),
        ],
    },
    TableSpec {
        title: "Data Prepare Modules",
        endpoint: "data_prepare_modules",
        key: "module_id",
        fields: &[
            field("module_name", Text),
            field("description", Text),
            field("user_id", Number),
            field("asistan_id", Number),
            field("database_id", Number),
            field("csv_database_id", Number),
        ],
    },
    TableSpec {
        title: "Assistants",
        endpoint: "assistants",
        key: "asistan_id",
        fields: &[
            field("title", Text),
            field("explanation", Text),
            field("parameters", Json),
            field("user_id", Number),
            field("working_place", Text),
            field("default_instructions", Text),
            field("data_instructions", Text),
            field("file_path", Text),
            field("trigger_time", Json),
        ],
    },
    TableSpec {
        title: "Auto Prompt",
        endpoint: "auto_prompt",
        key: "prompt_id",
        fields: &[
            field("prompt_text", Text),
            field("assistants_id", Number),
            field("trigger_time", Json),
            field("mcrisactive", Bool),
        ],
    },
];
