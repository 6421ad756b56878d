use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::table::{SqliteQueryAs, Table, Validate, require_text};
use crate::error::TabloError;

/// Serialize a JSON payload value for a TEXT column.
/// Strings that already hold a JSON object or array are stored verbatim.
pub fn json_to_text(value: Option<Value>) -> Result<Option<String>, TabloError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if is_json_document(&s) => Ok(Some(s)),
        Some(v) => Ok(Some(serde_json::to_string(&v)?)),
    }
}

/// Decode a JSON TEXT column; legacy non-JSON text comes back as a string.
pub fn text_to_json(raw: Option<String>) -> Option<Value> {
    raw.map(|s| match serde_json::from_str::<Value>(&s) {
        Ok(v) => v,
        Err(_) => Value::String(s),
    })
}

fn is_json_document(s: &str) -> bool {
    matches!(
        serde_json::from_str::<Value>(s),
        Ok(Value::Object(_) | Value::Array(_))
    )
}

fn json_column(row: &SqliteRow, column: &str) -> Result<Option<Value>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    Ok(text_to_json(raw))
}

const NAIVE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// RFC3339, or `YYYY-MM-DD HH:MM:SS` read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP)
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("unrecognized timestamp `{raw}`"))
}

/// Payload timestamps; blank strings count as absent.
fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_timestamp(&s).map_err(de::Error::custom))
        .transpose()
}

// ---- roles ----

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Role {
    pub role_id: i64,
    pub role_name: String,
    pub permissions: Option<Value>,
    pub admin_or_not: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolePayload {
    pub role_id: Option<i64>,
    pub role_name: Option<String>,
    pub permissions: Option<Value>,
    pub admin_or_not: Option<bool>,
}

impl Validate for RolePayload {
    fn validate(&self) -> Result<(), TabloError> {
        require_text("role_name", self.role_name.as_deref())
    }
}

impl<'r> FromRow<'r, SqliteRow> for Role {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role_id: row.try_get("role_id")?,
            role_name: row.try_get("role_name")?,
            permissions: json_column(row, "permissions")?,
            admin_or_not: row.try_get("admin_or_not")?,
        })
    }
}

impl Table for Role {
    const NAME: &'static str = "roles";
    const KEY: &'static str = "role_id";
    const INSERT_COLUMNS: &'static [&'static str] =
        &["role_id", "role_name", "permissions", "admin_or_not"];
    const UPDATE_ASSIGNMENTS: &'static [&'static str] =
        &["role_name = ?", "permissions = ?", "admin_or_not = ?"];

    type Payload = RolePayload;

    fn bind_insert<'q>(
        p: RolePayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        Ok(query
            .bind(p.role_id)
            .bind(p.role_name)
            .bind(json_to_text(p.permissions)?)
            .bind(p.admin_or_not.unwrap_or(false)))
    }

    fn bind_update<'q>(
        p: RolePayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        Ok(query
            .bind(p.role_name)
            .bind(json_to_text(p.permissions)?)
            .bind(p.admin_or_not.unwrap_or(false)))
    }

    fn key(&self) -> i64 {
        self.role_id
    }

    fn label(&self) -> String {
        format!("{} - {}", self.role_id, self.role_name)
    }
}

// ---- users ----

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub role_id: Option<i64>,
    pub name: String,
    pub surname: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub e_mail: Option<String>,
    pub institution_working: Option<String>,
    pub status: bool,
    pub create_date: Option<DateTime<Utc>>,
    pub change_date: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    pub role_id: Option<i64>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub password: Option<String>,
    pub e_mail: Option<String>,
    pub institution_working: Option<String>,
    pub status: Option<bool>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub change_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub last_login: Option<DateTime<Utc>>,
}

impl Validate for UserPayload {
    fn validate(&self) -> Result<(), TabloError> {
        require_text("name", self.name.as_deref())
    }
}

impl Table for User {
    const NAME: &'static str = "users";
    const KEY: &'static str = "id";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "role_id",
        "name",
        "surname",
        "password",
        "e_mail",
        "institution_working",
        "status",
        "create_date",
        "change_date",
        "last_login",
    ];
    const UPDATE_ASSIGNMENTS: &'static [&'static str] = &[
        "role_id = ?",
        "name = ?",
        "surname = ?",
        "password = COALESCE(?, password)",
        "e_mail = ?",
        "institution_working = ?",
        "status = ?",
        "change_date = ?",
        "last_login = ?",
    ];

    type Payload = UserPayload;

    fn bind_insert<'q>(
        p: UserPayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        let now = Utc::now();
        Ok(query
            .bind(p.role_id)
            .bind(p.name)
            .bind(p.surname)
            .bind(p.password)
            .bind(p.e_mail)
            .bind(p.institution_working)
            .bind(p.status.unwrap_or(true))
            .bind(p.create_date.unwrap_or(now))
            .bind(p.change_date.unwrap_or(now))
            .bind(p.last_login))
    }

    fn bind_update<'q>(
        p: UserPayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        Ok(query
            .bind(p.role_id)
            .bind(p.name)
            .bind(p.surname)
            .bind(p.password)
            .bind(p.e_mail)
            .bind(p.institution_working)
            .bind(p.status.unwrap_or(true))
            .bind(p.change_date.unwrap_or_else(Utc::now))
            .bind(p.last_login))
    }

    fn key(&self) -> i64 {
        self.id
    }

    fn label(&self) -> String {
        format!(
            "{} - {} {} ({})",
            self.id,
            self.name,
            self.surname.as_deref().unwrap_or_default(),
            self.e_mail.as_deref().unwrap_or_default()
        )
    }
}

// ---- database_info ----

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct DatabaseInfo {
    pub database_id: i64,
    pub database_ip: String,
    pub database_port: Option<String>,
    pub database_user: Option<String>,
    #[serde(skip_serializing)]
    pub database_password: Option<String>,
    pub database_type: Option<String>,
    pub database_name: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseInfoPayload {
    pub database_ip: Option<String>,
    pub database_port: Option<String>,
    pub database_user: Option<String>,
    pub database_password: Option<String>,
    pub database_type: Option<String>,
    pub database_name: Option<String>,
    pub user_id: Option<i64>,
}

impl Validate for DatabaseInfoPayload {
    fn validate(&self) -> Result<(), TabloError> {
        require_text("database_ip", self.database_ip.as_deref())
    }
}

impl Table for DatabaseInfo {
    const NAME: &'static str = "database_info";
    const KEY: &'static str = "database_id";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "database_ip",
        "database_port",
        "database_user",
        "database_password",
        "database_type",
        "database_name",
        "user_id",
    ];
    const UPDATE_ASSIGNMENTS: &'static [&'static str] = &[
        "database_ip = ?",
        "database_port = ?",
        "database_user = ?",
        "database_password = COALESCE(?, database_password)",
        "database_type = ?",
        "database_name = ?",
        "user_id = ?",
    ];

    type Payload = DatabaseInfoPayload;

    fn bind_insert<'q>(
        p: DatabaseInfoPayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        Ok(query
            .bind(p.database_ip)
            .bind(p.database_port)
            .bind(p.database_user)
            .bind(p.database_password)
            .bind(p.database_type)
            .bind(p.database_name)
            .bind(p.user_id))
    }

    fn bind_update<'q>(
        p: DatabaseInfoPayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        // same column order as the insert
        Self::bind_insert(p, query)
    }

    fn key(&self) -> i64 {
        self.database_id
    }

    fn label(&self) -> String {
        let name = self.database_name.as_deref().unwrap_or(&self.database_ip);
        match self.database_type.as_deref() {
            Some(kind) => format!("{} - {} ({})", self.database_id, name, kind),
            None => format!("{} - {}", self.database_id, name),
        }
    }
}

// ---- data_prepare_modules ----

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct DataPrepareModule {
    pub module_id: i64,
    pub module_name: String,
    pub description: Option<String>,
    pub user_id: Option<i64>,
    pub asistan_id: Option<i64>,
    pub database_id: Option<i64>,
    pub csv_database_id: Option<i64>,
    pub create_date: Option<DateTime<Utc>>,
    pub change_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataPrepareModulePayload {
    pub module_name: Option<String>,
    pub description: Option<String>,
    pub user_id: Option<i64>,
    pub asistan_id: Option<i64>,
    pub database_id: Option<i64>,
    pub csv_database_id: Option<i64>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub change_date: Option<DateTime<Utc>>,
}

impl Validate for DataPrepareModulePayload {
    fn validate(&self) -> Result<(), TabloError> {
        require_text("module_name", self.module_name.as_deref())
    }
}

impl Table for DataPrepareModule {
    const NAME: &'static str = "data_prepare_modules";
    const KEY: &'static str = "module_id";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "module_name",
        "description",
        "user_id",
        "asistan_id",
        "database_id",
        "csv_database_id",
        "create_date",
        "change_date",
    ];
    const UPDATE_ASSIGNMENTS: &'static [&'static str] = &[
        "module_name = ?",
        "description = ?",
        "user_id = ?",
        "asistan_id = ?",
        "database_id = ?",
        "csv_database_id = ?",
        "create_date = COALESCE(?, create_date)",
        "change_date = ?",
    ];

    type Payload = DataPrepareModulePayload;

    fn bind_insert<'q>(
        p: DataPrepareModulePayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        let now = Utc::now();
        Ok(query
            .bind(p.module_name)
            .bind(p.description)
            .bind(p.user_id)
            .bind(p.asistan_id)
            .bind(p.database_id)
            .bind(p.csv_database_id)
            .bind(p.create_date.unwrap_or(now))
            .bind(p.change_date.unwrap_or(now)))
    }

    fn bind_update<'q>(
        p: DataPrepareModulePayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        Ok(query
            .bind(p.module_name)
            .bind(p.description)
            .bind(p.user_id)
            .bind(p.asistan_id)
            .bind(p.database_id)
            .bind(p.csv_database_id)
            .bind(p.create_date)
            .bind(p.change_date.unwrap_or_else(Utc::now)))
    }

    fn key(&self) -> i64 {
        self.module_id
    }

    fn label(&self) -> String {
        format!("{} - {}", self.module_id, self.module_name)
    }
}

// ---- assistants ----

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Assistant {
    pub asistan_id: i64,
    pub title: String,
    pub explanation: Option<String>,
    pub parameters: Option<Value>,
    pub user_id: Option<i64>,
    pub create_date: Option<DateTime<Utc>>,
    pub change_date: Option<DateTime<Utc>>,
    pub working_place: Option<String>,
    pub default_instructions: Option<String>,
    pub data_instructions: Option<String>,
    pub file_path: Option<String>,
    pub trigger_time: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantPayload {
    pub title: Option<String>,
    pub explanation: Option<String>,
    pub parameters: Option<Value>,
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub change_date: Option<DateTime<Utc>>,
    pub working_place: Option<String>,
    pub default_instructions: Option<String>,
    pub data_instructions: Option<String>,
    pub file_path: Option<String>,
    pub trigger_time: Option<Value>,
}

impl Validate for AssistantPayload {
    fn validate(&self) -> Result<(), TabloError> {
        require_text("title", self.title.as_deref())
    }
}

impl<'r> FromRow<'r, SqliteRow> for Assistant {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            asistan_id: row.try_get("asistan_id")?,
            title: row.try_get("title")?,
            explanation: row.try_get("explanation")?,
            parameters: json_column(row, "parameters")?,
            user_id: row.try_get("user_id")?,
            create_date: row.try_get("create_date")?,
            change_date: row.try_get("change_date")?,
            working_place: row.try_get("working_place")?,
            default_instructions: row.try_get("default_instructions")?,
            data_instructions: row.try_get("data_instructions")?,
            file_path: row.try_get("file_path")?,
            trigger_time: json_column(row, "trigger_time")?,
        })
    }
}

impl Table for Assistant {
    const NAME: &'static str = "assistants";
    const KEY: &'static str = "asistan_id";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "title",
        "explanation",
        "parameters",
        "user_id",
        "create_date",
        "change_date",
        "working_place",
        "default_instructions",
        "data_instructions",
        "file_path",
        "trigger_time",
    ];
    const UPDATE_ASSIGNMENTS: &'static [&'static str] = &[
        "title = ?",
        "explanation = ?",
        "parameters = ?",
        "user_id = ?",
        "create_date = COALESCE(?, create_date)",
        "change_date = ?",
        "working_place = ?",
        "default_instructions = ?",
        "data_instructions = ?",
        "file_path = ?",
        "trigger_time = ?",
    ];

    type Payload = AssistantPayload;

    fn bind_insert<'q>(
        p: AssistantPayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        let now = Utc::now();
        let create_date = p.create_date.unwrap_or(now);
        Self::bind_fields(p, Some(create_date), now, query)
    }

    fn bind_update<'q>(
        p: AssistantPayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        let create_date = p.create_date;
        Self::bind_fields(p, create_date, Utc::now(), query)
    }

    fn key(&self) -> i64 {
        self.asistan_id
    }

    fn label(&self) -> String {
        format!("{} - {}", self.asistan_id, self.title)
    }
}

impl Assistant {
    fn bind_fields<'q>(
        p: AssistantPayload,
        create_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        Ok(query
            .bind(p.title)
            .bind(p.explanation)
            .bind(json_to_text(p.parameters)?)
            .bind(p.user_id)
            .bind(create_date)
            .bind(p.change_date.unwrap_or(now))
            .bind(p.working_place)
            .bind(p.default_instructions)
            .bind(p.data_instructions)
            .bind(p.file_path)
            .bind(json_to_text(p.trigger_time)?))
    }
}

// ---- auto_prompt ----

const PROMPT_LABEL_CHARS: usize = 40;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AutoPrompt {
    pub prompt_id: i64,
    pub prompt_text: String,
    pub assistants_id: Option<i64>,
    pub trigger_time: Option<Value>,
    pub mcrisactive: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutoPromptPayload {
    pub prompt_text: Option<String>,
    pub assistants_id: Option<i64>,
    pub trigger_time: Option<Value>,
    pub mcrisactive: Option<bool>,
}

impl Validate for AutoPromptPayload {
    fn validate(&self) -> Result<(), TabloError> {
        require_text("prompt_text", self.prompt_text.as_deref())
    }
}

impl<'r> FromRow<'r, SqliteRow> for AutoPrompt {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            prompt_id: row.try_get("prompt_id")?,
            prompt_text: row.try_get("prompt_text")?,
            assistants_id: row.try_get("assistants_id")?,
            trigger_time: json_column(row, "trigger_time")?,
            mcrisactive: row.try_get("mcrisactive")?,
        })
    }
}

impl Table for AutoPrompt {
    const NAME: &'static str = "auto_prompt";
    const KEY: &'static str = "prompt_id";
    const INSERT_COLUMNS: &'static [&'static str] =
        &["prompt_text", "assistants_id", "trigger_time", "mcrisactive"];
    const UPDATE_ASSIGNMENTS: &'static [&'static str] = &[
        "prompt_text = ?",
        "assistants_id = ?",
        "trigger_time = ?",
        "mcrisactive = ?",
    ];

    type Payload = AutoPromptPayload;

    fn bind_insert<'q>(
        p: AutoPromptPayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        Ok(query
            .bind(p.prompt_text)
            .bind(p.assistants_id)
            .bind(json_to_text(p.trigger_time)?)
            .bind(p.mcrisactive.unwrap_or(false)))
    }

    fn bind_update<'q>(
        p: AutoPromptPayload,
        query: SqliteQueryAs<'q, Self>,
    ) -> Result<SqliteQueryAs<'q, Self>, TabloError> {
        Self::bind_insert(p, query)
    }

    fn key(&self) -> i64 {
        self.prompt_id
    }

    fn label(&self) -> String {
        let mut text: String = self.prompt_text.chars().take(PROMPT_LABEL_CHARS).collect();
        if self.prompt_text.chars().count() > PROMPT_LABEL_CHARS {
            text.push_str("...");
        }
        format!("{} - {}", self.prompt_id, text)
    }
}
