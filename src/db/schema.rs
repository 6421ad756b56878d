//! SQL DDL for initializing the console database.
//! SQLite-first design; statements are split on `;`, so comments must not contain one.

/// SQLite schema with:
/// - one INTEGER PRIMARY KEY per table (rowid alias, assigned when NULL is inserted)
/// - JSON columns stored as TEXT
/// - booleans stored as INTEGER 0/1
/// - timestamps stored as RFC3339 TEXT
/// - foreign keys between owners, assistants and connection records
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    role_id INTEGER PRIMARY KEY,
    role_name TEXT NOT NULL UNIQUE,
    permissions TEXT NULL, -- JSON
    admin_or_not INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    role_id INTEGER NULL REFERENCES roles(role_id) ON DELETE RESTRICT,
    name TEXT NOT NULL,
    surname TEXT NULL,
    password TEXT NULL,
    e_mail TEXT NULL UNIQUE,
    institution_working TEXT NULL,
    status INTEGER NOT NULL DEFAULT 1,
    create_date TEXT NULL,
    change_date TEXT NULL,
    last_login TEXT NULL
);

CREATE TABLE IF NOT EXISTS database_info (
    database_id INTEGER PRIMARY KEY AUTOINCREMENT,
    database_ip TEXT NOT NULL,
    database_port TEXT NULL,
    database_user TEXT NULL,
    database_password TEXT NULL,
    database_type TEXT NULL,
    database_name TEXT NULL,
    user_id INTEGER NULL REFERENCES users(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS assistants (
    asistan_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    explanation TEXT NULL,
    parameters TEXT NULL, -- JSON
    user_id INTEGER NULL REFERENCES users(id) ON DELETE SET NULL,
    create_date TEXT NULL,
    change_date TEXT NULL,
    working_place TEXT NULL,
    default_instructions TEXT NULL,
    data_instructions TEXT NULL,
    file_path TEXT NULL,
    trigger_time TEXT NULL -- JSON
);

CREATE TABLE IF NOT EXISTS data_prepare_modules (
    module_id INTEGER PRIMARY KEY AUTOINCREMENT,
    module_name TEXT NOT NULL,
    description TEXT NULL,
    user_id INTEGER NULL REFERENCES users(id) ON DELETE SET NULL,
    asistan_id INTEGER NULL REFERENCES assistants(asistan_id) ON DELETE SET NULL,
    database_id INTEGER NULL REFERENCES database_info(database_id) ON DELETE SET NULL,
    csv_database_id INTEGER NULL REFERENCES database_info(database_id) ON DELETE SET NULL,
    create_date TEXT NULL,
    change_date TEXT NULL
);

CREATE TABLE IF NOT EXISTS auto_prompt (
    prompt_id INTEGER PRIMARY KEY AUTOINCREMENT,
    prompt_text TEXT NOT NULL,
    assistants_id INTEGER NULL REFERENCES assistants(asistan_id) ON DELETE CASCADE,
    trigger_time TEXT NULL, -- JSON
    mcrisactive INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_users_role_id ON users(role_id);
CREATE INDEX IF NOT EXISTS idx_auto_prompt_assistants_id ON auto_prompt(assistants_id);
"#;
