use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::{
    fs,
    path::PathBuf,
    sync::Arc,
    sync::atomic::{AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};
use tablo::db::TabloStorage;
use tablo::router::{TabloState, tablo_router};
use tower::ServiceExt;

static DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TestConsole {
    app: Router,
    storage: TabloStorage,
    path: PathBuf,
}

impl Drop for TestConsole {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

async fn console(console_key: Option<&str>) -> TestConsole {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut path = std::env::temp_dir();
    path.push(format!(
        "tablo-console-{}-{}-{}.sqlite",
        std::process::id(),
        nanos,
        DB_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let database_url = format!("sqlite:{}", path.display());
    let storage = TabloStorage::connect(&database_url, 1)
        .await
        .expect("failed to open test database");
    let state = TabloState::new(storage.clone(), console_key.map(Arc::<str>::from));
    TestConsole {
        app: tablo_router(state),
        storage,
        path,
    }
}

impl TestConsole {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");
        self.call(request).await
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let resp = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&body).into_owned())
            })
        };
        (status, value)
    }
}

#[tokio::test]
async fn roles_round_trip_through_every_operation() {
    let c = console(None).await;

    let (status, role) = c
        .send(
            "POST",
            "/roles",
            Some(json!({
                "role_name": "analyst",
                "permissions": {"read": true, "write": false},
                "admin_or_not": false
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = role["role_id"].as_i64().expect("role_id assigned");
    assert_eq!(role["permissions"], json!({"read": true, "write": false}));

    let (status, list) = c.send("GET", "/roles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, updated) = c
        .send(
            "PUT",
            &format!("/roles/{id}"),
            Some(json!({"role_name": "admin", "permissions": "{\"all\":true}", "admin_or_not": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role_name"], "admin");
    assert_eq!(updated["permissions"], json!({"all": true}));
    assert_eq!(updated["admin_or_not"], true);

    let (status, fetched) = c.send("GET", &format!("/roles/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, updated);

    let (status, deleted) = c.send("DELETE", &format!("/roles/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({"status": "deleted", "id": id}));

    let (status, err) = c.send("GET", &format!("/roles/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"]["code"], "NOT_FOUND");

    let (status, _) = c.send("DELETE", &format!("/roles/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn client_supplied_role_id_is_kept() {
    let c = console(None).await;
    let (status, role) = c
        .send("POST", "/roles", Some(json!({"role_id": 42, "role_name": "ops"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(role["role_id"], 42);
    assert_eq!(role["admin_or_not"], false);
}

#[tokio::test]
async fn duplicate_role_name_conflicts() {
    let c = console(None).await;
    let body = json!({"role_name": "viewer"});
    let (status, _) = c.send("POST", "/roles", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = c.send("POST", "/roles", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn missing_required_field_is_rejected() {
    let c = console(None).await;
    let (status, err) = c
        .send("POST", "/users", Some(json!({"surname": "Nobody"})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "VALIDATION_FAILED");

    let (_, list) = c.send("GET", "/users", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn users_hide_password_and_keep_it_on_update() {
    let c = console(None).await;
    let (_, role) = c
        .send("POST", "/roles", Some(json!({"role_name": "staff"})))
        .await;

    let (status, user) = c
        .send(
            "POST",
            "/users",
            Some(json!({
                "role_id": role["role_id"],
                "name": "Ada",
                "surname": "Lovelace",
                "password": "s3cret",
                "e_mail": "ada@example.com"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(user.get("password").is_none());
    assert_eq!(user["status"], true);
    assert!(user["create_date"].is_string());
    let id = user["id"].as_i64().unwrap();

    let (status, updated) = c
        .send(
            "PUT",
            &format!("/users/{id}"),
            Some(json!({"name": "Ada", "surname": "King", "e_mail": "ada@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["surname"], "King");
    assert_eq!(updated["role_id"], Value::Null);

    let (password,): (Option<String>,) = sqlx::query_as("SELECT password FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(c.storage.pool())
        .await
        .unwrap();
    assert_eq!(password.as_deref(), Some("s3cret"));

    let (status, options) = c.send("GET", "/users/options", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        options,
        json!([{"id": id, "label": format!("{id} - Ada King (ada@example.com)")}])
    );
}

#[tokio::test]
async fn dangling_reference_is_rejected() {
    let c = console(None).await;
    let (status, err) = c
        .send("POST", "/users", Some(json!({"name": "Ghost", "role_id": 999})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "INVALID_REFERENCE");
}

#[tokio::test]
async fn referenced_role_cannot_be_deleted() {
    let c = console(None).await;
    let (_, role) = c
        .send("POST", "/roles", Some(json!({"role_name": "staff"})))
        .await;
    let role_id = role["role_id"].as_i64().unwrap();
    let (status, _) = c
        .send("POST", "/users", Some(json!({"name": "Bea", "role_id": role_id})))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = c.send("DELETE", &format!("/roles/{role_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn deleting_an_assistant_removes_its_prompts() {
    let c = console(None).await;
    let (status, assistant) = c
        .send(
            "POST",
            "/assistants",
            Some(json!({
                "title": "Sales digest",
                "parameters": {"temperature": 0.2},
                "trigger_time": {"cron": "0 9 * * 1"}
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(assistant["parameters"], json!({"temperature": 0.2}));
    let asistan_id = assistant["asistan_id"].as_i64().unwrap();

    let (status, prompt) = c
        .send(
            "POST",
            "/auto_prompt",
            Some(json!({"prompt_text": "Weekly numbers", "assistants_id": asistan_id, "mcrisactive": true})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(prompt["mcrisactive"], true);

    let (status, _) = c
        .send("DELETE", &format!("/assistants/{asistan_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, prompts) = c.send("GET", "/auto_prompt", None).await;
    assert_eq!(prompts, json!([]));
}

#[tokio::test]
async fn modules_link_to_connections_and_assistants() {
    let c = console(None).await;
    let (status, db) = c
        .send(
            "POST",
            "/database_info",
            Some(json!({
                "database_ip": "10.0.0.5",
                "database_port": "5432",
                "database_password": "hunter2",
                "database_type": "postgres",
                "database_name": "sales"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(db.get("database_password").is_none());
    let database_id = db["database_id"].as_i64().unwrap();

    let (status, module) = c
        .send(
            "POST",
            "/data_prepare_modules",
            Some(json!({
                "module_name": "clean orders",
                "database_id": database_id,
                "csv_database_id": database_id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let module_id = module["module_id"].as_i64().unwrap();

    let (status, _) = c
        .send("DELETE", &format!("/database_info/{database_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, module) = c
        .send("GET", &format!("/data_prepare_modules/{module_id}"), None)
        .await;
    assert_eq!(module["database_id"], Value::Null);
    assert_eq!(module["csv_database_id"], Value::Null);
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let c = console(None).await;
    let (status, err) = c
        .send("PUT", "/assistants/77", Some(json!({"title": "nothing here"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"]["message"], "assistants row 77 not found");
}

#[tokio::test]
async fn catalog_describes_every_table() {
    let c = console(None).await;
    let (status, tables) = c.send("GET", "/tables", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = tables
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["title"].as_str())
        .collect();
    assert_eq!(
        titles,
        [
            "Roles",
            "Users",
            "Database Info",
            "Data Prepare Modules",
            "Assistants",
            "Auto Prompt"
        ]
    );

    let (status, users) = c.send("GET", "/tables/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["key"], "id");

    let (status, err) = c.send("GET", "/tables/students", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"]["code"], "UNKNOWN_TABLE");
}

#[tokio::test]
async fn forms_are_coerced_before_writing() {
    let c = console(None).await;
    let (status, assistant) = c
        .send(
            "POST",
            "/forms/assistants",
            Some(json!({"title": "Helper", "parameters": "", "user_id": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(assistant["parameters"], json!({}));
    let asistan_id = assistant["asistan_id"].as_i64().unwrap();

    let (status, prompt) = c
        .send(
            "POST",
            "/forms/auto_prompt",
            Some(json!({
                "prompt_text": "Daily report",
                "assistants_id": asistan_id.to_string(),
                "trigger_time": "{\"hour\": 8}",
                "mcrisactive": "Evet"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(prompt["assistants_id"], asistan_id);
    assert_eq!(prompt["trigger_time"], json!({"hour": 8}));
    assert_eq!(prompt["mcrisactive"], true);
    let prompt_id = prompt["prompt_id"].as_i64().unwrap();

    let (status, prompt) = c
        .send(
            "PUT",
            &format!("/forms/auto_prompt/{prompt_id}"),
            Some(json!({"prompt_text": "Daily report", "mcrisactive": "Hayır"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prompt["mcrisactive"], false);
    assert_eq!(prompt["assistants_id"], Value::Null);

    let (status, err) = c
        .send(
            "POST",
            "/forms/auto_prompt",
            Some(json!({"prompt_text": "x", "trigger_time": "{broken"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn console_key_guards_everything_but_health() {
    let c = console(Some("pwd")).await;

    let (status, err) = c.send("GET", "/roles", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"]["code"], "UNAUTHORIZED");

    let (status, _) = c.send("GET", "/roles?key=pwd", None).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method("GET")
        .uri("/tables")
        .header("x-console-key", "pwd")
        .body(Body::empty())
        .expect("failed to build request");
    let (status, _) = c.call(request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, health) = c.send("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health, json!({"status": "ok", "database": "up"}));
}

#[tokio::test]
async fn malformed_bodies_and_paths_use_the_error_envelope() {
    let c = console(None).await;

    let (status, err) = c
        .send("POST", "/roles", Some(json!({"role_id": "4", "role_name": "x"})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "VALIDATION_FAILED");

    let (status, err) = c.send("GET", "/roles/abc", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "VALIDATION_FAILED");

    let request = Request::builder()
        .method("POST")
        .uri("/roles")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("failed to build request");
    let (status, err) = c.call(request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn naive_timestamps_are_read_as_utc() {
    let c = console(None).await;
    let (status, user) = c
        .send(
            "POST",
            "/users",
            Some(json!({"name": "Grace", "create_date": "2025-01-01 12:00:00"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = user["create_date"].as_str().expect("create_date present");
    assert!(created.starts_with("2025-01-01T12:00:00"), "{created}");

    let (status, module) = c
        .send(
            "POST",
            "/data_prepare_modules",
            Some(json!({"module_name": "nightly", "create_date": "2025-03-04T07:06:07+02:00"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(
        module["create_date"]
            .as_str()
            .is_some_and(|d| d.starts_with("2025-03-04T05:06:07"))
    );
}

#[tokio::test]
async fn form_passwords_keep_their_whitespace() {
    let c = console(None).await;
    let (status, user) = c
        .send(
            "POST",
            "/forms/users",
            Some(json!({"name": "Linus", "surname": "  ", "password": "  pw  "})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["surname"], Value::Null);
    let id = user["id"].as_i64().unwrap();

    let (password,): (Option<String>,) = sqlx::query_as("SELECT password FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(c.storage.pool())
        .await
        .unwrap();
    assert_eq!(password.as_deref(), Some("  pw  "));
}

#[tokio::test]
async fn health_reports_unreachable_database() {
    let c = console(None).await;
    c.storage.pool().close().await;

    let (status, err) = c.send("GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err["error"]["code"], "DATABASE_UNAVAILABLE");
}

#[tokio::test]
async fn bearer_key_and_unknown_form_table() {
    let c = console(Some("pwd")).await;

    let request = Request::builder()
        .method("GET")
        .uri("/roles")
        .header("authorization", "Bearer pwd")
        .body(Body::empty())
        .expect("failed to build request");
    let (status, roles) = c.call(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roles, json!([]));

    let request = Request::builder()
        .method("GET")
        .uri("/roles")
        .header("authorization", "Bearer wrong")
        .body(Body::empty())
        .expect("failed to build request");
    let (status, _) = c.call(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, err) = c
        .send("POST", "/forms/students?key=pwd", Some(json!({"name": "x"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"]["code"], "UNKNOWN_TABLE");
}
