use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use billing_admin_server::{AppState, AuthKeys, database, routes};
use tower::util::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test_secret_key_at_least_32_bytes_long";

/// Valid CPFs (correct check digits) for requests that go through validation.
#[allow(dead_code)]
pub const VALID_CPFS: [&str; 3] = ["52998224725", "11144477735", "12345678909"];

/// Due dates far enough away that a record's status never flips mid-test.
#[allow(dead_code)]
pub const PAST_DATE: &str = "2000-01-01";
#[allow(dead_code)]
pub const FUTURE_DATE: &str = "2999-12-31";

#[derive(Clone)]
pub struct TestConfig {
    pub temp_dir_path: String,
}

impl TestConfig {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let temp_dir_path = temp_dir.path().to_string_lossy().to_string();
        std::mem::forget(temp_dir);
        Ok(Self { temp_dir_path })
    }

    pub fn data_path(&self) -> String {
        self.temp_dir_path.clone()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    let test_config = TestConfig::new()?;

    let main_db = database::init_main_db(&test_config.data_path())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize main database: {}", e))?;

    let app_state = AppState {
        main_db,
        auth: AuthKeys::from_secret(TEST_JWT_SECRET.as_bytes(), 8),
    };

    let router = routes::router(app_state.clone());

    Ok(TestApp {
        router,
        state: app_state,
    })
}

/// Inserts a user directly, bypassing registration, and returns its id.
pub async fn create_test_user(
    app_state: &AppState,
    email: &str,
    password: &str,
) -> anyhow::Result<i64> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString},
    };
    use password_hash::rand_core::OsRng;

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    let conn = app_state.main_db.write().await;
    conn.execute(
        "INSERT INTO users (first_name, last_name, email, password_hash) VALUES (?, ?, ?, ?)",
        ("test", "user", email, hash.as_str()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create test user: {}", e))?;

    Ok(conn.last_insert_rowid())
}

/// Logs in through `/login` and returns the bearer token.
pub async fn login_user(app: &Router, email: &str, password: &str) -> anyhow::Result<String> {
    let payload = serde_json::json!({
        "email": email,
        "password": password
    });

    let (status, body) = json_request(app, "POST", "/login", "", &payload).await?;
    if status != StatusCode::OK {
        anyhow::bail!("login failed with {}: {}", status, body);
    }

    let response: serde_json::Value = serde_json::from_str(&body)?;
    response["token"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("No token in login response"))
}

/// Creates a user and returns a token for it.
#[allow(dead_code)]
pub async fn authenticated_app() -> anyhow::Result<(TestApp, String)> {
    let test_app = setup_test_app().await?;
    create_test_user(&test_app.state, "admin@example.com", "password123").await?;
    let token = login_user(&test_app.router, "admin@example.com", "password123").await?;
    Ok((test_app, token))
}

async fn send(app: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, String)> {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read response body: {}", e))?;
    let body_str = String::from_utf8(body.to_vec())?;

    Ok((status, body_str))
}

fn request_builder(method: &str, uri: &str, token: &str) -> axum::http::request::Builder {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if token.is_empty() {
        builder
    } else {
        builder.header("authorization", format!("Bearer {}", token))
    }
}

/// Sends a body-less request; an empty `token` sends no `Authorization` header.
#[allow(dead_code)]
pub async fn auth_request(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
) -> anyhow::Result<(StatusCode, String)> {
    let request = request_builder(method, uri, token)
        .body(Body::empty())
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;
    send(app, request).await
}

#[allow(dead_code)]
pub async fn json_request(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    payload: &serde_json::Value,
) -> anyhow::Result<(StatusCode, String)> {
    let request = request_builder(method, uri, token)
        .body(Body::from(payload.to_string()))
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;
    send(app, request).await
}

/// Inserts a client directly. `cpf` and `email` only need to be unique.
#[allow(dead_code)]
pub async fn insert_client(
    app_state: &AppState,
    first_name: &str,
    last_name: &str,
    email: &str,
    cpf: &str,
) -> anyhow::Result<i64> {
    let conn = app_state.main_db.write().await;
    conn.execute(
        "INSERT INTO clients (first_name, last_name, email, cpf, phone) VALUES (?, ?, ?, ?, ?)",
        (first_name, last_name, email, cpf, "+5511987654321"),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create test client: {}", e))?;

    Ok(conn.last_insert_rowid())
}

#[allow(dead_code)]
pub async fn insert_record(
    app_state: &AppState,
    client_id: i64,
    description: &str,
    due_date: &str,
    value: f64,
    paid_out: bool,
) -> anyhow::Result<i64> {
    let conn = app_state.main_db.write().await;
    conn.execute(
        "INSERT INTO records (id_clients, description, due_date, value, paid_out) VALUES (?, ?, ?, ?, ?)",
        (client_id, description, due_date, value, i64::from(paid_out)),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create test record: {}", e))?;

    Ok(conn.last_insert_rowid())
}

/// Parses a response body, failing the test on invalid JSON.
#[allow(dead_code)]
pub fn parse_body(body: &str) -> anyhow::Result<serde_json::Value> {
    serde_json::from_str(body).map_err(|e| anyhow::anyhow!("Invalid JSON body {:?}: {}", body, e))
}
