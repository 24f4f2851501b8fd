//! Integration test harness for TicketSlave.
//!
//! Builds the real application router over a scratch SQLite database and
//! drives it with in-process requests, carrying the session cookie between
//! calls the way a browser would.
//!
//! ```rust,ignore
//! let app = TestApp::spawn().await;
//! let cookie = app.register_and_login("alice", "password1").await;
//! let res = app.request(TestApp::get("/tickets", Some(&cookie))).await;
//! assert_eq!(res.status(), StatusCode::OK);
//! ```

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use ticketslave_core::{QueueId, Role, UserId, Username};
use ticketslave_server::config::ServerConfig;
use ticketslave_server::db::{QueueRepository, UserRepository};
use ticketslave_server::state::AppState;
use ticketslave_server::{app, db, middleware};

/// A fully assembled application over scratch storage.
pub struct TestApp {
    router: Router,
    pub pool: SqlitePool,
    pub state: AppState,
    _tmp: TempDir,
}

impl TestApp {
    /// Build the app: scratch database, migrations, session store, router.
    ///
    /// # Panics
    ///
    /// Panics on any setup failure; tests have nothing useful to do then.
    pub async fn spawn() -> Self {
        let tmp = TempDir::new().expect("create tempdir");

        let config = ServerConfig {
            database_path: tmp.path().join("test.db"),
            host: "127.0.0.1".parse().expect("parse host"),
            port: 0,
            base_url: "http://localhost".to_string(),
            session_secret: SecretString::from("0123456789abcdef0123456789abcdef"),
            upload_dir: tmp.path().join("uploads"),
            max_upload_bytes: 64 * 1024,
            allowed_extensions: ["log", "pdf", "png", "txt"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            allow_reopen: true,
            sentry_dsn: None,
        };

        let pool = db::create_pool(&config.database_path)
            .await
            .expect("create pool");
        db::MIGRATOR.run(&pool).await.expect("run migrations");

        let session_layer = middleware::create_session_layer(&pool, &config)
            .await
            .expect("create session layer");

        let state = AppState::new(config, pool.clone());
        let router = app(state.clone(), session_layer);

        Self {
            router,
            pool,
            state,
            _tmp: tmp,
        }
    }

    /// Send one request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the service fails (it is infallible in practice).
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router call")
    }

    /// Build a GET request, optionally with a session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[must_use]
    pub fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::empty()).expect("build request")
    }

    /// Build a JSON request with the given method.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[must_use]
    pub fn json(method: &str, path: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("build request")
    }

    /// Build a bodyless request with the given method.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[must_use]
    pub fn bodyless(method: &str, path: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::empty()).expect("build request")
    }

    /// Build a multipart upload request with a single `file` field.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[must_use]
    pub fn multipart(
        path: &str,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
        cookie: &str,
    ) -> Request<Body> {
        const BOUNDARY: &str = "ts-test-boundary";

        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(path)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(COOKIE, cookie)
            .body(Body::from(body))
            .expect("build request")
    }

    /// Read a response body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON.
    pub async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("parse json body")
    }

    /// Read a response body as raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if the body cannot be read.
    pub async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body")
            .to_vec()
    }

    /// Extract the session cookie pair from a login response.
    ///
    /// # Panics
    ///
    /// Panics if the response carries no Set-Cookie header.
    #[must_use]
    pub fn session_cookie(response: &Response) -> String {
        response
            .headers()
            .get(SET_COOKIE)
            .expect("response sets a session cookie")
            .to_str()
            .expect("cookie is ascii")
            .split(';')
            .next()
            .expect("cookie has a name=value pair")
            .to_string()
    }

    /// Register a user and log them in, returning the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if registration or login fails.
    pub async fn register_and_login(&self, username: &str, password: &str) -> String {
        let body = serde_json::json!({ "username": username, "password": password });

        let res = self.request(Self::json("POST", "/register", &body, None)).await;
        assert_eq!(res.status(), StatusCode::CREATED, "registration failed");

        self.login(username, password).await
    }

    /// Log an existing user in, returning the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if login fails.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let body = serde_json::json!({ "username": username, "password": password });
        let res = self.request(Self::json("POST", "/login", &body, None)).await;
        assert_eq!(res.status(), StatusCode::OK, "login failed");
        Self::session_cookie(&res)
    }

    /// Create a queue directly through the repository (skips the admin
    /// endpoint so non-admin scenarios can seed data).
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn seed_queue(&self, name: &str) -> QueueId {
        QueueRepository::new(&self.pool)
            .create(name, "")
            .await
            .expect("create queue")
            .id
    }

    /// Promote a user to admin directly through the repository.
    ///
    /// # Panics
    ///
    /// Panics if the user does not exist.
    pub async fn promote_to_admin(&self, username: &str) {
        let repo = UserRepository::new(&self.pool);
        let user = repo
            .get_by_username(&Username::parse(username).expect("valid username"))
            .await
            .expect("query user")
            .expect("user exists");
        repo.update_role(user.id, Role::Admin)
            .await
            .expect("update role");
    }

    /// Look up a user's id by name.
    ///
    /// # Panics
    ///
    /// Panics if the user does not exist.
    pub async fn user_id(&self, username: &str) -> UserId {
        UserRepository::new(&self.pool)
            .get_by_username(&Username::parse(username).expect("valid username"))
            .await
            .expect("query user")
            .expect("user exists")
            .id
    }
}
