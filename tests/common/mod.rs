#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt as _;

use ticket_desk::{
    app,
    config::{AdminConfig, HttpConfig, SecurityConfig, SessionConfig},
    models::{ticket, Ticket},
    services::{accounts, InMemoryStore, Store},
    views::Views,
    AppState,
};

pub const PASSWORD: &str = "password";

/// The application wired to an in-memory store.
pub struct TestApp {
    router: Router,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState {
            store: store.clone(),
            views: Views::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates")),
            security: SecurityConfig { bcrypt_cost: 4 },
        };
        let http = HttpConfig {
            max_body_size: 1024 * 1024,
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string(),
        };

        Self {
            router: app(state, &SessionConfig::default(), &http),
            store,
        }
    }

    pub fn client(&self) -> Client {
        Client {
            router: self.router.clone(),
            cookie: Mutex::new(None),
        }
    }

    /// A signed-in client for a fresh ordinary user.
    pub async fn user(&self, username: &str) -> Client {
        let client = self.client();
        let response = client
            .register(username, &format!("{username}@example.com"), PASSWORD)
            .await;
        assert_eq!(response.notice_level().as_deref(), Some("success"), "{response:?}");
        client
    }

    /// A signed-in client for a fresh administrator.
    pub async fn admin(&self, username: &str) -> Client {
        let email = format!("{username}@example.com");
        let config = AdminConfig {
            username: username.to_string(),
            email: email.clone(),
            password: PASSWORD.to_string(),
        };
        accounts::ensure_admin(self.store.as_ref(), &config, 4)
            .await
            .expect("failed to create admin");

        let client = self.client();
        let response = client.login(&email, PASSWORD).await;
        assert_eq!(response.notice_level().as_deref(), Some("success"), "{response:?}");
        client
    }

    pub async fn ticket(&self, id: i64) -> Ticket {
        self.store
            .get_ticket(ticket::Id(id))
            .await
            .expect("store failed")
            .expect("ticket not found")
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// Location without its query string.
    pub fn path(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(|location| location.split('?').next().unwrap_or(location))
    }

    fn query_param(&self, name: &str) -> Option<String> {
        let (_, query) = self.location.as_deref()?.split_once('?')?;
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| urlencoding::decode(value).expect("bad encoding").into_owned())
        })
    }

    pub fn notice(&self) -> Option<String> {
        self.query_param("notice")
    }

    pub fn notice_level(&self) -> Option<String> {
        self.query_param("level")
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response is not JSON")
    }
}

/// Sends requests to the router, carrying the session cookie like a browser.
pub struct Client {
    router: Router,
    cookie: Mutex<Option<String>>,
}

impl Client {
    async fn send(&self, method: Method, path: &str, form: Option<&[(&str, &str)]>) -> TestResponse {
        let mut request = Request::builder().method(method).uri(path);
        if let Some(cookie) = self.cookie.lock().unwrap().clone() {
            request = request.header(header::COOKIE, cookie);
        }

        let request = match form {
            Some(fields) => request
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(encode_form(fields))),
            None => request.body(Body::empty()),
        }
        .expect("failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router failed");

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str().expect("bad cookie");
            let mut cookie = self.cookie.lock().unwrap();
            *cookie = if set_cookie.contains("Max-Age=0") {
                None
            } else {
                set_cookie.split(';').next().map(str::to_string)
            };
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().expect("bad location").to_string());
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");

        TestResponse {
            status,
            location,
            body: String::from_utf8(body.to_vec()).expect("body is not UTF-8"),
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        self.send(Method::POST, path, Some(form)).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> TestResponse {
        self.post(
            "/register",
            &[("username", username), ("email", email), ("password", password)],
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post("/login", &[("email", email), ("password", password)]).await
    }

    pub async fn create_ticket(&self, title: &str, content: &str, deadline: &str) -> TestResponse {
        self.post(
            "/tickets/new",
            &[("title", title), ("content", content), ("deadline", deadline)],
        )
        .await
    }

    pub async fn api_tickets(&self, query: &str) -> serde_json::Value {
        let response = self.get(&format!("/api/tickets{query}")).await;
        assert_eq!(response.status, StatusCode::OK, "{response:?}");
        response.json()
    }
}

fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}
