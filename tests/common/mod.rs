//! Shared fixtures for the HTTP integration tests.
//!
//! Every test gets its own in-memory stores, so tests never share users or tasks.
#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test, web,
};
use chrono::Duration;
use serde_json::{json, Value};
use taskgate::auth::{BcryptHasher, TokenService};
use taskgate::repositories::{InMemoryTaskRepository, InMemoryUserRepository};
use taskgate::routes;
use taskgate::services::{TaskService, UserService};

pub const SECRET: &[u8] = b"integration_test_secret";

#[derive(Clone)]
pub struct TestState {
    pub users: web::Data<UserService>,
    pub tasks: web::Data<TaskService>,
    pub tokens: web::Data<TokenService>,
}

impl TestState {
    pub fn new() -> Self {
        let tokens = TokenService::new(SECRET, Duration::minutes(20));
        let users = UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            // Minimum bcrypt cost keeps the suite fast.
            Arc::new(BcryptHasher::with_cost(4)),
            tokens.clone(),
        );
        let tasks = TaskService::new(Arc::new(InMemoryTaskRepository::new()));

        Self {
            users: web::Data::new(users),
            tasks: web::Data::new(tasks),
            tokens: web::Data::new(tokens),
        }
    }

    /// App configuration with this state and every route, for `App::configure`.
    pub fn configure(&self) -> impl FnOnce(&mut web::ServiceConfig) {
        let state = self.clone();
        move |cfg| {
            cfg.app_data(state.users)
                .app_data(state.tasks)
                .app_data(state.tokens);
            routes::config(cfg);
        }
    }
}

/// Sends the request and returns the status with the parsed JSON body
/// (`Value::Null` for an empty body).
pub async fn call<S, B>(app: &S, req: actix_http::Request) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    if body.is_empty() {
        return (status, Value::Null);
    }
    let json = serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "non-JSON body with status {}: {:?}",
            status,
            String::from_utf8_lossy(&body)
        )
    });
    (status, json)
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn register<S, B>(app: &S, username: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    call(app, req).await
}

pub async fn login<S, B>(app: &S, username: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    call(app, req).await
}

/// Registers the user and returns a freshly issued token.
pub async fn token_for<S, B>(app: &S, username: &str, password: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = register(app, username, password).await;
    assert_eq!(status, StatusCode::CREATED, "Registration failed. Body: {}", body);

    let (status, body) = login(app, username, password).await;
    assert_eq!(status, StatusCode::OK, "Login failed. Body: {}", body);
    body["token"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| panic!("login response without token: {}", body))
}

pub fn task_payload(title: &str, status: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{} details", title),
        "due_date": "2026-11-01T12:00:00Z",
        "status": status
    })
}
