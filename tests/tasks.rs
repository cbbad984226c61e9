mod common;

use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, App, HttpServer};
use common::{bearer, call, task_payload, token_for, TestState};
use pretty_assertions::assert_eq;
use serde_json::Value;

/// Admin token for `alice` and a plain user token for `bob`.
async fn admin_and_user<S, B>(app: &S) -> (String, String)
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let admin = token_for(app, "alice", "pw1").await;
    let user = token_for(app, "bob", "pw2").await;
    (admin, user)
}

#[test_log::test(actix_rt::test)]
async fn test_create_task_canonicalises_status() {
    let state = TestState::new();
    let app = test::init_service(App::new().configure(state.configure())).await;
    let (admin, user) = admin_and_user(&app).await;

    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(bearer(&admin))
        .set_json(task_payload("Write report", "PENDING"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let created: Value = test::read_body_json(resp).await;

    let id = created["id"].as_str().unwrap();
    assert_eq!(location, Some(format!("/tasks/{}", id)));
    assert_eq!(created["title"], "Write report");
    assert_eq!(created["status"], "pending");

    let req = test::TestRequest::get()
        .uri(&format!("/tasks/{}", id))
        .insert_header(bearer(&user))
        .to_request();
    let (status, fetched) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let req = test::TestRequest::get()
        .uri("/tasks")
        .insert_header(bearer(&user))
        .to_request();
    let (status, listed) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, Value::Array(vec![created]));
}

#[test_log::test(actix_rt::test)]
async fn test_unknown_status_is_rejected_without_writing() {
    let state = TestState::new();
    let app = test::init_service(App::new().configure(state.configure())).await;
    let (admin, _) = admin_and_user(&app).await;

    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(bearer(&admin))
        .set_json(task_payload("Archive me", "archived"))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_status");

    assert!(state.tasks.get_all().await.unwrap().is_empty());
}

#[test_log::test(actix_rt::test)]
async fn test_update_and_delete_task() {
    let state = TestState::new();
    let app = test::init_service(App::new().configure(state.configure())).await;
    let (admin, user) = admin_and_user(&app).await;

    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(bearer(&admin))
        .set_json(task_payload("Write report", "pending"))
        .to_request();
    let (_, created) = call(&app, req).await;
    let uri = format!("/tasks/{}", created["id"].as_str().unwrap());

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&admin))
        .set_json(task_payload("Send report", "In Progress"))
        .to_request();
    let (status, updated) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["title"], "Send report");
    assert_eq!(updated["status"], "in progress");

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&admin))
        .set_json(task_payload("Send report", "done"))
        .to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&user))
        .to_request();
    let (_, current) = call(&app, req).await;
    assert_eq!(current, updated);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&admin))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    for req in [
        test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(&user))
            .to_request(),
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&admin))
            .to_request(),
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&admin))
            .set_json(task_payload("Gone", "pending"))
            .to_request(),
    ] {
        let (status, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "task not found");
    }
}

#[test_log::test(actix_rt::test)]
async fn test_invalid_task_id() {
    let state = TestState::new();
    let app = test::init_service(App::new().configure(state.configure())).await;
    let (admin, user) = admin_and_user(&app).await;

    let req = test::TestRequest::get()
        .uri("/tasks/not-a-uuid")
        .insert_header(bearer(&user))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid task ID");

    let req = test::TestRequest::delete()
        .uri("/tasks/42")
        .insert_header(bearer(&admin))
        .to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test_log::test(actix_rt::test)]
async fn test_malformed_task_body() {
    let state = TestState::new();
    let app = test::init_service(App::new().configure(state.configure())).await;
    let (admin, _) = admin_and_user(&app).await;

    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(bearer(&admin))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(r#"{"title": "No due date", "description": "", "status": "pending"}"#)
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");
}

#[test_log::test(actix_rt::test)]
async fn test_non_admin_cannot_write_tasks() {
    let state = TestState::new();
    let app = test::init_service(App::new().configure(state.configure())).await;
    let (admin, user) = admin_and_user(&app).await;

    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(bearer(&admin))
        .set_json(task_payload("Write report", "pending"))
        .to_request();
    let (_, created) = call(&app, req).await;
    let uri = format!("/tasks/{}", created["id"].as_str().unwrap());

    for req in [
        test::TestRequest::post()
            .uri("/tasks")
            .insert_header(bearer(&user))
            .set_json(task_payload("Sneaky", "pending"))
            .to_request(),
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&user))
            .set_json(task_payload("Sneaky", "pending"))
            .to_request(),
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&user))
            .to_request(),
    ] {
        let (status, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");
    }

    assert_eq!(state.tasks.get_all().await.unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_create_task_unauthorized_over_http() {
    let state = TestState::new();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(state.configure())
    })
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind test server");
    let port = server.addrs()[0].port();
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);

    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{}", port);

    let resp = client
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let resp = client
        .post(format!("{}/tasks", base))
        .json(&task_payload("Unauthorized Task", "pending"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("Failed to parse error body");
    assert_eq!(body["kind"], "missing_credential");

    handle.stop(true).await;
}
