mod common;

use std::sync::Arc;

use actix_web::cookie::time;
use actix_web::http::{header, StatusCode};
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::json;

use tasktrack::auth::{SessionManager, SessionSettings, SESSION_COOKIE_NAME};

use common::{
    build_app, lazy_pool, memory_sessions, plant_session, ReadOnlyStore, UnreachableStore,
};

#[actix_rt::test]
async fn test_health_is_public() {
    let (_, sessions) = memory_sessions();
    let app = test::init_service(build_app(sessions, lazy_pool())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_protected_routes_require_a_session() {
    let (_, sessions) = memory_sessions();
    let app = test::init_service(build_app(sessions, lazy_pool())).await;

    for uri in ["/whoami", "/tasks"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let req = test::TestRequest::get()
        .uri("/whoami")
        .cookie(actix_web::cookie::Cookie::new(SESSION_COOKIE_NAME, "forged"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body = test::read_body(resp).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].is_string());
}

#[actix_rt::test]
async fn test_valid_session_reaches_handler_without_renewal() {
    let (_, sessions) = memory_sessions();
    let issued = sessions.issue(42, "127.0.0.1", "integration").await.unwrap();
    let app = test::init_service(build_app(sessions.clone(), lazy_pool())).await;

    let req = test::TestRequest::get()
        .uri("/whoami")
        .cookie(sessions.session_cookie(&issued.session_id, issued.max_age))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    let body = test::read_body(resp).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, json!({ "user_id": 42 }));
}

#[actix_rt::test]
async fn test_session_near_expiry_is_renewed_with_same_token() {
    let (store, sessions) = memory_sessions();
    let session_id = plant_session(&*store, 9, chrono::Duration::minutes(5)).await;
    let app = test::init_service(build_app(sessions.clone(), lazy_pool())).await;

    let req = test::TestRequest::get()
        .uri("/whoami")
        .cookie(actix_web::cookie::Cookie::new(
            SESSION_COOKIE_NAME,
            session_id.clone(),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let renewed = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .expect("renewed cookie");
    assert_eq!(renewed.value(), session_id);
    assert_eq!(renewed.max_age(), Some(time::Duration::seconds(3600)));
    assert_eq!(renewed.http_only(), Some(true));
    assert_eq!(renewed.path(), Some("/"));
}

#[actix_rt::test]
async fn test_unreachable_store_fails_closed() {
    let sessions = Arc::new(SessionManager::new(
        Arc::new(UnreachableStore),
        SessionSettings::default(),
    ));
    let app = test::init_service(build_app(sessions, lazy_pool())).await;

    let req = test::TestRequest::get()
        .uri("/whoami")
        .cookie(actix_web::cookie::Cookie::new(
            SESSION_COOKIE_NAME,
            uuid::Uuid::new_v4().to_string(),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Logout still clears the cookie.
    let req = test::TestRequest::post()
        .uri("/logout")
        .cookie(actix_web::cookie::Cookie::new(
            SESSION_COOKIE_NAME,
            uuid::Uuid::new_v4().to_string(),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp
        .response()
        .cookies()
        .any(|c| c.name() == SESSION_COOKIE_NAME && c.value().is_empty()));
}

#[actix_rt::test]
async fn test_failed_renewal_sends_no_cookie() {
    let store = Arc::new(ReadOnlyStore::default());
    let session_id = plant_session(&*store, 9, chrono::Duration::minutes(5)).await;
    let sessions = Arc::new(SessionManager::new(
        store,
        SessionSettings {
            secure_cookies: false,
            ..SessionSettings::default()
        },
    ));
    let app = test::init_service(build_app(sessions, lazy_pool())).await;

    let req = test::TestRequest::get()
        .uri("/whoami")
        .cookie(actix_web::cookie::Cookie::new(SESSION_COOKIE_NAME, session_id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[actix_rt::test]
async fn test_logout_invalidates_session() {
    let (_, sessions) = memory_sessions();
    let issued = sessions.issue(3, "127.0.0.1", "integration").await.unwrap();
    let app = test::init_service(build_app(sessions.clone(), lazy_pool())).await;
    let cookie = sessions.session_cookie(&issued.session_id, issued.max_age);

    let req = test::TestRequest::post()
        .uri("/logout")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
    let cleared = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .expect("clearing cookie");
    assert_eq!(cleared.value(), "");
    assert_eq!(cleared.max_age(), Some(time::Duration::ZERO));

    let req = test::TestRequest::get().uri("/whoami").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Logging out twice is still a clean 204.
    let req = test::TestRequest::post().uri("/logout").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_rt::test]
async fn test_register_rejects_invalid_input() {
    let (_, sessions) = memory_sessions();
    let app = test::init_service(build_app(sessions, lazy_pool())).await;

    let cases = [
        json!({ "email": "a..b@example.com", "password": "password123" }),
        json!({ "email": "a@ex..com", "password": "password123" }),
        json!({ "email": "a@example.com", "password": "short" }),
        json!({ "email": "a@example.com", "password": "x".repeat(65) }),
    ];
    for payload in cases {
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", payload);
    }
}

#[actix_rt::test]
async fn test_login_requires_both_fields() {
    let (_, sessions) = memory_sessions();
    let app = test::init_service(build_app(sessions, lazy_pool())).await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "a@example.com", "password": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "a@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("password"));

    let req = test::TestRequest::post()
        .uri("/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"email\":")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}
