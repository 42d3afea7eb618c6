// Direct handler tests over an in-process service
use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};

use crate::auth::Authenticator;
use crate::handlers::configure_services;
use crate::session::SessionManager;
use crate::testing::{MockIdentityProvider, TestFixtures};

async fn app_data(
    provider: Arc<MockIdentityProvider>,
) -> (web::Data<SessionManager>, web::Data<Authenticator>) {
    let sessions = web::Data::new(TestFixtures::session_manager());
    let authenticator = web::Data::new(Authenticator::new(
        provider,
        TestFixtures::user_store().await,
    ));
    (sessions, authenticator)
}

#[actix_web::test]
async fn test_health_endpoint() {
    let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
    let (sessions, authenticator) = app_data(provider).await;
    let app = test::init_service(
        App::new()
            .app_data(sessions)
            .app_data(authenticator)
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_profile_requires_authentication() {
    let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
    let (sessions, authenticator) = app_data(provider).await;
    let app = test::init_service(
        App::new()
            .app_data(sessions)
            .app_data(authenticator)
            .configure(configure_services),
    )
    .await;

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/profile").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_home_shows_null_user_when_anonymous() {
    let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
    let (sessions, authenticator) = app_data(provider).await;
    let app = test::init_service(
        App::new()
            .app_data(sessions)
            .app_data(authenticator)
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["user"].is_null());
}

#[actix_web::test]
async fn test_login_page_echoes_error_code() {
    let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
    let (sessions, authenticator) = app_data(provider).await;
    let app = test::init_service(
        App::new()
            .app_data(sessions)
            .app_data(authenticator)
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/login?error=invalid_state")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_state");
}

#[actix_web::test]
async fn test_login_start_redirects_to_provider_with_state() {
    let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
    let (sessions, authenticator) = app_data(provider).await;
    let app = test::init_service(
        App::new()
            .app_data(sessions)
            .app_data(authenticator)
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/auth/start").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("https://idp.test/authorize"));
    assert!(location.contains("state="));
    assert!(resp.headers().contains_key(header::SET_COOKIE));
}

#[actix_web::test]
async fn test_login_start_redirects_home_when_already_authenticated() {
    use crate::models::UserSnapshot;
    use crate::session::SessionData;
    use crate::utils::crypto;

    let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
    let (sessions, authenticator) = app_data(provider).await;
    let app = test::init_service(
        App::new()
            .app_data(sessions.clone())
            .app_data(authenticator)
            .configure(configure_services),
    )
    .await;

    // Seed an authenticated session directly in the store
    let session_id = crypto::generate_session_id();
    sessions
        .save_session(
            &session_id,
            SessionData {
                pending_state: None,
                user: Some(UserSnapshot {
                    id: "user-1".to_string(),
                    email: "a@x.com".to_string(),
                    name: None,
                    picture_url: None,
                }),
            },
        )
        .await
        .unwrap();
    let cookie = sessions.create_session_cookie(&session_id).unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/start")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");
}

#[actix_web::test]
async fn test_callback_without_session_cookie_is_rejected() {
    let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
    let (sessions, authenticator) = app_data(Arc::clone(&provider)).await;
    let app = test::init_service(
        App::new()
            .app_data(sessions)
            .app_data(authenticator)
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/callback?code=abc&state=whatever")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(location, "/login?error=invalid_state");
    assert_eq!(provider.exchange_calls(), 0);
}

#[actix_web::test]
async fn test_logout_without_session_redirects_to_login() {
    let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
    let (sessions, authenticator) = app_data(provider).await;
    let app = test::init_service(
        App::new()
            .app_data(sessions)
            .app_data(authenticator)
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/auth/logout").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
}
