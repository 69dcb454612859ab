use actix_web::{
    cookie::Cookie,
    dev::ServiceResponse,
    http::{header, StatusCode},
    test, web, App,
};
use chrono::Utc;
use gym_portal::middleware::{session_middleware, SESSION_COOKIE_NAME};
use gym_portal::{routes, PortalConfig, PortalState};
use jsonwebtoken::{encode, EncodingKey, Header};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};

const SESSION_SECRET: &str =
    "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

fn config_for(server: &ServerGuard, jwt_secret: Option<&str>) -> PortalConfig {
    let base_url = server.url();
    let jwt_secret = jwt_secret.map(str::to_string);
    PortalConfig::from_lookup(move |key| match key {
        "PORTAL_API_BASE_URL" => Some(base_url.clone()),
        "SESSION_SECRET" => Some(SESSION_SECRET.to_string()),
        "PORTAL_COOKIE_SECURE" => Some("false".to_string()),
        "PORTAL_JWT_SECRET" => jwt_secret.clone(),
        _ => None,
    })
    .unwrap()
}

fn token_for(role: &str, exp: i64, secret: &[u8]) -> String {
    encode(
        &Header::default(),
        &json!({
            "id": format!("user-{}", role.to_lowercase()),
            "userName": role.to_lowercase(),
            "email": "member@gym.test",
            "name": "Gym Member",
            "role": role,
            "specialty": null,
            "exp": exp,
        }),
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}

fn in_one_hour() -> i64 {
    Utc::now().timestamp() + 3600
}

macro_rules! portal {
    ($config:expr) => {{
        let config: PortalConfig = $config;
        let state = PortalState::new(config.clone()).unwrap();
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(session_middleware(&config))
                .configure(routes::configure(config.entry_point.clone())),
        )
        .await
    }};
}

// Logs in through the identity service mock and returns the session cookie.
macro_rules! sign_in {
    ($app:expr, $server:expr, $token:expr) => {{
        let _login = $server
            .mock("POST", "/auth/login")
            .with_header("content-type", "application/json")
            .with_body(json!({ "token": $token }).to_string())
            .create_async()
            .await;
        let resp = test::call_service($app, login_request().to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        session_cookie(&resp)
    }};
}

fn login_request() -> test::TestRequest {
    test::TestRequest::post()
        .uri("/session/login")
        .set_json(json!({ "userName": "member", "password": "secret" }))
}

fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .expect("session cookie set")
        .into_owned()
}

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn anonymous_visitor_is_sent_to_entry_point() {
    let mut server = Server::new_async().await;
    let api = server
        .mock("GET", "/configurations")
        .expect(0)
        .create_async()
        .await;
    let app = portal!(config_for(&server, None));

    let req = test::TestRequest::get()
        .uri("/admin/configurations")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    api.assert_async().await;
}

#[actix_web::test]
async fn forbidden_role_is_sent_back() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, None));
    let cookie = sign_in!(&app, server, &token_for("STUDENT", in_one_hour(), b"k"));
    let api = server
        .mock("GET", "/configurations")
        .expect(0)
        .create_async()
        .await;

    let req = test::TestRequest::get()
        .uri("/admin/configurations")
        .insert_header((header::REFERER, "/schedule"))
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/schedule");

    // no usable referer: fall back to the entry point instead of looping
    let req = test::TestRequest::get()
        .uri("/loans")
        .insert_header((header::REFERER, "/loans"))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    api.assert_async().await;
}

#[actix_web::test]
async fn admin_reaches_configurations_with_bearer_token() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, None));
    let token = token_for("ADMIN", in_one_hour(), b"k");
    let cookie = sign_in!(&app, server, &token);

    let api = server
        .mock("GET", "/configurations")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_header("content-type", "application/json")
        .with_body(json!([{ "id": "c1", "key": "max_loans", "value": 2 }]).to_string())
        .create_async()
        .await;

    let req = test::TestRequest::get()
        .uri("/admin/configurations")
        .cookie(cookie)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    api.assert_async().await;
    assert_eq!(body[0]["key"], "max_loans");
    assert_eq!(body[0]["description"], Value::Null);
}

#[actix_web::test]
async fn student_can_open_schedule() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, None));
    let cookie = sign_in!(&app, server, &token_for("STUDENT", in_one_hour(), b"k"));
    let api = server
        .mock("GET", "/schedules")
        .with_header("content-type", "application/json")
        .with_body(json!([{ "class": "spin", "day": "MON" }]).to_string())
        .create_async()
        .await;

    let req = test::TestRequest::get()
        .uri("/schedule")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    api.assert_async().await;
}

#[actix_web::test]
async fn expired_session_fails_closed() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, None));
    let expired = Utc::now().timestamp() - 60;
    let cookie = sign_in!(&app, server, &token_for("ADMIN", expired, b"k"));

    let req = test::TestRequest::get()
        .uri("/schedule")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn logout_clears_credentials() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, None));
    let cookie = sign_in!(&app, server, &token_for("TRAINER", in_one_hour(), b"k"));

    let req = test::TestRequest::post()
        .uri("/session/logout")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = session_cookie(&resp);

    let req = test::TestRequest::get()
        .uri("/loans")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let req = test::TestRequest::get()
        .uri("/session")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn identity_service_rejection_propagates() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, None));
    let _login = server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_body("bad credentials")
        .create_async()
        .await;

    let req = test::TestRequest::post()
        .uri("/session/login")
        .set_json(json!({ "userName": "member", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn unverifiable_token_is_not_stored() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, Some("portal-secret")));
    let _login = server
        .mock("POST", "/auth/login")
        .with_header("content-type", "application/json")
        .with_body(json!({ "token": token_for("ADMIN", in_one_hour(), b"forged") }).to_string())
        .create_async()
        .await;

    let req = login_request().to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp
        .response()
        .cookies()
        .all(|c| c.name() != SESSION_COOKIE_NAME));
}

#[actix_web::test]
async fn verified_token_opens_session() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, Some("portal-secret")));
    let cookie = sign_in!(
        &app,
        server,
        token_for("TRAINER", in_one_hour(), b"portal-secret")
    );

    let req = test::TestRequest::get()
        .uri("/session")
        .cookie(cookie)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["role"], "TRAINER");
}

#[actix_web::test]
async fn remote_401_reaches_the_page_unchanged() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, None));
    let cookie = sign_in!(&app, server, &token_for("TRAINER", in_one_hour(), b"k"));
    let api = server
        .mock("GET", "/equipment-loans")
        .match_header("authorization", Matcher::Regex("^Bearer .+".to_string()))
        .with_status(401)
        .with_body("token revoked")
        .create_async()
        .await;

    let req = test::TestRequest::get()
        .uri("/loans")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    api.assert_async().await;
}

#[actix_web::test]
async fn entry_point_is_public() {
    let server = Server::new_async().await;
    let app = portal!(config_for(&server, None));

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["signedIn"], false);
}

#[actix_web::test]
async fn failed_login_signs_out_previous_user() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, None));
    let cookie = sign_in!(&app, server, &token_for("ADMIN", in_one_hour(), b"k"));
    let _login = server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_body("bad credentials")
        .create_async()
        .await;

    let req = login_request().cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let cookie = session_cookie(&resp);

    let req = test::TestRequest::get()
        .uri("/session")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/admin/configurations")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn unusable_token_signs_out_previous_user() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, None));
    let cookie = sign_in!(&app, server, &token_for("TRAINER", in_one_hour(), b"k"));
    let _login = server
        .mock("POST", "/auth/login")
        .with_header("content-type", "application/json")
        .with_body(json!({ "token": "not-a-jwt" }).to_string())
        .create_async()
        .await;

    let req = login_request().cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/session")
        .cookie(session_cookie(&resp))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_does_not_forward_the_current_session_token() {
    let mut server = Server::new_async().await;
    let app = portal!(config_for(&server, None));
    let cookie = sign_in!(&app, server, &token_for("ADMIN", in_one_hour(), b"k"));
    let login = server
        .mock("POST", "/auth/login")
        .match_header("authorization", Matcher::Missing)
        .with_header("content-type", "application/json")
        .with_body(json!({ "token": token_for("STUDENT", in_one_hour(), b"k") }).to_string())
        .expect(1)
        .create_async()
        .await;

    let req = login_request().cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    login.assert_async().await;

    let req = test::TestRequest::get()
        .uri("/session")
        .cookie(session_cookie(&resp))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["role"], "STUDENT");
}
