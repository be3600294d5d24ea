#![cfg(feature = "inmem-store")]

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;

fn register_body(name: &str) -> serde_json::Value {
    json!({"username": name, "email": format!("{name}@example.com"), "password": common::PASSWORD})
}

#[actix_web::test]
async fn register_then_login() {
    let c = common::ctx();
    let app = app!(c.state);

    let (status, body) = call!(app, TestRequest::post().uri("/api/auth/register").set_json(register_body("alice")));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    let user_id = body["userId"].as_str().unwrap().to_string();

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "alice@example.com", "password": common::PASSWORD}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user_id.as_str());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = call!(
        app,
        TestRequest::get().uri("/api/users/me").insert_header(("Authorization", format!("Bearer {token}")))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert!(me.get("password").is_none());
}

#[actix_web::test]
async fn duplicate_registration_and_bad_credentials_are_client_errors() {
    let c = common::ctx();
    let app = app!(c.state);

    let (status, _) = call!(app, TestRequest::post().uri("/api/auth/register").set_json(register_body("bob")));
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = call!(app, TestRequest::post().uri("/api/auth/register").set_json(register_body("bob")));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "bob@example.com", "password": "wrong-password"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, _) = call!(
        app,
        TestRequest::post().uri("/api/auth/register").set_json(json!({"username": "", "email": "x@y.z", "password": "p"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn token_states() {
    let c = common::ctx();
    let app = app!(c.state);

    let (status, body) = call!(app, TestRequest::get().uri("/api/users/me"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No token, authorization denied");

    let (status, body) =
        call!(app, TestRequest::get().uri("/api/users/me").insert_header(("Authorization", "Bearer not-a-jwt")));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is not valid");

    // valid signature, but the user is gone
    let (id, token) = common::user(&c.state, "ghost", false).await;
    c.state.repo.users().delete(&id).await.unwrap();
    let (status, body) = call!(app, TestRequest::get().uri("/api/users/me").insert_header(("Authorization", token)));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[actix_web::test]
async fn first_admin_is_open_then_guarded() {
    let c = common::ctx();
    let app = app!(c.state);

    let (status, _) = call!(app, TestRequest::post().uri("/api/auth/register-admin").set_json(register_body("root")));
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call!(app, TestRequest::post().uri("/api/auth/register-admin").set_json(register_body("mallory")));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, user_token) = common::user(&c.state, "carol", false).await;
    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri("/api/auth/register-admin")
            .insert_header(("Authorization", user_token.clone()))
            .set_json(register_body("mallory"))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, admin_token) = common::user(&c.state, "boss", true).await;
    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri("/api/auth/register-admin")
            .insert_header(("Authorization", admin_token.clone()))
            .set_json(register_body("deputy"))
    );
    assert_eq!(status, StatusCode::CREATED);

    // admin-only route rejects a plain user with 403
    let (status, body) =
        call!(app, TestRequest::get().uri("/api/users/non-admins").insert_header(("Authorization", user_token)));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied. Admin only.");
}

#[actix_web::test]
async fn profile_and_wishlist() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, token) = common::user(&c.state, "dana", false).await;
    let movie = common::movie(&c.state, json!({"title": "Heat", "director": "Michael Mann"})).await;

    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri("/api/users/profile")
            .insert_header(("Authorization", token.clone()))
            .set_json(json!({"favoriteGenres": ["Crime", "Crime", "Drama"], "password": "new-password"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favoriteGenres"], json!(["Crime", "Drama"]));

    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "dana@example.com", "password": "new-password"}))
    );
    assert_eq!(status, StatusCode::OK);

    for _ in 0..2 {
        let (status, body) = call!(
            app,
            TestRequest::post()
                .uri("/api/users/wishlist")
                .insert_header(("Authorization", token.clone()))
                .set_json(json!({"movieId": movie.id}))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([movie.id]));
    }

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/users/wishlist")
            .insert_header(("Authorization", token))
            .set_json(json!({"movieId": "not an id"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid movie ID format");
}
