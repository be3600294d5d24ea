#![cfg(feature = "inmem-store")]

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;

fn titles(page: &serde_json::Value) -> Vec<String> {
    page["data"].as_array().unwrap().iter().map(|m| m["title"].as_str().unwrap().to_string()).collect()
}

#[actix_web::test]
async fn user_recommendations_use_favourite_and_watched_genres() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, token) = common::user(&c.state, "viewer", false).await;

    let watched = common::movie(&c.state, json!({"title": "Alien", "director": "Ridley Scott", "genre": ["Horror"], "popularityScore": 99.0})).await;
    common::movie(&c.state, json!({"title": "The Thing", "director": "John Carpenter", "genre": ["Horror"], "popularityScore": 80.0})).await;
    common::movie(&c.state, json!({"title": "Amelie", "director": "Jean-Pierre Jeunet", "genre": ["Romance"], "popularityScore": 70.0})).await;
    common::movie(&c.state, json!({"title": "Top Gun", "director": "Tony Scott", "genre": ["Action"], "popularityScore": 95.0})).await;

    let (status, _) = call!(
        app,
        TestRequest::put()
            .uri("/api/users/profile")
            .insert_header(("Authorization", token.clone()))
            .set_json(json!({"favoriteGenres": ["Romance"], "watchedMovies": [watched.id]}))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, page) = call!(app, TestRequest::get().uri("/api/recommendations/user").insert_header(("Authorization", token)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&page), vec!["The Thing", "Amelie"]);

    let (status, _) = call!(app, TestRequest::get().uri("/api/recommendations/user"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn similar_trending_and_top_rated() {
    let c = common::ctx();
    let app = app!(c.state);
    let base = common::movie(&c.state, json!({"title": "Heat", "director": "Michael Mann", "genre": ["Crime"], "popularityScore": 10.0})).await;
    common::movie(&c.state, json!({"title": "Collateral", "director": "Michael Mann", "genre": ["Thriller"], "popularityScore": 30.0})).await;
    common::movie(&c.state, json!({"title": "Ronin", "director": "John Frankenheimer", "genre": ["Crime", "Action"], "popularityScore": 20.0})).await;
    common::movie(&c.state, json!({"title": "Paddington", "director": "Paul King", "genre": ["Family"], "popularityScore": 40.0})).await;

    let (status, page) = call!(app, TestRequest::get().uri(&format!("/api/recommendations/similar/{}", base.id)));
    assert_eq!(status, StatusCode::OK);
    let mut similar = titles(&page);
    similar.sort();
    assert_eq!(similar, vec!["Collateral", "Ronin"]);

    let (_, page) = call!(app, TestRequest::get().uri("/api/recommendations/trending?limit=2"));
    assert_eq!(titles(&page), vec!["Paddington", "Collateral"]);
    assert_eq!(page["total"], 4);

    let (status, _) =
        call!(app, TestRequest::get().uri(&format!("/api/recommendations/similar/{}", moviedb::models::new_id())));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, page) = call!(app, TestRequest::get().uri("/api/recommendations/top-rated"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 4);
}
