#![cfg(feature = "inmem-store")]

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use moviedb::models::{SearchCategory, SearchLog};
use serde_json::json;

#[actix_web::test]
async fn non_admin_users_are_paginated() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, admin) = common::user(&c.state, "admin", true).await;
    for i in 0..25 {
        common::user(&c.state, &format!("user{i:02}"), false).await;
    }

    let (status, page) = call!(
        app,
        TestRequest::get().uri("/api/users/non-admins?page=3&limit=10").insert_header(("Authorization", admin))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 25);
    assert_eq!(page["page"], 3);
    assert_eq!(page["pageSize"], 5);
    let data = page["data"].as_array().unwrap();
    assert_eq!(data.len(), 5);
    assert!(data.iter().all(|u| u.get("password").is_none() && u["isAdmin"] == false));
}

#[actix_web::test]
async fn statistics() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, admin) = common::user(&c.state, "admin", true).await;
    let (_, user) = common::user(&c.state, "user", false).await;

    common::movie(&c.state, json!({"title": "A", "director": "X", "genre": ["Drama", "Crime"], "popularityScore": 5.0})).await;
    common::movie(&c.state, json!({"title": "B", "director": "X", "genre": ["Drama"], "popularityScore": 50.0})).await;
    common::movie(&c.state, json!({"title": "C", "director": "X", "genre": ["Comedy", "Drama"], "popularityScore": 20.0})).await;

    for query in ["keanu", "keanu", "keanu", "sandra", "sandra", "tom"] {
        c.state.repo.search_logs().insert(SearchLog::new(query, SearchCategory::Actor, None)).await.unwrap();
    }
    c.state.repo.search_logs().insert(SearchLog::new("drama", SearchCategory::Genre, None)).await.unwrap();

    let (status, _) = call!(app, TestRequest::get().uri("/api/admin/statistics").insert_header(("Authorization", user)));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, stats) =
        call!(app, TestRequest::get().uri("/api/admin/statistics?limit=2").insert_header(("Authorization", admin.clone())));
    assert_eq!(status, StatusCode::OK);

    let popular = &stats["mostPopularMovies"];
    assert_eq!(popular["total"], 3);
    assert_eq!(popular["data"][0]["title"], "B");
    assert_eq!(popular["data"][1]["title"], "C");
    assert!(popular["data"][0].get("reviews").is_none());

    assert_eq!(stats["trendingGenres"][0], json!({"genre": "Drama", "count": 3}));
    assert_eq!(stats["trendingGenres"].as_array().unwrap().len(), 3);

    let actors = &stats["mostSearchedActors"];
    assert_eq!(actors["data"][0], json!({"name": "keanu", "searches": 3}));
    assert_eq!(actors["data"][1], json!({"name": "sandra", "searches": 2}));
    // not countable: total reports the window
    assert_eq!(actors["total"], 2);

    assert_eq!(stats["recentUsers"]["total"], 2);
    assert!(stats["recentUsers"]["data"][0]["email"].is_string());

    let (_, stats) =
        call!(app, TestRequest::get().uri("/api/admin/statistics?page=2&limit=2").insert_header(("Authorization", admin)));
    assert_eq!(stats["mostSearchedActors"]["data"], json!([{"name": "tom", "searches": 1}]));
    assert_eq!(stats["mostSearchedActors"]["page"], 2);
}
