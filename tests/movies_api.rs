#![cfg(feature = "inmem-store")]

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use chrono::{Duration, Utc};
use moviedb::query::{Filter, Query, Window};
use serde_json::json;

#[actix_web::test]
async fn admin_crud_and_duplicate_title() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, admin) = common::user(&c.state, "admin", true).await;
    let (_, user) = common::user(&c.state, "user", false).await;
    let body = json!({"title": "Alien", "director": "Ridley Scott", "genre": ["Horror", "Sci-Fi"]});

    let (status, _) = call!(
        app,
        TestRequest::post().uri("/api/movies").insert_header(("Authorization", user)).set_json(&body)
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, movie) = call!(
        app,
        TestRequest::post().uri("/api/movies").insert_header(("Authorization", admin.clone())).set_json(&body)
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(movie["averageRating"], 0.0);
    assert_eq!(movie["boxOffice"]["worldwide"], 0.0);
    let id = movie["_id"].as_str().unwrap().to_string();

    let (status, body) = call!(
        app,
        TestRequest::post().uri("/api/movies").insert_header(("Authorization", admin.clone())).set_json(&body)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Movie with this title already exists");

    let (status, updated) = call!(
        app,
        TestRequest::put()
            .uri(&format!("/api/movies/{id}"))
            .insert_header(("Authorization", admin.clone()))
            .set_json(json!({"runtime": 117}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["runtime"], 117);
    assert_eq!(updated["title"], "Alien");

    let (status, _) = call!(
        app,
        TestRequest::delete().uri(&format!("/api/movies/{id}")).insert_header(("Authorization", admin))
    );
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call!(app, TestRequest::get().uri(&format!("/api/movies/{id}")));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Movie not found");

    let (status, _) = call!(app, TestRequest::get().uri("/api/movies/not-an-id"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn listing_is_paginated() {
    let c = common::ctx();
    let app = app!(c.state);
    for i in 0..12 {
        common::movie(&c.state, json!({"title": format!("Movie {i}"), "director": "Someone"})).await;
    }

    let (status, page) = call!(app, TestRequest::get().uri("/api/movies?page=2&limit=5"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 12);
    assert_eq!(page["page"], 2);
    assert_eq!(page["pageSize"], 5);
    assert_eq!(page["data"].as_array().unwrap().len(), 5);

    let (_, page) = call!(app, TestRequest::get().uri("/api/movies?page=3&limit=5"));
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["pageSize"], 2);

    let (_, page) = call!(app, TestRequest::get().uri("/api/movies?page=9&limit=5"));
    assert_eq!(page["data"].as_array().unwrap().len(), 0);
    assert_eq!(page["total"], 12);

    let (_, page) = call!(app, TestRequest::get().uri("/api/movies?page=0"));
    assert_eq!(page["page"], 1);
    assert_eq!(page["data"].as_array().unwrap().len(), 10);

    let (status, body) = call!(app, TestRequest::get().uri("/api/movies?page=abc"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn search_matches_fields_and_logs_actor_queries() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, token) = common::user(&c.state, "fan", false).await;
    common::movie(&c.state, json!({"title": "The Matrix", "director": "Lana Wachowski", "cast": ["Keanu Reeves"]})).await;
    common::movie(&c.state, json!({"title": "Speed", "director": "Jan de Bont", "cast": ["Keanu Reeves", "Sandra Bullock"]})).await;
    common::movie(&c.state, json!({"title": "Gravity", "director": "Alfonso Cuaron", "cast": ["Sandra Bullock"]})).await;
    c.state
        .repo
        .crew()
        .insert(
            serde_json::from_value::<moviedb::models::NewCrew>(json!({"name": "Keanu Reeves", "role": "Actor"}))
                .unwrap()
                .into_crew()
                .unwrap(),
        )
        .await
        .unwrap();

    let (status, body) = call!(app, TestRequest::get().uri("/api/movies/search"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = call!(
        app,
        TestRequest::get().uri("/api/movies/search?query=keanu").insert_header(("Authorization", token))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movies"]["total"], 2);
    assert_eq!(body["actors"].as_array().unwrap().len(), 1);

    let (_, body) = call!(app, TestRequest::get().uri("/api/movies/search?query=GRAV"));
    assert_eq!(body["movies"]["total"], 1);
    assert!(body["actors"].as_array().unwrap().is_empty());

    let logs = c.state.repo.search_logs().find(&Query::all(), Window::default()).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].search_query, "keanu");
    assert!(logs[0].user.is_some());
}

#[actix_web::test]
async fn range_and_date_filters() {
    let c = common::ctx();
    let app = app!(c.state);
    let soon = (Utc::now() + Duration::days(30)).date_naive();
    common::movie(&c.state, json!({"title": "Old", "director": "A", "releaseDate": "1994-06-10", "popularityScore": 10.0, "country": "US", "synopsis": "A heist goes wrong"})).await;
    common::movie(&c.state, json!({"title": "Nineties", "director": "B", "releaseDate": "1999-03-31", "popularityScore": 50.0, "country": "FR"})).await;
    common::movie(&c.state, json!({"title": "Next", "director": "C", "releaseDate": soon.to_string(), "genre": ["Drama"], "popularityScore": 90.0})).await;

    let (status, body) = call!(app, TestRequest::get().uri("/api/movies/filter/release-year"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Release year is required");

    let (_, body) = call!(app, TestRequest::get().uri("/api/movies/filter/release-year?releaseYear=1999"));
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Nineties");

    let (_, body) = call!(app, TestRequest::get().uri("/api/movies/filter/popularity?minPopularity=40"));
    assert_eq!(body["total"], 2);

    let (_, body) = call!(app, TestRequest::get().uri("/api/movies/advanced-filter?decade=1990&country=US"));
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Old");

    let (_, body) = call!(app, TestRequest::get().uri("/api/movies/advanced-filter?keywords=heist%20goes"));
    assert_eq!(body["total"], 1);

    let (status, body) = call!(app, TestRequest::get().uri("/api/movies/advanced-filter?decade=2147483647"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid decade");

    let (_, body) = call!(app, TestRequest::get().uri("/api/movies/upcoming?genre=Drama"));
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Next");

    let (_, body) = call!(app, TestRequest::get().uri("/api/movies/filter/rating?minRating=0&maxRating=5"));
    assert_eq!(body["total"], 3);
}

#[actix_web::test]
async fn box_office_and_awards_by_id() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, admin) = common::user(&c.state, "admin", true).await;
    let movie = common::movie(&c.state, json!({"title": "Jaws", "director": "Steven Spielberg"})).await;
    let base = format!("/api/movies/{}", movie.id);

    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri(&format!("{base}/box-office"))
            .insert_header(("Authorization", admin.clone()))
            .set_json(json!({"boxOffice": {"domestic": 260.0}}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["boxOffice"]["domestic"], 260.0);
    assert_eq!(body["boxOffice"]["international"], 0.0);

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("{base}/awards"))
            .insert_header(("Authorization", admin.clone()))
            .set_json(json!({"awardName": "Oscar", "category": "Best Score", "year": 1976, "won": true}))
    );
    assert_eq!(status, StatusCode::OK);
    let award_id = body["awards"][0]["_id"].as_str().unwrap().to_string();

    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri(&format!("{base}/awards/{award_id}"))
            .insert_header(("Authorization", admin.clone()))
            .set_json(json!({"category": "Best Original Score"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["awards"][0]["category"], "Best Original Score");
    assert_eq!(body["awards"][0]["awardName"], "Oscar");

    let (_, details) = call!(app, TestRequest::get().uri(&format!("{base}/details")));
    assert_eq!(details["awards"].as_array().unwrap().len(), 1);
    assert_eq!(details["boxOffice"]["domestic"], 260.0);

    let (status, body) = call!(
        app,
        TestRequest::delete().uri(&format!("{base}/awards/{award_id}")).insert_header(("Authorization", admin.clone()))
    );
    assert_eq!(status, StatusCode::OK);
    assert!(body["awards"].as_array().unwrap().is_empty());

    let (status, body) = call!(
        app,
        TestRequest::delete().uri(&format!("{base}/awards/{award_id}")).insert_header(("Authorization", admin))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Award not found");
}

#[actix_web::test]
async fn crew_filmography_is_resolved() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, admin) = common::user(&c.state, "admin", true).await;
    let movie = common::movie(&c.state, json!({"title": "Fargo", "director": "Joel Coen"})).await;

    let (status, crew) = call!(
        app,
        TestRequest::post().uri("/api/crew").insert_header(("Authorization", admin)).set_json(json!({
            "name": "Frances McDormand",
            "role": "Actor",
            "filmography": [{"movie": movie.id, "character": "Marge Gunderson"}]
        }))
    );
    assert_eq!(status, StatusCode::CREATED);
    let id = crew["_id"].as_str().unwrap();

    let (status, body) = call!(app, TestRequest::get().uri(&format!("/api/crew/{id}")));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filmography"][0]["movie"]["title"], "Fargo");
    assert_eq!(body["filmography"][0]["character"], "Marge Gunderson");

    let (_, page) = call!(app, TestRequest::get().uri("/api/crew?role=Director"));
    assert_eq!(page["total"], 0);
    let (_, page) = call!(app, TestRequest::get().uri("/api/crew?role=Actor"));
    assert_eq!(page["total"], 1);

    let stored = c.state.repo.crew().count(&Filter::All).await.unwrap();
    assert_eq!(stored, 1);
}
