#![cfg(feature = "inmem-store")]

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;

#[actix_web::test]
async fn average_rating_follows_reviews() {
    let c = common::ctx();
    let app = app!(c.state);
    let movie = common::movie(&c.state, json!({"title": "Up", "director": "Pete Docter"})).await;
    let uri = format!("/api/reviews/{}", movie.id);

    let mut tokens = Vec::new();
    for (name, rating) in [("ann", 5), ("ben", 3), ("cat", 4)] {
        let (_, token) = common::user(&c.state, name, false).await;
        let (status, body) = call!(
            app,
            TestRequest::post()
                .uri(&uri)
                .insert_header(("Authorization", token.clone()))
                .set_json(json!({"rating": rating, "reviewText": format!("{name} says {rating}")}))
        );
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["reviews"].is_array());
        tokens.push(token);
    }
    let stored = c.state.repo.movies().require(&movie.id).await.unwrap();
    assert_eq!(stored.average_rating, 4.0);

    // second review from the same user: rejected, nothing changes
    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri(&uri)
            .insert_header(("Authorization", tokens[0].clone()))
            .set_json(json!({"rating": 1, "reviewText": "again"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User has already reviewed this movie");
    let stored = c.state.repo.movies().require(&movie.id).await.unwrap();
    assert_eq!(stored.reviews.len(), 3);
    assert_eq!(stored.average_rating, 4.0);

    // removing the 3 leaves 5 and 4
    let (status, _) = call!(app, TestRequest::delete().uri(&uri).insert_header(("Authorization", tokens[1].clone())));
    assert_eq!(status, StatusCode::OK);
    let stored = c.state.repo.movies().require(&movie.id).await.unwrap();
    assert_eq!(stored.average_rating, 4.5);

    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri(&uri)
            .insert_header(("Authorization", tokens[2].clone()))
            .set_json(json!({"rating": 2, "reviewText": "changed my mind"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["averageRating"], 3.5);

    // the reviewer's own ratings list mirrors the review
    let cat = c.state.repo.users().find_one(&moviedb::query::Filter::eq("username", "cat")).await.unwrap().unwrap();
    assert_eq!(cat.ratings.len(), 1);
    assert_eq!(cat.ratings[0].rating, 2);

    let (status, body) = call!(app, TestRequest::delete().uri(&uri).insert_header(("Authorization", tokens[1].clone())));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Review not found");
}

#[actix_web::test]
async fn review_input_is_validated() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, token) = common::user(&c.state, "critic", false).await;
    let movie = common::movie(&c.state, json!({"title": "Cats", "director": "Tom Hooper"})).await;
    let uri = format!("/api/reviews/{}", movie.id);

    for body in [json!({"rating": 0, "reviewText": "x"}), json!({"rating": 6, "reviewText": "x"}), json!({"rating": 3, "reviewText": " "})] {
        let (status, _) =
            call!(app, TestRequest::post().uri(&uri).insert_header(("Authorization", token.clone())).set_json(body));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/reviews/{}", moviedb::models::new_id()))
            .insert_header(("Authorization", token))
            .set_json(json!({"rating": 3, "reviewText": "fine"}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call!(app, TestRequest::post().uri(&uri).set_json(json!({"rating": 3, "reviewText": "fine"})));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn listing_and_highlights() {
    let c = common::ctx();
    let app = app!(c.state);
    let movie = common::movie(&c.state, json!({"title": "Big", "director": "Penny Marshall"})).await;
    let uri = format!("/api/reviews/{}", movie.id);

    for (i, rating) in [2, 5, 3, 4, 1].into_iter().enumerate() {
        let (_, token) = common::user(&c.state, &format!("viewer{i}"), false).await;
        let (status, _) = call!(
            app,
            TestRequest::post()
                .uri(&uri)
                .insert_header(("Authorization", token))
                .set_json(json!({"rating": rating, "reviewText": "ok"}))
        );
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = call!(app, TestRequest::get().uri(&format!("{uri}?page=2&limit=2")));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 5);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert!(page["data"][0]["user"]["username"].as_str().unwrap().starts_with("viewer"));

    let (status, body) = call!(app, TestRequest::get().uri(&format!("{uri}/highlights")));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], 3);
    let top: Vec<_> = body["topRated"].as_array().unwrap().iter().map(|r| r["rating"].as_u64().unwrap()).collect();
    assert_eq!(top, vec![5, 4, 3]);
    assert_eq!(body["mostDiscussed"].as_array().unwrap().len(), 3);

    let (_, body) = call!(app, TestRequest::get().uri(&format!("{uri}/highlights?page=2")));
    let top: Vec<_> = body["topRated"].as_array().unwrap().iter().map(|r| r["rating"].as_u64().unwrap()).collect();
    assert_eq!(top, vec![2, 1]);
}

#[actix_web::test]
async fn admin_removes_any_review() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, admin) = common::user(&c.state, "admin", true).await;
    let (author_id, author) = common::user(&c.state, "troll", false).await;
    let movie = common::movie(&c.state, json!({"title": "Dune", "director": "Denis Villeneuve"})).await;

    let (_, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/reviews/{}", movie.id))
            .insert_header(("Authorization", author.clone()))
            .set_json(json!({"rating": 1, "reviewText": "spam"}))
    );
    let review_id = body["reviews"][0]["_id"].as_str().unwrap().to_string();
    let admin_uri = format!("/api/admin/reviews/{}/{review_id}", movie.id);

    let (status, _) = call!(app, TestRequest::delete().uri(&admin_uri).insert_header(("Authorization", author)));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call!(app, TestRequest::delete().uri(&admin_uri).insert_header(("Authorization", admin.clone())));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Review deleted successfully");

    let stored = c.state.repo.movies().require(&movie.id).await.unwrap();
    assert!(stored.reviews.is_empty());
    assert_eq!(stored.average_rating, 0.0);
    let troll = c.state.repo.users().require(&author_id).await.unwrap();
    assert!(troll.ratings.is_empty());

    let (status, _) = call!(app, TestRequest::delete().uri(&admin_uri).insert_header(("Authorization", admin)));
    assert_eq!(status, StatusCode::NOT_FOUND);
}
