#![cfg(feature = "inmem-store")]

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;

#[actix_web::test]
async fn private_lists_are_hidden_from_everyone_but_the_creator() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, owner) = common::user(&c.state, "owner", false).await;
    let (_, other) = common::user(&c.state, "other", false).await;
    let movie = common::movie(&c.state, json!({"title": "Brazil", "director": "Terry Gilliam"})).await;

    let (status, body) = call!(
        app,
        TestRequest::post().uri("/api/lists").insert_header(("Authorization", owner.clone())).set_json(json!({
            "title": "Secret favourites",
            "movies": [movie.id, movie.id],
            "isPublic": false
        }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "List created successfully");
    assert_eq!(body["list"]["movies"].as_array().unwrap().len(), 1);
    let uri = format!("/api/lists/{}", body["list"]["_id"].as_str().unwrap());

    let (status, body) = call!(app, TestRequest::get().uri(&uri));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "List not found or access denied");
    let (status, _) = call!(app, TestRequest::get().uri(&uri).insert_header(("Authorization", other.clone())));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call!(app, TestRequest::get().uri(&uri).insert_header(("Authorization", owner.clone())));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["list"]["movies"][0]["title"], "Brazil");
    assert_eq!(body["list"]["creator"]["username"], "owner");

    // only the creator may modify
    let (status, _) = call!(
        app,
        TestRequest::put().uri(&uri).insert_header(("Authorization", other.clone())).set_json(json!({"isPublic": true}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = call!(
        app,
        TestRequest::put().uri(&uri).insert_header(("Authorization", owner.clone())).set_json(json!({"isPublic": true}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["list"]["isPublic"], true);

    let (status, _) = call!(app, TestRequest::get().uri(&uri));
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call!(app, TestRequest::delete().uri(&uri).insert_header(("Authorization", other)));
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = call!(app, TestRequest::delete().uri(&uri).insert_header(("Authorization", owner)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "List deleted successfully");
}

#[actix_web::test]
async fn listing_depends_on_the_caller() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, alice) = common::user(&c.state, "alice", false).await;
    let (_, bob) = common::user(&c.state, "bob", false).await;

    for (token, title, public) in [(&alice, "a-public", true), (&alice, "a-private", false), (&bob, "b-private", false)] {
        let (status, _) = call!(
            app,
            TestRequest::post()
                .uri("/api/lists")
                .insert_header(("Authorization", token.clone()))
                .set_json(json!({"title": title, "isPublic": public}))
        );
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, page) = call!(app, TestRequest::get().uri("/api/lists"));
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["title"], "a-public");

    let (_, page) = call!(app, TestRequest::get().uri("/api/lists").insert_header(("Authorization", alice)));
    assert_eq!(page["total"], 2);

    let (_, page) = call!(app, TestRequest::get().uri("/api/lists").insert_header(("Authorization", bob)));
    assert_eq!(page["total"], 2);
    let titles: Vec<_> = page["data"].as_array().unwrap().iter().map(|l| l["title"].as_str().unwrap()).collect();
    assert!(titles.contains(&"b-private"));
    assert!(!titles.contains(&"a-private"));
}

#[actix_web::test]
async fn follow_and_unfollow() {
    let c = common::ctx();
    let app = app!(c.state);
    let (_, owner) = common::user(&c.state, "curator", false).await;
    let (fan_id, fan) = common::user(&c.state, "fan", false).await;

    let (_, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/lists")
            .insert_header(("Authorization", owner))
            .set_json(json!({"title": "Noir", "isPublic": true}))
    );
    let id = body["list"]["_id"].as_str().unwrap().to_string();

    let (status, body) = call!(
        app,
        TestRequest::post().uri(&format!("/api/lists/{id}/follow")).insert_header(("Authorization", fan.clone()))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "List followed successfully");

    let (status, body) = call!(
        app,
        TestRequest::post().uri(&format!("/api/lists/{id}/follow")).insert_header(("Authorization", fan.clone()))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Already following this list");

    let stored = c.state.repo.lists().require(&id).await.unwrap();
    assert_eq!(stored.followers, vec![fan_id]);

    let (status, _) = call!(
        app,
        TestRequest::post().uri(&format!("/api/lists/{id}/unfollow")).insert_header(("Authorization", fan))
    );
    assert_eq!(status, StatusCode::OK);
    let stored = c.state.repo.lists().require(&id).await.unwrap();
    assert!(stored.followers.is_empty());
}
