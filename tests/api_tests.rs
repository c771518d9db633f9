mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use blog_api::{models::NewArticle, repository::Repository};
use common::{Form, TestApp, key_from_url, png};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, _) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new();
    let (status, body) = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/articles/{id}"].is_object());
}

// --- Articles ---

#[tokio::test]
async fn creating_an_article_requires_a_token() {
    let app = TestApp::new();
    let form = Form::new().text("title", "T").text("content", "C");
    let (status, _) = app.multipart(Method::POST, "/articles", None, form).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_article_round_trips_with_its_image() {
    let app = TestApp::new();
    let (token, user_id) = app.register("Ada", "ada@example.com").await;
    let image = png("cover-bytes");

    let created = app.create_article(&token, "First post", Some(&image)).await;
    assert_eq!(created["user_id"], user_id.to_string());
    assert_eq!(created["author_name"], "Ada");

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = app.get(&format!("/articles/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "First post");
    assert_eq!(fetched["content"], "Body text");

    let key = key_from_url(&fetched["image_url"]);
    assert!(key.starts_with("articles/"));
    assert_eq!(app.storage.get(&key).unwrap().as_ref(), image.as_slice());
}

#[tokio::test]
async fn article_owner_is_the_caller_not_the_payload() {
    let app = TestApp::new();
    let (token, user_id) = app.register("Ada", "ada@example.com").await;
    let form = Form::new()
        .text("title", "T")
        .text("content", "C")
        .text("user_id", &Uuid::new_v4().to_string());

    let (status, body) = app
        .multipart(Method::POST, "/articles", Some(&token), form)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], user_id.to_string());
}

#[tokio::test]
async fn article_validation_reports_field_errors() {
    let app = TestApp::new();
    let (token, _) = app.register("Ada", "ada@example.com").await;

    let (status, body) = app
        .multipart(Method::POST, "/articles", Some(&token), Form::new())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["content"].is_array());

    let form = Form::new()
        .text("title", "T")
        .text("content", "C")
        .file("image", "notes.txt", "text/plain", b"plain text");
    let (status, body) = app
        .multipart(Method::POST, "/articles", Some(&token), form)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["image"].is_array());
    assert!(app.storage.keys().is_empty());
}

#[tokio::test]
async fn oversize_image_is_a_validation_error() {
    let app = TestApp::new();
    let (token, _) = app.register("Ada", "ada@example.com").await;
    let mut image = png("");
    image.resize(2 * 1024 * 1024 + 1, 0);

    let form = Form::new()
        .text("title", "T")
        .text("content", "C")
        .file("image", "big.png", "image/png", &image);
    let (status, body) = app
        .multipart(Method::POST, "/articles", Some(&token), form)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["image"][0].as_str().unwrap().contains("2048 kilobytes"));
}

#[tokio::test]
async fn listing_is_paginated_newest_first() {
    let app = TestApp::new();
    let (_, user_id) = app.register("Ada", "ada@example.com").await;
    for n in 1..=15 {
        app.repo
            .create_article(NewArticle {
                user_id,
                title: format!("Article {n}"),
                content: "C".to_string(),
                image: None,
            })
            .await
            .unwrap();
    }

    let (status, first) = app.get("/articles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"].as_array().unwrap().len(), 10);
    assert_eq!(first["data"][0]["title"], "Article 15");
    assert_eq!(first["current_page"], 1);
    assert_eq!(first["per_page"], 10);
    assert_eq!(first["total"], 15);
    assert_eq!(first["last_page"], 2);

    let (_, second) = app.get("/articles?page=2", None).await;
    assert_eq!(second["data"].as_array().unwrap().len(), 5);
    assert_eq!(second["data"][4]["title"], "Article 1");

    let (_, beyond) = app.get("/articles?page=3", None).await;
    assert!(beyond["data"].as_array().unwrap().is_empty());

    let (_, clamped) = app.get("/articles?page=0", None).await;
    assert_eq!(clamped["current_page"], 1);
}

#[tokio::test]
async fn huge_page_numbers_yield_an_empty_page() {
    let app = TestApp::new();
    let (token, _) = app.register("Ada", "ada@example.com").await;
    app.create_article(&token, "Only", None).await;

    let (status, body) = app.get("/articles?page=9223372036854775807", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["current_page"], i64::MAX / 10);
    assert_eq!(body["total"], 1);

    let (status, body) = app
        .get("/user-articles?page=1000000000000000000", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_query_and_path_answer_in_json() {
    let app = TestApp::new();

    let (status, body) = app.get("/articles?page=first", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = app.get("/articles/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn user_articles_lists_only_the_callers_own() {
    let app = TestApp::new();
    let (ada, _) = app.register("Ada", "ada@example.com").await;
    let (grace, _) = app.register("Grace", "grace@example.com").await;
    app.create_article(&ada, "Ada's", None).await;
    app.create_article(&grace, "Grace's", None).await;

    let (status, body) = app.get("/user-articles", Some(&ada)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Ada's");

    let (status, _) = app.get("/user-articles", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_article_is_not_found_for_every_operation() {
    let app = TestApp::new();
    let (token, _) = app.register("Ada", "ada@example.com").await;
    let uri = format!("/articles/{}", Uuid::new_v4());

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let form = Form::new().text("title", "T").text("content", "C");
    let (status, _) = app.multipart(Method::PUT, &uri, Some(&token), form).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(Method::PUT, &uri, Some(&token), json!({"title": "T"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_owner_cannot_modify_an_article() {
    let app = TestApp::new();
    let (owner, _) = app.register("Ada", "ada@example.com").await;
    let (intruder, _) = app.register("Mallory", "mallory@example.com").await;
    let created = app.create_article(&owner, "Original", None).await;
    let uri = format!("/articles/{}", created["id"].as_str().unwrap());

    let form = Form::new().text("title", "Hijacked").text("content", "C");
    let (status, body) = app
        .multipart(Method::PUT, &uri, Some(&intruder), form)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not allowed to modify this article.");

    let (status, _) = app.delete(&uri, Some(&intruder)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Original");
}

#[tokio::test]
async fn non_owner_is_forbidden_even_with_an_invalid_payload() {
    let app = TestApp::new();
    let (owner, _) = app.register("Ada", "ada@example.com").await;
    let (intruder, _) = app.register("Mallory", "mallory@example.com").await;
    let created = app.create_article(&owner, "Original", None).await;
    let uri = format!("/articles/{}", created["id"].as_str().unwrap());

    let (status, _) = app
        .multipart(Method::PUT, &uri, Some(&intruder), Form::new())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(Method::PUT, &uri, Some(&intruder), json!({"title": "Hijacked"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owner_sending_a_non_multipart_update_gets_a_json_error() {
    let app = TestApp::new();
    let (token, _) = app.register("Ada", "ada@example.com").await;
    let created = app.create_article(&token, "Original", None).await;
    let uri = format!("/articles/{}", created["id"].as_str().unwrap());

    let (status, body) = app
        .json(Method::PUT, &uri, Some(&token), json!({"title": "T", "content": "C"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (_, body) = app.get(&uri, None).await;
    assert_eq!(body["title"], "Original");
}

#[tokio::test]
async fn creating_an_article_requires_a_multipart_body() {
    let app = TestApp::new();
    let (token, _) = app.register("Ada", "ada@example.com").await;

    let (status, body) = app
        .json(Method::POST, "/articles", Some(&token), json!({"title": "T", "content": "C"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/articles")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn replacing_an_image_removes_the_previous_object() {
    let app = TestApp::new();
    let (token, _) = app.register("Ada", "ada@example.com").await;
    let created = app.create_article(&token, "Post", Some(&png("old"))).await;
    let old_key = key_from_url(&created["image_url"]);
    let uri = format!("/articles/{}", created["id"].as_str().unwrap());

    let form = Form::new()
        .text("title", "Post v2")
        .text("content", "Updated")
        .file("image", "new.png", "image/png", &png("new"));
    let (status, updated) = app.multipart(Method::PUT, &uri, Some(&token), form).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Post v2");

    let new_key = key_from_url(&updated["image_url"]);
    assert_ne!(new_key, old_key);
    assert!(app.storage.get(&old_key).is_none());
    assert_eq!(app.storage.get(&new_key).unwrap().as_ref(), png("new").as_slice());
}

#[tokio::test]
async fn update_without_image_keeps_the_current_one() {
    let app = TestApp::new();
    let (token, _) = app.register("Ada", "ada@example.com").await;
    let created = app.create_article(&token, "Post", Some(&png("keep"))).await;
    let uri = format!("/articles/{}", created["id"].as_str().unwrap());

    let form = Form::new().text("title", "Renamed").text("content", "C");
    let (status, updated) = app.multipart(Method::PUT, &uri, Some(&token), form).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["image_url"], created["image_url"]);
    assert_eq!(app.storage.keys().len(), 1);
}

#[tokio::test]
async fn deleting_an_article_removes_its_image_and_comments() {
    let app = TestApp::new();
    let (token, _) = app.register("Ada", "ada@example.com").await;
    let created = app.create_article(&token, "Post", Some(&png("bye"))).await;
    let id = created["id"].as_str().unwrap();
    app.json(
        Method::POST,
        &format!("/comment/{id}"),
        Some(&token),
        json!({ "body": "first!" }),
    )
    .await;

    let (status, body) = app.delete(&format!("/articles/{id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Article deleted successfully.");
    assert!(app.storage.keys().is_empty());

    let (status, _) = app.get(&format!("/comments/{id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- Comments ---

#[tokio::test]
async fn comments_are_added_and_listed_in_order() {
    let app = TestApp::new();
    let (ada, ada_id) = app.register("Ada", "ada@example.com").await;
    let (grace, _) = app.register("Grace", "grace@example.com").await;
    let article = app.create_article(&ada, "Post", None).await;
    let id = article["id"].as_str().unwrap();

    let (status, comment) = app
        .json(
            Method::POST,
            &format!("/comment/{id}"),
            Some(&ada),
            json!({ "body": "  Nice one  " }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["body"], "Nice one");
    assert_eq!(comment["user_id"], ada_id.to_string());
    assert_eq!(comment["author_name"], "Ada");

    app.json(
        Method::POST,
        &format!("/comment/{id}"),
        Some(&grace),
        json!({ "body": "Agreed" }),
    )
    .await;

    let (status, list) = app.get(&format!("/comments/{id}"), Some(&grace)).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["body"], "Nice one");
    assert_eq!(list[1]["author_name"], "Grace");
}

#[tokio::test]
async fn comment_endpoints_check_article_body_and_token() {
    let app = TestApp::new();
    let (token, _) = app.register("Ada", "ada@example.com").await;
    let article = app.create_article(&token, "Post", None).await;
    let id = article["id"].as_str().unwrap();

    let (status, _) = app
        .json(
            Method::POST,
            &format!("/comment/{}", Uuid::new_v4()),
            Some(&token),
            json!({ "body": "hello" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .json(
            Method::POST,
            &format!("/comment/{id}"),
            Some(&token),
            json!({ "body": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["body"].is_array());

    let (status, _) = app.get(&format!("/comments/{id}"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_the_author_can_edit_or_delete_a_comment() {
    let app = TestApp::new();
    let (ada, _) = app.register("Ada", "ada@example.com").await;
    let (mallory, _) = app.register("Mallory", "mallory@example.com").await;
    let article = app.create_article(&ada, "Post", None).await;
    let id = article["id"].as_str().unwrap();

    let (_, comment) = app
        .json(
            Method::POST,
            &format!("/comment/{id}"),
            Some(&ada),
            json!({ "body": "mine" }),
        )
        .await;
    let uri = format!("/articles/{id}/comments/{}", comment["id"]);

    let (status, _) = app
        .json(Method::PUT, &uri, Some(&mallory), json!({ "body": "yours now" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&uri, Some(&mallory)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .json(Method::PUT, &uri, Some(&ada), json!({ "body": "edited" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["body"], "edited");

    let (status, _) = app.delete(&uri, Some(&ada)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete(&uri, Some(&ada)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_addressed_through_another_article_is_not_found() {
    let app = TestApp::new();
    let (ada, _) = app.register("Ada", "ada@example.com").await;
    let first = app.create_article(&ada, "One", None).await;
    let second = app.create_article(&ada, "Two", None).await;

    let (_, comment) = app
        .json(
            Method::POST,
            &format!("/comment/{}", first["id"].as_str().unwrap()),
            Some(&ada),
            json!({ "body": "on one" }),
        )
        .await;

    let uri = format!(
        "/articles/{}/comments/{}",
        second["id"].as_str().unwrap(),
        comment["id"]
    );
    let (status, _) = app.delete(&uri, Some(&ada)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
