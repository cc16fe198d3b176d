use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{ServerState, router};

async fn app() -> (Router, Arc<Engine>) {
    // A named shared-cache in-memory DB with a multi-connection pool:
    // sea-orm caps unnamed sqlite::memory: pools at one connection, which
    // deadlocks operations that hold a transaction while reading through
    // the admin store. The counter keeps each test on its own database.
    static DB_ID: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
    let id = DB_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let mut opts = ConnectOptions::new(format!(
        "sqlite:file:api_test_{id}?mode=memory&cache=shared"
    ));
    opts.max_connections(4);
    let db = Database::connect(opts).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Arc::new(Engine::builder().database(db).build().unwrap());
    let state = ServerState {
        engine: engine.clone(),
    };
    (router(state), engine)
}

async fn token_for(engine: &Engine, email: &str, admin: bool) -> String {
    let (_user, token) = engine
        .admin_store()
        .create_identity(email, None, admin)
        .await
        .unwrap();
    token
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let (app, _engine) = app().await;

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/wallets").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(res).await;
    assert!(body["error"].is_string());

    let res = app.oneshot(get("/wallets", "not-a-token")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wallet_create_and_list_roundtrip() {
    let (app, engine) = app().await;
    let token = token_for(&engine, "alice@example.com", false).await;

    let res = app
        .clone()
        .oneshot(post_json("/wallets", &token, &json!({ "name": "Casa" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["name"], json!("Casa"));
    let wallet_id = body["data"]["id"].as_str().unwrap().to_string();

    let res = app.clone().oneshot(get("/wallets", &token)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], json!(wallet_id));

    // An empty name never reaches storage.
    let res = app
        .oneshot(post_json("/wallets", &token, &json!({ "name": "   " })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expense_lifecycle_over_http() {
    let (app, engine) = app().await;
    let token = token_for(&engine, "alice@example.com", false).await;

    let res = app
        .clone()
        .oneshot(post_json("/wallets", &token, &json!({ "name": "Casa" })))
        .await
        .unwrap();
    let wallet_id = json_body(res).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = app
        .clone()
        .oneshot(post_json(
            "/expenses",
            &token,
            &json!({
                "wallet_id": wallet_id,
                "item": "Burger",
                "price": 9.90,
                "icon": "🍔",
                "date": "2026-03-05"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["category"], json!("food"));
    assert_eq!(body["data"]["icon"], json!("🍔"));
    assert_eq!(body["data"]["store"], json!("Unknown Store"));
    let expense_id = body["data"]["id"].as_str().unwrap().to_string();

    // Month filter hits, wrong month misses.
    let uri = format!("/expenses?wallet_id={wallet_id}&month=3&year=2026");
    let res = app.clone().oneshot(get(&uri, &token)).await.unwrap();
    assert_eq!(json_body(res).await.as_array().unwrap().len(), 1);

    let uri = format!("/expenses?wallet_id={wallet_id}&month=4&year=2026");
    let res = app.clone().oneshot(get(&uri, &token)).await.unwrap();
    assert!(json_body(res).await.as_array().unwrap().is_empty());

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/expenses/{expense_id}"),
            &token,
            &json!({}),
        ))
        .await
        .unwrap();
    // POST on the item route is not defined.
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let res = app
        .clone()
        .oneshot(delete(&format!("/expenses/{expense_id}"), &token))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["success"], json!(true));
}

#[tokio::test]
async fn listing_without_wallet_id_is_an_empty_array() {
    let (app, engine) = app().await;
    let token = token_for(&engine, "alice@example.com", false).await;

    let res = app.oneshot(get("/expenses", &token)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, json!([]));
}

#[tokio::test]
async fn strangers_get_403_with_an_error_body() {
    let (app, engine) = app().await;
    let owner = token_for(&engine, "alice@example.com", false).await;
    let stranger = token_for(&engine, "mallory@example.com", false).await;

    let res = app
        .clone()
        .oneshot(post_json("/wallets", &owner, &json!({ "name": "Casa" })))
        .await
        .unwrap();
    let wallet_id = json_body(res).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let uri = format!("/expenses?wallet_id={wallet_id}");
    let res = app.clone().oneshot(get(&uri, &stranger)).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = json_body(res).await;
    assert_eq!(body["error"], json!("Forbidden: no access to this wallet"));

    // Member management is owner-only.
    let res = app
        .oneshot(post_json(
            &format!("/wallets/{wallet_id}/members"),
            &stranger,
            &json!({ "email": "mallory@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn member_invitation_over_http() {
    let (app, engine) = app().await;
    let owner = token_for(&engine, "alice@example.com", false).await;
    let member = token_for(&engine, "bob@example.com", false).await;

    let res = app
        .clone()
        .oneshot(post_json("/wallets", &owner, &json!({ "name": "Trip" })))
        .await
        .unwrap();
    let wallet_id = json_body(res).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/wallets/{wallet_id}/members"),
            &owner,
            &json!({ "email": "bob@example.com", "role": "member" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Unknown invitee is a 404.
    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/wallets/{wallet_id}/members"),
            &owner,
            &json!({ "email": "ghost@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .clone()
        .oneshot(get(&format!("/wallets/{wallet_id}/members"), &owner))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let members = body["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);

    // The invited member can now see the wallet.
    let res = app.oneshot(get("/wallets", &member)).await.unwrap();
    assert_eq!(json_body(res).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn upload_reports_inserted_and_rejected() {
    let (app, engine) = app().await;
    let token = token_for(&engine, "alice@example.com", false).await;

    let res = app
        .clone()
        .oneshot(post_json("/wallets", &token, &json!({ "name": "Casa" })))
        .await
        .unwrap();
    let wallet_id = json_body(res).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let csv = "date,item,store,price\n\
               2026-03-01,Coffee,Bar Roma,2.50\n\
               2026-03-02,,Bar Roma,3.00\n";
    let boundary = "X-UPLOAD-BOUNDARY";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"wallet_id\"\r\n\r\n\
         {wallet_id}\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"export.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{boundary}--\r\n"
    );

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let res = app.clone().oneshot(request).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["inserted"], json!(1));
    assert_eq!(body["rejected"].as_array().unwrap().len(), 1);
    assert_eq!(body["rejected"][0]["reason"], json!("missing item"));

    let uri = format!("/expenses?wallet_id={wallet_id}");
    let res = app.oneshot(get(&uri, &token)).await.unwrap();
    assert_eq!(json_body(res).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn admin_surface_is_admin_only() {
    let (app, engine) = app().await;
    let admin = token_for(&engine, "root@example.com", true).await;
    let plain = token_for(&engine, "alice@example.com", false).await;

    let res = app.clone().oneshot(get("/admin/users", &plain)).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.clone().oneshot(get("/admin/users", &admin)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    let alice = users
        .iter()
        .find(|u| u["email"] == json!("alice@example.com"))
        .unwrap();
    let alice_id = alice["id"].as_str().unwrap().to_string();

    // Block alice and watch her previously valid token stop working.
    let res = app
        .clone()
        .oneshot(post_json(
            "/admin/action",
            &admin,
            &json!({ "user_id": alice_id, "action": "block" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.clone().oneshot(get("/wallets", &plain)).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(res).await["error"],
        json!("Forbidden: account blocked")
    );

    // Unknown actions are rejected up front.
    let res = app
        .oneshot(post_json(
            "/admin/action",
            &admin,
            &json!({ "user_id": "whoever", "action": "smite" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
