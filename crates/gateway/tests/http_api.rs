use flate2::{write::GzEncoder, Compression};
use keeper_gateway::auth::TokenIssuer;
use keeper_gateway::{router, AppState, BlobStore, MemoryStore};
use keeper_protocol::routes;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;

const MASTER_KEY: &[u8] = b"test-master-key";

struct TestGateway {
    base: String,
    client: reqwest::Client,
    _files: tempfile::TempDir,
}

impl TestGateway {
    async fn start() -> Self {
        let files = tempfile::tempdir().unwrap();
        let blobs = BlobStore::open(files.path()).await.unwrap();
        let state = AppState::new(Arc::new(MemoryStore::new()), blobs, MASTER_KEY);
        let app = router(state, 1024 * 1024);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            _files: files,
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base, route)
    }

    async fn register(&self, user: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url(routes::REGISTER))
            .json(&json!({ "user_name": user, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn token_for(&self, user: &str, password: &str) -> String {
        let resp = self.register(user, password).await;
        assert_eq!(resp.status(), 200);
        bearer(&resp)
    }
}

fn bearer(resp: &reqwest::Response) -> String {
    resp.headers()["authorization"]
        .to_str()
        .unwrap()
        .trim_start_matches("Bearer ")
        .to_string()
}

#[tokio::test]
async fn readiness_endpoint_answers() {
    let gw = TestGateway::start().await;
    let body: Value = gw.client.get(gw.url(routes::READY)).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn registration_issues_token_and_key_once() {
    let gw = TestGateway::start().await;

    let resp = gw.register("alice", "pw1").await;
    assert_eq!(resp.status(), 200);
    assert!(!bearer(&resp).is_empty());
    let reply: Value = resp.json().await.unwrap();
    assert!(!reply["id"].as_str().unwrap().is_empty());
    assert_eq!(reply["msg"], "Вы успешно зарегистрированы и авторизованы!");
    assert_eq!(reply["key"].as_str().unwrap().len(), 24);

    let dup = gw.register("alice", "other").await;
    assert_eq!(dup.status(), 409);
    let body: Value = dup.json().await.unwrap();
    assert_eq!(body["error"], "Данный пользователь уже зарегистрирован!");

    let empty = gw.register("", "pw").await;
    assert_eq!(empty.status(), 400);
}

#[tokio::test]
async fn login_checks_password() {
    let gw = TestGateway::start().await;
    gw.register("alice", "pw1").await;

    let bad = gw
        .client
        .post(gw.url(routes::LOGIN))
        .json(&json!({ "user_name": "alice", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 401);

    let good = gw
        .client
        .post(gw.url(routes::LOGIN))
        .json(&json!({ "user_name": "alice", "password": "pw1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(good.status(), 200);
    assert!(!bearer(&good).is_empty());
    let reply: Value = good.json().await.unwrap();
    assert!(reply.get("key").is_none());
}

#[tokio::test]
async fn data_routes_require_a_valid_token_for_a_live_user() {
    let gw = TestGateway::start().await;
    let ghost = TokenIssuer::new(MASTER_KEY).issue("ghost").unwrap();

    for token in [None, Some("garbage".to_string()), Some(ghost)] {
        let mut req = gw.client.post(gw.url(routes::LIST)).json(&json!({}));
        if let Some(token) = &token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.unwrap();
        assert_eq!(resp.status(), 401, "token {token:?}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Ошибка авторизации!");
    }

    let update = gw
        .client
        .put(gw.url(routes::UPDATE))
        .json(&json!({ "type": "text", "body": "AAAA" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status(), 401);

    // Nothing was written by the rejected update.
    let token = gw.token_for("alice", "pw1").await;
    let list: Value = gw
        .client
        .post(gw.url(routes::LIST))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let gw = TestGateway::start().await;
    let token = gw.token_for("alice", "pw1").await;

    let resp = gw
        .client
        .put(gw.url(routes::UPDATE))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Ошибка в запросе");
}

#[tokio::test]
async fn gzip_request_bodies_are_accepted() {
    let gw = TestGateway::start().await;
    let token = gw.token_for("alice", "pw1").await;

    let payload = serde_json::to_vec(&json!({ "type": "text", "name": "Tm90ZQ==", "body": "AQID" })).unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&payload).unwrap();
    let packed = encoder.finish().unwrap();

    let stored: Value = gw
        .client
        .put(gw.url(routes::UPDATE))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .header("content-encoding", "gzip")
        .body(packed)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = stored["id"].as_str().unwrap().to_string();
    assert!(stored.get("body").is_none());

    let fetched: Value = gw
        .client
        .post(gw.url(routes::GET))
        .bearer_auth(&token)
        .json(&json!({ "id": id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["body"], "AQID");
    assert_eq!(fetched["name"], "Tm90ZQ==");
}
