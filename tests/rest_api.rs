use pulseboard_backend::api::{self, AppState};
use pulseboard_backend::config::{PulseboardConfig, PulseboardPaths};
use pulseboard_backend::database::Database;
use pulseboard_backend::identity::{Actor, InMemoryDirectory, Role};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tokio::time::{sleep, Duration};

struct TestServer {
    _dir: TempDir,
    server: tokio::task::JoinHandle<()>,
    base_url: String,
}

impl TestServer {
    async fn shutdown(self) {
        self.server.abort();
        let _ = self.server.await;
    }
}

fn next_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .unwrap()
        .port()
}

fn actor(user_id: &str, role: Role) -> Actor {
    Actor {
        user_id: user_id.into(),
        role,
        shadow_banned: false,
    }
}

async fn wait_for_health(base_url: &str) {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not become healthy in time");
}

async fn spawn_server() -> TestServer {
    let dir = tempdir().expect("tempdir");
    let port = next_port();
    let paths = PulseboardPaths::from_base_dir(dir.path()).expect("paths");
    paths.ensure_directories().expect("data dir");
    let config = PulseboardConfig::new(port, paths.clone());

    let database = Database::connect(&paths).expect("open db");
    database.ensure_migrations().expect("migrations");

    let directory = InMemoryDirectory::new();
    directory.upsert(actor("u1", Role::User));
    directory.upsert(actor("u2", Role::User));
    directory.upsert(actor("admin", Role::Admin));

    let state = AppState::new(config, database, Arc::new(directory));
    let server = tokio::spawn(async move {
        let _ = api::serve_http(state).await;
    });

    let base_url = format!("http://127.0.0.1:{port}");
    wait_for_health(&base_url).await;

    TestServer {
        _dir: dir,
        server,
        base_url,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn engagement_round_trip() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let content: serde_json::Value = client
        .post(format!("{base}/contents"))
        .json(&serde_json::json!({
            "id": "c1",
            "kind": "article",
            "author_id": "author",
            "published": true
        }))
        .send()
        .await
        .expect("register content")
        .json()
        .await
        .expect("content json");
    assert_eq!(content["likes_count"], 0);

    // Anonymous likes are refused outright.
    let resp = client
        .post(format!("{base}/contents/c1/like"))
        .send()
        .await
        .expect("anon like");
    assert_eq!(resp.status(), 401);

    let like: serde_json::Value = client
        .post(format!("{base}/contents/c1/like"))
        .header("x-user-id", "u1")
        .send()
        .await
        .expect("like")
        .json()
        .await
        .expect("like json");
    assert_eq!(like["liked"], true);
    assert_eq!(like["likes_count"], 1);

    let unlike: serde_json::Value = client
        .post(format!("{base}/contents/c1/like"))
        .header("x-user-id", "u1")
        .send()
        .await
        .expect("unlike")
        .json()
        .await
        .expect("unlike json");
    assert_eq!(unlike["liked"], false);
    assert_eq!(unlike["likes_count"], 0);

    for _ in 0..2 {
        client
            .post(format!("{base}/contents/c1/views"))
            .send()
            .await
            .expect("record view");
    }

    let comment: serde_json::Value = client
        .post(format!("{base}/contents/c1/comments"))
        .header("x-user-id", "u2")
        .json(&serde_json::json!({ "body": "great read" }))
        .send()
        .await
        .expect("comment")
        .json()
        .await
        .expect("comment json");
    let comment_id = comment["id"].as_str().expect("comment id").to_string();

    let reply: serde_json::Value = client
        .post(format!("{base}/contents/c1/comments"))
        .header("x-user-id", "u1")
        .json(&serde_json::json!({ "parent_id": comment_id, "body": "agreed" }))
        .send()
        .await
        .expect("reply")
        .json()
        .await
        .expect("reply json");
    let reply_id = reply["id"].as_str().expect("reply id").to_string();

    // Depth is capped at one level.
    let resp = client
        .post(format!("{base}/contents/c1/comments"))
        .header("x-user-id", "u2")
        .json(&serde_json::json!({ "parent_id": reply_id, "body": "too deep" }))
        .send()
        .await
        .expect("deep reply");
    assert_eq!(resp.status(), 400);

    let aggregate: serde_json::Value = client
        .get(format!("{base}/contents/c1/aggregate"))
        .header("x-user-id", "u1")
        .send()
        .await
        .expect("aggregate")
        .json()
        .await
        .expect("aggregate json");
    assert_eq!(aggregate["likes_count"], 0);
    assert_eq!(aggregate["comments_count"], 2);
    assert_eq!(aggregate["views_count"], 2);
    assert_eq!(aggregate["viewer_has_liked"], false);

    let listing: serde_json::Value = client
        .get(format!("{base}/contents/c1/comments"))
        .send()
        .await
        .expect("list comments")
        .json()
        .await
        .expect("listing json");
    let threads = listing["comments"].as_array().expect("threads");
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["comment"]["id"], comment_id.as_str());
    assert_eq!(threads[0]["replies"].as_array().unwrap().len(), 1);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn moderation_round_trip() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    client
        .post(format!("{base}/contents"))
        .json(&serde_json::json!({
            "id": "c1",
            "kind": "video",
            "author_id": "author",
            "published": true
        }))
        .send()
        .await
        .expect("register content");

    let comment: serde_json::Value = client
        .post(format!("{base}/contents/c1/comments"))
        .header("x-user-id", "u2")
        .json(&serde_json::json!({ "body": "hot take" }))
        .send()
        .await
        .expect("comment")
        .json()
        .await
        .expect("comment json");
    let comment_id = comment["id"].as_str().expect("comment id").to_string();

    // Only admins may ban.
    let resp = client
        .post(format!("{base}/users/u2/shadow-ban"))
        .header("x-user-id", "u1")
        .json(&serde_json::json!({ "banned": true }))
        .send()
        .await
        .expect("ban as user");
    assert_eq!(resp.status(), 403);

    let resp = client
        .post(format!("{base}/users/u2/shadow-ban"))
        .header("x-user-id", "admin")
        .json(&serde_json::json!({ "banned": true }))
        .send()
        .await
        .expect("ban as admin");
    assert_eq!(resp.status(), 204);

    // The existing comment disappears from listings without being deleted.
    let listing: serde_json::Value = client
        .get(format!("{base}/contents/c1/comments"))
        .send()
        .await
        .expect("list comments")
        .json()
        .await
        .expect("listing json");
    assert!(listing["comments"].as_array().unwrap().is_empty());

    // And the banned user is told why new submissions are refused.
    let resp = client
        .post(format!("{base}/contents/c1/comments"))
        .header("x-user-id", "u2")
        .json(&serde_json::json!({ "body": "again" }))
        .send()
        .await
        .expect("banned comment");
    assert_eq!(resp.status(), 403);

    let resp = client
        .post(format!("{base}/users/u2/shadow-ban"))
        .header("x-user-id", "admin")
        .json(&serde_json::json!({ "banned": false }))
        .send()
        .await
        .expect("unban");
    assert_eq!(resp.status(), 204);

    // Non-admins may not delete; admins remove the row for good.
    let resp = client
        .delete(format!("{base}/comments/{comment_id}"))
        .header("x-user-id", "u2")
        .send()
        .await
        .expect("delete as user");
    assert_eq!(resp.status(), 403);

    let deleted: serde_json::Value = client
        .delete(format!("{base}/comments/{comment_id}"))
        .header("x-user-id", "admin")
        .send()
        .await
        .expect("delete as admin")
        .json()
        .await
        .expect("delete json");
    assert_eq!(deleted["removed"], 1);

    let aggregate: serde_json::Value = client
        .get(format!("{base}/contents/c1/aggregate"))
        .send()
        .await
        .expect("aggregate")
        .json()
        .await
        .expect("aggregate json");
    assert_eq!(aggregate["comments_count"], 0);

    // Subscribing to unknown content is a 404, not an open stream.
    let resp = client
        .get(format!("{base}/contents/nope/subscribe"))
        .send()
        .await
        .expect("subscribe unknown");
    assert_eq!(resp.status(), 404);

    // Purge hook removes the content and everything hanging off it.
    let resp = client
        .delete(format!("{base}/contents/c1"))
        .send()
        .await
        .expect("purge");
    assert_eq!(resp.status(), 204);

    let resp = client
        .get(format!("{base}/contents/c1/aggregate"))
        .send()
        .await
        .expect("aggregate after purge");
    assert_eq!(resp.status(), 404);

    server.shutdown().await;
}
