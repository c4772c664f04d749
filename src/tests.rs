//! Integration tests for the tracker backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::StoreBackend;
use crate::identity::FileIdentity;
use crate::repository::ApplicationRepository;
use crate::{create_router, open_store, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_url = Self::serve(&temp_dir).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    /// Start a server over the store and identity files in `dir`.
    async fn serve(dir: &TempDir) -> String {
        let backend = StoreBackend::Sqlite {
            db_path: dir.path().join("test.sqlite"),
        };
        let store = open_store(&backend).await.expect("Failed to open store");
        let identity = Arc::new(FileIdentity::new(dir.path().join("owner_id")));

        let repo = Arc::new(ApplicationRepository::new(store, identity));
        repo.initialize().await.expect("Failed to initialize");

        let app = create_router(AppState { repo });

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        format!("http://{}", addr)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create(&self, body: Value) -> Value {
        let resp = self
            .client
            .post(self.url("/api/applications"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }

    async fn get_json(&self, path: &str) -> Value {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }
}

fn google() -> Value {
    json!({
        "company": "Google",
        "role": "SWE Intern",
        "platform": "LinkedIn",
        "status": "Applied",
        "dateApplied": "2026-01-10",
        "location": "Remote",
        "notes": ""
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_status_after_startup() {
    let fixture = TestFixture::new().await;

    let body = fixture.get_json("/api/status").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["loading"], false);
    assert!(body["data"]["ownerId"].is_string());
    assert!(body["data"]["lastError"].is_null());
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_add_application_scenario() {
    let fixture = TestFixture::new().await;

    let body = fixture.create(google()).await;
    assert_eq!(body["success"], true);
    assert!(body["data"]["id"].is_string());
    assert!(body["data"]["created_at"].is_string());
    assert!(body["data"]["user_id"].is_string());
    assert_eq!(body["data"]["company"], "Google");
    assert_eq!(body["data"]["dateApplied"], "2026-01-10");
    assert!(body["data"].get("dateapplied").is_none());

    let list = fixture.get_json("/api/applications").await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let stats = fixture.get_json("/api/stats").await;
    assert_eq!(
        stats["data"],
        json!({ "total": 1, "applied": 1, "interviewing": 0, "accepted": 0, "rejected": 0 })
    );
}

#[tokio::test]
async fn test_add_uses_defaults() {
    let fixture = TestFixture::new().await;

    let body = fixture
        .create(json!({ "company": "Stripe", "role": "Backend Intern" }))
        .await;
    assert_eq!(body["data"]["platform"], "LinkedIn");
    assert_eq!(body["data"]["status"], "Applied");
    assert!(body["data"]["dateApplied"].is_string());
}

#[tokio::test]
async fn test_add_requires_company_and_role() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/applications"))
        .json(&json!({ "company": "  ", "role": "SWE Intern" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let list = fixture.get_json("/api/applications").await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_status_is_rejected() {
    let fixture = TestFixture::new().await;

    let mut input = google();
    input["status"] = json!("Ghosted");
    let resp = fixture
        .client
        .post(fixture.url("/api/applications"))
        .json(&input)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let mut input = google();
    input["platform"] = json!("Myspace");
    let resp = fixture
        .client
        .post(fixture.url("/api/applications"))
        .json(&input)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let created = fixture.create(google()).await;
    let id = created["data"]["id"].as_str().unwrap();
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/applications/{}", id)))
        .json(&json!({ "status": "Lost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let stats = fixture.get_json("/api/stats").await;
    assert_eq!(stats["data"]["total"], 1);
    assert_eq!(stats["data"]["applied"], 1);
}

#[tokio::test]
async fn test_update_status_scenario() {
    let fixture = TestFixture::new().await;

    let mut input = google();
    input["status"] = json!("Interviewing");
    let created = fixture.create(input).await;
    let id = created["data"]["id"].as_str().unwrap();

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/applications/{}", id)))
        .json(&json!({ "status": "Accepted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    let mut expected = created["data"].clone();
    expected["status"] = json!("Accepted");
    assert_eq!(body["data"], expected);

    let stats = fixture.get_json("/api/stats").await;
    assert_eq!(stats["data"]["interviewing"], 0);
    assert_eq!(stats["data"]["accepted"], 1);

    // The stored row matches after a re-fetch.
    let refresh = fixture
        .client
        .post(fixture.url("/api/refresh"))
        .send()
        .await
        .unwrap();
    assert_eq!(refresh.status(), 200);
    let fetched = fixture
        .get_json(&format!("/api/applications/{}", id))
        .await;
    assert_eq!(fetched["data"], expected);
}

#[tokio::test]
async fn test_update_unknown_application() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .put(fixture.url("/api/applications/nonexistent"))
        .json(&json!({ "status": "Rejected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_update_rejects_blank_company() {
    let fixture = TestFixture::new().await;
    let created = fixture.create(google()).await;
    let id = created["data"]["id"].as_str().unwrap();

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/applications/{}", id)))
        .json(&json!({ "company": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let fetched = fixture
        .get_json(&format!("/api/applications/{}", id))
        .await;
    assert_eq!(fetched["data"]["company"], "Google");
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let fixture = TestFixture::new().await;
    let created = fixture.create(google()).await;
    let id = created["data"]["id"].as_str().unwrap();

    for _ in 0..2 {
        let resp = fixture
            .client
            .delete(fixture.url(&format!("/api/applications/{}", id)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/applications/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let stats = fixture.get_json("/api/stats").await;
    assert_eq!(stats["data"]["total"], 0);
}

#[tokio::test]
async fn test_list_is_newest_first_and_searchable() {
    let fixture = TestFixture::new().await;
    fixture.create(google()).await;
    fixture
        .create(json!({ "company": "Meta", "role": "Data Intern", "platform": "Referral" }))
        .await;
    fixture
        .create(json!({ "company": "Notion", "role": "Design Intern", "platform": "Referral" }))
        .await;

    let list = fixture.get_json("/api/applications").await;
    let companies: Vec<_> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["company"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(companies, vec!["Notion", "Meta", "Google"]);

    let found = fixture.get_json("/api/applications?q=swe").await;
    assert_eq!(found["data"].as_array().unwrap().len(), 1);
    assert_eq!(found["data"][0]["company"], "Google");

    let found = fixture.get_json("/api/applications?q=META").await;
    assert_eq!(found["data"].as_array().unwrap().len(), 1);

    let recent = fixture.get_json("/api/applications?limit=2").await;
    let recent: Vec<_> = recent["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["company"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(recent, vec!["Notion", "Meta"]);

    let found = fixture.get_json("/api/applications?q=intern&limit=1").await;
    assert_eq!(found["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_analytics() {
    let fixture = TestFixture::new().await;
    fixture.create(google()).await;
    fixture
        .create(json!({ "company": "Meta", "role": "Data Intern", "platform": "Referral", "status": "Rejected" }))
        .await;
    fixture
        .create(json!({ "company": "Notion", "role": "Design Intern", "platform": "Referral" }))
        .await;

    let body = fixture.get_json("/api/analytics").await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(
        body["data"]["statuses"],
        json!([
            { "status": "Applied", "count": 2 },
            { "status": "Rejected", "count": 1 }
        ])
    );
    assert_eq!(
        body["data"]["platforms"],
        json!([
            { "platform": "Referral", "applications": 2 },
            { "platform": "LinkedIn", "applications": 1 }
        ])
    );
}

#[tokio::test]
async fn test_data_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let client = Client::new();

    let first = TestFixture::serve(&temp_dir).await;
    let resp = client
        .post(format!("{}/api/applications", first))
        .json(&google())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let owner_before: Value = client
        .get(format!("{}/api/status", first))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // A second server over the same files resolves the same owner and rows.
    let second = TestFixture::serve(&temp_dir).await;
    let status: Value = client
        .get(format!("{}/api/status", second))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["data"]["ownerId"], owner_before["data"]["ownerId"]);
    assert_eq!(status["data"]["count"], 1);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/applications"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}
