//! A wiremock stand-in for the slice of the Canvas API the engine uses.
//!
//! Every list endpoint serves its entries on page 1 and an empty list for any
//! other page. File entries point at `/files/{id}/download` on the same server.

use std::path::Path;

use canvas_sync_core::config::{RetryConfig, SyncConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fallback priority for "any other page" mocks (lower number wins in wiremock).
const FALLBACK: u8 = 10;

pub struct FileSpec<'a> {
    pub id: i64,
    pub folder_id: i64,
    pub name: &'a str,
    pub modified_at: &'a str,
    pub size: usize,
}

/// Deterministic body for file `id`.
pub fn body(id: i64, size: usize) -> Vec<u8> {
    (0..size).map(|i| ((i as i64 + id) % 251) as u8).collect()
}

pub struct CanvasMock {
    pub server: MockServer,
}

impl CanvasMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Config pointed at this server: course `CS101`, fast retries, no prompts.
    pub fn config(&self, download_dir: &Path) -> SyncConfig {
        SyncConfig {
            base_url: self.uri(),
            token: "test-token".into(),
            course_codes: vec!["CS101".into()],
            download_dir: download_dir.to_path_buf(),
            connection_count: 4,
            filesize_threshold_mb: 10.0,
            auto_confirm: true,
            retry: Some(RetryConfig {
                max_attempts: 2,
                base_delay_secs: 0.0,
                max_delay_secs: 0,
            }),
            ..SyncConfig::default()
        }
    }

    async fn paged(&self, route: String, entries: Value) {
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(entries))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .with_priority(FALLBACK)
            .mount(&self.server)
            .await;
    }

    pub async fn courses(&self, courses: &[(i64, &str)]) {
        let entries: Vec<Value> = courses
            .iter()
            .map(|(id, code)| json!({"id": id, "name": format!("Course {code}"), "course_code": code}))
            .collect();
        self.paged("/api/v1/courses".into(), Value::Array(entries)).await;
    }

    pub async fn folders(&self, course_id: i64, folders: &[(i64, &str)]) {
        let entries: Vec<Value> = folders
            .iter()
            .map(|(id, full_name)| json!({"id": id, "full_name": full_name, "name": full_name}))
            .collect();
        self.paged(
            format!("/api/v1/courses/{course_id}/folders"),
            Value::Array(entries),
        )
        .await;
    }

    pub async fn files(&self, course_id: i64, files: &[FileSpec<'_>]) {
        let entries: Vec<Value> = files
            .iter()
            .map(|f| {
                json!({
                    "id": f.id,
                    "folder_id": f.folder_id,
                    "display_name": f.name,
                    "url": format!("{}/files/{}/download", self.uri(), f.id),
                    "size": f.size,
                    "modified_at": f.modified_at,
                })
            })
            .collect();
        self.paged(
            format!("/api/v1/courses/{course_id}/files"),
            Value::Array(entries),
        )
        .await;
    }

    /// Serve HEAD and GET for file `id`, optionally asserting call counts on drop.
    pub async fn serve_file(&self, id: i64, size: usize, head_calls: Option<u64>, get_calls: Option<u64>) {
        let route = format!("/files/{id}/download");
        let mut head = Mock::given(method("HEAD"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body(id, size)));
        if let Some(n) = head_calls {
            head = head.expect(n);
        }
        head.mount(&self.server).await;

        let mut get = Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body(id, size)));
        if let Some(n) = get_calls {
            get = get.expect(n);
        }
        get.mount(&self.server).await;
    }
}
