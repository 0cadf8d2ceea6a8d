//! Resolve configured course codes and ids into `(id, code)` pairs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use futures::future::join_all;

use crate::api::{ApiClient, ApiCourse};
use crate::error::{Result, SyncError};
use crate::pagination::{collect_pages, PAGES_PER_BATCH};

/// A course the run will sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseContext {
    pub id: i64,
    pub code: String,
}

/// Resolve `codes` (case-insensitive) and `ids` concurrently.
///
/// Codes that match no course and ids without a course code are dropped.
/// A course named both by code and by id appears once. Output is ordered by id.
pub async fn resolve_courses(
    client: &ApiClient,
    codes: &[String],
    ids: &[i64],
) -> Result<Vec<CourseContext>> {
    let (by_code, by_id) = tokio::try_join!(
        resolve_codes(client, codes),
        resolve_ids(client, ids)
    )?;
    let mut merged: BTreeMap<i64, String> = BTreeMap::new();
    merged.extend(by_code);
    merged.extend(by_id);
    Ok(merged
        .into_iter()
        .map(|(id, code)| CourseContext { id, code })
        .collect())
}

async fn resolve_codes(client: &ApiClient, codes: &[String]) -> Result<HashMap<i64, String>> {
    if codes.is_empty() {
        return Ok(HashMap::new());
    }
    let unmatched: Mutex<HashSet<String>> =
        Mutex::new(codes.iter().map(|c| c.to_lowercase()).collect());
    let unmatched = &unmatched;
    let found = collect_pages(PAGES_PER_BATCH, |page| async move {
        let url = client.api_url(&format!("courses?page={page}"));
        let page = client.get_page::<ApiCourse>(&url, true).await?;
        Ok::<_, SyncError>(page.map(|courses| {
            let mut remaining = unmatched.lock().unwrap_or_else(|e| e.into_inner());
            courses
                .into_iter()
                .filter_map(|c| {
                    let code = c.course_code?;
                    remaining.remove(&code.to_lowercase()).then_some((c.id, code))
                })
                .collect::<HashMap<_, _>>()
        }))
    })
    .await?;
    let remaining = unmatched.lock().unwrap_or_else(|e| e.into_inner());
    if !remaining.is_empty() {
        tracing::info!(codes = ?remaining, "course codes not found");
    }
    Ok(found)
}

async fn resolve_ids(client: &ApiClient, ids: &[i64]) -> Result<HashMap<i64, String>> {
    let lookups = ids.iter().map(|&id| async move {
        let url = client.api_url(&format!("courses/{id}"));
        let course = client.get_object::<ApiCourse>(&url).await?;
        Ok::<_, SyncError>(course.and_then(|c| c.course_code).map(|code| (id, code)))
    });
    let mut found = HashMap::new();
    for result in join_all(lookups).await {
        match result? {
            Some((id, code)) => {
                found.insert(id, code);
            }
            None => tracing::info!("course id has no course code, skipping"),
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        let cfg = SyncConfig {
            base_url: server.uri(),
            token: "t".into(),
            ..SyncConfig::default()
        };
        ApiClient::new(&cfg, 8).unwrap()
    }

    async fn empty_course_pages(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v1/courses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .with_priority(10)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn codes_match_case_insensitively() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 12, "course_code": "CS101"},
                {"id": 13, "course_code": "MA201"},
                {"id": 14}
            ])))
            .mount(&server)
            .await;
        empty_course_pages(&server).await;

        let courses = resolve_courses(&client(&server), &["cs101".into(), "PH999".into()], &[])
            .await
            .unwrap();
        assert_eq!(
            courses,
            vec![CourseContext {
                id: 12,
                code: "CS101".into()
            }]
        );
    }

    #[tokio::test]
    async fn ids_and_codes_merge_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 12, "course_code": "CS101"}])),
            )
            .mount(&server)
            .await;
        empty_course_pages(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses/12"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 12, "course_code": "CS101"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "course_code": "EE150"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses/8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 8})))
            .mount(&server)
            .await;

        let courses = resolve_courses(&client(&server), &["CS101".into()], &[12, 7, 8])
            .await
            .unwrap();
        let ids: Vec<i64> = courses.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![7, 12]);
        assert_eq!(courses[0].code, "EE150");
    }

    #[tokio::test]
    async fn listing_error_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"errors": [{"message": "Invalid access token."}]})),
            )
            .mount(&server)
            .await;

        let err = resolve_courses(&client(&server), &["CS101".into()], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Api(m) if m == "Invalid access token."));
    }

    #[tokio::test]
    async fn nothing_configured_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;
        let courses = resolve_courses(&client(&server), &[], &[]).await.unwrap();
        assert!(courses.is_empty());
    }
}
