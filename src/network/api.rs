use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::common::{
    Comment, CommentPage, CommentPayload, CreatedThread, ProjectDetail, ThreadPage, UploadFile,
};

use super::error::ApiError;

/// Provides the bearer token; consulted on every request.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Fixed token, for headless use and tests.
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateThreadBody<'a> {
    recipient_ids: &'a [i64],
}

/// REST client for the marketplace backend.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenSource>) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ApiError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("team_messenger/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        log::debug!("{method} {url}");
        let builder = self.http.request(method, url);
        match self.tokens.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// `GET /projects/{hash}`
    pub async fn get_project(&self, project_hash: &str) -> Result<ProjectDetail, ApiError> {
        let url = self.endpoint(&["projects", project_hash])?;
        let response = self.request(Method::GET, url).send().await?;
        Self::read_json(response).await
    }

    /// `GET /projects/{hash}/comment-groups?page&perPage&q`
    pub async fn list_comment_groups(
        &self,
        project_hash: &str,
        page: u32,
        per_page: u32,
        query: Option<&str>,
    ) -> Result<ThreadPage, ApiError> {
        let url = self.endpoint(&["projects", project_hash, "comment-groups"])?;
        let mut request = self
            .request(Method::GET, url)
            .query(&[("page", page.to_string()), ("perPage", per_page.to_string())]);
        if let Some(query) = query.map(str::trim).filter(|query| !query.is_empty()) {
            request = request.query(&[("q", query)]);
        }
        Self::read_json(request.send().await?).await
    }

    /// `POST /projects/{hash}/comment-groups`, returns the new thread hash.
    pub async fn create_comment_group(
        &self,
        project_hash: &str,
        recipient_ids: &[i64],
    ) -> Result<String, ApiError> {
        let url = self.endpoint(&["projects", project_hash, "comment-groups"])?;
        let response = self
            .request(Method::POST, url)
            .json(&CreateThreadBody { recipient_ids })
            .send()
            .await?;
        let created: CreatedThread = Self::read_json(response).await?;
        Ok(created.hash)
    }

    /// `GET /comment-groups/{hash}/comments?beforeId&limit`
    pub async fn list_comments(
        &self,
        group_hash: &str,
        before_id: Option<i64>,
        limit: u32,
    ) -> Result<CommentPage, ApiError> {
        let url = self.endpoint(&["comment-groups", group_hash, "comments"])?;
        let mut request = self
            .request(Method::GET, url)
            .query(&[("limit", limit.to_string())]);
        if let Some(before_id) = before_id {
            request = request.query(&[("beforeId", before_id.to_string())]);
        }
        Self::read_json(request.send().await?).await
    }

    /// `POST /comment-groups/{hash}/comments`
    ///
    /// Plain JSON without attachments; otherwise multipart with the JSON in a
    /// `data` field and one `attachments[]` part per file.
    pub async fn post_comment(
        &self,
        group_hash: &str,
        payload: &CommentPayload,
        attachments: &[UploadFile],
    ) -> Result<Comment, ApiError> {
        let url = self.endpoint(&["comment-groups", group_hash, "comments"])?;
        let request = self.request(Method::POST, url);

        let request = if attachments.is_empty() {
            request.json(payload)
        } else {
            request.multipart(build_form(payload, attachments).await?)
        };

        Self::read_json(request.send().await?).await
    }
}

async fn build_form(payload: &CommentPayload, attachments: &[UploadFile]) -> Result<Form, ApiError> {
    let mut form = Form::new().text("data", serde_json::to_string(payload)?);
    for file in attachments {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| ApiError::Attachment {
                path: file.path.display().to_string(),
                source,
            })?;
        let part = Part::bytes(bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)?;
        form = form.part("attachments[]", part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> ApiClient {
        ApiClient::new(
            &format!("{}/api/", server.uri()),
            Arc::new(StaticToken(token.map(str::to_string))),
        )
        .unwrap()
    }

    fn comment_json(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "slug": format!("c-{id}"),
            "message": format!("message {id}"),
            "createdAt": "2024-03-01T10:00:00Z",
            "author": {"id": 1, "name": "Ana"}
        })
    }

    #[test]
    fn rejects_non_base_urls() {
        let tokens: Arc<dyn TokenSource> = Arc::new(StaticToken(None));
        assert!(matches!(
            ApiClient::new("mailto:someone@example.com", tokens.clone()),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("not a url", tokens),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn thread_list_sends_paging_search_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/p1/comment-groups"))
            .and(query_param("page", "2"))
            .and(query_param("perPage", "20"))
            .and(query_param("q", "budget"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [],
                "page": 2,
                "perPage": 20,
                "total": 20
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server, Some("secret"))
            .list_comment_groups("p1", 2, 20, Some(" budget "))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, Some(20));
    }

    #[tokio::test]
    async fn anonymous_requests_carry_no_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/comment-groups/g1/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        client(&server, None)
            .list_comments("g1", None, 20)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
        assert!(
            requests[0]
                .url
                .query_pairs()
                .all(|(key, _)| key != "beforeId")
        );
    }

    #[tokio::test]
    async fn comments_pass_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/comment-groups/g1/comments"))
            .and(query_param("beforeId", "40"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [comment_json(39), comment_json(38)],
                "nextCursor": {"beforeId": 38}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server, None)
            .list_comments("g1", Some(40), 2)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_before_id(), Some(38));
    }

    #[tokio::test]
    async fn create_thread_posts_recipient_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/projects/p1/comment-groups"))
            .and(body_json(json!({"recipientIds": [3, 5]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9, "hash": "g9"})))
            .expect(1)
            .mount(&server)
            .await;

        let hash = client(&server, None)
            .create_comment_group("p1", &[3, 5])
            .await
            .unwrap();
        assert_eq!(hash, "g9");
    }

    #[tokio::test]
    async fn reply_without_files_is_plain_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/comment-groups/g1/comments"))
            .and(body_json(json!({"subject": "Hi", "message": "Body"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(comment_json(11)))
            .expect(1)
            .mount(&server)
            .await;

        let payload = CommentPayload {
            subject: Some("Hi".into()),
            message: Some("Body".into()),
        };
        let comment = client(&server, None)
            .post_comment("g1", &payload, &[])
            .await
            .unwrap();
        assert_eq!(comment.id, 11);
    }

    #[tokio::test]
    async fn reply_with_files_is_multipart() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("deck.pdf");
        std::fs::write(&file_path, b"%PDF-1.4 pitch").unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/comment-groups/g1/comments"))
            .and(body_string_contains("name=\"data\""))
            .and(body_string_contains(r#"{"message":"See deck"}"#))
            .and(body_string_contains("name=\"attachments[]\"; filename=\"deck.pdf\""))
            .and(body_string_contains("%PDF-1.4 pitch"))
            .respond_with(ResponseTemplate::new(201).set_body_json(comment_json(12)))
            .expect(1)
            .mount(&server)
            .await;

        let payload = CommentPayload {
            subject: None,
            message: Some("See deck".into()),
        };
        let files = [UploadFile {
            path: file_path,
            file_name: "deck.pdf".into(),
            mime: "application/pdf".into(),
        }];
        let comment = client(&server, None)
            .post_comment("g1", &payload, &files)
            .await
            .unwrap();
        assert_eq!(comment.id, 12);

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0]
            .headers
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn missing_attachment_is_reported_without_request() {
        let server = MockServer::start().await;
        let files = [UploadFile {
            path: "/definitely/not/here.png".into(),
            file_name: "here.png".into(),
            mime: "image/png".into(),
        }];
        let err = client(&server, None)
            .post_comment("g1", &CommentPayload::default(), &files)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Attachment { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn http_errors_carry_backend_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/p1"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden project"})),
            )
            .mount(&server)
            .await;

        let err = client(&server, None).get_project("p1").await.unwrap_err();
        assert_eq!(err.to_string(), "Forbidden project");
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server, None).get_project("p1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
