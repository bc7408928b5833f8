use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use exam_core::model::{SubjectSelector, TestId};

use super::ExamBackend;
use super::wire::{GenerateTestRequest, GradeResponse, GradeTestRequest, TestPayload};
use crate::config::BackendConfig;
use crate::error::BackendError;

/// `ExamBackend` over the REST API.
///
/// Endpoints, relative to the configured base URL:
/// - `GET  cbt/tests/{testId}/subjects`
/// - `POST cbt/tests/generate`
/// - `POST cbt/tests/{testId}/grade`
#[derive(Clone)]
pub struct HttpExamBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpExamBackend {
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                BackendError::Unavailable(format!(
                    "base url cannot be extended: {}",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.api_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            warn!(%status, url = %response.url(), "exam backend returned an error status");
            return Err(BackendError::HttpStatus(status));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ExamBackend for HttpExamBackend {
    async fn list_subjects(&self, test_id: &TestId) -> Result<Vec<SubjectSelector>, BackendError> {
        let url = self.endpoint(&["cbt", "tests", test_id.as_str(), "subjects"])?;
        debug!(%url, "listing subjects");
        let response = self.authorize(self.client.get(url)).send().await?;
        Self::read_json(response).await
    }

    async fn generate_test(
        &self,
        request: &GenerateTestRequest,
    ) -> Result<TestPayload, BackendError> {
        let url = self.endpoint(&["cbt", "tests", "generate"])?;
        debug!(%url, test_id = %request.test_id, subjects = request.subjects.len(), "requesting test");
        let response = self
            .authorize(self.client.post(url))
            .json(request)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn grade_test(&self, request: &GradeTestRequest) -> Result<GradeResponse, BackendError> {
        let url = self.endpoint(&["cbt", "tests", request.test_id.as_str(), "grade"])?;
        debug!(%url, attempt_id = %request.attempt_id, answers = request.answers.len(), "requesting grade");
        let response = self
            .authorize(self.client.post(url))
            .json(request)
            .send()
            .await?;
        Self::read_json(response).await
    }
}
