use crate::config::Credentials;
use crate::constants::{ACCOUNT_PATH, CONFIRM_PATH, JOBS_PATH, UPLOAD_URL_PATH};
use crate::error::{ConversionFailure, Error, Result};
use crate::models::{
    Account, AccountBody, ConfirmReceipt, ConfirmRequest, Job, JobBody, JobsBody, ListJobsQuery,
    UploadSlot, UploadUrlRequest,
};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Authenticated calls against the service API plus the raw pre-signed
/// upload and download requests.
#[derive(Clone)]
pub struct ApiService {
    credentials: Arc<Credentials>,
    transport: Arc<dyn Transport>,
}

impl ApiService {
    pub fn new(credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            credentials: Arc::new(credentials),
            transport,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) async fn request_upload_slot(
        &self,
        body: &UploadUrlRequest<'_>,
    ) -> Result<UploadSlot, ConversionFailure> {
        self.post(UPLOAD_URL_PATH, body, "Failed to get upload URL")
            .await
    }

    pub(crate) async fn upload(
        &self,
        upload_url: &str,
        data: Bytes,
        source_format: &str,
    ) -> Result<(), ConversionFailure> {
        let request = HttpRequest::new(Method::PUT, upload_url)
            .header("Content-Type", format!("image/{}", source_format))
            .body(data);

        let response = self.transport.execute(request).await?;
        ensure_success(response).await?;
        Ok(())
    }

    pub(crate) async fn confirm(&self, job_id: &str) -> Result<ConfirmReceipt, ConversionFailure> {
        self.post(
            CONFIRM_PATH,
            &ConfirmRequest { job_id },
            "Failed to confirm upload",
        )
        .await
    }

    /// Status lookup used while polling; its fallback message differs from
    /// [`ApiService::get_job`].
    pub(crate) async fn job_status(&self, job_id: &str) -> Result<Job, ConversionFailure> {
        let body: JobBody = self
            .get(self.job_url(job_id)?.as_str(), "Failed to get job status")
            .await?;
        Ok(body.job)
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        let url = self.job_url(job_id)?;
        let body: JobBody = self.get(url.as_str(), "Failed to get job").await?;
        Ok(body.job)
    }

    pub async fn list_jobs(&self, query: &ListJobsQuery) -> Result<Vec<Job>> {
        let mut url = reqwest::Url::parse(&self.credentials.endpoint(JOBS_PATH))
            .map_err(|e| Error::InvalidArgument(format!("Invalid jobs URL: {}", e)))?;
        url.query_pairs_mut().extend_pairs(query.query_pairs());

        let body: JobsBody = self.get(url.as_str(), "Failed to list jobs").await?;
        Ok(body.jobs)
    }

    pub async fn account(&self) -> Result<Account> {
        let body: AccountBody = self
            .get(
                &self.credentials.endpoint(ACCOUNT_PATH),
                "Failed to get account info",
            )
            .await?;
        Ok(body.account)
    }

    /// Fetches a pre-signed download URL; the body is left unread.
    pub(crate) async fn download(&self, url: &str) -> Result<HttpResponse, ConversionFailure> {
        let response = self
            .transport
            .execute(HttpRequest::new(Method::GET, url))
            .await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(status_failure(response).await)
        }
    }

    /// `/v1/jobs/{id}` with the id escaped as a single path segment.
    fn job_url(&self, job_id: &str) -> Result<reqwest::Url, ConversionFailure> {
        let invalid = || ConversionFailure::transport(format!("Invalid job URL for {:?}", job_id));
        let mut url =
            reqwest::Url::parse(&self.credentials.endpoint(JOBS_PATH)).map_err(|_| invalid())?;
        url.path_segments_mut().map_err(|_| invalid())?.push(job_id);
        Ok(url)
    }

    fn authorized(&self, method: Method, url: &str) -> HttpRequest {
        HttpRequest::new(method, url).header("Authorization", self.credentials.bearer())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        fallback: &str,
    ) -> Result<T, ConversionFailure> {
        let request = self.authorized(Method::GET, url);
        self.send_envelope(request, fallback).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T, ConversionFailure> {
        let payload = serde_json::to_vec(body)?;
        let request = self
            .authorized(Method::POST, &self.credentials.endpoint(path))
            .header("Content-Type", "application/json")
            .body(payload);
        self.send_envelope(request, fallback).await
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        fallback: &str,
    ) -> Result<T, ConversionFailure> {
        tracing::debug!("{} {}", request.method, request.url);
        let response = self.transport.execute(request).await?;
        let body = ensure_success(response).await?;
        let envelope: Value = serde_json::from_slice(&body)?;
        open_envelope(envelope, fallback)
    }
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Checks the `success` flag of a response envelope and decodes the rest.
pub(crate) fn open_envelope<T: DeserializeOwned>(
    envelope: Value,
    fallback: &str,
) -> Result<T, ConversionFailure> {
    let succeeded = envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if !succeeded {
        let message = envelope
            .get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback);
        return Err(ConversionFailure::remote_rejected(message));
    }

    Ok(serde_json::from_value(envelope)?)
}

async fn ensure_success(response: HttpResponse) -> Result<Bytes, ConversionFailure> {
    if response.is_success() {
        response.bytes().await
    } else {
        Err(status_failure(response).await)
    }
}

async fn status_failure(response: HttpResponse) -> ConversionFailure {
    let status = response.status;
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("Could not read the HTTP {} response body: {}", status, e);
            Bytes::new()
        }
    };
    let detail = error_detail(status, &body);
    tracing::warn!("Request failed with HTTP {}: {}", status, detail);
    ConversionFailure::http_status(status, &detail)
}

fn error_detail(status: u16, body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<Value>(body) {
        if let Some(message) = envelope.get("error").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if !text.is_empty() {
        return text;
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::transport::ReqwestTransport;
    use futures_util::StreamExt;
    use serde_json::json;

    #[test]
    fn test_envelope_success_decodes_payload() {
        let slot: UploadSlot = open_envelope(
            json!({ "success": true, "job_id": "job-1", "upload_url": "https://s3.test/put" }),
            "Failed to get upload URL",
        )
        .unwrap();
        assert_eq!(slot.job_id, "job-1");
        assert_eq!(slot.upload_url, "https://s3.test/put");
    }

    #[test]
    fn test_envelope_failure_uses_server_message() {
        let err = open_envelope::<UploadSlot>(
            json!({ "success": false, "error": "Insufficient points" }),
            "Failed to get upload URL",
        )
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::RemoteRejected);
        assert_eq!(err.message(), "Insufficient points");
    }

    #[test]
    fn test_envelope_without_flag_uses_fallback() {
        let err = open_envelope::<AccountBody>(json!({ "account": {} }), "Failed to get account info")
            .unwrap_err();
        assert_eq!(err.message(), "Failed to get account info");
    }

    #[test]
    fn test_error_detail_sources() {
        assert_eq!(error_detail(401, br#"{"success":false,"error":"Invalid API key"}"#), "Invalid API key");
        assert_eq!(error_detail(502, b"bad gateway\n"), "bad gateway");
        assert_eq!(error_detail(404, b""), "Not Found");
    }

    fn service() -> ApiService {
        let credentials = Credentials::new("key", "https://api.test").unwrap();
        let transport = ReqwestTransport::with_client(reqwest::Client::new());
        ApiService::new(credentials, Arc::new(transport))
    }

    #[test]
    fn test_job_url_escapes_the_id() {
        let api = service();
        assert_eq!(
            api.job_url("job-1").unwrap().as_str(),
            "https://api.test/v1/jobs/job-1"
        );
        assert_eq!(
            api.job_url("a/b?c#d").unwrap().as_str(),
            "https://api.test/v1/jobs/a%2Fb%3Fc%23d"
        );
    }

    #[tokio::test]
    async fn test_status_failure_survives_unreadable_body() {
        let chunks: Vec<Result<Bytes, ConversionFailure>> =
            vec![Err(ConversionFailure::transport("connection reset"))];
        let response = HttpResponse::new(502, futures_util::stream::iter(chunks).boxed());

        let failure = status_failure(response).await;
        assert_eq!(failure.kind(), FailureKind::Transport);
        assert_eq!(failure.message(), "HTTP 502: Bad Gateway");
    }
}
