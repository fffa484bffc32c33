use crate::config::ClientConfig;
use crate::conversion::{ConversionRequest, ConversionResult};
use crate::error::{Error, Result};
use crate::events::{ConversionEvent, EventHandlers, EventKind};
use crate::models::{Account, Job, ListJobsQuery};
use crate::services::{ApiService, ConversionService, FileService, PollSettings};
use crate::transport::{ReqwestTransport, Transport};
use std::sync::Arc;
use std::time::Duration;

/// Entry point of the SDK.
///
/// Cheap to clone; clones share the HTTP transport, credentials and the
/// registered event handlers.
#[derive(Debug, Clone)]
pub struct ConvertorioClient {
    api: ApiService,
    conversion: ConversionService,
    events: EventHandlers,
}

impl ConvertorioClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Builds a client from [`ClientConfig::load`].
    pub fn from_env() -> Result<Self> {
        Self::builder().config(ClientConfig::load()).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Uploads, converts and downloads one file.
    pub async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult> {
        self.conversion.convert(request).await
    }

    pub async fn convert_file(
        &self,
        input_path: impl Into<std::path::PathBuf>,
        target_format: &str,
    ) -> Result<ConversionResult> {
        self.convert(&ConversionRequest::new(input_path, target_format))
            .await
    }

    pub async fn get_account(&self) -> Result<Account> {
        self.api.account().await
    }

    pub async fn list_jobs(&self, query: &ListJobsQuery) -> Result<Vec<Job>> {
        self.api.list_jobs(query).await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        self.api.get_job(job_id).await
    }

    /// Registers the handler for `kind`, replacing any previous one.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> &Self
    where
        F: Fn(&ConversionEvent) + Send + Sync + 'static,
    {
        self.events.register(kind, Arc::new(handler));
        self
    }

    /// Same as [`ConvertorioClient::on`] with the kind given by name
    /// (`"start"`, `"progress"`, `"status"`, `"complete"`, `"error"`).
    pub fn on_named<F>(&self, name: &str, handler: F) -> Result<&Self>
    where
        F: Fn(&ConversionEvent) + Send + Sync + 'static,
    {
        let kind: EventKind = name.parse()?;
        Ok(self.on(kind, handler))
    }

    pub fn off(&self, kind: EventKind) -> bool {
        self.events.unregister(kind)
    }
}

#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every setting with the values of `config`.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Routes all HTTP traffic through `transport` instead of reqwest.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<ConvertorioClient> {
        let credentials = self.config.credentials()?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::new(self.config.request_timeout()).map_err(Error::from)?,
            ),
        };

        let events = EventHandlers::new();
        let api = ApiService::new(credentials, transport);
        let conversion = ConversionService::new(
            api.clone(),
            FileService::new(),
            events.clone(),
            PollSettings {
                interval: self.config.poll_interval(),
                max_attempts: self.config.max_attempts,
            },
        );

        tracing::debug!("Client configured for {}", api.credentials().base_url());
        Ok(ConvertorioClient {
            api,
            conversion,
            events,
        })
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}
