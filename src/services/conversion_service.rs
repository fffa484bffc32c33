use crate::conversion::{default_output_path, ConversionRequest, ConversionResult};
use crate::error::{ConversionFailure, Error, Result};
use crate::events::{
    ConversionEvent, ErrorEvent, EventHandlers, ProgressEvent, ProgressStep, StartEvent,
    StatusEvent,
};
use crate::models::{Job, JobStatus, UploadUrlRequest};
use crate::services::{ApiService, FileService, InputFile};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Drives one file through upload, confirmation, polling and download.
#[derive(Debug, Clone)]
pub struct ConversionService {
    api: ApiService,
    files: FileService,
    events: EventHandlers,
    poll: PollSettings,
}

impl ConversionService {
    pub fn new(
        api: ApiService,
        files: FileService,
        events: EventHandlers,
        poll: PollSettings,
    ) -> Self {
        Self {
            api,
            files,
            events,
            poll,
        }
    }

    pub async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult> {
        let (input, target_format, output_path) = match self.prepare(request).await {
            Ok(prepared) => prepared,
            Err(err) => {
                tracing::error!("Cannot convert {:?}: {}", request.input_path, err);
                self.emit_error(request, &err);
                return Err(err);
            }
        };

        tracing::info!(
            "Converting {} ({}) to {}",
            input.file_name,
            input.source_format,
            target_format
        );
        self.events.emit(ConversionEvent::Start(StartEvent {
            file_name: input.file_name.clone(),
            source_format: input.source_format.clone(),
            target_format: target_format.clone(),
        }));

        match self.run(request, &input, &target_format, output_path).await {
            Ok(result) => {
                tracing::info!(
                    "Conversion {} completed: {:?} ({} bytes)",
                    result.job_id,
                    result.output_path,
                    result.file_size
                );
                self.events.emit(ConversionEvent::Complete(result.clone()));
                Ok(result)
            }
            Err(failure) => {
                tracing::error!("Conversion of {:?} failed: {}", request.input_path, failure);
                let err = Error::Conversion(failure);
                self.emit_error(request, &err);
                Err(err)
            }
        }
    }

    /// Local checks that run before any event or request: the input exists,
    /// the target format is set and the output would not replace the input.
    async fn prepare(&self, request: &ConversionRequest) -> Result<(InputFile, String, PathBuf)> {
        let input = self.files.inspect_input(&request.input_path).await?;

        let target_format = request.normalized_target_format();
        if target_format.is_empty() {
            return Err(Error::InvalidArgument(
                "Target format must not be empty".to_string(),
            ));
        }

        let output_path = request
            .output_path
            .clone()
            .unwrap_or_else(|| default_output_path(&input.path, &target_format));
        if self.files.is_same_file(&input.path, &output_path).await {
            return Err(Error::InvalidArgument(format!(
                "Output path {} would overwrite the input file",
                output_path.display()
            )));
        }

        Ok((input, target_format, output_path))
    }

    async fn run(
        &self,
        request: &ConversionRequest,
        input: &InputFile,
        target_format: &str,
        output_path: PathBuf,
    ) -> Result<ConversionResult, ConversionFailure> {
        self.progress(ProgressEvent::new(ProgressStep::RequestingUploadUrl, None));
        let slot = self
            .api
            .request_upload_slot(&UploadUrlRequest {
                filename: &input.file_name,
                source_format: &input.source_format,
                target_format,
                file_size: input.size,
                conversion_metadata: request.wire_metadata(),
            })
            .await?;
        let job_id = slot.job_id.as_str();
        tracing::debug!("Job {} assigned an upload slot", job_id);

        self.progress(ProgressEvent::new(ProgressStep::Uploading, Some(job_id)));
        let data = self.files.read_input(input).await?;
        self.api
            .upload(&slot.upload_url, data, &input.source_format)
            .await?;

        self.progress(ProgressEvent::new(ProgressStep::Confirming, Some(job_id)));
        let receipt = self.api.confirm(job_id).await?;

        self.progress(ProgressEvent {
            status: receipt.status,
            ..ProgressEvent::new(ProgressStep::Converting, Some(job_id))
        });
        let job = self.poll_job(job_id).await?;
        let download_url = job.download_url.clone().ok_or_else(|| {
            ConversionFailure::remote_rejected("Completed job has no download URL")
        })?;

        self.progress(ProgressEvent::new(ProgressStep::Downloading, Some(job_id)));
        let response = self.api.download(&download_url).await?;
        let file_size = self.files.write_download(response, &output_path).await?;

        Ok(ConversionResult {
            success: true,
            job_id: slot.job_id.clone(),
            input_path: input.path.clone(),
            output_path,
            source_format: input.source_format.clone(),
            target_format: target_format.to_string(),
            file_size,
            processing_time_ms: job.processing_time_ms.unwrap_or(0),
            download_url,
            tokens_used: job.tokens_used,
        })
    }

    /// Polls until the job reaches a terminal status. The first attempt is
    /// immediate; each later one waits `interval` first.
    pub async fn poll_job(&self, job_id: &str) -> Result<Job, ConversionFailure> {
        let max_attempts = self.poll.max_attempts;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.poll.interval).await;
            }

            let job = self.api.job_status(job_id).await?;
            tracing::debug!(
                "Job {} is {} (attempt {}/{})",
                job_id,
                job.status,
                attempt,
                max_attempts
            );
            self.events.emit(ConversionEvent::Status(StatusEvent {
                job_id: job_id.to_string(),
                status: job.status.clone(),
                attempt,
                max_attempts,
            }));

            match &job.status {
                JobStatus::Completed => return Ok(job),
                JobStatus::Failed => {
                    let message = job
                        .error_message
                        .as_deref()
                        .filter(|m| !m.is_empty())
                        .unwrap_or("Conversion failed");
                    return Err(ConversionFailure::job_failed(message));
                }
                JobStatus::Expired => return Err(ConversionFailure::job_expired()),
                _ => {}
            }
        }

        tracing::warn!("Job {} did not finish after {} attempts", job_id, max_attempts);
        Err(ConversionFailure::poll_timeout())
    }

    fn progress(&self, event: ProgressEvent) {
        tracing::debug!("{}", event.message);
        self.events.emit(ConversionEvent::Progress(event));
    }

    fn emit_error(&self, request: &ConversionRequest, err: &Error) {
        self.events.emit(ConversionEvent::Error(ErrorEvent {
            error: err.to_string(),
            kind: err.as_conversion().map(ConversionFailure::kind),
            input_path: request.input_path.clone(),
            target_format: request.target_format.clone(),
        }));
    }
}
