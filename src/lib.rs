//! # convertorio
//!
//! Async Rust client for the [Convertorio](https://convertorio.com) image
//! conversion API. A conversion uploads the file to a pre-signed URL, confirms
//! the upload, polls the job until it finishes and downloads the result.
//!
//! ```no_run
//! use convertorio::{ConversionRequest, ConvertorioClient, EventKind, ConversionEvent};
//!
//! # async fn example() -> convertorio::Result<()> {
//! let client = ConvertorioClient::new("your_api_key")?;
//!
//! client.on(EventKind::Progress, |event| {
//!     if let ConversionEvent::Progress(progress) = event {
//!         println!("{}", progress.message);
//!     }
//! });
//!
//! let request = ConversionRequest::builder("./photo.png", "webp")
//!     .quality(85)
//!     .build();
//! let result = client.convert(&request).await?;
//! println!("{} ({} bytes)", result.output_path.display(), result.file_size);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
pub mod constants;
pub mod conversion;
mod error;
pub mod events;
pub mod models;
pub mod services;
pub mod transport;

pub use client::{ClientBuilder, ConvertorioClient};
pub use config::{ClientConfig, Credentials};
pub use conversion::{
    default_output_path, AspectRatio, ConversionMetadata, ConversionRequest, ConversionResult,
    CropStrategy, IconSize,
};
pub use error::{ConversionFailure, Error, FailureKind, Result};
pub use events::{ConversionEvent, EventKind, ProgressStep};
pub use models::{Account, Job, JobStatus, ListJobsQuery};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
