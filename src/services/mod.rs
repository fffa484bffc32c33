pub mod api_service;
pub mod conversion_service;
pub mod file_service;

pub use api_service::ApiService;
pub use conversion_service::{ConversionService, PollSettings};
pub use file_service::{FileService, InputFile};
