pub mod api_platform;
pub mod deployment_config;
pub mod image_stream;
