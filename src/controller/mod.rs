pub mod helpers;
pub mod image_stream;
pub mod platform;
pub mod tags;
pub mod upgrade;
