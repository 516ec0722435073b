pub mod controller;
pub mod crd;
pub mod error;
pub mod helpers;
pub mod store;
pub mod templates;
