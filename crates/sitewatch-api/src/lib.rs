// sitewatch-api: Async REST client for the file/list store backing the portal

pub mod error;
pub mod rest;
pub mod transport;

pub use error::Error;
pub use rest::StoreClient;
