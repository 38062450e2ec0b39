//! SSRF and URL-shape protection.

mod url_validator;

pub use url_validator::UrlValidator;
