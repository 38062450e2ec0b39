//! Error taxonomy for the ingestion and retrieval pipeline.
//!
//! `PipelineError` is the single error type callers see. Lower-level
//! modules define their own narrow errors (`SecurityError`, `CrawlError`,
//! `ExtractError`) and fold into it via `#[from]`, mirroring the way HTTP
//! status codes are assigned at the edge rather than inside library code.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// SSRF and URL-shape violations caught by the validator.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("scheme not allowed: {0}")]
    DisallowedScheme(String),
    #[error("host is blocked: {0}")]
    BlockedHost(String),
    #[error("address is in a blocked range: {0}")]
    BlockedCidr(String),
    #[error("url has no host")]
    NoHost,
    #[error("url exceeds maximum length of {max} characters")]
    TooLong { max: usize },
    #[error("port {0} is not in the allowed list")]
    DisallowedPort(u16),
    #[error("dns resolution failed: {0}")]
    DnsResolution(String),
    #[error("invalid url: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Fetch/crawl-layer failures.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Security(#[from] SecurityError),
    #[error("http error: {0}")]
    Http(String),
    #[error("fetch timed out")]
    FetchTimeout,
    #[error("response exceeded the maximum byte budget")]
    TooLarge,
    #[error("content type not supported for this ingest mode: {0}")]
    UnsupportedContentType(String),
    #[error("robots.txt disallows this url")]
    RobotsBlocked,
    #[error("crawl budget exhausted")]
    BudgetExhausted,
    #[error("operation cancelled")]
    Cancelled,
}

/// Text-extraction failures.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not extract any text from a document of declared type {0}")]
    ExtractionFailed(String),
    #[error("unsupported document type: {0}")]
    UnsupportedType(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// The error taxonomy named in the external interface contract. Each
/// variant carries the HTTP status it maps to at the server boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("access denied")]
    AccessDenied,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("too large: {0}")]
    TooLarge(String),

    #[error("remote call failed: {0}")]
    RemoteFailed(String),

    #[error("rag degraded: {0}")]
    RagDegraded(String),

    #[error("cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SecurityError> for PipelineError {
    fn from(e: SecurityError) -> Self {
        PipelineError::InvalidInput(e.to_string())
    }
}

impl From<CrawlError> for PipelineError {
    fn from(e: CrawlError) -> Self {
        match e {
            CrawlError::Security(s) => PipelineError::InvalidInput(s.to_string()),
            CrawlError::Cancelled => PipelineError::Cancelled,
            CrawlError::RobotsBlocked => PipelineError::InvalidInput(e.to_string()),
            other => PipelineError::RemoteFailed(other.to_string()),
        }
    }
}

impl From<ExtractError> for PipelineError {
    fn from(e: ExtractError) -> Self {
        PipelineError::RemoteFailed(e.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for PipelineError {
    fn from(e: sqlx::Error) -> Self {
        PipelineError::Internal(e.to_string())
    }
}

impl PipelineError {
    /// HTTP status code this variant maps to at the server boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::InvalidInput(_) => 400,
            PipelineError::AccessDenied => 403,
            PipelineError::NotFound(_) => 404,
            PipelineError::Conflict(_) => 409,
            PipelineError::TooLarge(_) => 413,
            PipelineError::RemoteFailed(_) => 502,
            PipelineError::RagDegraded(_) => 200,
            PipelineError::Cancelled => 499,
            PipelineError::Internal(_) => 500,
        }
    }
}

/// CLI exit codes named in the external interface contract.
pub fn exit_code(err: &PipelineError) -> i32 {
    match err {
        PipelineError::InvalidInput(_) => 2,
        PipelineError::Conflict(_) => 3,
        PipelineError::AccessDenied => 4,
        PipelineError::RagDegraded(_) => 5,
        _ => 1,
    }
}
