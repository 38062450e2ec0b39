//! CrawlProgress: an ephemeral event frame pushed over the progress bus.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlPhase {
    Starting,
    Crawling,
    Processing,
    Rag,
    Complete,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlProgress {
    pub phase: CrawlPhase,
    pub message: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub percentage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CrawlProgress {
    pub fn starting(message: impl Into<String>) -> Self {
        Self {
            phase: CrawlPhase::Starting,
            message: message.into(),
            current_page: 0,
            total_pages: 0,
            percentage: 0,
            current_url: None,
            data: None,
        }
    }

    pub fn crawling(current_page: u32, total_pages: u32, current_url: impl Into<String>) -> Self {
        let percentage = if total_pages == 0 {
            0
        } else {
            ((current_page as f64 / total_pages as f64) * 90.0) as u8
        };
        Self {
            phase: CrawlPhase::Crawling,
            message: format!("crawling page {current_page} of {total_pages}"),
            current_page,
            total_pages,
            percentage,
            current_url: Some(current_url.into()),
            data: None,
        }
    }

    pub fn processing(percentage: u8, message: impl Into<String>) -> Self {
        Self {
            phase: CrawlPhase::Processing,
            message: message.into(),
            current_page: 0,
            total_pages: 0,
            percentage,
            current_url: None,
            data: None,
        }
    }

    pub fn rag(percentage: u8, message: impl Into<String>) -> Self {
        Self {
            phase: CrawlPhase::Rag,
            message: message.into(),
            current_page: 0,
            total_pages: 0,
            percentage,
            current_url: None,
            data: None,
        }
    }

    pub fn complete(data: Value) -> Self {
        Self {
            phase: CrawlPhase::Complete,
            message: "complete".into(),
            current_page: 0,
            total_pages: 0,
            percentage: 100,
            current_url: None,
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            phase: CrawlPhase::Error,
            message: message.into(),
            current_page: 0,
            total_pages: 0,
            percentage: 0,
            current_url: None,
            data: None,
        }
    }

    pub fn cancelled() -> Self {
        Self::error("cancelled")
    }
}
