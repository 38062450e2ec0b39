//! Configuration types with builder-style construction, matching the
//! teacher's `CrawlConfig` pattern.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrawlOptions {
    pub max_pages: u32,
    pub max_depth: u32,
    pub same_domain_only: bool,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    #[serde(with = "duration_secs")]
    pub max_total_time: Duration,
    pub max_page_size: usize,
    pub max_total_size: usize,
    /// Override to proceed even if robots.txt disallows the start URL.
    pub ignore_robots: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_pages: 10,
            max_depth: 2,
            same_domain_only: true,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            timeout: Duration::from_secs(30),
            max_total_time: Duration::from_secs(600),
            max_page_size: 1024 * 1024,
            max_total_size: 10 * 1024 * 1024,
            ignore_robots: false,
        }
    }
}

impl CrawlOptions {
    pub fn with_max_pages(mut self, n: u32) -> Self {
        self.max_pages = n;
        self
    }

    pub fn with_max_depth(mut self, n: u32) -> Self {
        self.max_depth = n;
        self
    }

    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Clamp to the hard ceilings named in the component contract
    /// (maxPages<=200, maxDepth<=3) and validate.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_pages == 0 || self.max_pages > 200 {
            return Err("maxPages must be within [1, 200]".into());
        }
        if self.max_depth > 3 {
            return Err("maxDepth must be within [0, 3]".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub min_chunk: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 150,
            min_chunk: 50,
        }
    }
}

impl ChunkerConfig {
    pub fn with_chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n;
        self
    }

    pub fn with_overlap(mut self, n: usize) -> Self {
        self.overlap = n;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
