//! robots.txt parser and a 10-minute TTL cache, grounded near-verbatim on
//! the teacher's `crawlers/robots.rs`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const ROBOTS_CACHE_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Default)]
pub struct RobotsTxt {
    rules: HashMap<String, AgentRules>,
    default_rules: AgentRules,
    crawl_delay: Option<f64>,
    sitemaps: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct AgentRules {
    disallow: Vec<String>,
    allow: Vec<String>,
    crawl_delay: Option<f64>,
}

impl RobotsTxt {
    pub fn parse(content: &str) -> Self {
        let mut robots = Self::default();
        let mut current_agents: Vec<String> = Vec::new();
        let mut current_rules = AgentRules::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((directive, value)) = line.split_once(':') {
                let directive = directive.trim().to_lowercase();
                let value = value.trim();

                match directive.as_str() {
                    "user-agent" => {
                        if !current_agents.is_empty() {
                            for agent in &current_agents {
                                if agent == "*" {
                                    robots.default_rules = current_rules.clone();
                                } else {
                                    robots.rules.insert(agent.clone(), current_rules.clone());
                                }
                            }
                            current_rules = AgentRules::default();
                            current_agents.clear();
                        }
                        current_agents.push(value.to_lowercase());
                    }
                    "disallow" => {
                        if !value.is_empty() {
                            current_rules.disallow.push(value.to_string());
                        }
                    }
                    "allow" => {
                        if !value.is_empty() {
                            current_rules.allow.push(value.to_string());
                        }
                    }
                    "crawl-delay" => {
                        if let Ok(delay) = value.parse::<f64>() {
                            current_rules.crawl_delay = Some(delay);
                            if robots.crawl_delay.is_none() {
                                robots.crawl_delay = Some(delay);
                            }
                        }
                    }
                    "sitemap" => robots.sitemaps.push(value.to_string()),
                    _ => {}
                }
            }
        }

        for agent in current_agents {
            if agent == "*" {
                robots.default_rules = current_rules.clone();
            } else {
                robots.rules.insert(agent, current_rules.clone());
            }
        }

        robots
    }

    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        let agent_lower = user_agent.to_lowercase();

        let rules = self
            .rules
            .get(&agent_lower)
            .or_else(|| {
                self.rules
                    .iter()
                    .find(|(k, _)| agent_lower.contains(k.as_str()))
                    .map(|(_, v)| v)
            })
            .unwrap_or(&self.default_rules);

        for allow in &rules.allow {
            if path.starts_with(allow) {
                return true;
            }
        }

        for disallow in &rules.disallow {
            if disallow == "/" {
                return false;
            }
            if path.starts_with(disallow) {
                return false;
            }
        }

        true
    }

    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    pub fn disallows_all(&self, user_agent: &str) -> bool {
        !self.is_allowed(user_agent, "/")
    }
}

async fn fetch_robots_txt(client: &reqwest::Client, site_url: &str) -> RobotsTxt {
    let url = format!("{}/robots.txt", site_url.trim_end_matches('/'));
    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(content) => RobotsTxt::parse(&content),
            Err(_) => RobotsTxt::default(),
        },
        _ => RobotsTxt::default(),
    }
}

struct CacheEntry {
    robots: RobotsTxt,
    fetched_at: Instant,
}

/// Process-local, TTL-capped robots.txt cache keyed by origin
/// (`scheme://host[:port]`). No shared coordination is required in
/// single-node deployments.
#[derive(Default)]
pub struct RobotsCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, client: &reqwest::Client, origin: &str) -> RobotsTxt {
        {
            let entries = self.entries.lock().unwrap();
            if let Some(entry) = entries.get(origin) {
                if entry.fetched_at.elapsed() < ROBOTS_CACHE_TTL {
                    return entry.robots.clone();
                }
            }
        }

        let robots = fetch_robots_txt(client, origin).await;
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            origin.to_string(),
            CacheEntry {
                robots: robots.clone(),
                fetched_at: Instant::now(),
            },
        );
        robots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_overrides_disallow() {
        let content = "User-agent: *\nDisallow: /private/\nAllow: /private/public/\n";
        let robots = RobotsTxt::parse(content);
        assert!(!robots.is_allowed("Bot", "/private/secret"));
        assert!(robots.is_allowed("Bot", "/private/public/page"));
    }

    #[test]
    fn disallow_all_is_detected() {
        let robots = RobotsTxt::parse("User-agent: *\nDisallow: /\n");
        assert!(robots.disallows_all("Bot"));
    }

    #[test]
    fn empty_robots_allows_everything() {
        let robots = RobotsTxt::parse("");
        assert!(robots.is_allowed("AnyBot", "/any/path"));
    }

    #[test]
    fn specific_agent_rules_take_precedence() {
        let content = "User-agent: *\nDisallow: /\n\nUser-agent: goodbot\nDisallow:\nAllow: /\n";
        let robots = RobotsTxt::parse(content);
        assert!(!robots.is_allowed("BadBot", "/page"));
        assert!(robots.is_allowed("GoodBot", "/page"));
    }
}
