//! robots.txt permission check.
//!
//! Rules are grouped by `User-agent` lines and evaluated with longest-match
//! precedence, `Allow` winning ties. Anything that prevents reading the file
//! denies access, except a plain "not found" which means no restrictions.

use crate::model::PermissionError;

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Decides whether a target URL may be harvested at all.
#[async_trait::async_trait]
pub trait PermissionCheck: Send + Sync {
    async fn is_allowed(&self, url: &str) -> bool;
}

pub struct RobotsPolicy {
    client: Client,
    agent: String,
}

impl RobotsPolicy {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            agent: "*".to_string(),
        })
    }

    pub fn robots_url(target: &Url) -> Result<Url, PermissionError> {
        if !matches!(target.scheme(), "http" | "https") || target.host_str().is_none() {
            return Err(PermissionError::InvalidUrl(target.to_string()));
        }
        target
            .join("/robots.txt")
            .map_err(|_| PermissionError::InvalidUrl(target.to_string()))
    }

    pub async fn fetch_rules(&self, target: &Url) -> Result<RobotsRules, PermissionError> {
        let robots_url = Self::robots_url(target)?;
        let unavailable = |reason: String| PermissionError::Unavailable {
            robots_url: robots_url.to_string(),
            reason,
        };

        debug!("Checking robots.txt at {}", robots_url);
        let response = self
            .client
            .get(robots_url.clone())
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(RobotsRules::deny_all());
        }
        if status.is_client_error() {
            debug!("robots.txt returned {}, no restrictions apply", status);
            return Ok(RobotsRules::allow_all());
        }
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status)));
        }

        let text = response.text().await.map_err(|e| unavailable(e.to_string()))?;
        Ok(RobotsRules::parse(&text, &self.agent))
    }
}

#[async_trait::async_trait]
impl PermissionCheck for RobotsPolicy {
    async fn is_allowed(&self, url: &str) -> bool {
        let target = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                warn!("Cannot check robots.txt for {}: {}", url, e);
                return false;
            }
        };

        match self.fetch_rules(&target).await {
            Ok(rules) => {
                let allowed = rules.allows(&path_and_query(&target));
                info!("robots.txt {} {}", if allowed { "allows" } else { "disallows" }, url);
                allowed
            }
            Err(e) => {
                warn!("Could not read robots.txt: {}", e);
                false
            }
        }
    }
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    allow: bool,
    pattern: String,
}

#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

/// Rules that apply to one user agent.
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    rules: Vec<Rule>,
}

impl RobotsRules {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn deny_all() -> Self {
        Self {
            rules: vec![Rule {
                allow: false,
                pattern: "/".to_string(),
            }],
        }
    }

    /// Keeps the groups naming `agent`, falling back to the `*` groups.
    pub fn parse(text: &str, agent: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut reading_agents = false;

        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "user-agent" => {
                    if !reading_agents || groups.is_empty() {
                        groups.push(Group::default());
                    }
                    if let Some(group) = groups.last_mut() {
                        group.agents.push(value.to_ascii_lowercase());
                    }
                    reading_agents = true;
                }
                directive @ ("allow" | "disallow") => {
                    reading_agents = false;
                    let Some(group) = groups.last_mut() else {
                        continue;
                    };
                    // An empty Disallow grants everything.
                    if value.is_empty() {
                        continue;
                    }
                    group.rules.push(Rule {
                        allow: directive == "allow",
                        pattern: value.to_string(),
                    });
                }
                _ => {}
            }
        }

        let agent = agent.to_ascii_lowercase();
        let named: Vec<&Group> = groups
            .iter()
            .filter(|g| agent != "*" && g.agents.iter().any(|a| *a == agent))
            .collect();
        let selected = if named.is_empty() {
            groups.iter().filter(|g| g.agents.iter().any(|a| a == "*")).collect()
        } else {
            named
        };

        Self {
            rules: selected.into_iter().flat_map(|g| g.rules.clone()).collect(),
        }
    }

    pub fn allows(&self, path: &str) -> bool {
        let mut best: Option<&Rule> = None;
        for rule in self.rules.iter().filter(|r| pattern_matches(&r.pattern, path)) {
            best = match best {
                Some(current) if current.pattern.len() > rule.pattern.len() => Some(current),
                Some(current) if current.pattern.len() == rule.pattern.len() && current.allow => {
                    Some(current)
                }
                _ => Some(rule),
            };
        }
        best.is_none_or(|rule| rule.allow)
    }
}

/// Prefix match with `*` wildcards and an optional `$` end anchor.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    if !path.starts_with(first) {
        return false;
    }
    let mut pos = first.len();
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        return !anchored || pos == path.len();
    }

    for (i, part) in rest.iter().enumerate() {
        if anchored && i == rest.len() - 1 {
            return path.len() >= pos + part.len() && path.ends_with(part);
        }
        match path[pos..].find(part) {
            Some(idx) => pos += idx + part.len(),
            None => return false,
        }
    }
    true
}
