//! Conditional responses evaluated before the cache.

use std::net::IpAddr;

use edge_core::{Method, Request, Response};
use serde::{Deserialize, Serialize};

/// Result type for rule operations.
pub type RuleResult<T> = Result<T, RuleError>;

/// Invalid rule configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("rule {index}: {kind} needs at least one entry")]
    EmptyList { index: usize, kind: &'static str },

    #[error("rule {index}: invalid status {status}")]
    InvalidStatus { index: usize, status: u16 },

    #[error("rule {index}: invalid redirect location {location:?}")]
    InvalidLocation { index: usize, location: String },
}

/// What a request must look like for a rule to fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// URL host is one of these (case-insensitive).
    BlockedHosts { hosts: Vec<String> },
    /// URL path ends with `.` + one of these (case-insensitive).
    BlockedExtensions { extensions: Vec<String> },
    /// Request method equals.
    Method { method: Method },
    /// `User-Agent` contains this substring.
    UserAgentContains { pattern: String },
    /// Client address equals.
    ClientIp { ip: IpAddr },
    /// Client autonomous system number equals.
    Asn { asn: u32 },
    /// Client device class equals (e.g. `mobile`).
    DeviceType { device_type: String },
}

impl Condition {
    /// Config name of this condition.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BlockedHosts { .. } => "blocked_hosts",
            Self::BlockedExtensions { .. } => "blocked_extensions",
            Self::Method { .. } => "method",
            Self::UserAgentContains { .. } => "user_agent_contains",
            Self::ClientIp { .. } => "client_ip",
            Self::Asn { .. } => "asn",
            Self::DeviceType { .. } => "device_type",
        }
    }

    /// Check the condition against a request.
    pub fn matches(&self, request: &Request) -> bool {
        match self {
            Self::BlockedHosts { hosts } => request
                .url
                .host_str()
                .is_some_and(|host| hosts.iter().any(|h| h.eq_ignore_ascii_case(host))),
            Self::BlockedExtensions { extensions } => {
                let path = request.url.path().to_ascii_lowercase();
                extensions.iter().any(|ext| {
                    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
                    path.strip_suffix(ext.as_str())
                        .is_some_and(|stem| stem.ends_with('.'))
                })
            }
            Self::Method { method } => request.method == *method,
            Self::UserAgentContains { pattern } => request
                .header("User-Agent")
                .is_some_and(|ua| ua.contains(pattern.as_str())),
            Self::ClientIp { ip } => request.client.ip == Some(*ip),
            Self::Asn { asn } => request.client.asn == Some(*asn),
            Self::DeviceType { device_type } => request
                .client
                .device_type
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case(device_type)),
        }
    }
}

fn default_respond_status() -> u16 {
    200
}

fn default_redirect_status() -> u16 {
    302
}

/// Response produced when a rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleAction {
    /// Plain-text response.
    Respond {
        #[serde(default = "default_respond_status")]
        status: u16,
        #[serde(default)]
        body: String,
    },
    /// Redirect to another location.
    Redirect {
        location: String,
        #[serde(default = "default_redirect_status")]
        status: u16,
    },
}

impl RuleAction {
    pub fn respond(status: u16, body: impl Into<String>) -> Self {
        Self::Respond {
            status,
            body: body.into(),
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
            status: default_redirect_status(),
        }
    }

    /// Build the client response.
    pub fn to_response(&self) -> Response {
        match self {
            Self::Respond { status, body } => Response::text(*status, body.clone()),
            Self::Redirect { location, status } => Response::redirect(location.clone(), *status),
        }
    }
}

/// A condition paired with its action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(flatten)]
    pub condition: Condition,
    pub action: RuleAction,
}

impl Rule {
    pub fn new(condition: Condition, action: RuleAction) -> Self {
        Self { condition, action }
    }
}

/// Ordered rules; the first match answers the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create an empty rule set that lets everything through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    pub fn with_rule(mut self, condition: Condition, action: RuleAction) -> Self {
        self.rules.push(Rule::new(condition, action));
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Response of the first matching rule, or `None` to continue.
    pub fn evaluate(&self, request: &Request) -> Option<Response> {
        let (index, rule) = self
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.condition.matches(request))?;

        tracing::info!(
            rule = index,
            kind = rule.condition.kind(),
            url = %request.url,
            "request answered by rule"
        );
        Some(rule.action.to_response())
    }

    /// Check every rule can be evaluated and produce a valid response.
    pub fn validate(&self) -> RuleResult<()> {
        for (index, rule) in self.rules.iter().enumerate() {
            match &rule.condition {
                Condition::BlockedHosts { hosts } if hosts.is_empty() => {
                    return Err(RuleError::EmptyList {
                        index,
                        kind: rule.condition.kind(),
                    });
                }
                Condition::BlockedExtensions { extensions } if extensions.is_empty() => {
                    return Err(RuleError::EmptyList {
                        index,
                        kind: rule.condition.kind(),
                    });
                }
                _ => {}
            }

            match &rule.action {
                RuleAction::Respond { status, .. } if !(100..=599).contains(status) => {
                    return Err(RuleError::InvalidStatus {
                        index,
                        status: *status,
                    });
                }
                RuleAction::Redirect { status, .. } if !(300..=399).contains(status) => {
                    return Err(RuleError::InvalidStatus {
                        index,
                        status: *status,
                    });
                }
                RuleAction::Redirect { location, .. } if url::Url::parse(location).is_err() => {
                    return Err(RuleError::InvalidLocation {
                        index,
                        location: location.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}
