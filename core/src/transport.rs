// Transport-facing contracts
//
// The GraphQL/WebSocket client lives outside this crate. What it reports back
// (connection signals, retry schedule, GraphQL error codes) is modeled here.
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection lifecycle signal raised by the subscription transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum TransportSignal {
    Opened,
    Closed,
    /// `attempt` counts from 0 for the first retry
    Retrying { attempt: u32 },
    GaveUp,
}

/// Exponential reconnect backoff: `min(base * 2^attempt, max_delay)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// GraphQL `extensions.code` values the dashboard reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphQlErrorCode {
    Unauthenticated,
    Forbidden,
    BadUserInput,
    RateLimited,
    Other(String),
}

impl GraphQlErrorCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "UNAUTHENTICATED" => Self::Unauthenticated,
            "FORBIDDEN" => Self::Forbidden,
            "BAD_USER_INPUT" => Self::BadUserInput,
            "RATE_LIMIT_EXCEEDED" => Self::RateLimited,
            other => Self::Other(other.to_string()),
        }
    }

    /// Where to send the user, if this error requires leaving the page
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            Self::Unauthenticated => Some(crate::guard::SIGN_IN_PATH),
            _ => None,
        }
    }
}

/// Error reported by the transport for a request or subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Network(String),
    GraphQl {
        code: Option<GraphQlErrorCode>,
        message: String,
    },
    Unknown,
}

impl TransportError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error occurred. Please check your connection.".into(),
            Self::GraphQl { code, message } => match code {
                Some(GraphQlErrorCode::Unauthenticated) => {
                    "You need to be logged in to perform this action.".into()
                }
                Some(GraphQlErrorCode::Forbidden) => {
                    "You do not have permission to perform this action.".into()
                }
                Some(GraphQlErrorCode::BadUserInput) if !message.is_empty() => message.clone(),
                Some(GraphQlErrorCode::BadUserInput) => "Invalid input provided.".into(),
                Some(GraphQlErrorCode::RateLimited) => {
                    "Too many requests. Please wait before trying again.".into()
                }
                _ if !message.is_empty() => message.clone(),
                _ => "An error occurred.".into(),
            },
            Self::Unknown => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_for(0), Duration::from_millis(1000));
        assert_eq!(p.delay_for(1), Duration::from_millis(2000));
        assert_eq!(p.delay_for(4), Duration::from_millis(16_000));
        assert_eq!(p.delay_for(5), Duration::from_millis(30_000));
        assert_eq!(p.delay_for(40), Duration::from_millis(30_000));
    }

    #[test]
    fn retry_budget() {
        let p = RetryPolicy::default();
        assert!(p.should_retry(0));
        assert!(p.should_retry(4));
        assert!(!p.should_retry(5));
    }

    #[test]
    fn error_messages() {
        let e = TransportError::GraphQl {
            code: Some(GraphQlErrorCode::parse("UNAUTHENTICATED")),
            message: "jwt expired".into(),
        };
        assert_eq!(
            e.user_message(),
            "You need to be logged in to perform this action."
        );
        assert_eq!(
            GraphQlErrorCode::parse("UNAUTHENTICATED").redirect(),
            Some("/auth/signin")
        );

        let e = TransportError::GraphQl {
            code: Some(GraphQlErrorCode::parse("RATE_LIMIT_EXCEEDED")),
            message: String::new(),
        };
        assert_eq!(
            e.user_message(),
            "Too many requests. Please wait before trying again."
        );

        // Only RATE_LIMIT_EXCEEDED gets the canned rate-limit text
        let e = TransportError::GraphQl {
            code: Some(GraphQlErrorCode::parse("TOO_MANY_REQUESTS")),
            message: "slow down".into(),
        };
        assert_eq!(e.user_message(), "slow down");
        let e = TransportError::GraphQl {
            code: Some(GraphQlErrorCode::parse("TOO_MANY_REQUESTS")),
            message: String::new(),
        };
        assert_eq!(e.user_message(), "An error occurred.");

        let e = TransportError::GraphQl {
            code: None,
            message: String::new(),
        };
        assert_eq!(e.user_message(), "An error occurred.");
        assert_eq!(
            TransportError::Network("Failed to fetch".into()).user_message(),
            "Network error occurred. Please check your connection."
        );
    }
}
