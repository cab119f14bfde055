//! Worker lifecycle states, host events and control messages.

use serde_json::Value;

/// Lifecycle state of a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, install not yet run.
    Parsed,
    /// Precaching the app shell and fonts.
    Installing,
    /// Precache complete, waiting to activate.
    Installed,
    /// Cleaning up stale partitions.
    Activating,
    /// Intercepting requests.
    Activated,
    /// Install failed; this instance will never activate.
    Redundant,
}

impl WorkerState {
    /// Whether fetch interception is live.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Activated)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parsed => write!(f, "parsed"),
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

/// Events delivered by the host environment.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// A new worker version was registered.
    Install,
    /// The worker is taking over from the previous version.
    Activate,
    /// A message posted by a client page.
    Message {
        /// Raw message payload.
        data: Value,
        /// Whether the sender's origin matches the worker's host origin.
        origin_matches_host: bool,
    },
}

/// A well-formed command posted to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Activate immediately instead of waiting for old instances to finish.
    SkipWaiting,
    /// Warm the cache for a UI theme. `theme` is `None` when the payload
    /// carried no string identifier.
    PrecacheTheme { theme: Option<String> },
}

impl ControlMessage {
    /// Message type tag for [`ControlMessage::SkipWaiting`].
    pub const SKIP_WAITING: &'static str = "SKIP_WAITING";
    /// Message type tag for [`ControlMessage::PrecacheTheme`].
    pub const PRECACHE_THEME: &'static str = "PRECACHE_THEME";

    /// Parse a message payload.
    ///
    /// Returns `None` for anything that is not an object with a known `type`.
    pub fn parse(data: &Value) -> Option<Self> {
        let object = data.as_object()?;
        match object.get("type").and_then(Value::as_str)? {
            Self::SKIP_WAITING => Some(Self::SkipWaiting),
            Self::PRECACHE_THEME => Some(Self::PrecacheTheme {
                theme: object
                    .get("animal")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            _ => None,
        }
    }
}

/// Whether a message `origin` belongs to `host`.
///
/// A missing or empty origin is treated as same-origin; otherwise scheme,
/// host and port must all match.
pub fn origin_matches_host(host: &url::Url, origin: Option<&str>) -> bool {
    let origin = match origin {
        None => return true,
        Some(o) if o.is_empty() => return true,
        Some(o) => o,
    };
    match url::Url::parse(origin) {
        Ok(url) => url.origin() == host.origin(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === ControlMessage Tests ===

    #[test]
    fn test_parse_skip_waiting() {
        assert_eq!(
            ControlMessage::parse(&json!({"type": "SKIP_WAITING"})),
            Some(ControlMessage::SkipWaiting)
        );
    }

    #[test]
    fn test_parse_precache_theme() {
        assert_eq!(
            ControlMessage::parse(&json!({"type": "PRECACHE_THEME", "animal": "dragon"})),
            Some(ControlMessage::PrecacheTheme {
                theme: Some("dragon".to_string())
            })
        );
        assert_eq!(
            ControlMessage::parse(&json!({"type": "PRECACHE_THEME", "animal": 7})),
            Some(ControlMessage::PrecacheTheme { theme: None })
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(ControlMessage::parse(&json!("SKIP_WAITING")), None);
        assert_eq!(ControlMessage::parse(&json!(null)), None);
        assert_eq!(ControlMessage::parse(&json!([1, 2])), None);
        assert_eq!(ControlMessage::parse(&json!({"kind": "SKIP_WAITING"})), None);
        assert_eq!(ControlMessage::parse(&json!({"type": "RELOAD"})), None);
    }

    // === Origin Tests ===

    #[test]
    fn test_origin_matches_host() {
        let host = url::Url::parse("https://app.example.com/sw.js").unwrap();
        assert!(origin_matches_host(&host, None));
        assert!(origin_matches_host(&host, Some("")));
        assert!(origin_matches_host(&host, Some("https://app.example.com")));
        assert!(!origin_matches_host(&host, Some("https://evil.example.com")));
        assert!(!origin_matches_host(&host, Some("http://app.example.com")));
        assert!(!origin_matches_host(&host, Some("https://app.example.com:8443")));
        assert!(!origin_matches_host(&host, Some("not a url")));
    }

    #[test]
    fn test_worker_state() {
        assert!(WorkerState::Activated.is_active());
        assert!(!WorkerState::Installed.is_active());
        assert_eq!(WorkerState::Redundant.to_string(), "redundant");
    }
}
