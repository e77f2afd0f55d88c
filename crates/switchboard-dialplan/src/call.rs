//! Inbound call model consumed by the dispatch engine.
//!
//! A [`Call`] is owned by the voice-platform integration and shared with the
//! engine through an `Arc`. The routing fields are fixed at construction; only
//! the call-variable store is mutable, and it is guarded so a supervisor
//! thread can inspect variables while the call's run loop is active.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Call variable consulted when a failed call reports why it failed.
pub const FAILURE_REASON_VARIABLE: &str = "failed_reason";

/// Identifies the voice platform a call originated from.
///
/// Tags are normalised to trimmed lowercase so `Asterisk` and `asterisk`
/// select the same command vocabulary.
///
/// # Example
///
/// ```
/// use switchboard_dialplan::PlatformTag;
///
/// assert_eq!(PlatformTag::new(" Asterisk "), PlatformTag::new("asterisk"));
/// assert_eq!(PlatformTag::new("FreeSWITCH").as_str(), "freeswitch");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlatformTag(String);

impl PlatformTag {
    /// Creates a normalised platform tag.
    #[must_use]
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_ascii_lowercase())
    }

    /// Returns the normalised tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for PlatformTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Mutable variable store attached to a call.
#[derive(Debug, Default)]
pub struct CallVariables {
    values: RwLock<BTreeMap<String, String>>,
}

impl CallVariables {
    /// Returns the value of `name`, if set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }

    /// Returns `true` when `name` is set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Returns the variable names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Returns a copy of every variable.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// An inbound call awaiting a routing decision.
///
/// # Example
///
/// ```
/// use switchboard_dialplan::Call;
///
/// let call = Call::new("default", "asterisk")
///     .with_request_path("/sales/widget")
///     .with_variable("extension", "100");
/// assert_eq!(call.request_segment(), Some("sales"));
/// assert_eq!(call.variables().get("extension").as_deref(), Some("100"));
/// ```
#[derive(Debug)]
pub struct Call {
    context: String,
    request_path: String,
    platform: PlatformTag,
    failed: bool,
    hung_up: bool,
    variables: CallVariables,
}

impl Call {
    /// Creates a live call routed by `context` on `platform`.
    #[must_use]
    pub fn new(context: impl Into<String>, platform: impl Into<PlatformTag>) -> Self {
        Self {
            context: context.into(),
            request_path: String::new(),
            platform: platform.into(),
            failed: false,
            hung_up: false,
            variables: CallVariables::default(),
        }
    }

    /// Sets the request path supplied by path-routing integrations.
    #[must_use]
    pub fn with_request_path(mut self, path: impl Into<String>) -> Self {
        self.request_path = path.into();
        self
    }

    /// Seeds a call variable.
    #[must_use]
    pub fn with_variable(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.set(name, value);
        self
    }

    /// Marks the call as failed before routing.
    #[must_use]
    pub fn failed(mut self) -> Self {
        self.failed = true;
        self
    }

    /// Marks the call as hung up before routing.
    #[must_use]
    pub fn hung_up(mut self) -> Self {
        self.hung_up = true;
        self
    }

    /// Context name requested by the platform.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Request path requested by the platform, possibly empty.
    #[must_use]
    pub fn request_path(&self) -> &str {
        &self.request_path
    }

    /// Platform the call originated from.
    #[must_use]
    pub const fn platform(&self) -> &PlatformTag {
        &self.platform
    }

    /// Returns `true` when the platform reported a failed call.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.failed
    }

    /// Returns `true` when the caller hung up before routing.
    #[must_use]
    pub const fn is_hung_up(&self) -> bool {
        self.hung_up
    }

    /// Mutable call-variable store.
    #[must_use]
    pub const fn variables(&self) -> &CallVariables {
        &self.variables
    }

    /// First non-empty segment following a `/` in the request path.
    ///
    /// `/sales/widget` yields `sales`; `//sales` also yields `sales`.
    #[must_use]
    pub fn request_segment(&self) -> Option<&str> {
        self.request_path
            .split('/')
            .skip(1)
            .find(|segment| !segment.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::leading_segment("/sales/widget", Some("sales"))]
    #[case::single_segment("/support", Some("support"))]
    #[case::doubled_slash("//billing", Some("billing"))]
    #[case::relative_path("sales/widget", Some("widget"))]
    #[case::root_only("/", None)]
    #[case::empty("", None)]
    fn request_segment_matches_first_path_component(
        #[case] path: &str,
        #[case] expected: Option<&str>,
    ) {
        let call = Call::new("default", "asterisk").with_request_path(path);
        assert_eq!(call.request_segment(), expected);
    }

    #[test]
    fn variables_are_mutable_through_shared_reference() {
        let call = Call::new("default", "asterisk").with_variable("extension", "100");
        call.variables().set("extension", "200");
        call.variables().set("status", "routed");
        assert_eq!(call.variables().get("extension").as_deref(), Some("200"));
        assert_eq!(call.variables().names(), vec!["extension", "status"]);
    }

    #[test]
    fn state_flags_default_to_live_call() {
        let call = Call::new("default", "asterisk");
        assert!(!call.is_failed());
        assert!(!call.is_hung_up());
        let ended = Call::new("default", "asterisk").failed().hung_up();
        assert!(ended.is_failed());
        assert!(ended.is_hung_up());
    }
}
