//! Navigation delegate capability

use std::collections::HashSet;
use url::Url;

use crate::error::NavigationError;
use crate::webview::WebViewId;

/// Payload of the event callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub web_view: WebViewId,
    pub url: Option<Url>,
    pub title: Option<String>,
}

impl NavigationEvent {
    pub fn new(web_view: WebViewId, url: Option<Url>) -> Self {
        Self {
            web_view,
            url,
            title: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationType {
    LinkActivated,
    FormSubmitted,
    BackForward,
    Reload,
    FormResubmitted,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationAction {
    pub web_view: WebViewId,
    pub url: Url,
    pub navigation_type: NavigationType,
    pub is_main_frame: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResponse {
    pub web_view: WebViewId,
    pub url: Url,
    pub mime_type: Option<String>,
    pub status: u16,
    pub is_main_frame: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Cancel,
}

impl PolicyDecision {
    /// Combine two votes: cancel wins
    pub fn and(self, other: PolicyDecision) -> PolicyDecision {
        match (self, other) {
            (PolicyDecision::Allow, PolicyDecision::Allow) => PolicyDecision::Allow,
            _ => PolicyDecision::Cancel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub web_view: WebViewId,
    pub host: String,
    pub port: u16,
    pub realm: Option<String>,
    pub previous_failure_count: u32,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChallengeDisposition {
    UseCredential(Credential),
    PerformDefaultHandling,
    Cancel,
    RejectProtectionSpace,
}

/// Callback kinds a delegate can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationCallback {
    DidStartProvisionalNavigation,
    DidReceiveServerRedirect,
    DidCommit,
    DidFinish,
    DidFail,
    DidFailProvisionalNavigation,
    DecidePolicyForAction,
    DecidePolicyForResponse,
    AuthChallenge,
}

impl NavigationCallback {
    const EVENTS_AND_POLICIES: [NavigationCallback; 8] = [
        NavigationCallback::DidStartProvisionalNavigation,
        NavigationCallback::DidReceiveServerRedirect,
        NavigationCallback::DidCommit,
        NavigationCallback::DidFinish,
        NavigationCallback::DidFail,
        NavigationCallback::DidFailProvisionalNavigation,
        NavigationCallback::DecidePolicyForAction,
        NavigationCallback::DecidePolicyForResponse,
    ];
}

/// The set of callback kinds a delegate handles, declared at registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationCallbacks(HashSet<NavigationCallback>);

impl NavigationCallbacks {
    pub fn none() -> Self {
        Self::default()
    }

    /// Every event and policy callback. Auth challenges are opt-in because
    /// only one delegate ever answers them.
    pub fn events_and_policies() -> Self {
        Self::only(NavigationCallback::EVENTS_AND_POLICIES)
    }

    pub fn only(kinds: impl IntoIterator<Item = NavigationCallback>) -> Self {
        Self(kinds.into_iter().collect())
    }

    pub fn with(mut self, kind: NavigationCallback) -> Self {
        self.0.insert(kind);
        self
    }

    pub fn contains(&self, kind: NavigationCallback) -> bool {
        self.0.contains(&kind)
    }
}

/// Observer of web view navigation. Every method has a neutral default, so a
/// delegate implements only what it declares in `callbacks`.
pub trait NavigationDelegate {
    fn callbacks(&self) -> NavigationCallbacks {
        NavigationCallbacks::events_and_policies()
    }

    fn did_start_provisional_navigation(&self, _event: &NavigationEvent) {}

    fn did_receive_server_redirect(&self, _event: &NavigationEvent) {}

    fn did_commit(&self, _event: &NavigationEvent) {}

    fn did_finish(&self, _event: &NavigationEvent) {}

    fn did_fail(&self, _event: &NavigationEvent, _error: &NavigationError) {}

    fn did_fail_provisional_navigation(&self, _event: &NavigationEvent, _error: &NavigationError) {}

    fn decide_policy_for_action(&self, _action: &NavigationAction) -> PolicyDecision {
        PolicyDecision::Allow
    }

    fn decide_policy_for_response(&self, _response: &NavigationResponse) -> PolicyDecision {
        PolicyDecision::Allow
    }

    fn handle_auth_challenge(&self, _challenge: &AuthChallenge) -> AuthChallengeDisposition {
        AuthChallengeDisposition::PerformDefaultHandling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_wins() {
        use PolicyDecision::*;
        assert_eq!(Allow.and(Allow), Allow);
        assert_eq!(Allow.and(Cancel), Cancel);
        assert_eq!(Cancel.and(Allow), Cancel);
    }

    #[test]
    fn test_default_callbacks_exclude_auth() {
        let callbacks = NavigationCallbacks::events_and_policies();
        assert!(callbacks.contains(NavigationCallback::DidCommit));
        assert!(!callbacks.contains(NavigationCallback::AuthChallenge));
        assert!(callbacks
            .with(NavigationCallback::AuthChallenge)
            .contains(NavigationCallback::AuthChallenge));
    }
}
