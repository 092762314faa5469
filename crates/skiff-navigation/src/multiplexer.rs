//! Navigation delegate multiplexer
//!
//! One multiplexer is installed as the navigation delegate of every web view.
//! Registered delegates are held weakly: a delegate that is dropped simply
//! stops receiving callbacks, and its entry is pruned before the next
//! fan-out pass. Explicit removal is supported but never required.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::delegate::{
    AuthChallenge, AuthChallengeDisposition, NavigationAction, NavigationCallback,
    NavigationCallbacks, NavigationDelegate, NavigationEvent, NavigationResponse, PolicyDecision,
};
use crate::error::NavigationError;

/// Handle returned by registration, used for explicit removal
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DelegateId(u64);

impl fmt::Display for DelegateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Registration {
    id: DelegateId,
    delegate: Weak<dyn NavigationDelegate>,
    callbacks: NavigationCallbacks,
}

#[derive(Default)]
pub struct NavigationDelegateMultiplexer {
    registrations: RefCell<Vec<Registration>>,
    next_id: Cell<u64>,
}

impl NavigationDelegateMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a delegate. The callback kinds it declares are read once, here.
    pub fn add<D: NavigationDelegate + 'static>(&self, delegate: &Rc<D>) -> DelegateId {
        let id = DelegateId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let callbacks = delegate.callbacks();
        let delegate: Rc<dyn NavigationDelegate> = delegate.clone();
        self.registrations.borrow_mut().push(Registration {
            id,
            delegate: Rc::downgrade(&delegate),
            callbacks,
        });

        tracing::debug!(delegate_id = %id, "Registered navigation delegate");
        id
    }

    pub fn remove(&self, id: DelegateId) -> bool {
        let mut registrations = self.registrations.borrow_mut();
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        registrations.len() != before
    }

    /// Number of registered delegates still alive
    pub fn len(&self) -> usize {
        self.prune();
        self.registrations.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self) {
        self.registrations
            .borrow_mut()
            .retain(|r| r.delegate.strong_count() > 0);
    }

    /// Live delegates declaring `kind`, in registration order. Collected up
    /// front so delegates may register or remove from inside a callback.
    fn delegates_for(&self, kind: NavigationCallback) -> Vec<Rc<dyn NavigationDelegate>> {
        self.prune();
        self.registrations
            .borrow()
            .iter()
            .filter(|r| r.callbacks.contains(kind))
            .filter_map(|r| r.delegate.upgrade())
            .collect()
    }

    pub fn did_start_provisional_navigation(&self, event: &NavigationEvent) {
        for delegate in self.delegates_for(NavigationCallback::DidStartProvisionalNavigation) {
            delegate.did_start_provisional_navigation(event);
        }
    }

    pub fn did_receive_server_redirect(&self, event: &NavigationEvent) {
        for delegate in self.delegates_for(NavigationCallback::DidReceiveServerRedirect) {
            delegate.did_receive_server_redirect(event);
        }
    }

    pub fn did_commit(&self, event: &NavigationEvent) {
        for delegate in self.delegates_for(NavigationCallback::DidCommit) {
            delegate.did_commit(event);
        }
    }

    pub fn did_finish(&self, event: &NavigationEvent) {
        for delegate in self.delegates_for(NavigationCallback::DidFinish) {
            delegate.did_finish(event);
        }
    }

    pub fn did_fail(&self, event: &NavigationEvent, error: &NavigationError) {
        for delegate in self.delegates_for(NavigationCallback::DidFail) {
            delegate.did_fail(event, error);
        }
    }

    pub fn did_fail_provisional_navigation(&self, event: &NavigationEvent, error: &NavigationError) {
        for delegate in self.delegates_for(NavigationCallback::DidFailProvisionalNavigation) {
            delegate.did_fail_provisional_navigation(event, error);
        }
    }

    /// Every declaring delegate votes; one cancel cancels the navigation.
    pub fn decide_policy_for_action(&self, action: &NavigationAction) -> PolicyDecision {
        let decision = self
            .delegates_for(NavigationCallback::DecidePolicyForAction)
            .iter()
            .fold(PolicyDecision::Allow, |acc, delegate| {
                acc.and(delegate.decide_policy_for_action(action))
            });

        if decision == PolicyDecision::Cancel {
            tracing::debug!(url = %action.url, web_view = %action.web_view, "Navigation action cancelled");
        }
        decision
    }

    pub fn decide_policy_for_response(&self, response: &NavigationResponse) -> PolicyDecision {
        let decision = self
            .delegates_for(NavigationCallback::DecidePolicyForResponse)
            .iter()
            .fold(PolicyDecision::Allow, |acc, delegate| {
                acc.and(delegate.decide_policy_for_response(response))
            });

        if decision == PolicyDecision::Cancel {
            tracing::debug!(url = %response.url, status = response.status, "Navigation response cancelled");
        }
        decision
    }

    /// Only the first live delegate that handles auth challenges answers.
    pub fn handle_auth_challenge(&self, challenge: &AuthChallenge) -> AuthChallengeDisposition {
        match self
            .delegates_for(NavigationCallback::AuthChallenge)
            .into_iter()
            .next()
        {
            Some(delegate) => delegate.handle_auth_challenge(challenge),
            None => AuthChallengeDisposition::PerformDefaultHandling,
        }
    }
}
