//! Skiff Navigation
//!
//! The rendering engine is an external collaborator consumed through the
//! `WebView` and `WebViewFactory` traits. Every web view routes its
//! navigation callbacks to one shared `NavigationDelegateMultiplexer`, which
//! fans them out to independently registered delegates:
//! - event callbacks reach every delegate that declared them
//! - policy decisions are combined, any cancel wins
//! - auth challenges go to the first delegate that handles them

mod back_forward;
mod delegate;
mod error;
mod multiplexer;
mod webview;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use back_forward::BackForwardList;
pub use delegate::{
    AuthChallenge, AuthChallengeDisposition, Credential, NavigationAction, NavigationCallback,
    NavigationCallbacks, NavigationDelegate, NavigationEvent, NavigationResponse, NavigationType,
    PolicyDecision,
};
pub use error::NavigationError;
pub use multiplexer::{DelegateId, NavigationDelegateMultiplexer};
pub use webview::{WebView, WebViewConfiguration, WebViewFactory, WebViewId};
