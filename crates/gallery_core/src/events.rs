//! Typed lifecycle events and observer interfaces
//!
//! Observers register on a session and receive the fixed set of lifecycle
//! events below. The close veto is a dedicated hook rather than an event so
//! its verdict can flow back to the lifecycle controller.

use crate::session::SessionId;

/// Lifecycle event emitted by a gallery session
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    /// Session created and its first jump issued
    Init { session: SessionId },

    /// Session became the most recently activated one
    Activate { session: SessionId },

    /// Navigation accepted; the target slide is about to be shown
    BeforeShow { position: i64 },

    /// Target slide completed: content loaded and transition finished
    AfterShow { position: i64 },

    /// A slide is about to start loading
    BeforeLoad { position: i64 },

    /// A slide finished loading successfully
    AfterLoad { position: i64 },

    /// A slide load failed; the error template was substituted
    LoadError { position: i64, message: String },

    /// A slide's content became visible
    Reveal { position: i64 },

    /// The completed slide should receive keyboard focus
    FocusRequested { position: i64 },

    /// Close accepted; teardown is starting
    BeforeClose,

    /// Teardown finished; the container has been released
    AfterClose,
}

/// Observer receiving session lifecycle events
pub trait EventSink: Send {
    fn on_event(&mut self, event: &GalleryEvent);
}

/// Verdict of the close veto hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseVerdict {
    Proceed,
    Veto,
}

/// Hook consulted before a close request tears the session down
pub trait CloseInterceptor: Send {
    fn before_close(&mut self, session: SessionId) -> CloseVerdict;
}
