//! Lumenbox Gallery Engine
//!
//! This crate contains:
//! - Session lifecycle control (open, navigate, close)
//! - Sparse position index with wraparound navigation
//! - Per-slide content loading state machine
//! - Timed transition engine with exactly-once completion
//! - Stage geometry (fitting, aspect clamping, reflow)
//! - Responsive source selection
//! - Configuration and error types

pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod item;
pub mod loader;
pub mod position;
pub mod provider;
pub mod registry;
pub mod session;
pub mod slide;
pub mod srcset;
pub mod stage;
pub mod transition;

#[cfg(test)]
mod testutil;

pub use config::{
    AjaxOptions, EffectKind, GalleryOptions, IframeOptions, ImageOptions, VideoOptions,
    ZoomOpacity,
};
pub use error::GalleryError;
pub use events::{CloseInterceptor, CloseVerdict, EventSink, GalleryEvent};
pub use geometry::{Bounds, Transform, Viewport};
pub use item::{Item, ItemCollection, ItemKind};
pub use loader::ContentLoader;
pub use position::{normalize, PositionIndex};
pub use provider::{CancelToken, ContentProvider, FsContentProvider, ImageInfo};
pub use registry::SessionRegistry;
pub use session::{
    CloseOutcome, GallerySession, NavigationOutcome, SessionId, SessionPhase, RESIZE_DEBOUNCE,
};
pub use slide::{ContentState, Slide, SlideContent};
pub use srcset::{slot_width, SourceCandidate, SourceHint, SourceSet};
pub use stage::{StageHost, StaticStage};
pub use transition::{Completion, TransitionEngine, TransitionKind};
