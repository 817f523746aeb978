//! Gallery session lifecycle controller
//!
//! Sequences the position index, content loader and transition engine for
//! one open gallery. Single-threaded and callback-driven: asynchronous
//! loader outcomes and animation deadlines are reconciled in `pump`, and
//! mutual exclusion is guard flags checked at each re-entrant entry point.

use crate::config::{EffectKind, GalleryOptions};
use crate::error::GalleryError;
use crate::events::{CloseInterceptor, CloseVerdict, EventSink, GalleryEvent};
use crate::geometry::{
    clamp_to_aspect, fit_to_bounds, reflow_offset, should_cross_fade, Transform,
    DISPLACED_TOLERANCE,
};
use crate::item::{Item, ItemCollection, ItemKind};
use crate::loader::{ghost_hide_delay, ContentLoader, LoadPayload, LoadRequest, LoadResult, LoadTask};
use crate::position::PositionIndex;
use crate::provider::ContentProvider;
use crate::slide::{ContentState, Slide, SlideContent};
use crate::srcset::{scale_to_width, SourceHint};
use crate::stage::StageHost;
use crate::transition::{Completion, TransitionEngine, TransitionKind};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Coalescing window for stage-geometry change notifications
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(250);

/// Identifier of one gallery session within a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Transitioning,
    Closing,
}

/// Result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Navigation accepted; the session is moving
    Moved,
    /// Requested position is already current while idle; nothing to do
    AlreadyCurrent,
    /// Blocked by drag, close, or the first-reveal animation
    RejectedBusy,
    /// Position outside bounds with looping disabled
    RejectedOutOfBounds,
}

/// Result of a close request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Teardown started; the close animation is playing
    Closing,
    /// The veto hook aborted the close; layout was re-centered
    Vetoed,
    AlreadyClosing,
}

/// One open gallery overlay
pub struct GallerySession {
    id: SessionId,
    options: Arc<GalleryOptions>,
    collection: ItemCollection,
    index: PositionIndex,
    loader: ContentLoader,
    engine: TransitionEngine,
    host: Box<dyn StageHost>,
    sinks: Vec<Box<dyn EventSink>>,
    interceptor: Option<Box<dyn CloseInterceptor>>,

    phase: SessionPhase,
    current: i64,
    previous: i64,
    is_dragging: bool,
    first_reveal_done: bool,
    /// Target animation finished for the current position
    anim_done: bool,
    /// Reveal-effect duration waiting for the first content arrival
    pending_reveal_duration: Option<Duration>,
    /// Deadline of a debounced layout refit after a stage-geometry change
    pending_refit: Option<Instant>,
    epoch_counter: u64,
    finished: bool,
    last_activity: Instant,
}

impl GallerySession {
    /// Create a session over a collection; no slide is materialized until
    /// `open_at` issues the first jump.
    pub fn new(
        id: SessionId,
        collection: ItemCollection,
        host: Box<dyn StageHost>,
        provider: Arc<dyn ContentProvider>,
    ) -> Result<Self, GalleryError> {
        if collection.is_empty() {
            return Err(GalleryError::EmptyCollection);
        }

        let options = collection.options().clone();
        Ok(Self {
            id,
            options,
            collection,
            index: PositionIndex::new(),
            loader: ContentLoader::new(provider),
            engine: TransitionEngine::new(),
            host,
            sinks: Vec::new(),
            interceptor: None,
            phase: SessionPhase::Idle,
            current: 0,
            previous: 0,
            is_dragging: false,
            first_reveal_done: false,
            anim_done: false,
            pending_reveal_duration: None,
            pending_refit: None,
            epoch_counter: 0,
            finished: false,
            last_activity: Instant::now(),
        })
    }

    /// Issue the first jump of the session
    pub fn open_at(&mut self, start_index: usize, now: Instant) -> NavigationOutcome {
        tracing::info!(session = self.id.0, start_index, "Opening gallery session");
        self.current = start_index as i64;
        self.previous = start_index as i64;
        self.emit(GalleryEvent::Init { session: self.id });
        self.jump_to(start_index as i64, None, now)
    }

    // ===== Observers =====

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn set_close_interceptor(&mut self, interceptor: Box<dyn CloseInterceptor>) {
        self.interceptor = Some(interceptor);
    }

    // ===== Accessors =====

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_position(&self) -> i64 {
        self.current
    }

    pub fn previous_position(&self) -> i64 {
        self.previous
    }

    pub fn options(&self) -> &GalleryOptions {
        &self.options
    }

    pub fn slide(&self, position: i64) -> Option<&Slide> {
        self.index.get(position)
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        self.index.get(self.current)
    }

    /// Live positions in ascending order
    pub fn live_positions(&self) -> Vec<i64> {
        self.index.positions()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_idle_for(&self, now: Instant) -> bool {
        match self.options.idle_time_secs {
            // A config file can carry a negative threshold; from_secs_f32
            // panics on one, so clamp
            Some(secs) => {
                now.saturating_duration_since(self.last_activity)
                    >= Duration::from_secs_f32(secs.max(0.0))
            }
            None => false,
        }
    }

    // ===== External producers =====

    /// The gesture recognizer marks drag start/end; navigation is rejected
    /// while dragging
    pub fn set_dragging(&mut self, dragging: bool) {
        self.is_dragging = dragging;
        self.last_activity = Instant::now();
    }

    /// Shift all live slides horizontally (drag feedback)
    pub fn displace(&mut self, dx: f32) {
        for (_, slide) in self.index.iter_mut() {
            slide.transform.x += dx;
        }
    }

    /// Override the duration of the next transition of one slide
    pub fn force_duration(&mut self, position: i64, duration: Duration) {
        if let Some(slide) = self.index.get_mut(position) {
            slide.forced_duration = Some(duration);
        }
    }

    /// Append an item while the session is active. Returns its index.
    pub fn append(&mut self, item: Item) -> usize {
        self.collection.push(item)
    }

    /// Revert one slide to an empty surface, aborting any in-flight load
    pub fn reset_slide(&mut self, position: i64) {
        let epoch = self.next_epoch();
        if let Some(slide) = self.index.get_mut(position) {
            slide.reset(epoch);
        }
    }

    // ===== Navigation =====

    pub fn next(&mut self, now: Instant) -> NavigationOutcome {
        self.jump_to(self.current + 1, None, now)
    }

    pub fn previous(&mut self, now: Instant) -> NavigationOutcome {
        self.jump_to(self.current - 1, None, now)
    }

    /// Move the session to a position.
    ///
    /// Duration resolution: explicit override > forced single-use override >
    /// animation duration on first reveal > transition duration thereafter.
    pub fn jump_to(
        &mut self,
        position: i64,
        explicit_duration: Option<Duration>,
        now: Instant,
    ) -> NavigationOutcome {
        if self.is_dragging || matches!(self.phase, SessionPhase::Closing) || self.finished {
            return NavigationOutcome::RejectedBusy;
        }
        // The very first reveal may not be interrupted
        if !self.first_reveal_done && matches!(self.phase, SessionPhase::Transitioning) {
            return NavigationOutcome::RejectedBusy;
        }

        let loop_mode = self.options.loop_mode;
        if self.collection.is_empty()
            || (!loop_mode && (position < 0 || position >= self.collection.len() as i64))
        {
            return NavigationOutcome::RejectedOutOfBounds;
        }
        if self.first_reveal_done
            && position == self.current
            && matches!(self.phase, SessionPhase::Idle)
        {
            return NavigationOutcome::AlreadyCurrent;
        }

        self.last_activity = now;
        let first = !self.first_reveal_done;

        // Displacement is judged against the outgoing layout
        let displaced = !first && self.is_displaced();

        // Materialize target and neighbors; fresh slides get canonical
        // offsets immediately, before any content arrives
        for p in position - 1..=position + 1 {
            let epoch = self.next_epoch();
            let fresh = !self.index.contains(p);
            if self
                .index
                .ensure_slide(p, &self.collection, loop_mode, epoch)
                .is_some()
                && fresh
            {
                let t = self.canonical_transform_for(p, position);
                if let Some(slide) = self.index.get_mut(p) {
                    slide.transform = t;
                }
            }
        }
        if !self.index.contains(position) {
            return NavigationOutcome::RejectedOutOfBounds;
        }

        self.previous = self.current;
        self.current = position;
        self.anim_done = false;
        // Completion is per occupancy of the current position: revisiting a
        // retained slide runs the completion step again
        if let Some(slide) = self.index.get_mut(position) {
            slide.is_complete = false;
        }
        self.emit(GalleryEvent::BeforeShow { position });

        let forced = self
            .index
            .get_mut(position)
            .and_then(|s| s.take_forced_duration());
        let duration = explicit_duration.or(forced).unwrap_or_else(|| {
            if first {
                self.options.animation_duration()
            } else {
                self.options.transition_duration()
            }
        });

        if first {
            // First reveal: no slide-to-slide transition; the reveal effect
            // plays once content arrives
            self.pending_reveal_duration = Some(duration);
        } else if displaced {
            self.reflow_all(duration, now);
        } else {
            self.play_transition(duration, now);
        }
        self.phase = SessionPhase::Transitioning;

        self.start_load(position, now);
        self.preload_neighbor(position, now);

        // Revisited content that is already loaded reveals without a reload
        self.try_reveal(position, now);
        self.maybe_complete();

        NavigationOutcome::Moved
    }

    /// Opportunistically preload the adjacent neighbor in the travel
    /// direction when its content type matches the target's
    fn preload_neighbor(&mut self, position: i64, now: Instant) {
        let dir = if position >= self.previous { 1 } else { -1 };
        let neighbor = position + dir;
        let same_kind = match (self.index.get(position), self.index.get(neighbor)) {
            (Some(a), Some(b)) => a.item.kind == b.item.kind,
            _ => false,
        };
        if same_kind {
            self.start_load(neighbor, now);
        }
    }

    /// The stage geometry changed (window resize, orientation flip).
    ///
    /// The refit is debounced: every notification pushes the deadline out by
    /// the coalescing window, so a resize burst settles into one layout pass
    /// fired from `pump`.
    pub fn notify_stage_resized(&mut self, now: Instant) {
        if matches!(self.phase, SessionPhase::Closing) || self.finished {
            return;
        }
        self.last_activity = now;
        self.pending_refit = Some(now + RESIZE_DEBOUNCE);
    }

    /// Snap every live slide to its recomputed canonical transform after a
    /// stage-geometry change
    fn refit(&mut self) {
        tracing::debug!(session = self.id.0, "Refitting layout to new stage bounds");
        // In-flight animations are forced to completion first so the
        // lifecycle does not lose their end signals
        for p in self.engine.active_positions() {
            if let Some(completion) = self.engine.stop(p, true) {
                self.handle_completion(completion);
            }
        }
        self.recenter();
    }

    // ===== Close =====

    /// Close the session.
    ///
    /// The veto hook may abort the close, in which case the layout is
    /// re-centered and nothing is torn down.
    pub fn close(&mut self, explicit_duration: Option<Duration>, now: Instant) -> CloseOutcome {
        if matches!(self.phase, SessionPhase::Closing) || self.finished {
            return CloseOutcome::AlreadyClosing;
        }
        self.last_activity = now;

        if let Some(mut interceptor) = self.interceptor.take() {
            let verdict = interceptor.before_close(self.id);
            self.interceptor = Some(interceptor);
            if verdict == CloseVerdict::Veto {
                tracing::debug!(session = self.id.0, "Close vetoed; re-centering");
                self.recenter();
                return CloseOutcome::Vetoed;
            }
        }

        tracing::info!(session = self.id.0, "Closing gallery session");
        self.emit(GalleryEvent::BeforeClose);
        self.phase = SessionPhase::Closing;
        self.pending_refit = None;

        // Playback stops as soon as the close animation starts
        if let Some(slide) = self.index.get_mut(self.current) {
            slide.halt_media();
        }

        // Strip sibling slides before the close animation
        let current = self.current;
        for p in self.index.positions() {
            if p != current {
                self.engine.stop(p, false);
                if let Some(slide) = self.index.evict(p) {
                    slide.cancel.cancel();
                }
            }
        }

        let duration = explicit_duration.unwrap_or_else(|| self.options.animation_duration());
        let (from, to, duration) = self.close_transforms(duration);
        self.engine
            .animate(current, from, to, duration, TransitionKind::CloseOut, now);

        CloseOutcome::Closing
    }

    /// Zoom out to a visible thumbnail, else fade out in place
    fn close_transforms(&self, duration: Duration) -> (Transform, Transform, Duration) {
        let from = self
            .index
            .get(self.current)
            .map(|s| s.transform)
            .unwrap_or_default();

        if self.options.animation_effect == EffectKind::Zoom {
            if let Some(slide) = self.index.get(self.current) {
                if let Some(thumb) = self.host.thumbnail_box(&slide.item) {
                    let cross = should_cross_fade(&thumb, &from, self.options.zoom_opacity);
                    let to =
                        Transform::from_bounds(thumb).with_opacity(if cross { 0.0 } else { 1.0 });
                    return (from, to, duration);
                }
            }
        }

        if self.options.animation_effect == EffectKind::None {
            return (from, from.with_opacity(0.0), Duration::ZERO);
        }
        (from, from.with_opacity(0.0), duration)
    }

    fn recenter(&mut self) {
        for p in self.index.positions() {
            self.engine.stop(p, false);
            let t = self.canonical_transform(p);
            if let Some(slide) = self.index.get_mut(p) {
                slide.transform = t;
            }
        }
    }

    fn finish_teardown(&mut self) {
        tracing::info!(session = self.id.0, "Session torn down");
        for slide in self.index.clear() {
            slide.cancel.cancel();
        }
        self.finished = true;
        // The host releases the container, restores scroll compensation and
        // returns focus on this event
        self.emit(GalleryEvent::AfterClose);
    }

    // ===== Pump =====

    /// Drain loader outcomes and fire due animation completions.
    ///
    /// Call on every frame (or test step); all time-dependent behavior keys
    /// off the supplied instant.
    pub fn pump(&mut self, now: Instant) {
        // Interpolate in-flight transforms into the slide records
        for p in self.engine.active_positions() {
            if let Some(t) = self.engine.sample(p, now) {
                if let Some(slide) = self.index.get_mut(p) {
                    slide.transform = t;
                }
            }
        }

        for result in self.loader.drain() {
            self.apply_load_result(result, now);
        }

        for completion in self.engine.tick(now) {
            self.handle_completion(completion);
        }

        if self.pending_refit.is_some_and(|deadline| now >= deadline) {
            self.pending_refit = None;
            self.refit();
        }
    }

    /// Native transition-end signal from the embedder; races the fallback
    /// deadline, whichever arrives first wins
    pub fn notify_transition_end(&mut self, position: i64) {
        if let Some(completion) = self.engine.notify_end(position) {
            self.handle_completion(completion);
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        if let Some(slide) = self.index.get_mut(completion.position) {
            slide.transform = completion.to;
        }

        match completion.kind {
            TransitionKind::Reveal | TransitionKind::Swap => {
                if completion.position == self.current {
                    self.anim_done = true;
                    self.maybe_complete();
                }
            }
            TransitionKind::Reflow => {
                // Out-of-window slides are evicted only once their own
                // animation and the target's completion have both happened
                let retained = self.retained_positions();
                let target_done = self
                    .index
                    .get(self.current)
                    .is_some_and(|s| s.is_complete);
                if !retained.contains(&completion.position) && target_done {
                    if let Some(slide) = self.index.evict(completion.position) {
                        slide.cancel.cancel();
                    }
                }
            }
            TransitionKind::CloseOut => self.finish_teardown(),
        }
    }

    fn apply_load_result(&mut self, result: LoadResult, now: Instant) {
        // A session already torn down (or tearing down) must not act on a
        // delayed completion: no reveal, no autoplay, no focus
        if matches!(self.phase, SessionPhase::Closing) || self.finished {
            tracing::debug!(position = result.position, "Dropping load result after close");
            return;
        }
        let Some(slide) = self.index.get(result.position) else {
            return;
        };
        if slide.epoch != result.epoch {
            // Slide was reset while the load was in flight
            return;
        }
        if result.aborted {
            // Abort is not an error
            return;
        }

        let position = result.position;
        match result.outcome {
            Ok(LoadPayload::Image { url, info }) => {
                if let Some(slide) = self.index.get_mut(position) {
                    let had_ghost = matches!(slide.content, SlideContent::Ghost { .. });
                    slide.width = Some(info.width as f32);
                    slide.height = Some(info.height as f32);
                    slide.content = SlideContent::Image { url };
                    if had_ghost {
                        slide.ghost_hide_delay = Some(ghost_hide_delay(info.height as f32));
                    }
                }
                self.after_load(position, now);
            }
            Ok(LoadPayload::Fragment { body }) => {
                if let Some(slide) = self.index.get_mut(position) {
                    let filter = slide
                        .pending_selector
                        .take()
                        .or_else(|| slide.item.filter.clone());
                    slide.content = SlideContent::Markup { html: body, filter };
                }
                self.after_load(position, now);
            }
            Ok(LoadPayload::Embedded { measured }) => {
                if let Some(slide) = self.index.get_mut(position) {
                    // Unmeasurable (cross-origin) keeps the declared size
                    if let Some((w, h)) = measured {
                        slide.width = Some(w as f32);
                        slide.height = Some(h as f32);
                    }
                }
                self.after_load(position, now);
            }
            Err(e) => self.set_error(position, e.user_message(), now),
        }
    }

    // ===== Content loading =====

    /// Advance a slide out of `Unloaded`; a slide already loading or loaded
    /// is a no-op
    fn start_load(&mut self, position: i64, now: Instant) {
        let Some(slide) = self.index.get(position) else {
            return;
        };
        if slide.state != ContentState::Unloaded {
            return;
        }
        let item = slide.item.clone();
        let epoch = slide.epoch;
        let cancel = slide.cancel.clone();

        self.emit(GalleryEvent::BeforeLoad { position });
        if let Some(slide) = self.index.get_mut(position) {
            slide.state = ContentState::Loading;
        }

        match item.kind {
            ItemKind::Image => {
                let viewport = self.host.viewport();
                let mut url = item.source.clone();
                let mut resized = None;
                if let Some(set) = &item.source_set {
                    let chosen = set.select(&viewport, item.sizes.as_deref());
                    url = chosen.url.clone();
                    // A width-hinted pick with declared dimensions rescales
                    // the expected layout box
                    if let (SourceHint::Width(w), Some(declared)) =
                        (chosen.hint, item.declared_size)
                    {
                        resized = Some(scale_to_width(declared, w as f32));
                    }
                }
                if let Some(slide) = self.index.get_mut(position) {
                    if let Some((w, h)) = resized {
                        slide.width = Some(w);
                        slide.height = Some(h);
                    }
                    // Ghost phase: thumbnail with known dimensions stands in
                    // while the full image decodes
                    if item.options.image.preload {
                        if let (Some(thumb), Some(_), Some(_)) =
                            (item.thumbnail.clone(), slide.width, slide.height)
                        {
                            slide.content = SlideContent::Ghost { url: thumb };
                        }
                    }
                }
                self.submit_or_fail(
                    LoadRequest {
                        position,
                        epoch,
                        task: LoadTask::Image { url },
                        cancel,
                    },
                    now,
                );
            }
            ItemKind::Iframe => {
                if let Some(slide) = self.index.get_mut(position) {
                    slide.content = SlideContent::Embedded {
                        src: item.source.clone(),
                        scrolling: item.options.iframe.scrolling.clone(),
                    };
                }
                if item.options.iframe.preload {
                    self.submit_or_fail(
                        LoadRequest {
                            position,
                            epoch,
                            task: LoadTask::Embedded {
                                src: item.source.clone(),
                            },
                            cancel,
                        },
                        now,
                    );
                } else {
                    self.after_load(position, now);
                }
            }
            ItemKind::Html => {
                if let Some(slide) = self.index.get_mut(position) {
                    slide.content = SlideContent::Markup {
                        html: item.source.clone(),
                        filter: item.filter.clone(),
                    };
                }
                self.after_load(position, now);
            }
            ItemKind::Video => {
                if let Some(slide) = self.index.get_mut(position) {
                    slide.content = SlideContent::Video {
                        src: item.source.clone(),
                    };
                }
                self.after_load(position, now);
            }
            ItemKind::Inline => match self.loader.resolve_inline(&item.source) {
                Some(_) => {
                    // The referenced node is moved, not cloned; a
                    // placeholder marks its original spot until reset
                    if let Some(slide) = self.index.get_mut(position) {
                        slide.content = SlideContent::Inline {
                            reference: item.source.clone(),
                        };
                    }
                    self.after_load(position, now);
                }
                None => self.set_error(
                    position,
                    format!("inline reference not found: {}", item.source),
                    now,
                ),
            },
            ItemKind::Ajax => {
                // Source may carry a trailing whitespace-delimited selector
                let mut parts = item.source.splitn(2, char::is_whitespace);
                let url = parts.next().unwrap_or("").to_string();
                let selector = parts
                    .next()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
                if let Some(slide) = self.index.get_mut(position) {
                    slide.pending_selector = selector;
                }
                // The request carries a marker field so the backend can tell
                // gallery fetches apart, merged over the configured settings
                let mut settings = match item.options.ajax.settings.clone() {
                    serde_json::Value::Object(map) => map,
                    _ => serde_json::Map::new(),
                };
                settings.insert("lumenbox".to_string(), serde_json::Value::Bool(true));
                self.submit_or_fail(
                    LoadRequest {
                        position,
                        epoch,
                        task: LoadTask::Fragment {
                            url,
                            settings: serde_json::Value::Object(settings),
                        },
                        cancel,
                    },
                    now,
                );
            }
        }
    }

    fn submit_or_fail(&mut self, request: LoadRequest, now: Instant) {
        let position = request.position;
        if let Err(e) = self.loader.submit(request) {
            self.set_error(position, e.user_message(), now);
        }
    }

    /// Single merge point for every successful load path
    fn after_load(&mut self, position: i64, now: Instant) {
        if matches!(self.phase, SessionPhase::Closing) || self.finished {
            return;
        }
        {
            let Some(slide) = self.index.get_mut(position) else {
                return;
            };
            slide.state = ContentState::Loaded;
            slide.dismiss_attached = true;
            slide.protected = slide.item.options.protect;
        }
        self.emit(GalleryEvent::AfterLoad { position });
        self.try_reveal(position, now);
        self.maybe_complete();
    }

    fn set_error(&mut self, position: i64, message: String, now: Instant) {
        if matches!(self.phase, SessionPhase::Closing) || self.finished {
            return;
        }
        tracing::warn!(position, %message, "Slide load failed");
        {
            let Some(slide) = self.index.get_mut(position) else {
                return;
            };
            slide.state = ContentState::Errored;
            slide.content = SlideContent::ErrorTemplate;
            slide.zoomable = false;
        }
        self.emit(GalleryEvent::LoadError { position, message });
        self.try_reveal(position, now);
        self.maybe_complete();
    }

    // ===== Reveal & completion =====

    fn try_reveal(&mut self, position: i64, now: Instant) {
        let Some(slide) = self.index.get(position) else {
            return;
        };
        if !slide.is_loaded() || slide.is_revealed {
            return;
        }
        if let Some(slide) = self.index.get_mut(position) {
            slide.is_revealed = true;
        }
        self.emit(GalleryEvent::Reveal { position });

        // The first reveal of the session plays the open effect; later
        // reveals are covered by the navigation transition
        if position == self.current && !self.engine.is_animating(position) {
            if let Some(duration) = self.pending_reveal_duration.take() {
                let (from, to) = self.reveal_transforms(position);
                let duration = if self.options.animation_effect == EffectKind::None {
                    Duration::ZERO
                } else {
                    duration
                };
                self.engine
                    .animate(position, from, to, duration, TransitionKind::Reveal, now);
            }
        }
    }

    /// Zoom from a visible thumbnail box, else fade in at the fitted box
    fn reveal_transforms(&self, position: i64) -> (Transform, Transform) {
        let fitted = self.fitted_transform(position);

        if self.options.animation_effect == EffectKind::Zoom {
            if let Some(slide) = self.index.get(position) {
                if let Some(thumb) = self.host.thumbnail_box(&slide.item) {
                    let cross = should_cross_fade(&thumb, &fitted, self.options.zoom_opacity);
                    let from =
                        Transform::from_bounds(thumb).with_opacity(if cross { 0.0 } else { 1.0 });
                    return (from, fitted);
                }
            }
        }
        // Fallback fade
        (fitted.with_opacity(0.0), fitted)
    }

    /// Fires once per position occupancy, only after both the animation and
    /// the content of the current position have individually signaled done
    fn maybe_complete(&mut self) {
        if !self.anim_done {
            return;
        }
        let current = self.current;
        let ready = self
            .index
            .get(current)
            .is_some_and(|s| s.is_loaded() && !s.is_complete);
        if !ready {
            return;
        }

        if let Some(slide) = self.index.get_mut(current) {
            slide.is_complete = true;
            slide.scroll_offset = (0.0, 0.0);
            if slide.item.kind.is_playable()
                && slide.item.options.video.auto_start
                && !slide.has_error()
            {
                slide.media_playing = true;
            }
        }
        self.phase = SessionPhase::Idle;
        self.first_reveal_done = true;

        // Reset surrounding playable slides so stale media stops, and
        // errored siblings so a revisit retries the load
        let stale: Vec<i64> = self
            .index
            .positions()
            .into_iter()
            .filter(|&p| p != current)
            .filter(|&p| {
                self.index.get(p).is_some_and(|s| {
                    (s.item.kind.is_playable() && s.is_loaded()) || s.has_error()
                })
            })
            .collect();
        for p in stale {
            let epoch = self.next_epoch();
            if let Some(slide) = self.index.get_mut(p) {
                slide.reset(epoch);
            }
        }

        // Prune outside the retained window; slides still animating evict
        // on their own completion
        let mut keep = self.retained_positions();
        for p in self.engine.active_positions() {
            if !keep.contains(&p) {
                keep.push(p);
            }
        }
        for slide in self.index.prune(&keep) {
            slide.cancel.cancel();
        }

        tracing::debug!(position = current, "Slide complete");
        self.emit(GalleryEvent::AfterShow { position: current });
        self.emit(GalleryEvent::FocusRequested { position: current });
    }

    // ===== Layout =====

    fn retained_positions(&self) -> Vec<i64> {
        let len = self.collection.len() as i64;
        (self.current - 1..=self.current + 1)
            .filter(|&p| self.options.loop_mode || (p >= 0 && p < len))
            .collect()
    }

    fn resolved_size(&self, position: i64) -> (f32, f32) {
        if let Some(slide) = self.index.get(position) {
            if let (Some(w), Some(h)) = (slide.width, slide.height) {
                return (w, h);
            }
        }
        let stage = self.host.stage_bounds();
        (stage.width, stage.height)
    }

    /// Fitted, centered transform of a slide's content
    fn fitted_transform(&self, position: i64) -> Transform {
        let stage = self.host.stage_bounds();
        let padding = self.host.padding();
        let (w, h) = self.resolved_size(position);
        let mut t = fit_to_bounds(w, h, stage, padding);

        if let Some(slide) = self.index.get(position) {
            if slide.item.kind == ItemKind::Video {
                let ratio = slide
                    .item
                    .declared_size
                    .map(|(dw, dh)| dw / dh)
                    .unwrap_or(slide.item.options.video.ratio);
                t = clamp_to_aspect(t, ratio);
            }
        }
        t
    }

    fn canonical_transform(&self, position: i64) -> Transform {
        self.canonical_transform_for(position, self.current)
    }

    /// Fitted transform shifted to the slide's offset relative to a target
    fn canonical_transform_for(&self, position: i64, target: i64) -> Transform {
        let stage = self.host.stage_bounds();
        let mut t = self.fitted_transform(position);
        t.x += reflow_offset(position, target, stage.width, self.options.gutter);
        t
    }

    /// Any retained slide sitting away from its canonical offset (a drag
    /// left the layout shifted)
    fn is_displaced(&self) -> bool {
        if self.engine.any_active() {
            return false;
        }
        self.index.positions().into_iter().any(|p| {
            let canonical = self.canonical_transform(p);
            self.index
                .get(p)
                .is_some_and(|s| (s.transform.x - canonical.x).abs() > DISPLACED_TOLERANCE)
        })
    }

    /// Animate every live slide back to its canonical offset in parallel
    fn reflow_all(&mut self, duration: Duration, now: Instant) {
        for p in self.index.positions() {
            let from = self
                .index
                .get(p)
                .map(|s| s.transform)
                .unwrap_or_default();
            let to = self.canonical_transform(p);
            let kind = if p == self.current {
                TransitionKind::Swap
            } else {
                TransitionKind::Reflow
            };
            self.engine.animate(p, from, to, duration, kind, now);
        }
    }

    /// Play the configured transition effect for a non-displaced move
    fn play_transition(&mut self, duration: Duration, now: Instant) {
        let effect = self.options.transition_effect;
        let current = self.current;
        let outgoing = self.previous;

        for p in self.index.positions() {
            let existing = self
                .index
                .get(p)
                .map(|s| s.transform)
                .unwrap_or_default();
            let canonical = self.canonical_transform(p);

            let (from, to, dur, kind) = if p == current {
                match effect {
                    // Incoming slide fades in at its fitted spot
                    EffectKind::Fade => (
                        canonical.with_opacity(0.0),
                        canonical,
                        duration,
                        TransitionKind::Swap,
                    ),
                    EffectKind::None => {
                        (existing, canonical, Duration::ZERO, TransitionKind::Swap)
                    }
                    _ => (existing, canonical, duration, TransitionKind::Swap),
                }
            } else if p == outgoing && effect == EffectKind::Fade {
                // Outgoing slide fades out in place
                (
                    existing,
                    existing.with_opacity(0.0),
                    duration,
                    TransitionKind::Reflow,
                )
            } else {
                let dur = if effect == EffectKind::Fade {
                    Duration::ZERO
                } else if effect == EffectKind::None {
                    Duration::ZERO
                } else {
                    duration
                };
                (existing, canonical, dur, TransitionKind::Reflow)
            };

            self.engine.animate(p, from, to, dur, kind, now);
        }
    }

    // ===== Internals =====

    fn next_epoch(&mut self) -> u64 {
        self.epoch_counter += 1;
        self.epoch_counter
    }

    pub(crate) fn emit(&mut self, event: GalleryEvent) {
        tracing::trace!(?event, "Lifecycle event");
        for sink in &mut self.sinks {
            sink.on_event(&event);
        }
    }
}
