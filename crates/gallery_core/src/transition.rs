//! Timed visual-transform animation engine
//!
//! Completion fires exactly once per animation no matter which signal
//! arrives first: the embedder's native transition-end notification or the
//! fallback deadline of `duration + epsilon` checked on every tick. Firing
//! removes the record, so the later signal finds nothing to complete.

use crate::geometry::Transform;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Grace period added to the fallback deadline; native end signals normally
/// arrive well before it
pub const COMPLETION_EPSILON: Duration = Duration::from_millis(33);

/// Why a transform animation was started; routes its completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// First reveal of a slide (open zoom/fade)
    Reveal,
    /// Target slide moving into place on navigation
    Swap,
    /// Sibling slide moving to its canonical offset
    Reflow,
    /// Close zoom-out/fade-out of the current slide
    CloseOut,
}

/// A finished animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    pub position: i64,
    pub kind: TransitionKind,
    pub to: Transform,
}

#[derive(Debug)]
struct ActiveTransition {
    from: Transform,
    to: Transform,
    start: Instant,
    duration: Duration,
    deadline: Instant,
    kind: TransitionKind,
}

/// Drives timed transform animations, one per position
#[derive(Debug, Default)]
pub struct TransitionEngine {
    active: BTreeMap<i64, ActiveTransition>,
}

impl TransitionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an animation on a position. A re-entrant call on the same
    /// position cancels the pending one first.
    pub fn animate(
        &mut self,
        position: i64,
        from: Transform,
        to: Transform,
        duration: Duration,
        kind: TransitionKind,
        now: Instant,
    ) {
        if self.active.contains_key(&position) {
            self.stop(position, false);
        }

        tracing::debug!(position, ?kind, ?duration, "Starting transition");
        self.active.insert(
            position,
            ActiveTransition {
                from,
                to,
                start: now,
                duration,
                deadline: now + duration + COMPLETION_EPSILON,
                kind,
            },
        );
    }

    /// Cancel a pending animation; with `force_complete` the completion is
    /// returned as if the animation had finished.
    pub fn stop(&mut self, position: i64, force_complete: bool) -> Option<Completion> {
        let t = self.active.remove(&position)?;
        if force_complete {
            Some(Completion {
                position,
                kind: t.kind,
                to: t.to,
            })
        } else {
            None
        }
    }

    /// Native transition-end signal from the embedder
    pub fn notify_end(&mut self, position: i64) -> Option<Completion> {
        let t = self.active.remove(&position)?;
        Some(Completion {
            position,
            kind: t.kind,
            to: t.to,
        })
    }

    /// Fire completions whose fallback deadline has passed
    pub fn tick(&mut self, now: Instant) -> Vec<Completion> {
        let due: Vec<i64> = self
            .active
            .iter()
            .filter(|(_, t)| now >= t.deadline)
            .map(|(p, _)| *p)
            .collect();

        due.into_iter()
            .filter_map(|p| self.notify_end(p))
            .collect()
    }

    /// Current interpolated transform of an in-flight animation
    pub fn sample(&self, position: i64, now: Instant) -> Option<Transform> {
        let t = self.active.get(&position)?;
        let progress = if t.duration.is_zero() {
            1.0
        } else {
            (now.saturating_duration_since(t.start).as_secs_f32()
                / t.duration.as_secs_f32())
            .min(1.0)
        };
        let k = ease_out(progress);

        Some(Transform {
            x: lerp(t.from.x, t.to.x, k),
            y: lerp(t.from.y, t.to.y, k),
            width: lerp(t.from.width, t.to.width, k),
            height: lerp(t.from.height, t.to.height, k),
            scale: lerp(t.from.scale, t.to.scale, k),
            opacity: lerp(t.from.opacity, t.to.opacity, k),
        })
    }

    pub fn is_animating(&self, position: i64) -> bool {
        self.active.contains_key(&position)
    }

    pub fn any_active(&self) -> bool {
        !self.active.is_empty()
    }

    /// Positions with in-flight animations
    pub fn active_positions(&self) -> Vec<i64> {
        self.active.keys().copied().collect()
    }
}

/// Ease-out cubic function
fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes() -> (Transform, Transform) {
        let from = Transform {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            ..Transform::default()
        };
        let to = Transform {
            x: 200.0,
            y: 0.0,
            width: 400.0,
            height: 400.0,
            ..Transform::default()
        };
        (from, to)
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let mut engine = TransitionEngine::new();
        let (from, to) = boxes();
        let now = Instant::now();

        engine.animate(5, from, to, Duration::from_millis(100), TransitionKind::Swap, now);

        // Native signal wins
        let c = engine.notify_end(5).unwrap();
        assert_eq!(c.position, 5);
        assert_eq!(c.to, to);

        // Fallback deadline later finds nothing
        let late = now + Duration::from_millis(500);
        assert!(engine.tick(late).is_empty());
        assert!(engine.notify_end(5).is_none());
    }

    #[test]
    fn test_fallback_deadline_fires_without_native_signal() {
        let mut engine = TransitionEngine::new();
        let (from, to) = boxes();
        let now = Instant::now();

        engine.animate(0, from, to, Duration::from_millis(100), TransitionKind::Reveal, now);

        // Just before the deadline: nothing
        assert!(engine.tick(now + Duration::from_millis(100)).is_empty());

        // Past duration + epsilon: completes
        let done = engine.tick(now + Duration::from_millis(100) + COMPLETION_EPSILON);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].kind, TransitionKind::Reveal);
    }

    #[test]
    fn test_zero_duration_still_completes() {
        let mut engine = TransitionEngine::new();
        let (from, to) = boxes();
        let now = Instant::now();

        engine.animate(0, from, to, Duration::ZERO, TransitionKind::Swap, now);
        let done = engine.tick(now + COMPLETION_EPSILON);
        assert_eq!(done.len(), 1);
    }

    #[test]
    fn test_reentrant_animate_replaces() {
        let mut engine = TransitionEngine::new();
        let (from, to) = boxes();
        let now = Instant::now();

        engine.animate(0, from, to, Duration::from_millis(100), TransitionKind::Swap, now);
        engine.animate(0, to, from, Duration::from_millis(50), TransitionKind::Reflow, now);

        let c = engine.notify_end(0).unwrap();
        assert_eq!(c.kind, TransitionKind::Reflow);
        assert_eq!(c.to, from);
    }

    #[test]
    fn test_stop_without_force_suppresses_completion() {
        let mut engine = TransitionEngine::new();
        let (from, to) = boxes();
        let now = Instant::now();

        engine.animate(0, from, to, Duration::from_millis(100), TransitionKind::Swap, now);
        assert!(engine.stop(0, false).is_none());
        assert!(engine.tick(now + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_sample_eases_toward_target() {
        let mut engine = TransitionEngine::new();
        let (from, to) = boxes();
        let now = Instant::now();

        engine.animate(0, from, to, Duration::from_millis(100), TransitionKind::Swap, now);

        let start = engine.sample(0, now).unwrap();
        assert_eq!(start.x, 0.0);

        let mid = engine.sample(0, now + Duration::from_millis(50)).unwrap();
        assert!(mid.x > 0.0 && mid.x < 200.0);
        // Ease-out is past the halfway point at t = 0.5
        assert!(mid.x > 100.0);

        let end = engine.sample(0, now + Duration::from_millis(100)).unwrap();
        assert_eq!(end.x, 200.0);
    }
}
