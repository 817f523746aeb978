//! Responsive source descriptors
//!
//! Parses comma-separated `url hint` pairs where the hint is either a pixel
//! width (`800w`) or a density multiplier (`2x`), and selects the candidate
//! matching the current viewport.

use crate::geometry::Viewport;

/// Candidate hint unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceHint {
    /// Intrinsic pixel width
    Width(u32),
    /// Device pixel density multiplier
    Density(f32),
}

impl SourceHint {
    /// Numeric value used for ascending sort
    fn value(&self) -> f32 {
        match self {
            SourceHint::Width(w) => *w as f32,
            SourceHint::Density(d) => *d,
        }
    }
}

/// One `url hint` pair
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCandidate {
    pub url: String,
    pub hint: SourceHint,
}

/// Parsed responsive source list, sorted ascending by hint value
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSet {
    candidates: Vec<SourceCandidate>,
}

impl SourceSet {
    /// Parse a descriptor string; returns `None` when no candidate parses.
    ///
    /// Entries without a hint default to density `1x`.
    pub fn parse(descriptor: &str) -> Option<Self> {
        let mut candidates = Vec::new();

        for entry in descriptor.split(',') {
            let mut parts = entry.split_whitespace();
            let url = match parts.next() {
                Some(url) => url.to_string(),
                None => continue,
            };

            let hint = match parts.next() {
                Some(token) => match parse_hint(token) {
                    Some(hint) => hint,
                    None => {
                        tracing::warn!("Ignoring srcset entry with bad hint: {}", entry.trim());
                        continue;
                    }
                },
                None => SourceHint::Density(1.0),
            };

            candidates.push(SourceCandidate { url, hint });
        }

        if candidates.is_empty() {
            return None;
        }

        candidates.sort_by(|a, b| {
            a.hint
                .value()
                .partial_cmp(&b.hint.value())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Some(Self { candidates })
    }

    /// Select the first candidate qualifying for the viewport, or the largest
    /// when none qualifies.
    ///
    /// A width hint qualifies at `>=` the effective width: the declared
    /// layout slot from `sizes` when present, else the full viewport width,
    /// times density. A density hint qualifies at `>=` the device pixel
    /// ratio.
    pub fn select(&self, viewport: &Viewport, sizes: Option<&str>) -> &SourceCandidate {
        let effective = sizes
            .and_then(|s| slot_width(s, viewport))
            .map(|w| w * viewport.dpr)
            .unwrap_or_else(|| viewport.effective_width());

        self.candidates
            .iter()
            .find(|c| match c.hint {
                SourceHint::Width(w) => w as f32 >= effective,
                SourceHint::Density(d) => d >= viewport.dpr,
            })
            .unwrap_or_else(|| {
                // Largest candidate (list is sorted ascending)
                self.candidates.last().expect("non-empty by construction")
            })
    }

    pub fn candidates(&self) -> &[SourceCandidate] {
        &self.candidates
    }
}

/// Resolve a `sizes` descriptor to the declared layout slot width in CSS px.
///
/// Entries are an optional `(max-width: ..)`/`(min-width: ..)` condition
/// followed by a `px` or `vw` length; the first entry whose condition holds
/// wins, a bare length always holds. Unparseable entries are skipped.
pub fn slot_width(sizes: &str, viewport: &Viewport) -> Option<f32> {
    for entry in sizes.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let (condition, length) = match entry.rfind(')') {
            Some(i) => (Some(&entry[..=i]), entry[i + 1..].trim()),
            None => (None, entry),
        };
        if let Some(cond) = condition {
            if !condition_holds(cond, viewport) {
                continue;
            }
        }

        match parse_length(length, viewport) {
            Some(len) => return Some(len),
            None => tracing::warn!("Ignoring sizes entry with bad length: {}", entry),
        }
    }
    None
}

fn condition_holds(condition: &str, viewport: &Viewport) -> bool {
    let inner = condition
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')');
    let mut parts = inner.splitn(2, ':');
    let (feature, value) = match (parts.next(), parts.next()) {
        (Some(f), Some(v)) => (f.trim(), v.trim()),
        _ => return false,
    };
    let Some(limit) = parse_length(value, viewport) else {
        return false;
    };

    match feature {
        "max-width" => viewport.width <= limit,
        "min-width" => viewport.width >= limit,
        // Unknown media features never match
        _ => false,
    }
}

fn parse_length(token: &str, viewport: &Viewport) -> Option<f32> {
    if let Some(num) = token.strip_suffix("px") {
        num.trim().parse::<f32>().ok()
    } else if let Some(num) = token.strip_suffix("vw") {
        num.trim()
            .parse::<f32>()
            .ok()
            .map(|v| v / 100.0 * viewport.width)
    } else {
        None
    }
}

fn parse_hint(token: &str) -> Option<SourceHint> {
    if let Some(num) = token.strip_suffix('w') {
        num.parse::<u32>().ok().map(SourceHint::Width)
    } else if let Some(num) = token.strip_suffix('x') {
        num.parse::<f32>().ok().map(SourceHint::Density)
    } else {
        None
    }
}

/// Recompute declared dimensions proportionally for a new width
pub fn scale_to_width(declared: (f32, f32), new_width: f32) -> (f32, f32) {
    let (w, h) = declared;
    if w <= 0.0 {
        return declared;
    }
    (new_width, h * new_width / w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(width: f32, dpr: f32) -> Viewport {
        Viewport::new(width, 600.0, dpr)
    }

    #[test]
    fn test_parse_sorts_ascending() {
        let set = SourceSet::parse("big.jpg 1200w, small.jpg 400w, mid.jpg 800w").unwrap();
        let urls: Vec<_> = set.candidates().iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, ["small.jpg", "mid.jpg", "big.jpg"]);
    }

    #[test]
    fn test_parse_defaults_to_density_one() {
        let set = SourceSet::parse("plain.jpg, retina.jpg 2x").unwrap();
        assert_eq!(set.candidates()[0].hint, SourceHint::Density(1.0));
        assert_eq!(set.candidates()[1].hint, SourceHint::Density(2.0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SourceSet::parse("").is_none());
        let set = SourceSet::parse("a.jpg 400w, b.jpg 9q").unwrap();
        assert_eq!(set.candidates().len(), 1);
    }

    #[test]
    fn test_select_first_qualifying_width() {
        let set = SourceSet::parse("a.jpg 400w, b.jpg 800w, c.jpg 1200w").unwrap();
        // Effective width 750 -> b (first >= 750)
        let chosen = set.select(&viewport(750.0, 1.0), None);
        assert_eq!(chosen.url, "b.jpg");
    }

    #[test]
    fn test_select_falls_back_to_largest() {
        let set = SourceSet::parse("a.jpg 400w, b.jpg 800w, c.jpg 1200w").unwrap();
        // Effective width 1300 -> none qualifies -> largest
        let chosen = set.select(&viewport(1300.0, 1.0), None);
        assert_eq!(chosen.url, "c.jpg");
    }

    #[test]
    fn test_select_by_density() {
        let set = SourceSet::parse("std.jpg 1x, hi.jpg 2x").unwrap();
        assert_eq!(set.select(&viewport(400.0, 1.0), None).url, "std.jpg");
        assert_eq!(set.select(&viewport(400.0, 2.0), None).url, "hi.jpg");
    }

    #[test]
    fn test_width_hint_respects_density() {
        let set = SourceSet::parse("a.jpg 400w, b.jpg 800w").unwrap();
        // 500 CSS px at 1.5 dpr -> effective 750 -> b
        assert_eq!(set.select(&viewport(500.0, 1.5), None).url, "b.jpg");
    }

    #[test]
    fn test_sizes_slot_overrides_viewport_width() {
        let set = SourceSet::parse("a.jpg 400w, b.jpg 800w, c.jpg 1200w").unwrap();
        // Viewport is 800 wide but the layout slot is only 400px
        assert_eq!(set.select(&viewport(800.0, 1.0), Some("400px")).url, "a.jpg");
        // At 2x density a 400px slot needs 800 device pixels
        assert_eq!(set.select(&viewport(800.0, 2.0), Some("400px")).url, "b.jpg");
    }

    #[test]
    fn test_slot_width_media_conditions() {
        let sizes = "(max-width: 600px) 480px, 800px";
        assert_eq!(slot_width(sizes, &viewport(500.0, 1.0)), Some(480.0));
        assert_eq!(slot_width(sizes, &viewport(1000.0, 1.0)), Some(800.0));
    }

    #[test]
    fn test_slot_width_vw_units() {
        assert_eq!(slot_width("50vw", &viewport(1000.0, 1.0)), Some(500.0));
    }

    #[test]
    fn test_slot_width_skips_garbage() {
        assert_eq!(slot_width("whatever", &viewport(800.0, 1.0)), None);
        // A broken entry falls through to the next one
        assert_eq!(
            slot_width("(max-width: 600px) oops, 640px", &viewport(500.0, 1.0)),
            Some(640.0)
        );
    }

    #[test]
    fn test_scale_to_width() {
        assert_eq!(scale_to_width((1600.0, 900.0), 800.0), (800.0, 450.0));
    }
}
