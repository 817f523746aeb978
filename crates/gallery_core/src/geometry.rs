//! Stage geometry: fitting, aspect clamping, reflow offsets

use crate::config::ZoomOpacity;

/// Axis-aligned rectangle in stage coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Width / height ratio
    pub fn aspect(&self) -> f32 {
        if self.height <= 0.0 {
            0.0
        } else {
            self.width / self.height
        }
    }
}

/// Visual transform of one slide
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
    pub opacity: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            scale: 1.0,
            opacity: 1.0,
        }
    }
}

impl Transform {
    /// Transform covering a rectangle at full opacity
    pub fn from_bounds(b: Bounds) -> Self {
        Self {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
            scale: 1.0,
            opacity: 1.0,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Width / height ratio
    pub fn aspect(&self) -> f32 {
        if self.height <= 0.0 {
            0.0
        } else {
            self.width / self.height
        }
    }
}

/// Viewer viewport metrics used for responsive source selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Device pixel ratio
    pub dpr: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, dpr: f32) -> Self {
        Self { width, height, dpr }
    }

    /// Physical pixel width (CSS width x density)
    pub fn effective_width(&self) -> f32 {
        self.width * self.dpr
    }
}

/// Snap-to-container tolerance (anti-jitter)
pub const SNAP_EPSILON: f32 = 0.5;

/// Tolerance when detecting manually displaced slides (px)
pub const DISPLACED_TOLERANCE: f32 = 0.5;

/// Aspect-ratio delta above which a zoom reveal cross-fades opacity
pub const ZOOM_OPACITY_THRESHOLD: f32 = 0.1;

/// Scale content to fit within the stage minus padding, centered.
///
/// Content is never upscaled. A result within `SNAP_EPSILON` of the available
/// area snaps to the exact container dimension.
pub fn fit_to_bounds(content_w: f32, content_h: f32, stage: Bounds, padding: f32) -> Transform {
    let max_w = (stage.width - 2.0 * padding).max(0.0);
    let max_h = (stage.height - 2.0 * padding).max(0.0);

    if content_w <= 0.0 || content_h <= 0.0 {
        return Transform {
            x: stage.x + stage.width / 2.0,
            y: stage.y + stage.height / 2.0,
            width: 0.0,
            height: 0.0,
            ..Transform::default()
        };
    }

    let scale = (max_w / content_w).min(max_h / content_h).min(1.0);
    let mut width = content_w * scale;
    let mut height = content_h * scale;

    if (max_w - width).abs() < SNAP_EPSILON {
        width = max_w;
    }
    if (max_h - height).abs() < SNAP_EPSILON {
        height = max_h;
    }

    Transform {
        x: stage.x + (stage.width - width) / 2.0,
        y: stage.y + (stage.height - height) / 2.0,
        width,
        height,
        scale: 1.0,
        opacity: 1.0,
    }
}

/// Clamp a fitted transform to a declared aspect ratio by shrinking whichever
/// axis overflows, keeping the box centered.
pub fn clamp_to_aspect(t: Transform, ratio: f32) -> Transform {
    if ratio <= 0.0 || t.width <= 0.0 || t.height <= 0.0 {
        return t;
    }

    let mut out = t;
    if t.width / t.height > ratio {
        out.width = t.height * ratio;
        out.x += (t.width - out.width) / 2.0;
    } else {
        out.height = t.width / ratio;
        out.y += (t.height - out.height) / 2.0;
    }
    out
}

/// Horizontal offset of a slide relative to the target position
pub fn reflow_offset(position: i64, target: i64, slide_width: f32, gutter: f32) -> f32 {
    (position - target) as f32 * (slide_width + gutter)
}

/// Should a zoom reveal cross-fade opacity between thumbnail and target?
pub fn should_cross_fade(thumb: &Bounds, fitted: &Transform, mode: ZoomOpacity) -> bool {
    match mode {
        ZoomOpacity::On => true,
        ZoomOpacity::Off => false,
        ZoomOpacity::Auto => (thumb.aspect() - fitted.aspect()).abs() > ZOOM_OPACITY_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_wide_content() {
        // Stage 800x600, content 1600x300 -> scale 0.5 -> 800x150 centered
        let stage = Bounds::new(0.0, 0.0, 800.0, 600.0);
        let t = fit_to_bounds(1600.0, 300.0, stage, 0.0);
        assert_eq!(t.width, 800.0);
        assert_eq!(t.height, 150.0);
        assert_eq!(t.x, 0.0);
        assert_eq!(t.y, 225.0);
    }

    #[test]
    fn test_fit_never_upscales() {
        let stage = Bounds::new(0.0, 0.0, 800.0, 600.0);
        let t = fit_to_bounds(100.0, 100.0, stage, 0.0);
        assert_eq!(t.width, 100.0);
        assert_eq!(t.height, 100.0);
        assert_eq!(t.x, 350.0);
        assert_eq!(t.y, 250.0);
    }

    #[test]
    fn test_fit_snaps_to_container() {
        // Content 0.2px narrower than the stage snaps to the exact width
        let stage = Bounds::new(0.0, 0.0, 800.0, 600.0);
        let t = fit_to_bounds(799.8, 100.0, stage, 0.0);
        assert_eq!(t.width, 800.0);
        assert_eq!(t.height, 100.0);
    }

    #[test]
    fn test_fit_respects_padding() {
        let stage = Bounds::new(0.0, 0.0, 800.0, 600.0);
        let t = fit_to_bounds(1600.0, 300.0, stage, 100.0);
        // Available 600x400 -> scale 0.375 -> 600x112.5
        assert_eq!(t.width, 600.0);
        assert_eq!(t.height, 112.5);
    }

    #[test]
    fn test_clamp_to_aspect_shrinks_overflow() {
        let t = Transform {
            x: 0.0,
            y: 0.0,
            width: 800.0,
            height: 150.0,
            ..Transform::default()
        };
        let clamped = clamp_to_aspect(t, 16.0 / 9.0);
        // Too wide for 16:9 at 150 high -> width shrinks to 150 * 16/9
        assert!((clamped.width - 150.0 * 16.0 / 9.0).abs() < 0.01);
        assert_eq!(clamped.height, 150.0);
        // Re-centered
        assert!((clamped.x - (800.0 - clamped.width) / 2.0).abs() < 0.01);
    }

    #[test]
    fn test_reflow_offset() {
        assert_eq!(reflow_offset(3, 2, 800.0, 50.0), 850.0);
        assert_eq!(reflow_offset(1, 2, 800.0, 50.0), -850.0);
        assert_eq!(reflow_offset(2, 2, 800.0, 50.0), 0.0);
    }

    #[test]
    fn test_cross_fade_policy() {
        let thumb = Bounds::new(0.0, 0.0, 100.0, 100.0);
        let square = Transform {
            width: 400.0,
            height: 400.0,
            ..Transform::default()
        };
        let wide = Transform {
            width: 800.0,
            height: 150.0,
            ..Transform::default()
        };

        assert!(!should_cross_fade(&thumb, &square, ZoomOpacity::Auto));
        assert!(should_cross_fade(&thumb, &wide, ZoomOpacity::Auto));
        assert!(should_cross_fade(&thumb, &square, ZoomOpacity::On));
        assert!(!should_cross_fade(&thumb, &wide, ZoomOpacity::Off));
    }
}
