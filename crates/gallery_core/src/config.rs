//! Gallery session configuration

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Effective options for a gallery session.
///
/// Frozen per-item at collection build time: the collection's options are the
/// global layer, a per-item override replaces the snapshot wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryOptions {
    /// Wraparound navigation: positions beyond the collection bounds resolve
    /// via modulo instead of being rejected
    #[serde(rename = "loop")]
    pub loop_mode: bool,

    /// Horizontal gap between slides (px)
    pub gutter: f32,

    /// Effect played when the gallery opens and closes
    pub animation_effect: EffectKind,

    /// Effect played on slide-to-slide movement
    pub transition_effect: EffectKind,

    /// Duration of the open/close animation (ms)
    pub animation_duration_ms: u64,

    /// Duration of slide-to-slide transitions (ms)
    pub transition_duration_ms: u64,

    /// Opacity cross-fade policy for the zoom effect
    pub zoom_opacity: ZoomOpacity,

    /// Inactivity threshold in seconds; `None` disables idle tracking
    pub idle_time_secs: Option<f32>,

    /// Apply content-protection measures to loaded slides
    pub protect: bool,

    pub image: ImageOptions,
    pub iframe: IframeOptions,
    pub video: VideoOptions,
    pub ajax: AjaxOptions,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            loop_mode: true,
            gutter: 50.0,
            animation_effect: EffectKind::Zoom,
            transition_effect: EffectKind::Fade,
            animation_duration_ms: 366,
            transition_duration_ms: 366,
            zoom_opacity: ZoomOpacity::Auto,
            idle_time_secs: Some(3.0),
            protect: false,
            image: ImageOptions::default(),
            iframe: IframeOptions::default(),
            video: VideoOptions::default(),
            ajax: AjaxOptions::default(),
        }
    }
}

/// Named visual effect for reveals and transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "fade")]
    Fade,
    #[serde(rename = "zoom")]
    Zoom,
    #[serde(rename = "slide")]
    Slide,
}

/// Opacity cross-fade policy during zoom reveals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomOpacity {
    /// Cross-fade only when thumbnail and target aspect ratios diverge
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "on")]
    On,
    #[serde(rename = "off")]
    Off,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    /// Show a thumbnail ghost while the full image loads in the background
    pub preload: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self { preload: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IframeOptions {
    /// Wait for the embedded surface's load signal before marking Loaded
    pub preload: bool,

    /// Scrolling hint applied to the embedded surface
    pub scrolling: String,

    /// Arbitrary passthrough attributes for the embedded surface
    pub attrs: HashMap<String, String>,
}

impl Default for IframeOptions {
    fn default() -> Self {
        Self {
            preload: true,
            scrolling: "auto".to_string(),
            attrs: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoOptions {
    /// Autostart playback once the slide completes
    pub auto_start: bool,

    /// Default aspect ratio (width / height) when the item declares none
    pub ratio: f32,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            auto_start: true,
            ratio: 16.0 / 9.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AjaxOptions {
    /// Opaque request settings passed through to the content provider.
    /// Always an object; TOML has no null, so the empty default must
    /// serialize as an empty table.
    pub settings: serde_json::Value,
}

impl Default for AjaxOptions {
    fn default() -> Self {
        Self {
            settings: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

impl GalleryOptions {
    /// Duration of the open/close animation
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    /// Duration of slide-to-slide transitions
    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_duration_ms)
    }

    /// Load options from file
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let options: Self = toml::from_str(&content)?;
            tracing::info!("Options loaded from {:?}", config_path);
            Ok(options)
        } else {
            tracing::info!("Using default options");
            Ok(Self::default())
        }
    }

    /// Save options to file
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        tracing::info!("Options saved to {:?}", config_path);
        Ok(())
    }

    /// Get the options file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("io", "Lumenbox", "Lumenbox")
            .map(|dirs| dirs.config_dir().join("options.toml"))
            .unwrap_or_else(|| PathBuf::from("./options.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = GalleryOptions::default();
        assert!(opts.loop_mode);
        assert_eq!(opts.gutter, 50.0);
        assert_eq!(opts.animation_effect, EffectKind::Zoom);
        assert_eq!(opts.transition_effect, EffectKind::Fade);
        assert!(opts.image.preload);
        assert!(opts.video.auto_start);
    }

    #[test]
    fn test_toml_round_trip_uses_renamed_keys() {
        let opts = GalleryOptions::default();
        let text = toml::to_string(&opts).unwrap();
        assert!(text.contains("loop = true"));

        let parsed: GalleryOptions = toml::from_str("loop = false\ngutter = 10.0\n").unwrap();
        assert!(!parsed.loop_mode);
        assert_eq!(parsed.gutter, 10.0);
        // Unspecified keys fall back to defaults
        assert_eq!(parsed.transition_duration_ms, 366);
    }

    #[test]
    fn test_default_ajax_settings_survive_toml() {
        // TOML has no null; the empty settings default must still serialize
        let opts = GalleryOptions::default();
        assert!(opts.ajax.settings.as_object().is_some_and(|m| m.is_empty()));

        let text = toml::to_string_pretty(&opts).unwrap();
        let parsed: GalleryOptions = toml::from_str(&text).unwrap();
        assert_eq!(parsed.ajax.settings, serde_json::json!({}));

        // Configured settings round-trip too
        let mut opts = GalleryOptions::default();
        opts.ajax.settings = serde_json::json!({ "headers": { "x-test": "1" } });
        let text = toml::to_string_pretty(&opts).unwrap();
        let parsed: GalleryOptions = toml::from_str(&text).unwrap();
        assert_eq!(parsed.ajax.settings["headers"]["x-test"], "1");
    }
}
