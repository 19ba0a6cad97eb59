use anyhow::{anyhow, Context, Result};
use eframe::egui::Color32;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    params::{MediaType, RenderParameters},
    reload::{DebouncePolicy, ReloadSettings},
};

const CONFIG_FILE_NAME: &str = "physical_media_demo.toml";

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub reload: ReloadSettings,
    pub defaults: RenderParameters,
    pub render: RenderConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                log::info!("no {CONFIG_FILE_NAME} found; using built-in defaults");
                Ok(Config::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&data)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(data: &str) -> Result<Self> {
        let doc: ConfigDocument = toml::from_str(data)?;
        Ok(doc.into())
    }

    fn find_config_file() -> Option<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = env::current_dir() {
            candidates.push(current_dir.join(CONFIG_FILE_NAME));
            candidates.push(current_dir.join("config").join(CONFIG_FILE_NAME));
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join(CONFIG_FILE_NAME));
                candidates.push(dir.join("config").join(CONFIG_FILE_NAME));
            }
        }

        candidates.into_iter().find(|path| path.exists())
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub texture_size: usize,
    pub groove_count: usize,
    pub label_ratio: f32,
    pub spin: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            texture_size: 512,
            groove_count: 12,
            label_ratio: 0.35,
            spin: true,
        }
    }
}

impl RenderConfig {
    pub fn texture_size(&self) -> usize {
        let mut size = self.texture_size.clamp(128, 1024);
        if size % 2 == 1 {
            size += 1;
        }
        size
    }

    pub fn label_ratio(&self) -> f32 {
        self.label_ratio.clamp(0.1, 0.6)
    }
}

const MIN_RELOAD_DELAY_SECS: f64 = 0.05;
const MAX_RELOAD_DELAY_SECS: f64 = 10.0;

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    reload: ReloadSection,
    #[serde(default)]
    defaults: DefaultsSection,
    #[serde(default)]
    render: RenderSection,
}

impl From<ConfigDocument> for Config {
    fn from(value: ConfigDocument) -> Self {
        let builtin = Config::default();

        let delay = match value.reload.delay_secs {
            Some(secs) if secs.is_finite() => {
                let clamped = secs.clamp(MIN_RELOAD_DELAY_SECS, MAX_RELOAD_DELAY_SECS);
                if clamped != secs {
                    log::warn!("reload.delay_secs {secs} out of range; using {clamped}");
                }
                Duration::from_secs_f64(clamped)
            }
            Some(secs) => {
                log::warn!("reload.delay_secs {secs} is not a number; using default");
                builtin.reload.delay
            }
            None => builtin.reload.delay,
        };

        let defaults = &value.defaults;
        let color = match defaults.color.as_deref().map(parse_color) {
            Some(Ok(color)) => color,
            Some(Err(err)) => {
                log::warn!("defaults.color: {err}; using default");
                builtin.defaults.color
            }
            None => builtin.defaults.color,
        };

        let unit = |key: &str, value: Option<f32>, fallback: f32| match value {
            Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
            Some(v) => {
                log::warn!("defaults.{key} {v} is not a number; using {fallback}");
                fallback
            }
            None => fallback,
        };

        let render = RenderConfig {
            texture_size: value
                .render
                .texture_size
                .unwrap_or(builtin.render.texture_size),
            groove_count: value
                .render
                .groove_count
                .unwrap_or(builtin.render.groove_count),
            label_ratio: value
                .render
                .label_ratio
                .unwrap_or(builtin.render.label_ratio),
            spin: value.render.spin.unwrap_or(builtin.render.spin),
        };

        Config {
            reload: ReloadSettings {
                delay,
                policy: value.reload.policy.unwrap_or(builtin.reload.policy),
            },
            defaults: RenderParameters {
                artwork_url: defaults
                    .artwork_url
                    .clone()
                    .unwrap_or(builtin.defaults.artwork_url),
                color,
                opacity: unit("opacity", defaults.opacity, builtin.defaults.opacity),
                scale: unit("scale", defaults.scale, builtin.defaults.scale),
                media_type: defaults.media_type.unwrap_or(builtin.defaults.media_type),
            },
            render,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReloadSection {
    delay_secs: Option<f64>,
    policy: Option<DebouncePolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultsSection {
    artwork_url: Option<String>,
    media_type: Option<MediaType>,
    color: Option<String>,
    opacity: Option<f32>,
    scale: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderSection {
    texture_size: Option<usize>,
    groove_count: Option<usize>,
    label_ratio: Option<f32>,
    spin: Option<bool>,
}

/// Accepts `#RRGGBB` and `rgb(r, g, b)`. Transparency comes from the opacity
/// setting, so colors carry no alpha.
pub fn parse_color(value: &str) -> Result<Color32> {
    let v = value.trim();
    if let Some(hex) = v.strip_prefix('#') {
        return parse_hex_color(hex);
    }
    if let Some(rest) = v.strip_prefix("rgb(") {
        return parse_rgb(rest.trim_end_matches(')'));
    }
    Err(anyhow!("Unsupported color format: {v}"))
}

fn parse_hex_color(hex: &str) -> Result<Color32> {
    let value = hex.trim();
    let bits = match value.len() {
        6 => u32::from_str_radix(value, 16).ok(),
        _ => None,
    }
    .ok_or_else(|| anyhow!("Invalid hex color: #{value} (expected #RRGGBB)"))?;

    Ok(Color32::from_rgb(
        (bits >> 16) as u8,
        (bits >> 8) as u8,
        bits as u8,
    ))
}

fn parse_rgb(body: &str) -> Result<Color32> {
    let parts = body
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .map_err(|_| anyhow!("Invalid rgb component: {}", part.trim()))
        })
        .collect::<Result<Vec<_>>>()?;

    match parts.as_slice() {
        [r, g, b] => Ok(Color32::from_rgb(*r, *g, *b)),
        _ => Err(anyhow!("rgb() expects three components, got {}", parts.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::parse("").expect("empty config parses");
        assert_eq!(config.reload, ReloadSettings::default());
        assert_eq!(config.defaults, RenderParameters::default());
        assert_eq!(config.render.texture_size(), 512);
    }

    #[test]
    fn full_document_overrides_everything() {
        let config = Config::parse(
            r##"
            [reload]
            delay_secs = 0.25
            policy = "overlapping"

            [defaults]
            artwork_url = "file:///tmp/cover.png"
            media_type = "compact_cassette"
            color = "#336699"
            opacity = 0.75
            scale = 0.4

            [render]
            texture_size = 257
            groove_count = 20
            label_ratio = 0.9
            spin = false
            "##,
        )
        .expect("config parses");

        assert_eq!(config.reload.delay, Duration::from_millis(250));
        assert_eq!(config.reload.policy, DebouncePolicy::Overlapping);
        assert_eq!(config.defaults.artwork_url, "file:///tmp/cover.png");
        assert_eq!(config.defaults.media_type, MediaType::CompactCassette);
        assert_eq!(config.defaults.color, Color32::from_rgb(0x33, 0x66, 0x99));
        assert_eq!(config.defaults.opacity, 0.75);
        assert_eq!(config.defaults.scale, 0.4);
        assert_eq!(config.render.texture_size(), 258);
        assert_eq!(config.render.groove_count, 20);
        assert_eq!(config.render.label_ratio(), 0.6);
        assert!(!config.render.spin);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = Config::parse(
            r#"
            [reload]
            delay_secs = 60.0

            [defaults]
            opacity = 3.0
            scale = -1.0
            "#,
        )
        .expect("config parses");

        assert_eq!(config.reload.delay, Duration::from_secs(10));
        assert_eq!(config.defaults.opacity, 1.0);
        assert_eq!(config.defaults.scale, 0.0);
    }

    #[test]
    fn bad_color_falls_back_to_default() {
        let config = Config::parse(
            r#"
            [defaults]
            color = "chartreuse"
            "#,
        )
        .expect("config parses");
        assert_eq!(config.defaults.color, RenderParameters::default().color);
    }

    #[test]
    fn color_with_alpha_falls_back_to_default() {
        let config = Config::parse(
            r##"
            [defaults]
            color = "#336699FF"
            "##,
        )
        .expect("config parses");
        assert_eq!(config.defaults.color, RenderParameters::default().color);
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let result = Config::parse(
            r#"
            [reload]
            policy = "sometimes"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn load_from_reports_missing_file() {
        let path = env::temp_dir().join("physical_media_demo_missing_config.toml");
        let err = Config::load_from(&path).expect_err("missing file fails");
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn parses_supported_color_formats() {
        assert_eq!(
            parse_color("#FF2D55").unwrap(),
            Color32::from_rgb(255, 45, 85)
        );
        assert_eq!(
            parse_color("rgb(1, 2, 3)").unwrap(),
            Color32::from_rgb(1, 2, 3)
        );
        assert!(parse_color("#FF2D5500").is_err());
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("rgb(1, 2)").is_err());
        assert!(parse_color("rgb(1, 2, 300)").is_err());
    }
}
