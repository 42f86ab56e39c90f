use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SettingsError;
use crate::model::{DEFAULT_VERTEX_RADIUS, Rgba};
use crate::viewport::{
    GROUPING_PADDING, LayoutConfig, VISUAL_LABEL_THRESHOLD, WINDOWING_THRESHOLD, default_palette,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub grid_unit: f64,
    pub ratio: f64,
    pub vertex_radius: f64,
    pub grouping_padding: f64,
    pub snap_to_grid: bool,
    pub visual_label_threshold: f64,
    pub windowing_threshold: f64,
    pub history_limit: usize,
    pub default_vertex_color: Rgba,
    pub colors: Vec<Rgba>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            grid_unit: 10.0,
            ratio: 1.0,
            vertex_radius: DEFAULT_VERTEX_RADIUS,
            grouping_padding: GROUPING_PADDING,
            snap_to_grid: true,
            visual_label_threshold: VISUAL_LABEL_THRESHOLD,
            windowing_threshold: WINDOWING_THRESHOLD,
            history_limit: 200,
            default_vertex_color: Rgba::default(),
            colors: default_palette(),
        }
    }
}

impl LayoutSettings {
    pub fn to_config(&self) -> Result<LayoutConfig, SettingsError> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(value)
            } else {
                Err(SettingsError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )))
            }
        };
        let non_negative = |name: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(value)
            } else {
                Err(SettingsError::Invalid(format!(
                    "{name} must not be negative, got {value}"
                )))
            }
        };
        let visual_label_threshold = positive("visual_label_threshold", self.visual_label_threshold)?;
        let windowing_threshold = positive("windowing_threshold", self.windowing_threshold)?;
        if windowing_threshold > visual_label_threshold {
            return Err(SettingsError::Invalid(
                "windowing_threshold must not exceed visual_label_threshold".to_string(),
            ));
        }
        Ok(LayoutConfig {
            grid_unit: positive("grid_unit", self.grid_unit)?,
            ratio: positive("ratio", self.ratio)?,
            vertex_radius: non_negative("vertex_radius", self.vertex_radius)?,
            grouping_padding: non_negative("grouping_padding", self.grouping_padding)?,
            snap_to_grid: self.snap_to_grid,
            visual_label_threshold,
            windowing_threshold,
            history_limit: self.history_limit.max(1),
            default_vertex_color: self.default_vertex_color,
            colors: self.colors.clone(),
        })
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

pub fn parse_settings(text: &str, prefer_toml: bool) -> Result<LayoutSettings, SettingsError> {
    if prefer_toml {
        toml::from_str::<LayoutSettings>(text)
            .or_else(|err| serde_json::from_str(text).map_err(|_| SettingsError::from(err)))
    } else {
        serde_json::from_str::<LayoutSettings>(text)
            .or_else(|err| toml::from_str(text).map_err(|_| SettingsError::from(err)))
    }
}

pub fn load_settings(path: impl AsRef<Path>) -> Result<LayoutSettings, SettingsError> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)?;
    parse_settings(&s, is_toml(path))
}

pub fn save_settings(path: impl AsRef<Path>, settings: &LayoutSettings) -> Result<(), SettingsError> {
    let path = path.as_ref();
    let text = if is_toml(path) {
        toml::to_string_pretty(settings)?
    } else {
        serde_json::to_string_pretty(settings)?
    };
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings = parse_settings("grid_unit = 16.0\nsnap_to_grid = false\n", true).unwrap();
        assert_eq!(settings.grid_unit, 16.0);
        assert!(!settings.snap_to_grid);
        assert_eq!(settings.history_limit, 200);
        assert_eq!(settings.colors, default_palette());
    }

    #[test]
    fn json_falls_back_from_toml_preference() {
        let settings = parse_settings(r##"{"ratio": 2.0, "colors": ["#000000"]}"##, true).unwrap();
        assert_eq!(settings.ratio, 2.0);
        assert_eq!(settings.colors, vec![Rgba::rgb(0, 0, 0)]);
    }

    #[test]
    fn bad_colour_is_a_parse_error() {
        assert!(parse_settings(r#"colors = ["red"]"#, true).is_err());
    }

    #[test]
    fn zero_grid_unit_is_rejected() {
        let settings = LayoutSettings {
            grid_unit: 0.0,
            ..LayoutSettings::default()
        };
        assert!(matches!(settings.to_config(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let settings = LayoutSettings {
            windowing_threshold: 2.0,
            visual_label_threshold: 1.0,
            ..LayoutSettings::default()
        };
        assert!(settings.to_config().is_err());
    }

    #[test]
    fn toml_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("netdiagram-{}.toml", uuid::Uuid::new_v4()));
        let settings = LayoutSettings {
            grid_unit: 12.0,
            ..LayoutSettings::default()
        };
        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.to_config().unwrap().grid_unit, 12.0);
    }
}
