//! Scene configuration, loadable from JSON with every field defaulted

use crate::crystal::{DEFAULT_LATTICE_CONSTANT, DEFAULT_ZSPAN};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a curve does when a neighbour falls outside the lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Out-of-grid neighbours count as unetched
    #[default]
    Empty,
    /// Fail the crystal with `NeighborBounds`
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Lattice constant `a` in metres
    pub lattice_constant: f64,
    /// Etch depth in metres
    pub zspan: f64,
    /// Clearance around the lattice for the substrate and analysis regions
    pub x_margin: f64,
    pub y_margin: f64,
    pub boundary: BoundaryPolicy,
    pub base: BaseSettings,
    pub source: SourceSettings,
    pub monitor: MonitorSettings,
    pub analysis: AnalysisSettings,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            lattice_constant: DEFAULT_LATTICE_CONSTANT,
            zspan: DEFAULT_ZSPAN,
            x_margin: 0.8e-6,
            y_margin: 0.8e-6,
            boundary: BoundaryPolicy::default(),
            base: BaseSettings::default(),
            source: SourceSettings::default(),
            monitor: MonitorSettings::default(),
            analysis: AnalysisSettings::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Substrate slab under the etched lattice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseSettings {
    pub material: String,
    pub z_span: f64,
}

impl Default for BaseSettings {
    fn default() -> Self {
        Self {
            material: "algaas_lpedraza".to_string(),
            z_span: 0.36e-6,
        }
    }
}

/// Mode-source parameters, passed through to the engine untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub amplitude: f64,
    /// Centre wavelength (m); the engine receives `c / wavelength`
    pub wavelength: f64,
    /// Pulse offset (s)
    pub offset: f64,
    /// Pulse length (s)
    pub pulse_length: f64,
    pub injection_axis: String,
    pub mode_selection: String,
    pub trial_modes: u32,
    pub z_span: f64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            amplitude: 2.07766e8,
            wavelength: 1541.3e-9,
            offset: 30e-15,
            pulse_length: 50e-15,
            injection_axis: "x-axis".to_string(),
            mode_selection: "fundamental TE mode".to_string(),
            trial_modes: 20,
            z_span: 1.14e-6,
        }
    }
}

impl SourceSettings {
    /// Centre frequency in Hz
    pub fn frequency(&self) -> f64 {
        SPEED_OF_LIGHT / self.wavelength
    }
}

pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Engine monitor type code (3 = linear x)
    pub monitor_type: u32,
    pub frequency_points: u32,
    pub use_source_limits: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            monitor_type: 3,
            frequency_points: 300,
            use_source_limits: true,
        }
    }
}

/// Which analysis objects `add_analysis` creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub fdtd_region: bool,
    pub field_monitor: bool,
    pub index_monitor: bool,
    pub movie: MovieSettings,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            fdtd_region: true,
            field_monitor: true,
            index_monitor: true,
            movie: MovieSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieSettings {
    pub horizontal_resolution: u32,
    pub lock_aspect_ratio: bool,
    pub scale: f64,
}

impl Default for MovieSettings {
    fn default() -> Self {
        Self {
            horizontal_resolution: 720,
            lock_aspect_ratio: true,
            scale: 2e16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SceneConfig::from_json(
            r#"{"lattice_constant": 4.0e-7, "boundary": "reject", "source": {"amplitude": 2.0}}"#,
        )
        .unwrap();

        assert_eq!(config.lattice_constant, 4.0e-7);
        assert_eq!(config.boundary, BoundaryPolicy::Reject);
        assert_eq!(config.source.amplitude, 2.0);
        assert_eq!(config.source.trial_modes, 20);
        assert_eq!(config.zspan, DEFAULT_ZSPAN);
        assert_eq!(config.base.material, "algaas_lpedraza");
    }

    #[test]
    fn test_bad_json() {
        assert!(SceneConfig::from_json("{\"zspan\": \"deep\"}").is_err());
    }

    #[test]
    fn test_source_frequency() {
        let source = SourceSettings::default();
        // 1541.3 nm ≈ 194.5 THz
        assert!((source.frequency() - 1.945e14).abs() < 1e11);
    }
}
