//! crystal-export: Compile hexagonal photonic-crystal lattice sketches to Lumerical FDTD
//!
//! This crate provides:
//! - Loading, generating and resizing the textual lattice model
//! - Compilation of lattice sites into etched circles and curved waveguide bends
//! - Left-to-right assembly of several crystals with substrate, sources,
//!   monitors and analysis regions
//! - `.lsf` script generation for the assembled scene
//!
//! All lengths are in metres.

pub mod catalog;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod crystal;
pub mod directive;
pub mod editor;
pub mod error;
pub mod grid;
pub mod scene;
pub mod session;
pub mod store;

pub use catalog::Site;
pub use codegen::render_lsf;
pub use compiler::{CompiledCrystal, CurveCase, CurveNeighbors, DevicePlacement, GeometryCompiler};
pub use config::{BoundaryPolicy, SceneConfig};
pub use crystal::Crystal;
pub use directive::{Directive, DirectiveStream};
pub use error::{CrystalError, Result};
pub use grid::{LatticeGrid, SymbolMatrix};
pub use scene::SceneAssembler;
pub use session::{EngineSession, ScriptSession};
pub use store::{FsStore, LatticeStore};

use tracing::info;

/// Which optional parts of the scene to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneOptions {
    pub sources: bool,
    pub monitors: bool,
    pub base: bool,
    pub analysis: bool,
    pub movie: bool,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            sources: true,
            monitors: true,
            base: true,
            analysis: true,
            movie: false,
        }
    }
}

/// Assemble `crystals` left to right into a fresh recorded session
pub fn build_scene(
    crystals: Vec<Crystal>,
    config: &SceneConfig,
    options: SceneOptions,
) -> Result<ScriptSession> {
    let mut scene = SceneAssembler::new(ScriptSession::new(), config.clone());
    for crystal in crystals {
        scene.add_crystal(crystal)?;
    }
    if options.base {
        scene.add_base()?;
    }
    if options.sources {
        scene.add_sources()?;
    }
    if options.monitors {
        scene.add_monitors()?;
    }
    if options.analysis {
        scene.add_analysis(options.movie)?;
    }
    Ok(scene.into_session())
}

/// Main entry point: load the named lattices and generate the scene script
pub fn translate(
    store: &dyn LatticeStore,
    names: &[String],
    config: &SceneConfig,
    options: SceneOptions,
) -> Result<String> {
    let crystals = names
        .iter()
        .map(|name| Crystal::open(store, name, config.lattice_constant, config.zspan))
        .collect::<Result<Vec<_>>>()?;

    let session = build_scene(crystals, config, options)?;
    info!("Scene assembled from {} crystals", names.len());
    render_lsf(&session, &format!("Lattice constant: {:e} m", config.lattice_constant))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LengthUnit {
    Meter,
    Millimeter,
    Micrometer,
    Nanometer,
}

impl LengthUnit {
    /// Convert from this unit to meters
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            LengthUnit::Meter => value,
            LengthUnit::Millimeter => value * 1e-3,
            LengthUnit::Micrometer => value * 1e-6,
            LengthUnit::Nanometer => value * 1e-9,
        }
    }

    /// Convert from meters to this unit
    pub fn from_meters(&self, value: f64) -> f64 {
        match self {
            LengthUnit::Meter => value,
            LengthUnit::Millimeter => value * 1e3,
            LengthUnit::Micrometer => value * 1e6,
            LengthUnit::Nanometer => value * 1e9,
        }
    }
}

impl std::str::FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "m" | "meter" | "meters" => Ok(LengthUnit::Meter),
            "mm" | "millimeter" | "millimeters" => Ok(LengthUnit::Millimeter),
            "um" | "µm" | "micrometer" | "micrometers" => Ok(LengthUnit::Micrometer),
            "nm" | "nanometer" | "nanometers" => Ok(LengthUnit::Nanometer),
            _ => Err(format!("Unknown unit: {}. Use: m, mm, um, or nm", s)),
        }
    }
}
