//! Scene assembly: crystals side by side, plus substrate, devices and analysis regions
//!
//! Every object is upserted by name, so running the same assembly twice
//! against one session leaves the same set of objects behind.

use crate::catalog::MONITOR_CLEARANCE_FRACTION;
use crate::compiler::GeometryCompiler;
use crate::config::SceneConfig;
use crate::crystal::{row_pitch, Crystal};
use crate::error::{CrystalError, Result};
use crate::session::{EngineSession, ObjectKind, SceneObject};
use tracing::info;

pub struct SceneAssembler<S: EngineSession> {
    session: S,
    config: SceneConfig,
    compiler: GeometryCompiler,
    crystals: Vec<Crystal>,
    accumulated_x: f64,
}

impl<S: EngineSession> SceneAssembler<S> {
    pub fn new(session: S, config: SceneConfig) -> Self {
        let compiler = GeometryCompiler::new(config.boundary);
        Self {
            session,
            config,
            compiler,
            crystals: Vec::new(),
            accumulated_x: 0.0,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    pub fn crystals(&self) -> &[Crystal] {
        &self.crystals
    }

    /// Total width of the crystals placed so far
    pub fn accumulated_x(&self) -> f64 {
        self.accumulated_x
    }

    /// Place `crystal` to the right of the previous ones as a structure group
    pub fn add_crystal(&mut self, mut crystal: Crystal) -> Result<()> {
        crystal.x_init = self.accumulated_x;
        let compiled = self.compiler.compile(&crystal)?;

        self.session.upsert(
            SceneObject::new(ObjectKind::StructureGroup, crystal.name.clone())
                .with("x", crystal.x_init)
                .with("y", 0.0)
                .with("z", 0.0)
                .with("script", compiled.stream.to_script()),
        )?;

        self.accumulated_x += crystal.columns() as f64 * crystal.a;
        info!(
            "Crystal '{}' placed at x = {:e} ({} shapes)",
            crystal.name,
            crystal.x_init,
            compiled.stream.len() - 1
        );
        self.crystals.push(crystal);
        Ok(())
    }

    /// Mode sources at every `s` site of the first crystal. Returns how many were placed.
    pub fn add_sources(&mut self) -> Result<usize> {
        let crystal = self
            .crystals
            .first()
            .ok_or(CrystalError::NoCrystals("sources"))?;
        let compiled = self.compiler.compile(crystal)?;
        let settings = &self.config.source;

        for placement in &compiled.sources {
            let source = SceneObject::new(ObjectKind::ModeSource, format!("source_{}", placement.index))
                .with("amplitude", settings.amplitude)
                .with("injection axis", settings.injection_axis.as_str())
                .with("mode selection", settings.mode_selection.as_str())
                .with("override global source settings", true)
                .with("set time domain", true)
                .with("pulse type", "standard")
                .with("frequency", settings.frequency())
                .with("offset", settings.offset)
                .with("pulselength", settings.pulse_length)
                .with("number of trial modes", settings.trial_modes)
                .with("x", placement.position.x)
                .with("y", placement.position.y)
                .with("y span", 2.0 * crystal.a)
                .with("z span", settings.z_span);
            self.session.upsert(source)?;
        }

        info!("{} sources placed", compiled.sources.len());
        Ok(compiled.sources.len())
    }

    /// Power monitors at every `m` site of the last crystal. Returns how many were placed.
    pub fn add_monitors(&mut self) -> Result<usize> {
        let crystal = self
            .crystals
            .last()
            .ok_or(CrystalError::NoCrystals("monitors"))?;
        let compiled = self.compiler.compile(crystal)?;
        let settings = &self.config.monitor;
        let clearance = MONITOR_CLEARANCE_FRACTION * crystal.a;

        for placement in &compiled.monitors {
            let monitor = SceneObject::new(ObjectKind::PowerMonitor, format!("monitor_{}", placement.index))
                .with("monitor type", settings.monitor_type)
                .with("override global monitor settings", true)
                .with("frequency points", settings.frequency_points)
                .with("use source limits", settings.use_source_limits)
                .with("x", placement.position.x)
                .with("y", placement.position.y)
                .with("y span", 2.0 * crystal.h() - 2.0 * clearance);
            self.session.upsert(monitor)?;
        }

        info!("{} monitors placed", compiled.monitors.len());
        Ok(compiled.monitors.len())
    }

    /// Width and height spanned by the assembled lattice
    pub fn size(&self) -> Result<(f64, f64)> {
        let crystal = self.crystals.last().ok_or(CrystalError::NoCrystals("the base"))?;
        let h = row_pitch(crystal.a);
        let height = crystal.rows().saturating_sub(1) as f64 * h;
        Ok((self.accumulated_x, height))
    }

    /// Substrate rectangle under the whole lattice, margins included
    pub fn add_base(&mut self) -> Result<()> {
        let (width, height) = self.size()?;
        let base = &self.config.base;

        let rect = SceneObject::new(ObjectKind::Rect, "base")
            .with("x", width / 2.0)
            .with("x span", width + 2.0 * self.config.x_margin)
            .with("y", height / 2.0)
            .with("y span", height + 2.0 * self.config.y_margin)
            .with("material", base.material.as_str())
            .with("z span", base.z_span);
        self.session.upsert(rect)
    }

    /// Simulation region and analysis monitors sized like the base
    pub fn add_analysis(&mut self, movie: bool) -> Result<()> {
        let (width, height) = self.size()?;
        let region = |kind: ObjectKind, name: &str| {
            SceneObject::new(kind, name)
                .with("x", width / 2.0)
                .with("y", height / 2.0)
                .with("x span", width + 2.0 * self.config.x_margin)
                .with("y span", height + 2.0 * self.config.y_margin)
        };

        let analysis = &self.config.analysis;
        let mut objects = Vec::new();
        if analysis.fdtd_region {
            objects.push(region(ObjectKind::FdtdRegion, "FDTD").with("dimension", "2D"));
        }
        if analysis.field_monitor {
            objects.push(region(ObjectKind::ProfileMonitor, "field_monitor"));
        }
        if analysis.index_monitor {
            objects.push(region(ObjectKind::IndexMonitor, "dielectric_monitor"));
        }
        if movie {
            let settings = &analysis.movie;
            objects.push(
                region(ObjectKind::Movie, "movie")
                    .with("horizontal resolution", settings.horizontal_resolution)
                    .with("lock aspect ratio", settings.lock_aspect_ratio)
                    .with("scale", settings.scale),
            );
        }

        for object in objects {
            self.session.upsert(object)?;
        }
        Ok(())
    }
}
