//! A named photonic-crystal sub-lattice with its physical dimensions

use crate::error::{CrystalError, Result};
use crate::grid::LatticeGrid;
use crate::store::LatticeStore;
use tracing::info;

/// Default lattice constant (m)
pub const DEFAULT_LATTICE_CONSTANT: f64 = 0.426e-6;
/// Default etch depth (m)
pub const DEFAULT_ZSPAN: f64 = 0.40e-6;

#[derive(Debug, Clone)]
pub struct Crystal {
    pub name: String,
    /// Lattice constant `a` (m)
    pub a: f64,
    /// Etch depth (m)
    pub zspan: f64,
    pub grid: LatticeGrid,
    /// Horizontal offset assigned when the crystal is placed in a scene
    pub x_init: f64,
}

impl Crystal {
    pub fn new(name: impl Into<String>, grid: LatticeGrid, a: f64, zspan: f64) -> Self {
        Self {
            name: name.into(),
            a,
            zspan,
            grid,
            x_init: 0.0,
        }
    }

    /// Load the persisted lattice for `name`
    pub fn open(store: &dyn LatticeStore, name: &str, a: f64, zspan: f64) -> Result<Self> {
        let grid = LatticeGrid::load(store, name)?;
        Ok(Self::new(name, grid, a, zspan))
    }

    /// Load the lattice, creating and persisting a default one when none exists
    pub fn open_or_init(store: &dyn LatticeStore, name: &str, a: f64, zspan: f64) -> Result<Self> {
        match Self::open(store, name, a, zspan) {
            Err(CrystalError::MissingModel { .. }) => {
                let mut grid = LatticeGrid::default();
                grid.generate_default(store, name, 5, 5)?;
                info!("Edit the lattice for '{}' and compile again", name);
                Ok(Self::new(name, grid, a, zspan))
            }
            other => other,
        }
    }

    /// Row pitch `h = a·√3/2`
    pub fn h(&self) -> f64 {
        row_pitch(self.a)
    }

    /// Number of lattice columns
    pub fn columns(&self) -> usize {
        self.grid.x()
    }

    /// Number of lattice rows
    pub fn rows(&self) -> usize {
        self.grid.y()
    }

    pub fn expand_x(&mut self, store: &dyn LatticeStore, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.grid.expand_x(n);
        store.save(&self.name, self.grid.model())
    }

    pub fn reduce_x(&mut self, store: &dyn LatticeStore, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.grid.reduce_x(n)?;
        store.save(&self.name, self.grid.model())
    }
}

pub fn row_pitch(a: f64) -> f64 {
    a * 3f64.sqrt() / 2.0
}
