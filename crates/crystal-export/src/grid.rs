//! Lattice text model and the flipped symbol matrix compiled from it
//!
//! The text is what the user edits: one line per lattice row, two
//! characters per site. `" 0"` pairs mark rows shifted by half a lattice
//! step, `"0 "` pairs mark unshifted rows. The matrix is the same data
//! tokenized and flipped so that row 0 is the bottom of the structure.

use crate::catalog::Site;
use crate::error::{CrystalError, Result};
use crate::store::LatticeStore;
use tracing::{info, warn};

/// The textual lattice plus the dimensions derived from it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatticeGrid {
    model: String,
    x: usize,
    y: usize,
    first_null: bool,
}

impl LatticeGrid {
    /// Build from raw text, dropping blank lines and normalising the trailing newline
    pub fn from_text(text: &str) -> Self {
        let mut grid = Self::default();
        grid.set_model(normalize(text));
        grid
    }

    /// Read the persisted model for `name`; ragged rows are rejected
    pub fn load(store: &dyn LatticeStore, name: &str) -> Result<Self> {
        let grid = Self::from_text(&store.load(name)?);
        grid.check_rows()?;
        info!(
            "Lattice '{}' loaded: {} x {} sites, first_null={}",
            name, grid.x, grid.y, grid.first_null
        );
        Ok(grid)
    }

    /// Replace the model with the default checkerboard and persist it
    pub fn generate_default(
        &mut self,
        store: &dyn LatticeStore,
        name: &str,
        x: usize,
        y: usize,
    ) -> Result<()> {
        let model = default_model(x, y, self.first_null);
        store.save(name, &model)?;
        self.set_model(model);
        info!("Default {} x {} lattice generated for '{}'", x, y, name);
        Ok(())
    }

    /// Raw text, one line per row, always newline-terminated
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Symbols per row
    pub fn x(&self) -> usize {
        self.x
    }

    /// Number of rows
    pub fn y(&self) -> usize {
        self.y
    }

    /// Whether even matrix rows carry the half-step offset
    pub fn first_null(&self) -> bool {
        self.first_null
    }

    pub fn set_first_null(&mut self, first_null: bool) {
        self.first_null = first_null;
    }

    /// Swap in new text and recompute `x`, `y` and `first_null`
    pub(crate) fn set_model(&mut self, model: String) {
        self.x = model
            .lines()
            .map(|line| line.split_whitespace().count())
            .max()
            .unwrap_or(0);
        self.y = model.lines().count();
        if let Some(last) = model.lines().last() {
            self.first_null = last.starts_with(' ');
        }
        self.model = model;
    }

    /// Tokenized rows in stored (top-down) order.
    ///
    /// Call again to start over; nothing is cached between calls.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        self.model.lines().map(|line| line.split_whitespace().collect())
    }

    /// Fail with `MalformedLattice` on the first row whose symbol count differs from row 0
    pub fn check_rows(&self) -> Result<()> {
        let mut expected = None;
        for (row, tokens) in self.rows().enumerate() {
            let expected = *expected.get_or_insert(tokens.len());
            if tokens.len() != expected {
                return Err(CrystalError::MalformedLattice {
                    row,
                    expected,
                    found: tokens.len(),
                });
            }
        }
        Ok(())
    }

    /// Tokenize, validate and flip the model into a matrix with row 0 at the bottom
    pub fn to_matrix(&self) -> Result<SymbolMatrix> {
        self.check_rows()?;

        let mut symbols: Vec<Vec<String>> = self
            .rows()
            .map(|tokens| tokens.into_iter().map(str::to_string).collect())
            .collect();
        symbols.reverse();

        let sites: Vec<Vec<Site>> = symbols
            .iter()
            .map(|row| row.iter().map(|s| Site::from_symbol(s)).collect())
            .collect();

        let unknown = symbols.iter().flatten().filter(|s| !Site::is_known(s)).count();
        if unknown > 0 {
            warn!("{} unknown lattice symbols treated as empty sites", unknown);
        }

        Ok(SymbolMatrix {
            symbols,
            sites,
            first_null: self.first_null,
        })
    }
}

impl std::fmt::Display for LatticeGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.model)
    }
}

/// Checkerboard of `0` holes whose offset alternates row by row
pub fn default_model(x: usize, y: usize, first_null: bool) -> String {
    let mut model = String::with_capacity((2 * x + 1) * y);
    for row in 0..y {
        let parity_row = if (y % 2 == 1) == first_null { row } else { row + 1 };
        let pair = if parity_row % 2 == 0 { " 0" } else { "0 " };
        for _ in 0..x {
            model.push_str(pair);
        }
        model.push('\n');
    }
    model
}

fn normalize(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .flat_map(|line| [line, "\n"])
        .collect()
}

/// Tokenized lattice with row 0 at the physical bottom
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolMatrix {
    symbols: Vec<Vec<String>>,
    sites: Vec<Vec<Site>>,
    first_null: bool,
}

impl SymbolMatrix {
    pub fn height(&self) -> usize {
        self.sites.len()
    }

    pub fn width(&self) -> usize {
        self.sites.first().map_or(0, Vec::len)
    }

    pub fn symbols(&self) -> &[Vec<String>] {
        &self.symbols
    }

    pub fn site(&self, row: usize, col: usize) -> Site {
        self.sites[row][col]
    }

    /// Bounds-checked lookup; `None` outside the grid, never wrapping around
    pub fn neighbor(&self, row: isize, col: isize) -> Option<Site> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        self.sites.get(row)?.get(col).copied()
    }

    /// Whether this row is shifted right by half a lattice step
    pub fn is_offset_row(&self, row: usize) -> bool {
        (row % 2 == 1) != self.first_null
    }

    /// Every cell as `(row, col, site)`, bottom row first
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Site)> + '_ {
        self.sites.iter().enumerate().flat_map(|(row, sites)| {
            sites.iter().enumerate().map(move |(col, site)| (row, col, *site))
        })
    }

    /// Undo the flip: rows back in stored (top-down) order
    pub fn to_stored_order(&self) -> Vec<Vec<String>> {
        self.symbols.iter().rev().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_five_by_five() {
        let model = default_model(5, 5, false);
        assert_eq!(
            model,
            "0 0 0 0 0 \n 0 0 0 0 0\n0 0 0 0 0 \n 0 0 0 0 0\n0 0 0 0 0 \n"
        );

        let grid = LatticeGrid::from_text(&model);
        assert_eq!((grid.x(), grid.y()), (5, 5));
        assert!(!grid.first_null());

        let matrix = grid.to_matrix().unwrap();
        assert!(!matrix.is_offset_row(0));
        assert!(matrix.is_offset_row(1));
        assert!(!matrix.is_offset_row(2));
    }

    #[test]
    fn test_default_even_rows_and_first_null() {
        // An even row count or a set flag must still round-trip the flag
        for (y, first_null) in [(4, false), (4, true), (5, true)] {
            let grid = LatticeGrid::from_text(&default_model(3, y, first_null));
            assert_eq!(grid.first_null(), first_null, "y={y}");
            assert_eq!(grid.y(), y);
        }
    }

    #[test]
    fn test_blank_lines_stripped() {
        let grid = LatticeGrid::from_text("\n0 1 \n   \n 0 c\n\n\n");
        assert_eq!(grid.model(), "0 1 \n 0 c\n");
        assert_eq!((grid.x(), grid.y()), (2, 2));
        assert!(grid.first_null());

        let grid = LatticeGrid::from_text("0 1 ");
        assert_eq!(grid.model(), "0 1 \n");
    }

    #[test]
    fn test_flip_round_trip() {
        let text = "0 1 2 \n 3 4 5\nc s m \n";
        let grid = LatticeGrid::from_text(text);
        let matrix = grid.to_matrix().unwrap();

        assert_eq!(matrix.symbols()[0], vec!["c", "s", "m"]);
        assert_eq!(matrix.site(0, 1), Site::Source);

        let stored: Vec<Vec<String>> = grid
            .rows()
            .map(|row| row.into_iter().map(String::from).collect())
            .collect();
        assert_eq!(matrix.to_stored_order(), stored);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let grid = LatticeGrid::from_text("0 0 0 \n 0 0\n");
        match grid.to_matrix() {
            Err(CrystalError::MalformedLattice { row, expected, found }) => {
                assert_eq!((row, expected, found), (1, 3, 2));
            }
            other => panic!("Expected MalformedLattice, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_ragged_model() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store.save("pc", "0 0 0 \n 0 0\n").unwrap();

        match LatticeGrid::load(&store, "pc") {
            Err(CrystalError::MalformedLattice { row, expected, found }) => {
                assert_eq!((row, expected, found), (1, 3, 2));
            }
            other => panic!("Expected MalformedLattice, got {:?}", other),
        }
    }

    #[test]
    fn test_width_counts_symbols() {
        let grid = LatticeGrid::from_text("00 00 \n 0\t0\n");
        assert_eq!(grid.x(), 2);
        assert_eq!(grid.to_matrix().unwrap().width(), 2);
    }

    #[test]
    fn test_neighbor_is_bounds_checked() {
        let matrix = LatticeGrid::from_text("0 . \n 1 c\n").to_matrix().unwrap();
        assert_eq!(matrix.neighbor(-1, 0), None);
        assert_eq!(matrix.neighbor(0, -1), None);
        assert_eq!(matrix.neighbor(2, 0), None);
        assert_eq!(matrix.neighbor(0, 2), None);
        assert_eq!(matrix.neighbor(1, 1), Some(Site::None));
        assert_eq!(matrix.cells().count(), 4);
    }

    #[test]
    fn test_rows_restart() {
        let grid = LatticeGrid::from_text("0 0 \n 1 1\n");
        assert_eq!(grid.rows().count(), 2);
        assert_eq!(grid.rows().next().unwrap(), vec!["0", "0"]);
    }

    #[test]
    fn test_generate_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        assert!(matches!(
            LatticeGrid::load(&store, "pc"),
            Err(CrystalError::MissingModel { .. })
        ));

        let mut grid = LatticeGrid::default();
        grid.generate_default(&store, "pc", 5, 5).unwrap();
        let loaded = LatticeGrid::load(&store, "pc").unwrap();
        assert_eq!(loaded, grid);

        // Regenerating keeps the previous model as a backup
        grid.generate_default(&store, "pc", 3, 2).unwrap();
        let backup = dir.path().join("backups/pc_crystal_model_bkp1.txt");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), default_model(5, 5, false));
        assert_eq!(LatticeGrid::load(&store, "pc").unwrap().x(), 3);
    }
}
