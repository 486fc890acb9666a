//! Horizontal resizing of the lattice text

use crate::error::{CrystalError, Result};
use crate::grid::LatticeGrid;

impl LatticeGrid {
    /// Widen every row by `n` sites, repeating the row's final two-character pair.
    ///
    /// The last pair carries the row's offset state, so the parity pattern survives.
    pub fn expand_x(&mut self, n: usize) {
        let mut model = String::with_capacity(self.model().len() + 2 * n * self.y());
        for line in self.model().lines() {
            let chars: Vec<char> = line.chars().collect();
            let tail: String = chars[chars.len().saturating_sub(2)..].iter().collect();
            model.push_str(line);
            for _ in 0..n {
                model.push_str(&tail);
            }
            model.push('\n');
        }
        self.set_model(model);
    }

    /// Narrow every row by `n` sites, dropping trailing pairs.
    ///
    /// Fails without touching the model when any row would be left without a symbol.
    pub fn reduce_x(&mut self, n: usize) -> Result<()> {
        let cut = 2 * n;
        let mut model = String::with_capacity(self.model().len());
        for (row, line) in self.model().lines().enumerate() {
            let chars: Vec<char> = line.chars().collect();
            let kept = &chars[..chars.len().saturating_sub(cut)];
            if kept.iter().all(|c| c.is_whitespace()) {
                return Err(CrystalError::InvalidDimension(format!(
                    "cannot remove {n} sites from row {row}, which is only {} characters wide",
                    chars.len()
                )));
            }
            model.extend(kept);
            model.push('\n');
        }
        self.set_model(model);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::default_model;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_keeps_parity() {
        let mut grid = LatticeGrid::from_text("0 1 \n 0 c\n");
        grid.expand_x(2);
        assert_eq!(grid.model(), "0 1 1 1 \n 0 c c c\n");
        assert_eq!(grid.x(), 4);
        assert_eq!(grid.y(), 2);
    }

    #[test]
    fn test_reduce() {
        let mut grid = LatticeGrid::from_text(&default_model(5, 3, false));
        grid.reduce_x(2).unwrap();
        assert_eq!(grid.model(), default_model(3, 3, false));
        assert_eq!(grid.x(), 3);
    }

    #[test]
    fn test_expand_then_reduce_restores() {
        let original = "0 1 2 \n 3 c .\ns 0 m \n";
        for n in 0..5 {
            let mut grid = LatticeGrid::from_text(original);
            grid.expand_x(n);
            grid.reduce_x(n).unwrap();
            assert_eq!(grid.model(), original, "n={n}");
        }
    }

    #[test]
    fn test_reduce_too_far_is_rejected() {
        let mut grid = LatticeGrid::from_text("0 0 \n 0 0\n");
        let before = grid.clone();
        assert!(matches!(grid.reduce_x(3), Err(CrystalError::InvalidDimension(_))));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_reduce_to_empty_rows_is_rejected() {
        let mut grid = LatticeGrid::from_text("0 0 \n 0 0\n");
        let before = grid.clone();
        assert!(matches!(grid.reduce_x(2), Err(CrystalError::InvalidDimension(_))));
        assert_eq!(grid, before);

        grid.reduce_x(1).unwrap();
        assert_eq!(grid.model(), "0 \n 0\n");
        assert_eq!((grid.x(), grid.y()), (1, 2));
    }
}
