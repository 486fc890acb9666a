//! Symbol catalog: single-character lattice symbols and what they etch

/// What a lattice site turns into once compiled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Site {
    /// Plain etched hole
    Circle { radius_fraction: f64 },
    /// Waveguide bend: polygon plus fillet, oriented by its neighbours
    Curve { radius_fraction: f64 },
    /// Reserved; compiles to nothing yet
    Junction { radius_fraction: f64 },
    Source,
    Monitor,
    None,
}

/// Radius fraction of the curve polygon's rounded ends
pub const CURVE_RADIUS_FRACTION: f64 = 0.38;
/// Radius fraction of the fillet circle placed next to each curve
pub const FILLET_RADIUS_FRACTION: f64 = 0.20;
/// Hole used to size monitors so they clear the neighbouring holes
pub const MONITOR_CLEARANCE_FRACTION: f64 = 0.38;

impl Site {
    /// Resolve a tokenized symbol. Anything not in the table is empty.
    pub fn from_symbol(symbol: &str) -> Self {
        let mut chars = symbol.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Site::None;
        };

        match c {
            '0' => Site::Circle { radius_fraction: 0.30 },
            '1' => Site::Circle { radius_fraction: 0.38 },
            '2' => Site::Circle { radius_fraction: FILLET_RADIUS_FRACTION },
            '3' => Site::Circle { radius_fraction: 0.16 },
            '4' => Site::Circle { radius_fraction: 0.40 },
            '5' => Site::Circle { radius_fraction: 0.25 },
            'c' => Site::Curve { radius_fraction: CURVE_RADIUS_FRACTION },
            'j' => Site::Junction { radius_fraction: 0.38 },
            's' => Site::Source,
            'm' => Site::Monitor,
            _ => Site::None,
        }
    }

    /// Whether the site is unetched for neighbour classification
    pub fn is_empty(&self) -> bool {
        matches!(self, Site::None)
    }

    /// Whether the symbol is one the catalog knows about (`.` included)
    pub fn is_known(symbol: &str) -> bool {
        symbol == "." || !Site::from_symbol(symbol).is_empty()
    }
}
