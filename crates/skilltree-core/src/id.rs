use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a node in the skill graph. Assigned when the graph is built.
    pub struct NodeKey;

    /// Identifies a tier in the skill graph.
    pub struct TierKey;
}

/// Suffix appended to a tier id to name its root node when the tier does not
/// declare one explicitly (`"Smite"` -> `"Smite01"`).
pub const ROOT_SUFFIX: &str = "01";

/// A position on the layout grid, in grid units.
///
/// Node positions are stored relative to their tier's origin; use
/// [`GridPos::offset`] to obtain the absolute position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridPos {
    pub gx: f64,
    pub gy: f64,
}

impl GridPos {
    pub const ORIGIN: GridPos = GridPos { gx: 0.0, gy: 0.0 };

    pub fn new(gx: f64, gy: f64) -> Self {
        Self { gx, gy }
    }

    /// Translate this position by `origin`.
    pub fn offset(self, origin: GridPos) -> GridPos {
        GridPos {
            gx: origin.gx + self.gx,
            gy: origin.gy + self.gy,
        }
    }
}
