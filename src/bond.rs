use serde::{Deserialize, Serialize};

/// Bond order of a molecular-graph edge.
///
/// Aromatic bonds are kept as their own order rather than kekulized;
/// aromatic rings stay aromatic through every graph edit and in the
/// canonical textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Twice the nominal bond order: how much of an atom's valence the
    /// bond consumes when filling implicit hydrogens (aromatic counts as
    /// one and a half).
    pub fn valence_contribution_doubled(self) -> u8 {
        match self {
            Self::Single => 2,
            Self::Double => 4,
            Self::Triple => 6,
            Self::Aromatic => 3,
        }
    }
}

/// Edge weight of a labeled molecular graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bond {
    pub order: BondOrder,
}

impl Bond {
    pub fn single() -> Self {
        Self {
            order: BondOrder::Single,
        }
    }

    pub fn new(order: BondOrder) -> Self {
        Self { order }
    }
}
