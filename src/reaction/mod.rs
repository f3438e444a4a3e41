pub mod error;
mod variants;

pub use error::ReactionError;
pub use variants::{
    map_nums, FriedelCrafts, PictetSpengler, PyrroloIndolene, TsujiTrost, Variant,
};

use std::cell::OnceCell;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::mol::{CodecError, Molecule};
use crate::smiles;

/// The closed set of reaction kinds the engine knows how to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReactionKind {
    FriedelCrafts,
    TsujiTrost,
    PictetSpengler,
    PyrroloIndolene,
}

impl ReactionKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::FriedelCrafts => "friedel_crafts",
            Self::TsujiTrost => "tsuji_trost",
            Self::PictetSpengler => "pictet_spengler",
            Self::PyrroloIndolene => "pyrrolo_indolene",
        }
    }

    /// Single-letter suffix used in derived record identifiers.
    pub fn code(self) -> char {
        match self {
            Self::FriedelCrafts => 'f',
            Self::TsujiTrost => 't',
            Self::PictetSpengler => 'p',
            Self::PyrroloIndolene => 'p',
        }
    }

    /// Whether trials of this kind consume a scaffold template. The
    /// surface reactions replace the template with a fixed allylic
    /// fragment and run once per side chain regardless of template count.
    pub fn requires_template(self) -> bool {
        matches!(self, Self::PictetSpengler)
    }
}

/// The reactant set a variant hands from validation to assembly.
///
/// Validation either rejects a trial or returns the fully preprocessed
/// fragments assembly will merge; no variant communicates between the two
/// phases through hidden mutable state.
#[derive(Debug, Clone)]
pub struct Reactants(pub Vec<Molecule>);

impl Reactants {
    pub fn smiles(&self) -> Vec<String> {
        self.0.iter().map(smiles::to_smiles).collect()
    }
}

/// Serialized payload of an accepted reaction: the preprocessed reactants
/// and the assembled product, both as canonical graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionTemplate {
    pub reactants: Vec<Molecule>,
    pub product: Molecule,
}

impl ReactionTemplate {
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(CodecError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(CodecError::Decode)
    }
}

/// Output triple for one accepted reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionInfo {
    pub binary: Vec<u8>,
    pub rxn_atom_idx: usize,
    pub kind: ReactionKind,
}

/// One trial reaction: a variant plus lazily computed, memoized state.
///
/// Validation runs at most once; its result (the preprocessed reactant
/// set, or rejection) is cached, as is the assembled product. A rejected
/// trial yields `None` from [`product`](Self::product), [`smarts`] and
/// [`info`](Self::info) without ever invoking assembly.
///
/// [`smarts`]: Self::smarts
pub struct Reaction {
    variant: Box<dyn Variant>,
    reacting_atom: NodeIndex,
    prepared: OnceCell<Option<Reactants>>,
    product: OnceCell<Option<Molecule>>,
}

impl Reaction {
    pub fn new(variant: Box<dyn Variant>, reacting_atom: NodeIndex) -> Self {
        Self {
            variant,
            reacting_atom,
            prepared: OnceCell::new(),
            product: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> ReactionKind {
        self.variant.kind()
    }

    pub fn reacting_atom(&self) -> NodeIndex {
        self.reacting_atom
    }

    fn prepared(&self) -> Result<&Option<Reactants>, ReactionError> {
        if let Some(cached) = self.prepared.get() {
            return Ok(cached);
        }
        let computed = self.variant.validate()?;
        Ok(self.prepared.get_or_init(|| computed))
    }

    pub fn is_valid(&self) -> Result<bool, ReactionError> {
        Ok(self.prepared()?.is_some())
    }

    pub fn product(&self) -> Result<Option<&Molecule>, ReactionError> {
        if let Some(cached) = self.product.get() {
            return Ok(cached.as_ref());
        }
        let computed = match self.prepared()? {
            Some(reactants) => Some(self.variant.assemble(reactants)?),
            None => None,
        };
        Ok(self.product.get_or_init(|| computed).as_ref())
    }

    /// Atom-mapped reaction SMARTS, `(reactant[.reactant])>>product`.
    /// This string doubles as the deduplication key for symmetric sites.
    pub fn smarts(&self) -> Result<Option<String>, ReactionError> {
        let product = match self.product()? {
            Some(p) => smiles::to_smiles(p),
            None => return Ok(None),
        };
        let reactants = match self.prepared()? {
            Some(r) => r.smiles().join("."),
            None => return Ok(None),
        };
        Ok(Some(format!("({reactants})>>{product}")))
    }

    pub fn info(&self) -> Result<Option<ReactionInfo>, ReactionError> {
        let product = match self.product()? {
            Some(p) => p.clone(),
            None => return Ok(None),
        };
        let reactants = match self.prepared()? {
            Some(r) => r.0.clone(),
            None => return Ok(None),
        };
        let binary = ReactionTemplate {
            reactants,
            product,
        }
        .to_bytes()?;
        Ok(Some(ReactionInfo {
            binary,
            rxn_atom_idx: self.reacting_atom.index(),
            kind: self.kind(),
        }))
    }
}
