pub mod atom;
pub mod bond;
pub mod canonical;
pub mod element;
pub mod generate;
pub mod merge;
pub mod mol;
pub mod reaction;
pub mod smiles;
pub mod substruct;

pub use atom::{Atom, Chirality};
pub use bond::{Bond, BondOrder};
pub use generate::{
    GenerateError, InMemoryRepository, NewReactions, ReactionGenerator, ReactionRecord,
    ReactionRepository, SideChain, SideChainRef, Template, ALL_TEMPLATES, DEFAULT_KINDS,
};
pub use merge::{merge, MergeError, MergeOptions};
pub use mol::{CodecError, Molecule};
pub use reaction::{
    map_nums, FriedelCrafts, PictetSpengler, PyrroloIndolene, Reaction, ReactionError,
    ReactionInfo, ReactionKind, ReactionTemplate, Reactants, TsujiTrost, Variant,
};
pub use smiles::{from_smiles, to_smiles, SmilesError};
pub use substruct::{AtomMapping, Pattern};
