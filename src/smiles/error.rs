use thiserror::Error;

/// Error produced when parsing a SMILES string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmilesError {
    #[error("empty SMILES input")]
    EmptyInput,
    #[error("unexpected character {ch:?} at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("unknown element symbol {0:?}")]
    UnknownElement(String),
    #[error("unclosed bracket atom")]
    UnclosedBracket,
    #[error("ring bond {0} opened but never closed")]
    UnclosedRing(u8),
    #[error("ring bond {0} closes onto its own opening atom")]
    SelfRingBond(u8),
    #[error("conflicting bond orders on ring bond {0}")]
    RingBondMismatch(u8),
    #[error("unclosed branch")]
    UnclosedBranch,
    #[error("unmatched closing parenthesis at position {0}")]
    UnmatchedCloseBranch(usize),
    #[error("bond symbol with no atom to bind")]
    DanglingBond,
    #[error("{what} value out of range at position {pos}")]
    ValueOutOfRange { what: &'static str, pos: usize },
}
