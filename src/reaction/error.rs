use thiserror::Error;

use crate::merge::MergeError;
use crate::mol::CodecError;
use crate::smiles::SmilesError;

/// Failure while validating or assembling a reaction.
///
/// Structural unsuitability of a side chain is not an error; validation
/// reports it as an ordinary `None`. Errors are reserved for malformed
/// inputs and assembly steps that should never fail on a validated
/// reaction.
#[derive(Debug, Error)]
pub enum ReactionError {
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("reaction input is not valid SMILES: {0}")]
    Smiles(#[from] SmilesError),
    /// A templated reaction was constructed without a template.
    #[error("reaction type {0} requires a template")]
    MissingTemplate(&'static str),
    /// An atom the assembly protocol depends on is absent from a fragment
    /// that already passed validation.
    #[error("expected atom not found during assembly: {0}")]
    MissingAtom(&'static str),
}
