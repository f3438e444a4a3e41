pub mod error;
mod parser;
mod writer;

use crate::mol::Molecule;
pub use error::SmilesError;
pub use writer::to_smiles;

pub(crate) use parser::parse;

pub fn from_smiles(s: &str) -> Result<Molecule, SmilesError> {
    Ok(parser::parse(s)?.mol)
}
