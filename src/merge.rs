use petgraph::graph::NodeIndex;
use thiserror::Error;

use crate::atom::Chirality;
use crate::bond::{Bond, BondOrder};
use crate::element;
use crate::mol::Molecule;
use crate::smiles;

#[derive(Debug, Error)]
pub enum MergeError {
    /// A merge takes one fragment (intramolecular) or two (intermolecular).
    #[error("merge takes one or two fragments, got {0}")]
    Arity(usize),
    /// After discounting ignored labels, exactly two labeled atoms must
    /// remain to serve as the bond endpoints.
    #[error("merge requires exactly two labeled atoms, found {0}")]
    LabelCount(usize),
    /// The merged graph is not a chemically plausible molecule.
    #[error("merge produced an invalid structure: {0}")]
    InvalidStructure(String),
}

/// Knobs for a single merge call.
///
/// `ignored` lists merge-point labels that are present in the fragments but
/// must not participate in this bond formation; each reaction step ignores
/// the labels reserved for its later steps. `stereo` optionally stamps a
/// tetrahedral tag on one endpoint of the new bond. `clear_labels` controls
/// whether the two endpoint labels are erased once the bond exists.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub ignored: Vec<u16>,
    pub stereo: Option<Chirality>,
    pub clear_labels: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeOptions {
    pub fn new() -> Self {
        Self {
            ignored: Vec::new(),
            stereo: None,
            clear_labels: true,
        }
    }

    pub fn ignoring(mut self, labels: &[u16]) -> Self {
        self.ignored = labels.to_vec();
        self
    }

    pub fn with_stereo(mut self, stereo: Chirality) -> Self {
        self.stereo = Some(stereo);
        self
    }

    pub fn keep_labels(mut self) -> Self {
        self.clear_labels = false;
        self
    }
}

/// Fuses fragments by a single new bond between their two labeled atoms.
///
/// With two fragments the graphs are unioned first; with one fragment the
/// bond closes a ring inside it. The two remaining unignored labeled atoms
/// become the bond endpoints. Each endpoint's hydrogen count is rebalanced
/// for the new bond (N, O and S lose all hydrogens, anything else loses
/// one), explicit hydrogen atoms are folded back into their neighbors, and
/// the result is round-tripped through its canonical form so downstream
/// consumers always see canonically ordered graphs.
pub fn merge(fragments: &[Molecule], opts: &MergeOptions) -> Result<Molecule, MergeError> {
    let mut combined = match fragments {
        [single] => single.clone(),
        [first, second] => {
            let mut m = first.clone();
            m.absorb(second);
            m
        }
        _ => return Err(MergeError::Arity(fragments.len())),
    };

    let endpoints = combined.labeled_atoms(&opts.ignored);
    let [a, b] = endpoints[..] else {
        return Err(MergeError::LabelCount(endpoints.len()));
    };

    for idx in [a, b] {
        let atom = combined.atom_mut(idx);
        if opts.clear_labels {
            atom.map_num = 0;
        }
        if atom.is_merge_heteroatom() {
            atom.hydrogen_count = 0;
        } else {
            atom.hydrogen_count = atom.hydrogen_count.saturating_sub(1);
        }
    }

    combined.add_bond(a, b, Bond::single());

    if let Some(tag) = opts.stereo {
        if let Some(idx) = [a, b].into_iter().find(|&i| stereo_candidate(&combined, i)) {
            combined.atom_mut(idx).chirality = tag;
        }
    }

    combined.strip_explicit_hydrogens();
    validate(&combined)?;
    canonicalize(&combined)
}

/// An endpoint can carry a tetrahedral tag when it is saturated and its
/// hydrogen count leaves the four substituents distinguishable.
fn stereo_candidate(mol: &Molecule, idx: NodeIndex) -> bool {
    let atom = mol.atom(idx);
    if atom.is_aromatic || atom.is_wildcard() {
        return false;
    }
    let all_single = mol
        .neighbors(idx)
        .filter_map(|n| mol.bond_between(idx, n))
        .all(|e| mol.bond(e).order == BondOrder::Single);
    all_single && mol.total_hydrogens(idx) != 2
}

/// Rejects atoms bonded beyond their maximum valence. Aromatic bonds are
/// counted as one each, so the check never rejects a valid aromatic system;
/// the merge endpoints it guards are not aromatic anyway.
fn validate(mol: &Molecule) -> Result<(), MergeError> {
    for idx in mol.atoms() {
        let atom = mol.atom(idx);
        if atom.is_wildcard() {
            continue;
        }
        let bonded: u16 = mol
            .neighbors(idx)
            .filter_map(|n| mol.bond_between(idx, n))
            .map(|e| match mol.bond(e).order {
                BondOrder::Single | BondOrder::Aromatic => 1,
                BondOrder::Double => 2,
                BondOrder::Triple => 3,
            })
            .sum();
        let total = bonded + u16::from(atom.hydrogen_count);
        let limit = u16::from(element::max_valence(atom.atomic_num, atom.formal_charge));
        if total > limit {
            return Err(MergeError::InvalidStructure(format!(
                "atom {} ({}) has valence {} exceeding {}",
                idx.index(),
                element::symbol(atom.atomic_num),
                total,
                limit,
            )));
        }
    }
    Ok(())
}

fn canonicalize(mol: &Molecule) -> Result<Molecule, MergeError> {
    let canonical = smiles::to_smiles(mol);
    smiles::from_smiles(&canonical)
        .map_err(|e| MergeError::InvalidStructure(format!("canonical reparse failed: {e}")))
}
