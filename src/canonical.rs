use std::hash::{Hash, Hasher};

use petgraph::graph::NodeIndex;

use crate::bond::BondOrder;
use crate::mol::Molecule;

struct Fnv1aHasher(u64);

impl Fnv1aHasher {
    fn new() -> Self {
        Self(0xcbf29ce484222325)
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(0x100000001b3);
        }
    }
}

/// Initial per-atom invariant for canonical ranking.
///
/// Merge-point labels are part of the invariant: a tagged trial atom must
/// rank deterministically even when it sits on an otherwise symmetric
/// position, and two symmetric tagged graphs must still canonicalize to
/// the same string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct AtomInvariant {
    atomic_num: u8,
    degree: u8,
    hydrogen_count: u8,
    formal_charge: i8,
    is_aromatic: bool,
    isotope: u16,
    map_num: u16,
    singles: u8,
    doubles: u8,
    triples: u8,
    aromatic_bonds: u8,
}

fn atom_invariant(mol: &Molecule, idx: NodeIndex) -> AtomInvariant {
    let atom = mol.atom(idx);
    let mut singles: u8 = 0;
    let mut doubles: u8 = 0;
    let mut triples: u8 = 0;
    let mut aromatic_bonds: u8 = 0;
    for neighbor in mol.neighbors(idx) {
        let edge = mol
            .bond_between(idx, neighbor)
            .expect("neighbor implies an edge");
        match mol.bond(edge).order {
            BondOrder::Single => singles += 1,
            BondOrder::Double => doubles += 1,
            BondOrder::Triple => triples += 1,
            BondOrder::Aromatic => aromatic_bonds += 1,
        }
    }
    AtomInvariant {
        atomic_num: atom.atomic_num,
        degree: mol.degree(idx) as u8,
        hydrogen_count: atom.hydrogen_count,
        formal_charge: atom.formal_charge,
        is_aromatic: atom.is_aromatic,
        isotope: atom.isotope,
        map_num: atom.map_num,
        singles,
        doubles,
        triples,
        aromatic_bonds,
    }
}

fn hash_invariant(inv: &AtomInvariant) -> u64 {
    let mut h = Fnv1aHasher::new();
    inv.hash(&mut h);
    h.finish()
}

fn ranks_from_values(values: &[u64]) -> Vec<usize> {
    let n = values.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by_key(|&i| values[i]);
    let mut ranks = vec![0usize; n];
    if n == 0 {
        return ranks;
    }
    ranks[indices[0]] = 0;
    for i in 1..n {
        ranks[indices[i]] = if values[indices[i]] == values[indices[i - 1]] {
            ranks[indices[i - 1]]
        } else {
            i
        };
    }
    ranks
}

fn count_distinct(ranks: &[usize]) -> usize {
    let mut sorted: Vec<usize> = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// Morgan-style iterative refinement: ranks are re-hashed together with
/// sorted neighbor ranks until the partition stops getting finer. Symmetric
/// atoms keep equal ranks, which is what makes chemically identical trial
/// products collapse to identical canonical strings.
pub fn canonical_ranks(mol: &Molecule) -> Vec<usize> {
    let n = mol.atom_count();
    if n == 0 {
        return Vec::new();
    }

    let values: Vec<u64> = mol
        .atoms()
        .map(|idx| hash_invariant(&atom_invariant(mol, idx)))
        .collect();
    let mut ranks = ranks_from_values(&values);
    let mut distinct = count_distinct(&ranks);

    loop {
        let values: Vec<u64> = mol
            .atoms()
            .map(|idx| {
                let mut neighbor_ranks: Vec<usize> =
                    mol.neighbors(idx).map(|nb| ranks[nb.index()]).collect();
                neighbor_ranks.sort_unstable();
                let mut h = Fnv1aHasher::new();
                ranks[idx.index()].hash(&mut h);
                neighbor_ranks.hash(&mut h);
                h.finish()
            })
            .collect();
        let refined = ranks_from_values(&values);
        let refined_distinct = count_distinct(&refined);
        if refined_distinct <= distinct {
            return ranks;
        }
        ranks = refined;
        distinct = refined_distinct;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn mol(smiles: &str) -> Molecule {
        from_smiles(smiles).unwrap_or_else(|e| panic!("bad SMILES {smiles:?}: {e}"))
    }

    #[test]
    fn empty_mol() {
        assert!(canonical_ranks(&Molecule::new()).is_empty());
    }

    #[test]
    fn distinct_elements_get_distinct_ranks() {
        let m = mol("CCO");
        let ranks = canonical_ranks(&m);
        // terminal carbon, inner carbon, oxygen are all distinguishable
        assert_eq!(count_distinct(&ranks), 3);
    }

    #[test]
    fn benzene_is_fully_symmetric() {
        let m = mol("c1ccccc1");
        let ranks = canonical_ranks(&m);
        assert_eq!(count_distinct(&ranks), 1);
    }

    #[test]
    fn toluene_symmetry_classes() {
        let m = mol("Cc1ccccc1");
        let ranks = canonical_ranks(&m);
        // methyl, ipso, 2x ortho, 2x meta, para
        assert_eq!(count_distinct(&ranks), 5);
    }

    #[test]
    fn label_breaks_symmetry() {
        let mut m = mol("c1ccccc1");
        let idx = m.atoms().next().unwrap();
        m.atom_mut(idx).map_num = 5;
        let ranks = canonical_ranks(&m);
        assert!(count_distinct(&ranks) > 1);
    }

    #[test]
    fn refinement_separates_chain_positions() {
        let m = mol("CCCCC");
        let ranks = canonical_ranks(&m);
        // pentane: ends, second shell, middle
        assert_eq!(count_distinct(&ranks), 3);
        assert_eq!(ranks[0], ranks[4]);
        assert_eq!(ranks[1], ranks[3]);
        assert_ne!(ranks[0], ranks[2]);
    }
}
