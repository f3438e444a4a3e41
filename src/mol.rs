use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::atom::Atom;
use crate::bond::Bond;

/// Failure to encode or decode the opaque binary form of a molecular
/// graph. The binary format is an internal contract between this engine
/// and the persistence collaborators that store its inputs and outputs.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode molecular graph: {0}")]
    Encode(#[source] bincode::Error),
    #[error("failed to decode molecular graph: {0}")]
    Decode(#[source] bincode::Error),
}

/// A labeled molecular graph: atoms as nodes, bonds as undirected edges.
///
/// Wraps a [`petgraph`] graph and adds the domain operations the reaction
/// engine needs: graph union, merge-point label lookup, explicit-hydrogen
/// stripping, and the binary codec. Node indices are contiguous
/// `0..atom_count()`; removal swaps the last node into the hole, so callers
/// holding indices across a removal must re-resolve them (the engine always
/// re-locates atoms by label after structural edits).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Molecule {
    graph: UnGraph<Atom, Bond>,
}

impl Molecule {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
        }
    }

    pub fn atom(&self, idx: NodeIndex) -> &Atom {
        &self.graph[idx]
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> &mut Atom {
        &mut self.graph[idx]
    }

    pub fn bond(&self, idx: EdgeIndex) -> &Bond {
        &self.graph[idx]
    }

    pub fn bond_mut(&mut self, idx: EdgeIndex) -> &mut Bond {
        &mut self.graph[idx]
    }

    pub fn add_atom(&mut self, atom: Atom) -> NodeIndex {
        self.graph.add_node(atom)
    }

    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: Bond) -> EdgeIndex {
        self.graph.add_edge(a, b, bond)
    }

    /// Removes an atom together with its bonds. The last node index is
    /// swapped into the vacated slot.
    pub fn remove_atom(&mut self, idx: NodeIndex) -> Option<Atom> {
        self.graph.remove_node(idx)
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn bonds(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.neighbors(idx).count()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    pub fn bond_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    /// Doubled sum of bond-order valence contributions at an atom
    /// (aromatic bonds count three halves).
    pub fn bond_valence_doubled(&self, idx: NodeIndex) -> u16 {
        let mut sum = 0u16;
        for neighbor in self.graph.neighbors(idx) {
            if let Some(edge) = self.graph.find_edge(idx, neighbor) {
                sum += u16::from(self.graph[edge].order.valence_contribution_doubled());
            }
        }
        sum
    }

    /// Appends every atom and bond of `other` to this graph, preserving
    /// `other`'s internal connectivity. No bonds are created between the
    /// two parts; that is the merge primitive's job.
    pub fn absorb(&mut self, other: &Molecule) {
        let offset: Vec<NodeIndex> = other
            .atoms()
            .map(|idx| self.add_atom(other.atom(idx).clone()))
            .collect();
        for edge in other.bonds() {
            let (a, b) = other
                .bond_endpoints(edge)
                .expect("edge index came from this graph");
            self.add_bond(offset[a.index()], offset[b.index()], *other.bond(edge));
        }
    }

    /// Atoms carrying a non-zero merge-point label that is not in
    /// `ignored`, in index order.
    pub fn labeled_atoms(&self, ignored: &[u16]) -> Vec<NodeIndex> {
        self.atoms()
            .filter(|&idx| {
                let map_num = self.atom(idx).map_num;
                map_num != 0 && !ignored.contains(&map_num)
            })
            .collect()
    }

    /// First atom carrying exactly the given merge-point label.
    pub fn atom_with_label(&self, map_num: u16) -> Option<NodeIndex> {
        self.atoms().find(|&idx| self.atom(idx).map_num == map_num)
    }

    /// First atom satisfying a predicate.
    pub fn find_atom(&self, pred: impl Fn(&Atom) -> bool) -> Option<NodeIndex> {
        self.atoms().find(|&idx| pred(self.atom(idx)))
    }

    /// Folds explicit hydrogen nodes back into their neighbor's implicit
    /// count and removes them. Bare hydrogens (no neighbor) and hydrogens
    /// carrying an isotope, charge, or label are kept.
    pub fn strip_explicit_hydrogens(&mut self) {
        let mut removable: Vec<NodeIndex> = self
            .atoms()
            .filter(|&idx| {
                let atom = self.atom(idx);
                atom.atomic_num == crate::element::HYDROGEN
                    && atom.isotope == 0
                    && atom.formal_charge == 0
                    && atom.map_num == 0
                    && self.degree(idx) == 1
            })
            .collect();
        // Descending order keeps the remaining indices valid across
        // swap-removals.
        removable.sort_unstable_by(|a, b| b.cmp(a));
        for idx in removable {
            let neighbor = self.neighbors(idx).next();
            if let Some(neighbor) = neighbor {
                self.atom_mut(neighbor).hydrogen_count =
                    self.atom(neighbor).hydrogen_count.saturating_add(1);
            }
            self.remove_atom(idx);
        }
    }

    /// Total hydrogens on an atom: the implicit count plus any explicit
    /// hydrogen neighbors still present as graph nodes.
    pub fn total_hydrogens(&self, idx: NodeIndex) -> u8 {
        let explicit = self
            .neighbors(idx)
            .filter(|&n| self.atom(n).atomic_num == crate::element::HYDROGEN)
            .count() as u8;
        self.atom(idx).hydrogen_count.saturating_add(explicit)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(CodecError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(CodecError::Decode)
    }
}

impl PartialEq for Molecule {
    fn eq(&self, other: &Self) -> bool {
        if self.atom_count() != other.atom_count() || self.bond_count() != other.bond_count() {
            return false;
        }
        for idx in self.atoms() {
            if self.atom(idx) != other.atom(idx) {
                return false;
            }
        }
        for idx in self.bonds() {
            if self.bond(idx) != other.bond(idx)
                || self.bond_endpoints(idx) != other.bond_endpoints(idx)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::BondOrder;
    use crate::element;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn ethanol() -> Molecule {
        let mut mol = Molecule::new();
        let c0 = mol.add_atom(Atom {
            atomic_num: element::CARBON,
            hydrogen_count: 3,
            ..Atom::default()
        });
        let c1 = mol.add_atom(Atom {
            atomic_num: element::CARBON,
            hydrogen_count: 2,
            ..Atom::default()
        });
        let o = mol.add_atom(Atom {
            atomic_num: element::OXYGEN,
            hydrogen_count: 1,
            ..Atom::default()
        });
        mol.add_bond(c0, c1, Bond::single());
        mol.add_bond(c1, o, Bond::single());
        mol
    }

    #[test]
    fn absorb_keeps_both_parts() {
        let mut combo = ethanol();
        let other = ethanol();
        combo.absorb(&other);
        assert_eq!(combo.atom_count(), 6);
        assert_eq!(combo.bond_count(), 4);
        // no cross bonds
        assert!(combo.bond_between(n(2), n(3)).is_none());
        assert!(combo.bond_between(n(3), n(4)).is_some());
    }

    #[test]
    fn labeled_atoms_respect_ignore_list() {
        let mut mol = ethanol();
        mol.atom_mut(n(0)).map_num = 3;
        mol.atom_mut(n(2)).map_num = 5;
        assert_eq!(mol.labeled_atoms(&[]), vec![n(0), n(2)]);
        assert_eq!(mol.labeled_atoms(&[3]), vec![n(2)]);
        assert_eq!(mol.labeled_atoms(&[3, 5]), Vec::<NodeIndex>::new());
    }

    #[test]
    fn atom_with_label_finds_first() {
        let mut mol = ethanol();
        mol.atom_mut(n(1)).map_num = 9;
        assert_eq!(mol.atom_with_label(9), Some(n(1)));
        assert_eq!(mol.atom_with_label(1), None);
    }

    #[test]
    fn strip_explicit_hydrogens_folds_counts() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom {
            atomic_num: element::CARBON,
            hydrogen_count: 2,
            ..Atom::default()
        });
        let h = mol.add_atom(Atom::new(element::HYDROGEN));
        mol.add_bond(c, h, Bond::single());
        mol.strip_explicit_hydrogens();
        assert_eq!(mol.atom_count(), 1);
        assert_eq!(mol.atom(n(0)).hydrogen_count, 3);
    }

    #[test]
    fn strip_folds_hydrogens_on_multiple_neighbors() {
        let mut mol = ethanol();
        let h0 = mol.add_atom(Atom::new(element::HYDROGEN));
        let h1 = mol.add_atom(Atom::new(element::HYDROGEN));
        mol.add_bond(n(0), h0, Bond::single());
        mol.add_bond(n(2), h1, Bond::single());
        mol.strip_explicit_hydrogens();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.atom(n(0)).hydrogen_count, 4);
        assert_eq!(mol.atom(n(2)).hydrogen_count, 2);
    }

    #[test]
    fn strip_keeps_labeled_hydrogens() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom::new(element::CARBON));
        let mut h = Atom::new(element::HYDROGEN);
        h.map_num = 2;
        let h = mol.add_atom(h);
        mol.add_bond(c, h, Bond::single());
        mol.strip_explicit_hydrogens();
        assert_eq!(mol.atom_count(), 2);
    }

    #[test]
    fn bond_valence_counts_orders() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom::new(element::CARBON));
        let o = mol.add_atom(Atom::new(element::OXYGEN));
        let c2 = mol.add_atom(Atom::new(element::CARBON));
        mol.add_bond(c, o, Bond::new(BondOrder::Double));
        mol.add_bond(c, c2, Bond::single());
        assert_eq!(mol.bond_valence_doubled(c), 6);
        assert_eq!(mol.bond_valence_doubled(o), 4);
    }

    #[test]
    fn binary_round_trip() {
        let mut mol = ethanol();
        mol.atom_mut(n(2)).map_num = 4;
        let bytes = mol.to_bytes().unwrap();
        let decoded = Molecule::from_bytes(&bytes).unwrap();
        assert_eq!(mol, decoded);
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(Molecule::from_bytes(&[0xde, 0xad, 0xbe, 0xef]).is_err());
    }
}
