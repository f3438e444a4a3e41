use petgraph::graph::NodeIndex;

use crate::mol::Molecule;
use crate::smiles::{self, SmilesError};

/// Pairs of (pattern atom, target atom), sorted by pattern atom index.
pub type AtomMapping = Vec<(NodeIndex, NodeIndex)>;

/// A compiled substructure query.
///
/// Patterns are written in SMILES. A wildcard atom (`*`) matches any target
/// atom; every other pattern atom requires an equal atomic number and, when
/// the pattern atom is aromatic, an aromatic target atom. Hydrogen counts
/// constrain the target only for pattern atoms written in brackets, so
/// `[CH3]` matches exactly a methyl carbon while `C` matches any carbon.
#[derive(Debug, Clone)]
pub struct Pattern {
    mol: Molecule,
    explicit_h: Vec<bool>,
}

impl Pattern {
    pub fn compile(smiles: &str) -> Result<Self, SmilesError> {
        let parsed = smiles::parse(smiles)?;
        Ok(Self {
            mol: parsed.mol,
            explicit_h: parsed.explicit_h,
        })
    }

    pub fn atom_count(&self) -> usize {
        self.mol.atom_count()
    }

    pub fn matches(&self, target: &Molecule) -> bool {
        self.first_match(target).is_some()
    }

    pub fn first_match(&self, target: &Molecule) -> Option<AtomMapping> {
        Vf2::new(target, self).find_first()
    }

    pub fn all_matches(&self, target: &Molecule) -> Vec<AtomMapping> {
        Vf2::new(target, self).find_all()
    }

    fn atom_match(&self, target: &Molecule, t: NodeIndex, q: NodeIndex) -> bool {
        let query_atom = self.mol.atom(q);
        if query_atom.is_wildcard() {
            return true;
        }
        let target_atom = target.atom(t);
        if target_atom.atomic_num != query_atom.atomic_num {
            return false;
        }
        if query_atom.is_aromatic && !target_atom.is_aromatic {
            return false;
        }
        if self.explicit_h[q.index()]
            && target.total_hydrogens(t) != self.mol.total_hydrogens(q)
        {
            return false;
        }
        true
    }
}

struct Vf2<'a> {
    target: &'a Molecule,
    pattern: &'a Pattern,
    query_order: Vec<NodeIndex>,
    query_map: Vec<Option<NodeIndex>>,
    target_used: Vec<bool>,
}

impl<'a> Vf2<'a> {
    fn new(target: &'a Molecule, pattern: &'a Pattern) -> Self {
        // Highest-degree pattern atoms first prunes the search tree fastest.
        let mut query_order: Vec<NodeIndex> = pattern.mol.atoms().collect();
        query_order.sort_by(|&a, &b| pattern.mol.degree(b).cmp(&pattern.mol.degree(a)));
        Self {
            target,
            pattern,
            query_order,
            query_map: vec![None; pattern.mol.atom_count()],
            target_used: vec![false; target.atom_count()],
        }
    }

    fn find_first(&mut self) -> Option<AtomMapping> {
        let mut results = Vec::new();
        self.recurse(0, &mut results, true);
        results.into_iter().next()
    }

    fn find_all(&mut self) -> Vec<AtomMapping> {
        let mut results = Vec::new();
        self.recurse(0, &mut results, false);
        results
    }

    fn recurse(&mut self, depth: usize, results: &mut Vec<AtomMapping>, first_only: bool) {
        if depth == self.query_order.len() {
            let mut mapping: AtomMapping = self
                .query_order
                .iter()
                .filter_map(|&qn| self.query_map[qn.index()].map(|tn| (qn, tn)))
                .collect();
            mapping.sort_by_key(|&(qn, _)| qn.index());
            results.push(mapping);
            return;
        }

        if first_only && !results.is_empty() {
            return;
        }

        let query_node = self.query_order[depth];

        for t_idx in 0..self.target_used.len() {
            if self.target_used[t_idx] {
                continue;
            }

            let target_node = NodeIndex::new(t_idx);

            if !self.is_feasible(query_node, target_node) {
                continue;
            }

            self.query_map[query_node.index()] = Some(target_node);
            self.target_used[t_idx] = true;

            self.recurse(depth + 1, results, first_only);

            if first_only && !results.is_empty() {
                return;
            }

            self.query_map[query_node.index()] = None;
            self.target_used[t_idx] = false;
        }
    }

    fn is_feasible(&self, query_node: NodeIndex, target_node: NodeIndex) -> bool {
        if !self.pattern.atom_match(self.target, target_node, query_node) {
            return false;
        }

        for q_neighbor in self.pattern.mol.neighbors(query_node) {
            if let Some(t_mapped) = self.query_map[q_neighbor.index()] {
                let q_bond = match self.pattern.mol.bond_between(query_node, q_neighbor) {
                    Some(e) => e,
                    None => return false,
                };
                match self.target.bond_between(target_node, t_mapped) {
                    Some(t_bond) => {
                        let both_query_aromatic = self.pattern.mol.atom(query_node).is_aromatic
                            && self.pattern.mol.atom(q_neighbor).is_aromatic;
                        let both_target_aromatic = self.target.atom(target_node).is_aromatic
                            && self.target.atom(t_mapped).is_aromatic;
                        if both_query_aromatic && both_target_aromatic {
                            continue;
                        }
                        if self.target.bond(t_bond).order != self.pattern.mol.bond(q_bond).order {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }

        true
    }
}
