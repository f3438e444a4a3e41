use std::collections::{HashMap, HashSet};

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::{Atom, Chirality};
use crate::bond::BondOrder;
use crate::canonical;
use crate::element;
use crate::mol::Molecule;

/// Renders a molecule as canonical SMILES.
///
/// Atom order follows the Morgan canonical ranks, so two graphs that encode
/// the same structure emit the same string regardless of construction order.
/// Disconnected components are rendered independently and joined with `.` in
/// sorted order.
pub fn to_smiles(mol: &Molecule) -> String {
    let ranks = canonical::canonical_ranks(mol);
    let mut visited = vec![false; mol.atom_count()];
    let mut pieces = Vec::new();

    let mut roots: Vec<NodeIndex> = mol.atoms().collect();
    roots.sort_by_key(|&idx| (ranks[idx.index()], idx.index()));

    for root in roots {
        if visited[root.index()] {
            continue;
        }
        let mut writer = ComponentWriter::new(mol, &ranks);
        writer.mark_ring_bonds(root);
        writer.emit(root, None);
        for idx in &writer.component {
            visited[idx.index()] = true;
        }
        pieces.push(writer.out);
    }

    pieces.sort();
    pieces.join(".")
}

struct ComponentWriter<'a> {
    mol: &'a Molecule,
    ranks: &'a [usize],
    out: String,
    component: Vec<NodeIndex>,
    seen: HashSet<NodeIndex>,
    ring_bonds: HashSet<EdgeIndex>,
    ring_digits: HashMap<EdgeIndex, u8>,
    free_digits: Vec<u8>,
}

impl<'a> ComponentWriter<'a> {
    fn new(mol: &'a Molecule, ranks: &'a [usize]) -> Self {
        Self {
            mol,
            ranks,
            out: String::new(),
            component: Vec::new(),
            seen: HashSet::new(),
            ring_bonds: HashSet::new(),
            ring_digits: HashMap::new(),
            free_digits: (1..=99).rev().collect(),
        }
    }

    fn ordered_neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.mol.neighbors(idx).collect();
        neighbors.sort_by_key(|&n| (self.ranks[n.index()], n.index()));
        neighbors
    }

    /// Walks the spanning tree once so that every edge closing a cycle is
    /// known before emission starts. Uses the same neighbor ordering as
    /// emission, so the two passes agree on which edges are tree edges.
    fn mark_ring_bonds(&mut self, root: NodeIndex) {
        let mut visited = HashSet::new();
        self.ring_walk(root, None, &mut visited);
    }

    fn ring_walk(
        &mut self,
        idx: NodeIndex,
        parent_edge: Option<EdgeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        visited.insert(idx);
        for n in self.ordered_neighbors(idx) {
            let edge = match self.mol.bond_between(idx, n) {
                Some(e) => e,
                None => continue,
            };
            if Some(edge) == parent_edge {
                continue;
            }
            if visited.contains(&n) {
                self.ring_bonds.insert(edge);
            } else {
                self.ring_walk(n, Some(edge), visited);
            }
        }
    }

    fn emit(&mut self, idx: NodeIndex, parent: Option<NodeIndex>) {
        self.seen.insert(idx);
        self.component.push(idx);

        if let Some(p) = parent {
            if let Some(edge) = self.mol.bond_between(p, idx) {
                self.push_bond_symbol(p, idx, edge);
            }
        }
        let token = atom_token(self.mol, idx);
        self.out.push_str(&token);
        self.push_ring_closures(idx);

        let children: Vec<NodeIndex> = self
            .ordered_neighbors(idx)
            .into_iter()
            .filter(|&n| {
                if Some(n) == parent || self.seen.contains(&n) {
                    return false;
                }
                match self.mol.bond_between(idx, n) {
                    Some(edge) => !self.ring_bonds.contains(&edge),
                    None => false,
                }
            })
            .collect();

        for (i, child) in children.iter().enumerate() {
            if i + 1 < children.len() {
                self.out.push('(');
                self.emit(*child, Some(idx));
                self.out.push(')');
            } else {
                self.emit(*child, Some(idx));
            }
        }
    }

    fn push_ring_closures(&mut self, idx: NodeIndex) {
        let mut closures: Vec<(EdgeIndex, NodeIndex)> = Vec::new();
        for n in self.ordered_neighbors(idx) {
            if let Some(edge) = self.mol.bond_between(idx, n) {
                if self.ring_bonds.contains(&edge) {
                    closures.push((edge, n));
                }
            }
        }
        for (edge, other) in closures {
            let digit = match self.ring_digits.get(&edge) {
                Some(&d) => {
                    // Closing occurrence; the digit goes back in the pool.
                    self.free_digits.push(d);
                    d
                }
                None => {
                    let d = self.free_digits.pop().unwrap_or(99);
                    self.ring_digits.insert(edge, d);
                    // The bond symbol, when needed, is written on the
                    // opening occurrence only.
                    self.push_bond_symbol(idx, other, edge);
                    d
                }
            };
            if digit < 10 {
                self.out.push((b'0' + digit) as char);
            } else {
                self.out.push('%');
                self.out.push((b'0' + digit / 10) as char);
                self.out.push((b'0' + digit % 10) as char);
            }
        }
    }

    fn push_bond_symbol(&mut self, a: NodeIndex, b: NodeIndex, edge: EdgeIndex) {
        let both_aromatic = self.mol.atom(a).is_aromatic && self.mol.atom(b).is_aromatic;
        match self.mol.bond(edge).order {
            BondOrder::Single => {
                if both_aromatic {
                    self.out.push('-');
                }
            }
            BondOrder::Double => self.out.push('='),
            BondOrder::Triple => self.out.push('#'),
            BondOrder::Aromatic => {
                if !both_aromatic {
                    self.out.push(':');
                }
            }
        }
    }
}

fn needs_brackets(mol: &Molecule, idx: NodeIndex) -> bool {
    let atom = mol.atom(idx);
    if atom.formal_charge != 0
        || atom.isotope != 0
        || atom.map_num != 0
        || atom.chirality != Chirality::None
    {
        return true;
    }
    if atom.is_wildcard() {
        return atom.hydrogen_count != 0;
    }
    if !element::in_organic_subset(atom.atomic_num) {
        return true;
    }
    if atom.is_aromatic && !element::aromatic_symbol_allowed(atom.atomic_num) {
        return true;
    }
    // A bare organic-subset atom re-parses with the implicit count; brackets
    // are needed only when the stored count differs from it.
    atom.hydrogen_count != element::implicit_hydrogen_count(atom.atomic_num, mol.bond_valence_doubled(idx))
}

fn symbol_for(atom: &Atom) -> String {
    if atom.is_wildcard() {
        return "*".to_string();
    }
    let symbol = element::symbol(atom.atomic_num);
    if atom.is_aromatic {
        symbol.to_ascii_lowercase()
    } else {
        symbol.to_string()
    }
}

fn atom_token(mol: &Molecule, idx: NodeIndex) -> String {
    let atom = mol.atom(idx);
    if !needs_brackets(mol, idx) {
        return symbol_for(atom);
    }

    let mut token = String::from("[");
    if atom.isotope != 0 {
        token.push_str(&atom.isotope.to_string());
    }
    token.push_str(&symbol_for(atom));
    match atom.chirality {
        Chirality::None => {}
        Chirality::Ccw => token.push('@'),
        Chirality::Cw => token.push_str("@@"),
    }
    match atom.hydrogen_count {
        0 => {}
        1 => token.push('H'),
        n => {
            token.push('H');
            token.push_str(&n.to_string());
        }
    }
    match atom.formal_charge {
        0 => {}
        1 => token.push('+'),
        -1 => token.push('-'),
        n if n > 0 => {
            token.push('+');
            token.push_str(&n.to_string());
        }
        n => {
            token.push('-');
            token.push_str(&(-n).to_string());
        }
    }
    if atom.map_num != 0 {
        token.push(':');
        token.push_str(&atom.map_num.to_string());
    }
    token.push(']');
    token
}
