use std::collections::HashMap;

use petgraph::graph::NodeIndex;

use super::error::SmilesError;
use crate::atom::{Atom, Chirality};
use crate::bond::{Bond, BondOrder};
use crate::element;
use crate::mol::Molecule;

/// Parse result: the molecule plus, per atom, whether its hydrogen count
/// was spelled out in brackets. The substructure matcher uses the flags to
/// decide which pattern atoms constrain hydrogen counts.
pub(crate) struct Parsed {
    pub mol: Molecule,
    pub explicit_h: Vec<bool>,
}

pub(crate) fn parse(input: &str) -> Result<Parsed, SmilesError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let mut parser = Parser::new(trimmed);
    parser.run()?;
    parser.fill_implicit_hydrogens();
    Ok(Parsed {
        mol: parser.mol,
        explicit_h: parser.explicit_h,
    })
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    mol: Molecule,
    explicit_h: Vec<bool>,
    prev: Option<NodeIndex>,
    pending_bond: Option<BondOrder>,
    branch_stack: Vec<Option<NodeIndex>>,
    open_rings: HashMap<u8, (NodeIndex, Option<BondOrder>)>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
            mol: Molecule::new(),
            explicit_h: Vec::new(),
            prev: None,
            pending_bond: None,
            branch_stack: Vec::new(),
            open_rings: HashMap::new(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn run(&mut self) -> Result<(), SmilesError> {
        while let Some(b) = self.peek() {
            match b {
                b'(' => {
                    self.pos += 1;
                    self.branch_stack.push(self.prev);
                }
                b')' => {
                    self.pos += 1;
                    self.prev = self
                        .branch_stack
                        .pop()
                        .ok_or(SmilesError::UnmatchedCloseBranch(self.pos - 1))?;
                }
                b'.' => {
                    self.pos += 1;
                    if self.pending_bond.is_some() {
                        return Err(SmilesError::DanglingBond);
                    }
                    self.prev = None;
                }
                b'-' => {
                    self.pos += 1;
                    self.pending_bond = Some(BondOrder::Single);
                }
                b'=' => {
                    self.pos += 1;
                    self.pending_bond = Some(BondOrder::Double);
                }
                b'#' => {
                    self.pos += 1;
                    self.pending_bond = Some(BondOrder::Triple);
                }
                b':' => {
                    self.pos += 1;
                    self.pending_bond = Some(BondOrder::Aromatic);
                }
                // Up/down bond stereo marks are accepted and flattened to
                // single bonds; only tetrahedral chirality is modeled.
                b'/' | b'\\' => {
                    self.pos += 1;
                    self.pending_bond = Some(BondOrder::Single);
                }
                b'0'..=b'9' => {
                    self.pos += 1;
                    self.close_or_open_ring(b - b'0')?;
                }
                b'%' => {
                    self.pos += 1;
                    let digit = self.two_digit_ring_number()?;
                    self.close_or_open_ring(digit)?;
                }
                b'[' => {
                    self.pos += 1;
                    let (atom, explicit_h) = self.bracket_atom()?;
                    self.place_atom(atom, explicit_h)?;
                }
                _ => {
                    let atom = self.bare_atom()?;
                    self.place_atom(atom, false)?;
                }
            }
        }

        if self.pending_bond.is_some() {
            return Err(SmilesError::DanglingBond);
        }
        if !self.branch_stack.is_empty() {
            return Err(SmilesError::UnclosedBranch);
        }
        if let Some((&digit, _)) = self.open_rings.iter().next() {
            return Err(SmilesError::UnclosedRing(digit));
        }
        Ok(())
    }

    fn two_digit_ring_number(&mut self) -> Result<u8, SmilesError> {
        let mut value = 0u8;
        for _ in 0..2 {
            match self.bump() {
                Some(b @ b'0'..=b'9') => value = value * 10 + (b - b'0'),
                other => {
                    return Err(SmilesError::UnexpectedChar {
                        ch: other.map(char::from).unwrap_or('\0'),
                        pos: self.pos,
                    })
                }
            }
        }
        Ok(value)
    }

    fn close_or_open_ring(&mut self, digit: u8) -> Result<(), SmilesError> {
        let here = self.prev.ok_or(SmilesError::DanglingBond)?;
        let order_here = self.pending_bond.take();
        match self.open_rings.remove(&digit) {
            Some((there, order_there)) => {
                if here == there {
                    return Err(SmilesError::SelfRingBond(digit));
                }
                let order = match (order_here, order_there) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(SmilesError::RingBondMismatch(digit))
                    }
                    (Some(a), _) | (_, Some(a)) => a,
                    (None, None) => self.default_bond_order(here, there),
                };
                self.mol.add_bond(here, there, Bond::new(order));
            }
            None => {
                self.open_rings.insert(digit, (here, order_here));
            }
        }
        Ok(())
    }

    fn default_bond_order(&self, a: NodeIndex, b: NodeIndex) -> BondOrder {
        if self.mol.atom(a).is_aromatic && self.mol.atom(b).is_aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn place_atom(&mut self, atom: Atom, explicit_h: bool) -> Result<(), SmilesError> {
        let idx = self.mol.add_atom(atom);
        self.explicit_h.push(explicit_h);
        if let Some(prev) = self.prev {
            let order = self
                .pending_bond
                .take()
                .unwrap_or_else(|| self.default_bond_order(prev, idx));
            self.mol.add_bond(prev, idx, Bond::new(order));
        } else if self.pending_bond.is_some() {
            return Err(SmilesError::DanglingBond);
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn bare_atom(&mut self) -> Result<Atom, SmilesError> {
        let start = self.pos;
        let b = self.bump().ok_or(SmilesError::EmptyInput)?;
        match b {
            b'*' => Ok(Atom::new(element::WILDCARD)),
            b'b' | b'c' | b'n' | b'o' | b'p' | b's' => {
                let symbol = (b as char).to_ascii_uppercase().to_string();
                let atomic_num = element::atomic_num_from_symbol(&symbol)
                    .ok_or_else(|| SmilesError::UnknownElement(symbol))?;
                let mut atom = Atom::new(atomic_num);
                atom.is_aromatic = true;
                Ok(atom)
            }
            b'A'..=b'Z' => {
                // Two-letter symbols (Cl, Br) take precedence over their
                // one-letter prefixes.
                if let Some(next @ b'a'..=b'z') = self.peek() {
                    let two: String = [b as char, next as char].iter().collect();
                    if let Some(atomic_num) = element::atomic_num_from_symbol(&two) {
                        self.pos += 1;
                        return Ok(Atom::new(atomic_num));
                    }
                }
                let one = (b as char).to_string();
                let atomic_num = element::atomic_num_from_symbol(&one)
                    .ok_or(SmilesError::UnknownElement(one))?;
                Ok(Atom::new(atomic_num))
            }
            _ => Err(SmilesError::UnexpectedChar {
                ch: b as char,
                pos: start,
            }),
        }
    }

    fn bracket_atom(&mut self) -> Result<(Atom, bool), SmilesError> {
        let mut atom = Atom::default();

        // isotope
        let mut isotope = 0u16;
        let mut saw_isotope = false;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            saw_isotope = true;
            isotope = isotope
                .checked_mul(10)
                .and_then(|v| v.checked_add(u16::from(b - b'0')))
                .ok_or(SmilesError::ValueOutOfRange {
                    what: "isotope",
                    pos: self.pos,
                })?;
            self.pos += 1;
        }
        if saw_isotope {
            atom.isotope = isotope;
        }

        // element symbol
        match self.bump().ok_or(SmilesError::UnclosedBracket)? {
            b'*' => atom.atomic_num = element::WILDCARD,
            b @ b'a'..=b'z' => {
                let symbol = (b as char).to_ascii_uppercase().to_string();
                let atomic_num = element::atomic_num_from_symbol(&symbol)
                    .ok_or_else(|| SmilesError::UnknownElement(symbol))?;
                if !element::aromatic_symbol_allowed(atomic_num) {
                    return Err(SmilesError::UnknownElement((b as char).to_string()));
                }
                atom.atomic_num = atomic_num;
                atom.is_aromatic = true;
            }
            b @ b'A'..=b'Z' => {
                let mut symbol = (b as char).to_string();
                if let Some(next @ b'a'..=b'z') = self.peek() {
                    let two: String = [b as char, next as char].iter().collect();
                    if element::atomic_num_from_symbol(&two).is_some() {
                        symbol = two;
                        self.pos += 1;
                    }
                }
                atom.atomic_num = element::atomic_num_from_symbol(&symbol)
                    .ok_or(SmilesError::UnknownElement(symbol))?;
            }
            other => {
                return Err(SmilesError::UnexpectedChar {
                    ch: other as char,
                    pos: self.pos - 1,
                })
            }
        }

        // chirality
        if self.peek() == Some(b'@') {
            self.pos += 1;
            if self.peek() == Some(b'@') {
                self.pos += 1;
                atom.chirality = Chirality::Cw;
            } else {
                atom.chirality = Chirality::Ccw;
            }
        }

        // hydrogen count
        if self.peek() == Some(b'H') && atom.atomic_num != element::HYDROGEN {
            self.pos += 1;
            let mut count = 0u8;
            let mut saw_digit = false;
            while let Some(b @ b'0'..=b'9') = self.peek() {
                saw_digit = true;
                count = count
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(b - b'0'))
                    .ok_or(SmilesError::ValueOutOfRange {
                        what: "hydrogen count",
                        pos: self.pos,
                    })?;
                self.pos += 1;
            }
            atom.hydrogen_count = if saw_digit { count } else { 1 };
        }

        // formal charge
        match self.peek() {
            Some(sign @ (b'+' | b'-')) => {
                self.pos += 1;
                let unit: i8 = if sign == b'+' { 1 } else { -1 };
                let mut magnitude = 1i8;
                if let Some(b @ b'0'..=b'9') = self.peek() {
                    magnitude = (b - b'0') as i8;
                    self.pos += 1;
                } else {
                    while self.peek() == Some(sign) {
                        magnitude =
                            magnitude
                                .checked_add(1)
                                .ok_or(SmilesError::ValueOutOfRange {
                                    what: "formal charge",
                                    pos: self.pos,
                                })?;
                        self.pos += 1;
                    }
                }
                atom.formal_charge = unit * magnitude;
            }
            _ => {}
        }

        // merge-point label
        if self.peek() == Some(b':') {
            self.pos += 1;
            let mut map_num = 0u16;
            let mut saw_digit = false;
            while let Some(b @ b'0'..=b'9') = self.peek() {
                saw_digit = true;
                map_num = map_num
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u16::from(b - b'0')))
                    .ok_or(SmilesError::ValueOutOfRange {
                        what: "atom map",
                        pos: self.pos,
                    })?;
                self.pos += 1;
            }
            if !saw_digit {
                return Err(SmilesError::UnexpectedChar {
                    ch: self.peek().map(char::from).unwrap_or('\0'),
                    pos: self.pos,
                });
            }
            atom.map_num = map_num;
        }

        match self.bump() {
            Some(b']') => Ok((atom, true)),
            Some(other) => Err(SmilesError::UnexpectedChar {
                ch: other as char,
                pos: self.pos - 1,
            }),
            None => Err(SmilesError::UnclosedBracket),
        }
    }

    fn fill_implicit_hydrogens(&mut self) {
        let indices: Vec<NodeIndex> = self.mol.atoms().collect();
        for idx in indices {
            if self.explicit_h[idx.index()] {
                continue;
            }
            let atomic_num = self.mol.atom(idx).atomic_num;
            if !element::in_organic_subset(atomic_num) {
                continue;
            }
            let used = self.mol.bond_valence_doubled(idx);
            self.mol.atom_mut(idx).hydrogen_count =
                element::implicit_hydrogen_count(atomic_num, used);
        }
    }
}
