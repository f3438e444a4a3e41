use serde::{Deserialize, Serialize};

use crate::element;

/// Tetrahedral chirality tag assigned during fragment merges.
///
/// The tag is a marker carried on the atom and written as `@`/`@@` in the
/// canonical form; neighbor-order semantics are owned by the downstream
/// stages that apply the finished reaction templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Chirality {
    #[default]
    None,
    /// Clockwise (`@@`).
    Cw,
    /// Counterclockwise (`@`).
    Ccw,
}

/// Node weight of a labeled molecular graph.
///
/// Beyond the intrinsic atomic properties, an atom may carry a transient
/// *merge-point label* (`map_num`). Labels exist only to designate bond
/// sites during merge operations and to atom-map the emitted reaction
/// SMARTS; they are not persistent identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// Atomic number; 0 is the wildcard attachment placeholder.
    pub atomic_num: u8,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Mass number. `0` means natural isotopic abundance.
    pub isotope: u16,
    /// Implicit (suppressed) hydrogen count. After parsing or a merge this
    /// field is the single source of truth for how many hydrogens the atom
    /// carries; no implicit-valence autofill happens behind its back.
    pub hydrogen_count: u8,
    /// Whether this atom is part of an aromatic system.
    pub is_aromatic: bool,
    /// Tetrahedral chirality marker.
    pub chirality: Chirality,
    /// Merge-point label; 0 = unlabeled.
    pub map_num: u16,
}

impl Atom {
    pub fn new(atomic_num: u8) -> Self {
        Self {
            atomic_num,
            ..Self::default()
        }
    }

    /// A labeled wildcard placeholder.
    pub fn wildcard(map_num: u16) -> Self {
        Self {
            atomic_num: element::WILDCARD,
            map_num,
            ..Self::default()
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.atomic_num == element::WILDCARD
    }

    /// N, O, or S: the heteroatoms whose hydrogens are dropped outright
    /// when the atom becomes a merge endpoint.
    pub fn is_merge_heteroatom(&self) -> bool {
        matches!(
            self.atomic_num,
            element::NITROGEN | element::OXYGEN | element::SULFUR
        )
    }

    /// Converts this atom into an unlabeled wildcard in place, clearing
    /// every property except connectivity.
    pub fn to_wildcard(&mut self) {
        self.atomic_num = element::WILDCARD;
        self.isotope = 0;
        self.formal_charge = 0;
        self.is_aromatic = false;
        self.hydrogen_count = 0;
        self.chirality = Chirality::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_constructor() {
        let atom = Atom::wildcard(4);
        assert!(atom.is_wildcard());
        assert_eq!(atom.map_num, 4);
        assert_eq!(atom.hydrogen_count, 0);
    }

    #[test]
    fn to_wildcard_clears_properties_but_not_label() {
        let mut atom = Atom {
            atomic_num: element::CARBON,
            hydrogen_count: 3,
            is_aromatic: true,
            isotope: 13,
            formal_charge: 1,
            map_num: 7,
            chirality: Chirality::Cw,
        };
        atom.to_wildcard();
        assert!(atom.is_wildcard());
        assert_eq!(atom.hydrogen_count, 0);
        assert_eq!(atom.isotope, 0);
        assert_eq!(atom.formal_charge, 0);
        assert!(!atom.is_aromatic);
        assert_eq!(atom.chirality, Chirality::None);
        assert_eq!(atom.map_num, 7, "merge-point label survives wildcarding");
    }

    #[test]
    fn merge_heteroatoms() {
        assert!(Atom::new(element::NITROGEN).is_merge_heteroatom());
        assert!(Atom::new(element::OXYGEN).is_merge_heteroatom());
        assert!(Atom::new(element::SULFUR).is_merge_heteroatom());
        assert!(!Atom::new(element::CARBON).is_merge_heteroatom());
        assert!(!Atom::new(element::PHOSPHORUS).is_merge_heteroatom());
    }
}
