/// Element data for the subset of the periodic table that occurs in
/// peptide side chains, backbones, and templates.
///
/// Atomic number 0 is the wildcard placeholder used to mark attachment
/// points; it has no valence constraints.

pub const WILDCARD: u8 = 0;
pub const HYDROGEN: u8 = 1;
pub const BORON: u8 = 5;
pub const CARBON: u8 = 6;
pub const NITROGEN: u8 = 7;
pub const OXYGEN: u8 = 8;
pub const FLUORINE: u8 = 9;
pub const PHOSPHORUS: u8 = 15;
pub const SULFUR: u8 = 16;
pub const CHLORINE: u8 = 17;
pub const BROMINE: u8 = 35;
pub const IODINE: u8 = 53;

/// Maps an element symbol to its atomic number. Two-letter symbols must be
/// tried before their one-letter prefixes when scanning SMILES input.
pub fn atomic_num_from_symbol(symbol: &str) -> Option<u8> {
    match symbol {
        "*" => Some(WILDCARD),
        "H" => Some(HYDROGEN),
        "B" => Some(BORON),
        "C" => Some(CARBON),
        "N" => Some(NITROGEN),
        "O" => Some(OXYGEN),
        "F" => Some(FLUORINE),
        "P" => Some(PHOSPHORUS),
        "S" => Some(SULFUR),
        "Cl" => Some(CHLORINE),
        "Br" => Some(BROMINE),
        "I" => Some(IODINE),
        _ => None,
    }
}

pub fn symbol(atomic_num: u8) -> &'static str {
    match atomic_num {
        WILDCARD => "*",
        HYDROGEN => "H",
        BORON => "B",
        CARBON => "C",
        NITROGEN => "N",
        OXYGEN => "O",
        FLUORINE => "F",
        PHOSPHORUS => "P",
        SULFUR => "S",
        CHLORINE => "Cl",
        BROMINE => "Br",
        IODINE => "I",
        _ => "?",
    }
}

/// True for elements that may be written bare (no brackets) in SMILES.
pub fn in_organic_subset(atomic_num: u8) -> bool {
    matches!(
        atomic_num,
        BORON
            | CARBON
            | NITROGEN
            | OXYGEN
            | FLUORINE
            | PHOSPHORUS
            | SULFUR
            | CHLORINE
            | BROMINE
            | IODINE
    )
}

/// True for elements that may be written as bare lowercase aromatic atoms.
pub fn aromatic_symbol_allowed(atomic_num: u8) -> bool {
    matches!(
        atomic_num,
        BORON | CARBON | NITROGEN | OXYGEN | PHOSPHORUS | SULFUR
    )
}

/// Default valence used to fill implicit hydrogens on bare organic-subset
/// atoms (the lowest common valence).
pub fn default_valence(atomic_num: u8) -> u8 {
    match atomic_num {
        HYDROGEN => 1,
        BORON => 3,
        CARBON => 4,
        NITROGEN => 3,
        OXYGEN => 2,
        FLUORINE | CHLORINE | BROMINE | IODINE => 1,
        PHOSPHORUS => 3,
        SULFUR => 2,
        _ => 0,
    }
}

/// Implicit hydrogens a bare (unbracketed) atom receives given the doubled
/// sum of its bond-order contributions. Flooring after the aromatic
/// three-halves contribution reproduces the conventional aromatic counts
/// (one hydrogen on a benzene carbon, none on a fusion carbon).
pub fn implicit_hydrogen_count(atomic_num: u8, bond_valence_doubled: u16) -> u8 {
    let used = (bond_valence_doubled / 2) as u8;
    default_valence(atomic_num).saturating_sub(used)
}

/// Upper valence bound used by post-merge validation. Positive formal
/// charge raises the limit for nitrogen and oxygen (ammonium and oxonium
/// patterns); the wildcard is unconstrained.
pub fn max_valence(atomic_num: u8, formal_charge: i8) -> u8 {
    let base = match atomic_num {
        HYDROGEN => 1,
        BORON => 3,
        CARBON => 4,
        NITROGEN => 3,
        OXYGEN => 2,
        FLUORINE | CHLORINE | BROMINE | IODINE => 1,
        PHOSPHORUS => 5,
        SULFUR => 6,
        _ => u8::MAX,
    };
    if formal_charge > 0 && matches!(atomic_num, NITROGEN | OXYGEN) {
        base.saturating_add(formal_charge as u8)
    } else {
        base
    }
}
