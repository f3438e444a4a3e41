use std::collections::BTreeSet;
use std::sync::OnceLock;

use petgraph::graph::NodeIndex;

use super::error::ReactionError;
use super::{ReactionKind, Reactants};
use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::element;
use crate::merge::{merge, MergeOptions};
use crate::mol::Molecule;
use crate::smiles;
use crate::substruct::Pattern;

/// Merge-point labels. Each label is reserved for one role across the
/// whole enumeration so that any combination of fragments in flight never
/// carries two atoms with the same label by accident.
pub mod map_nums {
    /// Alpha carbon of the backbone fragment, pre-labeled in its SMILES.
    pub const BACKBONE_CARBON: u16 = 1;
    /// Attachment wildcard of the allylic surface fragment.
    pub const TEMP_WILDCARD: u16 = 2;
    /// Electrophilic carbon of the allylic surface fragment.
    pub const TEMP_EAS: u16 = 3;
    /// A side chain's attachment wildcard.
    pub const SC_WILDCARD: u16 = 4;
    /// The side-chain atom under trial as the reaction site.
    pub const SC_EAS: u16 = 5;

    /// Aldehyde carbon of a Pictet-Spengler template.
    pub const PS_CARBON: u16 = 6;
    /// Peptide carbonyl carbon created from the template's wildcard.
    pub const PEP_CARBON: u16 = 7;
    /// Backbone nitrogen that closes the Pictet-Spengler ring.
    pub const PS_NITROGEN: u16 = 8;
    /// Aldehyde oxygen, removed during assembly.
    pub const PS_OXYGEN: u16 = 9;
    /// C-terminus placeholder left where the carboxyl group was.
    pub const C_TERM_WILDCARD: u16 = 10;
    /// Placeholder left where the template's alkyne was.
    pub const ALKYNE_WILDCARD: u16 = 11;

    /// Indole carbon adjacent to the pyrrolo-indolene reaction site.
    pub const ADJ_CARBON: u16 = 12;
    /// Backbone nitrogen of the pyrrolo-indolene monomer.
    pub const PI_NITROGEN: u16 = 13;
    /// C-terminus placeholder of the pyrrolo-indolene monomer.
    pub const PI_C_TERM: u16 = 14;
    /// N-terminus placeholder added to the backbone nitrogen.
    pub const PI_N_TERM: u16 = 15;
}

use map_nums::*;

/// Glycine-like backbone the ring-forming variants graft side chains onto.
/// The alpha carbon is pre-labeled as a merge endpoint.
const BACKBONE: &str = "N[CH2:1]C(=O)O";

/// Allylic fragment standing in for the macrocycle surface in the
/// template-independent variants.
fn allyl_fragment() -> Result<Molecule, ReactionError> {
    Ok(smiles::from_smiles(&format!(
        "[*:{TEMP_WILDCARD}]/C=C/[CH3:{TEMP_EAS}]"
    ))?)
}

fn compiled(cell: &'static OnceLock<Pattern>, smiles: &'static str) -> &'static Pattern {
    cell.get_or_init(|| match Pattern::compile(smiles) {
        Ok(p) => p,
        Err(e) => unreachable!("bad built-in pattern {smiles:?}: {e}"),
    })
}

fn carbonyl_pattern() -> &'static Pattern {
    static CELL: OnceLock<Pattern> = OnceLock::new();
    compiled(&CELL, "C=O")
}

fn carboxyl_pattern() -> &'static Pattern {
    static CELL: OnceLock<Pattern> = OnceLock::new();
    compiled(&CELL, "C(=O)O")
}

fn cinnamoyl_pattern() -> &'static Pattern {
    static CELL: OnceLock<Pattern> = OnceLock::new();
    compiled(&CELL, "CC=Cc1ccccc1")
}

fn alkyne_pattern() -> &'static Pattern {
    static CELL: OnceLock<Pattern> = OnceLock::new();
    compiled(&CELL, "C#C")
}

fn indole_pattern() -> &'static Pattern {
    static CELL: OnceLock<Pattern> = OnceLock::new();
    compiled(&CELL, "*c1c[nH]c2ccccc12")
}

/// A reaction kind's validation/assembly pair.
///
/// `validate` inspects the reacting atom and its neighborhood; on success
/// it returns the preprocessed reactant set that `assemble` will merge,
/// on structural unsuitability it returns `None`. `assemble` is only ever
/// called with reactants produced by the same variant's `validate`.
pub trait Variant: Send + Sync {
    fn kind(&self) -> ReactionKind;
    fn validate(&self) -> Result<Option<Reactants>, ReactionError>;
    fn assemble(&self, reactants: &Reactants) -> Result<Molecule, ReactionError>;
}

/// Contracts the first occurrence of `pattern` into a single labeled
/// wildcard that inherits every bond from the matched subgraph to the
/// rest of the molecule. Returns false when the pattern is absent.
fn replace_substruct(mol: &mut Molecule, pattern: &Pattern, label: u16) -> bool {
    let mapping = match pattern.first_match(mol) {
        Some(m) => m,
        None => return false,
    };
    let matched: BTreeSet<NodeIndex> = mapping.iter().map(|&(_, t)| t).collect();

    let external: Vec<NodeIndex> = matched
        .iter()
        .flat_map(|&m| mol.neighbors(m).collect::<Vec<_>>())
        .filter(|n| !matched.contains(n))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let wildcard = mol.add_atom(Atom::wildcard(label));
    for outside in external {
        mol.add_bond(wildcard, outside, Bond::single());
    }
    // Descending order keeps the remaining indices valid under petgraph's
    // swap-remove semantics. The wildcard was added last, so it is never
    // displaced before the loop finishes.
    for idx in matched.into_iter().rev() {
        mol.remove_atom(idx);
    }
    true
}

/// Turns an attachment wildcard back into a real carbon, refilling its
/// hydrogen count for its current bonds. The merge-point label stays on.
fn wildcard_to_carbon(mol: &mut Molecule, wildcard: NodeIndex) {
    let used = mol.bond_valence_doubled(wildcard);
    let atom = mol.atom_mut(wildcard);
    atom.atomic_num = element::CARBON;
    atom.hydrogen_count = element::implicit_hydrogen_count(element::CARBON, used);
}

/// Grafts a side chain onto the backbone fragment, leaving a labeled
/// C-terminus placeholder and a labeled backbone nitrogen behind.
///
/// The side chain's attachment atom must already carry the side-chain
/// wildcard label; it becomes one merge endpoint, the backbone's alpha
/// carbon the other.
fn attach_backbone(
    side_chain: &Molecule,
    c_term_label: u16,
    nitrogen_label: u16,
) -> Result<Molecule, ReactionError> {
    let mut backbone = smiles::from_smiles(BACKBONE)?;
    if !replace_substruct(&mut backbone, carboxyl_pattern(), c_term_label) {
        return Err(ReactionError::MissingAtom("backbone carboxyl group"));
    }
    let nitrogen = backbone
        .find_atom(|a| a.atomic_num == element::NITROGEN && a.map_num == 0)
        .ok_or(ReactionError::MissingAtom("backbone nitrogen"))?;
    backbone.atom_mut(nitrogen).map_num = nitrogen_label;

    let opts = MergeOptions::new().ignoring(&[SC_EAS, nitrogen_label, c_term_label]);
    Ok(merge(&[side_chain.clone(), backbone], &opts)?)
}

/// Type A: electrophilic aromatic substitution on the macrocycle surface.
pub struct FriedelCrafts {
    side_chain: Molecule,
    reacting_atom: NodeIndex,
}

impl FriedelCrafts {
    pub fn new(side_chain: Molecule, reacting_atom: NodeIndex) -> Self {
        Self {
            side_chain,
            reacting_atom,
        }
    }
}

impl Variant for FriedelCrafts {
    fn kind(&self) -> ReactionKind {
        ReactionKind::FriedelCrafts
    }

    fn validate(&self) -> Result<Option<Reactants>, ReactionError> {
        let atom = self.side_chain.atom(self.reacting_atom);
        if atom.atomic_num != element::CARBON
            || !atom.is_aromatic
            || self.side_chain.total_hydrogens(self.reacting_atom) == 0
        {
            return Ok(None);
        }
        Ok(Some(Reactants(vec![
            self.side_chain.clone(),
            allyl_fragment()?,
        ])))
    }

    fn assemble(&self, reactants: &Reactants) -> Result<Molecule, ReactionError> {
        let opts = MergeOptions::new()
            .ignoring(&[TEMP_WILDCARD, SC_WILDCARD])
            .keep_labels();
        Ok(merge(&reactants.0, &opts)?)
    }
}

/// Type B: heteroatom substitution on the macrocycle surface. Shares the
/// Friedel-Crafts product shape but fires on N, O and S sites.
pub struct TsujiTrost {
    side_chain: Molecule,
    reacting_atom: NodeIndex,
}

impl TsujiTrost {
    pub fn new(side_chain: Molecule, reacting_atom: NodeIndex) -> Self {
        Self {
            side_chain,
            reacting_atom,
        }
    }
}

impl Variant for TsujiTrost {
    fn kind(&self) -> ReactionKind {
        ReactionKind::TsujiTrost
    }

    fn validate(&self) -> Result<Option<Reactants>, ReactionError> {
        let atom = self.side_chain.atom(self.reacting_atom);
        if !atom.is_merge_heteroatom()
            || self.side_chain.total_hydrogens(self.reacting_atom) == 0
        {
            return Ok(None);
        }
        Ok(Some(Reactants(vec![
            self.side_chain.clone(),
            allyl_fragment()?,
        ])))
    }

    fn assemble(&self, reactants: &Reactants) -> Result<Molecule, ReactionError> {
        let opts = MergeOptions::new()
            .ignoring(&[TEMP_WILDCARD, SC_WILDCARD])
            .keep_labels();
        Ok(merge(&reactants.0, &opts)?)
    }
}

/// Type C: template-dependent ring closure through an unmasked aldehyde.
pub struct PictetSpengler {
    side_chain: Molecule,
    template: Option<Molecule>,
    reacting_atom: NodeIndex,
}

impl PictetSpengler {
    pub fn new(
        side_chain: Molecule,
        template: Option<Molecule>,
        reacting_atom: NodeIndex,
    ) -> Self {
        Self {
            side_chain,
            template,
            reacting_atom,
        }
    }

    /// The attachment wildcard must sit two bonds from the reacting atom,
    /// so the eventual ring has the right size.
    fn wildcard_in_range(&self, wildcard: NodeIndex) -> bool {
        for n1 in self.side_chain.neighbors(self.reacting_atom) {
            if n1 == wildcard {
                return true;
            }
            for n2 in self.side_chain.neighbors(n1) {
                if n2 != self.reacting_atom && n2 == wildcard {
                    return true;
                }
            }
        }
        false
    }

    fn modify_side_chain(&self, wildcard: NodeIndex) -> Result<Molecule, ReactionError> {
        let mut side_chain = self.side_chain.clone();
        wildcard_to_carbon(&mut side_chain, wildcard);
        attach_backbone(&side_chain, C_TERM_WILDCARD, PS_NITROGEN)
    }

    fn modify_template(&self, template: &Molecule) -> Result<Molecule, ReactionError> {
        let mut template = template.clone();

        // Tag the unmasked aldehyde.
        let mapping = carbonyl_pattern()
            .first_match(&template)
            .ok_or(ReactionError::MissingAtom("template aldehyde"))?;
        for &(_, t) in &mapping {
            let atom = template.atom_mut(t);
            match atom.atomic_num {
                element::CARBON => atom.map_num = PS_CARBON,
                element::OXYGEN => atom.map_num = PS_OXYGEN,
                _ => {}
            }
        }

        // The template's attachment wildcard becomes the peptide carbonyl.
        let attachment = template
            .find_atom(|a| a.is_wildcard())
            .ok_or(ReactionError::MissingAtom("template attachment wildcard"))?;
        {
            let atom = template.atom_mut(attachment);
            atom.atomic_num = element::CARBON;
            atom.hydrogen_count = 1;
        }
        let oxygen = template.add_atom(Atom::new(element::OXYGEN));
        template.add_bond(attachment, oxygen, Bond::new(BondOrder::Double));
        for mapping in carbonyl_pattern().all_matches(&template) {
            for &(_, t) in &mapping {
                let atom = template.atom_mut(t);
                if atom.atomic_num == element::CARBON && atom.map_num != PS_CARBON {
                    atom.map_num = PEP_CARBON;
                }
            }
        }

        // Collapse the cinnamoyl unit and the alkyne into placeholders so
        // the emitted SMARTS stays focused on the reacting core.
        replace_substruct(&mut template, cinnamoyl_pattern(), TEMP_EAS);
        replace_substruct(&mut template, alkyne_pattern(), ALKYNE_WILDCARD);

        Ok(template)
    }
}

impl Variant for PictetSpengler {
    fn kind(&self) -> ReactionKind {
        ReactionKind::PictetSpengler
    }

    fn validate(&self) -> Result<Option<Reactants>, ReactionError> {
        let template = self
            .template
            .as_ref()
            .ok_or(ReactionError::MissingTemplate("pictet_spengler"))?;

        let atom = self.side_chain.atom(self.reacting_atom);
        if atom.atomic_num != element::CARBON
            || !atom.is_aromatic
            || self.side_chain.total_hydrogens(self.reacting_atom) == 0
        {
            return Ok(None);
        }

        let wildcard = match self.side_chain.find_atom(|a| a.is_wildcard()) {
            Some(w) => w,
            None => return Ok(None),
        };
        if !self.wildcard_in_range(wildcard) {
            return Ok(None);
        }

        if !carbonyl_pattern().matches(template) {
            return Ok(None);
        }

        let monomer = self.modify_side_chain(wildcard)?;
        let template = self.modify_template(template)?;

        // Join the monomer's nitrogen to the new peptide carbonyl carbon,
        // producing the single combined reactant assembly starts from.
        let opts = MergeOptions::new()
            .ignoring(&[
                TEMP_EAS,
                SC_EAS,
                C_TERM_WILDCARD,
                PS_CARBON,
                PS_OXYGEN,
                ALKYNE_WILDCARD,
            ])
            .keep_labels();
        let mut combined = merge(&[monomer, template], &opts)?;

        // The aldehyde oxygen is located through its carbon from here on;
        // its own label must not leak into the emitted SMARTS.
        if let Some(oxygen) = combined.atom_with_label(PS_OXYGEN) {
            combined.atom_mut(oxygen).map_num = 0;
        }

        Ok(Some(Reactants(vec![combined])))
    }

    fn assemble(&self, reactants: &Reactants) -> Result<Molecule, ReactionError> {
        let [combined] = &reactants.0[..] else {
            return Err(ReactionError::MissingAtom("combined reactant"));
        };
        let mut reactant = combined.clone();

        // Unmask the aldehyde: drop its oxygen.
        let carbon = reactant
            .atom_with_label(PS_CARBON)
            .ok_or(ReactionError::MissingAtom("aldehyde carbon"))?;
        let oxygen = reactant
            .neighbors(carbon)
            .find(|&n| {
                reactant.atom(n).atomic_num == element::OXYGEN
                    && reactant
                        .bond_between(carbon, n)
                        .map(|e| reactant.bond(e).order == BondOrder::Double)
                        .unwrap_or(false)
            })
            .ok_or(ReactionError::MissingAtom("aldehyde oxygen"))?;
        reactant.remove_atom(oxygen);

        // First ring bond: reacting carbon to the freed aldehyde carbon.
        let opts = MergeOptions::new()
            .ignoring(&[
                TEMP_EAS,
                PEP_CARBON,
                ALKYNE_WILDCARD,
                PS_NITROGEN,
                C_TERM_WILDCARD,
            ])
            .keep_labels();
        let reactant = merge(&[reactant], &opts)?;

        // Second ring bond: backbone nitrogen to the same carbon.
        let opts = MergeOptions::new()
            .ignoring(&[
                TEMP_EAS,
                SC_EAS,
                ALKYNE_WILDCARD,
                PEP_CARBON,
                C_TERM_WILDCARD,
            ])
            .keep_labels();
        Ok(merge(&[reactant], &opts)?)
    }
}

/// Type D: indole-bridging ring closure. Template-independent; the final
/// merge uses the same allylic surface fragment as the surface reactions.
pub struct PyrroloIndolene {
    side_chain: Molecule,
    reacting_atom: NodeIndex,
}

impl PyrroloIndolene {
    pub fn new(side_chain: Molecule, reacting_atom: NodeIndex) -> Self {
        Self {
            side_chain,
            reacting_atom,
        }
    }

    fn modify_side_chain(&self, wildcard: NodeIndex) -> Result<Molecule, ReactionError> {
        let mut side_chain = self.side_chain.clone();
        wildcard_to_carbon(&mut side_chain, wildcard);
        let mut monomer = attach_backbone(&side_chain, PI_C_TERM, PI_NITROGEN)?;

        // N-terminus wildcard on the backbone nitrogen.
        let nitrogen = monomer
            .atom_with_label(PI_NITROGEN)
            .ok_or(ReactionError::MissingAtom("backbone nitrogen"))?;
        monomer.atom_mut(nitrogen).hydrogen_count = 1;
        let n_term = monomer.add_atom(Atom::wildcard(PI_N_TERM));
        monomer.add_bond(nitrogen, n_term, Bond::single());

        // Tag the hydrogen-bearing aromatic carbon next to the reaction
        // site; it takes the new bond to the nitrogen.
        let reacting = monomer
            .atom_with_label(SC_EAS)
            .ok_or(ReactionError::MissingAtom("reaction site"))?;
        let adjacent = monomer
            .neighbors(reacting)
            .find(|&n| monomer.atom(n).is_aromatic && monomer.total_hydrogens(n) == 1)
            .ok_or(ReactionError::MissingAtom("adjacent indole carbon"))?;
        monomer.atom_mut(adjacent).map_num = ADJ_CARBON;

        Ok(monomer)
    }
}

impl Variant for PyrroloIndolene {
    fn kind(&self) -> ReactionKind {
        ReactionKind::PyrroloIndolene
    }

    fn validate(&self) -> Result<Option<Reactants>, ReactionError> {
        if !indole_pattern().matches(&self.side_chain) {
            return Ok(None);
        }

        // The trial fires only at the indole carbon that attaches to the
        // backbone: a hydrogen-free carbon with a lone hydrogen-bearing
        // neighbor, directly bonded to the attachment wildcard.
        let atom = self.side_chain.atom(self.reacting_atom);
        if atom.atomic_num != element::CARBON
            || self.side_chain.total_hydrogens(self.reacting_atom) != 0
        {
            return Ok(None);
        }
        if !self
            .side_chain
            .neighbors(self.reacting_atom)
            .any(|n| self.side_chain.total_hydrogens(n) == 1)
        {
            return Ok(None);
        }
        let wildcard = match self.side_chain.find_atom(|a| a.is_wildcard()) {
            Some(w) => w,
            None => return Ok(None),
        };
        if self
            .side_chain
            .neighbors(wildcard)
            .all(|n| n != self.reacting_atom)
        {
            return Ok(None);
        }

        let monomer = self.modify_side_chain(wildcard)?;
        Ok(Some(Reactants(vec![monomer, allyl_fragment()?])))
    }

    fn assemble(&self, reactants: &Reactants) -> Result<Molecule, ReactionError> {
        let [monomer, template] = &reactants.0[..] else {
            return Err(ReactionError::MissingAtom("monomer and surface fragment"));
        };
        let mut side_chain = monomer.clone();

        let reacting = side_chain
            .atom_with_label(SC_EAS)
            .ok_or(ReactionError::MissingAtom("reaction site"))?;
        let adjacent = side_chain
            .atom_with_label(ADJ_CARBON)
            .ok_or(ReactionError::MissingAtom("adjacent indole carbon"))?;
        let bond = side_chain
            .bond_between(reacting, adjacent)
            .ok_or(ReactionError::MissingAtom("indole ring bond"))?;

        // Break the aromatic bridge down to a single bond; both carbons
        // regain a hydrogen.
        side_chain.bond_mut(bond).order = BondOrder::Single;
        for idx in [reacting, adjacent] {
            let total = side_chain.total_hydrogens(idx);
            side_chain.atom_mut(idx).hydrogen_count = total + 1;
        }

        // Ring bond from the backbone nitrogen to the adjacent carbon.
        let opts = MergeOptions::new()
            .ignoring(&[PI_C_TERM, SC_EAS, PI_N_TERM])
            .keep_labels();
        let side_chain = merge(&[side_chain], &opts)?;

        // Surface bond from the reacting carbon to the allylic fragment.
        let opts = MergeOptions::new()
            .ignoring(&[
                PI_C_TERM,
                PI_N_TERM,
                TEMP_WILDCARD,
                ADJ_CARBON,
                PI_NITROGEN,
            ])
            .keep_labels();
        Ok(merge(&[side_chain, template.clone()], &opts)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::{from_smiles, to_smiles};

    fn mol(smiles: &str) -> Molecule {
        from_smiles(smiles).unwrap_or_else(|e| panic!("bad SMILES {smiles:?}: {e}"))
    }

    /// Tags every methyl-derived attachment like the driver does, then
    /// labels `site` as the reaction site.
    fn tagged_side_chain(smiles: &str, site: usize) -> Molecule {
        let mut m = mol(smiles);
        if let Some(mapping) = Pattern::compile("[CH3]").unwrap().first_match(&m) {
            let (_, idx) = mapping[0];
            let atom = m.atom_mut(idx);
            atom.map_num = SC_WILDCARD;
            atom.to_wildcard();
        }
        m.atom_mut(NodeIndex::new(site)).map_num = SC_EAS;
        m
    }

    #[test]
    fn replace_substruct_contracts_to_wildcard() {
        let mut backbone = mol(BACKBONE);
        assert!(replace_substruct(&mut backbone, carboxyl_pattern(), 42));
        // N, alpha C, and the new wildcard remain.
        assert_eq!(backbone.atom_count(), 3);
        let wildcard = backbone.atom_with_label(42).unwrap();
        assert!(backbone.atom(wildcard).is_wildcard());
        assert_eq!(backbone.degree(wildcard), 1);
    }

    #[test]
    fn replace_substruct_reports_missing_pattern() {
        let mut m = mol("CCO");
        assert!(!replace_substruct(&mut m, alkyne_pattern(), 1));
        assert_eq!(m.atom_count(), 3);
    }

    #[test]
    fn attach_backbone_builds_monomer() {
        // Benzyl side chain with its methyl turned into the attachment.
        let mut side_chain = tagged_side_chain("Cc1ccccc1", 2);
        let wildcard = side_chain.find_atom(|a| a.is_wildcard()).unwrap();
        wildcard_to_carbon(&mut side_chain, wildcard);

        let monomer = attach_backbone(&side_chain, C_TERM_WILDCARD, PS_NITROGEN).unwrap();
        assert!(monomer.atom_with_label(PS_NITROGEN).is_some());
        assert!(monomer.atom_with_label(C_TERM_WILDCARD).is_some());
        // The attachment labels were consumed by the merge.
        assert!(monomer.atom_with_label(SC_WILDCARD).is_none());
        assert!(monomer.atom_with_label(BACKBONE_CARBON).is_none());
    }

    #[test]
    fn friedel_crafts_accepts_aromatic_ch() {
        let side_chain = tagged_side_chain("Cc1ccccc1", 2);
        let rxn = FriedelCrafts::new(side_chain, NodeIndex::new(2));
        let reactants = rxn.validate().unwrap().expect("aromatic CH must react");
        assert_eq!(reactants.0.len(), 2);
        let product = rxn.assemble(&reactants).unwrap();
        // Atom-mapped SMARTS endpoints survive in the product.
        assert!(product.atom_with_label(SC_EAS).is_some());
        assert!(product.atom_with_label(TEMP_EAS).is_some());
        assert!(to_smiles(&product).contains(":5]"));
    }

    #[test]
    fn friedel_crafts_rejects_saturated_carbon() {
        let side_chain = tagged_side_chain("CCc1ccccc1", 1);
        let rxn = FriedelCrafts::new(side_chain, NodeIndex::new(1));
        assert!(rxn.validate().unwrap().is_none());
    }

    #[test]
    fn tsuji_trost_accepts_amine() {
        let side_chain = tagged_side_chain("CNC", 1);
        let rxn = TsujiTrost::new(side_chain, NodeIndex::new(1));
        let reactants = rxn.validate().unwrap().expect("NH must react");
        let product = rxn.assemble(&reactants).unwrap();
        let nitrogen = product.atom_with_label(SC_EAS).unwrap();
        assert_eq!(product.atom(nitrogen).atomic_num, element::NITROGEN);
        // The heteroatom gave up its hydrogen for the new bond.
        assert_eq!(product.total_hydrogens(nitrogen), 0);
    }

    #[test]
    fn tsuji_trost_rejects_aromatic_carbon() {
        let side_chain = tagged_side_chain("Cc1ccccc1", 2);
        let rxn = TsujiTrost::new(side_chain, NodeIndex::new(2));
        assert!(rxn.validate().unwrap().is_none());
    }

    #[test]
    fn tsuji_trost_rejects_hydrogen_free_nitrogen() {
        let side_chain = tagged_side_chain("CN(C)C", 1);
        let rxn = TsujiTrost::new(side_chain, NodeIndex::new(1));
        assert!(rxn.validate().unwrap().is_none());
    }

    /// A minimal Pictet-Spengler template: aryl attachment wildcard, an
    /// unmasked aldehyde, a cinnamoyl unit and an alkyne handle.
    fn ps_template() -> Molecule {
        mol("O=CCCC(*)CC#CCc1ccccc1C=CC")
    }

    #[test]
    fn pictet_spengler_requires_template() {
        let side_chain = tagged_side_chain("Cc1ccccc1", 2);
        let rxn = PictetSpengler::new(side_chain, None, NodeIndex::new(2));
        assert!(matches!(
            rxn.validate(),
            Err(ReactionError::MissingTemplate(_))
        ));
    }

    #[test]
    fn pictet_spengler_rejects_remote_site() {
        // The para carbon sits four bonds from the attachment point.
        let side_chain = tagged_side_chain("Cc1ccccc1", 4);
        let rxn = PictetSpengler::new(side_chain, Some(ps_template()), NodeIndex::new(4));
        assert!(rxn.validate().unwrap().is_none());
    }

    #[test]
    fn pictet_spengler_accepts_ortho_site() {
        // Ring carbon two bonds from the attachment wildcard.
        let side_chain = tagged_side_chain("Cc1ccccc1", 2);
        let rxn = PictetSpengler::new(side_chain, Some(ps_template()), NodeIndex::new(2));
        let reactants = rxn.validate().unwrap().expect("ortho CH must react");
        // Preprocessing fused monomer and template into one reactant.
        assert_eq!(reactants.0.len(), 1);
        let combined = &reactants.0[0];
        assert!(combined.atom_with_label(PS_CARBON).is_some());
        assert!(combined.atom_with_label(PS_NITROGEN).is_some());
        assert!(combined.atom_with_label(ALKYNE_WILDCARD).is_some());
        assert!(combined.atom_with_label(PS_OXYGEN).is_none());

        let product = rxn.assemble(&reactants).unwrap();
        // The aldehyde oxygen is gone and the new ring is closed: the
        // aldehyde carbon now bridges the reacting carbon and nitrogen.
        let carbon = product.atom_with_label(PS_CARBON).unwrap();
        let reacting = product.atom_with_label(SC_EAS).unwrap();
        let nitrogen = product.atom_with_label(PS_NITROGEN).unwrap();
        assert!(product.bond_between(carbon, reacting).is_some());
        assert!(product.bond_between(carbon, nitrogen).is_some());
        assert_eq!(product.atom_count(), combined.atom_count() - 1);
    }

    /// 3-methylindole with the methyl as attachment; the reacting atom is
    /// the ring carbon bonded to the wildcard.
    fn indole_side_chain() -> Molecule {
        tagged_side_chain("Cc1c[nH]c2ccccc12", 1)
    }

    #[test]
    fn pyrrolo_indolene_accepts_bridge_carbon() {
        let rxn = PyrroloIndolene::new(indole_side_chain(), NodeIndex::new(1));
        let reactants = rxn.validate().unwrap().expect("bridge carbon must react");
        assert_eq!(reactants.0.len(), 2);
        let monomer = &reactants.0[0];
        assert!(monomer.atom_with_label(ADJ_CARBON).is_some());
        assert!(monomer.atom_with_label(PI_N_TERM).is_some());

        let product = rxn.assemble(&reactants).unwrap();
        let reacting = product.atom_with_label(SC_EAS).unwrap();
        let adjacent = product.atom_with_label(ADJ_CARBON).unwrap();
        let nitrogen = product.atom_with_label(PI_NITROGEN).unwrap();
        // The aromatic bridge is now a single bond, the nitrogen closed
        // onto the adjacent carbon, and the surface fragment is attached.
        let bridge = product.bond_between(reacting, adjacent).unwrap();
        assert_eq!(product.bond(bridge).order, BondOrder::Single);
        assert!(product.bond_between(nitrogen, adjacent).is_some());
        assert!(product.atom_with_label(TEMP_EAS).is_some());
    }

    #[test]
    fn pyrrolo_indolene_rejects_non_indole() {
        let side_chain = tagged_side_chain("Cc1ccccc1", 1);
        let rxn = PyrroloIndolene::new(side_chain, NodeIndex::new(1));
        assert!(rxn.validate().unwrap().is_none());
    }

    #[test]
    fn pyrrolo_indolene_rejects_hydrogen_bearing_site() {
        let rxn = PyrroloIndolene::new(indole_side_chain(), NodeIndex::new(2));
        assert!(rxn.validate().unwrap().is_none());
    }
}
