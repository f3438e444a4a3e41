use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::mol::{CodecError, Molecule};
use crate::reaction::{
    map_nums, FriedelCrafts, PictetSpengler, PyrroloIndolene, Reaction, ReactionError,
    ReactionInfo, ReactionKind, TsujiTrost, Variant,
};
use crate::substruct::Pattern;

/// Sentinel template identifier on records of template-independent kinds.
pub const ALL_TEMPLATES: &str = "all";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Reaction(#[from] ReactionError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Input side-chain record, as supplied by the loading collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideChain {
    pub id: String,
    pub parent_id: String,
    pub binary: Vec<u8>,
    pub conn_atom_idx: usize,
}

/// Input template record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub binary: Vec<u8>,
}

/// Provenance reference embedded in every output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideChainRef {
    pub id: String,
    pub parent_id: String,
    pub conn_atom_idx: usize,
}

/// One accepted reaction, ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub id: String,
    pub kind: ReactionKind,
    pub binary: Vec<u8>,
    pub smarts: String,
    pub rxn_atom_idx: usize,
    pub template_id: String,
    pub side_chain: SideChainRef,
}

/// Persistence contract for generated records.
pub trait ReactionRepository {
    fn save(&mut self, records: &[ReactionRecord]) -> bool;
}

/// In-memory repository, mainly for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    pub records: Vec<ReactionRecord>,
}

impl ReactionRepository for InMemoryRepository {
    fn save(&mut self, records: &[ReactionRecord]) -> bool {
        self.records.extend_from_slice(records);
        true
    }
}

/// Result of all trials for one (side chain, kind[, template]) work item.
///
/// The map key is the canonical reaction SMARTS, which silently collapses
/// trials on symmetric atoms into a single entry. Side chain and template
/// are carried as positions into the generator's input lists, never as
/// completion-order artifacts.
#[derive(Debug)]
pub struct NewReactions {
    pub reactions: BTreeMap<String, ReactionInfo>,
    pub side_chain: usize,
    pub template: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct WorkItem {
    side_chain: usize,
    kind: ReactionKind,
    template: Option<usize>,
}

/// Enumerates reactions over the cartesian product of side chains,
/// reaction kinds and (for template-dependent kinds) templates.
pub struct ReactionGenerator {
    side_chains: Vec<SideChain>,
    templates: Vec<Template>,
}

pub const DEFAULT_KINDS: [ReactionKind; 4] = [
    ReactionKind::FriedelCrafts,
    ReactionKind::TsujiTrost,
    ReactionKind::PictetSpengler,
    ReactionKind::PyrroloIndolene,
];

impl ReactionGenerator {
    pub fn new(side_chains: Vec<SideChain>, templates: Vec<Template>) -> Self {
        Self {
            side_chains,
            templates,
        }
    }

    /// Runs the full enumeration on a worker pool.
    ///
    /// Work items are scattered to the pool and gathered at a single
    /// barrier per work list (template-dependent first). Record
    /// identifiers derive from static input positions, so the output is
    /// byte-identical to [`generate_serial`](Self::generate_serial)
    /// regardless of scheduling. Any failing trial aborts the whole run.
    pub fn generate(&self, kinds: &[ReactionKind]) -> Result<Vec<ReactionRecord>, GenerateError> {
        info!(
            side_chains = self.side_chains.len(),
            templates = self.templates.len(),
            "generating reactions"
        );
        let mut records = Vec::new();
        for work in [self.dependent_work(kinds), self.independent_work(kinds)] {
            let batches: Vec<NewReactions> = work
                .into_par_iter()
                .map(|item| self.create_reactions(item))
                .collect::<Result<_, _>>()?;
            for batch in batches {
                self.accumulate(&mut records, batch);
            }
        }
        info!(records = records.len(), "generation finished");
        Ok(records)
    }

    /// Single-threaded rendition of [`generate`](Self::generate).
    pub fn generate_serial(
        &self,
        kinds: &[ReactionKind],
    ) -> Result<Vec<ReactionRecord>, GenerateError> {
        let mut records = Vec::new();
        for work in [self.dependent_work(kinds), self.independent_work(kinds)] {
            for item in work {
                let batch = self.create_reactions(item)?;
                self.accumulate(&mut records, batch);
            }
        }
        Ok(records)
    }

    /// Restricts the enumeration to the given side-chain and template
    /// identifiers, preserving input-list order for identifier purposes
    /// within the restricted run.
    pub fn generate_from_ids(
        &self,
        side_chain_ids: &[&str],
        template_ids: &[&str],
        kinds: &[ReactionKind],
    ) -> Result<Vec<ReactionRecord>, GenerateError> {
        let restricted = Self::new(
            self.side_chains
                .iter()
                .filter(|sc| side_chain_ids.contains(&sc.id.as_str()))
                .cloned()
                .collect(),
            self.templates
                .iter()
                .filter(|t| template_ids.contains(&t.id.as_str()))
                .cloned()
                .collect(),
        );
        restricted.generate_serial(kinds)
    }

    /// Runs the enumeration and hands the records to the repository.
    pub fn generate_into(
        &self,
        kinds: &[ReactionKind],
        repository: &mut dyn ReactionRepository,
    ) -> Result<bool, GenerateError> {
        let records = self.generate(kinds)?;
        Ok(repository.save(&records))
    }

    fn dependent_work(&self, kinds: &[ReactionKind]) -> Vec<WorkItem> {
        let mut work = Vec::new();
        for sc in 0..self.side_chains.len() {
            for &kind in kinds.iter().filter(|k| k.requires_template()) {
                for t in 0..self.templates.len() {
                    work.push(WorkItem {
                        side_chain: sc,
                        kind,
                        template: Some(t),
                    });
                }
            }
        }
        work
    }

    fn independent_work(&self, kinds: &[ReactionKind]) -> Vec<WorkItem> {
        let mut work = Vec::new();
        for sc in 0..self.side_chains.len() {
            for &kind in kinds.iter().filter(|k| !k.requires_template()) {
                work.push(WorkItem {
                    side_chain: sc,
                    kind,
                    template: None,
                });
            }
        }
        work
    }

    /// Trials one reaction kind at every candidate atom of one side chain.
    fn create_reactions(&self, item: WorkItem) -> Result<NewReactions, GenerateError> {
        let record = &self.side_chains[item.side_chain];
        let mut side_chain = Molecule::from_bytes(&record.binary)?;
        let template = match item.template {
            Some(t) => Some(Molecule::from_bytes(&self.templates[t].binary)?),
            None => None,
        };

        tag_wildcard_atom(&mut side_chain);
        let candidates: Vec<NodeIndex> = side_chain
            .atoms()
            .filter(|&idx| side_chain.atom(idx).map_num != map_nums::SC_WILDCARD)
            .collect();

        let mut reactions = BTreeMap::new();
        for idx in candidates {
            side_chain.atom_mut(idx).map_num = map_nums::SC_EAS;
            let variant = build_variant(item.kind, side_chain.clone(), template.clone(), idx);
            let rxn = Reaction::new(variant, idx);
            if let (Some(smarts), Some(info)) = (rxn.smarts()?, rxn.info()?) {
                reactions.insert(smarts, info);
            }
            // The site tag is scoped to this trial.
            side_chain.atom_mut(idx).map_num = 0;
        }

        debug!(
            side_chain = %record.id,
            kind = item.kind.name(),
            accepted = reactions.len(),
            "side chain processed"
        );
        Ok(NewReactions {
            reactions,
            side_chain: item.side_chain,
            template: item.template,
        })
    }

    /// Folds one batch into the output, deriving identifiers from the
    /// batch's static input positions.
    fn accumulate(&self, records: &mut Vec<ReactionRecord>, batch: NewReactions) {
        let side_chain = &self.side_chains[batch.side_chain];
        let (chunk, template_id) = match batch.template {
            Some(t) => (batch.reactions.len() * t, self.templates[t].id.as_str()),
            None => (batch.reactions.len(), ALL_TEMPLATES),
        };

        for (i, (smarts, info)) in batch.reactions.into_iter().enumerate() {
            records.push(ReactionRecord {
                id: format!("{}{}{}", side_chain.id, chunk + i, info.kind.code()),
                kind: info.kind,
                binary: info.binary,
                smarts,
                rxn_atom_idx: info.rxn_atom_idx,
                template_id: template_id.to_string(),
                side_chain: SideChainRef {
                    id: side_chain.id.clone(),
                    parent_id: side_chain.parent_id.clone(),
                    conn_atom_idx: side_chain.conn_atom_idx,
                },
            });
        }
    }
}

/// Turns the side chain's methyl attachment into a labeled wildcard. Only
/// the first methyl match is converted; a side chain without one is left
/// untouched and simply fails the variants that need an attachment point.
fn tag_wildcard_atom(side_chain: &mut Molecule) {
    static METHYL: std::sync::OnceLock<Pattern> = std::sync::OnceLock::new();
    let methyl = METHYL.get_or_init(|| match Pattern::compile("[CH3]") {
        Ok(p) => p,
        Err(e) => unreachable!("bad built-in pattern: {e}"),
    });
    if let Some(mapping) = methyl.first_match(side_chain) {
        let (_, idx) = mapping[0];
        let atom = side_chain.atom_mut(idx);
        atom.map_num = map_nums::SC_WILDCARD;
        atom.to_wildcard();
    }
}

fn build_variant(
    kind: ReactionKind,
    side_chain: Molecule,
    template: Option<Molecule>,
    reacting_atom: NodeIndex,
) -> Box<dyn Variant> {
    match kind {
        ReactionKind::FriedelCrafts => Box::new(FriedelCrafts::new(side_chain, reacting_atom)),
        ReactionKind::TsujiTrost => Box::new(TsujiTrost::new(side_chain, reacting_atom)),
        ReactionKind::PictetSpengler => {
            Box::new(PictetSpengler::new(side_chain, template, reacting_atom))
        }
        ReactionKind::PyrroloIndolene => {
            Box::new(PyrroloIndolene::new(side_chain, reacting_atom))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn side_chain(id: &str, smiles: &str) -> SideChain {
        SideChain {
            id: id.to_string(),
            parent_id: format!("p_{id}"),
            binary: from_smiles(smiles).unwrap().to_bytes().unwrap(),
            conn_atom_idx: 0,
        }
    }

    #[test]
    fn tag_wildcard_converts_first_methyl() {
        let mut m = from_smiles("Cc1ccccc1").unwrap();
        tag_wildcard_atom(&mut m);
        let tagged = m.atom_with_label(map_nums::SC_WILDCARD).unwrap();
        assert!(m.atom(tagged).is_wildcard());
        assert_eq!(m.atoms().filter(|&i| m.atom(i).is_wildcard()).count(), 1);
    }

    #[test]
    fn benzyl_friedel_crafts_dedups_symmetric_sites() {
        let gen = ReactionGenerator::new(vec![side_chain("sc1", "Cc1ccccc1")], vec![]);
        let records = gen
            .generate_serial(&[ReactionKind::FriedelCrafts])
            .unwrap();
        // Five aromatic CH sites collapse to ortho, meta and para.
        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.kind, ReactionKind::FriedelCrafts);
            assert_eq!(record.template_id, ALL_TEMPLATES);
            assert_eq!(record.side_chain.id, "sc1");
        }
    }

    #[test]
    fn benzyl_has_no_tsuji_trost_sites() {
        let gen = ReactionGenerator::new(vec![side_chain("sc1", "Cc1ccccc1")], vec![]);
        let records = gen.generate_serial(&[ReactionKind::TsujiTrost]).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn amine_fires_tsuji_trost_but_not_friedel_crafts() {
        let gen = ReactionGenerator::new(vec![side_chain("sc1", "CNC")], vec![]);
        let tt = gen.generate_serial(&[ReactionKind::TsujiTrost]).unwrap();
        assert_eq!(tt.len(), 1);
        let fc = gen.generate_serial(&[ReactionKind::FriedelCrafts]).unwrap();
        assert!(fc.is_empty());
    }

    #[test]
    fn record_ids_derive_from_positions() {
        let gen = ReactionGenerator::new(vec![side_chain("sc1", "Cc1ccccc1")], vec![]);
        let records = gen
            .generate_serial(&[ReactionKind::FriedelCrafts])
            .unwrap();
        // chunk = len(reactions) for template-independent kinds.
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["sc13f", "sc14f", "sc15f"]);
    }

    #[test]
    fn parallel_matches_serial() {
        let gen = ReactionGenerator::new(
            vec![
                side_chain("sc1", "Cc1ccccc1"),
                side_chain("sc2", "CNC"),
                side_chain("sc3", "Cc1c[nH]c2ccccc12"),
            ],
            vec![],
        );
        let kinds = [
            ReactionKind::FriedelCrafts,
            ReactionKind::TsujiTrost,
            ReactionKind::PyrroloIndolene,
        ];
        let serial = gen.generate_serial(&kinds).unwrap();
        let parallel = gen.generate(&kinds).unwrap();
        assert_eq!(serial, parallel);
        assert!(!serial.is_empty());
    }

    #[test]
    fn generate_from_ids_restricts_inputs() {
        let gen = ReactionGenerator::new(
            vec![
                side_chain("sc1", "Cc1ccccc1"),
                side_chain("sc2", "CNC"),
            ],
            vec![],
        );
        let records = gen
            .generate_from_ids(&["sc2"], &[], &[ReactionKind::TsujiTrost])
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].side_chain.id, "sc2");
    }

    #[test]
    fn repository_receives_records() {
        let gen = ReactionGenerator::new(vec![side_chain("sc1", "CNC")], vec![]);
        let mut repo = InMemoryRepository::default();
        assert!(gen
            .generate_into(&[ReactionKind::TsujiTrost], &mut repo)
            .unwrap());
        assert_eq!(repo.records.len(), 1);
        assert!(repo.records[0].smarts.contains(">>"));
    }

    #[test]
    fn decode_failure_aborts_run() {
        let broken = SideChain {
            id: "bad".to_string(),
            parent_id: "p_bad".to_string(),
            binary: vec![0xff, 0x00, 0x01],
            conn_atom_idx: 0,
        };
        let gen = ReactionGenerator::new(vec![broken], vec![]);
        assert!(gen.generate_serial(&[ReactionKind::FriedelCrafts]).is_err());
    }
}
