//! Filter many reactions by the changes they bring about.

use std::collections::BTreeMap;

use clap::ValueEnum;
use log::warn;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::{
    histogram::Histogram,
    molecule::{Element, Hybridization, Molecule},
    reaction::{Reaction, Role},
    rings::RingWord,
};

/// Parallelization strategy for reaction search.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum ParallelMode {
    /// Evaluate reactions one after another.
    None,
    /// Evaluate reactions on the rayon thread pool.
    Always,
}

/// Conditions a reaction must meet. Each non-empty histogram lists changes
/// that must appear with exactly the given count; other keys may change
/// freely.
///
/// Histograms drop zero counts, so "no change" cannot be asked for: a key
/// given a count of 0 is simply absent and places no condition on the
/// reaction.
#[derive(Debug, Clone, Default)]
pub struct ReactionQuery {
    pub formula: Histogram<Element>,
    pub valence: Histogram<Option<u32>>,
    pub hybridization: Histogram<Option<Hybridization>>,
    pub rings: Histogram<usize>,
    /// Change in stereocentres, keyed `Sp2` and `Sp3`.
    pub stereo: Histogram<Hybridization>,
    /// Count only stereocentres of known parity in `stereo`.
    pub well_defined_stereo: bool,
    pub isotopic: bool,
    pub ring_present: Option<RingWord>,
    /// An InChI that must be a component in the given role.
    pub contains: Option<(String, Role)>,
}

impl ReactionQuery {
    /// Return `true` if `reaction` meets every condition.
    pub fn matches(&self, reaction: &Reaction) -> bool {
        if !self.formula.is_empty() && !reaction.formula_change().contains_all(&self.formula) {
            return false;
        }
        if !self.valence.is_empty() && !reaction.valence_change().contains_all(&self.valence) {
            return false;
        }
        if !self.hybridization.is_empty()
            && !reaction
                .hybridization_change()
                .contains_all(&self.hybridization)
        {
            return false;
        }
        if !self.rings.is_empty() && !reaction.ring_size_change().contains_all(&self.rings) {
            return false;
        }
        if !self.stereo.is_empty()
            && !reaction
                .stereo_change(self.well_defined_stereo, true, true)
                .contains_all(&self.stereo)
        {
            return false;
        }
        if let Some((inchi, role)) = &self.contains {
            if !reaction.contains_inchi(inchi, *role) {
                return false;
            }
        }
        if let Some(ring) = &self.ring_present {
            if !reaction.has_ring(ring) {
                return false;
            }
        }
        if self.isotopic && !reaction.has_isotopic_inchi() {
            return false;
        }
        true
    }
}

/// Return the positions of the RInChIs whose reactions match `query`, in
/// input order. RInChIs that cannot be decoded are logged and skipped.
pub fn search<S: AsRef<str> + Sync>(
    rinchis: &[S],
    query: &ReactionQuery,
    parallel_mode: ParallelMode,
) -> Vec<usize> {
    let check = |(i, rinchi): (usize, &S)| -> Option<usize> {
        match Reaction::from_rinchi(rinchi.as_ref()) {
            Ok(reaction) => query.matches(&reaction).then_some(i),
            Err(e) => {
                warn!("skipping line {}: {e}", i + 1);
                None
            }
        }
    };

    match parallel_mode {
        ParallelMode::None => rinchis.iter().enumerate().filter_map(check).collect(),
        ParallelMode::Always => rinchis
            .par_iter()
            .enumerate()
            .filter_map(check)
            .collect(),
    }
}

/// Which stereocentres [`group_by_stereo_change`] counts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StereoCount {
    pub well_defined: bool,
    pub sp2: bool,
    pub sp3: bool,
}

impl Default for StereoCount {
    fn default() -> Self {
        Self {
            well_defined: false,
            sp2: true,
            sp3: true,
        }
    }
}

impl StereoCount {
    fn count(&self, mols: &[Molecule]) -> i64 {
        mols.iter()
            .map(|m| {
                let centres = m.stereocentres(self.well_defined);
                let sp2 = if self.sp2 { centres.get(&Hybridization::Sp2) } else { 0 };
                let sp3 = if self.sp3 { centres.get(&Hybridization::Sp3) } else { 0 };
                sp2 + sp3
            })
            .sum()
    }

    /// Stereocentres gained across `reaction`, absolute without a known
    /// direction. `None` unless both sides are present and fully
    /// represented.
    fn change(&self, reaction: &Reaction) -> Option<i64> {
        let missing = reaction.no_structures();
        if reaction.reactants().is_empty()
            || reaction.products().is_empty()
            || missing.reactants != 0
            || missing.products != 0
        {
            return None;
        }

        let change = self.count(reaction.products()) - self.count(reaction.reactants());
        Some(if reaction.direction().is_directed() {
            change
        } else {
            change.abs()
        })
    }
}

/// Group the positions of the RInChIs by the number of stereocentres their
/// reactions create. Reactions whose change cannot be computed are left
/// out.
pub fn group_by_stereo_change<S: AsRef<str> + Sync>(
    rinchis: &[S],
    stereo: StereoCount,
    parallel_mode: ParallelMode,
) -> BTreeMap<i64, Vec<usize>> {
    let check = |(i, rinchi): (usize, &S)| -> Option<(i64, usize)> {
        match Reaction::from_rinchi(rinchi.as_ref()) {
            Ok(reaction) => stereo.change(&reaction).map(|change| (change, i)),
            Err(e) => {
                warn!("skipping line {}: {e}", i + 1);
                None
            }
        }
    };

    let changes: Vec<(i64, usize)> = match parallel_mode {
        ParallelMode::None => rinchis.iter().enumerate().filter_map(check).collect(),
        ParallelMode::Always => rinchis
            .par_iter()
            .enumerate()
            .filter_map(check)
            .collect(),
    };

    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (change, i) in changes {
        groups.entry(change).or_default().push(i);
    }
    groups
}
