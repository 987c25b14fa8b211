//! Reactions decoded from RInChI strings.
//!
//! A RInChI packs up to three groups of InChIs (joined by `<>`, components
//! joined by `!`) followed by an optional direction layer (`/d+`, `/d-`,
//! `/d=`) and an optional no-structure layer (`/u1-0-0`). The direction
//! decides which of the first two groups hold the reactants; the third
//! group always holds the agents.

use std::fmt::Display;

use bit_set::BitSet;
use clap::ValueEnum;
use log::debug;

use crate::{
    error::ParseError,
    histogram::Histogram,
    molecule::{Element, Hybridization, Molecule},
    rings::RingWord,
    vf2::Matcher,
};

/// Weight of a product/reactant difference in a reaction fingerprint.
const NON_AGENT_WEIGHT: i64 = 10;

/// Weight of an agent in a reaction fingerprint.
const AGENT_WEIGHT: i64 = 1;

/// Reaction direction as given by the `/d` layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// `/d+`: the first group reacts to give the second.
    Forward,
    /// `/d-`: the second group reacts to give the first.
    Backward,
    /// `/d=`
    Equilibrium,
    /// No direction layer.
    #[default]
    Unspecified,
}

impl Direction {
    /// Return `true` if reactants and products are known apart.
    pub fn is_directed(&self) -> bool {
        matches!(self, Direction::Forward | Direction::Backward)
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            Direction::Forward => "+",
            Direction::Backward => "-",
            Direction::Equilibrium => "=",
            Direction::Unspecified => "",
        };
        write!(f, "{c}")
    }
}

/// Number of structures in each role that the RInChI could not represent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct NoStructures {
    pub reactants: u32,
    pub products: u32,
    pub agents: u32,
}

/// The component InChIs of a RInChI, sorted into roles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RinchiParts {
    pub reactants: Vec<String>,
    pub products: Vec<String>,
    pub agents: Vec<String>,
    pub direction: Direction,
    pub no_structures: NoStructures,
}

/// Split a RInChI into the InChIs of its reactants, products and agents.
pub fn split_rinchi(rinchi: &str) -> Result<RinchiParts, ParseError> {
    let not_rinchi = || ParseError::NotARinchi(rinchi.to_string());

    let (version, mut body) = rinchi
        .trim()
        .strip_prefix("RInChI=")
        .and_then(|r| r.split_once('/'))
        .ok_or_else(not_rinchi)?;
    // "1.00.1S" carries the InChI version after the second dot.
    let inchi_version = version.splitn(3, '.').nth(2).ok_or_else(not_rinchi)?;

    let mut unknown = [0u32; 3];
    if let Some((rest, layer)) = body.rsplit_once("/u") {
        let counts: Vec<u32> = layer
            .split('-')
            .map(|n| n.parse().map_err(|_| not_rinchi()))
            .collect::<Result<_, _>>()?;
        if counts.len() != 3 {
            return Err(not_rinchi());
        }
        unknown.copy_from_slice(&counts);
        body = rest;
    }

    let mut direction = Direction::Unspecified;
    for (suffix, d) in [
        ("/d+", Direction::Forward),
        ("/d-", Direction::Backward),
        ("/d=", Direction::Equilibrium),
    ] {
        if let Some(rest) = body.strip_suffix(suffix) {
            body = rest;
            direction = d;
            break;
        }
    }

    let mut groups: Vec<Vec<String>> = body
        .split("<>")
        .map(|group| {
            group
                .split('!')
                .filter(|c| !c.is_empty())
                .map(|c| format!("InChI={inchi_version}/{c}"))
                .collect()
        })
        .collect();
    if groups.len() > 3 {
        return Err(not_rinchi());
    }
    groups.resize_with(3, Vec::new);

    let agents = groups.pop().unwrap_or_default();
    let second = groups.pop().unwrap_or_default();
    let first = groups.pop().unwrap_or_default();
    let (reactants, products, no_structures) = if direction == Direction::Backward {
        let ns = NoStructures {
            reactants: unknown[1],
            products: unknown[0],
            agents: unknown[2],
        };
        (second, first, ns)
    } else {
        let ns = NoStructures {
            reactants: unknown[0],
            products: unknown[1],
            agents: unknown[2],
        };
        (first, second, ns)
    };

    Ok(RinchiParts {
        reactants,
        products,
        agents,
        direction,
        no_structures,
    })
}

/// Produces a fixed-size fingerprint for a single molecule, e.g. by calling
/// out to a cheminformatics toolkit.
pub trait Fingerprinter {
    type Error;

    fn fingerprint(&self, inchi: &str) -> Result<BitSet, Self::Error>;
}

/// Rings and ring-bearing molecules gained across a reaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RingChange {
    pub cyclic_molecules: i64,
    pub rings: i64,
}

/// Substructures to look for in each role of a reaction.
#[derive(Debug, Clone)]
pub struct SubstructureQuery {
    pub reactants: Vec<Molecule>,
    pub products: Vec<Molecule>,
    pub agents: Vec<Molecule>,
    /// Each reaction molecule may satisfy at most one substructure.
    pub exclusive: bool,
    /// Reactant substructures must not be found among the products.
    pub reactant_disappears: bool,
    /// Product substructures must not be found among the reactants.
    pub product_appears: bool,
}

impl Default for SubstructureQuery {
    fn default() -> Self {
        Self {
            reactants: Vec::new(),
            products: Vec::new(),
            agents: Vec::new(),
            exclusive: true,
            reactant_disappears: false,
            product_appears: true,
        }
    }
}

impl SubstructureQuery {
    /// Build a query from substructure InChIs, with default flags.
    pub fn from_inchis(
        reactants: &[&str],
        products: &[&str],
        agents: &[&str],
    ) -> Result<Self, ParseError> {
        let parse = |inchis: &[&str]| -> Result<Vec<Molecule>, ParseError> {
            inchis.iter().map(|i| Molecule::from_inchi(i)).collect()
        };
        Ok(Self {
            reactants: parse(reactants)?,
            products: parse(products)?,
            agents: parse(agents)?,
            ..Self::default()
        })
    }
}

/// Where to look for an InChI inside a reaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Role {
    /// Reactants of a directed reaction.
    Reactant,
    /// Products of a directed reaction.
    Product,
    /// Either side of an equilibrium.
    Equilibrium,
    Agent,
    /// Any group, whatever the direction.
    Any,
}

/// A reaction whose every component has been decoded into a [`Molecule`].
#[derive(Debug, Clone)]
pub struct Reaction {
    rinchi: String,
    parts: RinchiParts,
    reactants: Vec<Molecule>,
    products: Vec<Molecule>,
    agents: Vec<Molecule>,
}

impl Reaction {
    /// Decode a RInChI. Composite InChIs are split so that every molecule
    /// is a single connected species; any malformed component rejects the
    /// whole reaction.
    pub fn from_rinchi(rinchi: &str) -> Result<Self, ParseError> {
        let parts = split_rinchi(rinchi)?;
        let build = |inchis: &[String]| -> Result<Vec<Molecule>, ParseError> {
            let mut out = Vec::new();
            for inchi in inchis {
                out.extend(Molecule::new_all(inchi)?);
            }
            Ok(out)
        };

        let reaction = Self {
            rinchi: rinchi.trim().to_string(),
            reactants: build(&parts.reactants)?,
            products: build(&parts.products)?,
            agents: build(&parts.agents)?,
            parts,
        };
        debug!(
            "reaction with {} reactants, {} products, {} agents",
            reaction.reactants.len(),
            reaction.products.len(),
            reaction.agents.len()
        );
        Ok(reaction)
    }

    pub fn rinchi(&self) -> &str {
        &self.rinchi
    }

    pub fn reactants(&self) -> &[Molecule] {
        &self.reactants
    }

    pub fn products(&self) -> &[Molecule] {
        &self.products
    }

    pub fn agents(&self) -> &[Molecule] {
        &self.agents
    }

    pub fn direction(&self) -> Direction {
        self.parts.direction
    }

    pub fn no_structures(&self) -> NoStructures {
        self.parts.no_structures
    }

    /// Iterate over reactants then products.
    fn participants(&self) -> impl Iterator<Item = &Molecule> {
        self.reactants.iter().chain(&self.products)
    }

    /// Return the change in a per-molecule histogram: summed over products
    /// minus summed over reactants. Without a known direction, counts are
    /// made absolute.
    pub fn change_across_reaction<K, F>(&self, f: F) -> Histogram<K>
    where
        K: Ord + Clone,
        F: Fn(&Molecule) -> Histogram<K>,
    {
        let sum = |mols: &[Molecule]| {
            let mut total = Histogram::new();
            for mol in mols {
                total.merge(&f(mol));
            }
            total
        };

        let change = sum(&self.products).difference(&sum(&self.reactants));
        if self.parts.direction.is_directed() {
            change
        } else {
            change.abs()
        }
    }

    pub fn formula_change(&self) -> Histogram<Element> {
        self.change_across_reaction(|m| m.formula().clone())
    }

    pub fn valence_change(&self) -> Histogram<Option<u32>> {
        self.change_across_reaction(Molecule::valence_histogram)
    }

    pub fn hybridization_change(&self) -> Histogram<Option<Hybridization>> {
        self.change_across_reaction(Molecule::hybridization_histogram)
    }

    /// Change in the number of rings of each size.
    pub fn ring_size_change(&self) -> Histogram<usize> {
        self.change_across_reaction(Molecule::ring_histogram)
    }

    /// Change in the number of rings of each element sequence.
    pub fn ring_word_change(&self) -> Histogram<RingWord> {
        self.change_across_reaction(Molecule::ring_histogram_with_elements)
    }

    /// Change in the total number of rings and of ring-bearing molecules.
    pub fn ring_change(&self) -> RingChange {
        let count = |mols: &[Molecule]| {
            mols.iter().fold(RingChange::default(), |acc, m| {
                let rings = m.rings().len() as i64;
                RingChange {
                    cyclic_molecules: acc.cyclic_molecules + i64::from(rings > 0),
                    rings: acc.rings + rings,
                }
            })
        };

        let (r, p) = (count(&self.reactants), count(&self.products));
        let mut change = RingChange {
            cyclic_molecules: p.cyclic_molecules - r.cyclic_molecules,
            rings: p.rings - r.rings,
        };
        if !self.parts.direction.is_directed() {
            change.cyclic_molecules = change.cyclic_molecules.abs();
            change.rings = change.rings.abs();
        }
        change
    }

    /// Return `true` if the predicate holds for any reactant or product.
    pub fn present_in_reaction(&self, f: impl Fn(&Molecule) -> bool) -> bool {
        self.participants().any(f)
    }

    /// Return `true` if `inchi` is one of the agents.
    pub fn is_agent(&self, inchi: &str) -> bool {
        let inchi = inchi.trim();
        self.agents.iter().any(|m| m.inchi() == Some(inchi))
    }

    /// Return `true` if `inchi` is one of the component InChIs of `role`,
    /// compared as written in the RInChI. Reactants and products are only
    /// known for a directed reaction, the equilibrium sides only for `/d=`.
    pub fn contains_inchi(&self, inchi: &str, role: Role) -> bool {
        let inchi = inchi.trim();
        let parts = &self.parts;
        let direction = parts.direction;
        let groups: Vec<&[String]> = match role {
            Role::Reactant if direction.is_directed() => vec![&parts.reactants],
            Role::Product if direction.is_directed() => vec![&parts.products],
            Role::Equilibrium if direction == Direction::Equilibrium => {
                vec![&parts.reactants, &parts.products]
            }
            Role::Agent => vec![&parts.agents],
            Role::Any => vec![&parts.reactants, &parts.products, &parts.agents],
            _ => Vec::new(),
        };
        groups.into_iter().flatten().any(|c| c == inchi)
    }

    /// Change in the number of stereocentres, keyed `Sp2` for double bonds
    /// and `Sp3` for tetrahedral centres. Kinds switched off are left out.
    pub fn stereo_change(
        &self,
        well_defined: bool,
        sp2: bool,
        sp3: bool,
    ) -> Histogram<Hybridization> {
        let wanted = |kind: &Hybridization| match kind {
            Hybridization::Sp2 => sp2,
            Hybridization::Sp3 => sp3,
            Hybridization::Sp => false,
        };
        self.change_across_reaction(|m| {
            Histogram::from_counts(
                m.stereocentres(well_defined)
                    .iter()
                    .filter(|(kind, _)| wanted(kind))
                    .map(|(kind, n)| (*kind, n)),
            )
        })
    }

    /// Return `true` if no element is gained or lost.
    pub fn is_balanced(&self) -> bool {
        self.formula_change().is_empty()
    }

    /// Return `true` if a reactant or product has a ring equivalent to
    /// `ring`.
    pub fn has_ring(&self, ring: &RingWord) -> bool {
        let ring = ring.canonical();
        self.present_in_reaction(|m| m.ring_histogram_with_elements().get(&ring) > 0)
    }

    /// Return `true` if any reactant or product carries an isotopic layer.
    pub fn has_isotopic_inchi(&self) -> bool {
        self.present_in_reaction(Molecule::has_isotopic_layer)
    }

    /// Return `true` if every substructure of the query is found in the
    /// matching role of this reaction.
    pub fn has_substructures(&self, query: &SubstructureQuery) -> bool {
        if !find_all(&query.reactants, &self.reactants, query.exclusive) {
            return false;
        }
        if query.reactant_disappears
            && !query.reactants.is_empty()
            && find_all(&query.reactants, &self.products, false)
        {
            return false;
        }

        if !find_all(&query.products, &self.products, query.exclusive) {
            return false;
        }
        if query.product_appears
            && !query.products.is_empty()
            && find_all(&query.products, &self.reactants, false)
        {
            return false;
        }

        find_all(&query.agents, &self.agents, query.exclusive)
    }

    /// Compute a difference fingerprint of `size` bits: ten times the
    /// per-bit sum over products minus reactants, plus the sum over agents.
    /// Molecules without an InChI are skipped.
    pub fn fingerprint<F: Fingerprinter>(
        &self,
        fingerprinter: &F,
        size: usize,
    ) -> Result<Vec<i64>, F::Error> {
        let sum = |mols: &[Molecule]| -> Result<Vec<i64>, F::Error> {
            let mut bits = vec![0; size];
            for inchi in mols.iter().filter_map(Molecule::inchi) {
                for bit in fingerprinter.fingerprint(inchi)?.iter() {
                    if let Some(count) = bits.get_mut(bit) {
                        *count += 1;
                    }
                }
            }
            Ok(bits)
        };

        let reactants = sum(&self.reactants)?;
        let products = sum(&self.products)?;
        let agents = sum(&self.agents)?;
        Ok((0..size)
            .map(|i| NON_AGENT_WEIGHT * (products[i] - reactants[i]) + AGENT_WEIGHT * agents[i])
            .collect())
    }
}

/// Look for every substructure in a distinct molecule of `layer`, or in any
/// molecule when `exclusive` is unset.
fn find_all(subs: &[Molecule], layer: &[Molecule], exclusive: bool) -> bool {
    let mut used = vec![false; layer.len()];
    subs.iter().all(|sub| {
        for (i, mol) in layer.iter().enumerate() {
            if exclusive && used[i] {
                continue;
            }
            if Matcher::new(sub, mol).is_sub() {
                used[i] = true;
                return true;
            }
        }
        false
    })
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    const ESTERIFICATION: &str = "RInChI=1.00.1S/C2H4O2/c1-2(3)4/h1H3,(H,3,4)!C2H6O/c1-2-3/h3H,2H2,1H3<>C4H8O2/c1-3-6-4(2)5/h3H2,1-2H3!H2O/h1H2/d+";
    const BROMINATION: &str = "RInChI=1.00.1S/Br2/c1-2!C6H6/c1-2-4-6-5-3-1/h1-6H<>BrH/h1H!C6H5Br/c7-6-4-2-1-3-5-6/h1-5H<>Br3Fe/c1-4(2)3/d+";
    const BENZENE: &str = "InChI=1S/C6H6/c1-2-4-6-5-3-1/h1-6H";

    #[test]
    fn split_forward() {
        let parts = split_rinchi(ESTERIFICATION).unwrap();
        assert_eq!(parts.direction, Direction::Forward);
        assert_eq!(
            parts.reactants,
            vec![
                "InChI=1S/C2H4O2/c1-2(3)4/h1H3,(H,3,4)",
                "InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3",
            ]
        );
        assert_eq!(
            parts.products,
            vec!["InChI=1S/C4H8O2/c1-3-6-4(2)5/h3H2,1-2H3", "InChI=1S/H2O/h1H2"]
        );
        assert!(parts.agents.is_empty());
        assert_eq!(parts.no_structures, NoStructures::default());
    }

    #[test]
    fn split_backward_swaps_groups() {
        let rinchi = "RInChI=1.00.1S/C2H6O/c1-2-3/h3H,2H2,1H3<>C2H4O/c1-2-3/h2H,1H3/d-/u0-1-0";
        let parts = split_rinchi(rinchi).unwrap();
        assert_eq!(parts.direction, Direction::Backward);
        assert_eq!(parts.reactants, vec!["InChI=1S/C2H4O/c1-2-3/h2H,1H3"]);
        assert_eq!(parts.products, vec!["InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3"]);
        assert_eq!(parts.no_structures.reactants, 1);
        assert_eq!(parts.no_structures.products, 0);
    }

    #[test]
    fn split_rejects_garbage() {
        assert!(matches!(
            split_rinchi("InChI=1S/H2O/h1H2"),
            Err(ParseError::NotARinchi(_))
        ));
        assert!(split_rinchi("RInChI=1.00/H2O").is_err());
        assert!(split_rinchi("RInChI=1.00.1S/H2O<>H2O<>H2O<>H2O").is_err());
        assert!(split_rinchi("RInChI=1.00.1S/H2O/u1-x-0").is_err());
    }

    #[test]
    fn balanced_reaction() {
        let reaction = Reaction::from_rinchi(ESTERIFICATION).unwrap();
        assert_eq!(reaction.reactants().len(), 2);
        assert_eq!(reaction.products().len(), 2);
        assert!(reaction.is_balanced());
    }

    #[test]
    fn formula_change_respects_direction() {
        let forward = "RInChI=1.00.1S/C2H4O2/c1-2(3)4/h1H3,(H,3,4)!C2H6O/c1-2-3/h3H,2H2,1H3<>C4H8O2/c1-3-6-4(2)5/h3H2,1-2H3/d+";
        let reaction = Reaction::from_rinchi(forward).unwrap();
        let change = reaction.formula_change();
        assert!(!reaction.is_balanced());
        assert_eq!(change.get(&Element::Hydrogen), -2);
        assert_eq!(change.get(&Element::Oxygen), -1);
        assert_eq!(change.get(&Element::Carbon), 0);

        let undirected = forward.trim_end_matches("/d+");
        let change = Reaction::from_rinchi(undirected).unwrap().formula_change();
        assert_eq!(change.get(&Element::Hydrogen), 2);
        assert_eq!(change.get(&Element::Oxygen), 1);
    }

    #[test]
    fn agents_and_rings() {
        let reaction = Reaction::from_rinchi(BROMINATION).unwrap();
        assert!(reaction.is_balanced());
        assert!(reaction.is_agent("InChI=1S/Br3Fe/c1-4(2)3"));
        assert!(!reaction.is_agent(BENZENE));

        assert!(reaction.has_ring(&"CCCCCC".parse().unwrap()));
        assert!(!reaction.has_ring(&"CCCCCN".parse().unwrap()));
        assert!(reaction.ring_size_change().is_empty());
        assert_eq!(reaction.ring_change(), RingChange::default());
        assert!(!reaction.has_isotopic_inchi());
    }

    #[test]
    fn hybridization_change() {
        // Ethanol oxidised to acetaldehyde turns an sp3 carbon into sp2.
        let rinchi = "RInChI=1.00.1S/C2H6O/c1-2-3/h3H,2H2,1H3<>C2H4O/c1-2-3/h2H,1H3/d+";
        let change = Reaction::from_rinchi(rinchi).unwrap().hybridization_change();
        assert_eq!(change.get(&Some(Hybridization::Sp3)), -1);
        assert_eq!(change.get(&Some(Hybridization::Sp2)), 1);
    }

    #[test]
    fn ring_formation() {
        let rinchi = "RInChI=1.00.1S/C6H14/c1-3-5-6-4-2/h3-6H2,1-2H3<>C6H12/c1-2-4-6-5-3-1/h1-6H2!H2/h1H/d+";
        let reaction = Reaction::from_rinchi(rinchi).unwrap();
        assert!(reaction.is_balanced());
        assert_eq!(reaction.ring_size_change().get(&6), 1);
        assert_eq!(
            reaction.ring_change(),
            RingChange {
                cyclic_molecules: 1,
                rings: 1
            }
        );
    }

    #[test]
    fn substructures() {
        let reaction = Reaction::from_rinchi(BROMINATION).unwrap();

        let query = SubstructureQuery::from_inchis(&[BENZENE], &[], &[]).unwrap();
        assert!(reaction.has_substructures(&query));

        // Benzene is already among the reactants, so it does not appear.
        let query = SubstructureQuery::from_inchis(&[], &[BENZENE], &[]).unwrap();
        assert!(!reaction.has_substructures(&query));
        let query = SubstructureQuery {
            product_appears: false,
            ..query
        };
        assert!(reaction.has_substructures(&query));

        // The ring survives the reaction.
        let query = SubstructureQuery {
            reactant_disappears: true,
            ..SubstructureQuery::from_inchis(&[BENZENE], &[], &[]).unwrap()
        };
        assert!(!reaction.has_substructures(&query));
    }

    #[test]
    fn exclusive_substructures() {
        let reaction = Reaction::from_rinchi(BROMINATION).unwrap();
        let query = SubstructureQuery::from_inchis(&[BENZENE, BENZENE], &[], &[]).unwrap();
        assert!(!reaction.has_substructures(&query));
        let query = SubstructureQuery {
            exclusive: false,
            ..query
        };
        assert!(reaction.has_substructures(&query));
    }

    #[test]
    fn inchi_lookup_by_role() {
        let ethanol = "InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3";
        let reaction = Reaction::from_rinchi(ESTERIFICATION).unwrap();
        assert!(reaction.contains_inchi(ethanol, Role::Reactant));
        assert!(!reaction.contains_inchi(ethanol, Role::Product));
        assert!(!reaction.contains_inchi(ethanol, Role::Equilibrium));
        assert!(!reaction.contains_inchi(ethanol, Role::Agent));
        assert!(reaction.contains_inchi(ethanol, Role::Any));

        let reaction = Reaction::from_rinchi(BROMINATION).unwrap();
        assert!(reaction.contains_inchi("InChI=1S/Br3Fe/c1-4(2)3", Role::Agent));

        let equilibrium = ESTERIFICATION.replace("/d+", "/d=");
        let reaction = Reaction::from_rinchi(&equilibrium).unwrap();
        assert!(reaction.contains_inchi(ethanol, Role::Equilibrium));

        let undirected = ESTERIFICATION.trim_end_matches("/d+");
        let reaction = Reaction::from_rinchi(undirected).unwrap();
        assert!(!reaction.contains_inchi(ethanol, Role::Reactant));
        assert!(!reaction.contains_inchi(ethanol, Role::Equilibrium));
        assert!(reaction.contains_inchi(ethanol, Role::Any));
    }

    #[test]
    fn stereo_change() {
        // Fixing the anomeric centre of glucose.
        let rinchi = "RInChI=1.00.1S/C6H12O6/c7-1-2-3(8)4(9)5(10)6(11)12-2/h2-11H,1H2/t2-,3-,4+,5-,6?/m1/s1<>C6H12O6/c7-1-2-3(8)4(9)5(10)6(11)12-2/h2-11H,1H2/t2-,3-,4+,5-,6-/m1/s1/d+";
        let reaction = Reaction::from_rinchi(rinchi).unwrap();
        assert!(reaction.stereo_change(false, true, true).is_empty());
        let change = reaction.stereo_change(true, true, true);
        assert_eq!(change.get(&Hybridization::Sp3), 1);
        assert!(reaction.stereo_change(true, true, false).is_empty());

        // Hydrogenating (E)-but-2-ene loses its double-bond stereo.
        let rinchi = "RInChI=1.00.1S/C4H8/c1-3-4-2/h3-4H,1-2H3/b4-3+!H2/h1H<>C4H10/c1-3-4-2/h3-4H2,1-2H3/d+";
        let reaction = Reaction::from_rinchi(rinchi).unwrap();
        assert_eq!(
            reaction.stereo_change(false, true, true),
            Histogram::from_counts([(Hybridization::Sp2, -1)])
        );
        assert!(reaction.stereo_change(false, false, true).is_empty());
    }

    struct ByContent;

    impl Fingerprinter for ByContent {
        type Error = Infallible;

        fn fingerprint(&self, inchi: &str) -> Result<BitSet, Self::Error> {
            let mut bits = BitSet::new();
            bits.insert(0);
            if inchi.contains("Br") {
                bits.insert(1);
            }
            Ok(bits)
        }
    }

    struct Failing;

    impl Fingerprinter for Failing {
        type Error = String;

        fn fingerprint(&self, inchi: &str) -> Result<BitSet, Self::Error> {
            Err(format!("cannot fingerprint {inchi}"))
        }
    }

    #[test]
    fn reaction_fingerprint() {
        let reaction = Reaction::from_rinchi(BROMINATION).unwrap();
        assert_eq!(reaction.fingerprint(&ByContent, 4), Ok(vec![1, 11, 0, 0]));
        assert!(reaction.fingerprint(&Failing, 4).is_err());
    }
}
