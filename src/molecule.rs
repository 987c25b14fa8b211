//! Graph-theoretic representation of a molecule.
//!
//! A [`Molecule`] is built from the layers of a standard InChI: the formula
//! fixes which element sits at each canonical atom number, the connectivity
//! layer supplies the bonds, and the hydrogen, stereo and isotopic layers
//! decorate individual atoms. Hydrogen atoms are not nodes of the graph; they are
//! counted as protons on the heavy atom that carries them.

use std::{cell::OnceCell, fmt::Display, str::FromStr};

use log::debug;
use petgraph::{
    algo::connected_components,
    dot::Dot,
    graph::{Graph, NodeIndex},
    Undirected,
};
use thiserror::Error;

use crate::{
    connectivity::{parse_connectivity, Edge},
    error::{ParseError, MAX_ATOMS},
    histogram::Histogram,
    loader::{self, Parity},
    rings::{self, Ring, RingWord},
};

pub(crate) type Index = u32;
pub(crate) type MGraph = Graph<Atom, (), Undirected, Index>;

/// Thrown by [`Element::from_str`] if the string does not represent a valid
/// chemical element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("not a chemical element symbol")]
pub struct ParseElementError;

macro_rules! periodic_table {
    ( $(($element:ident, $name:literal),)* ) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        /// Represents a chemical element.
        pub enum Element {
            $( $element, )*
        }

        impl Element {
            /// Return the element's symbol, e.g. `"Cl"`.
            pub fn symbol(&self) -> &'static str {
                match &self {
                    $( Element::$element => $name, )*
                }
            }
        }

        impl FromStr for Element {
            type Err = ParseElementError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(Element::$element), )*
                    _ => Err(ParseElementError),
                }
            }
        }
    };
}

impl Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

periodic_table!(
    (Hydrogen, "H"),
    (Helium, "He"),
    (Lithium, "Li"),
    (Beryllium, "Be"),
    (Boron, "B"),
    (Carbon, "C"),
    (Nitrogen, "N"),
    (Oxygen, "O"),
    (Fluorine, "F"),
    (Neon, "Ne"),
    (Sodium, "Na"),
    (Magnesium, "Mg"),
    (Aluminum, "Al"),
    (Silicon, "Si"),
    (Phosphorus, "P"),
    (Sulfur, "S"),
    (Chlorine, "Cl"),
    (Argon, "Ar"),
    (Potassium, "K"),
    (Calcium, "Ca"),
    (Scandium, "Sc"),
    (Titanium, "Ti"),
    (Vanadium, "V"),
    (Chromium, "Cr"),
    (Manganese, "Mn"),
    (Iron, "Fe"),
    (Cobalt, "Co"),
    (Nickel, "Ni"),
    (Copper, "Cu"),
    (Zinc, "Zn"),
    (Gallium, "Ga"),
    (Germanium, "Ge"),
    (Arsenic, "As"),
    (Selenium, "Se"),
    (Bromine, "Br"),
    (Krypton, "Kr"),
    (Rubidium, "Rb"),
    (Strontium, "Sr"),
    (Yttrium, "Y"),
    (Zirconium, "Zr"),
    (Niobium, "Nb"),
    (Molybdenum, "Mo"),
    (Technetium, "Tc"),
    (Ruthenium, "Ru"),
    (Rhodium, "Rh"),
    (Palladium, "Pd"),
    (Silver, "Ag"),
    (Cadmium, "Cd"),
    (Indium, "In"),
    (Tin, "Sn"),
    (Antimony, "Sb"),
    (Tellurium, "Te"),
    (Iodine, "I"),
    (Xenon, "Xe"),
    (Cesium, "Cs"),
    (Barium, "Ba"),
    (Lanthanum, "La"),
    (Cerium, "Ce"),
    (Praseodymium, "Pr"),
    (Neodymium, "Nd"),
    (Promethium, "Pm"),
    (Samarium, "Sm"),
    (Europium, "Eu"),
    (Gadolinium, "Gd"),
    (Terbium, "Tb"),
    (Dysprosium, "Dy"),
    (Holmium, "Ho"),
    (Erbium, "Er"),
    (Thulium, "Tm"),
    (Ytterbium, "Yb"),
    (Lutetium, "Lu"),
    (Hafnium, "Hf"),
    (Tantalum, "Ta"),
    (Wolfram, "W"),
    (Rhenium, "Re"),
    (Osmium, "Os"),
    (Iridium, "Ir"),
    (Platinum, "Pt"),
    (Gold, "Au"),
    (Mercury, "Hg"),
    (Thallium, "Tl"),
    (Lead, "Pb"),
    (Bismuth, "Bi"),
    (Polonium, "Po"),
    (Astatine, "At"),
    (Radon, "Rn"),
    (Francium, "Fr"),
    (Radium, "Ra"),
    (Actinium, "Ac"),
    (Thorium, "Th"),
    (Protactinium, "Pa"),
    (Uranium, "U"),
    (Neptunium, "Np"),
    (Plutonium, "Pu"),
    (Americium, "Am"),
    (Curium, "Cm"),
    (Berkelium, "Bk"),
    (Californium, "Cf"),
    (Einsteinium, "Es"),
    (Fermium, "Fm"),
    (Mendelevium, "Md"),
    (Nobelium, "No"),
    (Lawrencium, "Lr"),
    (Rutherfordium, "Rf"),
    (Dubnium, "Db"),
    (Seaborgium, "Sg"),
    (Bohrium, "Bh"),
    (Hassium, "Hs"),
    (Meitnerium, "Mt"),
    (Darmstadtium, "Ds"),
    (Roentgenium, "Rg"),
    (Copernicium, "Cn"),
    (Nihonium, "Nh"),
    (Flerovium, "Fl"),
    (Moscovium, "Mc"),
    (Livermorium, "Lv"),
    (Tennessine, "Ts"),
    (Oganesson, "Og"),
);

/// Carbon hybridization inferred from the number of bonds plus protons.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hybridization {
    Sp,
    Sp2,
    Sp3,
}

impl Display for Hybridization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hybridization::Sp => write!(f, "sp"),
            Hybridization::Sp2 => write!(f, "sp2"),
            Hybridization::Sp3 => write!(f, "sp3"),
        }
    }
}

/// What the subgraph matcher needs to know about a node.
pub trait AtomLike {
    fn element(&self) -> Element;
    fn hybridization(&self) -> Option<Hybridization>;
}

/// The nodes of a [`Molecule`] graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    index: u32,
    element: Element,
    bonds: Vec<u32>,
    protons: u32,
    mobile_protons: bool,
    isotope: Option<String>,
}

impl Atom {
    /// Construct an unbonded [`Atom`] with canonical number `index`.
    pub fn new(index: u32, element: Element) -> Self {
        Self {
            index,
            element,
            bonds: Vec::new(),
            protons: 0,
            mobile_protons: false,
            isotope: None,
        }
    }

    /// Return this atom's 1-based canonical number.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Return the canonical numbers of the bonded heavy atoms, ascending.
    pub fn bonds(&self) -> &[u32] {
        &self.bonds
    }

    /// Return the number of fixed (non-mobile) hydrogens on this atom.
    pub fn protons(&self) -> u32 {
        self.protons
    }

    /// Return `true` if this atom takes part in a mobile-hydrogen group.
    pub fn has_mobile_protons(&self) -> bool {
        self.mobile_protons
    }

    /// Return the isotopic-layer tag of this atom, if any.
    pub fn isotope(&self) -> Option<&str> {
        self.isotope.as_deref()
    }

    /// Return bonds plus protons, or `None` when mobile protons make the
    /// count ambiguous.
    pub fn valence(&self) -> Option<u32> {
        (!self.mobile_protons).then(|| self.bonds.len() as u32 + self.protons)
    }
}

impl AtomLike for Atom {
    fn element(&self) -> Element {
        self.element
    }

    /// Only defined for carbon.
    fn hybridization(&self) -> Option<Hybridization> {
        if self.element != Element::Carbon {
            return None;
        }
        match self.valence()? {
            4 => Some(Hybridization::Sp3),
            3 => Some(Hybridization::Sp2),
            2 => Some(Hybridization::Sp),
            _ => None,
        }
    }
}

/// A simple, loopless graph of heavy atoms.
///
/// The graph is fixed once constructed. The ring list is computed on first
/// use and cached; everything else is derived on demand.
#[derive(Debug, Clone)]
pub struct Molecule {
    inchi: Option<String>,
    graph: MGraph,
    formula: Histogram<Element>,
    isotopic: bool,
    stereo: Vec<(Hybridization, Parity)>,
    rings: OnceCell<Vec<Ring>>,
}

impl Molecule {
    /// Build a molecule from a single-component standard InChI.
    pub fn from_inchi(inchi: &str) -> Result<Self, ParseError> {
        let inchi = inchi.trim();
        if loader::is_composite(inchi) {
            return Err(ParseError::CompositeInchi(inchi.to_string()));
        }
        let layers = loader::split_layers(inchi)?;

        let mut mol = Self::from_layers(layers.formula, layers.connectivity, layers.hydrogens)?;
        if let Some(layer) = layers.stereo_bonds {
            mol.apply_stereo(Hybridization::Sp2, layer)?;
        }
        if let Some(layer) = layers.stereo_atoms {
            mol.apply_stereo(Hybridization::Sp3, layer)?;
        }
        if let Some(isotopic) = layers.isotopic {
            mol.apply_isotopes(isotopic)?;
        }
        mol.inchi = Some(inchi.to_string());
        Ok(mol)
    }

    /// Build one molecule per component of a possibly composite InChI (salts,
    /// mixtures, stoichiometric multiples).
    pub fn new_all(inchi: &str) -> Result<Vec<Self>, ParseError> {
        loader::split_composite(inchi)?
            .iter()
            .map(|component| Self::from_inchi(component))
            .collect()
    }

    /// Build a molecule from already extracted layers: the formula (e.g.
    /// `C6H6`), the connectivity layer without its `c` prefix, and the
    /// hydrogen layer without its `h` prefix.
    pub fn from_layers(
        formula: &str,
        connectivity: Option<&str>,
        hydrogens: Option<&str>,
    ) -> Result<Self, ParseError> {
        let formula = loader::parse_formula(formula)?;
        let elements = assign_elements(&formula)?;

        let mut edges = match connectivity {
            Some(layer) => parse_connectivity(layer)?,
            None => Vec::new(),
        };
        // Two heavy atoms and no connectivity layer can only be bonded to
        // each other.
        if edges.is_empty() && elements.len() == 2 {
            edges.push((1, 2));
        }

        let mut mol = Self::build(formula, &elements, &edges)?;
        if let Some(layer) = hydrogens {
            mol.apply_hydrogens(&loader::parse_hydrogen_layer(layer)?)?;
        }
        Ok(mol)
    }

    /// Build a hand-made molecule: atom `i + 1` has element `elements[i]`.
    /// No hydrogens are attached.
    pub fn from_edges(elements: &[Element], edges: &[Edge]) -> Result<Self, ParseError> {
        let formula = elements.iter().copied().collect();
        Self::build(formula, elements, edges)
    }

    fn build(
        formula: Histogram<Element>,
        elements: &[Element],
        edges: &[Edge],
    ) -> Result<Self, ParseError> {
        let mut graph = MGraph::with_capacity(elements.len(), edges.len());
        for (i, element) in elements.iter().enumerate() {
            graph.add_node(Atom::new(i as u32 + 1, *element));
        }

        for &(a, b) in edges {
            let u = node_of(&graph, a, "connectivity")?;
            let v = node_of(&graph, b, "connectivity")?;
            if u == v {
                return Err(ParseError::MalformedConnectivity {
                    layer: format!("{a}-{b}"),
                    reason: "atom bonded to itself",
                });
            }
            if graph.find_edge(u, v).is_none() {
                graph.add_edge(u, v, ());
            }
        }

        // Each bond appears in the neighbor list of both of its atoms.
        for ix in graph.node_indices() {
            let mut bonds: Vec<u32> = graph.neighbors(ix).map(|n| n.index() as u32 + 1).collect();
            bonds.sort_unstable();
            graph[ix].bonds = bonds;
        }

        debug!(
            "built molecule with {} atoms and {} bonds",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            inchi: None,
            graph,
            formula,
            isotopic: false,
            stereo: Vec::new(),
            rings: OnceCell::new(),
        })
    }

    fn apply_hydrogens(&mut self, layer: &loader::HydrogenLayer) -> Result<(), ParseError> {
        for &(index, count) in &layer.fixed {
            let ix = node_of(&self.graph, index, "hydrogen")?;
            self.graph[ix].protons = count;
        }
        for &index in &layer.mobile {
            let ix = node_of(&self.graph, index, "hydrogen")?;
            self.graph[ix].mobile_protons = true;
        }
        Ok(())
    }

    fn apply_stereo(&mut self, kind: Hybridization, layer: &str) -> Result<(), ParseError> {
        for centre in loader::parse_stereo_layer(layer)? {
            for &index in &centre.atoms {
                node_of(&self.graph, index, "stereo")?;
            }
            self.stereo.push((kind, centre.parity));
        }
        Ok(())
    }

    fn apply_isotopes(&mut self, layer: &str) -> Result<(), ParseError> {
        self.isotopic = true;
        for (index, tag) in loader::parse_isotopic_layer(layer)? {
            let ix = node_of(&self.graph, index, "isotopic")?;
            self.graph[ix].isotope = Some(tag);
        }
        Ok(())
    }

    /// Return a representation of this molecule as an `MGraph`.
    pub(crate) fn graph(&self) -> &MGraph {
        &self.graph
    }

    /// Return the InChI this molecule was built from, if any.
    pub fn inchi(&self) -> Option<&str> {
        self.inchi.as_deref()
    }

    /// Return a pretty-printable representation of this molecule.
    pub fn info(&self) -> String {
        let dot = Dot::new(&self.graph);
        format!("{dot:?}")
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Return the atom with canonical number `index`.
    pub fn atom(&self, index: u32) -> Option<&Atom> {
        let ix = index.checked_sub(1)?;
        self.graph.node_weight(NodeIndex::new(ix as usize))
    }

    /// Iterate over atoms in canonical order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.graph.node_weights()
    }

    /// Return the bonds as `(min, max)` pairs of canonical numbers, in the
    /// order the connectivity layer produced them.
    pub fn edges(&self) -> Vec<Edge> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(u, v)| {
                let (a, b) = (u.index() as u32 + 1, v.index() as u32 + 1);
                (a.min(b), a.max(b))
            })
            .collect()
    }

    /// Return the chemical formula, hydrogen included.
    pub fn formula(&self) -> &Histogram<Element> {
        &self.formula
    }

    /// Count atoms by valence; atoms with mobile protons count under `None`.
    pub fn valence_histogram(&self) -> Histogram<Option<u32>> {
        self.atoms().map(Atom::valence).collect()
    }

    /// Count atoms by hybridization; non-carbon atoms and carbons of
    /// unknown valence count under `None`.
    pub fn hybridization_histogram(&self) -> Histogram<Option<Hybridization>> {
        self.atoms().map(Atom::hybridization).collect()
    }

    /// Count stereocentres: double bonds of the `b` layer under `Sp2`,
    /// tetrahedral centres of the `t` layer under `Sp3`. With
    /// `well_defined`, centres of unknown or omitted parity are left out.
    pub fn stereocentres(&self, well_defined: bool) -> Histogram<Hybridization> {
        self.stereo
            .iter()
            .filter(|(_, parity)| !well_defined || parity.is_well_defined())
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Return `true` if the InChI carried an isotopic layer.
    pub fn has_isotopic_layer(&self) -> bool {
        self.isotopic
    }

    /// Return `true` unless the graph falls apart into several pieces.
    pub fn is_connected(&self) -> bool {
        connected_components(&self.graph) <= 1
    }

    /// Return the number of independent cycles, `|E| - |V| + 1` for a
    /// connected molecule.
    pub fn ring_count_target(&self) -> usize {
        rings::ring_count_target(self)
    }

    /// Return the minimum cycle basis, computing it on first use.
    pub fn rings(&self) -> &[Ring] {
        self.rings.get_or_init(|| rings::minimum_cycle_basis(self))
    }

    /// Return one ring per back edge of a depth-first spanning tree.
    pub fn fundamental_rings(&self) -> Vec<Ring> {
        rings::fundamental_rings(self)
    }

    /// Count rings by size.
    pub fn ring_histogram(&self) -> Histogram<usize> {
        self.rings().iter().map(Ring::len).collect()
    }

    /// Count rings by their canonical element sequence, e.g. `CCCCCN` for a
    /// pyridine ring.
    pub fn ring_histogram_with_elements(&self) -> Histogram<RingWord> {
        self.rings().iter().map(|r| r.word(self).canonical()).collect()
    }
}

fn node_of(graph: &MGraph, index: u32, layer: &'static str) -> Result<NodeIndex<Index>, ParseError> {
    match index.checked_sub(1) {
        Some(ix) if (ix as usize) < graph.node_count() => Ok(NodeIndex::new(ix as usize)),
        _ => Err(ParseError::AtomOutOfRange { index, layer }),
    }
}

/// Expand a formula into the element of each canonical atom number: carbon
/// first, then the other heavy elements alphabetically. A formula with no
/// heavy atom is a single hydrogen. More than [`MAX_ATOMS`] heavy atoms is
/// an error.
pub fn assign_elements(formula: &Histogram<Element>) -> Result<Vec<Element>, ParseError> {
    let mut heavy: Vec<(Element, i64)> = formula
        .iter()
        .filter(|(e, n)| **e != Element::Hydrogen && *n > 0)
        .map(|(e, n)| (*e, n))
        .collect();
    if heavy.is_empty() {
        return Ok(vec![Element::Hydrogen]);
    }

    let total = heavy.iter().fold(0u64, |acc, (_, n)| acc.saturating_add(*n as u64));
    if total > MAX_ATOMS as u64 {
        return Err(ParseError::TooManyAtoms {
            what: "heavy atom",
            count: total,
        });
    }

    heavy.sort_by_key(|(e, _)| (*e != Element::Carbon, e.symbol()));
    Ok(heavy
        .into_iter()
        .flat_map(|(e, n)| std::iter::repeat(e).take(n as usize))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_to_string() {
        assert!(Element::Hydrogen.to_string() == "H")
    }

    #[test]
    fn element_from_string() {
        assert!(str::parse("H") == Ok(Element::Hydrogen));
        assert!(str::parse::<Element>("Foo").is_err());
    }

    #[test]
    fn element_order_is_carbon_then_alphabetical() {
        let formula = loader::parse_formula("C2H3ClNOS").unwrap();
        assert_eq!(
            assign_elements(&formula).unwrap(),
            vec![
                Element::Carbon,
                Element::Carbon,
                Element::Chlorine,
                Element::Nitrogen,
                Element::Oxygen,
                Element::Sulfur,
            ]
        );

        let formula = loader::parse_formula("H2O4S").unwrap();
        assert_eq!(
            assign_elements(&formula).unwrap(),
            vec![
                Element::Oxygen,
                Element::Oxygen,
                Element::Oxygen,
                Element::Oxygen,
                Element::Sulfur,
            ]
        );
    }

    #[test]
    fn oversized_formulas_are_rejected() {
        let mut formula = Histogram::new();
        formula.add_n(Element::Carbon, 10_000_000_000);
        assert!(matches!(
            assign_elements(&formula),
            Err(ParseError::TooManyAtoms { what: "heavy atom", .. })
        ));
        assert!(Molecule::from_layers("C2000", None, None).is_err());
        assert!(Molecule::new_all("InChI=1S/1000000000000000000C.Na").is_err());
    }

    #[test]
    fn hydrogen_only_formula() {
        let mol = Molecule::from_inchi("InChI=1S/H2/h1H").unwrap();
        assert_eq!(mol.atom_count(), 1);
        assert_eq!(mol.atom(1).map(Atom::element), Some(Element::Hydrogen));
    }

    #[test]
    fn ethanol() {
        let mol = Molecule::from_inchi("InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3").unwrap();
        assert_eq!(mol.edges(), vec![(1, 2), (2, 3)]);
        let elements: Vec<_> = mol.atoms().map(Atom::element).collect();
        assert_eq!(elements, vec![Element::Carbon, Element::Carbon, Element::Oxygen]);
        assert_eq!(mol.atom(1).map(Atom::protons), Some(3));
        assert_eq!(mol.atom(3).map(Atom::protons), Some(1));
        assert_eq!(mol.formula().get(&Element::Hydrogen), 6);

        let valence = mol.valence_histogram();
        assert_eq!(valence.get(&Some(4)), 2);
        assert_eq!(valence.get(&Some(2)), 1);

        let hyb = mol.hybridization_histogram();
        assert_eq!(hyb.get(&Some(Hybridization::Sp3)), 2);
        assert_eq!(hyb.get(&None), 1);
        assert!(mol.ring_histogram().is_empty());
    }

    #[test]
    fn mobile_protons_make_valence_unknown() {
        // Acetic acid: the acidic proton moves between both oxygens.
        let mol = Molecule::from_inchi("InChI=1S/C2H4O2/c1-2(3)4/h1H3,(H,3,4)").unwrap();
        assert_eq!(mol.atom(3).and_then(Atom::valence), None);
        assert_eq!(mol.atom(4).and_then(Atom::valence), None);
        assert_eq!(mol.atom(2).and_then(Atom::valence), Some(3));
        assert_eq!(mol.atom(2).and_then(Atom::hybridization), Some(Hybridization::Sp2));
        assert_eq!(mol.valence_histogram().get(&None), 2);
    }

    #[test]
    fn water_has_no_bonds_and_no_rings() {
        let mol = Molecule::from_inchi("InChI=1S/H2O/h1H2").unwrap();
        assert_eq!(mol.atom_count(), 1);
        assert!(mol.edges().is_empty());
        assert!(mol.ring_histogram().is_empty());
        assert!(mol.ring_histogram_with_elements().is_empty());
        assert_eq!(mol.atom(1).and_then(Atom::valence), Some(2));
    }

    #[test]
    fn diatomic_without_connectivity_is_bonded() {
        let mol = Molecule::from_inchi("InChI=1S/CO/c1-2").unwrap();
        assert_eq!(mol.edges(), vec![(1, 2)]);
        let mol = Molecule::from_inchi("InChI=1S/O2/c1-2").unwrap();
        assert_eq!(mol.edges(), vec![(1, 2)]);
        let mol = Molecule::from_inchi("InChI=1S/ClH/h1H").unwrap();
        assert_eq!(mol.atom_count(), 1);
        let mol = Molecule::from_inchi("InChI=1S/N2/c1-2").unwrap();
        assert_eq!(mol.bond_count(), 1);
        let mol = Molecule::from_layers("N2", None, None).unwrap();
        assert_eq!(mol.edges(), vec![(1, 2)]);
    }

    #[test]
    fn edge_round_trip() {
        let cyclic = [(1, 2), (2, 3), (3, 4), (1, 4), (4, 5)];
        let acyclic = [(1, 2), (2, 3), (2, 4), (4, 5)];
        for edges in [&cyclic[..], &acyclic[..]] {
            let mol = Molecule::from_edges(&[Element::Carbon; 5], edges).unwrap();
            assert_eq!(mol.edges(), edges.to_vec());
            assert_eq!(mol.bond_count(), edges.len());
        }
    }

    #[test]
    fn duplicate_edges_are_merged() {
        let mol = Molecule::from_edges(&[Element::Carbon; 3], &[(1, 2), (2, 1), (2, 3)]).unwrap();
        assert_eq!(mol.edges(), vec![(1, 2), (2, 3)]);
        assert_eq!(mol.atom(2).map(Atom::bonds), Some(&[1, 3][..]));
    }

    #[test]
    fn out_of_range_atoms_are_rejected() {
        assert!(matches!(
            Molecule::from_layers("C2H6", Some("1-3"), None),
            Err(ParseError::AtomOutOfRange { index: 3, .. })
        ));
        assert!(matches!(
            Molecule::from_layers("C2H6", Some("1-2"), Some("1-3H3")),
            Err(ParseError::AtomOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn composite_inchi_needs_splitting() {
        let salt = "InChI=1S/C2H4O2.Na/c1-2(3)4;/h1H3,(H,3,4);/q;+1/p-1";
        assert!(matches!(
            Molecule::from_inchi(salt),
            Err(ParseError::CompositeInchi(_))
        ));
        let parts = Molecule::new_all(salt).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].atom_count(), 4);
        assert_eq!(parts[1].atom(1).map(Atom::element), Some(Element::Sodium));
    }

    const GLUCOSE: &str = "InChI=1S/C6H12O6/c7-1-2-3(8)4(9)5(10)6(11)12-2/h2-11H,1H2/t2-,3-,4+,5-,6?/m1/s1";

    #[test]
    fn glucose_stereocentres() {
        let mol = Molecule::from_inchi(GLUCOSE).unwrap();
        let all = mol.stereocentres(false);
        assert_eq!(all.get(&Hybridization::Sp3), 5);
        assert_eq!(all.get(&Hybridization::Sp2), 0);
        // The anomeric centre is left undefined.
        assert_eq!(mol.stereocentres(true).get(&Hybridization::Sp3), 4);
    }

    #[test]
    fn double_bond_stereo() {
        let mol = Molecule::from_inchi("InChI=1S/C4H8/c1-3-4-2/h3-4H,1-2H3/b4-3+").unwrap();
        assert_eq!(
            mol.stereocentres(true),
            Histogram::from_counts([(Hybridization::Sp2, 1)])
        );
        assert!(Molecule::from_inchi("InChI=1S/C4H8/c1-3-4-2/h3-4H,1-2H3")
            .unwrap()
            .stereocentres(false)
            .is_empty());
        assert!(matches!(
            Molecule::from_inchi("InChI=1S/C4H8/c1-3-4-2/h3-4H,1-2H3/b5-3+"),
            Err(ParseError::AtomOutOfRange { index: 5, .. })
        ));
    }

    #[test]
    fn isotopic_layer() {
        let mol = Molecule::from_inchi("InChI=1S/CH4O/c1-2/h2H,1H3/i1+1").unwrap();
        assert!(mol.has_isotopic_layer());
        assert_eq!(mol.atom(1).and_then(Atom::isotope), Some("+1"));
        assert_eq!(mol.atom(2).and_then(Atom::isotope), None);
    }
}
