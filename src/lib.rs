// Molecule definition: atoms, elements, derived histograms
pub mod molecule;

// Connectivity layer decoding
pub mod connectivity;

// Data IO: InChI layers, formulas, hydrogens, isotopes, composites
pub mod loader;

// Minimum cycle basis and ring words
pub mod rings;

// Subgraph matching
pub mod vf2;

// Counted multisets
pub mod histogram;

// Reactions from RInChIs
pub mod reaction;

// Querying many reactions at once
pub mod search;

// Parse errors
pub mod error;
