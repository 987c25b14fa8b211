//! Errors raised while decoding identifier layers.

use thiserror::Error;

/// Upper bound on rewrite passes for any phase of connectivity or layer
/// resolution. Well-formed identifiers never come close to it.
pub const REWRITE_LIMIT: usize = 100;

/// Largest number of heavy atoms, components or stoichiometric copies a
/// single identifier may describe. Standard InChI stops at 1023 atoms.
pub const MAX_ATOMS: usize = 1024;

/// Thrown when an InChI, RInChI, or one of their layers does not follow the
/// expected grammar. Only the offending molecule (or reaction) is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected character {found:?} at offset {offset} in {layer} layer")]
    UnexpectedCharacter {
        layer: &'static str,
        found: char,
        offset: usize,
    },

    #[error("{0:?} is not a valid atom index")]
    BadAtomIndex(String),

    #[error("connectivity layer {layer:?} is malformed: {reason}")]
    MalformedConnectivity { layer: String, reason: &'static str },

    #[error("exceeded {REWRITE_LIMIT} rewrites while resolving {phase}")]
    RewriteLimit { phase: &'static str },

    #[error("unknown element symbol {0:?}")]
    UnknownElement(String),

    #[error("formula {0:?} is malformed")]
    MalformedFormula(String),

    #[error("hydrogen layer {layer:?} is malformed: {reason}")]
    MalformedHydrogenLayer { layer: String, reason: &'static str },

    #[error("stereo layer {layer:?} is malformed: {reason}")]
    MalformedStereoLayer { layer: String, reason: &'static str },

    #[error("atom {index} referenced by the {layer} layer does not exist")]
    AtomOutOfRange { index: u32, layer: &'static str },

    #[error("{0:?} is not an InChI")]
    NotAnInchi(String),

    #[error("{0:?} has several components; split it with Molecule::new_all")]
    CompositeInchi(String),

    #[error("{what} count {count} exceeds the limit of {MAX_ATOMS}")]
    TooManyAtoms { what: &'static str, count: u64 },

    #[error("{0:?} is not a RInChI")]
    NotARinchi(String),
}
