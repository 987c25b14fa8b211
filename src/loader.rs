//! Split InChI identifiers into layers and parse the simple ones.
//!
//! An InChI is a `/`-separated list of layers: the version header, the
//! formula, then prefixed layers such as `c` (connectivity), `h`
//! (hydrogens), `b` and `t` (double-bond and tetrahedral stereo) and `i`
//! (isotopes). Composite InChIs describe several
//! disconnected components at once; [`split_composite`] turns them into one
//! InChI per component.

use crate::{
    error::{ParseError, MAX_ATOMS},
    histogram::Histogram,
    molecule::Element,
};

/// The layers of a single-component InChI that the molecular graph needs.
/// Each layer is given without its one-letter prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layers<'a> {
    pub version: &'a str,
    pub formula: &'a str,
    pub connectivity: Option<&'a str>,
    pub hydrogens: Option<&'a str>,
    pub stereo_bonds: Option<&'a str>,
    pub stereo_atoms: Option<&'a str>,
    pub isotopic: Option<&'a str>,
}

/// Parity of a stereocentre.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Parity {
    /// `+`
    Even,
    /// `-`
    Odd,
    /// `u`: the centre exists but its configuration is unknown.
    Unknown,
    /// `?`: the configuration was left out.
    Undefined,
}

impl Parity {
    /// Return `true` for `+` and `-`.
    pub fn is_well_defined(self) -> bool {
        matches!(self, Parity::Even | Parity::Odd)
    }
}

/// One entry of a `b` or `t` layer: the atoms it names (the two ends of a
/// double bond, or one tetrahedral centre) and its parity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StereoCentre {
    pub atoms: Vec<u32>,
    pub parity: Parity,
}

/// Fixed and mobile hydrogens decoded from an `h` layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrogenLayer {
    /// `(atom, proton count)` pairs.
    pub fixed: Vec<(u32, u32)>,
    /// Atoms sharing mobile protons.
    pub mobile: Vec<u32>,
}

/// Split an InChI into its layers. Only the first layer with a given prefix
/// is used, so the isotopic sublayers never shadow the main ones.
pub fn split_layers(inchi: &str) -> Result<Layers<'_>, ParseError> {
    let not_inchi = || ParseError::NotAnInchi(inchi.to_string());

    let body = inchi.trim().strip_prefix("InChI=").ok_or_else(not_inchi)?;
    let mut layers = body.split('/');
    let version = layers.next().filter(|v| !v.is_empty()).ok_or_else(not_inchi)?;
    let formula = layers.next().filter(|f| !f.is_empty()).ok_or_else(not_inchi)?;

    let mut out = Layers {
        version,
        formula,
        connectivity: None,
        hydrogens: None,
        stereo_bonds: None,
        stereo_atoms: None,
        isotopic: None,
    };
    for layer in layers {
        let slot = match layer.as_bytes().first() {
            Some(b'c') => &mut out.connectivity,
            Some(b'h') => &mut out.hydrogens,
            Some(b'b') => &mut out.stereo_bonds,
            Some(b't') => &mut out.stereo_atoms,
            Some(b'i') => &mut out.isotopic,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(&layer[1..]);
        }
    }
    Ok(out)
}

/// Return `true` if the InChI describes more than one component.
pub fn is_composite(inchi: &str) -> bool {
    if inchi.contains([';', '*']) {
        return true;
    }
    inchi
        .split('/')
        .nth(1)
        .is_some_and(|f| f.contains('.') || f.starts_with(|c: char| c.is_ascii_digit()))
}

/// Split a composite InChI into one InChI per component, expanding
/// stoichiometric multiples (`2C6H6` in the formula, `2*` in other layers).
/// A simple InChI is returned unchanged.
pub fn split_composite(inchi: &str) -> Result<Vec<String>, ParseError> {
    let inchi = inchi.trim();
    if !is_composite(inchi) {
        return Ok(vec![inchi.to_string()]);
    }

    let mut layers = inchi.split('/');
    let header = layers.next().ok_or_else(|| ParseError::NotAnInchi(inchi.to_string()))?;
    let formula = layers
        .next()
        .ok_or_else(|| ParseError::NotAnInchi(inchi.to_string()))?;

    // One column per layer, one row per component.
    let mut columns = vec![expand_multiples(formula.split('.'), |part| {
        let digits = part.len() - part.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        (digits > 0).then(|| (&part[..digits], &part[digits..]))
    })?];

    for layer in layers {
        let Some(prefix) = layer.chars().next() else {
            continue;
        };
        let body = &layer[prefix.len_utf8()..];
        let components = expand_multiples(body.split(';'), |part| part.split_once('*'))?;
        columns.push(
            components
                .into_iter()
                .map(|c| if c.is_empty() { c } else { format!("{prefix}{c}") })
                .collect(),
        );
    }

    let count = columns.iter().map(Vec::len).max().unwrap_or(0);
    Ok((0..count)
        .map(|i| {
            columns
                .iter()
                .filter_map(|column| column.get(i))
                .filter(|part| !part.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
        })
        .filter(|parts| !parts.is_empty())
        .map(|parts| format!("{header}/{}", parts.join("/")))
        .collect())
}

/// Repeat every part that `split_count` recognizes as `(count, part)`. At
/// most [`MAX_ATOMS`] parts come out.
fn expand_multiples<'a>(
    parts: impl Iterator<Item = &'a str>,
    split_count: impl Fn(&'a str) -> Option<(&'a str, &'a str)>,
) -> Result<Vec<String>, ParseError> {
    let too_many = |count| ParseError::TooManyAtoms {
        what: "component",
        count,
    };

    let mut out = Vec::new();
    for part in parts {
        let (n, body) = match split_count(part) {
            Some((count, body)) => {
                let n: u64 = match count.parse() {
                    Ok(n) => n,
                    Err(_) if !count.is_empty() && count.bytes().all(|b| b.is_ascii_digit()) => {
                        return Err(too_many(u64::MAX))
                    }
                    Err(_) => return Err(ParseError::BadAtomIndex(count.to_string())),
                };
                (n, body)
            }
            None => (1, part),
        };
        let total = (out.len() as u64).saturating_add(n);
        if total > MAX_ATOMS as u64 {
            return Err(too_many(total));
        }
        out.extend(std::iter::repeat(body.to_string()).take(n as usize));
    }
    Ok(out)
}

/// Parse a formula such as `C6H12O6` into element counts.
///
/// Heavy atoms are limited to [`MAX_ATOMS`] in total, hydrogens to four per
/// heavy atom plus two.
pub fn parse_formula(formula: &str) -> Result<Histogram<Element>, ParseError> {
    let malformed = || ParseError::MalformedFormula(formula.to_string());
    let limit = 4 * MAX_ATOMS as i64 + 2;

    let mut counts = Histogram::new();
    let mut chars = formula.chars().peekable();
    while let Some(c) = chars.next() {
        if !c.is_ascii_uppercase() {
            return Err(malformed());
        }
        let mut symbol = String::from(c);
        if let Some(&l) = chars.peek().filter(|l| l.is_ascii_lowercase()) {
            symbol.push(l);
            chars.next();
        }
        let mut digits = String::new();
        while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
            digits.push(d);
            chars.next();
        }

        let count = if digits.is_empty() {
            1
        } else {
            digits.parse::<i64>().unwrap_or(i64::MAX)
        };
        if count == 0 {
            return Err(malformed());
        }
        if count > limit {
            return Err(ParseError::TooManyAtoms {
                what: "element",
                count: count as u64,
            });
        }
        let element = symbol
            .parse::<Element>()
            .map_err(|_| ParseError::UnknownElement(symbol))?;
        counts.add_n(element, count);
    }

    if counts.is_empty() {
        return Err(malformed());
    }
    let heavy: i64 = counts
        .iter()
        .filter(|(e, _)| **e != Element::Hydrogen)
        .map(|(_, n)| n)
        .sum();
    if heavy > MAX_ATOMS as i64 {
        return Err(ParseError::TooManyAtoms {
            what: "heavy atom",
            count: heavy as u64,
        });
    }
    Ok(counts)
}

/// Parse a hydrogen layer such as `1-2H3,4H,(H,5,6)`.
///
/// Comma-separated atoms and atom ranges accumulate until an `H` suffix
/// assigns them a proton count (`H` alone means one). Parenthesized groups
/// list atoms that share mobile protons.
pub fn parse_hydrogen_layer(layer: &str) -> Result<HydrogenLayer, ParseError> {
    let bad = |reason| ParseError::MalformedHydrogenLayer {
        layer: layer.to_string(),
        reason,
    };

    let mut out = HydrogenLayer::default();

    // Pull the mobile groups out first.
    let mut fixed = String::new();
    let mut rest = layer;
    while let Some(open) = rest.find('(') {
        fixed.push_str(&rest[..open]);
        let close = rest[open..]
            .find(')')
            .map(|c| c + open)
            .ok_or_else(|| bad("unclosed mobile group"))?;
        parse_mobile_group(layer, &rest[open + 1..close], &mut out.mobile)?;
        rest = &rest[close + 1..];
    }
    fixed.push_str(rest);
    if fixed.contains(')') {
        return Err(bad("unbalanced parentheses"));
    }

    let mut pending = Vec::new();
    for entry in fixed.split(',').filter(|e| !e.is_empty()) {
        let (range, count) = match entry.split_once('H') {
            Some((range, count)) => (range, Some(count)),
            None => (entry, None),
        };
        pending.extend(parse_range(layer, range)?);

        if let Some(count) = count {
            let n = if count.is_empty() {
                1
            } else {
                count.parse().map_err(|_| bad("bad proton count"))?
            };
            out.fixed.extend(pending.drain(..).map(|atom| (atom, n)));
        }
    }
    if !pending.is_empty() {
        return Err(bad("atoms listed without a proton count"));
    }

    Ok(out)
}

/// Parse the inside of a mobile group, e.g. `H2,3,4` or `H-,1,2`.
fn parse_mobile_group(layer: &str, group: &str, mobile: &mut Vec<u32>) -> Result<(), ParseError> {
    let mut parts = group.split(',');
    if !parts.next().is_some_and(|head| head.starts_with('H')) {
        return Err(ParseError::MalformedHydrogenLayer {
            layer: layer.to_string(),
            reason: "mobile group must start with H",
        });
    }
    for part in parts {
        mobile.extend(parse_range(layer, part)?);
    }
    Ok(())
}

/// Parse `n` or `n-m` into the atoms it covers.
fn parse_range(layer: &str, range: &str) -> Result<Vec<u32>, ParseError> {
    let index = |s: &str| match s.parse::<u32>() {
        Ok(n) if n > 0 && n as usize <= MAX_ATOMS => Ok(n),
        _ => Err(ParseError::BadAtomIndex(s.to_string())),
    };

    match range.split_once('-') {
        Some((lo, hi)) => {
            let (lo, hi) = (index(lo)?, index(hi)?);
            if lo > hi {
                return Err(ParseError::MalformedHydrogenLayer {
                    layer: layer.to_string(),
                    reason: "descending atom range",
                });
            }
            Ok((lo..=hi).collect())
        }
        None => Ok(vec![index(range)?]),
    }
}

/// Parse a `b` layer (`4-3+,6-5-`) or a `t` layer (`2-,3-,4+,5-,6?`).
pub fn parse_stereo_layer(layer: &str) -> Result<Vec<StereoCentre>, ParseError> {
    let bad = |reason| ParseError::MalformedStereoLayer {
        layer: layer.to_string(),
        reason,
    };

    let mut out = Vec::new();
    for entry in layer.split(',').filter(|e| !e.is_empty()) {
        let Some(last) = entry.chars().last() else {
            continue;
        };
        let parity = match last {
            '+' => Parity::Even,
            '-' => Parity::Odd,
            'u' => Parity::Unknown,
            '?' => Parity::Undefined,
            _ => return Err(bad("entry without a parity")),
        };
        let centre = &entry[..entry.len() - last.len_utf8()];
        if centre.is_empty() {
            return Err(bad("parity without an atom"));
        }
        let atoms = centre
            .split('-')
            .map(|a| match a.parse::<u32>() {
                Ok(n) if n > 0 && n as usize <= MAX_ATOMS => Ok(n),
                _ => Err(ParseError::BadAtomIndex(a.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if atoms.len() > 2 {
            return Err(bad("more than two atoms in one entry"));
        }
        out.push(StereoCentre { atoms, parity });
    }
    Ok(out)
}

/// Parse an isotopic layer into `(atom, tag)` pairs, e.g. `1+1,3D` gives
/// `(1, "+1")` and `(3, "D")`. Entries without a leading atom number are
/// skipped.
pub fn parse_isotopic_layer(layer: &str) -> Result<Vec<(u32, String)>, ParseError> {
    let mut out = Vec::new();
    for entry in layer.split(',') {
        let digits = entry.len() - entry.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            continue;
        }
        let index = entry[..digits]
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| ParseError::BadAtomIndex(entry[..digits].to_string()))?;
        out.push((index, entry[digits..].to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_of_benzene() {
        let layers = split_layers("InChI=1S/C6H6/c1-2-4-6-5-3-1/h1-6H").unwrap();
        assert_eq!(layers.version, "1S");
        assert_eq!(layers.formula, "C6H6");
        assert_eq!(layers.connectivity, Some("1-2-4-6-5-3-1"));
        assert_eq!(layers.hydrogens, Some("1-6H"));
        assert_eq!(layers.stereo_atoms, None);
        assert_eq!(layers.isotopic, None);
    }

    #[test]
    fn stereo_layers_are_kept() {
        let glucose = "InChI=1S/C6H12O6/c7-1-2-3(8)4(9)5(10)6(11)12-2/h2-11H,1H2/t2-,3-,4+,5-,6?/m1/s1";
        let layers = split_layers(glucose).unwrap();
        assert_eq!(layers.stereo_atoms, Some("2-,3-,4+,5-,6?"));
        assert_eq!(layers.stereo_bonds, None);

        let butene = split_layers("InChI=1S/C4H8/c1-3-4-2/h3-4H,1-2H3/b4-3+").unwrap();
        assert_eq!(butene.stereo_bonds, Some("4-3+"));
    }

    #[test]
    fn stereo_entries() {
        let centres = parse_stereo_layer("2-,3-,4+,5-,6?").unwrap();
        let parities: Vec<Parity> = centres.iter().map(|c| c.parity).collect();
        assert_eq!(
            parities,
            vec![Parity::Odd, Parity::Odd, Parity::Even, Parity::Odd, Parity::Undefined]
        );
        assert_eq!(centres[4].atoms, vec![6]);
        assert_eq!(centres.iter().filter(|c| c.parity.is_well_defined()).count(), 4);

        let bonds = parse_stereo_layer("4-3+,7-6u").unwrap();
        assert_eq!(bonds[0].atoms, vec![4, 3]);
        assert_eq!(bonds[1].parity, Parity::Unknown);

        assert!(parse_stereo_layer("").unwrap().is_empty());
        assert!(parse_stereo_layer("2x").is_err());
        assert!(parse_stereo_layer("+").is_err());
        assert!(parse_stereo_layer("1-2-3+").is_err());
    }

    #[test]
    fn not_an_inchi() {
        assert!(matches!(
            split_layers("C6H6/c1-2"),
            Err(ParseError::NotAnInchi(_))
        ));
        assert!(matches!(
            split_layers("InChI=1S"),
            Err(ParseError::NotAnInchi(_))
        ));
    }

    #[test]
    fn formula() {
        let f = parse_formula("C6H12O6").unwrap();
        assert_eq!(f.get(&Element::Carbon), 6);
        assert_eq!(f.get(&Element::Hydrogen), 12);
        assert_eq!(f.get(&Element::Oxygen), 6);

        let f = parse_formula("CH3Cl").unwrap();
        assert_eq!(f.get(&Element::Carbon), 1);
        assert_eq!(f.get(&Element::Chlorine), 1);

        assert!(matches!(
            parse_formula("Xx2"),
            Err(ParseError::UnknownElement(_))
        ));
        assert!(matches!(
            parse_formula("2C"),
            Err(ParseError::MalformedFormula(_))
        ));
        assert!(parse_formula("").is_err());
    }

    #[test]
    fn hydrogen_ranges_and_counts() {
        let h = parse_hydrogen_layer("1-2H3,3,5H,4H2").unwrap();
        assert_eq!(h.fixed, vec![(1, 3), (2, 3), (3, 1), (5, 1), (4, 2)]);
        assert!(h.mobile.is_empty());
    }

    #[test]
    fn hydrogen_mobile_groups() {
        let h = parse_hydrogen_layer("1H3,(H,3,4)").unwrap();
        assert_eq!(h.fixed, vec![(1, 3)]);
        assert_eq!(h.mobile, vec![3, 4]);

        let h = parse_hydrogen_layer("(H2,1,2,3)").unwrap();
        assert!(h.fixed.is_empty());
        assert_eq!(h.mobile, vec![1, 2, 3]);
    }

    #[test]
    fn hydrogen_errors() {
        assert!(parse_hydrogen_layer("1H3,(H,3").is_err());
        assert!(parse_hydrogen_layer("1,2").is_err());
        assert!(parse_hydrogen_layer("3-1H").is_err());
        assert!(parse_hydrogen_layer("(3,4)").is_err());
        assert!(parse_hydrogen_layer("1Hx").is_err());
    }

    #[test]
    fn composite_splitting() {
        let parts = split_composite("InChI=1S/2C2H6O.Na/c2*1-2-3;/h2*3H,2H2,1H3;").unwrap();
        assert_eq!(
            parts,
            vec![
                "InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3",
                "InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3",
                "InChI=1S/Na",
            ]
        );
    }

    #[test]
    fn huge_multipliers_are_rejected() {
        for inchi in [
            "InChI=1S/1000000000000000000C.Na",
            "InChI=1S/10000000000C.Na",
            "InChI=1S/CH4.Na/c;/h99999999999*1H4;",
            "InChI=1S/600CH4.600Na",
        ] {
            assert!(
                matches!(
                    split_composite(inchi),
                    Err(ParseError::TooManyAtoms { what: "component", .. })
                ),
                "{inchi}"
            );
        }
        assert_eq!(split_composite("InChI=1S/1024Na").unwrap().len(), 1024);
    }

    #[test]
    fn huge_counts_are_rejected() {
        assert!(matches!(
            parse_formula("C100000000000000000000"),
            Err(ParseError::TooManyAtoms { what: "element", .. })
        ));
        assert!(matches!(
            parse_formula("C1000N1000"),
            Err(ParseError::TooManyAtoms { what: "heavy atom", .. })
        ));
        assert!(parse_formula("C1000H2002").is_ok());
        assert!(matches!(
            parse_hydrogen_layer("1-4000000000H"),
            Err(ParseError::BadAtomIndex(_))
        ));
    }

    #[test]
    fn simple_inchi_is_not_split() {
        let inchi = "InChI=1S/C6H6/c1-2-4-6-5-3-1/h1-6H";
        assert!(!is_composite(inchi));
        assert_eq!(split_composite(inchi).unwrap(), vec![inchi.to_string()]);
    }

    #[test]
    fn isotopes() {
        assert_eq!(
            parse_isotopic_layer("1+1,3D,hD").unwrap(),
            vec![(1, "+1".to_string()), (3, "D".to_string())]
        );
    }
}
