//! Decode the connectivity (`/c`) layer of an InChI into an edge list.
//!
//! The layer is a chain of 1-based atom numbers joined by `-`, with branches
//! in parentheses and comma-separated branch lists for atoms of higher
//! degree, e.g. `1-2(3,4)5-6(7)8`. A repeated atom number closes a ring.
//!
//! Decoding works by rewriting a token stream. Comma-free groups are
//! collapsed to a placeholder, which exposes each comma branch to the atom
//! that owns it; adjacent atoms of the raw chain give the remaining bonds;
//! finally every group is collapsed innermost first, and the atoms on either
//! side of a placeholder are joined. Every rewrite phase is bounded by
//! [`REWRITE_LIMIT`].

use std::collections::HashSet;

use log::trace;

use crate::error::{ParseError, REWRITE_LIMIT};

/// An undirected bond between two 1-based atom indices, stored as
/// `(min, max)`.
pub type Edge = (u32, u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Token {
    Atom(u32),
    Dash,
    Open,
    Close,
    Comma,
    /// A group that has already been resolved.
    Collapsed,
}

impl Token {
    /// Tokens allowed inside a group that contains no nested group.
    fn is_chain(&self) -> bool {
        matches!(self, Token::Atom(_) | Token::Dash | Token::Collapsed)
    }
}

/// Parse a connectivity layer (without its leading `c`) into an ordered,
/// duplicate-free edge list.
///
/// An empty layer is valid and yields no edges. Edges come out in the order
/// they are discovered: comma branches first, then chain neighbors, then
/// bonds across resolved groups.
pub fn parse_connectivity(layer: &str) -> Result<Vec<Edge>, ParseError> {
    let tokens = tokenize(layer)?;
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut edges = EdgeList::new(layer);

    resolve_branch_lists(layer, &tokens, &mut edges)?;

    // Consecutive atoms joined by '-' or '(' are bonded.
    for w in tokens.windows(3) {
        if let [Token::Atom(a), Token::Dash | Token::Open, Token::Atom(b)] = w {
            edges.push(*a, *b)?;
        }
    }

    resolve_groups(layer, tokens, &mut edges)?;

    trace!("connectivity {layer:?} -> {} edges", edges.edges.len());
    Ok(edges.edges)
}

/// Accumulates normalized edges, preserving first-discovery order.
struct EdgeList<'a> {
    layer: &'a str,
    edges: Vec<Edge>,
    seen: HashSet<Edge>,
}

impl<'a> EdgeList<'a> {
    fn new(layer: &'a str) -> Self {
        Self {
            layer,
            edges: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn push(&mut self, a: u32, b: u32) -> Result<(), ParseError> {
        if a == b {
            return Err(ParseError::MalformedConnectivity {
                layer: self.layer.to_string(),
                reason: "atom bonded to itself",
            });
        }
        let edge = (a.min(b), a.max(b));
        if self.seen.insert(edge) {
            self.edges.push(edge);
        }
        Ok(())
    }
}

fn malformed(layer: &str, reason: &'static str) -> ParseError {
    ParseError::MalformedConnectivity {
        layer: layer.to_string(),
        reason,
    }
}

fn tokenize(layer: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut chars = layer.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        let token = match c {
            '0'..='9' => {
                let mut digits = String::from(c);
                while let Some(&(_, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    chars.next();
                }
                match digits.parse::<u32>() {
                    Ok(n) if n > 0 => Token::Atom(n),
                    _ => return Err(ParseError::BadAtomIndex(digits)),
                }
            }
            '-' => Token::Dash,
            '(' => {
                depth += 1;
                Token::Open
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed(layer, "unbalanced parentheses"))?;
                Token::Close
            }
            ',' if depth > 0 => Token::Comma,
            ',' => return Err(malformed(layer, "branch list outside parentheses")),
            found => {
                return Err(ParseError::UnexpectedCharacter {
                    layer: "connectivity",
                    found,
                    offset,
                })
            }
        };
        tokens.push(token);
    }

    if depth != 0 {
        return Err(malformed(layer, "unbalanced parentheses"));
    }
    if !tokens.is_empty() && !matches!(tokens[0], Token::Atom(_)) {
        return Err(malformed(layer, "layer must start with an atom"));
    }
    Ok(tokens)
}

/// Make one left-to-right pass replacing every innermost group with
/// [`Token::Collapsed`]. Groups containing commas are only collapsed when
/// `with_commas` is set. Returns `None` if nothing was collapsed.
fn collapse_groups(tokens: &[Token], with_commas: bool) -> Option<Vec<Token>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut changed = false;
    let mut i = 0;

    while i < tokens.len() {
        if tokens[i] == Token::Open {
            let mut k = i + 1;
            while k < tokens.len()
                && (tokens[k].is_chain() || (with_commas && tokens[k] == Token::Comma))
            {
                k += 1;
            }
            if k > i + 1 && tokens.get(k) == Some(&Token::Close) {
                out.push(Token::Collapsed);
                changed = true;
                i = k + 1;
                continue;
            }
        }
        out.push(tokens[i]);
        i += 1;
    }

    changed.then_some(out)
}

/// Emit one bond per comma branch: in `a(...,b`, atom `a` owns the branch
/// starting at `b`.
fn resolve_branch_lists(
    layer: &str,
    tokens: &[Token],
    edges: &mut EdgeList,
) -> Result<(), ParseError> {
    // Hide comma-free groups so that each branch list sits directly after
    // the atom that owns it.
    let mut work = tokens.to_vec();
    let mut rewrites = 0;
    while let Some(next) = collapse_groups(&work, false) {
        work = next;
        rewrites += 1;
        if rewrites > REWRITE_LIMIT {
            return Err(ParseError::RewriteLimit {
                phase: "plain groups",
            });
        }
    }

    let mut rewrites = 0;
    while work.contains(&Token::Comma) {
        rewrites += 1;
        if rewrites > REWRITE_LIMIT {
            return Err(ParseError::RewriteLimit {
                phase: "branch lists",
            });
        }

        // Find `Atom Open chain+ Comma Atom`, bond the two atoms and drop the
        // comma with its first atom.
        let mut removed = vec![false; work.len()];
        for i in 0..work.len() {
            let (Token::Atom(a), Some(Token::Open)) = (work[i], work.get(i + 1)) else {
                continue;
            };
            let mut k = i + 2;
            while k < work.len() && work[k].is_chain() {
                k += 1;
            }
            if k == i + 2 {
                continue;
            }
            if let (Some(Token::Comma), Some(Token::Atom(b))) = (work.get(k), work.get(k + 1)) {
                edges.push(a, *b)?;
                removed[k] = true;
                removed[k + 1] = true;
            }
        }
        if !removed.contains(&true) {
            return Err(malformed(layer, "branch list without a branching atom"));
        }

        work = work
            .into_iter()
            .zip(removed)
            .filter_map(|(t, r)| (!r).then_some(t))
            .collect();
        if let Some(next) = collapse_groups(&work, false) {
            work = next;
        }
    }

    Ok(())
}

/// Collapse groups innermost first, joining the atoms on either side of each
/// resolved group.
fn resolve_groups(
    layer: &str,
    mut work: Vec<Token>,
    edges: &mut EdgeList,
) -> Result<(), ParseError> {
    let mut rewrites = 0;
    while work.contains(&Token::Open) {
        rewrites += 1;
        if rewrites > REWRITE_LIMIT {
            return Err(ParseError::RewriteLimit { phase: "groups" });
        }
        work = collapse_groups(&work, true)
            .ok_or_else(|| malformed(layer, "group cannot be resolved"))?;
        for w in work.windows(3) {
            if let [Token::Atom(a), Token::Collapsed, Token::Atom(b)] = w {
                edges.push(*a, *b)?;
            }
        }
    }
    Ok(())
}
