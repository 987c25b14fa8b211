use std::{
    fmt::Display,
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::info;
use rinchi_graph::{
    histogram::Histogram,
    molecule::{Element, Molecule},
    reaction::{Reaction, Role},
    rings::RingWord,
    search::{group_by_stereo_change, search, ParallelMode, ReactionQuery, StereoCount},
    vf2::Matcher,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace). Ignored if RUST_LOG is set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the graph facts of a single-component InChI.
    Molecule {
        inchi: String,

        /// Also print the graph in Graphviz dot format.
        #[arg(long)]
        dot: bool,
    },

    /// Look for a pattern molecule inside a master molecule.
    Match {
        pattern: String,
        master: String,

        /// Count every embedding instead of stopping at the first.
        #[arg(short, long)]
        count: bool,
    },

    /// Summarise the changes across one reaction.
    Reaction { rinchi: String },

    /// Filter a file of RInChIs, one per line, and print the matches as CSV.
    Search {
        path: PathBuf,

        /// Required change in element counts, e.g. `H=-2`.
        #[arg(long, value_parser = parse_change::<Element>)]
        formula: Vec<(Element, i64)>,

        /// Required change in ring counts by size, e.g. `6=1`.
        #[arg(long, value_parser = parse_change::<usize>)]
        rings: Vec<(usize, i64)>,

        /// A ring that a reactant or product must contain, e.g. `CCCCCN`.
        #[arg(long)]
        ring: Option<RingWord>,

        /// Only keep reactions with an isotopically labelled molecule.
        #[arg(long)]
        isotopic: bool,

        /// Only keep reactions with this component InChI.
        #[arg(long)]
        contains: Option<String>,

        /// Where `--contains` must find its InChI.
        #[arg(long, value_enum, default_value_t = Role::Any, requires = "contains")]
        role: Role,

        #[arg(long, value_enum, default_value_t = ParallelMode::Always)]
        parallel: ParallelMode,
    },

    /// Group a file of RInChIs by the stereocentres each reaction creates.
    Stereo {
        path: PathBuf,

        /// Skip stereocentres of unknown or omitted parity.
        #[arg(long)]
        well_defined: bool,

        /// Do not count double-bond stereo.
        #[arg(long)]
        no_sp2: bool,

        /// Do not count tetrahedral stereo.
        #[arg(long)]
        no_sp3: bool,

        #[arg(long, value_enum, default_value_t = ParallelMode::Always)]
        parallel: ParallelMode,
    },
}

fn read_rinchis(path: &Path) -> Result<String> {
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    if text.lines().all(|l| l.trim().is_empty()) {
        bail!("{} has no reactions", path.display());
    }
    Ok(text)
}

/// Parse `KEY=COUNT` into a histogram entry.
fn parse_change<K>(s: &str) -> Result<(K, i64), String>
where
    K: FromStr,
    K::Err: Display,
{
    let (key, count) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=COUNT, got {s:?}"))?;
    let key = key.parse().map_err(|e| format!("{key:?}: {e}"))?;
    let count = count.parse().map_err(|e| format!("{count:?}: {e}"))?;
    Ok((key, count))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    if std::env::var("RUST_LOG").is_err() {
        let filter = format!("rinchi_graph={level}");
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
    } else {
        env_logger::init();
    }
}

fn describe_molecule(inchi: &str, dot: bool) -> Result<()> {
    let mol = Molecule::from_inchi(inchi).with_context(|| format!("cannot read {inchi}"))?;

    println!("formula: {}", mol.formula());
    println!("atoms: {}", mol.atom_count());
    println!("bonds: {}", mol.bond_count());
    println!("rings: {}", mol.ring_histogram());
    println!("ring words: {}", mol.ring_histogram_with_elements());
    println!("valence: {:?}", mol.valence_histogram());
    println!("hybridization: {:?}", mol.hybridization_histogram());
    println!("stereocentres: {}", mol.stereocentres(false));
    if dot {
        println!("{}", mol.info());
    }
    Ok(())
}

fn match_molecules(pattern: &str, master: &str, count: bool) -> Result<()> {
    let pattern = Molecule::from_inchi(pattern).context("cannot read pattern")?;
    let master = Molecule::from_inchi(master).context("cannot read master")?;
    let matcher = Matcher::new(&pattern, &master);

    if count {
        println!("{}", matcher.sub_count());
    } else {
        match matcher.embeddings().next() {
            Some(mapping) => {
                for (p, m) in mapping.pairs() {
                    println!("{p} -> {m}");
                }
            }
            None => println!("no match"),
        }
    }
    Ok(())
}

fn describe_reaction(rinchi: &str) -> Result<()> {
    let reaction = Reaction::from_rinchi(rinchi).context("cannot read reaction")?;
    let rings = reaction.ring_change();

    println!("direction: {:?}", reaction.direction());
    println!("reactants: {}", reaction.reactants().len());
    println!("products: {}", reaction.products().len());
    println!("agents: {}", reaction.agents().len());
    println!("balanced: {}", reaction.is_balanced());
    println!("formula change: {}", reaction.formula_change());
    println!("ring change: {}", reaction.ring_size_change());
    println!("stereo change: {}", reaction.stereo_change(false, true, true));
    println!(
        "cyclic molecules change: {}, rings change: {}",
        rings.cyclic_molecules, rings.rings
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Molecule { inchi, dot } => describe_molecule(&inchi, dot),
        Command::Match {
            pattern,
            master,
            count,
        } => match_molecules(&pattern, &master, count),
        Command::Reaction { rinchi } => describe_reaction(&rinchi),
        Command::Search {
            path,
            formula,
            rings,
            ring,
            isotopic,
            contains,
            role,
            parallel,
        } => {
            let text = read_rinchis(&path)?;
            let rinchis: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

            let query = ReactionQuery {
                formula: Histogram::from_counts(formula),
                rings: Histogram::from_counts(rings),
                isotopic,
                ring_present: ring,
                contains: contains.map(|inchi| (inchi, role)),
                ..ReactionQuery::default()
            };
            let hits = search(&rinchis, &query, parallel);
            info!("{} of {} reactions matched", hits.len(), rinchis.len());

            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record(["index", "rinchi"])?;
            for i in hits {
                writer.write_record([i.to_string().as_str(), rinchis[i]])?;
            }
            writer.flush()?;
            Ok(())
        }
        Command::Stereo {
            path,
            well_defined,
            no_sp2,
            no_sp3,
            parallel,
        } => {
            let text = read_rinchis(&path)?;
            let rinchis: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

            let stereo = StereoCount {
                well_defined,
                sp2: !no_sp2,
                sp3: !no_sp3,
            };
            let groups = group_by_stereo_change(&rinchis, stereo, parallel);

            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record(["change", "index", "rinchi"])?;
            for (change, indices) in groups {
                for i in indices {
                    writer.write_record([
                        change.to_string().as_str(),
                        i.to_string().as_str(),
                        rinchis[i],
                    ])?;
                }
            }
            writer.flush()?;
            Ok(())
        }
    }
}
