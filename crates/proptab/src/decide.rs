use std::fmt;

use log::debug;
use serde::Serialize;

use crate::{
    engine::{Limits, Tableau, TableauStats, Verdict},
    logic::Formula,
    parse::{parse_prop_formula, ParseErr, ParseResult},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecideErr {
    Parse(ParseErr),
    /// Number of expansions performed before giving up
    Aborted(usize),
}

impl From<ParseErr> for DecideErr {
    fn from(e: ParseErr) -> Self {
        DecideErr::Parse(e)
    }
}

impl fmt::Display for DecideErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecideErr::Parse(e) => fmt::Display::fmt(e, f),
            DecideErr::Aborted(steps) => {
                write!(f, "Search aborted after {} expansion steps", steps)
            }
        }
    }
}

impl std::error::Error for DecideErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecideErr::Parse(e) => Some(e),
            DecideErr::Aborted(_) => None,
        }
    }
}

/// A finished search together with what it cost. For a tautology check the
/// model of a satisfiable verdict falsifies the input formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub formula: Formula,
    pub verdict: Verdict,
    pub stats: TableauStats,
}

fn run(formula: Formula, root: Formula, limits: Limits) -> Outcome {
    let mut tableau = Tableau::with_limits(vec![root], limits);
    let verdict = tableau.run();
    Outcome {
        formula,
        verdict,
        stats: *tableau.stats(),
    }
}

/// φ is a tautology iff every branch of the tableau for {~φ} closes.
pub fn formula_is_tautology(formula: &Formula) -> bool {
    Tableau::new(vec![Formula::not(formula.clone())])
        .run()
        .is_unsatisfiable()
}

pub fn formula_is_satisfiable(formula: &Formula) -> bool {
    !Tableau::new(vec![formula.clone()]).run().is_unsatisfiable()
}

pub fn is_tautology(formula: &str) -> ParseResult<bool> {
    let parsed = parse_prop_formula(formula)?;
    let res = formula_is_tautology(&parsed);
    debug!("{} is {}a tautology", parsed, if res { "" } else { "not " });
    Ok(res)
}

pub fn is_satisfiable(formula: &str) -> ParseResult<bool> {
    let parsed = parse_prop_formula(formula)?;
    let res = formula_is_satisfiable(&parsed);
    debug!("{} is {}satisfiable", parsed, if res { "" } else { "not " });
    Ok(res)
}

/// Like [`is_tautology`] but reports the countermodel and search statistics.
pub fn check_tautology(formula: &str, limits: Limits) -> ParseResult<Outcome> {
    let parsed = parse_prop_formula(formula)?;
    let root = Formula::not(parsed.clone());
    Ok(run(parsed, root, limits))
}

pub fn check_satisfiable(formula: &str, limits: Limits) -> ParseResult<Outcome> {
    let parsed = parse_prop_formula(formula)?;
    let root = parsed.clone();
    Ok(run(parsed, root, limits))
}

/// Bounded tautology check; an exhausted budget is an error, not an answer.
pub fn tautology_within(formula: &str, limits: Limits) -> Result<bool, DecideErr> {
    match check_tautology(formula, limits)?.verdict {
        Verdict::Unsatisfiable => Ok(true),
        Verdict::Satisfiable { .. } => Ok(false),
        Verdict::Aborted { steps } => Err(DecideErr::Aborted(steps)),
    }
}
