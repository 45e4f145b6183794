use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::logic::{Formula, Valuation};

use super::{expand, Branch, Expansion};

/// Bounds on a single search. The default is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(rename = "maxSteps")]
    pub max_steps: Option<usize>,
}

impl Limits {
    pub fn steps(max_steps: usize) -> Self {
        Self {
            max_steps: Some(max_steps),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum Verdict {
    /// Every branch closed.
    Unsatisfiable,
    /// A fully expanded open branch survived; `model` is read off its literals.
    Satisfiable { model: Valuation },
    /// The step cap was hit before the fixpoint.
    Aborted { steps: usize },
}

impl Verdict {
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, Verdict::Unsatisfiable)
    }

    pub fn model(&self) -> Option<&Valuation> {
        match self {
            Verdict::Satisfiable { model } => Some(model),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableauStats {
    pub generations: usize,
    pub expansions: usize,
    #[serde(rename = "closedBranches")]
    pub closed_branches: usize,
    #[serde(rename = "openBranches")]
    pub open_branches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Expanded,
    Fixpoint,
    Aborted,
}

/// Generation-by-generation driver. Each call to [`Tableau::step`] drops the
/// closed branches, expands every other branch that still has a non-literal
/// once, and keeps saturated open branches as they are.
#[derive(Debug, Clone)]
pub struct Tableau {
    branches: Vec<Branch>,
    limits: Limits,
    stats: TableauStats,
}

impl Tableau {
    pub fn new(formulas: Vec<Formula>) -> Self {
        Self::with_limits(formulas, Limits::default())
    }

    pub fn with_limits(formulas: Vec<Formula>, limits: Limits) -> Self {
        Self {
            branches: vec![Branch::new(formulas)],
            limits,
            stats: TableauStats::default(),
        }
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn stats(&self) -> &TableauStats {
        &self.stats
    }

    fn budget_left(&self) -> bool {
        match self.limits.max_steps {
            Some(max) => self.stats.expansions < max,
            None => true,
        }
    }

    pub fn step(&mut self) -> Progress {
        let current = std::mem::take(&mut self.branches);
        let mut next = Vec::with_capacity(current.len());
        let mut expanded = false;
        let mut pending = current.into_iter();

        while let Some(branch) = pending.next() {
            if let Some(atom) = branch.complementary_pair() {
                trace!("closed {} on {}", branch, atom);
                self.stats.closed_branches += 1;
                continue;
            }
            if !branch.is_fully_expanded() && !self.budget_left() {
                next.push(branch);
                next.extend(pending);
                self.branches = next;
                return Progress::Aborted;
            }
            match expand(branch) {
                Expansion::Saturated(b) => next.push(b),
                Expansion::Alpha { branch, .. } => {
                    self.stats.expansions += 1;
                    expanded = true;
                    next.push(branch);
                }
                Expansion::Beta { left, right, .. } => {
                    self.stats.expansions += 1;
                    expanded = true;
                    next.push(left);
                    next.push(right);
                }
            }
        }

        self.branches = next;
        self.stats.generations += 1;
        if expanded {
            Progress::Expanded
        } else {
            Progress::Fixpoint
        }
    }

    /// Runs to the fixpoint (or the step cap) and reports the verdict.
    pub fn run(&mut self) -> Verdict {
        loop {
            match self.step() {
                Progress::Expanded => continue,
                Progress::Fixpoint => break,
                Progress::Aborted => {
                    debug!("search aborted after {} steps", self.stats.expansions);
                    return Verdict::Aborted {
                        steps: self.stats.expansions,
                    };
                }
            }
        }

        self.stats.open_branches = self.branches.len();
        debug!(
            "tableau done: {} generations, {} expansions, {} closed, {} open",
            self.stats.generations,
            self.stats.expansions,
            self.stats.closed_branches,
            self.stats.open_branches
        );

        match self.branches.first() {
            None => Verdict::Unsatisfiable,
            Some(b) => Verdict::Satisfiable { model: b.model() },
        }
    }
}

/// True iff the formulas have no common model.
pub fn is_unsatisfiable(formulas: Vec<Formula>) -> bool {
    Tableau::new(formulas).run().is_unsatisfiable()
}
