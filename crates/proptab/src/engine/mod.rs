//! Signed analytic tableaux over [`Formula`].
//!
//! Signs are carried by explicit `Not` nodes. A branch is expanded by
//! removing its leftmost non-literal and appending what the matching rule
//! derives from it:
//!
//! | formula      | rule  | derived                |
//! |--------------|-------|------------------------|
//! | `~~A`        | alpha | `A`                    |
//! | `A & B`      | alpha | `A`, `B`               |
//! | `~(A \| B)`  | alpha | `~A`, `~B`             |
//! | `~(A -> B)`  | alpha | `A`, `~B`              |
//! | `A \| B`     | beta  | `A` / `B`              |
//! | `~(A & B)`   | beta  | `~A` / `~B`            |
//! | `A -> B`     | beta  | `~A` / `B`             |

use std::{collections::BTreeSet, fmt};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::logic::{Formula, Lit, Valuation};

pub mod search;


pub use search::{Limits, Tableau, TableauStats, Verdict};

/// A sequence of formulas assumed to hold simultaneously.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Branch(Vec<Formula>);

impl Branch {
    pub fn new(formulas: Vec<Formula>) -> Self {
        Self(formulas)
    }

    pub fn formulas(&self) -> &[Formula] {
        &self.0
    }

    pub fn literals(&self) -> impl Iterator<Item = Lit> + '_ {
        self.0.iter().filter_map(Formula::as_lit)
    }

    /// Smallest atom occurring both positively and negatively on the branch.
    pub fn complementary_pair(&self) -> Option<char> {
        let mut pos = BTreeSet::new();
        let mut neg = BTreeSet::new();
        for lit in self.literals() {
            if lit.negated {
                neg.insert(lit.name);
            } else {
                pos.insert(lit.name);
            }
        }
        pos.intersection(&neg).next().copied()
    }

    pub fn is_closed(&self) -> bool {
        self.complementary_pair().is_some()
    }

    /// Index of the leftmost formula that is not a literal.
    pub fn first_expandable(&self) -> Option<usize> {
        self.0.iter().position(|f| !f.is_literal())
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.first_expandable().is_none()
    }

    /// Reads the literals of the branch as a partial assignment. Only
    /// meaningful for open branches.
    pub fn model(&self) -> Valuation {
        self.literals().map(|l| (l.name, !l.negated)).collect()
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

impl From<Vec<Formula>> for Branch {
    fn from(formulas: Vec<Formula>) -> Self {
        Self(formulas)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    DoubleNeg,
    And,
    NotOr,
    NotImp,
    Or,
    NotAnd,
    Imp,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rule::DoubleNeg => "~~",
            Rule::And => "&",
            Rule::NotOr => "~|",
            Rule::NotImp => "~->",
            Rule::Or => "|",
            Rule::NotAnd => "~&",
            Rule::Imp => "->",
        };
        write!(f, "{}", s)
    }
}

/// Result of expanding one branch. The input branch is consumed; children
/// never share storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    Alpha { rule: Rule, branch: Branch },
    Beta { rule: Rule, left: Branch, right: Branch },
    /// Nothing left to expand; the branch is handed back unchanged.
    Saturated(Branch),
}

enum Derived {
    One(Formula),
    Both(Formula, Formula),
    Split(Formula, Formula),
}

fn decompose(formula: Formula) -> (Rule, Derived) {
    match formula {
        Formula::And(l, r) => (Rule::And, Derived::Both(*l, *r)),
        Formula::Or(l, r) => (Rule::Or, Derived::Split(*l, *r)),
        Formula::Imp(l, r) => (Rule::Imp, Derived::Split(Formula::Not(l), *r)),
        Formula::Not(c) => match *c {
            Formula::Not(inner) => (Rule::DoubleNeg, Derived::One(*inner)),
            Formula::Or(l, r) => (Rule::NotOr, Derived::Both(Formula::Not(l), Formula::Not(r))),
            Formula::Imp(l, r) => (Rule::NotImp, Derived::Both(*l, Formula::Not(r))),
            Formula::And(l, r) => (Rule::NotAnd, Derived::Split(Formula::Not(l), Formula::Not(r))),
            Formula::Atom(name) => unreachable!("literal ~{} selected for expansion", name),
        },
        Formula::Atom(name) => unreachable!("literal {} selected for expansion", name),
    }
}

/// Applies the matching rule to the leftmost non-literal of `branch`.
pub fn expand(branch: Branch) -> Expansion {
    let idx = match branch.first_expandable() {
        Some(idx) => idx,
        None => return Expansion::Saturated(branch),
    };

    let mut rest = branch.0;
    let formula = rest.remove(idx);
    trace!("expanding {}", formula);

    match decompose(formula) {
        (rule, Derived::One(f)) => {
            rest.push(f);
            Expansion::Alpha {
                rule,
                branch: Branch(rest),
            }
        }
        (rule, Derived::Both(a, b)) => {
            rest.push(a);
            rest.push(b);
            Expansion::Alpha {
                rule,
                branch: Branch(rest),
            }
        }
        (rule, Derived::Split(a, b)) => {
            let mut right = rest.clone();
            rest.push(a);
            right.push(b);
            Expansion::Beta {
                rule,
                left: Branch(rest),
                right: Branch(right),
            }
        }
    }
}
