use std::{
    collections::{BTreeMap, BTreeSet},
    convert::TryFrom,
    fmt,
};

use serde::{ser::SerializeStruct, Deserialize, Serialize};

/// A propositional formula. Every node owns its children, so formulas are
/// finite trees and compare structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "FormulaRepr")]
pub enum Formula {
    Atom(char),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Imp(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn atom(name: char) -> Self {
        debug_assert!(name.is_ascii_uppercase(), "atom names are A-Z");
        Formula::Atom(name)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Formula) -> Self {
        Formula::Not(Box::new(child))
    }

    pub fn and(left: Formula, right: Formula) -> Self {
        Formula::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Formula, right: Formula) -> Self {
        Formula::Or(Box::new(left), Box::new(right))
    }

    pub fn imp(left: Formula, right: Formula) -> Self {
        Formula::Imp(Box::new(left), Box::new(right))
    }

    /// Returns the literal view of an atom or a negated atom.
    pub fn as_lit(&self) -> Option<Lit> {
        match self {
            Formula::Atom(name) => Some(Lit::pos(*name)),
            Formula::Not(c) => match c.as_ref() {
                Formula::Atom(name) => Some(Lit::neg(*name)),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        self.as_lit().is_some()
    }

    pub fn depth(&self) -> usize {
        match self {
            Formula::Atom(_) => 1,
            Formula::Not(c) => 1 + c.depth(),
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Imp(l, r) => {
                1 + l.depth().max(r.depth())
            }
        }
    }

    pub fn atoms(&self) -> BTreeSet<char> {
        let mut atoms = BTreeSet::new();
        self.collect_atoms(&mut atoms);
        atoms
    }

    fn collect_atoms(&self, atoms: &mut BTreeSet<char>) {
        match self {
            Formula::Atom(name) => {
                atoms.insert(*name);
            }
            Formula::Not(c) => c.collect_atoms(atoms),
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Imp(l, r) => {
                l.collect_atoms(atoms);
                r.collect_atoms(atoms);
            }
        }
    }

    /// Truth-table semantics. Atoms missing from `v` are false.
    pub fn eval(&self, v: &Valuation) -> bool {
        match self {
            Formula::Atom(name) => v.get(*name),
            Formula::Not(c) => !c.eval(v),
            Formula::And(l, r) => l.eval(v) && r.eval(v),
            Formula::Or(l, r) => l.eval(v) || r.eval(v),
            Formula::Imp(l, r) => !l.eval(v) || r.eval(v),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Formula::Atom(_) => "atom",
            Formula::Not(_) => "not",
            Formula::And(..) => "and",
            Formula::Or(..) => "or",
            Formula::Imp(..) => "imp",
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Atom(name) => write!(f, "{}", name),
            Formula::Not(c) => write!(f, "~{}", c),
            Formula::And(l, r) => write!(f, "({}{}{})", l, BinOp::And, r),
            Formula::Or(l, r) => write!(f, "({}{}{})", l, BinOp::Or, r),
            Formula::Imp(l, r) => write!(f, "({}{}{})", l, BinOp::Imp, r),
        }
    }
}

impl Serialize for Formula {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let len = match self {
            Formula::Atom(_) | Formula::Not(_) => 2,
            _ => 3,
        };
        let mut state = serializer.serialize_struct("Formula", len)?;
        state.serialize_field("type", self.type_name())?;
        match self {
            Formula::Atom(name) => state.serialize_field("name", name)?,
            Formula::Not(c) => state.serialize_field("child", c)?,
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Imp(l, r) => {
                state.serialize_field("left", l)?;
                state.serialize_field("right", r)?;
            }
        }
        state.end()
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum FormulaRepr {
    Atom { name: char },
    Not { child: Box<Formula> },
    And { left: Box<Formula>, right: Box<Formula> },
    Or { left: Box<Formula>, right: Box<Formula> },
    Imp { left: Box<Formula>, right: Box<Formula> },
}

impl TryFrom<FormulaRepr> for Formula {
    type Error = String;

    fn try_from(repr: FormulaRepr) -> Result<Self, Self::Error> {
        Ok(match repr {
            FormulaRepr::Atom { name } if name.is_ascii_uppercase() => Formula::Atom(name),
            FormulaRepr::Atom { name } => {
                return Err(format!("Atom name '{}' is not an uppercase letter", name))
            }
            FormulaRepr::Not { child } => Formula::Not(child),
            FormulaRepr::And { left, right } => Formula::And(left, right),
            FormulaRepr::Or { left, right } => Formula::Or(left, right),
            FormulaRepr::Imp { left, right } => Formula::Imp(left, right),
        })
    }
}

/// The binary connectives of the input language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    And,
    Or,
    Imp,
}

impl BinOp {
    pub fn apply(self, left: Formula, right: Formula) -> Formula {
        match self {
            BinOp::And => Formula::and(left, right),
            BinOp::Or => Formula::or(left, right),
            BinOp::Imp => Formula::imp(left, right),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Imp => "->",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit {
    pub name: char,
    pub negated: bool,
}

impl Lit {
    pub fn pos(name: char) -> Self {
        Self {
            name,
            negated: false,
        }
    }

    pub fn neg(name: char) -> Self {
        Self {
            name,
            negated: true,
        }
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "~{}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl From<Lit> for Formula {
    fn from(lit: Lit) -> Self {
        let atom = Formula::Atom(lit.name);
        if lit.negated {
            Formula::not(atom)
        } else {
            atom
        }
    }
}

/// A (partial) truth assignment keyed by atom name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Valuation(BTreeMap<char, bool>);

impl Valuation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: char, value: bool) {
        self.0.insert(name, value);
    }

    /// Unassigned atoms read as false.
    pub fn get(&self, name: char) -> bool {
        self.0.get(&name).copied().unwrap_or(false)
    }

    pub fn assigned(&self, name: char) -> Option<bool> {
        self.0.get(&name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, bool)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Enumerates all 2^n total assignments over `atoms`.
    pub fn all_over(atoms: &BTreeSet<char>) -> Vec<Valuation> {
        let names: Vec<char> = atoms.iter().copied().collect();
        (0..1u64 << names.len())
            .map(|bits| {
                let mut v = Valuation::new();
                for (i, name) in names.iter().enumerate() {
                    v.set(*name, bits & (1 << i) != 0);
                }
                v
            })
            .collect()
    }
}

impl FromIterator<(char, bool)> for Valuation {
    fn from_iter<T: IntoIterator<Item = (char, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(name, value)| format!("{}={}", name, u8::from(*value)))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
