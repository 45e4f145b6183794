//! Decides propositional tautologies with analytic tableaux.
//!
//! ```
//! assert_eq!(Ok(true), proptab::is_tautology("((P->Q)&P)->Q"));
//! assert_eq!(Ok(false), proptab::is_tautology("(P&Q)"));
//! ```

pub mod calculi;
pub mod calculus;
pub mod decide;
pub mod engine;
pub mod logic;
pub mod parse;
pub mod tamper_protect;

pub use calculus::Calculus;
pub use decide::{
    check_satisfiable, check_tautology, is_satisfiable, is_tautology, tautology_within, DecideErr,
    Outcome,
};
pub use engine::{Limits, Tableau, Verdict};
pub use logic::{Formula, Lit, Valuation};
pub use parse::{parse_prop_formula, ParseErr};
