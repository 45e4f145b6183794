use std::{convert::TryFrom, fmt};

use log::{debug, trace};
use serde::{ser::SerializeStruct, Deserialize, Serialize};

use crate::{
    calculus::CloseMsg,
    engine::{expand, Branch, Expansion, Limits},
    logic::Formula,
    parse::{parse_prop_formula, ParseErr},
    tamper_protect::ProtectedState,
    Calculus,
};

/// Move-driven tableau: the client picks which branch to expand or close.
pub struct StepTableau;

impl<'f> Calculus<'f> for StepTableau {
    type Params = Params;

    type State = State;

    type Move = Move;

    type Error = TableauErr;

    fn parse_formula(
        formula: &'f str,
        params: Option<Self::Params>,
    ) -> Result<Self::State, Self::Error> {
        let Params { mode, backtracking } = params.unwrap_or_default();
        let formula = parse_prop_formula(formula)?;
        Ok(State::new(formula, mode, backtracking))
    }

    fn validate(state: Self::State) -> bool {
        state.replayed().map_or(false, |s| s.nodes == state.nodes)
            && state
                .nodes
                .iter()
                .all(|n| !n.is_closed || n.branch.complementary_pair() == n.close_atom)
    }

    fn apply_move(state: Self::State, k_move: Self::Move) -> Result<Self::State, Self::Error> {
        match k_move {
            Move::Expand { branch } => apply_expand(state, branch),
            Move::Close { branch } => apply_close(state, branch),
            Move::Auto { max_steps } => apply_auto(state, Limits { max_steps }),
            Move::Undo => apply_undo(state),
        }
    }

    fn check_close(state: Self::State) -> CloseMsg {
        state.get_close_msg()
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Refute the negation of the input
    #[default]
    #[serde(rename = "TAUTOLOGY")]
    Tautology,
    /// Refute the input itself
    #[serde(rename = "SATISFIABILITY")]
    Satisfiability,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Tautology => "TAUTOLOGY",
            Mode::Satisfiability => "SATISFIABILITY",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Params {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub backtracking: bool,
}

#[derive(Debug, Eq, PartialEq)]
pub enum TableauErr {
    ParseErr(ParseErr),
    InvalidBranchId(usize),
    AlreadyClosed(usize),
    NothingToExpand(usize),
    NotClosable(usize),
    BacktrackingDisabled,
    BacktrackingEmpty,
    /// Expansions an auto move performed before hitting its step cap
    Aborted(usize),
}

impl From<ParseErr> for TableauErr {
    fn from(e: ParseErr) -> Self {
        TableauErr::ParseErr(e)
    }
}

impl fmt::Display for TableauErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableauErr::ParseErr(e) => write!(f, "{}", e),
            TableauErr::InvalidBranchId(id) => write!(f, "Branch with ID {} does not exist", id),
            TableauErr::AlreadyClosed(id) => write!(f, "Branch {} is already closed", id),
            TableauErr::NothingToExpand(id) => {
                write!(f, "Branch {} contains only literals and cannot be expanded", id)
            }
            TableauErr::NotClosable(id) => write!(
                f,
                "Branch {} contains no atom together with its negation",
                id
            ),
            TableauErr::BacktrackingDisabled => {
                write!(f, "Backtracking is not enabled for this proof")
            }
            TableauErr::BacktrackingEmpty => write!(f, "Can't undo in initial state"),
            TableauErr::Aborted(steps) => {
                write!(f, "Auto move aborted after {} expansion steps", steps)
            }
        }
    }
}

impl std::error::Error for TableauErr {}

pub type StepResult<T> = Result<T, TableauErr>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Move {
    Expand {
        #[serde(rename = "branchID")]
        branch: usize,
    },
    Close {
        #[serde(rename = "branchID")]
        branch: usize,
    },
    /// Runs to the end, expanding at most `max_steps` times
    Auto {
        #[serde(
            rename = "maxSteps",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        max_steps: Option<usize>,
    },
    Undo,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Expand { branch } => write!(f, "(expand|{})", branch),
            Move::Close { branch } => write!(f, "(close|{})", branch),
            Move::Auto { max_steps: None } => write!(f, "(auto)"),
            Move::Auto {
                max_steps: Some(max),
            } => write!(f, "(auto|{})", max),
            Move::Undo => write!(f, "(undo)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    branch: Branch,
    #[serde(rename = "isClosed")]
    is_closed: bool,
    #[serde(rename = "closeAtom")]
    close_atom: Option<char>,
}

impl Node {
    fn new(branch: Branch) -> Self {
        Self {
            branch,
            is_closed: false,
            close_atom: None,
        }
    }

    pub fn branch(&self) -> &Branch {
        &self.branch
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    fn info(&self) -> String {
        let close_atom = match self.close_atom {
            Some(a) => a.to_string(),
            None => "null".to_string(),
        };
        format!("({}|{}|{})", self.branch, self.is_closed, close_atom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    formula: Formula,
    mode: Mode,
    backtracking: bool,
    nodes: Vec<Node>,
    moves: Vec<Move>,
    used_backtracking: bool,
}

impl State {
    pub fn new(formula: Formula, mode: Mode, backtracking: bool) -> Self {
        let root = match mode {
            Mode::Tautology => Formula::not(formula.clone()),
            Mode::Satisfiability => formula.clone(),
        };
        Self {
            formula,
            mode,
            backtracking,
            nodes: vec![Node::new(Branch::new(vec![root]))],
            moves: vec![],
            used_backtracking: false,
        }
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn used_backtracking(&self) -> bool {
        self.used_backtracking
    }

    /// Rebuilds the state from the input formula and the move history.
    fn replayed(&self) -> StepResult<State> {
        let mut state = State::new(self.formula.clone(), self.mode, self.backtracking);
        state.used_backtracking = self.used_backtracking;
        for m in self.moves.iter().copied() {
            state = StepTableau::apply_move(state, m)?;
        }
        Ok(state)
    }

    fn open_node(&self, id: usize) -> StepResult<&Node> {
        match self.nodes.get(id) {
            None => Err(TableauErr::InvalidBranchId(id)),
            Some(n) if n.is_closed => Err(TableauErr::AlreadyClosed(id)),
            Some(n) => Ok(n),
        }
    }

    fn get_close_msg(&self) -> CloseMsg {
        let closed = self.nodes.iter().all(|n| n.is_closed);
        let bt = if self.used_backtracking {
            "with"
        } else {
            "without"
        };
        let saturated = self
            .nodes
            .iter()
            .position(|n| !n.is_closed && n.branch.is_fully_expanded() && !n.branch.is_closed());

        let msg = match (closed, saturated, self.mode) {
            (true, _, Mode::Tautology) => format!(
                "The proof is closed and valid {} backtracking: {} is a tautology",
                bt, self.formula
            ),
            (true, _, Mode::Satisfiability) => format!(
                "The proof is closed and valid {} backtracking: {} is unsatisfiable",
                bt, self.formula
            ),
            (false, Some(id), Mode::Tautology) => format!(
                "Branch {} is fully expanded and open: {} is not a tautology",
                id, self.formula
            ),
            (false, Some(id), Mode::Satisfiability) => format!(
                "Branch {} is fully expanded and open: {} is satisfiable",
                id, self.formula
            ),
            (false, None, _) => "The proof tree is not closed".to_string(),
        };

        CloseMsg { closed, msg }
    }
}

impl ProtectedState for State {
    fn compute_seal_info(&self) -> String {
        let nodes = self
            .nodes
            .iter()
            .map(Node::info)
            .collect::<Vec<String>>()
            .join("|");
        let history = self
            .moves
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<String>>()
            .join(",");
        format!(
            "steptableau|{}|{}|{}|{}|{}|{}",
            self.mode, self.backtracking, self.used_backtracking, self.formula, nodes, history
        )
    }
}

impl Serialize for State {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("StepTableauState", 7)?;
        state.serialize_field("formula", &self.formula)?;
        state.serialize_field("mode", &self.mode)?;
        state.serialize_field("backtracking", &self.backtracking)?;
        state.serialize_field("tree", &self.nodes)?;
        state.serialize_field("moveHistory", &self.moves)?;
        state.serialize_field("usedBacktracking", &self.used_backtracking)?;
        state.serialize_field("seal", &self.seal())?;
        state.end()
    }
}

#[derive(Deserialize)]
struct SealedState {
    formula: Formula,
    mode: Mode,
    backtracking: bool,
    tree: Vec<Node>,
    #[serde(rename = "moveHistory")]
    move_history: Vec<Move>,
    #[serde(rename = "usedBacktracking")]
    used_backtracking: bool,
    seal: String,
}

impl TryFrom<SealedState> for State {
    type Error = &'static str;

    fn try_from(s: SealedState) -> Result<Self, Self::Error> {
        let state = State {
            formula: s.formula,
            mode: s.mode,
            backtracking: s.backtracking,
            nodes: s.tree,
            moves: s.move_history,
            used_backtracking: s.used_backtracking,
        };
        if state.verify_seal(&s.seal) {
            Ok(state)
        } else {
            Err("Invalid tamper protection seal")
        }
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let sealed = SealedState::deserialize(deserializer)?;
        State::try_from(sealed).map_err(serde::de::Error::custom)
    }
}

fn apply_expand(mut state: State, id: usize) -> StepResult<State> {
    let branch = state.open_node(id)?.branch.clone();

    match expand(branch) {
        Expansion::Saturated(_) => return Err(TableauErr::NothingToExpand(id)),
        Expansion::Alpha { rule, branch } => {
            trace!("alpha {} on branch {}", rule, id);
            state.nodes[id].branch = branch;
        }
        Expansion::Beta { rule, left, right } => {
            trace!("beta {} on branch {}", rule, id);
            state.nodes[id].branch = left;
            state.nodes.insert(id + 1, Node::new(right));
        }
    }

    state.moves.push(Move::Expand { branch: id });
    Ok(state)
}

fn apply_close(mut state: State, id: usize) -> StepResult<State> {
    let atom = state
        .open_node(id)?
        .branch
        .complementary_pair()
        .ok_or(TableauErr::NotClosable(id))?;

    let node = &mut state.nodes[id];
    node.is_closed = true;
    node.close_atom = Some(atom);

    state.moves.push(Move::Close { branch: id });
    Ok(state)
}

/// Works leftmost-first until every branch is closed or saturated. Closing
/// is free, each expansion counts against `limits`.
fn apply_auto(mut state: State, limits: Limits) -> StepResult<State> {
    let history = state.moves.len();
    let mut steps = 0;

    while let Some(id) = state
        .nodes
        .iter()
        .position(|n| !n.is_closed && (n.branch.is_closed() || !n.branch.is_fully_expanded()))
    {
        if state.nodes[id].branch.is_closed() {
            state = apply_close(state, id)?;
            continue;
        }
        if limits.max_steps.map_or(false, |max| steps >= max) {
            debug!("auto move aborted after {} steps", steps);
            return Err(TableauErr::Aborted(steps));
        }
        state = apply_expand(state, id)?;
        steps += 1;
    }

    // The single auto move stands for everything it did
    state.moves.truncate(history);
    state.moves.push(Move::Auto {
        max_steps: limits.max_steps,
    });
    Ok(state)
}

fn apply_undo(state: State) -> StepResult<State> {
    if !state.backtracking {
        return Err(TableauErr::BacktrackingDisabled);
    }

    let mut moves = state.moves;
    if moves.pop().is_none() {
        return Err(TableauErr::BacktrackingEmpty);
    }

    let mut fresh = State::new(state.formula, state.mode, true);
    fresh.used_backtracking = true;

    for m in moves {
        fresh = StepTableau::apply_move(fresh, m)?;
    }

    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(mode: Mode, backtracking: bool) -> Params {
        Params { mode, backtracking }
    }

    fn branches(state: &State) -> Vec<String> {
        state.nodes.iter().map(|n| n.branch.to_string()).collect()
    }

    #[test]
    fn root() {
        let state = StepTableau::parse_formula("(P->Q)", None).unwrap();
        assert_eq!(vec!["[~(P->Q)]"], branches(&state));

        let state =
            StepTableau::parse_formula("(P->Q)", Some(opts(Mode::Satisfiability, false))).unwrap();
        assert_eq!(vec!["[(P->Q)]"], branches(&state));
    }

    #[test]
    fn parse_error() {
        let res = StepTableau::parse_formula("(P->", None).unwrap_err();
        assert_eq!(TableauErr::ParseErr(ParseErr::UnexpectedEndOfInput), res);
    }

    #[test]
    fn expand_and_close() {
        let mut state = StepTableau::parse_formula("(P|~P)", None).unwrap();
        state = StepTableau::apply_move(state, Move::Expand { branch: 0 }).unwrap();
        assert_eq!(vec!["[~P, ~~P]"], branches(&state));
        state = StepTableau::apply_move(state, Move::Expand { branch: 0 }).unwrap();
        assert_eq!(vec!["[~P, P]"], branches(&state));
        state = StepTableau::apply_move(state, Move::Close { branch: 0 }).unwrap();

        let msg = StepTableau::check_close(state);
        assert!(msg.closed);
        assert_eq!(
            "The proof is closed and valid without backtracking: (P|~P) is a tautology",
            msg.msg
        );
    }

    #[test]
    fn beta_inserts_sibling() {
        let mut state =
            StepTableau::parse_formula("((P|Q)&(R|S))", Some(opts(Mode::Satisfiability, false)))
                .unwrap();
        state = StepTableau::apply_move(state, Move::Expand { branch: 0 }).unwrap();
        state = StepTableau::apply_move(state, Move::Expand { branch: 0 }).unwrap();
        assert_eq!(vec!["[(R|S), P]", "[(R|S), Q]"], branches(&state));
        state = StepTableau::apply_move(state, Move::Expand { branch: 0 }).unwrap();
        assert_eq!(
            vec!["[P, R]", "[P, S]", "[(R|S), Q]"],
            branches(&state)
        );
    }

    #[test]
    fn move_errors() {
        let state = StepTableau::parse_formula("(P->Q)", None).unwrap();
        let res = StepTableau::apply_move(state.clone(), Move::Expand { branch: 1 });
        assert_eq!(Err(TableauErr::InvalidBranchId(1)), res);
        let res = StepTableau::apply_move(state.clone(), Move::Close { branch: 0 });
        assert_eq!(Err(TableauErr::NotClosable(0)), res);

        let state = StepTableau::apply_move(state, Move::Expand { branch: 0 }).unwrap();
        assert_eq!(vec!["[P, ~Q]"], branches(&state));
        let res = StepTableau::apply_move(state, Move::Expand { branch: 0 });
        assert_eq!(Err(TableauErr::NothingToExpand(0)), res);

        let mut state = StepTableau::parse_formula("(P|~P)", None).unwrap();
        state = StepTableau::apply_move(state, Move::Auto { max_steps: None }).unwrap();
        let res = StepTableau::apply_move(state, Move::Close { branch: 0 });
        assert_eq!(Err(TableauErr::AlreadyClosed(0)), res);
    }

    #[test]
    fn auto() {
        let state = StepTableau::parse_formula("((P->Q)->(~Q->~P))", None).unwrap();
        let state = StepTableau::apply_move(state, Move::Auto { max_steps: None }).unwrap();
        assert_eq!(&[Move::Auto { max_steps: None }], state.moves());
        assert!(state.nodes.iter().all(|n| n.is_closed));
        assert!(StepTableau::check_close(state).closed);

        let state = StepTableau::parse_formula("((P->Q)->(Q->P))", None).unwrap();
        let state = StepTableau::apply_move(state, Move::Auto { max_steps: None }).unwrap();
        let msg = StepTableau::check_close(state);
        assert!(!msg.closed);
        assert!(msg.msg.contains("is not a tautology"), "{}", msg.msg);
    }

    #[test]
    fn auto_step_cap() {
        let capped = |n| Move::Auto { max_steps: Some(n) };

        let state = StepTableau::parse_formula("(P|~P)", None).unwrap();
        let res = StepTableau::apply_move(state.clone(), capped(1));
        assert_eq!(Err(TableauErr::Aborted(1)), res);

        let state = StepTableau::apply_move(state, capped(2)).unwrap();
        assert_eq!(&[capped(2)], state.moves());
        assert_eq!("(auto|2)", state.moves()[0].to_string());
        assert!(StepTableau::validate(state.clone()));
        assert!(StepTableau::check_close(state).closed);

        let state = StepTableau::parse_formula(
            "((A|B)&((C|D)&((E|F)&(G|H))))",
            Some(opts(Mode::Satisfiability, false)),
        )
        .unwrap();
        let res = StepTableau::apply_move(state, capped(5));
        assert_eq!(Err(TableauErr::Aborted(5)), res);
    }

    #[test]
    fn not_closed_yet() {
        let state = StepTableau::parse_formula("(P->P)", None).unwrap();
        let msg = StepTableau::check_close(state);
        assert!(!msg.closed);
        assert_eq!("The proof tree is not closed", msg.msg);
    }

    mod undo {
        use super::*;

        #[test]
        fn disabled() {
            let state = StepTableau::parse_formula("(P->P)", None).unwrap();
            let res = StepTableau::apply_move(state, Move::Undo).unwrap_err();
            assert_eq!(TableauErr::BacktrackingDisabled, res);
        }

        #[test]
        fn init() {
            let state =
                StepTableau::parse_formula("(P->P)", Some(opts(Mode::Tautology, true))).unwrap();
            let res = StepTableau::apply_move(state, Move::Undo).unwrap_err();
            assert_eq!(TableauErr::BacktrackingEmpty, res);
        }

        #[test]
        fn restores_previous() {
            let mut state =
                StepTableau::parse_formula("((P|Q)->P)", Some(opts(Mode::Tautology, true)))
                    .unwrap();
            state = StepTableau::apply_move(state, Move::Expand { branch: 0 }).unwrap();
            let before = branches(&state);
            state = StepTableau::apply_move(state, Move::Expand { branch: 0 }).unwrap();
            assert_ne!(before, branches(&state));
            assert!(!state.used_backtracking());

            state = StepTableau::apply_move(state, Move::Undo).unwrap();
            assert_eq!(before, branches(&state));
            assert_eq!(1, state.moves().len());
            assert!(state.used_backtracking());
        }
    }

    mod sealing {
        use super::*;

        #[test]
        fn json_roundtrip() {
            let state = StepTableau::parse_formula("(P->(Q->P))", None).unwrap();
            let state = StepTableau::apply_move(state, Move::Expand { branch: 0 }).unwrap();
            let json = serde_json::to_string(&state).unwrap();
            let back: State = serde_json::from_str(&json).unwrap();
            assert_eq!(state, back);
            assert!(StepTableau::validate(back));
        }

        #[test]
        fn tampered_state_is_rejected() {
            let state = StepTableau::parse_formula("(P->Q)", None).unwrap();
            let json = serde_json::to_string(&state).unwrap();
            let forged = json.replace("\"isClosed\":false", "\"isClosed\":true");
            assert_ne!(json, forged);
            let res: Result<State, _> = serde_json::from_str(&forged);
            assert!(res.is_err());
        }

        #[test]
        fn move_json() {
            let m: Move = serde_json::from_str(r#"{"type":"expand","branchID":2}"#).unwrap();
            assert_eq!(Move::Expand { branch: 2 }, m);
            let m: Move = serde_json::from_str(r#"{"type":"auto"}"#).unwrap();
            assert_eq!(Move::Auto { max_steps: None }, m);
            let m: Move = serde_json::from_str(r#"{"type":"auto","maxSteps":4}"#).unwrap();
            assert_eq!(Move::Auto { max_steps: Some(4) }, m);
            assert_eq!(
                r#"{"type":"auto"}"#,
                serde_json::to_string(&Move::Auto { max_steps: None }).unwrap()
            );
            assert_eq!(
                r#"{"type":"close","branchID":0}"#,
                serde_json::to_string(&Move::Close { branch: 0 }).unwrap()
            );
        }

        #[test]
        fn params_json() {
            let p: Params = serde_json::from_str(r#"{"mode":"SATISFIABILITY"}"#).unwrap();
            assert_eq!(Mode::Satisfiability, p.mode);
            assert!(!p.backtracking);
        }
    }

    #[test]
    fn validate_detects_inconsistent_history() {
        let state = StepTableau::parse_formula("(P->P)", None).unwrap();
        let mut state = StepTableau::apply_move(state, Move::Expand { branch: 0 }).unwrap();
        assert!(StepTableau::validate(state.clone()));
        state.moves.clear();
        assert!(!StepTableau::validate(state));
    }
}
