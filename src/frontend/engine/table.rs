//! Canonical LR(1) parse-table construction.
//!
//! Built fresh from an [`ExpandedGrammar`] on every engine construction.
//! Any ambiguity is reported here, at construction time, naming the state,
//! the lookahead and the productions involved; a finished table never fails
//! on a conflict during a parse.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::collections::hash_map::Entry;

use crate::frontend::diagnostics::{CompileError, CompileResult};
use crate::frontend::engine::meta::ExpandedGrammar;

/// Interned symbol index. Terminals come first (with `$end` as the last
/// terminal), nonterminals after.
pub type SymId = usize;

/// Name of the synthetic end-of-input terminal.
pub const END: &str = "$end";

// ============================================================================
// SYMBOLS
// ============================================================================

#[derive(Debug)]
pub struct Symbols {
    names: Vec<String>,
    ids: HashMap<String, SymId>,
    terminal_count: usize,
}

impl Symbols {
    fn build(grammar: &ExpandedGrammar) -> Symbols {
        let mut symbols = Symbols { names: Vec::new(), ids: HashMap::new(), terminal_count: 0 };
        for terminal in &grammar.terminals {
            symbols.intern(&terminal.name);
        }
        symbols.intern(END);
        symbols.terminal_count = symbols.names.len();
        for production in &grammar.productions {
            symbols.intern(&production.rule);
        }
        symbols.intern("$accept");
        symbols
    }

    fn intern(&mut self, name: &str) -> SymId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn id(&self, name: &str) -> Option<SymId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: SymId) -> &str {
        &self.names[id]
    }

    pub fn is_terminal(&self, id: SymId) -> bool {
        id < self.terminal_count
    }

    /// The `$end` terminal.
    pub fn end(&self) -> SymId {
        self.terminal_count - 1
    }
}

// ============================================================================
// PRODUCTIONS AND ACTIONS
// ============================================================================

/// An interned production. Index 0 is always the augmented `$accept: start`.
#[derive(Debug, Clone)]
pub struct Prod {
    pub lhs: SymId,
    pub rhs: Vec<SymId>,
    /// Tag for the raw node this production builds (alias or rule name).
    /// Tags starting with `_` mark nodes whose children splice into the
    /// parent.
    pub tag: String,
    display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(usize),
    Reduce(usize),
    Accept,
}

/// Finished ACTION and GOTO tables, indexed by state.
#[derive(Debug)]
pub struct Tables {
    pub symbols: Symbols,
    pub productions: Vec<Prod>,
    pub actions: Vec<HashMap<SymId, Action>>,
    pub gotos: Vec<HashMap<SymId, usize>>,
}

impl Tables {
    pub fn build(grammar: &ExpandedGrammar) -> CompileResult<Tables> {
        Builder::new(grammar)?.run()
    }

    /// Terminal names with an action in `state`, sorted, for error reports.
    pub fn expected_in(&self, state: usize) -> Vec<String> {
        let mut expected: Vec<String> = self.actions[state]
            .keys()
            .map(|&sym| self.symbols.name(sym).to_string())
            .collect();
        expected.sort();
        expected
    }
}

// ============================================================================
// LR(1) CONSTRUCTION
// ============================================================================

/// One LR(1) item: a production, a dot position and a lookahead terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Item {
    prod: usize,
    dot: usize,
    lookahead: SymId,
}

type State = BTreeSet<Item>;

struct Builder {
    symbols: Symbols,
    productions: Vec<Prod>,
    by_lhs: HashMap<SymId, Vec<usize>>,
    nullable: HashSet<SymId>,
    first: Vec<HashSet<SymId>>,
}

impl Builder {
    fn new(grammar: &ExpandedGrammar) -> CompileResult<Builder> {
        let symbols = Symbols::build(grammar);
        let start = symbols.id(&grammar.start).ok_or_else(|| {
            CompileError::grammar(format!("start rule `{}` is undefined", grammar.start))
        })?;

        let accept = symbols
            .id("$accept")
            .ok_or_else(|| CompileError::internal("symbol table is missing $accept"))?;
        let mut productions = vec![Prod {
            lhs: accept,
            rhs: vec![start],
            tag: "$accept".to_string(),
            display: format!("$accept: {}", grammar.start),
        }];
        for production in &grammar.productions {
            let lhs = symbols
                .id(&production.rule)
                .ok_or_else(|| CompileError::internal("unindexed rule name"))?;
            let mut rhs = Vec::with_capacity(production.symbols.len());
            for symbol in &production.symbols {
                rhs.push(
                    symbols
                        .id(symbol)
                        .ok_or_else(|| CompileError::internal("unindexed rhs symbol"))?,
                );
            }
            let tag = production.alias.clone().unwrap_or_else(|| production.rule.clone());
            productions.push(Prod { lhs, rhs, tag, display: production.display() });
        }

        let mut by_lhs: HashMap<SymId, Vec<usize>> = HashMap::new();
        for (index, production) in productions.iter().enumerate() {
            by_lhs.entry(production.lhs).or_default().push(index);
        }

        let nullable = compute_nullable(&productions);
        let first = compute_first(&symbols, &productions, &nullable);
        Ok(Builder { symbols, productions, by_lhs, nullable, first })
    }

    fn run(self) -> CompileResult<Tables> {
        let initial = self.closure(BTreeSet::from([Item {
            prod: 0,
            dot: 0,
            lookahead: self.symbols.end(),
        }]));

        let mut states: Vec<State> = vec![initial.clone()];
        let mut ids: HashMap<State, usize> = HashMap::from([(initial, 0)]);
        let mut transitions: Vec<Vec<(SymId, usize)>> = Vec::new();
        let mut queue: VecDeque<usize> = VecDeque::from([0]);

        while let Some(index) = queue.pop_front() {
            let outgoing: BTreeSet<SymId> = states[index]
                .iter()
                .filter_map(|item| self.productions[item.prod].rhs.get(item.dot).copied())
                .collect();
            let mut edges = Vec::new();
            for symbol in outgoing {
                let next = self.goto(&states[index], symbol);
                let target = match ids.entry(next.clone()) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        let target = states.len();
                        entry.insert(target);
                        states.push(next);
                        queue.push_back(target);
                        target
                    }
                };
                edges.push((symbol, target));
            }
            if transitions.len() <= index {
                transitions.resize(index + 1, Vec::new());
            }
            transitions[index] = edges;
        }
        transitions.resize(states.len(), Vec::new());

        let mut actions: Vec<HashMap<SymId, Action>> = vec![HashMap::new(); states.len()];
        let mut gotos: Vec<HashMap<SymId, usize>> = vec![HashMap::new(); states.len()];
        for (index, edges) in transitions.iter().enumerate() {
            for &(symbol, target) in edges {
                if self.symbols.is_terminal(symbol) {
                    self.insert_action(&mut actions[index], index, symbol, Action::Shift(target))?;
                } else {
                    gotos[index].insert(symbol, target);
                }
            }
        }
        for (index, state) in states.iter().enumerate() {
            for item in state {
                let production = &self.productions[item.prod];
                if item.dot < production.rhs.len() {
                    continue;
                }
                let action = if item.prod == 0 { Action::Accept } else { Action::Reduce(item.prod) };
                self.insert_action(&mut actions[index], index, item.lookahead, action)?;
            }
        }

        Ok(Tables {
            symbols: self.symbols,
            productions: self.productions,
            actions,
            gotos,
        })
    }

    fn closure(&self, mut items: State) -> State {
        let mut queue: VecDeque<Item> = items.iter().copied().collect();
        while let Some(item) = queue.pop_front() {
            let production = &self.productions[item.prod];
            let Some(&next) = production.rhs.get(item.dot) else { continue };
            if self.symbols.is_terminal(next) {
                continue;
            }
            let beta = &production.rhs[item.dot + 1..];
            let lookaheads = self.first_of_sequence(beta, item.lookahead);
            if let Some(candidates) = self.by_lhs.get(&next) {
                for &prod in candidates {
                    for &lookahead in &lookaheads {
                        let new_item = Item { prod, dot: 0, lookahead };
                        if items.insert(new_item) {
                            queue.push_back(new_item);
                        }
                    }
                }
            }
        }
        items
    }

    fn goto(&self, state: &State, symbol: SymId) -> State {
        let moved: State = state
            .iter()
            .filter(|item| self.productions[item.prod].rhs.get(item.dot) == Some(&symbol))
            .map(|item| Item { dot: item.dot + 1, ..*item })
            .collect();
        self.closure(moved)
    }

    /// FIRST of a symbol sequence followed by `lookahead`.
    fn first_of_sequence(&self, sequence: &[SymId], lookahead: SymId) -> BTreeSet<SymId> {
        let mut set = BTreeSet::new();
        for &symbol in sequence {
            set.extend(self.first[symbol].iter().copied());
            if !self.nullable.contains(&symbol) {
                return set;
            }
        }
        set.insert(lookahead);
        set
    }

    fn insert_action(
        &self,
        cell: &mut HashMap<SymId, Action>,
        state: usize,
        symbol: SymId,
        action: Action,
    ) -> CompileResult<()> {
        match cell.entry(symbol) {
            Entry::Vacant(entry) => {
                entry.insert(action);
                Ok(())
            }
            Entry::Occupied(entry) if *entry.get() == action => Ok(()),
            Entry::Occupied(entry) => {
                let existing = *entry.get();
                let kind = if matches!(existing, Action::Shift(_)) || matches!(action, Action::Shift(_))
                {
                    "shift/reduce"
                } else {
                    "reduce/reduce"
                };
                Err(CompileError::grammar(format!(
                    "{kind} conflict in state {state} on `{}`: {} vs {}",
                    self.symbols.name(symbol),
                    self.describe(existing),
                    self.describe(action),
                )))
            }
        }
    }

    fn describe(&self, action: Action) -> String {
        match action {
            Action::Shift(target) => format!("shift to state {target}"),
            Action::Reduce(prod) => format!("reduce `{}`", self.productions[prod].display),
            Action::Accept => "accept".to_string(),
        }
    }
}

fn compute_nullable(productions: &[Prod]) -> HashSet<SymId> {
    let mut nullable = HashSet::new();
    loop {
        let mut changed = false;
        for production in productions {
            if nullable.contains(&production.lhs) {
                continue;
            }
            if production.rhs.iter().all(|sym| nullable.contains(sym)) {
                nullable.insert(production.lhs);
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn compute_first(
    symbols: &Symbols,
    productions: &[Prod],
    nullable: &HashSet<SymId>,
) -> Vec<HashSet<SymId>> {
    let mut first: Vec<HashSet<SymId>> = Vec::with_capacity(symbols.names.len());
    for id in 0..symbols.names.len() {
        let mut set = HashSet::new();
        if symbols.is_terminal(id) {
            set.insert(id);
        }
        first.push(set);
    }

    loop {
        let mut changed = false;
        for production in productions {
            for &symbol in &production.rhs {
                let add: Vec<SymId> = first[symbol].iter().copied().collect();
                for sym in add {
                    changed |= first[production.lhs].insert(sym);
                }
                if !nullable.contains(&symbol) {
                    break;
                }
            }
        }
        if !changed {
            return first;
        }
    }
}
