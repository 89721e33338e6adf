//! Lazily expanded game tree
//!
//! Each node holds a full game snapshot. Children are built the first time
//! they are asked for and cached for the node's lifetime; traversal only goes
//! from root to leaf, so nodes keep no link back to their parent.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::error::{FishError, Result};
use crate::game::{Action, GameState, Phase};

/// A node of the game tree
#[derive(Debug)]
pub struct GameTree {
    state: GameState,
    /// Legal actions from this node, row-major
    actions: Vec<Action>,
    /// Child cache, one cell per legal action
    children: FxHashMap<Action, OnceLock<Box<GameTree>>>,
}

impl GameTree {
    /// Wrap a game that has finished placement
    pub fn new(state: GameState) -> Result<Self> {
        if state.phase() == Phase::Placing {
            return Err(FishError::GameNotRunning);
        }

        let actions = state.possible_actions();
        let children = actions.iter().map(|&a| (a, OnceLock::new())).collect();
        Ok(Self {
            state,
            actions,
            children,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Legal actions for the turn holder at this node
    pub fn all_possible_actions(&self) -> &[Action] {
        &self.actions
    }

    /// True if the turn holder here has nothing to do
    pub fn is_leaf(&self) -> bool {
        self.actions.is_empty()
    }

    /// Child node reached by `action`, built on first request
    pub fn child(&self, action: &Action) -> Result<&GameTree> {
        let cell = self
            .children
            .get(action)
            .ok_or(FishError::InvalidAction(*action))?;
        if let Some(node) = cell.get() {
            return Ok(node);
        }
        let node = self.expand(*action)?;
        Ok(cell.get_or_init(|| Box::new(node)))
    }

    /// State reached by `action`
    pub fn try_action(&self, action: &Action) -> Result<&GameState> {
        self.child(action).map(GameTree::state)
    }

    /// Children in action order, each built on first visit
    pub fn children(&self) -> impl Iterator<Item = (Action, &GameTree)> + '_ {
        self.actions.iter().filter_map(move |action| {
            self.child(action).ok().map(|node| (*action, node))
        })
    }

    /// Apply `f` to the state of every child
    pub fn map_child_states<R, F>(&self, mut f: F) -> Vec<R>
    where
        F: FnMut(&GameState) -> R,
    {
        self.children().map(|(_, node)| f(node.state())).collect()
    }

    /// Number of children built so far
    pub fn expanded_count(&self) -> usize {
        self.children.values().filter(|c| c.get().is_some()).count()
    }

    /// Build the child for an action taken from `possible_actions`
    fn expand(&self, action: Action) -> Result<GameTree> {
        let mut next = self.state.clone();
        next.apply_unchecked(action)?;
        let actions = next.possible_actions();
        let children = actions.iter().map(|&a| (a, OnceLock::new())).collect();
        Ok(GameTree {
            state: next,
            actions,
            children,
        })
    }
}
