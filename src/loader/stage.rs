use std::fmt;

use anyhow::{bail, Result};

/// Initialization phase of a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Initializing,
    Map,
    Stage(String),
    Complete,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Initializing => f.write_str("initializing"),
            LoadState::Map => f.write_str("map"),
            LoadState::Stage(name) => f.write_str(name),
            LoadState::Complete => f.write_str("complete"),
        }
    }
}

/// Strictly forward state machine: `initializing -> map -> <stages...> -> complete`.
/// Stages may be skipped but never revisited; there is no error state.
#[derive(Debug, Clone)]
pub struct StageMachine {
    stages: Vec<String>,
    state: LoadState,
    rank: usize,
    history: Vec<LoadState>,
}

impl StageMachine {
    pub fn new(stages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            stages: stages.into_iter().map(Into::into).collect(),
            state: LoadState::Initializing,
            rank: 0,
            history: vec![LoadState::Initializing],
        }
    }

    #[inline] pub fn state(&self) -> &LoadState { &self.state }

    #[inline] pub fn is_complete(&self) -> bool { self.state == LoadState::Complete }

    /// Every state entered so far, starting with `Initializing`.
    #[inline] pub fn history(&self) -> &[LoadState] { &self.history }

    fn rank_of(&self, state: &LoadState) -> Result<usize> {
        Ok(match state {
            LoadState::Initializing => 0,
            LoadState::Map => 1,
            LoadState::Stage(name) => match self.stages.iter().position(|s| s == name) {
                Some(i) => 2 + i,
                None => bail!("unknown stage {name:?}"),
            },
            LoadState::Complete => 2 + self.stages.len(),
        })
    }

    pub fn advance(&mut self, next: LoadState) -> Result<()> {
        let rank = self.rank_of(&next)?;
        if rank <= self.rank {
            bail!("cannot move from {} back to {}", self.state, next);
        }
        self.rank = rank;
        self.state = next.clone();
        self.history.push(next);
        Ok(())
    }

    /// Enter a named stage.
    #[inline]
    pub fn enter(&mut self, stage: &str) -> Result<()> {
        self.advance(LoadState::Stage(stage.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_path() {
        let mut sm = StageMachine::new(["floodplains", "intersections"]);
        sm.advance(LoadState::Map).unwrap();
        sm.enter("floodplains").unwrap();
        sm.enter("intersections").unwrap();
        sm.advance(LoadState::Complete).unwrap();
        assert!(sm.is_complete());
        assert_eq!(sm.history().len(), 5);
    }

    #[test]
    fn backwards_and_repeats_rejected() {
        let mut sm = StageMachine::new(["a", "b"]);
        sm.advance(LoadState::Map).unwrap();
        sm.enter("b").unwrap();
        assert!(sm.enter("a").is_err());
        assert!(sm.enter("b").is_err());
        assert!(sm.advance(LoadState::Map).is_err());
        assert_eq!(sm.state(), &LoadState::Stage("b".into()));
    }

    #[test]
    fn unknown_stage_rejected() {
        let mut sm = StageMachine::new(Vec::<String>::new());
        assert!(sm.enter("nope").is_err());
        sm.advance(LoadState::Complete).unwrap();
        assert!(sm.advance(LoadState::Complete).is_err());
    }
}
