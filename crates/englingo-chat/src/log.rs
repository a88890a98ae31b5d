//! Conversation log and topic-window derivation.
//!
//! The log is append-only: turns are never reordered or removed, and the
//! only post-append mutation is writing a turn's analysis by id.

use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use englingo_core::{Analysis, EnglingoError, Turn, TurnId};

/// Ordered, append-only sequence of turns and topic dividers.
///
/// Appends go through the orchestrator only. Readers may snapshot at any
/// time; the lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct ConversationLog {
    turns: RwLock<Vec<Turn>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from previously recorded turns, in order.
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self {
            turns: RwLock::new(turns),
        }
    }

    pub(crate) fn append(&self, turn: Turn) -> TurnId {
        let id = turn.id;
        self.write().push(turn);
        id
    }

    /// Attach an analysis to the turn with `id`.
    ///
    /// Returns `false` when no message turn has that id.
    pub(crate) fn set_analysis(&self, id: TurnId, analysis: Analysis) -> bool {
        let mut turns = self.write();
        match turns.iter_mut().find(|t| t.id == id && !t.is_divider()) {
            Some(turn) => {
                turn.analysis = Some(analysis);
                true
            }
            None => false,
        }
    }

    /// Copy of every turn, in conversation order.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.read().clone()
    }

    pub fn get(&self, id: TurnId) -> Option<Turn> {
        self.read().iter().find(|t| t.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Message turns since the last divider, minus `exclude`.
    pub fn context_window(&self, exclude: Option<TurnId>) -> Vec<Turn> {
        window_of(&self.read(), exclude)
    }

    /// Write the whole log as pretty JSON.
    pub fn save_json(&self, path: &Path) -> englingo_core::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&*self.read())?;
        std::fs::write(path, json)?;
        tracing::info!(turns = self.len(), "Transcript written to {}", path.display());
        Ok(())
    }

    /// Load a log previously written by [`ConversationLog::save_json`].
    pub fn load_json(path: &Path) -> englingo_core::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let turns: Vec<Turn> = serde_json::from_str(&content)
            .map_err(|e| EnglingoError::Serialization(e.to_string()))?;
        Ok(Self::from_turns(turns))
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Turn>> {
        self.turns.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Turn>> {
        self.turns.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Turns after the last divider (all turns if there is none), without
/// dividers and without the turn identified by `exclude`.
pub fn window_of(turns: &[Turn], exclude: Option<TurnId>) -> Vec<Turn> {
    let start = turns
        .iter()
        .rposition(Turn::is_divider)
        .map_or(0, |idx| idx + 1);

    turns[start..]
        .iter()
        .filter(|t| !t.is_divider() && Some(t.id) != exclude)
        .cloned()
        .collect()
}
