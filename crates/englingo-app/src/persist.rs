//! Files the terminal front end reads and writes besides stdout:
//! the `--transcript` file and the persona stored in the config file.
//!
//! Neither path is ever written over when its current contents fail to load.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use englingo_chat::ConversationLog;
use englingo_core::{EnglingoConfig, EnglingoError};

/// Conversation log for this session and where to write it on exit.
pub struct Transcript {
    pub log: Arc<ConversationLog>,
    /// `None` when the session must not be written anywhere.
    pub save_to: Option<PathBuf>,
}

impl Transcript {
    /// Empty session that is not saved on exit.
    pub fn unsaved() -> Self {
        Self {
            log: Arc::new(ConversationLog::new()),
            save_to: None,
        }
    }
}

/// Open the transcript at `path`.
///
/// A missing file starts an empty log that is saved there on exit. A file
/// that exists but cannot be loaded is returned as an error and left as is.
pub fn open_transcript(path: Option<&Path>) -> Result<Transcript, EnglingoError> {
    let Some(path) = path else {
        return Ok(Transcript::unsaved());
    };
    if !path.exists() {
        tracing::info!(path = %path.display(), "No transcript yet, starting fresh");
        return Ok(Transcript {
            log: Arc::new(ConversationLog::new()),
            save_to: Some(path.to_path_buf()),
        });
    }

    let log = ConversationLog::load_json(path)?;
    tracing::info!(path = %path.display(), turns = log.len(), "Transcript loaded");
    Ok(Transcript {
        log: Arc::new(log),
        save_to: Some(path.to_path_buf()),
    })
}

/// Store `persona` in the config file, keeping every other value on disk.
///
/// Env and flag overrides are never written. A config file that exists but
/// does not parse is refused rather than replaced with defaults.
pub fn save_persona(config_path: &Path, persona: &str) -> Result<(), EnglingoError> {
    let mut on_disk = if config_path.exists() {
        EnglingoConfig::load(config_path)?
    } else {
        EnglingoConfig::default()
    };
    on_disk.tutor.persona = persona.to_string();
    on_disk.save(config_path)
}
