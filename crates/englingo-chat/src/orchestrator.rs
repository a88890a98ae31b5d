//! Orchestrator: coordinates translation, chat and analysis against the log.
//!
//! One exchange runs at a time. Analyses are spawned as detached tasks that
//! write back by turn id, so the exchange never waits on them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use englingo_core::config::SharedAiConfig;
use englingo_core::{LoadingState, Turn, TurnId};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisEngine, RemoteAnalyzer};
use crate::chat::{ChatEngine, RemoteChat};
use crate::client::CompletionClient;
use crate::error::ChatError;
use crate::log::ConversationLog;
use crate::script::contains_cjk;
use crate::translation::{english_or_original, RemoteTranslator, TranslationEngine};

/// Hidden input sent by [`Orchestrator::continue_topic`].
pub const CONTINUE_TOKEN: &str = "Continue.";

/// Turns appended by one successful [`Orchestrator::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// `None` for hidden submissions.
    pub user_turn: Option<TurnId>,
    pub assistant_turn: TurnId,
    pub reply: String,
}

/// Session object owning the conversation log and the submission gate.
pub struct Orchestrator {
    translator: Arc<dyn TranslationEngine>,
    chat: Arc<dyn ChatEngine>,
    analyzer: Arc<dyn AnalysisEngine>,
    log: Arc<ConversationLog>,
    state: Mutex<LoadingState>,
    persona: RwLock<String>,
    pending: Mutex<Vec<JoinHandle<()>>>,
    credential_check: Option<SharedAiConfig>,
}

impl Orchestrator {
    pub fn new(
        translator: Arc<dyn TranslationEngine>,
        chat: Arc<dyn ChatEngine>,
        analyzer: Arc<dyn AnalysisEngine>,
    ) -> Self {
        Self {
            translator,
            chat,
            analyzer,
            log: Arc::new(ConversationLog::new()),
            state: Mutex::new(LoadingState::Idle),
            persona: RwLock::new(String::new()),
            pending: Mutex::new(Vec::new()),
            credential_check: None,
        }
    }

    /// Orchestrator with the three remote engines sharing `client`.
    ///
    /// Submissions are refused up front when the client's configuration
    /// has no credential.
    pub fn from_client(client: CompletionClient, persona: impl Into<String>) -> Self {
        let config = client.config().clone();
        Self::new(
            Arc::new(RemoteTranslator::new(client.clone())),
            Arc::new(RemoteChat::new(client.clone())),
            Arc::new(RemoteAnalyzer::new(client)),
        )
        .with_persona(persona)
        .with_credential_check(config)
    }

    pub fn with_persona(self, persona: impl Into<String>) -> Self {
        self.set_persona(persona);
        self
    }

    /// Continue an existing conversation instead of starting empty.
    pub fn with_log(mut self, log: Arc<ConversationLog>) -> Self {
        self.log = log;
        self
    }

    /// Fail `submit` with [`ChatError::MissingCredential`] before touching
    /// the log when `config` has no credential.
    pub fn with_credential_check(mut self, config: SharedAiConfig) -> Self {
        self.credential_check = Some(config);
        self
    }

    pub fn log(&self) -> &Arc<ConversationLog> {
        &self.log
    }

    pub fn loading_state(&self) -> LoadingState {
        *self.lock_state()
    }

    pub fn persona(&self) -> String {
        self.persona
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persona used by exchanges started after this call.
    pub fn set_persona(&self, persona: impl Into<String>) {
        *self.persona.write().unwrap_or_else(PoisonError::into_inner) = persona.into();
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Run one exchange: translate if needed, record the user turn unless
    /// `hidden`, get the assistant reply and record it.
    ///
    /// Returns [`ChatError::Busy`] without side effects while another
    /// exchange is in flight. A user turn appended before a later failure
    /// stays in the log.
    pub async fn submit(&self, text: &str, hidden: bool) -> Result<SubmitOutcome, ChatError> {
        let initial = if hidden {
            LoadingState::AwaitingAssistantReply
        } else {
            LoadingState::AwaitingUserEcho
        };
        let exchange = self.begin(initial)?;

        let result = self.run_exchange(&exchange, text, hidden).await;
        drop(exchange);

        match &result {
            Ok(outcome) => info!(
                assistant_turn = %outcome.assistant_turn,
                hidden,
                "Exchange completed"
            ),
            Err(e) => warn!(error = %e, hidden, "Exchange failed"),
        }
        result
    }

    /// Append a topic divider. Later context windows start after it.
    pub fn new_topic(&self) -> TurnId {
        let id = self.log.append(Turn::divider());
        info!(turn_id = %id, "New topic started");
        id
    }

    /// Ask the assistant to keep going on the current topic.
    ///
    /// Returns `Ok(None)` without calling any engine when the current topic
    /// has no turns yet.
    pub async fn continue_topic(&self) -> Result<Option<SubmitOutcome>, ChatError> {
        if self.log.context_window(None).is_empty() {
            debug!("Nothing to continue in the current topic");
            return Ok(None);
        }
        self.submit(CONTINUE_TOKEN, true).await.map(Some)
    }

    /// Await every analysis task spawned so far.
    pub async fn wait_for_analyses(&self) {
        loop {
            let handles = std::mem::take(&mut *self.lock_pending());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Analysis task panicked");
                }
            }
        }
    }

    /// Number of analysis tasks that have not finished yet.
    pub fn pending_analyses(&self) -> usize {
        self.lock_pending()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn run_exchange(
        &self,
        exchange: &Exchange<'_>,
        text: &str,
        hidden: bool,
    ) -> Result<SubmitOutcome, ChatError> {
        if let Some(config) = &self.credential_check {
            if !config.snapshot().has_credential() {
                return Err(ChatError::MissingCredential);
            }
        }

        let english = if contains_cjk(text) {
            debug!("Input contains CJK characters, translating");
            let translated = self.translator.translate(text).await?;
            english_or_original(&translated, text)
        } else {
            text.to_string()
        };

        let user_turn = if hidden {
            None
        } else {
            let id = self.log.append(Turn::user(english.as_str()));
            debug!(turn_id = %id, "User turn appended");
            self.spawn_analysis(id, english.clone());
            exchange.advance(LoadingState::AwaitingAssistantReply);
            Some(id)
        };

        let window = self.log.context_window(user_turn);
        let persona = self.persona();
        let reply = self.chat.reply(&window, &english, &persona).await?;

        let assistant_turn = self.log.append(Turn::assistant(reply.as_str()));
        debug!(turn_id = %assistant_turn, "Assistant turn appended");
        exchange.advance(LoadingState::Idle);
        self.spawn_analysis(assistant_turn, reply.clone());

        Ok(SubmitOutcome {
            user_turn,
            assistant_turn,
            reply,
        })
    }

    fn begin(&self, initial: LoadingState) -> Result<Exchange<'_>, ChatError> {
        let mut state = self.lock_state();
        if state.is_busy() {
            let current = *state;
            debug!(state = %current, "Submission rejected, exchange in flight");
            return Err(ChatError::Busy);
        }
        *state = initial;
        Ok(Exchange { state: &self.state })
    }

    fn spawn_analysis(&self, id: TurnId, text: String) {
        let analyzer = Arc::clone(&self.analyzer);
        let log = Arc::clone(&self.log);

        let handle = tokio::spawn(async move {
            match analyzer.analyze(&text).await {
                Ok(analysis) => {
                    if log.set_analysis(id, analysis) {
                        debug!(turn_id = %id, "Analysis stored");
                    } else {
                        warn!(turn_id = %id, "Analysis finished for unknown turn");
                    }
                }
                Err(e) => warn!(turn_id = %id, error = %e, "Analysis failed, turn left unanalyzed"),
            }
        });

        let mut pending = self.lock_pending();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    fn lock_state(&self) -> MutexGuard<'_, LoadingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held for the duration of one exchange. Dropping it reopens the gate.
struct Exchange<'a> {
    state: &'a Mutex<LoadingState>,
}

impl Exchange<'_> {
    fn advance(&self, next: LoadingState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

impl Drop for Exchange<'_> {
    fn drop(&mut self) {
        self.advance(LoadingState::Idle);
    }
}
