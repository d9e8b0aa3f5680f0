//! Interview Session actor
//!
//! One task per interview owns the [`SessionStateStore`], the
//! [`TurnProcessor`] and the [`IdleEscalator`]. Everything outside talks to
//! it through a [`SessionHandle`] and listens on a [`SessionEvent`] channel,
//! so all mutations are serialized through a single owner.

use crate::assessment::{InterviewState, TurnResult};
use crate::completion::CompletionReason;
use crate::config::{InterviewConfig, OrchestratorSettings};
use crate::curriculum::QuestionBank;
use crate::directive::{CandidateInput, Directive};
use crate::escalator::{IdleEscalator, ReminderOutcome, TimeoutAction};
use crate::initializer::SessionInitializer;
use crate::llm_client::CompletionService;
use crate::processor::{TurnOutcome, TurnProcessor};
use crate::store::SessionStateStore;
use crate::transcript::{Transcript, Turn};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 32;

/// Signals the UI and speech layers send into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    InterviewerStartedSpeaking,
    InterviewerStoppedSpeaking,
    CandidateSubmitted(String),
    /// Finish the interview now; results are persisted.
    End,
    /// Stop the session without a result (client went away).
    Shutdown,
}

/// Signals a session emits.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    InterviewerTurn(TurnResult),
    FollowUp { text: String },
    Complete { progress: u8, reason: CompletionReason },
    /// The candidate stayed silent through every reminder. Nothing is persisted.
    Cancelled,
}

/// Everything handed to the persistence collaborator when a session completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub config: InterviewConfig,
    pub transcript: Transcript,
    pub state: InterviewState,
    pub reason: CompletionReason,
}

/// Receives finished interviews. Called exactly once per completed session
/// and never for cancelled ones.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn persist(&self, summary: SessionSummary) -> Result<()>;
}

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct SessionDeps {
    pub completion: Arc<dyn CompletionService>,
    pub question_bank: Option<Arc<dyn QuestionBank>>,
    pub results: Arc<dyn ResultSink>,
    pub settings: OrchestratorSettings,
    pub persona: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("interview session has already finished")]
    Closed,
}

/// Cheap, cloneable sender side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: String,
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }

    pub async fn interviewer_started_speaking(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::InterviewerStartedSpeaking).await
    }

    pub async fn interviewer_stopped_speaking(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::InterviewerStoppedSpeaking).await
    }

    pub async fn submit(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionCommand::CandidateSubmitted(text.into())).await
    }

    pub async fn end(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::End).await
    }

    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown).await
    }
}

pub struct InterviewSession;

impl InterviewSession {
    /// Starts a session task. The opening turn is the first event; the event
    /// channel closes when the session finishes for any reason.
    pub fn spawn(
        session_id: impl Into<String>,
        deps: SessionDeps,
        config: InterviewConfig,
    ) -> (SessionHandle, mpsc::Receiver<SessionEvent>) {
        let session_id = session_id.into();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

        let span = info_span!(
            "interview_session",
            session_id = %session_id,
            field = %config.field,
            level = %config.level,
            language = %config.language
        );
        tokio::spawn(
            run_session(session_id.clone(), deps, config, command_rx, event_tx).instrument(span),
        );

        (
            SessionHandle {
                session_id,
                commands: command_tx,
            },
            event_rx,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Where a turn came from. Only reminders raised by the idle timer count
/// towards cancelling the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Client,
    IdleTimer,
}

enum Planning<T> {
    Done(T),
    /// The candidate spoke while a reminder was being generated.
    Superseded(CandidateInput),
    EndRequested,
    Shutdown,
}

async fn run_session(
    session_id: String,
    deps: SessionDeps,
    config: InterviewConfig,
    mut commands: mpsc::Receiver<SessionCommand>,
    events: mpsc::Sender<SessionEvent>,
) {
    info!("Starting interview session");
    let language = config.language;
    let initializer = SessionInitializer::new(
        deps.completion.clone(),
        deps.question_bank.clone(),
        deps.settings.clone(),
        deps.persona.clone(),
    );

    let mut queued = VecDeque::new();
    let mut end_requested = false;
    let started = initializer.start(config);
    tokio::pin!(started);
    let (store, opening) = loop {
        tokio::select! {
            ready = &mut started => break ready,
            command = commands.recv() => match command {
                Some(SessionCommand::CandidateSubmitted(text)) => {
                    queued.extend(CandidateInput::classify(&text, language));
                }
                Some(SessionCommand::End) => {
                    info!("End requested during start-up; ending after the opening turn");
                    end_requested = true;
                }
                Some(SessionCommand::Shutdown) | None => {
                    info!("Interview session shut down during start-up");
                    return;
                }
                Some(_) => {}
            }
        }
    };

    let mut actor = SessionActor {
        session_id,
        escalator: IdleEscalator::new(deps.settings.idle_timeout, deps.settings.max_reminders),
        processor: TurnProcessor::new(deps.completion, deps.settings, deps.persona),
        results: deps.results,
        store,
        commands,
        events,
        queued,
    };
    if end_requested {
        actor.queue_end(None);
    }
    if actor.emit(SessionEvent::InterviewerTurn(opening)).await == Flow::Continue {
        actor.run().await;
    }
    info!(
        questions_asked = actor.store.state().questions_asked,
        complete = actor.store.is_complete(),
        "Interview session finished"
    );
}

struct SessionActor {
    session_id: String,
    store: SessionStateStore,
    processor: TurnProcessor,
    escalator: IdleEscalator,
    results: Arc<dyn ResultSink>,
    commands: mpsc::Receiver<SessionCommand>,
    events: mpsc::Sender<SessionEvent>,
    queued: VecDeque<CandidateInput>,
}

impl SessionActor {
    async fn run(&mut self) {
        loop {
            if let Some(input) = self.queued.pop_front() {
                if self.handle_input(input).await == Flow::Exit {
                    return;
                }
                continue;
            }

            let deadline = self.escalator.deadline();
            let flow = tokio::select! {
                biased;
                command = self.commands.recv() => self.handle_command(command).await,
                _ = idle_deadline(deadline) => self.handle_timeout().await,
            };
            if flow == Flow::Exit {
                return;
            }
        }
    }

    async fn handle_command(&mut self, command: Option<SessionCommand>) -> Flow {
        match command {
            Some(SessionCommand::InterviewerStartedSpeaking) => {
                self.escalator.disarm(Instant::now());
                Flow::Continue
            }
            Some(SessionCommand::InterviewerStoppedSpeaking) => {
                self.escalator.arm(Instant::now(), self.store.is_complete());
                Flow::Continue
            }
            Some(SessionCommand::CandidateSubmitted(text)) => {
                match CandidateInput::classify(&text, self.store.config().language) {
                    Some(input) => self.handle_input(input).await,
                    None => {
                        debug!("Ignoring blank candidate input");
                        Flow::Continue
                    }
                }
            }
            Some(SessionCommand::End) => {
                self.handle_input(CandidateInput::Directive(Directive::End))
                    .await
            }
            Some(SessionCommand::Shutdown) | None => {
                info!("Interview session shut down");
                Flow::Exit
            }
        }
    }

    async fn handle_timeout(&mut self) -> Flow {
        match self.escalator.on_timeout(self.store.is_complete()) {
            TimeoutAction::Ignore => Flow::Continue,
            TimeoutAction::StandDown => {
                debug!("Idle timer expired after completion; standing down");
                Flow::Continue
            }
            TimeoutAction::Remind { attempt } => {
                info!(attempt, "Candidate idle; sending reminder");
                let reminder = CandidateInput::Directive(Directive::Remind { attempt });
                self.process(reminder, Origin::IdleTimer).await
            }
        }
    }

    /// Entry point for candidate activity: cancels the idle timer, then runs the turn.
    async fn handle_input(&mut self, input: CandidateInput) -> Flow {
        self.escalator.candidate_active(Instant::now());
        self.process(input, Origin::Client).await
    }

    /// Records answers that will never get a reply, then queues the end directive.
    fn queue_end(&mut self, in_flight: Option<CandidateInput>) {
        for input in in_flight.into_iter().chain(self.queued.drain(..)) {
            if let CandidateInput::Answer(text) = input {
                self.store.append(Turn::candidate(text));
            }
        }
        self.queued.push_back(CandidateInput::Directive(Directive::End));
    }

    /// Plans a turn while still listening for commands, then commits it.
    async fn process(&mut self, input: CandidateInput, origin: Origin) -> Flow {
        let language = self.store.config().language;
        let is_reminder = matches!(input, CandidateInput::Directive(Directive::Remind { .. }));
        let is_end = input.is_end();

        let planning = {
            let plan = self.processor.plan(&input, &self.store);
            tokio::pin!(plan);
            loop {
                tokio::select! {
                    planned = &mut plan => break Planning::Done(planned),
                    command = self.commands.recv() => match command {
                        Some(SessionCommand::CandidateSubmitted(text)) => {
                            let Some(next) = CandidateInput::classify(&text, language) else {
                                continue;
                            };
                            if is_reminder {
                                break Planning::Superseded(next);
                            }
                            debug!("Queueing candidate input behind the turn in flight");
                            self.queued.push_back(next);
                        }
                        Some(SessionCommand::InterviewerStartedSpeaking) => {
                            self.escalator.disarm(Instant::now());
                        }
                        Some(SessionCommand::InterviewerStoppedSpeaking) => {
                            debug!("Ignoring stopped-speaking signal during the turn in flight");
                        }
                        Some(SessionCommand::End) if !is_end => break Planning::EndRequested,
                        Some(SessionCommand::End) => {}
                        Some(SessionCommand::Shutdown) | None => break Planning::Shutdown,
                    }
                }
            }
        };

        match planning {
            Planning::Done(None) => Flow::Continue,
            Planning::Done(Some(planned)) => {
                match self.processor.commit(planned, &mut self.store) {
                    Some(outcome) => {
                        let escalating = is_reminder && origin == Origin::IdleTimer;
                        self.emit_outcome(outcome, escalating).await
                    }
                    None => Flow::Continue,
                }
            }
            Planning::Superseded(next) => {
                info!("Candidate responded; dropping the pending reminder");
                self.queued.push_front(next);
                Flow::Continue
            }
            Planning::EndRequested => {
                info!("End requested; cancelling the turn in flight");
                self.queue_end(Some(input));
                Flow::Continue
            }
            Planning::Shutdown => {
                info!("Interview session shut down with a turn in flight");
                Flow::Exit
            }
        }
    }

    async fn emit_outcome(&mut self, outcome: TurnOutcome, escalating: bool) -> Flow {
        let TurnOutcome { result, reason } = outcome;
        let follow_up = result.follow_up.clone();
        if self.emit(SessionEvent::InterviewerTurn(result)).await == Flow::Exit {
            return Flow::Exit;
        }
        if let Some(text) = follow_up {
            if self.emit(SessionEvent::FollowUp { text }).await == Flow::Exit {
                return Flow::Exit;
            }
        }
        if let Some(reason) = reason {
            return self.complete(reason).await;
        }
        if escalating {
            match self.escalator.record_reminder() {
                ReminderOutcome::AwaitRearm { count } => {
                    debug!(count, "Reminder sent; waiting for the interviewer to stop speaking");
                }
                ReminderOutcome::Terminate => {
                    warn!("Candidate unresponsive after every reminder; cancelling interview");
                    let _ = self.emit(SessionEvent::Cancelled).await;
                    return Flow::Exit;
                }
            }
        }
        Flow::Continue
    }

    async fn complete(&mut self, reason: CompletionReason) -> Flow {
        self.escalator.stand_down();
        let state = self.store.current_state();
        info!(
            %reason,
            questions_asked = state.questions_asked,
            progress = state.progress,
            "Interview complete"
        );
        let summary = SessionSummary {
            session_id: self.session_id.clone(),
            config: self.store.config().clone(),
            transcript: self.store.transcript().clone(),
            state: state.clone(),
            reason,
        };
        if let Err(e) = self.results.persist(summary).await {
            error!(error = ?e, "Failed to persist interview result");
        }
        let _ = self
            .emit(SessionEvent::Complete {
                progress: state.progress,
                reason,
            })
            .await;
        Flow::Exit
    }

    async fn emit(&self, event: SessionEvent) -> Flow {
        match self.events.send(event).await {
            Ok(()) => Flow::Continue,
            Err(_) => {
                info!("Event receiver dropped; stopping session");
                Flow::Exit
            }
        }
    }
}

async fn idle_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::MockCompletionService;
    use crate::locale::Language;
    use std::time::Duration;

    fn deps(completion: MockCompletionService, results: MockResultSink) -> SessionDeps {
        SessionDeps {
            completion: Arc::new(completion),
            question_bank: None,
            results: Arc::new(results),
            settings: OrchestratorSettings::default(),
            persona: None,
        }
    }

    fn replying(json: &'static str) -> MockCompletionService {
        let mut mock = MockCompletionService::new();
        mock.expect_complete().returning(move |_| Ok(json.to_string()));
        mock
    }

    fn config() -> InterviewConfig {
        InterviewConfig::new("Backend", "mid", Language::En)
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_command_persists_once() {
        let mut results = MockResultSink::new();
        results
            .expect_persist()
            .withf(|s| s.reason == CompletionReason::EndRequested && s.session_id == "s-1")
            .times(1)
            .returning(|_| Ok(()));
        let (handle, mut events) = InterviewSession::spawn(
            "s-1",
            deps(replying(r#"{"text": "Hello"}"#), results),
            config(),
        );

        assert!(matches!(events.recv().await, Some(SessionEvent::InterviewerTurn(_))));
        handle.end().await.unwrap();
        assert!(matches!(events.recv().await, Some(SessionEvent::InterviewerTurn(_))));
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::Complete {
                progress: 100,
                reason: CompletionReason::EndRequested
            })
        );
        assert_eq!(events.recv().await, None);
        assert_eq!(handle.submit("late").await, Err(SessionError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_emits_nothing_and_skips_persistence() {
        let mut results = MockResultSink::new();
        results.expect_persist().times(0);
        let (handle, mut events) = InterviewSession::spawn(
            "s-2",
            deps(replying(r#"{"text": "Hello"}"#), results),
            config(),
        );

        assert!(matches!(events.recv().await, Some(SessionEvent::InterviewerTurn(_))));
        handle.shutdown().await.unwrap();
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_up_is_emitted_after_the_turn() {
        let mut results = MockResultSink::new();
        results.expect_persist().times(0);
        let (handle, mut events) = InterviewSession::spawn(
            "s-3",
            deps(
                replying(r#"{"text": "Next question?", "followUp": "Can you give an example?"}"#),
                results,
            ),
            config(),
        );

        events.recv().await.unwrap();
        handle.submit("my answer").await.unwrap();
        assert!(matches!(events.recv().await, Some(SessionEvent::InterviewerTurn(_))));
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::FollowUp {
                text: "Can you give an example?".into()
            })
        );
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timer_only_arms_on_stopped_speaking() {
        let mut results = MockResultSink::new();
        results.expect_persist().times(0);
        let (handle, mut events) =
            InterviewSession::spawn("s-4", deps(replying(r#"{"text": "Hi"}"#), results), config());
        events.recv().await.unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(events.try_recv().is_err(), "no reminder without an armed timer");

        handle.interviewer_stopped_speaking().await.unwrap();
        handle.interviewer_started_speaking().await.unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(events.try_recv().is_err(), "speaking disarms the timer");
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_typed_reminders_do_not_cancel_the_session() {
        let mut results = MockResultSink::new();
        results.expect_persist().times(0);
        let (handle, mut events) =
            InterviewSession::spawn("s-5", deps(replying(r#"{"text": "Hi"}"#), results), config());
        events.recv().await.unwrap();

        for _ in 0..4 {
            handle.submit("[SYSTEM] remind").await.unwrap();
            assert!(matches!(events.recv().await, Some(SessionEvent::InterviewerTurn(_))));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(events.try_recv().is_err(), "typed reminders never cancel");
        assert!(!handle.is_closed());

        handle.shutdown().await.unwrap();
        assert_eq!(events.recv().await, None);
    }
}
