//! Turn Processor
//!
//! Drives one request/response cycle with the completion service. A turn is
//! computed in two phases:
//!
//! 1. [`TurnProcessor::plan`] reads an immutable view of the store, calls the
//!    completion service, and validates and clamps its output. It never
//!    mutates anything, so an in-flight plan can be dropped at any time.
//! 2. [`TurnProcessor::commit`] appends the turns and folds the result into
//!    the store, provided the store has not moved on since the plan began.
//!
//! Counters are always recomputed from the transcript; the completion
//! service's self-reported counters are advisory only.

use crate::assessment::{SkillAssessment, TurnResult, UNKNOWN_TOPIC, clamp_score};
use crate::completion::{CompletionEvaluator, CompletionReason, CompletionSignals};
use crate::config::OrchestratorSettings;
use crate::directive::{CandidateInput, Directive};
use crate::llm_client::{CompletionRequest, CompletionService, request_turn_response};
use crate::locale::Language;
use crate::prompt::{InstructionBuilder, NextStep};
use crate::response::{AiSkillAssessment, AiTurnResponse};
use crate::store::SessionStateStore;
use crate::transcript::{Role, Turn, progress_for, questions_asked};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A turn computed against a snapshot of the store but not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTurn {
    base_len: usize,
    inbound: Turn,
    reply: Turn,
    pub result: TurnResult,
    pub reason: Option<CompletionReason>,
}

/// The committed result of one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub result: TurnResult,
    /// Set when this turn completed the session.
    pub reason: Option<CompletionReason>,
}

pub struct TurnProcessor {
    completion: Arc<dyn CompletionService>,
    instructions: InstructionBuilder,
    evaluator: CompletionEvaluator,
    settings: OrchestratorSettings,
}

impl TurnProcessor {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        settings: OrchestratorSettings,
        persona: Option<String>,
    ) -> Self {
        Self {
            completion,
            instructions: InstructionBuilder::new(persona, settings.question_count),
            evaluator: CompletionEvaluator::new(
                settings.question_count,
                settings.completion_policy,
            ),
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Classifies `text`, plans the turn and commits it.
    ///
    /// Returns `None` (and leaves the store untouched) for blank input or a
    /// session that is already complete.
    pub async fn advance(&self, text: &str, store: &mut SessionStateStore) -> Option<TurnOutcome> {
        let input = CandidateInput::classify(text, store.config().language)?;
        let planned = self.plan(&input, store).await?;
        self.commit(planned, store)
    }

    /// Computes the next turn without touching the store.
    pub async fn plan(
        &self,
        input: &CandidateInput,
        store: &SessionStateStore,
    ) -> Option<PlannedTurn> {
        if store.is_complete() {
            debug!("Ignoring input for a completed session");
            return None;
        }
        let planned = match input {
            CandidateInput::Answer(text) => {
                self.plan_reply(Turn::candidate(text.clone()), false, store)
                    .await
            }
            CandidateInput::Directive(Directive::End) => {
                self.plan_reply(Turn::directive(Directive::End.marker()), true, store)
                    .await
            }
            CandidateInput::Directive(Directive::Remind { attempt }) => {
                self.plan_reminder(*attempt, store).await
            }
        };
        Some(planned)
    }

    /// Applies a planned turn. A plan made against an older transcript, or
    /// against a session that has since completed, is discarded.
    pub fn commit(
        &self,
        planned: PlannedTurn,
        store: &mut SessionStateStore,
    ) -> Option<TurnOutcome> {
        if store.is_complete() || store.transcript().len() != planned.base_len {
            warn!(
                planned_at = planned.base_len,
                transcript_len = store.transcript().len(),
                "Discarding stale turn"
            );
            return None;
        }
        store.append(planned.inbound);
        store.append(planned.reply);
        store.apply(&planned.result);
        Some(TurnOutcome {
            result: planned.result,
            reason: planned.reason,
        })
    }

    async fn plan_reply(
        &self,
        inbound: Turn,
        end_directive: bool,
        store: &SessionStateStore,
    ) -> PlannedTurn {
        let config = store.config();
        let language = config.language;
        let transcript = store.transcript();
        let prior = store.state();
        let question_count = self.settings.question_count;

        // The reply being planned is itself an interviewer turn.
        let questions_asked = questions_asked(transcript.interviewer_turns() + 1);
        let candidate_answers =
            transcript.candidate_answers() + u32::from(inbound.role == Role::Candidate);

        let pinned = if end_directive || questions_asked >= question_count {
            None
        } else {
            store.curriculum().map(|c| c.next_question(questions_asked))
        };
        let step = if end_directive {
            NextStep::EndNow
        } else if questions_asked >= question_count {
            NextStep::Conclude
        } else if let Some(question) = pinned {
            NextStep::AskVerbatim(question)
        } else {
            NextStep::AskOpen
        };

        let instruction = self.instructions.build(config, questions_asked, &step);
        let mut turns = transcript.turns().to_vec();
        turns.push(inbound.clone());
        let response = request_turn_response(
            self.completion.as_ref(),
            self.settings.ai_call_timeout,
            CompletionRequest { instruction, turns },
        )
        .await;
        if response.is_none() {
            info!(questions_asked, "Using locally computed turn");
        }
        let response = response.unwrap_or_default();
        log_divergence(&response, questions_asked);

        let mut text = response
            .spoken_text()
            .map(str::to_string)
            .unwrap_or_else(|| fallback_text(language, &step));
        if let Some(question) = pinned {
            text = ensure_verbatim(text, question);
        }

        let skill_assessment =
            merge_skills(prior.skill_assessment, response.skill_assessment.as_ref());
        let score = clamp_score(response.score.unwrap_or_else(|| skill_assessment.average()));
        let current_topic = response
            .current_topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_TOPIC)
            .to_string();
        let should_advance_topic = response.should_advance_topic.unwrap_or(false);

        let mut covered: BTreeSet<String> = prior.covered_topics.clone();
        covered.extend(
            response
                .covered_topics
                .iter()
                .flatten()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        );
        if should_advance_topic && current_topic != UNKNOWN_TOPIC {
            covered.insert(current_topic.clone());
        }

        let ai_reported_complete = response.is_complete.unwrap_or(false);
        let reason = self.evaluator.evaluate(CompletionSignals {
            questions_asked,
            candidate_answers,
            ai_reported_complete,
            end_directive,
        });
        if ai_reported_complete && reason.is_none() {
            info!(questions_asked, "Ignoring premature completion reported by the interviewer");
        }
        let complete = reason.is_some();
        let progress = if complete {
            100
        } else {
            progress_for(questions_asked, question_count)
        };

        let result = TurnResult {
            text: text.clone(),
            current_topic,
            next_topic: non_blank(response.next_topic),
            should_advance_topic,
            follow_up: non_blank(response.follow_up),
            progress,
            complete,
            score,
            questions_asked,
            covered_topics: covered.into_iter().collect(),
            skill_assessment,
        };

        PlannedTurn {
            base_len: transcript.len(),
            inbound,
            reply: Turn::interviewer(text),
            result,
            reason,
        }
    }

    async fn plan_reminder(&self, attempt: u32, store: &SessionStateStore) -> PlannedTurn {
        let config = store.config();
        let transcript = store.transcript();
        let prior = store.state();
        let questions_asked = transcript.questions_asked();
        let tone = Language::reminder_tone(attempt, self.settings.max_reminders);
        let step = NextStep::Remind { attempt, tone };

        let directive = Turn::directive(Directive::Remind { attempt }.marker());
        let instruction = self.instructions.build(config, questions_asked, &step);
        let mut turns = transcript.turns().to_vec();
        turns.push(directive.clone());
        let response = request_turn_response(
            self.completion.as_ref(),
            self.settings.ai_call_timeout,
            CompletionRequest { instruction, turns },
        )
        .await;

        let text = response
            .as_ref()
            .and_then(AiTurnResponse::spoken_text)
            .map(str::to_string)
            .unwrap_or_else(|| fallback_text(config.language, &step));

        let result = TurnResult {
            text: text.clone(),
            current_topic: prior
                .current_topic
                .clone()
                .unwrap_or_else(|| UNKNOWN_TOPIC.to_string()),
            next_topic: None,
            should_advance_topic: false,
            follow_up: None,
            progress: prior.progress,
            complete: false,
            score: prior.skill_assessment.average(),
            questions_asked: prior.questions_asked.max(questions_asked),
            covered_topics: prior.covered_topics.iter().cloned().collect(),
            skill_assessment: prior.skill_assessment,
        };

        PlannedTurn {
            base_len: transcript.len(),
            inbound: directive,
            reply: Turn::reminder(text),
            result,
            reason: None,
        }
    }
}

/// Scripted interviewer text for when the completion service gives nothing usable.
fn fallback_text(language: Language, step: &NextStep<'_>) -> String {
    match step {
        NextStep::OpenWith(question) => format!("{} {}", language.acknowledgement(), question),
        NextStep::AskVerbatim(question) => {
            format!("{}\n\n{}", language.acknowledgement(), question)
        }
        NextStep::AskOpen => {
            format!("{}\n\n{}", language.acknowledgement(), language.open_question())
        }
        NextStep::Conclude | NextStep::EndNow => language.closing().to_string(),
        NextStep::Remind { attempt, .. } => language.reminder(*attempt).to_string(),
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Makes sure `question` appears word for word in `text`, appending it if
/// the interviewer paraphrased or skipped it.
pub(crate) fn ensure_verbatim(text: String, question: &str) -> String {
    if normalize(&text).contains(&normalize(question)) {
        text
    } else {
        debug!("Interviewer did not ask the curriculum item verbatim; appending it");
        format!("{}\n\n{}", text.trim_end(), question)
    }
}

fn merge_skills(prior: SkillAssessment, reported: Option<&AiSkillAssessment>) -> SkillAssessment {
    let Some(reported) = reported else {
        return prior;
    };
    SkillAssessment {
        technical: reported.technical.map(clamp_score).unwrap_or(prior.technical),
        communication: reported
            .communication
            .map(clamp_score)
            .unwrap_or(prior.communication),
        problem_solving: reported
            .problem_solving
            .map(clamp_score)
            .unwrap_or(prior.problem_solving),
    }
    .clamped()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn log_divergence(response: &AiTurnResponse, questions_asked: u32) {
    if let Some(reported) = response.questions_asked {
        if reported.round() as i64 != i64::from(questions_asked) {
            debug!(
                reported,
                questions_asked, "Interviewer-reported question count differs from transcript"
            );
        }
    }
    if let Some(progress) = response.progress {
        debug!(reported_progress = progress.clamp(0.0, 100.0), "Interviewer-reported progress");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionPolicy;
    use crate::config::InterviewConfig;
    use crate::curriculum::Curriculum;
    use crate::llm_client::MockCompletionService;
    use mockall::Sequence;

    fn settings(question_count: u32) -> OrchestratorSettings {
        OrchestratorSettings {
            question_count,
            ..OrchestratorSettings::default()
        }
    }

    fn store_with(curriculum: Option<Vec<&str>>) -> SessionStateStore {
        let curriculum = curriculum
            .and_then(|qs| Curriculum::new(qs.into_iter().map(String::from).collect(), 10));
        let config = InterviewConfig::new("Backend", "mid", Language::En);
        let mut store = SessionStateStore::new(config, curriculum);
        store.append(Turn::interviewer("Welcome! Q1?"));
        store
    }

    fn reply(json: &str) -> MockCompletionService {
        let json = json.to_string();
        let mut mock = MockCompletionService::new();
        mock.expect_complete().returning(move |_| Ok(json.clone()));
        mock
    }

    #[tokio::test]
    async fn test_advance_counts_from_transcript() {
        let processor = TurnProcessor::new(
            Arc::new(reply(r#"{"text": "Nice. Next?", "questionsAsked": 7}"#)),
            settings(10),
            None,
        );
        let mut store = store_with(None);

        let first = processor.advance("answer one", &mut store).await.unwrap();
        assert_eq!(first.result.questions_asked, 1);
        assert_eq!(first.result.progress, 10);
        assert_eq!(first.reason, None);

        let second = processor.advance("answer two", &mut store).await.unwrap();
        assert_eq!(second.result.questions_asked, 2);
        assert_eq!(store.transcript().len(), 5);
        assert_eq!(store.transcript().questions_asked(), 2);
    }

    #[tokio::test]
    async fn test_curriculum_item_is_pinned_and_appended_when_missing() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .withf(|req| req.instruction.contains("\"What is a B-tree?\""))
            .times(1)
            .returning(|_| Ok(r#"{"text": "Good. Tell me about indexes."}"#.to_string()));
        let processor = TurnProcessor::new(Arc::new(mock), settings(10), None);
        let mut store = store_with(Some(vec!["What is an index?", "What is a B-tree?", "Q3"]));

        let outcome = processor.advance("It speeds up lookups", &mut store).await.unwrap();
        assert!(outcome.result.text.ends_with("What is a B-tree?"));
        assert!(outcome.result.text.starts_with("Good."));
    }

    #[tokio::test]
    async fn test_out_of_range_values_are_clamped() {
        let processor = TurnProcessor::new(
            Arc::new(reply(
                r#"{"text": "ok", "score": 55, "progress": 400,
                    "skillAssessment": {"technical": -4, "communication": 12, "problemSolving": "7"}}"#,
            )),
            settings(10),
            None,
        );
        let mut store = store_with(None);
        let outcome = processor.advance("answer", &mut store).await.unwrap();
        let r = outcome.result;
        assert_eq!(r.score, 10.0);
        assert_eq!(r.progress, 10);
        assert_eq!(r.skill_assessment.technical, 0.0);
        assert_eq!(r.skill_assessment.communication, 10.0);
        assert_eq!(r.skill_assessment.problem_solving, 7.0);
    }

    #[tokio::test]
    async fn test_unparsable_reply_keeps_prior_scores() {
        let mut seq = Sequence::new();
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(r#"{"text": "Q2?", "skillAssessment":
                    {"technical": 6, "communication": 5, "problemSolving": 4}}"#
                    .to_string())
            });
        mock.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("<html>502 Bad Gateway</html>".to_string()));
        let processor = TurnProcessor::new(Arc::new(mock), settings(10), None);
        let mut store = store_with(None);

        processor.advance("one", &mut store).await.unwrap();
        let outcome = processor.advance("two", &mut store).await.unwrap();
        assert_eq!(outcome.result.questions_asked, 2);
        assert_eq!(outcome.result.skill_assessment.technical, 6.0);
        assert_eq!(outcome.result.skill_assessment.problem_solving, 4.0);
        assert_eq!(outcome.result.current_topic, UNKNOWN_TOPIC);
        assert!(!outcome.result.complete);
        assert!(outcome.result.text.contains(Language::En.acknowledgement()));
    }

    #[tokio::test]
    async fn test_blank_input_and_completed_session_are_no_ops() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete().times(0);
        let processor = TurnProcessor::new(Arc::new(mock), settings(10), None);
        let mut store = store_with(None);

        assert!(processor.advance("   ", &mut store).await.is_none());
        assert_eq!(store.transcript().len(), 1);

        let mut done = store_with(None);
        done.apply(&TurnResult {
            text: String::new(),
            current_topic: String::new(),
            next_topic: None,
            should_advance_topic: false,
            follow_up: None,
            progress: 100,
            complete: true,
            score: 0.0,
            questions_asked: 0,
            covered_topics: vec![],
            skill_assessment: SkillAssessment::default(),
        });
        assert!(processor.advance("hello", &mut done).await.is_none());
        assert_eq!(done.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_end_phrase_completes_with_full_progress() {
        let processor = TurnProcessor::new(
            Arc::new(reply(r#"{"text": "Thanks for your time.", "isComplete": true}"#)),
            settings(10),
            None,
        );
        let mut store = store_with(Some(vec!["Q1", "Q2"]));
        let outcome = processor
            .advance("Sorry, I want to end the interview", &mut store)
            .await
            .unwrap();
        assert_eq!(outcome.reason, Some(CompletionReason::EndRequested));
        assert!(outcome.result.complete);
        assert_eq!(outcome.result.progress, 100);
        assert_eq!(outcome.result.text, "Thanks for your time.");
        assert_eq!(store.transcript().turns()[1].role, Role::Directive);
        assert!(store.is_complete());
    }

    #[tokio::test]
    async fn test_premature_completion_respects_policy() {
        let strict = TurnProcessor::new(
            Arc::new(reply(r#"{"text": "We're done!", "isComplete": true}"#)),
            settings(10),
            None,
        );
        let mut store = store_with(None);
        let outcome = strict.advance("answer", &mut store).await.unwrap();
        assert!(!outcome.result.complete);
        assert!(!store.is_complete());

        let trusting = TurnProcessor::new(
            Arc::new(reply(r#"{"text": "We're done!", "isComplete": true}"#)),
            OrchestratorSettings {
                completion_policy: CompletionPolicy::TrustAi,
                ..settings(10)
            },
            None,
        );
        let mut store = store_with(None);
        let outcome = trusting.advance("answer", &mut store).await.unwrap();
        assert_eq!(outcome.reason, Some(CompletionReason::InterviewerConcluded));
        assert_eq!(outcome.result.progress, 100);
    }

    #[tokio::test]
    async fn test_reminder_is_not_counted_and_falls_back_to_script() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .withf(|req| req.instruction.contains("firm tone"))
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("timeout")));
        let processor = TurnProcessor::new(Arc::new(mock), settings(10), None);
        let store = store_with(None);

        let planned = processor
            .plan(
                &CandidateInput::Directive(Directive::Remind { attempt: 2 }),
                &store,
            )
            .await
            .unwrap();
        let mut store = store;
        let outcome = processor.commit(planned, &mut store).unwrap();
        assert_eq!(outcome.result.text, Language::En.reminder(2));
        assert_eq!(store.transcript().questions_asked(), 0);
        assert!(store.transcript().turns()[2].reminder);
    }

    #[tokio::test]
    async fn test_stale_plan_is_discarded() {
        let completion = Arc::new(reply(r#"{"text": "ok"}"#));
        let processor = TurnProcessor::new(completion, settings(10), None);
        let mut store = store_with(None);
        let planned = processor
            .plan(&CandidateInput::Answer("late".into()), &store)
            .await
            .unwrap();
        processor.advance("fresh", &mut store).await.unwrap();
        assert!(processor.commit(planned, &mut store).is_none());
        assert_eq!(store.transcript().len(), 3);
    }

    #[test]
    fn test_ensure_verbatim() {
        assert_eq!(
            ensure_verbatim("Great.  what is   RAII?".into(), "What is RAII?"),
            "Great.  what is   RAII?"
        );
        assert_eq!(
            ensure_verbatim("Great. Explain RAII.".into(), "What is RAII?"),
            "Great. Explain RAII.\n\nWhat is RAII?"
        );
    }
}
