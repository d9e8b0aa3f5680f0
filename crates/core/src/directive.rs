//! Classification of inbound text into answers and directives.

use crate::locale::Language;

/// Prefix that marks a plain-text message as an orchestrator directive.
/// Kept so that clients speaking the text-only protocol still work.
pub const DIRECTIVE_PREFIX: &str = "[SYSTEM]";

/// Words an end phrase may be padded with ("please end the interview now").
/// Longer utterances are answers that merely mention ending something.
const MAX_EXTRA_WORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Ask the interviewer to nudge a silent candidate. `attempt` is 1-based.
    Remind { attempt: u32 },
    /// Finish the interview now.
    End,
}

impl Directive {
    /// Transcript text for this directive.
    pub fn marker(&self) -> String {
        match self {
            Directive::Remind { attempt } => {
                format!("{} remind the candidate (attempt {})", DIRECTIVE_PREFIX, attempt)
            }
            Directive::End => format!("{} end the interview now", DIRECTIVE_PREFIX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateInput {
    Answer(String),
    Directive(Directive),
}

impl CandidateInput {
    /// Classifies raw inbound text. Returns `None` for blank input.
    ///
    /// Text carrying [`DIRECTIVE_PREFIX`] is parsed as a directive. A short
    /// utterance built around one of the language's end phrases (or an
    /// English one) is an end directive; the rest are answers.
    pub fn classify(text: &str, language: Language) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(body) = trimmed.strip_prefix(DIRECTIVE_PREFIX) {
            return Some(CandidateInput::Directive(parse_directive_body(body)));
        }

        if is_end_phrase(trimmed, language) {
            return Some(CandidateInput::Directive(Directive::End));
        }

        Some(CandidateInput::Answer(trimmed.to_string()))
    }

    pub fn is_end(&self) -> bool {
        matches!(self, CandidateInput::Directive(Directive::End))
    }
}

fn parse_directive_body(body: &str) -> Directive {
    let lower = body.to_lowercase();
    if lower.contains("end") || lower.contains("stop") || lower.contains("terminate") {
        return Directive::End;
    }
    let attempt = lower
        .split(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);
    Directive::Remind { attempt }
}

/// Lowercases, folds curly apostrophes and drops punctuation.
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('’', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_end_phrase(text: &str, language: Language) -> bool {
    let utterance = words(text);
    let localized = language.end_phrases().iter();
    let english = Language::En.end_phrases().iter();
    localized.chain(english).any(|phrase| {
        let phrase = words(phrase);
        utterance.len() <= phrase.len() + MAX_EXTRA_WORDS
            && utterance.windows(phrase.len()).any(|w| w == phrase.as_slice())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_is_rejected() {
        assert_eq!(CandidateInput::classify("   \n", Language::En), None);
    }

    #[test]
    fn test_plain_answer() {
        assert_eq!(
            CandidateInput::classify("  A mutex guards shared state. ", Language::En),
            Some(CandidateInput::Answer("A mutex guards shared state.".into()))
        );
    }

    #[test]
    fn test_prefixed_remind_directive() {
        assert_eq!(
            CandidateInput::classify("[SYSTEM] remind the candidate (attempt 2)", Language::En),
            Some(CandidateInput::Directive(Directive::Remind { attempt: 2 }))
        );
        assert_eq!(
            CandidateInput::classify("[SYSTEM] remind", Language::Fr),
            Some(CandidateInput::Directive(Directive::Remind { attempt: 1 }))
        );
    }

    #[test]
    fn test_marker_round_trips_through_classify() {
        for directive in [Directive::End, Directive::Remind { attempt: 3 }] {
            assert_eq!(
                CandidateInput::classify(&directive.marker(), Language::En),
                Some(CandidateInput::Directive(directive))
            );
        }
    }

    fn is_end(text: &str, language: Language) -> bool {
        CandidateInput::classify(text, language).is_some_and(|input| input.is_end())
    }

    #[test]
    fn test_end_phrases_per_language() {
        assert!(is_end("Terminer l’entretien, merci.", Language::Fr));
        assert!(is_end("On arrête là !", Language::Fr));
        assert!(is_end("Please END the   interview.", Language::De));
        assert!(is_end("Let’s stop here, thanks", Language::En));
        assert!(is_end("Ich möchte das Interview beenden.", Language::De));
        assert!(is_end("Quiero terminar la entrevista", Language::Es));
    }

    #[test]
    fn test_answers_mentioning_stopping_are_not_end_requests() {
        assert!(!is_end("I would end with a retry loop", Language::En));
        assert!(!is_end(
            "On timeout I want to stop the worker thread and retry with backoff.",
            Language::En
        ));
        assert!(!is_end(
            "Pour un processus bloqué, je veux arrêter proprement avec SIGTERM.",
            Language::Fr
        ));
        assert!(!is_end(
            "In the last round the panel would end the interview and send feedback to HR.",
            Language::En
        ));
        assert!(!is_end("Let's stop herding cats", Language::En));
    }
}
