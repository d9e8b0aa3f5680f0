//! Per-language scripted content.
//!
//! Everything in this module is deterministic: it is what the orchestrator
//! falls back to when the completion service is unreachable or returns
//! something unusable, plus the phrase list used to recognise an explicit
//! request to end the interview.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interview language. Serialized as its ISO 639-1 code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    Es,
    De,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::Es => "es",
            Language::De => "de",
        }
    }

    /// English name of the language, used inside instruction payloads.
    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Fr => "French",
            Language::Es => "Spanish",
            Language::De => "German",
        }
    }

    /// Opening line used when the greeting cannot be generated.
    pub fn greeting(self, field: &str) -> String {
        match self {
            Language::En => format!(
                "Hello, and welcome to your {field} interview. I will ask you a series of questions; take your time with each answer."
            ),
            Language::Fr => format!(
                "Bonjour et bienvenue à votre entretien en {field}. Je vais vous poser une série de questions ; prenez le temps de répondre à chacune."
            ),
            Language::Es => format!(
                "Hola y bienvenido a su entrevista de {field}. Le haré una serie de preguntas; tómese su tiempo para responder cada una."
            ),
            Language::De => format!(
                "Hallo und willkommen zu Ihrem Interview im Bereich {field}. Ich werde Ihnen eine Reihe von Fragen stellen; nehmen Sie sich für jede Antwort Zeit."
            ),
        }
    }

    /// Open question asked when no curriculum is available.
    pub fn introduction_question(self) -> &'static str {
        match self {
            Language::En => "To begin, could you introduce yourself and walk me through your background?",
            Language::Fr => "Pour commencer, pourriez-vous vous présenter et me parler de votre parcours ?",
            Language::Es => "Para empezar, ¿podría presentarse y contarme sobre su trayectoria?",
            Language::De => "Könnten Sie sich zu Beginn kurz vorstellen und mir Ihren Werdegang schildern?",
        }
    }

    /// Generic follow-on question used by the fallback path without a curriculum.
    pub fn open_question(self) -> &'static str {
        match self {
            Language::En => "Could you describe a recent project you are proud of and the hardest problem you solved in it?",
            Language::Fr => "Pourriez-vous décrire un projet récent dont vous êtes fier et le problème le plus difficile que vous y avez résolu ?",
            Language::Es => "¿Podría describir un proyecto reciente del que esté orgulloso y el problema más difícil que resolvió en él?",
            Language::De => "Könnten Sie ein aktuelles Projekt beschreiben, auf das Sie stolz sind, und das schwierigste Problem, das Sie dabei gelöst haben?",
        }
    }

    pub fn acknowledgement(self) -> &'static str {
        match self {
            Language::En => "Thank you for your answer.",
            Language::Fr => "Merci pour votre réponse.",
            Language::Es => "Gracias por su respuesta.",
            Language::De => "Vielen Dank für Ihre Antwort.",
        }
    }

    pub fn closing(self) -> &'static str {
        match self {
            Language::En => "That concludes our interview. Thank you for your time; your results will be available shortly.",
            Language::Fr => "Ceci conclut notre entretien. Merci pour votre temps ; vos résultats seront bientôt disponibles.",
            Language::Es => "Con esto concluye nuestra entrevista. Gracias por su tiempo; sus resultados estarán disponibles en breve.",
            Language::De => "Damit ist unser Interview beendet. Vielen Dank für Ihre Zeit; Ihre Ergebnisse sind in Kürze verfügbar.",
        }
    }

    /// Scripted idle reminder for the given 1-based attempt. Tone escalates
    /// from gentle to firm to final; attempts past the last script reuse it.
    pub fn reminder(self, attempt: u32) -> &'static str {
        let scripts = match self {
            Language::En => [
                "Take your time. Whenever you are ready, please go ahead with your answer.",
                "I haven't heard from you for a while. Please answer the question so we can continue.",
                "This is a final reminder: if I do not receive an answer, the interview will be ended.",
            ],
            Language::Fr => [
                "Prenez votre temps. Quand vous êtes prêt, n'hésitez pas à répondre.",
                "Je n'ai pas eu de réponse depuis un moment. Merci de répondre à la question pour que nous puissions continuer.",
                "Ceci est un dernier rappel : sans réponse de votre part, l'entretien sera interrompu.",
            ],
            Language::Es => [
                "Tómese su tiempo. Cuando esté listo, adelante con su respuesta.",
                "No he recibido respuesta en un rato. Por favor, responda a la pregunta para poder continuar.",
                "Este es un último aviso: si no recibo una respuesta, la entrevista terminará.",
            ],
            Language::De => [
                "Lassen Sie sich Zeit. Sobald Sie bereit sind, antworten Sie bitte.",
                "Ich habe eine Weile nichts von Ihnen gehört. Bitte beantworten Sie die Frage, damit wir fortfahren können.",
                "Dies ist eine letzte Erinnerung: Wenn ich keine Antwort erhalte, wird das Interview beendet.",
            ],
        };
        let index = (attempt.max(1) as usize - 1).min(scripts.len() - 1);
        scripts[index]
    }

    /// Tone label handed to the completion service for a reminder attempt.
    pub fn reminder_tone(attempt: u32, max_attempts: u32) -> &'static str {
        if attempt >= max_attempts {
            "final"
        } else if attempt <= 1 {
            "gentle"
        } else {
            "firm"
        }
    }

    /// Phrases that, said as a short utterance of their own, end the
    /// interview immediately. Lowercase, punctuation-free.
    pub fn end_phrases(self) -> &'static [&'static str] {
        match self {
            Language::En => &[
                "end the interview",
                "stop the interview",
                "finish the interview",
                "let's stop here",
            ],
            Language::Fr => &[
                "terminer l'entretien",
                "arrêter l'entretien",
                "finir l'entretien",
                "on arrête là",
            ],
            Language::Es => &[
                "terminar la entrevista",
                "finalizar la entrevista",
                "detener la entrevista",
            ],
            Language::De => &["interview beenden", "interview abbrechen"],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "fr" | "french" | "français" => Ok(Language::Fr),
            "es" | "spanish" | "español" => Ok(Language::Es),
            "de" | "german" | "deutsch" => Ok(Language::De),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}
