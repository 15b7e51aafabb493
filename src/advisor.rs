// The AI collaborator behind the stub backend.
//
// The real service delegates to a language model; the stub only needs
// deterministic answers with the right shape. `FallbackAdvisor` gives the
// answers the service falls back to when no model is configured.

use crate::gateway::types::{AiPing, Difficulty, TierList, TierListRequest};

/// A generated question before it is stored and given an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: i64,
    pub explanation: Option<String>,
}

pub trait Advisor: Send + Sync {
    fn counter_pick(&self, enemy: &str, lane: Option<&str>, role: Option<&str>) -> String;
    fn tier_list(&self, req: &TierListRequest) -> TierList;
    fn quiz(&self, topic: Option<&str>, difficulty: Difficulty) -> QuizDraft;
    fn daily_challenge(&self) -> String;
    fn explain_patch(&self, notes_text: &str) -> String;
    fn ping(&self) -> AiPing;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackAdvisor;

impl Advisor for FallbackAdvisor {
    fn counter_pick(&self, enemy: &str, lane: Option<&str>, role: Option<&str>) -> String {
        let mut answer = format!(
            "Against {enemy}, pick heroes with hard crowd control and save your key skills for their engage. \
             Anti-heal and interrupts are the main tools."
        );
        if let Some(lane) = lane {
            answer.push_str(&format!("\nLane: {lane}."));
        }
        if let Some(role) = role {
            answer.push_str(&format!("\nYour role: {role}."));
        }
        answer
    }

    fn tier_list(&self, _req: &TierListRequest) -> TierList {
        TierList {
            s: Vec::new(),
            a: Vec::new(),
            b: Vec::new(),
            notes: "Tier list unavailable: no model configured.".to_string(),
        }
    }

    fn quiz(&self, _topic: Option<&str>, difficulty: Difficulty) -> QuizDraft {
        match difficulty {
            Difficulty::Easy => QuizDraft {
                question: "What does Necklace of Durance provide?".to_string(),
                options: vec![
                    "Anti-heal".to_string(),
                    "Shield".to_string(),
                    "Attack speed".to_string(),
                    "Lifesteal".to_string(),
                ],
                correct_index: 0,
                explanation: Some("It reduces the target's healing.".to_string()),
            },
            Difficulty::Medium => QuizDraft {
                question: "Which battle spell lets a hero dash a short distance instantly?"
                    .to_string(),
                options: vec![
                    "Retribution".to_string(),
                    "Flicker".to_string(),
                    "Purify".to_string(),
                    "Vengeance".to_string(),
                ],
                correct_index: 1,
                explanation: Some("Flicker teleports the hero a short distance.".to_string()),
            },
            Difficulty::Hard => QuizDraft {
                question: "Which role usually takes Retribution?".to_string(),
                options: vec![
                    "Roamer".to_string(),
                    "Mid laner".to_string(),
                    "Jungler".to_string(),
                    "Gold laner".to_string(),
                ],
                correct_index: 2,
                explanation: Some("Retribution speeds up jungle clearing and secures objectives.".to_string()),
            },
        }
    }

    fn daily_challenge(&self) -> String {
        "Win a match without dying more than 2 times!".to_string()
    }

    fn explain_patch(&self, notes_text: &str) -> String {
        let points: Vec<String> = notes_text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(10)
            .map(|l| format!("- {l}"))
            .collect();
        if points.is_empty() {
            "No notable changes.".to_string()
        } else {
            points.join("\n")
        }
    }

    fn ping(&self) -> AiPing {
        AiPing {
            ok: false,
            model: None,
            reason: Some("no_api_key".to_string()),
        }
    }
}
