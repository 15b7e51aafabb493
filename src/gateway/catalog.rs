// The fixed set of backend operations the client may invoke.
//
// Each operation is a zero-sized marker implementing `Operation`, which ties
// the static endpoint entry to its request and response types. `CATALOG`
// lists every entry for introspection and tests.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use super::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Static description of one backend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Logical operation name, as used in logs and metrics.
    pub name: &'static str,
    pub method: HttpMethod,
    pub path: &'static str,
    /// Request body fields; a trailing `?` marks an optional field.
    pub request_fields: &'static [&'static str],
    pub response_fields: &'static [&'static str],
    /// Safe to repeat: the retry policy only applies to these.
    pub idempotent: bool,
}

impl Endpoint {
    /// Whether `field` is declared in the request set, optional or not.
    pub fn accepts_field(&self, field: &str) -> bool {
        self.request_fields
            .iter()
            .any(|f| f.trim_end_matches('?') == field)
    }
}

/// A catalog operation: endpoint plus typed request/response.
pub trait Operation {
    type Request: Serialize + Send + Sync;
    type Response: DeserializeOwned + Send;
    const ENDPOINT: Endpoint;
}

pub mod op {
    use super::*;

    pub struct Health;
    pub struct HeroesRemaining;
    pub struct PickHero;
    pub struct MarkUsed;
    pub struct CounterPick;
    pub struct TierList;
    pub struct QuizGenerate;
    pub struct QuizCheck;
    pub struct DailyGenerate;
    pub struct PatchExplain;
    pub struct VerifyIdentity;
    pub struct AiPing;

    impl Operation for Health {
        type Request = ();
        type Response = super::Health;
        const ENDPOINT: Endpoint = Endpoint {
            name: "health",
            method: HttpMethod::Get,
            path: "/health",
            request_fields: &[],
            response_fields: &["status"],
            idempotent: true,
        };
    }

    impl Operation for HeroesRemaining {
        type Request = ();
        type Response = super::HeroesRemaining;
        const ENDPOINT: Endpoint = Endpoint {
            name: "heroesRemaining",
            method: HttpMethod::Get,
            path: "/heroes/remaining",
            request_fields: &[],
            response_fields: &["remaining", "used_count", "total"],
            idempotent: true,
        };
    }

    impl Operation for PickHero {
        type Request = EmptyBody;
        type Response = PickedHero;
        const ENDPOINT: Endpoint = Endpoint {
            name: "pickHero",
            method: HttpMethod::Post,
            path: "/heroes/pick",
            request_fields: &[],
            response_fields: &["hero"],
            idempotent: false,
        };
    }

    impl Operation for MarkUsed {
        type Request = MarkUsedRequest;
        type Response = IgnoredAny;
        const ENDPOINT: Endpoint = Endpoint {
            name: "markUsed",
            method: HttpMethod::Post,
            path: "/heroes/mark-used",
            request_fields: &["hero"],
            response_fields: &[],
            idempotent: false,
        };
    }

    impl Operation for CounterPick {
        type Request = CounterPickRequest;
        type Response = super::CounterPick;
        const ENDPOINT: Endpoint = Endpoint {
            name: "counterPick",
            method: HttpMethod::Post,
            path: "/ai/counter-pick",
            request_fields: &["enemy", "lane?", "role?"],
            response_fields: &["enemy", "answer"],
            idempotent: false,
        };
    }

    impl Operation for TierList {
        type Request = TierListRequest;
        type Response = super::TierList;
        const ENDPOINT: Endpoint = Endpoint {
            name: "tierList",
            method: HttpMethod::Post,
            path: "/ai/tier-list",
            request_fields: &["role?", "lane?", "skill?", "note?"],
            response_fields: &["S", "A", "B", "notes"],
            idempotent: false,
        };
    }

    impl Operation for QuizGenerate {
        type Request = QuizGenerateRequest;
        type Response = QuizQuestion;
        const ENDPOINT: Endpoint = Endpoint {
            name: "quizGenerate",
            method: HttpMethod::Post,
            path: "/quiz/generate",
            request_fields: &["topic?", "difficulty"],
            response_fields: &[
                "quiz_id",
                "question",
                "options",
                "correct_index",
                "explanation?",
            ],
            idempotent: false,
        };
    }

    impl Operation for QuizCheck {
        type Request = QuizCheckRequest;
        type Response = QuizVerdict;
        const ENDPOINT: Endpoint = Endpoint {
            name: "quizCheck",
            method: HttpMethod::Post,
            path: "/quiz/check",
            request_fields: &["quiz_id", "answer_index"],
            response_fields: &[
                "correct",
                "correct_index",
                "explanation",
                "question",
                "options",
            ],
            idempotent: true,
        };
    }

    impl Operation for DailyGenerate {
        type Request = EmptyBody;
        type Response = DailyChallenge;
        const ENDPOINT: Endpoint = Endpoint {
            name: "dailyGenerate",
            method: HttpMethod::Post,
            path: "/daily/generate",
            request_fields: &[],
            response_fields: &["date", "text", "cached"],
            idempotent: false,
        };
    }

    impl Operation for PatchExplain {
        type Request = PatchExplainRequest;
        type Response = PatchSummary;
        const ENDPOINT: Endpoint = Endpoint {
            name: "patchExplain",
            method: HttpMethod::Post,
            path: "/ai/patch-explain",
            request_fields: &["notes_text"],
            response_fields: &["summary"],
            idempotent: false,
        };
    }

    impl Operation for VerifyIdentity {
        type Request = VerifyRequest;
        type Response = TrustDecision;
        const ENDPOINT: Endpoint = Endpoint {
            name: "verifyIdentity",
            method: HttpMethod::Post,
            path: "/tg/verify",
            request_fields: &["init_data"],
            response_fields: &["ok"],
            idempotent: false,
        };
    }

    impl Operation for AiPing {
        type Request = ();
        type Response = super::AiPing;
        const ENDPOINT: Endpoint = Endpoint {
            name: "aiPing",
            method: HttpMethod::Get,
            path: "/debug/ai-ping",
            request_fields: &[],
            response_fields: &["ok", "model?", "reason?"],
            idempotent: true,
        };
    }
}

/// Every operation the client is permitted to invoke.
pub static CATALOG: [Endpoint; 12] = [
    <op::Health as Operation>::ENDPOINT,
    <op::HeroesRemaining as Operation>::ENDPOINT,
    <op::PickHero as Operation>::ENDPOINT,
    <op::MarkUsed as Operation>::ENDPOINT,
    <op::CounterPick as Operation>::ENDPOINT,
    <op::TierList as Operation>::ENDPOINT,
    <op::QuizGenerate as Operation>::ENDPOINT,
    <op::QuizCheck as Operation>::ENDPOINT,
    <op::DailyGenerate as Operation>::ENDPOINT,
    <op::PatchExplain as Operation>::ENDPOINT,
    <op::VerifyIdentity as Operation>::ENDPOINT,
    <op::AiPing as Operation>::ENDPOINT,
];

/// Look up a catalog entry by its logical name.
pub fn find(name: &str) -> Option<&'static Endpoint> {
    CATALOG.iter().find(|e| e.name == name)
}
