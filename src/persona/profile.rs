//! Partner personas, player gender, and the fixed name/greeting tables.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Persona
// ---------------------------------------------------------------------------

/// One of the three simulated partner personalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Persona {
    /// Big reactions, quick to like, warm.
    Emotional,
    /// Calm, probing, values-driven.
    Logical,
    /// Teasing, direct, breaks the ice.
    Tough,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::Emotional, Persona::Logical, Persona::Tough];

    /// Wire code used in prompts, logs and table rows.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Emotional => "EMOTIONAL",
            Self::Logical => "LOGICAL",
            Self::Tough => "TOUGH",
        }
    }

    /// Parse a wire code, case-insensitively. Unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "EMOTIONAL" => Some(Self::Emotional),
            "LOGICAL" => Some(Self::Logical),
            "TOUGH" => Some(Self::Tough),
            _ => None,
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Gender
// ---------------------------------------------------------------------------

/// Player gender as stored in the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }

    /// The partner is always the other gender.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Lookup tables, keyed by the partner's gender
// ---------------------------------------------------------------------------

/// Name used in the base prompt when the persona is unmapped.
pub const FALLBACK_PROMPT_NAME: &str = "상대방";
/// Display name returned for unmapped personas.
pub const UNKNOWN_DISPLAY_NAME: &str = "알 수 없음";
/// Greeting returned for unmapped personas.
pub const FALLBACK_GREETING: &str = "안녕하세요! 반가워요.";

pub(crate) fn partner_name(persona: Persona, partner: Gender) -> &'static str {
    match (partner, persona) {
        (Gender::Male, Persona::Emotional) => "김민수",
        (Gender::Male, Persona::Logical) => "이진우",
        (Gender::Male, Persona::Tough) => "박태양",
        (Gender::Female, Persona::Emotional) => "이지은",
        (Gender::Female, Persona::Logical) => "김서윤",
        (Gender::Female, Persona::Tough) => "박하윤",
    }
}

fn partner_greeting(persona: Persona, partner: Gender) -> &'static str {
    match (partner, persona) {
        (Gender::Male, Persona::Emotional) => {
            "안녕하세요! 오시느라 고생 많으셨죠? 날씨가 꽤 춥네요 ㅠㅠ 따뜻한 거라도 먼저 시키실래요?"
        }
        (Gender::Male, Persona::Logical) => {
            "안녕하세요. 이진우입니다. 약속 시간 딱 맞춰 오셨네요. 앉으시죠."
        }
        (Gender::Male, Persona::Tough) => {
            "오, 안녕하세요? 사진보다 실물이 훨씬 좋으시네요. 깜짝 놀랐어요 ㅋㅋ"
        }
        (Gender::Female, Persona::Emotional) => "안녕하세요! 오시는 길 괜찮으셨어요?",
        (Gender::Female, Persona::Logical) => {
            "안녕하세요, 김서윤입니다. 만나서 반가워요. 주말인데 시간 내주셔서 감사합니다."
        }
        (Gender::Female, Persona::Tough) => {
            "어? 안녕하세요! 생각보다 일찍 오셨네요? 저 기다리는 거 잘 못하는데 다행이다 ㅋㅋ"
        }
    }
}

/// Display name of the partner the player will meet.
pub fn persona_display_name(persona: Option<Persona>, user_gender: Gender) -> String {
    persona
        .map(|p| partner_name(p, user_gender.opposite()))
        .unwrap_or(UNKNOWN_DISPLAY_NAME)
        .to_string()
}

/// Opening line the partner says when the round starts.
pub fn first_greeting(persona: Option<Persona>, user_gender: Gender) -> String {
    persona
        .map(|p| partner_greeting(p, user_gender.opposite()))
        .unwrap_or(FALLBACK_GREETING)
        .to_string()
}
