use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use super::UnknownVariant;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub unit_id: i64,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub answer_text: String,
    pub hint: Option<String>,
    pub answer_note: Option<String>,
    pub discarded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    pub fn is_kept(&self) -> bool {
        self.discarded_at.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum QuestionType {
    #[default]
    Word = 0,
    Sentence = 1,
    Calculation = 2,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::Word,
        QuestionType::Sentence,
        QuestionType::Calculation,
    ];

    pub fn key(self) -> &'static str {
        match self {
            QuestionType::Word => "word",
            QuestionType::Sentence => "sentence",
            QuestionType::Calculation => "calculation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuestionType::Word => "単語",
            QuestionType::Sentence => "文章",
            QuestionType::Calculation => "計算",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for QuestionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        QuestionType::ALL
            .into_iter()
            .find(|t| t.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVariant {
                kind: "question type",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum Difficulty {
    #[default]
    Easy = 1,
    Normal = 2,
    Hard = 3,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn key(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "易しい",
            Difficulty::Normal => "普通",
            Difficulty::Hard => "難しい",
        }
    }

    /// Longer label used on test sheets.
    pub fn sheet_label(self) -> &'static str {
        match self {
            Difficulty::Easy => "易しい(基礎)",
            Difficulty::Normal => "普通(標準)",
            Difficulty::Hard => "難しい(応用)",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Difficulty {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVariant {
                kind: "difficulty",
                value: s.to_string(),
            })
    }
}

pub const MIX_KEY: &str = "mix";
pub const MIX_LABEL: &str = "ミックス(全難易度)";

/// Difficulty restriction for a candidate pool. `Mix` places no restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifficultyFilter {
    #[default]
    Mix,
    Only(Difficulty),
}

impl DifficultyFilter {
    /// Absent, blank and `"mix"` all mean no restriction; anything else must
    /// name a difficulty level.
    pub fn parse(raw: Option<&str>) -> Result<Self, UnknownVariant> {
        match raw.map(str::trim) {
            None | Some("") => Ok(DifficultyFilter::Mix),
            Some(s) if s.eq_ignore_ascii_case(MIX_KEY) => Ok(DifficultyFilter::Mix),
            Some(s) => s.parse().map(DifficultyFilter::Only),
        }
    }

    pub fn level(self) -> Option<Difficulty> {
        match self {
            DifficultyFilter::Mix => None,
            DifficultyFilter::Only(d) => Some(d),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            DifficultyFilter::Mix => MIX_KEY,
            DifficultyFilter::Only(d) => d.key(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DifficultyFilter::Mix => MIX_LABEL,
            DifficultyFilter::Only(d) => d.sheet_label(),
        }
    }
}

impl From<Option<Difficulty>> for DifficultyFilter {
    fn from(level: Option<Difficulty>) -> Self {
        level.map_or(DifficultyFilter::Mix, DifficultyFilter::Only)
    }
}
