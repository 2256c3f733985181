use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SectionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl SectionType {
    pub(crate) fn part(self) -> u8 {
        match self {
            Self::MultipleChoice => 1,
            Self::TrueFalse => 2,
            Self::ShortAnswer => 3,
        }
    }

    pub(crate) fn default_title(self) -> &'static str {
        match self {
            Self::MultipleChoice => "Phần 1: Trắc nghiệm nhiều lựa chọn",
            Self::TrueFalse => "Phần 2: Đúng/Sai",
            Self::ShortAnswer => "Phần 3: Trả lời ngắn",
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::ShortAnswer => "short_answer",
        }
    }
}

/// Shuffle mode for parts 1 and 2. Unknown values fall back to `none`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ShuffleMode {
    Questions,
    Both,
    #[default]
    #[serde(other)]
    None,
}

impl ShuffleMode {
    pub(crate) fn shuffles_questions(self) -> bool {
        matches!(self, Self::Questions | Self::Both)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Questions => "questions",
            Self::Both => "both",
        }
    }
}

/// Part 3 only supports whole-question reordering; `both` is treated as `none`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OrderMode {
    Questions,
    #[default]
    #[serde(other)]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum UserRole {
    Teacher,
    Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum SubmissionStatus {
    Submitted,
}
