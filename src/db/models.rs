use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::db::types::{OrderMode, SectionType, ShuffleMode, SubmissionStatus};

/// A keyed text item: a multiple-choice option (`A`..) or a true/false sub-question (`a`..).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Choice {
    pub(crate) key: String,
    #[serde(default)]
    pub(crate) text: String,
    /// The key this item has in the base exam. Set only on variant copies.
    #[serde(rename = "originalKey", default, skip_serializing_if = "Option::is_none")]
    pub(crate) original_key: Option<String>,
}

impl Choice {
    pub(crate) fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self { key: key.into(), text: text.into(), original_key: None }
    }

    /// Copy under a new display key that remembers the base key.
    pub(crate) fn rekeyed(&self, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: self.text.clone(),
            original_key: Some(self.original_key.clone().unwrap_or_else(|| self.key.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Question {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) question: String,
    #[serde(flatten)]
    pub(crate) body: QuestionBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) section_type: Option<SectionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) part: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) display_index: Option<usize>,
}

/// Kind-specific payload, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum QuestionBody {
    #[serde(rename_all = "camelCase")]
    MultipleChoice {
        #[serde(default)]
        options: Vec<Choice>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correct_answer: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correct_answer_text: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    TrueFalse {
        #[serde(default)]
        sub_questions: Vec<Choice>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        correct_answer: BTreeMap<String, String>,
    },
    #[serde(rename_all = "camelCase")]
    ShortAnswer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correct_answer: Option<serde_json::Value>,
    },
}

impl QuestionBody {
    pub(crate) fn empty(kind: SectionType) -> Self {
        match kind {
            SectionType::MultipleChoice => {
                Self::MultipleChoice { options: Vec::new(), correct_answer: None, correct_answer_text: None }
            }
            SectionType::TrueFalse => {
                Self::TrueFalse { sub_questions: Vec::new(), correct_answer: BTreeMap::new() }
            }
            SectionType::ShortAnswer => Self::ShortAnswer { correct_answer: None },
        }
    }

    pub(crate) fn kind(&self) -> SectionType {
        match self {
            Self::MultipleChoice { .. } => SectionType::MultipleChoice,
            Self::TrueFalse { .. } => SectionType::TrueFalse,
            Self::ShortAnswer { .. } => SectionType::ShortAnswer,
        }
    }
}

impl Question {
    pub(crate) fn new(id: impl Into<String>, kind: SectionType, stem: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: stem.into(),
            body: QuestionBody::empty(kind),
            section_type: None,
            part: None,
            display_index: None,
        }
    }

    pub(crate) fn kind(&self) -> SectionType {
        self.body.kind()
    }

    /// Copies a teacher-supplied answer into the kind-specific `correctAnswer` slot.
    pub(crate) fn set_correct_answer(&mut self, answer: &serde_json::Value) {
        match &mut self.body {
            QuestionBody::MultipleChoice { correct_answer, .. } => {
                *correct_answer = scalar_text(answer).filter(|value| !value.is_empty());
            }
            QuestionBody::TrueFalse { correct_answer, .. } => {
                correct_answer.clear();
                if let Some(map) = answer.as_object() {
                    for (key, value) in map {
                        if let Some(text) = scalar_text(value).filter(|value| !value.is_empty()) {
                            correct_answer.insert(key.clone(), text);
                        }
                    }
                }
            }
            QuestionBody::ShortAnswer { correct_answer } => {
                *correct_answer = (!answer.is_null()).then(|| answer.clone());
            }
        }
    }

    /// Removes every answer key so the question can be shown to a student.
    pub(crate) fn redact_answer(&mut self) {
        match &mut self.body {
            QuestionBody::MultipleChoice { correct_answer, correct_answer_text, .. } => {
                *correct_answer = None;
                *correct_answer_text = None;
            }
            QuestionBody::TrueFalse { correct_answer, .. } => correct_answer.clear(),
            QuestionBody::ShortAnswer { correct_answer } => *correct_answer = None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Section {
    pub(crate) title: String,
    #[serde(rename = "type")]
    pub(crate) section_type: SectionType,
    #[serde(default)]
    pub(crate) questions: Vec<Question>,
}

impl Section {
    pub(crate) fn new(section_type: SectionType) -> Self {
        Self { title: section_type.default_title().to_string(), section_type, questions: Vec::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShuffleConfig {
    #[serde(default)]
    pub(crate) p1_mode: ShuffleMode,
    #[serde(default)]
    pub(crate) p2_mode: ShuffleMode,
    #[serde(default)]
    pub(crate) p3_mode: OrderMode,
    #[serde(default = "default_variant_count")]
    pub(crate) variant_count: u32,
}

/// The persisted, never-reshuffled source of truth for an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BaseExam {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) original_name: String,
    #[serde(default)]
    pub(crate) created_at: i64,
    #[serde(default = "default_time_minutes")]
    pub(crate) time_minutes: u32,
    #[serde(default)]
    pub(crate) password: Option<String>,
    #[serde(default)]
    pub(crate) sections: Vec<Section>,
    #[serde(default)]
    pub(crate) questions: Vec<Question>,
    #[serde(default)]
    pub(crate) answers: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub(crate) shuffle_config: ShuffleConfig,
    #[serde(default)]
    pub(crate) variants: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parsed_by: Option<String>,
}

impl BaseExam {
    pub(crate) fn has_answers(&self) -> bool {
        !self.answers.is_empty()
    }

    pub(crate) fn requires_password(&self) -> bool {
        self.password.as_deref().is_some_and(|value| !value.is_empty())
    }

    /// Drops the answer key, the password and the variant history.
    pub(crate) fn redact_for_student(&mut self) {
        self.answers.clear();
        self.password = None;
        self.variants.clear();
        for question in &mut self.questions {
            question.redact_answer();
        }
        for question in self.sections.iter_mut().flat_map(|section| section.questions.iter_mut()) {
            question.redact_answer();
        }
    }

    /// Applies `update` to the flattened question and to its copy inside `sections`.
    /// Returns `false` when no flattened question has that id.
    pub(crate) fn update_question(&mut self, id: &str, update: impl Fn(&mut Question)) -> bool {
        let mut found = false;
        for question in self.questions.iter_mut().filter(|question| question.id == id) {
            update(question);
            found = true;
        }
        for question in self
            .sections
            .iter_mut()
            .flat_map(|section| section.questions.iter_mut())
            .filter(|question| question.id == id)
        {
            update(question);
        }
        found
    }
}

/// One graded submission as stored in the per-class results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResultRecord {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) dob: String,
    #[serde(default)]
    pub(crate) exam_id: Option<String>,
    pub(crate) score: Option<f64>,
    #[serde(default)]
    pub(crate) violations: u32,
    pub(crate) submitted_at: String,
    pub(crate) status: SubmissionStatus,
    #[serde(default)]
    pub(crate) answers: serde_json::Value,
}

fn default_variant_count() -> u32 {
    1
}

fn default_time_minutes() -> u32 {
    45
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.trim().to_string()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        serde_json::Value::Bool(true) => Some("Đúng".to_string()),
        serde_json::Value::Bool(false) => Some("Sai".to_string()),
        _ => None,
    }
}

/// Older records stored numeric question ids; accept both forms.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
        Missing(()),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Number(value) => value.to_string(),
        RawId::Missing(()) => String::new(),
    })
}
