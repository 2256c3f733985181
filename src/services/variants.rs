//! Per-session exam variants: shuffled question order, shuffled and re-keyed options.
//!
//! The base exam is never touched. Correct answers follow their option text
//! through a shuffle, so a re-keyed answer still points at the same content.
//! When two options share a text the first match wins. Every re-keyed option
//! and true/false item carries `originalKey`, its key in the base exam, which is
//! what submissions are graded against.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::db::models::{BaseExam, Choice, Question, QuestionBody};
use crate::db::types::{OrderMode, ShuffleMode};

const VARIANT_MARKERS: [&str; 2] = ["_r", "_v"];

/// A request-scoped projection of a base exam. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RuntimeVariant {
    pub(crate) id: String,
    pub(crate) base_id: String,
    pub(crate) original_name: String,
    pub(crate) time_minutes: u32,
    pub(crate) password: Option<String>,
    pub(crate) requires_password: bool,
    pub(crate) questions: Vec<Question>,
}

impl RuntimeVariant {
    /// Drops answer keys and the password; `requiresPassword` survives.
    pub(crate) fn redact_answers(&mut self) {
        self.password = None;
        for question in &mut self.questions {
            question.redact_answer();
        }
    }
}

/// Strips a `_r...` or `_v...` variant suffix, whichever comes first.
pub(crate) fn base_exam_id(id: &str) -> &str {
    VARIANT_MARKERS
        .iter()
        .filter_map(|marker| id.find(marker))
        .min()
        .map_or(id, |cut| &id[..cut])
}

pub(crate) fn is_variant_id(id: &str) -> bool {
    base_exam_id(id).len() != id.len()
}

pub(crate) fn make_runtime_variant(exam: &BaseExam) -> RuntimeVariant {
    make_runtime_variant_with_rng(exam, &mut rand::thread_rng())
}

pub(crate) fn make_runtime_variant_with_rng<R: Rng + ?Sized>(
    exam: &BaseExam,
    rng: &mut R,
) -> RuntimeVariant {
    let config = &exam.shuffle_config;

    let mut part1 = Vec::new();
    let mut part2 = Vec::new();
    let mut part3 = Vec::new();
    for question in &exam.questions {
        match question.part.unwrap_or(1) {
            2 => part2.push(question.clone()),
            3 => part3.push(question.clone()),
            _ => part1.push(question.clone()),
        }
    }

    if config.p1_mode.shuffles_questions() {
        part1.shuffle(rng);
    }
    let part1: Vec<Question> = match config.p1_mode {
        ShuffleMode::Both => part1.iter().map(|question| shuffle_options_with_rekey(question, rng)).collect(),
        ShuffleMode::None | ShuffleMode::Questions => part1.iter().map(relabel_options).collect(),
    };

    if config.p2_mode.shuffles_questions() {
        part2.shuffle(rng);
    }
    if config.p2_mode == ShuffleMode::Both {
        part2 = part2.iter().map(|question| shuffle_true_false_sub_questions(question, rng)).collect();
    }

    if config.p3_mode == OrderMode::Questions {
        part3.shuffle(rng);
    }

    let mut questions: Vec<Question> = part1.into_iter().chain(part2).chain(part3).collect();
    for (index, question) in questions.iter_mut().enumerate() {
        question.display_index = Some(index + 1);
    }

    RuntimeVariant {
        id: format!("{}_r{}", exam.id, Uuid::new_v4().simple()),
        base_id: exam.id.clone(),
        original_name: exam.original_name.clone(),
        time_minutes: exam.time_minutes,
        password: exam.password.clone(),
        requires_password: exam.requires_password(),
        questions,
    }
}

/// Shuffles options uniformly and re-keys them `A, B, C, ...` by new position.
pub(crate) fn shuffle_options_with_rekey<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Question {
    let QuestionBody::MultipleChoice { options, .. } = &question.body else {
        return question.clone();
    };

    let mut order: Vec<usize> = (0..options.len()).collect();
    order.shuffle(rng);
    apply_option_order(question, &order)
}

/// Shuffles true/false items and re-keys them `a, b, c, ...`, carrying each item's answer by text.
pub(crate) fn shuffle_true_false_sub_questions<R: Rng + ?Sized>(
    question: &Question,
    rng: &mut R,
) -> Question {
    let QuestionBody::TrueFalse { sub_questions, .. } = &question.body else {
        return question.clone();
    };

    let mut order: Vec<usize> = (0..sub_questions.len()).collect();
    order.shuffle(rng);
    apply_sub_question_order(question, &order)
}

/// `order[new_position] = old_position`.
fn apply_option_order(question: &Question, order: &[usize]) -> Question {
    let mut result = question.clone();
    let QuestionBody::MultipleChoice { options, correct_answer, correct_answer_text } =
        &mut result.body
    else {
        return result;
    };

    let correct_text =
        resolve_correct_text(options, correct_answer.as_deref(), correct_answer_text.as_deref());

    let reordered: Vec<Choice> = order
        .iter()
        .enumerate()
        .filter_map(|(position, &old)| {
            options.get(old).map(|option| option.rekeyed(option_key(position)))
        })
        .collect();

    *correct_answer = correct_text.and_then(|text| {
        reordered.iter().find(|option| option.text == text).map(|option| option.key.clone())
    });
    *options = reordered;
    result
}

/// Canonical `A, B, C, ...` keys in the existing order. The answer key follows its position.
fn relabel_options(question: &Question) -> Question {
    let mut result = question.clone();
    let QuestionBody::MultipleChoice { options, correct_answer, correct_answer_text } =
        &mut result.body
    else {
        return result;
    };

    let old_position = correct_answer
        .as_deref()
        .and_then(|key| options.iter().position(|option| same_key(&option.key, key)))
        .or_else(|| {
            let text = correct_answer_text.as_deref()?;
            options.iter().position(|option| option.text == text)
        });

    for (position, option) in options.iter_mut().enumerate() {
        *option = option.rekeyed(option_key(position));
    }
    *correct_answer = old_position.map(option_key);
    result
}

fn apply_sub_question_order(question: &Question, order: &[usize]) -> Question {
    let mut result = question.clone();
    let QuestionBody::TrueFalse { sub_questions, correct_answer } = &mut result.body else {
        return result;
    };

    let reordered: Vec<Choice> = order
        .iter()
        .enumerate()
        .filter_map(|(position, &old)| {
            sub_questions.get(old).map(|item| item.rekeyed(sub_question_key(position)))
        })
        .collect();

    let mut remapped = BTreeMap::new();
    for item in &reordered {
        let previous_key = sub_questions
            .iter()
            .find(|previous| previous.text == item.text)
            .map(|previous| previous.key.as_str());
        let value = previous_key
            .and_then(|key| correct_answer.get(key))
            .filter(|value| !value.trim().is_empty());
        if let Some(value) = value {
            remapped.insert(item.key.clone(), value.clone());
        }
    }

    *sub_questions = reordered;
    *correct_answer = remapped;
    result
}

fn resolve_correct_text(
    options: &[Choice],
    correct_answer: Option<&str>,
    correct_answer_text: Option<&str>,
) -> Option<String> {
    correct_answer
        .and_then(|key| options.iter().find(|option| same_key(&option.key, key)))
        .map(|option| option.text.clone())
        .or_else(|| correct_answer_text.map(str::to_string))
}

fn same_key(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

fn option_key(position: usize) -> String {
    letter_at('A', position)
}

fn sub_question_key(position: usize) -> String {
    letter_at('a', position)
}

fn letter_at(first: char, position: usize) -> String {
    u32::try_from(position)
        .ok()
        .and_then(|offset| char::from_u32(first as u32 + offset))
        .map(String::from)
        .unwrap_or_else(|| position.to_string())
}
