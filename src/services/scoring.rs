use std::collections::BTreeMap;

use serde_json::Value;

use crate::db::models::{Question, QuestionBody};

const MAX_SCORE: f64 = 10.0;

/// Grades a submission against the base exam's answer key on a 10-point scale.
///
/// Every true/false item counts as one point of the total, every other question as one.
/// Array answers and `{"boxes": [...]}` answers are concatenated before comparison.
/// Comparison ignores case and whitespace. Returns `None` when there is no answer key
/// or nothing to grade.
pub(crate) fn calculate_score(
    answers: &Value,
    correct_answers: &BTreeMap<String, Value>,
    questions: &[Question],
) -> Option<f64> {
    if correct_answers.is_empty() {
        return None;
    }

    let mut correct = 0usize;
    let mut total = 0usize;

    for question in questions {
        let expected = correct_answers.get(&question.id);
        let given = answers.get(&question.id);

        if let QuestionBody::TrueFalse { sub_questions, .. } = &question.body {
            if !sub_questions.is_empty() {
                for item in sub_questions {
                    total += 1;
                    let expected = expected.and_then(|value| value.get(&item.key));
                    let given = given.and_then(|value| value.get(&item.key));
                    if let (Some(expected), Some(given)) = (present(expected), present(given)) {
                        if item_text(given).map(|text| text.trim().to_uppercase())
                            == item_text(expected).map(|text| text.trim().to_uppercase())
                        {
                            correct += 1;
                        }
                    }
                }
                continue;
            }
        }

        total += 1;
        let (Some(expected), Some(given)) = (present(expected), present(given)) else {
            continue;
        };

        let given = joined_answer(given, true).map(|text| squash(&text));
        let expected = joined_answer(expected, false).map(|text| squash(&text));
        if given.is_some() && given == expected {
            correct += 1;
        }
    }

    if total == 0 {
        return None;
    }

    let score = correct as f64 / total as f64 * MAX_SCORE;
    Some((score * 10.0).round() / 10.0)
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    })
}

fn item_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn joined_answer(value: &Value, allow_boxes: bool) -> Option<String> {
    match value {
        Value::Array(items) => Some(join_items(items)),
        Value::Object(map) if allow_boxes => match map.get("boxes") {
            Some(Value::Array(items)) => Some(join_items(items)),
            _ => None,
        },
        other => item_text(other),
    }
}

fn join_items(items: &[Value]) -> String {
    items.iter().filter(|item| present(Some(item)).is_some()).filter_map(item_text).collect()
}

fn squash(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_uppercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Choice;
    use crate::db::types::SectionType;
    use serde_json::json;

    fn questions() -> Vec<Question> {
        let mut tf = Question::new("2", SectionType::TrueFalse, "Xét");
        if let QuestionBody::TrueFalse { sub_questions, .. } = &mut tf.body {
            sub_questions.push(Choice::new("a", "x"));
            sub_questions.push(Choice::new("b", "y"));
        }
        vec![
            Question::new("1", SectionType::MultipleChoice, "Chọn"),
            tf,
            Question::new("3", SectionType::ShortAnswer, "Điền"),
        ]
    }

    fn key(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn no_answer_key_means_no_score() {
        assert_eq!(calculate_score(&json!({"1": "A"}), &BTreeMap::new(), &questions()), None);
    }

    #[test]
    fn all_correct_scores_ten() {
        let correct = key(json!({"1": "B", "2": {"a": "Đúng", "b": "Sai"}, "3": "12"}));
        let answers = json!({"1": "b", "2": {"a": " đúng ", "b": "SAI"}, "3": " 1 2 "});

        assert_eq!(calculate_score(&answers, &correct, &questions()), Some(10.0));
    }

    #[test]
    fn true_false_items_count_individually() {
        let correct = key(json!({"1": "B", "2": {"a": "Đúng", "b": "Sai"}, "3": "12"}));
        let answers = json!({"1": "C", "2": {"a": "Đúng", "b": "Đúng"}, "3": "12"});

        // 2 of 4 points.
        assert_eq!(calculate_score(&answers, &correct, &questions()), Some(5.0));
    }

    #[test]
    fn missing_answers_count_against_total() {
        let correct = key(json!({"1": "B"}));
        let answers = json!({"1": "B"});

        // 1 of 4 points.
        assert_eq!(calculate_score(&answers, &correct, &questions()), Some(2.5));
    }

    #[test]
    fn short_answer_arrays_and_boxes_are_concatenated() {
        let short = vec![Question::new("3", SectionType::ShortAnswer, "Điền")];
        let correct = key(json!({"3": ["1", "2", "5"]}));

        let boxed = json!({"3": {"boxes": ["1", "", "2", "5"]}});
        assert_eq!(calculate_score(&boxed, &correct, &short), Some(10.0));

        let array = json!({"3": ["1", null, "25"]});
        assert_eq!(calculate_score(&array, &correct, &short), Some(10.0));

        let wrong = json!({"3": {"boxes": ["1", "2"]}});
        assert_eq!(calculate_score(&wrong, &correct, &short), Some(0.0));
    }

    #[test]
    fn numeric_answers_compare_as_text() {
        let short = vec![Question::new("3", SectionType::ShortAnswer, "Điền")];
        let correct = key(json!({"3": 0.5}));

        assert_eq!(calculate_score(&json!({"3": "0.5"}), &correct, &short), Some(10.0));
    }

    #[test]
    fn score_rounds_to_one_decimal() {
        let three = vec![
            Question::new("1", SectionType::MultipleChoice, "a"),
            Question::new("2", SectionType::MultipleChoice, "b"),
            Question::new("3", SectionType::MultipleChoice, "c"),
        ];
        let correct = key(json!({"1": "A", "2": "A", "3": "A"}));
        let answers = json!({"1": "A", "2": "B", "3": "B"});

        assert_eq!(calculate_score(&answers, &correct, &three), Some(3.3));
    }

    #[test]
    fn empty_question_list_yields_none() {
        let correct = key(json!({"1": "A"}));
        assert_eq!(calculate_score(&json!({}), &correct, &[]), None);
    }
}
