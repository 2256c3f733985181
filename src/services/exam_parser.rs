//! Turns the plain-text rendering of an exam document into structured sections.
//!
//! The input is one paragraph per line. Recognised markers:
//! `Phần 1|2|3` (or `I|II|III`) opens a section, `Câu <n>:` opens a question,
//! `A.`..`D.` are multiple-choice options and `a)`..`e)` are true/false items.
//! Anything else continues the nearest open text. Malformed input degrades,
//! it never fails.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::db::models::{Choice, Question, QuestionBody, Section};
use crate::db::types::SectionType;

pub(crate) const MC_OPTION_COUNT: usize = 4;

static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Phần\s*(III|II|I|1|2|3)\b").expect("section header regex is invalid")
});

static QUESTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Câu\s*(\d+)\s*[:.]\s*(.*)$").expect("question header regex is invalid")
});

static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([A-D])[.)]\s*(.*)$").expect("option regex is invalid"));

static SUB_ITEM_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([a-e])[.)]\s*(.*)$").expect("sub-item regex is invalid"));

static MARKER_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Phần\s*(?:\d+|[IVX]+)\b|Câu\s*\d+|[A-E][.)])")
        .expect("marker regex is invalid")
});

static DEGREE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\^(?:0|\{0\})\^(\w)").expect("degree marker regex is invalid")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is invalid"));

/// Sections plus the flattened, id-deduplicated question list derived from them.
#[derive(Debug, Clone)]
pub(crate) struct ParsedExam {
    pub(crate) sections: Vec<Section>,
    pub(crate) questions: Vec<Question>,
}

impl ParsedExam {
    pub(crate) fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Parses, flattens and assigns unique ids in one go. Section questions carry the final ids too.
pub(crate) fn parse_exam(text: &str) -> ParsedExam {
    let mut sections = parse_exam_content(text);
    let mut questions = flatten_sections(&sections);
    assign_question_ids(&mut questions);

    let section_questions = sections.iter_mut().flat_map(|section| section.questions.iter_mut());
    for (original, flattened) in section_questions.zip(&questions) {
        original.id.clone_from(&flattened.id);
    }

    ParsedExam { sections, questions }
}

pub(crate) fn parse_exam_content(text: &str) -> Vec<Section> {
    let parser = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .fold(ContentParser::default(), |mut parser, line| {
            parser.feed(line);
            parser
        });

    let mut sections = parser.finish();
    pad_multiple_choice_options(&mut sections);
    sections
}

/// Normalizes a stem/option text. Text carrying explicit `$` math is left untouched.
pub(crate) fn smart_math_wrap(text: &str) -> String {
    if text.contains('$') {
        return text.to_string();
    }

    let text = DEGREE_MARKER.replace_all(text, "°$1");
    WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
}

pub(crate) fn flatten_sections(sections: &[Section]) -> Vec<Question> {
    sections
        .iter()
        .flat_map(|section| {
            section.questions.iter().map(move |question| (section.section_type, question))
        })
        .enumerate()
        .map(|(index, (section_type, question))| {
            let mut question = question.clone();
            question.section_type = Some(section_type);
            question.part = Some(section_type.part());
            question.display_index = Some(index + 1);
            question
        })
        .collect()
}

/// Gives missing or repeated ids the next unused small integer.
pub(crate) fn assign_question_ids(questions: &mut [Question]) {
    let mut seen = HashSet::new();
    let mut counter = 1usize;

    for question in questions.iter_mut() {
        let current = question.id.trim().to_string();
        let id = if current.is_empty() || seen.contains(&current) {
            loop {
                let candidate = counter.to_string();
                counter += 1;
                if !seen.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            current
        };

        seen.insert(id.clone());
        question.id = id;
    }
}

#[derive(Default)]
struct ContentParser {
    state: ParserState,
    sections: Vec<Section>,
}

#[derive(Default)]
enum ParserState {
    #[default]
    NoSection,
    InSection {
        section: Section,
        question: Option<OpenQuestion>,
    },
}

struct OpenQuestion {
    question: Question,
    pending_options: Vec<Choice>,
    options_full: bool,
}

impl ContentParser {
    fn feed(&mut self, line: &str) {
        if let Some(kind) = section_header(line) {
            self.open_section(kind);
            return;
        }

        if let Some(captures) = QUESTION_HEADER.captures(line) {
            let number = captures.get(1).map_or("", |m| m.as_str());
            let rest = captures.get(2).map_or("", |m| m.as_str());
            self.open_question(number, rest);
            return;
        }

        let ParserState::InSection { section, question } = &mut self.state else {
            tracing::debug!(line, "Dropping line outside any section");
            return;
        };
        let Some(open) = question.as_mut() else {
            tracing::debug!(line, "Dropping line outside any question");
            return;
        };

        match section.section_type {
            SectionType::MultipleChoice => {
                if let Some(choice) = keyed_line(&OPTION_LINE, line, char::to_ascii_uppercase) {
                    open.push_option(choice);
                    return;
                }
            }
            SectionType::TrueFalse => {
                if let Some(choice) = keyed_line(&SUB_ITEM_LINE, line, char::to_ascii_lowercase) {
                    open.push_sub_question(choice);
                    return;
                }
            }
            SectionType::ShortAnswer => {}
        }

        if MARKER_LIKE.is_match(line) {
            tracing::debug!(line, question_id = %open.question.id, "Dropping unmatched marker line");
            return;
        }

        open.append_text(line);
    }

    fn open_section(&mut self, kind: SectionType) {
        self.close_section();
        self.state = ParserState::InSection { section: Section::new(kind), question: None };
    }

    fn close_section(&mut self) {
        if let ParserState::InSection { mut section, question } =
            std::mem::take(&mut self.state)
        {
            if let Some(open) = question {
                section.questions.push(open.finish());
            }
            self.sections.push(section);
        }
    }

    fn open_question(&mut self, number: &str, rest: &str) {
        let ParserState::InSection { section, question } = &mut self.state else {
            tracing::warn!(number, "Question header before any section; ignoring");
            return;
        };

        if let Some(previous) = question.take() {
            section.questions.push(previous.finish());
        }
        *question = Some(OpenQuestion::new(Question::new(number, section.section_type, rest)));
    }

    fn finish(mut self) -> Vec<Section> {
        self.close_section();
        self.sections
    }
}

impl OpenQuestion {
    fn new(question: Question) -> Self {
        Self { question, pending_options: Vec::new(), options_full: false }
    }

    fn push_option(&mut self, choice: Choice) {
        if self.options_full {
            tracing::warn!(
                question_id = %self.question.id,
                key = %choice.key,
                "Question already has four options; ignoring extra option"
            );
            return;
        }

        self.pending_options.push(choice);
        if self.pending_options.len() == MC_OPTION_COUNT {
            self.attach_pending_options();
            self.options_full = true;
        }
    }

    fn push_sub_question(&mut self, choice: Choice) {
        if let QuestionBody::TrueFalse { sub_questions, .. } = &mut self.question.body {
            sub_questions.push(choice);
        }
    }

    fn append_text(&mut self, line: &str) {
        match self.pending_options.last_mut() {
            Some(option) => append_line(&mut option.text, line),
            None => append_line(&mut self.question.question, line),
        }
    }

    fn attach_pending_options(&mut self) {
        match &mut self.question.body {
            QuestionBody::MultipleChoice { options, .. } => options.append(&mut self.pending_options),
            _ => self.pending_options.clear(),
        }
    }

    fn finish(mut self) -> Question {
        self.attach_pending_options();

        let question = &mut self.question;
        question.question = smart_math_wrap(&question.question);
        match &mut question.body {
            QuestionBody::MultipleChoice { options, .. } => normalize_choices(options),
            QuestionBody::TrueFalse { sub_questions, .. } => normalize_choices(sub_questions),
            QuestionBody::ShortAnswer { .. } => {}
        }

        self.question
    }
}

fn section_header(line: &str) -> Option<SectionType> {
    let captures = SECTION_HEADER.captures(line)?;
    match captures.get(1)?.as_str().to_ascii_uppercase().as_str() {
        "1" | "I" => Some(SectionType::MultipleChoice),
        "2" | "II" => Some(SectionType::TrueFalse),
        "3" | "III" => Some(SectionType::ShortAnswer),
        _ => None,
    }
}

fn keyed_line(pattern: &Regex, line: &str, normalize: fn(&char) -> char) -> Option<Choice> {
    let captures = pattern.captures(line)?;
    let key = captures.get(1)?.as_str().chars().next().map(|c| normalize(&c))?;
    let text = captures.get(2).map_or("", |m| m.as_str());
    Some(Choice::new(key.to_string(), text))
}

fn append_line(target: &mut String, line: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(line);
}

fn normalize_choices(choices: &mut [Choice]) {
    for choice in choices {
        choice.text = smart_math_wrap(&choice.text);
    }
}

fn pad_multiple_choice_options(sections: &mut [Section]) {
    let questions = sections.iter_mut().flat_map(|section| section.questions.iter_mut());
    for question in questions {
        let QuestionBody::MultipleChoice { options, .. } = &mut question.body else {
            continue;
        };

        if options.len() > MC_OPTION_COUNT {
            tracing::warn!(
                question_id = %question.id,
                count = options.len(),
                "Dropping options beyond the fourth"
            );
            options.truncate(MC_OPTION_COUNT);
        }

        if !has_distinct_slot_keys(options) {
            tracing::warn!(question_id = %question.id, "Re-keying options by position");
            for (index, option) in options.iter_mut().enumerate() {
                option.key = slot_key(index);
            }
        }

        if options.len() < MC_OPTION_COUNT {
            tracing::warn!(
                question_id = %question.id,
                count = options.len(),
                "Padding multiple-choice question to four options"
            );
            let used: Vec<String> = options.iter().map(|option| option.key.clone()).collect();
            let missing = MC_OPTION_COUNT - options.len();
            let free_keys: Vec<String> = (0..MC_OPTION_COUNT)
                .map(slot_key)
                .filter(|key| !used.contains(key))
                .take(missing)
                .collect();
            options.extend(free_keys.into_iter().map(|key| Choice::new(key, "")));
        }

        options.sort_by(|left, right| left.key.cmp(&right.key));
    }
}

/// True when every key is one of A..D and no key repeats.
fn has_distinct_slot_keys(options: &[Choice]) -> bool {
    let slots: Vec<String> = (0..MC_OPTION_COUNT).map(slot_key).collect();
    options.iter().enumerate().all(|(index, option)| {
        slots.contains(&option.key) && options[..index].iter().all(|prev| prev.key != option.key)
    })
}

fn slot_key(index: usize) -> String {
    char::from(b'A' + index as u8).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_of(question: &Question) -> Vec<(String, String)> {
        match &question.body {
            QuestionBody::MultipleChoice { options, .. } => {
                options.iter().map(|o| (o.key.clone(), o.text.clone())).collect()
            }
            other => panic!("expected multiple choice, got {other:?}"),
        }
    }

    fn sub_questions_of(question: &Question) -> Vec<(String, String)> {
        match &question.body {
            QuestionBody::TrueFalse { sub_questions, .. } => {
                sub_questions.iter().map(|o| (o.key.clone(), o.text.clone())).collect()
            }
            other => panic!("expected true/false, got {other:?}"),
        }
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parses_single_multiple_choice_question() {
        let text = "Phần 1: Trắc nghiệm\nCâu 1: 2+2=?\nA. 3\nB. 4\nC. 5\nD. 6\n";
        let sections = parse_exam_content(text);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_type, SectionType::MultipleChoice);
        assert_eq!(sections[0].questions.len(), 1);

        let question = &sections[0].questions[0];
        assert_eq!(question.id, "1");
        assert_eq!(question.question, "2+2=?");
        assert_eq!(options_of(question), pairs(&[("A", "3"), ("B", "4"), ("C", "5"), ("D", "6")]));
    }

    #[test]
    fn sections_follow_document_order() {
        let text = "\
Phần 1: Trắc nghiệm
Câu 1: a
A. 1
Phần 2: Đúng sai
Câu 2: b
a) x
Phần 3: Trả lời ngắn
Câu 3: c
";
        let sections = parse_exam_content(text);
        let kinds: Vec<_> = sections.iter().map(|section| section.section_type).collect();

        assert_eq!(
            kinds,
            vec![SectionType::MultipleChoice, SectionType::TrueFalse, SectionType::ShortAnswer]
        );
        assert_eq!(sections[1].title, "Phần 2: Đúng/Sai");
    }

    #[test]
    fn roman_numeral_headers_are_recognised() {
        let text = "PHẦN III. Tự luận ngắn\nCâu 1: Tính 3 x 3\nphần ii\nCâu 2: Xét\na) đúng\n";
        let sections = parse_exam_content(text);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].section_type, SectionType::ShortAnswer);
        assert_eq!(sections[1].section_type, SectionType::TrueFalse);
    }

    #[test]
    fn missing_options_are_padded_to_four() {
        let text = "Phần 1\nCâu 1: Chọn\nA. một\nC. ba\nCâu 2: Không có đáp án\n";
        let sections = parse_exam_content(text);

        for question in &sections[0].questions {
            assert_eq!(options_of(question).len(), MC_OPTION_COUNT);
        }
        assert_eq!(
            options_of(&sections[0].questions[0]),
            pairs(&[("A", "một"), ("B", ""), ("C", "ba"), ("D", "")])
        );
        assert_eq!(
            options_of(&sections[0].questions[1]),
            pairs(&[("A", ""), ("B", ""), ("C", ""), ("D", "")])
        );
    }

    #[test]
    fn options_beyond_four_are_ignored() {
        let text = "Phần 1\nCâu 1: q\nA. 1\nB. 2\nC. 3\nD. 4\nA. 5\n";
        let sections = parse_exam_content(text);

        assert_eq!(
            options_of(&sections[0].questions[0]),
            pairs(&[("A", "1"), ("B", "2"), ("C", "3"), ("D", "4")])
        );
    }

    #[test]
    fn repeated_option_letters_are_rekeyed_by_position() {
        let text = "Phần 1\nCâu 1: q\nA. 1\nA. 2\nB. 3\n";
        let sections = parse_exam_content(text);

        assert_eq!(
            options_of(&sections[0].questions[0]),
            pairs(&[("A", "1"), ("B", "2"), ("C", "3"), ("D", "")])
        );
    }

    #[test]
    fn out_of_order_option_letters_keep_their_slots() {
        let text = "Phần 1\nCâu 1: q\nD. 4\nB. 2\nA. 1\n";
        let sections = parse_exam_content(text);

        assert_eq!(
            options_of(&sections[0].questions[0]),
            pairs(&[("A", "1"), ("B", "2"), ("C", ""), ("D", "4")])
        );
    }

    #[test]
    fn option_keys_are_upper_cased() {
        let text = "Phần 1\nCâu 1: q\na) 1\nb. 2\nC) 3\nd. 4\n";
        let sections = parse_exam_content(text);

        let keys: Vec<_> = options_of(&sections[0].questions[0]).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn continuation_lines_join_pending_option_or_stem() {
        let text = "\
Phần 1
Câu 1: Cho hàm số
y = x^2.
Chọn khẳng định đúng.
A. Hàm số
đồng biến
B. b
";
        let sections = parse_exam_content(text);
        let question = &sections[0].questions[0];

        assert_eq!(question.question, "Cho hàm số y = x^2. Chọn khẳng định đúng.");
        assert_eq!(options_of(question)[0], ("A".to_string(), "Hàm số đồng biến".to_string()));
        assert_eq!(options_of(question)[1], ("B".to_string(), "b".to_string()));
    }

    #[test]
    fn true_false_items_have_no_cap_and_lower_case_keys() {
        let text = "Phần 2\nCâu 3: Xét\nA) một\nb) hai\nc. ba\nd) bốn\ne) năm\n";
        let sections = parse_exam_content(text);

        assert_eq!(
            sub_questions_of(&sections[0].questions[0]),
            pairs(&[("a", "một"), ("b", "hai"), ("c", "ba"), ("d", "bốn"), ("e", "năm")])
        );
    }

    #[test]
    fn marker_like_lines_are_dropped() {
        let text = "Phần 3\nCâu 1: Tính\nA. không phải đáp án\nCâu 2 thiếu dấu hai chấm\nPhần 4\nkết quả\n";
        let sections = parse_exam_content(text);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].questions.len(), 1);
        assert_eq!(sections[0].questions[0].question, "Tính kết quả");
    }

    #[test]
    fn question_outside_section_is_ignored() {
        let text = "Đề kiểm tra\nCâu 1: lạc\nA. 1\nPhần 1\nCâu 2: đúng chỗ\n";
        let sections = parse_exam_content(text);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].questions.len(), 1);
        assert_eq!(sections[0].questions[0].id, "2");
    }

    #[test]
    fn text_without_markers_yields_no_sections() {
        assert!(parse_exam_content("Chỉ là văn bản\nkhông có câu hỏi").is_empty());
        assert!(parse_exam("").is_empty());
    }

    #[test]
    fn smart_math_wrap_rewrites_degrees_and_whitespace() {
        assert_eq!(smart_math_wrap("  Nhiệt độ   30^0^C  "), "Nhiệt độ 30°C");
        assert_eq!(smart_math_wrap("Góc 90^{0}^F\tđo"), "Góc 90°F đo");
        assert_eq!(smart_math_wrap("  $x^0^C$  "), "  $x^0^C$  ");
    }

    #[test]
    fn flatten_assigns_part_and_display_index() {
        let text = "\
Phần 1
Câu 1: a
Câu 2: b
Phần 2
Câu 1: c
a) x
Phần 3
Câu 1: d
Câu 2: e
";
        let flattened = flatten_sections(&parse_exam_content(text));

        let indexes: Vec<_> = flattened.iter().map(|q| q.display_index).collect();
        assert_eq!(indexes, (1..=5).map(Some).collect::<Vec<_>>());
        let parts: Vec<_> = flattened.iter().map(|q| q.part).collect();
        assert_eq!(parts, vec![Some(1), Some(1), Some(2), Some(3), Some(3)]);
        assert_eq!(flattened[2].section_type, Some(SectionType::TrueFalse));
    }

    #[test]
    fn assign_question_ids_fills_missing_and_duplicate_ids() {
        let mut questions = vec![
            Question::new("1", SectionType::MultipleChoice, "a"),
            Question::new("", SectionType::MultipleChoice, "b"),
            Question::new("1", SectionType::TrueFalse, "c"),
            Question::new("3", SectionType::ShortAnswer, "d"),
        ];
        assign_question_ids(&mut questions);

        let ids: Vec<_> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn parse_exam_keeps_section_ids_in_sync() {
        let text = "Phần 1\nCâu 1: a\nPhần 3\nCâu 1: b\n";
        let parsed = parse_exam(text);

        let flat_ids: Vec<_> = parsed.questions.iter().map(|q| q.id.clone()).collect();
        let section_ids: Vec<_> = parsed
            .sections
            .iter()
            .flat_map(|section| section.questions.iter().map(|q| q.id.clone()))
            .collect();
        assert_eq!(flat_ids, vec!["1", "2"]);
        assert_eq!(section_ids, flat_ids);
    }
}
