mod create;
mod list;
mod manage;
mod variants;

pub(super) use create::{upload_exam, upload_exam_file};
pub(super) use list::{latest_exam, list_exams};
pub(super) use manage::{
    delete_exam, get_exam, set_correct_answers, update_question_text, verify_password,
};
pub(super) use variants::{get_variant, latest_variant, list_variants};
