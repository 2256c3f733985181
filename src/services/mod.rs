pub(crate) mod exam_parser;
pub(crate) mod scoring;
pub(crate) mod variants;
