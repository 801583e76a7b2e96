pub(crate) mod access;
pub(crate) mod essay_grading;
pub(crate) mod exam_activation;
pub(crate) mod exam_content;
pub(crate) mod exam_submission;
pub(crate) mod scoring;
pub(crate) mod text;
pub(crate) mod transcript;
