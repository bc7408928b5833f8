mod exam_vm;
mod markdown_vm;
mod time_fmt;

pub use exam_vm::{
    CorrectionRowVm, CorrectionStatus, ExamScreenVm, OptionVm, QuestionCardVm, QuizVm, ResultVm,
    SubjectOptionVm, SubjectPickerVm, SubjectRowVm, URGENT_SECONDS, map_exam_screen,
    map_question_cards, map_quiz, map_result, map_subject_picker, progress_label,
};
pub use markdown_vm::{markdown_to_html, sanitize_html};
pub use time_fmt::{format_countdown, format_datetime};
