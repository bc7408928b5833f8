mod answers;
mod configuration;
mod ids;
mod question;
mod result;
mod test_session;

pub use ids::{AttemptId, OptionId, ParseIdError, QuestionId, SubjectId, TestId, UserId};

pub use answers::AnswerRecord;
pub use configuration::{ConfigurationError, ExamConfiguration, SubjectSelector};
pub use question::{Question, QuestionError, QuizOption};
pub use result::{Correction, ResultError, SessionResult, SubjectScore};
pub use test_session::{PayloadError, TestSession};
