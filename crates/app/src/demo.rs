use exam_core::model::{OptionId, QuestionId, QuizOption, SubjectId, SubjectSelector};
use services::InMemoryExamBackend;
use services::backend::QuestionPayload;

pub const DEMO_TEST_ID: &str = "demo";

const DEMO_DURATION_SECONDS: u32 = 600;

struct DemoQuestion {
    subject: u64,
    prompt: &'static str,
    options: [&'static str; 4],
    correct: usize,
}

const SUBJECTS: [(u64, &str); 3] = [(1, "Mathematics"), (2, "English"), (3, "Physics")];

const QUESTIONS: &[DemoQuestion] = &[
    DemoQuestion {
        subject: 1,
        prompt: "Solve for *x*: `2x + 6 = 14`",
        options: ["3", "4", "5", "8"],
        correct: 1,
    },
    DemoQuestion {
        subject: 1,
        prompt: "What is the value of 3<sup>4</sup>?",
        options: ["12", "64", "81", "243"],
        correct: 2,
    },
    DemoQuestion {
        subject: 1,
        prompt: "The sum of the interior angles of a triangle is:",
        options: ["90°", "180°", "270°", "360°"],
        correct: 1,
    },
    DemoQuestion {
        subject: 1,
        prompt: "Which of these is a **prime** number?",
        options: ["21", "27", "29", "33"],
        correct: 2,
    },
    DemoQuestion {
        subject: 2,
        prompt: "Choose the word closest in meaning to *benevolent*.",
        options: ["Kind", "Angry", "Lazy", "Timid"],
        correct: 0,
    },
    DemoQuestion {
        subject: 2,
        prompt: "Pick the correctly spelt word.",
        options: ["Accomodate", "Accommodate", "Acommodate", "Acomodate"],
        correct: 1,
    },
    DemoQuestion {
        subject: 2,
        prompt: "Identify the verb: *The quick fox **jumped** over the fence.*",
        options: ["quick", "fox", "jumped", "fence"],
        correct: 2,
    },
    DemoQuestion {
        subject: 3,
        prompt: "The SI unit of force is the:",
        options: ["Joule", "Newton", "Watt", "Pascal"],
        correct: 1,
    },
    DemoQuestion {
        subject: 3,
        prompt: "An object at rest stays at rest unless acted on by a net force. This is Newton's:",
        options: ["First law", "Second law", "Third law", "Law of gravitation"],
        correct: 0,
    },
    DemoQuestion {
        subject: 3,
        prompt: "Speed of an object covering 100 m in 20 s:",
        options: ["2 m/s", "5 m/s", "20 m/s", "2000 m/s"],
        correct: 1,
    },
];

/// Built-in question bank used when no exam server is configured.
#[must_use]
pub fn demo_backend(ship_answer_key: bool) -> InMemoryExamBackend {
    let backend = SUBJECTS.iter().fold(
        InMemoryExamBackend::new()
            .with_duration_seconds(DEMO_DURATION_SECONDS)
            .with_answer_key(ship_answer_key),
        |backend, (id, name)| backend.with_subject(SubjectSelector::new(SubjectId::new(*id), *name)),
    );

    QUESTIONS
        .iter()
        .zip(1_u64..)
        .fold(backend, |backend, (question, id)| {
            let options = question
                .options
                .iter()
                .zip(1_u64..)
                .map(|(text, option_id)| QuizOption::new(OptionId::new(option_id), *text))
                .collect();
            let correct = u64::try_from(question.correct).map_or(1, |index| index + 1);
            backend.with_question(QuestionPayload {
                id: QuestionId::new(id),
                subject_id: SubjectId::new(question.subject),
                prompt: question.prompt.to_string(),
                options,
                correct_option_id: Some(OptionId::new(correct)),
            })
        })
}
