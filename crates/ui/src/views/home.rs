use dioxus::prelude::*;
use dioxus_router::Link;
use services::GradingMode;

use crate::context::AppContext;
use crate::routes::Route;

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let grading_note = match ctx.grading_mode() {
        GradingMode::Local => "Answers are graded on this device.",
        GradingMode::Server => "Answers are graded by the exam server.",
    };

    rsx! {
        div { class: "page home-page",
            h2 { "Computer-based test" }
            p { "Candidate: {ctx.user_id()}" }
            p { "Test: {ctx.test_id()}" }
            p { class: "home-note", "{grading_note}" }
            Link { class: "btn btn-primary", to: Route::Exam {}, "Begin" }
        }
    }
}
