mod demo;

use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use exam_core::model::{TestId, UserId};
use services::{
    BackendConfig, Clock, ConfigError, ExamBackend, ExamServiceConfig, GradingMode,
    HttpExamBackend,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};
use ui::{App, UiApp, build_app_context};

use crate::demo::{DEMO_TEST_ID, demo_backend};

const DEFAULT_USER_ID: u64 = 1;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidGrading { raw: String },
    InvalidApiUrl(ConfigError),
    MissingTestId,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user-id value: {raw}"),
            ArgsError::InvalidGrading { raw } => {
                write!(f, "invalid --grading value: {raw} (expected local or server)")
            }
            ArgsError::InvalidApiUrl(err) => write!(f, "invalid --api value: {err}"),
            ArgsError::MissingTestId => {
                write!(f, "a test id is required with --api (use --test-id or EXAM_TEST_ID)")
            }
        }
    }
}

impl std::error::Error for ArgsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArgsError::InvalidApiUrl(err) => Some(err),
            _ => None,
        }
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct DesktopApp {
    user_id: UserId,
    test_id: TestId,
    grading: GradingMode,
    shuffle_questions: bool,
    backend: Arc<dyn ExamBackend>,
}

impl UiApp for DesktopApp {
    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn test_id(&self) -> TestId {
        self.test_id.clone()
    }

    fn grading_mode(&self) -> GradingMode {
        self.grading
    }

    fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    fn clock(&self) -> Clock {
        Clock::system()
    }

    fn exam_backend(&self) -> Arc<dyn ExamBackend> {
        Arc::clone(&self.backend)
    }
}

/// Command-line overrides on top of `EXAM_*` environment settings.
#[derive(Debug, Default, PartialEq)]
struct Args {
    api: Option<String>,
    test_id: Option<String>,
    user_id: Option<UserId>,
    grading: Option<GradingMode>,
    offline: bool,
    help: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--api <url>] [--test-id <id>] [--user-id <n>] [--grading local|server] [--offline]"
    );
    eprintln!();
    eprintln!("Without --api (or EXAM_API_BASE_URL) the built-in demo question bank is used.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_API_BASE_URL, EXAM_API_TOKEN, EXAM_TEST_ID, EXAM_USER_ID,");
    eprintln!("  EXAM_GRADING, EXAM_REQUEST_TIMEOUT_SECS, EXAM_SHUFFLE_QUESTIONS");
    eprintln!("  RUST_LOG (default: info)");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => parsed.api = Some(require_value(args, "--api")?),
                "--test-id" => {
                    let value = require_value(args, "--test-id")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::MissingTestId);
                    }
                    parsed.test_id = Some(value);
                }
                "--user-id" => {
                    let value = require_value(args, "--user-id")?;
                    let user_id = value
                        .parse::<UserId>()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                    parsed.user_id = Some(user_id);
                }
                "--grading" => {
                    let value = require_value(args, "--grading")?;
                    let grading = value
                        .parse::<GradingMode>()
                        .map_err(|()| ArgsError::InvalidGrading { raw: value.clone() })?;
                    parsed.grading = Some(grading);
                }
                "--offline" => parsed.offline = true,
                "--help" | "-h" => parsed.help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }

    /// Apply the overrides to the environment configuration.
    fn apply(self, mut config: ExamServiceConfig) -> Result<ExamServiceConfig, ArgsError> {
        if let Some(raw) = self.api {
            let mut backend = BackendConfig::new(&raw).map_err(ArgsError::InvalidApiUrl)?;
            if let Some(previous) = config.backend.take() {
                backend.api_token = previous.api_token;
                backend.request_timeout = previous.request_timeout;
            }
            config.backend = Some(backend);
        }
        if self.offline {
            config.backend = None;
        }
        if let Some(test_id) = self.test_id {
            config.test_id = Some(TestId::new(test_id.trim()));
        }
        if let Some(user_id) = self.user_id {
            config.user_id = Some(user_id);
        }
        if let Some(grading) = self.grading {
            config.grading = grading;
        }
        Ok(config)
    }
}

fn build_desktop_app(config: ExamServiceConfig) -> Result<DesktopApp, Box<dyn std::error::Error>> {
    let user_id = config.user_id.unwrap_or(UserId::new(DEFAULT_USER_ID));
    let (backend, test_id): (Arc<dyn ExamBackend>, TestId) = match config.backend {
        Some(backend_config) => {
            let test_id = config.test_id.ok_or(ArgsError::MissingTestId)?;
            let backend = HttpExamBackend::new(backend_config)?;
            info!(base_url = %backend.base_url(), test_id = %test_id, "using exam server");
            (Arc::new(backend), test_id)
        }
        None => {
            let test_id = config.test_id.unwrap_or_else(|| TestId::new(DEMO_TEST_ID));
            info!(test_id = %test_id, "no exam server configured, using the demo question bank");
            let ship_answer_key = config.grading == GradingMode::Local;
            (Arc::new(demo_backend(ship_answer_key)), test_id)
        }
    };

    Ok(DesktopApp {
        user_id,
        test_id,
        grading: config.grading,
        shuffle_questions: config.shuffle_questions,
        backend,
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_fmt::layer().with_target(false))
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if args.help {
        print_usage();
        return Ok(());
    }

    init_tracing();

    let config = args.apply(ExamServiceConfig::from_env()?)?;
    let app = build_desktop_app(config)?;
    info!(
        user_id = %app.user_id,
        grading = %app.grading,
        shuffle = app.shuffle_questions,
        "launching exam window"
    );

    let app: Arc<dyn UiApp> = Arc::new(app);
    let context = build_app_context(&app);

    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("CBT Practice")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
