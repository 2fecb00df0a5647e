use std::io;

use lst_env::LoggingSettings;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod assets;
pub mod controller;
pub mod dnd;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod session;
pub mod view;

pub use api::{ApiClient, Backend};
pub use controller::{GameController, ViewSnapshot};
pub use errors::{ClientError, ClientResult, StoreError};
pub use models::{Action, AppState, Card, CardWithPosition};

// --- 로거 설정 ---
/// 반환된 guard 가 살아 있는 동안만 파일 로그가 flush 됩니다.
pub fn setup_logger(settings: &LoggingSettings) -> WorkerGuard {
    let file_appender =
        RollingFileAppender::new(Rotation::DAILY, &settings.directory, &settings.filename);
    let (non_blocking_file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG 가 있으면 설정 파일 값보다 우선
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    // 표준 출력은 보드 렌더링에 쓰므로 콘솔 로그는 stderr 로
    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .pretty();

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file_writer)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .pretty();

    // 이미 전역 subscriber 가 있으면 (테스트 등) 그대로 둠
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    info!(
        "Logger initialized. Log file: {}/{}",
        settings.directory, settings.filename
    );
    guard
}

/// 테스트용 콘솔 로거. 여러 번 호출해도 안전합니다.
pub fn setup_test_logger() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .with_target(false)
        .try_init();
}
