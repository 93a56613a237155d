//! Default logging setup for programs and tests using `ordmap`
#![warn(missing_docs)]

use std::{sync::Mutex, thread, time::Instant};

const TIMESTAMP_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightBlack)));

const THREAD_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Blue)));

const TARGET_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Magenta)));

/// Perform the default logging setup.
///
/// The filter is read from `ORDMAP_LOG` (defaulting to `info`) and the color choice from
/// `ORDMAP_LOG_STYLE`. Calling this again after a logger was installed does nothing, so tests can
/// call it unconditionally.
pub fn setup() {
    let start_time = Instant::now();
    let last_target = Mutex::new(String::new());

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or("ORDMAP_LOG", "info")
            .write_style("ORDMAP_LOG_STYLE"),
    );
    builder.format(move |buf, record| {
        use std::io::Write;

        let timestamp = start_time.elapsed();
        let level = record.level();
        let target = record.target();
        let current = thread::current();
        let thread_name = current.name().unwrap_or("<unnamed>");

        let mut last_target = last_target
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if target != *last_target {
            last_target.clear();
            last_target.push_str(target);

            writeln!(
                buf,
                "{} {}",
                format_args!("{style}{timestamp:>9.2?}{style:#}", style = TIMESTAMP_STYLE),
                format_args!("{style}{target}{style:#}", style = TARGET_STYLE)
            )?;
        }
        writeln!(
            buf,
            "{} {} {} {}",
            format_args!("{style}{timestamp:>9.2?}{style:#}", style = TIMESTAMP_STYLE),
            format_args!("{style}{thread_name:>12}{style:#}", style = THREAD_STYLE),
            format_args!(
                "{style}{level:5}{style:#}",
                style = buf.default_level_style(level),
            ),
            record.args(),
        )
    });
    if builder.try_init().is_err() {
        log::debug!("logger already initialized");
    }
}
