//! Test logger that prints the chat app's event logs to stdout.

use std::{io, sync::Once, thread};

use log::LevelFilter;

static INIT: Once = Once::new();

/// Print log messages of `level` and above emitted by `chat_moderation`. Messages from other crates
/// are only printed if they are warnings or errors. Only the first call in a test binary has an effect.
pub(crate) fn setup_logger(level: LevelFilter) {
    INIT.call_once(|| {
        let dispatch = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{:?}][{}][{}] {}",
                    thread::current().id(),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(LevelFilter::Warn)
            .level_for("chat_moderation", level)
            .chain(io::stdout());

        // Another test harness may have installed a logger already.
        if let Err(err) = dispatch.apply() {
            eprintln!("test logger not installed: {}", err);
        }
    })
}
