use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;

use crate::config::Config;

/// Dependencies whose per-statement chatter is capped at `Warn`.
const QUIET_MODULES: &[&str] = &["sqlx"];

fn builder(level: LevelFilter) -> Builder {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{}: {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Stderr)
        .filter_level(level);
    for module in QUIET_MODULES {
        builder.filter_module(module, level.min(LevelFilter::Warn));
    }
    builder
}

/// Install the process logger at `config.log_level`, writing to stderr so
/// stdout stays free for command output. Only the first call takes effect.
pub fn init_logger(config: &Config) {
    let _ = builder(config.log_level).try_init();
}
