use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::cli::{LogColor, Options};

/// Sets the global tracing subscriber for the process's lifetime.
///
/// Simplified from a production node's tracing setup: no reloadable
/// filter handle and no file appender, since this binary only ever runs
/// one sync engine to stdout.
pub fn init_tracing(opts: &Options) {
    let filter = EnvFilter::builder()
        .with_default_directive(Directive::from(opts.log_level))
        .from_env_lossy();

    let use_color = match opts.log_color {
        LogColor::Always => true,
        LogColor::Never => false,
        LogColor::Auto => std::io::stdout().is_terminal(),
    };
    let include_target = matches!(opts.log_level, Level::DEBUG | Level::TRACE);

    let fmt_layer = fmt::layer()
        .with_target(include_target)
        .with_ansi(use_color);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
}
