use clap::{Parser, ValueEnum};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "KESSAN_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "KESSAN_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Sets the level of tracing
    #[arg(long, default_value = "INFO", ignore_case = true)]
    pub trace: TraceLevel,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<TraceLevel> for Level {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::WARN => Level::WARN,
            TraceLevel::ERROR => Level::ERROR,
        }
    }
}
