//! Structured logging system using tracing crate
//!
//! ## Log Format Options
//!
//! The logging system supports three output formats controlled by the `LOG_FORMAT` environment variable:
//!
//! - `json` - Structured JSON format for production and log aggregation systems
//! - `pretty` - Human-readable format with colors and indentation for development
//! - `compact` - Terminal-friendly format with colors but minimal spacing
//!
//! ## Environment Variables
//!
//! - `LOG_LEVEL`: Log level (ERROR, WARN, INFO, DEBUG, TRACE) - defaults to INFO
//! - `LOG_FORMAT`: Output format (json, pretty, compact) - defaults to json
//! - `LOG_SPANS`: Include span events (true/false) - defaults to false
//! - `RUST_LOG`: Override log filtering (follows env_logger format)

use std::env;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// JSON format for structured logging (machine-readable)
    Json,
    /// Pretty format with colors and indentation (human-readable)
    Pretty,
    /// Compact format with colors but minimal spacing (terminal-friendly)
    Compact,
}

impl LogFormat {
    /// Parse log format from string
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Json, // Default to JSON for production
        }
    }
}

/// Initialize logging with manual configuration
pub fn init_logging(level: Level, format: LogFormat, include_spans: bool) {
    let mut filter = EnvFilter::new(level.to_string())
        // Reduce noise from dependencies
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap())
        .add_directive("warp=warn".parse().unwrap())
        .add_directive("tokio=warn".parse().unwrap());

    // Allow RUST_LOG to override
    if let Ok(rust_log) = env::var("RUST_LOG") {
        filter = EnvFilter::new(rust_log);
    }

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer().json().with_span_events(if include_spans {
                fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
            } else {
                fmt::format::FmtSpan::NONE
            });
            subscriber.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer =
                fmt::layer()
                    .pretty()
                    .with_ansi(true)
                    .with_span_events(if include_spans {
                        fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
                    } else {
                        fmt::format::FmtSpan::NONE
                    });
            subscriber.with(fmt_layer).init();
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_ansi(true)
                .with_target(false)
                .with_span_events(if include_spans {
                    fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
                } else {
                    fmt::format::FmtSpan::NONE
                });
            subscriber.with(fmt_layer).init();
        }
    }
}

/// Initialize logging from environment variables
pub fn init_default_logging() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());

    let level = match log_level.to_uppercase().as_str() {
        "ERROR" => Level::ERROR,
        "WARN" => Level::WARN,
        "INFO" => Level::INFO,
        "DEBUG" => Level::DEBUG,
        "TRACE" => Level::TRACE,
        _ => Level::INFO,
    };

    let format = env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let log_format = LogFormat::parse(&format);

    let include_spans = env::var("LOG_SPANS")
        .unwrap_or_else(|_| "false".to_string())
        .to_lowercase()
        == "true";

    init_logging(level, log_format, include_spans);
}
