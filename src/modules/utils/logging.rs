use env_logger::{Builder, Env, WriteStyle};
use log::{error, info, warn};
use std::fs::OpenOptions;
use std::path::Path;

/// Initialize the logging system.
///
/// The level defaults to `info` and can be overridden through `RUST_LOG`.
/// When `log_file` is given, records are appended to it instead of stderr.
pub fn initialize_logging(log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder
        // Enable timestamps
        .format_timestamp_secs()
        // Enable module path in logs
        .format_module_path(true)
        .write_style(WriteStyle::Auto);

    if let Some(path) = log_file {
        // Create or append to log file
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init()?;

    info!("Logging system initialized");
    Ok(())
}

/// Helper function to format sensitive data for logging
pub fn format_sensitive(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Add structured logging for authentication events
pub fn log_auth_event(event_type: &str, identifier: &str, success: bool, details: Option<&str>) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Auth event: type={}, user={}, success=true, timestamp={}, details={:?}",
            event_type,
            format_sensitive(identifier),
            timestamp,
            details
        );
    } else {
        warn!(
            "Auth event: type={}, user={}, success=false, timestamp={}, details={:?}",
            event_type,
            format_sensitive(identifier),
            timestamp,
            details
        );
    }
}

/// Add structured logging for credential store operations
pub fn log_data_operation(operation: &str, resource: &str, success: bool, details: Option<&str>) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Data operation: op={}, resource={}, success=true, timestamp={}, details={:?}",
            operation, resource, timestamp, details
        );
    } else {
        error!(
            "Data operation: op={}, resource={}, success=false, timestamp={}, details={:?}",
            operation, resource, timestamp, details
        );
    }
}
