//! Context-prefixed event logging.
//!
//! Lines read `[run=cycle-1a2b3c4d] [stream=funding_rate] EVENT key=value ..`
//! so one grep on the run id follows a cycle or upsert batch end to end.

use std::fmt;

/// Run id (a monitoring cycle or an upsert batch) and optional stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub run_id: String,
    pub stream: Option<String>,
}

impl LogContext {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            stream: None,
        }
    }

    /// Same run, scoped to one stream.
    pub fn with_stream(&self, stream: &str) -> Self {
        Self {
            stream: Some(stream.to_string()),
            ..self.clone()
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[run={}]", self.run_id)?;
        if let Some(stream) = &self.stream {
            write!(f, " [stream={}]", stream)?;
        }
        Ok(())
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_event {
    ($level:ident, $ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::log::log!(
            ::log::Level::$level,
            concat!("{} {}", $(" ", stringify!($key), "={:?}"),*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($($args:tt)+) => { $crate::__log_event!(Info, $($args)+) };
}

#[macro_export]
macro_rules! log_warn {
    ($($args:tt)+) => { $crate::__log_event!(Warn, $($args)+) };
}

#[macro_export]
macro_rules! log_error {
    ($($args:tt)+) => { $crate::__log_event!(Error, $($args)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($($args:tt)+) => { $crate::__log_event!(Debug, $($args)+) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_with_and_without_stream() {
        let cycle = LogContext::new("cycle-123");
        assert_eq!(cycle.to_string(), "[run=cycle-123]");
        assert_eq!(
            cycle.with_stream("funding_rate").to_string(),
            "[run=cycle-123] [stream=funding_rate]"
        );
    }

    #[test]
    fn test_event_macros_expand() {
        let ctx = LogContext::new("cycle-1").with_stream("spot_orderbook");
        log_info!(ctx, "STREAM_EVALUATED", status = "fresh", records = 10);
        log_warn!(ctx, "STREAM_TIMEOUT", timeout_secs = 30,);
        log_debug!(ctx, "GAP_SCAN");
    }
}
