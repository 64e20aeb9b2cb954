//! Runner configuration

use crate::err::{Result, StressError};
use crate::thread_pool::DEFAULT_QUEUE_CAPACITY;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Trials run by one stress iteration.
pub const DEFAULT_TRIALS_PER_ITERATION: u64 = 1000;

/// Config for a [`Tester`](crate::Tester)
///
/// Every field may be omitted from a config file, missing fields take
/// their default.
///
/// ```json
/// { "threads": 4, "queue_capacity": 100, "max_iterations": 50 }
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// number of worker threads
    pub threads: usize,
    /// capacity of the pool's task queue
    pub queue_capacity: usize,
    /// trials per stress iteration
    pub trials_per_iteration: u64,
    /// stop submitting stress iterations after this many, `None` runs until stopped
    pub max_iterations: Option<u64>,
    /// emit ANSI colors on the console
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            threads: num_cpus::get(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            trials_per_iteration: DEFAULT_TRIALS_PER_ITERATION,
            max_iterations: None,
            color: true,
        }
    }
}

impl Config {
    /// Default config with `threads` workers.
    pub fn with_threads(threads: usize) -> Self {
        Config {
            threads,
            ..Config::default()
        }
    }

    /// Read a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config> {
        let reader = BufReader::new(File::open(path)?);
        let config: Config = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pool cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(StressError::InvalidConfig("threads must be positive".to_owned()));
        }
        if self.queue_capacity == 0 {
            return Err(StressError::InvalidConfig(
                "queue_capacity must be positive".to_owned(),
            ));
        }
        if self.trials_per_iteration == 0 {
            return Err(StressError::InvalidConfig(
                "trials_per_iteration must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{ "threads": 3 }"#).unwrap();
        assert_eq!(config.threads, 3);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.trials_per_iteration, 1000);
        assert_eq!(config.max_iterations, None);
        assert!(config.color);
    }

    #[test]
    fn zero_threads_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "threads": 0 }}"#).unwrap();
        match Config::from_file(file.path()) {
            Err(StressError::InvalidConfig(msg)) => assert!(msg.contains("threads")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "workers": 2 }}"#).unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(StressError::Config(_))
        ));
    }
}
