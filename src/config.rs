// Runtime configuration
//
// Everything is read from environment variables (after `.env` is loaded).
// A variable that is present but unparsable falls back to its default with a
// warning; `validate` rejects combinations the coordinator cannot run with.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables of the coordination engine
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    pub max_agents_per_task: usize,
    pub task_timeout: Duration,
    pub collaboration_timeout: Duration,
    pub load_balance_threshold: f64,
    pub scheduler_tick: Duration,
    pub maintenance_interval: Duration,
    pub requeue_backoff: Duration,
    pub max_requeue_backoff: Duration,
    /// `None` retries assignment forever
    pub max_assignment_attempts: Option<u32>,
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_agents_per_task: 5,
            task_timeout: Duration::from_secs(1800),
            collaboration_timeout: Duration::from_secs(3600),
            load_balance_threshold: 0.8,
            scheduler_tick: Duration::from_secs(5),
            maintenance_interval: Duration::from_secs(30),
            requeue_backoff: Duration::from_secs(30),
            max_requeue_backoff: Duration::from_secs(300),
            max_assignment_attempts: Some(20),
            event_capacity: 256,
        }
    }
}

impl CoordinatorConfig {
    /// Delay before the `attempt`-th requeue (1-based): doubles each time, capped
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.requeue_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_requeue_backoff)
    }

    /// Whether a task with this many failed attempts should stop being retried
    pub fn attempts_exhausted(&self, attempts: u32) -> bool {
        self.max_assignment_attempts
            .is_some_and(|max| attempts >= max)
    }

    /// Execution budget for a simple or collaborative task
    pub fn timeout_for(&self, collaborative: bool) -> Duration {
        if collaborative {
            self.collaboration_timeout
        } else {
            self.task_timeout
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.load_balance_threshold > 0.0 && self.load_balance_threshold <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "LOAD_BALANCE_THRESHOLD",
                expected: "in (0, 1]",
                value: self.load_balance_threshold.to_string(),
            });
        }
        if self.max_agents_per_task == 0 {
            return Err(ConfigError::OutOfRange {
                name: "MAX_AGENTS_PER_TASK",
                expected: "at least 1",
                value: "0".to_string(),
            });
        }
        for (name, value) in [
            ("SCHEDULER_TICK_MS", self.scheduler_tick),
            ("MAINTENANCE_INTERVAL_SECS", self.maintenance_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::OutOfRange {
                    name,
                    expected: "greater than zero",
                    value: "0".to_string(),
                });
            }
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                name: "event_capacity",
                expected: "at least 1",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Process-level settings for the server binary
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub coordinator: CoordinatorConfig,
}

impl Settings {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup (the environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let defaults = CoordinatorConfig::default();

        let coordinator = CoordinatorConfig {
            max_agents_per_task: parse_or(&lookup, "MAX_AGENTS_PER_TASK", defaults.max_agents_per_task),
            task_timeout: secs_or(&lookup, "TASK_TIMEOUT_SECS", defaults.task_timeout),
            collaboration_timeout: secs_or(
                &lookup,
                "COLLABORATION_TIMEOUT_SECS",
                defaults.collaboration_timeout,
            ),
            load_balance_threshold: parse_or(
                &lookup,
                "LOAD_BALANCE_THRESHOLD",
                defaults.load_balance_threshold,
            ),
            scheduler_tick: lookup("SCHEDULER_TICK_MS")
                .and_then(|raw| parse_value::<u64>("SCHEDULER_TICK_MS", &raw))
                .map(Duration::from_millis)
                .unwrap_or(defaults.scheduler_tick),
            maintenance_interval: secs_or(
                &lookup,
                "MAINTENANCE_INTERVAL_SECS",
                defaults.maintenance_interval,
            ),
            requeue_backoff: secs_or(&lookup, "REQUEUE_BACKOFF_SECS", defaults.requeue_backoff),
            max_requeue_backoff: secs_or(
                &lookup,
                "MAX_REQUEUE_BACKOFF_SECS",
                defaults.max_requeue_backoff,
            ),
            max_assignment_attempts: match lookup("MAX_ASSIGNMENT_ATTEMPTS") {
                // 0 means retry forever
                Some(raw) => match parse_value::<u32>("MAX_ASSIGNMENT_ATTEMPTS", &raw) {
                    Some(0) => None,
                    Some(max) => Some(max),
                    None => defaults.max_assignment_attempts,
                },
                None => defaults.max_assignment_attempts,
            },
            event_capacity: defaults.event_capacity,
        };
        coordinator.validate()?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| {
                tracing::warn!("DATABASE_URL not set, using default");
                "sqlite://coordinator.db".to_string()
            }),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            coordinator,
        })
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = raw, "invalid value, using default");
            None
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    lookup(name)
        .and_then(|raw| parse_value(name, &raw))
        .unwrap_or(default)
}

fn secs_or(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: Duration) -> Duration {
    lookup(name)
        .and_then(|raw| parse_value::<u64>(name, &raw))
        .map(Duration::from_secs)
        .unwrap_or(default)
}
