use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_QUESTION_COUNT: usize = 30;
pub const DEFAULT_DURATION_SECS: u64 = 30 * 60;
pub const DEFAULT_MIN_QUESTIONS: usize = 1;
pub const DEFAULT_STORE_POOL: u32 = 500;

/// Session sizing and timing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssessmentConfig {
    /// Target number of questions per session.
    pub question_count: usize,
    pub duration: Duration,
    /// Below this many resolved questions a session refuses to start.
    pub min_questions: usize,
    /// How many stored questions to pull before sampling.
    pub store_pool: u32,
    pub tick_period: Duration,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            duration: Duration::from_secs(DEFAULT_DURATION_SECS),
            min_questions: DEFAULT_MIN_QUESTIONS,
            store_pool: DEFAULT_STORE_POOL,
            tick_period: Duration::from_secs(1),
        }
    }
}

impl AssessmentConfig {
    /// Read `ASSESS_*` variables, falling back to defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but unparsable or zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AssessmentConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but unparsable or zero.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let question_count = parse_positive(
            &lookup,
            "ASSESS_QUESTION_COUNT",
            defaults.question_count,
        )?;
        let duration_secs = parse_positive(
            &lookup,
            "ASSESS_DURATION_SECS",
            defaults.duration.as_secs(),
        )?;
        let min_questions =
            parse_positive(&lookup, "ASSESS_MIN_QUESTIONS", defaults.min_questions)?;
        let store_pool = parse_positive(&lookup, "ASSESS_STORE_POOL", defaults.store_pool)?;

        Ok(Self {
            question_count,
            duration: Duration::from_secs(duration_secs),
            min_questions: min_questions.min(question_count),
            store_pool,
            tick_period: defaults.tick_period,
        })
    }

    #[must_use]
    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = count;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_min_questions(mut self, min: usize) -> Self {
        self.min_questions = min;
        self
    }

    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Whole seconds the countdown starts from. Never less than one.
    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        self.duration.as_secs().max(1)
    }
}

fn parse_positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }
    let value = trimmed.parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.clone(),
    })?;
    if value == T::default() {
        return Err(ConfigError::Zero { key });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AssessmentConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AssessmentConfig::default());
        assert_eq!(config.question_count, 30);
        assert_eq!(config.duration_secs(), 1800);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AssessmentConfig::from_lookup(lookup(&[
            ("ASSESS_QUESTION_COUNT", "12"),
            ("ASSESS_DURATION_SECS", " 90 "),
            ("ASSESS_MIN_QUESTIONS", "4"),
            ("ASSESS_STORE_POOL", "50"),
        ]))
        .unwrap();
        assert_eq!(config.question_count, 12);
        assert_eq!(config.duration, Duration::from_secs(90));
        assert_eq!(config.min_questions, 4);
        assert_eq!(config.store_pool, 50);
    }

    #[test]
    fn min_questions_is_capped_by_question_count() {
        let config = AssessmentConfig::from_lookup(lookup(&[
            ("ASSESS_QUESTION_COUNT", "3"),
            ("ASSESS_MIN_QUESTIONS", "10"),
        ]))
        .unwrap();
        assert_eq!(config.min_questions, 3);
    }

    #[test]
    fn garbage_and_zero_are_rejected() {
        let err =
            AssessmentConfig::from_lookup(lookup(&[("ASSESS_QUESTION_COUNT", "many")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "ASSESS_QUESTION_COUNT",
                value: "many".into()
            }
        );

        let err =
            AssessmentConfig::from_lookup(lookup(&[("ASSESS_DURATION_SECS", "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Zero {
                key: "ASSESS_DURATION_SECS"
            }
        );
    }
}
