// Pipeline configuration.
//
// Every tunable of the running bot lives in `RapbotConfig`, loaded from
// JSON at startup (JSON string in, typed struct out). Every field has a
// default, so a config file only needs the values it changes; unknown
// fields are rejected so a typo does not silently fall back to a default.
//
// The model and assembler sections reuse the parameter structs of their
// crates (`MarkovParams`, `RapperParams`). `validate` checks the whole
// document before the pipeline spawns anything, so nothing downstream has
// to handle malformed configuration.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use rapbot_markov::{MarkovParams, ParamsError};
use rapbot_rapper::{Rapper, RapperError, RapperParams};

/// Largest accepted queue, buffer or history size.
pub const MAX_CAPACITY: usize = 1 << 20;
/// Largest accepted target phrase length, in words.
pub const MAX_PHRASE_LENGTH: usize = 1024;
/// Largest accepted generation worker count.
pub const MAX_WORKERS: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("markov: {0}")]
    Markov(#[from] ParamsError),
    #[error("rapper: {0}")]
    Rapper(#[from] RapperError),
    #[error("generation.workers must be positive when set")]
    ZeroWorkers,
    #[error("generation.workers is {workers}, at most {max} allowed", max = MAX_WORKERS)]
    TooManyWorkers { workers: usize },
    #[error("generation.phrase_lengths must be non-empty and positive")]
    InvalidPhraseLengths,
    #[error("generation.phrase_lengths entry {len} exceeds {max}", max = MAX_PHRASE_LENGTH)]
    PhraseTooLong { len: usize },
    #[error("generation.max_tries must be positive")]
    ZeroMaxTries,
    #[error("{0} must be positive")]
    ZeroCapacity(&'static str),
    #[error("{name} is {value}, at most {max} allowed", max = MAX_CAPACITY)]
    CapacityTooLarge { name: &'static str, value: usize },
}

// ---------------------------------------------------------------------------
// Generation workers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Worker thread count. `None` uses the available parallelism.
    pub workers: Option<usize>,
    /// Target phrase lengths in words; each worker cycles through them.
    pub phrase_lengths: Vec<usize>,
    /// Attempts per `generate` call.
    pub max_tries: usize,
    /// Bound of the candidate phrase queue feeding the assemblers.
    pub queue_capacity: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            workers: None,
            phrase_lengths: vec![5, 6, 6, 6, 6, 7, 7],
            max_tries: 10,
            queue_capacity: 64,
        }
    }
}

impl GenerationConfig {
    /// Effective worker count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RapbotConfig {
    pub markov: MarkovParams,
    pub generation: GenerationConfig,
    pub rapper: RapperParams,
    /// Depth of the freshness-first lyric buffer.
    pub buffer_depth: usize,
    /// Lyrics kept for replies.
    pub history_capacity: usize,
    /// Bound of the queue of sentences waiting to be learned.
    pub sentence_queue_capacity: usize,
}

impl Default for RapbotConfig {
    fn default() -> Self {
        RapbotConfig {
            markov: MarkovParams::default(),
            generation: GenerationConfig::default(),
            rapper: RapperParams::default(),
            buffer_depth: 5,
            history_capacity: 100,
            sentence_queue_capacity: 1024,
        }
    }
}

impl RapbotConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RapbotConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.markov.validate()?;
        Rapper::new(&self.rapper)?;

        let generation = &self.generation;
        match generation.workers {
            Some(0) => return Err(ConfigError::ZeroWorkers),
            Some(workers) if workers > MAX_WORKERS => {
                return Err(ConfigError::TooManyWorkers { workers });
            }
            _ => {}
        }
        if generation.phrase_lengths.is_empty() || generation.phrase_lengths.contains(&0) {
            return Err(ConfigError::InvalidPhraseLengths);
        }
        if let Some(&len) = generation.phrase_lengths.iter().find(|&&l| l > MAX_PHRASE_LENGTH) {
            return Err(ConfigError::PhraseTooLong { len });
        }
        if generation.max_tries == 0 {
            return Err(ConfigError::ZeroMaxTries);
        }
        for (name, value) in [
            ("generation.queue_capacity", generation.queue_capacity),
            ("buffer_depth", self.buffer_depth),
            ("history_capacity", self.history_capacity),
            ("sentence_queue_capacity", self.sentence_queue_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroCapacity(name));
            }
            if value > MAX_CAPACITY {
                return Err(ConfigError::CapacityTooLarge { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapbot_lang::{MoraWeight, WeightError};

    #[test]
    fn default_config_is_valid() {
        let config = RapbotConfig::default();
        config.validate().unwrap();
        assert_eq!(config.markov.ngram, 3);
        assert_eq!(config.rapper.threshold, 0.8);
        assert_eq!(config.rapper.line_counts, vec![2, 3, 3, 4, 4]);
        assert_eq!(config.generation.phrase_lengths, vec![5, 6, 6, 6, 6, 7, 7]);
    }

    #[test]
    fn default_config_serializes() {
        let config = RapbotConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored = RapbotConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn config_loads_from_partial_json() {
        let json = r#"{
            "markov": { "ngram": 2, "generation_capacity": 500 },
            "generation": { "workers": 2 },
            "rapper": { "weights": [[1, 2], [4, 8]], "line_counts": [2] },
            "buffer_depth": 3
        }"#;
        let config = RapbotConfig::from_json(json).unwrap();
        assert_eq!(config.markov.ngram, 2);
        assert_eq!(config.markov.generation_capacity, 500);
        assert_eq!(config.markov.generations, 4);
        assert_eq!(config.generation.worker_count(), 2);
        assert_eq!(
            config.rapper.weights,
            vec![MoraWeight::new(1.0, 2.0), MoraWeight::new(4.0, 8.0)]
        );
        assert_eq!(config.rapper.line_counts, vec![2]);
        assert_eq!(config.buffer_depth, 3);
        assert_eq!(config.history_capacity, 100);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            RapbotConfig::from_json(r#"{ "buffer_dept": 3 }"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            RapbotConfig::from_json(r#"{ "markov": { "order": 3 } }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            (r#"{ "markov": { "ngram": 1 } }"#, "markov"),
            (r#"{ "rapper": { "weights": [] } }"#, "weights"),
            (r#"{ "rapper": { "threshold": 2.0 } }"#, "threshold"),
            (r#"{ "generation": { "workers": 0 } }"#, "workers"),
            (r#"{ "generation": { "phrase_lengths": [5, 0] } }"#, "phrase_lengths"),
            (r#"{ "generation": { "max_tries": 0 } }"#, "max_tries"),
            (r#"{ "buffer_depth": 0 }"#, "buffer_depth"),
        ];
        for (json, what) in cases {
            assert!(RapbotConfig::from_json(json).is_err(), "{what} accepted");
        }
        assert!(matches!(
            RapbotConfig::from_json(r#"{ "rapper": { "weights": [] } }"#),
            Err(ConfigError::Rapper(RapperError::Weights(WeightError::Empty)))
        ));
        assert!(matches!(
            RapbotConfig::from_json(r#"{ "history_capacity": 0 }"#),
            Err(ConfigError::ZeroCapacity("history_capacity"))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RapbotConfig::load(Path::new("/nonexistent/rapbot.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rapbot.json"), "{err}");
    }

    #[test]
    fn oversized_values_are_rejected() {
        assert!(matches!(
            RapbotConfig::from_json(r#"{ "history_capacity": 1152921504606846976 }"#),
            Err(ConfigError::CapacityTooLarge {
                name: "history_capacity",
                ..
            })
        ));
        assert!(matches!(
            RapbotConfig::from_json(r#"{ "buffer_depth": 18446744073709551615 }"#),
            Err(ConfigError::CapacityTooLarge {
                name: "buffer_depth",
                ..
            })
        ));
        assert!(matches!(
            RapbotConfig::from_json(r#"{ "generation": { "queue_capacity": 2000000 } }"#),
            Err(ConfigError::CapacityTooLarge { .. })
        ));
        assert!(matches!(
            RapbotConfig::from_json(r#"{ "sentence_queue_capacity": 2000000 }"#),
            Err(ConfigError::CapacityTooLarge { .. })
        ));
        assert!(matches!(
            RapbotConfig::from_json(r#"{ "generation": { "phrase_lengths": [5, 4611686018427387904] } }"#),
            Err(ConfigError::PhraseTooLong {
                len: 4611686018427387904
            })
        ));
        assert!(matches!(
            RapbotConfig::from_json(r#"{ "generation": { "workers": 100000 } }"#),
            Err(ConfigError::TooManyWorkers { workers: 100000 })
        ));

        let mut at_limit = RapbotConfig::default();
        at_limit.history_capacity = MAX_CAPACITY;
        at_limit.generation.phrase_lengths = vec![MAX_PHRASE_LENGTH];
        at_limit.generation.workers = Some(MAX_WORKERS);
        assert!(at_limit.validate().is_ok());
    }
}
