use crate::error::ConfigError;
use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ── Default path constants ──────────────────────────────────────────────

/// Crawled log file relative to home.
const DEFAULT_INPUT_REL: &str = ".replypack/logs/logs.jsonl";

/// Pack output directory relative to home.
const DEFAULT_OUTPUT_REL: &str = ".replypack/packs";

// ── Default pipeline knobs ──────────────────────────────────────────────

const DEFAULT_CONTEXT_LEN: usize = 3;
const DEFAULT_BATCH_SIZE: usize = 100_000;
const DEFAULT_FLOOD_THRESHOLD: usize = 20;
const DEFAULT_MAX_TEXT_CHARS: usize = 200;

/// Windows are walked recursively, one frame per message of context.
pub const MAX_CONTEXT_LEN: usize = 64;

// ── Option enums ────────────────────────────────────────────────────────

/// Alphabet a message must contain at least one letter of.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Script {
    /// `А`..=`я`. Note that `Ё`/`ё` sit outside this range.
    #[default]
    Cyrillic,
    Latin,
    Greek,
}

impl Script {
    pub fn contains(self, c: char) -> bool {
        match self {
            Script::Cyrillic => ('\u{0410}'..='\u{044F}').contains(&c),
            Script::Latin => c.is_ascii_alphabetic(),
            Script::Greek => {
                ('\u{0391}'..='\u{03A9}').contains(&c) || ('\u{03B1}'..='\u{03C9}').contains(&c)
            }
        }
    }

    pub fn is_present_in(self, text: &str) -> bool {
        text.chars().any(|c| self.contains(c))
    }
}

impl FromStr for Script {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cyrillic" | "russian" => Ok(Script::Cyrillic),
            "latin" => Ok(Script::Latin),
            "greek" => Ok(Script::Greek),
            other => Err(ConfigError::UnknownScript(other.to_string())),
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Script::Cyrillic => "cyrillic",
            Script::Latin => "latin",
            Script::Greek => "greek",
        })
    }
}

/// How context windows are formed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WindowMode {
    /// Follow reply markers, falling back to the previous message.
    #[default]
    Replies,
    /// Plain sliding window over arrival order.
    Sequential,
}

impl FromStr for WindowMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replies" => Ok(WindowMode::Replies),
            "sequential" => Ok(WindowMode::Sequential),
            other => Err(ConfigError::UnknownWindowMode(other.to_string())),
        }
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WindowMode::Replies => "replies",
            WindowMode::Sequential => "sequential",
        })
    }
}

// ── Config structs ──────────────────────────────────────────────────────

/// Knobs shared by every pipeline stage. Passed by reference, never global.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Window size minus one.
    pub context_len: usize,
    pub batch_size: usize,
    /// A minute bucket holding more messages than this is dropped whole.
    pub flood_threshold: usize,
    /// Messages this many characters or longer are dropped.
    pub max_text_chars: usize,
    pub script: Script,
    pub window_mode: WindowMode,
    pub shuffle_seed: Option<u64>,
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_len: DEFAULT_CONTEXT_LEN,
            batch_size: DEFAULT_BATCH_SIZE,
            flood_threshold: DEFAULT_FLOOD_THRESHOLD,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            script: Script::default(),
            window_mode: WindowMode::default(),
            shuffle_seed: None,
            parallel: false,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context_len == 0 {
            return Err(ConfigError::ZeroContextLen);
        }
        if self.context_len > MAX_CONTEXT_LEN {
            return Err(ConfigError::ContextLenTooLarge(self.context_len));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct PackConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub pipeline: PipelineConfig,
}

impl PackConfig {
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir().context("could not resolve home directory")?;
        let defaults = PipelineConfig::default();

        Ok(Self {
            input: env_path("REPLYPACK_INPUT", home.join(DEFAULT_INPUT_REL), &home),
            output_dir: env_path("REPLYPACK_OUTPUT_DIR", home.join(DEFAULT_OUTPUT_REL), &home),
            pipeline: PipelineConfig {
                context_len: env_usize("REPLYPACK_CONTEXT_LEN", defaults.context_len),
                batch_size: env_usize("REPLYPACK_BATCH_SIZE", defaults.batch_size),
                flood_threshold: env_usize("REPLYPACK_FLOOD_THRESHOLD", defaults.flood_threshold),
                max_text_chars: env_usize("REPLYPACK_MAX_TEXT_CHARS", defaults.max_text_chars),
                script: env_parsed("REPLYPACK_SCRIPT", defaults.script),
                window_mode: env_parsed("REPLYPACK_WINDOW_MODE", defaults.window_mode),
                shuffle_seed: env_opt_u64("REPLYPACK_SEED"),
                parallel: env_bool("REPLYPACK_PARALLEL", defaults.parallel),
            },
        })
    }
}

fn env_path(key: &str, default: PathBuf, home: &Path) -> PathBuf {
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => expand_tilde(&val, home),
        _ => default,
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    match env::var(key) {
        Ok(val) => val.parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_opt_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|val| val.trim().parse::<u64>().ok())
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

fn expand_tilde(input: &str, home: &Path) -> PathBuf {
    if let Some(rest) = input.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.context_len, 3);
        assert_eq!(cfg.batch_size, 100_000);
        assert_eq!(cfg.flood_threshold, 20);
        assert_eq!(cfg.max_text_chars, 200);
        assert_eq!(cfg.script, Script::Cyrillic);
        assert_eq!(cfg.window_mode, WindowMode::Replies);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_sizes() {
        let cfg = PipelineConfig {
            context_len: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroContextLen));

        let cfg = PipelineConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroBatchSize));
    }

    #[test]
    fn validate_bounds_context_len() {
        let cfg = PipelineConfig {
            context_len: MAX_CONTEXT_LEN,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());

        let cfg = PipelineConfig {
            context_len: 1_000_000_000_000,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ContextLenTooLarge(1_000_000_000_000))
        );
    }

    #[test]
    fn cyrillic_range_excludes_yo() {
        assert!(Script::Cyrillic.is_present_in("ну да"));
        assert!(Script::Cyrillic.is_present_in("ok Я"));
        assert!(!Script::Cyrillic.is_present_in("ёё"));
        assert!(!Script::Cyrillic.is_present_in("hello 123"));
    }

    #[test]
    fn latin_and_greek_scripts() {
        assert!(Script::Latin.is_present_in("123 a"));
        assert!(!Script::Latin.is_present_in("привет"));
        assert!(Script::Greek.is_present_in("γεια"));
        assert!(!Script::Greek.is_present_in("hello"));
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("Latin".parse::<Script>(), Ok(Script::Latin));
        assert_eq!(" SEQUENTIAL ".parse::<WindowMode>(), Ok(WindowMode::Sequential));
        assert_eq!(
            "klingon".parse::<Script>(),
            Err(ConfigError::UnknownScript("klingon".to_string()))
        );
        assert_eq!(Script::Greek.to_string().parse::<Script>(), Ok(Script::Greek));
    }

    #[test]
    fn expand_tilde_joins_home() {
        let home = Path::new("/home/someone");
        assert_eq!(
            expand_tilde("~/logs/all.jsonl", home),
            PathBuf::from("/home/someone/logs/all.jsonl")
        );
        assert_eq!(expand_tilde("/abs/path", home), PathBuf::from("/abs/path"));
    }
}
