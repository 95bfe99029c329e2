//! Application configuration loading for CLI defaults.
//!
//! Precedence for every setting: command line, then config file, then the
//! built-in defaults of [`ClientConfig`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rawhttp_core::{ClientConfig, HeaderEntry, Method, collect_cookie_tokens, timeout_from_secs};

use crate::cli::Args;

/// File-backed defaults for request settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    /// Default host.
    pub host: Option<String>,
    /// Default request method.
    pub method: Option<Method>,
    /// Default request target.
    pub target: Option<String>,
    /// Default timeout in seconds.
    pub timeout_secs: Option<f64>,
    /// Default attempts per network exchange.
    pub max_tries: Option<u32>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(seconds) = self.timeout_secs {
            timeout_from_secs(seconds)
                .with_context(|| format!("Invalid config value for `timeout_secs`: {seconds}"))?;
        }
        if let Some(max_tries) = self.max_tries
            && !(1..=10).contains(&max_tries)
        {
            bail!("Invalid config value for `max_tries`: {max_tries}. Expected range: 1..=10");
        }
        if let Some(host) = &self.host
            && host.trim().is_empty()
        {
            bail!("Invalid config value for `host`: expected a non-empty hostname");
        }
        Ok(())
    }
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the tracing filter directive for this setting.
    #[must_use]
    pub fn filter(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/rawhttp/config.toml`
/// 2. `$HOME/.config/rawhttp/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("rawhttp").join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("rawhttp")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let line_no = line_index + 1;

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "host" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `host` value on line {line_no}"))?;
                cfg.host = Some(parsed);
            }
            "method" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `method` value on line {line_no}"))?;
                let method = parsed
                    .parse::<Method>()
                    .with_context(|| format!("Invalid `method` value on line {line_no}"))?;
                cfg.method = Some(method);
            }
            "target" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `target` value on line {line_no}"))?;
                cfg.target = Some(parsed);
            }
            "timeout_secs" => {
                let parsed = value
                    .parse::<f64>()
                    .with_context(|| format!("Invalid `timeout_secs` value on line {line_no}"))?;
                cfg.timeout_secs = Some(parsed);
            }
            "max_tries" => {
                let parsed = value
                    .parse::<u32>()
                    .with_context(|| format!("Invalid `max_tries` value on line {line_no}"))?;
                cfg.max_tries = Some(parsed);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        other => bail!("Expected one of default, verbose, quiet, debug; got '{other}'"),
    }
}

/// Merges CLI arguments over file config over built-in defaults.
pub fn build_client_config(args: &Args, file_config: Option<&FileConfig>) -> Result<ClientConfig> {
    let defaults = ClientConfig::default();
    let file = file_config.cloned().unwrap_or_default();

    let timeout = match args.timeout.or(file.timeout_secs) {
        Some(seconds) => timeout_from_secs(seconds)?,
        None => defaults.timeout,
    };

    let mut headers: Vec<HeaderEntry> = args.headers.iter().map(HeaderEntry::literal).collect();
    if !args.cookies.is_empty() {
        headers.push(HeaderEntry::Cookie(collect_cookie_tokens(&args.cookies)));
    }

    Ok(ClientConfig {
        method: args.method.or(file.method).unwrap_or(defaults.method),
        target: args.target.clone().or(file.target).unwrap_or(defaults.target),
        host: args.host.clone().or(file.host).unwrap_or(defaults.host),
        timeout,
        headers,
        output_file: args.output.clone(),
        follow_redirects: !args.no_redirect,
        max_tries: args.max_tries.or(file.max_tries).unwrap_or(defaults.max_tries),
    })
}

/// Resolves the tracing filter: `--quiet` > `-v`/`-vv` > file verbosity > info.
#[must_use]
pub fn default_log_level(args: &Args, file_config: Option<&FileConfig>) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => file_config
            .and_then(|cfg| cfg.verbosity)
            .map_or("info", VerbositySetting::filter),
        1 => "debug",
        _ => "trace",
    }
}
