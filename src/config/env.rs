//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "MICROUNIT";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Output format from MICROUNIT_FORMAT
    pub format: Option<String>,
    /// Disable colour from MICROUNIT_NO_COLOR
    pub no_color: Option<bool>,
    /// Failure details from MICROUNIT_DETAILS
    pub details: Option<bool>,
    /// Reclaim grace from MICROUNIT_GRACE_MS
    pub grace_ms: Option<u64>,
    /// Log level from MICROUNIT_LOG
    pub log: Option<String>,
    /// Config file from MICROUNIT_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            format: get_env("FORMAT"),
            no_color: get_env_bool("NO_COLOR"),
            details: get_env_bool("DETAILS"),
            grace_ms: get_env_parse("GRACE_MS"),
            log: get_env("LOG"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.format.is_some()
            || self.no_color.is_some()
            || self.details.is_some()
            || self.grace_ms.is_some()
            || self.log.is_some()
            || self.config_file.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_FORMAT:    {:?}", ENV_PREFIX, self.format);
        println!("  {}_NO_COLOR:  {:?}", ENV_PREFIX, self.no_color);
        println!("  {}_DETAILS:   {:?}", ENV_PREFIX, self.details);
        println!("  {}_GRACE_MS:  {:?}", ENV_PREFIX, self.grace_ms);
        println!("  {}_LOG:       {:?}", ENV_PREFIX, self.log);
        println!("  {}_CONFIG:    {:?}", ENV_PREFIX, self.config_file);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    /// Create a new environment builder
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    fn var(mut self, name: &str, value: String) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value));
        self
    }

    pub fn format(self, format: impl Into<String>) -> Self {
        self.var("FORMAT", format.into())
    }

    pub fn no_color(self, no_color: bool) -> Self {
        self.var("NO_COLOR", no_color.to_string())
    }

    pub fn details(self, details: bool) -> Self {
        self.var("DETAILS", details.to_string())
    }

    pub fn grace_ms(self, grace: u64) -> Self {
        self.var("GRACE_MS", grace.to_string())
    }

    pub fn log(self, level: impl Into<String>) -> Self {
        self.var("LOG", level.into())
    }

    pub fn config_file(self, path: impl Into<String>) -> Self {
        self.var("CONFIG", path.into())
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all MICROUNIT environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_FORMAT     Output format (text, json, json-pretty, summary)");
    println!("  {ENV_PREFIX}_NO_COLOR   Disable coloured output (true/false)");
    println!("  {ENV_PREFIX}_DETAILS    Print failure cause chains (true/false)");
    println!("  {ENV_PREFIX}_GRACE_MS   Wait for timed-out tests to release the suite (ms)");
    println!("  {ENV_PREFIX}_LOG        Log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_CONFIG     Path to configuration file");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_FORMAT=summary");
    println!("  microunit run --suite CalculatorSuite");
}
