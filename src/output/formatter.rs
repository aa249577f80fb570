//! Output formatters for run results
//!
//! Provides text, JSON and one-line summary formats.

use serde::Serialize;
use std::io::Write;

use crate::models::{Failure, RunResult, TestDescriptor};

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "tree" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::JsonPretty => "json-pretty",
            OutputFormat::Summary => "summary",
        }
    }

    /// Whether the live tree report belongs on stdout with this format
    pub fn is_textual(&self) -> bool {
        matches!(self, OutputFormat::Text | OutputFormat::Summary)
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
    details: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
            details: false,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Include the full cause chain of every failure
    pub fn with_details(mut self, details: bool) -> Self {
        self.details = details;
        self
    }

    /// Format the result of a whole run
    pub fn format_result(&self, result: &RunResult) -> String {
        match self.format {
            OutputFormat::Text => self.format_text(result),
            OutputFormat::Json => serde_json::to_string(&result.summary()).unwrap_or_default(),
            OutputFormat::JsonPretty => {
                serde_json::to_string_pretty(&result.summary()).unwrap_or_default()
            }
            OutputFormat::Summary => self.format_brief(result),
        }
    }

    fn format_text(&self, result: &RunResult) -> String {
        let mut output = String::new();

        let heading = format!("Failures ({}):", result.failures().len());
        if self.colorize && !result.succeeded() {
            output.push_str(&format!("\n\x1b[31m{heading}\x1b[0m\n"));
        } else {
            output.push_str(&format!("\n{heading}\n"));
        }

        for failure in result.failures() {
            output.push_str(&self.format_failure(failure));
        }

        output.push('\n');
        output.push_str(&self.format_brief(result));
        output.push('\n');
        output
    }

    fn format_failure(&self, failure: &Failure) -> String {
        let mut output = format!("{}\n", failure.location());
        output.push_str(&format!(
            " MethodSource [className = '{}', methodName = '{}', methodParameterTypes = '']\n",
            failure.suite, failure.descriptor.name
        ));

        let body = if self.details {
            failure.detail()
        } else {
            failure.message()
        };
        for line in body.lines() {
            output.push_str(&format!("     {line}\n"));
        }
        output
    }

    fn format_brief(&self, result: &RunResult) -> String {
        let failures = result.failures().len();
        let failed = if self.colorize && failures > 0 {
            format!("\x1b[31m{failures}\x1b[0m")
        } else {
            failures.to_string()
        };

        format!(
            "{}/{} passed, {} failures in {}ms",
            result.passed_tests(),
            result.total_tests(),
            failed,
            result.duration_ms()
        )
    }

    /// Format the declared methods of one suite
    pub fn format_suite(&self, suite: &str, descriptors: &[TestDescriptor], detailed: bool) -> String {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => {
                #[derive(Serialize)]
                struct SuiteJson<'a> {
                    suite: &'a str,
                    methods: &'a [TestDescriptor],
                }

                let json = SuiteJson {
                    suite,
                    methods: descriptors,
                };
                if self.format == OutputFormat::JsonPretty {
                    serde_json::to_string_pretty(&json).unwrap_or_default()
                } else {
                    serde_json::to_string(&json).unwrap_or_default()
                }
            }
            _ => self.format_suite_text(suite, descriptors, detailed),
        }
    }

    fn format_suite_text(&self, suite: &str, descriptors: &[TestDescriptor], detailed: bool) -> String {
        let mut output = format!("{suite}\n");
        for desc in descriptors {
            if !detailed && !desc.is_test() {
                continue;
            }
            output.push_str(&format!("  {:<14} {}", desc.role.label(), desc));

            if detailed {
                let mut notes = Vec::new();
                if desc.repeat != 1 {
                    notes.push(format!("repeat={}", desc.repeat));
                }
                if let Some(timeout) = &desc.timeout {
                    notes.push(format!("timeout={timeout}"));
                }
                if let Some(expected) = &desc.expected {
                    notes.push(format!("expects={}", expected.short_name()));
                }
                if !desc.depends_on.is_empty() {
                    notes.push(format!("depends_on={}", desc.depends_on.join(",")));
                }
                if !notes.is_empty() {
                    output.push_str(&format!("  [{}]", notes.join(" ")));
                }
            }
            output.push('\n');
        }
        output
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Text)
    }
}

/// Write a run result to a file
pub fn write_result_to_file(path: &str, result: &RunResult, format: OutputFormat) -> anyhow::Result<()> {
    let formatter = ResultFormatter::new(format).no_color();
    let content = formatter.format_result(result);

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, SuiteStats, TestError, TimeUnit, Timeout};

    fn sample_result() -> RunResult {
        let mut result = RunResult::new();
        result.record_suite(SuiteStats {
            name: "CalculatorSuite".into(),
            tests: 2,
            passed: 1,
            failed: 1,
            duration_ms: 3,
        });
        result.add_failure(Failure::new(
            "CalculatorSuite",
            TestDescriptor::new("add", Role::Test),
            TestError::Mismatch {
                expected: "3".into(),
                actual: "5".into(),
                message: None,
            },
        ));
        result.finish();
        result
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TEXT"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("json-pretty"), Some(OutputFormat::JsonPretty));
        assert_eq!(OutputFormat::from_str("unknown"), None);
    }

    #[test]
    fn test_text_format() {
        let text = ResultFormatter::new(OutputFormat::Text)
            .no_color()
            .format_result(&sample_result());

        assert!(text.contains("Failures (1):"));
        assert!(text.contains("CalculatorSuite:add()"));
        assert!(text.contains(
            " MethodSource [className = 'CalculatorSuite', methodName = 'add', methodParameterTypes = '']"
        ));
        assert!(text.contains("     expected: <3> but was: <5>"));
        assert!(text.contains("1/2 passed, 1 failures in"));
    }

    #[test]
    fn test_json_format() {
        let json = ResultFormatter::new(OutputFormat::Json).format_result(&sample_result());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["succeeded"], false);
        assert_eq!(value["tests"], 2);
        assert_eq!(value["failures"][0]["test"], "add");
        assert_eq!(value["suites"][0]["name"], "CalculatorSuite");
    }

    #[test]
    fn test_suite_listing() {
        let mut timed = TestDescriptor::new("slow", Role::Test);
        timed.timeout = Some(Timeout::new(35, TimeUnit::Millis));
        let descriptors = vec![TestDescriptor::new("setUp", Role::CaseSetup), timed];

        let formatter = ResultFormatter::new(OutputFormat::Text).no_color();
        let brief = formatter.format_suite("CalculatorSuite", &descriptors, false);
        assert!(!brief.contains("setUp"));
        assert!(brief.contains("slow()"));

        let detailed = formatter.format_suite("CalculatorSuite", &descriptors, true);
        assert!(detailed.contains("setUp()"));
        assert!(detailed.contains("timeout=35ms"));
    }
}
