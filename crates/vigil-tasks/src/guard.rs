//! Output-integrity guard.
//!
//! Runs over a completed task's output file before the result is relayed
//! onward. Checks are heuristic and advisory: `Fail` means the output is
//! unusable (missing or empty), `Warn` means a human should look before
//! relaying (suspiciously small, fabrication-shaped claims, internal
//! filesystem paths the recipient cannot resolve).

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use vigil_types::config::GuardConfig;
use vigil_types::Result;

/// Overall verdict, the worst severity among findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Pass => "pass",
            Verdict::Warn => "warn",
            Verdict::Fail => "fail",
        };
        f.write_str(s)
    }
}

/// One flagged issue in an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Verdict,
    /// Short machine-friendly rule name.
    pub rule: &'static str,
    /// Human-readable detail, including the offending snippet where useful.
    pub detail: String,
}

/// Result of inspecting one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardReport {
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
    /// Size of the inspected file; zero when missing.
    pub size_bytes: u64,
}

struct FabricationRule {
    name: &'static str,
    pattern: &'static str,
    detail: &'static str,
}

/// Suspiciously precise claims a sub-agent cannot usually substantiate.
const FABRICATION_RULES: &[FabricationRule] = &[
    FabricationRule {
        name: "precise-percentage",
        pattern: r"\b\d{1,3}\.\d{1,2}\s?%",
        detail: "decimal-precision percentage",
    },
    FabricationRule {
        name: "precise-monetary",
        pattern: r"[$€£]\s?\d{1,3}(,\d{3})+(\.\d{2})?",
        detail: "precise monetary figure",
    },
    FabricationRule {
        name: "exactly-n",
        pattern: r"(?i)\b(exactly|precisely)\s+\d",
        detail: "claim of exact count",
    },
];

fn compiled_rules() -> &'static Vec<(&'static FabricationRule, Regex)> {
    static RULES: OnceLock<Vec<(&'static FabricationRule, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        FABRICATION_RULES
            .iter()
            .filter_map(|rule| match Regex::new(rule.pattern) {
                Ok(re) => Some((rule, re)),
                Err(e) => {
                    tracing::warn!(rule = rule.name, error = %e, "skipping unparseable guard rule");
                    None
                }
            })
            .collect()
    })
}

/// Inspect one output file and return findings plus an overall verdict.
///
/// Only the filesystem read can error; every content problem comes back
/// as a finding so callers always get a full report.
pub fn inspect_output(path: &Path, config: &GuardConfig) -> Result<GuardReport> {
    let mut findings = Vec::new();

    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(report_with(vec![Finding {
                severity: Verdict::Fail,
                rule: "missing-output",
                detail: format!("{} does not exist", path.display()),
            }], 0));
        }
        Err(e) => return Err(e.into()),
    };

    let size_bytes = metadata.len();
    if size_bytes == 0 {
        return Ok(report_with(vec![Finding {
            severity: Verdict::Fail,
            rule: "empty-output",
            detail: format!("{} is empty", path.display()),
        }], 0));
    }
    if size_bytes < config.min_plausible_bytes {
        findings.push(Finding {
            severity: Verdict::Warn,
            rule: "implausibly-small",
            detail: format!("only {size_bytes} bytes"),
        });
    }

    let content = std::fs::read_to_string(path)?;

    for (rule, re) in compiled_rules() {
        if let Some(m) = re.find(&content) {
            findings.push(Finding {
                severity: Verdict::Warn,
                rule: rule.name,
                detail: format!("{} ('{}')", rule.detail, m.as_str()),
            });
        }
    }

    for prefix in &config.internal_path_prefixes {
        if content.contains(prefix.as_str()) {
            findings.push(Finding {
                severity: Verdict::Warn,
                rule: "internal-path",
                detail: format!("references internal path under {prefix}"),
            });
        }
    }

    let report = report_with(findings, size_bytes);
    tracing::info!(
        path = %path.display(),
        verdict = %report.verdict,
        findings = report.findings.len(),
        "output inspected"
    );
    Ok(report)
}

fn report_with(findings: Vec<Finding>, size_bytes: u64) -> GuardReport {
    let verdict = findings
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(Verdict::Pass);
    GuardReport { verdict, findings, size_bytes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_output(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("out.md");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn config() -> GuardConfig {
        GuardConfig::default()
    }

    #[test]
    fn missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        let report = inspect_output(&tmp.path().join("nope.md"), &config()).unwrap();
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.findings[0].rule, "missing-output");
    }

    #[test]
    fn empty_file_fails() {
        let tmp = TempDir::new().unwrap();
        let path = write_output(&tmp, "");
        let report = inspect_output(&path, &config()).unwrap();
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.findings[0].rule, "empty-output");
    }

    #[test]
    fn small_output_warns() {
        let tmp = TempDir::new().unwrap();
        let path = write_output(&tmp, "too short");
        let report = inspect_output(&path, &config()).unwrap();
        assert_eq!(report.verdict, Verdict::Warn);
        assert_eq!(report.findings[0].rule, "implausibly-small");
    }

    #[test]
    fn plausible_clean_output_passes() {
        let tmp = TempDir::new().unwrap();
        let body = "The survey covers three vendors. Adoption grew roughly a \
                    third year over year, with most growth in the second half.";
        let path = write_output(&tmp, body);
        let report = inspect_output(&path, &config()).unwrap();
        assert_eq!(report.verdict, Verdict::Pass);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn decimal_percentage_warns() {
        let tmp = TempDir::new().unwrap();
        let body = "Market share rose to 34.72% according to our analysis, a \
                    figure derived from the combined quarterly filings below.";
        let path = write_output(&tmp, body);
        let report = inspect_output(&path, &config()).unwrap();
        assert_eq!(report.verdict, Verdict::Warn);
        assert!(report.findings.iter().any(|f| f.rule == "precise-percentage"));
    }

    #[test]
    fn round_percentage_is_fine() {
        let tmp = TempDir::new().unwrap();
        let body = "Roughly 35% of respondents agreed, which is consistent \
                    with the prior year's survey of the same population.";
        let path = write_output(&tmp, body);
        let report = inspect_output(&path, &config()).unwrap();
        assert_eq!(report.verdict, Verdict::Pass);
    }

    #[test]
    fn monetary_figure_warns() {
        let tmp = TempDir::new().unwrap();
        let body = "The acquisition closed at $1,234,567.89 per the press \
                    release, which also named the three founding investors.";
        let path = write_output(&tmp, body);
        let report = inspect_output(&path, &config()).unwrap();
        assert!(report.findings.iter().any(|f| f.rule == "precise-monetary"));
    }

    #[test]
    fn exact_count_claim_warns() {
        let tmp = TempDir::new().unwrap();
        let body = "There are exactly 412 open issues in the tracker today, \
                    spread across the four components described earlier.";
        let path = write_output(&tmp, body);
        let report = inspect_output(&path, &config()).unwrap();
        assert!(report.findings.iter().any(|f| f.rule == "exactly-n"));
    }

    #[test]
    fn internal_path_warns() {
        let tmp = TempDir::new().unwrap();
        let body = "Full results were saved to /root/workspace/results.csv \
                    and the raw scrape output sits alongside in the same dir.";
        let path = write_output(&tmp, body);
        let report = inspect_output(&path, &config()).unwrap();
        assert_eq!(report.verdict, Verdict::Warn);
        assert!(report.findings.iter().any(|f| f.rule == "internal-path"));
    }

    #[test]
    fn verdict_is_worst_finding() {
        let tmp = TempDir::new().unwrap();
        // Small AND contains an internal path: still only Warn.
        let path = write_output(&tmp, "see /root/x.md");
        let report = inspect_output(&path, &config()).unwrap();
        assert_eq!(report.verdict, Verdict::Warn);
        assert!(report.findings.len() >= 2);
    }

    #[test]
    fn all_fabrication_patterns_compile() {
        assert_eq!(compiled_rules().len(), FABRICATION_RULES.len());
    }
}
