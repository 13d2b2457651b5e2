//! Human and JSON renderings of an `examine` run.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use colored::{ColoredString, Colorize};
use humansize::{format_size, BINARY};
use serde::Serialize;

use crate::filetype::{ArtifactCategory, ArtifactType, ClassificationOutcome};

/// Outcome for a single input file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<ArtifactType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn classified(path: &Path, size: u64, outcome: ClassificationOutcome) -> Self {
        Self {
            path: path.display().to_string(),
            size: Some(size),
            artifact_type: Some(outcome.artifact_type),
            description: Some(outcome.artifact_type.friendly_name()),
            evidence: outcome.evidence,
            error: None,
        }
    }

    pub fn failed(path: &Path, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            size: None,
            artifact_type: None,
            description: None,
            evidence: None,
            error: Some(error),
        }
    }
}

/// All files of one run plus per-type totals
#[derive(Debug, Clone, Serialize)]
pub struct ExamineReport {
    pub files: Vec<FileReport>,
    pub summary: BTreeMap<String, usize>,
}

impl ExamineReport {
    pub fn new(files: Vec<FileReport>) -> Self {
        let mut summary = BTreeMap::new();
        for file in &files {
            let key = match file.artifact_type {
                Some(artifact) => artifact.friendly_name().to_string(),
                None => "unreadable".to_string(),
            };
            *summary.entry(key).or_insert(0) += 1;
        }
        Self { files, summary }
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }

    pub fn render_human(&self, show_evidence: bool) -> String {
        let mut out = String::new();
        let width = self
            .files
            .iter()
            .map(|f| f.path.chars().count())
            .max()
            .unwrap_or(0);

        for file in &self.files {
            let _ = write!(out, "{:<width$}  ", file.path);
            match (&file.artifact_type, &file.error) {
                (Some(artifact), _) => {
                    let size = file.size.map(|s| format_size(s, BINARY)).unwrap_or_default();
                    let _ = writeln!(out, "{}  {}", paint(*artifact), size.dimmed());
                    if show_evidence {
                        if let Some(evidence) = &file.evidence {
                            let _ = writeln!(out, "{:<width$}    {}", "", evidence.dimmed());
                        }
                    }
                }
                (None, Some(error)) => {
                    let _ = writeln!(out, "{} {}", "✗".bright_red(), error.red());
                }
                (None, None) => {
                    let _ = writeln!(out);
                }
            }
        }

        if self.files.len() > 1 {
            let _ = writeln!(out);
            for (name, count) in &self.summary {
                let _ = writeln!(out, "{count:>6}  {name}");
            }
        }
        out
    }
}

fn paint(artifact: ArtifactType) -> ColoredString {
    let name = artifact.friendly_name();
    match artifact.category() {
        ArtifactCategory::Keystore => name.bright_cyan(),
        ArtifactCategory::Certificate => name.bright_green(),
        ArtifactCategory::Request => name.green(),
        ArtifactCategory::RevocationList => name.yellow(),
        ArtifactCategory::PrivateKey if artifact.is_encrypted() => name.bright_magenta(),
        ArtifactCategory::PrivateKey => name.bright_red(),
        ArtifactCategory::PublicKey => name.blue(),
        ArtifactCategory::Archive => name.white(),
        ArtifactCategory::Unknown => name.dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExamineReport {
        ExamineReport::new(vec![
            FileReport::classified(
                Path::new("ca.pem"),
                1200,
                ClassificationOutcome::new(ArtifactType::Certificate, "certificate for CN=Test CA"),
            ),
            FileReport::classified(
                Path::new("server.p12"),
                2048,
                ClassificationOutcome::new(ArtifactType::Pkcs12Keystore, "PFX"),
            ),
            FileReport::failed(Path::new("gone.jks"), "failed to read gone.jks".to_string()),
        ])
    }

    #[test]
    fn test_summary_counts() {
        let report = sample();
        assert_eq!(report.failed(), 1);
        assert_eq!(report.summary.get("Certificate(s)"), Some(&1));
        assert_eq!(report.summary.get("unreadable"), Some(&1));
    }

    #[test]
    fn test_human_rendering() {
        colored::control::set_override(false);
        let text = sample().render_human(true);
        assert!(text.contains("ca.pem      Certificate(s)  1.17 KiB"));
        assert!(text.contains("certificate for CN=Test CA"));
        assert!(text.contains("✗ failed to read gone.jks"));
    }

    #[test]
    fn test_json_rendering() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["files"][1]["artifact_type"], "pkcs12_keystore");
        assert_eq!(json["files"][2]["error"], "failed to read gone.jks");
        assert!(json["files"][2].get("artifact_type").is_none());
    }
}
