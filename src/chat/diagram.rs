//! Diagram blocks embedded in assistant replies.
//!
//! DESIGN
//! ======
//! A reply carries a diagram when either side of the exchange asks for one:
//! the text mentions "mermaid" (or "d2") together with "diagram" or "sketch",
//! and does not mention the other dialect. The first fenced code block is
//! the source, and it must pass a cheap syntax sniff for the claimed dialect.
//!
//! Rendering shells out to `mmdc` or `d2 --sketch` in a scratch directory
//! and returns the produced SVG. The tools are optional; failures surface as
//! a [`DiagramError`] shown next to the message.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    Mermaid,
    D2,
}

impl DiagramKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::D2 => "d2",
        }
    }

    fn tool(self) -> &'static str {
        match self {
            Self::Mermaid => "mmdc",
            Self::D2 => "d2",
        }
    }
}

/// Tagged diagram payload kept alongside the assistant's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramBlock {
    #[serde(rename = "type")]
    pub kind: DiagramKind,
    pub source: String,
}

/// Outcome of scanning one prompt/reply pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Nobody asked for a diagram.
    NotRequested,
    /// A diagram was asked for and a plausible source block was found.
    Found(DiagramBlock),
    /// A diagram was asked for but the reply does not contain usable source.
    Rejected(&'static str),
}

// =============================================================================
// DETECTION
// =============================================================================

/// Which dialect, if any, the text asks for.
#[must_use]
pub fn requested_kind(text: &str) -> Option<DiagramKind> {
    let lower = text.to_lowercase();
    let wants_picture = lower.contains("diagram") || lower.contains("sketch");
    let mermaid = lower.contains("mermaid");
    let d2 = lower.contains("d2");

    if mermaid && wants_picture && !d2 {
        Some(DiagramKind::Mermaid)
    } else if d2 && wants_picture && !mermaid {
        Some(DiagramKind::D2)
    } else {
        None
    }
}

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:\w*\n)?(.*?)```").expect("fence regex"));

static MERMAID_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)graph\s+[TBLR]?[DRLR]?",
        r"(?i)sequenceDiagram",
        r"(?i)classDiagram",
        r"(?i)stateDiagram-v2",
        r"(?i)erDiagram",
        r"(?i)pie\s*title",
        r"(?i)gantt",
        r"(?i)flowchart\s+[TBLR]?[DRLR]?",
        r"-->|--x|==>",
        r"(?i)subgraph",
        r"(?i)participant",
        r"(?i)class\s+\w+",
        r"(?i)state\s+\w+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("mermaid sniff regex"))
    .collect()
});

static PYTHON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"import\s+|def\s+|class\s*:").expect("python sniff regex"));

static D2_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"->", r"<->", r"shape:", r"style:", r"direction:", r"(?s)\{.*?\}", r"label:"]
        .iter()
        .map(|p| Regex::new(p).expect("d2 sniff regex"))
        .collect()
});

/// Body of the first triple-backtick block, without its language tag line.
#[must_use]
pub fn first_code_block(text: &str) -> Option<&str> {
    FENCE_RE.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

#[must_use]
pub fn looks_like_mermaid(code: &str) -> bool {
    MERMAID_RES.iter().any(|re| re.is_match(code)) && !PYTHON_RE.is_match(code)
}

#[must_use]
pub fn looks_like_d2(code: &str) -> bool {
    D2_RES.iter().any(|re| re.is_match(code))
}

/// Scan a prompt/reply pair for a diagram the reply should carry.
#[must_use]
pub fn detect(prompt: &str, reply: &str) -> Detection {
    let Some(kind) = requested_kind(prompt).or_else(|| requested_kind(reply)) else {
        return Detection::NotRequested;
    };

    let Some(code) = first_code_block(reply) else {
        return Detection::Rejected(
            "No diagram code was found in the response. The assistant may need to provide the diagram code first.",
        );
    };
    if code.trim().is_empty() {
        return Detection::Rejected("Empty diagram code block found.");
    }

    let plausible = match kind {
        DiagramKind::Mermaid => looks_like_mermaid(code),
        DiagramKind::D2 => looks_like_d2(code),
    };
    if !plausible {
        return Detection::Rejected("The code block doesn't appear to contain valid diagram syntax.");
    }

    Detection::Found(DiagramBlock { kind, source: code.to_string() })
}

// =============================================================================
// RENDERING
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    #[error("cannot run {tool}: {message}")]
    Spawn { tool: &'static str, message: String },

    #[error("{tool} failed: {stderr}")]
    Failed { tool: &'static str, stderr: String },

    #[error("diagram generation with {tool} timed out after {secs}s")]
    Timeout { tool: &'static str, secs: u64 },

    #[error("diagram scratch file error: {0}")]
    Io(String),
}

impl crate::error::ErrorCode for DiagramError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "E_DIAGRAM_TOOL_MISSING",
            Self::Failed { .. } => "E_DIAGRAM_FAILED",
            Self::Timeout { .. } => "E_DIAGRAM_TIMEOUT",
            Self::Io(_) => "E_DIAGRAM_IO",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Runs the external diagram tools.
#[derive(Debug, Clone)]
pub struct DiagramRenderer {
    scratch_root: PathBuf,
    timeout: Duration,
}

impl DiagramRenderer {
    #[must_use]
    pub fn new(scratch_root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { scratch_root: scratch_root.into(), timeout }
    }

    /// Render `block` to SVG text.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is missing, exits non-zero, times out,
    /// or produces no output file.
    pub async fn render(&self, block: &DiagramBlock) -> Result<String, DiagramError> {
        let dir = self.scratch_root.join(format!("diagram-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DiagramError::Io(e.to_string()))?;

        let result = self.render_in(&dir, block).await;
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            tracing::debug!(error = %e, dir = %dir.display(), "diagram scratch cleanup failed");
        }
        result
    }

    async fn render_in(&self, dir: &std::path::Path, block: &DiagramBlock) -> Result<String, DiagramError> {
        let input = dir.join("raw_block.txt");
        let output = dir.join("output.svg");
        tokio::fs::write(&input, &block.source)
            .await
            .map_err(|e| DiagramError::Io(e.to_string()))?;

        let tool = block.kind.tool();
        let mut command = Command::new(tool);
        match block.kind {
            DiagramKind::Mermaid => command.arg("-q").arg("-i").arg(&input).arg("-o").arg(&output),
            DiagramKind::D2 => command.arg("--sketch").arg(&input).arg(&output),
        };
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| DiagramError::Spawn { tool, message: e.to_string() })?;
        let out = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DiagramError::Timeout { tool, secs: self.timeout.as_secs() })?
            .map_err(|e| DiagramError::Spawn { tool, message: e.to_string() })?;

        if !out.status.success() {
            return Err(DiagramError::Failed { tool, stderr: String::from_utf8_lossy(&out.stderr).trim().to_string() });
        }

        tokio::fs::read_to_string(&output)
            .await
            .map_err(|_| DiagramError::Failed { tool, stderr: "no output file produced".into() })
    }
}

impl Default for DiagramRenderer {
    fn default() -> Self {
        Self::new(std::env::temp_dir(), Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS))
    }
}

#[cfg(test)]
#[path = "diagram_test.rs"]
mod tests;
