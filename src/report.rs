// src/report.rs

//! Framed output block for parent processes.
//!
//! After a run the buffered output is printed between two literal marker
//! lines so a caller can pull the payload out of interleaved diagnostics.
//! The layout is a compatibility contract; do not change it.

use std::io::{self, Write};

pub const OUTPUT_START_MARKER: &str = "[KIMI_OUTPUT_START]";
pub const OUTPUT_END_MARKER: &str = "[KIMI_OUTPUT_END]";

const RULE_WIDTH: usize = 50;

/// Render the framed block:
/// blank line, a 50-char `=` rule, start marker, output, end marker.
pub fn render_framed(output: &str) -> String {
    format!(
        "\n{rule}\n{OUTPUT_START_MARKER}\n{output}\n{OUTPUT_END_MARKER}\n",
        rule = "=".repeat(RULE_WIDTH)
    )
}

pub fn write_framed(out: &mut impl Write, output: &str) -> io::Result<()> {
    out.write_all(render_framed(output).as_bytes())?;
    out.flush()
}

/// Extract the payload from text containing a framed block.
///
/// Returns `None` when either marker line is missing.
pub fn extract_framed(text: &str) -> Option<&str> {
    let start_tag = format!("{OUTPUT_START_MARKER}\n");
    let end_tag = format!("\n{OUTPUT_END_MARKER}");

    let start = text.find(&start_tag)? + start_tag.len();
    let end = start + text[start..].rfind(&end_tag)?;
    Some(&text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_layout_is_exact() {
        let framed = render_framed("hello\n");
        let expected = format!(
            "\n{}\n[KIMI_OUTPUT_START]\nhello\n\n[KIMI_OUTPUT_END]\n",
            "=".repeat(50)
        );
        assert_eq!(framed, expected);
    }

    #[test]
    fn extract_recovers_payload_among_noise() {
        let payload = "line one\n[KIMI_OUTPUT_START] inside text\nline three";
        let text = format!("[Kimi] Executing: kimi\nnoise\n{}trailer\n", render_framed(payload));
        assert_eq!(extract_framed(&text), Some(payload));
    }

    #[test]
    fn extract_without_markers_is_none() {
        assert_eq!(extract_framed("no frame here"), None);
        assert_eq!(extract_framed("[KIMI_OUTPUT_START]\nunterminated"), None);
    }

    #[test]
    fn empty_output_still_framed() {
        assert_eq!(extract_framed(&render_framed("")), Some(""));
    }
}
