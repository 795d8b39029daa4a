//! Work review prompting and verdict extraction.
//!
//! The relay cannot parse spreadsheet content, so review feedback is elicited
//! from file metadata plus a phase-specific prompt that asks the model for
//! plausible, specific feedback and a literal verdict marker. The marker
//! contract lives entirely in this module: the templates instruct the model
//! to end with `APPROVED` or `NEEDS_REVISION`, and [`ReviewVerdict`] parses
//! the same markers back out.

/// Marker the templates ask the model to emit for passing work.
const APPROVED_MARKER: &str = "APPROVED";
/// Marker for work that needs another iteration. Checked first, since a
/// revision-requesting review may still mention the word "approved".
const REVISION_MARKER: &str = "NEEDS_REVISION";

/// The approved/needs-revision outcome of a generated critique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewVerdict {
    pub approved: bool,
    pub rationale: String,
}

impl ReviewVerdict {
    /// Parse a verdict out of generated review text.
    ///
    /// `NEEDS_REVISION` wins over `APPROVED`; absence of both markers means
    /// not approved. The full review text is kept as the rationale.
    #[must_use]
    pub fn from_response(text: &str) -> Self {
        let approved = !text.contains(REVISION_MARKER) && text.contains(APPROVED_MARKER);
        Self {
            approved,
            rationale: text.to_string(),
        }
    }
}

/// Select the reviewer prompt for a challenge phase.
///
/// Unknown phases and challenge types fall back to generic reviewer framing.
#[must_use]
pub fn review_prompt(phase: u8, challenge_type: &str) -> &'static str {
    if challenge_type != "excel" {
        return "You are reviewing student work. Provide constructive feedback.";
    }

    match phase {
        1 => {
            "You are Sarah Chen, reviewing a student's Excel data cleaning work for Phase 1 of \
             the e-commerce analysis challenge.\n\n\
             ANALYSIS FOCUS:\n\
             - Data quality improvements (missing values, duplicates, formatting)\n\
             - Proper use of Excel functions for data cleaning\n\
             - Organization and structure of the cleaned dataset\n\
             - Professional worksheet formatting and documentation\n\n\
             REVIEW CRITERIA:\n\
             - Did they identify and handle missing email addresses and customer ages?\n\
             - Are there any remaining duplicate transactions?\n\
             - Are date formats standardized and consistent?\n\
             - Did they create any calculated columns (revenue, profit margins)?\n\
             - Is the data properly organized for analysis?\n\n\
             FEEDBACK STYLE:\n\
             - Be specific about what they did well and what needs improvement\n\
             - Reference specific cells, columns, or formulas when possible\n\
             - Suggest concrete improvements with Excel techniques\n\
             - If work is acceptable, say \"APPROVED\" at the end\n\
             - If work needs improvement, say \"NEEDS_REVISION\" at the end\n\n\
             Provide detailed technical feedback as if you're reviewing actual work."
        }
        2 => {
            "You are Sarah Chen, reviewing a student's Excel analysis work for Phase 2 of the \
             e-commerce analysis challenge.\n\n\
             ANALYSIS FOCUS:\n\
             - Quality and structure of pivot tables\n\
             - Accuracy of calculated metrics (AOV, revenue, trends)\n\
             - Identification of top-performing products and customers\n\
             - Use of appropriate Excel functions and analysis techniques\n\n\
             REVIEW CRITERIA:\n\
             - Are pivot tables properly structured with correct fields?\n\
             - Are calculations accurate (average order value, totals, percentages)?\n\
             - Did they identify meaningful business insights?\n\
             - Are formulas efficient and professional?\n\
             - Is the analysis organized and easy to understand?\n\n\
             FEEDBACK STYLE:\n\
             - Comment on their analytical approach and Excel techniques\n\
             - Suggest improvements to formulas or pivot table structure\n\
             - Highlight insights they may have missed\n\
             - If work meets standards, say \"APPROVED\" at the end\n\
             - If work needs improvement, say \"NEEDS_REVISION\" at the end"
        }
        3 => {
            "You are Sarah Chen, reviewing a student's Excel visualization work for Phase 3 of \
             the e-commerce analysis challenge.\n\n\
             ANALYSIS FOCUS:\n\
             - Quality and appropriateness of charts and visualizations\n\
             - Professional dashboard layout and design\n\
             - Clear presentation of key business insights\n\
             - Overall executive-ready presentation quality\n\n\
             REVIEW CRITERIA:\n\
             - Are chart types appropriate for the data being shown?\n\
             - Is the dashboard well-organized and professional?\n\
             - Are the key insights clearly communicated?\n\
             - Is the work suitable for presentation to executives?\n\
             - Are there any formatting or design improvements needed?\n\n\
             FEEDBACK STYLE:\n\
             - Focus on visualization best practices and business communication\n\
             - Suggest improvements to chart selection or layout\n\
             - Comment on the clarity of insights presentation\n\
             - If work is presentation-ready, say \"APPROVED\" at the end\n\
             - If work needs improvement, say \"NEEDS_REVISION\" at the end"
        }
        _ => {
            "You are Sarah Chen, reviewing student Excel work. Provide professional feedback on \
             their analysis."
        }
    }
}

/// Compose the full review prompt: phase template plus the submitted file's
/// metadata and the framing that feedback is generated without reading the
/// file content.
#[must_use]
pub fn compose_review_prompt(
    phase: u8,
    challenge_type: &str,
    file_name: &str,
    size_bytes: u64,
) -> String {
    #[allow(clippy::cast_precision_loss)]
    let size_kb = size_bytes as f64 / 1024.0;

    format!(
        "{}\n\n\
         FILE INFORMATION:\n\
         - Filename: {file_name}\n\
         - File size: {size_kb:.2} KB\n\
         - Phase: {phase} of Excel e-commerce analysis challenge\n\n\
         Since I cannot directly read Excel files in this environment, I'll provide feedback \
         based on common issues and best practices for Phase {phase}. Please provide realistic, \
         specific feedback as if you reviewed the actual file content.",
        review_prompt(phase, challenge_type)
    )
}
