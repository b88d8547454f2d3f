//! Post-processing of model output
//!
//! - [`strip_lead_in`] drops whatever the model wrote for the overlap context
//! - [`replace_jargon`] swaps leftover legal terms for plain phrases
//! - [`final_cleanup`] normalizes whitespace and sentence spacing

use lazy_static::lazy_static;
use regex::Regex;

/// Line separating read-only context from the text to simplify. The model is
/// asked to start its answer with it.
pub const PRIMARY_MARKER: &str = "<<<SIMPLIFY>>>";

/// Legal term and its plain-English replacement
pub const JARGON: &[(&str, &str)] = &[
    ("hereinafter", "from now on called"),
    ("aforementioned", "mentioned before"),
    ("notwithstanding", "despite"),
    ("pursuant to", "according to"),
    ("in lieu of", "instead of"),
    ("forthwith", "immediately"),
    ("hereunder", "under this agreement"),
    ("heretofore", "until now"),
    ("hereby", "by this document"),
    ("herein", "in this document"),
    ("whereas", "while"),
    ("ipso facto", "by the fact itself"),
    ("vis-à-vis", "in relation to"),
    ("inter alia", "among other things"),
    ("prima facie", "at first sight"),
    ("quid pro quo", "something for something"),
    ("sine qua non", "essential requirement"),
    ("force majeure", "unforeseeable circumstances"),
    ("caveat emptor", "buyer beware"),
];

lazy_static! {
    static ref JARGON_PATTERNS: Vec<(Regex, &'static str)> = JARGON
        .iter()
        .map(|(term, plain)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(term));
            (Regex::new(&pattern).unwrap(), *plain)
        })
        .collect();
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref SPACE_AROUND_NEWLINE: Regex = Regex::new(r" *\n *").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref MISSING_SENTENCE_SPACE: Regex = Regex::new(r"([a-z][.!?])([A-Z])").unwrap();
}

/// Text after the last [`PRIMARY_MARKER`], or all of it if the marker is absent
pub fn strip_lead_in(output: &str) -> &str {
    match output.rfind(PRIMARY_MARKER) {
        Some(pos) => &output[pos + PRIMARY_MARKER.len()..],
        None => output,
    }
}

pub fn replace_jargon(text: &str) -> String {
    let mut result = text.to_string();
    for (pattern, plain) in JARGON_PATTERNS.iter() {
        if pattern.is_match(&result) {
            result = pattern.replace_all(&result, *plain).into_owned();
        }
    }
    result
}

pub fn final_cleanup(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = SPACE_AROUND_NEWLINE.replace_all(&text, "\n");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    let text = MISSING_SENTENCE_SPACE.replace_all(&text, "$1 $2");
    text.trim().to_string()
}

/// Marker stripping, jargon replacement and cleanup in one pass
pub fn clean_output(output: &str) -> String {
    final_cleanup(&replace_jargon(strip_lead_in(output)))
}
