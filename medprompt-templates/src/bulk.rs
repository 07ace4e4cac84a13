//! Bulk upload parsing for multi-prompt documents
//!
//! Users can paste a whole document of candidate prompts in one go, one
//! block per prompt:
//!
//! ```text
//! Prompt 1: Intro
//! Hello {name}, welcome.
//! ===
//! ```
//!
//! Each block yields an unrated template with the block number as its
//! iteration. Validation is deferred: uploaded drafts are often not yet
//! aligned to the task.

use medprompt_tasks::Task;
use regex::Regex;

use crate::error::{Result, TemplateError};
use crate::placeholder::escape_stray_braces;
use crate::template::{Prompt, Template};

/// Parse every `Prompt <N>: <Name>` block delimited by a `===` line.
///
/// Body braces that do not form a `{name}` placeholder are doubled so they
/// come out as literal braces when the template renders.
pub fn parse_bulk(text: &str, task: &Task) -> Result<Vec<Template>> {
    let block = Regex::new(r"(?s)Prompt\s*(\d+)\s*:\s*([A-Za-z \-]+)\r?\n(.*?)\r?\n===").unwrap();

    let mut templates = Vec::new();
    for captures in block.captures_iter(text) {
        let iteration: u32 =
            captures[1]
                .parse()
                .map_err(|_| TemplateError::InvalidRecord {
                    message: format!("prompt number out of range: {}", &captures[1]),
                })?;
        let name = captures[2].trim().to_string();
        let content = escape_stray_braces(&captures[3]);

        templates.push(Template::new(
            Prompt::new(content, name, iteration),
            task,
            false,
        )?);
    }
    Ok(templates)
}
