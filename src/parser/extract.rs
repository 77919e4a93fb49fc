//! Code-fence extraction and top-level section handling.
//!
//! Generator responses wrap their payload in a single fenced block tagged
//! with a language (` ```markdown `, ` ```svg `). Anything else in the reply
//! is commentary and is discarded.

use crate::errors::ExtractError;

/// Extract the contents of the first ```` ```{lang} ```` block in `text`.
///
/// The opening fence must sit alone on its line (trailing whitespace is
/// allowed), so ```` ```markdown ```` does not match a ```` ```markdownish ````
/// block. A missing opener or closer is an error.
pub fn extract_codeblock(text: &str, lang: &str) -> Result<String, ExtractError> {
    let opener = format!("```{lang}");
    let mut saw_unterminated = false;

    for (start, _) in text.match_indices(&opener) {
        let after = &text[start + opener.len()..];
        let Some(newline) = after.find('\n') else {
            if after.trim().is_empty() {
                saw_unterminated = true;
            }
            continue;
        };
        if !after[..newline].trim().is_empty() {
            continue;
        }
        let body = &after[newline + 1..];
        return match body.find("```") {
            Some(end) => Ok(body[..end].trim().to_string()),
            None => Err(ExtractError::UnterminatedFence {
                lang: lang.to_string(),
            }),
        };
    }

    if saw_unterminated {
        Err(ExtractError::UnterminatedFence {
            lang: lang.to_string(),
        })
    } else {
        Err(ExtractError::MissingFence {
            lang: lang.to_string(),
        })
    }
}

/// Split a document body into `(title, text)` pairs at top-level `# ` headings.
///
/// Text before the first heading is dropped. Section text is trimmed.
pub fn split_sections(body: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in body.lines() {
        if let Some(title) = top_level_title(line) {
            if let Some((title, lines)) = current.take() {
                sections.push((title, lines.join("\n").trim().to_string()));
            }
            current = Some((title.to_string(), Vec::new()));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some((title, lines)) = current {
        sections.push((title, lines.join("\n").trim().to_string()));
    }
    sections
}

/// Find a section's text by title (case-insensitive).
pub fn find_section<'a>(sections: &'a [(String, String)], title: &str) -> Option<&'a str> {
    sections
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(title.trim()))
        .map(|(_, text)| text.as_str())
}

/// Render sections back into a document body, one `# Title` per section.
pub fn join_sections<T: AsRef<str>, B: AsRef<str>>(sections: &[(T, B)]) -> String {
    sections
        .iter()
        .map(|(title, body)| format!("# {}\n\n{}", title.as_ref(), body.as_ref().trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Drop a leading `# Title` line the generator may have echoed back.
pub fn strip_title_heading(section: &str) -> &str {
    let trimmed = section.trim_start();
    match trimmed.split_once('\n') {
        Some((first, rest)) if top_level_title(first).is_some() => rest.trim(),
        None if top_level_title(trimmed).is_some() => "",
        _ => section.trim(),
    }
}

fn top_level_title(line: &str) -> Option<&str> {
    let title = line.strip_prefix("# ")?.trim();
    (!title.is_empty()).then_some(title)
}
