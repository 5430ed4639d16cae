//! Safe text for storage and rendering
//!
//! Everything received from a remote node goes through one of these
//! before it is stored. Both functions are idempotent.

use std::collections::HashSet;

/// Placeholder delimiter for protected markdown code
const CODE_MARKER: char = '\u{E000}';
/// Placeholder for a blockquote marker at the start of a line
const QUOTE_MARKER: char = '\u{E001}';

/// Strip all markup, leaving escaped plain text.
///
/// Contents of `script` and `style` elements are dropped entirely.
pub fn safe_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut builder = ammonia::Builder::empty();
    builder.clean_content_tags(HashSet::from(["script", "style"]));
    builder.clean(text).to_string()
}

/// Clean text that will later be rendered as markdown.
///
/// Markdown code (inline and fenced) and line-leading `> ` quote markers
/// are kept as written; everything else is cleaned against ammonia's
/// default allow-list of harmless tags.
pub fn safe_text_for_markdown(text: &str) -> String {
    let text: String = text
        .chars()
        .filter(|c| *c != CODE_MARKER && *c != QUOTE_MARKER)
        .collect();

    let (text, code_blocks) = extract_code(&text);
    let text = protect_quotes(&text);

    let cleaned = ammonia::clean(&text);

    let cleaned = cleaned.replace(QUOTE_MARKER, "> ");
    restore_code(&cleaned, &code_blocks)
}

fn code_placeholder(index: usize) -> String {
    format!("{CODE_MARKER}{index}{CODE_MARKER}")
}

/// Replace markdown code spans with placeholders.
///
/// Inline spans (single backtick) may not cross a line break; fenced
/// blocks may.
fn extract_code(text: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(text.len());
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find('`') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let fence = if tail.starts_with("```") { "```" } else { "`" };
        let body = &tail[fence.len()..];

        let closing = body
            .find(fence)
            .filter(|end| fence == "```" || !body[..*end].contains('\n'));

        match closing {
            Some(end) => {
                let span_len = fence.len() + end + fence.len();
                out.push_str(&code_placeholder(blocks.len()));
                blocks.push(tail[..span_len].to_string());
                rest = &tail[span_len..];
            }
            None => {
                out.push_str(fence);
                rest = body;
            }
        }
    }
    out.push_str(rest);

    (out, blocks)
}

/// Put protected code back into cleaned HTML.
///
/// Code is restored verbatim only in text positions. A placeholder that
/// ended up inside a tag (an attribute value ammonia kept) gets its code
/// escaped so it cannot close the attribute or open new markup.
fn restore_code(text: &str, blocks: &[String]) -> String {
    let mut restored = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_quotes = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c == CODE_MARKER {
            let index: String = chars.by_ref().take_while(|c| *c != CODE_MARKER).collect();
            match index.parse::<usize>().ok().and_then(|index| blocks.get(index)) {
                Some(block) if in_tag => restored.push_str(&escape_in_tag(block)),
                Some(block) => restored.push_str(block),
                None => {}
            }
            continue;
        }

        match c {
            '<' if !in_tag => in_tag = true,
            '"' if in_tag => in_quotes = !in_quotes,
            '>' if in_tag && !in_quotes => in_tag = false,
            _ => {}
        }
        restored.push(c);
    }

    restored
}

// `&` is left alone so a second pass over already escaped code is a no-op.
fn escape_in_tag(code: &str) -> String {
    code.replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn protect_quotes(text: &str) -> String {
    text.split('\n')
        .map(|line| match line.strip_prefix("> ") {
            Some(quoted) => format!("{QUOTE_MARKER}{quoted}"),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
