//! Small markdown-to-HTML renderer for chat replies.
//!
//! Handles fenced code blocks, paragraphs, line breaks, inline code spans,
//! `**bold**` and `*italic*`. Everything else is shown as escaped text.

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

struct Fence<'a> {
    lang: &'a str,
    lines: Vec<&'a str>,
}

pub fn render(markdown: &str) -> String {
    let mut html = String::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut fence: Option<Fence> = None;

    for line in markdown.lines() {
        let marker = line.trim_start().strip_prefix("```");

        if let Some(open) = fence.as_mut() {
            if marker.is_some() {
                push_code_block(&mut html, open);
                fence = None;
            } else {
                open.lines.push(line);
            }
            continue;
        }

        if let Some(lang) = marker {
            push_paragraph(&mut html, &mut paragraph);
            fence = Some(Fence {
                lang: lang.trim(),
                lines: Vec::new(),
            });
        } else if line.trim().is_empty() {
            push_paragraph(&mut html, &mut paragraph);
        } else {
            paragraph.push(line);
        }
    }

    // An unterminated fence still renders as code.
    if let Some(open) = fence.as_ref() {
        push_code_block(&mut html, open);
    }
    push_paragraph(&mut html, &mut paragraph);
    html
}

fn push_code_block(html: &mut String, fence: &Fence<'_>) {
    let class = if fence.lang.is_empty() {
        String::new()
    } else {
        format!(r#" class="language-{}""#, escape_html(fence.lang))
    };
    let body: Vec<String> = fence.lines.iter().map(|l| escape_html(l)).collect();
    html.push_str(&format!(
        r#"<div class="code-block"><pre><code{class}>{}</code></pre></div>"#,
        body.join("\n")
    ));
}

fn push_paragraph(html: &mut String, lines: &mut Vec<&str>) {
    if lines.is_empty() {
        return;
    }
    let rendered: Vec<String> = lines.iter().map(|l| render_inline(l.trim())).collect();
    html.push_str(&format!("<p>{}</p>", rendered.join("<br>")));
    lines.clear();
}

fn render_inline(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find(|c: char| c == '`' || c == '*') {
        out.push_str(&escape_html(&rest[..pos]));
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix('`') {
            if let Some(end) = after.find('`') {
                out.push_str(&format!(
                    r#"<code class="inline-code">{}</code>"#,
                    escape_html(&after[..end])
                ));
                rest = &after[end + 1..];
                continue;
            }
        } else if let Some(after) = tail.strip_prefix("**") {
            if let Some(end) = after.find("**").filter(|&end| end > 0) {
                out.push_str(&format!("<strong>{}</strong>", render_inline(&after[..end])));
                rest = &after[end + 2..];
                continue;
            }
        } else if let Some(after) = tail.strip_prefix('*') {
            if let Some(end) = after.find('*').filter(|&end| end > 0) {
                out.push_str(&format!("<em>{}</em>", render_inline(&after[..end])));
                rest = &after[end + 1..];
                continue;
            }
        }

        // Unmatched marker, emit it literally.
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(&escape_html(rest));
    out
}
