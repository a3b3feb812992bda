// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use scraper::{ElementRef, Html, Node};

/// Elements whose end also ends a line of text
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "blockquote", "pre",
];

/// Elements whose contents are never shown
const HIDDEN_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// Format a duration in seconds as `HH:MM:SS`
///
/// Hours are not wrapped, so durations past 99 hours simply grow wider.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Convert an HTML fragment to plain text
///
/// Keeps the text nodes, ends a line at `<br>` and at the end of block
/// elements, skips scripts and styles, and collapses runs of blank lines.
/// Entities are decoded by the parser.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);

    let mut text = String::with_capacity(html.len());
    push_text(fragment.root_element(), &mut text);

    collapse_blank_lines(&text)
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if HIDDEN_TAGS.contains(&name) {
                continue;
            }
            if name == "br" {
                out.push('\n');
                continue;
            }

            push_text(child_element, out);

            if BLOCK_TAGS.contains(&name) {
                out.push('\n');
            }
        } else if let Node::Text(text) = child.value() {
            out.push_str(text);
        }
    }
}

fn collapse_blank_lines(s: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for line in s.lines().map(str::trim) {
        if line.is_empty() && lines.last().is_none_or(|prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}
