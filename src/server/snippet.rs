//! Hit markup rendering
//!
//! Works entirely off a lazy unit's token table: byte spans recorded at
//! index time locate each hit's surface form, so highlighting preserves
//! the document's original casing and never re-tokenizes.

use std::collections::HashSet;

use crate::index::LazyUnit;

/// Snippet lines for search results: every line of the document that
/// contains at least one hit, with each hit wrapped in
/// `<span class="hit">…</span>`. At most `max_lines` lines, in document
/// order.
pub fn snippet_lines(unit: &LazyUnit, terms: &HashSet<String>, max_lines: usize) -> Vec<String> {
    let hits: Vec<_> = unit
        .tokens
        .iter()
        .filter(|t| terms.contains(&t.term))
        .collect();
    if hits.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut hit_idx = 0;
    let mut line_start = 0usize;
    for line in unit.text.split_inclusive('\n') {
        let line_end = line_start + line.len();
        let first = hit_idx;
        while hit_idx < hits.len() && (hits[hit_idx].end as usize) <= line_end {
            hit_idx += 1;
        }
        if hit_idx > first {
            let mut rendered = String::new();
            let mut cursor = line_start;
            for hit in &hits[first..hit_idx] {
                rendered.push_str(&unit.text[cursor..hit.start as usize]);
                rendered.push_str("<span class=\"hit\">");
                rendered.push_str(&unit.text[hit.start as usize..hit.end as usize]);
                rendered.push_str("</span>");
                cursor = hit.end as usize;
            }
            rendered.push_str(unit.text[cursor..line_end].trim_end_matches('\n'));
            lines.push(rendered);
            if lines.len() >= max_lines {
                break;
            }
        }
        line_start = line_end;
    }
    lines
}

/// Full-document markup for the view mode: the whole text with every hit
/// wrapped in `<hit no="N"><term>…</term></hit>`, numbered in document
/// order. Returns the markup and the hit count.
pub fn markup_document(unit: &LazyUnit, terms: &HashSet<String>) -> (String, u32) {
    let mut out = String::with_capacity(unit.text.len());
    let mut cursor = 0usize;
    let mut hit_no = 0u32;
    for token in &unit.tokens {
        if !terms.contains(&token.term) {
            continue;
        }
        hit_no += 1;
        out.push_str(&unit.text[cursor..token.start as usize]);
        out.push_str(&format!("<hit no=\"{}\"><term>", hit_no));
        out.push_str(&unit.text[token.start as usize..token.end as usize]);
        out.push_str("</term></hit>");
        cursor = token.end as usize;
    }
    out.push_str(&unit.text[cursor..]);
    (out, hit_no)
}
