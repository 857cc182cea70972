//! OBO stanza scanning
//!
//! Splits raw ontology text into `[Term]` blocks and pulls out the three line
//! kinds the dataset builder cares about. Everything else in a block is
//! skipped. Malformed lines are counted and dropped, never fatal.
//!
//! A block opens at a `[Term]` header and closes at the first blank line, the
//! next stanza header (`[Typedef]`, `[Instance]`, another `[Term]`) or end of
//! input. `synonym:` and `is_a:` lines are only read once the block's
//! `name:` line has been seen; earlier ones are ignored.

/// Line prefixes recognised inside a term block
const TERM_HEADER: &str = "[Term]";
const NAME_TAG: &str = "name:";
const SYNONYM_TAG: &str = "synonym:";
const IS_A_TAG: &str = "is_a:";

/// One `[Term]` stanza, borrowing from the source text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermBlock<'a> {
    /// 1-based line number of the `[Term]` header
    pub line: usize,
    /// Raw value of the first `name:` line
    pub name: Option<&'a str>,
    /// Quoted synonym texts, file order
    pub synonyms: Vec<&'a str>,
    /// Parent display names from `is_a:` lines, file order
    pub parents: Vec<&'a str>,
    /// `synonym:` lines without a closed quote pair
    pub malformed_synonyms: usize,
    /// `is_a:` lines without a `!` token
    pub malformed_parents: usize,
}

/// Scan every term block in `text`
pub fn scan_terms(text: &str) -> Vec<TermBlock<'_>> {
    let mut blocks = Vec::new();
    let mut current: Option<TermBlock<'_>> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');

        if line.starts_with('[') {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            if line.starts_with(TERM_HEADER) {
                current = Some(TermBlock {
                    line: idx + 1,
                    ..Default::default()
                });
            }
            continue;
        }

        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }

        let Some(block) = current.as_mut() else {
            continue;
        };

        if let Some(rest) = line.strip_prefix(NAME_TAG) {
            if block.name.is_none() {
                block.name = Some(rest.trim());
            }
            continue;
        }

        if block.name.is_none() {
            continue;
        }

        if line.starts_with(SYNONYM_TAG) {
            match quoted_value(line) {
                Some(synonym) => block.synonyms.push(synonym),
                None => block.malformed_synonyms += 1,
            }
        } else if line.starts_with(IS_A_TAG) {
            match parent_name(line) {
                Some(parent) => block.parents.push(parent),
                None => block.malformed_parents += 1,
            }
        }
    }

    if let Some(block) = current.take() {
        blocks.push(block);
    }

    blocks
}

/// Text between the first two `"` characters of a line
pub fn quoted_value(line: &str) -> Option<&str> {
    let start = line.find('"')? + 1;
    let len = line[start..].find('"')?;
    Some(&line[start..start + len])
}

/// Parent display name from an `is_a:` line: everything after a standalone
/// `!` token, kept as written, e.g. `is_a: CL:0000000 ! cell` gives `cell`.
/// A `!` ending the line is not a separator.
pub fn parent_name(line: &str) -> Option<&str> {
    let mut offset = 0;
    for token in line.split(' ') {
        let next = offset + token.len() + 1;
        if token == "!" {
            if let Some(rest) = line.get(next..) {
                return Some(rest);
            }
        }
        offset = next;
    }
    None
}
