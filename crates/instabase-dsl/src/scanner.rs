//! Block extraction
//!
//! Finds `<identifier> : { <body> }` blocks in the DSL text. Two strategies
//! are available, selected by [`ScanMode`]:
//!
//! - `Flat` ends a body at the first `}` after its `{`. A nested block
//!   therefore truncates the outer body, and the text after that `}` is
//!   scanned again as top-level input.
//! - `Strict` tracks brace depth. Blocks that nest or never close are
//!   rejected as a whole.
//!
//! For input without nested braces both strategies find the same blocks.

use instabase_core::{Diagnostic, DiagnosticCode, LineIndex, ScanMode};
use regex::Regex;
use std::sync::LazyLock;

/// Header plus a body running to the first closing brace
static FLAT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_]+)\s*:\s*\{([^}]+)\}").expect("flat block pattern is valid")
});

/// Header only, up to and including the opening brace
static BLOCK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_]+)\s*:\s*\{").expect("block header pattern is valid")
});

/// A block located in the source, before its body is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBlock<'a> {
    /// Block identifier
    pub name: &'a str,

    /// Byte offset of the identifier
    pub name_offset: usize,

    /// Text between the braces
    pub body: &'a str,

    /// Byte offset of the first body byte
    pub body_offset: usize,
}

/// Structural problem found while scanning
///
/// Holds a byte offset rather than a [`Location`](instabase_core::Location)
/// so that scanning never walks the text to compute line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIssue<'a> {
    pub code: DiagnosticCode,
    pub message: String,
    pub block: Option<&'a str>,
    pub offset: usize,
}

impl ScanIssue<'_> {
    /// Resolve into a diagnostic using a prebuilt line index
    pub fn to_diagnostic(&self, index: &LineIndex<'_>) -> Diagnostic {
        let diag = Diagnostic::new(self.code, self.message.clone())
            .with_location(index.location(self.offset));

        match self.block {
            Some(block) => diag.with_block(block),
            None => diag,
        }
    }
}

/// Result of scanning a whole document
#[derive(Debug, Clone, Default)]
pub struct BlockScan<'a> {
    /// Blocks in source order
    pub blocks: Vec<RawBlock<'a>>,

    /// Structural problems found while scanning
    pub issues: Vec<ScanIssue<'a>>,
}

/// Locates blocks according to a scan mode
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockScanner {
    mode: ScanMode,
}

impl BlockScanner {
    pub fn new(mode: ScanMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Scan `text` for blocks
    pub fn scan<'a>(&self, text: &'a str) -> BlockScan<'a> {
        match self.mode {
            ScanMode::Flat => scan_flat(text),
            ScanMode::Strict => scan_strict(text),
        }
    }
}

fn scan_flat(text: &str) -> BlockScan<'_> {
    let mut scan = BlockScan::default();

    for caps in FLAT_BLOCK.captures_iter(text) {
        let (Some(name), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };

        if let Some(nested) = body.as_str().find('{') {
            scan.issues.push(ScanIssue {
                code: DiagnosticCode::DslNestedBlock,
                message: format!(
                    "Block '{}' contains a nested '{{'; its body ends at the first '}}'",
                    name.as_str()
                ),
                block: Some(name.as_str()),
                offset: body.start() + nested,
            });
        }

        scan.blocks.push(RawBlock {
            name: name.as_str(),
            name_offset: name.start(),
            body: body.as_str(),
            body_offset: body.start(),
        });
    }

    scan
}

fn scan_strict(text: &str) -> BlockScan<'_> {
    let mut scan = BlockScan::default();
    let mut pos = 0;

    while pos < text.len() {
        let header = BLOCK_HEADER.captures_at(text, pos);
        let header_start = header
            .as_ref()
            .and_then(|caps| caps.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());

        // An anonymous `{` before the next header swallows everything up to
        // its matching close, headers included.
        if let Some(rel) = text[pos..header_start].find('{') {
            let open = pos + rel;
            match matching_close(text, open) {
                Some((close, _)) => {
                    pos = close + 1;
                    continue;
                }
                None => {
                    scan.issues.push(ScanIssue {
                        code: DiagnosticCode::DslUnterminatedBlock,
                        message: "'{' is never closed; the rest of the input is ignored".to_string(),
                        block: None,
                        offset: open,
                    });
                    break;
                }
            }
        }

        let Some(caps) = header else {
            break;
        };
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let open = whole.end() - 1;

        match matching_close(text, open) {
            None => {
                scan.issues.push(ScanIssue {
                    code: DiagnosticCode::DslUnterminatedBlock,
                    message: format!(
                        "Block '{}' is never closed; the rest of the input is ignored",
                        name.as_str()
                    ),
                    block: Some(name.as_str()),
                    offset: name.start(),
                });
                break;
            }
            Some((close, true)) => {
                scan.issues.push(ScanIssue {
                    code: DiagnosticCode::DslNestedBlock,
                    message: format!(
                        "Block '{}' contains nested blocks and was rejected",
                        name.as_str()
                    ),
                    block: Some(name.as_str()),
                    offset: name.start(),
                });
                pos = close + 1;
            }
            Some((close, false)) => {
                scan.blocks.push(RawBlock {
                    name: name.as_str(),
                    name_offset: name.start(),
                    body: &text[open + 1..close],
                    body_offset: open + 1,
                });
                pos = close + 1;
            }
        }
    }

    scan
}

/// Find the `}` matching the `{` at byte `open`
///
/// Returns the closing byte offset and whether any nested `{` was seen.
/// Braces are ASCII, so byte-wise scanning never splits a character.
fn matching_close(text: &str, open: usize) -> Option<(usize, bool)> {
    let mut depth = 0usize;
    let mut nested = false;

    for (i, byte) in text.as_bytes()[open..].iter().enumerate() {
        match byte {
            b'{' => {
                depth += 1;
                if depth > 1 {
                    nested = true;
                }
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some((open + i, nested));
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<'a>(scan: &BlockScan<'a>) -> Vec<&'a str> {
        scan.blocks.iter().map(|b| b.name).collect()
    }

    #[test]
    fn flat_finds_blocks_in_order() {
        let text = "A: { x: int }\nB : {y: text}";
        let scan = BlockScanner::new(ScanMode::Flat).scan(text);

        assert_eq!(names(&scan), vec!["A", "B"]);
        assert_eq!(scan.blocks[0].body, " x: int ");
        assert_eq!(&text[scan.blocks[1].body_offset..][..7], "y: text");
        assert!(scan.issues.is_empty());
    }

    #[test]
    fn flat_truncates_at_first_closing_brace() {
        let text = "Outer: { a: int\n Inner: { b: int }\n c: text }";
        let scan = BlockScanner::new(ScanMode::Flat).scan(text);

        assert_eq!(names(&scan), vec!["Outer"]);
        assert_eq!(scan.blocks[0].body, " a: int\n Inner: { b: int ");
        assert_eq!(scan.issues.len(), 1);
        assert_eq!(scan.issues[0].code, DiagnosticCode::DslNestedBlock);
        assert_eq!(scan.issues[0].offset, text.find("{ b").unwrap());
    }

    #[test]
    fn flat_ignores_empty_body() {
        let scan = BlockScanner::new(ScanMode::Flat).scan("Empty: {}");
        assert!(scan.blocks.is_empty());
    }

    #[test]
    fn identifier_is_ascii_word_run() {
        let scan = BlockScanner::new(ScanMode::Flat).scan("my-table_2: { a: b }");
        assert_eq!(names(&scan), vec!["table_2"]);
    }

    #[test]
    fn strict_rejects_nested_blocks() {
        let text = "Outer: { a: int\n Inner: { b: int }\n c: text }\nNext: { d: int }";
        let scan = BlockScanner::new(ScanMode::Strict).scan(text);

        assert_eq!(names(&scan), vec!["Next"]);
        assert_eq!(scan.issues.len(), 1);
        assert_eq!(scan.issues[0].code, DiagnosticCode::DslNestedBlock);
        assert_eq!(scan.issues[0].block, Some("Outer"));
    }

    #[test]
    fn strict_reports_unterminated_block() {
        let text = "A: { x: int }\nB: { y: int";
        let scan = BlockScanner::new(ScanMode::Strict).scan(text);

        assert_eq!(names(&scan), vec!["A"]);
        assert_eq!(scan.issues[0].code, DiagnosticCode::DslUnterminatedBlock);

        let diag = scan.issues[0].to_diagnostic(&LineIndex::new(text));
        assert_eq!(diag.location, Some(instabase_core::Location::new(2, 1)));
        assert_eq!(diag.block.as_deref(), Some("B"));
    }

    #[test]
    fn strict_skips_anonymous_groups() {
        let scan = BlockScanner::new(ScanMode::Strict).scan("{ Hidden: { a: int } }\nShown: { b: int }");
        assert_eq!(names(&scan), vec!["Shown"]);
    }

    #[test]
    fn modes_agree_on_flat_input() {
        let text = "Users: {\n  shape: sql_table\n  id: int\n}\n\nnote: {label: hi}\nPosts: { shape: sql_table; id: int }";
        let flat = BlockScanner::new(ScanMode::Flat).scan(text);
        let strict = BlockScanner::new(ScanMode::Strict).scan(text);

        assert_eq!(flat.blocks, strict.blocks);
    }

    #[test]
    fn matching_close_tracks_depth() {
        assert_eq!(matching_close("{a}", 0), Some((2, false)));
        assert_eq!(matching_close("{a{b}c}", 0), Some((6, true)));
        assert_eq!(matching_close("{a{b}", 0), None);
        assert_eq!(matching_close("x{a}", 1), Some((3, false)));
    }
}
