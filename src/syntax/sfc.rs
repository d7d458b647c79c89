//! Script-block extraction for Vue and Svelte single-file components.
//!
//! An SFC carries at most one top-level `<script>...</script>` block; the
//! rest of the file is markup and styles the analyzer has no grammar for.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SCRIPT_OPEN: Regex = Regex::new(r"(?i)<script([^>]*)>").unwrap();
    static ref SCRIPT_CLOSE: Regex = Regex::new(r"(?i)</script>").unwrap();
    static ref LANG_ATTR: Regex = Regex::new(r#"(?i)lang\s*=\s*["']?(ts|typescript)["']?"#).unwrap();
}

/// The extracted script block of an SFC.
pub struct ScriptBlock {
    /// The text between the script tags.
    pub text: String,
    /// Lines in the original file preceding the block's first line.
    pub line_offset: usize,
    /// True when the opening tag carries `lang="ts"`.
    pub is_typescript: bool,
}

/// Extract the first top-level `<script>` block, or `None` when the
/// component has no script.
pub fn extract_script_block(source: &str) -> Option<ScriptBlock> {
    let open = SCRIPT_OPEN.find(source)?;
    let attrs = &source[open.start()..open.end()];
    let body_start = open.end();

    let close = SCRIPT_CLOSE.find_at(source, body_start)?;
    let text = &source[body_start..close.start()];

    // Lines before the script body: everything up to and including the line
    // holding the opening tag's `>`.
    let line_offset = source[..body_start].matches('\n').count();

    Some(ScriptBlock {
        text: text.to_string(),
        line_offset,
        is_typescript: LANG_ATTR.is_match(attrs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_plain_script() {
        let sfc = "<template><p/></template>\n<script>\nconst x = 1;\n</script>\n";
        let block = extract_script_block(sfc).unwrap();
        assert_eq!(block.text.trim(), "const x = 1;");
        assert!(!block.is_typescript);
        // One line of markup precedes the script body.
        assert_eq!(block.line_offset, 1);
    }

    #[test]
    fn test_detects_typescript_lang() {
        let sfc = "<script lang=\"ts\">\nlet n: number = 1;\n</script>";
        let block = extract_script_block(sfc).unwrap();
        assert!(block.is_typescript);

        let setup = "<script setup lang='ts'>\nlet n = 1;\n</script>";
        assert!(extract_script_block(setup).unwrap().is_typescript);
    }

    #[test]
    fn test_no_script_block() {
        assert!(extract_script_block("<template><div/></template>").is_none());
        assert!(extract_script_block("<script>unterminated").is_none());
    }
}
