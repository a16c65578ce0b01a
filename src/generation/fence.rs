//! Markdown code fences in free-form service replies.

/// A ```` ``` ```` fenced block. `body` is the raw text between the info tag and the
/// closing fence (or end of text when the fence is never closed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    pub tag: &'a str,
    pub body: &'a str,
}

const FENCE: &str = "```";

/// All fenced blocks in order of appearance.
pub fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after = rest[open + FENCE.len()..]
            .trim_start_matches(|c: char| c == ' ' || c == '\t');
        let tag_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.')))
            .unwrap_or(after.len());
        let tag = &after[..tag_len];
        let region = &after[tag_len..];

        match region.find(FENCE) {
            Some(close) => {
                blocks.push(FencedBlock {
                    tag,
                    body: &region[..close],
                });
                rest = &region[close + FENCE.len()..];
            }
            None => {
                blocks.push(FencedBlock { tag, body: region });
                break;
            }
        }
    }

    blocks
}

/// First block whose tag matches one of `tags` (case-insensitive).
pub fn first_tagged<'a>(text: &'a str, tags: &[&str]) -> Option<FencedBlock<'a>> {
    fenced_blocks(text)
        .into_iter()
        .find(|block| tags.iter().any(|t| block.tag.eq_ignore_ascii_case(t)))
}
