use log;
use serde::Serialize;

/// One numbered output artifact's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// 1-based.
    pub index: usize,
    pub text: String,
    /// Sum of `newlines + 1` over the blocks in this chunk.
    pub lines: usize,
    pub blocks: usize,
}

/// Lines a block is charged against the split budget.
pub fn block_line_count(block: &str) -> usize {
    block.matches('\n').count() + 1
}

/// Greedily packs whole blocks into chunks of at most `split_at` lines.
///
/// A block is never split; one larger than the budget gets a chunk of its
/// own. Concatenating the chunk texts reproduces the concatenated blocks.
pub fn split_blocks_into_chunks(blocks: &[String], split_at: usize) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current = String::new();
    let mut current_lines = 0usize;
    let mut current_blocks = 0usize;

    for block in blocks {
        let count = block_line_count(block);
        if current_blocks > 0 && current_lines.saturating_add(count) > split_at {
            log::trace!(
                "Chunk {} full at {} lines, starting a new one.",
                chunks.len() + 1,
                current_lines
            );
            chunks.push(Chunk {
                index: chunks.len() + 1,
                text: std::mem::take(&mut current),
                lines: current_lines,
                blocks: current_blocks,
            });
            current_lines = 0;
            current_blocks = 0;
        }
        current.push_str(block);
        current_lines += count;
        current_blocks += 1;
    }

    if current_blocks > 0 {
        chunks.push(Chunk {
            index: chunks.len() + 1,
            text: current,
            lines: current_lines,
            blocks: current_blocks,
        });
    }

    log::debug!("Split content into {} chunks.", chunks.len());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_line_block(tag: &str) -> String {
        format!("{tag}1\n{tag}2\n{tag}3\n{tag}4")
    }

    #[test]
    fn third_block_starts_second_chunk() {
        let blocks = vec![four_line_block("a"), four_line_block("b"), four_line_block("c")];
        let chunks = split_blocks_into_chunks(&blocks, 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].index, 1);
        assert_eq!(chunks[0].lines, 8);
        assert_eq!(chunks[0].blocks, 2);
        assert_eq!(chunks[1].index, 2);
        assert!(chunks[1].text.starts_with("c1"));
    }

    #[test]
    fn concatenation_reproduces_input() {
        let blocks: Vec<String> = (0..7).map(|i| "x\n".repeat(i + 1)).collect();
        let chunks = split_blocks_into_chunks(&blocks, 5);
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, blocks.concat());
        assert!(chunks.iter().all(|c| c.blocks > 0));
    }

    #[test]
    fn oversized_block_gets_its_own_chunk() {
        let blocks = vec!["a".to_string(), "b\n".repeat(20), "c".to_string()];
        let chunks = split_blocks_into_chunks(&blocks, 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].lines, 21);
    }

    #[test]
    fn no_blocks_no_chunks() {
        assert!(split_blocks_into_chunks(&[], 10).is_empty());
    }
}
