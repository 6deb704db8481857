//! Stubs for indentation-delimited languages.

const BLOCK_PREFIXES: [&str; 3] = ["def ", "class ", "async def "];
const BODY_MARKER: &str = "... # Body omitted";
const BODY_INDENT: usize = 4;

/// Scan state for one file: the indentation levels whose bodies are elided.
#[derive(Debug, Default)]
struct IndentScanner {
    block_stack: Vec<usize>,
    output: Vec<String>,
}

impl IndentScanner {
    fn push_line(&mut self, line: &str) {
        let stripped = line.trim_start();
        if stripped.is_empty() {
            if self.block_stack.is_empty() {
                self.output.push(line.to_string());
            }
            return;
        }

        let indentation = line.chars().count() - stripped.chars().count();
        while self
            .block_stack
            .last()
            .is_some_and(|&open| indentation <= open)
        {
            self.block_stack.pop();
        }

        if !self.block_stack.is_empty() {
            return;
        }
        self.output.push(line.to_string());
        if BLOCK_PREFIXES.iter().any(|p| stripped.starts_with(p)) {
            self.block_stack.push(indentation);
            self.output.push(format!(
                "{}{}",
                " ".repeat(indentation + BODY_INDENT),
                BODY_MARKER
            ));
        }
    }

    /// End of input closes every open block.
    fn finish(mut self) -> String {
        self.block_stack.clear();
        self.output.join("\n")
    }
}

pub fn stub(content: &str) -> String {
    let mut scanner = IndentScanner::default();
    for line in content.lines() {
        scanner.push_line(line);
    }
    scanner.finish()
}
