//! Stubs for brace-delimited languages.

use once_cell::sync::Lazy;
use regex::Regex;

static SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(\s*)(?:class\s+\w+|function\s*\w*\s*\(.*\)\s*\{|",
        r"(?:const|let|var)\s+\w+\s*=\s*(?:async\s*)?\(.*\)\s*=>\s*\{|",
        r"\w+\s*:\s*(?:async\s*)?function\s*\(.*\)\s*\{|",
        r"(?:get|set)\s+\w+\(.*\)\s*\{|",
        r"(?:async\s+)?\w+\s*\(.*\)\s*\{)",
    ))
    .expect("signature pattern is valid")
});

const BODY_MARKER: &str = "// ... Body omitted";

fn brace_balance(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

#[derive(Debug, Default)]
struct BraceScanner {
    output: String,
    in_block: bool,
    depth: i64,
    indent: String,
}

impl BraceScanner {
    fn push_line(&mut self, line: &str) {
        if self.in_block {
            self.depth += brace_balance(line);
            if self.depth <= 0 {
                self.close_block();
            }
            return;
        }

        self.output.push_str(line);
        let Some(caps) = SIGNATURE.captures(line) else {
            return;
        };
        self.indent = caps.get(1).map_or("", |m| m.as_str()).to_string();
        self.depth = brace_balance(line);
        if self.depth > 0 {
            self.in_block = true;
            if !line.ends_with('\n') {
                self.output.push('\n');
            }
            self.output
                .push_str(&format!("{}  {}\n", self.indent, BODY_MARKER));
        }
    }

    fn close_block(&mut self) {
        self.in_block = false;
        self.depth = 0;
        self.output.push_str(&format!("{}}}\n", self.indent));
    }

    fn finish(mut self) -> String {
        if self.in_block {
            self.close_block();
        }
        self.output
    }
}

pub fn stub(content: &str) -> String {
    let mut scanner = BraceScanner::default();
    for line in content.split_inclusive('\n') {
        scanner.push_line(line);
    }
    scanner.finish()
}
