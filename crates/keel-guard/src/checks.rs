//! Structural content checks
//!
//! Pure `content → violations` functions run as an ordered, pluggable list
//! (see [`ContentValidator`]). Detection is heuristic: each check looks for
//! specific literal patterns, not full syntax.

use crate::violation::{Severity, Violation, ViolationKind};
use once_cell::sync::Lazy;
use regex::Regex;

static PROSE_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:here(?:'s| is| are)\b|sure\b|certainly\b|below\b|the following\b|this (?:file|code|component|module|implementation)\b|i(?:'ll|'ve| will| have)\b|to implement\b)",
    )
    .expect("valid prose opener regex")
});
static UNTYPED_ANY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?::\s*any\b|\bas\s+any\b|<any>|\bany\[\])").expect("valid any regex")
});

/// One structural check over file content
pub trait ContentCheck: Send + Sync + std::fmt::Debug {
    /// Check name (for debugging)
    fn name(&self) -> &'static str;

    /// Violations found in `content` destined for `path`
    fn check(&self, path: &str, content: &str) -> Vec<Violation>;
}

/// Ordered registry of content checks
#[derive(Debug)]
pub struct ContentValidator {
    checks: Vec<Box<dyn ContentCheck>>,
}

impl ContentValidator {
    /// Create validator with no checks
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    /// Append a check; checks run in registration order
    pub fn register(&mut self, check: impl ContentCheck + 'static) {
        self.checks.push(Box::new(check));
    }

    /// Names of registered checks, in order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run every check
    #[must_use]
    pub fn run(&self, path: &str, content: &str) -> Vec<Violation> {
        self.checks
            .iter()
            .flat_map(|check| check.check(path, content))
            .collect()
    }
}

impl Default for ContentValidator {
    fn default() -> Self {
        let mut validator = Self::empty();
        validator.register(FenceCheck);
        validator.register(ProseCheck);
        validator.register(UntypedCheck);
        validator.register(BalanceCheck);
        validator
    }
}

/// Markdown fences left around or inside the code
#[derive(Debug, Clone, Copy, Default)]
pub struct FenceCheck;

impl ContentCheck for FenceCheck {
    fn name(&self) -> &'static str {
        "fences"
    }

    fn check(&self, path: &str, content: &str) -> Vec<Violation> {
        if is_documentation(path) || !content.lines().any(|l| l.trim_start().starts_with("```")) {
            return Vec::new();
        }
        vec![Violation::new(
            ViolationKind::Structure,
            Severity::High,
            "markdown code fence left in content",
            "write only the file body, without ``` markers",
        )]
    }
}

/// Explanations written where source was expected
#[derive(Debug, Clone, Copy, Default)]
pub struct ProseCheck;

impl ContentCheck for ProseCheck {
    fn name(&self) -> &'static str {
        "prose"
    }

    fn check(&self, path: &str, content: &str) -> Vec<Violation> {
        if !is_source(path) {
            return Vec::new();
        }
        let lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let Some(first) = lines.first() else {
            return Vec::new();
        };

        let opens_like_prose = PROSE_OPENER.is_match(first);
        let no_code_tokens = lines.len() >= 3
            && lines
                .iter()
                .all(|l| !l.contains(|c: char| ";{}()=<>[]:".contains(c)));
        if !(opens_like_prose || no_code_tokens) {
            return Vec::new();
        }
        vec![Violation::new(
            ViolationKind::Structure,
            Severity::High,
            "content reads like prose or documentation rather than source",
            "return the file contents only",
        )]
    }
}

/// TypeScript `any` escape hatch
#[derive(Debug, Clone, Copy, Default)]
pub struct UntypedCheck;

impl ContentCheck for UntypedCheck {
    fn name(&self) -> &'static str {
        "untyped"
    }

    fn check(&self, path: &str, content: &str) -> Vec<Violation> {
        if !matches!(extension(path), "ts" | "tsx" | "mts" | "cts") {
            return Vec::new();
        }
        let count = UNTYPED_ANY.find_iter(content).count();
        if count == 0 {
            return Vec::new();
        }
        vec![Violation::new(
            ViolationKind::Structure,
            Severity::Low,
            format!("consider replacing untyped `any` ({count} occurrences) with concrete types"),
            "use a named type or `unknown` with narrowing",
        )]
    }
}

/// Unbalanced braces, parentheses or brackets
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceCheck;

impl ContentCheck for BalanceCheck {
    fn name(&self) -> &'static str {
        "balance"
    }

    fn check(&self, path: &str, content: &str) -> Vec<Violation> {
        if !is_source(path) {
            return Vec::new();
        }
        let counts = count_delimiters(content, extension(path) == "py");
        [("braces", counts.braces), ("parentheses", counts.parens), ("brackets", counts.brackets)]
            .into_iter()
            .filter(|(_, pair)| !pair.balanced())
            .map(|(label, pair)| {
                Violation::new(
                    ViolationKind::Structure,
                    Severity::High,
                    format!(
                        "syntax error: unbalanced {label} ({} opening, {} closing)",
                        pair.open, pair.close
                    ),
                    "regenerate the complete file",
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Pair {
    open: usize,
    close: usize,
    underflow: bool,
}

impl Pair {
    fn opened(&mut self) {
        self.open += 1;
    }

    fn closed(&mut self) {
        self.close += 1;
        if self.close > self.open {
            self.underflow = true;
        }
    }

    fn balanced(&self) -> bool {
        self.open == self.close && !self.underflow
    }
}

#[derive(Debug, Default)]
struct Delimiters {
    braces: Pair,
    parens: Pair,
    brackets: Pair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    LineComment,
    BlockComment,
    Str(char),
}

/// Count delimiters outside string literals and comments
fn count_delimiters(content: &str, hash_comments: bool) -> Delimiters {
    let mut counts = Delimiters::default();
    let mut state = Scan::Code;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            Scan::Code => match c {
                '/' if !hash_comments && chars.peek() == Some(&'/') => state = Scan::LineComment,
                '/' if !hash_comments && chars.peek() == Some(&'*') => {
                    chars.next();
                    state = Scan::BlockComment;
                }
                '#' if hash_comments => state = Scan::LineComment,
                '"' | '\'' | '`' => state = Scan::Str(c),
                '{' => counts.braces.opened(),
                '}' => counts.braces.closed(),
                '(' => counts.parens.opened(),
                ')' => counts.parens.closed(),
                '[' => counts.brackets.opened(),
                ']' => counts.brackets.closed(),
                _ => {}
            },
            Scan::LineComment => {
                if c == '\n' {
                    state = Scan::Code;
                }
            }
            Scan::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = Scan::Code;
                }
            }
            Scan::Str(quote) => match c {
                '\\' => {
                    chars.next();
                }
                // plain quotes end at a newline
                '\n' if quote != '`' => state = Scan::Code,
                _ if c == quote => state = Scan::Code,
                _ => {}
            },
        }
    }

    counts
}

/// Extension of the final path segment
#[must_use]
pub fn extension(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}

/// Whether the path is a prose document where fences and sentences belong
#[must_use]
pub fn is_documentation(path: &str) -> bool {
    matches!(
        extension(path).to_ascii_lowercase().as_str(),
        "md" | "mdx" | "markdown" | "txt" | "rst"
    )
}

/// Whether the path is program source with balanced delimiters
#[must_use]
pub fn is_source(path: &str) -> bool {
    matches!(
        extension(path).to_ascii_lowercase().as_str(),
        "ts" | "tsx"
            | "mts"
            | "cts"
            | "js"
            | "jsx"
            | "mjs"
            | "cjs"
            | "json"
            | "rs"
            | "go"
            | "java"
            | "kt"
            | "swift"
            | "c"
            | "h"
            | "cpp"
            | "cs"
            | "css"
            | "scss"
            | "py"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.message.as_str()).collect()
    }

    #[test]
    fn default_order() {
        assert_eq!(
            ContentValidator::default().names(),
            vec!["fences", "prose", "untyped", "balance"]
        );
    }

    #[test]
    fn clean_source_passes() {
        let src = "export function add(a: number, b: number): number {\n  return a + b;\n}\n";
        assert!(ContentValidator::default().run("src/utils/math.ts", src).is_empty());
    }

    #[test]
    fn detects_fences() {
        let src = "```ts\nexport const a = 1;\n```";
        let found = FenceCheck.check("src/a.ts", src);
        assert_eq!(found.len(), 1);
        assert!(FenceCheck.check("README.md", src).is_empty());
    }

    #[test]
    fn detects_prose() {
        let src = "Here is the updated component.\nIt renders the cart.";
        assert_eq!(ProseCheck.check("src/components/Cart.tsx", src).len(), 1);

        let plain = "This module keeps the cart\nIt has items\nAnd totals";
        assert_eq!(ProseCheck.check("src/cart.ts", plain).len(), 1);
        assert!(ProseCheck.check("docs/cart.md", plain).is_empty());
    }

    #[test]
    fn untyped_any_is_advisory() {
        let found = UntypedCheck.check("src/a.ts", "let x: any = 1; const y = z as any;");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Low);
        assert!(found[0].message.contains("2 occurrences"));
        assert!(UntypedCheck.check("src/a.js", "let x: any").is_empty());
    }

    #[test]
    fn detects_unbalanced_delimiters() {
        let src = "function f() {\n  return [1, 2;\n";
        let found = BalanceCheck.check("src/f.js", src);
        assert_eq!(
            messages(&found),
            vec![
                "syntax error: unbalanced braces (1 opening, 0 closing)",
                "syntax error: unbalanced brackets (1 opening, 0 closing)",
            ]
        );
    }

    #[test]
    fn ignores_delimiters_in_strings_and_comments() {
        let src = "const s = \"{(\"; // ) }\n/* [ */\nconst t = `${s}}`;\nconst jsx = <p>Don't {x}</p>;\n";
        assert!(BalanceCheck.check("src/a.tsx", src).is_empty());
    }

    #[test]
    fn closing_before_opening_is_unbalanced() {
        assert_eq!(BalanceCheck.check("a.ts", "} {").len(), 1);
    }

    #[test]
    fn extension_of_paths() {
        assert_eq!(extension("src/a.test.ts"), "ts");
        assert_eq!(extension(".env"), "");
        assert_eq!(extension("Makefile"), "");
    }
}
