//! Import and export extraction
//!
//! Line-oriented regex heuristics over JavaScript/TypeScript source. They
//! recognise the common statement shapes and make no attempt at a full parse.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s+(?:type\s+)?(?P<clause>[^;'"]*?)\s+from\s+['"](?P<module>[^'"]+)['"]"#)
        .expect("valid import regex")
});
static IMPORT_BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s+['"](?P<module>[^'"]+)['"]"#).expect("valid bare import regex")
});
static EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*export\s+(?:type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s+from\s+['"](?P<module>[^'"]+)['"]"#)
        .expect("valid re-export regex")
});
static REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\brequire\(\s*['"](?P<module>[^'"]+)['"]\s*\)"#).expect("valid require regex")
});

static EXPORT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*export\s+(?:declare\s+)?(?:async\s+)?(?:const|let|var|function\*?|class|abstract\s+class|interface|type|enum)\s+(?P<name>[A-Za-z_$][\w$]*)")
        .expect("valid export declaration regex")
});
static EXPORT_DEFAULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*export\s+default\b").expect("valid default export regex"));
static EXPORT_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*export\s+(?:type\s+)?\{(?P<names>[^}]*)\}").expect("valid export list regex")
});
static EXPORT_STAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*export\s+\*|\bmodule\.exports\b|\bexports\.[\w$]+\s*=")
        .expect("valid wildcard export regex")
});

/// One import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// Module specifier as written
    pub module: String,
    /// Default binding, if any
    pub default: Option<String>,
    /// Named bindings by their exported name
    pub named: Vec<String>,
    /// `* as name` import
    pub namespace: bool,
    /// 1-based line of the statement
    pub line: usize,
}

impl ImportStatement {
    fn bare(module: &str, line: usize) -> Self {
        Self {
            module: module.to_string(),
            default: None,
            named: Vec::new(),
            namespace: false,
            line,
        }
    }
}

/// Names a module exports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSet {
    /// Exported names; a default export is recorded as `default`
    pub names: BTreeSet<String>,
    /// Module re-exports or assigns exports dynamically, so the set is incomplete
    pub wildcard: bool,
}

impl ExportSet {
    /// Whether `name` is known to be exported
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Extract every import statement, in source order
#[must_use]
pub fn parse_imports(content: &str) -> Vec<ImportStatement> {
    let mut imports: Vec<(usize, ImportStatement)> = Vec::new();

    for caps in IMPORT_FROM.captures_iter(content) {
        let start = caps.get(0).map_or(0, |m| m.start());
        let mut statement = ImportStatement::bare(&caps["module"], line_of(content, start));
        parse_clause(&caps["clause"], &mut statement);
        imports.push((start, statement));
    }
    for regex in [&*IMPORT_BARE, &*EXPORT_FROM, &*REQUIRE] {
        for caps in regex.captures_iter(content) {
            let start = caps.get(0).map_or(0, |m| m.start());
            imports.push((start, ImportStatement::bare(&caps["module"], line_of(content, start))));
        }
    }

    imports.sort_by_key(|(start, _)| *start);
    imports.into_iter().map(|(_, statement)| statement).collect()
}

/// Extract the names a module exports
#[must_use]
pub fn exported_names(content: &str) -> ExportSet {
    let mut exports = ExportSet {
        wildcard: EXPORT_STAR.is_match(content),
        ..ExportSet::default()
    };

    for caps in EXPORT_DECL.captures_iter(content) {
        exports.names.insert(caps["name"].to_string());
    }
    if EXPORT_DEFAULT.is_match(content) {
        exports.names.insert("default".to_string());
    }
    for caps in EXPORT_LIST.captures_iter(content) {
        for entry in caps["names"].split(',') {
            let entry = entry.trim().trim_start_matches("type ").trim();
            let exported = match entry.split_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => entry,
            };
            if !exported.is_empty() {
                exports.names.insert(exported.to_string());
            }
        }
    }

    exports
}

fn parse_clause(clause: &str, statement: &mut ImportStatement) {
    let clause = clause.trim();
    let (head, braces) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if open < close => (&clause[..open], Some(&clause[open + 1..close])),
        _ => (clause, None),
    };

    for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if part.starts_with('*') {
            statement.namespace = true;
        } else {
            statement.default = Some(part.to_string());
        }
    }

    if let Some(names) = braces {
        statement.named = names
            .split(',')
            .map(|n| n.trim().trim_start_matches("type ").trim())
            .filter_map(|n| n.split_whitespace().next())
            .map(str::to_string)
            .collect();
    }
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}
