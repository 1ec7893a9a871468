//! setup.py manifest parser
//!
//! Parses the keyword arguments of the `setup(...)` call out of a legacy
//! distutils/setuptools manifest without executing any Python. Only literal
//! values are interpreted: strings (including implicit concatenation and
//! triple quotes), lists/tuples of strings, integers, booleans and the
//! `open('README').read()` idiom for the long description. Anything else is
//! preserved verbatim in the metadata's `extra` map.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{ManifexError, Result};
use crate::models::{Classifier, LongDescription, ManifestMetadata, Requirement};

/// A parsed keyword-argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// String literal (after escape processing and concatenation)
    Str(String),
    /// List or tuple of string literals
    List(Vec<String>),
    /// Integer literal
    Int(i64),
    /// Boolean literal
    Bool(bool),
    /// The `open('<path>').read()` idiom
    FileRead(PathBuf),
    /// Unrecognized expression, kept verbatim
    Raw(String),
}

impl Value {
    /// Render for storage in the `extra` map
    fn render(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::List(items) => items.join(", "),
            Self::Int(i) => i.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::FileRead(path) => format!("open({}).read()", path.display()),
            Self::Raw(raw) => raw.clone(),
        }
    }
}

/// Parser for setup.py manifests
pub struct SetupPyParser {
    /// Manifest source text
    source: String,
    /// Directory containing the manifest, when loaded from disk
    manifest_dir: Option<PathBuf>,
}

impl SetupPyParser {
    /// Create a parser for a setup.py file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ManifexError::file_not_found(path));
        }

        let source = std::fs::read_to_string(path)?;
        let manifest_dir = path.parent().map(|p| p.to_path_buf());

        Ok(Self {
            source,
            manifest_dir,
        })
    }

    /// Create a parser over in-memory source text
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            manifest_dir: None,
        }
    }

    /// Parse the manifest and return metadata
    pub fn parse(&self) -> Result<ManifestMetadata> {
        let call = extract_setup_call(&self.source)?;
        let arguments = split_arguments(&call);

        let mut keywords = Vec::new();
        for argument in &arguments {
            if let Some(kv) = parse_keyword(argument)? {
                keywords.push(kv);
            }
        }

        let mut metadata = self.build_metadata(&keywords)?;
        metadata.source_dir = self.manifest_dir.clone();

        Ok(metadata)
    }

    /// Build ManifestMetadata from parsed keyword arguments
    fn build_metadata(&self, keywords: &[(String, Value)]) -> Result<ManifestMetadata> {
        let name = match keywords.iter().find(|(k, _)| k == "name") {
            Some((_, Value::Str(s))) => s.clone(),
            Some((_, other)) => {
                return Err(ManifexError::InvalidManifest(format!(
                    "name is not a string literal: {}",
                    other.render()
                )))
            }
            None => return Err(ManifexError::MissingField("name".into())),
        };

        let version = match keywords.iter().find(|(k, _)| k == "version") {
            Some((_, Value::Str(s))) => s.clone(),
            Some((_, other)) => {
                return Err(ManifexError::InvalidManifest(format!(
                    "version is not a string literal: {}",
                    other.render()
                )))
            }
            None => return Err(ManifexError::MissingField("version".into())),
        };

        let mut metadata = ManifestMetadata::new(name, version);

        for (key, value) in keywords {
            match (key.as_str(), value) {
                ("name", _) | ("version", _) => {}

                ("description", Value::Str(s)) => metadata.description = Some(s.clone()),
                ("author", Value::Str(s)) => metadata.author = Some(s.clone()),
                ("author_email", Value::Str(s)) => metadata.author_email = Some(s.clone()),
                ("maintainer", Value::Str(s)) => metadata.maintainer = Some(s.clone()),
                ("maintainer_email", Value::Str(s)) => {
                    metadata.maintainer_email = Some(s.clone())
                }
                ("url", Value::Str(s)) => metadata.url = Some(s.clone()),
                ("license", Value::Str(s)) => metadata.license = Some(s.clone()),

                ("long_description", Value::Str(s)) => {
                    metadata.long_description = Some(LongDescription::Text(s.clone()))
                }
                ("long_description", Value::FileRead(path)) => {
                    metadata.long_description = Some(LongDescription::File(path.clone()))
                }

                ("requires", Value::List(items)) | ("install_requires", Value::List(items)) => {
                    for item in items {
                        match Requirement::parse(item) {
                            Ok(req) => metadata.requires.push(req),
                            Err(_) => metadata.invalid_requires.push(item.clone()),
                        }
                    }
                }

                ("packages", Value::List(items)) => metadata.packages = items.clone(),
                ("py_modules", Value::List(items)) => metadata.py_modules = items.clone(),
                ("scripts", Value::List(items)) => metadata.scripts = items.clone(),
                ("scripts", Value::Str(s)) => metadata.scripts = vec![s.clone()],

                ("classifiers", Value::List(items)) => {
                    for item in items {
                        match Classifier::parse(item) {
                            Ok(c) => metadata.classifiers.push(c),
                            Err(_) => metadata.invalid_classifiers.push(item.clone()),
                        }
                    }
                }

                (other, value) => {
                    metadata.extra.insert(other.to_string(), value.render());
                }
            }
        }

        Ok(metadata)
    }
}

/// Find the `setup(...)` call and return the text between its parentheses
fn extract_setup_call(source: &str) -> Result<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '#' {
            i = skip_comment(&chars, i);
        } else if c == '\'' || c == '"' {
            i = skip_string(&chars, i)?;
        } else if c == 's' && matches_identifier(&chars, i, "setup") {
            // Skip whitespace between the identifier and the open paren
            let mut j = i + 5;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }

            if j < chars.len() && chars[j] == '(' {
                return extract_balanced(&chars, j);
            }

            i += 5;
        } else {
            i += 1;
        }
    }

    Err(ManifexError::parse("no setup() call found"))
}

/// Check that `word` starts at `i` and is a standalone identifier
fn matches_identifier(chars: &[char], i: usize, word: &str) -> bool {
    let word_chars: Vec<char> = word.chars().collect();

    if i + word_chars.len() > chars.len() {
        return false;
    }
    if chars[i..i + word_chars.len()] != word_chars[..] {
        return false;
    }

    // Not part of a longer identifier or an attribute access
    if i > 0 {
        let prev = chars[i - 1];
        if prev.is_alphanumeric() || prev == '_' || prev == '.' {
            return false;
        }
    }
    if let Some(&next) = chars.get(i + word_chars.len()) {
        if next.is_alphanumeric() || next == '_' {
            return false;
        }
    }

    true
}

/// Collect the content between balanced parentheses starting at `open`
fn extract_balanced(chars: &[char], open: usize) -> Result<String> {
    let mut depth = 0usize;
    let mut i = open;
    let mut out = String::new();

    while i < chars.len() {
        let c = chars[i];

        match c {
            '#' => {
                i = skip_comment(chars, i);
                out.push('\n');
                continue;
            }
            '\'' | '"' => {
                let end = skip_string(chars, i)?;
                out.extend(&chars[i..end]);
                i = end;
                continue;
            }
            '(' | '[' | '{' => {
                depth += 1;
                if depth > 1 {
                    out.push(c);
                }
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(out);
                }
                out.push(c);
            }
            _ => out.push(c),
        }

        i += 1;
    }

    Err(ManifexError::parse("unterminated setup() call"))
}

/// Skip a comment, returning the index of the terminating newline
fn skip_comment(chars: &[char], i: usize) -> usize {
    let mut j = i;
    while j < chars.len() && chars[j] != '\n' {
        j += 1;
    }
    j
}

/// Skip a string literal starting at `i`, returning the index past its end
fn skip_string(chars: &[char], i: usize) -> Result<usize> {
    let quote = chars[i];
    let triple = chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote);

    let mut j = if triple { i + 3 } else { i + 1 };

    while j < chars.len() {
        let c = chars[j];

        if c == '\\' {
            j += 2;
            continue;
        }

        if c == quote {
            if triple {
                if chars.get(j + 1) == Some(&quote) && chars.get(j + 2) == Some(&quote) {
                    return Ok(j + 3);
                }
            } else {
                return Ok(j + 1);
            }
        }

        j += 1;
    }

    Err(ManifexError::parse("unterminated string literal"))
}

/// Split the call body on top-level commas
fn split_arguments(call: &str) -> Vec<String> {
    let chars: Vec<char> = call.chars().collect();
    let mut arguments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        match c {
            '\'' | '"' => {
                // Strings were validated during extraction
                let end = skip_string(&chars, i).unwrap_or(i + 1);
                current.extend(&chars[i..end]);
                i = end;
                continue;
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                arguments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }

        i += 1;
    }

    if !current.trim().is_empty() {
        arguments.push(current);
    }

    arguments
        .into_iter()
        .filter(|a| !a.trim().is_empty())
        .collect()
}

/// Parse one argument into a keyword/value pair (positional args are skipped)
fn parse_keyword(argument: &str) -> Result<Option<(String, Value)>> {
    lazy_static::lazy_static! {
        static ref KW_RE: Regex =
            Regex::new(r"(?s)^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*?)\s*$").unwrap();
    }

    let caps = match KW_RE.captures(argument) {
        Some(caps) => caps,
        None => return Ok(None),
    };

    // `==` at the start of the value means this was a comparison, not a kwarg
    let value_text = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    if value_text.starts_with('=') {
        return Ok(None);
    }

    let key = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
    Ok(Some((key, parse_value(value_text))))
}

/// Parse a literal value expression
fn parse_value(expr: &str) -> Value {
    let expr = expr.trim();

    if expr.is_empty() {
        return Value::Raw(String::new());
    }

    if let Some(s) = parse_string_concat(expr) {
        return Value::Str(s);
    }

    if let Some(items) = parse_sequence(expr) {
        return items;
    }

    if let Some(path) = parse_open_read(expr) {
        return Value::FileRead(path);
    }

    match expr {
        "True" => return Value::Bool(true),
        "False" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(i) = expr.parse::<i64>() {
        return Value::Int(i);
    }

    Value::Raw(expr.to_string())
}

/// Parse one or more adjacent string literals (implicit concatenation)
fn parse_string_concat(expr: &str) -> Option<String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    let mut found = false;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        let (piece, end) = parse_string_literal(&chars, i)?;
        out.push_str(&piece);
        i = end;
        found = true;
    }

    if found {
        Some(out)
    } else {
        None
    }
}

/// Parse a single string literal at `i`, returning its value and end index
fn parse_string_literal(chars: &[char], mut i: usize) -> Option<(String, usize)> {
    // Optional prefix (r, u, b, or combinations); raw disables escapes
    let mut raw = false;
    while i < chars.len() && matches!(chars[i], 'r' | 'R' | 'u' | 'U' | 'b' | 'B') {
        if matches!(chars[i], 'r' | 'R') {
            raw = true;
        }
        i += 1;
    }

    let quote = *chars.get(i)?;
    if quote != '\'' && quote != '"' {
        return None;
    }

    let triple = chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote);
    let mut j = if triple { i + 3 } else { i + 1 };
    let mut out = String::new();

    while j < chars.len() {
        let c = chars[j];

        if c == '\\' && !raw {
            let next = *chars.get(j + 1)?;
            match next {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                '\\' | '\'' | '"' => out.push(next),
                'x' => {
                    let hex: String = chars.get(j + 2..j + 4)?.iter().collect();
                    let code = u8::from_str_radix(&hex, 16).ok()?;
                    out.push(code as char);
                    j += 4;
                    continue;
                }
                '\n' => {} // line continuation inside a literal
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            j += 2;
            continue;
        }

        if c == quote {
            if triple {
                if chars.get(j + 1) == Some(&quote) && chars.get(j + 2) == Some(&quote) {
                    return Some((out, j + 3));
                }
            } else {
                return Some((out, j + 1));
            }
        }

        out.push(c);
        j += 1;
    }

    None
}

/// Parse a list or tuple of string literals
fn parse_sequence(expr: &str) -> Option<Value> {
    let (open, close) = match expr.chars().next()? {
        '[' => ('[', ']'),
        '(' => ('(', ')'),
        _ => return None,
    };

    if !expr.ends_with(close) {
        return None;
    }

    let inner = &expr[open.len_utf8()..expr.len() - close.len_utf8()];
    let mut items = Vec::new();

    for part in split_arguments(inner) {
        let part = part.trim().to_string();
        match parse_string_concat(&part) {
            Some(s) => items.push(s),
            // A non-string element makes the whole sequence opaque
            None => return Some(Value::Raw(expr.to_string())),
        }
    }

    Some(Value::List(items))
}

/// Recognize the `open('<path>').read()` idiom
fn parse_open_read(expr: &str) -> Option<PathBuf> {
    lazy_static::lazy_static! {
        static ref OPEN_RE: Regex = Regex::new(
            r#"(?s)^open\(\s*(?:'(?P<path_sq>[^'"]+)'|"(?P<path_dq>[^'"]+)")\s*(?:,[^)]*)?\)\s*\.\s*read\(\s*\)$"#
        ).unwrap();
    }

    OPEN_RE.captures(expr).and_then(|caps| {
        caps.name("path_sq")
            .or_else(|| caps.name("path_dq"))
            .map(|m| PathBuf::from(m.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPENDFROM_SETUP: &str = r#"from distutils.core import setup
setup(name='btcspendfrom',
      version='1.0',
      description='Command-line utility for ticoin "coin control"',
      author='Gavin Andresen',
      author_email='gavin@ticoinfoundation.org',
      requires=['jsonrpc'],
      scripts=['spendfrom.py'],
      )
"#;

    const RPC_SETUP: &str = r#"#!/usr/bin/env python

from distutils.core import setup

setup(name='python-ticoinrpc',
      version='0.1',
      description='Enhanced version of python-jsonrpc for use with ticoin',
      long_description=open('README').read(),
      author='Jeff Garzik',
      author_email='<jgarzik@exmulti.com>',
      maintainer='Jeff Garzik',
      maintainer_email='<jgarzik@exmulti.com>',
      url='http://www.github.com/jgarzik/python-ticoinrpc',
      packages=['ticoinrpc'],
      classifiers=['License :: OSI Approved :: GNU Library or Lesser General Public License (LGPL)', 'Operating System :: OS Independent'])
"#;

    #[test]
    fn test_parse_cli_manifest() {
        let meta = SetupPyParser::from_source(SPENDFROM_SETUP).parse().unwrap();

        assert_eq!(meta.name, "btcspendfrom");
        assert_eq!(meta.version, "1.0");
        assert_eq!(
            meta.description.as_deref(),
            Some(r#"Command-line utility for ticoin "coin control""#)
        );
        assert_eq!(meta.author.as_deref(), Some("Gavin Andresen"));
        assert_eq!(meta.requires.len(), 1);
        assert_eq!(meta.requires[0].name, "jsonrpc");
        assert_eq!(meta.scripts, vec!["spendfrom.py"]);
    }

    #[test]
    fn test_parse_library_manifest() {
        let meta = SetupPyParser::from_source(RPC_SETUP).parse().unwrap();

        assert_eq!(meta.name, "python-ticoinrpc");
        assert_eq!(meta.version, "0.1");
        assert_eq!(meta.maintainer.as_deref(), Some("Jeff Garzik"));
        assert_eq!(meta.packages, vec!["ticoinrpc"]);
        assert_eq!(meta.classifiers.len(), 2);
        assert_eq!(meta.classifiers[1].category(), "Operating System");
        assert_eq!(
            meta.long_description,
            Some(LongDescription::File(PathBuf::from("README")))
        );
    }

    #[test]
    fn test_missing_name_is_error() {
        let result = SetupPyParser::from_source("setup(version='1.0')").parse();
        assert!(matches!(result, Err(ManifexError::MissingField(ref f)) if f == "name"));
    }

    #[test]
    fn test_no_setup_call_is_error() {
        let result = SetupPyParser::from_source("print('hello')").parse();
        assert!(matches!(result, Err(ManifexError::SetupParsing(_))));
    }

    #[test]
    fn test_unterminated_call_is_error() {
        let result = SetupPyParser::from_source("setup(name='x', version='1'").parse();
        assert!(matches!(result, Err(ManifexError::SetupParsing(_))));
    }

    #[test]
    fn test_comments_inside_call() {
        let src = "setup(\n    name='pkg',  # the name\n    version='2.0',\n)";
        let meta = SetupPyParser::from_source(src).parse().unwrap();
        assert_eq!(meta.name, "pkg");
        assert_eq!(meta.version, "2.0");
    }

    #[test]
    fn test_string_concatenation_and_triple_quotes() {
        let src = r#"setup(
    name='pkg',
    version='1.0',
    description='one ' 'two',
    long_description="""multi
line""",
)"#;
        let meta = SetupPyParser::from_source(src).parse().unwrap();
        assert_eq!(meta.description.as_deref(), Some("one two"));
        assert_eq!(
            meta.long_description,
            Some(LongDescription::Text("multi\nline".into()))
        );
    }

    #[test]
    fn test_tuple_sequence_and_trailing_comma() {
        let src = "setup(name='pkg', version='1.0', py_modules=('a', 'b',),)";
        let meta = SetupPyParser::from_source(src).parse().unwrap();
        assert_eq!(meta.py_modules, vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_keyword_goes_to_extra() {
        let src = "setup(name='pkg', version='1.0', zip_safe=False, keywords=['one', 'two'])";
        let meta = SetupPyParser::from_source(src).parse().unwrap();
        assert_eq!(meta.extra.get("zip_safe").map(String::as_str), Some("false"));
        assert_eq!(meta.extra.get("keywords").map(String::as_str), Some("one, two"));
    }

    #[test]
    fn test_non_literal_sequence_kept_raw() {
        let src = "setup(name='pkg', version='1.0', packages=find_packages())";
        let meta = SetupPyParser::from_source(src).parse().unwrap();
        assert!(meta.packages.is_empty());
        assert_eq!(
            meta.extra.get("packages").map(String::as_str),
            Some("find_packages()")
        );
    }

    #[test]
    fn test_invalid_requirement_collected() {
        let src = "setup(name='pkg', version='1.0', requires=['good', 'bad (~=1.0)'])";
        let meta = SetupPyParser::from_source(src).parse().unwrap();
        assert_eq!(meta.requires.len(), 1);
        assert_eq!(meta.invalid_requires, vec!["bad (~=1.0)"]);
    }

    #[test]
    fn test_escape_sequences() {
        let src = r#"setup(name='pkg', version='1.0', description='tab\there\nnewline')"#;
        let meta = SetupPyParser::from_source(src).parse().unwrap();
        assert_eq!(meta.description.as_deref(), Some("tab\there\nnewline"));
    }
}
