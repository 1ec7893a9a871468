//! Requirement representation and parsing
//!
//! Legacy distutils manifests declare dependencies in the PEP 314 style:
//! a bare distribution name, optionally followed by a parenthesized,
//! comma-separated list of version constraints, e.g. `jsonrpc (>=1.0, <2.0)`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ManifexError, Result};

/// Version comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionOp {
    /// Exactly equal (==)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than or equal (>=)
    Ge,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
}

impl VersionOp {
    /// Render in PEP 508 form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }

    /// Parse from the constraint syntax (a bare `=` is accepted as `==`)
    pub fn parse(op: &str) -> Option<Self> {
        match op.trim() {
            "==" | "=" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            ">=" => Some(Self::Ge),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            _ => None,
        }
    }
}

impl fmt::Display for VersionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single version constraint (operator plus version string)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    /// Comparison operator
    pub op: VersionOp,
    /// Version the operator compares against
    pub version: String,
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// Represents a declared dependency on another distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Distribution name as written in the manifest
    pub name: String,
    /// Version constraints, possibly empty
    pub constraints: Vec<VersionConstraint>,
}

impl Requirement {
    /// Create a new unconstrained requirement
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
        }
    }

    /// Canonical distribution name per the index normalization rule:
    /// lowercase with runs of `-`, `_` and `.` collapsed to a single `-`
    pub fn canonical_name(&self) -> String {
        lazy_static::lazy_static! {
            static ref SEP_RE: Regex = Regex::new(r"[-_.]+").unwrap();
        }
        SEP_RE.replace_all(&self.name, "-").to_lowercase()
    }

    /// Whether any version constraint is declared
    pub fn is_constrained(&self) -> bool {
        !self.constraints.is_empty()
    }

    /// Render as a PEP 508 dependency string, e.g. `jsonrpc>=1.0,<2.0`
    pub fn to_pep508(&self) -> String {
        if self.constraints.is_empty() {
            self.name.clone()
        } else {
            let spec: Vec<String> = self.constraints.iter().map(|c| c.to_string()).collect();
            format!("{}{}", self.name, spec.join(","))
        }
    }

    /// Parse a single requirement entry
    pub fn parse(s: &str) -> Result<Self> {
        lazy_static::lazy_static! {
            static ref REQ_RE: Regex = Regex::new(
                r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\(\s*([^)]*)\s*\))?\s*$"
            ).unwrap();
            static ref CONSTRAINT_RE: Regex = Regex::new(
                r"^\s*(==|!=|>=|<=|=|>|<)\s*([A-Za-z0-9][A-Za-z0-9!+._*-]*)\s*$"
            ).unwrap();
        }

        let s = s.trim();
        if s.is_empty() {
            return Err(ManifexError::requirement("empty requirement"));
        }

        let caps = REQ_RE
            .captures(s)
            .ok_or_else(|| ManifexError::requirement(format!("malformed requirement: {}", s)))?;

        let name = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
        let mut constraints = Vec::new();

        if let Some(spec) = caps.get(2) {
            for part in spec.as_str().split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }

                let ccaps = CONSTRAINT_RE.captures(part).ok_or_else(|| {
                    ManifexError::requirement(format!("malformed constraint '{}' in {}", part, s))
                })?;

                let op = VersionOp::parse(ccaps.get(1).map(|m| m.as_str()).unwrap_or(""))
                    .ok_or_else(|| {
                        ManifexError::requirement(format!("unknown operator in {}", s))
                    })?;
                let version = ccaps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();

                constraints.push(VersionConstraint { op, version });
            }
        }

        Ok(Self { name, constraints })
    }

    /// Parse a list of requirement entries, skipping empty ones
    pub fn parse_list<I, S>(entries: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut reqs = Vec::new();

        for entry in entries {
            let entry = entry.as_ref().trim();
            if !entry.is_empty() {
                reqs.push(Self::parse(entry)?);
            }
        }

        Ok(reqs)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_pep508())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name() {
        let req = Requirement::parse("jsonrpc").unwrap();
        assert_eq!(req.name, "jsonrpc");
        assert!(req.constraints.is_empty());
        assert!(!req.is_constrained());
    }

    #[test]
    fn test_parse_constrained() {
        let req = Requirement::parse("jsonrpc (>=1.0)").unwrap();
        assert_eq!(req.name, "jsonrpc");
        assert_eq!(req.constraints.len(), 1);
        assert_eq!(req.constraints[0].op, VersionOp::Ge);
        assert_eq!(req.constraints[0].version, "1.0");
    }

    #[test]
    fn test_parse_multiple_constraints() {
        let req = Requirement::parse("requests (>=2.0, <3.0, !=2.5)").unwrap();
        assert_eq!(req.constraints.len(), 3);
        assert_eq!(req.to_pep508(), "requests>=2.0,<3.0,!=2.5");
    }

    #[test]
    fn test_bare_equals_is_exact() {
        let req = Requirement::parse("foo (=1.2)").unwrap();
        assert_eq!(req.constraints[0].op, VersionOp::Eq);
        assert_eq!(req.to_pep508(), "foo==1.2");
    }

    #[test]
    fn test_canonical_name() {
        let req = Requirement::new("Python__Ticoin--RPC..lib");
        assert_eq!(req.canonical_name(), "python-ticoin-rpc-lib");
    }

    #[test]
    fn test_parse_list_skips_empty() {
        let reqs = Requirement::parse_list(["jsonrpc", "", "  ", "requests (>=2.0)"]).unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[1].name, "requests");
    }

    #[test]
    fn test_reject_malformed() {
        assert!(Requirement::parse("").is_err());
        assert!(Requirement::parse("foo (~=1.0)").is_err());
        assert!(Requirement::parse("-leading-dash").is_err());
    }
}
