use std::fmt;

use crate::error::{CoreError, Result};

/// A runtime test usable in an `execute` guard.
///
/// `Test` holds the text following `if`/`unless`, for example
/// `entity @s[tag=ready]` or `score $x obj matches 1..`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Test(String),
    Not(Box<Condition>),
    And(Vec<Condition>),
}

impl Condition {
    pub fn test(text: impl Into<String>) -> Self {
        Condition::Test(text.into())
    }

    pub fn not(self) -> Self {
        match self {
            Condition::Not(inner) => *inner,
            other => Condition::Not(Box::new(other)),
        }
    }

    pub fn and(self, other: Condition) -> Self {
        match self {
            Condition::And(mut all) => {
                all.push(other);
                Condition::And(all)
            }
            first => Condition::And(vec![first, other]),
        }
    }

    /// Render as `execute` sub-commands, each `if <test>` or `unless <test>`.
    pub fn clauses(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        self.push_clauses(false, &mut out)?;
        Ok(out)
    }

    fn push_clauses(&self, negated: bool, out: &mut Vec<String>) -> Result<()> {
        match self {
            Condition::Test(text) => {
                let keyword = if negated { "unless" } else { "if" };
                out.push(format!("{} {}", keyword, text));
                Ok(())
            }
            Condition::Not(inner) => inner.push_clauses(!negated, out),
            Condition::And(all) if !negated => {
                for condition in all {
                    condition.push_clauses(false, out)?;
                }
                Ok(())
            }
            Condition::And(all) if all.len() == 1 => all[0].push_clauses(true, out),
            // a negated conjunction needs a disjunction, which guards cannot express
            Condition::And(_) => Err(CoreError::UnsupportedCondition(format!("not({})", self))),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Test(text) => f.write_str(text),
            Condition::Not(inner) => write!(f, "not({})", inner),
            Condition::And(all) => {
                let parts: Vec<String> = all.iter().map(ToString::to_string).collect();
                write!(f, "and({})", parts.join(", "))
            }
        }
    }
}

impl From<&str> for Condition {
    fn from(text: &str) -> Self {
        Condition::test(text)
    }
}

impl From<String> for Condition {
    fn from(text: String) -> Self {
        Condition::Test(text)
    }
}
