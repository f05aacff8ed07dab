//! file: core/src/variables/resolve.rs
//! description: rebuilds a value holding runtime placeholders in storage.
//!
//! The placeholder-free skeleton is written first with one command, then
//! every placeholder is patched in depth first, in input order.

use crate::error::{CoreError, Result};
use crate::variables::data::DataPoint;
use crate::variables::nbt::{NbtValue, NumericType, SequenceKind};
use crate::variables::score::Score;

/// A value only known at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    /// One register, stored as `numeric` after multiplying by `scale`.
    Score { score: Score, scale: f64, numeric: NumericType },
    /// Registers rebuilt, in order, as a sequence of `kind`.
    Scores { scores: Vec<Score>, scale: f64, kind: SequenceKind },
    /// A copy of another data point.
    Data { source: DataPoint },
}

impl Deferred {
    pub fn score(score: Score) -> Self {
        Deferred::Score { score, scale: 1.0, numeric: NumericType::Int }
    }

    pub fn score_as(score: Score, numeric: NumericType, scale: f64) -> Self {
        Deferred::Score { score, scale, numeric }
    }

    pub fn scores(scores: Vec<Score>) -> Self {
        Deferred::Scores { scores, scale: 1.0, kind: SequenceKind::IntArray }
    }

    pub fn scores_as(scores: Vec<Score>, kind: SequenceKind, scale: f64) -> Self {
        Deferred::Scores { scores, scale, kind }
    }

    pub fn data(source: DataPoint) -> Self {
        Deferred::Data { source }
    }

    pub fn shape(&self) -> String {
        match self {
            Deferred::Score { numeric, .. } => format!("deferred {} score", numeric),
            Deferred::Scores { kind, .. } => format!("deferred {} scores", kind.element()),
            Deferred::Data { .. } => "deferred data".to_string(),
        }
    }
}

/// Commands rebuilding `value` at `target`, using `temp` as the staging
/// slot for register arrays.
pub fn resolve_commands(value: &NbtValue, target: &DataPoint, temp: &DataPoint) -> Result<Vec<String>> {
    if !value.is_container() {
        return Err(CoreError::UnsupportedValueType {
            path: target.to_string(),
            shape: value.shape(),
        });
    }

    let mut out = vec![target.set_value(&value.skeleton().to_snbt()?)];
    let mut resolver = Resolver { temp, out: &mut out };
    resolver.walk(value, target, None);
    Ok(out)
}

struct Resolver<'a> {
    temp: &'a DataPoint,
    out: &'a mut Vec<String>,
}

impl Resolver<'_> {
    /// `point` is the slot of `value`, or of its list when `index` is set.
    fn walk(&mut self, value: &NbtValue, point: &DataPoint, index: Option<usize>) {
        match value {
            NbtValue::Compound(entries) => {
                let here = element(point, index);
                for (key, entry) in entries {
                    self.walk(entry, &here.select_key(key), None);
                }
            }
            NbtValue::List(items) => {
                let here = element(point, index);
                for (i, item) in items.iter().enumerate() {
                    self.walk(item, &here, Some(i));
                }
            }
            NbtValue::Deferred(deferred) => self.deferred(deferred, point, index),
            _ => {}
        }
    }

    fn deferred(&mut self, deferred: &Deferred, point: &DataPoint, index: Option<usize>) {
        match deferred {
            Deferred::Score { score, scale, numeric } => {
                if let Some(i) = index {
                    self.out.push(point.insert_value(i, numeric.zero()));
                }
                let dest = element(point, index);
                self.out.push(dest.store_score(*numeric, *scale, score));
            }
            Deferred::Scores { scores, scale, kind } => {
                match index {
                    Some(i) => self.out.push(point.insert_value(i, kind.empty())),
                    None => self.out.push(point.set_value(kind.empty())),
                }
                let dest = element(point, index);
                for score in scores {
                    // each copy completes before the append reading it
                    self.out.push(self.temp.store_score(kind.element(), *scale, score));
                    self.out.push(dest.append_from(self.temp));
                }
            }
            Deferred::Data { source } => match index {
                Some(i) => self.out.push(point.insert_from(i, source)),
                None => self.out.push(point.set_from(source)),
            },
        }
    }
}

fn element(point: &DataPoint, index: Option<usize>) -> DataPoint {
    match index {
        Some(i) => point.select_index(i),
        None => point.clone(),
    }
}
