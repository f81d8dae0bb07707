// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Evaluation of virtual tags over caller-supplied series.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::tags::{Operand, TagIndex, TagRef, VirtualTag};
use crate::Error;

/// A source of the raw series of real tags.
pub trait SeriesSource {
    /// Returns the series recorded for the tag with the given ID.
    fn series(&self, tag_id: &str) -> Option<&[f64]>;
}

impl<S: BuildHasher> SeriesSource for HashMap<String, Vec<f64>, S> {
    fn series(&self, tag_id: &str) -> Option<&[f64]> {
        self.get(tag_id).map(Vec::as_slice)
    }
}

impl SeriesSource for BTreeMap<String, Vec<f64>> {
    fn series(&self, tag_id: &str) -> Option<&[f64]> {
        self.get(tag_id).map(Vec::as_slice)
    }
}

/// Evaluation.
impl<'a> TagIndex<'a> {
    /// Returns the series of the tag or virtual tag with the given ID.
    ///
    /// Real tags are looked up in `data`.  Virtual tags are computed from
    /// their operands, recursively.  Stored definitions are never changed, so
    /// the same index can be evaluated against different data.
    pub fn evaluate(&self, id: &str, data: &impl SeriesSource) -> Result<Vec<f64>, Error> {
        self.evaluate_inner(id, data, &mut vec![])
    }

    fn evaluate_inner(
        &self,
        id: &str,
        data: &impl SeriesSource,
        path: &mut Vec<&'a str>,
    ) -> Result<Vec<f64>, Error> {
        match self.get(id) {
            Some(TagRef::Tag(tag)) => data
                .series(tag.id())
                .map(<[f64]>::to_vec)
                .ok_or_else(|| {
                    Error::invalid_series(format!("No series supplied for tag {}.", tag.id()))
                }),
            Some(TagRef::Virtual(vtag)) => self.evaluate_virtual(vtag, data, path),
            None => Err(Error::object_not_found(format!(
                "Tag with id {id} not found."
            ))),
        }
    }

    fn evaluate_virtual(
        &self,
        vtag: &'a VirtualTag,
        data: &impl SeriesSource,
        path: &mut Vec<&'a str>,
    ) -> Result<Vec<f64>, Error> {
        if let Some(first) = path.iter().position(|id| *id == vtag.id()) {
            return Err(Error::cycle_detected(format!(
                "Cycle detected: {} -> {}",
                path[first..].join(" -> "),
                vtag.id()
            )));
        }
        path.push(vtag.id());

        let mut evaluated = Vec::with_capacity(vtag.operands().len());
        for operand in vtag.operands() {
            evaluated.push(match operand {
                Operand::Tag(id) => Evaluated::Series(self.evaluate_inner(id, data, path)?),
                Operand::Constant { value, .. } => Evaluated::Constant(*value),
            });
        }
        path.pop();

        let lengths = evaluated
            .iter()
            .filter_map(|e| match e {
                Evaluated::Series(series) => Some(series.len()),
                Evaluated::Constant(_) => None,
            })
            .collect::<Vec<_>>();
        let Some(&len) = lengths.first() else {
            return Err(Error::invalid_series(format!(
                "Virtual tag {} has no time-indexed operands.",
                vtag.id()
            )));
        };
        if lengths.iter().any(|l| *l != len) {
            return Err(Error::invalid_series(format!(
                "Operands of virtual tag {} have different lengths: {lengths:?}",
                vtag.id()
            )));
        }

        let operands = evaluated
            .into_iter()
            .map(|e| match e {
                Evaluated::Series(series) => series,
                Evaluated::Constant(value) => vec![value; len],
            })
            .collect();

        tracing::trace!("Evaluated virtual tag {} over {len} timesteps.", vtag.id());
        Ok(vtag.operator().apply(operands))
    }
}

/// An operand of a virtual tag, before constants are broadcast.
enum Evaluated {
    Series(Vec<f64>),
    Constant(f64),
}
