//! The four overload admission policies and their CLI literal encoding.

use std::str::FromStr;
use thiserror::Error;

/// Scheduling / admission algorithm applied once `waiting + running` hits
/// `max_accepted_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedalg {
    /// Producer blocks until a slot frees up.
    Block,
    /// The arriving connection is dropped.
    DropTail,
    /// The oldest waiting connection is evicted to make room.
    DropHead,
    /// Roughly half of the waiting connections are evicted at random ends.
    DropRandom,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized schedalg {0:?}: expected one of block, dt, dh, random")]
pub struct UnknownSchedalg(String);

impl FromStr for Schedalg {
    type Err = UnknownSchedalg;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(Schedalg::Block),
            "dt" => Ok(Schedalg::DropTail),
            "dh" => Ok(Schedalg::DropHead),
            "random" => Ok(Schedalg::DropRandom),
            other => Err(UnknownSchedalg(other.to_string())),
        }
    }
}
