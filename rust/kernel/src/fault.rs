// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fault records returned by bulk topology creation and body checking.

use crate::tag::EntityTag;

/// State carried by a topology-creation fault record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultState {
    /// Informational record; the topology was created.
    Ok,
    /// An entity that needs children has none.
    MissingChild,
    /// An edge is bounded by more than two vertices.
    TooManyVertices,
    /// A loop's edges do not close up.
    OpenLoop,
    /// The same parent/child pair was related with conflicting senses.
    ConflictingSense,
}

/// One fault from a bulk topology-creation call.
#[derive(Debug, Clone, PartialEq)]
pub struct TopolFault {
    pub state: FaultState,
    /// Indices into the request's class array.
    pub entities: Vec<usize>,
}

impl TopolFault {
    pub fn new(state: FaultState, entities: Vec<usize>) -> Self {
        Self { state, entities }
    }
}

/// Typed reading of a topology-creation fault list.
#[derive(Debug, Clone, PartialEq)]
pub enum FaultReport {
    Clean,
    /// The first record is informational; the body is usable.
    Tolerated(Vec<TopolFault>),
    Fatal(Vec<TopolFault>),
}

impl FaultReport {
    pub fn classify(faults: Vec<TopolFault>) -> Self {
        match faults.first() {
            None => FaultReport::Clean,
            Some(first) if first.state == FaultState::Ok => FaultReport::Tolerated(faults),
            Some(_) => FaultReport::Fatal(faults),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, FaultReport::Fatal(_))
    }
}

/// State of one body-check fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckState {
    BadVertex,
    BadEdge,
    BadLoops,
    /// A face has no surface attached.
    MissingGeometry,
    /// An edge tolerance was widened beyond the vertex tolerance.
    ToleranceWidened,
    /// Faces of the body meet in a way the checker could not verify.
    FaceFaceUnverified,
}

impl CheckState {
    /// States no downstream consumer can work around.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            CheckState::BadVertex | CheckState::BadEdge | CheckState::BadLoops
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckState::BadVertex => "bad vertex",
            CheckState::BadEdge => "bad edge",
            CheckState::BadLoops => "bad loops",
            CheckState::MissingGeometry => "missing geometry",
            CheckState::ToleranceWidened => "tolerance widened",
            CheckState::FaceFaceUnverified => "face-face unverified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckFault {
    pub state: CheckState,
    pub entity: Option<EntityTag>,
}

impl CheckFault {
    pub fn new(state: CheckState, entity: Option<EntityTag>) -> Self {
        Self { state, entity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_list_classification() {
        assert_eq!(FaultReport::classify(Vec::new()), FaultReport::Clean);

        let ok_first = vec![
            TopolFault::new(FaultState::Ok, vec![0]),
            TopolFault::new(FaultState::OpenLoop, vec![4]),
        ];
        assert!(matches!(
            FaultReport::classify(ok_first),
            FaultReport::Tolerated(_)
        ));

        let bad = vec![TopolFault::new(FaultState::MissingChild, vec![1])];
        assert!(FaultReport::classify(bad).is_fatal());
    }

    #[test]
    fn unrecoverable_states() {
        assert!(CheckState::BadLoops.is_unrecoverable());
        assert!(!CheckState::ToleranceWidened.is_unrecoverable());
    }
}
