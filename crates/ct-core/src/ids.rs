//! Agent identity.
//!
//! IDs are dense: the builder hands out `0..agent_count`, so an ID doubles as
//! the agent's position in the population `Vec` (see [`AgentId::index`]).

use std::fmt;

/// Identity of one agent, fixed for the lifetime of a population.  Reset
/// keeps IDs; it only rewinds state.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentId(pub u32);

impl AgentId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}

/// Fails for positions past `u32::MAX`; config validation rejects such
/// populations before any ID is made.
impl TryFrom<usize> for AgentId {
    type Error = std::num::TryFromIntError;

    fn try_from(index: usize) -> Result<AgentId, Self::Error> {
        u32::try_from(index).map(AgentId)
    }
}
