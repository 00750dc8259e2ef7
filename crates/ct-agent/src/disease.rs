//! The disease state machine.
//!
//! Pure functions over [`DiseaseState`] and [`Message`]; no locking, no
//! randomness.  The agent draws its random outcomes and hands the results in
//! as booleans, which keeps every branch here directly testable.

use std::fmt;

use crate::sink::{Bucket, MetricDelta};

/// Health of one agent.  Exactly one at a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiseaseState {
    Vulnerable,
    Infected,
    Asymptomatic,
    Sick,
    Immune,
    Dead,
}

impl DiseaseState {
    pub const ALL: [DiseaseState; 6] = [
        DiseaseState::Vulnerable,
        DiseaseState::Infected,
        DiseaseState::Asymptomatic,
        DiseaseState::Sick,
        DiseaseState::Immune,
        DiseaseState::Dead,
    ];

    /// Lowercase display label, as shown in the history log.
    pub fn label(self) -> &'static str {
        match self {
            DiseaseState::Vulnerable   => "vulnerable",
            DiseaseState::Infected     => "infected",
            DiseaseState::Asymptomatic => "asymptomatic",
            DiseaseState::Sick         => "sick",
            DiseaseState::Immune       => "immune",
            DiseaseState::Dead         => "dead",
        }
    }

    /// `Dead` and `Immune` never change again.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, DiseaseState::Dead | DiseaseState::Immune)
    }

    /// States that pass germs to neighbors.
    #[inline]
    pub fn is_contagious(self) -> bool {
        matches!(self, DiseaseState::Sick | DiseaseState::Asymptomatic)
    }

    #[inline]
    pub fn is_alive(self) -> bool {
        self != DiseaseState::Dead
    }
}

impl fmt::Display for DiseaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A transition request.  Payload-free.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Message {
    HaveGerms,
    BecomeSick,
    BecomeAsymptomatic,
    BecomeImmune,
    BecomeDead,
}

/// Result of applying one message.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub next:    DiseaseState,
    /// Population-metric adjustments to report for this transition.
    pub metrics: &'static [MetricDelta],
}

const NO_DELTAS: &[MetricDelta] = &[];
const SICK_DELTAS: &[MetricDelta] = &[
    MetricDelta::new(Bucket::Sick, 1),
    MetricDelta::new(Bucket::Vulnerable, -1),
];
const ASYMPTOMATIC_DELTAS: &[MetricDelta] = &[
    MetricDelta::new(Bucket::Asymptomatic, 1),
    MetricDelta::new(Bucket::Vulnerable, -1),
];
const IMMUNE_DELTAS: &[MetricDelta] = &[MetricDelta::new(Bucket::Immune, 1)];
const DEAD_DELTAS: &[MetricDelta] = &[MetricDelta::new(Bucket::Dead, 1)];

/// Apply `message` to an agent currently in `state`.
///
/// Returns `None` when the message does not apply: `HaveGerms` to anything
/// but a `Vulnerable` agent, or any message to a terminal agent.  Both are
/// normal and silent.
pub fn apply(state: DiseaseState, message: Message) -> Option<Applied> {
    if state.is_terminal() {
        return None;
    }
    let (next, metrics) = match message {
        Message::HaveGerms if state == DiseaseState::Vulnerable => (DiseaseState::Infected, NO_DELTAS),
        Message::HaveGerms          => return None,
        Message::BecomeSick         => (DiseaseState::Sick, SICK_DELTAS),
        Message::BecomeAsymptomatic => (DiseaseState::Asymptomatic, ASYMPTOMATIC_DELTAS),
        Message::BecomeImmune       => (DiseaseState::Immune, IMMUNE_DELTAS),
        Message::BecomeDead         => (DiseaseState::Dead, DEAD_DELTAS),
    };
    Some(Applied { next, metrics })
}

/// What an `Infected` agent becomes once its incubation is over.
#[inline]
pub fn incubation_outcome(becomes_sick: bool) -> Message {
    if becomes_sick {
        Message::BecomeSick
    } else {
        Message::BecomeAsymptomatic
    }
}

/// What a contagious agent becomes once its illness is over, together with
/// the "leaving" metric adjustment reported at decision time.
///
/// `dies` is only consulted for `Sick`.  Returns `None` for non-contagious
/// states.
pub fn illness_outcome(state: DiseaseState, dies: bool) -> Option<(Message, MetricDelta)> {
    match state {
        DiseaseState::Sick => {
            let message = if dies { Message::BecomeDead } else { Message::BecomeImmune };
            Some((message, MetricDelta::new(Bucket::Sick, -1)))
        }
        DiseaseState::Asymptomatic => {
            Some((Message::BecomeImmune, MetricDelta::new(Bucket::Asymptomatic, -1)))
        }
        _ => None,
    }
}
