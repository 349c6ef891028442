//! # Validation Cycle Typestate Machine
//!
//! One validation cycle moves through `Idle → Validating → {Valid | Invalid}`
//! exactly once. Each state is a distinct type, so a settled cycle cannot be
//! settled again and an idle cycle cannot be settled at all.
//!
//! ```text
//! Idle ──begin()──▶ Validating ──settle()──┬──▶ Valid
//!                                          └──▶ Invalid
//! ```
//!
//! ## Ordering
//!
//! Overlapping cycles are ordered by a [`CycleSequencer`]. Every cycle takes
//! a ticket when it is created; `settle` refuses a cycle whose ticket has
//! been superseded, leaving the meta tree for the newer cycle to update. The
//! last validation started is therefore the one whose result lands.
//!
//! ```compile_fail
//! use formwork_state::cycle::*;
//! use formwork_state::MetaNode;
//!
//! let sequencer = CycleSequencer::new();
//! let mut meta = MetaNode::default();
//! let idle = ValidationCycle::new(&sequencer);
//! // ERROR: no method named `settle` found for `ValidationCycle<Idle>`
//! let _ = idle.settle(&mut meta, None, &sequencer);
//! ```

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use formwork_core::ErrorTree;

use crate::meta::MetaNode;
use crate::validity::update_validation_state;

// ─── State Types ─────────────────────────────────────────────────────

/// Cycle state: created, nothing in flight.
#[derive(Debug, Clone, Copy)]
pub struct Idle;

/// Cycle state: validator running, meta tree shows `validating`.
#[derive(Debug, Clone, Copy)]
pub struct Validating;

/// Cycle state: validation succeeded (terminal).
#[derive(Debug, Clone, Copy)]
pub struct Valid;

/// Cycle state: validation produced an error tree (terminal).
#[derive(Debug, Clone, Copy)]
pub struct Invalid;

mod private {
    pub trait Sealed {}
    impl Sealed for super::Idle {}
    impl Sealed for super::Validating {}
    impl Sealed for super::Valid {}
    impl Sealed for super::Invalid {}
}

/// Marker trait for the four cycle states. Sealed.
pub trait CycleState: private::Sealed + std::fmt::Debug {
    fn name() -> &'static str;

    fn is_terminal() -> bool {
        false
    }
}

impl CycleState for Idle {
    fn name() -> &'static str {
        "IDLE"
    }
}

impl CycleState for Validating {
    fn name() -> &'static str {
        "VALIDATING"
    }
}

impl CycleState for Valid {
    fn name() -> &'static str {
        "VALID"
    }
    fn is_terminal() -> bool {
        true
    }
}

impl CycleState for Invalid {
    fn name() -> &'static str {
        "INVALID"
    }
    fn is_terminal() -> bool {
        true
    }
}

// ─── Sequencing ──────────────────────────────────────────────────────

/// Position of a cycle in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues monotonically increasing tickets; the newest ticket is current.
#[derive(Debug, Default)]
pub struct CycleSequencer {
    latest: AtomicU64,
}

impl CycleSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier one.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    pub fn latest(&self) -> Ticket {
        Ticket(self.latest.load(Ordering::SeqCst))
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised while settling a cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    /// A newer cycle was started after this one; its result must not land.
    #[error("validation cycle {ticket} superseded by cycle {latest}")]
    Superseded {
        /// The stale cycle's ticket.
        ticket: u64,
        /// The newest issued ticket.
        latest: u64,
    },
}

// ─── The Cycle ───────────────────────────────────────────────────────

/// One validation pass over a meta tree, parameterized by its state.
#[derive(Debug)]
pub struct ValidationCycle<S: CycleState> {
    ticket: Ticket,
    errors: ErrorTree,
    _state: PhantomData<S>,
}

/// The two terminal outcomes of [`ValidationCycle::settle`].
#[derive(Debug)]
pub enum Settled {
    Valid(ValidationCycle<Valid>),
    Invalid(ValidationCycle<Invalid>),
}

impl Settled {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The error tree of an invalid outcome.
    pub fn errors(&self) -> Option<&ErrorTree> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(cycle) => Some(cycle.errors()),
        }
    }
}

impl<S: CycleState> ValidationCycle<S> {
    pub fn state_name(&self) -> &'static str {
        S::name()
    }

    pub fn is_terminal(&self) -> bool {
        S::is_terminal()
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    fn transition_to<T: CycleState>(self, errors: ErrorTree) -> ValidationCycle<T> {
        tracing::trace!(
            ticket = self.ticket.0,
            from = S::name(),
            to = T::name(),
            "validation cycle transition"
        );
        ValidationCycle {
            ticket: self.ticket,
            errors,
            _state: PhantomData,
        }
    }
}

impl ValidationCycle<Idle> {
    /// Create a cycle holding a fresh ticket from `sequencer`.
    pub fn new(sequencer: &CycleSequencer) -> Self {
        Self {
            ticket: sequencer.issue(),
            errors: ErrorTree::new(),
            _state: PhantomData,
        }
    }

    /// Mark every meta node as validating (IDLE → VALIDATING).
    pub fn begin(self, meta: &mut MetaNode) -> ValidationCycle<Validating> {
        meta.set_validating(true);
        self.transition_to(ErrorTree::new())
    }
}

impl ValidationCycle<Validating> {
    /// Land the validator's result (VALIDATING → VALID | INVALID).
    ///
    /// Clears `validating` and recomputes validity from `errors`. A superseded
    /// cycle returns an error and leaves the meta tree untouched.
    pub fn settle(
        self,
        meta: &mut MetaNode,
        errors: Option<ErrorTree>,
        sequencer: &CycleSequencer,
    ) -> Result<Settled, CycleError> {
        if !sequencer.is_current(self.ticket) {
            tracing::debug!(
                ticket = self.ticket.0,
                latest = sequencer.latest().0,
                "discarding superseded validation result"
            );
            return Err(CycleError::Superseded {
                ticket: self.ticket.0,
                latest: sequencer.latest().0,
            });
        }
        meta.set_validating(false);
        update_validation_state(meta, errors.as_ref());
        Ok(match errors {
            Some(tree) if !tree.is_empty() => Settled::Invalid(self.transition_to(tree)),
            _ => Settled::Valid(self.transition_to(ErrorTree::new())),
        })
    }
}

impl ValidationCycle<Invalid> {
    pub fn errors(&self) -> &ErrorTree {
        &self.errors
    }

    pub fn into_errors(self) -> ErrorTree {
        self.errors
    }
}
