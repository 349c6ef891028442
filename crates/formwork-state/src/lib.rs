//! # formwork-state — Meta-State Tree Engine
//!
//! Maintains a tree of bookkeeping flags (`dirty`, `valid`, `touched`,
//! `validating`) that mirrors a live value tree, and the typestate machine
//! that sequences one validation pass over it.
//!
//! ## Operations
//!
//! - **Create** (`meta.rs`): build the initial tree from a schema, with array
//!   `items` pre-populated by the same policy the default deriver uses.
//! - **Sync** (`sync.rs`): grow and truncate `items` to match live arrays.
//! - **Dirty** (`dirty.rs`): full bottom-up recomputation against the
//!   initial snapshot.
//! - **Validity** (`validity.rs`): reset, then apply an error tree.
//! - **Cycle** (`cycle.rs`): `Idle → Validating → {Valid | Invalid}` with
//!   last-started-wins sequencing.
//!
//! ## Design
//!
//! Every operation is a synchronous tree walk over trees passed in by the
//! caller. Nothing here holds shared state except the [`CycleSequencer`],
//! whose counter is atomic.

pub mod cycle;
pub mod dirty;
pub mod meta;
pub mod sync;
pub mod validity;

pub use cycle::{
    CycleError, CycleSequencer, CycleState, Idle, Invalid, Settled, Ticket, Valid, Validating,
    ValidationCycle,
};
pub use dirty::update_dirty_state;
pub use meta::{create_meta_state, MetaFlags, MetaNode};
pub use sync::sync_meta_state;
pub use validity::update_validation_state;
