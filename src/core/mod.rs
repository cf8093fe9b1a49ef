//! Pure data model and algorithms: actions, the pending queue, the visible
//! content ledger, and markup flattening.

pub mod action;
pub mod flatten;
pub mod ledger;
pub mod queue;
pub mod text;
