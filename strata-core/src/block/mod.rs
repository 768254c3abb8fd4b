//! Block structure for the ledger.
//!
//! A block is stored as three independently encoded artifacts: the header
//! (which alone determines the block hash), the body (ordered sealed
//! envelopes, committed to by the header's tx root) and the footer (commit
//! time and endorsements).

#[allow(clippy::module_inception)]
mod block;
mod body;
mod footer;
mod header;

pub use block::Block;
pub use body::BlockBody;
pub use footer::{BlockFooter, Endorsement};
pub use header::BlockHeader;
