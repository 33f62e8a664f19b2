//! CLI command implementations
//!
//! Bus commands take the opened programmer as a `&mut dyn SpiInterface`
//! so they run unchanged on real cables and on the dummy engine.

mod list;
mod spi;

pub use list::list;
pub use spi::{run_rdid, run_status, run_wait, run_xfer};
