//! Journal module containing the chart of accounts, the entry posting
//! engine, and the auto-journal adapters

pub mod account;
pub mod auto;
pub mod engine;

pub use account::*;
pub use auto::*;
pub use engine::*;
