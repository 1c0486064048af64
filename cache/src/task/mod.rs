//! Background work of a cache table: the sweeper thread that runs
//! expiration sweeps on a single, re-armable deadline.

pub(crate) mod sweeper;
