//! Address translation between the legacy and versioned addressing schemes.

mod location_mapper;

pub use location_mapper::LocationMapper;
