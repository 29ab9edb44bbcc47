// Core decoding engine: byte sources, layouts, record iteration, policies.
pub mod decoder;
pub mod error;
pub mod layout;
pub mod narc;
pub mod policy;
pub mod row;
pub mod source;
