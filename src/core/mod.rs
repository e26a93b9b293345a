// Core types and primitives shared by storage, services and the HTTP layer

pub mod id_generator;
pub mod strong_types;

pub use id_generator::IdGenerator;
pub use strong_types::{ListingId, ReviewId, UserId};
