//! Business logic services, kept free of HTTP concerns.

pub mod people;
pub mod persistence;
pub mod relationship;
pub mod session;
