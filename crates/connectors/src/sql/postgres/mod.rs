pub mod client;
pub mod params;
pub mod row;

pub use client::PgTarget;
