pub mod error;
pub mod extract;
pub mod normalize;
pub mod orchestrate;
pub mod settings;
pub mod verify;
pub mod write;

#[cfg(test)]
pub(crate) mod testing;
