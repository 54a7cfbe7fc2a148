pub mod refinement;
pub mod sessions;
