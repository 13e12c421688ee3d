pub mod obj;
pub mod ply;
pub mod png;
