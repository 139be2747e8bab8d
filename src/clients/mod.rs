// src/clients/mod.rs

pub mod generation;
pub mod identity;
