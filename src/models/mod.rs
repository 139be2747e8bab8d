// src/models/mod.rs

pub mod attempt;
pub mod message;
pub mod question;
pub mod user;
