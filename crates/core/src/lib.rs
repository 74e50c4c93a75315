#![forbid(unsafe_code)]

pub mod entities;
pub mod model;
