pub mod directory;
pub mod persistence;
pub mod web;
