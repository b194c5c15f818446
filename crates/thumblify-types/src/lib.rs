//! Wire types shared by the Thumblify API and its clients.

pub mod api;
pub mod catalog;
pub mod models;
