//! `SqliteDatabase` is a concrete implementation of an order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.

pub mod db;
mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;
