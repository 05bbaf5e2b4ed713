//! Helpers for integration tests: throwaway SQLite databases with the schema applied.

pub mod prepare_env;
