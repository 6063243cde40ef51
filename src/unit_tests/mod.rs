// Crate-level integration tests, compiled only under test via the
// #[cfg(test)] module declaration in lib.rs.
