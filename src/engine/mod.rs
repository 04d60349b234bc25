//! Engine modules: what each step asks the operating system to do.
//!
//! The engine layer sits between configuration (fixed paths, package lists) and
//! execution (the command runner). It builds exact argument vectors and never
//! runs anything itself.

pub mod commands;
