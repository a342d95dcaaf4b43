//! Use-case services layered over the store contract.

pub mod note_library;
