//! Repository implementations for the core engine traits.
//!
//! Repositories own transaction boundaries: each mutating method commits
//! every row change or none of them, hiding the `SeaORM` details from the
//! engines in the core crate.

pub mod post;
pub mod reaction;

pub use post::PostRepository;
pub use reaction::ReactionRepository;
