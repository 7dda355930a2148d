//! `SeaORM` entity definitions.

pub mod post_attachments;
pub mod posts;
pub mod reactions;
pub mod users;
