//! Post mutation engine.
//!
//! Creates, updates, and destroys posts together with their file attachments
//! as all-or-nothing units: the relational rows commit atomically, and blobs
//! written along the way are cleaned up whenever the unit fails.

mod error;
mod service;
mod types;

pub use error::PostError;
pub use service::{PostRepository, PostService};
pub use types::{
    Attachment, AttachmentDownload, CreatePostInput, NewAttachmentRecord, NewPostRecord, NewUpload,
    Post, PostWithAttachments, UpdateOutcome, UpdatePostInput,
};
