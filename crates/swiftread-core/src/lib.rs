//! Core reading engine: word segmentation and timing, document structuring,
//! position mapping between the RSVP and paginated views, and durable
//! reading sessions over tiered storage.

pub mod app;
pub mod content;
pub mod input;
pub mod position;
pub mod session;
pub mod settings;
pub mod storage;
pub mod text_policy;
pub mod timing;
