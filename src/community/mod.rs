//! Support communities and the feed of their posts

mod feed;
mod membership;
mod types;

pub use feed::*;
pub use membership::*;
pub use types::*;
