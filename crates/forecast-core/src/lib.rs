pub mod error;
pub mod news;
pub mod traits;
pub mod types;

pub use error::*;
pub use news::{sample_headlines, NewsItem};
pub use traits::*;
pub use types::*;
