pub mod feed;

#[allow(unused_imports)]
pub use feed::{StubFeed, record};
