pub mod feed;
pub mod item;
pub mod river;

pub use feed::Feed;
pub use item::FeedItem;
pub use river::River;
