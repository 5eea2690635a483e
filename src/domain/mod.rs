pub mod listener;
pub mod subscriber;
pub mod topic;

pub use listener::Listener;
pub use subscriber::Subscriber;
pub use topic::{FetchResult, Topic};
