pub mod enrichment_client;
pub mod insight_fetcher;
pub mod storage;
pub mod widget_controller;

pub use enrichment_client::*;
pub use insight_fetcher::*;
pub use storage::*;
pub use widget_controller::*;
