pub mod insight;
pub mod page;
pub mod score;
pub mod widget;
