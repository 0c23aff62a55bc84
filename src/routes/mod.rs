pub mod default_route;
pub mod widget_route;
