use std::net::TcpListener;

use actix_files::Files;
use actix_web::{
    dev::{HttpServiceFactory, Server},
    middleware::Logger,
    web::{self, Data},
    App, HttpServer,
};

use crate::{
    routes::{default_route, widget_route},
    services::{InsightFetcher, WidgetController},
};

pub type Controller = WidgetController<InsightFetcher>;

pub fn widget_scope(controller: Data<Controller>) -> impl HttpServiceFactory {
    web::scope("/widget")
        .app_data(controller)
        .service(widget_route::mount_widget)
        .service(widget_route::get_insight)
        .service(widget_route::dispatch_action)
        .service(widget_route::get_widget)
}

pub fn run(listener: TcpListener, controller: Data<Controller>) -> Result<Server, std::io::Error> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(Files::new("/static", "./templates/static").prefer_utf8(true))
            .service(default_route::default)
            .service(default_route::health_check)
            .service(widget_scope(controller.clone()))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
