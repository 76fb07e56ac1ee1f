use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::configuration::JwtSettings;
use crate::middleware::{AuthenticationMiddleware, RequestLogger};
use crate::routes::{health_check, login, logout, me, refresh, register};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let pool_data = web::Data::new(connection.clone());
    let jwt_config_data = web::Data::new(jwt_config.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Request verification runs on every route; requests without a
            // usable credential pass through unauthenticated and are denied
            // (or not) by each handler's extractor.
            .wrap(AuthenticationMiddleware::new(
                jwt_config.clone(),
                connection.clone(),
            ))
            .wrap(RequestLogger)
            // Shared state
            .app_data(pool_data.clone())
            .app_data(jwt_config_data.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1/authentication")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/logout", web::post().to(logout)),
            )
            // Routes requiring an established identity
            .service(web::scope("/api/v1/accounts").route("/me", web::get().to(me)))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
