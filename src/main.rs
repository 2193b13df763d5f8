use actix_cors::Cors;
use actix_web::web::Data;
use actix_web::{middleware::Logger, App, HttpServer};
use dotenv::dotenv;

use umbraguard_api::config::Config;
use umbraguard_api::handlers;
use umbraguard_api::services::{alert::AlertService, database::DatabaseService, fcm::FcmClient};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env().expect("Failed to load configuration");

    // Singletons are built here and injected; the components never reach
    // for process-global state.
    let database_service = DatabaseService::new();
    let fcm_client = FcmClient::new(config.push.clone());
    let alert_service = AlertService::new(database_service.clone(), fcm_client, config.alert.clone());

    let bind_address = format!("0.0.0.0:{}", config.port);

    println!("🚀 Starting UmbraGuard alert server on {}", bind_address);
    println!("API Documentation:");
    println!("  POST /api/v1/users/register - Register a new user");
    println!("  GET  /api/v1/users/{{user_id}} - Get user details");
    println!("  PUT  /api/v1/users/{{user_id}}/push-token - Register a push token");
    println!("  POST /api/v1/devices/register - Pair a device with its owner");
    println!("  POST /api/v1/devices/report - Device connectivity report");
    println!("  GET  /api/v1/devices/status - All device states");
    println!("  GET  /api/v1/devices/{{device_id}} - One device state");
    println!("  GET  /api/v1/notifications/user/{{user_id}} - Notification history");
    println!("  POST /api/v1/alerts - Signed alert ingress");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(Data::new(database_service.clone()))
            .app_data(Data::new(alert_service.clone()))
            .configure(handlers::configure_api)
    })
    .bind(&bind_address)?
    .run()
    .await
}
