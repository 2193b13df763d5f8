pub mod alert;
pub mod device;
pub mod health;
pub mod notification;
pub mod user;

use actix_web::web;

/// Route tree, shared by the server binary and the integration tests.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/devices")
                    .service(device::register_device)
                    .service(device::report_status)
                    .service(device::list_device_status)
                    .service(device::get_device),
            )
            .service(
                web::scope("/users")
                    .service(user::register_user)
                    .service(user::register_push_token)
                    .service(user::get_user),
            )
            .service(web::scope("/notifications").service(notification::get_notifications))
            .service(web::scope("/alerts").service(alert::trigger_alert))
            .route("/health", web::get().to(health::health_check)),
    );
}
