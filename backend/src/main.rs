use log::error;
use videoscout::config::{init_logger, load_environment, SETTINGS};

#[rocket::main]
async fn main() {
    load_environment();
    init_logger();

    let rocket = match videoscout::build_rocket(SETTINGS.clone()) {
        Ok(rocket) => rocket,
        Err(e) => {
            error!("Failed to configure server: {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = rocket.launch().await {
        error!("Server stopped with error: {e}");
        std::process::exit(1);
    }
}
