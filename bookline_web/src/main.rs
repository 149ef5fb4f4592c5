use std::error::Error;
use std::net::SocketAddr;

use bookline::infrastructure::sqlite::SqliteReservationRepository;
use bookline::infrastructure::web::{router, AppState};
use bookline::BooklineConfig;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() {
    match BooklineConfig::load() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_max_level(Level::from(&config.logger.level))
                .init();
            if let Err(error) = serve(&config).await {
                error!("application error: {}", error);
            }
        }
        Err(error) => {
            tracing_subscriber::fmt::init();
            error!("application error: {}", error)
        }
    }
}

async fn serve(config: &BooklineConfig) -> Result<(), Box<dyn Error>> {
    let repository = SqliteReservationRepository::connect(&config.database.url).await?;
    repository.init_schema().await?;
    let app = router(AppState::new(repository));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("listening on {}", addr);
    axum_server::bind(addr).serve(app.into_make_service()).await?;
    Ok(())
}
