use std::path::PathBuf;

use railpass_server::browser::{
    BrowserDriver, FixtureDriver, SharedBrowser, WebDriverClient, WebDriverConfig,
};
use railpass_server::cache::SearchCache;
use railpass_server::config::ServerConfig;
use railpass_server::session::{SearchSession, SearchWorker};
use railpass_server::stations::StationTable;
use railpass_server::web::{AppState, create_router};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type Driver = Box<dyn BrowserDriver>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env().expect("Invalid configuration");

    let stations = match StationTable::load(&config.stations_file) {
        Ok(stations) => stations,
        Err(e) => {
            warn!(
                path = %config.stations_file.display(),
                error = %e,
                "station directory unavailable; only bare station codes will be accepted"
            );
            StationTable::default()
        }
    };

    // Searches report NotReady until the browser is installed
    let browser: SharedBrowser<Driver> = SharedBrowser::empty();
    tokio::spawn(start_browser(
        browser.clone(),
        config.webdriver.clone(),
        config.fixture.clone(),
    ));

    let session = SearchSession::new(browser.clone(), config.session.clone());
    let searcher = SearchWorker::spawn(session, Some(SearchCache::new(&config.cache)));

    let state = AppState::new(searcher, stations, config.itinerary_file.clone());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .expect("Failed to bind listener");
    info!(addr = %config.bind, "Rail pass planner listening");
    info!("API Endpoints:");
    info!("  POST /search                          - Run a search");
    info!("  GET  /itinerary                       - Saved segments");
    info!("  POST /itinerary/segments              - Save a search result");
    info!("  GET  /itinerary/export                - Segments as CSV");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "server error");
    }

    if let Some(mut driver) = browser.take().await {
        if let Err(e) = driver.close().await {
            warn!(error = %e, "failed to close browser");
        }
    }
    info!("shut down");
}

async fn start_browser(
    browser: SharedBrowser<Driver>,
    webdriver: WebDriverConfig,
    fixture: Option<PathBuf>,
) {
    let driver: Driver = match fixture {
        Some(path) => match FixtureDriver::from_json_file(&path) {
            Ok(driver) => {
                info!(path = %path.display(), "serving searches from fixture");
                Box::new(driver)
            }
            Err(e) => {
                error!(error = %e, "failed to load fixture; searches are unavailable");
                return;
            }
        },
        None => match WebDriverClient::connect(webdriver).await {
            Ok(driver) => Box::new(driver),
            Err(e) => {
                error!(error = %e, "failed to start browser; searches are unavailable");
                return;
            }
        },
    };
    browser.install(driver).await;
    info!("browser ready");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
