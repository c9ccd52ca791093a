use snowdash::client::DashboardUI;
use snowdash::config::AppConfig;
use snowdash::db::snowflake::SnowflakeConnector;
use snowdash::logging;
use snowdash::navigation::Navigator;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    logging::init(config.log_file.as_deref())?;

    let connector = SnowflakeConnector::new(config.connection)?;
    let mut tui = DashboardUI::new(Navigator::new(Box::new(connector)));
    tui.run().await?;

    Ok(())
}
