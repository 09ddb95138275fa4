use anyhow::Result;
use jotform_downloader::utils::logging;
use jotform_downloader::{App, Config, JotformClient};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = Config::from_env()?;

    let stats = App::<JotformClient>::initialize(config)?.run().await?;
    if stats.forms_ok() == 0 && stats.forms_failed > 0 {
        anyhow::bail!("all {} form(s) failed", stats.forms_failed);
    }

    Ok(())
}
