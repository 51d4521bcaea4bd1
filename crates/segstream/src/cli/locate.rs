use anyhow::{Context, Result};
use clap::Args;
use segstream_locator::{QueryParams, StreamLocator, StreamTarget};

use crate::config::Settings;

#[derive(Args, Clone, Debug, Default)]
pub struct LocateArg {
    #[arg(default_value_t = 0, help = "Segment index to resolve")]
    pub index: u64,
}

impl LocateArg {
    pub fn run(self, settings: &Settings) -> Result<()> {
        let locator = build_locator(settings)?;
        let target = locator.target();

        println!("user      {}", target.user_hash);
        println!("playlist  {}", target.playlist_hash);
        println!("video     {}", target.video_hash);
        println!("vsid      {}", locator.template().vsid);
        println!("vpuid     {}", target.vpuid);
        println!("segment   {}", locator.resolve(self.index));
        Ok(())
    }
}

/// Parse the configured stream URL and start a session stamped one second ago.
pub fn build_locator(settings: &Settings) -> Result<StreamLocator> {
    let stream_url = settings
        .stream_url
        .as_deref()
        .context("No stream URL configured; set STREAM_URL or pass --url")?;
    let target = StreamTarget::parse(stream_url)
        .with_context(|| format!("Failed to parse stream URL {stream_url}"))?;

    let now = chrono::Utc::now();
    let query = QueryParams::new(
        &target.vsid,
        &settings.client_tag,
        &settings.build_tag,
        &target.vpuid,
        now.timestamp() - 1,
        now.timestamp_millis(),
    );
    Ok(StreamLocator::new(settings.endpoint.clone(), target, query))
}
