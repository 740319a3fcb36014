use zenroom::config::RoomConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RoomConfig::from_env();
    log::info!("Loading assets from {}", config.asset_root.display());

    zenroom::run(config)
}
