use artefact_core::Config;

// mimalloc keeps fragmentation low for the buffered file transfers, notably on musl images.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = artefact_api::setup::initialize_app(config.clone()).await?;

    artefact_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
