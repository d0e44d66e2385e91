// This main function is the entry point when running `cargo run -p web-server`.
// It loads the settings and hands over to the crate's library.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = configuration::load_settings()?;
    let _log_guard = configuration::init_tracing(settings.log_dir.as_deref())?;
    web_server::run_server(&settings).await
}
