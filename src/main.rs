use spawn_network::provision::RunOutcome;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    log4rs::init_file("log4rs.yml", Default::default()).expect("Error initializing log4rs");
    dotenv::dotenv().ok();
    //
    log::info!("#Start main()");

    match spawn_network::run().await {
        RunOutcome::Completed(summary) => {
            log::info!(
                "#End main() created={} failed={}",
                summary.created.len(),
                summary.failures.len()
            );
            Ok(())
        }
        RunOutcome::Interrupted => {
            log::warn!("#End main() interrupted");
            std::process::exit(1);
        }
    }
}
