/*
 * Responsibility
 * - tokio runtime start-up
 * - app::run() call (no logic here)
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cas_sso_session::app::run().await
}
