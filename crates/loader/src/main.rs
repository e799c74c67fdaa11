#[tokio::main]
async fn main() -> anyhow::Result<()> {
    productcatalog_observability::init();

    if let Err(err) = productcatalog_loader::run().await {
        tracing::error!(error = ?err, "catalog loader failed");
        return Err(err);
    }
    Ok(())
}
