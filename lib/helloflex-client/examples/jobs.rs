use std::path::Path;

use helloflex_client::{HelloFlexClient, Token};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().pretty().init();

    let client_id = std::env::var("HELLOFLEX_CLIENT_ID").unwrap_or_else(|_| "client_id".into());
    let client_secret =
        std::env::var("HELLOFLEX_CLIENT_SECRET").unwrap_or_else(|_| "client_secret".into());
    let token_file = std::env::temp_dir().join("helloflex-token.json");

    // Create a client
    let mut client = HelloFlexClient::new(client_id, client_secret)?;

    // Store every new token
    let store = token_file.clone();
    client.set_update_token_callback(move |token: &Token| save_token(&store, token));

    // Load the token from storage
    if let Some(token) = load_token(&token_file) {
        client.set_token(token).await;
    }

    let jobs = client.get("/api/jobs").await?;
    println!("jobs: {jobs:#?}");

    // Total count header of the last request
    let total_count = client.get_total_count().await;
    println!("total count: {total_count:?}");

    let job_id = "jobs_id";
    let job = client.get(format!("/api/jobs/{job_id}")).await?;
    println!("job: {job:#?}");

    let public_jobs = client.get("/api/publicjobs").await?;
    println!("public jobs: {public_jobs:#?}");

    let agencies = client.get("/api/agencies").await?;
    println!("agencies: {agencies:#?}");

    let employers = client
        .get("/api/employers")
        .query(&json!({"skip": 0, "take": 10}))?
        .await?;
    println!("employers: {employers:#?}");

    let candidates = client.get("/api/candidates").await?;
    println!("candidates: {candidates:#?}");

    Ok(())
}

fn load_token(path: &Path) -> Option<Token> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn save_token(path: &Path, token: &Token) -> anyhow::Result<()> {
    let content = serde_json::to_string(token)?;
    std::fs::write(path, content)?;
    Ok(())
}
