use std::sync::Arc;

use nutrition_log_client::{
    MealSession, MealTime, SearchOutcome, config::Config, http_client::ReqwestNutritionClient,
    utils::parse_grams,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: expects NUTRITION_LOG_TOKEN in env
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let query = std::env::args().nth(1).unwrap_or_else(|| "apple".into());
    let grams = parse_grams(&std::env::args().nth(2).unwrap_or_else(|| "150".into()))?;

    let client = ReqwestNutritionClient::from_config(&cfg);
    let session = MealSession::load(Arc::new(client), cfg.request_timeout).await?;

    let SearchOutcome::Applied(suggestions) = session.search(&query).await? else {
        return Ok(());
    };
    let Some(first) = suggestions.first() else {
        println!("no foods match {query:?}");
        return Ok(());
    };
    let profile = session.select(first.fdc_id).await?;
    let entry = session.add_selected(grams).await?;
    println!(
        "{} x {} g = {:.1} kcal",
        profile.name(),
        entry.grams,
        entry.calories
    );

    session.set_meal_time(MealTime::Snack).await?;
    let receipt = session.commit().await?;
    println!(
        "{} ({:.0} kcal left today)",
        receipt.message, receipt.view.remaining
    );
    Ok(())
}
