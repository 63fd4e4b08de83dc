use stormdata::{decode_damage_series, StormData};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = StormData::new().await?;
    let events = client.storm_events().year(2021).await?;

    let damage = decode_damage_series(
        events.column("DAMAGE_PROPERTY")?.as_materialized_series(),
    )?;
    let total: f64 = damage.sum().unwrap_or(0.0);

    println!("reported property damage in 2021: ${total:.0}");
    Ok(())
}
