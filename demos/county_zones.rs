use stormdata::{StormData, StormDataError};

#[tokio::main]
async fn main() -> Result<(), StormDataError> {
    let client = StormData::new().await?;

    let zones = client.zone_county().mapping().await?;

    println!("{} county-zone rows", zones.height());
    println!("{}", zones.head(Some(10)));
    Ok(())
}
