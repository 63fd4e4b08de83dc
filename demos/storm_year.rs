use std::env;
use stormdata::{StormData, StormDataError};

#[tokio::main]
async fn main() -> Result<(), StormDataError> {
    configure_polars_display();
    let client = StormData::new().await?;

    let events = client.storm_events().year(2021).await?;

    println!("{} storm events recorded in 2021", events.height());
    println!("{}", events.head(Some(5)));
    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
}
