use std::time::Duration;

use market::{HistorySource, YahooChartClient};

#[tokio::main]
async fn main() {
    let symbol = std::env::args().nth(1).unwrap_or_else(|| "PCTY".to_string()).to_uppercase();
    let client = match YahooChartClient::new(Duration::from_secs(30)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("failed to build client: {e}");
            std::process::exit(1);
        }
    };

    match client.fetch_history(&symbol, 5).await {
        Ok(bars) if bars.is_empty() => println!("{symbol}: no history"),
        Ok(bars) => {
            for bar in bars {
                println!("{symbol} {} close={:.2} volume={}", bar.ts.format("%Y-%m-%d"), bar.close, bar.volume);
            }
        }
        Err(e) => {
            eprintln!("{symbol}: {e}");
            std::process::exit(1);
        }
    }
}
