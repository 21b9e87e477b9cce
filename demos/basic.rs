use erlc_http::{ErlcClient, ErlcError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = ErlcClient::from_env()?;

    let status = client.server().await?;
    println!(
        "{}: {}/{} players",
        status.name, status.current_players, status.max_players
    );

    for player in client.players().await? {
        println!("{} ({:?}) on {:?}", player.name(), player.user_id(), player.team);
    }

    match client.execute_command(":h Hello from erlc-http").await {
        Ok(ack) => println!("command sent: {:?}", ack.message),
        Err(ErlcError::RateLimited { retry_after, .. }) => {
            println!("rate limited, retry after {retry_after:?}")
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
