//! Fixdesk Console - headless runner for the admin console stores.
//!
//! Usage:
//!   fixdesk-console login <username> <password>
//!   fixdesk-console logout
//!   fixdesk-console summary

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fixdesk_console::application::{
    BookingStore, CatalogStore, PlanTypeDirectory, RosterStore, SessionStore,
};
use fixdesk_console::infrastructure::{
    ConsoleConfig, FileStorage, HttpGateway, SystemClock, SystemRandom,
};
use fixdesk_console::ports::{ClockPort, RequestGateway};
use fixdesk_domain::selectors::ServiceFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fixdesk_console=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ConsoleConfig::from_env()?;
    tracing::debug!(api_url = %config.api_url, "Configuration loaded");

    let clock = Arc::new(SystemClock::new());
    let session = SessionStore::new(
        Arc::new(FileStorage::open(&config.storage_path)),
        clock.clone(),
        Arc::new(SystemRandom::new()),
    );
    let gateway: Arc<dyn RequestGateway> =
        Arc::new(HttpGateway::from_config(&config, Arc::new(session.credentials())));
    let session = if config.notify_logout {
        session.with_remote(gateway.clone())
    } else {
        session
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["login", username, password] => {
            let signed_in = session.login(username, password).await?;
            println!("Logged in as {} ({:?})", signed_in.user.username, signed_in.user.role);
        }
        ["logout"] => {
            session.logout().await;
            println!("Logged out");
        }
        ["summary"] => {
            session
                .restore()
                .await?
                .context("no stored session; run `login` first")?;
            summary(gateway, clock.as_ref()).await?;
        }
        _ => bail!("usage: fixdesk-console <login <username> <password> | logout | summary>"),
    }
    Ok(())
}

async fn summary(gateway: Arc<dyn RequestGateway>, clock: &dyn ClockPort) -> Result<()> {
    let catalog = CatalogStore::new(gateway.clone());
    let bookings = BookingStore::new(gateway.clone());
    let roster = RosterStore::new(gateway.clone());
    let plan_types = PlanTypeDirectory::new(gateway);

    let filter = ServiceFilter::default();
    futures_util::try_join!(
        catalog.list_services(&filter),
        catalog.list_categories(),
        bookings.list_bookings(),
        roster.list_engineers(),
    )?;
    let plan_type_count = match plan_types.plan_types().await {
        Ok(list) => list.len(),
        Err(e) => {
            tracing::warn!("Plan types unavailable: {}", e);
            0
        }
    };

    let catalog_stats = catalog.snapshot().stats(clock.now());
    let booking_state = bookings.snapshot();
    let booking_stats = booking_state.stats();
    let roster_state = roster.snapshot();

    println!(
        "Catalog: {} services, {} categories ({} new this week), {} plan types",
        catalog_stats.services,
        catalog_stats.categories,
        catalog_stats.recently_added_categories,
        plan_type_count
    );
    println!(
        "Bookings: {} of {} (upcoming {}, in progress {}, completed {}, cancelled {}), revenue {:.2}",
        booking_stats.total,
        booking_state.count,
        booking_stats.upcoming,
        booking_stats.in_progress,
        booking_stats.completed,
        booking_stats.cancelled,
        booking_stats.revenue
    );
    println!(
        "Engineers: {} total, {} available",
        roster_state.engineers.len(),
        roster_state.available.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fixdesk_console::ports::GatewayError;
    use fixdesk_shared::{Envelope, RequestBody};
    use serde_json::json;

    /// Answers every listing with an empty collection.
    struct EmptyBackend;

    #[async_trait]
    impl RequestGateway for EmptyBackend {
        async fn get(&self, _path: &str) -> Result<Envelope, GatewayError> {
            Ok(Envelope::ok(json!([])))
        }

        async fn post(&self, path: &str, _body: RequestBody) -> Result<Envelope, GatewayError> {
            Err(GatewayError::Transport(format!("unexpected POST {path}")))
        }

        async fn put(&self, path: &str, _body: RequestBody) -> Result<Envelope, GatewayError> {
            Err(GatewayError::Transport(format!("unexpected PUT {path}")))
        }

        async fn delete(&self, path: &str) -> Result<Envelope, GatewayError> {
            Err(GatewayError::Transport(format!("unexpected DELETE {path}")))
        }
    }

    #[tokio::test]
    async fn summary_loads_every_listing() {
        let result = summary(Arc::new(EmptyBackend), &SystemClock::new()).await;
        assert!(result.is_ok());
    }
}
