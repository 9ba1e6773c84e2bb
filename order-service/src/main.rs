use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use order_service::*;

#[derive(Parser)]
#[command(name = "order-service")]
struct Args {
    #[arg(long, env = "PAYMENT_TIMEOUT_SECS", default_value_t = 30)]
    payment_timeout_secs: u64,

    #[arg(long, env = "SETTLE_AFTER_SECS", default_value_t = 5)]
    settle_after_secs: u64,

    #[arg(long, env = "SETTLEMENT_SUCCESS_RATE", default_value_t = 0.8)]
    success_rate: f64,

    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 1)]
    sweep_interval_secs: u64,

    #[arg(long, env = "CATALOG_PATH")]
    catalog: Option<PathBuf>,

    #[arg(long, default_value_t = 3)]
    demo_orders: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let catalog = match &args.catalog {
        Some(path) => Catalog::from_path(path)?,
        None => {
            info!("No catalog given, using the built-in demo catalog");
            Catalog::demo()
        }
    };
    let app = BookingApp::new(
        BookingConfig {
            payment_timeout_secs: args.payment_timeout_secs,
        },
        &catalog,
    )?;

    place_demo_orders(&app, &catalog, args.demo_orders);

    let worker = app.settlement_worker(SettlementConfig::new(
        Duration::from_secs(args.settle_after_secs),
        args.success_rate,
        Duration::from_secs(args.sweep_interval_secs),
    ));
    let settlement = tokio::spawn(async move {
        worker.run().await;
    });
    info!("Settlement worker started, press Ctrl-C to stop");

    tokio::select! {
        _ = settlement => warn!("Settlement worker stopped"),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down");
        }
    }

    for user_id in 1..=args.demo_orders as i32 {
        for payment in app.payments.payments_by_user(user_id)? {
            info!(
                "User {} {} {:?}: {:?}",
                user_id, payment.order_number, payment.payment_type, payment.status
            );
        }
    }
    Ok(())
}

fn place_demo_orders(app: &BookingApp, catalog: &Catalog, count: usize) {
    let today = Utc::now().date_naive();

    for i in 0..count {
        let user_id = i as i32 + 1;

        if let Some(room) = catalog.rooms.get(i % catalog.rooms.len().max(1)) {
            let request = BookHotelRequest {
                user_id,
                hotel_id: room.hotel_id,
                room_id: room.id,
                check_in: today + ChronoDuration::days(i as i64),
                check_out: today + ChronoDuration::days(i as i64 + 2),
            };
            match app.room_orders.create_order(&request) {
                Ok(order) => info!("Demo room order {:?} is {:?}", order.header.order_number, order.header.status),
                Err(e) => warn!("Demo room order failed: {}", e),
            }
        }

        let Some(seat) = catalog.seats.get(i % catalog.seats.len().max(1)) else {
            continue;
        };
        let ticket = match app.seat_orders.create_order(&GetTicketRequest {
            user_id,
            train_seat_id: seat.id,
        }) {
            Ok(order) => {
                info!("Demo ticket {:?} seat {:?}", order.header.order_number, order.seat_number);
                order
            }
            Err(e) => {
                warn!("Demo ticket failed: {}", e);
                continue;
            }
        };

        if let Some(meal) = catalog.meals.iter().find(|m| m.enabled && m.train_id == ticket.train_id) {
            let request = TrainMealOrderRequest {
                user_id,
                seat_order_id: ticket.header.id,
                meal_id: meal.id,
                quantity: 2,
            };
            match app.meal_orders.create_order(&request) {
                Ok(order) => info!("Demo meal order {:?} is {:?}", order.header.order_number, order.header.status),
                Err(e) => warn!("Demo meal order failed: {}", e),
            }
        }
    }
}
