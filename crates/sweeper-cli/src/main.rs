use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sweeper_core::app::{AppBuilder, CleanupConfig, CleanupOrchestrator, CleanupScheduler};
use sweeper_core::domain::{Cart, Order, OrderStatus};
use sweeper_core::impls::{InMemoryCartRepository, InMemoryInventory, InMemoryOrderRepository};
use sweeper_core::ports::{Clock, IdGenerator, SystemClock, UlidGenerator};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// デモ用の in-memory ストア一式
struct DemoStores {
    inventory: Arc<InMemoryInventory>,
    orders: Arc<InMemoryOrderRepository>,
    carts: Arc<InMemoryCartRepository>,
}

/// 期限切れと有効なデータを混ぜて投入する
async fn seed(clock: Arc<dyn Clock>) -> Result<DemoStores, BoxError> {
    let ids = UlidGenerator::new(clock.clone());
    let now = clock.now();
    let stores = DemoStores {
        inventory: Arc::new(InMemoryInventory::new(clock.clone())),
        orders: Arc::new(InMemoryOrderRepository::new()),
        carts: Arc::new(InMemoryCartRepository::new()),
    };

    let product = ids.generate_product_id();
    stores.inventory.add_stock(product, 50).await;

    // (A) 支払いを待たずに放置された注文（引当あり、期限切れ）
    for _ in 0..3 {
        let order = Order::new(
            ids.generate_order_id(),
            now - Duration::hours(1),
            now - Duration::minutes(30),
        );
        stores
            .inventory
            .reserve(order.id, product, 2, now - Duration::minutes(5))
            .await?;
        stores.orders.insert(order).await;
    }

    // (B) confirmed だが未払いのまま期限切れの注文
    let mut confirmed = Order::new(
        ids.generate_order_id(),
        now - Duration::hours(2),
        now - Duration::minutes(1),
    );
    confirmed.status = OrderStatus::Confirmed;
    stores
        .inventory
        .reserve(confirmed.id, product, 1, now + Duration::minutes(10))
        .await?;
    stores.orders.insert(confirmed).await;

    // (C) まだ支払い期限内の注文
    let live = Order::new(ids.generate_order_id(), now, now + Duration::minutes(30));
    stores
        .inventory
        .reserve(live.id, product, 1, now + Duration::minutes(30))
        .await?;
    stores.orders.insert(live).await;

    // (D) 2 日放置のカートと、さっき触ったカート
    let mut idle = Cart::new(ids.generate_cart_id(), now - Duration::days(3));
    idle.last_activity_at = now - Duration::days(2);
    stores.carts.insert(idle).await;
    stores
        .carts
        .insert(Cart::new(ids.generate_cart_id(), now))
        .await;

    Ok(stores)
}

async fn print_stats(label: &str, orchestrator: &CleanupOrchestrator) -> Result<(), BoxError> {
    let stats = orchestrator.cleanup_stats().await?;
    println!("{label}: {}", serde_json::to_string_pretty(&stats.as_map())?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // (1) 設定: 引数の JSON ファイル（任意）→ SWEEPER_* 環境変数
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = CleanupConfig::load(config_path.as_deref())?;
    info!(?config, "configuration loaded");

    // (2) ストアを用意してオーケストレータを組み立てる
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let stores = seed(clock.clone()).await?;
    let orchestrator = Arc::new(
        AppBuilder::new()
            .with_config(config.clone())
            .with_clock(clock)
            .with_reservations(stores.inventory.clone())
            .with_release(stores.inventory.clone())
            .with_orders(stores.orders.clone())
            .with_carts(stores.carts.clone())
            .build()?,
    );

    print_stats("stats before first pass", &orchestrator).await?;

    // (3) scheduler を起動し、Ctrl-C を待つ
    let scheduler = CleanupScheduler::spawn(orchestrator.clone(), config.interval());
    info!("sweeper running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    // (4) graceful shutdown: 実行中のパスは最後まで走らせる
    info!("shutdown requested");
    let status = scheduler.shutdown_and_join().await;
    info!(
        passes = status.passes,
        failed_passes = status.failed_passes,
        "scheduler stopped"
    );

    print_stats("stats after shutdown", &orchestrator).await?;
    Ok(())
}
