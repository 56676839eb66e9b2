//! Checkout Demo
//!
//! Replays a fixture cart script, places the order and prints its summary.
//!
//! Use `-f` to load a fixture set by name
//! Use `--log-format json` for structured logs

use std::io;

use anyhow::Result;
use clap::Parser;
use storefront::{
    fixtures::Fixture,
    orders::{Order, OrderId, OrderStatus},
    utils::{DemoArgs, LogFormat},
};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Registry,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

/// Checkout Demo
pub fn main() -> Result<()> {
    let args = DemoArgs::parse();

    init_logging(&args)?;

    let fixture = Fixture::from_set_in(&args.fixtures_dir, &args.fixture)?;
    let cart = fixture.cart()?;

    info!(
        fixture = %args.fixture,
        lines = cart.len(),
        units = cart.total_quantity(),
        subtotal = %cart.subtotal()?,
        "cart ready"
    );

    let mut order = Order::place(
        OrderId::new(args.order_id.as_str()),
        &cart,
        fixture.catalog(),
        &fixture.discount()?,
        &fixture.shipping()?,
        fixture.checkout()?.clone(),
    )?;

    order.transition(OrderStatus::Paid)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    order.write_summary(&mut handle)?;

    Ok(())
}

fn init_logging(args: &DemoArgs) -> Result<()> {
    match args.log_format {
        LogFormat::Compact => init_with_layer(
            args,
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(io::stderr),
        ),
        LogFormat::Json => init_with_layer(
            args,
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(io::stderr),
        ),
    }
}

fn init_with_layer<L>(args: &DemoArgs, fmt_layer: L) -> Result<()>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_err| EnvFilter::new(args.log_level.as_str()));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()?;

    Ok(())
}
