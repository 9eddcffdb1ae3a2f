use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;
use vend_core::{SaleConfig, SaleEngine, SaleParams, now_unix_secs};
use vend_store::Store;

#[derive(Parser)]
#[command(name = "vend", about = "Self-adjusting sale engine CLI")]
struct Cli {
    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One-time sale setup from a TOML parameter file
    Init {
        /// Parameter file path
        #[arg(long)]
        config: PathBuf,
    },

    /// Credit purchase-asset balance to an account
    Fund {
        account: Uuid,
        /// Amount in purchase-asset native units
        amount: u128,
    },

    /// Buy up to QUANTITY units of the sale asset
    Buy {
        /// Requested quantity, sale-asset native units
        quantity: u128,

        /// Native currency attached to the call
        #[arg(long, default_value_t = 0)]
        payment: u128,

        /// Buyer account (random if omitted)
        #[arg(long)]
        buyer: Option<Uuid>,
    },

    /// Materialize the period rollover without purchasing
    Checkpoint,

    /// Show the current unit price
    Price,

    /// Show the quantity still available this period
    Available,

    /// Show configuration and period accounting state
    Status,

    /// List recent purchases
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Export a snapshot to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Initialise from a snapshot JSON file
    Import {
        /// Input file path
        path: PathBuf,
    },
}

fn open_store(cli: &Cli) -> Result<Store> {
    let base = cli
        .data_dir
        .clone()
        .or_else(|| std::env::var("VEND_DATA_DIR").ok().map(PathBuf::from));
    let path = vend_store::db_path(base.as_deref());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Store::open(&path).with_context(|| format!("failed to open store at {}", path.display()))
}

fn load_engine(store: &Store) -> Result<SaleEngine> {
    store
        .load_engine()
        .context("failed to load engine (is the sale initialised?)")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Init { config } => cmd_init(&cli, config),
        Commands::Fund { account, amount } => cmd_fund(&cli, *account, *amount),
        Commands::Buy {
            quantity,
            payment,
            buyer,
        } => cmd_buy(&cli, *quantity, *payment, *buyer),
        Commands::Checkpoint => cmd_checkpoint(&cli),
        Commands::Price => cmd_price(&cli),
        Commands::Available => cmd_available(&cli),
        Commands::Status => cmd_status(&cli),
        Commands::History { limit } => cmd_history(&cli, *limit),
        Commands::Export { path } => cmd_export(&cli, path),
        Commands::Import { path } => cmd_import(&cli, path),
    }
}

fn cmd_init(cli: &Cli, config_path: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let params: SaleParams = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    let config = SaleConfig::new(params).context("invalid sale parameters")?;

    let store = open_store(cli)?;
    let engine = store.init_sale(&config, now_unix_secs())?;

    println!(
        "sale initialised: {} purchase asset, {}s periods, window {}",
        engine.config().purchase_asset(),
        engine.period_secs(),
        engine.window()
    );
    Ok(())
}

fn cmd_fund(cli: &Cli, account: Uuid, amount: u128) -> Result<()> {
    let store = open_store(cli)?;
    let balance = store.fund_account(account, amount)?;
    println!("funded {account}: purchase balance now {balance}");
    Ok(())
}

fn cmd_buy(cli: &Cli, quantity: u128, payment: u128, buyer: Option<Uuid>) -> Result<()> {
    let store = open_store(cli)?;
    let mut engine = load_engine(&store)?;
    let buyer = buyer.unwrap_or_else(Uuid::new_v4);

    let purchase = store.execute_purchase(&mut engine, buyer, quantity, payment, now_unix_secs())?;

    println!("buyer:   {}", purchase.buyer);
    println!("filled:  {}", purchase.quantity);
    println!("price:   {}", purchase.unit_price);
    println!("cost:    {}", purchase.cost);
    println!("refund:  {}", purchase.refund);
    Ok(())
}

fn cmd_checkpoint(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let mut engine = load_engine(&store)?;

    let elapsed = engine.update_period(now_unix_secs())?;
    store.save_state(engine.state())?;

    println!(
        "checkpoint: {elapsed} period(s) closed, now in period {}",
        engine.state().period_index
    );
    Ok(())
}

fn cmd_price(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let engine = load_engine(&store)?;
    println!("{}", engine.current_price(now_unix_secs())?);
    Ok(())
}

fn cmd_available(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let engine = load_engine(&store)?;
    println!("{}", engine.num_available(now_unix_secs())?);
    Ok(())
}

fn cmd_status(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let engine = load_engine(&store)?;
    let now = now_unix_secs();

    println!("asset:      {}", engine.config().purchase_asset());
    println!("period:     {}s", engine.period_secs());
    println!("window:     {}", engine.window());
    println!("target:     {}", engine.target_per_period());
    println!("max:        {}", engine.max_per_period());
    println!("price:      {}", engine.current_price(now)?);
    println!("available:  {}", engine.num_available(now)?);
    println!("period #:   {}", engine.state().period_index);

    if cli.verbose {
        eprintln!(
            "--- state: start={}, ema={}, sold={} ---",
            engine.state().period_start,
            engine.state().ema,
            engine.state().sold_this_period
        );
    }
    Ok(())
}

fn cmd_history(cli: &Cli, limit: usize) -> Result<()> {
    let store = open_store(cli)?;
    let records = store.purchases(limit)?;

    if records.is_empty() {
        println!("(no purchases)");
        return Ok(());
    }

    for r in records {
        println!(
            "#{} period {} buyer {} qty {} price {} cost {} refund {}",
            r.id, r.period_index, r.buyer, r.quantity, r.unit_price, r.cost, r.refund
        );
    }
    Ok(())
}

fn cmd_export(cli: &Cli, path: &PathBuf) -> Result<()> {
    let store = open_store(cli)?;
    store.export_json_file(path, now_unix_secs())?;
    println!("exported snapshot to {}", path.display());
    Ok(())
}

fn cmd_import(cli: &Cli, path: &PathBuf) -> Result<()> {
    let store = open_store(cli)?;
    store.import_json_file(path, now_unix_secs())?;
    println!("imported snapshot from {}", path.display());
    Ok(())
}
