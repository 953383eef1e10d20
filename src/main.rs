// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io;
use std::path::PathBuf;

// Use library instead of local modules
use home_price_estimator::{
    clear_saved_estimates, export_csv, init_tracing, list_saved_estimates, open_store,
    save_estimate, validate_form, Config, FormInput, MockEstimator, OfflineBackend, Predictor,
    RngSource, SavedEstimate, ShareCard, CLI_LOG_FILTER, SHARE_TITLE, TUI_LOG_FILTER,
};

#[derive(Parser)]
#[command(name = "home-price")]
#[command(about = "Bangalore home price estimates with a local fallback formula")]
#[command(version)]
struct Cli {
    /// SQLite file for saved estimates (overrides HOME_PRICE_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Rate table file, .json or .csv (overrides HOME_PRICE_RATES)
    #[arg(long, global = true)]
    rates: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Estimate a price for one home
    Estimate(EstimateArgs),

    /// List known locations
    Locations,

    /// Show saved estimates, newest first
    Saved,

    /// Write saved estimates as CSV ("-" for stdout)
    Export {
        #[arg(default_value = "-")]
        output: String,
    },

    /// Delete all saved estimates
    Clear,

    /// Interactive form (default)
    Tui,
}

#[derive(Args)]
struct EstimateArgs {
    #[arg(short, long)]
    location: String,

    /// Built-up area in sqft (300 - 10,000)
    #[arg(short, long)]
    sqft: f64,

    #[arg(long, default_value_t = 2)]
    bhk: u32,

    #[arg(long, default_value_t = 2)]
    bath: u32,

    /// Fix the jitter draw for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Keep this estimate in the saved list
    #[arg(long)]
    save: bool,

    /// Print share text for this estimate
    #[arg(long)]
    share: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Command::Tui);
    init_tracing(match command {
        Command::Tui => TUI_LOG_FILTER,
        _ => CLI_LOG_FILTER,
    });

    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(rates) = cli.rates {
        config.rates_path = Some(rates);
    }

    match command {
        Command::Estimate(args) => run_estimate(&config, args)?,
        Command::Locations => run_locations(&config)?,
        Command::Saved => run_saved(&config)?,
        Command::Export { output } => run_export(&config, &output)?,
        Command::Clear => run_clear(&config)?,
        Command::Tui => run_ui_mode(&config)?,
    }

    Ok(())
}

fn build_predictor(config: &Config) -> Result<Predictor<OfflineBackend>> {
    let table = config.load_rate_table()?;
    Ok(Predictor::new(OfflineBackend, MockEstimator::new(table)))
}

fn run_estimate(config: &Config, args: EstimateArgs) -> Result<()> {
    let input = FormInput {
        location: args.location,
        total_sqft: Some(args.sqft),
        bhk: args.bhk,
        bath: args.bath,
    };

    let query = match validate_form(&input) {
        Ok(query) => query,
        Err(errors) => {
            for err in &errors {
                eprintln!("❌ {}", err);
            }
            bail!("{} invalid field(s)", errors.len());
        }
    };

    let predictor = build_predictor(config)?;
    let prediction = match args.seed {
        Some(seed) => predictor.predict(&query, &mut RngSource::seeded(seed)),
        None => predictor.predict(&query, &mut RngSource::thread()),
    };

    if prediction.is_fallback() {
        println!("⚠️  Server is not responding. Showing mock estimate for demonstration.");
    }

    let price = prediction.display_price();

    println!("\n🏠 Estimated Price: {}", price);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Location:  {}", query.location);
    println!("   Size:      {} sq. ft.", query.area_sqft);
    println!("   BHK:       {}", query.bedrooms);
    println!("   Bathrooms: {}", query.bathrooms);

    if args.share {
        let card = ShareCard::new(&query.location, query.area_sqft, query.bedrooms, query.bathrooms, &price);
        println!("\n📤 {}\n", SHARE_TITLE);
        println!("{}", card.share_text());
    }

    if args.save {
        let conn = open_store(&config.db_path)?;
        let estimate = SavedEstimate::new(price, query.location, query.area_sqft, query.bedrooms, query.bathrooms);
        save_estimate(&conn, &estimate)?;
        println!("\n💾 Saved! ({})", config.db_path.display());
    }

    Ok(())
}

fn run_locations(config: &Config) -> Result<()> {
    let predictor = build_predictor(config)?;
    let locations = predictor.locations();

    if !locations.from_backend {
        println!("⚠️  Could not load locations from server. Using sample data.\n");
    }

    let table = predictor.estimator().table();
    for name in &locations.names {
        println!("  {:<20} {:>8.0} / sqft", name, table.rate_for(name));
    }

    Ok(())
}

fn run_saved(config: &Config) -> Result<()> {
    let conn = open_store(&config.db_path)?;
    let saved = list_saved_estimates(&conn)?;

    if saved.is_empty() {
        println!("No saved estimates yet. Use: home-price estimate ... --save");
        return Ok(());
    }

    println!("💾 Saved estimates ({})", saved.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for estimate in &saved {
        println!(
            "  {}  {:<18} {:>7} sqft  {} BHK  {} bath  {}",
            estimate.saved_at.format("%Y-%m-%d %H:%M"),
            estimate.location,
            estimate.sqft,
            estimate.bhk,
            estimate.bath,
            estimate.price
        );
    }

    Ok(())
}

fn run_export(config: &Config, output: &str) -> Result<()> {
    let conn = open_store(&config.db_path)?;
    let saved = list_saved_estimates(&conn)?;

    if output == "-" {
        export_csv(&saved, io::stdout())?;
    } else {
        let file = File::create(output).with_context(|| format!("Failed to create {}", output))?;
        export_csv(&saved, file)?;
        println!("✓ Exported {} estimates to {}", saved.len(), output);
    }

    Ok(())
}

fn run_clear(config: &Config) -> Result<()> {
    let conn = open_store(&config.db_path)?;
    let removed = clear_saved_estimates(&conn)?;
    println!("✓ Removed {} saved estimates", removed);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    let predictor = build_predictor(config)?;
    let conn = open_store(&config.db_path)?;

    let mut app = ui::App::new(predictor, conn);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: home-price estimate --location <NAME> --sqft <AREA>");
    std::process::exit(1);
}
