use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use hmis_client::{ClientConfig, HmisClient, ListQuery};
use hmis_core::{Clock, Page, SystemClock};
use hmis_pharmacy::{DrugBatch, InventoryDrug, InventoryFilter, StockStatus};
use hmis_report::{ExpiryReport, OutputFormat, Render, StockReport, read_listing};

#[derive(Parser)]
#[command(name = "hmis-report", about = "Pharmacy stock and expiry reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Server to fetch from when no --file is given
    #[arg(long, global = true, env = "HMIS_BASE_URL")]
    base_url: Option<String>,

    /// Classify relative to midnight UTC of this date instead of now
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Batches approaching expiry
    Expiring {
        /// Saved page response to read instead of fetching
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long)]
        page: Option<u32>,
    },
    /// Drugs at or below their minimum stock level
    LowStock {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Full inventory with optional filters
    Inventory {
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// out_of_stock, low_stock or in_stock
        #[arg(long)]
        stock_status: Option<StockStatus>,
    },
}

fn client(base_url: Option<&str>) -> Result<HmisClient> {
    let mut config = ClientConfig::from_env();
    if let Some(url) = base_url {
        config = config.with_base_url(url);
    }
    HmisClient::new(&config).context("building HTTP client")
}

fn as_of(date: Option<NaiveDate>) -> Result<DateTime<Utc>> {
    match date {
        Some(d) => Ok(d
            .and_hms_opt(0, 0, 0)
            .context("invalid --as-of date")?
            .and_utc()),
        None => Ok(SystemClock.now()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    hmis_observability::init();

    let cli = Cli::parse();
    let now = as_of(cli.as_of)?;
    let base_url = cli.base_url.as_deref();

    let output = match cli.command {
        Commands::Expiring { file, page } => {
            let batches: Page<DrugBatch> = match file {
                Some(path) => read_listing(&path, "batches")?,
                None => {
                    let query = page.map_or_else(ListQuery::new, |p| ListQuery::new().with_page(p));
                    client(base_url)?.expiring_batches(&query).await?
                }
            };
            ExpiryReport::build(&batches, now).render(cli.format)?
        }
        Commands::LowStock { file } => {
            let drugs: Page<InventoryDrug> = match file {
                Some(path) => read_listing(&path, "drugs")?,
                None => client(base_url)?.low_stock().await?,
            };
            StockReport::build("Low stock", &drugs.data, &InventoryFilter::default(), now)
                .render(cli.format)?
        }
        Commands::Inventory {
            file,
            search,
            category,
            stock_status,
        } => {
            let mut filter = InventoryFilter::default();
            if let Some(term) = &search {
                filter = filter.with_search(term.as_str());
            }
            if let Some(c) = &category {
                filter = filter.with_category(c.as_str());
            }
            if let Some(status) = stock_status {
                filter = filter.with_stock_status(status);
            }

            let drugs: Page<InventoryDrug> = match file {
                Some(path) => read_listing(&path, "drugs")?,
                None => {
                    // The server filters too; the local pass keeps saved files consistent.
                    let mut query = ListQuery::new()
                        .with_category(category.as_deref())
                        .with_stock_status(stock_status);
                    if let Some(term) = search {
                        query = query.with_search(term);
                    }
                    client(base_url)?.inventory(&query).await?.drugs
                }
            };
            StockReport::build("Inventory", &drugs.data, &filter, now).render(cli.format)?
        }
    };

    tracing::info!(format = ?cli.format, "report rendered");
    println!("{output}");
    Ok(())
}
