//! Writes JSON schemas for the request and response types.
//!
//! ```text
//! cargo run --features cli --bin export_schemas -- --out schemas
//! ```

use anyhow::Context;
use clap::Parser;
use produce_market::application::dto::{
    CounterOffer, CreatedOrder, MatchCandidate, NewOrder, PriceCheck, StatusUpdate,
};
use produce_market::domain::entities::{Negotiation, Order};
use produce_market::domain::value_objects::{Pagination, PriceEvaluation};
use schemars::schema::RootSchema;
use schemars::schema_for;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "export_schemas", about = "Export DTO JSON schemas")]
struct Args {
    /// Output directory.
    #[arg(long, default_value = "schemas")]
    out: PathBuf,
}

fn schemas() -> Vec<(&'static str, RootSchema)> {
    vec![
        ("new_order", schema_for!(NewOrder)),
        ("created_order", schema_for!(CreatedOrder)),
        ("price_check", schema_for!(PriceCheck)),
        ("price_evaluation", schema_for!(PriceEvaluation)),
        ("match_candidate", schema_for!(MatchCandidate)),
        ("counter_offer", schema_for!(CounterOffer)),
        ("status_update", schema_for!(StatusUpdate)),
        ("pagination", schema_for!(Pagination)),
        ("order", schema_for!(Order)),
        ("negotiation", schema_for!(Negotiation)),
    ]
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    for (name, schema) in schemas() {
        let path = args.out.join(format!("{name}.json"));
        let json = serde_json::to_string_pretty(&schema)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("{}", path.display());
    }
    Ok(())
}
