#[cfg(feature = "cli")]
use clap::Parser;

/// Command line interface for the NF-e emission automation.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "nfe-automacao")]
#[command(about = "Sequential emission of linked return/industrialization NF-e via Bling")]
pub struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "automacao_config.json")]
    pub config: String,

    /// Path to the Bling token file
    #[arg(long, default_value = "bling_tokens.json")]
    pub tokens: String,

    /// Product mapping table (CSV: produto,produto_retorno,produto_industrial,material_codigo)
    #[arg(long, default_value = "depara.csv")]
    pub mapping: String,

    /// Price table (CSV: produto,retorno,industrial,material)
    #[arg(long, default_value = "valores.csv")]
    pub prices: String,

    /// Product code for a single emission
    #[arg(long)]
    pub product: Option<String>,

    /// Quantity (KG) for a single emission
    #[arg(long)]
    pub quantity: Option<f64>,

    /// Used source invoice numbers, first one is the cross-reference anchor
    #[arg(long, value_delimiter = ',')]
    pub source_nf: Vec<String>,

    /// Directory of sheet CSV files; switches to batch mode
    #[arg(long)]
    pub batch_dir: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
