use clap::Parser;
use nfe_automacao::adapters::tables::{load_price_map, load_product_map};
use nfe_automacao::domain::model::SourceInvoiceRef;
use nfe_automacao::utils::error::{AutomationError, ErrorSeverity};
use nfe_automacao::utils::logger;
use nfe_automacao::utils::validation::{self, Validate};
use nfe_automacao::{
    AppConfig, BatchLayout, BatchRunner, CliArgs, CsvRangeStore, EmissionSequence,
    FileTokenStore, InvoiceBuilder, NfeEmitter, TokenManager,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting NF-e emission automation");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let config = AppConfig::from_file(&args.config).unwrap_or_else(|e| fail(e));

    if let Err(e) = config.validate() {
        fail(e);
    }

    if config.simulation_enabled() {
        tracing::warn!("⚠️ TEST MODE - no NF-e will actually be transmitted");
    }

    let mapping = load_product_map(&args.mapping).unwrap_or_else(|e| fail(e));
    let prices = load_price_map(&args.prices).unwrap_or_else(|e| fail(e));
    tracing::info!(
        "✅ Lookup tables loaded: {} product(s), {} price row(s)",
        mapping.len(),
        prices.len()
    );

    let store = FileTokenStore::new(&args.tokens);
    let tokens = TokenManager::initialize(store, &config)
        .await
        .unwrap_or_else(|e| fail(e));
    let emitter = NfeEmitter::new(tokens, &config).unwrap_or_else(|e| fail(e));

    let builder = InvoiceBuilder::new(config.recipient_contact.clone());
    let sequence = EmissionSequence::new(emitter, builder);

    if let Some(batch_dir) = &args.batch_dir {
        // Batch mode: orders and source NFs come from the sheet CSV directory
        let ranges = CsvRangeStore::new(batch_dir);
        let runner = BatchRunner::new(ranges, sequence, BatchLayout::default());

        let summary = runner
            .run(&mapping, &prices)
            .await
            .unwrap_or_else(|e| fail(e));

        println!(
            "✅ Batch finished: {} processed, {} ok, {} failed",
            summary.processed, summary.succeeded, summary.failed
        );
        if summary.failed > 0 {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Single emission mode
    let (product, quantity) = match (&args.product, args.quantity) {
        (Some(product), Some(quantity)) => (product.clone(), quantity),
        _ => {
            eprintln!("❌ Single emission needs --product and --quantity (or use --batch-dir)");
            eprintln!("💡 Example: nfe-automacao --product P100 --quantity 500 --source-nf 12345");
            std::process::exit(1);
        }
    };

    if let Err(e) = validation::validate_non_empty_string("product", &product) {
        fail(e);
    }
    if quantity <= 0.0 {
        eprintln!("❌ Quantity must be positive, got {}", quantity);
        std::process::exit(1);
    }

    let source_refs: Vec<SourceInvoiceRef> = args
        .source_nf
        .iter()
        .map(|nf| SourceInvoiceRef {
            nf_numero: nf.clone(),
        })
        .collect();

    let outcome = sequence
        .run(&product, quantity, &mapping, &prices, &source_refs)
        .await
        .unwrap_or_else(|e| fail(e));

    if outcome.success {
        println!(
            "✅ Both NF-e emitted in sequence: return {} | industrialization {}",
            outcome
                .return_invoice
                .as_ref()
                .and_then(|r| r.numero.as_deref())
                .unwrap_or("N/A"),
            outcome
                .industrial_invoice
                .as_ref()
                .and_then(|r| r.numero.as_deref())
                .unwrap_or("N/A"),
        );
    } else {
        eprintln!(
            "❌ {}",
            outcome.error.as_deref().unwrap_or("emission failed")
        );
        if let Some(return_invoice) = &outcome.return_invoice {
            eprintln!(
                "⚠️ Return NF-e {} was already emitted - reconcile before running again",
                return_invoice.numero.as_deref().unwrap_or("N/A")
            );
        }
        std::process::exit(1);
    }

    Ok(())
}

fn fail(e: AutomationError) -> ! {
    tracing::error!("❌ {} (severity: {:?})", e, e.severity());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
