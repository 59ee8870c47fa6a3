use clap::Parser;
use domainsale::api::default_options;
use domainsale::{renderer, DomainSaleClient, DomainSaleOptions};

/// Check whether a domain advertises itself as for sale via its
/// `_for-sale` DNS TXT record, optionally corroborated by RDAP.
#[derive(Parser, Debug)]
#[command(name = "domainsale", version, about)]
struct Args {
    /// Domain to check, e.g. example.com
    domain: String,

    /// Cross-check the RDAP `status` tag before reporting for-sale
    #[arg(long)]
    rdap: bool,

    /// Cache TTL in seconds for DNS and RDAP results
    #[arg(long = "cache-ttl", value_name = "N")]
    cache_ttl: Option<u64>,

    /// Timeout in seconds for each DNS/RDAP operation
    #[arg(long, value_name = "N")]
    timeout: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Emit debug-level logs to stderr
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Format {
    Text,
    Json,
    Html,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = match DomainSaleClient::new() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("error: failed to initialize domainsale client: {err}");
            std::process::exit(1);
        }
    };

    let defaults = default_options(client.config());
    let options = DomainSaleOptions {
        enable_rdap_check: args.rdap || defaults.enable_rdap_check,
        cache_ttl_sec: args.cache_ttl.unwrap_or(defaults.cache_ttl_sec),
        timeout_sec: args.timeout.unwrap_or(defaults.timeout_sec),
    };

    let response = client.get_status(&args.domain, &options).await;

    let rendered = match args.format {
        Format::Text => renderer::render_text(&response),
        Format::Html => renderer::render_html(&response),
        Format::Json => serde_json::to_string_pretty(&response)
            .unwrap_or_else(|e| format!("{{\"error\":\"failed to serialize response: {e}\"}}")),
    };
    println!("{rendered}");

    std::process::exit(if response.errors.is_empty() { 0 } else { 1 });
}
