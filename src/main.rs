use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use geninv_lib::config::{Config, DEFAULT_CONFIG_FILE};
use geninv_lib::ledger::{current_invoice_number, invoice_history, LedgerStore};
use geninv_lib::preferences::DefaultTenants;
use geninv_lib::workflow::{submit_form, UserMessage};
use geninv_lib::{catalog, invoice};

#[derive(Parser, Debug)]
#[command(name = "geninv", about = "Generate rental invoices from the property ledger")]
struct Cli {
    /// Configuration file; missing means defaults in the current directory.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Allocate the next invoice number for a tenant and write its PDF.
    Generate {
        #[arg(long)]
        property: String,

        #[arg(long)]
        tenant: String,

        /// MM-DD-YYYY, MM/DD/YYYY or MM/DD/YY
        #[arg(long)]
        date: String,
    },

    /// List every issued invoice, newest first.
    History,

    /// List catalog properties with their current invoice number.
    Properties,

    /// List the tenants of a property.
    Tenants {
        #[arg(long)]
        property: String,
    },

    /// Remember the tenant to preselect for a property.
    SetDefault {
        #[arg(long)]
        property: String,

        #[arg(long)]
        tenant: String,
    },

    /// Write a blank invoice template.
    Template {
        #[arg(long, default_value = "Invoice Master.pdf")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let message = match cli.command {
        Command::Generate {
            property,
            tenant,
            date,
        } => submit_form(&config, &property, &tenant, &date),

        Command::History => {
            let document = LedgerStore::new(config.ledger_path()).load_or_empty()?;
            let rows = invoice_history(&document);
            println!("{:<12} {:>9}  {:<28} {:<24} {:>12}", "Date", "Invoice #", "Property", "Tenant", "Amount");
            for row in rows {
                println!(
                    "{:<12} {:>9}  {:<28} {:<24} {:>12}",
                    row.date, row.invoice_no, row.property, row.tenant, row.amount
                );
            }
            return Ok(ExitCode::SUCCESS);
        }

        Command::Properties => {
            let document = LedgerStore::new(config.ledger_path()).load_or_empty()?;
            for name in config.property_names() {
                let current = current_invoice_number(&document, name)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{name}\tCurrent Invoice #: {current}");
            }
            return Ok(ExitCode::SUCCESS);
        }

        Command::Tenants { property } => match catalog::tenants(&config, &property) {
            Ok(tenants) if tenants.is_empty() => UserMessage::error("No tenants found for this property."),
            Ok(tenants) => {
                let prefs = DefaultTenants::load(config.default_tenants_path())?;
                let default = prefs.preselect(&property, &tenants);
                for tenant in &tenants {
                    let marker = if Some(tenant.as_str()) == default { "*" } else { " " };
                    println!("{marker} {tenant}");
                }
                return Ok(ExitCode::SUCCESS);
            }
            Err(e) => {
                tracing::error!(error = %e, "tenant lookup failed");
                UserMessage::error(e.to_string())
            }
        },

        Command::SetDefault { property, tenant } => {
            let mut prefs = DefaultTenants::load(config.default_tenants_path())?;
            match prefs.set_default(&property, &tenant) {
                Ok(()) => UserMessage::success("Default Tenant Set"),
                Err(e) => UserMessage::error(e.to_string()),
            }
        }

        Command::Template { out } => {
            let bytes = invoice::blank_template()?;
            invoice::write_invoice(&out, &bytes)?;
            UserMessage::success(format!("Template written to {}", out.display()))
        }
    };

    if message.is_error() {
        eprintln!("{}", message.text);
        Ok(ExitCode::FAILURE)
    } else {
        println!("{}", message.text);
        Ok(ExitCode::SUCCESS)
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geninv=info,geninv_lib=info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
