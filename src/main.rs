use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Confirm, DateSelect, InquireError, Select, Text};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use invoice_generator::config::{config_path, AppSettings};
use invoice_generator::totals::{format_currency, format_quantity};
use invoice_generator::{
    export_pdf, render_preview, Artifact, Edit, HeaderField, Invoice, ItemField, Session,
};

// ==========================================
// Constants
// ==========================================
const ADD_ITEM_OPT: &str = "➕ Add Item";
const EDIT_ITEM_OPT: &str = "✏️  Edit Item";
const REMOVE_ITEM_OPT: &str = "🗑  Remove Item";
const EDIT_FIELD_OPT: &str = "📝 Edit Invoice Details";
const EXPORT_OPT: &str = "📄 Download PDF";
const QUIT_OPT: &str = "🚪 Quit";

const DATE_FORMAT: &str = "%Y-%m-%d";

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(name = "invoice-generator", version, about = "Invoice form with live preview and PDF export")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill in a new invoice interactively
    New,
    /// Show the preview of an invoice file
    Preview {
        /// Invoice file (TOML)
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = PreviewFormat::Table)]
        format: PreviewFormat,
    },
    /// Export an invoice file as PDF
    Export {
        /// Invoice file (TOML)
        file: PathBuf,
        /// Directory to write to (defaults to the configured output directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Open the PDF once written
        #[arg(long)]
        open: bool,
    },
    /// Configure output directory
    Config,
    /// Open output folder
    Open,
}

#[derive(Clone, Copy, ValueEnum)]
enum PreviewFormat {
    Table,
    Json,
    Html,
}

// ==========================================
// Main Function
// ==========================================

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    let settings = AppSettings::load()?;
    debug!(?settings, "loaded settings");

    match command {
        Commands::New => new_invoice_wizard(&settings),
        Commands::Preview { file, format } => preview_file(&file, format),
        Commands::Export { file, output_dir, open } => {
            let invoice = Invoice::load(&file)?;
            let dir = output_dir.unwrap_or_else(|| settings.output_path());
            let path = write_pdf(&invoice, &dir)?;
            if open || settings.open_after_export {
                open_and_reveal(&path);
            }
            Ok(())
        }
        Commands::Config => setup_config_wizard().map(|_| ()),
        Commands::Open => open_output_folder(&settings),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,invoice_generator=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Esc / Ctrl-C in a prompt ends the wizard instead of failing it.
fn cancelled(err: &InquireError) -> bool {
    matches!(err, InquireError::OperationCanceled | InquireError::OperationInterrupted)
}

// ==========================================
// 1. Invoice Wizard
// ==========================================

fn new_invoice_wizard(settings: &AppSettings) -> Result<()> {
    let mut session = Session::blank();

    match fill_in(&mut session, settings) {
        Err(e) if e.downcast_ref::<InquireError>().is_some_and(cancelled) => {
            println!("Cancelled");
            Ok(())
        }
        other => other,
    }
}

fn fill_in(session: &mut Session, settings: &AppSettings) -> Result<()> {
    println!("\n--- Invoice Details ---");
    for field in HeaderField::ALL {
        let value = ask_header(field, "")?;
        show(session, Edit::Header(field, value));
    }

    println!("\n--- Enter Invoice Items ---");
    println!("(Leave Item Name empty to finish)");
    enter_item(session, 0)?;
    loop {
        let name = Text::new("Item Name (leave empty to finish):").prompt()?;
        if name.trim().is_empty() {
            break;
        }
        show(session, Edit::AddItem);
        let index = session.invoice().items.len() - 1;
        show(session, Edit::Item { index, field: ItemField::Name, value: name });
        enter_amounts(session, index)?;
    }

    loop {
        let options = vec![ADD_ITEM_OPT, EDIT_ITEM_OPT, REMOVE_ITEM_OPT, EDIT_FIELD_OPT, EXPORT_OPT, QUIT_OPT];
        let choice = Select::new("Next Step:", options).prompt()?;

        match choice {
            ADD_ITEM_OPT => {
                show(session, Edit::AddItem);
                let index = session.invoice().items.len() - 1;
                enter_item(session, index)?;
            }
            EDIT_ITEM_OPT => {
                if let Some(index) = select_item(session, "Select Item to Edit:")? {
                    enter_item(session, index)?;
                }
            }
            REMOVE_ITEM_OPT => {
                if let Some(index) = select_item(session, "Select Item to Remove:")? {
                    show(session, Edit::RemoveItem(index));
                }
            }
            EDIT_FIELD_OPT => {
                let labels: Vec<&str> = HeaderField::ALL.iter().map(|f| f.label()).collect();
                let picked = Select::new("Select Field:", labels).raw_prompt()?;
                let field = HeaderField::ALL[picked.index];
                let current = session.invoice().header(field).to_string();
                let value = ask_header(field, &current)?;
                show(session, Edit::Header(field, value));
            }
            EXPORT_OPT => {
                let path = write_artifact(session, settings)?;
                if settings.open_after_export {
                    open_and_reveal(&path);
                }
                continue;
            }
            _ => return Ok(()),
        }
    }
}

// Applies one change and prints the refreshed preview.
fn show(session: &mut Session, edit: Edit) {
    println!("\n{}", session.apply(edit));
}

fn ask_header(field: HeaderField, current: &str) -> Result<String> {
    let value = match field {
        HeaderField::InvoiceDate => {
            let default = NaiveDate::parse_from_str(current, DATE_FORMAT).unwrap_or_else(|_| Local::now().date_naive());
            DateSelect::new("Invoice Date:")
                .with_default(default)
                .prompt()?
                .format(DATE_FORMAT)
                .to_string()
        }
        HeaderField::Address => {
            println!("💡 Tip: Use '\\n' for new lines.");
            Text::new("Address:")
                .with_initial_value(&current.replace('\n', "\\n"))
                .prompt()?
                .replace("\\n", "\n")
        }
        HeaderField::TaxRate => Text::new("Tax Rate % (e.g. 8.875):")
            .with_initial_value(current)
            .prompt()?,
        _ => Text::new(&format!("{}:", field.label()))
            .with_initial_value(current)
            .prompt()?,
    };
    Ok(value)
}

fn enter_item(session: &mut Session, index: usize) -> Result<()> {
    let current = session.invoice().items[index].name.clone();
    let name = Text::new("Item Name:").with_initial_value(&current).prompt()?;
    show(session, Edit::Item { index, field: ItemField::Name, value: name });
    enter_amounts(session, index)
}

fn enter_amounts(session: &mut Session, index: usize) -> Result<()> {
    let item = session.invoice().items[index].clone();

    let quantity = Text::new("Quantity:").with_initial_value(&item.quantity).prompt()?;
    show(session, Edit::Item { index, field: ItemField::Quantity, value: quantity });

    let price = Text::new("Price ($):").with_initial_value(&item.unit_price).prompt()?;
    show(session, Edit::Item { index, field: ItemField::UnitPrice, value: price });

    let item = &session.invoice().items[index];
    println!("   = {}", format_currency(item.line_total()));
    Ok(())
}

fn select_item(session: &Session, prompt: &str) -> Result<Option<usize>> {
    let items = &session.invoice().items;
    if items.is_empty() {
        println!("❌ No items added.");
        return Ok(None);
    }

    let options: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let name = if item.name.is_empty() { "-" } else { item.name.as_str() };
            format!("{}. {} ({} × {})", i + 1, name, format_quantity(item.quantity()), format_currency(item.unit_price()))
        })
        .collect();

    let picked = Select::new(prompt, options).raw_prompt()?;
    Ok(Some(picked.index))
}

// ==========================================
// 2. Preview & Export
// ==========================================

fn preview_file(file: &Path, format: PreviewFormat) -> Result<()> {
    let invoice = Invoice::load(file)?;
    let view = render_preview(&invoice);

    match format {
        PreviewFormat::Table => println!("{view}"),
        PreviewFormat::Json => println!("{}", view.to_json()?),
        PreviewFormat::Html => println!("{}", view.to_html()?),
    }
    Ok(())
}

fn write_artifact(session: &Session, settings: &AppSettings) -> Result<PathBuf> {
    println!("\n🔨 Generating PDF...");
    save(session.export()?, &settings.output_path())
}

fn write_pdf(invoice: &Invoice, dir: &Path) -> Result<PathBuf> {
    save(export_pdf(invoice)?, dir)
}

fn save(artifact: Artifact, dir: &Path) -> Result<PathBuf> {
    let path = artifact.write_into(dir).context("Failed to save PDF")?;
    println!("✅ PDF Generated: {:?}", path);
    Ok(path)
}

// ==========================================
// 3. Config & Utilities
// ==========================================

fn setup_config_wizard() -> Result<AppSettings> {
    println!("\n⚙️  --- Configuration Setup ---");
    let current = AppSettings::load().unwrap_or_default();

    println!("📂 Opening folder picker...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Select Output Directory")
        .pick_folder();

    let output_dir = if let Some(path) = picked_path {
        path.to_string_lossy().to_string()
    } else {
        println!("❌ No folder selected. Falling back to manual input.");
        Text::new("Enter Output Directory:")
            .with_default(&current.output_dir)
            .prompt()?
    };

    let open_after_export = Confirm::new("Open PDFs after export?")
        .with_default(current.open_after_export)
        .prompt()?;

    let settings = AppSettings { output_dir, open_after_export };
    let path = settings.save()?;
    info!(path = %path.display(), "settings saved");
    println!("✅ Settings saved to {:?}", config_path());
    Ok(settings)
}

fn open_output_folder(settings: &AppSettings) -> Result<()> {
    let target_path = settings.output_path();
    std::fs::create_dir_all(&target_path)
        .with_context(|| format!("Failed to create {}", target_path.display()))?;
    println!("🚀 Opening: {:?}", target_path);
    open_path(&target_path);
    Ok(())
}

fn open_path(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(path).spawn().ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(path).spawn().ok();
}

// Helper: Open file and reveal in Finder/Explorer
fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg("-R").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(format!("/select,{}", path.to_string_lossy())).spawn().ok();

    #[cfg(target_os = "linux")]
    {
        if let Some(parent) = path.parent() {
            Command::new("xdg-open").arg(parent).spawn().ok();
        }
    }

    open_path(path);
}
