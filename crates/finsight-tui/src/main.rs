use std::sync::Arc;
use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use finsight_core::{
    connect, system_instruction, Analyst, ChartSpec, Config, Dataset, Overrides, Session,
};

mod app;
mod chart;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use logging::LogTarget;
use tui::{AppEvent, EventHandler, Tui};

/// Width of the text bars printed by `ask`
const TEXT_BAR_WIDTH: usize = 30;

#[derive(Parser)]
#[command(name = "finsight")]
#[command(version, about = "Ask an AI financial analyst about the 2023 quarterly figures")]
struct Cli {
    /// Model provider: gemini, openai, claude or ollama
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model name (defaults depend on the provider)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Log level or filter spec, e.g. "debug" or "finsight_core=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
    /// Print the quarterly figures the analyst works from
    Data,
    /// Print the system instruction sent to the model
    Prompt,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = Overrides {
        provider: cli.provider.clone(),
        model: cli.model.clone(),
    };
    let dataset = Dataset::fiscal_2023();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let _logger = logging::init(cli.log_level.as_deref(), LogTarget::File)?;
            let analyst = connect_analyst(&overrides, &dataset)?;
            run_tui(analyst).await?;
        }
        Commands::Ask { question } => {
            let _logger = logging::init(cli.log_level.as_deref(), LogTarget::Stderr)?;
            let analyst = connect_analyst(&overrides, &dataset)?;
            ask_once(analyst, &question).await;
        }
        Commands::Data => print_dataset(&dataset),
        Commands::Prompt => println!("{}", system_instruction(&dataset)),
    }

    Ok(())
}

fn connect_analyst(overrides: &Overrides, dataset: &Dataset) -> Result<Arc<dyn Analyst>> {
    let config = Config::load()?;
    let settings = config.resolve(overrides)?;
    log::info!("Using {} with model {}", settings.provider.display_name(), settings.model);

    Ok(connect(&settings, &system_instruction(dataset)))
}

async fn run_tui(analyst: Arc<dyn Analyst>) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(Session::new(analyst));
    let result = run(&mut terminal, &mut app).await;

    tui::restore()?;
    result
}

/// What woke the event loop
enum Step {
    Event(AppEvent),
    Settled,
    InputFailed(anyhow::Error),
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let step = tokio::select! {
            event = events.next() => match event {
                Ok(event) => Step::Event(event),
                Err(e) => Step::InputFailed(e),
            },
            _ = app.session.settled() => Step::Settled,
        };

        match step {
            Step::Event(event) => handler::handle_event(app, event),
            Step::Settled => app.on_settled(),
            Step::InputFailed(e) => {
                log::error!("{}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}

async fn ask_once(analyst: Arc<dyn Analyst>, question: &str) {
    println!("{} {}\n", "Asking".bold().cyan(), analyst.describe().magenta());

    let mut session = Session::new(analyst);
    if !session.submit_and_wait(question).await {
        println!("{}", "Nothing to ask.".red());
        return;
    }

    let Some(reply) = session.conversation().messages().last() else {
        return;
    };

    println!("{}", "FinSight:".bold().green());
    println!("{}", reply.content());

    if let Some(spec) = reply.chart() {
        print_chart(spec);
    }
}

fn print_chart(spec: &ChartSpec) {
    let title = spec.title.as_deref().unwrap_or("Chart");
    println!("\n{} {}", title.bold().blue(), format!("({} chart)", spec.chart_type.as_str()).dimmed());
    println!("{}", "=".repeat(50).dimmed());

    let name_width = spec.data.iter().map(|p| p.name.chars().count()).max().unwrap_or(0);
    let max_abs = spec.data.iter().map(|p| p.value.abs()).fold(0.0_f64, f64::max);

    for point in &spec.data {
        let bar = "█".repeat(chart::text_bar_len(point.value, max_abs, TEXT_BAR_WIDTH));
        let bar = if point.value < 0.0 { bar.red() } else { bar.yellow() };
        println!(
            "{:<width$}  {} {}",
            point.name,
            bar,
            chart::format_value(point.value).bold(),
            width = name_width
        );
    }
}

fn print_dataset(dataset: &Dataset) {
    println!(
        "\n{}",
        format!("Quarterly results, {}", dataset.fiscal_year_label()).bold().green()
    );
    println!("{}", "=".repeat(60).dimmed());
    println!(
        "{:<10}{:>12}{:>12}{:>12}{:>12}",
        "Period".bold(),
        "Revenue".bold(),
        "Net income".bold(),
        "Expenses".bold(),
        "Margin %".bold()
    );

    for record in dataset.records() {
        println!(
            "{:<10}{:>12}{:>12}{:>12}{:>12}",
            record.period.yellow(),
            chart::format_value(record.revenue as f64),
            chart::format_value(record.net_income as f64),
            chart::format_value(record.expenses as f64),
            format!("{:.1}", record.profit_margin)
        );
    }

    println!("{}", "=".repeat(60).dimmed());
    println!("{} quarters", dataset.len().to_string().bold());
}
