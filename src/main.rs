//! MLB run-total and strikeout prediction CLI
//!
//! Builds leakage-free design matrices from game logs, scores upcoming games
//! with exported models, and reports confidence tiers and backtested hit rates.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mlb::scoring::Side;
use mlb::{Config, Market, Result};

#[derive(Parser)]
#[command(name = "mlb")]
#[command(about = "MLB run totals and strikeout predictions", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Build the team run design matrix from the game logs
    BuildDataset {
        /// Output path (defaults to data.team_dataset_path)
        #[arg(long)]
        output: Option<String>,
    },
    /// Build the pitcher strikeout design matrix from the pitching log
    BuildKsDataset {
        #[arg(long)]
        output: Option<String>,
    },
    /// Predict team runs for scheduled games
    PredictRuns {
        /// Only games on this date
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        output: Option<String>,
    },
    /// Predict starter strikeouts for scheduled games
    PredictKs {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        output: Option<String>,
    },
    /// Score every historical team game with the run model
    BackfillRuns {
        #[arg(long)]
        output: Option<String>,
    },
    /// Score every historical start with the strikeout model
    BackfillKs {
        #[arg(long)]
        output: Option<String>,
    },
    /// Fill in actual results for saved predictions from the latest logs
    Reconcile {
        /// Which predictions: runs or ks
        #[arg(long, default_value = "runs")]
        kind: PredictionKind,
    },
    /// Upcoming game totals
    Totals {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Run line (defaults to scoring.game_total_line)
        #[arg(long)]
        line: Option<f64>,
        /// Only games involving this team
        #[arg(long)]
        team: Option<String>,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Upcoming single-team totals with over and under confidence
    TeamTotals {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        line: Option<f64>,
        /// Sort by over or under confidence
        #[arg(long, default_value = "over")]
        sort: Side,
        #[arg(long)]
        team: Option<String>,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Upcoming starter strikeouts
    Strikeouts {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        line: Option<f64>,
        /// Only this pitcher
        #[arg(long)]
        pitcher: Option<String>,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Upcoming run spreads
    Spreads {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        line: Option<f64>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Historical accuracy of backfilled predictions
    Accuracy {
        /// totals, team-totals, strikeouts, or spreads
        #[arg(long, default_value = "totals")]
        market: Market,
        /// Line to judge against (defaults to the market's configured line)
        #[arg(long)]
        line: Option<f64>,
        /// Daily slice and inclusive end of the rolling window
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Only predictions at this confidence level
        #[arg(long)]
        level: Option<u8>,
        /// Only this team or pitcher
        #[arg(long)]
        subject: Option<String>,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug)]
enum PredictionKind {
    Runs,
    Ks,
}

impl std::str::FromStr for PredictionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "runs" => Ok(PredictionKind::Runs),
            "ks" | "strikeouts" => Ok(PredictionKind::Ks),
            _ => Err(format!("Unknown prediction kind: {}. Use runs or ks.", s)),
        }
    }
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::BuildDataset { output } => commands::build_dataset(&config, output),
        Commands::BuildKsDataset { output } => commands::build_ks_dataset(&config, output),
        Commands::PredictRuns { date, output } => commands::predict_runs(&config, date, output),
        Commands::PredictKs { date, output } => commands::predict_ks(&config, date, output),
        Commands::BackfillRuns { output } => commands::backfill_runs(&config, output),
        Commands::BackfillKs { output } => commands::backfill_ks(&config, output),
        Commands::Reconcile { kind } => commands::reconcile(&config, kind),
        Commands::Totals {
            date,
            line,
            team,
            format,
        } => commands::totals(&config, date, line, team, format),
        Commands::TeamTotals {
            date,
            line,
            sort,
            team,
            format,
        } => commands::team_totals(&config, date, line, sort, team, format),
        Commands::Strikeouts {
            date,
            line,
            pitcher,
            format,
        } => commands::strikeouts(&config, date, line, pitcher, format),
        Commands::Spreads {
            date,
            line,
            team,
            format,
        } => commands::spreads(&config, date, line, team, format),
        Commands::Accuracy {
            market,
            line,
            date,
            level,
            subject,
            format,
        } => commands::accuracy(&config, market, line, date, level, subject, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use mlb::data::tables::{load_records, load_schedule, save_records};
    use mlb::data::{DataContext, EntityKey, ScheduledGame, SourcePaths};
    use mlb::features::{FeatureMatrixBuilder, STRIKEOUT_FEATURES, TEAM_FEATURES};
    use mlb::predict::{pair_matchups, LinearModel, Predictor};
    use mlb::scoring::backfill::{
        backfill_actuals, pair_records, strikeout_outcomes, summarize, team_run_outcomes,
        AccuracyQuery, AccuracyReport,
    };
    use mlb::scoring::{views, ScoreMode, Scorer};
    use mlb::{PitcherKPrediction, PredictionRecord, TeamRunPrediction};
    use serde::Serialize;

    fn load_context(config: &Config) -> Result<DataContext> {
        DataContext::load(SourcePaths::from(&config.data))
    }

    fn schedule_for(config: &Config, date: Option<NaiveDate>) -> Result<Vec<ScheduledGame>> {
        let mut games = load_schedule(&config.data.schedule)?;
        if let Some(date) = date {
            games.retain(|g| g.date == date);
        }
        println!("{} scheduled games", games.len());
        Ok(games)
    }

    fn on_date<T>(rows: Vec<T>, date: Option<NaiveDate>, date_of: impl Fn(&T) -> NaiveDate) -> Vec<T> {
        match date {
            Some(date) => rows.into_iter().filter(|r| date_of(r) == date).collect(),
            None => rows,
        }
    }

    /// Print rows as an aligned table, CSV, or JSON of the underlying items
    fn emit<T: Serialize>(
        format: &OutputFormat,
        items: &[T],
        headers: &[&str],
        rows: Vec<Vec<String>>,
    ) -> Result<()> {
        match format {
            OutputFormat::Table => {
                let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
                for row in &rows {
                    for (w, cell) in widths.iter_mut().zip(row) {
                        *w = (*w).max(cell.chars().count());
                    }
                }
                let line = |cells: Vec<&str>| {
                    cells
                        .iter()
                        .zip(&widths)
                        .map(|(c, w)| format!("{:<width$}", c, width = *w))
                        .collect::<Vec<_>>()
                        .join("  ")
                };
                println!("{}", line(headers.to_vec()));
                println!("{}", "─".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
                for row in &rows {
                    println!("{}", line(row.iter().map(String::as_str).collect()));
                }
                if rows.is_empty() {
                    println!("(no rows)");
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(items)?);
            }
            OutputFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(std::io::stdout());
                wtr.write_record(headers)?;
                for row in &rows {
                    wtr.write_record(row)?;
                }
                wtr.flush()?;
            }
        }
        Ok(())
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("models")?;
        std::fs::create_dir_all("outputs")?;
        println!("Created data/, models/ and outputs/ directories");

        println!("\nNext steps:");
        println!("  1. Put the pitcher, team batting and team pitching logs in data/");
        println!("  2. Run 'mlb build-dataset' and 'mlb build-ks-dataset' to export design matrices");
        println!("  3. Export fitted models to {} and {}", config.data.team_model_path, config.data.strikeout_model_path);
        println!("  4. Run 'mlb predict-runs' and 'mlb totals' for upcoming games");

        Ok(())
    }

    pub fn build_dataset(config: &Config, output: Option<String>) -> Result<()> {
        let context = load_context(config)?;
        let builder = FeatureMatrixBuilder::new(&config.features)?;
        let (rows, report) = builder.build_team_rows(context.logs());

        let path = output.unwrap_or_else(|| config.data.team_dataset_path.clone());
        save_records(&path, &rows)?;
        println!("Team run dataset: {}", report);
        println!("Saved {} rows to {}", rows.len(), path);
        Ok(())
    }

    pub fn build_ks_dataset(config: &Config, output: Option<String>) -> Result<()> {
        let context = load_context(config)?;
        let builder = FeatureMatrixBuilder::new(&config.features)?;
        let (rows, report) = builder.build_strikeout_rows(context.logs());

        let path = output.unwrap_or_else(|| config.data.strikeout_dataset_path.clone());
        save_records(&path, &rows)?;
        println!("Strikeout dataset: {}", report);
        println!("Saved {} rows to {}", rows.len(), path);
        Ok(())
    }

    pub fn predict_runs(config: &Config, date: Option<NaiveDate>, output: Option<String>) -> Result<()> {
        let model = LinearModel::load(&config.data.team_model_path, &TEAM_FEATURES)?;
        let context = load_context(config)?;
        let games = schedule_for(config, date)?;

        let predictor = Predictor::new(&context, &config.features, &model)?;
        let predictions = predictor.predict_team_runs(&games);

        let path = output.unwrap_or_else(|| config.data.team_predictions_path.clone());
        save_records(&path, &predictions)?;
        println!("Saved {} team predictions to {}", predictions.len(), path);
        Ok(())
    }

    pub fn predict_ks(config: &Config, date: Option<NaiveDate>, output: Option<String>) -> Result<()> {
        let model = LinearModel::load(&config.data.strikeout_model_path, &STRIKEOUT_FEATURES)?;
        let context = load_context(config)?;
        let games = schedule_for(config, date)?;

        let predictor = Predictor::new(&context, &config.features, &model)?;
        let predictions = predictor.predict_strikeouts(&games);

        let path = output.unwrap_or_else(|| config.data.strikeout_predictions_path.clone());
        save_records(&path, &predictions)?;
        println!("Saved {} strikeout predictions to {}", predictions.len(), path);
        Ok(())
    }

    pub fn backfill_runs(config: &Config, output: Option<String>) -> Result<()> {
        let model = LinearModel::load(&config.data.team_model_path, &TEAM_FEATURES)?;
        let context = load_context(config)?;
        let predictor = Predictor::new(&context, &config.features, &model)?;
        let predictions = predictor.backfill_team_runs();

        let path = output.unwrap_or_else(|| config.data.backfilled_team_runs_path.clone());
        save_records(&path, &predictions)?;
        println!("Saved {} backfilled team predictions to {}", predictions.len(), path);
        Ok(())
    }

    pub fn backfill_ks(config: &Config, output: Option<String>) -> Result<()> {
        let model = LinearModel::load(&config.data.strikeout_model_path, &STRIKEOUT_FEATURES)?;
        let context = load_context(config)?;
        let predictor = Predictor::new(&context, &config.features, &model)?;
        let predictions = predictor.backfill_strikeouts();

        let path = output.unwrap_or_else(|| config.data.backfilled_strikeouts_path.clone());
        save_records(&path, &predictions)?;
        println!("Saved {} backfilled strikeout predictions to {}", predictions.len(), path);
        Ok(())
    }

    pub fn reconcile(config: &Config, kind: PredictionKind) -> Result<()> {
        let context = load_context(config)?;
        match kind {
            PredictionKind::Runs => {
                let path = &config.data.team_predictions_path;
                let mut predictions: Vec<TeamRunPrediction> = load_records(path)?;
                let mut records: Vec<PredictionRecord> =
                    predictions.iter().map(PredictionRecord::from).collect();
                let filled = backfill_actuals(&mut records, &team_run_outcomes(context.batting()));
                for (p, r) in predictions.iter_mut().zip(&records) {
                    p.actual_runs = r.actual;
                }
                save_records(path, &predictions)?;
                println!("Filled {} actual run totals in {}", filled, path);
            }
            PredictionKind::Ks => {
                let path = &config.data.strikeout_predictions_path;
                let mut predictions: Vec<PitcherKPrediction> = load_records(path)?;
                let mut records: Vec<PredictionRecord> =
                    predictions.iter().map(PredictionRecord::from).collect();
                let filled = backfill_actuals(&mut records, &strikeout_outcomes(context.pitching()));
                for (p, r) in predictions.iter_mut().zip(&records) {
                    p.actual_ks = r.actual;
                }
                save_records(path, &predictions)?;
                println!("Filled {} actual strikeout counts in {}", filled, path);
            }
        }
        Ok(())
    }

    fn upcoming_team_predictions(
        config: &Config,
        date: Option<NaiveDate>,
    ) -> Result<Vec<TeamRunPrediction>> {
        let predictions: Vec<TeamRunPrediction> = load_records(&config.data.team_predictions_path)?;
        Ok(on_date(predictions, date, |p: &TeamRunPrediction| p.date))
    }

    fn game_pick_rows(picks: &[views::GamePick], market: Market) -> Vec<Vec<String>> {
        picks
            .iter()
            .map(|p| {
                vec![
                    p.date.to_string(),
                    p.first_team.clone(),
                    p.second_team.clone(),
                    p.first_pitcher.clone(),
                    p.second_pitcher.clone(),
                    format!("{:.2}", p.first_runs),
                    format!("{:.2}", p.second_runs),
                    format!("{:.2}", p.predicted),
                    p.direction.label(market).to_string(),
                    p.tier.label(ScoreMode::TwoSided),
                ]
            })
            .collect()
    }

    pub fn totals(
        config: &Config,
        date: Option<NaiveDate>,
        line: Option<f64>,
        team: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let scorer = Scorer::from_config(&config.scoring)?;
        let line = line.unwrap_or_else(|| Market::GameTotal.default_line(&config.scoring));
        let team = team.map(|t| EntityKey::new(&t));

        let pairs = pair_matchups(&upcoming_team_predictions(config, date)?);
        let picks = views::game_totals(&views::pairs_involving(pairs, team.as_ref()), line, &scorer);

        let headers = [
            "Date", "Team", "Opponent", "SP", "Opp SP", "Team Runs", "Opp Runs", "Total", "Pick",
            "Confidence",
        ];
        emit(&format, &picks, &headers, game_pick_rows(&picks, Market::GameTotal))
    }

    pub fn spreads(
        config: &Config,
        date: Option<NaiveDate>,
        line: Option<f64>,
        team: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let scorer = Scorer::from_config(&config.scoring)?;
        let line = line.unwrap_or_else(|| Market::Spread.default_line(&config.scoring));
        let team = team.map(|t| EntityKey::new(&t));

        let pairs = pair_matchups(&upcoming_team_predictions(config, date)?);
        let picks = views::spreads(&views::pairs_involving(pairs, team.as_ref()), line, &scorer);

        let headers = [
            "Date", "Team", "Opponent", "SP", "Opp SP", "Team Runs", "Opp Runs", "Spread", "Pick",
            "Confidence",
        ];
        emit(&format, &picks, &headers, game_pick_rows(&picks, Market::Spread))
    }

    pub fn team_totals(
        config: &Config,
        date: Option<NaiveDate>,
        line: Option<f64>,
        sort: Side,
        team: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let scorer = Scorer::from_config(&config.scoring)?;
        let line = line.unwrap_or_else(|| Market::TeamTotal.default_line(&config.scoring));
        let team = team.map(|t| EntityKey::new(&t));

        let predictions = views::team_rows_involving(upcoming_team_predictions(config, date)?, team.as_ref());
        let picks = views::team_totals(&predictions, line, &scorer, sort);

        let headers = ["Date", "Team", "Opponent", "SP", "Opp SP", "Runs", "Over", "Under"];
        let rows = picks
            .iter()
            .map(|p| {
                vec![
                    p.prediction.date.to_string(),
                    p.prediction.team.clone(),
                    p.prediction.opponent.clone(),
                    p.prediction.starting_pitcher.clone(),
                    p.prediction.opponent_pitcher.clone(),
                    format!("{:.2}", p.prediction.predicted_runs),
                    p.over.label(ScoreMode::OneSided(Side::Over)),
                    p.under.label(ScoreMode::OneSided(Side::Under)),
                ]
            })
            .collect();
        emit(&format, &picks, &headers, rows)
    }

    pub fn strikeouts(
        config: &Config,
        date: Option<NaiveDate>,
        line: Option<f64>,
        pitcher: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let scorer = Scorer::from_config(&config.scoring)?;
        let line = line.unwrap_or_else(|| Market::Strikeouts.default_line(&config.scoring));

        let mut predictions: Vec<PitcherKPrediction> =
            on_date(load_records(&config.data.strikeout_predictions_path)?, date, |p: &PitcherKPrediction| p.date);
        if let Some(pitcher) = pitcher {
            let key = EntityKey::new(&pitcher);
            predictions.retain(|p| EntityKey::new(&p.pitcher) == key);
        }
        let picks = views::strikeouts(&predictions, line, &scorer);

        let headers = ["Date", "Pitcher", "Team", "Opponent", "Predicted Ks", "Pick", "Confidence"];
        let rows = picks
            .iter()
            .map(|p| {
                vec![
                    p.prediction.date.to_string(),
                    p.prediction.pitcher.clone(),
                    p.prediction.team.clone(),
                    p.prediction.opponent.clone(),
                    format!("{:.2}", p.prediction.predicted_ks),
                    p.direction.label(Market::Strikeouts).to_string(),
                    p.tier.label(ScoreMode::TwoSided),
                ]
            })
            .collect();
        emit(&format, &picks, &headers, rows)
    }

    fn history_records(config: &Config, market: Market) -> Result<Vec<PredictionRecord>> {
        match market {
            Market::Strikeouts => {
                let history: Vec<PitcherKPrediction> =
                    load_records(&config.data.backfilled_strikeouts_path)?;
                Ok(history.iter().map(PredictionRecord::from).collect())
            }
            Market::TeamTotal => {
                let history: Vec<TeamRunPrediction> =
                    load_records(&config.data.backfilled_team_runs_path)?;
                Ok(history.iter().map(PredictionRecord::from).collect())
            }
            Market::GameTotal | Market::Spread => {
                let history: Vec<TeamRunPrediction> =
                    load_records(&config.data.backfilled_team_runs_path)?;
                Ok(pair_records(&pair_matchups(&history), market))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn accuracy(
        config: &Config,
        market: Market,
        line: Option<f64>,
        date: Option<NaiveDate>,
        level: Option<u8>,
        subject: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let scorer = Scorer::from_config(&config.scoring)?;
        let query = AccuracyQuery {
            threshold: line.unwrap_or_else(|| market.default_line(&config.scoring)),
            date,
            subject: subject.map(|s| EntityKey::new(&s)),
            tier: level,
        };

        let records = history_records(config, market)?;
        let report: AccuracyReport = summarize(&records, &query, &scorer);

        let headers = [
            "Date", "Subject", "Opponent", "Predicted", "Actual", "Pick", "Outcome", "Hit",
            "Confidence",
        ];
        let fmt_opt = |v: Option<f64>| v.map(|v| format!("{:.2}", v)).unwrap_or_default();
        let rows = report
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.record.date.to_string(),
                    r.record.subject.clone(),
                    r.record.opponent.clone().unwrap_or_default(),
                    format!("{:.2}", r.record.predicted),
                    fmt_opt(r.record.actual),
                    r.direction.label(market).to_string(),
                    r.actual_direction
                        .map(|d| d.label(market).to_string())
                        .unwrap_or_default(),
                    r.hit.map(|h| h.to_string()).unwrap_or_default(),
                    r.tier.label(ScoreMode::TwoSided),
                ]
            })
            .collect();

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            _ => {
                emit(&format, &report.rows, &headers, rows)?;
                if let OutputFormat::Table = format {
                    println!();
                    println!("{} at line {}", market, query.threshold);
                    println!("  Daily:   {}", report.daily);
                    println!("  Rolling: {}", report.rolling);
                }
            }
        }
        Ok(())
    }
}
