// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`    — fits a model, optionally saving it
//   2. `evaluate` — hold-out metrics and CV RMSE
//   3. `predict`  — loads a saved model and prices one posting
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "salary-predictor",
    version = "0.1.0",
    about = "Train a salary model on job-market data, then predict salaries for job postings."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on: {}", args.data.data_path);
    let use_case = TrainUseCase::new(args.into());
    let outcome  = use_case.execute()?;

    println!(
        "Training complete: {} rows, {} features.",
        outcome.target.len(),
        outcome.model.feature_names.len()
    );
    if use_case.config().save {
        println!("Model saved to '{}'.", use_case.config().model_dir);
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let summary = EvaluateUseCase::new(args.into()).execute()?;
    let r = &summary.report;

    println!("Estimator: {}", summary.estimator);
    println!("RMSE:  {:.2}", r.rmse);
    println!("MAE:   {:.2}", r.mae);
    println!("R2:    {:.4}", r.r2);
    println!("MAPE:  {:.2}", r.mape);
    println!("SMAPE: {:.2}", r.smape);
    println!("WAPE:  {:.2}", r.wape);
    if let Some(mean) = summary.cv_mean() {
        println!("CV RMSE folds: {:?}", summary.cv_rmse);
        println!("CV RMSE mean: {:.2}", mean);
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictionService;
    use crate::domain::traits::SalaryPredictor;

    let request  = args.request()?;
    let service  = PredictionService::load(&args.service_config())?;
    let response = service.predict(&request)?;

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
