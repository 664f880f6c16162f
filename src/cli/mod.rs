// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and delegates to Layer 2.
//
//   `train`   - train the model on a driving log
//   `predict` - steering for one frame from the best checkpoint

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "driver-trainer",
    version,
    about = "Train an end-to-end steering CNN on camera frames and vehicle speed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on driving log: {}", args.driving_log);
    let checkpoint_dir = args.checkpoint_dir.clone();

    let history = TrainUseCase::new(args.into()).execute()?;

    match history.best_epoch() {
        Some((epoch, loss)) => println!(
            "Training complete. Best validation loss {loss:.6} at epoch {epoch}; checkpoint in '{checkpoint_dir}'."
        ),
        None => println!("Training complete. No checkpoint was written."),
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(&args.checkpoint_dir, args.device.into())?;
    let steering = use_case.predict(&args.frame, args.speed)?;
    println!("Steering: {steering:.6}");
    Ok(())
}
