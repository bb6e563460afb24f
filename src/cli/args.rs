use std::path::PathBuf;

use airline_sentiment::core::DeviceSetting;
use airline_sentiment::Settings;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "airline-sentiment",
    version,
    about = "Classify the sentiment of airline-related tweets",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Default)]
pub struct RuntimeArgs {
    /// Explicit config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model directory, or hf:<repo>[@<revision>] for the Hugging Face Hub
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Run on CPU even when CUDA is available
    #[arg(long, global = true, conflicts_with = "cuda")]
    pub cpu: bool,

    /// Run on the given CUDA device
    #[arg(long, global = true, value_name = "INDEX")]
    pub cuda: Option<usize>,
}

impl RuntimeArgs {
    /// Flags win over config files and the environment.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(model) = &self.model {
            settings.apply_model_override(model);
        }
        if self.cpu {
            settings.device = DeviceSetting::Cpu;
        } else if let Some(index) = self.cuda {
            settings.device = DeviceSetting::Cuda(index);
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze tweets one after another (default)
    Interactive,

    /// Analyze a single tweet and exit
    Predict {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the example tweets
    Examples,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["airline-sentiment"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn predict_joins_words_and_takes_global_flags() {
        let cli = Cli::try_parse_from([
            "airline-sentiment",
            "predict",
            "lost",
            "my",
            "bag",
            "--json",
            "--cpu",
            "--model",
            "hf:org/airline",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Predict { text, json }) => {
                assert_eq!(text.join(" "), "lost my bag");
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let mut settings = Settings::default();
        cli.runtime.apply(&mut settings);
        assert_eq!(settings.device, DeviceSetting::Cpu);
        assert_eq!(settings.model, "hf:org/airline");
    }

    #[test]
    fn cpu_and_cuda_conflict() {
        assert!(Cli::try_parse_from(["airline-sentiment", "--cpu", "--cuda", "1"]).is_err());
    }

    #[test]
    fn cuda_flag_selects_device() {
        let cli = Cli::try_parse_from(["airline-sentiment", "--cuda", "1"]).unwrap();
        let mut settings = Settings::default();
        cli.runtime.apply(&mut settings);
        assert_eq!(settings.device, DeviceSetting::Cuda(1));
    }
}
