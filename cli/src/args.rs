//! Command-line arguments for `sage`.

use clap::{Parser, Subcommand, ValueEnum};
use sage_types::AnalysisDepth;

const DEFAULT_SIMILAR_LIMIT: usize = 10;

#[derive(Debug, Parser)]
#[command(name = "sage")]
#[command(about = "One-shot commands against the Sage intelligence backend")]
pub struct Invocation {
    /// Backend address, overriding the config file and `SAGE_SERVER_URL`
    #[arg(long = "server", global = true, value_name = "tcp://host:port")]
    pub server_url: Option<String>,

    /// Analysis depth for `analyze` and `suggest`
    #[arg(long, global = true, value_enum, ignore_case = true)]
    pub depth: Option<DepthArg>,

    /// Maximum number of results for `similar`
    #[arg(long, global = true, default_value_t = DEFAULT_SIMILAR_LIMIT)]
    pub limit: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DepthArg {
    Quick,
    Standard,
    Deep,
}

impl From<DepthArg> for AnalysisDepth {
    fn from(depth: DepthArg) -> Self {
        match depth {
            DepthArg::Quick => AnalysisDepth::Quick,
            DepthArg::Standard => AnalysisDepth::Standard,
            DepthArg::Deep => AnalysisDepth::Deep,
        }
    }
}

#[derive(Debug, PartialEq, Subcommand)]
pub enum Command {
    /// Check that the backend answers
    Health,
    /// Print the backend's system status
    Status,
    /// Analyze one file
    Analyze { file: String },
    /// List suggestions for one file
    Suggest { file: String },
    /// Analyze a whole project
    Project { dir: String },
    /// Generate a commit message for staged changes
    Commit { repository: Option<String> },
    /// Ask the language model a question
    Ask {
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Search for code similar to a snippet
    Similar {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        snippet: Vec<String>,
    },
}
