use clap::{Args, Parser, Subcommand};
use discopop_runner_core::ProjectInfo;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "discopop-runner",
    version,
    about = "Run the DiscoPoP parallelism discovery toolchain",
    long_about = "discopop-runner builds and profiles an instrumented CMake project, runs the DiscoPoP analysis tools on the profile and reports the suggested parallelization opportunities."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the runner settings (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Instrument, profile and analyze a project
    #[command(about = "Run the DiscoPoP workflow on a CMake project")]
    Discopop(InstrumentArgs),

    /// Measure where a project spends its time
    #[command(about = "Run the hotspot detection workflow on a CMake project")]
    Hotspots(InstrumentArgs),

    /// Re-run the optimizer on existing results
    #[command(about = "Re-run the optimizer and patch generation on existing results")]
    Optimize(OptimizeArgs),

    /// Show parsed results
    #[command(about = "Show the suggestions and hotspots of a result directory")]
    Results(ResultsArgs),

    /// Apply or roll back generated patches
    #[command(about = "Apply, roll back or list generated patches")]
    Patch(PatchArgs),

    /// Check the installation
    #[command(about = "Check which DiscoPoP tools are available")]
    Doctor,

    /// Run a list of commands as a pipeline
    #[command(about = "Run the steps of a TOML pipeline file in order")]
    Steps(StepsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InstrumentArgs {
    /// Project source directory (contains CMakeLists.txt)
    #[arg(long)]
    pub src: PathBuf,

    /// Build directory, deleted and recreated
    #[arg(long)]
    pub build: PathBuf,

    /// Result directory [default: <src>/.discopop]
    #[arg(long)]
    pub dot: Option<PathBuf>,

    /// Executable produced by the build, relative to the build directory
    #[arg(long)]
    pub executable: String,

    /// Arguments for one run of the executable; repeat for several runs
    #[arg(long = "args", allow_hyphen_values = true)]
    pub executable_arguments: Vec<String>,

    /// Overwrite an existing build directory without asking
    #[arg(short, long)]
    pub yes: bool,
}

impl InstrumentArgs {
    pub fn dot(&self) -> PathBuf {
        self.dot.clone().unwrap_or_else(|| self.src.join(".discopop"))
    }

    pub fn project(&self) -> ProjectInfo {
        ProjectInfo {
            src_directory: self.src.clone(),
            build_directory: self.build.clone(),
            executable_name: self.executable.clone(),
            executable_arguments: self.executable_arguments.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct OptimizeArgs {
    /// Result directory of an earlier DiscoPoP run
    #[arg(long, default_value = ".discopop")]
    pub dot: PathBuf,

    /// Optimization level
    #[arg(short = 'o', long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub level: u8,

    #[arg(long)]
    pub allow_nested_parallelism: bool,

    /// Plot the search results
    #[arg(long)]
    pub plot: bool,

    #[arg(long)]
    pub doall_microbench_file: Option<PathBuf>,

    #[arg(long)]
    pub reduction_microbench_file: Option<PathBuf>,

    #[arg(long)]
    pub system_configuration: Option<PathBuf>,

    /// Raw optimizer arguments replacing all of the above
    #[arg(
        long = "override",
        allow_hyphen_values = true,
        conflicts_with_all = ["level", "allow_nested_parallelism", "plot"]
    )]
    pub override_arguments: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ResultsArgs {
    /// Result directory
    #[arg(long, default_value = ".discopop")]
    pub dot: PathBuf,

    /// Print the combined records as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PatchArgs {
    /// Result directory
    #[arg(long, default_value = ".discopop", global = true)]
    pub dot: PathBuf,

    #[command(subcommand)]
    pub action: PatchAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PatchAction {
    /// Apply the patches of the given suggestions
    Apply {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Roll back the patches of the given suggestions
    Rollback {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Roll back every applied patch
    Clear,
    /// Re-apply the last saved set of patches
    Load,
    /// List applied patches
    List,
}

#[derive(Args, Debug, Clone)]
pub struct StepsArgs {
    /// Pipeline file
    pub file: PathBuf,

    /// Keep going after a failed step
    #[arg(long)]
    pub continue_on_error: bool,
}
