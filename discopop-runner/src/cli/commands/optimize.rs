use crate::cli::app::OptimizeArgs;
use crate::cli::{TerminalUi, cancel_on_interrupt, finish_workflow};
use anyhow::Result;
use discopop_runner_core::tools::{OptimizerArguments, OptimizerOptions};
use discopop_runner_core::{OptimizerWorkflow, RunnerConfig};

pub async fn execute(args: OptimizeArgs, config: RunnerConfig) -> Result<()> {
    let dot = args.dot.clone();
    let workflow = OptimizerWorkflow::new(dot, config, arguments(args));

    let token = cancel_on_interrupt();
    let ui = TerminalUi::new(true);
    let outcome = workflow.run(&ui, &token).await;

    if let Some(results) = finish_workflow(&ui, outcome)? {
        super::results::print_results(&results, false)?;
    }
    Ok(())
}

fn arguments(args: OptimizeArgs) -> OptimizerArguments {
    if let Some(raw) = args.override_arguments {
        return OptimizerArguments::Override(raw);
    }
    OptimizerArguments::Structured(OptimizerOptions {
        optimization_level: args.level,
        doall_microbench_file: args.doall_microbench_file,
        reduction_microbench_file: args.reduction_microbench_file,
        allow_nested_parallelism: args.allow_nested_parallelism,
        system_configuration: args.system_configuration,
        plot: args.plot,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn optimize_args(argv: &[&str]) -> OptimizeArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Optimize(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_structured_arguments() {
        let args = optimize_args(&["discopop-runner", "optimize", "-o", "2", "--plot"]);
        match arguments(args) {
            OptimizerArguments::Structured(options) => {
                assert_eq!(options.optimization_level, 2);
                assert!(options.plot);
                assert!(!options.allow_nested_parallelism);
            }
            OptimizerArguments::Override(raw) => panic!("unexpected override {raw}"),
        }
    }

    #[test]
    fn test_override_wins() {
        let args = optimize_args(&["discopop-runner", "optimize", "--override", "-o 1 --verbose"]);
        assert!(matches!(arguments(args), OptimizerArguments::Override(raw) if raw == "-o 1 --verbose"));
    }
}
