use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use decom_algo::{DecommitResult, EconomicDispatch, UnitDecommitment};
use decom_cli::{load_network, DecomConfig};
use decom_core::Network;
use tabwriter::TabWriter;
use tracing::{info, warn};

use super::util::configure_threads;

/// Command-line overrides for `decom run`
pub struct RunOptions<'a> {
    pub out: Option<&'a Path>,
    pub serial: bool,
    pub max_stages: Option<usize>,
    pub threads: Option<&'a str>,
}

/// Returns whether the final dispatch converged.
pub fn handle(case: &Path, options: &RunOptions<'_>, config: &DecomConfig) -> Result<bool> {
    let network = load_network(case)?;
    let diagnostics = network
        .validate()
        .with_context(|| format!("validating {}", case.display()))?;
    for issue in diagnostics.warnings() {
        warn!("{issue}");
    }

    let mut settings = config.decommit_config();
    if options.serial {
        settings.parallel = false;
    }
    if options.max_stages.is_some() {
        settings.max_stages = options.max_stages;
    }
    if settings.parallel {
        configure_threads(options.threads.unwrap_or(config.decommit.threads.as_str()));
    }

    info!(case = %case.display(), "{}", network.stats());
    let result = UnitDecommitment::new(EconomicDispatch::new())
        .with_config(settings)
        .solve(&network)
        .with_context(|| format!("running decommitment on {}", case.display()))?;

    print_summary(&network, &result)?;

    if let Some(path) = options.out {
        let json = serde_json::to_string_pretty(&result.to_json())?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(out = %path.display(), "wrote result");
    }

    Ok(result.success)
}

fn names(network: &Network, indices: &[usize]) -> String {
    if indices.is_empty() {
        return "-".to_string();
    }
    let generators = network.generators();
    indices
        .iter()
        .map(|&i| generators.get(i).map_or_else(|| i.to_string(), |g| g.name.clone()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_summary(network: &Network, result: &DecommitResult) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    let status = if result.success { "converged" } else { "FAILED" };
    writeln!(writer, "Status:\t{status}")?;
    writeln!(writer, "Total cost:\t{:.2} $/hr", result.total_cost())?;
    writeln!(writer, "System lambda:\t{:.4} $/MWh", result.solution.system_lambda)?;
    writeln!(
        writer,
        "Elapsed:\t{:.1} ms",
        result.elapsed.as_secs_f64() * 1e3
    )?;
    writeln!(
        writer,
        "Shed for Pmin:\t{}",
        names(network, &result.shed_for_feasibility)
    )?;
    writeln!(writer, "Decommitted:\t{}", names(network, &result.decommitted))?;
    writeln!(writer)?;

    writeln!(writer, "GEN\tSTATUS\tPG (MW)\tPMIN\tPMAX\tMU_PMIN")?;
    for (i, gen) in result.solution.network.generators().iter().enumerate() {
        writeln!(
            writer,
            "{}\t{}\t{:.3}\t{:.1}\t{:.1}\t{:.4}",
            gen.name,
            if gen.status { "on" } else { "off" },
            gen.active_power.value(),
            gen.pmin.value(),
            gen.pmax.value(),
            result.solution.mu_pmin(i)
        )?;
    }
    writer.flush()?;
    Ok(())
}
