use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use decom_cli::load_network;
use decom_core::{total_cost, CostModel};
use tabwriter::TabWriter;

/// Print every generator's cost at Pmin and at its case-file output.
pub fn handle(case: &Path) -> Result<()> {
    let network = load_network(case)?;
    let generators = network.generators();

    let models: Vec<CostModel> = generators.iter().map(|g| g.cost_model.clone()).collect();
    let pmin: Vec<f64> = generators.iter().map(|g| g.pmin.value()).collect();
    let pg: Vec<f64> = generators.iter().map(|g| g.active_power.value()).collect();
    let cost_at_pmin = total_cost(&models, &pmin)?;
    let cost_at_pg = total_cost(&models, &pg)?;

    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "GEN\tSTATUS\tPMIN\tCOST@PMIN\tAVG@PMIN\tPG\tCOST@PG\tAVG@PG"
    )?;
    let mut total = 0.0;
    for (i, gen) in generators.iter().enumerate() {
        writeln!(
            writer,
            "{}\t{}\t{:.1}\t{:.2}\t{}\t{:.1}\t{:.2}\t{}",
            gen.name,
            if gen.status { "on" } else { "off" },
            pmin[i],
            cost_at_pmin[i],
            average(cost_at_pmin[i], pmin[i]),
            pg[i],
            cost_at_pg[i],
            average(cost_at_pg[i], pg[i])
        )?;
        if gen.status {
            total += cost_at_pg[i];
        }
    }
    writeln!(writer)?;
    writeln!(writer, "Total cost (in service):\t{total:.2} $/hr")?;
    writer.flush()?;
    Ok(())
}

/// Average cost in $/MWh, or `-` at zero output.
fn average(cost: f64, p_mw: f64) -> String {
    let value = cost / p_mw;
    if value.is_finite() {
        format!("{value:.4}")
    } else {
        "-".to_string()
    }
}
