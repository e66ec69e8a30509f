//! Minimum-generation repair before the first OPF solve.

use decom_core::{fairmax, total_cost, CostModel, DecomError, DecomResult, Network};
use tracing::info;

/// Shut down generators until the committed Pmin total fits the load.
///
/// The load the committed units must cover is the fixed bus demand plus the maximum
/// consumption of every in-service dispatchable load. While the Pmin of the
/// in-service, non-load generators exceeds it, the unit with the highest average cost
/// at Pmin is taken offline (ties to the lowest generator index).
///
/// Returns the shed generator indices in shedding order. Fails with
/// [`DecomError::Infeasible`] when the excess remains but no committed unit has a
/// positive Pmin left to remove.
pub fn shed_excess_commitment(network: &mut Network) -> DecomResult<Vec<usize>> {
    let load_capacity = network.load_capacity_mw().value();
    let mut shed = Vec::new();

    loop {
        let index = {
            let generators = network.generators();
            let on = network.in_service_generators();
            let pmin: Vec<f64> = on.iter().map(|&i| generators[i].pmin.value()).collect();
            let floor: f64 = pmin.iter().sum();
            if floor <= load_capacity {
                break;
            }
            if !pmin.iter().any(|&p| p > 0.0) {
                return Err(DecomError::Infeasible(format!(
                    "committed Pmin {floor:.3} MW exceeds load capacity {load_capacity:.3} MW \
                     and no generator with a positive Pmin is left to shut down"
                )));
            }

            let models: Vec<CostModel> = on
                .iter()
                .map(|&i| generators[i].cost_model.clone())
                .collect();
            let average: Vec<f64> = total_cost(&models, &pmin)?
                .into_iter()
                .zip(&pmin)
                .map(|(cost, p)| cost / p)
                .collect();
            let (avg_cost, k) = fairmax(&average)?;
            let index = on[k];

            info!(
                generator = index,
                name = %generators[index].name,
                floor_mw = floor,
                load_capacity_mw = load_capacity,
                avg_cost_at_pmin = avg_cost,
                "shutting down generator so all Pmin limits can be satisfied"
            );
            index
        };

        network.shut_down_generator(index)?;
        shed.push(index);
    }

    Ok(shed)
}
