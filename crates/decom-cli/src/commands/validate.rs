use std::path::Path;

use anyhow::Result;
use decom_cli::load_network;
use decom_core::Diagnostics;
use tracing::info;

/// Print the case's diagnostics. Returns `false` if any issue is an error.
pub fn handle(case: &Path) -> Result<bool> {
    info!("Validating case {}", case.display());
    let network = load_network(case)?;

    let mut diag = Diagnostics::new();
    network.validate_into(&mut diag);

    println!("{}", network.stats());
    print!("{diag}");
    Ok(!diag.has_errors())
}
