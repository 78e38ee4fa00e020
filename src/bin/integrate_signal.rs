use pulse_integrator::config::load_config;
use pulse_integrator::signal::io::{load_signal, write_json_file};
use pulse_integrator::PulseIntegrator;
use std::env;
use std::path::Path;

fn main() {
    let _ = env_logger::builder().format_timestamp_millis().try_init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config_path = Path::new(&config_path);
    let config = load_config(config_path)?;

    let input = config.resolve_input(config_path);
    let signal = load_signal(&input, config.noise.clone())?;
    println!(
        "Loaded {} samples over [{:.6}, {:.6}] from {}",
        signal.len(),
        signal.domain().0,
        signal.domain().1,
        input.display()
    );

    let integrator = PulseIntegrator::new(config.params.clone());
    let report = integrator.estimate_with_diagnostics(&signal);

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &report)?;
        println!("Saved report to {}", path.display());
    }

    for stage in &report.trace.timings.stages {
        println!("  {:<24} {:>9.3} ms", stage.label, stage.elapsed_ms);
    }

    match report.into_result() {
        Ok(res) => {
            println!("area = {:.6e} ± {:.6e}", res.integral, res.uncertainty);
            println!(
                "window = [{:.6}, {:.6}] ({} samples), center = {:.6}, width = {:.6}",
                res.window.lower,
                res.window.upper,
                res.window.samples(),
                res.window.center,
                res.window.width
            );
            let [amp_err, center_err, width_err, _] = res.fit.std_errors();
            println!(
                "fit: amplitude = {:.4e} ± {:.1e}, center = {:.6} ± {:.1e}, width = {:.6} ± {:.1e}, peak = {:.4e}, chi2/dof = {:.3}",
                res.fit.amplitude,
                amp_err,
                res.fit.center,
                center_err,
                res.fit.width,
                width_err,
                res.fit.evaluate(res.fit.center),
                res.fit.reduced_chi2()
            );
            if !res.flags.is_empty() {
                println!("flags = {:?}", res.flags);
            }
            Ok(())
        }
        Err(err) => Err(err.to_string()),
    }
}

fn usage() -> String {
    "Usage: integrate_signal <config.json>".to_string()
}
