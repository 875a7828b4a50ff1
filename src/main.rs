use rand::prelude::*;
use sched_sim::{EventKind, SimConfig, Simulator, WorkloadInput};
use tracing_subscriber::EnvFilter;

fn main() -> sched_sim::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let inputs = bernoulli_workloads(200, 0.3, 0.3, 2.0, 6.0, 0);
    let simulator = Simulator::new(&inputs, SimConfig::new(2.0, 0.5))?;

    for report in simulator.run_all()? {
        let longest_idle = report
            .events
            .iter()
            .filter(|event| event.kind == EventKind::Idle)
            .map(|event| event.end - event.start)
            .fold(0.0, f64::max);

        println!("{}", report.algorithm);
        println!("  Average turnaround time: {:.2}", report.averages.turnaround);
        println!("  Average wait time: {:.2}", report.averages.wait);
        println!("  Average response time: {:.2}", report.averages.response);
        println!("  CPU utilization: {:.1}%", report.cpu_utilization * 100.0);
        println!("  Longest idle period: {longest_idle}");
    }

    Ok(())
}

fn bernoulli_workloads(
    ticks: u64,
    p_arrival: f64,
    p_short: f64,
    short_burst: f64,
    long_burst: f64,
    seed: u64,
) -> Vec<WorkloadInput> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut inputs = Vec::new();

    for t in 0..ticks {
        if rng.random::<f64>() < p_arrival {
            let burst = if rng.random::<f64>() < p_short {
                short_burst
            } else {
                long_burst
            };
            inputs.push(WorkloadInput::Process(t as f64, burst));
        }
    }

    inputs
}
