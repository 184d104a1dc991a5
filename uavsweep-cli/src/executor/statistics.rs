//! Per-Combination Averages
//!
//! Groups run outcomes by (instance, drones, iterations, ticks) so that
//! repetitions collapse, then averages each metric over the runs that
//! actually reported it.

use uavsweep_report::{CombinationAverages, CombinationKey, Metric, RunOutcome};

/// Compute averages per combination, in first-seen order.
///
/// A metric missing from every run of a group is left out of that group's
/// means rather than reported as zero.
pub fn compute_averages(outcomes: &[RunOutcome]) -> Vec<CombinationAverages> {
    let mut groups: Vec<(CombinationKey, Vec<&RunOutcome>)> = Vec::new();

    for outcome in outcomes {
        let key = outcome.combination();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(outcome),
            None => groups.push((key, vec![outcome])),
        }
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let means = Metric::ALL
                .into_iter()
                .filter_map(|metric| {
                    mean(members.iter().filter_map(|o| o.metric(metric))).map(|m| (metric, m))
                })
                .collect();

            CombinationAverages {
                key,
                runs: members.len(),
                means,
            }
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
