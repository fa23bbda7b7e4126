//! Terminal output for run reports

use crate::pipeline::RunResult;

const RULE_WIDTH: usize = 60;

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{title}");
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{key}:"), value);
}

/// Compact `first .. last (min / max)` view of per-episode cluster sizes.
pub fn format_cluster_series(values: &[f64]) -> String {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) => {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            format!("{first:.2} .. {last:.2} (min {min:.2} / max {max:.2})")
        }
        _ => "no episodes".to_string(),
    }
}

/// Print one phase of a run.
pub fn print_run_result(result: &RunResult) {
    print_section(&format!("{} ({} episodes)", result.phase, result.episodes));
    print_kv("Epsilon", &format!("{:.6}", result.final_epsilon));
    print_kv("Cluster size", &format_cluster_series(&result.cluster_by_episode));
    print_kv("Summary rows", &result.summaries.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_series_bounds() {
        assert_eq!(
            format_cluster_series(&[1.5, 3.25, 0.5, 2.0]),
            "1.50 .. 2.00 (min 0.50 / max 3.25)"
        );
        assert_eq!(format_cluster_series(&[]), "no episodes");
    }
}
