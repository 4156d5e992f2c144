//! Plain-text rendering of a rake report

use std::fmt::Write;

use rakeview_engine::{RakeReport, StakeAggregate};

/// Which column pair of a stake row to show
#[derive(Debug, Clone, Copy)]
enum Measure {
    WinLoss,
    AllInEv,
}

pub fn render_report(report: &RakeReport) -> String {
    let mut out = String::new();
    let t = &report.totals;

    let _ = writeln!(out, "Rake Summary");
    let _ = writeln!(out, "  Hands:            {}", t.hands);
    let _ = writeln!(out, "  Total rake:       ${:.2}", t.total_rake);
    let _ = writeln!(out, "  Total rake in BB: {:.2} BB", t.total_rake_bb);
    let _ = writeln!(out, "  Rake in BB/100:   {:.2}", t.rake_bb_per_100);
    let _ = writeln!(out, "  Win/Loss:         ${:.2} -> ${:.2}", t.raw_amount, t.adjusted_amount);
    let _ = writeln!(out, "  All-in EV:        ${:.2} -> ${:.2}", t.raw_ev, t.adjusted_ev);
    if t.fallback_hands > 0 {
        let _ = writeln!(out, "  Fallback hands:   {}", t.fallback_hands);
    }
    let _ = writeln!(out);

    render_table(&mut out, "Win/Loss (rake-adjusted)", report, Measure::WinLoss);
    let _ = writeln!(out);
    render_table(&mut out, "All-in EV (rake-adjusted)", report, Measure::AllInEv);

    let discrepant = report.session_stats.iter().filter(|s| s.is_discrepant()).count();
    if discrepant > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} session(s) matched a hand count far from the session log", discrepant);
    }
    out
}

fn render_table(out: &mut String, title: &str, report: &RakeReport, measure: Measure) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(
        out,
        "  {:<20} {:>8} {:>12} {:>12} {:>10} {:>7}",
        "Stakes", "Hands", "Amount", "BB", "BB/100", "%"
    );
    for row in &report.stake_aggregates {
        render_row(out, row, measure);
    }
    render_row(out, &report.stake_total, measure);
}

fn render_row(out: &mut String, row: &StakeAggregate, measure: Measure) {
    let (amount, bb, per_100) = match measure {
        Measure::WinLoss => (row.winloss, row.bb_result, row.bb_per_100),
        Measure::AllInEv => (row.ev, row.ev_bb_result, row.ev_bb_per_100),
    };
    let _ = writeln!(
        out,
        "  {:<20} {:>8} {:>12.2} {:>12.2} {:>10.2} {:>6.1}%",
        row.stakes, row.hands, amount, bb, per_100, row.percentage
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rakeview_engine::fixtures::{scenario_a_hands, scenario_a_sessions};
    use rakeview_engine::{EngineConfig, RakeEngine};

    #[test]
    fn test_render_contains_rows_and_total() {
        let engine = RakeEngine::new(EngineConfig::default()).unwrap();
        let report = engine.run(&scenario_a_hands(), &scenario_a_sessions()).unwrap();
        let text = render_report(&report);
        assert!(text.contains("Total rake:       $7.00"));
        assert!(text.contains("$1/$2"));
        assert!(text.contains("$0.50/$1"));
        assert_eq!(text.matches("TOTAL").count(), 2);
        // every stake row is listed once per table
        assert_eq!(text.matches("$1/$2").count(), 2);
        assert_eq!(text.matches("$0.50/$1").count(), 2);
        assert!(!text.contains("Fallback hands"));
    }
}
