//! Text rendering and persistence of the training report

use crate::error::Result;
use crate::pipeline::TrainingReport;
use std::fmt::Write as _;

/// Render the report as plain text.
pub fn render(report: &TrainingReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== scorecast training report ===\n");

    let _ = writeln!(out, "Model:    {:?}", report.model_kind);
    let _ = writeln!(out, "Features: {}", report.feature_names.len());
    let _ = writeln!(out, "Targets:  {}", report.target_names.join(", "));
    let _ = writeln!(
        out,
        "Rounds:   best {} of {} run\n",
        report.best_round, report.rounds_run
    );

    let _ = writeln!(out, "--- Evaluation scores ---");
    for target in &report.score.per_target {
        let _ = writeln!(
            out,
            "  {:<28} R² {:>8.4}   MAE {:>8.4}",
            target.target, target.r2, target.mae
        );
    }
    let _ = writeln!(
        out,
        "  {:<28} R² {:>8.4}   MAE {:>8.4}\n",
        "pooled", report.score.pooled_r2, report.score.pooled_mae
    );

    let _ = writeln!(out, "--- Best configuration ---");
    let mut params: Vec<_> = report.best_params.iter().collect();
    params.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in params {
        let _ = writeln!(out, "  {:<20} {:?}", name, value);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Search ---");
    let evaluated = report.trials.len();
    let diverged = report.trials.iter().filter(|t| t.diverged).count();
    let _ = writeln!(out, "  trials:   {}", evaluated);
    if diverged > 0 {
        let _ = writeln!(out, "  diverged: {}", diverged);
    }
    let _ = writeln!(out);

    if let Some(importances) = report.model.feature_importances() {
        let _ = writeln!(out, "--- Feature importance ---");
        let mut pairs: Vec<(&str, f64)> = report
            .feature_names
            .iter()
            .map(String::as_str)
            .zip(importances.iter().copied())
            .collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (name, imp) in pairs.iter().take(20) {
            let _ = writeln!(out, "  {:<28} {:.4}", name, imp);
        }
    }

    out
}

/// Write the full report (model and scaler included) as JSON.
pub fn save_json(report: &TrainingReport, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{split_dataset, NumericTable};
    use crate::metrics::score_predictions;
    use crate::optimizer::TrialParams;
    use crate::preprocessing::ScalerStats;
    use crate::training::{fit_with_early_stopping, ModelKind};
    use ndarray::Array2;

    fn small_report() -> TrainingReport {
        let features = NumericTable {
            names: vec!["f1".to_string(), "f2".to_string()],
            values: Array2::from_shape_fn((30, 2), |(r, c)| (r + c) as f64 * 0.3),
        };
        let targets = NumericTable {
            names: vec!["home".to_string(), "away".to_string()],
            values: Array2::from_shape_fn((30, 2), |(r, t)| (r * (t + 2)) as f64 * 0.1),
        };
        let split = split_dataset(&features, &targets, 0.2, 42).unwrap();
        let scaler = ScalerStats::fit(&split.train.features).unwrap();

        let params = TrialParams::new();
        let mut session = ModelKind::GradientBoosting
            .start_session(&params, &split, 42)
            .unwrap();
        let outcome = fit_with_early_stopping(session.as_mut(), 10, 5).unwrap();
        let predictions = outcome.model.predict(&split.eval.features.values).unwrap();
        let score =
            score_predictions(&split.target_names, &split.eval.targets, &predictions).unwrap();

        TrainingReport {
            model_kind: ModelKind::GradientBoosting,
            best_params: params,
            score,
            best_round: outcome.best_round,
            rounds_run: outcome.rounds_run,
            trials: Vec::new(),
            feature_names: features.names.clone(),
            target_names: targets.names.clone(),
            model: outcome.model,
            scaler,
        }
    }

    #[test]
    fn test_render_mentions_key_sections() {
        let report = small_report();
        let text = render(&report);
        assert!(text.contains("Evaluation scores"));
        assert!(text.contains("pooled"));
        assert!(text.contains("Feature importance"));
        assert!(text.contains("home"));
    }

    #[test]
    fn test_json_round_trip() {
        let report = small_report();
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        save_json(&report, path).unwrap();

        let json = std::fs::read_to_string(path).unwrap();
        let loaded: TrainingReport = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.feature_names, report.feature_names);
        assert_eq!(loaded.score.pooled_r2, report.score.pooled_r2);
    }
}
