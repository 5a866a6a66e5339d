use crate::progress::LearningProgress;
use crate::progress::types::MAX_CONFIDENCE;

pub fn render_progress(progress: &LearningProgress, locale: &str) -> String {
    let mut lines = vec![format!(
        "◆ {}",
        t!("status.progress_title", locale = locale)
    )];

    for objective in &progress.objectives {
        lines.push(format!(
            "  {:<28} {:.1}/{MAX_CONFIDENCE:.0}  {}",
            objective.title, objective.confidence, objective.status
        ));
    }

    let summary = progress.summary();
    lines.push(format!(
        "  {:<28} {:.0}%",
        t!("status.overall", locale = locale),
        summary.overall * 100.0
    ));
    lines.join("\n")
}
