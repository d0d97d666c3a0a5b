//! Results aggregation — deterministic math over the five module results.
//! Calling `aggregate` twice on identical inputs yields identical output,
//! whatever the upstream AI calls did.

use tracing::info;

use sitepulse_common::{
    AggregateScore, AuditContext, AuditError, CategoryScores, DimensionBreakdown, Grade, Issue,
    LeadPriority, LeadTier, QuickWin, Severity,
};

use crate::config::ScoringConfig;
use crate::coordinator::ModuleResults;

/// Combine module results into the terminal score artifact. Fails only
/// when zero modules produced a usable score.
pub fn aggregate(
    results: &ModuleResults,
    ctx: &AuditContext,
    cfg: &ScoringConfig,
    total_duration_ms: u64,
) -> Result<AggregateScore, AuditError> {
    let per_category = calculate_scores(results);

    let raw_overall = weighted_overall(&per_category, cfg).ok_or_else(|| {
        let failures: Vec<String> = results
            .iter()
            .filter_map(|r| r.error().map(|e| format!("{}: {e}", r.module)))
            .collect();
        AuditError::NoUsableScores(failures.join("; "))
    })?;

    let quick_wins = extract_quick_wins(results);
    let overall = apply_adjustments(raw_overall, results, ctx, &quick_wins, cfg);
    let grade = calculate_grade(overall, cfg);
    let lead_priority = calculate_lead_score(results, ctx, overall, &quick_wins, cfg);

    info!(
        overall,
        grade = %grade,
        lead_score = lead_priority.score,
        "Aggregation complete"
    );

    Ok(AggregateScore {
        overall,
        per_category,
        grade,
        top_issue: top_issue(results),
        quick_wins,
        lead_priority,
        total_cost_usd: results.total_cost_usd(),
        total_duration_ms,
    })
}

/// Category scores; design is the mean of the scored visual modules.
pub fn calculate_scores(results: &ModuleResults) -> CategoryScores {
    let design = match (results.desktop_visual.score(), results.mobile_visual.score()) {
        (Some(d), Some(m)) => Some((d + m) / 2.0),
        (Some(d), None) => Some(d),
        (None, Some(m)) => Some(m),
        (None, None) => None,
    };

    CategoryScores {
        design,
        seo: results.seo.score(),
        content: results.content.score(),
        social: results.social.score(),
    }
}

/// Weighted mean over present categories; absent categories' weight is
/// redistributed proportionally by dividing by the present weight sum.
fn weighted_overall(scores: &CategoryScores, cfg: &ScoringConfig) -> Option<f64> {
    let entries = [
        (scores.design, cfg.weight_design),
        (scores.seo, cfg.weight_seo),
        (scores.content, cfg.weight_content),
        (scores.social, cfg.weight_social),
    ];

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for (score, weight) in entries {
        if let Some(score) = score {
            weighted_sum += score * weight;
            weight_total += weight;
        }
    }

    (weight_total > 0.0).then(|| weighted_sum / weight_total)
}

/// Additive bonuses/penalties on the raw weighted overall, clamped to
/// [0, 100], applied before grading.
fn apply_adjustments(
    raw: f64,
    results: &ModuleResults,
    ctx: &AuditContext,
    quick_wins: &[QuickWin],
    cfg: &ScoringConfig,
) -> f64 {
    let mut adjusted = raw;

    if let Some(mobile) = results.mobile_visual.score() {
        if mobile < cfg.mobile_friendly_floor {
            adjusted -= cfg.penalty_not_mobile_friendly;
        }
    }
    if !ctx.target_url.starts_with("https://") {
        adjusted -= cfg.penalty_no_https;
    }
    if !quick_wins.is_empty() {
        adjusted += cfg.bonus_quick_wins;
    }

    adjusted.clamp(0.0, 100.0)
}

/// Boundary values map to the higher grade.
pub fn calculate_grade(score: f64, cfg: &ScoringConfig) -> Grade {
    if score >= cfg.grade_a {
        Grade::A
    } else if score >= cfg.grade_b {
        Grade::B
    } else if score >= cfg.grade_c {
        Grade::C
    } else if score >= cfg.grade_d {
        Grade::D
    } else {
        Grade::F
    }
}

/// Quick wins concatenated in fixed module order; no re-ranking.
pub fn extract_quick_wins(results: &ModuleResults) -> Vec<QuickWin> {
    results
        .iter()
        .flat_map(|r| r.quick_wins.iter().cloned())
        .collect()
}

/// Most severe issue across all modules; first occurrence wins ties.
fn top_issue(results: &ModuleResults) -> Option<Issue> {
    results
        .iter()
        .flat_map(|r| r.issues.iter())
        .min_by_key(|issue| issue.severity)
        .cloned()
}

/// Six weighted dimensions summing to a 0-100 sales-readiness score.
pub fn calculate_lead_score(
    results: &ModuleResults,
    ctx: &AuditContext,
    overall: f64,
    quick_wins: &[QuickWin],
    cfg: &ScoringConfig,
) -> LeadPriority {
    // Quality gap: the worse the site, the stronger the pitch.
    let quality_gap = ((100.0 - overall) / 100.0 * cfg.cap_quality_gap).clamp(0.0, cfg.cap_quality_gap);

    // Budget likelihood: premium/pricing signals in the findings plus
    // industry economics.
    let mut budget_likelihood = cfg.budget_base;
    let industry = ctx.business.industry.as_deref().map(str::to_lowercase);
    if industry
        .as_deref()
        .is_some_and(|i| cfg.high_fit_industries.iter().any(|h| i.contains(h)))
    {
        budget_likelihood += cfg.budget_industry_bonus;
    }
    if has_pricing_signal(results) {
        budget_likelihood += cfg.budget_pricing_bonus;
    }
    let budget_likelihood = budget_likelihood.clamp(0.0, cfg.cap_budget_likelihood);

    // Urgency: density of critical/high findings.
    let criticals = count_severity(results, Severity::Critical);
    let highs = count_severity(results, Severity::High);
    let urgency = (criticals as f64 * cfg.urgency_per_critical
        + highs as f64 * cfg.urgency_per_high)
        .clamp(0.0, cfg.cap_urgency);

    let industry_fit = match industry.as_deref() {
        Some(i) if cfg.high_fit_industries.iter().any(|h| i.contains(h)) => cfg.cap_industry_fit,
        Some(_) => cfg.industry_fit_other.min(cfg.cap_industry_fit),
        None => cfg.industry_fit_unknown.min(cfg.cap_industry_fit),
    };

    let company_size = match ctx.business.company_size.as_deref() {
        Some("1-10") => cfg.size_micro,
        Some("11-50") => cfg.cap_company_size,
        Some("51-200") => cfg.size_large,
        _ => cfg.size_other,
    }
    .min(cfg.cap_company_size);

    let engagement_potential = if quick_wins.is_empty() {
        cfg.engagement_floor.min(cfg.cap_engagement)
    } else {
        cfg.cap_engagement
    };

    let dimension_breakdown = DimensionBreakdown {
        quality_gap,
        budget_likelihood,
        urgency,
        industry_fit,
        company_size,
        engagement_potential,
    };
    let score = dimension_breakdown.total().clamp(0.0, 100.0);

    let tier = if score >= cfg.tier_hot {
        LeadTier::Hot
    } else if score >= cfg.tier_warm {
        LeadTier::Warm
    } else {
        LeadTier::Cold
    };

    LeadPriority {
        score,
        tier,
        dimension_breakdown,
    }
}

fn count_severity(results: &ModuleResults, severity: Severity) -> usize {
    results
        .iter()
        .flat_map(|r| r.issues.iter())
        .filter(|i| i.severity == severity)
        .count()
}

fn has_pricing_signal(results: &ModuleResults) -> bool {
    results
        .iter()
        .flat_map(|r| r.issues.iter().map(|i| i.title.as_str()).chain(
            r.quick_wins.iter().map(|w| w.title.as_str()),
        ))
        .any(|title| {
            let t = title.to_lowercase();
            t.contains("pricing") || t.contains("premium") || t.contains("e-commerce")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitepulse_common::{AnalyzerResult, ModuleName, ModuleOutcome};

    fn scored(module: ModuleName, score: f64) -> AnalyzerResult {
        AnalyzerResult {
            module,
            outcome: ModuleOutcome::Scored { score },
            issues: vec![],
            quick_wins: vec![],
            cost_usd: 0.0,
            pages_analyzed: 1,
        }
    }

    fn all_scored(seo: f64, content: f64, dv: f64, mv: f64, social: f64) -> ModuleResults {
        ModuleResults {
            seo: scored(ModuleName::Seo, seo),
            content: scored(ModuleName::Content, content),
            desktop_visual: scored(ModuleName::DesktopVisual, dv),
            mobile_visual: scored(ModuleName::MobileVisual, mv),
            social: scored(ModuleName::Social, social),
        }
    }

    #[test]
    fn grade_boundaries_map_upward() {
        let cfg = ScoringConfig::default();
        assert_eq!(calculate_grade(85.0, &cfg), Grade::A);
        assert_eq!(calculate_grade(84.9, &cfg), Grade::B);
        assert_eq!(calculate_grade(70.0, &cfg), Grade::B);
        assert_eq!(calculate_grade(55.0, &cfg), Grade::C);
        assert_eq!(calculate_grade(40.0, &cfg), Grade::D);
        assert_eq!(calculate_grade(39.9, &cfg), Grade::F);
    }

    #[test]
    fn absent_category_weight_is_redistributed() {
        let mut results = all_scored(80.0, 80.0, 80.0, 80.0, 80.0);
        results.social = AnalyzerResult::failed(ModuleName::Social, "Failed");

        let scores = calculate_scores(&results);
        assert_eq!(scores.social, None);
        // All present categories score 80, so the overall must stay 80
        // regardless of the missing weight.
        let cfg = ScoringConfig::default();
        let overall = weighted_overall(&scores, &cfg).unwrap();
        assert!((overall - 80.0).abs() < 1e-9);
    }

    #[test]
    fn design_is_mean_of_visual_modules() {
        let results = all_scored(82.0, 76.0, 80.0, 70.0, 60.0);
        let scores = calculate_scores(&results);
        assert_eq!(scores.design, Some(75.0));
    }

    #[test]
    fn single_visual_module_carries_design() {
        let mut results = all_scored(80.0, 80.0, 90.0, 0.0, 80.0);
        results.mobile_visual = AnalyzerResult::failed(ModuleName::MobileVisual, "no screenshots");
        assert_eq!(calculate_scores(&results).design, Some(90.0));
    }

    #[test]
    fn aggregation_is_deterministic() {
        let results = all_scored(82.0, 76.0, 80.0, 70.0, 60.0);
        let ctx = AuditContext {
            target_url: "https://example.com/".into(),
            ..Default::default()
        };
        let cfg = ScoringConfig::default();

        let a = aggregate(&results, &ctx, &cfg, 1000).unwrap();
        let b = aggregate(&results, &ctx, &cfg, 1000).unwrap();
        assert_eq!(a.overall, b.overall);
        assert_eq!(a.grade, b.grade);
        assert_eq!(a.lead_priority.score, b.lead_priority.score);
    }

    #[test]
    fn no_usable_scores_is_fatal() {
        let results = ModuleResults {
            seo: AnalyzerResult::failed(ModuleName::Seo, "a"),
            content: AnalyzerResult::failed(ModuleName::Content, "b"),
            desktop_visual: AnalyzerResult::failed(ModuleName::DesktopVisual, "c"),
            mobile_visual: AnalyzerResult::failed(ModuleName::MobileVisual, "d"),
            social: AnalyzerResult::failed(ModuleName::Social, "e"),
        };
        let ctx = AuditContext::default();
        let err = aggregate(&results, &ctx, &ScoringConfig::default(), 0).unwrap_err();
        assert!(matches!(err, AuditError::NoUsableScores(_)));
    }

    #[test]
    fn https_and_mobile_penalties_apply_before_grading() {
        let results = all_scored(75.0, 75.0, 75.0, 30.0, 75.0);
        let cfg = ScoringConfig::default();

        let http_ctx = AuditContext {
            target_url: "http://example.com/".into(),
            ..Default::default()
        };
        let agg = aggregate(&results, &http_ctx, &cfg, 0).unwrap();

        // design = (75+30)/2 = 52.5; raw = 52.5*.3 + 75*.3 + 75*.2 + 75*.2 = 68.25
        // minus 15 (mobile score 30 < 50) minus 10 (no https) = 43.25
        assert!((agg.overall - 43.25).abs() < 1e-9);
        assert_eq!(agg.grade, Grade::D);
    }

    #[test]
    fn lead_score_with_minimal_context_is_valid() {
        let results = all_scored(85.0, 90.0, 85.0, 85.0, 85.0);
        let ctx = AuditContext::default();
        let cfg = ScoringConfig::default();
        let lead = calculate_lead_score(&results, &ctx, 87.0, &[], &cfg);

        assert!(lead.score >= 0.0);
        assert!(lead.score <= 100.0);
        assert!(matches!(
            lead.tier,
            LeadTier::Hot | LeadTier::Warm | LeadTier::Cold
        ));
        assert!((lead.dimension_breakdown.total() - lead.score).abs() < 1e-9);
    }

    #[test]
    fn critical_issues_raise_urgency_and_tier() {
        let mut results = all_scored(30.0, 30.0, 30.0, 55.0, 30.0);
        for _ in 0..4 {
            results.seo.issues.push(Issue {
                severity: Severity::Critical,
                category: "seo".into(),
                title: "Missing title tags".into(),
                description: "Every page shares one title".into(),
                page_url: None,
            });
        }
        let ctx = AuditContext {
            business: sitepulse_common::BusinessContext {
                industry: Some("legal".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let cfg = ScoringConfig::default();
        let lead = calculate_lead_score(&results, &ctx, 35.0, &[], &cfg);

        assert_eq!(lead.dimension_breakdown.urgency, 20.0);
        assert_eq!(lead.dimension_breakdown.industry_fit, 15.0);
        assert!(lead.score >= cfg.tier_warm);
    }

    #[test]
    fn lead_dimensions_track_scoring_config() {
        let results = all_scored(80.0, 80.0, 80.0, 80.0, 80.0);
        let ctx = AuditContext::default();
        let cfg = ScoringConfig {
            budget_base: 3.0,
            industry_fit_unknown: 1.0,
            size_other: 2.0,
            engagement_floor: 0.5,
            ..Default::default()
        };

        let lead = calculate_lead_score(&results, &ctx, 80.0, &[], &cfg);
        assert_eq!(lead.dimension_breakdown.budget_likelihood, 3.0);
        assert_eq!(lead.dimension_breakdown.industry_fit, 1.0);
        assert_eq!(lead.dimension_breakdown.company_size, 2.0);
        assert_eq!(lead.dimension_breakdown.engagement_potential, 0.5);
    }

    #[test]
    fn quick_wins_concatenate_in_module_order() {
        let mut results = all_scored(80.0, 80.0, 80.0, 80.0, 80.0);
        results.social.quick_wins.push(QuickWin {
            title: "social win".into(),
            description: String::new(),
        });
        results.seo.quick_wins.push(QuickWin {
            title: "seo win".into(),
            description: String::new(),
        });

        let wins = extract_quick_wins(&results);
        assert_eq!(wins[0].title, "seo win");
        assert_eq!(wins[1].title, "social win");
    }

    #[test]
    fn top_issue_prefers_highest_severity() {
        let mut results = all_scored(80.0, 80.0, 80.0, 80.0, 80.0);
        results.seo.issues.push(Issue {
            severity: Severity::Medium,
            category: "seo".into(),
            title: "meta".into(),
            description: String::new(),
            page_url: None,
        });
        results.content.issues.push(Issue {
            severity: Severity::Critical,
            category: "content".into(),
            title: "stale".into(),
            description: String::new(),
            page_url: None,
        });

        assert_eq!(top_issue(&results).unwrap().title, "stale");
    }
}
