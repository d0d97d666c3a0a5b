use std::time::Duration;

/// Budget configuration surface for a single audit run.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Max pages the classifier may assign to each analyzer module.
    pub max_pages_per_module: usize,
    /// Overall wall-clock crawl budget. Pages not finished by the deadline
    /// are marked failed, never retried.
    pub max_crawl_time: Duration,
    /// Hard cap on pages crawled regardless of selection size.
    pub max_total_pages: usize,
    /// Concurrent fetch fan-out.
    pub crawl_concurrency: usize,
    /// Total discovery budget, sliced across the discovery sources.
    pub discovery_timeout: Duration,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_pages_per_module: 5,
            max_crawl_time: Duration::from_secs(90),
            max_total_pages: 20,
            crawl_concurrency: 4,
            discovery_timeout: Duration::from_secs(20),
        }
    }
}

/// Tuned scoring constants. These are empirically calibrated values, kept
/// in one place so they can be confirmed against the authoritative grader
/// and overridden without code edits.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Nominal category weights; redistributed proportionally when a
    /// category is absent.
    pub weight_design: f64,
    pub weight_seo: f64,
    pub weight_content: f64,
    pub weight_social: f64,

    /// Grade thresholds; boundary values map to the higher grade.
    pub grade_a: f64,
    pub grade_b: f64,
    pub grade_c: f64,
    pub grade_d: f64,

    /// Additive adjustments applied to the raw weighted overall before
    /// grading, clamped to [0, 100].
    pub penalty_not_mobile_friendly: f64,
    pub penalty_no_https: f64,
    pub bonus_quick_wins: f64,
    /// Mobile-visual score below this counts as not mobile friendly.
    pub mobile_friendly_floor: f64,

    /// Lead-priority tier cutoffs.
    pub tier_hot: f64,
    pub tier_warm: f64,

    /// Lead-priority dimension caps (sum to 100).
    pub cap_quality_gap: f64,
    pub cap_budget_likelihood: f64,
    pub cap_urgency: f64,
    pub cap_industry_fit: f64,
    pub cap_company_size: f64,
    pub cap_engagement: f64,

    /// Urgency points per critical / high severity issue.
    pub urgency_per_critical: f64,
    pub urgency_per_high: f64,

    /// Budget-likelihood components: base plus additive bonuses for a
    /// high-fit industry and pricing/premium signals in the findings.
    pub budget_base: f64,
    pub budget_industry_bonus: f64,
    pub budget_pricing_bonus: f64,

    /// Industry-fit points when the industry is known but not high-fit,
    /// and when it is unspecified. High-fit gets `cap_industry_fit`.
    pub industry_fit_other: f64,
    pub industry_fit_unknown: f64,

    /// Company-size points per bucket. The "11-50" sweet spot gets
    /// `cap_company_size`.
    pub size_micro: f64,
    pub size_large: f64,
    pub size_other: f64,

    /// Engagement points when no quick wins surfaced; quick wins present
    /// gets `cap_engagement`.
    pub engagement_floor: f64,

    /// Industries that historically convert well.
    pub high_fit_industries: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weight_design: 30.0,
            weight_seo: 30.0,
            weight_content: 20.0,
            weight_social: 20.0,

            grade_a: 85.0,
            grade_b: 70.0,
            grade_c: 55.0,
            grade_d: 40.0,

            penalty_not_mobile_friendly: 15.0,
            penalty_no_https: 10.0,
            bonus_quick_wins: 5.0,
            mobile_friendly_floor: 50.0,

            tier_hot: 70.0,
            tier_warm: 45.0,

            cap_quality_gap: 25.0,
            cap_budget_likelihood: 25.0,
            cap_urgency: 20.0,
            cap_industry_fit: 15.0,
            cap_company_size: 10.0,
            cap_engagement: 5.0,

            urgency_per_critical: 5.0,
            urgency_per_high: 2.0,

            budget_base: 10.0,
            budget_industry_bonus: 8.0,
            budget_pricing_bonus: 7.0,

            industry_fit_other: 8.0,
            industry_fit_unknown: 5.0,

            size_micro: 4.0,
            size_large: 8.0,
            size_other: 5.0,

            engagement_floor: 2.0,

            high_fit_industries: vec![
                "legal".to_string(),
                "medical".to_string(),
                "dental".to_string(),
                "finance".to_string(),
                "real_estate".to_string(),
                "home_services".to_string(),
            ],
        }
    }
}
