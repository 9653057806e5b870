//! Plain-text rendering of a report for the terminal.

use std::fmt::Write;

use parcel_core::analysis::money;
use parcel_shared::{AssumptionField, FullValuationReport, SizeUnit, ValuationAssumptions};

fn source(a: &ValuationAssumptions, field: AssumptionField) -> String {
    a.source_of(field)
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn bullets(out: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(out, "    - {item}");
    }
}

/// Render the whole report as an indented text block.
pub(crate) fn report_text(report: &FullValuationReport) -> String {
    let mut out = String::new();
    let asset = &report.asset;
    let a = &report.assumptions;
    let v = &report.valuation;
    let e = &report.economics;
    let f = &report.feasibility;
    let n = &report.developer_notes;
    let s = &report.narrative;

    let _ = writeln!(out);
    let _ = writeln!(out, "  {}, {}", asset.name, asset.location);
    let _ = writeln!(out, "  {} / {}", asset.asset_type, asset.status);
    let _ = writeln!(out, "  Report {} ({})", report.id, report.generated_at.to_rfc3339());
    let _ = writeln!(out);

    let _ = writeln!(out, "  Valuation ({})", v.model_used);
    let _ = writeln!(out, "    Central:   {} {}", money(v.value_central), v.currency);
    let _ = writeln!(out, "    Range:     {} to {}", money(v.value_low), money(v.value_high));
    let _ = writeln!(out, "    NOI:       {}", money(v.metrics.noi_effective));
    let _ = writeln!(out, "    Cap rate:  {:.2}%", v.metrics.cap_rate_applied);
    if let Some(y) = v.metrics.gross_yield {
        let _ = writeln!(out, "    Yield:     {y:.2}%");
    }
    if let (Some(ppu), Some(size)) = (v.metrics.price_per_unit, &asset.size) {
        let unit = match size.unit {
            SizeUnit::Sqm => "sqm",
            SizeUnit::Units => "unit",
        };
        let _ = writeln!(out, "    Per {unit}:  {}", money(ppu));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "  Assumptions");
    let rows = [
        ("NOI", money(a.estimated_noi), AssumptionField::EstimatedNoi),
        ("Cap rate", format!("{:.2}%", a.market_cap_rate), AssumptionField::MarketCapRate),
        ("Discount rate", format!("{:.2}%", a.discount_rate), AssumptionField::DiscountRate),
        (
            "Income growth",
            format!("{:.2}%", a.growth_rate_income),
            AssumptionField::GrowthRateIncome,
        ),
        (
            "Expense growth",
            format!("{:.2}%", a.growth_rate_expenses),
            AssumptionField::GrowthRateExpenses,
        ),
        ("Exit yield", format!("{:.2}%", a.exit_yield), AssumptionField::ExitYield),
        ("Vacancy", format!("{:.2}%", a.vacancy_rate), AssumptionField::VacancyRate),
        ("Holding period", format!("{} yrs", a.holding_period), AssumptionField::HoldingPeriod),
    ];
    for (label, value, field) in rows {
        let _ = writeln!(out, "    {label:<15} {value:>14}  [{}]", source(a, field));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "  Economics");
    let _ = writeln!(out, "    Project cost:  {}", money(e.total_project_cost));
    let _ = writeln!(out, "    Revenue:       {}", money(e.projected_revenue));
    let _ = writeln!(
        out,
        "    Profit:        {} ({:.1}% margin)",
        money(e.projected_profit),
        e.profit_margin
    );
    let _ = writeln!(out, "    ROI:           {:.1}%", e.roi);
    let _ = writeln!(out, "    Break-even:    {:.1} yrs", e.break_even_years);
    if !e.summary.is_empty() {
        let _ = writeln!(out, "    {}", e.summary);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "  Feasibility: {}/100, {} risk", f.score, f.risk_level);
    let _ = writeln!(out, "    Verdict: {}", f.verdict);
    bullets(&mut out, &f.strengths);
    bullets(&mut out, &f.weaknesses);
    let _ = writeln!(out);

    let _ = writeln!(out, "  Developer notes");
    let _ = writeln!(out, "    Zoning:         {}", n.zoning);
    let _ = writeln!(out, "    Construction:   {}", n.construction);
    let _ = writeln!(out, "    Infrastructure: {}", n.infrastructure);
    bullets(&mut out, &n.regulatory_flags);
    bullets(&mut out, &n.recommendations);
    let _ = writeln!(out);

    let _ = writeln!(out, "  Narrative");
    let _ = writeln!(out, "    {}", s.executive_summary);
    let _ = writeln!(out, "    Thesis: {}", s.investment_thesis);
    let _ = writeln!(out, "    Market: {}", s.market_context);
    let _ = writeln!(out, "    Tokenization: {}", s.tokenization_angle);
    bullets(&mut out, &s.risk_factors);
    let _ = writeln!(out);

    out
}
