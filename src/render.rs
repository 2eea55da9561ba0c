//! Printable preview of a proposal.
//!
//! A [`PreviewContext`] flattens a proposal and its totals into display
//! strings; a Tera template turns that into Typst source. All user text is
//! passed through the `typst` filter, which emits an escaped string literal,
//! so nothing a user types can break the markup.

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tera::{Context, Tera, Value};
use tracing::info;

use crate::coerce::number_text;
use crate::currency::format_currency;
use crate::error::{AppError, Result};
use crate::model::{Client, Company, LineSection, Proposal, Scope};
use crate::totals::{ProposalTotals, calc_scope_totals, compute_proposal_totals, line_sum};

pub const TEMPLATE_NAME: &str = "proposal.tera";

// Embed template at compile time to ensure availability
const DEFAULT_TEMPLATE: &str = include_str!("../templates/proposal.tera");

const EMPTY: &str = "—";

#[derive(Debug, Serialize)]
pub struct PreviewContext {
    pub title: String,
    pub version: String,
    pub prepared_on: String,
    pub company: Company,
    pub client: Option<Client>,
    pub project_name: String,
    pub project_number: String,
    pub project_location: String,
    pub bid_date: String,
    pub show_breakdown: bool,
    pub show_unit_rates: bool,
    pub scopes: Vec<ScopeView>,
    pub summary: Vec<SummaryRow>,
    pub grand_total: String,
    pub payment_terms: String,
    pub warranty: String,
    pub disclaimers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ScopeView {
    pub number: usize,
    pub heading: String,
    pub trade: String,
    pub system: String,
    pub finish: String,
    pub glass_spec: Option<String>,
    pub specs: Vec<SpecRow>,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    pub notes: Option<String>,
    pub sections: Vec<SectionView>,
    pub alternates: Vec<AlternateRow>,
    pub subtotal: String,
}

#[derive(Debug, Serialize)]
pub struct SpecRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SectionView {
    pub title: &'static str,
    pub rows: Vec<LineRow>,
    pub total: String,
}

#[derive(Debug, Serialize)]
pub struct LineRow {
    pub description: String,
    pub unit: String,
    pub qty: String,
    pub unit_rate: String,
    pub total: String,
}

#[derive(Debug, Serialize)]
pub struct AlternateRow {
    pub label: String,
    pub description: String,
    pub kind: &'static str,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub amount: String,
}

fn or_dash(s: &str) -> String {
    if s.is_empty() { EMPTY.to_string() } else { s.to_string() }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

impl PreviewContext {
    pub fn build(proposal: &Proposal, totals: &ProposalTotals, prepared_on: &str) -> Self {
        let terms = &proposal.commercial_terms;
        let money = |amount: f64| format_currency(amount, &terms.currency);

        let mut company = proposal.company.clone();
        if company.name.is_empty() {
            company.name = "Company".to_string();
        }

        let scopes = proposal
            .scopes
            .iter()
            .enumerate()
            .map(|(idx, scope)| scope_view(idx + 1, scope, &terms.currency))
            .collect();

        let mut summary = vec![
            SummaryRow {
                label: "Direct Total".to_string(),
                amount: money(totals.direct_total),
            },
            SummaryRow {
                label: format!("Overhead ({}%)", number_text(terms.overhead_pct)),
                amount: money(totals.overhead),
            },
            SummaryRow {
                label: format!("Profit ({}%)", number_text(terms.profit_pct)),
                amount: money(totals.profit),
            },
        ];
        if terms.include_bond {
            summary.push(SummaryRow {
                label: format!("Bond ({}%)", number_text(terms.bond_pct)),
                amount: money(totals.bond),
            });
        }
        summary.push(SummaryRow {
            label: format!("Tax ({}%)", number_text(terms.tax_rate_pct)),
            amount: money(totals.tax),
        });
        if totals.alternates_total != 0.0 {
            summary.push(SummaryRow {
                label: "Alternates (net)".to_string(),
                amount: money(totals.alternates_total),
            });
        }

        PreviewContext {
            title: if proposal.name.is_empty() {
                "Proposal".to_string()
            } else {
                proposal.name.clone()
            },
            version: proposal.version.clone(),
            prepared_on: prepared_on.to_string(),
            company,
            client: (!proposal.client.is_blank()).then(|| proposal.client.clone()),
            project_name: proposal.project.name.clone(),
            project_number: or_dash(&proposal.project.number),
            project_location: or_dash(&proposal.project.location),
            bid_date: or_dash(&proposal.project.bid_date),
            show_breakdown: terms.show_breakdown,
            show_unit_rates: terms.show_unit_rates,
            scopes,
            summary,
            grand_total: money(totals.grand_total),
            payment_terms: terms.payment_terms.clone(),
            warranty: terms.warranty.clone(),
            disclaimers: proposal.disclaimers.clone(),
        }
    }
}

fn scope_view(number: usize, scope: &Scope, currency: &str) -> ScopeView {
    let money = |amount: f64| format_currency(amount, currency);
    let totals = calc_scope_totals(scope);

    let specs = scope
        .performance
        .entries()
        .into_iter()
        .chain(scope.structural.entries())
        .map(|(label, value)| SpecRow {
            label,
            value: value.to_string(),
        })
        .collect();

    let sections = LineSection::ALL
        .into_iter()
        .filter(|section| !scope.lines(*section).is_empty())
        .map(|section| {
            let items = scope.lines(section);
            SectionView {
                title: section.title(),
                rows: items
                    .iter()
                    .map(|it| LineRow {
                        description: it.description.clone(),
                        unit: it.unit.clone(),
                        qty: number_text(it.qty),
                        unit_rate: money(it.unit_rate),
                        total: money(it.line_total()),
                    })
                    .collect(),
                total: money(line_sum(items)),
            }
        })
        .collect();

    ScopeView {
        number,
        heading: scope.heading().to_string(),
        trade: scope.trade.label().to_string(),
        system: or_dash(&scope.system),
        finish: or_dash(&scope.finish),
        glass_spec: non_empty(&scope.glass_spec),
        specs,
        inclusions: scope.inclusions.clone(),
        exclusions: scope.exclusions.clone(),
        notes: non_empty(&scope.notes),
        sections,
        alternates: scope
            .alternates
            .iter()
            .map(|a| AlternateRow {
                label: a.label.clone(),
                description: a.description.clone(),
                kind: a.add_or_deduct.label(),
                amount: money(a.signed_amount()),
            })
            .collect(),
        subtotal: money(totals.subtotal),
    }
}

/// Escapes text into a quoted Typst string literal.
pub fn typst_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn typst_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(Value::String(typst_string(&text)))
}

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Uses the template compiled into the binary.
    pub fn embedded() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, DEFAULT_TEMPLATE)?;
        Ok(Renderer::with_filters(tera))
    }

    /// Uses `<dir>/proposal.tera`, writing the default template there first
    /// when missing so users can customize it.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(AppError::io(dir))?;
        let template_path = dir.join(TEMPLATE_NAME);
        if !template_path.exists() {
            println!("✨ Initializing default template...");
            fs::write(&template_path, DEFAULT_TEMPLATE).map_err(AppError::io(&template_path))?;
        }
        let content = fs::read_to_string(&template_path).map_err(AppError::io(&template_path))?;
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, &content)?;
        Ok(Renderer::with_filters(tera))
    }

    fn with_filters(mut tera: Tera) -> Self {
        tera.register_filter("typst", typst_filter);
        Renderer { tera }
    }

    pub fn render(&self, proposal: &Proposal, prepared_on: &str) -> Result<String> {
        let totals = compute_proposal_totals(proposal);
        let preview = PreviewContext::build(proposal, &totals, prepared_on);
        let context = Context::from_serialize(&preview)?;
        let rendered = self.tera.render(TEMPLATE_NAME, &context)?;
        info!(scopes = proposal.scopes.len(), bytes = rendered.len(), "preview rendered");
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::model::{AddOrDeduct, Trade};
    use crate::normalize::Normalizer;
    use serde_json::json;

    fn sample() -> Proposal {
        Normalizer::with_ids(SequentialIds::new("r")).proposal(&json!({
            "name": "Maple Ridge Office",
            "company": { "name": "Harbor Glass Co.", "phone": "(703) 555-0123" },
            "project": { "number": "MR-042", "bidDate": "2025-08-20" },
            "scopes": [{
                "trade": "Storefront",
                "title": "Main Entry \"A\" Storefront",
                "system": "Series 451T",
                "glassSpec": "1\" IGU Low-E",
                "performance": { "uValue": "0.29" },
                "inclusions": ["Shop drawings & submittals"],
                "exclusions": "Electrical for access control",
                "pricingItems": [{ "id": "p1", "description": "IGU glazing", "unit": "SF", "qty": 100, "unitRate": 25 }],
                "services": [{ "id": "s1", "description": "Field measure", "qty": 1, "unitRate": 350 }],
                "alternates": [{ "id": "a1", "label": "Alt 1", "addOrDeduct": "DEDUCT", "amount": 900 }]
            }]
        }))
    }

    #[test]
    fn typst_strings_escape_quotes_and_backslashes() {
        assert_eq!(typst_string(r#"1" IGU \ "A""#), r#""1\" IGU \\ \"A\"""#);
        assert_eq!(typst_string("two\nlines"), r#""two\nlines""#);
    }

    #[test]
    fn context_fills_placeholders_and_summary() {
        let mut proposal = sample();
        proposal.commercial_terms.include_bond = true;
        proposal.commercial_terms.bond_pct = 2.5;
        let totals = compute_proposal_totals(&proposal);
        let ctx = PreviewContext::build(&proposal, &totals, "08/20/2025");

        assert_eq!(ctx.project_location, EMPTY);
        assert_eq!(ctx.project_number, "MR-042");
        assert!(ctx.client.is_none());

        let labels: Vec<&str> = ctx.summary.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Direct Total",
                "Overhead (10%)",
                "Profit (10%)",
                "Bond (2.5%)",
                "Tax (0%)",
                "Alternates (net)",
            ]
        );
        assert_eq!(ctx.summary[0].amount, "$2,850.00");
        assert_eq!(ctx.summary[5].amount, "-$900.00");

        let scope = &ctx.scopes[0];
        assert_eq!(scope.number, 1);
        assert_eq!(scope.finish, EMPTY);
        assert_eq!(scope.sections.len(), 2);
        assert_eq!(scope.sections[0].rows[0].total, "$2,500.00");
        assert_eq!(scope.alternates[0].kind, AddOrDeduct::Deduct.label());
        assert_eq!(scope.subtotal, "$1,950.00");
        assert_eq!(scope.specs[0].label, "U-Value");
    }

    #[test]
    fn bond_row_is_hidden_when_excluded() {
        let proposal = sample();
        let totals = compute_proposal_totals(&proposal);
        let ctx = PreviewContext::build(&proposal, &totals, "today");
        assert!(ctx.summary.iter().all(|r| !r.label.starts_with("Bond")));
    }

    #[test]
    fn renders_escaped_typst_document() {
        let proposal = sample();
        let doc = Renderer::embedded().unwrap().render(&proposal, "08/20/2025").unwrap();

        assert!(doc.contains(r#"#"Maple Ridge Office""#));
        assert!(doc.contains(r#""1. Main Entry \"A\" Storefront""#));
        assert!(doc.contains(r#""Shop drawings & submittals""#));
        assert!(doc.contains("Grand Total"));
        assert!(doc.contains(r#""Field measure""#));
    }

    #[test]
    fn breakdown_and_unit_rates_follow_flags() {
        let mut proposal = sample();
        proposal.commercial_terms.show_unit_rates = false;
        let renderer = Renderer::embedded().unwrap();

        let doc = renderer.render(&proposal, "today").unwrap();
        assert!(doc.contains("Direct Pricing Items"));
        assert!(!doc.contains("[*Unit Rate*]"));

        proposal.commercial_terms.show_breakdown = false;
        let doc = renderer.render(&proposal, "today").unwrap();
        assert!(!doc.contains("Direct Pricing Items"));
        assert!(doc.contains("Grand Total"));
    }

    #[test]
    fn user_template_is_written_once_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        Renderer::from_dir(dir.path()).unwrap();
        let path = dir.path().join(TEMPLATE_NAME);
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_TEMPLATE);

        fs::write(&path, "= {{ title | typst }} / {{ scopes | length }}").unwrap();
        let mut proposal = sample();
        proposal.add_scope("extra".into(), Trade::Service);
        let doc = Renderer::from_dir(dir.path()).unwrap().render(&proposal, "today").unwrap();
        assert_eq!(doc, r#"= "Maple Ridge Office" / 2"#);
    }
}
