//! Terminal tables for totals and the proposal list.

use comfy_table::{Attribute, Cell, Color, Table};

use crate::coerce::number_text;
use crate::currency::format_currency;
use crate::model::Proposal;
use crate::totals::ProposalTotals;

const RED: Color = Color::Rgb { r: 185, g: 28, b: 28 };
const GREEN: Color = Color::Rgb { r: 4, g: 120, b: 87 };

/// One row of `list`: a stored file and what it adds up to.
pub struct ProposalListing {
    pub file: String,
    pub name: String,
    pub scopes: usize,
    pub grand_total: String,
}

impl ProposalListing {
    pub fn new(file: String, proposal: &Proposal, totals: &ProposalTotals) -> Self {
        ProposalListing {
            file,
            name: proposal.name.clone(),
            scopes: proposal.scopes.len(),
            grand_total: format_currency(totals.grand_total, &proposal.commercial_terms.currency),
        }
    }
}

fn money_cell(amount: f64, currency: &str) -> Cell {
    let cell = Cell::new(format_currency(amount, currency));
    if amount < 0.0 { cell.fg(RED) } else { cell }
}

pub fn scope_table(proposal: &Proposal, totals: &ProposalTotals) -> Table {
    let currency = &proposal.commercial_terms.currency;
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Scope"),
        Cell::new("Trade"),
        Cell::new("Direct"),
        Cell::new("Alternates"),
        Cell::new("Subtotal"),
    ]);

    for (idx, (scope, sub)) in proposal.scopes.iter().zip(&totals.by_scope).enumerate() {
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(scope.heading()),
            Cell::new(scope.trade.label()),
            money_cell(sub.totals.direct, currency),
            money_cell(sub.totals.alternates, currency),
            money_cell(sub.totals.subtotal, currency),
        ]);
    }
    table
}

/// Markup chain from direct total to grand total.
pub fn summary_table(proposal: &Proposal, totals: &ProposalTotals) -> Table {
    let terms = &proposal.commercial_terms;
    let currency = &terms.currency;
    let mut table = Table::new();
    table.set_header(vec![Cell::new("Item"), Cell::new("Amount")]);

    table.add_row(vec![Cell::new("Direct Total"), money_cell(totals.direct_total, currency)]);
    table.add_row(vec![
        Cell::new(format!("Overhead ({}%)", number_text(terms.overhead_pct))),
        money_cell(totals.overhead, currency),
    ]);
    table.add_row(vec![
        Cell::new(format!("Profit ({}%)", number_text(terms.profit_pct))),
        money_cell(totals.profit, currency),
    ]);
    if terms.include_bond {
        table.add_row(vec![
            Cell::new(format!("Bond ({}%)", number_text(terms.bond_pct))),
            money_cell(totals.bond, currency),
        ]);
    }
    table.add_row(vec![Cell::new("Taxable"), money_cell(totals.taxable, currency)]);
    table.add_row(vec![
        Cell::new(format!("Tax ({}%)", number_text(terms.tax_rate_pct))),
        money_cell(totals.tax, currency),
    ]);
    table.add_row(vec![
        Cell::new("Alternates (net)"),
        money_cell(totals.alternates_total, currency),
    ]);

    let grand =
        Cell::new(format_currency(totals.grand_total, currency)).add_attribute(Attribute::Bold);
    let grand = if totals.grand_total < 0.0 { grand.fg(RED) } else { grand.fg(GREEN) };
    table.add_row(vec![Cell::new("Grand Total").add_attribute(Attribute::Bold), grand]);
    table
}

pub fn list_table(rows: &[ProposalListing]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("File"),
        Cell::new("Proposal"),
        Cell::new("Scopes"),
        Cell::new("Grand Total"),
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.file),
            Cell::new(&row.name),
            Cell::new(row.scopes),
            Cell::new(&row.grand_total),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::normalize::Normalizer;
    use crate::totals::compute_proposal_totals;
    use serde_json::json;

    fn sample(include_bond: bool) -> Proposal {
        Normalizer::with_ids(SequentialIds::new("t")).proposal(&json!({
            "name": "Harbor Point",
            "commercialTerms": { "includeBond": include_bond, "bondPct": 5 },
            "scopes": [
                {
                    "trade": "Curtain Wall",
                    "title": "East Elevation",
                    "pricingItems": [{ "qty": 1, "unitRate": 1000 }],
                    "alternates": [{ "addOrDeduct": "DEDUCT", "amount": 250 }]
                },
                { "trade": "Service", "services": [{ "qty": 2, "unitRate": 1500.5 }] }
            ]
        }))
    }

    #[test]
    fn scope_table_lists_every_scope() {
        let proposal = sample(false);
        let totals = compute_proposal_totals(&proposal);
        let out = scope_table(&proposal, &totals).to_string();

        assert!(out.contains("East Elevation"));
        assert!(out.contains("Curtain Wall"));
        assert!(out.contains("Service Scope"));
        assert!(out.contains("-$250.00"));
        assert!(out.contains("$3,001.00"));
    }

    #[test]
    fn summary_table_shows_bond_only_when_included() {
        let proposal = sample(false);
        let totals = compute_proposal_totals(&proposal);
        let out = summary_table(&proposal, &totals).to_string();
        assert!(!out.contains("Bond"));
        assert!(out.contains("Overhead (10%)"));
        assert!(out.contains("$4,001.00"));
        assert!(out.contains("Grand Total"));

        let proposal = sample(true);
        let totals = compute_proposal_totals(&proposal);
        assert!(summary_table(&proposal, &totals).to_string().contains("Bond (5%)"));
    }

    #[test]
    fn list_table_shows_totals() {
        let proposal = sample(false);
        let totals = compute_proposal_totals(&proposal);
        let row = ProposalListing::new("harbor-point_t-3.json".into(), &proposal, &totals);
        assert_eq!(row.scopes, 2);
        assert_eq!(row.grand_total, "$4,591.21");

        let out = list_table(&[row]).to_string();
        assert!(out.contains("harbor-point_t-3.json"));
        assert!(out.contains("Harbor Point"));
    }
}
