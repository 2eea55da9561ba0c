//! Commercial totals for a proposal.
//!
//! Markups stack in a fixed order and each one is computed on everything
//! before it:
//!
//! ```text
//! direct ──► overhead ──► profit ──► bond (if included) ──► tax ──► + alternates
//!            on direct    on direct   on direct+overhead     on all     untaxed,
//!                         +overhead   +profit                above      unmarked
//! ```
//!
//! Reordering any step changes the grand total.

use serde::Serialize;

use crate::model::{Alternate, LineItem, Proposal, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeTotals {
    pub direct_pricing: f64,
    pub services: f64,
    pub gen_conds: f64,
    pub direct: f64,
    /// Net of ADD and DEDUCT alternates; negative when deducts win.
    pub alternates: f64,
    pub subtotal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSubtotal {
    pub id: String,
    #[serde(flatten)]
    pub totals: ScopeTotals,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalTotals {
    pub by_scope: Vec<ScopeSubtotal>,
    pub direct_total: f64,
    pub alternates_total: f64,
    pub overhead: f64,
    pub profit: f64,
    pub bond: f64,
    pub taxable: f64,
    pub tax: f64,
    pub grand_total: f64,
}

pub fn line_sum(items: &[LineItem]) -> f64 {
    items.iter().fold(0.0, |sum, it| sum + it.line_total())
}

pub fn alternates_net(alternates: &[Alternate]) -> f64 {
    alternates.iter().fold(0.0, |sum, a| sum + a.signed_amount())
}

pub fn calc_scope_totals(scope: &Scope) -> ScopeTotals {
    let direct_pricing = line_sum(&scope.pricing_items);
    let services = line_sum(&scope.services);
    let gen_conds = line_sum(&scope.general_conditions);
    let direct = direct_pricing + services + gen_conds;
    let alternates = alternates_net(&scope.alternates);

    ScopeTotals {
        direct_pricing,
        services,
        gen_conds,
        direct,
        alternates,
        subtotal: direct + alternates,
    }
}

pub fn compute_proposal_totals(proposal: &Proposal) -> ProposalTotals {
    let terms = &proposal.commercial_terms;

    let by_scope: Vec<ScopeSubtotal> = proposal
        .scopes
        .iter()
        .map(|s| ScopeSubtotal {
            id: s.id.clone(),
            totals: calc_scope_totals(s),
        })
        .collect();
    let direct_total = by_scope.iter().fold(0.0, |sum, s| sum + s.totals.direct);
    let alternates_total = by_scope.iter().fold(0.0, |sum, s| sum + s.totals.alternates);

    let overhead = (terms.overhead_pct / 100.0) * direct_total;
    let profit = (terms.profit_pct / 100.0) * (direct_total + overhead);
    let bond = if terms.include_bond {
        (terms.bond_pct / 100.0) * (direct_total + overhead + profit)
    } else {
        0.0
    };
    let taxable = direct_total + overhead + profit + bond;
    let tax = (terms.tax_rate_pct / 100.0) * taxable;
    let grand_total = taxable + tax + alternates_total;

    ProposalTotals {
        by_scope,
        direct_total,
        alternates_total,
        overhead,
        profit,
        bond,
        taxable,
        tax,
        grand_total,
    }
}
