//! Building blocks for pricing glazing and storefront proposals.
//!
//! Raw JSON goes in through [`normalize_proposal`] / [`normalize_scope`],
//! which never fail; the typed [`Proposal`] they return feeds
//! [`compute_proposal_totals`] and the Typst preview in [`render`].

pub mod coerce;
pub mod currency;
pub mod error;
pub mod ids;
pub mod model;
pub mod normalize;
pub mod render;
pub mod report;
pub mod settings;
pub mod store;
pub mod totals;
pub mod wizard;

pub use currency::{CurrencyError, format_currency, try_format_currency};
pub use error::{AppError, Result};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use model::{
    AddOrDeduct, Alternate, Client, CommercialTerms, Company, LineItem, LineSection, Performance,
    ProjectInfo, Proposal, ProposalDefaults, Scope, Structural, Trade,
};
pub use normalize::{Normalizer, normalize_proposal, normalize_scope};
pub use totals::{ProposalTotals, ScopeTotals, calc_scope_totals, compute_proposal_totals};
