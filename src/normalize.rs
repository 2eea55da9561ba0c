//! Decoding of untrusted proposal documents.
//!
//! Every stored, imported or seeded document passes through here before the
//! rest of the program sees it. Decoding is total: each field has exactly
//! one fallback, so any JSON value, including `null`, arrays and bare
//! scalars, yields a valid [`Proposal`] or [`Scope`].
//!
//! ```rust
//! use proposal_builder::normalize::normalize_scope;
//! use proposal_builder::model::Trade;
//! use serde_json::json;
//!
//! let scope = normalize_scope(&json!({ "trade": "Skylights", "inclusions": "Caulking\nSealants" }));
//! assert_eq!(scope.trade, Trade::Storefront);
//! assert_eq!(scope.title, "Storefront Scope");
//! assert_eq!(scope.inclusions, vec!["Caulking", "Sealants"]);
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::coerce::{existing_id, field, finite_or, string_list, text_or, truthy};
use crate::ids::{IdGenerator, UuidIds};
use crate::model::{
    AddOrDeduct, Alternate, Client, CommercialTerms, Company, LineItem, Performance, ProjectInfo,
    Proposal, ProposalDefaults, Scope, Structural, Trade, default_title,
};

/// Normalizes a scope with random ids.
pub fn normalize_scope(raw: &Value) -> Scope {
    Normalizer::new().scope(raw)
}

/// Normalizes a proposal with random ids, built-in defaults and the current time.
pub fn normalize_proposal(raw: &Value) -> Proposal {
    Normalizer::new().proposal(raw)
}

/// ISO 8601 timestamp with millisecond precision and a `Z` suffix.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct Normalizer<G = UuidIds> {
    ids: G,
    defaults: ProposalDefaults,
    fixed_time: Option<DateTime<Utc>>,
}

impl Normalizer<UuidIds> {
    pub fn new() -> Self {
        Normalizer::with_ids(UuidIds)
    }
}

impl Default for Normalizer<UuidIds> {
    fn default() -> Self {
        Normalizer::new()
    }
}

impl<G: IdGenerator> Normalizer<G> {
    pub fn with_ids(ids: G) -> Self {
        Normalizer {
            ids,
            defaults: ProposalDefaults::default(),
            fixed_time: None,
        }
    }

    /// Replaces the built-in defaults used to fill gaps in proposals.
    pub fn with_defaults(mut self, defaults: ProposalDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Stamps missing timestamps with `at` instead of the current time.
    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.fixed_time = Some(at);
        self
    }

    pub fn defaults(&self) -> &ProposalDefaults {
        &self.defaults
    }

    pub fn next_id(&mut self) -> String {
        self.ids.next_id()
    }

    pub fn now(&self) -> String {
        timestamp(self.fixed_time.unwrap_or_else(Utc::now))
    }

    fn id_for(&mut self, raw: &Value) -> String {
        existing_id(field(raw, "id")).unwrap_or_else(|| self.ids.next_id())
    }

    pub fn scope(&mut self, raw: &Value) -> Scope {
        let trade = match field(raw, "trade") {
            Some(Value::String(label)) => Trade::from_label(label).unwrap_or_else(|| {
                debug!(trade = %label, "unknown trade, using {}", Trade::default());
                Trade::default()
            }),
            _ => Trade::default(),
        };

        Scope {
            id: self.id_for(raw),
            trade,
            title: text_or(field(raw, "title"), &default_title(trade)),
            system: text_or(field(raw, "system"), ""),
            finish: text_or(field(raw, "finish"), ""),
            glass_spec: text_or(field(raw, "glassSpec"), ""),
            performance: performance(field(raw, "performance")),
            structural: structural(field(raw, "structural")),
            inclusions: string_list(field(raw, "inclusions")),
            exclusions: string_list(field(raw, "exclusions")),
            notes: text_or(field(raw, "notes"), ""),
            schedule: schedule(field(raw, "schedule")),
            pricing_items: self.line_items(field(raw, "pricingItems")),
            services: self.line_items(field(raw, "services")),
            general_conditions: self.line_items(field(raw, "generalConditions")),
            alternates: self.alternates(field(raw, "alternates")),
        }
    }

    fn line_items(&mut self, raw: Option<&Value>) -> Vec<LineItem> {
        let Some(Value::Array(entries)) = raw else {
            return Vec::new();
        };
        entries
            .iter()
            .map(|entry| LineItem {
                id: self.id_for(entry),
                description: text_or(field(entry, "description"), ""),
                unit: text_or(field(entry, "unit"), "LS"),
                qty: finite_or(field(entry, "qty"), 1.0),
                unit_rate: finite_or(field(entry, "unitRate"), 0.0),
            })
            .collect()
    }

    fn alternates(&mut self, raw: Option<&Value>) -> Vec<Alternate> {
        let Some(Value::Array(entries)) = raw else {
            return Vec::new();
        };
        entries
            .iter()
            .map(|entry| Alternate {
                id: self.id_for(entry),
                label: text_or(field(entry, "label"), "Alt #"),
                description: text_or(field(entry, "description"), ""),
                add_or_deduct: match field(entry, "addOrDeduct") {
                    Some(Value::String(kind)) if kind == "DEDUCT" => AddOrDeduct::Deduct,
                    _ => AddOrDeduct::Add,
                },
                amount: finite_or(field(entry, "amount"), 0.0),
            })
            .collect()
    }

    pub fn proposal(&mut self, raw: &Value) -> Proposal {
        let defaults = self.defaults.clone();

        let scopes = match field(raw, "scopes") {
            Some(Value::Array(entries)) => entries.iter().map(|s| self.scope(s)).collect(),
            _ => Vec::new(),
        };
        let disclaimers = match field(raw, "disclaimers") {
            None => defaults.disclaimers.clone(),
            present => string_list(present),
        };

        Proposal {
            id: self.id_for(raw),
            name: text_or(field(raw, "name"), &defaults.name),
            version: text_or(field(raw, "version"), &defaults.version),
            company: company(field(raw, "company"), &defaults.company),
            client: client(field(raw, "client"), &defaults.client),
            project: project(field(raw, "project"), &defaults.project),
            commercial_terms: commercial_terms(
                field(raw, "commercialTerms"),
                &defaults.commercial_terms,
            ),
            scopes,
            disclaimers,
            created_at: self.timestamp_for(field(raw, "createdAt")),
            updated_at: self.timestamp_for(field(raw, "updatedAt")),
        }
    }

    /// Keeps a stored timestamp only when it is a non-empty string or a
    /// non-zero number; anything else is restamped.
    fn timestamp_for(&self, raw: Option<&Value>) -> String {
        existing_id(raw).unwrap_or_else(|| self.now())
    }
}

/// Free-text group: taken from an object only, unknown keys dropped.
fn free_text(group: Option<&Value>, key: &str) -> Option<String> {
    match group.and_then(|g| field(g, key)) {
        None | Some(Value::Null) => None,
        Some(v) => Some(text_or(Some(v), "")),
    }
}

fn performance(raw: Option<&Value>) -> Performance {
    Performance {
        u_value: free_text(raw, "uValue"),
        shgc: free_text(raw, "shgc"),
        vt: free_text(raw, "vt"),
        air_infiltration: free_text(raw, "airInfiltration"),
    }
}

fn structural(raw: Option<&Value>) -> Structural {
    Structural {
        design_psf: free_text(raw, "designPSF"),
        deflection_limit: free_text(raw, "deflectionLimit"),
    }
}

fn schedule(raw: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(map)) = raw else {
        return BTreeMap::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), text_or(Some(v), "")))
        .collect()
}

fn merged(group: Option<&Value>, key: &str, default: &str) -> String {
    text_or(group.and_then(|g| field(g, key)), default)
}

fn company(raw: Option<&Value>, d: &Company) -> Company {
    Company {
        name: merged(raw, "name", &d.name),
        address: merged(raw, "address", &d.address),
        phone: merged(raw, "phone", &d.phone),
        email: merged(raw, "email", &d.email),
        website: merged(raw, "website", &d.website),
        contact: merged(raw, "contact", &d.contact),
        logo_data_url: merged(raw, "logoDataUrl", &d.logo_data_url),
    }
}

fn client(raw: Option<&Value>, d: &Client) -> Client {
    Client {
        name: merged(raw, "name", &d.name),
        contact: merged(raw, "contact", &d.contact),
        email: merged(raw, "email", &d.email),
        phone: merged(raw, "phone", &d.phone),
        address: merged(raw, "address", &d.address),
    }
}

fn project(raw: Option<&Value>, d: &ProjectInfo) -> ProjectInfo {
    ProjectInfo {
        name: merged(raw, "name", &d.name),
        number: merged(raw, "number", &d.number),
        location: merged(raw, "location", &d.location),
        bid_date: merged(raw, "bidDate", &d.bid_date),
    }
}

fn commercial_terms(raw: Option<&Value>, d: &CommercialTerms) -> CommercialTerms {
    let pct = |key: &str, default: f64| match raw.and_then(|g| field(g, key)) {
        None | Some(Value::Null) => default,
        present => finite_or(present, default),
    };
    let flag = |key: &str, default: bool| match raw.and_then(|g| field(g, key)) {
        None | Some(Value::Null) => default,
        Some(v) => truthy(v),
    };

    CommercialTerms {
        tax_rate_pct: pct("taxRatePct", d.tax_rate_pct),
        overhead_pct: pct("overheadPct", d.overhead_pct),
        profit_pct: pct("profitPct", d.profit_pct),
        bond_pct: pct("bondPct", d.bond_pct),
        currency: merged(raw, "currency", &d.currency),
        show_unit_rates: flag("showUnitRates", d.show_unit_rates),
        show_breakdown: flag("showBreakdown", d.show_breakdown),
        include_bond: flag("includeBond", d.include_bond),
        payment_terms: merged(raw, "paymentTerms", &d.payment_terms),
        warranty: merged(raw, "warranty", &d.warranty),
    }
}
