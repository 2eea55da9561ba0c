use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Trades a scope can be filed under.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Trade {
    #[serde(rename = "Glass & Glazing")]
    GlassAndGlazing,
    #[default]
    Storefront,
    #[serde(rename = "Curtain Wall")]
    CurtainWall,
    #[serde(rename = "Window Wall")]
    WindowWall,
    #[serde(rename = "All-Glass Entrances")]
    AllGlassEntrances,
    #[serde(rename = "Doors & Hardware")]
    DoorsAndHardware,
    #[serde(rename = "Metal Panels")]
    MetalPanels,
    Service,
    #[serde(rename = "General Conditions")]
    GeneralConditions,
}

impl Trade {
    pub const ALL: [Trade; 9] = [
        Trade::GlassAndGlazing,
        Trade::Storefront,
        Trade::CurtainWall,
        Trade::WindowWall,
        Trade::AllGlassEntrances,
        Trade::DoorsAndHardware,
        Trade::MetalPanels,
        Trade::Service,
        Trade::GeneralConditions,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Trade::GlassAndGlazing => "Glass & Glazing",
            Trade::Storefront => "Storefront",
            Trade::CurtainWall => "Curtain Wall",
            Trade::WindowWall => "Window Wall",
            Trade::AllGlassEntrances => "All-Glass Entrances",
            Trade::DoorsAndHardware => "Doors & Hardware",
            Trade::MetalPanels => "Metal Panels",
            Trade::Service => "Service",
            Trade::GeneralConditions => "General Conditions",
        }
    }

    /// Exact, case-sensitive match against the preset labels.
    pub fn from_label(label: &str) -> Option<Trade> {
        Trade::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub description: String,
    pub unit: String,
    pub qty: f64,
    pub unit_rate: f64,
}

impl LineItem {
    pub fn blank(id: String) -> Self {
        LineItem {
            id,
            description: String::new(),
            unit: "LS".to_string(),
            qty: 1.0,
            unit_rate: 0.0,
        }
    }

    pub fn line_total(&self) -> f64 {
        finite_or_zero(self.qty) * finite_or_zero(self.unit_rate)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum AddOrDeduct {
    #[default]
    Add,
    Deduct,
}

impl AddOrDeduct {
    pub fn sign(self) -> f64 {
        match self {
            AddOrDeduct::Add => 1.0,
            AddOrDeduct::Deduct => -1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AddOrDeduct::Add => "ADD",
            AddOrDeduct::Deduct => "DEDUCT",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alternate {
    pub id: String,
    pub label: String,
    pub description: String,
    pub add_or_deduct: AddOrDeduct,
    /// Always stored unsigned; see [`Alternate::signed_amount`].
    pub amount: f64,
}

impl Alternate {
    pub fn blank(id: String) -> Self {
        Alternate {
            id,
            label: "Alt".to_string(),
            description: String::new(),
            add_or_deduct: AddOrDeduct::Add,
            amount: 0.0,
        }
    }

    pub fn signed_amount(&self) -> f64 {
        self.add_or_deduct.sign() * finite_or_zero(self.amount)
    }
}

fn finite_or_zero(n: f64) -> f64 {
    if n.is_nan() { 0.0 } else { n }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Performance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub u_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shgc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_infiltration: Option<String>,
}

impl Performance {
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("U-Value", &self.u_value),
            ("SHGC", &self.shgc),
            ("Visible Transmittance", &self.vt),
            ("Air Infiltration", &self.air_infiltration),
        ]
        .into_iter()
        .filter_map(|(label, v)| v.as_deref().filter(|s| !s.is_empty()).map(|s| (label, s)))
        .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Structural {
    #[serde(rename = "designPSF", skip_serializing_if = "Option::is_none")]
    pub design_psf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deflection_limit: Option<String>,
}

impl Structural {
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [("Design PSF", &self.design_psf), ("Deflection Limit", &self.deflection_limit)]
            .into_iter()
            .filter_map(|(label, v)| v.as_deref().filter(|s| !s.is_empty()).map(|s| (label, s)))
            .collect()
    }
}

/// The three priced collections of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSection {
    Pricing,
    Services,
    GeneralConditions,
}

impl LineSection {
    pub const ALL: [LineSection; 3] = [
        LineSection::Pricing,
        LineSection::Services,
        LineSection::GeneralConditions,
    ];

    pub fn title(self) -> &'static str {
        match self {
            LineSection::Pricing => "Direct Pricing Items",
            LineSection::Services => "Service",
            LineSection::GeneralConditions => "General Conditions",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub id: String,
    pub trade: Trade,
    pub title: String,
    pub system: String,
    pub finish: String,
    pub glass_spec: String,
    pub performance: Performance,
    pub structural: Structural,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    pub notes: String,
    pub schedule: BTreeMap<String, String>,
    pub pricing_items: Vec<LineItem>,
    pub services: Vec<LineItem>,
    pub general_conditions: Vec<LineItem>,
    pub alternates: Vec<Alternate>,
}

impl Scope {
    pub fn new(id: String, trade: Trade) -> Self {
        Scope {
            id,
            trade,
            title: default_title(trade),
            system: String::new(),
            finish: String::new(),
            glass_spec: String::new(),
            performance: Performance::default(),
            structural: Structural::default(),
            inclusions: Vec::new(),
            exclusions: Vec::new(),
            notes: String::new(),
            schedule: BTreeMap::new(),
            pricing_items: Vec::new(),
            services: Vec::new(),
            general_conditions: Vec::new(),
            alternates: Vec::new(),
        }
    }

    pub fn lines(&self, section: LineSection) -> &[LineItem] {
        match section {
            LineSection::Pricing => &self.pricing_items,
            LineSection::Services => &self.services,
            LineSection::GeneralConditions => &self.general_conditions,
        }
    }

    pub fn lines_mut(&mut self, section: LineSection) -> &mut Vec<LineItem> {
        match section {
            LineSection::Pricing => &mut self.pricing_items,
            LineSection::Services => &mut self.services,
            LineSection::GeneralConditions => &mut self.general_conditions,
        }
    }

    /// Appends a blank line item and hands it back for editing.
    pub fn add_line(&mut self, section: LineSection, id: String) -> &mut LineItem {
        let lines = self.lines_mut(section);
        lines.push(LineItem::blank(id));
        let last = lines.len() - 1;
        &mut lines[last]
    }

    /// Returns false when no item in `section` carries `id`.
    pub fn update_line(
        &mut self,
        section: LineSection,
        id: &str,
        edit: impl FnOnce(&mut LineItem),
    ) -> bool {
        match self.lines_mut(section).iter_mut().find(|it| it.id == id) {
            Some(item) => {
                edit(item);
                true
            }
            None => false,
        }
    }

    pub fn remove_line(&mut self, section: LineSection, id: &str) -> Option<LineItem> {
        let lines = self.lines_mut(section);
        let idx = lines.iter().position(|it| it.id == id)?;
        Some(lines.remove(idx))
    }

    pub fn add_alternate(&mut self, id: String) -> &mut Alternate {
        self.alternates.push(Alternate::blank(id));
        let last = self.alternates.len() - 1;
        &mut self.alternates[last]
    }

    pub fn update_alternate(&mut self, id: &str, edit: impl FnOnce(&mut Alternate)) -> bool {
        match self.alternates.iter_mut().find(|a| a.id == id) {
            Some(alt) => {
                edit(alt);
                true
            }
            None => false,
        }
    }

    pub fn remove_alternate(&mut self, id: &str) -> Option<Alternate> {
        let idx = self.alternates.iter().position(|a| a.id == id)?;
        Some(self.alternates.remove(idx))
    }

    /// Heading used in documents: the title, or the trade when untitled.
    pub fn heading(&self) -> &str {
        if self.title.is_empty() { self.trade.label() } else { &self.title }
    }
}

pub fn default_title(trade: Trade) -> String {
    format!("{} Scope", trade)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub contact: String,
    pub logo_data_url: String,
}

impl Default for Company {
    fn default() -> Self {
        Company {
            name: "Your Company".to_string(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            website: String::new(),
            contact: String::new(),
            logo_data_url: String::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
    pub name: String,
    pub contact: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl Client {
    pub fn is_blank(&self) -> bool {
        [&self.name, &self.contact, &self.email, &self.phone, &self.address]
            .iter()
            .all(|s| s.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectInfo {
    pub name: String,
    pub number: String,
    pub location: String,
    pub bid_date: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CommercialTerms {
    pub tax_rate_pct: f64,
    pub overhead_pct: f64,
    pub profit_pct: f64,
    pub bond_pct: f64,
    pub currency: String,
    pub show_unit_rates: bool,
    pub show_breakdown: bool,
    pub include_bond: bool,
    pub payment_terms: String,
    pub warranty: String,
}

impl Default for CommercialTerms {
    fn default() -> Self {
        CommercialTerms {
            tax_rate_pct: 0.0,
            overhead_pct: 10.0,
            profit_pct: 10.0,
            bond_pct: 0.0,
            currency: "USD".to_string(),
            show_unit_rates: true,
            show_breakdown: true,
            include_bond: false,
            payment_terms: "Net 30 days from invoice; progress billing monthly.".to_string(),
            warranty: "Manufacturer’s standard; 2 years workmanship.".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub name: String,
    pub version: String,
    pub company: Company,
    pub client: Client,
    pub project: ProjectInfo,
    pub commercial_terms: CommercialTerms,
    pub scopes: Vec<Scope>,
    pub disclaimers: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Proposal {
    /// Appends a scope for `trade` and hands it back for editing.
    pub fn add_scope(&mut self, id: String, trade: Trade) -> &mut Scope {
        self.scopes.push(Scope::new(id, trade));
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn scope_mut(&mut self, id: &str) -> Option<&mut Scope> {
        self.scopes.iter_mut().find(|s| s.id == id)
    }

    pub fn remove_scope(&mut self, id: &str) -> Option<Scope> {
        let idx = self.scopes.iter().position(|s| s.id == id)?;
        Some(self.scopes.remove(idx))
    }

    pub fn touch(&mut self, timestamp: String) {
        self.updated_at = timestamp;
    }
}

/// Values a fresh or partially specified proposal starts from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProposalDefaults {
    pub name: String,
    pub version: String,
    pub company: Company,
    pub client: Client,
    pub project: ProjectInfo,
    pub commercial_terms: CommercialTerms,
    pub disclaimers: Vec<String>,
}

impl Default for ProposalDefaults {
    fn default() -> Self {
        ProposalDefaults {
            name: "Untitled Proposal".to_string(),
            version: "1.0".to_string(),
            company: Company::default(),
            client: Client::default(),
            project: ProjectInfo::default(),
            commercial_terms: CommercialTerms::default(),
            disclaimers: vec![
                "Excludes permits, utilities relocation, and unforeseen conditions unless noted."
                    .to_string(),
                "Excludes structural engineering unless specifically included.".to_string(),
                "Price valid 30 days; lead times subject to approved submittals and vendor confirmation."
                    .to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_labels_round_trip_through_serde() {
        for trade in Trade::ALL {
            let json = serde_json::to_value(trade).unwrap();
            assert_eq!(json, serde_json::Value::String(trade.label().to_string()));
            assert_eq!(Trade::from_label(trade.label()), Some(trade));
        }
        assert_eq!(Trade::from_label("storefront"), None);
    }

    #[test]
    fn blank_entities_use_editor_defaults() {
        let line = LineItem::blank("l1".into());
        assert_eq!(line.unit, "LS");
        assert_eq!(line.qty, 1.0);
        assert_eq!(line.line_total(), 0.0);

        let alt = Alternate::blank("a1".into());
        assert_eq!(alt.label, "Alt");
        assert_eq!(alt.add_or_deduct, AddOrDeduct::Add);
    }

    #[test]
    fn deduct_alternates_are_negative() {
        let mut alt = Alternate::blank("a1".into());
        alt.amount = 40.0;
        assert_eq!(alt.signed_amount(), 40.0);
        alt.add_or_deduct = AddOrDeduct::Deduct;
        assert_eq!(alt.signed_amount(), -40.0);
        assert_eq!(alt.amount, 40.0);
    }

    #[test]
    fn line_items_are_edited_and_removed_by_id() {
        let mut scope = Scope::new("s1".into(), Trade::CurtainWall);
        assert_eq!(scope.title, "Curtain Wall Scope");

        scope.add_line(LineSection::Services, "x".into()).unit_rate = 350.0;
        scope.add_line(LineSection::Services, "y".into());
        assert!(scope.update_line(LineSection::Services, "y", |it| it.qty = 3.0));
        assert!(!scope.update_line(LineSection::Pricing, "y", |it| it.qty = 9.0));

        let removed = scope.remove_line(LineSection::Services, "x").unwrap();
        assert_eq!(removed.unit_rate, 350.0);
        assert_eq!(scope.services.len(), 1);
        assert_eq!(scope.services[0].qty, 3.0);
        assert!(scope.remove_line(LineSection::Services, "x").is_none());
    }

    #[test]
    fn alternates_are_edited_and_removed_by_id() {
        let mut scope = Scope::new("s1".into(), Trade::Storefront);
        scope.add_alternate("a1".into());
        assert!(scope.update_alternate("a1", |a| a.add_or_deduct = AddOrDeduct::Deduct));
        assert_eq!(scope.alternates[0].add_or_deduct, AddOrDeduct::Deduct);
        assert!(scope.remove_alternate("a1").is_some());
        assert!(scope.alternates.is_empty());
    }

    #[test]
    fn scopes_are_edited_and_removed_by_id() {
        let defaults = ProposalDefaults::default();
        let mut proposal = Proposal {
            id: "p1".into(),
            name: defaults.name,
            version: defaults.version,
            company: defaults.company,
            client: defaults.client,
            project: defaults.project,
            commercial_terms: defaults.commercial_terms,
            scopes: Vec::new(),
            disclaimers: defaults.disclaimers,
            created_at: String::new(),
            updated_at: String::new(),
        };
        proposal.add_scope("s1".into(), Trade::Storefront);
        proposal.add_scope("s2".into(), Trade::Service);

        proposal.scope_mut("s2").unwrap().title = "Warranty Calls".into();
        assert!(proposal.scope_mut("s9").is_none());
        assert_eq!(proposal.scopes[1].title, "Warranty Calls");

        let removed = proposal.remove_scope("s1").unwrap();
        assert_eq!(removed.trade, Trade::Storefront);
        assert_eq!(proposal.scopes.len(), 1);
        assert!(proposal.remove_scope("s1").is_none());

        proposal.touch("2025-08-20T09:30:00.000Z".into());
        assert_eq!(proposal.updated_at, "2025-08-20T09:30:00.000Z");
    }

    #[test]
    fn heading_falls_back_to_trade() {
        let mut scope = Scope::new("s1".into(), Trade::MetalPanels);
        scope.title.clear();
        assert_eq!(scope.heading(), "Metal Panels");
    }

    #[test]
    fn technical_entries_skip_empty_values() {
        let perf = Performance {
            u_value: Some("0.29".into()),
            shgc: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(perf.entries(), vec![("U-Value", "0.29")]);
        assert!(Structural::default().entries().is_empty());
    }

    #[test]
    fn structural_uses_upper_case_psf_key() {
        let structural = Structural {
            design_psf: Some("30".into()),
            deflection_limit: None,
        };
        let json = serde_json::to_value(&structural).unwrap();
        assert_eq!(json, serde_json::json!({ "designPSF": "30" }));
    }
}
