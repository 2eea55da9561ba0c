//! Interactive prompts for building a proposal in the terminal.

use chrono::Local;
use inquire::{Confirm, DateSelect, Select, Text};
use serde_json::Value;

use crate::coerce::{finite_or, split_lines};
use crate::error::Result;
use crate::ids::IdGenerator;
use crate::model::{
    AddOrDeduct, Client, CommercialTerms, LineSection, ProjectInfo, Proposal, Scope, Trade,
};
use crate::normalize::Normalizer;

const ADD_OPT: &str = "ADD";
const DEDUCT_OPT: &str = "DEDUCT";

/// Walks through a whole new proposal, starting from the configured defaults.
pub fn proposal_wizard<G: IdGenerator>(normalizer: &mut Normalizer<G>) -> Result<Proposal> {
    let mut proposal = normalizer.proposal(&Value::Null);

    println!("\n--- Creating New Proposal ---");
    let name = Text::new("Proposal Name:").with_default(&proposal.name).prompt()?;
    proposal.name = name;

    let client = client_wizard(&proposal.client)?;
    proposal.client = client;
    let project = project_wizard(&proposal.project)?;
    proposal.project = project;
    terms_wizard(&mut proposal.commercial_terms)?;

    loop {
        let first = proposal.scopes.is_empty();
        let prompt = if first { "Add a scope?" } else { "Add another scope?" };
        if !Confirm::new(prompt).with_default(first).prompt()? {
            break;
        }
        let scope = scope_wizard(normalizer)?;
        proposal.scopes.push(scope);
    }
    Ok(proposal)
}

pub fn client_wizard(current: &Client) -> Result<Client> {
    println!("\n--- Client (press Enter to skip) ---");
    let name = Text::new("Client Company:").with_default(&current.name).prompt()?;

    // Without a company the contact is the client.
    let contact_prompt = if name.trim().is_empty() {
        "Client Name:"
    } else {
        "Attn / Contact Person:"
    };
    let contact = Text::new(contact_prompt).with_default(&current.contact).prompt()?;
    let email = Text::new("Client Email:").with_default(&current.email).prompt()?;
    let phone = Text::new("Client Phone:").with_default(&current.phone).prompt()?;
    let address = Text::new("Client Address:").with_default(&current.address).prompt()?;

    Ok(Client {
        name: name.trim().to_string(),
        contact: contact.trim().to_string(),
        email: email.trim().to_string(),
        phone: phone.trim().to_string(),
        address: address.trim().to_string(),
    })
}

pub fn project_wizard(current: &ProjectInfo) -> Result<ProjectInfo> {
    println!("\n--- Project ---");
    let name = Text::new("Project Name:").with_default(&current.name).prompt()?;
    let number = Text::new("Project No.:").with_default(&current.number).prompt()?;

    let zip = Text::new("Zip Code (Leave empty to skip lookup):").prompt()?;
    let found = zip_location(&zip);
    if let Some(location) = &found {
        println!("🚀 Found: {location}");
    }
    let default_location = found.unwrap_or_else(|| current.location.clone());
    let location = Text::new("Location:").with_default(&default_location).prompt()?;

    let bid_date = if Confirm::new("Set a bid date?").with_default(true).prompt()? {
        DateSelect::new("Bid Date:")
            .with_default(Local::now().date_naive())
            .prompt()?
            .format("%Y-%m-%d")
            .to_string()
    } else {
        current.bid_date.clone()
    };

    Ok(ProjectInfo {
        name: name.trim().to_string(),
        number: number.trim().to_string(),
        location: location.trim().to_string(),
        bid_date,
    })
}

fn terms_wizard(terms: &mut CommercialTerms) -> Result<()> {
    let apply_tax = Confirm::new("Add Tax to Total?")
        .with_default(terms.tax_rate_pct > 0.0)
        .prompt()?;
    terms.tax_rate_pct = if apply_tax {
        let current = terms.tax_rate_pct.to_string();
        let rate = Text::new("Tax Rate % (e.g. 8.875):").with_default(&current).prompt()?;
        parse_amount(&rate, terms.tax_rate_pct)
    } else {
        0.0
    };

    terms.include_bond = Confirm::new("Include a bond?")
        .with_default(terms.include_bond)
        .prompt()?;
    if terms.include_bond {
        let current = terms.bond_pct.to_string();
        let rate = Text::new("Bond %:").with_default(&current).prompt()?;
        terms.bond_pct = parse_amount(&rate, terms.bond_pct);
    }
    Ok(())
}

pub fn scope_wizard<G: IdGenerator>(normalizer: &mut Normalizer<G>) -> Result<Scope> {
    println!("\n--- New Scope ---");
    let trade = Select::new("Trade:", Trade::ALL.to_vec()).prompt()?;
    let mut scope = Scope::new(normalizer.next_id(), trade);

    let title = Text::new("Title:").with_default(&scope.title).prompt()?;
    scope.title = title;
    scope.system = Text::new("System (Optional):").prompt()?;
    scope.finish = Text::new("Finish (Optional):").prompt()?;
    scope.glass_spec = Text::new("Glass Spec (Optional):").prompt()?;

    println!("💡 Tip: Use '\\n' between lines.");
    scope.inclusions = entry_lines(&Text::new("Inclusions:").prompt()?);
    scope.exclusions = entry_lines(&Text::new("Exclusions:").prompt()?);
    scope.notes = Text::new("Notes (Optional):").prompt()?;

    for section in LineSection::ALL {
        line_items_wizard(&mut scope, section, normalizer)?;
    }
    alternates_wizard(&mut scope, normalizer)?;
    Ok(scope)
}

fn line_items_wizard<G: IdGenerator>(
    scope: &mut Scope,
    section: LineSection,
    normalizer: &mut Normalizer<G>,
) -> Result<()> {
    println!("\n--- {} ---", section.title());
    println!("(Leave Description empty to finish)");

    loop {
        let description = Text::new("Description:").prompt()?;
        if description.trim().is_empty() {
            break;
        }
        let unit = Text::new("Unit:").with_default("LS").prompt()?;
        let qty = parse_amount(&Text::new("Qty:").with_default("1").prompt()?, 1.0);
        let unit_rate = parse_amount(&Text::new("Unit Rate ($):").prompt()?, 0.0);

        let item = scope.add_line(section, normalizer.next_id());
        item.description = description;
        item.unit = unit;
        item.qty = qty;
        item.unit_rate = unit_rate;
    }
    Ok(())
}

fn alternates_wizard<G: IdGenerator>(
    scope: &mut Scope,
    normalizer: &mut Normalizer<G>,
) -> Result<()> {
    println!("\n--- Alternates ---");
    println!("(Leave Label empty to finish)");

    loop {
        let label = Text::new("Alternate Label:").prompt()?;
        if label.trim().is_empty() {
            break;
        }
        let description = Text::new("Description:").prompt()?;
        let kind = match Select::new("Add or Deduct:", vec![ADD_OPT, DEDUCT_OPT]).prompt()? {
            DEDUCT_OPT => AddOrDeduct::Deduct,
            _ => AddOrDeduct::Add,
        };
        // sign comes from `kind`
        let amount = parse_amount(&Text::new("Amount ($):").prompt()?, 0.0).abs();

        let alt = scope.add_alternate(normalizer.next_id());
        alt.label = label;
        alt.description = description;
        alt.add_or_deduct = kind;
        alt.amount = amount;
    }
    Ok(())
}

/// Reads a typed number the same way stored documents are read; blank
/// input is zero and anything unreadable falls back to `default`.
pub fn parse_amount(input: &str, default: f64) -> f64 {
    finite_or(Some(&Value::String(input.replace(',', ""))), default)
}

/// Splits a one-line answer on typed `\n` sequences.
pub fn entry_lines(input: &str) -> Vec<String> {
    split_lines(&input.replace("\\n", "\n"))
}

/// `"City, ST"` for a US zip code, when the lookup knows it.
pub fn zip_location(zip: &str) -> Option<String> {
    let zip = zip.trim();
    if zip.is_empty() {
        return None;
    }
    let results = zipcodes::matching(zip, None).ok()?;
    results.first().map(|info| format!("{}, {}", info.city, info.state))
}
